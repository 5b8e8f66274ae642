//! Categorized issue lists produced by hierarchy and installation checks.
//!
//! Every integrity problem found in a survey is a [`ValidationIssue`] filed
//! under one of three severities. Only `error` issues gate saving; warnings
//! and info notes are advisory.
//!
//! # Example
//!
//! ```
//! use mep_core::diagnostics::{HierarchyReport, IssueKind, ValidationIssue};
//! use mep_core::EquipmentId;
//!
//! let mut report = HierarchyReport::new();
//! report.add_warning(ValidationIssue::new(
//!     EquipmentId::new("panel-b"),
//!     IssueKind::MissingParent,
//!     "Parent equipment 'xfmr-1' not found",
//! ));
//!
//! assert_eq!(report.warning_count(), 1);
//! assert!(report.can_save());
//! ```

use crate::EquipmentId;
use serde::{Deserialize, Serialize};

/// Severity level for hierarchy issues
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Blocks saving (e.g., voltage step-up)
    Error,
    /// Should be reviewed but does not block
    Warning,
    /// Informational note
    Info,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
        }
    }
}

/// What kind of violation an issue describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    /// Child voltage exceeds the parent's beyond tap tolerance
    VoltageStepUp,
    /// Child amperage rating exceeds the parent's beyond oversizing tolerance
    AmperageMismatch,
    /// `parent_id` does not resolve within the survey
    MissingParent,
    /// Downstream panel with no service disconnect above it
    MissingServiceDisconnect,
    /// Parent pointers form a cycle
    InvalidHierarchy,
    /// Conductors exceed the conduit's fill ceiling
    ConduitFill,
    /// Phase conductor too small for the equipment rating
    WireAmpacity,
}

impl IssueKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueKind::VoltageStepUp => "voltage_step_up",
            IssueKind::AmperageMismatch => "amperage_mismatch",
            IssueKind::MissingParent => "missing_parent",
            IssueKind::MissingServiceDisconnect => "missing_service_disconnect",
            IssueKind::InvalidHierarchy => "invalid_hierarchy",
            IssueKind::ConduitFill => "conduit_fill",
            IssueKind::WireAmpacity => "wire_ampacity",
        }
    }
}

impl std::fmt::Display for IssueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single hierarchy or installation issue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationIssue {
    /// Equipment the issue is reported against
    pub equipment_id: EquipmentId,
    /// Parent involved in a pair check, when there is one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<EquipmentId>,
    #[serde(rename = "type")]
    pub kind: IssueKind,
    /// Human-readable description
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_action: Option<String>,
}

impl ValidationIssue {
    pub fn new(equipment_id: EquipmentId, kind: IssueKind, message: impl Into<String>) -> Self {
        Self {
            equipment_id,
            parent_id: None,
            kind,
            message: message.into(),
            suggested_action: None,
        }
    }

    /// Add the parent involved in the check
    pub fn with_parent(mut self, parent_id: EquipmentId) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    /// Add a suggested corrective action
    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.suggested_action = Some(action.into());
        self
    }
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}: {}", self.kind, self.equipment_id, self.message)?;
        if let Some(parent) = &self.parent_id {
            write!(f, " (parent {})", parent)?;
        }
        if let Some(action) = &self.suggested_action {
            write!(f, " -> {}", action)?;
        }
        Ok(())
    }
}

/// Issues grouped by severity, in traversal order within each group
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HierarchyReport {
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
    pub info: Vec<ValidationIssue>,
}

impl HierarchyReport {
    /// Create an empty report
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, severity: Severity, issue: ValidationIssue) {
        match severity {
            Severity::Error => self.errors.push(issue),
            Severity::Warning => self.warnings.push(issue),
            Severity::Info => self.info.push(issue),
        }
    }

    pub fn add_error(&mut self, issue: ValidationIssue) {
        self.errors.push(issue);
    }

    pub fn add_warning(&mut self, issue: ValidationIssue) {
        self.warnings.push(issue);
    }

    pub fn add_info(&mut self, issue: ValidationIssue) {
        self.info.push(issue);
    }

    // =========================================================================
    // Query Methods
    // =========================================================================

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    pub fn warning_count(&self) -> usize {
        self.warnings.len()
    }

    pub fn info_count(&self) -> usize {
        self.info.len()
    }

    pub fn total(&self) -> usize {
        self.errors.len() + self.warnings.len() + self.info.len()
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn is_clean(&self) -> bool {
        self.total() == 0
    }

    /// Saving is allowed while no error-severity issue remains.
    pub fn can_save(&self) -> bool {
        !self.has_errors()
    }

    /// All issues with their severity, errors first.
    pub fn iter(&self) -> impl Iterator<Item = (Severity, &ValidationIssue)> {
        self.errors
            .iter()
            .map(|i| (Severity::Error, i))
            .chain(self.warnings.iter().map(|i| (Severity::Warning, i)))
            .chain(self.info.iter().map(|i| (Severity::Info, i)))
    }

    /// Issues of one kind, across severities
    pub fn issues_of_kind(&self, kind: IssueKind) -> impl Iterator<Item = &ValidationIssue> {
        self.iter()
            .map(|(_, issue)| issue)
            .filter(move |issue| issue.kind == kind)
    }

    /// Issues reported against one equipment item
    pub fn issues_for<'a>(
        &'a self,
        equipment_id: &'a EquipmentId,
    ) -> impl Iterator<Item = (Severity, &'a ValidationIssue)> {
        self.iter()
            .filter(move |(_, issue)| &issue.equipment_id == equipment_id)
    }

    /// Merge another report into this one, preserving order
    pub fn merge(&mut self, other: HierarchyReport) {
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
        self.info.extend(other.info);
    }

    /// Get summary string
    pub fn summary(&self) -> String {
        if self.is_clean() {
            return "No issues".to_string();
        }
        let mut parts = Vec::new();
        for (count, noun) in [
            (self.error_count(), "error"),
            (self.warning_count(), "warning"),
            (self.info_count(), "note"),
        ] {
            if count > 0 {
                parts.push(format!("{} {}{}", count, noun, if count == 1 { "" } else { "s" }));
            }
        }
        parts.join(", ")
    }
}

impl std::fmt::Display for HierarchyReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Hierarchy: {}", self.summary())?;
        for (severity, issue) in self.iter() {
            writeln!(f, "  {}: {}", severity.as_str(), issue)?;
        }
        Ok(())
    }
}
