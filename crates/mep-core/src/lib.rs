//! # mep-core: Electrical Survey Validation Core
//!
//! Data model, NEC code tables and the validators that check a surveyed
//! power-distribution hierarchy for code-consistent wiring.
//!
//! ## Design Philosophy
//!
//! A survey is a flat list of [`EquipmentNode`]s linked by `parent_id`
//! (utility → service disconnect → transformer → panel …). Every check is a
//! pure function over that list:
//!
//! - [`sizing`] - wire ampacity and conduit fill calculators
//! - [`step`] - parent/child voltage and amperage step validators
//! - [`hierarchy`] - the orchestrator that walks the list and files issues
//! - [`graph_utils`] - petgraph view of the hierarchy for rendering
//! - [`edit`] - pure reducer for review-time edits
//! - [`gaps`] - what the nameplate extraction could not read
//!
//! Integrity problems are never errors: they come back as a categorized
//! [`HierarchyReport`] so a surveyor can proceed with caveats. Only
//! error-severity issues gate saving.
//!
//! ## Quick Start
//!
//! ```
//! use mep_core::*;
//!
//! let nodes = vec![
//!     EquipmentNode::new("sd-1", EquipmentType::ServiceDisconnect)
//!         .with_voltage("480V")
//!         .with_amperage("400A"),
//!     EquipmentNode::new("panel-a", EquipmentType::Panel)
//!         .with_parent("sd-1")
//!         .with_voltage("480Y/277V")
//!         .with_amperage("400A"),
//! ];
//!
//! let report = validate_hierarchy(&nodes);
//! assert!(report.can_save());
//! assert!(report.is_clean());
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub mod diagnostics;
pub mod edit;
pub mod error;
pub mod gaps;
pub mod graph_utils;
pub mod hierarchy;
pub mod parse;
pub mod sizing;
pub mod step;
pub mod tables;
pub mod units;

pub use diagnostics::{HierarchyReport, IssueKind, Severity, ValidationIssue};
pub use edit::{apply_edit, Edit};
pub use error::{MepError, MepResult};
pub use gaps::{GapSummary, ItemGaps};
pub use graph_utils::{
    assign_levels, build_hierarchy_graph, export_graph, HierarchyGraph, HierarchyStats,
};
pub use hierarchy::{
    has_ancestor_of_type, validate_hierarchy, validate_hierarchy_with, validate_installation,
    validate_survey, AncestorSearch, ValidationConfig,
};
pub use parse::{parse_amperage, parse_voltage};
pub use sizing::{
    find_minimum_wire_size, validate_conduit_fill, validate_wire_size, Conductor,
    ConduitFillCheck, WireSizeCheck,
};
pub use step::{validate_amperage_step, validate_voltage_step, StepCheck};
pub use tables::{ConduitSize, WireGauge};
pub use units::{Amperes, SquareInches, Volts};

/// Stable identifier of a surveyed equipment item
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EquipmentId(String);

impl EquipmentId {
    #[inline]
    pub fn new(value: impl Into<String>) -> Self {
        EquipmentId(value.into())
    }
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for EquipmentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EquipmentId {
    fn from(value: &str) -> Self {
        EquipmentId(value.to_string())
    }
}

impl From<String> for EquipmentId {
    fn from(value: String) -> Self {
        EquipmentId(value)
    }
}

/// Equipment that can take part in the distribution hierarchy
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EquipmentType {
    Transformer,
    ServiceDisconnect,
    Meter,
    Panel,
}

impl EquipmentType {
    pub const ALL: [EquipmentType; 4] = [
        EquipmentType::Transformer,
        EquipmentType::ServiceDisconnect,
        EquipmentType::Meter,
        EquipmentType::Panel,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EquipmentType::Transformer => "transformer",
            EquipmentType::ServiceDisconnect => "service_disconnect",
            EquipmentType::Meter => "meter",
            EquipmentType::Panel => "panel",
        }
    }

    /// Map a classifier label such as `PANEL_NAMEPLATE` onto a hierarchy type.
    ///
    /// Returns `None` for `UNKNOWN` and for anything that is not distribution
    /// equipment; those items never reach the hierarchy.
    pub fn from_classification(label: &str) -> Option<Self> {
        let normalized = label.trim().to_ascii_uppercase().replace([' ', '-'], "_");
        let base = normalized
            .strip_suffix("_NAMEPLATE")
            .unwrap_or(normalized.as_str());
        match base {
            "TRANSFORMER" | "XFMR" => Some(EquipmentType::Transformer),
            "SERVICE_DISCONNECT" | "DISCONNECT" | "MAIN_DISCONNECT" => {
                Some(EquipmentType::ServiceDisconnect)
            }
            "METER" | "ELECTRIC_METER" => Some(EquipmentType::Meter),
            "PANEL" | "PANELBOARD" | "ELECTRICAL_PANEL" | "SWITCHBOARD" => {
                Some(EquipmentType::Panel)
            }
            _ => None,
        }
    }
}

impl std::fmt::Display for EquipmentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Image-quality flags reported alongside an extraction
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExtractionQuality {
    pub overall: Option<String>,
    pub blurry: bool,
    pub glare: bool,
    pub partially_obscured: bool,
}

/// Nameplate fields inferred by the vision model. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExtractedData {
    pub manufacturer: Option<String>,
    pub model: Option<String>,
    pub serial_number: Option<String>,
    /// Free-text voltage, e.g. `"208Y/120V"`
    pub voltage: Option<String>,
    /// Free-text amperage, e.g. `"225-Amp"`
    pub amperage: Option<String>,
    /// Bus or equipment rating, used when `amperage` is absent
    pub rating: Option<String>,
    pub main_breaker: Option<String>,
    pub phase: Option<String>,
    pub kva: Option<String>,
    /// Per-field confidence in `0.0..=1.0`
    pub confidence_scores: BTreeMap<String, f64>,
    pub extraction_quality: ExtractionQuality,
    pub missing_fields: Vec<String>,
}

impl ExtractedData {
    /// Highest voltage on the nameplate, `None` when missing or unreadable.
    pub fn voltage(&self) -> Option<Volts> {
        self.voltage.as_deref().and_then(parse_voltage)
    }

    /// Amperage, falling back to the bus rating and then the main breaker.
    pub fn amperage(&self) -> Option<Amperes> {
        [&self.amperage, &self.rating, &self.main_breaker]
            .into_iter()
            .flatten()
            .find_map(|text| parse_amperage(text))
    }

    /// Number of phase conductors implied by the `phase` field.
    pub fn phase_count(&self) -> Option<u32> {
        let text = self.phase.as_deref()?.to_ascii_lowercase();
        if text.contains("single") || text.starts_with('1') {
            Some(2)
        } else if text.contains("three") || text.starts_with('3') {
            Some(3)
        } else {
            None
        }
    }

    /// Mean of the per-field confidence scores.
    pub fn mean_confidence(&self) -> Option<f64> {
        if self.confidence_scores.is_empty() {
            return None;
        }
        let total: f64 = self.confidence_scores.values().sum();
        Some(total / self.confidence_scores.len() as f64)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MountingType {
    Surface,
    Recessed,
    WallMounted,
    FloorStanding,
    PadMounted,
    PoleMounted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    Excellent,
    Good,
    Fair,
    Poor,
}

/// Physical size in inches
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: f64,
    pub height: f64,
    pub depth: f64,
}

/// Fields the surveyor supplies because a photo cannot show them
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserInputs {
    pub designation: String,
    pub location: String,
    pub mounting_type: Option<MountingType>,
    pub phase_wire_size: Option<String>,
    pub neutral_wire_size: Option<String>,
    pub ground_wire_size: Option<String>,
    pub conduit_size: Option<String>,
    pub dimensions: Option<Dimensions>,
    pub condition: Option<Condition>,
    pub notes: Option<String>,
    /// Upstream equipment this item is fed from
    pub fed_from: Option<EquipmentId>,
}

impl UserInputs {
    pub fn phase_gauge(&self) -> Option<WireGauge> {
        self.phase_wire_size.as_deref().and_then(|s| s.parse().ok())
    }

    pub fn neutral_gauge(&self) -> Option<WireGauge> {
        self.neutral_wire_size.as_deref().and_then(|s| s.parse().ok())
    }

    pub fn ground_gauge(&self) -> Option<WireGauge> {
        self.ground_wire_size.as_deref().and_then(|s| s.parse().ok())
    }

    pub fn conduit(&self) -> Option<ConduitSize> {
        self.conduit_size.as_deref().and_then(|s| s.parse().ok())
    }
}

/// One piece of equipment in the surveyed hierarchy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EquipmentNode {
    pub id: EquipmentId,
    #[serde(rename = "type")]
    pub equipment_type: EquipmentType,
    /// `None` for roots fed directly from the utility
    #[serde(default)]
    pub parent_id: Option<EquipmentId>,
    #[serde(default)]
    pub hierarchy_level: u32,
    #[serde(default)]
    pub extracted_data: ExtractedData,
    #[serde(default)]
    pub user_inputs: UserInputs,
}

impl EquipmentNode {
    pub fn new(id: impl Into<EquipmentId>, equipment_type: EquipmentType) -> Self {
        Self {
            id: id.into(),
            equipment_type,
            parent_id: None,
            hierarchy_level: 0,
            extracted_data: ExtractedData::default(),
            user_inputs: UserInputs::default(),
        }
    }

    /// Link to a parent; the level is bumped to 1 until recomputed.
    pub fn with_parent(mut self, parent: impl Into<EquipmentId>) -> Self {
        self.parent_id = Some(parent.into());
        self.hierarchy_level = self.hierarchy_level.max(1);
        self
    }

    pub fn with_level(mut self, level: u32) -> Self {
        self.hierarchy_level = level;
        self
    }

    pub fn with_voltage(mut self, voltage: impl Into<String>) -> Self {
        self.extracted_data.voltage = Some(voltage.into());
        self
    }

    pub fn with_amperage(mut self, amperage: impl Into<String>) -> Self {
        self.extracted_data.amperage = Some(amperage.into());
        self
    }

    pub fn with_user_inputs(mut self, inputs: UserInputs) -> Self {
        self.user_inputs = inputs;
        self
    }

    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    pub fn voltage(&self) -> Option<Volts> {
        self.extracted_data.voltage()
    }

    pub fn amperage(&self) -> Option<Amperes> {
        self.extracted_data.amperage()
    }

    /// Designation if entered, otherwise the id
    pub fn label(&self) -> &str {
        if self.user_inputs.designation.trim().is_empty() {
            self.id.as_str()
        } else {
            self.user_inputs.designation.trim()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification_mapping() {
        assert_eq!(
            EquipmentType::from_classification("PANEL_NAMEPLATE"),
            Some(EquipmentType::Panel)
        );
        assert_eq!(
            EquipmentType::from_classification("transformer nameplate"),
            Some(EquipmentType::Transformer)
        );
        assert_eq!(
            EquipmentType::from_classification("SERVICE_DISCONNECT"),
            Some(EquipmentType::ServiceDisconnect)
        );
        assert_eq!(EquipmentType::from_classification("UNKNOWN"), None);
        assert_eq!(EquipmentType::from_classification("HVAC_NAMEPLATE"), None);
    }

    #[test]
    fn test_extracted_amperage_falls_back_to_rating() {
        let mut data = ExtractedData {
            rating: Some("225A Bus".to_string()),
            ..ExtractedData::default()
        };
        assert_eq!(data.amperage(), Some(Amperes(225.0)));

        data.amperage = Some("Not Available".to_string());
        assert_eq!(data.amperage(), Some(Amperes(225.0)));

        data.amperage = Some("100 Amp".to_string());
        assert_eq!(data.amperage(), Some(Amperes(100.0)));
    }

    #[test]
    fn test_phase_count() {
        let mut data = ExtractedData::default();
        assert_eq!(data.phase_count(), None);
        data.phase = Some("3PH 4W".into());
        assert_eq!(data.phase_count(), Some(3));
        data.phase = Some("Single Phase".into());
        assert_eq!(data.phase_count(), Some(2));
    }

    #[test]
    fn test_mean_confidence() {
        let mut data = ExtractedData::default();
        assert_eq!(data.mean_confidence(), None);
        data.confidence_scores.insert("voltage".into(), 0.9);
        data.confidence_scores.insert("amperage".into(), 0.7);
        assert!((data.mean_confidence().unwrap() - 0.8).abs() < 1e-12);
    }

    #[test]
    fn test_node_json_shape() {
        let node = EquipmentNode::new("panel-a", EquipmentType::Panel)
            .with_parent("sd-1")
            .with_voltage("480V");
        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(json["type"], "panel");
        assert_eq!(json["parentId"], "sd-1");
        assert_eq!(json["hierarchyLevel"], 1);
        assert_eq!(json["extractedData"]["voltage"], "480V");

        let back: EquipmentNode = serde_json::from_value(json).unwrap();
        assert_eq!(back, node);
    }

    #[test]
    fn test_minimal_node_deserializes() {
        let node: EquipmentNode =
            serde_json::from_str(r#"{"id":"m-1","type":"meter"}"#).unwrap();
        assert!(node.is_root());
        assert_eq!(node.hierarchy_level, 0);
        assert_eq!(node.label(), "m-1");
    }
}
