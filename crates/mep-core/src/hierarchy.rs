//! Hierarchy validation orchestrator.
//!
//! Walks the flat equipment list in input order and files every integrity
//! problem into a [`HierarchyReport`]:
//!
//! - **Parent linkage**: unresolvable `parent_id` → `missing_parent` warning
//! - **Voltage step**: child above parent × 1.05 → `voltage_step_up` error
//! - **Amperage step**: child above parent × 1.25 → `amperage_mismatch` warning
//! - **Cycles**: node reachable from itself via parents → `invalid_hierarchy` warning
//! - **Required ancestor**: downstream panel without a service disconnect
//!   above it → `missing_service_disconnect` info
//!
//! [`validate_installation`] adds advisory conduit-fill and wire-ampacity
//! checks from the surveyor's wiring inputs. Nothing here fails; the same
//! input always yields the same report in the same order.

use crate::diagnostics::{HierarchyReport, IssueKind, Severity, ValidationIssue};
use crate::sizing::{validate_conduit_fill, validate_wire_size, Conductor};
use crate::step::{
    validate_amperage_step_with, validate_voltage_step_with, AMPERAGE_STEP_TOLERANCE,
    VOLTAGE_STEP_TOLERANCE,
};
use crate::{EquipmentId, EquipmentNode, EquipmentType};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Tunables for hierarchy validation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Child voltage may exceed the parent's by this factor
    pub voltage_tolerance: f64,
    /// Child amperage may exceed the parent's by this factor
    pub amperage_tolerance: f64,
    /// Run conduit-fill and wire-ampacity checks on user wiring inputs
    pub check_installation: bool,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            voltage_tolerance: VOLTAGE_STEP_TOLERANCE,
            amperage_tolerance: AMPERAGE_STEP_TOLERANCE,
            check_installation: true,
        }
    }
}

/// Result of walking `parent_id` pointers upward
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AncestorSearch {
    Found(EquipmentId),
    NotFound,
    /// The walk revisited a node; treated as not found
    Cycle,
}

impl AncestorSearch {
    pub fn is_found(&self) -> bool {
        matches!(self, AncestorSearch::Found(_))
    }
}

type NodeIndex<'a> = HashMap<&'a EquipmentId, &'a EquipmentNode>;

fn index_nodes(nodes: &[EquipmentNode]) -> NodeIndex<'_> {
    let mut index = HashMap::with_capacity(nodes.len());
    for node in nodes {
        // first occurrence wins on duplicate ids
        index.entry(&node.id).or_insert(node);
    }
    index
}

/// Walk ancestors of `node` looking for `wanted`, guarding against cycles.
pub fn has_ancestor_of_type(
    nodes: &[EquipmentNode],
    node: &EquipmentNode,
    wanted: EquipmentType,
) -> AncestorSearch {
    find_ancestor(&index_nodes(nodes), node, wanted)
}

fn find_ancestor(index: &NodeIndex<'_>, node: &EquipmentNode, wanted: EquipmentType) -> AncestorSearch {
    let mut visited: HashSet<&EquipmentId> = HashSet::new();
    visited.insert(&node.id);
    let mut cursor = node.parent_id.as_ref();
    while let Some(parent_id) = cursor {
        if !visited.insert(parent_id) {
            return AncestorSearch::Cycle;
        }
        let Some(parent) = index.get(parent_id) else {
            return AncestorSearch::NotFound;
        };
        if parent.equipment_type == wanted {
            return AncestorSearch::Found(parent.id.clone());
        }
        cursor = parent.parent_id.as_ref();
    }
    AncestorSearch::NotFound
}

/// True when following parents from `node` leads back to `node`.
fn lies_on_cycle(index: &NodeIndex<'_>, node: &EquipmentNode) -> bool {
    let mut visited: HashSet<&EquipmentId> = HashSet::new();
    let mut cursor = node.parent_id.as_ref();
    while let Some(parent_id) = cursor {
        if parent_id == &node.id {
            return true;
        }
        if !visited.insert(parent_id) {
            return false;
        }
        cursor = index.get(parent_id).and_then(|p| p.parent_id.as_ref());
    }
    false
}

/// Validate with the default 5% voltage and 25% amperage tolerances.
pub fn validate_hierarchy(nodes: &[EquipmentNode]) -> HierarchyReport {
    validate_hierarchy_with(nodes, &ValidationConfig::default())
}

pub fn validate_hierarchy_with(
    nodes: &[EquipmentNode],
    config: &ValidationConfig,
) -> HierarchyReport {
    let index = index_nodes(nodes);
    let mut report = HierarchyReport::new();

    for node in nodes {
        if let Some(parent_id) = &node.parent_id {
            match index.get(parent_id) {
                None => report.add_warning(
                    ValidationIssue::new(
                        node.id.clone(),
                        IssueKind::MissingParent,
                        format!(
                            "{} references parent '{}' which is not in this survey",
                            node.label(),
                            parent_id
                        ),
                    )
                    .with_parent(parent_id.clone())
                    .with_action("Survey the upstream equipment or clear the parent link"),
                ),
                Some(parent) => check_pair(parent, node, config, &mut report),
            }

            if lies_on_cycle(&index, node) {
                report.add_warning(
                    ValidationIssue::new(
                        node.id.clone(),
                        IssueKind::InvalidHierarchy,
                        format!("{} is part of a parent-link cycle", node.label()),
                    )
                    .with_parent(parent_id.clone())
                    .with_action("Fix the parent links so power flows from a single root"),
                );
            }
        }

        // A parent link makes a node non-root even when its level was never assigned.
        let is_root = node.parent_id.is_none() && node.hierarchy_level == 0;
        if node.equipment_type == EquipmentType::Panel && !is_root {
            let search = find_ancestor(&index, node, EquipmentType::ServiceDisconnect);
            if !search.is_found() {
                tracing::debug!(equipment = %node.id, ?search, "no service disconnect upstream");
                report.add_info(
                    ValidationIssue::new(
                        node.id.clone(),
                        IssueKind::MissingServiceDisconnect,
                        format!(
                            "{} does not trace back to a service disconnect",
                            node.label()
                        ),
                    )
                    .with_action("Survey the service disconnect feeding this panel"),
                );
            }
        }
    }

    report
}

fn check_pair(
    parent: &EquipmentNode,
    child: &EquipmentNode,
    config: &ValidationConfig,
    report: &mut HierarchyReport,
) {
    let voltage = validate_voltage_step_with(
        parent.voltage(),
        child.voltage(),
        config.voltage_tolerance,
    );
    if let (false, Some(kind)) = (voltage.valid, voltage.kind) {
        report.add_error(
            ValidationIssue::new(
                child.id.clone(),
                kind,
                format!(
                    "{} steps voltage up from {}: {}",
                    child.label(),
                    parent.label(),
                    voltage.message.unwrap_or_default()
                ),
            )
            .with_parent(parent.id.clone())
            .with_action(
                "Verify both nameplate voltages; a transformer may be missing between these items",
            ),
        );
    }

    let amperage = validate_amperage_step_with(
        parent.amperage(),
        child.amperage(),
        config.amperage_tolerance,
    );
    if let (false, Some(kind)) = (amperage.valid, amperage.kind) {
        report.add_warning(
            ValidationIssue::new(
                child.id.clone(),
                kind,
                format!(
                    "{} is rated above {}: {}",
                    child.label(),
                    parent.label(),
                    amperage.message.unwrap_or_default()
                ),
            )
            .with_parent(parent.id.clone())
            .with_action("Confirm the feeder and overcurrent device ratings"),
        );
    }
}

/// Advisory checks on the surveyor's wiring inputs.
///
/// Conduit fill counts the phase conductors (from the nameplate phase, three
/// when unknown), one neutral when given and one ground. A failing fill or an
/// undersized phase conductor is a warning; a compliant but tight fill is an
/// info note.
pub fn validate_installation(nodes: &[EquipmentNode]) -> HierarchyReport {
    let mut report = HierarchyReport::new();
    for node in nodes {
        let inputs = &node.user_inputs;
        let Some(phase) = inputs.phase_gauge() else {
            continue;
        };

        if let Some(conduit) = inputs.conduit() {
            let phases = node.extracted_data.phase_count().unwrap_or(3);
            let mut conductors = vec![Conductor::new(phase, phases)];
            if let Some(neutral) = inputs.neutral_gauge() {
                conductors.push(Conductor::new(neutral, 1));
            }
            if let Some(ground) = inputs.ground_gauge() {
                conductors.push(Conductor::new(ground, 1));
            }
            match validate_conduit_fill(conduit.label(), &conductors) {
                Ok(check) if !check.valid => {
                    let mut issue =
                        ValidationIssue::new(node.id.clone(), IssueKind::ConduitFill, check.message);
                    if let Some(size) = check.suggested_size {
                        issue = issue.with_action(format!("Use {} conduit or larger", size));
                    }
                    report.add_warning(issue);
                }
                Ok(check) => {
                    if let Some(warning) = check.warning {
                        report.add(
                            Severity::Info,
                            ValidationIssue::new(node.id.clone(), IssueKind::ConduitFill, warning),
                        );
                    }
                }
                Err(err) => tracing::debug!(equipment = %node.id, %err, "conduit fill skipped"),
            }
        }

        if let Some(amps) = node.amperage() {
            match validate_wire_size(phase.label(), amps.value(), false) {
                Ok(check) if !check.valid => {
                    let mut issue = ValidationIssue::new(
                        node.id.clone(),
                        IssueKind::WireAmpacity,
                        format!("{} feeder: {}", node.label(), check.message),
                    );
                    if let Some(size) = check.suggested_size {
                        issue = issue.with_action(format!(
                            "Confirm the feeder size or the protective device; {} carries {}",
                            size,
                            size.ampacity()
                        ));
                    }
                    report.add_warning(issue);
                }
                Ok(_) => {}
                Err(err) => tracing::debug!(equipment = %node.id, %err, "wire check skipped"),
            }
        }
    }
    report
}

/// Full review: hierarchy checks, then installation checks when enabled.
pub fn validate_survey(nodes: &[EquipmentNode], config: &ValidationConfig) -> HierarchyReport {
    let mut report = validate_hierarchy_with(nodes, config);
    if config.check_installation {
        report.merge(validate_installation(nodes));
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::UserInputs;

    fn disconnect(id: &str) -> EquipmentNode {
        EquipmentNode::new(id, EquipmentType::ServiceDisconnect)
    }

    fn panel(id: &str, parent: &str) -> EquipmentNode {
        EquipmentNode::new(id, EquipmentType::Panel).with_parent(parent)
    }

    #[test]
    fn three_level_scenario_flags_only_the_step_up() {
        let nodes = vec![
            disconnect("sd").with_voltage("480V").with_amperage("400A"),
            panel("panel-a", "sd").with_voltage("480V").with_amperage("400A"),
            panel("panel-b", "panel-a")
                .with_level(2)
                .with_voltage("600V")
                .with_amperage("100A"),
        ];
        let report = validate_hierarchy(&nodes);

        assert_eq!(report.error_count(), 1);
        assert_eq!(report.warning_count(), 0);
        let error = &report.errors[0];
        assert_eq!(error.kind, IssueKind::VoltageStepUp);
        assert_eq!(error.equipment_id, EquipmentId::new("panel-b"));
        assert_eq!(error.parent_id, Some(EquipmentId::new("panel-a")));
        assert!(report.issues_for(&EquipmentId::new("panel-a")).next().is_none());
    }

    #[test]
    fn missing_parent_is_a_warning() {
        let nodes = vec![panel("panel-a", "ghost").with_voltage("208V")];
        let report = validate_hierarchy(&nodes);
        assert_eq!(report.error_count(), 0);
        assert_eq!(report.warnings[0].kind, IssueKind::MissingParent);
        // panel without any disconnect upstream
        assert_eq!(report.info[0].kind, IssueKind::MissingServiceDisconnect);
    }

    #[test]
    fn amperage_mismatch_is_a_warning() {
        let nodes = vec![
            disconnect("sd").with_amperage("200A"),
            panel("p", "sd").with_amperage("400A"),
        ];
        let report = validate_hierarchy(&nodes);
        assert!(report.can_save());
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.warnings[0].kind, IssueKind::AmperageMismatch);
    }

    #[test]
    fn panel_ancestor_is_found_through_a_transformer() {
        let nodes = vec![
            disconnect("sd").with_voltage("480V"),
            EquipmentNode::new("xf", EquipmentType::Transformer)
                .with_parent("sd")
                .with_voltage("480/208Y"),
            panel("p", "xf").with_level(2).with_voltage("208Y/120V"),
        ];
        let report = validate_hierarchy(&nodes);
        assert!(report.is_clean(), "{report}");
        assert!(has_ancestor_of_type(&nodes, &nodes[2], EquipmentType::ServiceDisconnect)
            .is_found());
    }

    #[test]
    fn root_panels_are_not_checked_for_ancestors() {
        let nodes = vec![EquipmentNode::new("p", EquipmentType::Panel)];
        assert!(validate_hierarchy(&nodes).is_clean());
    }

    #[test]
    fn linked_panel_without_a_level_is_still_checked() {
        let mut linked = EquipmentNode::new("p", EquipmentType::Panel);
        linked.parent_id = Some(EquipmentId::new("xf"));
        let nodes = vec![EquipmentNode::new("xf", EquipmentType::Transformer), linked];
        assert_eq!(nodes[1].hierarchy_level, 0);

        let report = validate_hierarchy(&nodes);
        assert_eq!(report.info_count(), 1);
        assert_eq!(
            report.info[0].kind,
            IssueKind::MissingServiceDisconnect
        );
    }

    #[test]
    fn cycles_terminate_and_warn() {
        let nodes = vec![panel("a", "b"), panel("b", "a")];
        let report = validate_hierarchy(&nodes);
        let cycle: Vec<_> = report.issues_of_kind(IssueKind::InvalidHierarchy).collect();
        assert_eq!(cycle.len(), 2);
        assert_eq!(report.info.len(), 2);
        assert_eq!(
            has_ancestor_of_type(&nodes, &nodes[0], EquipmentType::ServiceDisconnect),
            AncestorSearch::Cycle
        );
    }

    #[test]
    fn self_parent_is_a_cycle() {
        let nodes = vec![panel("a", "a")];
        let report = validate_hierarchy(&nodes);
        assert_eq!(report.issues_of_kind(IssueKind::InvalidHierarchy).count(), 1);
    }

    #[test]
    fn repeated_runs_are_identical() {
        let nodes = vec![
            disconnect("sd").with_voltage("240V").with_amperage("100A"),
            panel("p1", "sd").with_voltage("480V").with_amperage("200A"),
            panel("p2", "missing"),
            panel("p3", "p1").with_level(2).with_voltage("600V"),
        ];
        let first = validate_hierarchy(&nodes);
        let second = validate_hierarchy(&nodes);
        assert_eq!(first, second);
        assert_eq!(first.errors.len(), 2);
        assert_eq!(first.errors[0].equipment_id, EquipmentId::new("p1"));
        assert_eq!(first.errors[1].equipment_id, EquipmentId::new("p3"));
    }

    #[test]
    fn custom_tolerances_apply() {
        let nodes = vec![
            disconnect("sd").with_voltage("480V"),
            panel("p", "sd").with_voltage("500V"),
        ];
        assert!(validate_hierarchy(&nodes).can_save());
        let strict = ValidationConfig {
            voltage_tolerance: 1.0,
            ..ValidationConfig::default()
        };
        assert!(!validate_hierarchy_with(&nodes, &strict).can_save());
    }

    #[test]
    fn installation_checks_flag_overfilled_conduit_and_small_feeders() {
        let inputs = UserInputs {
            designation: "LP-1".into(),
            location: "Electrical room".into(),
            phase_wire_size: Some("3/0 AWG".into()),
            neutral_wire_size: Some("3/0 AWG".into()),
            ground_wire_size: Some("6 AWG".into()),
            conduit_size: Some("1\"".into()),
            ..UserInputs::default()
        };
        let nodes = vec![EquipmentNode::new("lp-1", EquipmentType::Panel)
            .with_amperage("400A")
            .with_user_inputs(inputs)];

        let report = validate_installation(&nodes);
        assert_eq!(report.warnings.len(), 2);
        assert_eq!(report.warnings[0].kind, IssueKind::ConduitFill);
        assert!(report.warnings[0]
            .suggested_action
            .as_deref()
            .unwrap()
            .contains("3\" conduit"));
        assert_eq!(report.warnings[1].kind, IssueKind::WireAmpacity);
        assert!(report.can_save());
    }

    #[test]
    fn survey_review_merges_installation_checks_when_enabled() {
        let inputs = UserInputs {
            phase_wire_size: Some("4/0 AWG".into()),
            ..UserInputs::default()
        };
        let nodes = vec![EquipmentNode::new("p", EquipmentType::Panel)
            .with_amperage("400A")
            .with_user_inputs(inputs)];
        let config = ValidationConfig::default();
        assert_eq!(validate_survey(&nodes, &config).warning_count(), 1);

        let off = ValidationConfig {
            check_installation: false,
            ..config
        };
        assert!(validate_survey(&nodes, &off).is_clean());
    }
}
