//! Review-time edits as a pure reducer.
//!
//! `apply_edit(nodes, edit)` returns a new list and never touches the input;
//! the workflow re-runs validation on the result. Edits naming an id that is
//! not in the list leave the list unchanged.

use crate::graph_utils::assign_levels;
use crate::{EquipmentId, EquipmentNode, EquipmentType, UserInputs};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Edit {
    SetVoltage {
        id: EquipmentId,
        voltage: Option<String>,
    },
    SetAmperage {
        id: EquipmentId,
        amperage: Option<String>,
    },
    SetType {
        id: EquipmentId,
        equipment_type: EquipmentType,
    },
    /// Re-point (or clear) the parent link; levels are recomputed.
    SetParent {
        id: EquipmentId,
        parent: Option<EquipmentId>,
    },
    SetUserInputs {
        id: EquipmentId,
        inputs: UserInputs,
    },
    /// Drop a node; its children become roots.
    Remove { id: EquipmentId },
}

impl Edit {
    pub fn target(&self) -> &EquipmentId {
        match self {
            Edit::SetVoltage { id, .. }
            | Edit::SetAmperage { id, .. }
            | Edit::SetType { id, .. }
            | Edit::SetParent { id, .. }
            | Edit::SetUserInputs { id, .. }
            | Edit::Remove { id } => id,
        }
    }

    fn reshapes_hierarchy(&self) -> bool {
        matches!(
            self,
            Edit::SetParent { .. } | Edit::SetUserInputs { .. } | Edit::Remove { .. }
        )
    }
}

pub fn apply_edit(nodes: &[EquipmentNode], edit: Edit) -> Vec<EquipmentNode> {
    if !nodes.iter().any(|n| &n.id == edit.target()) {
        tracing::debug!(target_id = %edit.target(), "edit ignored; equipment not found");
        return nodes.to_vec();
    }
    let reshapes = edit.reshapes_hierarchy();

    let edited: Vec<EquipmentNode> = match edit {
        Edit::Remove { id } => nodes
            .iter()
            .filter(|n| n.id != id)
            .cloned()
            .map(|mut n| {
                if n.parent_id.as_ref() == Some(&id) {
                    n.parent_id = None;
                    n.user_inputs.fed_from = None;
                }
                n
            })
            .collect(),
        edit => nodes
            .iter()
            .cloned()
            .map(|mut n| {
                if &n.id == edit.target() {
                    apply_to_node(&mut n, &edit);
                }
                n
            })
            .collect(),
    };

    if reshapes {
        assign_levels(&edited)
    } else {
        edited
    }
}

fn apply_to_node(node: &mut EquipmentNode, edit: &Edit) {
    match edit {
        Edit::SetVoltage { voltage, .. } => node.extracted_data.voltage = voltage.clone(),
        Edit::SetAmperage { amperage, .. } => node.extracted_data.amperage = amperage.clone(),
        Edit::SetType { equipment_type, .. } => node.equipment_type = *equipment_type,
        Edit::SetParent { parent, .. } => {
            node.parent_id = parent.clone();
            node.user_inputs.fed_from = parent.clone();
        }
        Edit::SetUserInputs { inputs, .. } => {
            node.user_inputs = inputs.clone();
            node.parent_id = inputs.fed_from.clone();
        }
        Edit::Remove { .. } => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate_hierarchy;

    fn nodes() -> Vec<EquipmentNode> {
        vec![
            EquipmentNode::new("sd", EquipmentType::ServiceDisconnect).with_voltage("480V"),
            EquipmentNode::new("p1", EquipmentType::Panel)
                .with_parent("sd")
                .with_voltage("600V"),
            EquipmentNode::new("p2", EquipmentType::Panel)
                .with_parent("p1")
                .with_level(2),
        ]
    }

    #[test]
    fn correcting_a_voltage_clears_the_error() {
        let before = nodes();
        assert!(!validate_hierarchy(&before).can_save());

        let after = apply_edit(
            &before,
            Edit::SetVoltage {
                id: EquipmentId::new("p1"),
                voltage: Some("480V".into()),
            },
        );
        assert!(validate_hierarchy(&after).can_save());
        // input untouched
        assert_eq!(before[1].extracted_data.voltage.as_deref(), Some("600V"));
    }

    #[test]
    fn removing_a_node_orphans_its_children_as_roots() {
        let after = apply_edit(&nodes(), Edit::Remove { id: EquipmentId::new("p1") });
        assert_eq!(after.len(), 2);
        assert!(after[1].is_root());
        assert_eq!(after[1].hierarchy_level, 0);
    }

    #[test]
    fn reparenting_recomputes_levels() {
        let after = apply_edit(
            &nodes(),
            Edit::SetParent {
                id: EquipmentId::new("p2"),
                parent: Some(EquipmentId::new("sd")),
            },
        );
        assert_eq!(after[2].hierarchy_level, 1);
        assert_eq!(after[2].user_inputs.fed_from, Some(EquipmentId::new("sd")));
    }

    #[test]
    fn unknown_target_is_a_no_op() {
        let before = nodes();
        let after = apply_edit(
            &before,
            Edit::SetType {
                id: EquipmentId::new("nope"),
                equipment_type: EquipmentType::Meter,
            },
        );
        assert_eq!(before, after);
    }

    #[test]
    fn edits_deserialize_from_tagged_json() {
        let edit: Edit =
            serde_json::from_str(r#"{"op":"set_amperage","id":"p1","amperage":"225A"}"#).unwrap();
        assert_eq!(edit.target(), &EquipmentId::new("p1"));
    }
}
