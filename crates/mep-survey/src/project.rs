//! The persisted project record: saved equipment with stable sequence
//! numbers and the summary aggregates recomputed on every save.

use chrono::{DateTime, Utc};
use mep_core::{EquipmentNode, EquipmentType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// A persisted survey project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub equipment: Vec<SavedEquipment>,
    #[serde(default)]
    pub summary: ProjectSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedEquipment {
    /// 1-based, assigned on first save and never reused
    pub sequence: u32,
    pub saved_at: DateTime<Utc>,
    #[serde(flatten)]
    pub node: EquipmentNode,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSummary {
    pub total_equipment: usize,
    pub by_type: BTreeMap<EquipmentType, usize>,
    /// Mean over items of each item's mean field confidence
    pub average_confidence: Option<f64>,
    pub last_updated: Option<DateTime<Utc>>,
}

impl Project {
    pub fn new(id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            name: None,
            created_at: now,
            updated_at: now,
            equipment: Vec::new(),
            summary: ProjectSummary::default(),
        }
    }

    /// New project with a generated id.
    pub fn create(name: impl Into<String>) -> Self {
        let mut project = Self::new(Uuid::new_v4().to_string());
        project.name = Some(name.into());
        project
    }

    fn next_sequence(&self) -> u32 {
        self.equipment
            .iter()
            .map(|e| e.sequence)
            .max()
            .unwrap_or(0)
            + 1
    }

    /// Merge surveyed nodes into the collection and refresh the summary.
    ///
    /// A node whose id is already stored replaces it in place and keeps its
    /// sequence number; new ids are appended with the next sequence.
    /// Returns the sequence numbers in node order.
    pub fn merge_equipment(&mut self, nodes: &[EquipmentNode], now: DateTime<Utc>) -> Vec<u32> {
        let mut sequences = Vec::with_capacity(nodes.len());
        for node in nodes {
            match self.equipment.iter_mut().find(|e| e.node.id == node.id) {
                Some(existing) => {
                    existing.node = node.clone();
                    existing.saved_at = now;
                    sequences.push(existing.sequence);
                }
                None => {
                    let sequence = self.next_sequence();
                    self.equipment.push(SavedEquipment {
                        sequence,
                        saved_at: now,
                        node: node.clone(),
                    });
                    sequences.push(sequence);
                }
            }
        }
        self.updated_at = now;
        self.recompute_summary();
        sequences
    }

    pub fn recompute_summary(&mut self) {
        let mut by_type = BTreeMap::new();
        for saved in &self.equipment {
            *by_type.entry(saved.node.equipment_type).or_insert(0) += 1;
        }
        let confidences: Vec<f64> = self
            .equipment
            .iter()
            .filter_map(|e| e.node.extracted_data.mean_confidence())
            .collect();
        let average_confidence = if confidences.is_empty() {
            None
        } else {
            Some(confidences.iter().sum::<f64>() / confidences.len() as f64)
        };
        self.summary = ProjectSummary {
            total_equipment: self.equipment.len(),
            by_type,
            average_confidence,
            last_updated: Some(self.updated_at),
        };
    }

    pub fn nodes(&self) -> Vec<EquipmentNode> {
        self.equipment.iter().map(|e| e.node.clone()).collect()
    }
}
