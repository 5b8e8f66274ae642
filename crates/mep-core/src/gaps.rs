//! Data-gap review for surveyed equipment.
//!
//! Hierarchy checks say whether the surveyed equipment fits together; the gap
//! summary says how much of each nameplate was actually read. It covers
//! fields the extractor reported as missing, fields scored below
//! [`LOW_CONFIDENCE_THRESHOLD`] and image-quality flags.

use crate::{EquipmentId, EquipmentNode};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Field confidence below this is called out for manual verification.
pub const LOW_CONFIDENCE_THRESHOLD: f64 = 0.7;

/// Gaps found on one surveyed item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemGaps {
    pub equipment_id: EquipmentId,
    pub missing_fields: Vec<String>,
    /// Field names with confidence below the threshold, alphabetical
    pub low_confidence_fields: Vec<String>,
    pub quality_flags: Vec<String>,
}

impl ItemGaps {
    pub fn for_node(node: &EquipmentNode) -> Self {
        let data = &node.extracted_data;

        let mut missing_fields: Vec<String> = Vec::new();
        for field in &data.missing_fields {
            let field = field.trim();
            if !field.is_empty() && !missing_fields.iter().any(|f| f.eq_ignore_ascii_case(field)) {
                missing_fields.push(field.to_string());
            }
        }
        if data.voltage().is_none() && !missing_fields.iter().any(|f| f.eq_ignore_ascii_case("voltage"))
        {
            missing_fields.push("voltage".to_string());
        }

        let low_confidence_fields = data
            .confidence_scores
            .iter()
            .filter(|(_, score)| **score < LOW_CONFIDENCE_THRESHOLD)
            .map(|(field, _)| field.clone())
            .collect();

        let quality = &data.extraction_quality;
        let mut quality_flags = Vec::new();
        for (set, flag) in [
            (quality.blurry, "blurry"),
            (quality.glare, "glare"),
            (quality.partially_obscured, "partially obscured"),
        ] {
            if set {
                quality_flags.push(flag.to_string());
            }
        }
        if let Some(overall) = quality.overall.as_deref() {
            if overall.trim().eq_ignore_ascii_case("poor") {
                quality_flags.push("poor image".to_string());
            }
        }

        Self {
            equipment_id: node.id.clone(),
            missing_fields,
            low_confidence_fields,
            quality_flags,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.missing_fields.is_empty()
            && self.low_confidence_fields.is_empty()
            && self.quality_flags.is_empty()
    }
}

/// Survey-wide gap statistics shown at REVIEW
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GapSummary {
    pub surveyed: usize,
    pub skipped: usize,
    pub with_missing_fields: usize,
    pub with_low_confidence: usize,
    pub with_quality_flags: usize,
    /// How many items lack each field
    pub missing_field_counts: BTreeMap<String, usize>,
    /// Only items with at least one gap, in survey order
    pub items: Vec<ItemGaps>,
}

impl GapSummary {
    /// Summarize `nodes` (the surveyed items) alongside the skipped-image count.
    pub fn from_nodes(nodes: &[EquipmentNode], skipped: usize) -> Self {
        let mut summary = Self {
            surveyed: nodes.len(),
            skipped,
            ..Self::default()
        };
        for node in nodes {
            let gaps = ItemGaps::for_node(node);
            if gaps.is_empty() {
                continue;
            }
            if !gaps.missing_fields.is_empty() {
                summary.with_missing_fields += 1;
            }
            if !gaps.low_confidence_fields.is_empty() {
                summary.with_low_confidence += 1;
            }
            if !gaps.quality_flags.is_empty() {
                summary.with_quality_flags += 1;
            }
            for field in &gaps.missing_fields {
                *summary
                    .missing_field_counts
                    .entry(field.to_ascii_lowercase())
                    .or_default() += 1;
            }
            summary.items.push(gaps);
        }
        summary
    }

    /// True when every surveyed nameplate was read in full and nothing was skipped.
    pub fn is_complete(&self) -> bool {
        self.skipped == 0 && self.items.is_empty()
    }

    pub fn summary(&self) -> String {
        let mut parts = vec![format!("{} surveyed, {} skipped", self.surveyed, self.skipped)];
        if self.with_missing_fields > 0 {
            parts.push(format!("{} missing nameplate fields", self.with_missing_fields));
        }
        if self.with_low_confidence > 0 {
            parts.push(format!("{} with low-confidence fields", self.with_low_confidence));
        }
        if self.with_quality_flags > 0 {
            parts.push(format!("{} with image-quality flags", self.with_quality_flags));
        }
        parts.join("; ")
    }
}

impl std::fmt::Display for GapSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Gaps: {}", self.summary())?;
        for item in &self.items {
            let mut notes = Vec::new();
            if !item.missing_fields.is_empty() {
                notes.push(format!("missing {}", item.missing_fields.join(", ")));
            }
            if !item.low_confidence_fields.is_empty() {
                notes.push(format!("verify {}", item.low_confidence_fields.join(", ")));
            }
            if !item.quality_flags.is_empty() {
                notes.push(item.quality_flags.join(", "));
            }
            writeln!(f, "  {}: {}", item.equipment_id, notes.join("; "))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{EquipmentType, ExtractedData, ExtractionQuality};

    fn node(id: &str, data: ExtractedData) -> EquipmentNode {
        let mut node = EquipmentNode::new(id, EquipmentType::Panel);
        node.extracted_data = data;
        node
    }

    #[test]
    fn fully_read_nameplates_have_no_gaps() {
        let data = ExtractedData {
            voltage: Some("208Y/120V".into()),
            amperage: Some("225A".into()),
            confidence_scores: [("voltage".to_string(), 0.9)].into_iter().collect(),
            ..ExtractedData::default()
        };
        let summary = GapSummary::from_nodes(&[node("lp-1", data)], 0);
        assert!(summary.is_complete());
        assert_eq!(summary.summary(), "1 surveyed, 0 skipped");
    }

    #[test]
    fn missing_low_confidence_and_flagged_items_are_counted() {
        let partial = ExtractedData {
            voltage: Some("480 - 208Y/120V".into()),
            missing_fields: vec!["amperage".into(), "model".into(), "Amperage".into()],
            confidence_scores: [
                ("voltage".to_string(), 0.65),
                ("kva".to_string(), 0.95),
            ]
            .into_iter()
            .collect(),
            ..ExtractedData::default()
        };
        let unreadable = ExtractedData {
            voltage: Some("Not Available".into()),
            amperage: Some("100A".into()),
            extraction_quality: ExtractionQuality {
                overall: Some("Poor".into()),
                glare: true,
                ..ExtractionQuality::default()
            },
            ..ExtractedData::default()
        };
        let clean = ExtractedData {
            voltage: Some("480V".into()),
            ..ExtractedData::default()
        };
        let nodes = vec![node("xf-1", partial), node("lp-2", unreadable), node("sd-1", clean)];

        let summary = GapSummary::from_nodes(&nodes, 2);
        assert_eq!(summary.surveyed, 3);
        assert_eq!(summary.skipped, 2);
        assert_eq!(summary.with_missing_fields, 2);
        assert_eq!(summary.with_low_confidence, 1);
        assert_eq!(summary.with_quality_flags, 1);
        assert_eq!(summary.missing_field_counts["amperage"], 1);
        assert_eq!(summary.missing_field_counts["voltage"], 1);
        assert_eq!(summary.items.len(), 2);

        assert_eq!(summary.items[0].missing_fields, vec!["amperage", "model"]);
        assert_eq!(summary.items[0].low_confidence_fields, vec!["voltage"]);
        assert_eq!(summary.items[1].missing_fields, vec!["voltage"]);
        assert_eq!(summary.items[1].quality_flags, vec!["glare", "poor image"]);
        assert!(!summary.is_complete());
        assert_eq!(
            summary.summary(),
            "3 surveyed, 2 skipped; 2 missing nameplate fields; 1 with low-confidence fields; 1 with image-quality flags"
        );
        assert!(summary.to_string().contains("  lp-2: missing voltage; glare, poor image"));
    }

    #[test]
    fn skipped_images_alone_make_the_survey_incomplete() {
        let summary = GapSummary::from_nodes(&[], 1);
        assert!(!summary.is_complete());
        assert_eq!(summary.summary(), "0 surveyed, 1 skipped");
    }
}
