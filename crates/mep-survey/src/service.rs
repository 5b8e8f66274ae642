//! The seam between the workflow and the vision model.
//!
//! Classification and extraction are external collaborators. The workflow
//! only depends on [`ExtractionService`]; production code plugs in a network
//! client, tests and the CLI plug in [`crate::script::ScriptedService`].

use mep_core::{EquipmentType, ExtractedData, MepResult};
use serde::{Deserialize, Serialize};

/// An uploaded nameplate photo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurveyImage {
    pub name: String,
    #[serde(default)]
    pub media_type: Option<String>,
    #[serde(default)]
    pub size_bytes: Option<u64>,
}

impl SurveyImage {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            media_type: None,
            size_bytes: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

/// Classifier verdict for one image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Classification {
    /// Raw classifier label, e.g. `PANEL_NAMEPLATE` or `UNKNOWN`
    pub equipment_type: String,
    pub confidence: Confidence,
    #[serde(default)]
    pub image_quality: String,
    /// `NONE` means the nameplate cannot be read at all
    #[serde(default)]
    pub extraction_feasibility: String,
    #[serde(default)]
    pub issues: Vec<String>,
}

impl Classification {
    /// Hierarchy type for this label, `None` for `UNKNOWN` and non-distribution gear.
    pub fn hierarchy_type(&self) -> Option<EquipmentType> {
        EquipmentType::from_classification(&self.equipment_type)
    }

    pub fn extraction_possible(&self) -> bool {
        !self.extraction_feasibility.trim().eq_ignore_ascii_case("NONE")
    }
}

/// Classification and nameplate extraction, called once per image in order.
pub trait ExtractionService {
    fn classify(&self, image: &SurveyImage) -> MepResult<Classification>;

    fn extract(
        &self,
        image: &SurveyImage,
        classification: &Classification,
    ) -> MepResult<ExtractedData>;
}
