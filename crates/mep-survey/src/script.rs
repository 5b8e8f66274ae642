//! Replay service for offline survey runs.
//!
//! A survey script lists images in upload order with the classifier and
//! extractor responses to replay for each, the surveyor's field inputs and
//! any review-time edits:
//!
//! ```yaml
//! project_id: bldg-7
//! images:
//!   - name: main-disconnect.jpg
//!     classification:
//!       equipmentType: SERVICE_DISCONNECT_NAMEPLATE
//!       confidence: high
//!       extractionFeasibility: FULL
//!     extraction:
//!       voltage: 480V
//!       amperage: 400A
//!     user_inputs:
//!       designation: MDP
//!       location: Electrical room
//!       phaseWireSize: 500 kcmil
//!       groundWireSize: 3 AWG
//!       conduitSize: 4"
//! ```
//!
//! Equipment ids are derived from image names (`main-disconnect.jpg` becomes
//! `main-disconnect`), so `fedFrom` can point at another image's stem.

use crate::service::{Classification, ExtractionService, SurveyImage};
use anyhow::{Context, Result};
use mep_core::{Edit, ExtractedData, MepError, MepResult, UserInputs};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SurveyScript {
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub project_name: Option<String>,
    pub images: Vec<ScriptedImage>,
    /// Applied in order once the survey reaches REVIEW
    #[serde(default)]
    pub edits: Vec<Edit>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptedImage {
    pub name: String,
    #[serde(default)]
    pub classification: Option<Classification>,
    #[serde(default)]
    pub extraction: Option<ExtractedData>,
    /// Replay a classifier failure with this message
    #[serde(default)]
    pub fail_classification: Option<String>,
    /// Replay an extractor failure with this message
    #[serde(default)]
    pub fail_extraction: Option<String>,
    #[serde(default)]
    pub user_inputs: Option<UserInputs>,
}

pub fn load_script_from_path(path: &Path) -> Result<SurveyScript> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("reading survey script '{}'", path.display()))?;
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") => {
            serde_yaml::from_str(&data).context("parsing survey script yaml")
        }
        Some(ext) if ext.eq_ignore_ascii_case("json") => {
            serde_json::from_str(&data).context("parsing survey script json")
        }
        _ => serde_yaml::from_str(&data)
            .or_else(|_| serde_json::from_str(&data))
            .context("parsing survey script"),
    }
}

/// [`ExtractionService`] that answers from a [`SurveyScript`].
#[derive(Debug, Clone, Default)]
pub struct ScriptedService {
    order: Vec<String>,
    entries: HashMap<String, ScriptedImage>,
}

impl ScriptedService {
    pub fn new(images: Vec<ScriptedImage>) -> Self {
        let mut service = Self::default();
        for image in images {
            service.order.push(image.name.clone());
            service.entries.insert(image.name.clone(), image);
        }
        service
    }

    pub fn from_script(script: &SurveyScript) -> Self {
        Self::new(script.images.clone())
    }

    /// Images in upload order.
    pub fn images(&self) -> Vec<SurveyImage> {
        self.order.iter().map(SurveyImage::new).collect()
    }

    pub fn inputs_for(&self, image_name: &str) -> Option<&UserInputs> {
        self.entries.get(image_name)?.user_inputs.as_ref()
    }

    fn entry(&self, image: &SurveyImage) -> MepResult<&ScriptedImage> {
        self.entries.get(&image.name).ok_or_else(|| {
            MepError::Service(format!("no scripted response for image '{}'", image.name))
        })
    }
}

impl ExtractionService for ScriptedService {
    fn classify(&self, image: &SurveyImage) -> MepResult<Classification> {
        let entry = self.entry(image)?;
        if let Some(message) = &entry.fail_classification {
            return Err(MepError::Service(message.clone()));
        }
        entry.classification.clone().ok_or_else(|| {
            MepError::Service(format!("no classification scripted for '{}'", image.name))
        })
    }

    fn extract(
        &self,
        image: &SurveyImage,
        _classification: &Classification,
    ) -> MepResult<ExtractedData> {
        let entry = self.entry(image)?;
        if let Some(message) = &entry.fail_extraction {
            return Err(MepError::Service(message.clone()));
        }
        Ok(entry.extraction.clone().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SCRIPT: &str = r#"
project_id: bldg-7
images:
  - name: mystery.jpg
    classification:
      equipmentType: UNKNOWN
      confidence: low
  - name: panel-a.jpg
    classification:
      equipmentType: PANEL_NAMEPLATE
      confidence: high
      extractionFeasibility: FULL
    extraction:
      voltage: 208Y/120V
      amperage: 225A
    user_inputs:
      designation: LP-1
      location: Corridor
edits:
  - op: set_amperage
    id: panel-a
    amperage: 200A
"#;

    #[test]
    fn yaml_script_round_trips_through_service() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        file.write_all(SCRIPT.as_bytes()).unwrap();

        let script = load_script_from_path(file.path()).unwrap();
        assert_eq!(script.project_id.as_deref(), Some("bldg-7"));
        assert_eq!(script.edits.len(), 1);

        let service = ScriptedService::from_script(&script);
        let images = service.images();
        assert_eq!(images[0].name, "mystery.jpg");

        let c = service.classify(&images[1]).unwrap();
        let data = service.extract(&images[1], &c).unwrap();
        assert_eq!(data.voltage.as_deref(), Some("208Y/120V"));
        assert_eq!(
            service.inputs_for("panel-a.jpg").map(|i| i.designation.as_str()),
            Some("LP-1")
        );
    }

    #[test]
    fn scripted_failures_surface_as_service_errors() {
        let service = ScriptedService::new(vec![ScriptedImage {
            name: "bad.jpg".into(),
            classification: None,
            extraction: None,
            fail_classification: Some("model timeout".into()),
            fail_extraction: None,
            user_inputs: None,
        }]);
        let err = service.classify(&SurveyImage::new("bad.jpg")).unwrap_err();
        assert!(matches!(err, MepError::Service(ref m) if m == "model timeout"));

        let err = service.classify(&SurveyImage::new("other.jpg")).unwrap_err();
        assert!(err.to_string().contains("other.jpg"));
    }
}
