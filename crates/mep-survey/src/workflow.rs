//! The survey state machine.
//!
//! ```text
//! IMAGE_UPLOAD → CLASSIFICATION → AI_ANALYSIS → USER_INPUTS → REVIEW → SAVE
//!                                      ↑______________|  ↑_______|
//! ```
//!
//! Every stage method checks the current stage first and returns
//! [`MepError::InvalidTransition`] when called out of turn. Stage failures
//! (service errors, empty or unusable input, blocked saves) are recorded in
//! [`Survey::last_error`] and leave the survey in the last stable stage.

use crate::inputs::validate_user_inputs;
use crate::project::ProjectSummary;
use crate::repository::ProjectRepository;
use crate::service::{Classification, ExtractionService, SurveyImage};
use crate::stage::SurveyStage;
use chrono::Utc;
use mep_core::{
    apply_edit, assign_levels, validate_survey, Edit, EquipmentId, EquipmentNode,
    EquipmentType, ExtractedData, GapSummary, HierarchyReport, MepError, MepResult, UserInputs,
    ValidationConfig,
};
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use tracing::{info, warn};

/// One classified image and everything gathered about it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SurveyItem {
    pub id: EquipmentId,
    pub image: SurveyImage,
    pub classification: Classification,
    pub equipment_type: Option<EquipmentType>,
    /// `None` until extracted, and for skipped items
    pub extracted_data: Option<ExtractedData>,
    pub skip_reason: Option<String>,
    pub user_inputs: Option<UserInputs>,
}

impl SurveyItem {
    pub fn is_skipped(&self) -> bool {
        self.skip_reason.is_some()
    }

    /// Extracted and not skipped, so it takes part in the hierarchy.
    pub fn is_valid(&self) -> bool {
        !self.is_skipped() && self.extracted_data.is_some() && self.equipment_type.is_some()
    }

    fn to_node(&self) -> Option<EquipmentNode> {
        let equipment_type = self.equipment_type?;
        let extracted_data = self.extracted_data.clone()?;
        let user_inputs = self.user_inputs.clone().unwrap_or_default();
        Some(EquipmentNode {
            id: self.id.clone(),
            equipment_type,
            parent_id: user_inputs.fed_from.clone(),
            hierarchy_level: 0,
            extracted_data,
            user_inputs,
        })
    }
}

/// Per-image progress for the sequential service loops.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub stage: SurveyStage,
    pub current: usize,
    pub total: usize,
    pub verb: &'static str,
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} image {} of {}", self.verb, self.current, self.total)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AnalysisSummary {
    pub extracted: usize,
    pub skipped: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveOutcome {
    pub project_id: String,
    pub saved: usize,
    pub sequences: Vec<u32>,
    pub summary: ProjectSummary,
}

#[derive(Debug, Clone)]
pub struct Survey {
    project_id: String,
    project_name: Option<String>,
    stage: SurveyStage,
    config: ValidationConfig,
    images: Vec<SurveyImage>,
    items: Vec<SurveyItem>,
    cursor: usize,
    nodes: Vec<EquipmentNode>,
    report: HierarchyReport,
    progress: Option<Progress>,
    last_error: Option<String>,
    outcome: Option<SaveOutcome>,
}

impl Survey {
    pub fn new(project_id: impl Into<String>, config: ValidationConfig) -> Self {
        Self {
            project_id: project_id.into(),
            project_name: None,
            stage: SurveyStage::ImageUpload,
            config,
            images: Vec::new(),
            items: Vec::new(),
            cursor: 0,
            nodes: Vec::new(),
            report: HierarchyReport::new(),
            progress: None,
            last_error: None,
            outcome: None,
        }
    }

    pub fn with_project_name(mut self, name: impl Into<String>) -> Self {
        self.project_name = Some(name.into());
        self
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    pub fn stage(&self) -> SurveyStage {
        self.stage
    }

    pub fn images(&self) -> &[SurveyImage] {
        &self.images
    }

    /// All classified items, skipped ones included.
    pub fn items(&self) -> &[SurveyItem] {
        &self.items
    }

    pub fn valid_items(&self) -> impl Iterator<Item = &SurveyItem> {
        self.items.iter().filter(|item| item.is_valid())
    }

    pub fn skipped_items(&self) -> impl Iterator<Item = &SurveyItem> {
        self.items.iter().filter(|item| item.is_skipped())
    }

    /// The assembled hierarchy, populated from REVIEW on.
    pub fn nodes(&self) -> &[EquipmentNode] {
        &self.nodes
    }

    pub fn report(&self) -> &HierarchyReport {
        &self.report
    }

    /// Nameplate gaps across the surveyed items, available from REVIEW on.
    pub fn gap_summary(&self) -> Option<GapSummary> {
        matches!(self.stage, SurveyStage::Review | SurveyStage::Save)
            .then(|| GapSummary::from_nodes(&self.nodes, self.skipped_items().count()))
    }

    pub fn progress(&self) -> Option<&Progress> {
        self.progress.as_ref()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn outcome(&self) -> Option<&SaveOutcome> {
        self.outcome.as_ref()
    }

    // -- IMAGE_UPLOAD ------------------------------------------------------

    pub fn add_image(&mut self, image: SurveyImage) -> MepResult<()> {
        self.require(SurveyStage::ImageUpload, SurveyStage::ImageUpload)?;
        self.images.push(image);
        Ok(())
    }

    pub fn remove_image(&mut self, name: &str) -> MepResult<bool> {
        self.require(SurveyStage::ImageUpload, SurveyStage::ImageUpload)?;
        let before = self.images.len();
        self.images.retain(|image| image.name != name);
        Ok(self.images.len() != before)
    }

    // -- CLASSIFICATION ----------------------------------------------------

    /// Classify every image in upload order and move to AI_ANALYSIS.
    ///
    /// Any single failure discards the whole pass and returns to
    /// IMAGE_UPLOAD.
    pub fn classify(&mut self, service: &dyn ExtractionService) -> MepResult<()> {
        self.require(SurveyStage::ImageUpload, SurveyStage::Classification)?;
        if self.images.is_empty() {
            return Err(self.fail(MepError::EmptyInput(
                "Upload at least one nameplate image".to_string(),
            )));
        }
        self.last_error = None;
        self.transition(SurveyStage::Classification)?;

        let images = self.images.clone();
        let total = images.len();
        let mut taken = HashSet::new();
        let mut items = Vec::with_capacity(total);
        for (index, image) in images.into_iter().enumerate() {
            self.report_progress(index + 1, total, "Classifying");
            let classification = match service.classify(&image) {
                Ok(classification) => classification,
                Err(err) => {
                    self.progress = None;
                    self.items.clear();
                    self.transition(SurveyStage::ImageUpload)?;
                    return Err(self.fail(MepError::Service(format!(
                        "Classification failed for '{}': {}",
                        image.name,
                        service_message(&err)
                    ))));
                }
            };
            items.push(SurveyItem {
                id: unique_id(&image.name, &mut taken),
                equipment_type: classification.hierarchy_type(),
                classification,
                image,
                extracted_data: None,
                skip_reason: None,
                user_inputs: None,
            });
        }

        self.items = items;
        self.progress = None;
        self.cursor = 0;
        self.transition(SurveyStage::AiAnalysis)
    }

    // -- AI_ANALYSIS -------------------------------------------------------

    /// Extract nameplate data for each usable item, in order.
    ///
    /// Unrecognised equipment and unreadable nameplates are skipped with a
    /// reason. An extraction failure clears this pass and stays in
    /// AI_ANALYSIS so it can be retried.
    pub fn analyze(&mut self, service: &dyn ExtractionService) -> MepResult<AnalysisSummary> {
        self.require(SurveyStage::AiAnalysis, SurveyStage::AiAnalysis)?;
        self.last_error = None;

        let total = self.items.len();
        let mut summary = AnalysisSummary::default();
        for index in 0..total {
            let item = &mut self.items[index];
            item.extracted_data = None;
            if let Some(reason) = skip_reason(item) {
                warn!(image = %item.image.name, reason = %reason, "skipping image");
                item.skip_reason = Some(reason);
                summary.skipped += 1;
                continue;
            }
            item.skip_reason = None;

            self.report_progress(index + 1, total, "Extracting data from");
            let item = &self.items[index];
            match service.extract(&item.image, &item.classification) {
                Ok(data) => {
                    self.items[index].extracted_data = Some(data);
                    summary.extracted += 1;
                }
                Err(err) => {
                    let name = item.image.name.clone();
                    for item in &mut self.items {
                        item.extracted_data = None;
                        item.skip_reason = None;
                    }
                    self.progress = None;
                    return Err(self.fail(MepError::Service(format!(
                        "Extraction failed for '{}': {}",
                        name,
                        service_message(&err)
                    ))));
                }
            }
        }
        self.progress = None;
        info!(
            extracted = summary.extracted,
            skipped = summary.skipped,
            "analysis complete"
        );
        Ok(summary)
    }

    pub fn proceed_to_user_inputs(&mut self) -> MepResult<()> {
        self.require(SurveyStage::AiAnalysis, SurveyStage::UserInputs)?;
        if self.valid_count() == 0 {
            return Err(self.fail(MepError::NoValidEquipment(format!(
                "none of the {} image(s) produced usable equipment data",
                self.items.len()
            ))));
        }
        self.last_error = None;
        self.cursor = 0;
        self.transition(SurveyStage::UserInputs)
    }

    // -- USER_INPUTS -------------------------------------------------------

    /// The item awaiting surveyor input.
    pub fn current_item(&self) -> Option<&SurveyItem> {
        if self.stage != SurveyStage::UserInputs {
            return None;
        }
        self.valid_items().nth(self.cursor)
    }

    /// 1-based cursor position and number of valid items.
    pub fn position(&self) -> (usize, usize) {
        (self.cursor + 1, self.valid_count())
    }

    /// Validate and store inputs for the current item, then advance.
    ///
    /// Passing the last item assembles the hierarchy and moves to REVIEW.
    /// A validation failure keeps the cursor where it is.
    pub fn submit_inputs(&mut self, inputs: UserInputs) -> MepResult<()> {
        self.require(SurveyStage::UserInputs, SurveyStage::UserInputs)?;
        let Some(index) = self.valid_indices().get(self.cursor).copied() else {
            return Err(self.fail(MepError::NoValidEquipment(
                "no equipment left to fill in".to_string(),
            )));
        };
        let id = self.items[index].id.clone();
        if let Err(err) = validate_user_inputs(&inputs, &id) {
            return Err(self.fail(err));
        }
        self.last_error = None;
        self.items[index].user_inputs = Some(inputs);
        self.cursor += 1;
        if self.cursor >= self.valid_count() {
            self.enter_review()?;
        }
        Ok(())
    }

    /// Step back one item; from the first item, return to AI_ANALYSIS.
    pub fn go_back(&mut self) -> MepResult<()> {
        self.require(SurveyStage::UserInputs, SurveyStage::AiAnalysis)?;
        if self.cursor == 0 {
            self.transition(SurveyStage::AiAnalysis)
        } else {
            self.cursor -= 1;
            Ok(())
        }
    }

    fn enter_review(&mut self) -> MepResult<()> {
        let nodes: Vec<EquipmentNode> = self.valid_items().filter_map(SurveyItem::to_node).collect();
        self.nodes = assign_levels(&nodes);
        self.revalidate();
        self.transition(SurveyStage::Review)?;
        if let Some(gaps) = self.gap_summary() {
            info!(gaps = %gaps.summary(), "nameplate gaps reviewed");
        }
        Ok(())
    }

    // -- REVIEW ------------------------------------------------------------

    /// Re-run the orchestrator (and installation checks) over the hierarchy.
    pub fn revalidate(&mut self) -> &HierarchyReport {
        self.report = validate_survey(&self.nodes, &self.config);
        info!(summary = %self.report.summary(), "hierarchy validated");
        &self.report
    }

    pub fn apply_edit(&mut self, edit: Edit) -> MepResult<&HierarchyReport> {
        self.require(SurveyStage::Review, SurveyStage::Review)?;
        self.nodes = apply_edit(&self.nodes, edit);
        self.sync_items();
        Ok(self.revalidate())
    }

    /// Back to USER_INPUTS with the cursor on the last item.
    pub fn revise(&mut self) -> MepResult<()> {
        self.require(SurveyStage::Review, SurveyStage::UserInputs)?;
        self.cursor = self.valid_count().saturating_sub(1);
        self.transition(SurveyStage::UserInputs)
    }

    pub fn can_save(&self) -> bool {
        self.stage == SurveyStage::Review && self.report.can_save()
    }

    // -- SAVE --------------------------------------------------------------

    /// Merge the hierarchy into the stored project and finish the survey.
    ///
    /// Blocked while error-severity issues remain. A store failure leaves
    /// the survey in REVIEW.
    pub fn save(&mut self, repo: &mut dyn ProjectRepository) -> MepResult<SaveOutcome> {
        self.require(SurveyStage::Review, SurveyStage::Save)?;
        if !self.report.can_save() {
            let count = self.report.error_count();
            return Err(self.fail(MepError::SaveBlocked(count)));
        }

        let mut project = match repo.load(&self.project_id) {
            Ok(project) => project,
            Err(err) => return Err(self.fail(err)),
        };
        if project.name.is_none() {
            project.name = self.project_name.clone();
        }
        let sequences = project.merge_equipment(&self.nodes, Utc::now());
        if let Err(err) = repo.save(&project) {
            return Err(self.fail(err));
        }

        let outcome = SaveOutcome {
            project_id: project.id.clone(),
            saved: self.nodes.len(),
            sequences,
            summary: project.summary.clone(),
        };
        self.last_error = None;
        self.outcome = Some(outcome.clone());
        self.transition(SurveyStage::Save)?;
        Ok(outcome)
    }

    /// Abandon the survey from any stage, discarding in-memory state.
    pub fn cancel(self) {
        info!(
            project = %self.project_id,
            stage = %self.stage,
            items = self.items.len(),
            "survey cancelled"
        );
    }

    // -- internals ---------------------------------------------------------

    fn valid_indices(&self) -> Vec<usize> {
        self.items
            .iter()
            .enumerate()
            .filter(|(_, item)| item.is_valid())
            .map(|(index, _)| index)
            .collect()
    }

    fn valid_count(&self) -> usize {
        self.valid_items().count()
    }

    fn require(&self, expected: SurveyStage, to: SurveyStage) -> MepResult<()> {
        if self.stage == expected {
            Ok(())
        } else {
            Err(MepError::InvalidTransition {
                from: self.stage.to_string(),
                to: to.to_string(),
            })
        }
    }

    fn transition(&mut self, next: SurveyStage) -> MepResult<()> {
        if !self.stage.can_transition_to(next) {
            return Err(MepError::InvalidTransition {
                from: self.stage.to_string(),
                to: next.to_string(),
            });
        }
        info!(from = %self.stage, to = %next, "survey stage");
        self.stage = next;
        Ok(())
    }

    fn fail(&mut self, err: MepError) -> MepError {
        warn!(stage = %self.stage, error = %err, "survey step failed");
        self.last_error = Some(err.to_string());
        err
    }

    fn report_progress(&mut self, current: usize, total: usize, verb: &'static str) {
        let progress = Progress {
            stage: self.stage,
            current,
            total,
            verb,
        };
        info!("{progress}");
        self.progress = Some(progress);
    }

    /// Carry review edits back onto the items so a revise pass shows them.
    fn sync_items(&mut self) {
        for item in self.items.iter_mut().filter(|item| item.is_valid()) {
            match self.nodes.iter().find(|node| node.id == item.id) {
                Some(node) => {
                    item.equipment_type = Some(node.equipment_type);
                    item.extracted_data = Some(node.extracted_data.clone());
                    item.user_inputs = Some(node.user_inputs.clone());
                }
                None => item.skip_reason = Some("Removed during review".to_string()),
            }
        }
    }
}

fn skip_reason(item: &SurveyItem) -> Option<String> {
    let classification = &item.classification;
    if item.equipment_type.is_none() {
        let label = classification.equipment_type.trim();
        return Some(if label.eq_ignore_ascii_case("UNKNOWN") || label.is_empty() {
            "Equipment type could not be identified".to_string()
        } else {
            format!("Not electrical distribution equipment (classified as {label})")
        });
    }
    if !classification.extraction_possible() {
        return Some(if classification.issues.is_empty() {
            "Nameplate data cannot be extracted from this image".to_string()
        } else {
            format!(
                "Nameplate data cannot be extracted: {}",
                classification.issues.join(", ")
            )
        });
    }
    None
}

fn service_message(err: &MepError) -> String {
    match err {
        MepError::Service(message) => message.clone(),
        other => other.to_string(),
    }
}

/// Equipment id from an image name: lowercased file stem with runs of
/// other characters collapsed to `-`, suffixed `-2`, `-3`… on collision.
fn unique_id(image_name: &str, taken: &mut HashSet<String>) -> EquipmentId {
    let stem = match image_name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => image_name,
    };
    let mut slug = String::with_capacity(stem.len());
    for c in stem.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.ends_with('-') {
            slug.push('-');
        }
    }
    let slug = slug.trim_matches('-');
    let base = if slug.is_empty() { "equipment" } else { slug };

    let mut candidate = base.to_string();
    let mut n = 2;
    while !taken.insert(candidate.clone()) {
        candidate = format!("{base}-{n}");
        n += 1;
    }
    EquipmentId::new(candidate)
}
