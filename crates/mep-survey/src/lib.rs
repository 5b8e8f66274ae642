//! # mep-survey: Nameplate Survey Workflow
//!
//! Drives a survey from uploaded photos to a saved project:
//!
//! - [`stage`] - the six workflow stages and their allowed transitions
//! - [`service`] - the classification/extraction seam ([`ExtractionService`])
//! - [`script`] - a replay service fed from YAML/JSON survey scripts
//! - [`inputs`] - per-field checks on surveyor input
//! - [`project`] - the persisted project record and its summary
//! - [`repository`] - the storage seam with in-memory and JSON-file stores
//! - [`workflow`] - the [`Survey`] state machine itself
//!
//! Services are called one image at a time, in upload order.

pub mod inputs;
pub mod project;
pub mod repository;
pub mod script;
pub mod service;
pub mod stage;
pub mod workflow;

pub use inputs::validate_user_inputs;
pub use project::{Project, ProjectSummary, SavedEquipment};
pub use repository::{InMemoryRepository, JsonFileRepository, ProjectRepository};
pub use script::{load_script_from_path, ScriptedImage, ScriptedService, SurveyScript};
pub use service::{Classification, Confidence, ExtractionService, SurveyImage};
pub use stage::SurveyStage;
pub use workflow::{AnalysisSummary, Progress, SaveOutcome, Survey, SurveyItem};
