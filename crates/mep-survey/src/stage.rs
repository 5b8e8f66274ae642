use serde::{Deserialize, Serialize};
use std::fmt;

/// The six screens of a nameplate survey, in forward order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SurveyStage {
    ImageUpload,
    Classification,
    AiAnalysis,
    UserInputs,
    Review,
    Save,
}

impl SurveyStage {
    pub const ALL: [SurveyStage; 6] = [
        SurveyStage::ImageUpload,
        SurveyStage::Classification,
        SurveyStage::AiAnalysis,
        SurveyStage::UserInputs,
        SurveyStage::Review,
        SurveyStage::Save,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SurveyStage::ImageUpload => "IMAGE_UPLOAD",
            SurveyStage::Classification => "CLASSIFICATION",
            SurveyStage::AiAnalysis => "AI_ANALYSIS",
            SurveyStage::UserInputs => "USER_INPUTS",
            SurveyStage::Review => "REVIEW",
            SurveyStage::Save => "SAVE",
        }
    }

    /// 1-based position for "step N of 6" displays.
    pub fn ordinal(&self) -> usize {
        Self::ALL.iter().position(|s| s == self).unwrap_or(0) + 1
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, SurveyStage::Save)
    }

    /// Whether the workflow may move from `self` to `next`.
    ///
    /// Forward moves go one stage at a time. Classification falls back to
    /// upload on failure. The only user-driven backward moves are
    /// USER_INPUTS → AI_ANALYSIS and REVIEW → USER_INPUTS.
    pub fn can_transition_to(&self, next: SurveyStage) -> bool {
        use SurveyStage::*;
        matches!(
            (self, next),
            (ImageUpload, Classification)
                | (Classification, AiAnalysis)
                | (Classification, ImageUpload)
                | (AiAnalysis, UserInputs)
                | (UserInputs, Review)
                | (UserInputs, AiAnalysis)
                | (Review, UserInputs)
                | (Review, Save)
        )
    }
}

impl fmt::Display for SurveyStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
