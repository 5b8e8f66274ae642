//! Parent/child voltage and amperage step validators.
//!
//! Power should step *down* the hierarchy. A child rated above its parent
//! by more than the tolerance is reported; a missing reading on either side
//! passes with a note, since nameplate photos are often partially legible.

use crate::diagnostics::IssueKind;
use crate::units::{Amperes, Volts};
use serde::{Deserialize, Serialize};

/// Transformer secondary taps can sit up to 5% above nominal.
pub const VOLTAGE_STEP_TOLERANCE: f64 = 1.05;

/// Feeders and breakers are routinely oversized up to 125%.
pub const AMPERAGE_STEP_TOLERANCE: f64 = 1.25;

// Absorbs float error in scaled limits so every boundary stays inclusive.
pub(crate) const BOUNDARY_EPSILON: f64 = 1e-9;

/// Outcome of one pair check
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepCheck {
    pub valid: bool,
    /// Violation kind when `valid` is false
    pub kind: Option<IssueKind>,
    pub message: Option<String>,
    /// Set when the check was skipped for missing data
    pub note: Option<String>,
}

impl StepCheck {
    fn pass() -> Self {
        Self {
            valid: true,
            kind: None,
            message: None,
            note: None,
        }
    }

    fn skipped(note: String) -> Self {
        Self {
            note: Some(note),
            ..Self::pass()
        }
    }

    fn fail(kind: IssueKind, message: String) -> Self {
        Self {
            valid: false,
            kind: Some(kind),
            message: Some(message),
            note: None,
        }
    }

    pub fn was_skipped(&self) -> bool {
        self.note.is_some()
    }
}

pub fn validate_voltage_step(parent: Option<Volts>, child: Option<Volts>) -> StepCheck {
    validate_voltage_step_with(parent, child, VOLTAGE_STEP_TOLERANCE)
}

/// Fails with `voltage_step_up` when `child > parent × tolerance`.
pub fn validate_voltage_step_with(
    parent: Option<Volts>,
    child: Option<Volts>,
    tolerance: f64,
) -> StepCheck {
    let (parent, child) = match (
        parent.filter(|v| v.is_positive()),
        child.filter(|v| v.is_positive()),
    ) {
        (Some(parent), Some(child)) => (parent, child),
        _ => {
            return StepCheck::skipped(
                "Voltage missing on parent or child; step not verified".to_string(),
            )
        }
    };
    let limit = parent * tolerance;
    if child.value() > limit.value() + BOUNDARY_EPSILON {
        StepCheck::fail(
            IssueKind::VoltageStepUp,
            format!(
                "Child voltage {} exceeds parent voltage {} (limit {})",
                child, parent, limit
            ),
        )
    } else {
        StepCheck::pass()
    }
}

pub fn validate_amperage_step(parent: Option<Amperes>, child: Option<Amperes>) -> StepCheck {
    validate_amperage_step_with(parent, child, AMPERAGE_STEP_TOLERANCE)
}

/// Fails with `amperage_mismatch` when `child > parent × tolerance`.
pub fn validate_amperage_step_with(
    parent: Option<Amperes>,
    child: Option<Amperes>,
    tolerance: f64,
) -> StepCheck {
    let (parent, child) = match (
        parent.filter(|a| a.is_positive()),
        child.filter(|a| a.is_positive()),
    ) {
        (Some(parent), Some(child)) => (parent, child),
        _ => {
            return StepCheck::skipped(
                "Amperage missing on parent or child; step not verified".to_string(),
            )
        }
    };
    let limit = parent * tolerance;
    if child.value() > limit.value() + BOUNDARY_EPSILON {
        StepCheck::fail(
            IssueKind::AmperageMismatch,
            format!(
                "Child rating {} exceeds parent rating {} (limit {})",
                child, parent, limit
            ),
        )
    } else {
        StepCheck::pass()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn voltage_boundary_is_inclusive() {
        assert!(validate_voltage_step(Some(Volts(480.0)), Some(Volts(504.0))).valid);
        let check = validate_voltage_step(Some(Volts(480.0)), Some(Volts(505.0)));
        assert!(!check.valid);
        assert_eq!(check.kind, Some(IssueKind::VoltageStepUp));
        assert!(check.message.unwrap().contains("505V"));
    }

    #[test]
    fn step_down_passes() {
        let check = validate_voltage_step(Some(Volts(480.0)), Some(Volts(208.0)));
        assert!(check.valid);
        assert!(!check.was_skipped());
    }

    #[test]
    fn amperage_boundary_is_inclusive() {
        assert!(validate_amperage_step(Some(Amperes(200.0)), Some(Amperes(250.0))).valid);
        let check = validate_amperage_step(Some(Amperes(200.0)), Some(Amperes(251.0)));
        assert!(!check.valid);
        assert_eq!(check.kind, Some(IssueKind::AmperageMismatch));
    }

    #[test]
    fn missing_values_pass_with_a_note() {
        let check = validate_voltage_step(None, Some(Volts(600.0)));
        assert!(check.valid);
        assert!(check.was_skipped());

        let check = validate_amperage_step(Some(Amperes(0.0)), Some(Amperes(100.0)));
        assert!(check.valid);
        assert!(check.was_skipped());
    }

    #[test]
    fn custom_tolerance() {
        let check = validate_voltage_step_with(Some(Volts(480.0)), Some(Volts(490.0)), 1.0);
        assert!(!check.valid);
    }
}
