//! Wire ampacity and conduit fill calculators.
//!
//! Both calculators are pure. Bad labels, zero loads and empty conductor
//! sets come back as [`MepError::InvalidInput`] so the caller can show the
//! message next to the offending field.

use crate::error::{MepError, MepResult};
use crate::step::BOUNDARY_EPSILON;
use crate::tables::{ConduitSize, WireGauge};
use crate::units::{Amperes, SquareInches};
use serde::{Deserialize, Serialize};

/// Continuous loads (3h+) are sized at 125% of the load current.
pub const CONTINUOUS_LOAD_FACTOR: f64 = 1.25;

/// Fill above this percentage is compliant but hard to pull.
pub const PULL_WARNING_FILL_PERCENT: f64 = 30.0;

/// Outcome of a wire ampacity check
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireSizeCheck {
    pub valid: bool,
    pub wire_size: WireGauge,
    /// Tabulated 75°C copper ampacity of `wire_size`
    pub ampacity: Amperes,
    /// Load current, after the continuous-load factor when it applies
    pub required_ampacity: Amperes,
    pub continuous_load: bool,
    /// Spare capacity when valid
    pub margin: Option<Amperes>,
    /// Smallest compliant gauge when invalid
    pub suggested_size: Option<WireGauge>,
    /// Set when even the largest tabulated gauge is too small; the
    /// suggestion is then advisory only.
    pub suggestion_exceeds_table: bool,
    pub message: String,
}

/// Check a conductor against a load.
///
/// With `continuous_load` set the comparison is against `amperage × 1.25`.
/// Equality passes.
pub fn validate_wire_size(
    wire_size: &str,
    amperage: f64,
    continuous_load: bool,
) -> MepResult<WireSizeCheck> {
    if wire_size.trim().is_empty() {
        return Err(MepError::InvalidInput("wire size is required".into()));
    }
    if !amperage.is_finite() || amperage <= 0.0 {
        return Err(MepError::InvalidInput(
            "amperage must be a positive number".into(),
        ));
    }
    let gauge: WireGauge = wire_size.parse()?;
    let factor = if continuous_load {
        CONTINUOUS_LOAD_FACTOR
    } else {
        1.0
    };
    let required = Amperes(amperage) * factor;
    let ampacity = gauge.ampacity();

    if meets(ampacity, required) {
        let margin = ampacity - required;
        return Ok(WireSizeCheck {
            valid: true,
            wire_size: gauge,
            ampacity,
            required_ampacity: required,
            continuous_load,
            margin: Some(margin),
            suggested_size: None,
            suggestion_exceeds_table: false,
            message: format!(
                "{} rated {} carries {} with {} to spare",
                gauge, ampacity, required, margin
            ),
        });
    }

    let suggested = find_minimum_wire_size(required);
    let exceeds = !meets(suggested.ampacity(), required);
    Ok(WireSizeCheck {
        valid: false,
        wire_size: gauge,
        ampacity,
        required_ampacity: required,
        continuous_load,
        margin: None,
        suggested_size: Some(suggested),
        suggestion_exceeds_table: exceeds,
        message: if exceeds {
            format!(
                "{} rated {} is undersized for {}; no tabulated conductor is large enough, \
                 parallel runs of {} need engineering review",
                gauge, ampacity, required, suggested
            )
        } else {
            format!(
                "{} rated {} is undersized for {}; use {} or larger",
                gauge, ampacity, required, suggested
            )
        },
    })
}

/// Smallest gauge whose ampacity meets `required`.
///
/// Loads beyond the table get the largest gauge back rather than an error;
/// that answer is a suggestion, not a compliance guarantee.
pub fn find_minimum_wire_size(required: Amperes) -> WireGauge {
    WireGauge::ALL
        .iter()
        .copied()
        .find(|gauge| meets(gauge.ampacity(), required))
        .unwrap_or(WireGauge::LARGEST)
}

fn meets(ampacity: Amperes, required: Amperes) -> bool {
    ampacity.value() + BOUNDARY_EPSILON >= required.value()
}

/// A group of same-gauge conductors sharing one conduit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conductor {
    pub wire_gauge: WireGauge,
    pub count: u32,
}

impl Conductor {
    pub fn new(wire_gauge: WireGauge, count: u32) -> Self {
        Self { wire_gauge, count }
    }

    /// Build from a field label, rejecting unknown gauges.
    pub fn from_label(label: &str, count: u32) -> MepResult<Self> {
        Ok(Self::new(label.parse()?, count))
    }

    pub fn area(&self) -> SquareInches {
        self.wire_gauge.area() * self.count as f64
    }
}

/// Outcome of a conduit fill check
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConduitFillCheck {
    pub valid: bool,
    pub conduit_size: ConduitSize,
    pub conductor_count: u32,
    pub conductor_area: SquareInches,
    pub usable_area: SquareInches,
    /// Rounded to one decimal place
    pub fill_percentage: f64,
    pub max_fill_percentage: f64,
    /// Compliant but tight; a larger conduit eases pulling
    pub warning: Option<String>,
    /// First larger trade size that passes, when this one fails
    pub suggested_size: Option<ConduitSize>,
    pub message: String,
}

/// NEC Chapter 9 Table 1 ceiling by conductor count.
pub fn max_fill_percentage(conductor_count: u32) -> f64 {
    match conductor_count {
        1 => 53.0,
        2 => 31.0,
        _ => 40.0,
    }
}

/// Check a conductor set against a conduit given by label.
///
/// The percentage is `conductor area / stored usable area × 100`, compared
/// against the count ceiling; see [`crate::tables`] for why 1- and
/// 2-conductor results can exceed 100%.
pub fn validate_conduit_fill(
    conduit_size: &str,
    conductors: &[Conductor],
) -> MepResult<ConduitFillCheck> {
    if conduit_size.trim().is_empty() {
        return Err(MepError::InvalidInput("conduit size is required".into()));
    }
    let size: ConduitSize = conduit_size.parse()?;
    let mut check = check_conduit_fill(size, conductors)?;
    if !check.valid {
        check.suggested_size = ConduitSize::ALL
            .iter()
            .copied()
            .filter(|candidate| *candidate > size)
            .find(|candidate| {
                check_conduit_fill(*candidate, conductors).is_ok_and(|c| c.valid)
            });
        if let Some(suggested) = check.suggested_size {
            check.message.push_str(&format!("; use {} conduit", suggested));
        }
    }
    Ok(check)
}

/// Typed fill check without suggestion search.
pub fn check_conduit_fill(
    size: ConduitSize,
    conductors: &[Conductor],
) -> MepResult<ConduitFillCheck> {
    if conductors.is_empty() {
        return Err(MepError::InvalidInput(
            "at least one conductor is required".into(),
        ));
    }
    if let Some(empty) = conductors.iter().find(|c| c.count == 0) {
        return Err(MepError::InvalidInput(format!(
            "conductor count for {} must be at least 1",
            empty.wire_gauge
        )));
    }

    let conductor_count = conductors
        .iter()
        .try_fold(0u32, |total, c| total.checked_add(c.count))
        .ok_or_else(|| {
            MepError::InvalidInput(format!(
                "conductor count exceeds {} in one conduit",
                u32::MAX
            ))
        })?;
    let conductor_area: SquareInches = conductors.iter().map(Conductor::area).sum();
    let usable_area = size.usable_area();
    let raw_percentage = conductor_area / usable_area * 100.0;
    let fill_percentage = (raw_percentage * 10.0).round() / 10.0;
    let ceiling = max_fill_percentage(conductor_count);
    let valid = raw_percentage <= ceiling;

    let warning = (valid && raw_percentage > PULL_WARNING_FILL_PERCENT).then(|| {
        format!(
            "{} conduit is {:.1}% full; consider a larger size for ease of pulling",
            size, fill_percentage
        )
    });
    let message = if valid {
        format!(
            "{} conductor(s) fill {} conduit to {:.1}% (max {}%)",
            conductor_count, size, fill_percentage, ceiling
        )
    } else {
        format!(
            "{} conductor(s) fill {} conduit to {:.1}%, exceeding the {}% limit",
            conductor_count, size, fill_percentage, ceiling
        )
    };

    Ok(ConduitFillCheck {
        valid,
        conduit_size: size,
        conductor_count,
        conductor_area,
        usable_area,
        fill_percentage,
        max_fill_percentage: ceiling,
        warning,
        suggested_size: None,
        message,
    })
}
