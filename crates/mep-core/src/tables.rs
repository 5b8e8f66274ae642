//! Static NEC lookup tables.
//!
//! - Conductor ampacity: NEC 310.16, copper, 75°C column, with the 240.4(D)
//!   small-conductor limits applied to 14/12/10 AWG.
//! - Conductor area: NEC Chapter 9 Table 5, THHN/THWN-2.
//! - Conduit area: EMT trade sizes, already reduced to the 40% fill allowance.
//!
//! The conduit values are *40%-fill-equivalent* areas, not raw internal areas.
//! [`crate::sizing::validate_conduit_fill`] divides conductor area by these
//! values and compares against a count-dependent ceiling (53/31/40%), so the
//! 1- and 2-conductor percentages are not literal Chapter 9 percentages.

use crate::error::{MepError, MepResult};
use crate::units::{Amperes, SquareInches};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Conductor size, ordered from smallest to largest capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum WireGauge {
    Awg14,
    Awg12,
    Awg10,
    Awg8,
    Awg6,
    Awg4,
    Awg3,
    Awg2,
    Awg1,
    Awg1_0,
    Awg2_0,
    Awg3_0,
    Awg4_0,
    Kcmil250,
    Kcmil300,
    Kcmil350,
    Kcmil400,
    Kcmil500,
    Kcmil600,
    Kcmil750,
}

/// (gauge, label, ampacity A, area in²)
const WIRE_TABLE: [(WireGauge, &str, f64, f64); 20] = [
    (WireGauge::Awg14, "14 AWG", 15.0, 0.0097),
    (WireGauge::Awg12, "12 AWG", 20.0, 0.0133),
    (WireGauge::Awg10, "10 AWG", 30.0, 0.0211),
    (WireGauge::Awg8, "8 AWG", 50.0, 0.0366),
    (WireGauge::Awg6, "6 AWG", 65.0, 0.0507),
    (WireGauge::Awg4, "4 AWG", 85.0, 0.0824),
    (WireGauge::Awg3, "3 AWG", 100.0, 0.0973),
    (WireGauge::Awg2, "2 AWG", 115.0, 0.1158),
    (WireGauge::Awg1, "1 AWG", 130.0, 0.1562),
    (WireGauge::Awg1_0, "1/0 AWG", 150.0, 0.1855),
    (WireGauge::Awg2_0, "2/0 AWG", 175.0, 0.2223),
    (WireGauge::Awg3_0, "3/0 AWG", 200.0, 0.2679),
    (WireGauge::Awg4_0, "4/0 AWG", 230.0, 0.3237),
    (WireGauge::Kcmil250, "250 kcmil", 255.0, 0.3970),
    (WireGauge::Kcmil300, "300 kcmil", 285.0, 0.4608),
    (WireGauge::Kcmil350, "350 kcmil", 310.0, 0.5242),
    (WireGauge::Kcmil400, "400 kcmil", 335.0, 0.5863),
    (WireGauge::Kcmil500, "500 kcmil", 380.0, 0.7073),
    (WireGauge::Kcmil600, "600 kcmil", 420.0, 0.8676),
    (WireGauge::Kcmil750, "750 kcmil", 475.0, 1.0496),
];

impl WireGauge {
    /// Every gauge in ascending capacity order.
    pub const ALL: [WireGauge; 20] = [
        WireGauge::Awg14,
        WireGauge::Awg12,
        WireGauge::Awg10,
        WireGauge::Awg8,
        WireGauge::Awg6,
        WireGauge::Awg4,
        WireGauge::Awg3,
        WireGauge::Awg2,
        WireGauge::Awg1,
        WireGauge::Awg1_0,
        WireGauge::Awg2_0,
        WireGauge::Awg3_0,
        WireGauge::Awg4_0,
        WireGauge::Kcmil250,
        WireGauge::Kcmil300,
        WireGauge::Kcmil350,
        WireGauge::Kcmil400,
        WireGauge::Kcmil500,
        WireGauge::Kcmil600,
        WireGauge::Kcmil750,
    ];

    /// Largest tabulated conductor.
    pub const LARGEST: WireGauge = WireGauge::Kcmil750;

    #[inline]
    fn row(self) -> &'static (WireGauge, &'static str, f64, f64) {
        &WIRE_TABLE[self as usize]
    }

    /// Canonical label, e.g. `"1/0 AWG"` or `"250 kcmil"`.
    pub fn label(self) -> &'static str {
        self.row().1
    }

    /// 75°C copper ampacity.
    pub fn ampacity(self) -> Amperes {
        Amperes(self.row().2)
    }

    /// THHN cross-sectional area including insulation.
    pub fn area(self) -> SquareInches {
        SquareInches(self.row().3)
    }
}

impl fmt::Display for WireGauge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for WireGauge {
    type Err = MepError;

    /// Accepts the canonical labels plus common field spellings:
    /// `10awg`, `#10`, `10`, `1/0`, `250MCM`, `250 kcmil`.
    fn from_str(input: &str) -> MepResult<Self> {
        let compact: String = input
            .trim()
            .to_ascii_lowercase()
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '#')
            .collect();
        if compact.is_empty() {
            return Err(MepError::InvalidInput("wire size is required".into()));
        }
        let key = compact
            .trim_end_matches("awg")
            .trim_end_matches("kcmil")
            .trim_end_matches("mcm");
        WIRE_TABLE
            .iter()
            .find(|(_, label, _, _)| {
                label
                    .split_whitespace()
                    .next()
                    .is_some_and(|size| size == key)
            })
            .map(|(gauge, _, _, _)| *gauge)
            .ok_or_else(|| MepError::InvalidInput(format!("unknown wire size '{}'", input.trim())))
    }
}

impl TryFrom<String> for WireGauge {
    type Error = MepError;
    fn try_from(value: String) -> MepResult<Self> {
        value.parse()
    }
}

impl From<WireGauge> for String {
    fn from(gauge: WireGauge) -> Self {
        gauge.label().to_string()
    }
}

/// EMT conduit trade size, ordered smallest to largest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ConduitSize {
    Half,
    ThreeQuarter,
    One,
    OneAndQuarter,
    OneAndHalf,
    Two,
    TwoAndHalf,
    Three,
    ThreeAndHalf,
    Four,
    Five,
    Six,
}

/// (size, label, usable 40%-fill area in²)
const CONDUIT_TABLE: [(ConduitSize, &str, f64); 12] = [
    (ConduitSize::Half, "1/2\"", 0.12),
    (ConduitSize::ThreeQuarter, "3/4\"", 0.21),
    (ConduitSize::One, "1\"", 0.34),
    (ConduitSize::OneAndQuarter, "1-1/4\"", 0.60),
    (ConduitSize::OneAndHalf, "1-1/2\"", 0.81),
    (ConduitSize::Two, "2\"", 1.34),
    (ConduitSize::TwoAndHalf, "2-1/2\"", 2.34),
    (ConduitSize::Three, "3\"", 3.54),
    (ConduitSize::ThreeAndHalf, "3-1/2\"", 4.62),
    (ConduitSize::Four, "4\"", 5.90),
    (ConduitSize::Five, "5\"", 9.28),
    (ConduitSize::Six, "6\"", 13.40),
];

impl ConduitSize {
    /// Every trade size in ascending order.
    pub const ALL: [ConduitSize; 12] = [
        ConduitSize::Half,
        ConduitSize::ThreeQuarter,
        ConduitSize::One,
        ConduitSize::OneAndQuarter,
        ConduitSize::OneAndHalf,
        ConduitSize::Two,
        ConduitSize::TwoAndHalf,
        ConduitSize::Three,
        ConduitSize::ThreeAndHalf,
        ConduitSize::Four,
        ConduitSize::Five,
        ConduitSize::Six,
    ];

    /// Canonical label, e.g. `2-1/2"`.
    pub fn label(self) -> &'static str {
        CONDUIT_TABLE[self as usize].1
    }

    /// Usable area at the 40% fill baseline.
    pub fn usable_area(self) -> SquareInches {
        SquareInches(CONDUIT_TABLE[self as usize].2)
    }
}

impl fmt::Display for ConduitSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ConduitSize {
    type Err = MepError;

    /// Accepts `2-1/2"`, `2 1/2`, `2-1/2 in`, `2.5` and friends.
    fn from_str(input: &str) -> MepResult<Self> {
        let trimmed = input.trim().to_ascii_lowercase();
        if trimmed.is_empty() {
            return Err(MepError::InvalidInput("conduit size is required".into()));
        }
        let stripped = trimmed
            .trim_end_matches("inches")
            .trim_end_matches("inch")
            .trim_end_matches("in")
            .trim_end_matches(['"', '\'', ' ']);
        let key = match stripped {
            "0.5" | ".5" => "1/2".to_string(),
            "0.75" | ".75" => "3/4".to_string(),
            "1.25" => "1-1/4".to_string(),
            "1.5" => "1-1/2".to_string(),
            "2.5" => "2-1/2".to_string(),
            "3.5" => "3-1/2".to_string(),
            other => other.split_whitespace().collect::<Vec<_>>().join("-"),
        };
        CONDUIT_TABLE
            .iter()
            .find(|(_, label, _)| label.trim_end_matches('"') == key)
            .map(|(size, _, _)| *size)
            .ok_or_else(|| {
                MepError::InvalidInput(format!("unknown conduit size '{}'", input.trim()))
            })
    }
}

impl TryFrom<String> for ConduitSize {
    type Error = MepError;
    fn try_from(value: String) -> MepResult<Self> {
        value.parse()
    }
}

impl From<ConduitSize> for String {
    fn from(size: ConduitSize) -> Self {
        size.label().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_table_is_ordered_by_capacity() {
        for pair in WireGauge::ALL.windows(2) {
            assert!(pair[0].ampacity() < pair[1].ampacity());
            assert!(pair[0].area() < pair[1].area());
            assert!(pair[0] < pair[1]);
        }
        assert_eq!(WireGauge::ALL.len(), 20);
        assert_eq!(WireGauge::LARGEST.ampacity(), Amperes(475.0));
    }

    #[test]
    fn conduit_table_is_ordered() {
        for pair in ConduitSize::ALL.windows(2) {
            assert!(pair[0].usable_area() < pair[1].usable_area());
        }
        assert_eq!(ConduitSize::ALL.len(), 12);
    }

    #[test]
    fn table_rows_match_enum_discriminants() {
        for (index, gauge) in WireGauge::ALL.iter().enumerate() {
            assert_eq!(WIRE_TABLE[index].0, *gauge);
        }
        for (index, size) in ConduitSize::ALL.iter().enumerate() {
            assert_eq!(CONDUIT_TABLE[index].0, *size);
        }
    }

    #[test]
    fn wire_labels_parse_in_field_spellings() {
        assert_eq!("12 AWG".parse::<WireGauge>().unwrap(), WireGauge::Awg12);
        assert_eq!("12awg".parse::<WireGauge>().unwrap(), WireGauge::Awg12);
        assert_eq!("#10".parse::<WireGauge>().unwrap(), WireGauge::Awg10);
        assert_eq!("1/0".parse::<WireGauge>().unwrap(), WireGauge::Awg1_0);
        assert_eq!("250 MCM".parse::<WireGauge>().unwrap(), WireGauge::Kcmil250);
        assert_eq!("750 kcmil".parse::<WireGauge>().unwrap(), WireGauge::Kcmil750);
        assert!(matches!(
            "13 AWG".parse::<WireGauge>(),
            Err(MepError::InvalidInput(_))
        ));
        assert!("".parse::<WireGauge>().is_err());
    }

    #[test]
    fn conduit_labels_parse_in_field_spellings() {
        assert_eq!("1/2\"".parse::<ConduitSize>().unwrap(), ConduitSize::Half);
        assert_eq!("2-1/2\"".parse::<ConduitSize>().unwrap(), ConduitSize::TwoAndHalf);
        assert_eq!("2 1/2 in".parse::<ConduitSize>().unwrap(), ConduitSize::TwoAndHalf);
        assert_eq!("1.25".parse::<ConduitSize>().unwrap(), ConduitSize::OneAndQuarter);
        assert_eq!("4".parse::<ConduitSize>().unwrap(), ConduitSize::Four);
        assert!("7\"".parse::<ConduitSize>().is_err());
    }

    #[test]
    fn labels_round_trip_through_serde() {
        let json = serde_json::to_string(&WireGauge::Awg2_0).unwrap();
        assert_eq!(json, "\"2/0 AWG\"");
        let back: ConduitSize = serde_json::from_str("\"3/4\\\"\"").unwrap();
        assert_eq!(back, ConduitSize::ThreeQuarter);
    }
}
