//! Free-text nameplate value parsing.
//!
//! Extracted voltage and amperage arrive as whatever the nameplate printed
//! ("208Y/120V", "225-Amp", "Not Available"). Both parsers return `None` for
//! sentinel strings, for text without digits, and for a parsed zero; the
//! pair validators treat `None` as missing data, never as a zero rating.

use crate::units::{Amperes, Volts};
use once_cell::sync::Lazy;
use regex::Regex;

static INTEGER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").expect("static regex"));

const ABSENT_SENTINELS: &[&str] = &[
    "unknown",
    "not available",
    "not visible",
    "n/a",
    "na",
    "none",
    "illegible",
];

fn is_absent(text: &str) -> bool {
    let normalized = text.trim().to_ascii_lowercase();
    normalized.is_empty() || ABSENT_SENTINELS.contains(&normalized.as_str())
}

fn integers(text: &str) -> impl Iterator<Item = u64> + '_ {
    INTEGER
        .find_iter(text)
        .filter_map(|m| m.as_str().parse::<u64>().ok())
}

/// Highest integer in a voltage string, so `"208Y/120V"` yields the
/// line-to-line 208 rather than the neutral leg.
pub fn parse_voltage(text: &str) -> Option<Volts> {
    if is_absent(text) {
        return None;
    }
    integers(text)
        .max()
        .filter(|v| *v > 0)
        .map(|v| Volts(v as f64))
}

/// First integer in an amperage string, e.g. `"225-Amp"` → 225.
pub fn parse_amperage(text: &str) -> Option<Amperes> {
    if is_absent(text) {
        return None;
    }
    integers(text)
        .next()
        .filter(|a| *a > 0)
        .map(|a| Amperes(a as f64))
}
