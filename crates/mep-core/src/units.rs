//! Compile-time unit safety for nameplate and code-table quantities.
//!
//! Voltage ratings, amperage ratings and conductor/conduit areas all travel
//! through the calculators as plain numbers in the field data. Wrapping them
//! keeps a voltage from being compared against an amperage by accident.
//!
//! All types use `#[repr(transparent)]` and have the same layout as `f64`.
//!
//! ```
//! use mep_core::units::{Amperes, SquareInches};
//!
//! let load = Amperes(80.0);
//! let continuous = load * 1.25;
//! assert_eq!(continuous.value(), 100.0);
//!
//! let fill: SquareInches = [SquareInches(0.0211), SquareInches(0.0211)].iter().sum();
//! assert!((fill.value() - 0.0422).abs() < 1e-12);
//! ```

use serde::{Deserialize, Serialize};
use std::ops::{Add, Div, Mul, Sub};

/// Macro to implement common arithmetic operations for unit types
macro_rules! impl_unit_ops {
    ($type:ty, $unit_name:literal) => {
        impl Add for $type {
            type Output = Self;
            fn add(self, rhs: Self) -> Self::Output {
                Self(self.0 + rhs.0)
            }
        }

        impl Sub for $type {
            type Output = Self;
            fn sub(self, rhs: Self) -> Self::Output {
                Self(self.0 - rhs.0)
            }
        }

        impl Mul<f64> for $type {
            type Output = Self;
            fn mul(self, rhs: f64) -> Self::Output {
                Self(self.0 * rhs)
            }
        }

        impl Mul<$type> for f64 {
            type Output = $type;
            fn mul(self, rhs: $type) -> Self::Output {
                <$type>::new(self * rhs.0)
            }
        }

        impl Div<f64> for $type {
            type Output = Self;
            fn div(self, rhs: f64) -> Self::Output {
                Self(self.0 / rhs)
            }
        }

        impl Div<$type> for $type {
            type Output = f64;
            fn div(self, rhs: $type) -> Self::Output {
                self.0 / rhs.0
            }
        }

        impl std::fmt::Display for $type {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}{}", self.0, $unit_name)
            }
        }

        impl $type {
            /// Create a new value
            #[inline]
            pub const fn new(value: f64) -> Self {
                Self(value)
            }

            /// Get the raw numeric value
            #[inline]
            pub const fn value(self) -> f64 {
                self.0
            }

            /// True for a usable, strictly positive reading
            #[inline]
            pub fn is_positive(self) -> bool {
                self.0.is_finite() && self.0 > 0.0
            }

            /// Maximum of two values
            #[inline]
            pub fn max(self, other: Self) -> Self {
                Self(self.0.max(other.0))
            }
        }

        impl std::iter::Sum for $type {
            fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
                Self(iter.map(|x| x.0).sum())
            }
        }

        impl<'a> std::iter::Sum<&'a $type> for $type {
            fn sum<I: Iterator<Item = &'a Self>>(iter: I) -> Self {
                Self(iter.map(|x| x.0).sum())
            }
        }
    };
}

/// Line-to-line voltage in volts (V)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct Volts(pub f64);

impl_unit_ops!(Volts, "V");

/// Current or current rating in amperes (A)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct Amperes(pub f64);

impl_unit_ops!(Amperes, "A");

/// Cross-sectional area in square inches (in²), as tabulated in NEC Chapter 9
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct SquareInches(pub f64);

impl_unit_ops!(SquareInches, " in²");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_amperes_arithmetic() {
        let a = Amperes(200.0);
        let b = Amperes(50.0);

        assert_eq!((a + b).value(), 250.0);
        assert_eq!((a - b).value(), 150.0);
        assert_eq!((a * 1.25).value(), 250.0);
        assert_eq!((1.25 * a).value(), 250.0);
        assert_eq!((a / 2.0).value(), 100.0);
        assert_eq!(a / b, 4.0);
    }

    #[test]
    fn test_is_positive() {
        assert!(Volts(480.0).is_positive());
        assert!(!Volts(0.0).is_positive());
        assert!(!Volts(f64::NAN).is_positive());
    }

    #[test]
    fn test_sum_iterator() {
        let areas = vec![SquareInches(0.5), SquareInches(0.25)];
        let total: SquareInches = areas.into_iter().sum();
        assert_eq!(total.value(), 0.75);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Volts(480.0)), "480V");
        assert_eq!(format!("{}", Amperes(225.0)), "225A");
    }

    #[test]
    fn test_serde_is_transparent() {
        let json = serde_json::to_string(&Volts(208.0)).unwrap();
        assert_eq!(json, "208.0");
    }
}
