//! # Unit Types
//!
//! Lightweight newtype wrappers for the handful of units the costing engine
//! converts between. They serialize as bare numbers.
//!
//! - Percent: localization factors are stored as percentages (`110.0` = 110 %)
//! - Area: quantities arrive in m², catalog envelope costs are per ft²
//! - Thermal: opaque constructions are keyed by RSI, glazing by U-value
//!
//! ## Example
//!
//! ```rust
//! use cost_core::units::{Percent, SqM, SqFt, UValue, Rsi};
//!
//! let local = Percent(110.0);
//! assert!((local.fraction() - 1.1).abs() < 1e-12);
//!
//! let area: SqFt = SqM(1.0).into();
//! assert!((area.0 - 10.763_910_4).abs() < 1e-6);
//!
//! let rsi: Rsi = UValue(2.0).into();
//! assert_eq!(rsi.0, 0.5);
//! ```

use serde::{Deserialize, Serialize};
use std::ops::{Add, Div, Mul, Sub};

/// Square feet per square metre
pub const SQFT_PER_SQM: f64 = 10.763_910_416_709_722;

// ============================================================================
// Percentages
// ============================================================================

/// A percentage value, `100.0` meaning "unchanged"
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Percent(pub f64);

impl Percent {
    /// The neutral factor, substituted when no localization row matches
    pub const HUNDRED: Percent = Percent(100.0);

    /// Convert to a multiplicative fraction (`110 %` -> `1.1`)
    pub fn fraction(self) -> f64 {
        self.0 / 100.0
    }
}

impl Default for Percent {
    fn default() -> Self {
        Percent::HUNDRED
    }
}

// ============================================================================
// Area Units
// ============================================================================

/// Area in square metres
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SqM(pub f64);

/// Area in square feet
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SqFt(pub f64);

impl From<SqM> for SqFt {
    fn from(sqm: SqM) -> Self {
        SqFt(sqm.0 * SQFT_PER_SQM)
    }
}

impl From<SqFt> for SqM {
    fn from(sqft: SqFt) -> Self {
        SqM(sqft.0 / SQFT_PER_SQM)
    }
}

// ============================================================================
// Thermal Units
// ============================================================================

/// Thermal resistance in m²·K/W
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Rsi(pub f64);

/// Thermal transmittance in W/(m²·K)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UValue(pub f64);

impl From<UValue> for Rsi {
    fn from(u: UValue) -> Self {
        Rsi(1.0 / u.0)
    }
}

impl From<Rsi> for UValue {
    fn from(rsi: Rsi) -> Self {
        UValue(1.0 / rsi.0)
    }
}

// ============================================================================
// Arithmetic Implementations (macro to reduce boilerplate)
// ============================================================================

macro_rules! impl_arithmetic {
    ($type:ty) => {
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

        impl Div<f64> for $type {
            type Output = Self;
            fn div(self, rhs: f64) -> Self::Output {
                Self(self.0 / rhs)
            }
        }

        impl $type {
            /// Get the raw f64 value
            pub fn value(self) -> f64 {
                self.0
            }

            /// Create from raw f64 value
            pub fn new(value: f64) -> Self {
                Self(value)
            }
        }
    };
}

impl_arithmetic!(SqM);
impl_arithmetic!(SqFt);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sqm_to_sqft() {
        let ft: SqFt = SqM(100.0).into();
        assert!((ft.0 - 1076.391_041_670_972).abs() < 1e-9);
        let back: SqM = ft.into();
        assert!((back.0 - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_percent_default_is_neutral() {
        assert_eq!(Percent::default(), Percent(100.0));
        assert_eq!(Percent::default().fraction(), 1.0);
    }

    #[test]
    fn test_u_value_to_rsi() {
        let rsi: Rsi = UValue(4.0).into();
        assert_eq!(rsi.0, 0.25);
    }

    #[test]
    fn test_arithmetic() {
        let a = SqM(10.0);
        let b = SqM(4.0);
        assert_eq!((a + b).0, 14.0);
        assert_eq!((a - b).0, 6.0);
        assert_eq!((a * 2.0).0, 20.0);
        assert_eq!((a / 2.0).0, 5.0);
    }

    #[test]
    fn test_serialization() {
        let p = Percent(92.5);
        let json = serde_json::to_string(&p).unwrap();
        assert_eq!(json, "92.5");
        let roundtrip: Percent = serde_json::from_str(&json).unwrap();
        assert_eq!(p, roundtrip);
    }
}
