//! Fixed-point monetary type for the auction engine.
//!
//! All currency amounts use fixed-point arithmetic with 2 decimal places
//! to keep balance math and leaderboard ordering exact. Floats only appear
//! at the JSON boundary, where amounts are written as dollar values.

use derive_more::{Add, AddAssign, From, Into, Neg, Sub, SubAssign, Sum};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Cash scale factor: 100 means 2 decimal places.
/// - `Cash(100)` = $1.00
/// - `Cash(1)` = $0.01 (smallest increment)
pub const CASH_SCALE: i64 = 100;

/// Fixed-point currency amount with 2 decimal places.
///
/// # Examples
/// - `Cash(100)` = $1.00
/// - `Cash(150)` = $1.50
/// - `Cash(100_000)` = $1000.00
#[derive(
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Default,
    Add,
    Sub,
    Neg,
    AddAssign,
    SubAssign,
    Sum,
    From,
    Into,
)]
pub struct Cash(pub i64);

impl Cash {
    pub const ZERO: Cash = Cash(0);

    /// Create Cash from a floating-point dollar value, rounding to cents.
    #[inline]
    pub fn from_float(v: f64) -> Self {
        Self((v * CASH_SCALE as f64).round() as i64)
    }

    /// Convert to a floating-point dollar value for display.
    #[inline]
    pub fn to_float(self) -> f64 {
        self.0 as f64 / CASH_SCALE as f64
    }

    /// Raw internal value in cents.
    #[inline]
    pub fn raw(self) -> i64 {
        self.0
    }

    /// Check if the amount is positive.
    #[inline]
    pub fn is_positive(self) -> bool {
        self.0 > 0
    }

    /// Check if the amount is negative.
    #[inline]
    pub fn is_negative(self) -> bool {
        self.0 < 0
    }

    /// Check if the amount is zero.
    #[inline]
    pub fn is_zero(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Debug for Cash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Cash(${:.2})", self.to_float())
    }
}

impl fmt::Display for Cash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${:.2}", self.to_float())
    }
}

// Wire format is a dollar value, not raw cents.
impl Serialize for Cash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.to_float())
    }
}

impl<'de> Deserialize<'de> for Cash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let v = f64::deserialize(deserializer)?;
        Ok(Cash::from_float(v))
    }
}
