//! This module defines a wrapper type [Double] for [f64] that excludes NaN and infinity.

use std::{
    cmp::Ordering,
    fmt,
    hash::{Hash, Hasher},
    ops::{Add, Div, Mul, Sub},
};

use num::{CheckedAdd, CheckedDiv, CheckedMul, CheckedSub};
use serde::{Deserialize, Serialize};

use super::errors::DataValueCreationError;

#[cfg(test)]
use quickcheck::{Arbitrary, Gen};

/// Wrapper for [f64] that excludes [f64::NAN] and infinite values
///
/// Excluding these values makes [Double] totally ordered and hashable,
/// so it can be part of a group key.
#[derive(Copy, Clone, Debug, Default, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Double(f64);

impl Double {
    /// Wraps the given [f64]-`value` as a value over [Double].
    ///
    /// # Errors
    /// Returns an error if `value` is [f64::NAN] or infinite.
    pub fn new(value: f64) -> Result<Self, DataValueCreationError> {
        if !value.is_finite() {
            return Err(DataValueCreationError::NonFiniteFloat);
        }

        Ok(Self(value))
    }

    /// Wraps the given [f64]-`value` as a value over [Double].
    ///
    /// # Panics
    /// Panics if `value` is [f64::NAN] or not finite.
    pub fn from_number(value: f64) -> Self {
        if !value.is_finite() {
            panic!("floating point values must be finite")
        }

        Self(value)
    }

    /// Returns the wrapped [f64].
    pub fn value(self) -> f64 {
        self.0
    }

    /// Computes the absolute value.
    pub(crate) fn abs(self) -> Self {
        Self(self.0.abs())
    }

    /// Computes the remainder of the division by `rhs`, if defined.
    pub(crate) fn checked_rem(&self, rhs: &Self) -> Option<Self> {
        Double::new(self.0 % rhs.0).ok()
    }
}

impl PartialEq for Double {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for Double {}

impl Hash for Double {
    fn hash<H: Hasher>(&self, state: &mut H) {
        // 0.0 and -0.0 compare equal and therefore have to hash equally
        if self.0 == 0.0 {
            0.0f64.to_bits().hash(state)
        } else {
            self.0.to_bits().hash(state)
        }
    }
}

impl PartialOrd for Double {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Double {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0
            .partial_cmp(&other.0)
            .expect("Comparison can only fail on NaN values which have been forbidden in this type")
    }
}

impl fmt::Display for Double {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<f64> for Double {
    type Error = DataValueCreationError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Double> for f64 {
    fn from(value: Double) -> Self {
        value.0
    }
}

impl Add for Double {
    type Output = Double;

    fn add(self, rhs: Self) -> Self::Output {
        Double(self.0.add(rhs.0))
    }
}

impl Sub for Double {
    type Output = Double;

    fn sub(self, rhs: Self) -> Self::Output {
        Double(self.0.sub(rhs.0))
    }
}

impl Mul for Double {
    type Output = Double;

    fn mul(self, rhs: Self) -> Self::Output {
        Double(self.0.mul(rhs.0))
    }
}

impl Div for Double {
    type Output = Double;

    fn div(self, rhs: Self) -> Self::Output {
        Double(self.0.div(rhs.0))
    }
}

impl CheckedAdd for Double {
    fn checked_add(&self, v: &Self) -> Option<Self> {
        Double::new(self.0 + v.0).ok()
    }
}

impl CheckedSub for Double {
    fn checked_sub(&self, v: &Self) -> Option<Self> {
        Double::new(self.0 - v.0).ok()
    }
}

impl CheckedDiv for Double {
    fn checked_div(&self, v: &Self) -> Option<Self> {
        Double::new(self.0 / v.0).ok()
    }
}

impl CheckedMul for Double {
    fn checked_mul(&self, v: &Self) -> Option<Self> {
        Double::new(self.0 * v.0).ok()
    }
}

#[cfg(test)]
impl Arbitrary for Double {
    fn arbitrary(g: &mut Gen) -> Self {
        let mut value = f64::arbitrary(g);
        while !value.is_finite() {
            value = f64::arbitrary(g);
        }

        Self::from_number(value)
    }
}
