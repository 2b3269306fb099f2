//! Money and quantity values that may be unset.
//!
//! An unset [`Amount`] poisons arithmetic: any sum, difference or product with an
//! unset operand is unset. It never coerces to zero.

use std::{
    fmt,
    iter::Sum,
    ops::{Add, AddAssign, Mul, Sub},
};

use serde::Serialize;

/// A finite number, or unset.
///
/// Unlike a float NaN, unset compares equal to unset; it never equals a number.
/// Serializes as a JSON number or `null`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Amount(Option<f64>);

impl Amount {
    pub const UNSET: Amount = Amount(None);
    pub const ZERO: Amount = Amount(Some(0.0));

    /// Non-finite input (NaN, infinities) is stored as unset.
    pub fn new(value: f64) -> Self {
        Self(Some(value).filter(|v| v.is_finite()))
    }

    pub fn value(self) -> Option<f64> {
        self.0
    }

    pub fn is_unset(self) -> bool {
        self.0.is_none()
    }

    /// Rounds half-to-even for display.
    pub fn rounded(self) -> Option<i64> {
        self.0.map(|v| v.round_ties_even() as i64)
    }

    /// `self + rhs`, or `None` when two numbers overflow. Unset operands still give unset.
    pub fn checked_add(self, rhs: Amount) -> Option<Amount> {
        self.checked(rhs, |a, b| a + b)
    }

    pub fn checked_sub(self, rhs: Amount) -> Option<Amount> {
        self.checked(rhs, |a, b| a - b)
    }

    pub fn checked_mul(self, rhs: Amount) -> Option<Amount> {
        self.checked(rhs, |a, b| a * b)
    }

    fn checked(self, rhs: Amount, op: impl FnOnce(f64, f64) -> f64) -> Option<Amount> {
        match (self.0, rhs.0) {
            (Some(a), Some(b)) => Some(op(a, b))
                .filter(|v| v.is_finite())
                .map(|v| Amount(Some(v))),
            _ => Some(Amount::UNSET),
        }
    }

    fn combine(self, rhs: Amount, op: impl FnOnce(f64, f64) -> f64) -> Amount {
        self.checked(rhs, op).unwrap_or(Amount::UNSET)
    }
}

impl From<f64> for Amount {
    fn from(value: f64) -> Self {
        Amount::new(value)
    }
}

impl From<Option<f64>> for Amount {
    fn from(value: Option<f64>) -> Self {
        value.map(Amount::new).unwrap_or(Amount::UNSET)
    }
}

impl Add for Amount {
    type Output = Amount;

    fn add(self, rhs: Amount) -> Amount {
        self.combine(rhs, |a, b| a + b)
    }
}

impl AddAssign for Amount {
    fn add_assign(&mut self, rhs: Amount) {
        *self = *self + rhs;
    }
}

impl Sub for Amount {
    type Output = Amount;

    fn sub(self, rhs: Amount) -> Amount {
        self.combine(rhs, |a, b| a - b)
    }
}

impl Mul for Amount {
    type Output = Amount;

    fn mul(self, rhs: Amount) -> Amount {
        self.combine(rhs, |a, b| a * b)
    }
}

impl Mul<f64> for Amount {
    type Output = Amount;

    fn mul(self, rhs: f64) -> Amount {
        self * Amount::new(rhs)
    }
}

impl Sum for Amount {
    fn sum<I: Iterator<Item = Amount>>(iter: I) -> Amount {
        iter.fold(Amount::ZERO, Add::add)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(value) => write!(f, "{value}"),
            None => write!(f, "unset"),
        }
    }
}
