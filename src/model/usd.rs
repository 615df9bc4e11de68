//! The `Usd` type for handling dollar amounts.
//!
//! This module provides the `Usd` type which wraps `Decimal` and handles parsing
//! values that may or may not include a dollar sign and commas. Arithmetic is
//! exact; rounding to two decimal places happens only at the output boundary.

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::error::Error;
use std::fmt;
use std::fmt::{Debug, Display, Formatter};
use std::iter::Sum;
use std::ops::{Add, AddAssign, Neg, Sub};
use std::str::FromStr;

/// Represents a (signed) dollar amount.
///
/// This type wraps `Decimal` and serializes to JSON as a plain number, rounded
/// to two decimal places. Parsing from a string accepts an optional dollar sign
/// and thousands separators.
///
/// # Examples
///
/// ```
/// # use cost_guard::model::Usd;
/// # use std::str::FromStr;
/// let amount = Usd::from_str("-$1,250.50").unwrap();
/// assert_eq!(amount.to_string(), "-$1,250.50");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Usd(Decimal);

impl Usd {
    pub const ZERO: Usd = Usd(Decimal::ZERO);

    /// Creates a new `Usd` from a `Decimal` value.
    pub const fn new(value: Decimal) -> Self {
        Self(value)
    }

    /// Creates a `Usd` from an `f64`, returning `None` for NaN or infinity.
    pub fn from_f64(value: f64) -> Option<Self> {
        Decimal::from_f64(value).map(Self)
    }

    /// Returns the underlying `Decimal` value.
    pub fn value(&self) -> Decimal {
        self.0
    }

    /// Returns the value rounded to two decimal places.
    pub fn rounded(&self) -> Self {
        Self(self.0.round_dp(2))
    }

    /// Returns the absolute value.
    pub fn abs(&self) -> Self {
        Self(self.0.abs())
    }

    /// Returns true if the amount is zero.
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Returns true if the amount is positive.
    pub fn is_positive(&self) -> bool {
        !self.is_zero() && self.0.is_sign_positive()
    }

    /// Returns true if the amount is negative.
    pub fn is_negative(&self) -> bool {
        self.0.is_sign_negative() && !self.is_zero()
    }

    /// Lossy conversion to `f64` for statistics that do not feed money output.
    pub fn to_f64(&self) -> f64 {
        self.0.to_f64().unwrap_or_default()
    }
}

/// An error that can occur when parsing strings into `Usd` values.
pub struct UsdError(rust_decimal::Error);

impl Debug for UsdError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Debug::fmt(&self.0, f)
    }
}

impl Display for UsdError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl Error for UsdError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.0)
    }
}

impl FromStr for Usd {
    type Err = UsdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Ok(Usd::ZERO);
        }

        // Remove the dollar sign if present, for either "-$50.00" or "$50.00".
        let without_dollar = if let Some(after_minus) = trimmed.strip_prefix('-') {
            if let Some(after_dollar) = after_minus.strip_prefix('$') {
                format!("-{after_dollar}")
            } else {
                trimmed.to_string()
            }
        } else if let Some(after_dollar) = trimmed.strip_prefix('$') {
            after_dollar.to_string()
        } else {
            trimmed.to_string()
        };

        // Remove thousands separators.
        let without_commas = without_dollar.replace(',', "");
        let value = Decimal::from_str(&without_commas).map_err(UsdError)?;
        Ok(Usd(value))
    }
}

impl fmt::Display for Usd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (sign, num) = if self.is_negative() {
            (String::from("-"), self.0.abs())
        } else {
            (String::new(), self.0)
        };
        write!(
            f,
            "{sign}${}",
            format_num::format_num!(",.2", num.to_f64().unwrap_or_default())
        )
    }
}

impl Serialize for Usd {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        // Serialize as a plain JSON number, rounded at the boundary.
        rust_decimal::serde::float::serialize(&self.0.round_dp(2), serializer)
    }
}

impl<'de> Deserialize<'de> for Usd {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        rust_decimal::serde::float::deserialize(deserializer).map(Usd)
    }
}

impl From<Decimal> for Usd {
    fn from(value: Decimal) -> Self {
        Usd(value)
    }
}

impl From<Usd> for Decimal {
    fn from(amount: Usd) -> Self {
        amount.0
    }
}

impl From<i64> for Usd {
    fn from(value: i64) -> Self {
        Usd(Decimal::from(value))
    }
}

impl Add for Usd {
    type Output = Usd;

    fn add(self, rhs: Self) -> Self::Output {
        Usd(self.0 + rhs.0)
    }
}

impl AddAssign for Usd {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Sub for Usd {
    type Output = Usd;

    fn sub(self, rhs: Self) -> Self::Output {
        Usd(self.0 - rhs.0)
    }
}

impl Neg for Usd {
    type Output = Usd;

    fn neg(self) -> Self::Output {
        Usd(-self.0)
    }
}

impl Sum for Usd {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Usd::ZERO, |acc, x| acc + x)
    }
}
