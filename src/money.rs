//! Monetary amounts shared by tasks and the ledger.
//!
//! Every amount that moves between balances or is promised by a task must be
//! strictly positive and representable in the ledger's `NUMERIC(20, 4)`
//! columns. [`Amount`] makes both invariants part of the type so downstream
//! code never has to re-check them.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors returned while constructing an [`Amount`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AmountError {
    /// The value is zero or negative.
    #[error("amount must be greater than zero, got {0}")]
    NotPositive(Decimal),

    /// The value has more fractional digits than the ledger stores.
    #[error("amount {0} has more than {max} decimal places", max = Amount::MAX_SCALE)]
    TooPrecise(Decimal),

    /// The textual value is not a decimal number.
    #[error("invalid decimal amount '{0}'")]
    Malformed(String),
}

/// Strictly positive currency amount.
///
/// # Examples
///
/// ```
/// use questbank::money::Amount;
/// use rust_decimal::Decimal;
///
/// let reward = Amount::new(Decimal::from(50)).expect("positive amount");
/// assert_eq!(reward.value(), Decimal::from(50));
/// assert!(Amount::new(Decimal::ZERO).is_err());
/// assert!(Amount::new(Decimal::new(100_005, 5)).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Amount(Decimal);

impl Amount {
    /// Number of fractional digits stored by the ledger.
    pub const MAX_SCALE: u32 = 4;

    /// Creates a validated amount.
    ///
    /// # Errors
    ///
    /// Returns [`AmountError::NotPositive`] when `value <= 0` and
    /// [`AmountError::TooPrecise`] when `value` has more than
    /// [`Amount::MAX_SCALE`] significant decimal places.
    pub fn new(value: Decimal) -> Result<Self, AmountError> {
        if value <= Decimal::ZERO {
            return Err(AmountError::NotPositive(value));
        }
        let normalized = value.normalize();
        if normalized.scale() > Self::MAX_SCALE {
            return Err(AmountError::TooPrecise(value));
        }
        Ok(Self(normalized))
    }

    /// Returns the wrapped decimal value.
    #[must_use]
    pub const fn value(self) -> Decimal {
        self.0
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = AmountError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

impl FromStr for Amount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value =
            Decimal::from_str(s.trim()).map_err(|_| AmountError::Malformed(s.to_owned()))?;
        Self::new(value)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
