//! Price - Strictly-positive decimal wrapper for sale prices
//!
//! Every agreed price in Landchain MUST be positive. This is enforced at
//! the type level, so the ledger never has to re-check it.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors that can occur when working with prices
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    #[error("Price must be positive: {0}")]
    NotPositive(Decimal),
}

/// A strictly-positive decimal price.
///
/// # Invariant
/// The inner value is always > 0. This is enforced by the constructor.
///
/// The `Display` form of a `Price` is its canonical text form: it is what
/// gets persisted and what enters the block hash preimage, so it must be
/// stable across store/load round-trips.
///
/// # Example
/// ```
/// use landchain_core::Price;
/// use rust_decimal::Decimal;
///
/// let price = Price::new(Decimal::new(50_000, 0)).unwrap();
/// assert_eq!(price.to_string(), "50000");
///
/// // Zero and negative prices are rejected
/// assert!(Price::new(Decimal::ZERO).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Price(Decimal);

impl Price {
    /// Create a new Price from a Decimal.
    ///
    /// Returns an error if the value is zero or negative.
    pub fn new(value: Decimal) -> Result<Self, PriceError> {
        if value <= Decimal::ZERO {
            Err(PriceError::NotPositive(value))
        } else {
            Ok(Self(value))
        }
    }

    /// Create a Price without validation.
    ///
    /// # Safety
    /// The caller MUST ensure the value is positive.
    /// Use only for trusted sources (e.g., rows read back from validated storage).
    #[inline]
    pub const fn new_unchecked(value: Decimal) -> Self {
        Self(value)
    }

    /// Get the inner Decimal value
    #[inline]
    pub const fn value(&self) -> Decimal {
        self.0
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<Decimal> for Price {
    type Error = PriceError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Price> for Decimal {
    fn from(price: Price) -> Self {
        price.0
    }
}
