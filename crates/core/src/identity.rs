//! Identities - plot numbers and party ids
//!
//! A `ParcelId` is the plot number of a land parcel (e.g. `DHAKA-001`).
//! A `PartyId` is the numeric identity of a registered buyer or seller.
//! Both are validated at construction so downstream code can rely on them.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors that can occur when constructing identities
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdentityError {
    #[error("Plot number cannot be empty")]
    EmptyParcelId,

    #[error("Invalid plot number '{0}': expected uppercase letters, digits and '-'")]
    InvalidParcelId(String),

    #[error("Party id must be positive: {0}")]
    InvalidPartyId(i64),
}

/// Plot number identifying a land parcel.
///
/// # Invariant
/// Non-empty, composed of uppercase ASCII letters, digits and `-`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ParcelId(String);

impl ParcelId {
    /// Create a new ParcelId, validating the plot number format.
    pub fn new(plot: impl Into<String>) -> Result<Self, IdentityError> {
        let plot = plot.into();
        if plot.is_empty() {
            return Err(IdentityError::EmptyParcelId);
        }
        let valid = plot
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '-');
        if !valid {
            return Err(IdentityError::InvalidParcelId(plot));
        }
        Ok(Self(plot))
    }

    /// Create a ParcelId without validation.
    ///
    /// # Safety
    /// Use only for trusted sources (e.g., rows read back from validated storage).
    #[inline]
    pub fn new_unchecked(plot: impl Into<String>) -> Self {
        Self(plot.into())
    }

    /// Get the plot number as a string slice
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ParcelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for ParcelId {
    type Error = IdentityError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ParcelId> for String {
    fn from(id: ParcelId) -> Self {
        id.0
    }
}

/// Numeric identity of a registered party (buyer or seller).
///
/// # Invariant
/// Always positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct PartyId(i64);

impl PartyId {
    /// Create a new PartyId.
    ///
    /// Returns an error if the value is zero or negative.
    pub fn new(id: i64) -> Result<Self, IdentityError> {
        if id <= 0 {
            Err(IdentityError::InvalidPartyId(id))
        } else {
            Ok(Self(id))
        }
    }

    /// Create a PartyId without validation.
    ///
    /// # Safety
    /// Use only for trusted sources (e.g., rows read back from validated storage).
    #[inline]
    pub const fn new_unchecked(id: i64) -> Self {
        Self(id)
    }

    /// Get the inner numeric value
    #[inline]
    pub const fn value(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for PartyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<i64> for PartyId {
    type Error = IdentityError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<PartyId> for i64 {
    fn from(id: PartyId) -> Self {
        id.0
    }
}
