//! Land parcel records

use chrono::{DateTime, Utc};
use landchain_core::{ParcelId, PartyId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// Title state of a parcel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ParcelStatus {
    /// Titled, no transfer in flight
    Active,
    /// A pending transfer request exists; no second request may be opened
    PendingTransfer,
}

/// A registered land parcel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parcel {
    /// Plot number, unique across the registry
    pub plot_number: ParcelId,

    /// Human-readable location, e.g. "Dhanmondi, Dhaka"
    pub location: String,

    /// Area in acres
    pub area: Decimal,

    /// Current titled owner
    pub owner_id: PartyId,

    /// Title state
    pub status: ParcelStatus,

    /// When the parcel entered the registry
    pub registered_at: DateTime<Utc>,
}

impl Parcel {
    /// Create a new active parcel titled to `owner_id`.
    pub fn new(
        plot_number: ParcelId,
        location: impl Into<String>,
        area: Decimal,
        owner_id: PartyId,
    ) -> Self {
        Self {
            plot_number,
            location: location.into(),
            area,
            owner_id,
            status: ParcelStatus::Active,
            registered_at: Utc::now(),
        }
    }
}
