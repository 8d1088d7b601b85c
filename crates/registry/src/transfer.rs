//! Transfer requests - the state machine feeding the ledger

use chrono::{DateTime, Utc};
use landchain_core::{ParcelId, PartyId, Price};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// Status of a transfer request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TransferStatus {
    /// Awaiting a registrar decision
    Pending,
    /// Finalized and recorded on the chain
    Approved,
    /// Explicitly declined by the registrar
    Rejected,
}

/// A request to transfer a parcel from its current owner to a buyer.
///
/// The request id doubles as the ledger `transaction_id` once approved,
/// which is what links a chain block back to its workflow record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferRequest {
    /// Unique identifier, e.g. `TRX-4F2A9C01`
    pub id: String,

    /// Parcel changing hands
    pub parcel_id: ParcelId,

    /// Current owner (captured at submission time)
    pub seller_id: PartyId,

    /// Requesting buyer
    pub buyer_id: PartyId,

    /// Agreed sale price
    pub price: Price,

    /// Current status
    pub status: TransferStatus,

    /// When the request was submitted
    pub submitted_at: DateTime<Utc>,

    /// When it was approved or rejected
    pub decided_at: Option<DateTime<Utc>>,

    /// Optional reason for rejection
    pub rejection_reason: Option<String>,

    /// Chain position of the recorded transfer, set on approval
    pub block_index: Option<u64>,
}

impl TransferRequest {
    /// Create a new pending request.
    pub fn new(parcel_id: ParcelId, seller_id: PartyId, buyer_id: PartyId, price: Price) -> Self {
        let id = format!(
            "TRX-{}",
            uuid::Uuid::new_v4().to_string()[..8].to_uppercase()
        );

        Self {
            id,
            parcel_id,
            seller_id,
            buyer_id,
            price,
            status: TransferStatus::Pending,
            submitted_at: Utc::now(),
            decided_at: None,
            rejection_reason: None,
            block_index: None,
        }
    }

    /// Check whether the request still awaits a decision
    pub fn is_pending(&self) -> bool {
        self.status == TransferStatus::Pending
    }
}
