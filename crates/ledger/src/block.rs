//! Block and payload types for the hash chain

use crate::error::LedgerError;
use chrono::{DateTime, Utc};
use landchain_core::{ParcelId, PartyId, Price};
use serde::{Deserialize, Serialize};

/// Sentinel `previous_hash` of the genesis block: the all-zero digest.
pub const GENESIS_HASH: &str = "0000000000000000000000000000000000000000000000000000000000000000";

/// The transaction data recorded by one block.
///
/// Fixed schema with a documented canonical field order:
/// `transaction_id | parcel_id | seller_id | buyer_id | price`.
/// The `|` separator is reserved; `transaction_id` is validated to never
/// contain it, and the remaining fields cannot by construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferRecord {
    /// Application-level transaction identifier (e.g. `TRX-4F2A9C01`)
    pub transaction_id: String,

    /// Plot number of the parcel changing hands
    pub parcel_id: ParcelId,

    /// Party giving up title
    pub seller_id: PartyId,

    /// Party receiving title
    pub buyer_id: PartyId,

    /// Agreed sale price
    pub price: Price,
}

impl TransferRecord {
    /// Check the append contract: every field present and hashable.
    ///
    /// `parcel_id`, `seller_id`, `buyer_id` and `price` are already
    /// validated by their types; only `transaction_id` is a free string.
    pub fn validate(&self) -> Result<(), LedgerError> {
        if self.transaction_id.is_empty() {
            return Err(LedgerError::Validation(
                "transaction_id cannot be empty".to_string(),
            ));
        }
        if self.transaction_id.contains('|') {
            return Err(LedgerError::Validation(format!(
                "transaction_id '{}' contains reserved separator '|'",
                self.transaction_id
            )));
        }
        Ok(())
    }

    /// Canonical serialization used as hash input.
    ///
    /// Stable across processes and over time; any change to this format
    /// invalidates previously stored hashes and must be versioned.
    pub fn canonical(&self) -> String {
        format!(
            "{}|{}|{}|{}|{}",
            self.transaction_id, self.parcel_id, self.seller_id, self.buyer_id, self.price
        )
    }
}

/// One immutable ledger entry representing a finalized transfer.
///
/// Created exactly once, at the moment a transfer is approved; never
/// updated or deleted. `hash` is computed at append time and only ever
/// recomputed for comparison during verification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    /// Position in the chain, contiguous from 0 (genesis)
    pub index: u64,

    /// Append instant, never mutated
    pub timestamp: DateTime<Utc>,

    /// The recorded transaction
    pub payload: TransferRecord,

    /// `hash` of the block at `index - 1`, or [`GENESIS_HASH`] for block 0
    pub previous_hash: String,

    /// SHA-256 over (`index`, `timestamp`, canonical payload, `previous_hash`)
    pub hash: String,
}
