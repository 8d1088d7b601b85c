//! Hash computation and chain verification
//!
//! The digest is SHA-256 over the canonical preimage
//! `index | timestamp_rfc3339 | canonical(payload) | previous_hash`,
//! hex-encoded lowercase. Timestamps round-trip through RFC 3339 text, so
//! verification at any later point reproduces the identical digest.

use crate::block::{Block, TransferRecord, GENESIS_HASH};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Compute the content hash of a block from its own fields.
pub fn calculate_block_hash(
    index: u64,
    timestamp: &DateTime<Utc>,
    payload: &TransferRecord,
    previous_hash: &str,
) -> String {
    let mut hasher = Sha256::new();
    hasher.update(index.to_string().as_bytes());
    hasher.update(b"|");
    hasher.update(timestamp.to_rfc3339().as_bytes());
    hasher.update(b"|");
    hasher.update(payload.canonical().as_bytes());
    hasher.update(b"|");
    hasher.update(previous_hash.as_bytes());
    hex::encode(hasher.finalize())
}

/// Which integrity check failed at a block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChainFault {
    /// The stored hash does not match the digest recomputed from the
    /// block's own fields: the block itself was altered.
    HashMismatch { expected: String, actual: String },

    /// `previous_hash` does not match the actual hash of the predecessor:
    /// the link between blocks was altered.
    LinkageMismatch { expected: String, actual: String },

    /// Indices are not contiguous from 0.
    IndexGap { expected: u64, actual: u64 },
}

impl fmt::Display for ChainFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChainFault::HashMismatch { expected, actual } => {
                write!(f, "hash mismatch: expected '{}', got '{}'", expected, actual)
            }
            ChainFault::LinkageMismatch { expected, actual } => {
                write!(
                    f,
                    "linkage mismatch: expected previous_hash '{}', got '{}'",
                    expected, actual
                )
            }
            ChainFault::IndexGap { expected, actual } => {
                write!(f, "index gap: expected {}, got {}", expected, actual)
            }
        }
    }
}

/// Result of a full chain verification.
///
/// A broken chain is a normal, reportable outcome, not an error: the
/// ledger must remain inspectable even when compromised. Faults are
/// reported for the FIRST broken link found scanning forward from
/// genesis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChainReport {
    /// Every block verified; `length` blocks scanned.
    Intact { length: u64 },

    /// The first offending block and which check it failed.
    Broken { index: u64, fault: ChainFault },
}

impl ChainReport {
    pub fn is_intact(&self) -> bool {
        matches!(self, ChainReport::Intact { .. })
    }
}

impl fmt::Display for ChainReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChainReport::Intact { length } => {
                write!(f, "chain intact ({} blocks)", length)
            }
            ChainReport::Broken { index, fault } => {
                write!(f, "chain broken at block {}: {}", index, fault)
            }
        }
    }
}

/// Verify an ordered run of blocks starting at genesis.
///
/// Checks, in order at each block: index contiguity, linkage to the
/// predecessor, then the block's own content hash.
pub fn verify_blocks(blocks: &[Block]) -> ChainReport {
    let mut previous_hash = GENESIS_HASH;

    for (i, block) in blocks.iter().enumerate() {
        let expected_index = i as u64;
        if block.index != expected_index {
            return ChainReport::Broken {
                index: block.index,
                fault: ChainFault::IndexGap {
                    expected: expected_index,
                    actual: block.index,
                },
            };
        }

        if block.previous_hash != previous_hash {
            return ChainReport::Broken {
                index: block.index,
                fault: ChainFault::LinkageMismatch {
                    expected: previous_hash.to_string(),
                    actual: block.previous_hash.clone(),
                },
            };
        }

        let recomputed =
            calculate_block_hash(block.index, &block.timestamp, &block.payload, &block.previous_hash);
        if block.hash != recomputed {
            return ChainReport::Broken {
                index: block.index,
                fault: ChainFault::HashMismatch {
                    expected: recomputed,
                    actual: block.hash.clone(),
                },
            };
        }

        previous_hash = &block.hash;
    }

    ChainReport::Intact {
        length: blocks.len() as u64,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use landchain_core::{ParcelId, PartyId, Price};
    use rust_decimal_macros::dec;

    fn record(tx: &str) -> TransferRecord {
        TransferRecord {
            transaction_id: tx.to_string(),
            parcel_id: ParcelId::new("PLT-1111").unwrap(),
            seller_id: PartyId::new(2).unwrap(),
            buyer_id: PartyId::new(3).unwrap(),
            price: Price::new(dec!(50000)).unwrap(),
        }
    }

    fn block(index: u64, previous_hash: &str, tx: &str) -> Block {
        let timestamp = Utc::now();
        let payload = record(tx);
        let hash = calculate_block_hash(index, &timestamp, &payload, previous_hash);
        Block {
            index,
            timestamp,
            payload,
            previous_hash: previous_hash.to_string(),
            hash,
        }
    }

    #[test]
    fn test_hash_deterministic() {
        let b = block(0, GENESIS_HASH, "TX-001");
        let again = calculate_block_hash(b.index, &b.timestamp, &b.payload, &b.previous_hash);
        assert_eq!(b.hash, again);
        assert_eq!(b.hash.len(), 64);
    }

    #[test]
    fn test_hash_covers_every_field() {
        let b = block(0, GENESIS_HASH, "TX-001");
        let mut altered = b.payload.clone();
        altered.price = Price::new(dec!(50001)).unwrap();
        let h = calculate_block_hash(b.index, &b.timestamp, &altered, &b.previous_hash);
        assert_ne!(b.hash, h);

        let h = calculate_block_hash(b.index + 1, &b.timestamp, &b.payload, &b.previous_hash);
        assert_ne!(b.hash, h);

        let h = calculate_block_hash(b.index, &b.timestamp, &b.payload, "ff00");
        assert_ne!(b.hash, h);
    }

    #[test]
    fn test_verify_empty_chain() {
        assert_eq!(verify_blocks(&[]), ChainReport::Intact { length: 0 });
    }

    #[test]
    fn test_verify_valid_chain() {
        let b0 = block(0, GENESIS_HASH, "TX-001");
        let b1 = block(1, &b0.hash.clone(), "TX-002");
        let b2 = block(2, &b1.hash.clone(), "TX-003");

        let report = verify_blocks(&[b0, b1, b2]);
        assert_eq!(report, ChainReport::Intact { length: 3 });
        assert!(report.is_intact());
    }

    #[test]
    fn test_verify_reports_tampered_payload() {
        let b0 = block(0, GENESIS_HASH, "TX-001");
        let mut b1 = block(1, &b0.hash.clone(), "TX-002");
        // Mutate one field after the hash was computed
        b1.payload.price = Price::new(dec!(99999)).unwrap();
        let b2 = block(2, &b1.hash.clone(), "TX-003");

        match verify_blocks(&[b0, b1, b2]) {
            ChainReport::Broken {
                index: 1,
                fault: ChainFault::HashMismatch { .. },
            } => {}
            other => panic!("expected hash mismatch at 1, got {:?}", other),
        }
    }

    #[test]
    fn test_verify_reports_broken_link() {
        let b0 = block(0, GENESIS_HASH, "TX-001");
        let b1 = block(1, "deadbeef", "TX-002");

        match verify_blocks(&[b0, b1]) {
            ChainReport::Broken {
                index: 1,
                fault: ChainFault::LinkageMismatch { .. },
            } => {}
            other => panic!("expected linkage mismatch at 1, got {:?}", other),
        }
    }

    #[test]
    fn test_verify_reports_index_gap() {
        let b0 = block(0, GENESIS_HASH, "TX-001");
        let b2 = block(2, &b0.hash.clone(), "TX-003");

        match verify_blocks(&[b0, b2]) {
            ChainReport::Broken {
                index: 2,
                fault: ChainFault::IndexGap { expected: 1, actual: 2 },
            } => {}
            other => panic!("expected index gap, got {:?}", other),
        }
    }

    #[test]
    fn test_genesis_must_use_sentinel() {
        let b0 = block(0, "1111", "TX-001");
        match verify_blocks(&[b0]) {
            ChainReport::Broken {
                index: 0,
                fault: ChainFault::LinkageMismatch { .. },
            } => {}
            other => panic!("expected linkage mismatch at 0, got {:?}", other),
        }
    }
}
