//! Landchain Ledger - hash-chained transfer record
//!
//! This is the HEART of Landchain. Every finalized ownership transfer is
//! recorded as one immutable block, linked to its predecessor by SHA-256.
//!
//! # Key Types
//! - `Block`: one immutable ledger entry
//! - `TransferRecord`: the fixed-schema payload a block records
//! - `Ledger`: append-only SQLite-backed chain with verification
//! - `ChainReport`: outcome of a full integrity scan

pub mod block;
pub mod error;
pub mod hash;
pub mod store;

pub use block::{Block, TransferRecord, GENESIS_HASH};
pub use error::LedgerError;
pub use hash::{calculate_block_hash, verify_blocks, ChainFault, ChainReport};
pub use store::{ChainFilter, ChainIter, Ledger};
