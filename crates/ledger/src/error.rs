//! Ledger errors
//!
//! Broken chains are deliberately NOT represented here: `verify_chain`
//! returns them as an ordinary `ChainReport` so the ledger stays
//! inspectable even when compromised. Errors cover the append contract
//! and the storage layer only.

use thiserror::Error;

/// Errors that can occur in ledger operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// The payload violated the append contract. Not retryable as-is;
    /// the caller must correct the payload first.
    #[error("Invalid payload: {0}")]
    Validation(String),

    /// A concurrent writer held the chain tail. Retryable with backoff.
    #[error("Concurrent append conflict: {0}")]
    Conflict(String),

    /// The persistence layer could not be reached or returned garbage.
    /// Nothing was written.
    #[error("Ledger storage unavailable: {0}")]
    Storage(String),
}

impl From<rusqlite::Error> for LedgerError {
    fn from(err: rusqlite::Error) -> Self {
        if let rusqlite::Error::SqliteFailure(e, _) = &err {
            match e.code {
                // Another writer holds the tail lock, or two appends raced
                // to the same index: both resolve by re-reading the tail
                // and retrying.
                rusqlite::ErrorCode::DatabaseBusy
                | rusqlite::ErrorCode::DatabaseLocked
                | rusqlite::ErrorCode::ConstraintViolation => {
                    return LedgerError::Conflict(err.to_string());
                }
                _ => {}
            }
        }
        LedgerError::Storage(err.to_string())
    }
}
