//! Projection errors

use landchain_ledger::ChainFault;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProjectionError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Ledger error: {0}")]
    Ledger(#[from] landchain_ledger::LedgerError),

    /// The chain failed verification. Provenance must not be presented
    /// as verified until the fault is investigated; it is surfaced, never
    /// repaired here.
    #[error("Chain compromised at block {index}: {fault}")]
    ChainCompromised { index: u64, fault: ChainFault },
}
