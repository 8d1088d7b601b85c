//! Projection engine - coordinates replay and updates
//!
//! The engine refuses to rebuild from a chain that fails verification:
//! a compromised chain must be surfaced to an operator, and the view
//! must not present its history as verified in the meantime.

use crate::error::ProjectionError;
use crate::provenance::ProvenanceProjection;
use landchain_ledger::{Block, ChainFilter, ChainReport, Ledger};
use sqlx::SqlitePool;
use std::path::Path;

/// Projection engine - coordinates replay and updates
pub struct ProjectionEngine {
    pub provenance: ProvenanceProjection,
}

impl ProjectionEngine {
    /// Create a new projection engine
    pub async fn new(db_path: impl AsRef<Path>) -> Result<Self, ProjectionError> {
        let db_url = format!("sqlite:{}?mode=rwc", db_path.as_ref().display());
        let pool = SqlitePool::connect(&db_url).await?;

        let provenance = ProvenanceProjection::new(pool);
        provenance.init().await?;

        Ok(Self { provenance })
    }

    /// Apply a single freshly appended block
    pub async fn apply(&self, block: &Block) -> Result<(), ProjectionError> {
        self.provenance.apply(block).await?;
        Ok(())
    }

    /// Rebuild the view from the full chain.
    ///
    /// Verifies the chain first; a broken chain aborts the replay with
    /// [`ProjectionError::ChainCompromised`] and leaves the existing view
    /// untouched.
    pub async fn replay(&self, ledger: &Ledger) -> Result<usize, ProjectionError> {
        match ledger.verify_chain()? {
            ChainReport::Intact { .. } => {}
            ChainReport::Broken { index, fault } => {
                tracing::error!(index, %fault, "refusing to project a compromised chain");
                return Err(ProjectionError::ChainCompromised { index, fault });
            }
        }

        self.provenance.clear().await?;

        let mut count = 0;
        for block in ledger.get_chain(ChainFilter::all()) {
            self.provenance.apply(&block?).await?;
            count += 1;
        }

        Ok(count)
    }

    /// Get the provenance view
    pub fn provenance(&self) -> &ProvenanceProjection {
        &self.provenance
    }
}
