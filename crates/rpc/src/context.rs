//! Application context - wires everything together

use landchain_ledger::Ledger;
use landchain_projection::ProjectionEngine;
use landchain_registry::{RegistryStore, TransferWorkflow};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Application context - wires together stores, ledger and workflow
pub struct AppContext {
    pub workflow: TransferWorkflow,
    pub ledger: Arc<Ledger>,
    pub projection: Option<ProjectionEngine>,
    data_path: PathBuf,
}

impl AppContext {
    /// Create a new application context rooted at the data directory
    pub async fn new(data_path: impl AsRef<Path>) -> Result<Self, anyhow::Error> {
        let data_path = data_path.as_ref().to_path_buf();
        std::fs::create_dir_all(&data_path)?;

        let ledger = Arc::new(Ledger::open(data_path.join("ledger.db"))?);
        let store = RegistryStore::new(data_path.join("registry.db"))?;
        let workflow = TransferWorkflow::new(store, Arc::clone(&ledger));

        // The CLI stays usable without the read model
        let projection = ProjectionEngine::new(data_path.join("provenance.db"))
            .await
            .ok();

        Ok(Self {
            workflow,
            ledger,
            projection,
            data_path,
        })
    }

    /// Get the data directory path
    pub fn data_path(&self) -> &Path {
        &self.data_path
    }
}
