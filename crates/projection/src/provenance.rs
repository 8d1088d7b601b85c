//! Provenance projection - per-parcel transfer history from the chain

use landchain_ledger::Block;
use sqlx::{Row, SqlitePool};

/// One display-ready provenance line, derived from a chain block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvenanceEntry {
    pub block_index: i64,
    pub transaction_id: String,
    pub parcel_id: String,
    pub seller_id: i64,
    pub buyer_id: i64,
    pub price: String,
    pub timestamp: String,
}

/// Provenance projection - tracks transfer history per parcel
pub struct ProvenanceProjection {
    pool: SqlitePool,
}

impl ProvenanceProjection {
    /// Create a new provenance projection
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Initialize the schema
    pub async fn init(&self) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS provenance (
                block_index INTEGER PRIMARY KEY,
                transaction_id TEXT NOT NULL,
                parcel_id TEXT NOT NULL,
                seller_id INTEGER NOT NULL,
                buyer_id INTEGER NOT NULL,
                price TEXT NOT NULL,
                timestamp TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_provenance_parcel
            ON provenance(parcel_id, block_index)
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Apply a chain block to the view
    pub async fn apply(&self, block: &Block) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT OR REPLACE INTO provenance
            (block_index, transaction_id, parcel_id, seller_id, buyer_id, price, timestamp)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(block.index as i64)
        .bind(&block.payload.transaction_id)
        .bind(block.payload.parcel_id.as_str())
        .bind(block.payload.seller_id.value())
        .bind(block.payload.buyer_id.value())
        .bind(block.payload.price.to_string())
        .bind(block.timestamp.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Drop all projected rows (before a full replay)
    pub async fn clear(&self) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM provenance")
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Transfer history of one parcel, oldest first
    pub async fn parcel_history(
        &self,
        parcel_id: &str,
    ) -> Result<Vec<ProvenanceEntry>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT block_index, transaction_id, parcel_id, seller_id, buyer_id, price, timestamp
            FROM provenance
            WHERE parcel_id = ?
            ORDER BY block_index ASC
            "#,
        )
        .bind(parcel_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(read_entry).collect())
    }

    /// Most recent transfers across all parcels
    pub async fn recent(&self, limit: u32) -> Result<Vec<ProvenanceEntry>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT block_index, transaction_id, parcel_id, seller_id, buyer_id, price, timestamp
            FROM provenance
            ORDER BY block_index DESC
            LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(read_entry).collect())
    }

    /// Latest recorded buyer of a parcel, if it ever traded
    pub async fn last_buyer(&self, parcel_id: &str) -> Result<Option<i64>, sqlx::Error> {
        let row = sqlx::query(
            r#"
            SELECT buyer_id FROM provenance
            WHERE parcel_id = ?
            ORDER BY block_index DESC
            LIMIT 1
            "#,
        )
        .bind(parcel_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.get("buyer_id")))
    }
}

fn read_entry(row: &sqlx::sqlite::SqliteRow) -> ProvenanceEntry {
    ProvenanceEntry {
        block_index: row.get("block_index"),
        transaction_id: row.get("transaction_id"),
        parcel_id: row.get("parcel_id"),
        seller_id: row.get("seller_id"),
        buyer_id: row.get("buyer_id"),
        price: row.get("price"),
        timestamp: row.get("timestamp"),
    }
}
