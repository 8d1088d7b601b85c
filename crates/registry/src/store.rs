//! SQLite storage for parcels and transfer requests

use crate::parcel::{Parcel, ParcelStatus};
use crate::transfer::{TransferRequest, TransferStatus};
use chrono::{DateTime, Utc};
use landchain_core::{ParcelId, PartyId, Price};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use thiserror::Error;

/// Errors from the registry store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Parcel not found: {0}")]
    ParcelNotFound(String),

    #[error("Parcel already registered: {0}")]
    DuplicateParcel(String),

    #[error("Transfer request not found: {0}")]
    RequestNotFound(String),

    #[error("Unreadable stored value: {0}")]
    Corrupt(String),
}

/// SQLite storage for parcels and transfer requests
pub struct RegistryStore {
    conn: Connection,
}

impl RegistryStore {
    /// Create a new store with the given database path
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    /// Create an in-memory store (for testing)
    pub fn in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    /// Initialize the database schema
    fn init_schema(&self) -> Result<(), StoreError> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS parcels (
                plot_number TEXT PRIMARY KEY,
                location TEXT NOT NULL,
                area TEXT NOT NULL,
                owner_id INTEGER NOT NULL,
                status TEXT NOT NULL,
                registered_at TEXT NOT NULL
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS transfer_requests (
                id TEXT PRIMARY KEY,
                parcel_id TEXT NOT NULL,
                seller_id INTEGER NOT NULL,
                buyer_id INTEGER NOT NULL,
                price TEXT NOT NULL,
                status TEXT NOT NULL,
                submitted_at TEXT NOT NULL,
                decided_at TEXT,
                rejection_reason TEXT,
                block_index INTEGER
            )",
            [],
        )?;

        // Index for efficient status queries
        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_transfer_requests_status
             ON transfer_requests(status)",
            [],
        )?;

        Ok(())
    }

    /// Insert a newly registered parcel; duplicate plot numbers are rejected.
    pub fn insert_parcel(&self, parcel: &Parcel) -> Result<(), StoreError> {
        let result = self.conn.execute(
            "INSERT INTO parcels
             (plot_number, location, area, owner_id, status, registered_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                parcel.plot_number.as_str(),
                parcel.location,
                parcel.area.to_string(),
                parcel.owner_id.value(),
                parcel.status.to_string(),
                parcel.registered_at.to_rfc3339(),
            ],
        );

        match result {
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Err(StoreError::DuplicateParcel(
                    parcel.plot_number.as_str().to_string(),
                ))
            }
            Err(other) => Err(StoreError::Database(other)),
        }
    }

    /// Save a parcel, replacing any existing row
    pub fn save_parcel(&self, parcel: &Parcel) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO parcels
             (plot_number, location, area, owner_id, status, registered_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                parcel.plot_number.as_str(),
                parcel.location,
                parcel.area.to_string(),
                parcel.owner_id.value(),
                parcel.status.to_string(),
                parcel.registered_at.to_rfc3339(),
            ],
        )?;

        Ok(())
    }

    /// Get a parcel by plot number
    pub fn get_parcel(&self, plot_number: &ParcelId) -> Result<Parcel, StoreError> {
        let raw = self
            .conn
            .query_row(
                "SELECT plot_number, location, area, owner_id, status, registered_at
                 FROM parcels WHERE plot_number = ?1",
                params![plot_number.as_str()],
                read_parcel_raw,
            )
            .optional()?;

        match raw {
            Some(raw) => into_parcel(raw),
            None => Err(StoreError::ParcelNotFound(
                plot_number.as_str().to_string(),
            )),
        }
    }

    /// List all parcels, ordered by plot number
    pub fn list_parcels(&self) -> Result<Vec<Parcel>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT plot_number, location, area, owner_id, status, registered_at
             FROM parcels ORDER BY plot_number",
        )?;

        let raws: Vec<ParcelRaw> = stmt
            .query_map([], read_parcel_raw)?
            .collect::<Result<Vec<_>, _>>()?;

        raws.into_iter().map(into_parcel).collect()
    }

    /// Save a transfer request, replacing any existing row
    pub fn save_request(&self, request: &TransferRequest) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO transfer_requests
             (id, parcel_id, seller_id, buyer_id, price, status,
              submitted_at, decided_at, rejection_reason, block_index)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                request.id,
                request.parcel_id.as_str(),
                request.seller_id.value(),
                request.buyer_id.value(),
                request.price.to_string(),
                request.status.to_string(),
                request.submitted_at.to_rfc3339(),
                request.decided_at.map(|t| t.to_rfc3339()),
                request.rejection_reason,
                request.block_index.map(|i| i as i64),
            ],
        )?;

        Ok(())
    }

    /// Get a transfer request by id
    pub fn get_request(&self, id: &str) -> Result<TransferRequest, StoreError> {
        let raw = self
            .conn
            .query_row(
                "SELECT id, parcel_id, seller_id, buyer_id, price, status,
                        submitted_at, decided_at, rejection_reason, block_index
                 FROM transfer_requests WHERE id = ?1",
                params![id],
                read_request_raw,
            )
            .optional()?;

        match raw {
            Some(raw) => into_request(raw),
            None => Err(StoreError::RequestNotFound(id.to_string())),
        }
    }

    /// List transfer requests with a specific status, newest first
    pub fn list_requests_by_status(
        &self,
        status: TransferStatus,
    ) -> Result<Vec<TransferRequest>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, parcel_id, seller_id, buyer_id, price, status,
                    submitted_at, decided_at, rejection_reason, block_index
             FROM transfer_requests WHERE status = ?1
             ORDER BY submitted_at DESC",
        )?;

        let raws: Vec<RequestRaw> = stmt
            .query_map(params![status.to_string()], read_request_raw)?
            .collect::<Result<Vec<_>, _>>()?;

        raws.into_iter().map(into_request).collect()
    }

    /// List all transfer requests, newest first
    pub fn list_requests(&self) -> Result<Vec<TransferRequest>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, parcel_id, seller_id, buyer_id, price, status,
                    submitted_at, decided_at, rejection_reason, block_index
             FROM transfer_requests ORDER BY submitted_at DESC",
        )?;

        let raws: Vec<RequestRaw> = stmt
            .query_map([], read_request_raw)?
            .collect::<Result<Vec<_>, _>>()?;

        raws.into_iter().map(into_request).collect()
    }
}

type ParcelRaw = (String, String, String, i64, String, String);

fn read_parcel_raw(row: &rusqlite::Row<'_>) -> rusqlite::Result<ParcelRaw> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
    ))
}

fn into_parcel(raw: ParcelRaw) -> Result<Parcel, StoreError> {
    let (plot_number, location, area, owner_id, status, registered_at) = raw;

    Ok(Parcel {
        plot_number: ParcelId::new_unchecked(plot_number),
        location,
        area: area
            .parse()
            .map_err(|_| StoreError::Corrupt(format!("area '{}'", area)))?,
        owner_id: PartyId::new_unchecked(owner_id),
        status: status
            .parse::<ParcelStatus>()
            .map_err(|_| StoreError::Corrupt(format!("parcel status '{}'", status)))?,
        registered_at: parse_timestamp(&registered_at)?,
    })
}

type RequestRaw = (
    String,
    String,
    i64,
    i64,
    String,
    String,
    String,
    Option<String>,
    Option<String>,
    Option<i64>,
);

fn read_request_raw(row: &rusqlite::Row<'_>) -> rusqlite::Result<RequestRaw> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
        row.get(7)?,
        row.get(8)?,
        row.get(9)?,
    ))
}

fn into_request(raw: RequestRaw) -> Result<TransferRequest, StoreError> {
    let (
        id,
        parcel_id,
        seller_id,
        buyer_id,
        price,
        status,
        submitted_at,
        decided_at,
        rejection_reason,
        block_index,
    ) = raw;

    let price: rust_decimal::Decimal = price
        .parse()
        .map_err(|_| StoreError::Corrupt(format!("price '{}'", price)))?;

    Ok(TransferRequest {
        id,
        parcel_id: ParcelId::new_unchecked(parcel_id),
        seller_id: PartyId::new_unchecked(seller_id),
        buyer_id: PartyId::new_unchecked(buyer_id),
        price: Price::new_unchecked(price),
        status: status
            .parse::<TransferStatus>()
            .map_err(|_| StoreError::Corrupt(format!("transfer status '{}'", status)))?,
        submitted_at: parse_timestamp(&submitted_at)?,
        decided_at: decided_at.as_deref().map(parse_timestamp).transpose()?,
        rejection_reason,
        block_index: block_index.map(|i| i as u64),
    })
}

fn parse_timestamp(text: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(text)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|_| StoreError::Corrupt(format!("timestamp '{}'", text)))
}
