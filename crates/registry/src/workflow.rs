//! Transfer workflow logic
//!
//! Approval is the single producer of ledger appends: a block is created
//! exactly once, when a pending request is approved, and the request is
//! only marked approved after its block exists on the chain.

use crate::parcel::{Parcel, ParcelStatus};
use crate::store::{RegistryStore, StoreError};
use crate::transfer::{TransferRequest, TransferStatus};
use chrono::Utc;
use landchain_core::{ParcelId, PartyId, Price};
use landchain_ledger::{Block, Ledger, LedgerError, TransferRecord};
use rust_decimal::Decimal;
use std::sync::Arc;
use thiserror::Error;

/// Errors from the transfer workflow
#[derive(Debug, Error)]
pub enum TransferError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("Parcel {0} already has a transfer in flight")]
    ParcelUnderTransfer(String),

    #[error("Buyer {buyer} already owns parcel {parcel}")]
    SelfPurchase { parcel: String, buyer: PartyId },

    #[error("Transfer request already {0}")]
    AlreadyDecided(String),
}

/// Registrar workflow over parcels, transfer requests and the ledger
pub struct TransferWorkflow {
    store: RegistryStore,
    ledger: Arc<Ledger>,
}

impl TransferWorkflow {
    /// Create a new workflow over the given store and ledger
    pub fn new(store: RegistryStore, ledger: Arc<Ledger>) -> Self {
        Self { store, ledger }
    }

    /// Record a new parcel titled to its first owner.
    ///
    /// Registrations live in the registry only; the chain records
    /// finalized sales exclusively.
    pub fn register_parcel(
        &self,
        plot_number: ParcelId,
        location: impl Into<String>,
        area: Decimal,
        owner_id: PartyId,
    ) -> Result<Parcel, TransferError> {
        let parcel = Parcel::new(plot_number, location, area, owner_id);
        self.store.insert_parcel(&parcel)?;

        tracing::info!(plot = %parcel.plot_number, owner = %parcel.owner_id, "parcel registered");
        Ok(parcel)
    }

    /// Submit a transfer request for a parcel.
    ///
    /// The seller is always the current titled owner. The parcel moves to
    /// `PendingTransfer` so no competing request can be opened for it.
    pub fn submit_transfer(
        &self,
        parcel_id: &ParcelId,
        buyer_id: PartyId,
        price: Price,
    ) -> Result<TransferRequest, TransferError> {
        let mut parcel = self.store.get_parcel(parcel_id)?;

        if parcel.status != ParcelStatus::Active {
            return Err(TransferError::ParcelUnderTransfer(
                parcel_id.as_str().to_string(),
            ));
        }
        if parcel.owner_id == buyer_id {
            return Err(TransferError::SelfPurchase {
                parcel: parcel_id.as_str().to_string(),
                buyer: buyer_id,
            });
        }

        let request = TransferRequest::new(parcel_id.clone(), parcel.owner_id, buyer_id, price);
        self.store.save_request(&request)?;

        parcel.status = ParcelStatus::PendingTransfer;
        self.store.save_parcel(&parcel)?;

        tracing::info!(request = %request.id, plot = %parcel_id, buyer = %buyer_id, "transfer submitted");
        Ok(request)
    }

    /// Approve a pending transfer: record it on the chain, then re-title
    /// the parcel to the buyer.
    ///
    /// Returns the decided request and the appended block. If the append
    /// fails the request stays pending and nothing is re-titled.
    pub fn approve(&self, request_id: &str) -> Result<(TransferRequest, Block), TransferError> {
        let mut request = self.store.get_request(request_id)?;

        match request.status {
            TransferStatus::Pending => {}
            TransferStatus::Approved | TransferStatus::Rejected => {
                return Err(TransferError::AlreadyDecided(request.status.to_string()));
            }
        }

        let record = TransferRecord {
            transaction_id: request.id.clone(),
            parcel_id: request.parcel_id.clone(),
            seller_id: request.seller_id,
            buyer_id: request.buyer_id,
            price: request.price,
        };

        let block = self.ledger.append(record)?;

        request.status = TransferStatus::Approved;
        request.decided_at = Some(Utc::now());
        request.block_index = Some(block.index);
        self.store.save_request(&request)?;

        let mut parcel = self.store.get_parcel(&request.parcel_id)?;
        parcel.owner_id = request.buyer_id;
        parcel.status = ParcelStatus::Active;
        self.store.save_parcel(&parcel)?;

        tracing::info!(
            request = %request.id,
            block = block.index,
            plot = %request.parcel_id,
            "transfer approved"
        );
        Ok((request, block))
    }

    /// Reject a pending transfer; the parcel returns to `Active` and
    /// nothing reaches the chain.
    pub fn reject(
        &self,
        request_id: &str,
        reason: Option<&str>,
    ) -> Result<TransferRequest, TransferError> {
        let mut request = self.store.get_request(request_id)?;

        if !request.is_pending() {
            return Err(TransferError::AlreadyDecided(request.status.to_string()));
        }

        request.status = TransferStatus::Rejected;
        request.decided_at = Some(Utc::now());
        request.rejection_reason = reason.map(|s| s.to_string());
        self.store.save_request(&request)?;

        let mut parcel = self.store.get_parcel(&request.parcel_id)?;
        parcel.status = ParcelStatus::Active;
        self.store.save_parcel(&parcel)?;

        tracing::info!(request = %request.id, "transfer rejected");
        Ok(request)
    }

    /// Get a transfer request by id
    pub fn get_request(&self, request_id: &str) -> Result<TransferRequest, TransferError> {
        Ok(self.store.get_request(request_id)?)
    }

    /// List all pending transfer requests
    pub fn list_pending(&self) -> Result<Vec<TransferRequest>, TransferError> {
        Ok(self.store.list_requests_by_status(TransferStatus::Pending)?)
    }

    /// List all transfer requests regardless of status
    pub fn list_all(&self) -> Result<Vec<TransferRequest>, TransferError> {
        Ok(self.store.list_requests()?)
    }

    /// Get a parcel by plot number
    pub fn parcel(&self, plot_number: &ParcelId) -> Result<Parcel, TransferError> {
        Ok(self.store.get_parcel(plot_number)?)
    }

    /// List all registered parcels
    pub fn list_parcels(&self) -> Result<Vec<Parcel>, TransferError> {
        Ok(self.store.list_parcels()?)
    }

    /// The ledger this workflow appends to
    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn workflow() -> TransferWorkflow {
        let store = RegistryStore::in_memory().unwrap();
        let ledger = Arc::new(Ledger::in_memory().unwrap());
        TransferWorkflow::new(store, ledger)
    }

    fn plot(p: &str) -> ParcelId {
        ParcelId::new(p).unwrap()
    }

    fn party(id: i64) -> PartyId {
        PartyId::new(id).unwrap()
    }

    fn price(p: i64) -> Price {
        Price::new(Decimal::new(p, 0)).unwrap()
    }

    #[test]
    fn test_approve_appends_block_and_retitles() {
        let wf = workflow();
        wf.register_parcel(plot("PLT-1111"), "Gulshan, Dhaka", dec!(1.5), party(2))
            .unwrap();

        let request = wf
            .submit_transfer(&plot("PLT-1111"), party(3), price(50_000))
            .unwrap();
        let (decided, block) = wf.approve(&request.id).unwrap();

        assert_eq!(decided.status, TransferStatus::Approved);
        assert_eq!(decided.block_index, Some(0));
        assert!(decided.decided_at.is_some());

        assert_eq!(block.index, 0);
        assert_eq!(block.payload.transaction_id, request.id);
        assert_eq!(block.payload.seller_id, party(2));
        assert_eq!(block.payload.buyer_id, party(3));

        let parcel = wf.parcel(&plot("PLT-1111")).unwrap();
        assert_eq!(parcel.owner_id, party(3));
        assert_eq!(parcel.status, ParcelStatus::Active);
    }

    #[test]
    fn test_reject_leaves_chain_untouched() {
        let wf = workflow();
        wf.register_parcel(plot("PLT-1111"), "Gulshan, Dhaka", dec!(1.5), party(2))
            .unwrap();

        let request = wf
            .submit_transfer(&plot("PLT-1111"), party(3), price(50_000))
            .unwrap();
        let decided = wf.reject(&request.id, Some("Funds not verified")).unwrap();

        assert_eq!(decided.status, TransferStatus::Rejected);
        assert_eq!(
            decided.rejection_reason.as_deref(),
            Some("Funds not verified")
        );
        assert_eq!(decided.block_index, None);

        assert_eq!(wf.ledger().height().unwrap(), 0);

        // Parcel is available again, still titled to the seller
        let parcel = wf.parcel(&plot("PLT-1111")).unwrap();
        assert_eq!(parcel.status, ParcelStatus::Active);
        assert_eq!(parcel.owner_id, party(2));
    }

    #[test]
    fn test_double_approve_rejected() {
        let wf = workflow();
        wf.register_parcel(plot("PLT-1111"), "Gulshan, Dhaka", dec!(1.5), party(2))
            .unwrap();

        let request = wf
            .submit_transfer(&plot("PLT-1111"), party(3), price(50_000))
            .unwrap();
        wf.approve(&request.id).unwrap();

        let result = wf.approve(&request.id);
        assert!(matches!(result, Err(TransferError::AlreadyDecided(_))));
        assert_eq!(wf.ledger().height().unwrap(), 1);
    }

    #[test]
    fn test_cannot_approve_rejected_request() {
        let wf = workflow();
        wf.register_parcel(plot("PLT-1111"), "Gulshan, Dhaka", dec!(1.5), party(2))
            .unwrap();

        let request = wf
            .submit_transfer(&plot("PLT-1111"), party(3), price(50_000))
            .unwrap();
        wf.reject(&request.id, None).unwrap();

        let result = wf.approve(&request.id);
        assert!(matches!(result, Err(TransferError::AlreadyDecided(_))));
    }

    #[test]
    fn test_pending_parcel_blocks_second_request() {
        let wf = workflow();
        wf.register_parcel(plot("PLT-1111"), "Gulshan, Dhaka", dec!(1.5), party(2))
            .unwrap();

        wf.submit_transfer(&plot("PLT-1111"), party(3), price(50_000))
            .unwrap();
        let result = wf.submit_transfer(&plot("PLT-1111"), party(4), price(52_000));

        assert!(matches!(result, Err(TransferError::ParcelUnderTransfer(_))));
    }

    #[test]
    fn test_owner_cannot_buy_own_parcel() {
        let wf = workflow();
        wf.register_parcel(plot("PLT-1111"), "Gulshan, Dhaka", dec!(1.5), party(2))
            .unwrap();

        let result = wf.submit_transfer(&plot("PLT-1111"), party(2), price(50_000));
        assert!(matches!(result, Err(TransferError::SelfPurchase { .. })));
    }

    #[test]
    fn test_unknown_parcel_rejected() {
        let wf = workflow();
        let result = wf.submit_transfer(&plot("RAJ-005"), party(3), price(50_000));
        assert!(matches!(
            result,
            Err(TransferError::Store(StoreError::ParcelNotFound(_)))
        ));
    }
}
