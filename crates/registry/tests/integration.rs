//! Integration tests for the registry + ledger flow
//!
//! These verify the complete lifecycle: parcels registered, transfers
//! submitted and decided, and every approval landing on the chain in
//! order, against real database files.

use landchain_core::{ParcelId, PartyId, Price};
use landchain_ledger::{ChainFilter, ChainReport, Ledger, GENESIS_HASH};
use landchain_registry::{RegistryStore, TransferStatus, TransferWorkflow};
use rust_decimal_macros::dec;
use std::sync::Arc;
use tempfile::TempDir;

fn plot(p: &str) -> ParcelId {
    ParcelId::new(p).unwrap()
}

fn party(id: i64) -> PartyId {
    PartyId::new(id).unwrap()
}

fn price(p: i64) -> Price {
    Price::new(rust_decimal::Decimal::new(p, 0)).unwrap()
}

#[test]
fn test_full_transfer_lifecycle() {
    let temp = TempDir::new().unwrap();
    let ledger = Arc::new(Ledger::open(temp.path().join("ledger.db")).unwrap());
    let store = RegistryStore::new(temp.path().join("registry.db")).unwrap();
    let wf = TransferWorkflow::new(store, Arc::clone(&ledger));

    // Two parcels, two owners
    wf.register_parcel(plot("DHAKA-001"), "Dhanmondi, Dhaka", dec!(2.5), party(2))
        .unwrap();
    wf.register_parcel(plot("CTG-002"), "Agrabad, Chittagong", dec!(1.8), party(5))
        .unwrap();

    // Registration alone puts nothing on the chain
    assert_eq!(ledger.height().unwrap(), 0);

    // First sale: 2 -> 3
    let first = wf
        .submit_transfer(&plot("DHAKA-001"), party(3), price(50_000))
        .unwrap();
    let (_, first_block) = wf.approve(&first.id).unwrap();
    assert_eq!(first_block.index, 0);
    assert_eq!(first_block.previous_hash, GENESIS_HASH);

    // Resale by the new owner: 3 -> 4
    let resale = wf
        .submit_transfer(&plot("DHAKA-001"), party(4), price(55_000))
        .unwrap();
    let (_, resale_block) = wf.approve(&resale.id).unwrap();
    assert_eq!(resale_block.index, 1);
    assert_eq!(resale_block.previous_hash, first_block.hash);
    assert_eq!(resale_block.payload.seller_id, party(3));

    // A rejected sale of the other parcel never reaches the chain
    let rejected = wf
        .submit_transfer(&plot("CTG-002"), party(3), price(62_000))
        .unwrap();
    wf.reject(&rejected.id, Some("Documents incomplete")).unwrap();

    assert_eq!(ledger.height().unwrap(), 2);
    assert_eq!(
        ledger.verify_chain().unwrap(),
        ChainReport::Intact { length: 2 }
    );

    // Chain filtered by parcel shows its full provenance in order
    let history: Vec<_> = ledger
        .get_chain(ChainFilter::for_parcel(plot("DHAKA-001")))
        .collect::<Result<Vec<_>, _>>()
        .unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].payload.transaction_id, first.id);
    assert_eq!(history[1].payload.transaction_id, resale.id);

    // Party 3 appears once as buyer, once as seller
    let party3: Vec<_> = ledger
        .get_chain(ChainFilter::for_party(party(3)))
        .collect::<Result<Vec<_>, _>>()
        .unwrap();
    assert_eq!(party3.len(), 2);
}

#[test]
fn test_request_listing_reflects_decisions() {
    let temp = TempDir::new().unwrap();
    let ledger = Arc::new(Ledger::open(temp.path().join("ledger.db")).unwrap());
    let store = RegistryStore::new(temp.path().join("registry.db")).unwrap();
    let wf = TransferWorkflow::new(store, ledger);

    wf.register_parcel(plot("SYL-003"), "Zindabazar, Sylhet", dec!(3.2), party(6))
        .unwrap();
    wf.register_parcel(plot("KHU-006"), "Sonadanga, Khulna", dec!(2.8), party(7))
        .unwrap();

    let a = wf
        .submit_transfer(&plot("SYL-003"), party(3), price(70_000))
        .unwrap();
    let b = wf
        .submit_transfer(&plot("KHU-006"), party(4), price(45_000))
        .unwrap();

    assert_eq!(wf.list_pending().unwrap().len(), 2);

    wf.approve(&a.id).unwrap();
    wf.reject(&b.id, None).unwrap();

    assert!(wf.list_pending().unwrap().is_empty());

    let all = wf.list_all().unwrap();
    assert_eq!(all.len(), 2);
    assert!(all.iter().any(|r| r.status == TransferStatus::Approved));
    assert!(all.iter().any(|r| r.status == TransferStatus::Rejected));

    // The approved request records where its block landed
    let approved = wf.get_request(&a.id).unwrap();
    assert_eq!(approved.block_index, Some(0));
}

#[test]
fn test_workflow_survives_reopen() {
    let temp = TempDir::new().unwrap();
    let ledger_path = temp.path().join("ledger.db");
    let registry_path = temp.path().join("registry.db");

    let request_id = {
        let ledger = Arc::new(Ledger::open(&ledger_path).unwrap());
        let wf = TransferWorkflow::new(RegistryStore::new(&registry_path).unwrap(), ledger);
        wf.register_parcel(plot("RAJ-005"), "Shaheb Bazar, Rajshahi", dec!(4.0), party(2))
            .unwrap();
        wf.submit_transfer(&plot("RAJ-005"), party(3), price(85_000))
            .unwrap()
            .id
    };

    // A fresh process sees the pending request and can decide it
    let ledger = Arc::new(Ledger::open(&ledger_path).unwrap());
    let wf = TransferWorkflow::new(RegistryStore::new(&registry_path).unwrap(), ledger);

    let (decided, block) = wf.approve(&request_id).unwrap();
    assert_eq!(decided.status, TransferStatus::Approved);
    assert_eq!(block.index, 0);
    assert_eq!(wf.parcel(&plot("RAJ-005")).unwrap().owner_id, party(3));
}
