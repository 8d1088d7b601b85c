//! Landchain Registry - parcels and the transfer approval workflow
//!
//! The registry is the transaction state machine sitting upstream of the
//! ledger: parcels are recorded here, transfer requests move through
//! pending → approved/rejected, and approval is the single event that
//! appends a block to the chain.

pub mod parcel;
pub mod store;
pub mod transfer;
pub mod workflow;

pub use parcel::{Parcel, ParcelStatus};
pub use store::{RegistryStore, StoreError};
pub use transfer::{TransferRequest, TransferStatus};
pub use workflow::{TransferError, TransferWorkflow};
