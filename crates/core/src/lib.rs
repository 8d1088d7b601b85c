//! Landchain Core - Domain types
//!
//! This crate contains the fundamental types used across Landchain:
//! - `Price`: Strictly-positive decimal wrapper for sale prices
//! - `ParcelId`: Type-safe plot number for land parcels
//! - `PartyId`: Numeric identity of a buyer or seller

pub mod identity;
pub mod price;

pub use identity::{IdentityError, ParcelId, PartyId};
pub use price::{Price, PriceError};
