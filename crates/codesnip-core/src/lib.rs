//! codesnip-core
//!
//! Pure domain types, form mapping, list filtering and collection naming.
//! No storage or auth dependency; this is the shared vocabulary of codesnip.

pub mod collections;
pub mod error;
pub mod filter;
pub mod models;
pub mod tags;
