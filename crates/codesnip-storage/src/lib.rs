//! codesnip-storage
//!
//! The document store contract and its backends: S3 (one JSON object per
//! document) and an in-process map.

pub mod error;
pub mod memory;
pub mod objects;
pub mod s3;
pub mod store;
