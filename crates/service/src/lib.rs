//! Service layer for the product catalog.
//! - `catalog` owns the product model, its validation rules and the
//!   file-backed `ProductStore`.
//! - `storage` holds the JSON file helpers the store persists through.
//! - Errors are reported through `errors::ServiceError`.

pub mod errors;
pub mod runtime;
pub mod storage;
pub mod catalog;
