//! Storage helpers for the service layer
//!
//! File-level JSON read/write used by the product store. Writes go through a
//! sibling temp file and a rename so the backing file is never half-written.

pub mod json_file;
