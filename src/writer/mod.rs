//! TSDAT block writer for tsdat-export
//!
//! This module provides the low-level API for writing TSDAT blocks to disk,
//! guaranteeing little-endian encoding, 8-byte alignment, and zero-padding.

pub mod tsdat_writer;
pub use tsdat_writer::TsdatWriter;
