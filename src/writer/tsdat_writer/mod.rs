//! Implementation of the TsdatWriter struct split across several submodules

use std::collections::HashMap;
use std::fs::File;
use std::path::PathBuf;

mod io;
mod structure;
mod data;

/// Writer for TSDAT blocks, ensuring 8-byte alignment and zero padding.
/// Tracks block positions and supports updating links at a later stage.
pub struct TsdatWriter {
    file: File,
    path: PathBuf,
    offset: u64,
    block_positions: HashMap<String, u64>,
    id_counters: HashMap<&'static str, usize>,
    last_group: Option<String>,
    last_component: Option<String>,
    last_channel: HashMap<String, String>,
    group_channel_counts: HashMap<String, u64>,
    field_component_count: u64,
}
