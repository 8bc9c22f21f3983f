// Low level file and block handling utilities for TsdatWriter
use super::*;
use std::fs::OpenOptions;
use std::io::{ErrorKind, Seek, SeekFrom, Write};
use std::path::Path;

use byteorder::{LittleEndian, WriteBytesExt};

use crate::error::ExportError;

impl TsdatWriter {
    /// Creates a new TsdatWriter for the given path.
    /// Fails with [`ExportError::AlreadyExists`] instead of overwriting a file.
    pub fn new(path: &Path) -> Result<Self, ExportError> {
        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .map_err(|e| match e.kind() {
                ErrorKind::AlreadyExists => ExportError::AlreadyExists { path: path.to_path_buf() },
                _ => ExportError::IOError(e),
            })?;
        Ok(TsdatWriter {
            file,
            path: path.to_path_buf(),
            offset: 0,
            block_positions: HashMap::new(),
            id_counters: HashMap::new(),
            last_group: None,
            last_component: None,
            last_channel: HashMap::new(),
            group_channel_counts: HashMap::new(),
            field_component_count: 0,
        })
    }

    /// Path of the file being written.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes a block to the file, aligning to 8 bytes and zero-padding as needed.
    /// Returns the starting offset of the block in the file.
    pub fn write_block(&mut self, block_bytes: &[u8]) -> Result<u64, ExportError> {
        self.align()?;
        self.file.write_all(block_bytes)?;
        let block_start = self.offset;
        self.offset += block_bytes.len() as u64;
        Ok(block_start)
    }

    /// Writes a block to the file and tracks its position with the given ID.
    pub fn write_block_with_id(&mut self, block_bytes: &[u8], block_id: &str) -> Result<u64, ExportError> {
        let block_start = self.write_block(block_bytes)?;
        self.block_positions.insert(block_id.to_string(), block_start);
        Ok(block_start)
    }

    /// Retrieves the file position of a previously written block.
    pub fn get_block_position(&self, block_id: &str) -> Option<u64> {
        self.block_positions.get(block_id).copied()
    }

    /// Updates a link (u64 address) at a specific offset in the file.
    pub fn update_link(&mut self, offset: u64, address: u64) -> Result<(), ExportError> {
        self.update_u64(offset, address)
    }

    /// Updates a link using block IDs instead of raw offsets.
    pub fn update_block_link(&mut self, source_id: &str, link_offset: u64, target_id: &str) -> Result<(), ExportError> {
        let source_pos = self.get_block_position(source_id)
            .ok_or_else(|| ExportError::BlockLinkError(format!("Source block '{}' not found", source_id)))?;
        let target_pos = self.get_block_position(target_id)
            .ok_or_else(|| ExportError::BlockLinkError(format!("Target block '{}' not found", target_id)))?;
        self.update_link(source_pos + link_offset, target_pos)
    }

    fn update_u64(&mut self, offset: u64, value: u64) -> Result<(), ExportError> {
        let current_pos = self.offset;
        self.file.seek(SeekFrom::Start(offset))?;
        self.file.write_u64::<LittleEndian>(value)?;
        self.file.seek(SeekFrom::Start(current_pos))?;
        Ok(())
    }

    pub(super) fn update_block_u64(&mut self, block_id: &str, field_offset: u64, value: u64) -> Result<(), ExportError> {
        let block_pos = self.get_block_position(block_id)
            .ok_or_else(|| ExportError::BlockLinkError(format!("Block '{}' not found", block_id)))?;
        self.update_u64(block_pos + field_offset, value)
    }

    pub(super) fn next_id(&mut self, prefix: &'static str) -> String {
        let counter = self.id_counters.entry(prefix).or_insert(0);
        let id = format!("{}_{}", prefix, counter);
        *counter += 1;
        id
    }

    fn align(&mut self) -> Result<(), ExportError> {
        let align = (8 - (self.offset % 8)) % 8;
        if align != 0 {
            let padding = vec![0u8; align as usize];
            self.file.write_all(&padding)?;
            self.offset += align;
        }
        Ok(())
    }

    /// Returns the current file offset (for block address calculation).
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Finalizes the file (flushes all data to disk).
    pub fn finalize(mut self) -> Result<(), ExportError> {
        self.file.flush()?;
        self.file.sync_all()?;
        Ok(())
    }
}
