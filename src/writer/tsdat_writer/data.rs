// Allocation of DT blocks for component payloads
use super::*;
use std::io::Write;

use crate::blocks::data_block::DataBlock;
use crate::error::ExportError;

const ZERO_CHUNK_SIZE: usize = 1024 * 1024;

impl TsdatWriter {
    /// Writes a DT block header followed by `payload_len` zero bytes.
    /// Returns the position of the block.
    pub fn write_zeroed_data_block(&mut self, payload_len: u64) -> Result<u64, ExportError> {
        let header_bytes = DataBlock::header_for(payload_len).to_bytes()?;
        let dt_id = self.next_id("dt");
        let dt_pos = self.write_block_with_id(&header_bytes, &dt_id)?;

        let chunk = vec![0u8; ZERO_CHUNK_SIZE.min(payload_len as usize)];
        let mut remaining = payload_len;
        while remaining > 0 {
            let n = remaining.min(chunk.len() as u64) as usize;
            self.file.write_all(&chunk[..n])?;
            remaining -= n as u64;
        }
        self.offset += payload_len;

        Ok(dt_pos)
    }
}
