use byteorder::{ByteOrder, LittleEndian};

use crate::blocks::common::{BlockHeader, BlockParse};
use crate::error::ExportError;

/// HDBLOCK: root of the block graph, written directly after the identification block.
#[derive(Debug, Clone)]
pub struct HeaderBlock {
    pub header: BlockHeader,
    pub first_group_addr: u64,
    pub field_addr: u64,
    pub comment_addr: u64,
    /// Start of the shared time axis in nanoseconds since the Unix epoch,
    /// or [`HeaderBlock::START_TIME_UNSET`].
    pub start_time_ns: i64,
}

impl BlockParse<'_> for HeaderBlock {
    const ID: &'static str = "##HD";
    fn from_bytes(bytes: &[u8]) -> Result<Self, ExportError> {
        let header = Self::parse_header(bytes)?;

        let expected_bytes = 56;
        if bytes.len() < expected_bytes {
            return Err(ExportError::TooShortBuffer {
                actual:   bytes.len(),
                expected: expected_bytes,
                file:     file!(),
                line:     line!(),
            });
        }

        Ok(Self {
            header,
            first_group_addr: LittleEndian::read_u64(&bytes[24..32]),
            field_addr: LittleEndian::read_u64(&bytes[32..40]),
            comment_addr: LittleEndian::read_u64(&bytes[40..48]),
            start_time_ns: LittleEndian::read_i64(&bytes[48..56]),
        })
    }
}

impl Default for HeaderBlock {
    fn default() -> Self {
        HeaderBlock {
            header: BlockHeader {
                id: String::from("##HD"),
                reserved0: 0,
                block_len: 56,
                links_nr: 3,
            },
            first_group_addr: 0,
            field_addr: 0,
            comment_addr: 0,
            start_time_ns: Self::START_TIME_UNSET,
        }
    }
}

impl HeaderBlock {
    /// Marks a file without a start time. Zero is the Unix epoch.
    pub const START_TIME_UNSET: i64 = i64::MIN;

    /// Byte offset of the first-group link inside the block.
    pub const FIRST_GROUP_LINK: u64 = 24;
    /// Byte offset of the field link inside the block.
    pub const FIELD_LINK: u64 = 32;

    /// Serializes the header block.
    ///
    /// # Structure (56 bytes total):
    /// - BlockHeader (24 bytes) with id="##HD"
    /// - first_group_addr, field_addr, comment_addr (3 links, 24 bytes)
    /// - start_time_ns (8 bytes)
    pub fn to_bytes(&self) -> Result<Vec<u8>, ExportError> {
        if self.header.id != "##HD" {
            return Err(ExportError::BlockSerializationError(
                format!("HeaderBlock must have ID '##HD', found '{}'", self.header.id)
            ));
        }

        let mut buffer = Vec::with_capacity(56);
        buffer.extend_from_slice(&self.header.to_bytes()?);
        buffer.extend_from_slice(&self.first_group_addr.to_le_bytes());
        buffer.extend_from_slice(&self.field_addr.to_le_bytes());
        buffer.extend_from_slice(&self.comment_addr.to_le_bytes());
        buffer.extend_from_slice(&self.start_time_ns.to_le_bytes());

        if buffer.len() != 56 {
            return Err(ExportError::BlockSerializationError(
                format!("HeaderBlock must be exactly 56 bytes, got {}", buffer.len())
            ));
        }
        Ok(buffer)
    }
}
