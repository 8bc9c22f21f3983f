use byteorder::{ByteOrder, LittleEndian};

use crate::blocks::common::{BlockHeader, BlockParse};
use crate::error::ExportError;

/// GRBLOCK: a named grouping node holding an ordered chain of channels.
#[derive(Debug, Clone)]
pub struct GroupBlock {
    pub header: BlockHeader,
    pub next_group_addr: u64,
    pub first_channel_addr: u64,
    pub name_addr: u64,
    pub properties_addr: u64,
    pub channel_count: u64,
}

impl BlockParse<'_> for GroupBlock {
    const ID: &'static str = "##GR";
    fn from_bytes(bytes: &[u8]) -> Result<Self, ExportError> {
        let header = Self::parse_header(bytes)?;

        let expected_bytes = 64;
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
            next_group_addr: LittleEndian::read_u64(&bytes[24..32]),
            first_channel_addr: LittleEndian::read_u64(&bytes[32..40]),
            name_addr: LittleEndian::read_u64(&bytes[40..48]),
            properties_addr: LittleEndian::read_u64(&bytes[48..56]),
            channel_count: LittleEndian::read_u64(&bytes[56..64]),
        })
    }
}

impl Default for GroupBlock {
    fn default() -> Self {
        GroupBlock {
            header: BlockHeader {
                id: String::from("##GR"),
                reserved0: 0,
                block_len: 64,
                links_nr: 4,
            },
            next_group_addr: 0,
            first_channel_addr: 0,
            name_addr: 0,
            properties_addr: 0,
            channel_count: 0,
        }
    }
}

impl GroupBlock {
    pub const NEXT_GROUP_LINK: u64 = 24;
    pub const FIRST_CHANNEL_LINK: u64 = 32;
    pub const NAME_LINK: u64 = 40;
    pub const PROPERTIES_LINK: u64 = 48;
    pub const CHANNEL_COUNT: u64 = 56;

    pub fn to_bytes(&self) -> Result<Vec<u8>, ExportError> {
        if self.header.id != "##GR" {
            return Err(ExportError::BlockSerializationError(
                format!("GroupBlock must have ID '##GR', found '{}'", self.header.id)
            ));
        }

        let mut buffer = Vec::with_capacity(64);
        buffer.extend_from_slice(&self.header.to_bytes()?);
        buffer.extend_from_slice(&self.next_group_addr.to_le_bytes());
        buffer.extend_from_slice(&self.first_channel_addr.to_le_bytes());
        buffer.extend_from_slice(&self.name_addr.to_le_bytes());
        buffer.extend_from_slice(&self.properties_addr.to_le_bytes());
        buffer.extend_from_slice(&self.channel_count.to_le_bytes());

        if buffer.len() != 64 {
            return Err(ExportError::BlockSerializationError(
                format!("GroupBlock must be exactly 64 bytes, got {}", buffer.len())
            ));
        }
        Ok(buffer)
    }
}
