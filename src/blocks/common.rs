use byteorder::{ByteOrder, LittleEndian};
use serde::{Deserialize, Serialize};

use crate::blocks::text_block::TextBlock;
use crate::error::ExportError;

/// The 24-byte header that starts every block except the identification block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeader {
    pub id: String,
    pub reserved0: u32,
    pub block_len: u64,
    pub links_nr: u64,
}

impl BlockHeader {
    /// Parse a header from the first 24 bytes of `bytes`.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ExportError> {
        let expected_bytes = 24;
        if bytes.len() < expected_bytes {
            return Err(ExportError::TooShortBuffer {
                actual:   bytes.len(),
                expected: expected_bytes,
                file:     file!(),
                line:     line!(),
            });
        }

        Ok(Self {
            id: String::from_utf8_lossy(&bytes[0..4]).to_string(),
            reserved0: LittleEndian::read_u32(&bytes[4..8]),
            block_len: LittleEndian::read_u64(&bytes[8..16]),
            links_nr: LittleEndian::read_u64(&bytes[16..24]),
        })
    }

    /// Serialize the header into exactly 24 bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>, ExportError> {
        let id = self.id.as_bytes();
        if id.len() != 4 {
            return Err(ExportError::BlockSerializationError(
                format!("Block ID must be exactly 4 bytes, found '{}'", self.id)
            ));
        }

        let mut buffer = Vec::with_capacity(24);
        buffer.extend_from_slice(id);
        buffer.extend_from_slice(&self.reserved0.to_le_bytes());
        buffer.extend_from_slice(&self.block_len.to_le_bytes());
        buffer.extend_from_slice(&self.links_nr.to_le_bytes());
        Ok(buffer)
    }
}

/// Common parsing entry point for all block types.
pub trait BlockParse<'a>: Sized {
    const ID: &'static str;

    fn from_bytes(bytes: &'a [u8]) -> Result<Self, ExportError>;

    /// Parse the common header and check that the block ID matches [`Self::ID`].
    fn parse_header(bytes: &[u8]) -> Result<BlockHeader, ExportError> {
        let header = BlockHeader::from_bytes(bytes)?;
        if header.id != Self::ID {
            return Err(ExportError::BlockIDError {
                actual: header.id,
                expected: Self::ID.to_string(),
            });
        }
        Ok(header)
    }
}

/// Numeric storage type of a component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ElementType {
    UInt8,
    Int16,
    Int32,
    Float32,
    Float64,
    Unknown(u8),
}

impl ElementType {
    pub fn from_u8(value: u8) -> Self {
        match value {
            1 => ElementType::UInt8,
            2 => ElementType::Int16,
            3 => ElementType::Int32,
            4 => ElementType::Float32,
            5 => ElementType::Float64,
            other => ElementType::Unknown(other),
        }
    }

    pub fn to_u8(&self) -> u8 {
        match self {
            ElementType::UInt8 => 1,
            ElementType::Int16 => 2,
            ElementType::Int32 => 3,
            ElementType::Float32 => 4,
            ElementType::Float64 => 5,
            ElementType::Unknown(other) => *other,
        }
    }

    /// Width of one sample in bytes, `None` for unknown types.
    pub fn width(&self) -> Option<u64> {
        match self {
            ElementType::UInt8 => Some(1),
            ElementType::Int16 => Some(2),
            ElementType::Int32 | ElementType::Float32 => Some(4),
            ElementType::Float64 => Some(8),
            ElementType::Unknown(_) => None,
        }
    }
}

/// Number of zero bytes needed to pad `len` to the next multiple of 8.
pub fn padding_for(len: usize) -> usize {
    (8 - (len % 8)) % 8
}

/// Reads a text block at `address`. Address 0 means "no text".
pub fn read_string_block(mmap: &[u8], address: u64) -> Result<Option<String>, ExportError> {
    if address == 0 {
        return Ok(None);
    }
    let offset = address as usize;
    if offset >= mmap.len() {
        return Err(ExportError::TooShortBuffer {
            actual:   mmap.len(),
            expected: offset + 24,
            file:     file!(),
            line:     line!(),
        });
    }
    let block = TextBlock::from_bytes(&mmap[offset..])?;
    Ok(Some(block.text))
}
