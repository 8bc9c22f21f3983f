use byteorder::{ByteOrder, LittleEndian};

use crate::blocks::common::{padding_for, BlockHeader, BlockParse};
use crate::error::ExportError;

/// PRBLOCK: ordered list of text key/value pairs attached to a group or channel.
///
/// Layout after the header: `count: u64`, then for every entry
/// `key_len: u32`, `value_len: u32`, key bytes, value bytes. Zero padded to 8.
#[derive(Debug, Clone)]
pub struct PropertyBlock {
    pub header: BlockHeader,
    pub entries: Vec<(String, String)>,
}

impl BlockParse<'_> for PropertyBlock {
    const ID: &'static str = "##PR";
    fn from_bytes(bytes: &[u8]) -> Result<Self, ExportError> {
        let header = Self::parse_header(bytes)?;

        let expected_bytes = header.block_len as usize;
        if bytes.len() < expected_bytes || expected_bytes < 32 {
            return Err(ExportError::TooShortBuffer {
                actual:   bytes.len(),
                expected: expected_bytes.max(32),
                file:     file!(),
                line:     line!(),
            });
        }

        let count = LittleEndian::read_u64(&bytes[24..32]) as usize;
        let mut offset = 32;
        let mut entries = Vec::with_capacity(count);
        for _ in 0..count {
            if offset + 8 > expected_bytes {
                return Err(ExportError::TooShortBuffer {
                    actual:   expected_bytes,
                    expected: offset + 8,
                    file:     file!(),
                    line:     line!(),
                });
            }
            let key_len = LittleEndian::read_u32(&bytes[offset..offset + 4]) as usize;
            let value_len = LittleEndian::read_u32(&bytes[offset + 4..offset + 8]) as usize;
            offset += 8;

            let end = offset + key_len + value_len;
            if end > expected_bytes {
                return Err(ExportError::TooShortBuffer {
                    actual:   expected_bytes,
                    expected: end,
                    file:     file!(),
                    line:     line!(),
                });
            }
            let key = String::from_utf8_lossy(&bytes[offset..offset + key_len]).to_string();
            let value = String::from_utf8_lossy(&bytes[offset + key_len..end]).to_string();
            entries.push((key, value));
            offset = end;
        }

        Ok(Self { header, entries })
    }
}

impl PropertyBlock {
    pub fn new(entries: Vec<(String, String)>) -> Self {
        let payload: usize = entries.iter().map(|(k, v)| 8 + k.len() + v.len()).sum();
        let base_len = 32 + payload;
        let header = BlockHeader {
            id: String::from("##PR"),
            reserved0: 0,
            block_len: (base_len + padding_for(base_len)) as u64,
            links_nr: 0,
        };
        PropertyBlock { header, entries }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, ExportError> {
        if self.header.id != "##PR" {
            return Err(ExportError::BlockSerializationError(
                format!("PropertyBlock must have ID '##PR', found '{}'", self.header.id)
            ));
        }

        let mut buffer = Vec::with_capacity(self.header.block_len as usize);
        buffer.extend_from_slice(&self.header.to_bytes()?);
        buffer.extend_from_slice(&(self.entries.len() as u64).to_le_bytes());
        for (key, value) in &self.entries {
            let key_len = u32::try_from(key.len()).map_err(|_| {
                ExportError::BlockSerializationError(format!("property key '{}' is too long", key))
            })?;
            let value_len = u32::try_from(value.len()).map_err(|_| {
                ExportError::BlockSerializationError(format!("value of property '{}' is too long", key))
            })?;
            buffer.extend_from_slice(&key_len.to_le_bytes());
            buffer.extend_from_slice(&value_len.to_le_bytes());
            buffer.extend_from_slice(key.as_bytes());
            buffer.extend_from_slice(value.as_bytes());
        }
        buffer.resize(buffer.len() + padding_for(buffer.len()), 0);

        if buffer.len() as u64 != self.header.block_len {
            return Err(ExportError::BlockSerializationError(
                format!("PropertyBlock length mismatch: header {} vs actual {}", self.header.block_len, buffer.len())
            ));
        }
        Ok(buffer)
    }
}
