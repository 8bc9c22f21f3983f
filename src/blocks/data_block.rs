use byteorder::{ByteOrder, LittleEndian};

use crate::blocks::common::BlockHeader;
use crate::blocks::common::BlockParse;
use crate::error::ExportError;

/// DTBLOCK: the contiguous sample payload of a single component.
#[derive(Debug)]
pub struct DataBlock<'a> {
    pub header: BlockHeader,
    pub data: &'a [u8],
}

impl<'a> BlockParse<'a> for DataBlock<'a> {
    const ID: &'static str = "##DT";
    fn from_bytes(bytes: &'a [u8]) -> Result<Self, ExportError> {
        let header = Self::parse_header(bytes)?;

        // A DT block has no links; everything after the header is payload.
        let block_end = usize::try_from(header.block_len).unwrap_or(usize::MAX).max(24);
        match bytes.get(24..block_end) {
            Some(data) => Ok(Self { header, data }),
            None => Err(ExportError::TooShortBuffer {
                actual: bytes.len(),
                expected: block_end,
                file: file!(),
                line: line!(),
            }),
        }
    }
}

impl<'a> DataBlock<'a> {
    /// Header for a data block carrying `payload_len` bytes.
    pub fn header_for(payload_len: u64) -> BlockHeader {
        BlockHeader {
            id: String::from("##DT"),
            reserved0: 0,
            block_len: 24 + payload_len,
            links_nr: 0,
        }
    }

    /// Decode the payload as little-endian doubles. Trailing bytes that do not
    /// form a full sample are ignored.
    pub fn f64_values(&self) -> Vec<f64> {
        let count = self.data.len() / 8;
        let mut out = vec![0.0; count];
        LittleEndian::read_f64_into(&self.data[..count * 8], &mut out);
        out
    }
}
