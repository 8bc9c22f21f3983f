use crate::blocks::common::{padding_for, BlockHeader, BlockParse};
use crate::error::ExportError;

/// TXBLOCK: NUL-terminated UTF-8 text, zero padded to 8 bytes.
#[derive(Debug, Clone)]
pub struct TextBlock {
    pub header: BlockHeader,
    pub text: String,
}

impl BlockParse<'_> for TextBlock {
    const ID: &'static str = "##TX";
    fn from_bytes(bytes: &[u8]) -> Result<Self, ExportError> {
        let header = Self::parse_header(bytes)?;

        let expected_bytes = header.block_len as usize;
        if bytes.len() < expected_bytes {
            return Err(ExportError::TooShortBuffer {
                actual:   bytes.len(),
                expected: expected_bytes,
                file:     file!(),
                line:     line!(),
            });
        }

        let data = &bytes[24..expected_bytes];
        let end = data.iter().position(|&b| b == 0).unwrap_or(data.len());
        let text = String::from_utf8_lossy(&data[..end]).to_string();

        Ok(Self { header, text })
    }
}

impl TextBlock {
    /// Create a text block whose length already accounts for terminator and padding.
    pub fn new(text: &str) -> Self {
        let base_len = 24 + text.len() + 1;
        let block_len = (base_len + padding_for(base_len)) as u64;
        let header = BlockHeader {
            id: String::from("##TX"),
            reserved0: 0,
            block_len,
            links_nr: 0,
        };
        TextBlock { header, text: text.to_string() }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, ExportError> {
        if self.header.id != "##TX" {
            return Err(ExportError::BlockSerializationError(
                format!("TextBlock must have ID '##TX', found '{}'", self.header.id)
            ));
        }

        let mut buffer = Vec::with_capacity(self.header.block_len as usize);
        buffer.extend_from_slice(&self.header.to_bytes()?);
        buffer.extend_from_slice(self.text.as_bytes());
        buffer.push(0);
        buffer.resize(buffer.len() + padding_for(buffer.len()), 0);

        if buffer.len() as u64 != self.header.block_len {
            return Err(ExportError::BlockSerializationError(
                format!("TextBlock length mismatch: header {} vs actual {}", self.header.block_len, buffer.len())
            ));
        }
        Ok(buffer)
    }
}
