use crate::error::ExportError;

/// Fixed 64-byte block at file offset 0. Unlike every other block it has no
/// common header.
#[derive(Debug, Clone)]
pub struct IdentificationBlock {
    pub file_identifier: String,
    pub version_identifier: String,
    pub program_identifier: String,
    pub version_number: u16,
}

impl Default for IdentificationBlock {
    fn default() -> Self {
        IdentificationBlock {
            file_identifier: String::from("TSDAT   "),
            version_identifier: String::from("1.00    "),
            program_identifier: String::from("tsdatexp"),
            version_number: 100,
        }
    }
}

impl IdentificationBlock {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ExportError> {
        let expected_bytes = 64;
        if bytes.len() < expected_bytes {
            return Err(ExportError::TooShortBuffer {
                actual:   bytes.len(),
                expected: expected_bytes,
                file:     file!(),
                line:     line!(),
            });
        }

        let file_identifier = String::from_utf8_lossy(&bytes[0..8]).to_string();
        if file_identifier != "TSDAT   " {
            return Err(ExportError::FileIdentifierError(file_identifier));
        }

        Ok(Self {
            file_identifier,
            version_identifier: String::from_utf8_lossy(&bytes[8..16]).to_string(),
            program_identifier: String::from_utf8_lossy(&bytes[16..24]).to_string(),
            version_number: u16::from_le_bytes([bytes[24], bytes[25]]),
        })
    }

    /// Layout: identifier (8), version text (8), program (8), version number (2), reserved (38).
    pub fn to_bytes(&self) -> Result<Vec<u8>, ExportError> {
        let mut buffer = Vec::with_capacity(64);
        for (label, text) in [
            ("file identifier", &self.file_identifier),
            ("version identifier", &self.version_identifier),
            ("program identifier", &self.program_identifier),
        ] {
            if text.len() != 8 {
                return Err(ExportError::BlockSerializationError(
                    format!("{} must be exactly 8 bytes, found '{}'", label, text)
                ));
            }
            buffer.extend_from_slice(text.as_bytes());
        }
        buffer.extend_from_slice(&self.version_number.to_le_bytes());
        buffer.extend_from_slice(&[0u8; 38]);

        debug_assert_eq!(buffer.len(), 64);
        Ok(buffer)
    }
}
