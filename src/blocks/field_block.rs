use byteorder::{ByteOrder, LittleEndian};

use crate::blocks::common::{BlockHeader, BlockParse};
use crate::error::ExportError;

/// How the components of a field relate to the time axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Synchronized series sharing one implicit, equally spaced time axis.
    Equidistant,
    Unknown(u8),
}

impl FieldKind {
    pub fn from_u8(value: u8) -> Self {
        match value {
            1 => FieldKind::Equidistant,
            other => FieldKind::Unknown(other),
        }
    }

    pub fn to_u8(&self) -> u8 {
        match self {
            FieldKind::Equidistant => 1,
            FieldKind::Unknown(other) => *other,
        }
    }
}

/// FDBLOCK: binds all components into one field.
#[derive(Debug, Clone)]
pub struct FieldBlock {
    pub header: BlockHeader,
    pub first_component_addr: u64,
    pub kind: FieldKind,
    pub component_count: u64,
}

impl BlockParse<'_> for FieldBlock {
    const ID: &'static str = "##FD";
    fn from_bytes(bytes: &[u8]) -> Result<Self, ExportError> {
        let header = Self::parse_header(bytes)?;

        let expected_bytes = 48;
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
            first_component_addr: LittleEndian::read_u64(&bytes[24..32]),
            kind: FieldKind::from_u8(bytes[32]),
            component_count: LittleEndian::read_u64(&bytes[40..48]),
        })
    }
}

impl FieldBlock {
    pub const FIRST_COMPONENT_LINK: u64 = 24;
    pub const COMPONENT_COUNT: u64 = 40;

    pub fn new(kind: FieldKind) -> Self {
        FieldBlock {
            header: BlockHeader {
                id: String::from("##FD"),
                reserved0: 0,
                block_len: 48,
                links_nr: 1,
            },
            first_component_addr: 0,
            kind,
            component_count: 0,
        }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, ExportError> {
        if self.header.id != "##FD" {
            return Err(ExportError::BlockSerializationError(
                format!("FieldBlock must have ID '##FD', found '{}'", self.header.id)
            ));
        }

        let mut buffer = Vec::with_capacity(48);
        buffer.extend_from_slice(&self.header.to_bytes()?);
        buffer.extend_from_slice(&self.first_component_addr.to_le_bytes());
        buffer.push(self.kind.to_u8());
        buffer.extend_from_slice(&[0u8; 7]);
        buffer.extend_from_slice(&self.component_count.to_le_bytes());

        debug_assert_eq!(buffer.len(), 48);
        Ok(buffer)
    }
}
