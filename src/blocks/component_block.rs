use byteorder::{ByteOrder, LittleEndian};

use crate::blocks::common::{read_string_block, BlockHeader, BlockParse, ElementType};
use crate::error::ExportError;

#[derive(Debug, Clone)]
pub struct ComponentBlock {
    pub header: BlockHeader,
    pub next_component_addr: u64, // 8 bytes – next component of the same field
    pub next_channel_addr: u64,   // 8 bytes – next channel of the same group
    pub name_addr: u64,           // 8 bytes
    pub unit_addr: u64,           // 8 bytes
    pub properties_addr: u64,     // 8 bytes
    pub data_addr: u64,           // 8 bytes – DTBLOCK holding the samples
    pub element_type: ElementType,
    pub length: u64,
    pub factor: f64,
    pub offset: f64,
    pub dx: f64,
    pub axis_unit: String,
    pub trigger_time_ns: i64,

    pub name: Option<String>,
}

impl BlockParse<'_> for ComponentBlock {
    const ID: &'static str = "##CP";
    /// Creates a ComponentBlock from a 128-byte slice.
    /// This version does NOT automatically resolve the component name.
    fn from_bytes(bytes: &[u8]) -> Result<Self, ExportError> {
        let header = Self::parse_header(bytes)?;

        let expected_bytes = 128;
        if bytes.len() < expected_bytes {
            return Err(ExportError::TooShortBuffer {
                actual:   bytes.len(),
                expected: expected_bytes,
                file:     file!(),
                line:     line!(),
            });
        }

        let unit_bytes = &bytes[112..120];
        let unit_end = unit_bytes.iter().position(|&b| b == 0).unwrap_or(8);

        Ok(Self {
            header,
            next_component_addr: LittleEndian::read_u64(&bytes[24..32]),
            next_channel_addr: LittleEndian::read_u64(&bytes[32..40]),
            name_addr: LittleEndian::read_u64(&bytes[40..48]),
            unit_addr: LittleEndian::read_u64(&bytes[48..56]),
            properties_addr: LittleEndian::read_u64(&bytes[56..64]),
            data_addr: LittleEndian::read_u64(&bytes[64..72]),
            element_type: ElementType::from_u8(bytes[72]),
            length: LittleEndian::read_u64(&bytes[80..88]),
            factor: LittleEndian::read_f64(&bytes[88..96]),
            offset: LittleEndian::read_f64(&bytes[96..104]),
            dx: LittleEndian::read_f64(&bytes[104..112]),
            axis_unit: String::from_utf8_lossy(&unit_bytes[..unit_end]).to_string(),
            trigger_time_ns: LittleEndian::read_i64(&bytes[120..128]),
            name: None,
        })
    }
}

impl Default for ComponentBlock {
    fn default() -> Self {
        ComponentBlock {
            header: BlockHeader {
                id: String::from("##CP"),
                reserved0: 0,
                block_len: 128,
                links_nr: 6,
            },
            next_component_addr: 0,
            next_channel_addr: 0,
            name_addr: 0,
            unit_addr: 0,
            properties_addr: 0,
            data_addr: 0,
            element_type: ElementType::Float64,
            length: 0,
            factor: 1.0,
            offset: 0.0,
            dx: 1.0,
            axis_unit: String::from("s"),
            trigger_time_ns: 0,
            name: None,
        }
    }
}

impl ComponentBlock {
    pub const NEXT_COMPONENT_LINK: u64 = 24;
    pub const NEXT_CHANNEL_LINK: u64 = 32;
    pub const NAME_LINK: u64 = 40;
    pub const UNIT_LINK: u64 = 48;
    pub const PROPERTIES_LINK: u64 = 56;
    pub const DATA_LINK: u64 = 64;

    /// Serializes the ComponentBlock.
    ///
    /// # Structure (128 bytes total):
    /// - BlockHeader (24 bytes) with id="##CP"
    /// - Link section (48 bytes): next component, next channel, name, unit,
    ///   properties, data
    /// - element_type (1 byte) + reserved (7 bytes)
    /// - length (u64)
    /// - calibration factor and offset (2 × f64)
    /// - axis step dx (f64) and axis unit (8 bytes, NUL padded)
    /// - trigger time in ns since the Unix epoch (i64)
    ///
    /// The `name` field is not serialized; it is resolved through `name_addr`.
    pub fn to_bytes(&self) -> Result<Vec<u8>, ExportError> {
        if self.header.id != "##CP" {
            return Err(ExportError::BlockSerializationError(
                format!("ComponentBlock must have ID '##CP', found '{}'", self.header.id)
            ));
        }
        if self.axis_unit.len() > 8 {
            return Err(ExportError::BlockSerializationError(
                format!("axis unit '{}' does not fit into 8 bytes", self.axis_unit)
            ));
        }

        let mut buffer = Vec::with_capacity(128);
        buffer.extend_from_slice(&self.header.to_bytes()?);

        buffer.extend_from_slice(&self.next_component_addr.to_le_bytes());
        buffer.extend_from_slice(&self.next_channel_addr.to_le_bytes());
        buffer.extend_from_slice(&self.name_addr.to_le_bytes());
        buffer.extend_from_slice(&self.unit_addr.to_le_bytes());
        buffer.extend_from_slice(&self.properties_addr.to_le_bytes());
        buffer.extend_from_slice(&self.data_addr.to_le_bytes());

        buffer.push(self.element_type.to_u8());
        buffer.extend_from_slice(&[0u8; 7]);
        buffer.extend_from_slice(&self.length.to_le_bytes());
        buffer.extend_from_slice(&self.factor.to_le_bytes());
        buffer.extend_from_slice(&self.offset.to_le_bytes());
        buffer.extend_from_slice(&self.dx.to_le_bytes());

        let mut unit = [0u8; 8];
        unit[..self.axis_unit.len()].copy_from_slice(self.axis_unit.as_bytes());
        buffer.extend_from_slice(&unit);
        buffer.extend_from_slice(&self.trigger_time_ns.to_le_bytes());

        if buffer.len() != 128 {
            return Err(ExportError::BlockSerializationError(
                format!("ComponentBlock must be exactly 128 bytes, got {}", buffer.len())
            ));
        }
        Ok(buffer)
    }

    /// Size in bytes of the sample payload referenced by `data_addr`.
    pub fn payload_len(&self) -> Result<u64, ExportError> {
        let width = self.element_type.width().ok_or_else(|| {
            ExportError::BlockSerializationError(format!("unsupported element type {:?}", self.element_type))
        })?;
        self.length.checked_mul(width).ok_or_else(|| {
            ExportError::BlockSerializationError(format!("component length {} overflows", self.length))
        })
    }

    /// Resolves the component name from the file data using `name_addr`.
    pub fn resolve_name(&mut self, file_data: &[u8]) -> Result<(), ExportError> {
        if self.name.is_none() {
            self.name = read_string_block(file_data, self.name_addr)?;
        }
        Ok(())
    }
}
