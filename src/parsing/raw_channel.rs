use crate::blocks::common::{read_string_block, BlockParse, ElementType};
use crate::blocks::component_block::ComponentBlock;
use crate::blocks::data_block::DataBlock;
use crate::blocks::property_block::PropertyBlock;
use crate::error::ExportError;

/// A component together with the file address it was parsed from.
#[derive(Debug, Clone)]
pub struct RawChannel {
    pub address: u64,
    pub block: ComponentBlock,
}

impl RawChannel {
    /// Absolute file position of the first sample byte.
    pub fn payload_offset(&self) -> u64 {
        self.block.data_addr + 24
    }

    /// The component's data block, borrowed from the file bytes.
    pub fn data_block<'a>(&self, mmap: &'a [u8]) -> Result<DataBlock<'a>, ExportError> {
        let offset = self.block.data_addr as usize;
        if self.block.data_addr == 0 || offset >= mmap.len() {
            return Err(ExportError::BlockLinkError(
                format!("component at {:#x} has no data block", self.address)
            ));
        }
        DataBlock::from_bytes(&mmap[offset..])
    }

    /// Decode all stored samples. Only double precision payloads are supported.
    pub fn values(&self, mmap: &[u8]) -> Result<Vec<f64>, ExportError> {
        if self.block.element_type != ElementType::Float64 {
            return Err(ExportError::BlockSerializationError(
                format!("cannot decode element type {:?}", self.block.element_type)
            ));
        }
        let data = self.data_block(mmap)?;
        let mut values = data.f64_values();
        values.truncate(self.block.length as usize);
        Ok(values)
    }

    pub fn name(&self, mmap: &[u8]) -> Result<Option<String>, ExportError> {
        read_string_block(mmap, self.block.name_addr)
    }

    pub fn unit(&self, mmap: &[u8]) -> Result<Option<String>, ExportError> {
        read_string_block(mmap, self.block.unit_addr)
    }

    pub fn properties(&self, mmap: &[u8]) -> Result<Vec<(String, String)>, ExportError> {
        read_property_block(mmap, self.block.properties_addr)
    }
}

/// Reads a property block at `address`. Address 0 yields no entries.
pub fn read_property_block(mmap: &[u8], address: u64) -> Result<Vec<(String, String)>, ExportError> {
    if address == 0 {
        return Ok(Vec::new());
    }
    let offset = address as usize;
    if offset >= mmap.len() {
        return Err(ExportError::TooShortBuffer {
            actual:   mmap.len(),
            expected: offset + 32,
            file:     file!(),
            line:     line!(),
        });
    }
    Ok(PropertyBlock::from_bytes(&mmap[offset..])?.entries)
}
