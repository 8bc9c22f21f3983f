use std::fs::File;
use std::path::Path;

use memmap2::Mmap;

use crate::blocks::{
    common::BlockParse,
    component_block::ComponentBlock,
    field_block::FieldBlock,
    group_block::GroupBlock,
    header_block::HeaderBlock,
    identification_block::IdentificationBlock,
};
use crate::error::ExportError;
use crate::parsing::raw_channel::RawChannel;
use crate::parsing::raw_group::RawGroup;

/// Parsed block graph of a TSDAT file, independent of where the bytes live.
#[derive(Debug)]
pub struct TsdatStructure {
    pub identification: IdentificationBlock,
    pub header: HeaderBlock,
    pub field: Option<FieldBlock>,
    pub groups: Vec<RawGroup>,
    /// All components in field order, i.e. in creation order.
    pub components: Vec<RawChannel>,
}

#[derive(Debug)]
pub struct TsdatFile {
    pub structure: TsdatStructure,
    pub mmap: Mmap, // Keep the mmap in the TsdatFile to guarantee lifetime for our slices.
}

impl TsdatFile {
    /// Parse a TSDAT file from a given file path.
    ///
    /// # Arguments
    /// * `path` - Path to the `.dat` file on disk.
    ///
    /// # Returns
    /// A [`TsdatFile`] containing all parsed blocks or an [`ExportError`] if the
    /// file could not be read or decoded.
    pub fn parse_from_file(path: &Path) -> Result<Self, ExportError> {
        let file = File::open(path)?;
        let mmap = unsafe { Mmap::map(&file)? };
        let structure = parse_structure(&mmap)?;
        Ok(Self { structure, mmap })
    }
}

fn block_at(bytes: &[u8], address: u64) -> Result<&[u8], ExportError> {
    let offset = address as usize;
    if offset >= bytes.len() {
        return Err(ExportError::TooShortBuffer {
            actual:   bytes.len(),
            expected: offset + 24,
            file:     file!(),
            line:     line!(),
        });
    }
    Ok(&bytes[offset..])
}

/// Walks a link chain, bailing out when it revisits more blocks than the
/// buffer could possibly hold.
fn guard_chain(visited: usize, bytes: &[u8]) -> Result<(), ExportError> {
    if visited > bytes.len() / 24 {
        return Err(ExportError::BlockLinkError("block chain contains a cycle".into()));
    }
    Ok(())
}

/// Parse the identification block, header, field chain and group chains.
pub fn parse_structure(bytes: &[u8]) -> Result<TsdatStructure, ExportError> {
    let identification = IdentificationBlock::from_bytes(bytes)?;
    let header = HeaderBlock::from_bytes(block_at(bytes, 64)?)?;

    let mut field = None;
    let mut components = Vec::new();
    if header.field_addr != 0 {
        let field_block = FieldBlock::from_bytes(block_at(bytes, header.field_addr)?)?;
        let mut addr = field_block.first_component_addr;
        while addr != 0 {
            guard_chain(components.len(), bytes)?;
            let mut block = ComponentBlock::from_bytes(block_at(bytes, addr)?)?;
            block.resolve_name(bytes)?;
            let next = block.next_component_addr;
            components.push(RawChannel { address: addr, block });
            addr = next;
        }
        if components.len() as u64 != field_block.component_count {
            return Err(ExportError::BlockLinkError(format!(
                "field declares {} components but {} are linked",
                field_block.component_count,
                components.len()
            )));
        }
        field = Some(field_block);
    }

    let mut groups = Vec::new();
    let mut gr_addr = header.first_group_addr;
    while gr_addr != 0 {
        guard_chain(groups.len(), bytes)?;
        let block = GroupBlock::from_bytes(block_at(bytes, gr_addr)?)?;

        let mut channels = Vec::new();
        let mut cp_addr = block.first_channel_addr;
        while cp_addr != 0 {
            guard_chain(channels.len(), bytes)?;
            let channel = match components.iter().find(|c| c.address == cp_addr) {
                Some(c) => c.clone(),
                None => {
                    return Err(ExportError::BlockLinkError(
                        format!("channel at {:#x} is not part of the field", cp_addr)
                    ));
                }
            };
            cp_addr = channel.block.next_channel_addr;
            channels.push(channel);
        }

        let next = block.next_group_addr;
        groups.push(RawGroup { address: gr_addr, block, channels });
        gr_addr = next;
    }

    Ok(TsdatStructure { identification, header, field, groups, components })
}
