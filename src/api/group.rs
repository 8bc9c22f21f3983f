use crate::api::channel::Channel;
use crate::blocks::common::read_string_block;
use crate::error::ExportError;
use crate::parsing::raw_channel::read_property_block;
use crate::parsing::raw_group::RawGroup;

/// A high‐level Group that exposes metadata and lazily builds `Channel<'a>`s.
pub struct Group<'a> {
    raw_group: &'a RawGroup,
    mmap:      &'a [u8],
}

impl<'a> Group<'a> {
    pub fn new(raw_group: &'a RawGroup, mmap: &'a [u8]) -> Self {
        Group { raw_group, mmap }
    }

    /// Human‐readable name
    pub fn name(&self) -> Result<Option<String>, ExportError> {
        read_string_block(self.mmap, self.raw_group.block.name_addr)
    }

    /// Property entries in stored order; empty when none were attached.
    pub fn properties(&self) -> Result<Vec<(String, String)>, ExportError> {
        read_property_block(self.mmap, self.raw_group.block.properties_addr)
    }

    /// Value of a single property entry.
    pub fn property(&self, key: &str) -> Result<Option<String>, ExportError> {
        Ok(self
            .properties()?
            .into_iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v))
    }

    /// Build all `Channel<'a>` for this group in chain order; none is decoded yet.
    pub fn channels(&self) -> Vec<Channel<'a>> {
        self.raw_group
            .channels
            .iter()
            .map(|raw| Channel::new(raw, self.mmap))
            .collect()
    }
}
