use std::path::Path;

use chrono::{DateTime, Utc};

use crate::api::group::Group;
use crate::blocks::field_block::FieldKind;
use crate::blocks::header_block::HeaderBlock;
use crate::error::ExportError;
use crate::parsing::tsdat_file::TsdatFile;

#[derive(Debug)]
/// High level, read-only view of a TSDAT file.
///
/// The struct stores the memory mapped file internally and lazily exposes
/// [`Group`] wrappers for easy inspection.
pub struct Container {
    raw: TsdatFile,
}

impl Container {
    /// Parse a TSDAT file from disk.
    pub fn from_file(path: &Path) -> Result<Self, ExportError> {
        let raw = TsdatFile::parse_from_file(path)?;
        Ok(Container { raw })
    }

    /// All groups in file order, including the metadata group.
    pub fn groups(&self) -> Vec<Group<'_>> {
        self.raw
            .structure
            .groups
            .iter()
            .map(|g| Group::new(g, &self.raw.mmap))
            .collect()
    }

    /// Look up a group by its name.
    pub fn group(&self, name: &str) -> Result<Option<Group<'_>>, ExportError> {
        for group in self.groups() {
            if group.name()?.as_deref() == Some(name) {
                return Ok(Some(group));
            }
        }
        Ok(None)
    }

    /// Number of components in the shared field.
    pub fn component_count(&self) -> usize {
        self.raw.structure.components.len()
    }

    pub fn field_kind(&self) -> Option<FieldKind> {
        self.raw.structure.field.as_ref().map(|f| f.kind)
    }

    /// Start of the time axis, if one was recorded.
    pub fn start_time(&self) -> Option<DateTime<Utc>> {
        match self.raw.structure.header.start_time_ns {
            HeaderBlock::START_TIME_UNSET => None,
            ns => Some(DateTime::from_timestamp_nanos(ns)),
        }
    }
}
