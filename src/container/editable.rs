use std::fs::{File, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use byteorder::{ByteOrder, LittleEndian};
use memmap2::Mmap;
use tracing::debug;

use crate::blocks::common::ElementType;
use crate::container::header::ComponentHandle;
use crate::error::ExportError;
use crate::parsing::tsdat_file::parse_structure;

/// Where a component's samples live in the file.
#[derive(Debug, Clone, Copy)]
struct ComponentSlot {
    payload_offset: u64,
    length: u64,
}

/// A saved container reopened for in-place sample writes.
///
/// The structure is read once when opening; afterwards only sample payloads
/// are modified. The handle is released on [`EditableFile::dispose`] or drop.
#[derive(Debug)]
pub struct EditableFile {
    file: File,
    path: PathBuf,
    slots: Vec<ComponentSlot>,
}

impl EditableFile {
    pub fn open(path: &Path) -> Result<Self, ExportError> {
        let file = OpenOptions::new().read(true).write(true).open(path)?;
        let slots = {
            let mmap = unsafe { Mmap::map(&file)? };
            let structure = parse_structure(&mmap)?;
            structure
                .components
                .iter()
                .map(|c| {
                    if c.block.element_type != ElementType::Float64 {
                        return Err(ExportError::BlockSerializationError(format!(
                            "component at {:#x} is not stored as double precision",
                            c.address
                        )));
                    }
                    Ok(ComponentSlot { payload_offset: c.payload_offset(), length: c.block.length })
                })
                .collect::<Result<Vec<_>, ExportError>>()?
        };

        debug!(path = %path.display(), components = slots.len(), "opened container for editing");
        Ok(EditableFile { file, path: path.to_path_buf(), slots })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn component_count(&self) -> usize {
        self.slots.len()
    }

    /// Runs `f` against a single edit transaction and flushes afterwards.
    ///
    /// Writes made before `f` returns an error stay on disk.
    pub fn edit<T, F>(&mut self, f: F) -> Result<T, ExportError>
    where
        F: FnOnce(&mut Transaction<'_>) -> Result<T, ExportError>,
    {
        let mut transaction = Transaction { file: &mut self.file, slots: &self.slots, samples_written: 0 };
        let result = f(&mut transaction);
        let samples_written = transaction.samples_written;
        self.file.flush()?;
        debug!(path = %self.path.display(), samples_written, "edit transaction finished");
        result
    }

    /// Flushes and releases the file handle.
    pub fn dispose(mut self) -> Result<(), ExportError> {
        self.file.flush()?;
        self.file.sync_all()?;
        Ok(())
    }
}

/// Scope in which samples can be written. Obtained from [`EditableFile::edit`].
pub struct Transaction<'a> {
    file: &'a mut File,
    slots: &'a [ComponentSlot],
    samples_written: u64,
}

impl Transaction<'_> {
    /// Writes `data` into `component` starting at sample `start`.
    ///
    /// Fails with [`ExportError::SampleOverflow`] instead of spilling into the
    /// neighbouring block.
    pub fn write_samples(
        &mut self,
        component: ComponentHandle,
        start: u64,
        data: &[f64],
    ) -> Result<(), ExportError> {
        let slot = self.slots.get(component.index()).copied().ok_or_else(|| {
            ExportError::InvalidArgument(format!("unknown component handle {}", component.index()))
        })?;

        let count = data.len() as u64;
        match start.checked_add(count) {
            Some(end) if end <= slot.length => {}
            _ => return Err(ExportError::SampleOverflow { start, count, length: slot.length }),
        }
        if data.is_empty() {
            return Ok(());
        }

        let mut buffer = vec![0u8; data.len() * 8];
        LittleEndian::write_f64_into(data, &mut buffer);

        self.file.seek(SeekFrom::Start(slot.payload_offset + start * 8))?;
        self.file.write_all(&buffer)?;
        self.samples_written += count;
        Ok(())
    }
}
