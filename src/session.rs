//! Write-session lifecycle: configure → open → write* → close.

use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::cancel::CancellationToken;
use crate::catalog::{CatalogItem, WriteRequest};
use crate::config::ExportContext;
use crate::container::{ComponentHandle, EditableFile};
use crate::error::ExportError;
use crate::layout::{create_layout, Layout};

struct OpenSession {
    layout: Layout,
    file: EditableFile,
}

enum SessionState {
    Unconfigured,
    Configured,
    Open(OpenSession),
    Closed,
}

impl SessionState {
    fn name(&self) -> &'static str {
        match self {
            SessionState::Unconfigured => "unconfigured",
            SessionState::Configured => "configured",
            SessionState::Open(_) => "open",
            SessionState::Closed => "closed",
        }
    }
}

/// Writes one TSDAT file per session.
///
/// Operations called in the wrong state fail with [`ExportError::InvalidState`].
/// Dropping an open writer releases the file handle.
pub struct DataWriter {
    context: Option<ExportContext>,
    state: SessionState,
}

impl Default for DataWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl DataWriter {
    pub fn new() -> Self {
        DataWriter { context: None, state: SessionState::Unconfigured }
    }

    /// Name of the current lifecycle state.
    pub fn state(&self) -> &'static str {
        self.state.name()
    }

    /// Path of the open file, if any.
    pub fn path(&self) -> Option<&Path> {
        match &self.state {
            SessionState::Open(session) => Some(&session.layout.path),
            _ => None,
        }
    }

    /// Total number of samples per channel in the open file.
    pub fn total_length(&self) -> Option<u64> {
        match &self.state {
            SessionState::Open(session) => Some(session.layout.total_length),
            _ => None,
        }
    }

    /// Sets the session context. Can be repeated until a file is opened.
    pub fn configure(&mut self, context: ExportContext) -> Result<(), ExportError> {
        match self.state {
            SessionState::Unconfigured | SessionState::Configured => {}
            _ => return Err(self.invalid("configure")),
        }
        context.validate()?;
        debug!(target_dir = %context.target_dir.display(), "configured data writer");
        self.context = Some(context);
        self.state = SessionState::Configured;
        Ok(())
    }

    /// Creates the file skeleton for `items` and keeps it open for writing.
    ///
    /// On failure the writer stays configured and no file is left behind.
    pub fn open(
        &mut self,
        file_begin: DateTime<Utc>,
        file_period: Duration,
        sample_period: Duration,
        items: &[CatalogItem],
        cancel: &CancellationToken,
    ) -> Result<(), ExportError> {
        let context = match (&self.state, &self.context) {
            (SessionState::Configured, Some(context)) => context,
            _ => return Err(self.invalid("open")),
        };

        let (layout, file) = create_layout(context, file_begin, file_period, sample_period, items, cancel)?;
        self.state = SessionState::Open(OpenSession { layout, file });
        Ok(())
    }

    /// Writes a batch of sample arrays starting at `file_offset` from the file begin.
    ///
    /// Requests are grouped by catalog. `progress` receives the fraction of
    /// catalog groups completed after each group. Cancellation is checked
    /// before every group; groups written before that remain on disk.
    pub fn write<P>(
        &mut self,
        file_offset: Duration,
        requests: &[WriteRequest],
        mut progress: P,
        cancel: &CancellationToken,
    ) -> Result<(), ExportError>
    where
        P: FnMut(f64),
    {
        let state = self.state.name();
        let result = match &mut self.state {
            SessionState::Open(session) => write_batch(session, file_offset, requests, &mut progress, cancel),
            _ => return Err(ExportError::InvalidState { operation: "write", state }),
        };

        if let Err(ExportError::IOError(e)) = &result {
            warn!(error = %e, "I/O failure while writing, closing session");
            self.state = SessionState::Closed;
        }
        result
    }

    /// Releases the file handle. Further calls fail with `InvalidState`.
    pub fn close(&mut self) -> Result<(), ExportError> {
        match std::mem::replace(&mut self.state, SessionState::Closed) {
            SessionState::Open(session) => {
                let path = session.layout.path;
                session.file.dispose()?;
                info!(path = %path.display(), "closed file");
                Ok(())
            }
            other => {
                self.state = other;
                Err(self.invalid("close"))
            }
        }
    }

    fn invalid(&self, operation: &'static str) -> ExportError {
        ExportError::InvalidState { operation, state: self.state.name() }
    }
}

fn write_batch(
    session: &mut OpenSession,
    file_offset: Duration,
    requests: &[WriteRequest],
    progress: &mut dyn FnMut(f64),
    cancel: &CancellationToken,
) -> Result<(), ExportError> {
    let layout = &session.layout;
    let period_ns = layout.sample_period.as_nanos();
    let offset_ns = file_offset.as_nanos();
    if offset_ns % period_ns != 0 {
        return Err(ExportError::InvalidOffset { offset_ns, period_ns });
    }
    let sample_index = u64::try_from(offset_ns / period_ns)
        .map_err(|_| ExportError::InvalidOffset { offset_ns, period_ns })?;

    // Resolve and bounds-check every request before touching the file.
    let mut groups: Vec<(&str, Vec<(ComponentHandle, &[f64])>)> = Vec::new();
    for request in requests {
        let component = *layout
            .channels
            .get(&request.item)
            .ok_or_else(|| ExportError::UnknownCatalogItem(request.item.to_string()))?;
        let count = request.data.len() as u64;
        match sample_index.checked_add(count) {
            Some(end) if end <= layout.total_length => {}
            _ => return Err(ExportError::SampleOverflow { start: sample_index, count, length: layout.total_length }),
        }
        let catalog_id = request.item.catalog.id.as_str();
        let entry = (component, request.data.as_slice());
        match groups.iter_mut().find(|(id, _)| *id == catalog_id) {
            Some((_, members)) => members.push(entry),
            None => groups.push((catalog_id, vec![entry])),
        }
    }

    let group_count = groups.len();
    debug!(sample_index, requests = requests.len(), groups = group_count, "writing batch");

    session.file.edit(|tx| {
        for (i, (catalog_id, members)) in groups.iter().enumerate() {
            cancel.check()?;
            for (component, data) in members {
                tx.write_samples(*component, sample_index, data)?;
            }
            debug!(catalog = %catalog_id, channels = members.len(), "wrote catalog group");
            progress((i + 1) as f64 / group_count as f64);
        }
        Ok(())
    })
}
