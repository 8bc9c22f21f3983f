//! Runs a [`DataWriter`] on its own thread so blocking file I/O never runs on
//! the caller's control path.

use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::cancel::CancellationToken;
use crate::catalog::{CatalogItem, WriteRequest};
use crate::config::ExportContext;
use crate::error::ExportError;
use crate::session::DataWriter;

type Reply = Sender<Result<(), ExportError>>;
type ProgressSink = Box<dyn FnMut(f64) + Send>;

enum Command {
    Configure {
        context: ExportContext,
        reply: Reply,
    },
    Open {
        file_begin: DateTime<Utc>,
        file_period: Duration,
        sample_period: Duration,
        items: Vec<CatalogItem>,
        cancel: CancellationToken,
        reply: Reply,
    },
    Write {
        file_offset: Duration,
        requests: Vec<WriteRequest>,
        progress: ProgressSink,
        cancel: CancellationToken,
        reply: Reply,
    },
    Close {
        reply: Reply,
    },
}

/// Result of a command submitted to a [`WriterWorker`].
pub struct Pending {
    operation: &'static str,
    receiver: Receiver<Result<(), ExportError>>,
    cancel: CancellationToken,
}

impl Pending {
    /// Ask the running operation to stop at its next group boundary.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Blocks until the worker has finished the command.
    pub fn wait(self) -> Result<(), ExportError> {
        self.receiver.recv().unwrap_or(Err(ExportError::InvalidState {
            operation: self.operation,
            state: "stopped",
        }))
    }
}

/// Owns a [`DataWriter`] on a dedicated thread and executes commands in
/// submission order.
pub struct WriterWorker {
    sender: Option<Sender<Command>>,
    handle: Option<JoinHandle<()>>,
}

impl WriterWorker {
    pub fn spawn() -> Result<Self, ExportError> {
        let (sender, receiver) = mpsc::channel::<Command>();
        let handle = thread::Builder::new()
            .name("tsdat-writer".into())
            .spawn(move || run(receiver))?;
        Ok(WriterWorker { sender: Some(sender), handle: Some(handle) })
    }

    pub fn configure(&self, context: ExportContext) -> Pending {
        self.submit("configure", CancellationToken::new(), |reply| Command::Configure { context, reply })
    }

    pub fn open(
        &self,
        file_begin: DateTime<Utc>,
        file_period: Duration,
        sample_period: Duration,
        items: Vec<CatalogItem>,
    ) -> Pending {
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        self.submit("open", cancel, move |reply| Command::Open {
            file_begin,
            file_period,
            sample_period,
            items,
            cancel: token,
            reply,
        })
    }

    pub fn write<P>(&self, file_offset: Duration, requests: Vec<WriteRequest>, progress: P) -> Pending
    where
        P: FnMut(f64) + Send + 'static,
    {
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        self.submit("write", cancel, move |reply| Command::Write {
            file_offset,
            requests,
            progress: Box::new(progress),
            cancel: token,
            reply,
        })
    }

    pub fn close(&self) -> Pending {
        self.submit("close", CancellationToken::new(), |reply| Command::Close { reply })
    }

    fn submit<F>(&self, operation: &'static str, cancel: CancellationToken, build: F) -> Pending
    where
        F: FnOnce(Reply) -> Command,
    {
        let (reply, receiver) = mpsc::channel();
        if let Some(sender) = &self.sender {
            // A send error drops the reply sender, which `Pending::wait` reports.
            let _ = sender.send(build(reply));
        }
        Pending { operation, receiver, cancel }
    }
}

impl Drop for WriterWorker {
    fn drop(&mut self) {
        self.sender.take();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("writer thread panicked");
            }
        }
    }
}

fn run(receiver: Receiver<Command>) {
    debug!("writer thread started");
    let mut writer = DataWriter::new();

    for command in receiver {
        let (reply, result) = match command {
            Command::Configure { context, reply } => (reply, writer.configure(context)),
            Command::Open { file_begin, file_period, sample_period, items, cancel, reply } => {
                let result = writer.open(file_begin, file_period, sample_period, &items, &cancel);
                (reply, result)
            }
            Command::Write { file_offset, requests, mut progress, cancel, reply } => {
                let result = writer.write(file_offset, &requests, &mut progress, &cancel);
                (reply, result)
            }
            Command::Close { reply } => (reply, writer.close()),
        };
        let _ = reply.send(result);
    }

    debug!(state = writer.state(), "writer thread stopped");
}
