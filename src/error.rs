use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Buffer too small at {file}:{line}: need at least {expected} bytes, got {actual}")]
    TooShortBuffer {
        actual:   usize,
        expected: usize,
        file:     &'static str,
        line:     u32,
    },

    #[error(r#"Invalid file identifier: Expected "TSDAT   ", found {0}"#)]
    FileIdentifierError(String),

    #[error("Invalid block identifier: Expected {expected:?}, got {actual:?}")]
    BlockIDError {
        actual: String,
        expected: String,
    },

    #[error("Invalid file handling")]
    IOError(#[from] std::io::Error),

    #[error("Block linking error: {0}")]
    BlockLinkError(String),

    #[error("Block serialization error: {0}")]
    BlockSerializationError(String),

    #[error("The file {} already exists. Extending an existing file is not supported", path.display())]
    AlreadyExists { path: PathBuf },

    #[error("The requested file size of {requested} bytes exceeds the container limit of {limit} bytes")]
    CapacityExceeded { requested: u64, limit: u64 },

    #[error("Operation '{operation}' is not allowed while the session is {state}")]
    InvalidState {
        operation: &'static str,
        state: &'static str,
    },

    #[error("The operation was cancelled")]
    Cancelled,

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("File offset of {offset_ns} ns is not a multiple of the sample period of {period_ns} ns")]
    InvalidOffset { offset_ns: u128, period_ns: u128 },

    #[error("Catalog item {0} is not part of the open session")]
    UnknownCatalogItem(String),

    #[error("Writing {count} samples at index {start} exceeds the channel length of {length}")]
    SampleOverflow { start: u64, count: u64, length: u64 },

    #[error("Invalid configuration")]
    ConfigError(#[from] serde_json::Error),
}
