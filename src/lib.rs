pub mod blocks;
pub mod error;
pub mod writer;
pub mod container;

pub mod parsing {
    pub mod tsdat_file;
    pub mod raw_group;
    pub mod raw_channel;
}

pub mod api;

pub mod catalog;
pub mod properties;
pub mod units;
pub mod config;
pub mod cancel;
pub mod layout;
pub mod session;
pub mod worker;

pub use cancel::CancellationToken;
pub use catalog::{Catalog, CatalogItem, Representation, Resource, WriteRequest};
pub use config::ExportContext;
pub use error::ExportError;
pub use session::DataWriter;
