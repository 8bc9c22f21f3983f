//! Container capability set used by the export engine.
//!
//! A [`Header`] describes groups, the shared field and its components in
//! memory and is persisted once with [`Header::save`]. Samples are then
//! written in place through [`EditableFile::edit`].

pub mod header;
pub mod editable;

pub use crate::blocks::common::ElementType;
pub use crate::blocks::field_block::FieldKind;
pub use editable::{EditableFile, Transaction};
pub use header::{AxisScaling, Calibration, ComponentHandle, ComponentSpec, FieldHandle, GroupHandle, Header};
