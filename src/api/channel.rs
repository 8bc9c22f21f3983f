use chrono::{DateTime, Utc};

use crate::blocks::common::ElementType;
use crate::container::{AxisScaling, Calibration};
use crate::error::ExportError;
use crate::parsing::raw_channel::RawChannel;

/// High level handle for a single channel within a group.
pub struct Channel<'a> {
    raw_channel: &'a RawChannel,
    mmap:        &'a [u8],
}

impl<'a> Channel<'a> {
    pub fn new(raw_channel: &'a RawChannel, mmap: &'a [u8]) -> Self {
        Channel { raw_channel, mmap }
    }

    /// Retrieve the channel name if present.
    pub fn name(&self) -> Result<Option<String>, ExportError> {
        self.raw_channel.name(self.mmap)
    }

    /// Retrieve the physical unit description.
    pub fn unit(&self) -> Result<Option<String>, ExportError> {
        self.raw_channel.unit(self.mmap)
    }

    pub fn properties(&self) -> Result<Vec<(String, String)>, ExportError> {
        self.raw_channel.properties(self.mmap)
    }

    pub fn element_type(&self) -> ElementType {
        self.raw_channel.block.element_type
    }

    /// Number of samples allocated for this channel.
    pub fn length(&self) -> u64 {
        self.raw_channel.block.length
    }

    pub fn calibration(&self) -> Result<Calibration, ExportError> {
        let block = &self.raw_channel.block;
        Ok(Calibration {
            factor: block.factor,
            offset: block.offset,
            unit: self.unit()?.unwrap_or_default(),
        })
    }

    pub fn axis(&self) -> AxisScaling {
        AxisScaling {
            dx: self.raw_channel.block.dx,
            unit: self.raw_channel.block.axis_unit.clone(),
        }
    }

    pub fn trigger_time(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_nanos(self.raw_channel.block.trigger_time_ns)
    }

    /// Decode all samples of this channel.
    ///
    /// # Returns
    /// A vector with exactly [`Channel::length`] values.
    pub fn values(&self) -> Result<Vec<f64>, ExportError> {
        self.raw_channel.values(self.mmap)
    }
}
