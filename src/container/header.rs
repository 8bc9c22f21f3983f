use std::path::Path;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::blocks::common::ElementType;
use crate::blocks::component_block::ComponentBlock;
use crate::blocks::field_block::FieldKind;
use crate::blocks::header_block::HeaderBlock;
use crate::error::ExportError;
use crate::writer::TsdatWriter;

/// Handle to a group inside a [`Header`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GroupHandle(pub(crate) usize);

/// Handle to a field inside a [`Header`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FieldHandle(pub(crate) usize);

/// Handle to a component. The index is the component's position in the
/// field, which stays valid after the header has been saved and reopened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ComponentHandle(pub(crate) usize);

impl ComponentHandle {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Linear mapping from stored to physical values, plus the physical unit.
#[derive(Debug, Clone, PartialEq)]
pub struct Calibration {
    pub factor: f64,
    pub offset: f64,
    pub unit: String,
}

impl Calibration {
    /// Factor 1, offset 0.
    pub fn unscaled(unit: impl Into<String>) -> Self {
        Calibration { factor: 1.0, offset: 0.0, unit: unit.into() }
    }
}

/// Step and unit of the implicit x axis.
#[derive(Debug, Clone, PartialEq)]
pub struct AxisScaling {
    pub dx: f64,
    pub unit: String,
}

#[derive(Debug, Clone)]
pub struct ComponentSpec {
    pub name: String,
    pub element_type: ElementType,
    pub length: u64,
    pub calibration: Calibration,
    pub axis: AxisScaling,
    pub trigger_time: DateTime<Utc>,
}

#[derive(Debug)]
struct GroupDef {
    name: String,
    properties: Vec<(String, String)>,
}

#[derive(Debug)]
struct ComponentDef {
    group: GroupHandle,
    spec: ComponentSpec,
    properties: Vec<(String, String)>,
}

/// In-memory description of a container. Nothing touches the disk until
/// [`Header::save`].
#[derive(Debug, Default)]
pub struct Header {
    start_time: Option<DateTime<Utc>>,
    groups: Vec<GroupDef>,
    fields: Vec<FieldKind>,
    components: Vec<ComponentDef>,
}

impl Header {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_start_time(&mut self, start_time: DateTime<Utc>) {
        self.start_time = Some(start_time);
    }

    pub fn add_group(&mut self, name: impl Into<String>) -> GroupHandle {
        self.groups.push(GroupDef { name: name.into(), properties: Vec::new() });
        GroupHandle(self.groups.len() - 1)
    }

    pub fn set_group_properties(
        &mut self,
        group: GroupHandle,
        properties: Vec<(String, String)>,
    ) -> Result<(), ExportError> {
        let def = self.groups.get_mut(group.0).ok_or_else(|| {
            ExportError::InvalidArgument(format!("unknown group handle {}", group.0))
        })?;
        def.properties = properties;
        Ok(())
    }

    /// The on-disk format carries a single field per file.
    pub fn create_field(&mut self, kind: FieldKind) -> Result<FieldHandle, ExportError> {
        if !self.fields.is_empty() {
            return Err(ExportError::InvalidArgument("a container holds exactly one field".into()));
        }
        self.fields.push(kind);
        Ok(FieldHandle(0))
    }

    pub fn add_component(
        &mut self,
        field: FieldHandle,
        group: GroupHandle,
        spec: ComponentSpec,
    ) -> Result<ComponentHandle, ExportError> {
        if field.0 >= self.fields.len() {
            return Err(ExportError::InvalidArgument(format!("unknown field handle {}", field.0)));
        }
        if group.0 >= self.groups.len() {
            return Err(ExportError::InvalidArgument(format!("unknown group handle {}", group.0)));
        }
        if spec.element_type.width().is_none() {
            return Err(ExportError::InvalidArgument(
                format!("unsupported element type {:?}", spec.element_type)
            ));
        }
        self.components.push(ComponentDef { group, spec, properties: Vec::new() });
        Ok(ComponentHandle(self.components.len() - 1))
    }

    pub fn set_channel_properties(
        &mut self,
        component: ComponentHandle,
        properties: Vec<(String, String)>,
    ) -> Result<(), ExportError> {
        let def = self.components.get_mut(component.0).ok_or_else(|| {
            ExportError::InvalidArgument(format!("unknown component handle {}", component.0))
        })?;
        def.properties = properties;
        Ok(())
    }

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    /// Writes the container to a new file at `path`.
    ///
    /// Never overwrites: an existing file yields [`ExportError::AlreadyExists`]
    /// and is left untouched. If writing fails halfway, the partial file is removed.
    pub fn save(&self, path: &Path) -> Result<(), ExportError> {
        let writer = TsdatWriter::new(path)?;
        match self.write_blocks(writer) {
            Ok(()) => {
                debug!(path = %path.display(), groups = self.groups.len(), components = self.components.len(), "saved container");
                Ok(())
            }
            Err(e) => {
                if let Err(remove_err) = std::fs::remove_file(path) {
                    warn!(path = %path.display(), error = %remove_err, "could not remove partially written container");
                }
                Err(e)
            }
        }
    }

    fn write_blocks(&self, mut writer: TsdatWriter) -> Result<(), ExportError> {
        let start_time_ns = self.start_time.map(timestamp_ns).transpose()?.unwrap_or(HeaderBlock::START_TIME_UNSET);
        writer.init_file(start_time_ns)?;

        let mut group_ids = Vec::with_capacity(self.groups.len());
        for group in &self.groups {
            group_ids.push(writer.add_group(&group.name, &group.properties)?);
        }

        if let Some(kind) = self.fields.first() {
            writer.add_field(*kind)?;
        }

        for component in &self.components {
            let spec = &component.spec;
            let block = ComponentBlock {
                element_type: spec.element_type,
                length: spec.length,
                factor: spec.calibration.factor,
                offset: spec.calibration.offset,
                dx: spec.axis.dx,
                axis_unit: spec.axis.unit.clone(),
                trigger_time_ns: timestamp_ns(spec.trigger_time)?,
                ..ComponentBlock::default()
            };
            writer.add_component(
                &group_ids[component.group.0],
                &block,
                &spec.name,
                &spec.calibration.unit,
                &component.properties,
            )?;
        }

        writer.finalize()
    }
}

fn timestamp_ns(time: DateTime<Utc>) -> Result<i64, ExportError> {
    time.timestamp_nanos_opt().filter(|ns| *ns != HeaderBlock::START_TIME_UNSET).ok_or_else(|| {
        ExportError::InvalidArgument(format!("timestamp {} is out of range", time))
    })
}
