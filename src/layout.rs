//! Builds the static container skeleton for a session.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::cancel::CancellationToken;
use crate::catalog::CatalogItem;
use crate::config::ExportContext;
use crate::container::{
    AxisScaling, Calibration, ComponentHandle, ComponentSpec, EditableFile, ElementType, FieldKind, Header,
};
use crate::error::ExportError;
use crate::properties::serialize_properties;
use crate::units::{file_name, to_iso_string, to_unit_string};

/// Largest file the container format can address, in bytes.
pub const MAX_FILE_BYTES: u64 = 2_000_000_000;

/// Samples are always stored as double precision.
pub const ELEMENT_WIDTH: u64 = 8;

pub const METADATA_GROUP: &str = "Metadata";

/// Fails with [`ExportError::CapacityExceeded`] if `total_length` samples of
/// `element_width` bytes exceed [`MAX_FILE_BYTES`].
pub fn check_capacity(total_length: u64, element_width: u64) -> Result<(), ExportError> {
    match total_length.checked_mul(element_width) {
        Some(requested) if requested <= MAX_FILE_BYTES => Ok(()),
        requested => Err(ExportError::CapacityExceeded {
            requested: requested.unwrap_or(u64::MAX),
            limit: MAX_FILE_BYTES,
        }),
    }
}

/// Number of whole samples in `file_period`. Remainders are dropped.
pub fn total_length(file_period: Duration, sample_period: Duration) -> Result<u64, ExportError> {
    if sample_period.is_zero() {
        return Err(ExportError::InvalidArgument("sample period must be greater than zero".into()));
    }
    let length = file_period.as_nanos() / sample_period.as_nanos();
    u64::try_from(length).map_err(|_| ExportError::CapacityExceeded { requested: u64::MAX, limit: MAX_FILE_BYTES })
}

/// Catalog items grouped by catalog, in first-seen order.
pub fn group_by_catalog(items: &[CatalogItem]) -> Vec<(&str, Vec<&CatalogItem>)> {
    let mut groups: Vec<(&str, Vec<&CatalogItem>)> = Vec::new();
    for item in items {
        match groups.iter_mut().find(|(id, _)| *id == item.catalog.id) {
            Some((_, members)) => members.push(item),
            None => groups.push((item.catalog.id.as_str(), vec![item])),
        }
    }
    groups
}

/// Everything the incremental writer needs to know about the file.
#[derive(Debug)]
pub struct Layout {
    pub path: PathBuf,
    pub file_begin: DateTime<Utc>,
    pub sample_period: Duration,
    pub total_length: u64,
    pub channels: HashMap<CatalogItem, ComponentHandle>,
}

/// Builds the in-memory header for `items`. No file is touched.
///
/// Returns the header together with the item → component mapping.
pub fn build_header(
    context: &ExportContext,
    file_begin: DateTime<Utc>,
    total_length: u64,
    sample_period: Duration,
    items: &[CatalogItem],
    cancel: &CancellationToken,
) -> Result<(Header, HashMap<CatalogItem, ComponentHandle>), ExportError> {
    let mut unique = HashSet::with_capacity(items.len());
    for item in items {
        if item.catalog.id == METADATA_GROUP {
            return Err(ExportError::InvalidArgument(format!("catalog id '{}' is reserved", METADATA_GROUP)));
        }
        if !unique.insert(item) {
            return Err(ExportError::InvalidArgument(format!("catalog item {} is listed twice", item)));
        }
    }

    let mut header = Header::new();
    header.set_start_time(file_begin);

    let metadata = header.add_group(METADATA_GROUP);
    header.set_group_properties(
        metadata,
        vec![
            ("system_name".to_string(), context.system_name.clone()),
            ("date_time".to_string(), to_iso_string(file_begin)),
            ("sample_period".to_string(), to_unit_string(sample_period, false)),
        ],
    )?;

    let groups = group_by_catalog(items);
    check_capacity(total_length, ELEMENT_WIDTH)?;

    let field = header.create_field(FieldKind::Equidistant)?;
    let dx = sample_period.as_secs_f64();
    let mut channels = HashMap::with_capacity(items.len());

    for (catalog_id, members) in groups {
        cancel.check()?;

        let group = header.add_group(catalog_id);
        let catalog_properties = serialize_properties(members[0].catalog.properties.as_ref(), context.property_mode)?;
        header.set_group_properties(group, catalog_properties)?;

        for item in members {
            let spec = ComponentSpec {
                name: item.channel_name(),
                element_type: ElementType::Float64,
                length: total_length,
                calibration: Calibration::unscaled(item.resource.unit().unwrap_or_default()),
                axis: AxisScaling { dx, unit: String::from("s") },
                trigger_time: file_begin,
            };
            let component = header.add_component(field, group, spec)?;
            let resource_properties = serialize_properties(item.resource.properties.as_ref(), context.property_mode)?;
            header.set_channel_properties(component, resource_properties)?;
            channels.insert(item.clone(), component);
        }
    }

    Ok((header, channels))
}

/// Creates the file skeleton on disk and reopens it for editing.
///
/// Fails with [`ExportError::AlreadyExists`] if the destination exists and
/// with [`ExportError::CapacityExceeded`] before anything is written. If the
/// saved file cannot be reopened it is removed again.
pub fn create_layout(
    context: &ExportContext,
    file_begin: DateTime<Utc>,
    file_period: Duration,
    sample_period: Duration,
    items: &[CatalogItem],
    cancel: &CancellationToken,
) -> Result<(Layout, EditableFile), ExportError> {
    let total_length = total_length(file_period, sample_period)?;
    let path = context.target_dir.join(file_name(file_begin, sample_period, &context.extension));

    if path.exists() {
        return Err(ExportError::AlreadyExists { path });
    }

    let (header, channels) = build_header(context, file_begin, total_length, sample_period, items, cancel)?;
    debug!(path = %path.display(), total_length, channels = channels.len(), "built container header");

    header.save(&path)?;

    let editable = match EditableFile::open(&path) {
        Ok(editable) => editable,
        Err(e) => {
            if let Err(remove_err) = std::fs::remove_file(&path) {
                warn!(path = %path.display(), error = %remove_err, "could not remove unreadable container");
            }
            return Err(e);
        }
    };

    let layout = Layout {
        path,
        file_begin,
        sample_period,
        total_length,
        channels,
    };
    info!(path = %layout.path.display(), catalogs = header.group_count() - 1, total_length, "created file skeleton");

    Ok((layout, editable))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Catalog, Representation, Resource};
    use std::sync::Arc;

    fn item(catalog: &str, resource: &str) -> CatalogItem {
        CatalogItem::new(
            Arc::new(Catalog::new(catalog)),
            Arc::new(Resource::new(resource)),
            Arc::new(Representation::new("1_s", Duration::from_secs(1))),
        )
    }

    #[test]
    fn capacity_limit_is_inclusive() {
        assert!(check_capacity(250_000_000, 8).is_ok());
        assert!(matches!(
            check_capacity(250_000_001, 8),
            Err(ExportError::CapacityExceeded { requested: 2_000_000_008, limit: MAX_FILE_BYTES })
        ));
        assert!(matches!(check_capacity(u64::MAX, 8), Err(ExportError::CapacityExceeded { .. })));
    }

    #[test]
    fn total_length_drops_remainder() {
        assert_eq!(total_length(Duration::from_millis(2500), Duration::from_secs(1)).unwrap(), 2);
        assert!(matches!(
            total_length(Duration::from_secs(1), Duration::ZERO),
            Err(ExportError::InvalidArgument(_))
        ));
    }

    #[test]
    fn groups_keep_first_seen_order() {
        let items = vec![item("B", "x"), item("A", "y"), item("B", "z")];
        let groups = group_by_catalog(&items);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].0, "B");
        assert_eq!(groups[0].1.iter().map(|i| i.resource.id.as_str()).collect::<Vec<_>>(), ["x", "z"]);
        assert_eq!(groups[1].0, "A");
    }

    #[test]
    fn duplicate_items_are_rejected() {
        let ctx = ExportContext::default();
        let items = vec![item("A", "x"), item("A", "x")];
        let result = build_header(&ctx, Utc::now(), 10, Duration::from_secs(1), &items, &CancellationToken::new());
        assert!(matches!(result, Err(ExportError::InvalidArgument(_))));
    }

    #[test]
    fn metadata_group_name_is_reserved() {
        let ctx = ExportContext::default();
        let items = vec![item("A", "x"), item(METADATA_GROUP, "y")];
        let result = build_header(&ctx, Utc::now(), 10, Duration::from_secs(1), &items, &CancellationToken::new());
        assert!(matches!(result, Err(ExportError::InvalidArgument(_))));
    }

    #[test]
    fn cancelled_layout_stops_before_groups() {
        let ctx = ExportContext::default();
        let token = CancellationToken::new();
        token.cancel();
        let result = build_header(&ctx, Utc::now(), 10, Duration::from_secs(1), &[item("A", "x")], &token);
        assert!(matches!(result, Err(ExportError::Cancelled)));
    }
}
