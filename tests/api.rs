use chrono::{TimeZone, Utc};

use tsdat_export::api::Container;
use tsdat_export::container::{
    AxisScaling, Calibration, ComponentSpec, EditableFile, ElementType, FieldKind, Header,
};
use tsdat_export::error::ExportError;

fn spec(name: &str, length: u64) -> ComponentSpec {
    ComponentSpec {
        name: name.to_string(),
        element_type: ElementType::Float64,
        length,
        calibration: Calibration::unscaled("V"),
        axis: AxisScaling { dx: 0.5, unit: "s".into() },
        trigger_time: Utc.with_ymd_and_hms(2021, 6, 1, 12, 0, 0).unwrap(),
    }
}

fn two_group_header() -> Result<Header, ExportError> {
    let mut header = Header::new();
    header.set_start_time(Utc.with_ymd_and_hms(2021, 6, 1, 12, 0, 0).unwrap());
    let a = header.add_group("A");
    header.set_group_properties(a, vec![("owner".into(), "lab".into())])?;
    let b = header.add_group("B");
    let field = header.create_field(FieldKind::Equidistant)?;
    let c0 = header.add_component(field, a, spec("a0", 4))?;
    header.add_component(field, b, spec("b0", 4))?;
    header.add_component(field, a, spec("a1", 4))?;
    header.set_channel_properties(c0, vec![("k".into(), "v".into())])?;
    Ok(header)
}

#[test]
fn header_save_and_read_back() -> Result<(), ExportError> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("structure.dat");

    two_group_header()?.save(&path)?;

    let container = Container::from_file(&path)?;
    assert_eq!(container.component_count(), 3);
    assert_eq!(container.field_kind(), Some(FieldKind::Equidistant));
    assert_eq!(
        container.start_time(),
        Some(Utc.with_ymd_and_hms(2021, 6, 1, 12, 0, 0).unwrap())
    );

    let groups = container.groups();
    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0].name()?.as_deref(), Some("A"));
    assert_eq!(groups[0].property("owner")?.as_deref(), Some("lab"));
    assert!(groups[1].properties()?.is_empty());

    let a_channels = groups[0].channels();
    assert_eq!(a_channels.len(), 2);
    assert_eq!(a_channels[0].name()?.as_deref(), Some("a0"));
    assert_eq!(a_channels[1].name()?.as_deref(), Some("a1"));
    assert_eq!(a_channels[0].properties()?, vec![("k".to_string(), "v".to_string())]);
    assert_eq!(a_channels[0].calibration()?, Calibration::unscaled("V"));
    assert_eq!(a_channels[0].axis().dx, 0.5);
    assert_eq!(a_channels[0].values()?, vec![0.0; 4]);

    let b_channels = groups[1].channels();
    assert_eq!(b_channels.len(), 1);
    assert_eq!(b_channels[0].name()?.as_deref(), Some("b0"));
    Ok(())
}

#[test]
fn epoch_start_time_is_kept() -> Result<(), ExportError> {
    let dir = tempfile::tempdir()?;
    let epoch_path = dir.path().join("epoch.dat");
    let mut header = Header::new();
    header.set_start_time(Utc.timestamp_nanos(0));
    header.add_group("G");
    header.save(&epoch_path)?;
    assert_eq!(Container::from_file(&epoch_path)?.start_time(), Some(Utc.timestamp_nanos(0)));

    let unset_path = dir.path().join("unset.dat");
    let mut header = Header::new();
    header.add_group("G");
    header.save(&unset_path)?;
    assert_eq!(Container::from_file(&unset_path)?.start_time(), None);
    Ok(())
}

#[test]
fn save_never_overwrites() -> Result<(), ExportError> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("taken.dat");
    std::fs::write(&path, b"keep me")?;

    let result = two_group_header()?.save(&path);
    assert!(matches!(result, Err(ExportError::AlreadyExists { .. })));
    assert_eq!(std::fs::read(&path)?, b"keep me");
    Ok(())
}

#[test]
fn editable_writes_land_in_component_order() -> Result<(), ExportError> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("edit.dat");
    let mut header = Header::new();
    let group = header.add_group("G");
    let field = header.create_field(FieldKind::Equidistant)?;
    let first = header.add_component(field, group, spec("first", 4))?;
    let second = header.add_component(field, group, spec("second", 4))?;
    header.save(&path)?;

    let mut file = EditableFile::open(&path)?;
    assert_eq!(file.component_count(), 2);
    file.edit(|tx| {
        tx.write_samples(second, 2, &[7.0, 8.0])?;
        tx.write_samples(first, 0, &[1.0, 2.0])
    })?;
    file.dispose()?;

    let container = Container::from_file(&path)?;
    let channels = container.groups()[0].channels();
    assert_eq!(channels[0].values()?, vec![1.0, 2.0, 0.0, 0.0]);
    assert_eq!(channels[1].values()?, vec![0.0, 0.0, 7.0, 8.0]);
    Ok(())
}

#[test]
fn writes_past_the_end_are_rejected() -> Result<(), ExportError> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("overflow.dat");
    let mut header = Header::new();
    let group = header.add_group("G");
    let field = header.create_field(FieldKind::Equidistant)?;
    let first = header.add_component(field, group, spec("first", 3))?;
    header.add_component(field, group, spec("second", 3))?;
    header.save(&path)?;

    let mut file = EditableFile::open(&path)?;
    let result = file.edit(|tx| tx.write_samples(first, 2, &[1.0, 2.0]));
    match result {
        Err(ExportError::SampleOverflow { start, count, length }) => {
            assert_eq!((start, count, length), (2, 2, 3));
        }
        other => panic!("unexpected {:?}", other),
    }
    drop(file);

    let container = Container::from_file(&path)?;
    for channel in container.groups()[0].channels() {
        assert_eq!(channel.values()?, vec![0.0; 3]);
    }
    Ok(())
}

#[test]
fn header_allows_a_single_field() {
    let mut header = Header::new();
    assert!(header.create_field(FieldKind::Equidistant).is_ok());
    assert!(matches!(
        header.create_field(FieldKind::Equidistant),
        Err(ExportError::InvalidArgument(_))
    ));
}

#[test]
fn garbage_file_is_not_a_container() -> Result<(), ExportError> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("garbage.dat");
    std::fs::write(&path, vec![0xAB; 256])?;
    assert!(matches!(
        Container::from_file(&path),
        Err(ExportError::FileIdentifierError(_))
    ));
    Ok(())
}
