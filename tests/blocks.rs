use tsdat_export::blocks::common::{BlockHeader, BlockParse, ElementType};
use tsdat_export::blocks::component_block::ComponentBlock;
use tsdat_export::blocks::data_block::DataBlock;
use tsdat_export::blocks::field_block::{FieldBlock, FieldKind};
use tsdat_export::blocks::group_block::GroupBlock;
use tsdat_export::blocks::header_block::HeaderBlock;
use tsdat_export::blocks::identification_block::IdentificationBlock;
use tsdat_export::blocks::property_block::PropertyBlock;
use tsdat_export::blocks::text_block::TextBlock;
use tsdat_export::error::ExportError;

fn header(id: &str, len: u64, links: u64) -> BlockHeader {
    BlockHeader {
        id: id.to_string(),
        reserved0: 0,
        block_len: len,
        links_nr: links,
    }
}

#[test]
fn block_header_roundtrip() -> Result<(), ExportError> {
    let h = header("TEST", 64, 2);
    let bytes = h.to_bytes()?;
    let parsed = BlockHeader::from_bytes(&bytes)?;
    assert_eq!(parsed, h);
    Ok(())
}

#[test]
fn block_header_rejects_long_id() {
    let h = header("##TOOLONG", 24, 0);
    assert!(matches!(h.to_bytes(), Err(ExportError::BlockSerializationError(_))));
}

#[test]
fn wrong_block_id_is_reported() -> Result<(), ExportError> {
    let bytes = GroupBlock::default().to_bytes()?;
    match HeaderBlock::from_bytes(&bytes) {
        Err(ExportError::BlockIDError { actual, expected }) => {
            assert_eq!(actual, "##GR");
            assert_eq!(expected, "##HD");
        }
        other => panic!("unexpected {:?}", other),
    }
    Ok(())
}

#[test]
fn text_block_roundtrip() -> Result<(), ExportError> {
    let tb = TextBlock::new("hello");
    let bytes = tb.to_bytes()?;
    assert_eq!(bytes.len() % 8, 0);
    let parsed = TextBlock::from_bytes(&bytes)?;
    assert_eq!(parsed.text, "hello");
    Ok(())
}

#[test]
fn property_block_preserves_order() -> Result<(), ExportError> {
    let entries = vec![
        ("z".to_string(), "last key first".to_string()),
        ("a".to_string(), String::new()),
        ("unit".to_string(), "°C".to_string()),
    ];
    let bytes = PropertyBlock::new(entries.clone()).to_bytes()?;
    assert_eq!(bytes.len() % 8, 0);
    let parsed = PropertyBlock::from_bytes(&bytes)?;
    assert_eq!(parsed.entries, entries);
    Ok(())
}

#[test]
fn truncated_property_block_fails() -> Result<(), ExportError> {
    let bytes = PropertyBlock::new(vec![("key".into(), "value".into())]).to_bytes()?;
    let result = PropertyBlock::from_bytes(&bytes[..30]);
    assert!(matches!(result, Err(ExportError::TooShortBuffer { .. })));
    Ok(())
}

#[test]
fn data_block_decodes_doubles() -> Result<(), ExportError> {
    let values = [1.5f64, -2.0, 1e300];
    let h = DataBlock::header_for(24);
    let mut bytes = h.to_bytes()?;
    for v in values {
        bytes.extend_from_slice(&v.to_le_bytes());
    }
    let block = DataBlock::from_bytes(&bytes)?;
    assert_eq!(block.f64_values(), values);
    Ok(())
}

#[test]
fn identification_block_roundtrip() -> Result<(), ExportError> {
    let ib = IdentificationBlock::default();
    let bytes = ib.to_bytes()?;
    assert_eq!(bytes.len(), 64);
    let parsed = IdentificationBlock::from_bytes(&bytes)?;
    assert_eq!(parsed.version_number, ib.version_number);
    Ok(())
}

#[test]
fn identification_block_rejects_foreign_files() {
    let mut bytes = vec![0u8; 64];
    bytes[..8].copy_from_slice(b"MDF     ");
    assert!(matches!(
        IdentificationBlock::from_bytes(&bytes),
        Err(ExportError::FileIdentifierError(_))
    ));
}

#[test]
fn header_block_roundtrip() -> Result<(), ExportError> {
    let hb = HeaderBlock { start_time_ns: 1_577_836_800_000_000_000, ..HeaderBlock::default() };
    let bytes = hb.to_bytes()?;
    let parsed = HeaderBlock::from_bytes(&bytes)?;
    assert_eq!(parsed.first_group_addr, 0);
    assert_eq!(parsed.start_time_ns, hb.start_time_ns);
    assert_eq!(parsed.header.id, "##HD");
    Ok(())
}

#[test]
fn field_block_roundtrip() -> Result<(), ExportError> {
    let fd = FieldBlock { component_count: 3, ..FieldBlock::new(FieldKind::Equidistant) };
    let parsed = FieldBlock::from_bytes(&fd.to_bytes()?)?;
    assert_eq!(parsed.kind, FieldKind::Equidistant);
    assert_eq!(parsed.component_count, 3);
    Ok(())
}

#[test]
fn component_block_roundtrip() -> Result<(), ExportError> {
    let cp = ComponentBlock {
        element_type: ElementType::Float64,
        length: 2000,
        factor: 1.0,
        offset: 0.0,
        dx: 0.1,
        axis_unit: "s".into(),
        trigger_time_ns: 42,
        ..ComponentBlock::default()
    };
    let bytes = cp.to_bytes()?;
    assert_eq!(bytes.len(), 128);
    let parsed = ComponentBlock::from_bytes(&bytes)?;
    assert_eq!(parsed.length, 2000);
    assert_eq!(parsed.dx, 0.1);
    assert_eq!(parsed.axis_unit, "s");
    assert_eq!(parsed.trigger_time_ns, 42);
    assert_eq!(parsed.payload_len()?, 16_000);
    Ok(())
}

#[test]
fn component_axis_unit_must_fit() {
    let cp = ComponentBlock { axis_unit: "seconds!!".into(), ..ComponentBlock::default() };
    assert!(matches!(cp.to_bytes(), Err(ExportError::BlockSerializationError(_))));
}
