// Creation of the static block graph: identification, header, groups, field, components
use super::*;

use crate::blocks::common::BlockParse;
use crate::blocks::component_block::ComponentBlock;
use crate::blocks::field_block::{FieldBlock, FieldKind};
use crate::blocks::group_block::GroupBlock;
use crate::blocks::header_block::HeaderBlock;
use crate::blocks::identification_block::IdentificationBlock;
use crate::blocks::property_block::PropertyBlock;
use crate::blocks::text_block::TextBlock;
use crate::error::ExportError;

impl TsdatWriter {
    /// Writes the identification and header blocks.
    ///
    /// Both are tracked as "id_block" and "hd_block".
    ///
    /// # Returns
    /// A tuple with the positions of (id_block, hd_block)
    pub fn init_file(&mut self, start_time_ns: i64) -> Result<(u64, u64), ExportError> {
        let id_bytes = IdentificationBlock::default().to_bytes()?;
        let id_pos = self.write_block_with_id(&id_bytes, "id_block")?;

        let hd_block = HeaderBlock { start_time_ns, ..HeaderBlock::default() };
        let hd_pos = self.write_block_with_id(&hd_block.to_bytes()?, "hd_block")?;

        Ok((id_pos, hd_pos))
    }

    /// Appends a group to the header's group chain.
    ///
    /// # Arguments
    /// * `name` - Display name stored in a text block
    /// * `properties` - Key/value pairs; an empty slice writes no property block
    ///
    /// # Returns
    /// The ID assigned to the new group block
    pub fn add_group(&mut self, name: &str, properties: &[(String, String)]) -> Result<String, ExportError> {
        let gr_id = self.next_id("gr");
        let gr_pos = self.write_block_with_id(&GroupBlock::default().to_bytes()?, &gr_id)?;

        let name_pos = self.write_block(&TextBlock::new(name).to_bytes()?)?;
        self.update_link(gr_pos + GroupBlock::NAME_LINK, name_pos)?;

        if !properties.is_empty() {
            let pr_pos = self.write_block(&PropertyBlock::new(properties.to_vec()).to_bytes()?)?;
            self.update_link(gr_pos + GroupBlock::PROPERTIES_LINK, pr_pos)?;
        }

        match self.last_group.take() {
            None => self.update_block_link("hd_block", HeaderBlock::FIRST_GROUP_LINK, &gr_id)?,
            Some(prev) => self.update_block_link(&prev, GroupBlock::NEXT_GROUP_LINK, &gr_id)?,
        }
        self.last_group = Some(gr_id.clone());
        self.group_channel_counts.insert(gr_id.clone(), 0);

        Ok(gr_id)
    }

    /// Writes the field block and links it from the header. A file carries one field.
    pub fn add_field(&mut self, kind: FieldKind) -> Result<String, ExportError> {
        if self.get_block_position("fd_block").is_some() {
            return Err(ExportError::BlockSerializationError("field block already written".into()));
        }
        self.write_block_with_id(&FieldBlock::new(kind).to_bytes()?, "fd_block")?;
        self.update_block_link("hd_block", HeaderBlock::FIELD_LINK, "fd_block")?;
        Ok(String::from("fd_block"))
    }

    /// Adds a component to the field and, as a channel, to the given group.
    ///
    /// The component's payload is allocated immediately as a zero-filled data
    /// block of `block.length` samples.
    ///
    /// # Arguments
    /// * `group_id` - ID of the owning group
    /// * `block` - Component template; its link fields are overwritten
    /// * `name` - Channel display name
    /// * `unit` - Physical unit; an empty string writes no unit block
    /// * `properties` - Key/value pairs; an empty slice writes no property block
    ///
    /// # Returns
    /// The ID assigned to the new component block
    pub fn add_component(
        &mut self,
        group_id: &str,
        block: &ComponentBlock,
        name: &str,
        unit: &str,
        properties: &[(String, String)],
    ) -> Result<String, ExportError> {
        if self.get_block_position("fd_block").is_none() {
            return Err(ExportError::BlockLinkError("components require a field block".into()));
        }
        if !self.group_channel_counts.contains_key(group_id) {
            return Err(ExportError::BlockLinkError(format!("Group block '{}' not found", group_id)));
        }

        let cp_id = self.next_id("cp");
        let template = ComponentBlock {
            next_component_addr: 0,
            next_channel_addr: 0,
            name_addr: 0,
            unit_addr: 0,
            properties_addr: 0,
            data_addr: 0,
            name: None,
            ..block.clone()
        };
        let payload_len = template.payload_len()?;
        let cp_pos = self.write_block_with_id(&template.to_bytes()?, &cp_id)?;

        let name_pos = self.write_block(&TextBlock::new(name).to_bytes()?)?;
        self.update_link(cp_pos + ComponentBlock::NAME_LINK, name_pos)?;

        if !unit.is_empty() {
            let unit_pos = self.write_block(&TextBlock::new(unit).to_bytes()?)?;
            self.update_link(cp_pos + ComponentBlock::UNIT_LINK, unit_pos)?;
        }

        if !properties.is_empty() {
            let pr_pos = self.write_block(&PropertyBlock::new(properties.to_vec()).to_bytes()?)?;
            self.update_link(cp_pos + ComponentBlock::PROPERTIES_LINK, pr_pos)?;
        }

        let dt_pos = self.write_zeroed_data_block(payload_len)?;
        self.update_link(cp_pos + ComponentBlock::DATA_LINK, dt_pos)?;

        // field chain
        match self.last_component.take() {
            None => self.update_block_link("fd_block", FieldBlock::FIRST_COMPONENT_LINK, &cp_id)?,
            Some(prev) => self.update_block_link(&prev, ComponentBlock::NEXT_COMPONENT_LINK, &cp_id)?,
        }
        self.last_component = Some(cp_id.clone());
        self.field_component_count += 1;
        self.update_block_u64("fd_block", FieldBlock::COMPONENT_COUNT, self.field_component_count)?;

        // group chain
        match self.last_channel.insert(group_id.to_string(), cp_id.clone()) {
            None => self.update_block_link(group_id, GroupBlock::FIRST_CHANNEL_LINK, &cp_id)?,
            Some(prev) => self.update_block_link(&prev, ComponentBlock::NEXT_CHANNEL_LINK, &cp_id)?,
        }
        let count = self.group_channel_counts.entry(group_id.to_string()).or_insert(0);
        *count += 1;
        let count = *count;
        self.update_block_u64(group_id, GroupBlock::CHANNEL_COUNT, count)?;

        Ok(cp_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blocks::common::ElementType;

    #[test]
    fn component_without_field_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = TsdatWriter::new(&dir.path().join("nofield.dat")).unwrap();
        writer.init_file(0).unwrap();
        let gr = writer.add_group("g", &[]).unwrap();
        let block = ComponentBlock { element_type: ElementType::Float64, length: 4, ..ComponentBlock::default() };
        let result = writer.add_component(&gr, &block, "c", "", &[]);
        assert!(matches!(result, Err(ExportError::BlockLinkError(_))));
    }

    #[test]
    fn group_chain_links_from_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chain.dat");
        let mut writer = TsdatWriter::new(&path).unwrap();
        writer.init_file(0).unwrap();
        let first = writer.add_group("a", &[]).unwrap();
        let second = writer.add_group("b", &[]).unwrap();
        let first_pos = writer.get_block_position(&first).unwrap();
        let second_pos = writer.get_block_position(&second).unwrap();
        writer.finalize().unwrap();

        let bytes = std::fs::read(&path).unwrap();
        let hd = HeaderBlock::from_bytes(&bytes[64..]).unwrap();
        assert_eq!(hd.first_group_addr, first_pos);
        let gr = GroupBlock::from_bytes(&bytes[first_pos as usize..]).unwrap();
        assert_eq!(gr.next_group_addr, second_pos);
    }
}
