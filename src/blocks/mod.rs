// src/blocks/mod.rs
pub mod common;
pub mod identification_block;
pub mod header_block;
pub mod group_block;
pub mod field_block;
pub mod component_block;
pub mod text_block;
pub mod property_block;
pub mod data_block;
