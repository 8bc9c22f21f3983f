use crate::blocks::group_block::GroupBlock;
use crate::parsing::raw_channel::RawChannel;

#[derive(Debug)]
pub struct RawGroup {
    pub address: u64,
    pub block: GroupBlock,
    pub channels: Vec<RawChannel>,
}
