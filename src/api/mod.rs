pub mod container;
pub mod group;
pub mod channel;

pub use channel::Channel;
pub use container::Container;
pub use group::Group;
