//! Domain logic - pure release rules independent of git operations

pub mod plan;
pub mod tag;
pub mod version;

pub use plan::BumpPlan;
pub use tag::{Tag, TagSnapshot};
pub use version::{BumpLevel, Version};
