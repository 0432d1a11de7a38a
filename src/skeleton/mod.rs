//! Bone hierarchy
//!
//! Keyframe-driven bones stored in an index arena, with top-down global
//! transform propagation.

pub mod bone;
pub mod hierarchy;

pub use bone::{Bone, BoneId};
pub use hierarchy::Skeleton;
