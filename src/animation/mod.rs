//! Keyframe animation
//!
//! Per-bone position/rotation/scale tracks, the asset-facing source trait,
//! and the eased driver that animates the IK target.

pub mod channel;
pub mod driver;
pub mod keyframe;
pub mod source;

pub use channel::BoneChannel;
pub use driver::{ease_in_out, AnimationDriver};
pub use keyframe::{ChannelKind, Keyframe, KeyframeSample, KeyframeTrack};
pub use source::{AnimationSource, BoneDesc, ClipSource};
