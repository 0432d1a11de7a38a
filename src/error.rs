use crate::animation::ChannelKind;
use crate::skeleton::BoneId;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("bone `{bone}` has no animation channel")]
    MissingChannel { bone: String },

    #[error("{channel} track has no keyframes")]
    EmptyTrack { channel: ChannelKind },

    #[error("{channel} track is not ordered by timestamp at key {index}")]
    UnsortedTrack { channel: ChannelKind, index: usize },

    #[error("time {time} is outside the track range [{first}, {last}]")]
    OutOfRange { time: f32, first: f32, last: f32 },

    #[error("unknown bone {0:?}")]
    UnknownBone(BoneId),

    #[error("bone `{0}` is declared twice")]
    DuplicateBone(String),

    #[error("bone `{bone}` names unknown parent `{parent}`")]
    UnknownParent { bone: String, parent: String },

    #[error("bone {0:?} cannot be its own parent")]
    SelfParent(BoneId),

    #[error("bone {0:?} already has a parent")]
    AlreadyParented(BoneId),

    #[error("IK chain has no joints")]
    EmptyChain,
}

pub type Result<T> = std::result::Result<T, Error>;
