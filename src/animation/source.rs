use super::channel::BoneChannel;
use std::collections::HashMap;

/// A bone as declared by an asset: its name and its parent's name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoneDesc {
    pub name: String,
    pub parent: Option<String>,
}

/// Load-time provider of the bone graph and per-bone keyframe channels.
///
/// Implemented by whatever asset importer feeds the skeleton; the crate
/// itself does not parse any file format.
pub trait AnimationSource {
    /// Bones in declaration order.
    fn bones(&self) -> &[BoneDesc];

    /// Channel animating `bone`, if the asset has one.
    fn channel(&self, bone: &str) -> Option<BoneChannel>;
}

/// In-memory [`AnimationSource`] assembled by hand or by an importer.
#[derive(Debug, Clone, Default)]
pub struct ClipSource {
    bones: Vec<BoneDesc>,
    channels: HashMap<String, BoneChannel>,
}

impl ClipSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bone(mut self, name: &str, parent: Option<&str>, channel: BoneChannel) -> Self {
        self.add_bone(name, parent, Some(channel));
        self
    }

    /// Declares a bone. `channel` may be `None` to model an asset with a gap.
    pub fn add_bone(&mut self, name: &str, parent: Option<&str>, channel: Option<BoneChannel>) {
        self.bones.push(BoneDesc {
            name: name.to_owned(),
            parent: parent.map(str::to_owned),
        });
        if let Some(channel) = channel {
            self.channels.insert(name.to_owned(), channel);
        }
    }
}

impl AnimationSource for ClipSource {
    fn bones(&self) -> &[BoneDesc] {
        &self.bones
    }

    fn channel(&self, bone: &str) -> Option<BoneChannel> {
        self.channels.get(bone).cloned()
    }
}
