use crate::animation::BoneChannel;
use crate::error::{Error, Result};
use crate::math::Transform;
use glam::{Mat4, Quat, Vec3};

/// Index of a bone inside its [`Skeleton`](super::Skeleton).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BoneId(pub usize);

impl BoneId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// One node of the skeleton, animated by its own keyframe channel.
///
/// `parent` is a plain index into the owning arena, never an owning link.
#[derive(Debug, Clone)]
pub struct Bone {
    name: String,
    id: BoneId,
    channel: BoneChannel,
    pub(crate) local_transform: Mat4,
    pub(crate) global_transform: Mat4,
    pub(crate) parent: Option<BoneId>,
    pub(crate) children: Vec<BoneId>,
}

impl Bone {
    /// Fails when the asset supplied no channel for this bone.
    pub fn new(name: &str, id: BoneId, channel: Option<BoneChannel>) -> Result<Self> {
        let channel = channel.ok_or_else(|| Error::MissingChannel {
            bone: name.to_owned(),
        })?;

        Ok(Self {
            name: name.to_owned(),
            id,
            channel,
            local_transform: Mat4::IDENTITY,
            global_transform: Mat4::IDENTITY,
            parent: None,
            children: Vec::new(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn id(&self) -> BoneId {
        self.id
    }

    pub fn channel(&self) -> &BoneChannel {
        &self.channel
    }

    pub fn parent(&self) -> Option<BoneId> {
        self.parent
    }

    pub fn children(&self) -> &[BoneId] {
        &self.children
    }

    pub fn local_transform(&self) -> Mat4 {
        self.local_transform
    }

    pub fn global_transform(&self) -> Mat4 {
        self.global_transform
    }

    pub fn global_position(&self) -> Vec3 {
        self.global_transform.w_axis.truncate()
    }

    /// Resamples the local transform at `time`. Globals go stale until the
    /// skeleton propagates again.
    pub fn update(&mut self, time: f32) {
        self.local_transform = self.channel.local_transform(time);
    }

    pub fn local_position(&self) -> Vec3 {
        self.local_transform.w_axis.truncate()
    }

    pub fn local_rotation(&self) -> Quat {
        Transform::from_matrix(self.local_transform).rotation
    }

    pub fn local_scale(&self) -> Vec3 {
        Transform::from_matrix(self.local_transform).scale
    }

    /// Replaces the local rotation, keeping translation and scale.
    pub fn set_local_rotation(&mut self, rotation: Quat) {
        let mut pose = Transform::from_matrix(self.local_transform);
        pose.rotation = rotation.normalize();
        self.local_transform = pose.to_matrix();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_channel_is_fatal() {
        let err = Bone::new("forearm", BoneId(3), None).unwrap_err();
        assert_eq!(
            err,
            Error::MissingChannel {
                bone: "forearm".into()
            }
        );
    }

    #[test]
    fn set_local_rotation_keeps_translation_and_scale() {
        let pose = Transform::new(Vec3::new(0.0, 1.0, 0.0), Quat::IDENTITY, Vec3::splat(1.5));
        let mut bone = Bone::new("hand", BoneId(0), Some(BoneChannel::constant(pose))).unwrap();
        bone.update(0.0);

        let rotation = Quat::from_rotation_z(0.4);
        bone.set_local_rotation(rotation);

        assert!(bone.local_position().abs_diff_eq(Vec3::Y, 1e-5));
        assert!(bone.local_scale().abs_diff_eq(Vec3::splat(1.5), 1e-4));
        let expected = Transform::new(Vec3::Y, rotation, Vec3::splat(1.5)).to_matrix();
        assert!(bone.local_transform().abs_diff_eq(expected, 1e-5));
    }
}
