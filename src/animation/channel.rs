use super::keyframe::{ChannelKind, KeyframeSample, KeyframeTrack};
use crate::error::Result;
use crate::math::Transform;
use glam::{Mat4, Quat, Vec3};

/// Position, rotation and scale tracks driving one bone.
#[derive(Debug, Clone)]
pub struct BoneChannel {
    positions: KeyframeTrack<Vec3>,
    rotations: KeyframeTrack<Quat>,
    scales: KeyframeTrack<Vec3>,
}

impl BoneChannel {
    /// Rotation keys are normalized on load; tracks are immutable afterwards.
    pub fn new(
        positions: Vec<KeyframeSample<Vec3>>,
        rotations: Vec<KeyframeSample<Quat>>,
        scales: Vec<KeyframeSample<Vec3>>,
    ) -> Result<Self> {
        let rotations = rotations
            .into_iter()
            .map(|key| KeyframeSample::new(key.value.normalize(), key.timestamp))
            .collect();

        Ok(Self {
            positions: KeyframeTrack::new(ChannelKind::Position, positions)?,
            rotations: KeyframeTrack::new(ChannelKind::Rotation, rotations)?,
            scales: KeyframeTrack::new(ChannelKind::Scale, scales)?,
        })
    }

    /// A channel holding a single pose for all time.
    pub fn constant(pose: Transform) -> Self {
        Self {
            positions: KeyframeTrack::constant(ChannelKind::Position, pose.position),
            rotations: KeyframeTrack::constant(ChannelKind::Rotation, pose.rotation.normalize()),
            scales: KeyframeTrack::constant(ChannelKind::Scale, pose.scale),
        }
    }

    pub fn positions(&self) -> &KeyframeTrack<Vec3> {
        &self.positions
    }

    pub fn rotations(&self) -> &KeyframeTrack<Quat> {
        &self.rotations
    }

    pub fn scales(&self) -> &KeyframeTrack<Vec3> {
        &self.scales
    }

    /// Latest key time over all three tracks.
    pub fn duration(&self) -> f32 {
        self.positions
            .last_timestamp()
            .max(self.rotations.last_timestamp())
            .max(self.scales.last_timestamp())
    }

    /// Pose at `time`, each track clamped to its own key range.
    pub fn sample(&self, time: f32) -> Transform {
        Transform::new(
            self.positions.sample(time),
            self.rotations.sample(time),
            self.scales.sample(time),
        )
    }

    pub fn try_sample(&self, time: f32) -> Result<Transform> {
        Ok(Transform::new(
            self.positions.try_sample(time)?,
            self.rotations.try_sample(time)?,
            self.scales.try_sample(time)?,
        ))
    }

    /// `translation(pos) * rotation(rot) * scale(scl)` at `time`.
    pub fn local_transform(&self, time: f32) -> Mat4 {
        self.sample(time).to_matrix()
    }
}
