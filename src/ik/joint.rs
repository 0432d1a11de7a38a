use glam::{Mat4, Quat, Vec3};

/// Segment length given to a joint until a successor is attached.
pub const DEFAULT_BONE_LENGTH: f32 = 0.5;

/// A rigid joint of an IK chain. Its segment extends along local +X.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IkJoint {
    /// World-space position.
    pub position: Vec3,
    /// Rotation relative to the previous joint.
    pub local_rotation: Quat,
    /// Accumulated world-space rotation.
    pub global_rotation: Quat,
    /// Distance to the next joint; for the last joint, the length of the tip segment.
    pub bone_length: f32,
}

impl IkJoint {
    pub fn new(position: Vec3) -> Self {
        Self {
            position,
            local_rotation: Quat::IDENTITY,
            global_rotation: Quat::IDENTITY,
            bone_length: DEFAULT_BONE_LENGTH,
        }
    }

    pub fn with_length(mut self, bone_length: f32) -> Self {
        self.bone_length = bone_length;
        self
    }

    /// Far end of this joint's segment.
    pub fn tip(&self) -> Vec3 {
        self.position + self.global_rotation * Vec3::new(self.bone_length, 0.0, 0.0)
    }

    /// `translate(position) * rotate(global_rotation)`, for drawing.
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_rotation_translation(self.global_rotation, self.position)
    }
}
