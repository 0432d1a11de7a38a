use super::joint::IkJoint;
use glam::{Quat, Vec3};

/// Open kinematic chain, root first and end effector last.
#[derive(Debug, Clone, Default)]
pub struct IkChain {
    pub(crate) joints: Vec<IkJoint>,
}

impl IkChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder() -> ChainBuilder {
        ChainBuilder::new()
    }

    /// Appends a joint and points the previous joint's segment at it.
    ///
    /// The previous joint's `bone_length` becomes the distance between the
    /// two, and its rotation turns its +X axis toward the new joint. The new
    /// joint starts with the same world rotation, so its tip segment
    /// continues in a straight line.
    pub fn push(&mut self, mut joint: IkJoint) {
        let count = self.joints.len();
        if count > 0 {
            let parent_global = match count {
                1 => Quat::IDENTITY,
                _ => self.joints[count - 2].global_rotation,
            };
            let previous = &mut self.joints[count - 1];
            let offset = joint.position - previous.position;
            previous.bone_length = offset.length();

            if let Some(direction) = offset.try_normalize() {
                previous.global_rotation = Quat::from_rotation_arc(Vec3::X, direction);
                previous.local_rotation = parent_global.inverse() * previous.global_rotation;
            }

            joint.global_rotation = previous.global_rotation * joint.local_rotation;
        }
        self.joints.push(joint);
    }

    pub fn joints(&self) -> &[IkJoint] {
        &self.joints
    }

    pub fn len(&self) -> usize {
        self.joints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.joints.is_empty()
    }

    pub fn root(&self) -> Option<&IkJoint> {
        self.joints.first()
    }

    pub fn last(&self) -> Option<&IkJoint> {
        self.joints.last()
    }

    /// Tip of the last joint's segment.
    pub fn end_effector(&self) -> Option<Vec3> {
        self.joints.last().map(IkJoint::tip)
    }

    pub fn bone_lengths(&self) -> impl Iterator<Item = f32> + '_ {
        self.joints.iter().map(|j| j.bone_length)
    }

    /// Distance from the root to the end effector when fully stretched.
    pub fn reach(&self) -> f32 {
        self.bone_lengths().sum()
    }

    pub fn positions(&self) -> impl Iterator<Item = Vec3> + '_ {
        self.joints.iter().map(|j| j.position)
    }
}

pub struct ChainBuilder {
    joints: Vec<IkJoint>,
    tip_length: Option<f32>,
}

impl ChainBuilder {
    pub fn new() -> Self {
        Self {
            joints: Vec::new(),
            tip_length: None,
        }
    }

    pub fn add_joint(mut self, position: Vec3) -> Self {
        self.joints.push(IkJoint::new(position));
        self
    }

    /// Length of the end effector segment past the last joint.
    pub fn tip_length(mut self, length: f32) -> Self {
        self.tip_length = Some(length);
        self
    }

    pub fn build(self) -> IkChain {
        let mut chain = IkChain::new();
        let count = self.joints.len();
        for (i, mut joint) in self.joints.into_iter().enumerate() {
            if i + 1 == count {
                if let Some(length) = self.tip_length {
                    joint.bone_length = length;
                }
            }
            chain.push(joint);
        }
        chain
    }
}

impl Default for ChainBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ik::joint::DEFAULT_BONE_LENGTH;

    #[test]
    fn push_updates_previous_length() {
        let mut chain = IkChain::new();
        chain.push(IkJoint::new(Vec3::ZERO));
        assert!((chain.joints()[0].bone_length - DEFAULT_BONE_LENGTH).abs() < 1e-6);

        chain.push(IkJoint::new(Vec3::new(0.0, 2.0, 0.0)));
        assert!((chain.joints()[0].bone_length - 2.0).abs() < 1e-6);
        assert!((chain.joints()[1].bone_length - DEFAULT_BONE_LENGTH).abs() < 1e-6);
    }

    #[test]
    fn segments_point_at_successors() {
        let chain = IkChain::builder()
            .add_joint(Vec3::ZERO)
            .add_joint(Vec3::new(0.0, 1.0, 0.0))
            .add_joint(Vec3::new(1.0, 1.0, 0.0))
            .add_joint(Vec3::new(1.0, 1.0, -2.0))
            .build();

        let joints = chain.joints();
        for pair in joints.windows(2) {
            assert!(pair[0].tip().abs_diff_eq(pair[1].position, 1e-5));
        }

        // locals compose back into globals
        let mut accumulated = Quat::IDENTITY;
        for joint in joints {
            accumulated = accumulated * joint.local_rotation;
            assert!(accumulated.abs_diff_eq(joint.global_rotation, 1e-5));
        }

        // the tip carries on along the last segment's direction
        assert!(chain
            .end_effector()
            .unwrap()
            .abs_diff_eq(Vec3::new(1.0, 1.0, -2.5), 1e-5));
    }

    #[test]
    fn along_x_chain_keeps_identity_rotations() {
        let chain = IkChain::builder()
            .add_joint(Vec3::ZERO)
            .add_joint(Vec3::new(0.5, 0.0, 0.0))
            .add_joint(Vec3::new(1.0, 0.0, 0.0))
            .add_joint(Vec3::new(1.5, 0.0, 0.0))
            .build();

        for joint in chain.joints() {
            assert!(joint.global_rotation.abs_diff_eq(Quat::IDENTITY, 1e-6));
            assert!((joint.bone_length - 0.5).abs() < 1e-6);
        }
        assert!((chain.reach() - 2.0).abs() < 1e-6);
        assert!(chain.end_effector().unwrap().abs_diff_eq(Vec3::new(2.0, 0.0, 0.0), 1e-6));
    }

    #[test]
    fn tip_length_overrides_default() {
        let chain = IkChain::builder()
            .add_joint(Vec3::ZERO)
            .add_joint(Vec3::X)
            .tip_length(0.0)
            .build();

        assert_eq!(chain.end_effector(), Some(Vec3::X));
        assert!((chain.reach() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn coincident_joints_keep_rotation() {
        let chain = IkChain::builder()
            .add_joint(Vec3::ONE)
            .add_joint(Vec3::ONE)
            .build();

        assert_eq!(chain.joints()[0].bone_length, 0.0);
        assert_eq!(chain.joints()[0].global_rotation, Quat::IDENTITY);
    }
}
