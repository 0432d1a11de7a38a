use super::bone::{Bone, BoneId};
use crate::animation::{AnimationSource, BoneChannel};
use crate::error::{Error, Result};
use glam::{Mat4, Quat, Vec3};
use std::collections::HashMap;

/// Arena of bones linked by index.
///
/// Roots are the bones without a parent. Every frame the caller samples the
/// channels with [`Skeleton::update`], which also walks each root's subtree
/// so that `global = parent.global * local` holds for every bone.
#[derive(Debug, Clone, Default)]
pub struct Skeleton {
    bones: Vec<Bone>,
    by_name: HashMap<String, BoneId>,
}

impl Skeleton {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the arena from an asset: every declared bone needs a channel
    /// and every named parent must exist.
    pub fn load(source: &impl AnimationSource) -> Result<Self> {
        let mut skeleton = Self::new();

        for desc in source.bones() {
            skeleton.add_bone(&desc.name, source.channel(&desc.name))?;
        }

        for (index, desc) in source.bones().iter().enumerate() {
            let Some(parent_name) = &desc.parent else {
                continue;
            };
            let parent = skeleton
                .find(parent_name)
                .ok_or_else(|| Error::UnknownParent {
                    bone: desc.name.clone(),
                    parent: parent_name.clone(),
                })?;
            skeleton.add_child(parent, BoneId(index))?;
        }

        log::info!(
            "loaded skeleton with {} bones, {} roots",
            skeleton.len(),
            skeleton.roots().count()
        );
        Ok(skeleton)
    }

    pub fn add_bone(&mut self, name: &str, channel: Option<BoneChannel>) -> Result<BoneId> {
        if self.by_name.contains_key(name) {
            return Err(Error::DuplicateBone(name.to_owned()));
        }

        let id = BoneId(self.bones.len());
        self.bones.push(Bone::new(name, id, channel)?);
        self.by_name.insert(name.to_owned(), id);
        Ok(id)
    }

    /// Links `child` under `parent`.
    ///
    /// Unknown ids, self-links and re-parenting are rejected. The caller
    /// keeps the graph a tree; a bone linked into a longer cycle is
    /// unreachable from any root and simply stops being updated.
    pub fn add_child(&mut self, parent: BoneId, child: BoneId) -> Result<()> {
        if parent == child {
            return Err(Error::SelfParent(child));
        }
        if parent.index() >= self.bones.len() {
            return Err(Error::UnknownBone(parent));
        }
        let child_bone = self.bones.get_mut(child.index()).ok_or(Error::UnknownBone(child))?;
        if child_bone.parent.is_some() {
            return Err(Error::AlreadyParented(child));
        }

        child_bone.parent = Some(parent);
        self.bones[parent.index()].children.push(child);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.bones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bones.is_empty()
    }

    pub fn bones(&self) -> &[Bone] {
        &self.bones
    }

    pub fn bone(&self, id: BoneId) -> Option<&Bone> {
        self.bones.get(id.index())
    }

    pub fn bone_mut(&mut self, id: BoneId) -> Option<&mut Bone> {
        self.bones.get_mut(id.index())
    }

    pub fn find(&self, name: &str) -> Option<BoneId> {
        self.by_name.get(name).copied()
    }

    pub fn roots(&self) -> impl Iterator<Item = BoneId> + '_ {
        self.bones
            .iter()
            .filter(|b| b.parent.is_none())
            .map(|b| b.id())
    }

    /// Longest channel, used to loop playback.
    pub fn duration(&self) -> f32 {
        self.bones
            .iter()
            .map(|b| b.channel().duration())
            .fold(0.0, f32::max)
    }

    pub fn parent_global_transform(&self, id: BoneId) -> Mat4 {
        self.bone(id)
            .and_then(|b| b.parent)
            .map(|p| self.bones[p.index()].global_transform)
            .unwrap_or(Mat4::IDENTITY)
    }

    /// Samples every channel at `time`, then propagates from the identity.
    pub fn update(&mut self, time: f32) {
        self.update_with_root(time, Mat4::IDENTITY);
    }

    pub fn update_with_root(&mut self, time: f32, scene_root: Mat4) {
        for bone in &mut self.bones {
            bone.update(time);
        }
        self.update_global_transforms(scene_root);
    }

    /// Recomputes the globals of every root subtree under `scene_root`.
    pub fn update_global_transforms(&mut self, scene_root: Mat4) {
        let roots: Vec<BoneId> = self.roots().collect();
        for root in roots {
            self.update_subtree(root, scene_root);
        }
    }

    /// Sets `id`'s global from `parent_global` and walks its descendants
    /// depth-first with an explicit stack.
    pub fn update_subtree(&mut self, id: BoneId, parent_global: Mat4) {
        let mut stack = vec![(id, parent_global)];

        while let Some((current, parent_global)) = stack.pop() {
            let Some(bone) = self.bones.get_mut(current.index()) else {
                continue;
            };
            bone.global_transform = parent_global * bone.local_transform;

            let global = bone.global_transform;
            stack.extend(bone.children.iter().rev().map(|&child| (child, global)));
        }
    }

    /// Turns `id`'s parent so the parent-to-bone direction points at
    /// `target`, then refreshes the parent's subtree.
    ///
    /// The bone's own rotation cannot move its position, so the swing is
    /// applied one level up. Returns `false` for a root bone or when the
    /// bone or target sits on the parent's position.
    pub fn aim_towards(&mut self, id: BoneId, target: Vec3) -> Result<bool> {
        let bone = self.bone(id).ok_or(Error::UnknownBone(id))?;
        let Some(parent) = bone.parent else {
            return Ok(false);
        };

        let parent_bone = &self.bones[parent.index()];
        let pivot = parent_bone.global_position();
        let bone_dir = (bone.global_position() - pivot).normalize_or_zero();
        let target_dir = (target - pivot).normalize_or_zero();
        if bone_dir == Vec3::ZERO || target_dir == Vec3::ZERO {
            return Ok(false);
        }

        // frame the parent hangs in, scene root included
        let frame = parent_bone.global_transform * parent_bone.local_transform.inverse();
        let (_, frame_rotation, _) = frame.to_scale_rotation_translation();

        let arc = Quat::from_rotation_arc(bone_dir, target_dir);
        let local_arc = frame_rotation.inverse() * arc * frame_rotation;
        let rotation = local_arc * parent_bone.local_rotation();

        self.bones[parent.index()].set_local_rotation(rotation);
        self.update_subtree(parent, frame);
        Ok(true)
    }

    pub fn global_transforms(&self) -> Vec<Mat4> {
        self.bones.iter().map(|b| b.global_transform).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::{ClipSource, KeyframeSample};
    use crate::math::Transform;

    fn offset(x: f32, y: f32) -> BoneChannel {
        BoneChannel::constant(Transform::from_position(Vec3::new(x, y, 0.0)))
    }

    fn arm() -> ClipSource {
        let swing = BoneChannel::new(
            vec![KeyframeSample::new(Vec3::ZERO, 0.0)],
            vec![
                KeyframeSample::new(Quat::IDENTITY, 0.0),
                KeyframeSample::new(Quat::from_rotation_z(std::f32::consts::FRAC_PI_2), 1.0),
            ],
            vec![KeyframeSample::new(Vec3::ONE, 0.0)],
        )
        .unwrap();

        ClipSource::new()
            .with_bone("shoulder", None, swing)
            .with_bone("elbow", Some("shoulder"), offset(1.0, 0.0))
            .with_bone("wrist", Some("elbow"), offset(1.0, 0.0))
            .with_bone("thumb", Some("wrist"), offset(0.0, 0.2))
    }

    #[test]
    fn load_links_parents_and_children() {
        let skeleton = Skeleton::load(&arm()).unwrap();

        assert_eq!(skeleton.len(), 4);
        assert_eq!(skeleton.roots().collect::<Vec<_>>(), vec![BoneId(0)]);

        let elbow = skeleton.find("elbow").unwrap();
        let wrist = skeleton.find("wrist").unwrap();
        assert_eq!(skeleton.bone(elbow).unwrap().parent(), Some(BoneId(0)));
        assert_eq!(skeleton.bone(elbow).unwrap().children(), &[wrist]);
        assert!((skeleton.duration() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn globals_compose_parent_then_local() {
        let mut skeleton = Skeleton::load(&arm()).unwrap();

        skeleton.update(0.0);
        let wrist = skeleton.find("wrist").unwrap();
        let thumb = skeleton.find("thumb").unwrap();
        assert!(skeleton
            .bone(wrist)
            .unwrap()
            .global_position()
            .abs_diff_eq(Vec3::new(2.0, 0.0, 0.0), 1e-5));

        // quarter turn at the shoulder swings the whole arm onto +Y
        skeleton.update(1.0);
        assert!(skeleton
            .bone(wrist)
            .unwrap()
            .global_position()
            .abs_diff_eq(Vec3::new(0.0, 2.0, 0.0), 1e-5));
        assert!(skeleton
            .bone(thumb)
            .unwrap()
            .global_position()
            .abs_diff_eq(Vec3::new(-0.2, 2.0, 0.0), 1e-5));

        for bone in skeleton.bones() {
            let expected = skeleton.parent_global_transform(bone.id()) * bone.local_transform();
            assert!(bone.global_transform().abs_diff_eq(expected, 1e-5));
        }
    }

    #[test]
    fn scene_root_transform_applies_to_every_bone() {
        let mut skeleton = Skeleton::load(&arm()).unwrap();
        skeleton.update(0.0);

        let scene = Mat4::from_translation(Vec3::new(0.0, 0.0, 5.0));
        skeleton.update_global_transforms(scene);

        let elbow = skeleton.find("elbow").unwrap();
        assert!(skeleton
            .bone(elbow)
            .unwrap()
            .global_position()
            .abs_diff_eq(Vec3::new(1.0, 0.0, 5.0), 1e-5));
    }

    #[test]
    fn local_edit_then_subtree_update() {
        let mut skeleton = Skeleton::load(&arm()).unwrap();
        skeleton.update(0.0);

        let elbow = skeleton.find("elbow").unwrap();
        let wrist = skeleton.find("wrist").unwrap();
        skeleton
            .bone_mut(elbow)
            .unwrap()
            .set_local_rotation(Quat::from_rotation_z(std::f32::consts::FRAC_PI_2));
        let parent = skeleton.parent_global_transform(elbow);
        skeleton.update_subtree(elbow, parent);

        assert!(skeleton
            .bone(wrist)
            .unwrap()
            .global_position()
            .abs_diff_eq(Vec3::new(1.0, 1.0, 0.0), 1e-5));
    }

    #[test]
    fn load_errors() {
        let mut missing = ClipSource::new();
        missing.add_bone("root", None, None);
        assert_eq!(
            Skeleton::load(&missing).unwrap_err(),
            Error::MissingChannel {
                bone: "root".into()
            }
        );

        let orphan = ClipSource::new().with_bone("tail", Some("hips"), offset(0.0, 0.0));
        assert_eq!(
            Skeleton::load(&orphan).unwrap_err(),
            Error::UnknownParent {
                bone: "tail".into(),
                parent: "hips".into()
            }
        );

        let twice = ClipSource::new()
            .with_bone("spine", None, offset(0.0, 0.0))
            .with_bone("spine", None, offset(0.0, 1.0));
        assert_eq!(
            Skeleton::load(&twice).unwrap_err(),
            Error::DuplicateBone("spine".into())
        );
    }

    #[test]
    fn add_child_rejects_unknown_self_and_reparenting() {
        let mut skeleton = Skeleton::new();
        let a = skeleton.add_bone("a", Some(offset(0.0, 0.0))).unwrap();
        let b = skeleton.add_bone("b", Some(offset(1.0, 0.0))).unwrap();
        let c = skeleton.add_bone("c", Some(offset(1.0, 0.0))).unwrap();

        assert_eq!(skeleton.add_child(a, BoneId(9)), Err(Error::UnknownBone(BoneId(9))));
        assert_eq!(skeleton.add_child(BoneId(9), a), Err(Error::UnknownBone(BoneId(9))));

        skeleton.add_child(a, b).unwrap();
        assert_eq!(skeleton.add_child(c, b), Err(Error::AlreadyParented(b)));

        assert_eq!(skeleton.add_child(c, c), Err(Error::SelfParent(c)));
        assert!(skeleton.bone(c).unwrap().children().is_empty());
        assert_eq!(skeleton.bone(c).unwrap().parent(), None);
    }

    fn assert_on_ray(skeleton: &Skeleton, id: BoneId, target: Vec3) {
        let bone = skeleton.bone(id).unwrap();
        let pivot = skeleton.bone(bone.parent().unwrap()).unwrap().global_position();
        let toward = (target - pivot).normalize();
        let along = (bone.global_position() - pivot).normalize();
        assert!(along.abs_diff_eq(toward, 1e-4), "{:?} vs {:?}", along, toward);
    }

    #[test]
    fn aim_towards_swings_the_parent() {
        let mut skeleton = Skeleton::load(&arm()).unwrap();
        skeleton.update(0.0);

        let wrist = skeleton.find("wrist").unwrap();
        let thumb = skeleton.find("thumb").unwrap();
        assert!(skeleton.aim_towards(wrist, Vec3::new(1.0, 3.0, 0.0)).unwrap());

        assert_on_ray(&skeleton, wrist, Vec3::new(1.0, 3.0, 0.0));
        assert!(skeleton
            .bone(wrist)
            .unwrap()
            .global_position()
            .abs_diff_eq(Vec3::new(1.0, 1.0, 0.0), 1e-5));
        // the rest of the subtree follows
        assert!(skeleton
            .bone(thumb)
            .unwrap()
            .global_position()
            .abs_diff_eq(Vec3::new(0.8, 1.0, 0.0), 1e-5));

        for bone in skeleton.bones() {
            let expected = skeleton.parent_global_transform(bone.id()) * bone.local_transform();
            assert!(bone.global_transform().abs_diff_eq(expected, 1e-5));
        }
    }

    #[test]
    fn aim_towards_under_rotated_and_placed_parents() {
        let mut skeleton = Skeleton::load(&arm()).unwrap();
        // shoulder turned a quarter, whole arm lifted off the origin
        skeleton.update_with_root(1.0, Mat4::from_translation(Vec3::new(0.0, 0.0, 2.0)));

        let wrist = skeleton.find("wrist").unwrap();
        let elbow = skeleton.find("elbow").unwrap();
        let shoulder_before = skeleton.bone(BoneId(0)).unwrap().global_transform();

        let target = Vec3::new(3.0, 1.0, -1.0);
        assert!(skeleton.aim_towards(wrist, target).unwrap());

        assert_on_ray(&skeleton, wrist, target);
        let elbow_pos = skeleton.bone(elbow).unwrap().global_position();
        assert!(elbow_pos.abs_diff_eq(Vec3::new(0.0, 1.0, 2.0), 1e-5));
        let reach = skeleton.bone(wrist).unwrap().global_position().distance(elbow_pos);
        assert!((reach - 1.0).abs() < 1e-5);
        assert_eq!(skeleton.bone(BoneId(0)).unwrap().global_transform(), shoulder_before);
    }

    #[test]
    fn aim_towards_edge_cases() {
        let mut skeleton = Skeleton::load(&arm()).unwrap();
        skeleton.update(0.0);
        let before = skeleton.global_transforms();

        let elbow = skeleton.find("elbow").unwrap();
        assert_eq!(skeleton.aim_towards(BoneId(0), Vec3::Y), Ok(false));
        assert_eq!(skeleton.aim_towards(elbow, Vec3::ZERO), Ok(false));
        assert_eq!(
            skeleton.aim_towards(BoneId(7), Vec3::Y),
            Err(Error::UnknownBone(BoneId(7)))
        );
        assert_eq!(skeleton.global_transforms(), before);

        // straight behind the parent still gets a valid half turn
        assert!(skeleton.aim_towards(elbow, Vec3::new(-2.0, 0.0, 0.0)).unwrap());
        assert!(skeleton
            .bone(elbow)
            .unwrap()
            .global_position()
            .abs_diff_eq(Vec3::new(-1.0, 0.0, 0.0), 1e-4));
    }
}
