//! Frame stepping
//!
//! [`SimulationContext`] owns everything that changes between frames: the
//! solver with its chain and target, the target drivers, and the skeleton.
//! Each [`step`](SimulationContext::step) publishes a [`FrameSnapshot`] that
//! the renderer reads without touching the live state.

use crate::animation::AnimationDriver;
use crate::dynamics::{SpringPreset, SpringTarget};
use crate::error::{Error, Result};
use crate::ik::{CcdSolver, IkChain, IkJoint, SolveResult, SolverConfig};
use crate::skeleton::{BoneId, Skeleton};
use glam::{Mat4, Vec3};

/// What moves the IK target between frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TargetMode {
    /// Only explicit [`SimulationContext::set_target`] calls.
    #[default]
    Manual,
    /// Eased ping-pong between two endpoints.
    Animated,
    /// Spring pull toward a fixed goal.
    Spring,
}

#[derive(Debug, Clone)]
pub struct SimulationConfig {
    pub joints: Vec<Vec3>,
    pub initial_target: Vec3,
    pub solver: SolverConfig,
    pub animation_from: Vec3,
    pub animation_to: Vec3,
    pub animation_duration: f32,
    pub spring_goal: Vec3,
    pub spring_settle_radius: f32,
    pub spring_preset: SpringPreset,
    /// Placement of the skeleton's roots in the scene.
    pub skeleton_root: Mat4,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            joints: vec![
                Vec3::ZERO,
                Vec3::new(0.5, 0.0, 0.0),
                Vec3::new(1.0, 0.0, 0.0),
                Vec3::new(1.5, 0.0, 0.0),
            ],
            initial_target: Vec3::new(2.0, 0.0, 0.0),
            solver: SolverConfig::default(),
            animation_from: Vec3::new(0.636755, 0.986629, 0.000239521),
            animation_to: Vec3::new(-0.343102, 0.572075, -0.000894032),
            animation_duration: 15.0,
            spring_goal: Vec3::new(1.732, 1.0, 0.0),
            spring_settle_radius: 0.1,
            spring_preset: SpringPreset::Smooth,
            skeleton_root: Mat4::IDENTITY,
        }
    }
}

impl SimulationConfig {
    pub fn joints(mut self, joints: Vec<Vec3>) -> Self {
        self.joints = joints;
        self
    }

    pub fn initial_target(mut self, target: Vec3) -> Self {
        self.initial_target = target;
        self
    }

    pub fn solver(mut self, solver: SolverConfig) -> Self {
        self.solver = solver;
        self
    }

    pub fn animation(mut self, from: Vec3, to: Vec3, duration: f32) -> Self {
        self.animation_from = from;
        self.animation_to = to;
        self.animation_duration = duration;
        self
    }

    pub fn spring(mut self, goal: Vec3, settle_radius: f32, preset: SpringPreset) -> Self {
        self.spring_goal = goal;
        self.spring_settle_radius = settle_radius;
        self.spring_preset = preset;
        self
    }

    pub fn skeleton_root(mut self, root: Mat4) -> Self {
        self.skeleton_root = root;
        self
    }
}

/// World pose of one skeleton bone for a frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BonePose {
    pub global: Mat4,
    pub parent: Option<BoneId>,
}

impl BonePose {
    pub fn position(&self) -> Vec3 {
        self.global.w_axis.truncate()
    }
}

/// Read-only copy of one frame's state.
#[derive(Debug, Clone, Default)]
pub struct FrameSnapshot {
    pub time: f32,
    pub joints: Vec<IkJoint>,
    pub end_effector: Vec3,
    pub target: Vec3,
    pub bones: Vec<BonePose>,
    pub solve: SolveResult,
    pub mode: TargetMode,
}

impl FrameSnapshot {
    pub fn bone_position(&self, id: BoneId) -> Option<Vec3> {
        self.bones.get(id.index()).map(BonePose::position)
    }
}

pub struct SimulationContext {
    solver: CcdSolver,
    driver: AnimationDriver,
    spring: SpringTarget,
    skeleton: Skeleton,
    skeleton_root: Mat4,
    mode: TargetMode,
}

impl SimulationContext {
    pub fn new(config: SimulationConfig) -> Result<Self> {
        if config.joints.is_empty() {
            return Err(Error::EmptyChain);
        }

        let chain = config
            .joints
            .iter()
            .fold(IkChain::builder(), |builder, &p| builder.add_joint(p))
            .build();
        let mut solver = CcdSolver::new(chain, config.solver);
        solver.set_target(config.initial_target);

        log::info!(
            "IK chain ready: {} joints, reach {:.3}",
            solver.chain().len(),
            solver.chain().reach()
        );

        Ok(Self {
            solver,
            driver: AnimationDriver::new(
                config.animation_from,
                config.animation_to,
                config.animation_duration,
            ),
            spring: SpringTarget::new(
                config.spring_goal,
                config.spring_settle_radius,
                config.spring_preset,
            ),
            skeleton: Skeleton::new(),
            skeleton_root: config.skeleton_root,
            mode: TargetMode::Manual,
        })
    }

    pub fn with_skeleton(mut self, skeleton: Skeleton) -> Self {
        self.skeleton = skeleton;
        self
    }

    pub fn solver(&self) -> &CcdSolver {
        &self.solver
    }

    pub fn solver_mut(&mut self) -> &mut CcdSolver {
        &mut self.solver
    }

    pub fn skeleton(&self) -> &Skeleton {
        &self.skeleton
    }

    pub fn skeleton_mut(&mut self) -> &mut Skeleton {
        &mut self.skeleton
    }

    pub fn driver(&self) -> &AnimationDriver {
        &self.driver
    }

    pub fn spring(&self) -> &SpringTarget {
        &self.spring
    }

    pub fn mode(&self) -> TargetMode {
        self.mode
    }

    pub fn target(&self) -> Vec3 {
        self.solver.target()
    }

    /// Starts the eased target animation, or stops it if it is running.
    /// Either way the spring is switched off.
    pub fn toggle_animation(&mut self, now: f32) {
        if self.mode == TargetMode::Animated {
            self.driver.stop();
            self.mode = TargetMode::Manual;
        } else {
            self.driver.stop();
            self.driver.trigger(now);
            self.mode = TargetMode::Animated;
        }
        log::info!("target mode: {:?}", self.mode);
    }

    /// Engages the spring from the current target, or releases it.
    /// Either way the animation is switched off.
    pub fn toggle_spring(&mut self) {
        self.driver.stop();
        if self.mode == TargetMode::Spring {
            self.mode = TargetMode::Manual;
        } else {
            self.spring.engage(self.solver.target());
            self.mode = TargetMode::Spring;
        }
        log::info!("target mode: {:?}", self.mode);
    }

    pub fn set_spring_preset(&mut self, preset: SpringPreset) {
        self.spring.set_preset(preset);
    }

    /// Moves the target directly. While the spring is engaged it restarts
    /// from the new point; a running animation overrides it next frame.
    pub fn set_target(&mut self, target: Vec3) {
        self.solver.set_target(target);
        if self.mode == TargetMode::Spring {
            self.spring.engage(target);
        }
    }

    /// Advances one frame: moves the target, solves the chain, poses the
    /// skeleton at `now` looped over its clip, and returns the result.
    pub fn step(&mut self, now: f32, dt: f32) -> FrameSnapshot {
        match self.mode {
            TargetMode::Manual => {}
            TargetMode::Animated => {
                if let Some(target) = self.driver.update(now) {
                    self.solver.set_target(target);
                }
            }
            TargetMode::Spring => {
                let target = self.spring.update(self.solver.target(), dt);
                self.solver.set_target(target);
            }
        }

        let solve = self.solver.solve();

        if !self.skeleton.is_empty() {
            let duration = self.skeleton.duration();
            let clip_time = if duration > 0.0 {
                now.rem_euclid(duration)
            } else {
                0.0
            };
            self.skeleton.update_with_root(clip_time, self.skeleton_root);
        }

        self.snapshot(now, solve)
    }

    fn snapshot(&self, time: f32, solve: SolveResult) -> FrameSnapshot {
        FrameSnapshot {
            time,
            joints: self.solver.chain().joints().to_vec(),
            end_effector: self.solver.end_effector().unwrap_or(Vec3::ZERO),
            target: self.solver.target(),
            bones: self
                .skeleton
                .bones()
                .iter()
                .map(|bone| BonePose {
                    global: bone.global_transform(),
                    parent: bone.parent(),
                })
                .collect(),
            solve,
            mode: self.mode,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_chain_is_rejected() {
        let config = SimulationConfig::default().joints(Vec::new());
        assert_eq!(SimulationContext::new(config).err(), Some(Error::EmptyChain));
    }

    #[test]
    fn toggles_are_exclusive() {
        let mut sim = SimulationContext::new(SimulationConfig::default()).unwrap();
        assert_eq!(sim.mode(), TargetMode::Manual);

        sim.toggle_animation(1.0);
        assert_eq!(sim.mode(), TargetMode::Animated);
        assert!(sim.driver().is_active());

        sim.toggle_spring();
        assert_eq!(sim.mode(), TargetMode::Spring);
        assert!(!sim.driver().is_active());

        sim.toggle_animation(2.0);
        assert_eq!(sim.mode(), TargetMode::Animated);

        sim.toggle_animation(3.0);
        assert_eq!(sim.mode(), TargetMode::Manual);
        assert!(!sim.driver().is_active());
    }

    #[test]
    fn animated_target_follows_driver() {
        let mut sim = SimulationContext::new(SimulationConfig::default()).unwrap();
        sim.toggle_animation(10.0);

        let frame = sim.step(10.0, 1.0 / 60.0);
        assert!(frame.target.abs_diff_eq(sim.driver().from(), 1e-6));

        let frame = sim.step(25.0, 1.0 / 60.0);
        assert!(frame.target.abs_diff_eq(sim.driver().to(), 1e-5));
        assert_eq!(frame.mode, TargetMode::Animated);
    }

    #[test]
    fn manual_target_is_kept() {
        let mut sim = SimulationContext::new(SimulationConfig::default()).unwrap();
        sim.set_target(Vec3::new(1.2, 0.3, 0.0));

        let frame = sim.step(0.0, 1.0 / 60.0);
        assert_eq!(frame.target, Vec3::new(1.2, 0.3, 0.0));
        assert_eq!(frame.joints.len(), 4);
        assert!(frame.solve.iterations <= 30);
        assert!(frame.bones.is_empty());
    }

    #[test]
    fn spring_mode_moves_target_to_goal() {
        let mut sim = SimulationContext::new(SimulationConfig::default()).unwrap();
        sim.set_target(Vec3::new(-1.0, 0.0, 0.0));
        sim.toggle_spring();

        let mut frame = sim.step(0.0, 1.0 / 60.0);
        for i in 1..600 {
            frame = sim.step(i as f32 / 60.0, 1.0 / 60.0);
        }

        assert!(sim.spring().is_settled(frame.target));
    }
}
