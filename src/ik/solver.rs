use super::chain::IkChain;
use glam::{Mat4, Quat, Vec3};

/// How a joint's correction is carried down to the joints after it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Propagation {
    /// Every later joint pre-multiplies the same delta into its local
    /// rotation and re-accumulates its global rotation. The chain curls as
    /// it is corrected.
    #[default]
    UniformDelta,
    /// The delta is applied in world space to the whole subtree, which
    /// turns about the corrected joint as a rigid body.
    Rigid,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolverConfig {
    /// Upper bound on full tip-to-root sweeps per solve.
    pub max_iterations: u32,
    /// End effector distance at which the solve stops.
    pub threshold: f32,
    /// Number of trailing joints never rotated directly.
    pub locked_tail: usize,
    /// Cosine above which a joint counts as already aimed at the target.
    pub aligned_cos: f32,
    pub propagation: Propagation,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            max_iterations: 30,
            threshold: 0.0001,
            locked_tail: 3,
            aligned_cos: 0.999,
            propagation: Propagation::UniformDelta,
        }
    }
}

impl SolverConfig {
    pub fn max_iterations(mut self, max_iterations: u32) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn locked_tail(mut self, locked_tail: usize) -> Self {
        self.locked_tail = locked_tail;
        self
    }

    pub fn aligned_cos(mut self, aligned_cos: f32) -> Self {
        self.aligned_cos = aligned_cos;
        self
    }

    pub fn propagation(mut self, propagation: Propagation) -> Self {
        self.propagation = propagation;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SolveResult {
    pub converged: bool,
    pub iterations: u32,
    pub final_distance: f32,
}

/// Cyclic coordinate descent over a single chain toward one target.
#[derive(Debug, Clone)]
pub struct CcdSolver {
    chain: IkChain,
    target: Vec3,
    config: SolverConfig,
}

impl CcdSolver {
    pub fn new(chain: IkChain, config: SolverConfig) -> Self {
        let target = chain.end_effector().unwrap_or(Vec3::ZERO);
        Self {
            chain,
            target,
            config,
        }
    }

    pub fn chain(&self) -> &IkChain {
        &self.chain
    }

    pub fn chain_mut(&mut self) -> &mut IkChain {
        &mut self.chain
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut SolverConfig {
        &mut self.config
    }

    pub fn target(&self) -> Vec3 {
        self.target
    }

    /// Takes effect on the next [`solve`](Self::solve).
    pub fn set_target(&mut self, target: Vec3) {
        self.target = target;
    }

    pub fn end_effector(&self) -> Option<Vec3> {
        self.chain.end_effector()
    }

    pub fn root_transform(&self) -> Mat4 {
        self.chain
            .root()
            .map(|root| root.matrix())
            .unwrap_or(Mat4::IDENTITY)
    }

    /// Index of the last joint the sweep may rotate.
    fn last_free_joint(&self) -> Option<usize> {
        self.chain
            .len()
            .checked_sub(1 + self.config.locked_tail)
    }

    fn distance_to_target(&self) -> f32 {
        self.chain
            .end_effector()
            .map(|tip| tip.distance(self.target))
            .unwrap_or(0.0)
    }

    /// Runs up to `max_iterations` sweeps and keeps the best pose reached.
    ///
    /// Stops early once the end effector is within `threshold` of the target
    /// or a sweep leaves every joint untouched. Running out of iterations is
    /// reported through [`SolveResult::converged`], never as an error.
    pub fn solve(&mut self) -> SolveResult {
        if self.chain.is_empty() {
            return SolveResult {
                converged: true,
                iterations: 0,
                final_distance: 0.0,
            };
        }

        let Some(last_free) = self.last_free_joint() else {
            let final_distance = self.distance_to_target();
            log::trace!(
                "chain of {} joints has no free joints with {} locked",
                self.chain.len(),
                self.config.locked_tail
            );
            return SolveResult {
                converged: final_distance < self.config.threshold,
                iterations: 0,
                final_distance,
            };
        };

        let mut iterations = 0;
        let mut distance = self.distance_to_target();

        while iterations < self.config.max_iterations {
            iterations += 1;

            let mut updated = false;
            for index in (0..=last_free).rev() {
                updated |= self.rotate_joint(index);
            }

            distance = self.distance_to_target();
            if distance < self.config.threshold || !updated {
                break;
            }
        }

        let converged = distance < self.config.threshold;
        if !converged {
            log::trace!(
                "CCD stopped after {} iterations, {:.5} from target",
                iterations,
                distance
            );
        }

        SolveResult {
            converged,
            iterations,
            final_distance: distance,
        }
    }

    /// Turns joint `index` so the end effector swings toward the target.
    /// Returns whether the joint moved.
    fn rotate_joint(&mut self, index: usize) -> bool {
        let Some(end_effector) = self.chain.end_effector() else {
            return false;
        };
        let pivot = self.chain.joints[index].position;

        let to_target = (self.target - pivot).normalize_or_zero();
        let to_end = (end_effector - pivot).normalize_or_zero();

        let cos_theta = to_target.dot(to_end);
        if cos_theta >= self.config.aligned_cos {
            return false;
        }

        let axis = to_end.cross(to_target);
        let sin_theta = axis.length();
        if sin_theta <= f32::EPSILON {
            return false;
        }

        let delta = Quat::from_axis_angle(axis / sin_theta, sin_theta.atan2(cos_theta));

        match self.config.propagation {
            Propagation::UniformDelta => self.apply_uniform_delta(index, delta),
            Propagation::Rigid => self.apply_rigid(index, delta),
        }
        true
    }

    fn apply_uniform_delta(&mut self, index: usize, delta: Quat) {
        let joints = &mut self.chain.joints;

        joints[index].local_rotation = (delta * joints[index].local_rotation).normalize();
        joints[index].global_rotation = match index {
            0 => joints[index].local_rotation,
            _ => joints[index - 1].global_rotation * joints[index].local_rotation,
        };

        let mut cumulative = joints[index].global_rotation;
        for j in index + 1..joints.len() {
            let previous = joints[j - 1];
            joints[j].position =
                previous.position + cumulative * Vec3::new(previous.bone_length, 0.0, 0.0);
            joints[j].local_rotation = delta * joints[j].local_rotation;
            joints[j].global_rotation = cumulative * joints[j].local_rotation;
            cumulative = joints[j].global_rotation;
        }
    }

    fn apply_rigid(&mut self, index: usize, delta: Quat) {
        let joints = &mut self.chain.joints;

        joints[index].global_rotation = (delta * joints[index].global_rotation).normalize();
        joints[index].local_rotation = match index {
            0 => joints[index].global_rotation,
            _ => (joints[index - 1].global_rotation.inverse() * joints[index].global_rotation)
                .normalize(),
        };

        for j in index + 1..joints.len() {
            let previous = joints[j - 1];
            joints[j].position = previous.tip();
            joints[j].global_rotation = (delta * joints[j].global_rotation).normalize();
        }
    }
}
