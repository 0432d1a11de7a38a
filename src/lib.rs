//! # ccd-rig
//!
//! Cyclic coordinate descent (CCD) inverse kinematics on a single joint
//! chain, next to a keyframe-animated bone hierarchy, with a WebGPU debug
//! view.
//!
//! ## Features
//! - CCD solver with configurable locked tail, alignment cutoff and
//!   propagation mode
//! - Position/rotation/scale keyframe tracks with lerp/slerp sampling
//! - Index-arena skeleton with top-down global transform propagation
//! - Eased ping-pong and spring-driven IK targets
//! - Frame snapshots consumed by the renderer
//!
//! ## Example
//! ```rust
//! use ccd_rig::ik::{CcdSolver, IkChain, SolverConfig};
//! use glam::Vec3;
//!
//! let chain = IkChain::builder()
//!     .add_joint(Vec3::ZERO)
//!     .add_joint(Vec3::new(0.5, 0.0, 0.0))
//!     .add_joint(Vec3::new(1.0, 0.0, 0.0))
//!     .add_joint(Vec3::new(1.5, 0.0, 0.0))
//!     .build();
//!
//! let mut solver = CcdSolver::new(chain, SolverConfig::default().locked_tail(0));
//! solver.set_target(Vec3::new(1.2, 0.3, 0.0));
//! let result = solver.solve();
//! println!("converged: {}, iterations: {}", result.converged, result.iterations);
//! ```

pub mod animation;
pub mod dynamics;
pub mod error;
pub mod ik;
pub mod math;
pub mod render;
pub mod sim;
pub mod skeleton;

pub use animation::{AnimationDriver, AnimationSource, BoneChannel, ClipSource, KeyframeTrack};
pub use dynamics::{SpringPreset, SpringTarget};
pub use error::{Error, Result};
pub use ik::{CcdSolver, IkChain, IkJoint, Propagation, SolveResult, SolverConfig};
pub use math::Transform;
pub use sim::{FrameSnapshot, SimulationConfig, SimulationContext, TargetMode};
pub use skeleton::{Bone, BoneId, Skeleton};
