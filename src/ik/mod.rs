//! Inverse kinematics
//!
//! Single-chain cyclic coordinate descent. Joints carry their own segment
//! length and rotate about their position to swing the end effector onto a
//! target.

pub mod chain;
pub mod joint;
pub mod solver;

pub use chain::{ChainBuilder, IkChain};
pub use joint::{IkJoint, DEFAULT_BONE_LENGTH};
pub use solver::{CcdSolver, Propagation, SolveResult, SolverConfig};
