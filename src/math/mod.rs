//! Math utilities module
//!
//! Re-exports the glam types used across the crate plus the bone [`Transform`].

mod transform;

pub use transform::Transform;

pub use glam::{Mat4, Quat, Vec3, Vec4};
