//! WebGPU debug view
//!
//! Window surface, orbit camera with plane picking, and a renderer that
//! draws one [`FrameSnapshot`](crate::sim::FrameSnapshot) per frame.

pub mod camera;
pub mod context;
pub mod debug;
pub mod mesh;
pub mod pipeline;

pub use camera::{screen_to_ndc, Camera, OrbitController, Ray};
pub use context::{GpuContext, GpuError};
pub use debug::DebugRenderer;
pub use mesh::{Geometry, Mesh};
pub use pipeline::RenderPipelines;
