use super::camera::Camera;
use super::context::GpuContext;
use super::mesh::{bone_transform, Geometry, Mesh};
use super::pipeline::{RenderPipelines, Uniforms};
use crate::sim::FrameSnapshot;
use glam::{Mat4, Vec3};

const MAX_INSTANCES: usize = 256;

const ROOT_COLOR: [f32; 4] = [0.2, 0.8, 0.2, 1.0];
const JOINT_COLOR: [f32; 4] = [0.3, 0.5, 0.9, 1.0];
const SEGMENT_COLOR: [f32; 4] = [0.6, 0.6, 0.7, 1.0];
const EFFECTOR_COLOR: [f32; 4] = [0.9, 0.8, 0.2, 1.0];
const TARGET_COLOR: [f32; 4] = [1.0, 0.2, 0.2, 1.0];
const SKELETON_COLOR: [f32; 4] = [0.8, 0.5, 0.3, 1.0];

#[derive(Clone, Copy)]
enum Shape {
    Sphere,
    Bone,
}

/// Instances for one frame, each with its uniforms at an aligned offset.
struct DrawList {
    view_proj: [[f32; 4]; 4],
    aligned_size: usize,
    data: Vec<u8>,
    calls: Vec<(Shape, u32)>,
}

impl DrawList {
    fn new(view_proj: Mat4, aligned_size: usize) -> Self {
        Self {
            view_proj: view_proj.to_cols_array_2d(),
            aligned_size,
            data: vec![0u8; aligned_size * MAX_INSTANCES],
            calls: Vec::new(),
        }
    }

    fn push(&mut self, shape: Shape, model: Mat4, color: [f32; 4]) {
        if self.calls.len() >= MAX_INSTANCES {
            return;
        }
        let uniforms = Uniforms {
            view_proj: self.view_proj,
            model: model.to_cols_array_2d(),
            color,
        };
        let offset = self.calls.len() * self.aligned_size;
        let bytes = bytemuck::bytes_of(&uniforms);
        self.data[offset..offset + bytes.len()].copy_from_slice(bytes);
        self.calls.push((shape, offset as u32));
    }

    fn sphere(&mut self, center: Vec3, radius: f32, color: [f32; 4]) {
        let model = Mat4::from_translation(center) * Mat4::from_scale(Vec3::splat(radius));
        self.push(Shape::Sphere, model, color);
    }

    fn bone(&mut self, start: Vec3, end: Vec3, color: [f32; 4]) {
        if start.distance_squared(end) > 1e-10 {
            self.push(Shape::Bone, bone_transform(start, end), color);
        }
    }
}

/// Draws a [`FrameSnapshot`]: the IK chain, its target, and the skeleton.
pub struct DebugRenderer {
    pipelines: RenderPipelines,
    sphere_mesh: Mesh,
    bone_mesh: Mesh,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    uniform_alignment: u32,
}

impl DebugRenderer {
    pub fn new(context: &GpuContext) -> Self {
        let pipelines = RenderPipelines::new(context);
        let sphere_mesh = Mesh::upload(&context.device, "Sphere", &Geometry::sphere(1.0, 16, 12));
        let bone_mesh = Mesh::upload(&context.device, "Bone", &Geometry::bone(0.15, 0.08));

        let uniform_alignment = context.device.limits().min_uniform_buffer_offset_alignment;
        let aligned_size = align_to(std::mem::size_of::<Uniforms>() as u32, uniform_alignment);

        let uniform_buffer = context.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Dynamic Uniform Buffer"),
            size: (aligned_size as usize * MAX_INSTANCES) as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group = pipelines.create_dynamic_bind_group(&context.device, &uniform_buffer);

        Self {
            pipelines,
            sphere_mesh,
            bone_mesh,
            uniform_buffer,
            bind_group,
            uniform_alignment,
        }
    }

    fn build_draw_list(&self, frame: &FrameSnapshot, camera: &Camera) -> DrawList {
        let aligned_size = align_to(std::mem::size_of::<Uniforms>() as u32, self.uniform_alignment);
        let mut list = DrawList::new(camera.view_projection(), aligned_size as usize);

        for (i, joint) in frame.joints.iter().enumerate() {
            let color = if i == 0 { ROOT_COLOR } else { JOINT_COLOR };
            list.sphere(joint.position, 0.05, color);
            list.bone(joint.position, joint.tip(), SEGMENT_COLOR);
        }
        list.sphere(frame.end_effector, 0.04, EFFECTOR_COLOR);
        list.sphere(frame.target, 0.07, TARGET_COLOR);

        for bone in &frame.bones {
            let position = bone.position();
            list.sphere(position, 0.03, SKELETON_COLOR);
            if let Some(parent) = bone.parent.and_then(|p| frame.bones.get(p.index())) {
                list.bone(parent.position(), position, SKELETON_COLOR);
            }
        }

        list
    }

    pub fn render(
        &self,
        context: &GpuContext,
        view: &wgpu::TextureView,
        frame: &FrameSnapshot,
        camera: &Camera,
    ) {
        let list = self.build_draw_list(frame, camera);
        context.queue.write_buffer(&self.uniform_buffer, 0, &list.data);

        let mut encoder = context
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Debug Encoder"),
            });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Debug Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: 0.1,
                            g: 0.1,
                            b: 0.15,
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &context.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            pass.set_pipeline(&self.pipelines.pipeline);
            for &(shape, offset) in &list.calls {
                pass.set_bind_group(0, &self.bind_group, &[offset]);
                match shape {
                    Shape::Sphere => self.sphere_mesh.draw(&mut pass),
                    Shape::Bone => self.bone_mesh.draw(&mut pass),
                }
            }
        }

        context.queue.submit(std::iter::once(encoder.finish()));
    }
}

fn align_to(size: u32, alignment: u32) -> u32 {
    (size + alignment - 1) & !(alignment - 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alignment_rounds_up_to_power_of_two() {
        assert_eq!(align_to(144, 256), 256);
        assert_eq!(align_to(256, 256), 256);
        assert_eq!(align_to(257, 256), 512);
    }

    #[test]
    fn draw_list_caps_instances() {
        let mut list = DrawList::new(Mat4::IDENTITY, 256);
        for _ in 0..MAX_INSTANCES + 10 {
            list.sphere(Vec3::ZERO, 1.0, TARGET_COLOR);
        }
        assert_eq!(list.calls.len(), MAX_INSTANCES);
        assert_eq!(list.calls[1].1, 256);
    }
}
