use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Quat, Vec3};
use std::f32::consts::PI;

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

impl Vertex {
    pub const LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &[
            wgpu::VertexAttribute {
                offset: 0,
                shader_location: 0,
                format: wgpu::VertexFormat::Float32x3,
            },
            wgpu::VertexAttribute {
                offset: std::mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                shader_location: 1,
                format: wgpu::VertexFormat::Float32x3,
            },
        ],
    };

    fn new(position: Vec3, normal: Vec3) -> Self {
        Self {
            position: position.to_array(),
            normal: normal.to_array(),
        }
    }
}

/// CPU-side triangle list, before upload.
#[derive(Debug, Clone, Default)]
pub struct Geometry {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl Geometry {
    /// UV sphere centred on the origin.
    pub fn sphere(radius: f32, segments: u32, rings: u32) -> Self {
        let mut geometry = Self::default();

        for ring in 0..=rings {
            let phi = PI * ring as f32 / rings as f32;
            for seg in 0..=segments {
                let theta = 2.0 * PI * seg as f32 / segments as f32;
                let normal = Vec3::new(phi.sin() * theta.cos(), phi.cos(), phi.sin() * theta.sin());
                geometry.vertices.push(Vertex::new(normal * radius, normal));
            }
        }

        let stride = segments + 1;
        for ring in 0..rings {
            for seg in 0..segments {
                let current = ring * stride + seg;
                let next = current + stride;
                geometry
                    .indices
                    .extend_from_slice(&[current, next, current + 1, current + 1, next, next + 1]);
            }
        }

        geometry
    }

    /// Octahedral bone from the origin to `(1, 0, 0)`, widest at `neck`
    /// along the shaft, with flat-shaded faces.
    pub fn bone(neck: f32, width: f32) -> Self {
        let head = Vec3::ZERO;
        let tail = Vec3::X;
        let ring = [
            Vec3::new(neck, width, 0.0),
            Vec3::new(neck, 0.0, width),
            Vec3::new(neck, -width, 0.0),
            Vec3::new(neck, 0.0, -width),
        ];

        let mut geometry = Self::default();
        for i in 0..ring.len() {
            let a = ring[i];
            let b = ring[(i + 1) % ring.len()];
            geometry.push_triangle(head, b, a);
            geometry.push_triangle(tail, a, b);
        }
        geometry
    }

    fn push_triangle(&mut self, a: Vec3, b: Vec3, c: Vec3) {
        let normal = (b - a).cross(c - a).normalize_or_zero();
        let base = self.vertices.len() as u32;
        self.vertices
            .extend([a, b, c].into_iter().map(|p| Vertex::new(p, normal)));
        self.indices.extend_from_slice(&[base, base + 1, base + 2]);
    }
}

/// Model matrix placing a unit +X mesh between `start` and `end`, with its
/// cross-section scaled by the segment length.
pub fn bone_transform(start: Vec3, end: Vec3) -> Mat4 {
    let offset = end - start;
    let length = offset.length();
    let rotation = offset
        .try_normalize()
        .map(|dir| Quat::from_rotation_arc(Vec3::X, dir))
        .unwrap_or(Quat::IDENTITY);

    Mat4::from_scale_rotation_translation(Vec3::splat(length), rotation, start)
}

pub struct Mesh {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub index_count: u32,
}

impl Mesh {
    pub fn upload(device: &wgpu::Device, label: &str, geometry: &Geometry) -> Self {
        use wgpu::util::DeviceExt;

        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label} Vertices")),
            contents: bytemuck::cast_slice(&geometry.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label} Indices")),
            contents: bytemuck::cast_slice(&geometry.indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        Self {
            vertex_buffer,
            index_buffer,
            index_count: geometry.indices.len() as u32,
        }
    }

    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>) {
        pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        pass.draw_indexed(0..self.index_count, 0, 0..1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sphere_vertices_lie_on_radius() {
        let sphere = Geometry::sphere(2.0, 8, 6);
        assert_eq!(sphere.vertices.len(), 9 * 7);
        assert_eq!(sphere.indices.len(), 8 * 6 * 6);
        for v in &sphere.vertices {
            assert!((Vec3::from(v.position).length() - 2.0).abs() < 1e-5);
        }
        assert!(sphere.indices.iter().all(|&i| (i as usize) < sphere.vertices.len()));
    }

    #[test]
    fn bone_normals_point_outward() {
        let bone = Geometry::bone(0.2, 0.1);
        assert_eq!(bone.indices.len(), 24);

        let centre = Vec3::new(0.2, 0.0, 0.0);
        for triangle in bone.vertices.chunks(3) {
            let face_centre = triangle
                .iter()
                .map(|v| Vec3::from(v.position))
                .sum::<Vec3>()
                / 3.0;
            let normal = Vec3::from(triangle[0].normal);
            assert!(normal.dot(face_centre - centre) > 0.0);
        }
    }

    #[test]
    fn bone_transform_spans_segment() {
        let start = Vec3::new(1.0, 2.0, 0.0);
        let end = Vec3::new(1.0, 2.0, -3.0);
        let model = bone_transform(start, end);

        assert!(model.transform_point3(Vec3::ZERO).abs_diff_eq(start, 1e-5));
        assert!(model.transform_point3(Vec3::X).abs_diff_eq(end, 1e-5));
    }

    #[test]
    fn degenerate_bone_transform_collapses() {
        let model = bone_transform(Vec3::ONE, Vec3::ONE);
        assert!(model.transform_point3(Vec3::X).abs_diff_eq(Vec3::ONE, 1e-6));
    }
}
