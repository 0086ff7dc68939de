use bytemuck::{Pod, Zeroable};
use glam::{Quat, Vec2, Vec3};
use std::f32::consts::{PI, TAU};
use wgpu::util::DeviceExt;

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl MeshVertex {
    fn new(position: Vec3, normal: Vec3, uv: Vec2) -> Self {
        Self {
            position: position.to_array(),
            normal: normal.to_array(),
            uv: uv.to_array(),
        }
    }

    pub const ATTRIBUTES: [wgpu::VertexAttribute; 3] = wgpu::vertex_attr_array![
        0 => Float32x3,
        1 => Float32x3,
        2 => Float32x2,
    ];

    /// Position and uv only, at the locations the viewport quad's vertex
    /// stage declares.
    pub const QUAD_ATTRIBUTES: [wgpu::VertexAttribute; 2] = [
        wgpu::VertexAttribute {
            format: wgpu::VertexFormat::Float32x3,
            offset: 0,
            shader_location: 0,
        },
        wgpu::VertexAttribute {
            format: wgpu::VertexFormat::Float32x2,
            offset: 24,
            shader_location: 1,
        },
    ];
}

/// CPU-side indexed triangle list.
#[derive(Debug, Clone, Default)]
pub struct MeshData {
    pub vertices: Vec<MeshVertex>,
    pub indices: Vec<u32>,
}

impl MeshData {
    /// Rotate then translate every vertex. Scene objects are static, so their
    /// transforms are baked in once.
    pub fn transformed(mut self, rotation: Quat, translation: Vec3) -> Self {
        for v in &mut self.vertices {
            v.position = (rotation * Vec3::from(v.position) + translation).to_array();
            v.normal = (rotation * Vec3::from(v.normal)).normalize().to_array();
        }
        self
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// Flat disk in the XY plane facing +Z, as a triangle fan around the centre.
pub fn circle(radius: f32, segments: u32) -> MeshData {
    let segments = segments.max(3);
    let mut vertices = Vec::with_capacity(segments as usize + 2);
    vertices.push(MeshVertex::new(Vec3::ZERO, Vec3::Z, Vec2::splat(0.5)));

    for i in 0..=segments {
        let angle = i as f32 / segments as f32 * TAU;
        let (s, c) = angle.sin_cos();
        vertices.push(MeshVertex::new(
            Vec3::new(radius * c, radius * s, 0.0),
            Vec3::Z,
            Vec2::new((c + 1.0) * 0.5, (s + 1.0) * 0.5),
        ));
    }

    let indices = (1..=segments).flat_map(|i| [0, i, i + 1]).collect();
    MeshData { vertices, indices }
}

/// UV sphere centred on the origin.
pub fn uv_sphere(radius: f32, width_segments: u32, height_segments: u32) -> MeshData {
    let ws = width_segments.max(3);
    let hs = height_segments.max(2);
    let mut vertices = Vec::with_capacity(((ws + 1) * (hs + 1)) as usize);

    for y in 0..=hs {
        let v = y as f32 / hs as f32;
        let theta = v * PI;
        for x in 0..=ws {
            let u = x as f32 / ws as f32;
            let phi = u * TAU;
            let normal = Vec3::new(
                -phi.cos() * theta.sin(),
                theta.cos(),
                phi.sin() * theta.sin(),
            );
            vertices.push(MeshVertex::new(normal * radius, normal, Vec2::new(u, v)));
        }
    }

    let row = ws + 1;
    let mut indices = Vec::with_capacity((ws * hs * 6) as usize);
    for y in 0..hs {
        for x in 0..ws {
            let a = y * row + x + 1;
            let b = y * row + x;
            let c = (y + 1) * row + x;
            let d = (y + 1) * row + x + 1;
            // Poles collapse to a single triangle.
            if y != 0 {
                indices.extend_from_slice(&[a, b, d]);
            }
            if y != hs - 1 {
                indices.extend_from_slice(&[b, c, d]);
            }
        }
    }

    MeshData { vertices, indices }
}

/// Rectangle in the XY plane facing +Z. `uv` (0, 0) is the top-left corner.
pub fn plane(width: f32, height: f32) -> MeshData {
    let (hw, hh) = (width * 0.5, height * 0.5);
    #[rustfmt::skip]
    let vertices = vec![
        MeshVertex::new(Vec3::new(-hw,  hh, 0.0), Vec3::Z, Vec2::new(0.0, 0.0)),
        MeshVertex::new(Vec3::new( hw,  hh, 0.0), Vec3::Z, Vec2::new(1.0, 0.0)),
        MeshVertex::new(Vec3::new(-hw, -hh, 0.0), Vec3::Z, Vec2::new(0.0, 1.0)),
        MeshVertex::new(Vec3::new( hw, -hh, 0.0), Vec3::Z, Vec2::new(1.0, 1.0)),
    ];
    MeshData {
        vertices,
        indices: vec![0, 2, 1, 2, 3, 1],
    }
}

/// Mesh uploaded to GPU buffers.
pub struct GpuMesh {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub index_count: u32,
}

impl GpuMesh {
    pub fn upload(device: &wgpu::Device, label: &str, mesh: &MeshData) -> Self {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label}_vertex_buffer")),
            contents: bytemuck::cast_slice(&mesh.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label}_index_buffer")),
            contents: bytemuck::cast_slice(&mesh.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        Self {
            vertex_buffer,
            index_buffer,
            index_count: mesh.indices.len() as u32,
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

    fn indices_in_bounds(mesh: &MeshData) -> bool {
        mesh.indices
            .iter()
            .all(|&i| (i as usize) < mesh.vertices.len())
    }

    #[test]
    fn vertex_layout_is_tightly_packed() {
        assert_eq!(std::mem::size_of::<MeshVertex>(), 32);
        assert_eq!(MeshVertex::QUAD_ATTRIBUTES[1].offset, 24);
    }

    #[test]
    fn circle_fan() {
        let mesh = circle(5.0, 32);
        assert_eq!(mesh.vertices.len(), 34);
        assert_eq!(mesh.triangle_count(), 32);
        assert!(indices_in_bounds(&mesh));
        for v in &mesh.vertices[1..] {
            let r = Vec2::new(v.position[0], v.position[1]).length();
            assert!((r - 5.0).abs() < 1e-4);
        }
    }

    #[test]
    fn ground_lies_flat_facing_up() {
        let ground = circle(5.0, 32).transformed(Quat::from_rotation_x(-PI / 2.0), Vec3::ZERO);
        for v in &ground.vertices {
            assert!(v.position[1].abs() < 1e-5);
            assert!((Vec3::from(v.normal) - Vec3::Y).length() < 1e-5);
        }
    }

    #[test]
    fn sphere_vertices_on_surface() {
        let mesh = uv_sphere(0.5, 32, 16);
        assert_eq!(mesh.vertices.len(), 33 * 17);
        assert_eq!(mesh.triangle_count(), 32 * 16 * 2 - 2 * 32);
        assert!(indices_in_bounds(&mesh));
        for v in &mesh.vertices {
            assert!((Vec3::from(v.position).length() - 0.5).abs() < 1e-5);
            assert!((Vec3::from(v.normal).length() - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn translated_plane() {
        let quad = plane(2.0, 2.0).transformed(Quat::IDENTITY, Vec3::new(0.0, 1.0, 1.0));
        assert_eq!(quad.triangle_count(), 2);
        let min_y = quad.vertices.iter().map(|v| v.position[1]).fold(f32::MAX, f32::min);
        let max_y = quad.vertices.iter().map(|v| v.position[1]).fold(f32::MIN, f32::max);
        assert_eq!((min_y, max_y), (0.0, 2.0));
        assert!(quad.vertices.iter().all(|v| v.position[2] == 1.0));
    }
}
