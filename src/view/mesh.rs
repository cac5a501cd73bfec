use std::collections::HashMap;

use bytemuck::NoUninit;
use glam::Vec3;
use wgpu::util::DeviceExt;

#[repr(C)]
#[derive(Debug, Clone, Copy, NoUninit)]
pub struct Vertex {
    pub pos: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl Vertex {
    pub const ATTRIBUTES: [wgpu::VertexAttribute; 3] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3, 2 => Float32x2];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

pub struct MeshBuffer {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub index_count: u32,
}

#[derive(Debug, Clone)]
pub struct Mesh {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl Mesh {
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() && self.indices.is_empty()
    }

    pub fn upload(&self, device: &wgpu::Device, label: &str) -> MeshBuffer {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label} vertex buffer")),
            contents: bytemuck::cast_slice(&self.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label} index buffer")),
            contents: bytemuck::cast_slice(&self.indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        MeshBuffer {
            vertex_buffer,
            index_buffer,
            index_count: self.indices.len() as u32,
        }
    }
}

/// Cube spanning -1..1 on every axis, four vertices per face so each face
/// gets its own normal and a full 0..1 texture square.
pub fn create_cube_mesh() -> Mesh {
    // (normal, tangent u, tangent v)
    let faces = [
        (Vec3::X, Vec3::NEG_Z, Vec3::Y),
        (Vec3::NEG_X, Vec3::Z, Vec3::Y),
        (Vec3::Y, Vec3::X, Vec3::NEG_Z),
        (Vec3::NEG_Y, Vec3::X, Vec3::Z),
        (Vec3::Z, Vec3::X, Vec3::Y),
        (Vec3::NEG_Z, Vec3::NEG_X, Vec3::Y),
    ];

    let mut vertices = Vec::with_capacity(24);
    let mut indices = Vec::with_capacity(36);
    for (normal, u, v) in faces {
        let base = vertices.len() as u32;
        for (su, sv) in [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)] {
            let pos = normal + u * su + v * sv;
            vertices.push(Vertex {
                pos: pos.to_array(),
                normal: normal.to_array(),
                uv: [(su + 1.0) * 0.5, (1.0 - sv) * 0.5],
            });
        }
        indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }

    Mesh { vertices, indices }
}

/// Unit sphere built by recursively splitting a tetrahedron's faces and
/// pushing the new midpoints onto the sphere.
pub fn create_subdivision_sphere(levels: u32) -> Mesh {
    let mut points: Vec<Vec3> = vec![
        Vec3::new(0.0, 0.0, -1.0),
        Vec3::new(0.0, 0.9428, 0.3333),
        Vec3::new(-0.8165, -0.4714, 0.3333),
        Vec3::new(0.8165, -0.4714, 0.3333),
    ]
    .into_iter()
    .map(Vec3::normalize)
    .collect();
    let mut triangles: Vec<[u32; 3]> = vec![[0, 1, 2], [3, 2, 1], [1, 0, 3], [0, 2, 3]];

    for _ in 0..levels {
        let mut midpoints: HashMap<(u32, u32), u32> = HashMap::new();
        let mut midpoint = |a: u32, b: u32, points: &mut Vec<Vec3>| -> u32 {
            let key = (a.min(b), a.max(b));
            *midpoints.entry(key).or_insert_with(|| {
                let m = (points[a as usize] + points[b as usize]).normalize();
                points.push(m);
                points.len() as u32 - 1
            })
        };

        let mut next = Vec::with_capacity(triangles.len() * 4);
        for [a, b, c] in triangles {
            let ab = midpoint(a, b, &mut points);
            let bc = midpoint(b, c, &mut points);
            let ca = midpoint(c, a, &mut points);
            next.extend_from_slice(&[[a, ab, ca], [ab, b, bc], [ca, bc, c], [ab, bc, ca]]);
        }
        triangles = next;
    }

    let vertices = points
        .iter()
        .map(|p| Vertex {
            pos: p.to_array(),
            normal: p.to_array(),
            uv: [
                p.x.clamp(-1.0, 1.0).asin() / std::f32::consts::PI + 0.5,
                p.y.clamp(-1.0, 1.0).asin() / std::f32::consts::PI + 0.5,
            ],
        })
        .collect();
    let indices = triangles.into_iter().flatten().collect();

    Mesh { vertices, indices }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cube_mesh_faces_point_outward() {
        let cube = create_cube_mesh();
        assert_eq!(cube.vertices.len(), 24);
        assert_eq!(cube.indices.len(), 36);
        for v in &cube.vertices {
            let p = Vec3::from_array(v.pos);
            let n = Vec3::from_array(v.normal);
            assert_eq!(p.abs().max_element(), 1.0);
            assert_eq!(p.dot(n), 1.0);
            assert!(v.uv.iter().all(|c| (0.0..=1.0).contains(c)));
        }
    }

    #[test]
    fn test_cube_triangles_wind_counter_clockwise_from_outside() {
        let cube = create_cube_mesh();
        for tri in cube.indices.chunks(3) {
            let [a, b, c] = [tri[0], tri[1], tri[2]].map(|i| Vec3::from_array(cube.vertices[i as usize].pos));
            let n = Vec3::from_array(cube.vertices[tri[0] as usize].normal);
            assert!((b - a).cross(c - a).dot(n) > 0.0);
        }
    }

    #[test]
    fn test_subdivision_sphere_counts_and_radius() {
        let sphere = create_subdivision_sphere(4);
        // 4 * 4^n faces, 2 + 2 * 4^n vertices
        assert_eq!(sphere.indices.len(), 3 * 4 * 256);
        assert_eq!(sphere.vertices.len(), 2 + 2 * 256);
        for v in &sphere.vertices {
            assert!((Vec3::from_array(v.pos).length() - 1.0).abs() < 1e-5);
            assert_eq!(v.pos, v.normal);
        }
    }

    #[test]
    fn test_sphere_level_zero_is_tetrahedron() {
        let sphere = create_subdivision_sphere(0);
        assert_eq!(sphere.vertices.len(), 4);
        assert_eq!(sphere.indices.len(), 12);
        assert!(!sphere.is_empty());
    }
}
