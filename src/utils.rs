use glam::{Mat4, Vec3};
use wgpu::util::DeviceExt;
use bytemuck::{Pod, Zeroable};

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub pos: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl Vertex {
    pub const ATTRIBUTES: [wgpu::VertexAttribute; 3] = wgpu::vertex_attr_array![
        0 => Float32x3,
        1 => Float32x3,
        2 => Float32x2,
    ];

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

#[derive(Debug, Clone, Default)]
pub struct Mesh {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl Mesh {
    pub fn empty() -> Self {
        Self {
            vertices: Vec::new(),
            indices: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() || self.indices.is_empty()
    }

    /// Flat rectangle in the XY plane facing +Z, centred on the origin.
    pub fn plane(width: f32, height: f32) -> Self {
        let (hw, hh) = (width * 0.5, height * 0.5);
        let n = [0.0, 0.0, 1.0];
        let vertices = vec![
            Vertex { pos: [-hw, hh, 0.0], normal: n, uv: [0.0, 0.0] },
            Vertex { pos: [hw, hh, 0.0], normal: n, uv: [1.0, 0.0] },
            Vertex { pos: [-hw, -hh, 0.0], normal: n, uv: [0.0, 1.0] },
            Vertex { pos: [hw, -hh, 0.0], normal: n, uv: [1.0, 1.0] },
        ];
        let indices = vec![0, 2, 1, 2, 3, 1];
        Self { vertices, indices }
    }

    /// Axis-aligned box centred on the origin.
    pub fn cuboid(width: f32, height: f32, depth: f32) -> Self {
        let h = Vec3::new(width, height, depth) * 0.5;
        // (normal, u axis, v axis) for each face
        let faces = [
            (Vec3::X, Vec3::NEG_Z, Vec3::Y),
            (Vec3::NEG_X, Vec3::Z, Vec3::Y),
            (Vec3::Y, Vec3::X, Vec3::NEG_Z),
            (Vec3::NEG_Y, Vec3::X, Vec3::Z),
            (Vec3::Z, Vec3::X, Vec3::Y),
            (Vec3::NEG_Z, Vec3::NEG_X, Vec3::Y),
        ];

        let mut mesh = Mesh::empty();
        for (normal, u, v) in faces {
            let base = mesh.vertices.len() as u32;
            let centre = normal * h;
            let du = u * h;
            let dv = v * h;
            for (su, sv, uv) in [
                (-1.0, 1.0, [0.0, 0.0]),
                (1.0, 1.0, [1.0, 0.0]),
                (-1.0, -1.0, [0.0, 1.0]),
                (1.0, -1.0, [1.0, 1.0]),
            ] {
                let p = centre + du * su + dv * sv;
                mesh.vertices.push(Vertex { pos: p.to_array(), normal: normal.to_array(), uv });
            }
            mesh.indices.extend_from_slice(&[base, base + 2, base + 1, base + 2, base + 3, base + 1]);
        }
        mesh
    }

    /// Bake a transform into the vertex data.
    pub fn transformed(mut self, m: Mat4) -> Self {
        let normal_m = m.inverse().transpose();
        for v in self.vertices.iter_mut() {
            v.pos = m.transform_point3(Vec3::from(v.pos)).to_array();
            v.normal = normal_m
                .transform_vector3(Vec3::from(v.normal))
                .normalize_or_zero()
                .to_array();
        }
        self
    }

    pub fn triangles(&self) -> impl Iterator<Item = [Vec3; 3]> + '_ {
        self.indices.chunks_exact(3).map(move |t| {
            [
                Vec3::from(self.vertices[t[0] as usize].pos),
                Vec3::from(self.vertices[t[1] as usize].pos),
                Vec3::from(self.vertices[t[2] as usize].pos),
            ]
        })
    }

    pub fn upload(&self, device: &wgpu::Device) -> MeshBuffer {
        let vertices = bytemuck::cast_slice(&self.vertices);
        let indices = bytemuck::cast_slice(&self.indices);

        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Mesh Vertex Buffer"),
            contents: vertices,
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Mesh Index Buffer"),
            contents: indices,
            usage: wgpu::BufferUsages::INDEX,
        });

        MeshBuffer {
            vertex_buffer,
            index_buffer,
            index_count: self.indices.len() as u32,
        }
    }
}

/// Parse `#rrggbb` into linear-space RGB.
pub fn hex_color(hex: &str) -> [f32; 3] {
    let hex = hex.trim_start_matches('#');
    let parse = |i: usize| {
        hex.get(i..i + 2)
            .and_then(|s| u8::from_str_radix(s, 16).ok())
            .unwrap_or(0)
    };
    [
        srgb_to_linear(parse(0)),
        srgb_to_linear(parse(2)),
        srgb_to_linear(parse(4)),
    ]
}

pub fn rgb_u32(rgb: u32) -> [f32; 3] {
    [
        srgb_to_linear(((rgb >> 16) & 0xff) as u8),
        srgb_to_linear(((rgb >> 8) & 0xff) as u8),
        srgb_to_linear((rgb & 0xff) as u8),
    ]
}

fn srgb_to_linear(c: u8) -> f32 {
    let c = c as f32 / 255.0;
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plane_faces_positive_z() {
        let mesh = Mesh::plane(4.0, 2.0);
        assert_eq!(mesh.vertices.len(), 4);
        assert_eq!(mesh.indices.len(), 6);
        for [a, b, c] in mesh.triangles() {
            let n = (b - a).cross(c - a).normalize();
            assert!((n - Vec3::Z).length() < 1e-5);
        }
    }

    #[test]
    fn cuboid_triangles_wind_outward() {
        let mesh = Mesh::cuboid(2.0, 2.0, 2.0);
        assert_eq!(mesh.indices.len(), 36);
        for [a, b, c] in mesh.triangles() {
            let n = (b - a).cross(c - a);
            let centre = (a + b + c) / 3.0;
            assert!(n.dot(centre) > 0.0);
        }
    }

    #[test]
    fn transformed_moves_vertices() {
        let mesh = Mesh::plane(1.0, 1.0).transformed(Mat4::from_translation(Vec3::new(0.0, 5.0, 0.0)));
        assert!(mesh.vertices.iter().all(|v| v.pos[1] > 4.0));
    }

    #[test]
    fn hex_colors_are_linearised() {
        assert_eq!(hex_color("#000000"), [0.0, 0.0, 0.0]);
        let white = hex_color("#ffffff");
        assert!(white.iter().all(|c| (c - 1.0).abs() < 1e-6));
        let cyan = rgb_u32(0x00ffff);
        assert_eq!(cyan[0], 0.0);
        assert!((cyan[2] - 1.0).abs() < 1e-6);
    }
}
