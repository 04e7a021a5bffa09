//! glTF binary import: flattens the node hierarchy into model-space meshes carrying
//! the node name, so hotspots can be matched by the names authored in the model.

use glam::{Mat4, Vec3};

use crate::assets::texture::ImageData;
use crate::error::AssetError;
use crate::utils::{Mesh, Vertex};

#[derive(Debug, Clone)]
pub struct ModelNode {
    pub name: String,
    /// Node-to-model transform (vertices stay in mesh space).
    pub transform: Mat4,
    pub mesh: Mesh,
    pub base_color: [f32; 4],
    pub metallic: f32,
    pub roughness: f32,
    /// Index into [`ModelData::images`].
    pub texture: Option<usize>,
}

#[derive(Debug, Clone, Default)]
pub struct ModelData {
    pub nodes: Vec<ModelNode>,
    pub images: Vec<Option<ImageData>>,
}

impl ModelData {
    pub fn image_for(&self, node: &ModelNode) -> Option<&ImageData> {
        node.texture.and_then(|i| self.images.get(i)).and_then(Option::as_ref)
    }
}

pub fn parse_glb(path: &str, bytes: &[u8]) -> Result<ModelData, AssetError> {
    let (doc, buffers, images) = gltf::import_slice(bytes).map_err(|source| AssetError::Gltf {
        path: path.to_string(),
        source,
    })?;

    let mut model = ModelData {
        nodes: Vec::new(),
        images: images.iter().map(|img| convert_image(path, img)).collect(),
    };

    let Some(scene) = doc.default_scene().or_else(|| doc.scenes().next()) else {
        tracing::warn!(path, "glTF has no scenes");
        return Ok(model);
    };

    for node in scene.nodes() {
        visit_node(&node, Mat4::IDENTITY, &buffers, &mut model);
    }

    tracing::info!(path, nodes = model.nodes.len(), "model parsed");
    Ok(model)
}

fn visit_node(node: &gltf::Node, parent: Mat4, buffers: &[gltf::buffer::Data], model: &mut ModelData) {
    let transform = parent * Mat4::from_cols_array_2d(&node.transform().matrix());

    if let Some(mesh) = node.mesh() {
        let name = node
            .name()
            .or_else(|| mesh.name())
            .unwrap_or_default()
            .to_string();

        for prim in mesh.primitives() {
            let Some(cpu_mesh) = read_primitive(&prim, buffers) else {
                continue;
            };
            let pbr = prim.material().pbr_metallic_roughness();
            model.nodes.push(ModelNode {
                name: name.clone(),
                transform,
                mesh: cpu_mesh,
                base_color: pbr.base_color_factor(),
                metallic: pbr.metallic_factor(),
                roughness: pbr.roughness_factor(),
                texture: pbr.base_color_texture().map(|info| info.texture().source().index()),
            });
        }
    }

    for child in node.children() {
        visit_node(&child, transform, buffers, model);
    }
}

fn read_primitive(prim: &gltf::Primitive, buffers: &[gltf::buffer::Data]) -> Option<Mesh> {
    if prim.mode() != gltf::mesh::Mode::Triangles {
        return None;
    }
    let reader = prim.reader(|buffer| buffers.get(buffer.index()).map(|d| d.0.as_slice()));

    let positions: Vec<[f32; 3]> = reader.read_positions()?.collect();
    let normals: Vec<[f32; 3]> = reader
        .read_normals()
        .map(|n| n.collect())
        .unwrap_or_default();
    let uvs: Vec<[f32; 2]> = reader
        .read_tex_coords(0)
        .map(|t| t.into_f32().collect())
        .unwrap_or_default();
    let indices: Vec<u32> = match reader.read_indices() {
        Some(indices) => indices.into_u32().collect(),
        None => (0..positions.len() as u32).collect(),
    };

    let mut mesh = Mesh {
        vertices: positions
            .iter()
            .enumerate()
            .map(|(i, pos)| Vertex {
                pos: *pos,
                normal: normals.get(i).copied().unwrap_or([0.0, 1.0, 0.0]),
                uv: uvs.get(i).copied().unwrap_or([0.0, 0.0]),
            })
            .collect(),
        indices,
    };
    if normals.is_empty() {
        compute_flat_normals(&mut mesh);
    }
    (!mesh.is_empty()).then_some(mesh)
}

/// Fallback for primitives exported without normals.
fn compute_flat_normals(mesh: &mut Mesh) {
    let mut acc = vec![Vec3::ZERO; mesh.vertices.len()];
    for tri in mesh.indices.chunks_exact(3) {
        let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
        let (pa, pb, pc) = (
            Vec3::from(mesh.vertices[a].pos),
            Vec3::from(mesh.vertices[b].pos),
            Vec3::from(mesh.vertices[c].pos),
        );
        let n = (pb - pa).cross(pc - pa);
        acc[a] += n;
        acc[b] += n;
        acc[c] += n;
    }
    for (v, n) in mesh.vertices.iter_mut().zip(acc) {
        v.normal = n.normalize_or_zero().to_array();
    }
}

fn convert_image(path: &str, img: &gltf::image::Data) -> Option<ImageData> {
    use gltf::image::Format;

    let pixels = match img.format {
        Format::R8G8B8A8 => img.pixels.clone(),
        Format::R8G8B8 => img
            .pixels
            .chunks_exact(3)
            .flat_map(|p| [p[0], p[1], p[2], 255])
            .collect(),
        Format::R8 => img.pixels.iter().flat_map(|&l| [l, l, l, 255]).collect(),
        other => {
            tracing::warn!(path, ?other, "unsupported embedded texture format, using base colour");
            return None;
        }
    };
    Some(ImageData { width: img.width, height: img.height, pixels, srgb: true })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_gltf_bytes() {
        let err = parse_glb("models/bad.glb", b"definitely not glTF").unwrap_err();
        assert!(matches!(err, AssetError::Gltf { .. }));
        assert_eq!(err.path(), "models/bad.glb");
    }

    #[test]
    fn flat_normals_follow_winding() {
        let mut mesh = Mesh::plane(1.0, 1.0);
        for v in mesh.vertices.iter_mut() {
            v.normal = [0.0; 3];
        }
        compute_flat_normals(&mut mesh);
        assert!(mesh.vertices.iter().all(|v| (v.normal[2] - 1.0).abs() < 1e-5));
    }
}
