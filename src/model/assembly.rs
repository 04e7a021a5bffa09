//! Puts loaded assets into a [`Scene`] at their fixed places.

use std::collections::HashMap;
use std::f32::consts::{FRAC_PI_2, FRAC_PI_4};

use glam::{Mat4, Quat, Vec3};
use rand::Rng;

use crate::assets::font::{rasterize_text, TEXT_RASTER_PX};
use crate::assets::{LoadedAssets, ModelData};
use crate::config::{self, FloorMaterial};
use crate::model::panels;
use crate::model::particles::{sample_surface, seeded_rng, HologramCloud};
use crate::model::scene::{
    HologramRig, Material, PickRole, Scene, SceneObject, TextureId, Transform,
};
use crate::utils::{hex_color, rgb_u32, Mesh};

pub const SCREEN: &str = "screen";
pub const SCREEN_FRAME: &str = "screen_frame";
pub const MIRROR: &str = "mirror";
pub const FLOOR: &str = "floor";

struct Placement {
    transform: Transform,
    pick: PickRole,
    bloom: fn(&str) -> bool,
}

fn ramen_bloom(name: &str) -> bool {
    ["Object_8", "Object_4", "1142"].iter().any(|tag| name.contains(tag))
}

fn pole_bloom(name: &str) -> bool {
    name.contains("002")
}

pub fn floor_material(floor: &FloorMaterial) -> Material {
    let [r, g, b] = floor.color;
    Material::Physical {
        color: rgb_u32(u32::from_be_bytes([0, r, g, b])),
        roughness: floor.roughness,
        metalness: floor.metalness,
        clearcoat: floor.clearcoat,
        clearcoat_roughness: floor.clearcoat_roughness,
        opacity: config::FLOOR_OPACITY,
    }
}

/// Build the complete scene. `seed` drives hologram sampling and scatter.
pub fn assemble(assets: LoadedAssets, seed: u64) -> Scene {
    let mut scene = Scene::new();
    for (key, image) in assets.images {
        scene.textures.add(key, image);
    }

    if let Some(model) = &assets.ramen {
        add_model(
            &mut scene,
            model,
            Placement {
                transform: Transform::at(Vec3::new(0.0, -16.0, 0.0)).with_scale(0.2),
                pick: PickRole::None,
                bloom: ramen_bloom,
            },
        );
    }

    if let Some(model) = &assets.pole {
        add_model(
            &mut scene,
            model,
            Placement {
                transform: Transform::at(Vec3::new(-40.0, -16.0, 65.0))
                    .with_rotation(Quat::from_rotation_y(-FRAC_PI_4)),
                pick: PickRole::Hotspot,
                bloom: pole_bloom,
            },
        );
    }

    if let Some(model) = &assets.hologram {
        add_hologram(&mut scene, model, &mut seeded_rng(seed));
    }

    add_reflective_floor(&mut scene);
    add_screen(&mut scene);

    if let Some(font) = &assets.font {
        for (text, position) in [
            ("THE HUNGRY", Vec3::new(-3.0, 26.5, 23.5)),
            ("RAMEN", Vec3::new(0.0, 24.0, 23.5)),
        ] {
            add_title(&mut scene, font, text, position);
        }
    }

    panels::build_panels(&mut scene);

    tracing::info!(
        objects = scene.objects.len(),
        meshes = scene.meshes.len(),
        textures = scene.textures.len(),
        "scene assembled"
    );
    scene
}

fn add_model(scene: &mut Scene, model: &ModelData, placement: Placement) {
    let root = placement.transform.matrix();
    let mut textures: HashMap<usize, TextureId> = HashMap::new();

    for node in &model.nodes {
        let texture = node.texture.and_then(|index| {
            if let Some(id) = textures.get(&index).copied() {
                return Some(id);
            }
            let id = scene.textures.add_unnamed(model.image_for(node)?.clone());
            textures.insert(index, id);
            Some(id)
        });

        let mesh = scene.meshes.add(node.mesh.clone());
        let material = Material::Standard {
            color: node.base_color,
            texture,
            roughness: node.roughness,
            metalness: node.metallic,
        };
        scene.add_object(
            SceneObject::new(node.name.clone(), mesh, root * node.transform, material)
                .with_bloom((placement.bloom)(&node.name))
                .pickable(placement.pick),
        );
    }
}

fn add_hologram(scene: &mut Scene, model: &ModelData, rng: &mut impl Rng) {
    let group = scene.add_group(Transform::at(Vec3::new(-35.5, -18.0, 22.5)).with_scale(0.2));

    let mut points = Vec::new();
    for node in &model.nodes {
        points.extend(sample_surface(
            &node.mesh,
            node.transform,
            config::HOLOGRAM_SAMPLES_PER_MESH,
            rng,
        ));
        let mesh = scene.meshes.add(node.mesh.clone());
        scene.add_object(
            SceneObject::new(node.name.clone(), mesh, node.transform, Material::Hidden)
                .in_group(group)
                .pickable(PickRole::Hologram),
        );
    }

    tracing::debug!(points = points.len(), "hologram sampled");
    scene.hologram = Some(HologramRig {
        group,
        cloud: HologramCloud::from_points(points, rng),
        color: rgb_u32(config::HOLOGRAM_POINT_COLOR),
        point_size: config::HOLOGRAM_POINT_SIZE,
    });
}

fn add_reflective_floor(scene: &mut Scene) {
    let lay_flat = Quat::from_rotation_x(-FRAC_PI_2);

    let mirror = scene.meshes.add(Mesh::plane(config::MIRROR_SIZE, config::MIRROR_SIZE));
    scene.add_object(SceneObject::new(
        MIRROR,
        mirror,
        Mat4::from_rotation_translation(lay_flat, Vec3::new(0.0, config::MIRROR_HEIGHT, 0.0)),
        Material::Mirror { tint: rgb_u32(config::MIRROR_TINT) },
    ));

    let floor = scene.meshes.add(Mesh::plane(config::FLOOR_SIZE, config::FLOOR_SIZE));
    let id = scene.add_object(SceneObject::new(
        FLOOR,
        floor,
        Mat4::from_rotation_translation(lay_flat, Vec3::new(0.0, config::FLOOR_HEIGHT, 0.0)),
        floor_material(&FloorMaterial::default()),
    ));
    scene.floor = Some(id);
}

fn add_screen(scene: &mut Scene) {
    let facing = Quat::from_rotation_y(FRAC_PI_2);

    let screen = scene.meshes.add(Mesh::plane(16.0, 9.0));
    scene.add_object(SceneObject::new(
        SCREEN,
        screen,
        Mat4::from_rotation_translation(facing, Vec3::new(26.0, 7.0, -16.5)),
        Material::Basic {
            color: [1.0; 3],
            texture: Some(scene.textures.get_or_white("screen")),
            opacity: 1.0,
        },
    ));

    let frame = scene.meshes.add(Mesh::cuboid(16.5, 9.5, 0.2));
    scene.add_object(
        SceneObject::new(
            SCREEN_FRAME,
            frame,
            Mat4::from_rotation_translation(facing, Vec3::new(25.8, 7.0, -16.53)),
            Material::Basic { color: hex_color("#00fffb"), texture: None, opacity: 1.0 },
        )
        .with_bloom(true),
    );
}

/// Lettering on a plane whose origin sits on the left end of the baseline.
fn add_title(scene: &mut Scene, font: &fontdue::Font, text: &str, position: Vec3) {
    let raster = rasterize_text(font, text, TEXT_RASTER_PX);
    let (width, height) = raster.world_size(config::TITLE_TEXT_SIZE);
    let baseline = raster.baseline_px * config::TITLE_TEXT_SIZE / raster.px_per_em;

    let mesh = Mesh::plane(width, height)
        .transformed(Mat4::from_translation(Vec3::new(width * 0.5, height * 0.5 - baseline, 0.0)));
    let mesh = scene.meshes.add(mesh);
    let texture = scene.textures.add_unnamed(raster.image);

    scene.add_object(
        SceneObject::new(
            text,
            mesh,
            Mat4::from_translation(position),
            Material::Standard {
                color: [0.0, 0.0, 0.0, 1.0],
                texture: Some(texture),
                roughness: 0.5,
                metalness: 0.0,
            },
        )
        .with_bloom(true),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::ModelNode;
    use crate::model::raycast::Ray;

    fn model(names: &[&str]) -> ModelData {
        ModelData {
            nodes: names
                .iter()
                .map(|name| ModelNode {
                    name: name.to_string(),
                    transform: Mat4::IDENTITY,
                    mesh: Mesh::cuboid(10.0, 10.0, 10.0),
                    base_color: [1.0; 4],
                    metallic: 0.0,
                    roughness: 1.0,
                    texture: None,
                })
                .collect(),
            images: Vec::new(),
        }
    }

    #[test]
    fn bloom_follows_node_names() {
        let assets = LoadedAssets {
            ramen: Some(model(&["Object_8_lamp", "Object_12"])),
            pole: Some(model(&["Neon.002", "Text_ABOUT"])),
            ..LoadedAssets::default()
        };
        let scene = assemble(assets, 1);
        let bloom = |name: &str| scene.object(scene.find(name).unwrap()).bloom;
        assert!(bloom("Object_8_lamp"));
        assert!(!bloom("Object_12"));
        assert!(bloom("Neon.002"));
        assert!(!bloom("Text_ABOUT"));
        assert!(bloom(SCREEN_FRAME));
    }

    #[test]
    fn only_pole_meshes_are_hotspots() {
        let assets = LoadedAssets {
            ramen: Some(model(&["Object_8"])),
            pole: Some(model(&["Text_ABOUT"])),
            ..LoadedAssets::default()
        };
        let scene = assemble(assets, 1);
        assert_eq!(scene.object(scene.find("Object_8").unwrap()).pick, PickRole::None);
        assert_eq!(scene.object(scene.find("Text_ABOUT").unwrap()).pick, PickRole::Hotspot);
    }

    #[test]
    fn hologram_cloud_is_sampled_per_mesh_and_pickable() {
        let assets = LoadedAssets { hologram: Some(model(&["Holo_a", "Holo_b"])), ..LoadedAssets::default() };
        let scene = assemble(assets, 42);
        let rig = scene.hologram.as_ref().unwrap();
        assert_eq!(rig.cloud.len(), 2 * config::HOLOGRAM_SAMPLES_PER_MESH);

        // group sits at (-35.5, -18, 22.5) with scale 0.2: a 10 unit cube becomes 2 units
        let ray = Ray::new(Vec3::new(-35.5, -18.0, 40.0), Vec3::NEG_Z);
        let hit = scene.pick(&ray, PickRole::Hologram).unwrap();
        assert!((hit.distance - (40.0 - 22.5 - 1.0)).abs() < 1e-3);
        assert_eq!(scene.object(hit.object).material, Material::Hidden);
    }

    #[test]
    fn empty_load_still_has_floor_screen_and_panels() {
        let scene = assemble(LoadedAssets::default(), 0);
        assert!(scene.floor.is_some());
        assert!(scene.find(MIRROR).is_some());
        assert!(scene.find(SCREEN).is_some());
        assert!(scene.find(panels::ABOUT_PAGE).is_some());
        assert!(scene.hologram.is_none());
        // screen falls back to white without its poster
        assert_eq!(scene.texture_of(SCREEN), Some(TextureId::WHITE));
    }

    #[test]
    fn floor_material_uses_linear_colour() {
        match floor_material(&FloorMaterial::default()) {
            Material::Physical { color, opacity, .. } => {
                assert!(color[0] > 0.05 && color[0] < 0.08);
                assert_eq!(opacity, config::FLOOR_OPACITY);
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
