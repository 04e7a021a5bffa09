//! CPU-side scene graph: a flat object list with optional parent groups, the mesh and
//! texture libraries, and ray picking. Nothing here touches the GPU.

use std::collections::HashMap;

use glam::{Mat4, Quat, Vec3};

use crate::assets::texture::ImageData;
use crate::model::particles::HologramCloud;
use crate::model::raycast::{ray_mesh, Ray};
use crate::utils::Mesh;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MeshId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GroupId(pub usize);

impl TextureId {
    pub const WHITE: TextureId = TextureId(0);
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self { translation: Vec3::ZERO, rotation: Quat::IDENTITY, scale: Vec3::ONE }
    }
}

impl Transform {
    pub fn at(translation: Vec3) -> Self {
        Self { translation, ..Self::default() }
    }

    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = Vec3::splat(scale);
        self
    }

    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Material {
    /// Unlit, optionally textured.
    Basic { color: [f32; 3], texture: Option<TextureId>, opacity: f32 },
    Standard { color: [f32; 4], texture: Option<TextureId>, roughness: f32, metalness: f32 },
    Physical {
        color: [f32; 3],
        roughness: f32,
        metalness: f32,
        clearcoat: f32,
        clearcoat_roughness: f32,
        opacity: f32,
    },
    /// Samples the planar reflection target.
    Mirror { tint: [f32; 3] },
    /// Pickable but never drawn.
    Hidden,
}

impl Material {
    pub fn texture(&self) -> Option<TextureId> {
        match self {
            Material::Basic { texture, .. } | Material::Standard { texture, .. } => *texture,
            _ => None,
        }
    }

    pub fn is_transparent(&self) -> bool {
        match self {
            Material::Basic { opacity, .. } | Material::Physical { opacity, .. } => *opacity < 1.0,
            Material::Standard { color, .. } => color[3] < 1.0,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PickRole {
    #[default]
    None,
    Hotspot,
    Hologram,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PanelGroup {
    Project,
    About,
    Credits,
}

impl PanelGroup {
    pub const ALL: [PanelGroup; 3] = [PanelGroup::Project, PanelGroup::About, PanelGroup::Credits];
}

/// Membership of an info panel. Opening a group shows only the members flagged `on_open`;
/// the rest (for example the credits links sheet) are revealed by later clicks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PanelSlot {
    pub group: PanelGroup,
    pub on_open: bool,
}

#[derive(Debug, Clone)]
pub struct SceneObject {
    pub name: String,
    pub mesh: MeshId,
    /// Relative to the parent group, or world space without one.
    pub local: Mat4,
    pub group: Option<GroupId>,
    pub material: Material,
    pub bloom: bool,
    pub visible: bool,
    pub panel: Option<PanelSlot>,
    pub pick: PickRole,
}

impl SceneObject {
    pub fn new(name: impl Into<String>, mesh: MeshId, local: Mat4, material: Material) -> Self {
        Self {
            name: name.into(),
            mesh,
            local,
            group: None,
            material,
            bloom: false,
            visible: true,
            panel: None,
            pick: PickRole::None,
        }
    }

    pub fn in_group(mut self, group: GroupId) -> Self {
        self.group = Some(group);
        self
    }

    pub fn with_bloom(mut self, bloom: bool) -> Self {
        self.bloom = bloom;
        self
    }

    pub fn pickable(mut self, role: PickRole) -> Self {
        self.pick = role;
        self
    }

    pub fn in_panel(mut self, group: PanelGroup, on_open: bool) -> Self {
        self.panel = Some(PanelSlot { group, on_open });
        self.visible = false;
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct Group {
    pub transform: Transform,
}

#[derive(Debug, Default)]
pub struct MeshLibrary {
    meshes: Vec<Mesh>,
}

impl MeshLibrary {
    pub fn add(&mut self, mesh: Mesh) -> MeshId {
        self.meshes.push(mesh);
        MeshId(self.meshes.len() - 1)
    }

    pub fn get(&self, id: MeshId) -> &Mesh {
        &self.meshes[id.0]
    }

    pub fn iter(&self) -> impl Iterator<Item = (MeshId, &Mesh)> {
        self.meshes.iter().enumerate().map(|(i, m)| (MeshId(i), m))
    }

    pub fn len(&self) -> usize {
        self.meshes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
    }
}

#[derive(Debug)]
pub struct TextureLibrary {
    images: Vec<ImageData>,
    by_name: HashMap<String, TextureId>,
}

impl Default for TextureLibrary {
    fn default() -> Self {
        Self {
            images: vec![ImageData::solid([255, 255, 255, 255])],
            by_name: HashMap::new(),
        }
    }
}

impl TextureLibrary {
    pub fn add(&mut self, name: impl Into<String>, image: ImageData) -> TextureId {
        let id = TextureId(self.images.len());
        self.images.push(image);
        self.by_name.insert(name.into(), id);
        id
    }

    /// Anonymous textures, such as those embedded in a model.
    pub fn add_unnamed(&mut self, image: ImageData) -> TextureId {
        self.images.push(image);
        TextureId(self.images.len() - 1)
    }

    /// Named texture, or the white fallback when it failed to load.
    pub fn get_or_white(&self, name: &str) -> TextureId {
        self.by_name.get(name).copied().unwrap_or(TextureId::WHITE)
    }

    pub fn lookup(&self, name: &str) -> Option<TextureId> {
        self.by_name.get(name).copied()
    }

    pub fn image(&self, id: TextureId) -> &ImageData {
        &self.images[id.0]
    }

    pub fn iter(&self) -> impl Iterator<Item = (TextureId, &ImageData)> {
        self.images.iter().enumerate().map(|(i, img)| (TextureId(i), img))
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

/// Point cloud sampled from the hologram model, spinning with its group.
#[derive(Debug, Clone)]
pub struct HologramRig {
    pub group: GroupId,
    pub cloud: HologramCloud,
    pub color: [f32; 3],
    pub point_size: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PickHit {
    pub object: ObjectId,
    pub distance: f32,
}

#[derive(Debug, Default)]
pub struct Scene {
    pub objects: Vec<SceneObject>,
    pub groups: Vec<Group>,
    pub meshes: MeshLibrary,
    pub textures: TextureLibrary,
    pub hologram: Option<HologramRig>,
    pub floor: Option<ObjectId>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_group(&mut self, transform: Transform) -> GroupId {
        self.groups.push(Group { transform });
        GroupId(self.groups.len() - 1)
    }

    pub fn add_object(&mut self, object: SceneObject) -> ObjectId {
        self.objects.push(object);
        ObjectId(self.objects.len() - 1)
    }

    pub fn object(&self, id: ObjectId) -> &SceneObject {
        &self.objects[id.0]
    }

    pub fn object_mut(&mut self, id: ObjectId) -> &mut SceneObject {
        &mut self.objects[id.0]
    }

    /// First object carrying `name`.
    pub fn find(&self, name: &str) -> Option<ObjectId> {
        self.objects.iter().position(|o| o.name == name).map(ObjectId)
    }

    pub fn group_matrix(&self, id: GroupId) -> Mat4 {
        self.groups[id.0].transform.matrix()
    }

    pub fn world_matrix(&self, id: ObjectId) -> Mat4 {
        let object = self.object(id);
        match object.group {
            Some(group) => self.group_matrix(group) * object.local,
            None => object.local,
        }
    }

    pub fn set_visible(&mut self, name: &str, visible: bool) {
        for object in self.objects.iter_mut().filter(|o| o.name == name) {
            object.visible = visible;
        }
    }

    pub fn is_visible(&self, name: &str) -> bool {
        self.objects.iter().any(|o| o.name == name && o.visible)
    }

    /// Swap the texture of every object named `name`. Returns false when nothing matched.
    pub fn set_texture(&mut self, name: &str, texture: TextureId) -> bool {
        let mut changed = false;
        for object in self.objects.iter_mut().filter(|o| o.name == name) {
            if let Material::Basic { texture: t, .. } | Material::Standard { texture: t, .. } =
                &mut object.material
            {
                *t = Some(texture);
                changed = true;
            }
        }
        changed
    }

    pub fn texture_of(&self, name: &str) -> Option<TextureId> {
        self.find(name).and_then(|id| self.object(id).material.texture())
    }

    /// Open or close a panel group. Opening shows the `on_open` members only; closing hides
    /// every member.
    pub fn set_panel_visible(&mut self, group: PanelGroup, open: bool) {
        for object in self.objects.iter_mut() {
            if let Some(slot) = object.panel.filter(|slot| slot.group == group) {
                object.visible = open && slot.on_open;
            }
        }
    }

    pub fn visible_panel_groups(&self) -> Vec<PanelGroup> {
        PanelGroup::ALL
            .into_iter()
            .filter(|g| {
                self.objects
                    .iter()
                    .any(|o| o.visible && o.panel.is_some_and(|slot| slot.group == *g))
            })
            .collect()
    }

    /// Nearest visible object with `role` under `ray`. Hidden-material objects count as
    /// visible for picking.
    pub fn pick(&self, ray: &Ray, role: PickRole) -> Option<PickHit> {
        self.objects
            .iter()
            .enumerate()
            .filter(|(_, o)| o.visible && o.pick == role)
            .filter_map(|(i, o)| {
                let id = ObjectId(i);
                ray_mesh(ray, self.meshes.get(o.mesh), self.world_matrix(id))
                    .map(|distance| PickHit { object: id, distance })
            })
            .min_by(|a, b| a.distance.total_cmp(&b.distance))
    }

    /// Turn a group about the world Y axis.
    pub fn spin_group(&mut self, group: GroupId, radians: f32) {
        let t = &mut self.groups[group.0].transform;
        t.rotation = Quat::from_rotation_y(radians) * t.rotation;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn basic(texture: Option<TextureId>) -> Material {
        Material::Basic { color: [1.0; 3], texture, opacity: 1.0 }
    }

    fn plane_at(scene: &mut Scene, name: &str, z: f32) -> ObjectId {
        let mesh = scene.meshes.add(Mesh::plane(2.0, 2.0));
        scene.add_object(
            SceneObject::new(name, mesh, Mat4::from_translation(Vec3::new(0.0, 0.0, z)), basic(None))
                .pickable(PickRole::Hotspot),
        )
    }

    #[test]
    fn pick_prefers_nearest_visible_object() {
        let mut scene = Scene::new();
        let far = plane_at(&mut scene, "far", 0.0);
        let near = plane_at(&mut scene, "near", 2.0);
        let ray = Ray::new(Vec3::new(0.0, 0.0, 10.0), Vec3::NEG_Z);

        assert_eq!(scene.pick(&ray, PickRole::Hotspot).map(|h| h.object), Some(near));
        scene.set_visible("near", false);
        assert_eq!(scene.pick(&ray, PickRole::Hotspot).map(|h| h.object), Some(far));
        assert!(scene.pick(&ray, PickRole::Hologram).is_none());
    }

    #[test]
    fn panel_groups_open_only_initial_members() {
        let mut scene = Scene::new();
        let mesh = scene.meshes.add(Mesh::plane(1.0, 1.0));
        scene.add_object(SceneObject::new("cover", mesh, Mat4::IDENTITY, basic(None)).in_panel(PanelGroup::Credits, true));
        scene.add_object(SceneObject::new("links", mesh, Mat4::IDENTITY, basic(None)).in_panel(PanelGroup::Credits, false));
        assert!(scene.visible_panel_groups().is_empty());

        scene.set_panel_visible(PanelGroup::Credits, true);
        assert!(scene.is_visible("cover"));
        assert!(!scene.is_visible("links"));
        assert_eq!(scene.visible_panel_groups(), vec![PanelGroup::Credits]);

        scene.set_visible("links", true);
        scene.set_panel_visible(PanelGroup::Credits, false);
        assert!(!scene.is_visible("cover") && !scene.is_visible("links"));
    }

    #[test]
    fn group_transform_applies_to_members() {
        let mut scene = Scene::new();
        let group = scene.add_group(Transform::at(Vec3::new(5.0, 0.0, 0.0)).with_scale(2.0));
        let mesh = scene.meshes.add(Mesh::plane(1.0, 1.0));
        let id = scene.add_object(
            SceneObject::new("m", mesh, Mat4::from_translation(Vec3::X), Material::Hidden).in_group(group),
        );
        let p = scene.world_matrix(id).transform_point3(Vec3::ZERO);
        assert!((p - Vec3::new(7.0, 0.0, 0.0)).length() < 1e-5);

        scene.spin_group(group, std::f32::consts::FRAC_PI_2);
        let p = scene.world_matrix(id).transform_point3(Vec3::ZERO);
        assert!((p - Vec3::new(5.0, 0.0, -2.0)).length() < 1e-4);
    }

    #[test]
    fn textures_fall_back_to_white() {
        let mut scene = Scene::new();
        let red = scene.textures.add("red", ImageData::solid([255, 0, 0, 255]));
        assert_eq!(scene.textures.get_or_white("red"), red);
        assert_eq!(scene.textures.get_or_white("missing"), TextureId::WHITE);

        let mesh = scene.meshes.add(Mesh::plane(1.0, 1.0));
        scene.add_object(SceneObject::new("board", mesh, Mat4::IDENTITY, basic(None)));
        assert!(scene.set_texture("board", red));
        assert_eq!(scene.texture_of("board"), Some(red));
        assert!(!scene.set_texture("nothing", red));
    }
}
