//! Image boards shown by the About, Project and Credits views, with their fixed layout.

use std::f32::consts::{FRAC_PI_2, FRAC_PI_8};

use glam::{Mat4, Quat, Vec3};

use crate::model::scene::{Material, PanelGroup, PickRole, Scene, SceneObject};
use crate::utils::Mesh;

pub const PROJECT_BACKDROP: &str = "project_bg";
pub const PROJECT_BACK: &str = "backbtn";
pub const PROJECT_TILES: [&str; 6] = [
    "project_tile_1",
    "project_tile_2",
    "project_tile_3",
    "project_tile_4",
    "project_tile_5",
    "project_tile_6",
];

pub const ABOUT_PAGE: &str = "about_page";
pub const ABOUT_BACK: &str = "about_back_btn";
pub const ABOUT_TAB_ABOUT: &str = "about_btn";
pub const ABOUT_TAB_SKILLS: &str = "skills_btn";
pub const ABOUT_TAB_EXPERIENCE: &str = "exp_btn";
pub const LINK_LINKEDIN: &str = "linkedin_btn";
pub const LINK_GITHUB: &str = "github_btn";
pub const LINK_MAIL: &str = "mail_btn";
pub const LINK_TWITTER: &str = "twitter_btn";

pub const CREDITS_COVER: &str = "creditHome";
pub const CREDITS_LINKS: &str = "crd_back";

#[derive(Debug, Clone, Copy, PartialEq)]
enum Facing {
    /// Plane normal along +Z.
    Front,
    /// Turned to face -X, towards the About camera spot.
    West,
    /// Turned to face +X, then leaned about world Z.
    Credits,
}

impl Facing {
    fn rotation(self) -> Quat {
        match self {
            Facing::Front => Quat::IDENTITY,
            Facing::West => Quat::from_rotation_y(-FRAC_PI_2),
            Facing::Credits => Quat::from_rotation_z(FRAC_PI_8) * Quat::from_rotation_y(FRAC_PI_2),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PanelLayout {
    pub name: &'static str,
    pub group: PanelGroup,
    pub size: [f32; 2],
    pub position: Vec3,
    facing: Facing,
    pub texture: &'static str,
    /// Shown as soon as the group opens.
    pub on_open: bool,
    pub pickable: bool,
}

impl PanelLayout {
    pub fn transform(&self) -> Mat4 {
        Mat4::from_rotation_translation(self.facing.rotation(), self.position)
    }
}

const fn board(
    name: &'static str,
    group: PanelGroup,
    size: [f32; 2],
    position: Vec3,
    facing: Facing,
    texture: &'static str,
) -> PanelLayout {
    PanelLayout { name, group, size, position, facing, texture, on_open: true, pickable: true }
}

pub const LAYOUT: &[PanelLayout] = &[
    // project gallery
    PanelLayout {
        pickable: false,
        ..board(PROJECT_BACKDROP, PanelGroup::Project, [11.0, 10.0], Vec3::new(35.8, 3.0, 24.0), Facing::Front, "bg")
    },
    board(PROJECT_BACK, PanelGroup::Project, [5.2, 2.3], Vec3::new(38.3, -3.3, 24.0), Facing::Front, "back"),
    board(PROJECT_TILES[0], PanelGroup::Project, [3.0, 4.0], Vec3::new(32.3, 5.2, 24.1), Facing::Front, "car"),
    board(PROJECT_TILES[1], PanelGroup::Project, [3.0, 4.0], Vec3::new(35.8, 5.2, 24.1), Facing::Front, "car"),
    board(PROJECT_TILES[2], PanelGroup::Project, [3.0, 4.0], Vec3::new(39.3, 5.2, 24.1), Facing::Front, "car"),
    board(PROJECT_TILES[3], PanelGroup::Project, [3.0, 4.0], Vec3::new(32.3, 0.8, 24.1), Facing::Front, "car"),
    board(PROJECT_TILES[4], PanelGroup::Project, [3.0, 4.0], Vec3::new(35.8, 0.8, 24.1), Facing::Front, "car"),
    board(PROJECT_TILES[5], PanelGroup::Project, [3.0, 4.0], Vec3::new(39.3, 0.8, 24.1), Facing::Front, "car"),
    // about board, tabs and social buttons
    board(ABOUT_PAGE, PanelGroup::About, [15.0, 6.0], Vec3::new(18.6, 3.3, 16.0), Facing::West, "about_page"),
    board(ABOUT_BACK, PanelGroup::About, [1.8, 0.8], Vec3::new(18.59, 5.6, 9.5), Facing::West, "back"),
    board(ABOUT_TAB_ABOUT, PanelGroup::About, [0.8, 1.8], Vec3::new(18.5, 5.2, 22.4), Facing::West, "about"),
    board(ABOUT_TAB_SKILLS, PanelGroup::About, [0.8, 1.8], Vec3::new(18.5, 3.5, 22.4), Facing::West, "skills"),
    board(ABOUT_TAB_EXPERIENCE, PanelGroup::About, [0.8, 1.8], Vec3::new(18.5, 1.6, 22.4), Facing::West, "experience"),
    board(LINK_LINKEDIN, PanelGroup::About, [0.4, 0.4], Vec3::new(18.5, 0.8, 11.0), Facing::West, "linkedin"),
    board(LINK_GITHUB, PanelGroup::About, [0.4, 0.4], Vec3::new(18.5, 0.8, 12.0), Facing::West, "github"),
    board(LINK_MAIL, PanelGroup::About, [0.4, 0.4], Vec3::new(18.5, 0.8, 13.0), Facing::West, "mail"),
    board(LINK_TWITTER, PanelGroup::About, [0.4, 0.4], Vec3::new(18.5, 0.8, 14.0), Facing::West, "twitter"),
    // credits sheets
    board(CREDITS_COVER, PanelGroup::Credits, [8.0, 5.0], Vec3::new(32.8, 2.7, 0.0), Facing::Credits, "credits_h"),
    PanelLayout {
        on_open: false,
        ..board(CREDITS_LINKS, PanelGroup::Credits, [8.0, 5.0], Vec3::new(32.81, 2.7, 0.0), Facing::Credits, "credits_l")
    },
];

pub fn layout(name: &str) -> Option<&'static PanelLayout> {
    LAYOUT.iter().find(|p| p.name == name)
}

/// Add every board to the scene, hidden until its group opens.
pub fn build_panels(scene: &mut Scene) {
    for panel in LAYOUT {
        let mesh = scene.meshes.add(Mesh::plane(panel.size[0], panel.size[1]));
        let material = Material::Basic {
            color: [1.0; 3],
            texture: Some(scene.textures.get_or_white(panel.texture)),
            opacity: 1.0,
        };
        let pick = if panel.pickable { PickRole::Hotspot } else { PickRole::None };
        scene.add_object(
            SceneObject::new(panel.name, mesh, panel.transform(), material)
                .pickable(pick)
                .in_panel(panel.group, panel.on_open),
        );
    }
    tracing::debug!(count = LAYOUT.len(), "panels placed");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::hotspot::Hotspot;

    #[test]
    fn names_are_unique() {
        for (i, a) in LAYOUT.iter().enumerate() {
            assert!(LAYOUT[i + 1..].iter().all(|b| b.name != a.name), "duplicate {}", a.name);
        }
    }

    #[test]
    fn about_boards_face_the_about_camera() {
        // camera parks at x = 10 looking towards +X
        let normal = layout(ABOUT_PAGE).unwrap().transform().transform_vector3(Vec3::Z);
        assert!((normal - Vec3::NEG_X).length() < 1e-5);
    }

    #[test]
    fn credits_links_sheet_sits_in_front_of_cover() {
        let cover = layout(CREDITS_COVER).unwrap();
        let links = layout(CREDITS_LINKS).unwrap();
        assert!(cover.on_open && !links.on_open);
        assert!(links.position.x > cover.position.x);
    }

    #[test]
    fn build_hides_everything() {
        let mut scene = Scene::new();
        build_panels(&mut scene);
        assert_eq!(scene.objects.len(), LAYOUT.len());
        assert!(scene.objects.iter().all(|o| !o.visible));
        assert_eq!(scene.find(PROJECT_BACKDROP).map(|id| scene.object(id).pick), Some(PickRole::None));
    }

    #[test]
    fn each_group_has_a_way_back() {
        for group in PanelGroup::ALL {
            assert!(LAYOUT
                .iter()
                .filter(|p| p.group == group)
                .any(|p| Hotspot::from_name(p.name) == Some(Hotspot::Back)));
        }
    }
}
