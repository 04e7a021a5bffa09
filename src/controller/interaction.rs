//! View state machine: pointer clicks on hotspots open and close the info views, fly the
//! camera between fixed poses and toggle the panels.

use glam::Vec3;

use crate::config;
use crate::controller::orbit::OrbitControls;
use crate::controller::tween::Vec3Tween;
use crate::model::hotspot::{AboutPage, Hotspot, Section};
use crate::model::panels;
use crate::model::scene::{PanelGroup, PickRole, Scene};
use crate::model::{Camera, Ray};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CreditSheet {
    #[default]
    Cover,
    Links,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum View {
    #[default]
    Home,
    About(AboutPage),
    Project,
    Articles(CreditSheet),
}

impl View {
    pub fn section(self) -> Option<Section> {
        match self {
            View::Home => None,
            View::About(_) => Some(Section::About),
            View::Project => Some(Section::Project),
            View::Articles(_) => Some(Section::Articles),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            View::Home => "home",
            View::About(_) => "about",
            View::Project => "project",
            View::Articles(_) => "articles",
        }
    }

    fn opening(section: Section) -> Self {
        match section {
            Section::About => View::About(AboutPage::default()),
            Section::Project => View::Project,
            Section::Articles => View::Articles(CreditSheet::default()),
        }
    }
}

pub fn panel_group(section: Section) -> PanelGroup {
    match section {
        Section::About => PanelGroup::About,
        Section::Project => PanelGroup::Project,
        Section::Articles => PanelGroup::Credits,
    }
}

/// Camera pose a view flies to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Destination {
    pub target: Vec3,
    pub target_secs: f32,
    pub eye: Vec3,
    pub eye_secs: f32,
}

pub const HOME: Destination = Destination {
    target: config::HOME_TARGET,
    target_secs: 1.0,
    eye: config::HOME_EYE,
    eye_secs: 2.0,
};

pub fn destination(section: Section) -> Destination {
    match section {
        Section::About => Destination {
            target: Vec3::new(18.5, 3.0, 16.0),
            target_secs: 1.0,
            eye: Vec3::new(10.0, 3.5, 16.0),
            eye_secs: 2.0,
        },
        Section::Project => Destination {
            target: Vec3::new(36.0, 3.0, 24.0),
            target_secs: 1.0,
            eye: Vec3::new(36.0, 4.0, 38.0),
            eye_secs: 2.0,
        },
        Section::Articles => Destination {
            target: Vec3::new(32.72, 2.8, 0.0),
            target_secs: 1.0,
            eye: Vec3::new(40.0, 3.5, 0.0),
            eye_secs: 3.0,
        },
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnComplete {
    Nothing,
    DisableOrbit,
}

#[derive(Debug, Clone, Copy)]
struct Flight {
    tween: Vec3Tween,
    on_complete: OnComplete,
}

/// What a click did, for the platform layer and for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickOutcome {
    Miss,
    /// Hit something that has no action in the current state.
    Ignored,
    Opened(Section),
    Back,
    AboutPage(AboutPage),
    CreditsFlipped,
    OpenUrl(&'static str),
}

#[derive(Debug, Clone, Default)]
pub struct InteractionController {
    view: View,
    eye_flight: Option<Flight>,
    target_flight: Option<Flight>,
}

impl InteractionController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn view(&self) -> View {
        self.view
    }

    pub fn is_flying(&self) -> bool {
        self.eye_flight.is_some() || self.target_flight.is_some()
    }

    /// Resolve a click ray against the visible hotspots and run the matching transition.
    pub fn handle_click(
        &mut self,
        ray: &Ray,
        scene: &mut Scene,
        camera: &Camera,
        orbit: &mut OrbitControls,
    ) -> ClickOutcome {
        let Some(hit) = scene.pick(ray, PickRole::Hotspot) else {
            return ClickOutcome::Miss;
        };
        let name = scene.object(hit.object).name.clone();
        let Some(hotspot) = Hotspot::from_name(&name) else {
            tracing::trace!(name, "clicked object without action");
            return ClickOutcome::Ignored;
        };
        tracing::debug!(name, ?hotspot, view = self.view.label(), "hotspot clicked");

        match hotspot {
            Hotspot::Open(section) => self.open(section, scene, camera, orbit),
            Hotspot::Back => self.back(scene, camera, orbit),
            Hotspot::AboutTab(page) => self.show_about_page(page, scene),
            Hotspot::CreditsFlip => self.flip_credits(scene),
            Hotspot::Link(link) => ClickOutcome::OpenUrl(link.url()),
        }
    }

    pub fn open(
        &mut self,
        section: Section,
        scene: &mut Scene,
        camera: &Camera,
        orbit: &mut OrbitControls,
    ) -> ClickOutcome {
        if self.view.section() == Some(section) {
            return ClickOutcome::Ignored;
        }
        if self.view != View::Home {
            self.close_panels(scene);
        }

        let dest = destination(section);
        self.fly(camera, orbit, dest, OnComplete::DisableOrbit);
        scene.set_panel_visible(panel_group(section), true);
        self.view = View::opening(section);
        tracing::info!(view = self.view.label(), "view opened");
        ClickOutcome::Opened(section)
    }

    pub fn back(&mut self, scene: &mut Scene, camera: &Camera, orbit: &mut OrbitControls) -> ClickOutcome {
        self.close_panels(scene);
        orbit.enabled = true;
        self.fly(camera, orbit, HOME, OnComplete::Nothing);
        self.view = View::Home;
        tracing::info!("returning home");
        ClickOutcome::Back
    }

    fn show_about_page(&mut self, page: AboutPage, scene: &mut Scene) -> ClickOutcome {
        if !matches!(self.view, View::About(_)) {
            return ClickOutcome::Ignored;
        }
        let texture = scene.textures.get_or_white(page.texture_key());
        scene.set_texture(panels::ABOUT_PAGE, texture);
        self.view = View::About(page);
        ClickOutcome::AboutPage(page)
    }

    fn flip_credits(&mut self, scene: &mut Scene) -> ClickOutcome {
        if self.view != View::Articles(CreditSheet::Cover) {
            return ClickOutcome::Ignored;
        }
        scene.set_visible(panels::CREDITS_COVER, false);
        scene.set_visible(panels::CREDITS_LINKS, true);
        self.view = View::Articles(CreditSheet::Links);
        ClickOutcome::CreditsFlipped
    }

    /// Hide every panel and put sub-views back on their first page.
    fn close_panels(&mut self, scene: &mut Scene) {
        for group in PanelGroup::ALL {
            scene.set_panel_visible(group, false);
        }
        let first_page = scene.textures.get_or_white(AboutPage::default().texture_key());
        scene.set_texture(panels::ABOUT_PAGE, first_page);
    }

    /// Start eye and target tweens. A new flight replaces whatever was running.
    fn fly(&mut self, camera: &Camera, orbit: &OrbitControls, dest: Destination, on_eye_done: OnComplete) {
        self.target_flight = Some(Flight {
            tween: Vec3Tween::new(orbit.target, dest.target, dest.target_secs),
            on_complete: OnComplete::Nothing,
        });
        self.eye_flight = Some(Flight {
            tween: Vec3Tween::new(camera.eye, dest.eye, dest.eye_secs),
            on_complete: on_eye_done,
        });
    }

    /// Advance running flights and write their values into the camera and orbit rig.
    pub fn update(&mut self, dt: f32, camera: &mut Camera, orbit: &mut OrbitControls) {
        if let Some(done) = step(&mut self.target_flight, dt, |p| orbit.target = p) {
            apply(done, orbit);
        }
        if let Some(done) = step(&mut self.eye_flight, dt, |p| camera.eye = p) {
            apply(done, orbit);
        }
    }
}

fn step(flight: &mut Option<Flight>, dt: f32, mut write: impl FnMut(Vec3)) -> Option<OnComplete> {
    let f = flight.as_mut()?;
    write(f.tween.advance(dt));
    if f.tween.is_finished() {
        let done = f.on_complete;
        *flight = None;
        Some(done)
    } else {
        None
    }
}

fn apply(action: OnComplete, orbit: &mut OrbitControls) {
    match action {
        OnComplete::Nothing => {}
        OnComplete::DisableOrbit => {
            orbit.enabled = false;
            tracing::debug!("orbit disabled at destination");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::ImageData;
    use crate::model::scene::{Material, SceneObject};
    use crate::utils::Mesh;
    use glam::Mat4;

    struct Rig {
        scene: Scene,
        camera: Camera,
        orbit: OrbitControls,
        ctl: InteractionController,
    }

    impl Rig {
        fn new() -> Self {
            let mut scene = Scene::new();
            for key in ["about_page", "skills_page", "exp_page"] {
                scene.textures.add(key, ImageData::solid([1, 2, 3, 255]));
            }
            // stand-ins for the pole lettering, spread along x
            let sign = scene.meshes.add(Mesh::plane(2.0, 2.0));
            for (i, name) in ["Text_ABOUT", "TEXT_PROJECT", "Text_ARTICLES", "Pole_base"].iter().enumerate() {
                scene.add_object(
                    SceneObject::new(
                        *name,
                        sign,
                        Mat4::from_translation(Vec3::new(-100.0 - 10.0 * i as f32, 0.0, 0.0)),
                        Material::Hidden,
                    )
                    .pickable(PickRole::Hotspot),
                );
            }
            panels::build_panels(&mut scene);
            Self {
                scene,
                camera: Camera::new(800, 600),
                orbit: OrbitControls::new(config::HOME_TARGET),
                ctl: InteractionController::new(),
            }
        }

        /// Click straight at the front of the named object.
        fn click(&mut self, name: &str) -> ClickOutcome {
            let id = self.scene.find(name).unwrap();
            let world = self.scene.world_matrix(id);
            let centre = world.transform_point3(Vec3::ZERO);
            let normal = world.transform_vector3(Vec3::Z).normalize();
            let ray = Ray::new(centre + normal * 3.0, -normal);
            self.ctl.handle_click(&ray, &mut self.scene, &self.camera, &mut self.orbit)
        }

        fn run(&mut self, secs: f32) {
            self.ctl.update(secs, &mut self.camera, &mut self.orbit);
        }
    }

    fn close(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-3
    }

    #[test]
    fn pole_names_open_views() {
        let mut rig = Rig::new();
        assert_eq!(rig.click("Text_ABOUT"), ClickOutcome::Opened(Section::About));
        assert_eq!(rig.ctl.view(), View::About(AboutPage::About));
        assert_eq!(rig.scene.visible_panel_groups(), vec![PanelGroup::About]);
        assert!(rig.scene.is_visible(panels::ABOUT_BACK));
    }

    #[test]
    fn flight_reaches_destination_then_locks_orbit() {
        let mut rig = Rig::new();
        rig.click("TEXT_PROJECT");
        let dest = destination(Section::Project);

        rig.run(1.0);
        assert!(close(rig.orbit.target, dest.target));
        assert!(!close(rig.camera.eye, dest.eye));
        assert!(rig.orbit.enabled, "orbit stays free until the eye lands");

        rig.run(1.0);
        assert!(close(rig.camera.eye, dest.eye));
        assert!(!rig.orbit.enabled);
        assert!(!rig.ctl.is_flying());
    }

    #[test]
    fn articles_flight_takes_three_seconds() {
        let mut rig = Rig::new();
        rig.click("Text_ARTICLES");
        rig.run(2.0);
        assert!(rig.orbit.enabled);
        rig.run(1.0);
        assert!(close(rig.camera.eye, Vec3::new(40.0, 3.5, 0.0)));
        assert!(!rig.orbit.enabled);
    }

    #[test]
    fn back_restores_home() {
        let mut rig = Rig::new();
        rig.click("Text_ABOUT");
        rig.run(2.0);
        rig.click(panels::ABOUT_TAB_SKILLS);

        assert_eq!(rig.click(panels::ABOUT_BACK), ClickOutcome::Back);
        assert!(rig.orbit.enabled);
        assert!(rig.scene.visible_panel_groups().is_empty());
        rig.run(2.0);
        assert!(close(rig.camera.eye, config::HOME_EYE));
        assert!(close(rig.orbit.target, config::HOME_TARGET));
        assert_eq!(rig.ctl.view(), View::Home);
        assert_eq!(rig.scene.texture_of(panels::ABOUT_PAGE), rig.scene.textures.lookup("about_page"));
    }

    #[test]
    fn back_mid_flight_keeps_orbit_enabled() {
        let mut rig = Rig::new();
        rig.click("Text_ABOUT");
        rig.run(0.5);
        rig.click(panels::ABOUT_BACK);
        rig.run(3.0);
        assert!(rig.orbit.enabled, "replaced flight must not lock orbit");
    }

    #[test]
    fn about_tabs_swap_page_without_moving() {
        let mut rig = Rig::new();
        rig.click("Text_ABOUT");
        rig.run(2.0);
        let eye = rig.camera.eye;

        assert_eq!(rig.click(panels::ABOUT_TAB_EXPERIENCE), ClickOutcome::AboutPage(AboutPage::Experience));
        assert_eq!(rig.scene.texture_of(panels::ABOUT_PAGE), rig.scene.textures.lookup("exp_page"));
        assert!(!rig.ctl.is_flying());
        assert_eq!(rig.camera.eye, eye);

        rig.click(panels::ABOUT_TAB_SKILLS);
        assert_eq!(rig.ctl.view(), View::About(AboutPage::Skills));
        assert_eq!(rig.scene.texture_of(panels::ABOUT_PAGE), rig.scene.textures.lookup("skills_page"));
    }

    #[test]
    fn credits_cover_flips_to_links_sheet() {
        let mut rig = Rig::new();
        rig.click("Text_ARTICLES");
        assert!(rig.scene.is_visible(panels::CREDITS_COVER));
        assert!(!rig.scene.is_visible(panels::CREDITS_LINKS));

        assert_eq!(rig.click(panels::CREDITS_COVER), ClickOutcome::CreditsFlipped);
        assert!(!rig.scene.is_visible(panels::CREDITS_COVER));
        assert!(rig.scene.is_visible(panels::CREDITS_LINKS));

        // the links sheet is the way back
        assert_eq!(rig.click(panels::CREDITS_LINKS), ClickOutcome::Back);
        rig.click("Text_ARTICLES");
        assert_eq!(rig.ctl.view(), View::Articles(CreditSheet::Cover));
        assert!(rig.scene.is_visible(panels::CREDITS_COVER));
    }

    #[test]
    fn social_buttons_open_links() {
        let mut rig = Rig::new();
        rig.click("Text_ABOUT");
        assert_eq!(rig.click(panels::LINK_GITHUB), ClickOutcome::OpenUrl(config::GITHUB_URL));
        assert_eq!(rig.click(panels::LINK_MAIL), ClickOutcome::OpenUrl(config::MAIL_URL));
        assert_eq!(rig.ctl.view(), View::About(AboutPage::About));
    }

    #[test]
    fn misses_and_decoration_change_nothing() {
        let mut rig = Rig::new();
        let ray = Ray::new(Vec3::new(0.0, 500.0, 0.0), Vec3::Y);
        assert_eq!(rig.ctl.handle_click(&ray, &mut rig.scene, &rig.camera, &mut rig.orbit), ClickOutcome::Miss);
        assert_eq!(rig.click("Pole_base"), ClickOutcome::Ignored);
        assert_eq!(rig.ctl.view(), View::Home);
        assert!(!rig.ctl.is_flying());
        assert!(rig.scene.visible_panel_groups().is_empty());
    }

    #[test]
    fn hidden_panels_cannot_be_clicked() {
        let mut rig = Rig::new();
        let id = rig.scene.find(panels::PROJECT_BACK).unwrap();
        let centre = rig.scene.world_matrix(id).transform_point3(Vec3::ZERO);
        let ray = Ray::new(centre + Vec3::Z * 3.0, Vec3::NEG_Z);
        assert_eq!(rig.ctl.handle_click(&ray, &mut rig.scene, &rig.camera, &mut rig.orbit), ClickOutcome::Miss);
    }

    #[test]
    fn at_most_one_panel_group_is_ever_visible() {
        let mut rig = Rig::new();
        let clicks = [
            "Text_ABOUT",
            "TEXT_PROJECT",
            "Text_ARTICLES",
            panels::CREDITS_COVER,
            "Text_ABOUT",
            panels::ABOUT_TAB_SKILLS,
            "TEXT_PROJECT",
            panels::PROJECT_BACK,
            "Text_ARTICLES",
            "Text_ARTICLES",
        ];
        for name in clicks {
            if rig.scene.find(name).is_some_and(|id| rig.scene.object(id).visible) {
                rig.click(name);
            }
            rig.run(0.25);
            assert!(rig.scene.visible_panel_groups().len() <= 1, "after {name}");
        }
        assert_eq!(rig.ctl.view(), View::Articles(CreditSheet::Cover));
    }

    #[test]
    fn switching_views_resets_sub_pages() {
        let mut rig = Rig::new();
        rig.click("Text_ABOUT");
        rig.click(panels::ABOUT_TAB_EXPERIENCE);
        rig.click("TEXT_PROJECT");
        assert_eq!(rig.ctl.view(), View::Project);
        assert_eq!(rig.scene.texture_of(panels::ABOUT_PAGE), rig.scene.textures.lookup("about_page"));
        assert_eq!(rig.scene.visible_panel_groups(), vec![PanelGroup::Project]);
    }

    #[test]
    fn reopening_current_view_is_a_no_op() {
        let mut rig = Rig::new();
        rig.click("Text_ABOUT");
        rig.run(2.0);
        assert_eq!(rig.click("Text_ABOUT"), ClickOutcome::Ignored);
        assert!(!rig.ctl.is_flying());
    }
}
