use std::cell::RefCell;
use std::rc::Rc;

use glam::Vec2;

use crate::assets::SharedProgress;
use crate::config::{self, FloorMaterial, Settings};
use crate::controller::hologram::HologramAnimator;
use crate::controller::input::{InputState, OrbitInput};
use crate::controller::interaction::{ClickOutcome, InteractionController};
use crate::controller::orbit::OrbitControls;
use crate::model::assembly::floor_material;
use crate::model::camera::ndc_from_pixels;
use crate::model::{Camera, PickRole, Scene};

/// Frame rate averaged over roughly one second.
#[derive(Debug, Clone, Default)]
pub struct FrameStats {
    pub fps: f32,
    pub frame_ms: f32,
    frame_count: u32,
    fps_timer: f32,
}

impl FrameStats {
    pub fn record(&mut self, dt: f32) {
        self.frame_ms = dt * 1000.0;
        self.frame_count += 1;
        self.fps_timer += dt;
        if self.fps_timer >= 1.0 {
            self.fps = self.frame_count as f32 / self.fps_timer;
            self.frame_count = 0;
            self.fps_timer = 0.0;
        }
    }
}

/// Side effects the platform layer has to carry out after an update.
#[derive(Debug, Default, PartialEq)]
pub struct FrameOutput {
    pub links: Vec<&'static str>,
    /// Hologram points moved and need re-uploading.
    pub points_dirty: bool,
}

/// Main loop state shared by the browser and the native window
pub struct FrameLoopContext {
    pub camera: Camera,
    pub orbit: OrbitControls,
    pub interaction: InteractionController,
    pub hologram: HologramAnimator,
    pub input: Rc<RefCell<InputState>>,
    /// `None` until loading finishes.
    pub scene: Option<Scene>,
    pub settings: Settings,
    pub progress: SharedProgress,
    pub stats: FrameStats,
    /// Drawing area in logical pixels, the unit pointer events arrive in.
    pub viewport: Vec2,
    applied_floor: Option<FloorMaterial>,
}

impl FrameLoopContext {
    pub fn new(
        width: u32,
        height: u32,
        viewport: Vec2,
        input: Rc<RefCell<InputState>>,
        progress: SharedProgress,
    ) -> Self {
        Self {
            camera: Camera::new(width, height),
            orbit: OrbitControls::new(config::HOME_TARGET),
            interaction: InteractionController::new(),
            hologram: HologramAnimator::new(),
            input,
            scene: None,
            settings: Settings::default(),
            progress,
            stats: FrameStats::default(),
            viewport,
            applied_floor: None,
        }
    }

    pub fn set_scene(&mut self, scene: Scene) {
        self.scene = Some(scene);
        self.applied_floor = None;
    }

    pub fn resize(&mut self, width: u32, height: u32, viewport: Vec2) {
        self.camera.set_aspect(width, height);
        self.viewport = viewport;
    }

    /// Advance one frame. While the GUI owns the pointer, scene input is dropped.
    pub fn update(&mut self, dt: f32, ui_wants_pointer: bool) -> FrameOutput {
        self.stats.record(dt);
        let mut out = FrameOutput::default();

        let (orbit_input, clicks) = {
            let mut input = self.input.borrow_mut();
            if ui_wants_pointer || self.scene.is_none() {
                input.discard_pending();
                (OrbitInput::default(), Vec::new())
            } else {
                (input.consume_orbit(), input.take_clicks())
            }
        };

        if let Some(scene) = self.scene.as_mut() {
            for (x, y) in clicks {
                let ndc = ndc_from_pixels(x, y, self.viewport.x, self.viewport.y);
                let ray = self.camera.ray_from_ndc(ndc);
                match self.interaction.handle_click(&ray, scene, &self.camera, &mut self.orbit) {
                    ClickOutcome::OpenUrl(url) => {
                        tracing::info!(url, "opening link");
                        out.links.push(url);
                    }
                    ClickOutcome::Miss | ClickOutcome::Ignored => {}
                    outcome => tracing::debug!(?outcome, "click handled"),
                }
                if scene.pick(&ray, PickRole::Hologram).is_some() && self.hologram.trigger() {
                    tracing::debug!("hologram burst");
                }
            }
        }

        self.interaction.update(dt, &mut self.camera, &mut self.orbit);

        let (rx, ry) = orbit_input.rotate;
        self.orbit.rotate(rx, ry, self.viewport.y);
        let (px, py) = orbit_input.pan;
        self.orbit.pan(px, py, self.viewport.y, &self.camera);
        self.orbit.dolly(orbit_input.wheel);
        self.orbit.update(&mut self.camera);

        if let Some(scene) = self.scene.as_mut() {
            if let Some(rig) = scene.hologram.as_mut() {
                out.points_dirty = self.hologram.update(dt, &mut rig.cloud);
                let group = rig.group;
                scene.spin_group(group, config::HOLOGRAM_SPIN_PER_FRAME);
            }
            apply_floor(scene, &self.settings.floor, &mut self.applied_floor);
        }

        out
    }
}

fn apply_floor(scene: &mut Scene, floor: &FloorMaterial, applied: &mut Option<FloorMaterial>) {
    if applied.as_ref() == Some(floor) {
        return;
    }
    if let Some(id) = scene.floor {
        scene.object_mut(id).material = floor_material(floor);
        *applied = Some(*floor);
    }
}
