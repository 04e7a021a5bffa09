use std::f32::consts::PI;

use glam::Vec3;

use crate::model::Camera;

/// Orbit rig keeping the camera on a sphere around `target`, with damped rotation, wheel
/// zoom and screen-space panning.
#[derive(Debug, Clone)]
pub struct OrbitControls {
    pub target: Vec3,
    /// When false, pointer input is ignored; `update` still keeps the camera aimed.
    pub enabled: bool,
    pub enable_damping: bool,
    pub damping_factor: f32,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub enable_pan: bool,
    pub enable_zoom: bool,
    pub min_distance: f32,
    pub max_distance: f32,
    pub min_polar_angle: f32,
    pub max_polar_angle: f32,

    delta_theta: f32,
    delta_phi: f32,
    scale: f32,
    pan_offset: Vec3,
}

impl OrbitControls {
    pub fn new(target: Vec3) -> Self {
        Self {
            target,
            enabled: true,
            enable_damping: true,
            damping_factor: 0.085,
            rotate_speed: 0.5,
            zoom_speed: 1.0,
            enable_pan: true,
            enable_zoom: true,
            min_distance: 0.0,
            max_distance: 150.0,
            min_polar_angle: 0.0,
            max_polar_angle: PI * 0.52,
            delta_theta: 0.0,
            delta_phi: 0.0,
            scale: 1.0,
            pan_offset: Vec3::ZERO,
        }
    }

    /// Pointer drag in pixels; a drag across the full viewport height turns a full circle.
    pub fn rotate(&mut self, dx: f32, dy: f32, viewport_height: f32) {
        if !self.enabled {
            return;
        }
        let h = viewport_height.max(1.0);
        self.delta_theta -= 2.0 * PI * dx / h * self.rotate_speed;
        self.delta_phi -= 2.0 * PI * dy / h * self.rotate_speed;
    }

    /// Wheel input; negative deltas move towards the target.
    pub fn dolly(&mut self, wheel_delta_y: f32) {
        if !self.enabled || !self.enable_zoom || wheel_delta_y == 0.0 {
            return;
        }
        let step = 0.95f32.powf(self.zoom_speed);
        if wheel_delta_y < 0.0 {
            self.scale *= step;
        } else {
            self.scale /= step;
        }
    }

    pub fn pan(&mut self, dx: f32, dy: f32, viewport_height: f32, camera: &Camera) {
        if !self.enabled || !self.enable_pan {
            return;
        }
        let h = viewport_height.max(1.0);
        let distance = (camera.eye - self.target).length() * (camera.fov_y * 0.5).tan();
        let forward = camera.forward();
        let right = forward.cross(camera.up).normalize_or_zero();
        let up = right.cross(forward).normalize_or_zero();
        self.pan_offset -= right * (2.0 * dx * distance / h);
        self.pan_offset += up * (2.0 * dy * distance / h);
    }

    /// Apply pending input, enforce limits and place the camera. Runs once per frame.
    pub fn update(&mut self, camera: &mut Camera) {
        let offset = camera.eye - self.target;
        let mut radius = offset.length();
        let (mut theta, mut phi) = if radius > 0.0 {
            (offset.x.atan2(offset.z), (offset.y / radius).clamp(-1.0, 1.0).acos())
        } else {
            (0.0, PI * 0.5)
        };

        let step = if self.enable_damping { self.damping_factor } else { 1.0 };
        theta += self.delta_theta * step;
        phi += self.delta_phi * step;

        const EPS: f32 = 1e-6;
        phi = phi
            .clamp(self.min_polar_angle, self.max_polar_angle)
            .clamp(EPS, PI - EPS);

        radius = (radius * self.scale).clamp(self.min_distance, self.max_distance);
        self.target += self.pan_offset * step;

        let sin_phi = phi.sin();
        let offset = Vec3::new(
            radius * sin_phi * theta.sin(),
            radius * phi.cos(),
            radius * sin_phi * theta.cos(),
        );
        camera.eye = self.target + offset;
        camera.target = self.target;

        if self.enable_damping {
            self.delta_theta *= 1.0 - self.damping_factor;
            self.delta_phi *= 1.0 - self.damping_factor;
            self.pan_offset *= 1.0 - self.damping_factor;
        } else {
            self.delta_theta = 0.0;
            self.delta_phi = 0.0;
            self.pan_offset = Vec3::ZERO;
        }
        self.scale = 1.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rig() -> (OrbitControls, Camera) {
        let mut cam = Camera::new(800, 600);
        cam.eye = Vec3::new(0.0, 0.0, 50.0);
        (OrbitControls::new(Vec3::ZERO), cam)
    }

    #[test]
    fn idle_update_keeps_pose() {
        let (mut orbit, mut cam) = rig();
        orbit.update(&mut cam);
        assert!((cam.eye - Vec3::new(0.0, 0.0, 50.0)).length() < 1e-3);
        assert_eq!(cam.target, Vec3::ZERO);
    }

    #[test]
    fn distance_is_clamped() {
        let (mut orbit, mut cam) = rig();
        cam.eye = Vec3::new(0.0, 0.0, 400.0);
        orbit.update(&mut cam);
        assert!((cam.eye.length() - 150.0).abs() < 1e-3);
    }

    #[test]
    fn polar_angle_cannot_dip_below_floor() {
        let (mut orbit, mut cam) = rig();
        orbit.enable_damping = false;
        // drag upward hard: camera swings under the target
        orbit.rotate(0.0, -2000.0, 600.0);
        orbit.update(&mut cam);
        let phi = (cam.eye.y / cam.eye.length()).acos();
        assert!(phi <= PI * 0.52 + 1e-4);
    }

    #[test]
    fn disabled_ignores_input() {
        let (mut orbit, mut cam) = rig();
        orbit.enabled = false;
        orbit.rotate(300.0, 0.0, 600.0);
        orbit.dolly(-100.0);
        orbit.pan(50.0, 50.0, 600.0, &cam);
        orbit.update(&mut cam);
        assert!((cam.eye - Vec3::new(0.0, 0.0, 50.0)).length() < 1e-3);
    }

    #[test]
    fn damping_spreads_rotation_over_frames() {
        let (mut orbit, mut cam) = rig();
        orbit.rotate(100.0, 0.0, 600.0);
        orbit.update(&mut cam);
        let first = cam.eye;
        orbit.update(&mut cam);
        let second = cam.eye;
        assert!(first != Vec3::new(0.0, 0.0, 50.0));
        assert!(second != first, "rotation keeps coasting");
    }

    #[test]
    fn wheel_up_zooms_in() {
        let (mut orbit, mut cam) = rig();
        orbit.dolly(-1.0);
        orbit.update(&mut cam);
        assert!(cam.eye.length() < 50.0);
    }
}
