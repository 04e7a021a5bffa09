use glam::{Mat4, Vec2, Vec3};

use crate::config;
use crate::model::raycast::Ray;

/// Perspective camera looking from `eye` at `target`. The orbit rig owns the target and keeps
/// it in sync every frame.
#[derive(Debug, Clone)]
pub struct Camera {
    pub eye: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    pub fov_y: f32,
    pub aspect: f32,
    pub z_near: f32,
    pub z_far: f32,
}

impl Camera {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            eye: config::HOME_EYE,
            target: config::HOME_TARGET,
            up: Vec3::Y,
            fov_y: config::CAMERA_FOV_DEG.to_radians(),
            aspect: width.max(1) as f32 / height.max(1) as f32,
            z_near: config::CAMERA_NEAR,
            z_far: config::CAMERA_FAR,
        }
    }

    pub fn forward(&self) -> Vec3 {
        let dir = (self.target - self.eye).normalize_or_zero();
        if dir == Vec3::ZERO { Vec3::NEG_Z } else { dir }
    }

    pub fn set_aspect(&mut self, width: u32, height: u32) {
        self.aspect = width.max(1) as f32 / height.max(1) as f32;
    }

    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, self.target, self.up)
    }

    pub fn proj(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y, self.aspect, self.z_near, self.z_far)
    }

    pub fn view_proj(&self) -> Mat4 {
        self.proj() * self.view()
    }

    /// View-projection of the camera seen through a horizontal mirror at `height`.
    pub fn mirrored_view_proj(&self, height: f32) -> Mat4 {
        self.view_proj() * reflection_about_y(height)
    }

    pub fn mirrored_eye(&self, height: f32) -> Vec3 {
        reflection_about_y(height).transform_point3(self.eye)
    }

    /// Ray through a point in normalised device coordinates (x right, y up, both in -1..1).
    pub fn ray_from_ndc(&self, ndc: Vec2) -> Ray {
        let inv = self.view_proj().inverse();
        // wgpu clip space depth runs 0..1
        let near = inv.project_point3(Vec3::new(ndc.x, ndc.y, 0.0));
        let far = inv.project_point3(Vec3::new(ndc.x, ndc.y, 1.0));
        Ray::new(near, far - near)
    }
}

/// Map a pointer position in pixels to normalised device coordinates.
pub fn ndc_from_pixels(x: f32, y: f32, width: f32, height: f32) -> Vec2 {
    Vec2::new(
        (x / width.max(1.0)) * 2.0 - 1.0,
        -(y / height.max(1.0)) * 2.0 + 1.0,
    )
}

fn reflection_about_y(height: f32) -> Mat4 {
    Mat4::from_translation(Vec3::new(0.0, height, 0.0))
        * Mat4::from_scale(Vec3::new(1.0, -1.0, 1.0))
        * Mat4::from_translation(Vec3::new(0.0, -height, 0.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn centre_ray_points_at_target() {
        let cam = Camera::new(800, 600);
        let ray = cam.ray_from_ndc(Vec2::ZERO);
        let expected = (cam.target - cam.eye).normalize();
        assert!((ray.dir - expected).length() < 1e-4);
        // origin sits on the near plane in front of the eye
        assert!(((ray.origin - cam.eye).length() - cam.z_near).abs() < 1e-3);
    }

    #[test]
    fn pixel_corners_map_to_ndc_corners() {
        assert_eq!(ndc_from_pixels(0.0, 0.0, 100.0, 50.0), Vec2::new(-1.0, 1.0));
        assert_eq!(ndc_from_pixels(100.0, 50.0, 100.0, 50.0), Vec2::new(1.0, -1.0));
        assert_eq!(ndc_from_pixels(50.0, 25.0, 100.0, 50.0), Vec2::ZERO);
    }

    #[test]
    fn mirror_reflects_eye_across_plane() {
        let mut cam = Camera::new(800, 600);
        cam.eye = Vec3::new(1.0, 4.0, 2.0);
        let m = cam.mirrored_eye(-1.0);
        assert!((m - Vec3::new(1.0, -6.0, 2.0)).length() < 1e-5);
    }

    #[test]
    fn aspect_tracks_resize() {
        let mut cam = Camera::new(800, 600);
        cam.set_aspect(1920, 1080);
        assert!((cam.aspect - 16.0 / 9.0).abs() < 1e-5);
    }
}
