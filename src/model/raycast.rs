use glam::{Mat4, Vec3};

use crate::utils::Mesh;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    /// Always unit length.
    pub dir: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, dir: Vec3) -> Self {
        Self { origin, dir: dir.normalize() }
    }

    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.dir * t
    }
}

/// Möller–Trumbore, double sided. Returns the distance along the ray.
pub fn ray_triangle(ray: &Ray, [a, b, c]: [Vec3; 3]) -> Option<f32> {
    const EPS: f32 = 1e-7;
    let e1 = b - a;
    let e2 = c - a;
    let p = ray.dir.cross(e2);
    let det = e1.dot(p);
    if det.abs() < EPS {
        return None;
    }
    let inv_det = 1.0 / det;
    let s = ray.origin - a;
    let u = s.dot(p) * inv_det;
    if !(0.0..=1.0).contains(&u) {
        return None;
    }
    let q = s.cross(e1);
    let v = ray.dir.dot(q) * inv_det;
    if v < 0.0 || u + v > 1.0 {
        return None;
    }
    let t = e2.dot(q) * inv_det;
    (t > EPS).then_some(t)
}

/// Nearest hit of `ray` against `mesh` placed in the world by `world`.
/// The distance is measured in world units.
pub fn ray_mesh(ray: &Ray, mesh: &Mesh, world: Mat4) -> Option<f32> {
    let inv = world.inverse();
    let local_origin = inv.transform_point3(ray.origin);
    let local_dir = inv.transform_vector3(ray.dir);
    if local_dir.length_squared() == 0.0 {
        return None;
    }
    let local = Ray::new(local_origin, local_dir);

    mesh.triangles()
        .filter_map(|tri| ray_triangle(&local, tri))
        .map(|t| world.transform_point3(local.at(t)).distance(ray.origin))
        .min_by(|a, b| a.total_cmp(b))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_triangle() -> [Vec3; 3] {
        [Vec3::new(-1.0, -1.0, 0.0), Vec3::new(1.0, -1.0, 0.0), Vec3::new(0.0, 1.0, 0.0)]
    }

    #[test]
    fn hits_triangle_head_on() {
        let ray = Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::NEG_Z);
        let t = ray_triangle(&ray, unit_triangle()).unwrap();
        assert!((t - 5.0).abs() < 1e-5);
    }

    #[test]
    fn hits_back_face_too() {
        let ray = Ray::new(Vec3::new(0.0, 0.0, -5.0), Vec3::Z);
        assert!(ray_triangle(&ray, unit_triangle()).is_some());
    }

    #[test]
    fn misses_beside_and_behind() {
        let beside = Ray::new(Vec3::new(3.0, 0.0, 5.0), Vec3::NEG_Z);
        assert!(ray_triangle(&beside, unit_triangle()).is_none());
        let behind = Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::Z);
        assert!(ray_triangle(&behind, unit_triangle()).is_none());
    }

    #[test]
    fn mesh_hit_respects_world_transform() {
        let plane = Mesh::plane(2.0, 2.0);
        let world = Mat4::from_translation(Vec3::new(10.0, 0.0, 0.0)) * Mat4::from_scale(Vec3::splat(3.0));
        let ray = Ray::new(Vec3::new(12.5, 0.0, 8.0), Vec3::NEG_Z);
        let t = ray_mesh(&ray, &plane, world).unwrap();
        assert!((t - 8.0).abs() < 1e-4);
        let outside = Ray::new(Vec3::new(13.5, 0.0, 8.0), Vec3::NEG_Z);
        assert!(ray_mesh(&outside, &plane, world).is_none());
    }

    #[test]
    fn mesh_reports_nearest_face() {
        let cube = Mesh::cuboid(2.0, 2.0, 2.0);
        let ray = Ray::new(Vec3::new(0.0, 0.0, 10.0), Vec3::NEG_Z);
        let t = ray_mesh(&ray, &cube, Mat4::IDENTITY).unwrap();
        assert!((t - 9.0).abs() < 1e-4);
    }
}
