use glam::{Mat4, Vec3};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::utils::Mesh;

/// Surface point cloud with a precomputed scatter pose. `current` is what gets drawn.
#[derive(Debug, Clone, Default)]
pub struct HologramCloud {
    pub original: Vec<Vec3>,
    pub scatter: Vec<Vec3>,
    pub current: Vec<Vec3>,
}

impl HologramCloud {
    pub fn from_points(points: Vec<Vec3>, rng: &mut impl Rng) -> Self {
        let scatter = points
            .iter()
            .map(|p| {
                *p + Vec3::new(
                    (rng.random::<f32>() - 0.5) * 20.0,
                    -rng.random::<f32>() * 500.0,
                    (rng.random::<f32>() - 0.5) * 20.0,
                )
            })
            .collect();
        Self { current: points.clone(), original: points, scatter }
    }

    pub fn len(&self) -> usize {
        self.current.len()
    }

    pub fn is_empty(&self) -> bool {
        self.current.is_empty()
    }
}

/// Area-weighted uniform samples over the triangles of `mesh`, transformed by `transform`.
pub fn sample_surface(mesh: &Mesh, transform: Mat4, count: usize, rng: &mut impl Rng) -> Vec<Vec3> {
    let triangles: Vec<[Vec3; 3]> = mesh
        .triangles()
        .map(|tri| tri.map(|p| transform.transform_point3(p)))
        .collect();

    // running area total for weighted picking
    let mut cumulative = Vec::with_capacity(triangles.len());
    let mut total = 0.0f32;
    for [a, b, c] in &triangles {
        total += (*b - *a).cross(*c - *a).length() * 0.5;
        cumulative.push(total);
    }
    if total <= 0.0 {
        return Vec::new();
    }

    (0..count)
        .map(|_| {
            let pick = rng.random::<f32>() * total;
            let i = cumulative.partition_point(|&area| area < pick).min(triangles.len() - 1);
            let [a, b, c] = triangles[i];
            let (mut u, mut v) = (rng.random::<f32>(), rng.random::<f32>());
            if u + v > 1.0 {
                u = 1.0 - u;
                v = 1.0 - v;
            }
            a + (b - a) * u + (c - a) * v
        })
        .collect()
}

pub fn seeded_rng(seed: u64) -> SmallRng {
    SmallRng::seed_from_u64(seed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn samples_lie_on_the_surface() {
        let mut rng = seeded_rng(7);
        let plane = Mesh::plane(4.0, 2.0);
        let shift = Mat4::from_translation(Vec3::new(0.0, 0.0, 3.0));
        let points = sample_surface(&plane, shift, 500, &mut rng);
        assert_eq!(points.len(), 500);
        for p in points {
            assert!((p.z - 3.0).abs() < 1e-5);
            assert!(p.x.abs() <= 2.0 + 1e-5 && p.y.abs() <= 1.0 + 1e-5);
        }
    }

    #[test]
    fn degenerate_mesh_yields_nothing() {
        let mut rng = seeded_rng(1);
        assert!(sample_surface(&Mesh::empty(), Mat4::IDENTITY, 10, &mut rng).is_empty());
    }

    #[test]
    fn scatter_falls_below_and_spreads_sideways() {
        let mut rng = seeded_rng(3);
        let points = vec![Vec3::new(1.0, 2.0, 3.0); 200];
        let cloud = HologramCloud::from_points(points, &mut rng);
        assert_eq!(cloud.len(), 200);
        for (o, s) in cloud.original.iter().zip(&cloud.scatter) {
            assert!(s.y <= o.y && s.y >= o.y - 500.0);
            assert!((s.x - o.x).abs() <= 10.0 && (s.z - o.z).abs() <= 10.0);
        }
        assert_eq!(cloud.current, cloud.original);
    }
}
