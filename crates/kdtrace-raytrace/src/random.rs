//! Seeded random scenes and ray batches for cross-validation and benchmarks.

use kdtrace_math::{Point3, Vec3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::shapes::Sphere;
use crate::{Ray, World};

/// `count` unit spheres with centers uniform in `[-extent, extent]^3`.
pub fn random_spheres(count: usize, extent: f64, seed: u64) -> World {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|_| Sphere::new(random_point(&mut rng, extent), 1.0).into())
        .collect()
}

/// `count` rays starting uniformly in `[-extent, extent]^3` with directions
/// uniform on the unit sphere.
pub fn random_rays(count: usize, extent: f64, seed: u64) -> Vec<Ray> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|_| {
            let origin = random_point(&mut rng, extent);
            Ray::new(origin, random_unit_vector(&mut rng))
        })
        .collect()
}

fn random_point(rng: &mut impl Rng, extent: f64) -> Point3 {
    Point3::new(
        rng.random_range(-extent..=extent),
        rng.random_range(-extent..=extent),
        rng.random_range(-extent..=extent),
    )
}

/// Rejection-sampled direction; never the zero vector.
fn random_unit_vector(rng: &mut impl Rng) -> Vec3 {
    loop {
        let v = Vec3::new(
            rng.random_range(-1.0..1.0),
            rng.random_range(-1.0..1.0),
            rng.random_range(-1.0..1.0),
        );
        let len_sq = v.norm_squared();
        if len_sq > 1e-160 && len_sq <= 1.0 {
            return v / len_sq.sqrt();
        }
    }
}
