//! Ray-sphere intersection (quadratic equation).

use kdtrace_math::{Dir3, Interval, Point3, Vec3};

use crate::{Aabb, HitRecord, Hittable, MaterialId, Ray};

/// A sphere given by center and radius.
#[derive(Debug, Clone, PartialEq)]
pub struct Sphere {
    /// Center point.
    pub center: Point3,
    /// Radius, never negative.
    pub radius: f64,
    /// Material handle reported with every hit.
    pub material: Option<MaterialId>,
}

impl Sphere {
    /// Create a sphere. Negative radii are clamped to zero.
    pub fn new(center: Point3, radius: f64) -> Self {
        Self {
            center,
            radius: radius.max(0.0),
            material: None,
        }
    }

    /// Attach a material handle.
    pub fn with_material(mut self, material: MaterialId) -> Self {
        self.material = Some(material);
        self
    }
}

impl Hittable for Sphere {
    fn bounding_box(&self) -> Aabb {
        let r = Vec3::new(self.radius, self.radius, self.radius);
        Aabb::from_points(&(self.center - r), &(self.center + r))
    }

    /// Takes the nearer root if it lies strictly inside `ray_t`, otherwise
    /// the farther one.
    fn hit(&self, ray: &Ray, ray_t: Interval) -> Option<HitRecord> {
        let oc = self.center - ray.origin;
        let d = ray.direction.as_ref();

        // Half-b form of |o + t*d - c|^2 = r^2
        let a = d.norm_squared();
        let h = d.dot(&oc);
        let c = oc.norm_squared() - self.radius * self.radius;

        let discriminant = h * h - a * c;
        if discriminant < 0.0 {
            return None;
        }

        let sqrt_disc = discriminant.sqrt();
        let mut root = (h - sqrt_disc) / a;
        if !ray_t.surrounds(root) {
            root = (h + sqrt_disc) / a;
            if !ray_t.surrounds(root) {
                return None;
            }
        }

        let point = ray.at(root);
        let outward = if self.radius > 0.0 {
            Dir3::new_unchecked((point - self.center) / self.radius)
        } else {
            Dir3::new_unchecked(-d)
        };
        Some(HitRecord::new(ray, root, outward, self.material))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn all() -> Interval {
        Interval::new(0.0, f64::INFINITY)
    }

    #[test]
    fn test_ray_sphere_through_center() {
        let sphere = Sphere::new(Point3::origin(), 5.0);
        let ray = Ray::new(Point3::new(-10.0, 0.0, 0.0), Vec3::new(1.0, 0.0, 0.0));
        let hit = sphere.hit(&ray, all()).expect("ray passes through center");
        assert_relative_eq!(hit.t, 5.0, epsilon = 1e-10);
        assert_relative_eq!(hit.point.x, -5.0, epsilon = 1e-10);
        assert!(hit.front_face);
        assert_relative_eq!(hit.normal.x, -1.0, epsilon = 1e-10);
    }

    #[test]
    fn test_ray_sphere_miss() {
        let sphere = Sphere::new(Point3::origin(), 5.0);
        let ray = Ray::new(Point3::new(-10.0, 10.0, 0.0), Vec3::new(1.0, 0.0, 0.0));
        assert!(sphere.hit(&ray, all()).is_none());
    }

    #[test]
    fn test_ray_sphere_from_inside() {
        let sphere = Sphere::new(Point3::origin(), 5.0);
        let ray = Ray::new(Point3::origin(), Vec3::new(1.0, 0.0, 0.0));
        let hit = sphere.hit(&ray, all()).expect("exit point");
        assert_relative_eq!(hit.t, 5.0, epsilon = 1e-10);
        assert!(!hit.front_face);
        // Normal is flipped to face back toward the origin
        assert_relative_eq!(hit.normal.x, -1.0, epsilon = 1e-10);
    }

    #[test]
    fn test_ray_sphere_respects_range() {
        let sphere = Sphere::new(Point3::origin(), 5.0);
        let ray = Ray::new(Point3::new(-10.0, 0.0, 0.0), Vec3::new(1.0, 0.0, 0.0));
        // Near root excluded, far root admitted
        let hit = sphere.hit(&ray, Interval::new(6.0, 100.0)).expect("far root");
        assert_relative_eq!(hit.t, 15.0, epsilon = 1e-10);
        // Both roots excluded
        assert!(sphere.hit(&ray, Interval::new(0.0, 5.0)).is_none());
    }

    #[test]
    fn test_negative_radius_clamped() {
        let sphere = Sphere::new(Point3::new(1.0, 2.0, 3.0), -4.0);
        assert_eq!(sphere.radius, 0.0);
        let bb = sphere.bounding_box();
        assert_eq!(bb.min, bb.max);
    }

    #[test]
    fn test_sphere_bounding_box() {
        let bb = Sphere::new(Point3::new(1.0, 0.0, 0.0), 2.0).bounding_box();
        assert_relative_eq!(bb.min.x, -1.0);
        assert_relative_eq!(bb.max.x, 3.0);
        assert_relative_eq!(bb.max.z, 2.0);
    }
}
