//! The primitive contract consumed by the world scan and the kd-tree.

use kdtrace_math::Interval;

use crate::{Aabb, HitRecord, Ray};

/// Anything a ray can be intersected with.
///
/// Implementations must be pure: the kd-tree calls `hit` concurrently from
/// many threads through shared references.
pub trait Hittable {
    /// Box enclosing every point `hit` can report.
    fn bounding_box(&self) -> Aabb;

    /// Nearest intersection with `ray` whose parameter lies strictly inside
    /// `ray_t`, if any.
    fn hit(&self, ray: &Ray, ray_t: Interval) -> Option<HitRecord>;
}

impl<T: Hittable + ?Sized> Hittable for &T {
    fn bounding_box(&self) -> Aabb {
        (**self).bounding_box()
    }

    fn hit(&self, ray: &Ray, ray_t: Interval) -> Option<HitRecord> {
        (**self).hit(ray, ray_t)
    }
}

impl<T: Hittable + ?Sized> Hittable for Box<T> {
    fn bounding_box(&self) -> Aabb {
        (**self).bounding_box()
    }

    fn hit(&self, ray: &Ray, ray_t: Interval) -> Option<HitRecord> {
        (**self).hit(ray, ray_t)
    }
}
