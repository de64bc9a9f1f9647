//! Geometric primitives that can populate a [`World`](crate::World).
//!
//! Each primitive type has its own closed-form intersector; [`Shape`]
//! dispatches over them so a world is a flat, unboxed list.

mod sphere;
mod triangle;

pub use sphere::Sphere;
pub use triangle::Triangle;

use kdtrace_math::Interval;

use crate::{Aabb, HitRecord, Hittable, Ray};

/// Any primitive the tracer knows how to intersect.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    /// A sphere.
    Sphere(Sphere),
    /// A single triangle.
    Triangle(Triangle),
}

impl Hittable for Shape {
    fn bounding_box(&self) -> Aabb {
        match self {
            Shape::Sphere(s) => s.bounding_box(),
            Shape::Triangle(t) => t.bounding_box(),
        }
    }

    fn hit(&self, ray: &Ray, ray_t: Interval) -> Option<HitRecord> {
        match self {
            Shape::Sphere(s) => s.hit(ray, ray_t),
            Shape::Triangle(t) => t.hit(ray, ray_t),
        }
    }
}

impl From<Sphere> for Shape {
    fn from(sphere: Sphere) -> Self {
        Shape::Sphere(sphere)
    }
}

impl From<Triangle> for Shape {
    fn from(triangle: Triangle) -> Self {
        Shape::Triangle(triangle)
    }
}
