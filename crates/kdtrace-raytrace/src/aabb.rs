//! Axis-aligned bounding boxes.
//!
//! Every primitive contributes one box at build time; node boxes are derived
//! from them by union and by clipping against split planes.

use kdtrace_math::{Axis, Interval, Point3, Vec3};

use crate::Ray;

/// Axis-aligned bounding box in 3D.
///
/// A non-empty box always satisfies `min[i] <= max[i]` on every axis.
/// [`Aabb::empty`] is the inverted box used as the identity for
/// [`Aabb::union`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    /// Minimum corner.
    pub min: Point3,
    /// Maximum corner.
    pub max: Point3,
}

impl Aabb {
    /// Create an AABB from min and max corners.
    pub fn new(min: Point3, max: Point3) -> Self {
        debug_assert!(
            min.x <= max.x && min.y <= max.y && min.z <= max.z,
            "inverted bounds: {min:?} > {max:?}"
        );
        Self { min, max }
    }

    /// Smallest box containing two arbitrary corner points.
    pub fn from_points(a: &Point3, b: &Point3) -> Self {
        Self {
            min: Point3::new(a.x.min(b.x), a.y.min(b.y), a.z.min(b.z)),
            max: Point3::new(a.x.max(b.x), a.y.max(b.y), a.z.max(b.z)),
        }
    }

    /// Create an empty (inverted) AABB suitable for expansion.
    pub fn empty() -> Self {
        Self {
            min: Point3::new(f64::INFINITY, f64::INFINITY, f64::INFINITY),
            max: Point3::new(f64::NEG_INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
        }
    }

    /// True for the inverted box, i.e. a box that contains no point.
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    /// True if every coordinate is finite.
    pub fn is_finite(&self) -> bool {
        self.min.iter().chain(self.max.iter()).all(|c| c.is_finite())
    }

    /// Expand this AABB to include a point.
    pub fn include_point(&mut self, p: &Point3) {
        self.min.x = self.min.x.min(p.x);
        self.min.y = self.min.y.min(p.y);
        self.min.z = self.min.z.min(p.z);
        self.max.x = self.max.x.max(p.x);
        self.max.y = self.max.y.max(p.y);
        self.max.z = self.max.z.max(p.z);
    }

    /// Component-wise union of two boxes.
    pub fn union(&self, other: &Aabb) -> Aabb {
        Aabb {
            min: Point3::new(
                self.min.x.min(other.min.x),
                self.min.y.min(other.min.y),
                self.min.z.min(other.min.z),
            ),
            max: Point3::new(
                self.max.x.max(other.max.x),
                self.max.y.max(other.max.y),
                self.max.z.max(other.max.z),
            ),
        }
    }

    /// Grow this box in place to enclose `other`.
    pub fn grow(&mut self, other: &Aabb) {
        *self = self.union(other);
    }

    /// Edge lengths along each axis.
    pub fn extent(&self) -> Vec3 {
        self.max - self.min
    }

    /// `2 * (xy + xz + yz)`; zero for empty and flat-in-two-axes boxes.
    pub fn surface_area(&self) -> f64 {
        if self.is_empty() {
            return 0.0;
        }
        let d = self.extent();
        2.0 * (d.x * d.y + d.x * d.z + d.y * d.z)
    }

    /// Axis of largest extent; ties go to the lower axis (x, then y, then z).
    pub fn dominant_axis(&self) -> Axis {
        let d = self.extent();
        if d.x >= d.y && d.x >= d.z {
            Axis::X
        } else if d.y >= d.z {
            Axis::Y
        } else {
            Axis::Z
        }
    }

    /// Minimum coordinate on `axis`.
    #[inline]
    pub fn lo(&self, axis: Axis) -> f64 {
        self.min[axis.index()]
    }

    /// Maximum coordinate on `axis`.
    #[inline]
    pub fn hi(&self, axis: Axis) -> f64 {
        self.max[axis.index()]
    }

    /// Clip the box by the plane `axis = position` into (below, above) halves.
    pub fn split(&self, axis: Axis, position: f64) -> (Aabb, Aabb) {
        let mut below = *self;
        let mut above = *self;
        below.max[axis.index()] = position;
        above.min[axis.index()] = position;
        (below, above)
    }

    /// Slab test of `ray` against this box, restricted to `range`.
    ///
    /// Returns the parametric `[t_min, t_max]` for which the ray is inside
    /// the box, clipped to `range`, or `None` as soon as one axis produces a
    /// disjoint interval. Slab distances that come out NaN (origin exactly on
    /// a slab with a zero direction component) leave the range unchanged.
    pub fn intersect_ray(&self, ray: &Ray, range: Interval) -> Option<Interval> {
        if self.is_empty() {
            return None;
        }

        let inv = ray.inv_direction();
        let mut t0 = range.min;
        let mut t1 = range.max;

        for i in 0..3 {
            let mut t_near = (self.min[i] - ray.origin[i]) * inv[i];
            let mut t_far = (self.max[i] - ray.origin[i]) * inv[i];
            if t_near > t_far {
                std::mem::swap(&mut t_near, &mut t_far);
            }

            if t_near > t0 {
                t0 = t_near;
            }
            if t_far < t1 {
                t1 = t_far;
            }
            if t0 > t1 {
                return None;
            }
        }

        Some(Interval::new(t0, t1))
    }
}

impl Default for Aabb {
    fn default() -> Self {
        Self::empty()
    }
}
