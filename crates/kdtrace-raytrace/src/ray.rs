//! Ray representation and hit records.

use kdtrace_math::{Dir3, Point3, Vec3};

/// Opaque handle to a material owned by whoever shades the hit.
pub type MaterialId = u32;

/// A ray in 3D space defined by origin and direction.
#[derive(Debug, Clone, Copy)]
pub struct Ray {
    /// Origin point of the ray.
    pub origin: Point3,
    /// Unit direction of the ray.
    pub direction: Dir3,
    /// Precomputed reciprocal of direction components for slab tests and
    /// split-plane distances.
    inv_direction: Vec3,
}

impl Ray {
    /// Create a new ray from origin and direction.
    ///
    /// The direction will be normalized, so ray parameters are distances.
    /// Zero components give infinite reciprocals, which the slab and
    /// split-plane tests handle.
    pub fn new(origin: Point3, direction: Vec3) -> Self {
        let dir = Dir3::new_normalize(direction);
        let inv = Vec3::new(1.0 / dir.x, 1.0 / dir.y, 1.0 / dir.z);
        Self {
            origin,
            direction: dir,
            inv_direction: inv,
        }
    }

    /// Ray from `origin` through `target`.
    pub fn towards(origin: Point3, target: Point3) -> Self {
        Self::new(origin, target - origin)
    }

    /// Evaluate the ray at parameter `t`: `origin + t * direction`.
    #[inline]
    pub fn at(&self, t: f64) -> Point3 {
        self.origin + t * self.direction.as_ref()
    }

    /// Component-wise reciprocal of the direction.
    #[inline]
    pub fn inv_direction(&self) -> &Vec3 {
        &self.inv_direction
    }
}

/// Result of a ray-primitive intersection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitRecord {
    /// Parameter (distance) along the ray where the intersection occurs.
    pub t: f64,
    /// 3D intersection point.
    pub point: Point3,
    /// Unit surface normal, oriented against the incoming ray.
    pub normal: Dir3,
    /// True if the ray hit the outward-facing side of the surface.
    pub front_face: bool,
    /// Material of the primitive, if it has one.
    pub material: Option<MaterialId>,
    /// Index of the primitive in the world. Primitives report `0`; the
    /// world scan and the kd-tree stamp the real index.
    pub primitive: usize,
}

impl HitRecord {
    /// Build a hit record at `t`, orienting `outward_normal` against `ray`.
    pub fn new(
        ray: &Ray,
        t: f64,
        outward_normal: Dir3,
        material: Option<MaterialId>,
    ) -> Self {
        let mut hit = Self {
            t,
            point: ray.at(t),
            normal: outward_normal,
            front_face: true,
            material,
            primitive: 0,
        };
        hit.set_face_normal(ray, outward_normal);
        hit
    }

    /// Store `outward_normal` flipped if needed so it faces the ray origin.
    pub fn set_face_normal(&mut self, ray: &Ray, outward_normal: Dir3) {
        self.front_face = ray.direction.dot(outward_normal.as_ref()) < 0.0;
        self.normal = if self.front_face {
            outward_normal
        } else {
            Dir3::new_unchecked(-outward_normal.into_inner())
        };
    }

    /// Same hit, attributed to primitive `index`.
    pub fn with_primitive(mut self, index: usize) -> Self {
        self.primitive = index;
        self
    }
}
