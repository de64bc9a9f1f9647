//! Ray-triangle intersection (barycentric solve by Cramer's rule).

use kdtrace_math::{Dir3, Interval, Point3};

use crate::{Aabb, HitRecord, Hittable, MaterialId, Ray};

/// Determinants smaller than this are treated as a ray parallel to the
/// triangle's plane.
const PARALLEL_EPSILON: f64 = 1e-12;

/// A triangle given by three vertices, wound counter-clockwise around its
/// outward normal.
#[derive(Debug, Clone, PartialEq)]
pub struct Triangle {
    /// First vertex.
    pub a: Point3,
    /// Second vertex.
    pub b: Point3,
    /// Third vertex.
    pub c: Point3,
    /// Material handle reported with every hit.
    pub material: Option<MaterialId>,
}

impl Triangle {
    /// Create a triangle from its vertices.
    pub fn new(a: Point3, b: Point3, c: Point3) -> Self {
        Self {
            a,
            b,
            c,
            material: None,
        }
    }

    /// Attach a material handle.
    pub fn with_material(mut self, material: MaterialId) -> Self {
        self.material = Some(material);
        self
    }

    /// Unit normal `(b - a) x (c - a)`, or `None` for a degenerate triangle.
    pub fn normal(&self) -> Option<Dir3> {
        Dir3::try_new((self.b - self.a).cross(&(self.c - self.a)), PARALLEL_EPSILON)
    }
}

impl Hittable for Triangle {
    fn bounding_box(&self) -> Aabb {
        let mut bb = Aabb::from_points(&self.a, &self.b);
        bb.include_point(&self.c);
        bb
    }

    /// Edges and vertices count as inside.
    fn hit(&self, ray: &Ray, ray_t: Interval) -> Option<HitRecord> {
        let normal = self.normal()?;

        // Solve a + beta*(b - a) + gamma*(c - a) = o + t*d
        let e1 = self.a - self.b;
        let e2 = self.a - self.c;
        let d = ray.direction.as_ref();
        let j = self.a - ray.origin;

        let c1 = e2.y * d.z - d.y * e2.z;
        let c2 = d.x * e2.z - e2.x * d.z;
        let c3 = e2.x * d.y - e2.y * d.x;

        let det = e1.x * c1 + e1.y * c2 + e1.z * c3;
        if det.abs() < PARALLEL_EPSILON {
            return None;
        }
        let inv_det = 1.0 / det;

        let c4 = e1.x * j.y - j.x * e1.y;
        let c5 = j.x * e1.z - e1.x * j.z;
        let c6 = e1.y * j.z - j.y * e1.z;

        let t = -inv_det * (e2.z * c4 + e2.y * c5 + e2.x * c6);
        if !ray_t.surrounds(t) {
            return None;
        }

        let gamma = inv_det * (d.z * c4 + d.y * c5 + d.x * c6);
        if !(0.0..=1.0).contains(&gamma) {
            return None;
        }

        let beta = inv_det * (j.x * c1 + j.y * c2 + j.z * c3);
        if beta < 0.0 || beta > 1.0 - gamma {
            return None;
        }

        Some(HitRecord::new(ray, t, normal, self.material))
    }
}
