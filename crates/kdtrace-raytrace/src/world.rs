//! The scene collaborator: an ordered, index-stable list of primitives.

use kdtrace_math::Interval;

use crate::error::Result;
use crate::shapes::Shape;
use crate::{Aabb, HitRecord, Hittable, KdTree, KdTreeSettings, Ray};

/// Ordered collection of shapes.
///
/// Indices returned by [`World::add`] never change; the kd-tree refers to
/// primitives only by these indices.
#[derive(Debug, Clone, Default)]
pub struct World {
    objects: Vec<Shape>,
}

impl World {
    /// Create an empty world.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a shape and return its index.
    pub fn add(&mut self, shape: impl Into<Shape>) -> usize {
        self.objects.push(shape.into());
        self.objects.len() - 1
    }

    /// Number of shapes.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// True if the world holds no shapes.
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// All shapes in index order.
    pub fn objects(&self) -> &[Shape] {
        &self.objects
    }

    /// Shape at `index`, if any.
    pub fn get(&self, index: usize) -> Option<&Shape> {
        self.objects.get(index)
    }

    /// Build a kd-tree over this world's shapes.
    pub fn build_kdtree(&self, settings: &KdTreeSettings) -> Result<KdTree<'_, Shape>> {
        KdTree::build(&self.objects, settings)
    }
}

impl FromIterator<Shape> for World {
    fn from_iter<I: IntoIterator<Item = Shape>>(iter: I) -> Self {
        Self {
            objects: iter.into_iter().collect(),
        }
    }
}

impl Hittable for World {
    /// Union of every shape's box; the empty box for an empty world.
    fn bounding_box(&self) -> Aabb {
        self.objects
            .iter()
            .fold(Aabb::empty(), |acc, s| acc.union(&s.bounding_box()))
    }

    /// Brute-force linear scan over every shape, shrinking the admissible
    /// range to the closest hit found so far.
    ///
    /// Like [`KdTree::intersect`], only hits at `t >= 0` are reported.
    fn hit(&self, ray: &Ray, ray_t: Interval) -> Option<HitRecord> {
        let ray_t = Interval::new(ray_t.min.max(0.0), ray_t.max);
        let mut closest: Option<HitRecord> = None;
        let mut closest_t = ray_t.max;

        for (index, shape) in self.objects.iter().enumerate() {
            if let Some(hit) = shape.hit(ray, ray_t.with_max(closest_t)) {
                closest_t = hit.t;
                closest = Some(hit.with_primitive(index));
            }
        }

        closest
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::{Sphere, Triangle};
    use approx::assert_relative_eq;
    use kdtrace_math::{Point3, Vec3};

    #[test]
    fn test_add_returns_stable_indices() {
        let mut world = World::new();
        assert!(world.is_empty());
        assert_eq!(world.add(Sphere::new(Point3::origin(), 1.0)), 0);
        assert_eq!(
            world.add(Triangle::new(
                Point3::origin(),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
            )),
            1
        );
        assert_eq!(world.len(), 2);
        assert!(matches!(world.get(1), Some(Shape::Triangle(_))));
    }

    #[test]
    fn test_world_hit_picks_closest() {
        let mut world = World::new();
        world.add(Sphere::new(Point3::new(0.0, 0.0, -10.0), 1.0));
        world.add(Sphere::new(Point3::new(0.0, 0.0, -5.0), 1.0));
        world.add(Sphere::new(Point3::new(0.0, 0.0, -20.0), 1.0));

        let ray = Ray::new(Point3::origin(), Vec3::new(0.0, 0.0, -1.0));
        let hit = world
            .hit(&ray, Interval::new(0.0, f64::INFINITY))
            .expect("ray hits all three spheres");
        assert_eq!(hit.primitive, 1);
        assert_relative_eq!(hit.t, 4.0, epsilon = 1e-10);
    }

    #[test]
    fn test_empty_world() {
        let world = World::new();
        assert!(world.bounding_box().is_empty());
        let ray = Ray::new(Point3::origin(), Vec3::new(0.0, 0.0, -1.0));
        assert!(world.hit(&ray, Interval::UNIVERSE).is_none());
    }

    #[test]
    fn test_world_bounding_box() {
        let world: World = [
            Shape::from(Sphere::new(Point3::new(-2.0, 0.0, 0.0), 1.0)),
            Shape::from(Sphere::new(Point3::new(3.0, 1.0, 0.0), 0.5)),
        ]
        .into_iter()
        .collect();
        let bb = world.bounding_box();
        assert_relative_eq!(bb.min.x, -3.0);
        assert_relative_eq!(bb.max.x, 3.5);
        assert_relative_eq!(bb.max.y, 1.5);
    }
}
