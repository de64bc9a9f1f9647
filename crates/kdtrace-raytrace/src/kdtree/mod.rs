//! SAH kd-tree over a borrowed slice of primitives.
//!
//! The tree is built once from the primitives' bounding boxes and is
//! immutable afterwards. It refers to primitives only by their index in the
//! slice and never copies or reorders them.
//!
//! ```text
//!   build:    prim bounds -> edge sweep (edge.rs) -> Builder (build.rs)
//!                                                  -> nodes + index pool
//!   query:    ray -> root slab test -> near/far walk (traverse.rs) -> hit
//! ```

mod build;
mod edge;
mod node;
mod traverse;

use std::fmt;

use kdtrace_math::Interval;
use tracing::debug;

use crate::error::{Result, TraceError};
use crate::{Aabb, HitRecord, Hittable, KdTreeSettings, Ray};

use build::Builder;
pub use edge::{BoundEdge, CostModel, EdgeKind, SplitCandidate};
pub use node::{KdNode, Leaf};

/// Summary of a built tree's shape.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TreeStats {
    /// Total number of nodes.
    pub nodes: usize,
    /// Interior (split) nodes.
    pub interior: usize,
    /// Leaf nodes, including empty ones.
    pub leaves: usize,
    /// Leaves holding no primitives.
    pub empty_leaves: usize,
    /// Depth of the deepest leaf; the root is at depth 0.
    pub max_leaf_depth: u32,
    /// Primitive references summed over all leaves.
    pub leaf_references: usize,
    /// Accepted splits that cost more than a leaf would have.
    pub bad_refines: usize,
    /// Nodes turned into leaves by the cost guards.
    pub forced_leaves: usize,
    /// Depth limit the tree was built with.
    pub max_depth: u32,
}

impl fmt::Display for TreeStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "nodes:           {}", self.nodes)?;
        writeln!(f, "  interior:      {}", self.interior)?;
        writeln!(f, "  leaves:        {}", self.leaves)?;
        writeln!(f, "  empty leaves:  {}", self.empty_leaves)?;
        writeln!(f, "leaf references: {}", self.leaf_references)?;
        writeln!(
            f,
            "leaf depth:      {} (limit {})",
            self.max_leaf_depth, self.max_depth
        )?;
        writeln!(f, "bad refines:     {}", self.bad_refines)?;
        write!(f, "forced leaves:   {}", self.forced_leaves)
    }
}

/// Kd-tree accelerating closest-hit queries over `primitives`.
#[derive(Debug, Clone)]
pub struct KdTree<'w, P> {
    primitives: &'w [P],
    nodes: Vec<KdNode>,
    index_pool: Vec<u32>,
    bounds: Aabb,
    max_depth: u32,
    stats: TreeStats,
}

impl<'w, P: Hittable> KdTree<'w, P> {
    /// Build a tree over `primitives`.
    ///
    /// An empty slice gives a tree whose root is a single empty leaf.
    ///
    /// # Errors
    ///
    /// Fails if `settings` do not validate, a primitive reports a
    /// non-finite bounding box, or there are more primitives than `u32`
    /// indices can address.
    #[tracing::instrument(skip_all, fields(prim_count = primitives.len()))]
    pub fn build(primitives: &'w [P], settings: &KdTreeSettings) -> Result<Self> {
        settings.validate()?;
        if u32::try_from(primitives.len()).is_err() {
            return Err(TraceError::TooManyPrimitives(primitives.len()));
        }

        let mut bounds = Aabb::empty();
        let mut prim_bounds = Vec::with_capacity(primitives.len());
        for (index, prim) in primitives.iter().enumerate() {
            let bb = prim.bounding_box();
            if !bb.is_finite() {
                return Err(TraceError::NonFiniteBounds { index });
            }
            bounds.grow(&bb);
            prim_bounds.push(bb);
        }

        let max_depth = settings.resolve_max_depth(primitives.len());
        let cost = CostModel {
            intersection: settings.intersection_cost,
            traversal: settings.traversal_cost,
            empty_bonus: settings.empty_bonus,
        };
        let built =
            Builder::new(&prim_bounds, cost, settings.max_prims_per_leaf).build(&bounds, max_depth);

        let mut tree = Self {
            primitives,
            nodes: built.nodes,
            index_pool: built.index_pool,
            bounds,
            max_depth,
            stats: TreeStats::default(),
        };
        tree.stats = tree.collect_stats(built.bad_refines, built.forced_leaves);

        debug!(
            nodes = tree.stats.nodes,
            leaves = tree.stats.leaves,
            empty_leaves = tree.stats.empty_leaves,
            leaf_refs = tree.stats.leaf_references,
            depth = tree.stats.max_leaf_depth,
            max_depth,
            "kd-tree built"
        );
        Ok(tree)
    }
}

impl<'w, P> KdTree<'w, P> {
    /// The primitives this tree indexes.
    pub fn primitives(&self) -> &'w [P] {
        self.primitives
    }

    /// Node array; the root is at index 0.
    pub fn nodes(&self) -> &[KdNode] {
        &self.nodes
    }

    /// Shared primitive index pool for leaves with more than one primitive.
    pub fn index_pool(&self) -> &[u32] {
        &self.index_pool
    }

    /// Union of all primitive bounds.
    pub fn bounds(&self) -> &Aabb {
        &self.bounds
    }

    /// Depth limit used while building.
    pub fn max_depth(&self) -> u32 {
        self.max_depth
    }

    /// Shape statistics gathered after the build.
    pub fn stats(&self) -> &TreeStats {
        &self.stats
    }

    /// Primitive indices held by node `index`; empty for interior nodes.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range.
    pub fn leaf_primitives(&self, index: u32) -> &[u32] {
        match &self.nodes[index as usize] {
            KdNode::Leaf(Leaf::Single(prim)) => std::slice::from_ref(prim),
            KdNode::Leaf(Leaf::Many { offset, count }) => {
                let start = *offset as usize;
                &self.index_pool[start..start + *count as usize]
            }
            KdNode::Leaf(Leaf::Empty) | KdNode::Interior { .. } => &[],
        }
    }

    /// Depth-first walk over `(node index, depth)` pairs, below child first.
    pub fn walk(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        let mut stack = vec![(0u32, 0u32)];
        std::iter::from_fn(move || {
            let (index, depth) = stack.pop()?;
            if let KdNode::Interior { above_child, .. } = self.nodes[index as usize] {
                stack.push((above_child, depth + 1));
                stack.push((index + 1, depth + 1));
            }
            Some((index, depth))
        })
    }

    fn collect_stats(&self, bad_refines: usize, forced_leaves: usize) -> TreeStats {
        let mut stats = TreeStats {
            nodes: self.nodes.len(),
            bad_refines,
            forced_leaves,
            max_depth: self.max_depth,
            ..Default::default()
        };
        for (index, depth) in self.walk() {
            match &self.nodes[index as usize] {
                KdNode::Interior { .. } => stats.interior += 1,
                KdNode::Leaf(leaf) => {
                    stats.leaves += 1;
                    stats.leaf_references += leaf.prim_count();
                    if *leaf == Leaf::Empty {
                        stats.empty_leaves += 1;
                    }
                    stats.max_leaf_depth = stats.max_leaf_depth.max(depth);
                }
            }
        }
        stats
    }
}

impl<P: Hittable> Hittable for KdTree<'_, P> {
    fn bounding_box(&self) -> Aabb {
        self.bounds
    }

    fn hit(&self, ray: &Ray, ray_t: Interval) -> Option<HitRecord> {
        self.intersect(ray, ray_t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::{Shape, Sphere, Triangle};
    use crate::World;
    use kdtrace_math::{Point3, Vec3};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn random_world(count: usize, seed: u64) -> World {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..count)
            .map(|_| {
                let center = Point3::new(
                    rng.random_range(-20.0..20.0),
                    rng.random_range(-20.0..20.0),
                    rng.random_range(-20.0..20.0),
                );
                Shape::from(Sphere::new(center, rng.random_range(0.2..1.5)))
            })
            .collect()
    }

    #[test]
    fn test_empty_world_is_single_empty_leaf() {
        let world = World::new();
        let tree = world.build_kdtree(&KdTreeSettings::default()).unwrap();

        assert_eq!(tree.nodes(), &[KdNode::Leaf(Leaf::Empty)]);
        assert!(tree.bounds().is_empty());
        assert_eq!(tree.stats().empty_leaves, 1);

        let ray = Ray::new(Point3::origin(), Vec3::new(0.0, 0.0, 1.0));
        assert!(tree.intersect(&ray, Interval::UNIVERSE).is_none());
    }

    #[test]
    fn test_single_primitive_world() {
        let mut world = World::new();
        world.add(Sphere::new(Point3::new(0.0, 0.0, -3.0), 1.0));
        let tree = world.build_kdtree(&KdTreeSettings::default()).unwrap();

        assert_eq!(tree.nodes().len(), 1);
        assert_eq!(tree.leaf_primitives(0), &[0]);

        let ray = Ray::new(Point3::origin(), Vec3::new(0.0, 0.0, -1.0));
        let hit = tree.intersect(&ray, Interval::new(0.0, f64::INFINITY)).unwrap();
        assert_eq!(hit.primitive, 0);
    }

    #[test]
    fn test_below_child_is_next_slot() {
        let world = random_world(300, 7);
        let tree = world.build_kdtree(&KdTreeSettings::default()).unwrap();
        let mut interior = 0;
        for (index, node) in tree.nodes().iter().enumerate() {
            if let KdNode::Interior { above_child, .. } = *node {
                interior += 1;
                assert!(above_child as usize > index + 1);
            }
        }
        assert!(interior > 0);
        // Every node is reachable exactly once
        assert_eq!(tree.walk().count(), tree.nodes().len());
    }

    #[test]
    fn test_depth_respects_limit() {
        let world = random_world(500, 11);
        for max_depth in [0, 1, 3, 6] {
            let settings = KdTreeSettings {
                max_depth: Some(max_depth),
                ..Default::default()
            };
            let tree = world.build_kdtree(&settings).unwrap();
            assert!(tree.stats().max_leaf_depth <= max_depth);
            assert_eq!(tree.max_depth(), max_depth);
        }

        let tree = world.build_kdtree(&KdTreeSettings::default()).unwrap();
        assert!(tree.stats().max_leaf_depth <= tree.max_depth());
    }

    #[test]
    fn test_every_primitive_in_some_leaf() {
        let world = random_world(400, 3);
        let tree = world.build_kdtree(&KdTreeSettings::default()).unwrap();

        let mut seen = vec![0usize; world.len()];
        for (index, _) in tree.walk() {
            for &prim in tree.leaf_primitives(index) {
                seen[prim as usize] += 1;
            }
        }
        assert!(seen.iter().all(|&count| count >= 1));
        assert_eq!(seen.iter().sum::<usize>(), tree.stats().leaf_references);
    }

    #[test]
    fn test_straddler_lands_in_both_children() {
        let mut world = World::new();
        for i in 0..6 {
            world.add(Sphere::new(Point3::new(4.0 * i as f64, 0.0, 0.0), 0.5));
        }
        // A long thin triangle across the whole row
        let long = world.add(Triangle::new(
            Point3::new(-1.0, 1.0, 0.0),
            Point3::new(21.0, 1.0, 0.0),
            Point3::new(-1.0, 1.2, 0.0),
        ));
        let tree = world.build_kdtree(&KdTreeSettings::default()).unwrap();

        let leaves_with_long = tree
            .walk()
            .filter(|&(index, _)| tree.leaf_primitives(index).contains(&(long as u32)))
            .count();
        assert!(leaves_with_long > 1);
    }

    #[test]
    fn test_rebuild_is_deterministic() {
        let world = random_world(500, 42);
        let settings = KdTreeSettings::default();
        let a = world.build_kdtree(&settings).unwrap();
        let b = world.build_kdtree(&settings).unwrap();
        assert_eq!(a.nodes(), b.nodes());
        assert_eq!(a.index_pool(), b.index_pool());
        assert_eq!(a.stats(), b.stats());
    }

    #[test]
    fn test_rejects_invalid_input() {
        let world = random_world(4, 1);
        let settings = KdTreeSettings {
            max_prims_per_leaf: 0,
            ..Default::default()
        };
        assert!(matches!(
            world.build_kdtree(&settings),
            Err(TraceError::InvalidSettings(_))
        ));

        let bad = [
            Sphere::new(Point3::origin(), 1.0),
            Sphere::new(Point3::new(f64::NAN, 0.0, 0.0), 1.0),
        ];
        assert_eq!(
            KdTree::build(&bad[..], &KdTreeSettings::default()).unwrap_err(),
            TraceError::NonFiniteBounds { index: 1 }
        );
    }
}
