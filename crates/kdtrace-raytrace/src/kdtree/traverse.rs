//! Near-to-far kd-tree traversal with an explicit work stack.

use kdtrace_math::Interval;

use super::node::{KdNode, Leaf};
use super::KdTree;
use crate::settings::MAX_TREE_DEPTH;
use crate::{HitRecord, Hittable, Ray};

const TODO_CAPACITY: usize = MAX_TREE_DEPTH as usize;

/// A deferred far child and the ray window it still has to cover.
#[derive(Debug, Clone, Copy, Default)]
struct TodoEntry {
    node: u32,
    t_min: f64,
    t_max: f64,
}

impl<P: Hittable> KdTree<'_, P> {
    /// Find the closest primitive hit with `t` strictly inside `ray_t`.
    ///
    /// Hits are forward-only: a negative `ray_t.min` is raised to zero, so
    /// nothing behind the ray origin is reported.
    ///
    /// Read-only; any number of threads may query one tree at once.
    pub fn intersect(&self, ray: &Ray, ray_t: Interval) -> Option<HitRecord> {
        // Near/far ordering treats planes at t <= 0 as behind the ray.
        let ray_t = Interval::new(ray_t.min.max(0.0), ray_t.max);
        let window = self.bounds.intersect_ray(ray, ray_t)?;
        let mut t_min = window.min;
        let mut t_max = window.max;

        let inv_dir = ray.inv_direction();
        let mut todo = [TodoEntry::default(); TODO_CAPACITY];
        let mut todo_len = 0usize;

        let mut closest: Option<HitRecord> = None;
        let mut best = ray_t.max;
        let mut node_index = 0u32;

        loop {
            // Windows come off the stack in non-decreasing t_min order, so
            // anything starting past the best hit cannot improve it.
            if t_min <= best {
                match self.nodes[node_index as usize] {
                    KdNode::Interior {
                        axis,
                        split,
                        above_child,
                    } => {
                        let a = axis.index();
                        let origin = ray.origin[a];
                        let t_plane = (split - origin) * inv_dir[a];

                        let below_first =
                            origin < split || (origin == split && ray.direction[a] <= 0.0);
                        let (near, far) = if below_first {
                            (node_index + 1, above_child)
                        } else {
                            (above_child, node_index + 1)
                        };

                        if t_plane.is_nan() {
                            // Ray lies in the split plane
                            todo[todo_len] = TodoEntry {
                                node: far,
                                t_min,
                                t_max,
                            };
                            todo_len += 1;
                            node_index = near;
                        } else if t_plane > t_max || t_plane <= 0.0 {
                            node_index = near;
                        } else if t_plane < t_min {
                            node_index = far;
                        } else {
                            todo[todo_len] = TodoEntry {
                                node: far,
                                t_min: t_plane,
                                t_max,
                            };
                            todo_len += 1;
                            node_index = near;
                            t_max = t_plane;
                        }
                        continue;
                    }
                    KdNode::Leaf(leaf) => {
                        self.test_leaf(leaf, ray, ray_t.min, &mut best, &mut closest);
                    }
                }
            }

            if todo_len == 0 {
                break;
            }
            todo_len -= 1;
            let entry = todo[todo_len];
            node_index = entry.node;
            t_min = entry.t_min;
            t_max = entry.t_max;
        }

        closest
    }

    /// Test every primitive in `leaf` against `[t_lo, best]`.
    fn test_leaf(
        &self,
        leaf: Leaf,
        ray: &Ray,
        t_lo: f64,
        best: &mut f64,
        closest: &mut Option<HitRecord>,
    ) {
        match leaf {
            Leaf::Empty => {}
            Leaf::Single(prim) => self.test_primitive(prim, ray, t_lo, best, closest),
            Leaf::Many { offset, count } => {
                let start = offset as usize;
                for &prim in &self.index_pool[start..start + count as usize] {
                    self.test_primitive(prim, ray, t_lo, best, closest);
                }
            }
        }
    }

    #[inline]
    fn test_primitive(
        &self,
        prim: u32,
        ray: &Ray,
        t_lo: f64,
        best: &mut f64,
        closest: &mut Option<HitRecord>,
    ) {
        let index = prim as usize;
        if let Some(hit) = self.primitives[index].hit(ray, Interval::new(t_lo, *best)) {
            *best = hit.t;
            *closest = Some(hit.with_primitive(index));
        }
    }
}
