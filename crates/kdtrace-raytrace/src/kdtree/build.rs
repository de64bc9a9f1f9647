//! Recursive top-down kd-tree construction.

use tracing::trace;

use super::edge::{find_split, partition, CostModel};
use super::node::{KdNode, NodeStore};
use crate::Aabb;

/// Forced-leaf threshold on accumulated bad refinements along one path.
const MAX_BAD_REFINES: u32 = 3;

/// Splits costing more than this multiple of the leaf cost are only
/// accepted for nodes with at least [`SMALL_NODE`] candidates.
const BAD_COST_FACTOR: f64 = 4.0;
const SMALL_NODE: usize = 16;

/// Output of a finished build.
pub(crate) struct BuiltTree {
    pub nodes: Vec<KdNode>,
    pub index_pool: Vec<u32>,
    pub bad_refines: usize,
    pub forced_leaves: usize,
}

/// Depth-first builder writing into a [`NodeStore`].
///
/// Every call to [`Builder::build_node`] allocates its own slot first, so a
/// node's below child always lands in the very next slot. The above child
/// is allocated only once the whole below subtree is in the store.
pub(crate) struct Builder<'a> {
    prim_bounds: &'a [Aabb],
    cost: CostModel,
    max_prims_per_leaf: usize,
    store: NodeStore,
    index_pool: Vec<u32>,
    bad_refines: usize,
    forced_leaves: usize,
}

impl<'a> Builder<'a> {
    pub fn new(prim_bounds: &'a [Aabb], cost: CostModel, max_prims_per_leaf: usize) -> Self {
        Self {
            prim_bounds,
            cost,
            max_prims_per_leaf,
            store: NodeStore::new(),
            index_pool: Vec::new(),
            bad_refines: 0,
            forced_leaves: 0,
        }
    }

    /// Build the whole tree over every primitive.
    pub fn build(mut self, root_bounds: &Aabb, max_depth: u32) -> BuiltTree {
        let all: Vec<u32> = (0..self.prim_bounds.len() as u32).collect();
        let root = self.build_node(root_bounds, &all, max_depth, 0);
        debug_assert_eq!(root, 0);

        BuiltTree {
            nodes: self.store.into_vec(),
            index_pool: self.index_pool,
            bad_refines: self.bad_refines,
            forced_leaves: self.forced_leaves,
        }
    }

    /// Build the subtree for `candidates` inside `bounds` and return the
    /// index of its root node.
    fn build_node(
        &mut self,
        bounds: &Aabb,
        candidates: &[u32],
        depth_left: u32,
        mut bad_refines: u32,
    ) -> u32 {
        let node_index = self.store.alloc();
        let n = candidates.len();

        if depth_left == 0 || n < self.max_prims_per_leaf {
            self.make_leaf(node_index, candidates);
            return node_index;
        }

        // Scratch edges are owned by this call and released before recursing
        let mut edges = Vec::with_capacity(2 * n);
        let Some(split) = find_split(bounds, candidates, self.prim_bounds, &self.cost, &mut edges)
        else {
            self.make_leaf(node_index, candidates);
            return node_index;
        };

        let leaf_cost = self.cost.leaf_cost(n);
        if split.cost > leaf_cost {
            bad_refines += 1;
        }
        if (split.cost > BAD_COST_FACTOR * leaf_cost && n < SMALL_NODE)
            || bad_refines >= MAX_BAD_REFINES
        {
            trace!(
                node = node_index,
                prims = n,
                cost = split.cost,
                leaf_cost,
                bad_refines,
                "split rejected, forcing leaf"
            );
            self.forced_leaves += 1;
            self.make_leaf(node_index, candidates);
            return node_index;
        }
        if split.cost > leaf_cost {
            self.bad_refines += 1;
        }

        let (below, above) = partition(&edges, split.offset);
        drop(edges);
        let (below_bounds, above_bounds) = bounds.split(split.axis, split.position);

        let below_child = self.build_node(&below_bounds, &below, depth_left - 1, bad_refines);
        debug_assert_eq!(below_child, node_index + 1);
        drop(below);

        let above_child = self.store.next_free();
        let built = self.build_node(&above_bounds, &above, depth_left - 1, bad_refines);
        debug_assert_eq!(built, above_child);
        self.store.set(
            node_index,
            KdNode::interior(split.axis, split.position, above_child),
        );
        node_index
    }

    fn make_leaf(&mut self, node_index: u32, candidates: &[u32]) {
        let leaf = KdNode::leaf(candidates, &mut self.index_pool);
        self.store.set(node_index, leaf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kdtree::node::Leaf;
    use kdtrace_math::{Axis, Point3};

    fn cost() -> CostModel {
        CostModel {
            intersection: 80.0,
            traversal: 1.0,
            empty_bonus: 0.0,
        }
    }

    fn unit_box_at(x: f64) -> Aabb {
        Aabb::new(Point3::new(x, 0.0, 0.0), Point3::new(x + 1.0, 1.0, 1.0))
    }

    fn union_all(bounds: &[Aabb]) -> Aabb {
        bounds.iter().fold(Aabb::empty(), |acc, b| acc.union(b))
    }

    #[test]
    fn test_two_separated_boxes() {
        let bounds = [unit_box_at(0.0), unit_box_at(9.0)];
        let built = Builder::new(&bounds, cost(), 1).build(&union_all(&bounds), 8);

        match built.nodes[0] {
            KdNode::Interior {
                axis, above_child, ..
            } => {
                assert_eq!(axis, Axis::X);
                assert!(above_child > 1);
            }
            KdNode::Leaf(_) => panic!("root should split"),
        }
        let leaves: Vec<_> = built
            .nodes
            .iter()
            .filter_map(|n| match n {
                KdNode::Leaf(Leaf::Single(p)) => Some(*p),
                _ => None,
            })
            .collect();
        assert!(leaves.contains(&0));
        assert!(leaves.contains(&1));
    }

    #[test]
    fn test_depth_zero_makes_root_leaf() {
        let bounds = [unit_box_at(0.0), unit_box_at(9.0), unit_box_at(20.0)];
        let built = Builder::new(&bounds, cost(), 1).build(&union_all(&bounds), 0);
        assert_eq!(built.nodes.len(), 1);
        assert_eq!(built.nodes[0], KdNode::Leaf(Leaf::Many { offset: 0, count: 3 }));
        assert_eq!(built.index_pool, vec![0, 1, 2]);
    }

    #[test]
    fn test_small_candidate_sets_skip_evaluation() {
        let bounds = [unit_box_at(0.0), unit_box_at(9.0)];
        // 2 < 3, so the root is a leaf even though the boxes are separable
        let built = Builder::new(&bounds, cost(), 3).build(&union_all(&bounds), 8);
        assert_eq!(built.nodes.len(), 1);
        assert_eq!(built.nodes[0].prim_count(), 2);
    }

    #[test]
    fn test_identical_boxes_stay_in_one_leaf() {
        let bounds = [unit_box_at(0.0); 5];
        let built = Builder::new(&bounds, cost(), 1).build(&union_all(&bounds), 8);
        assert_eq!(built.nodes.len(), 1);
        assert_eq!(built.nodes[0].prim_count(), 5);
        assert_eq!(built.forced_leaves, 0);
    }

    #[test]
    fn test_expensive_split_forces_leaf() {
        // Overlapping boxes: every plane keeps both prims on one side and
        // costs more than 4x the leaf cost when the intersection cost is tiny
        // relative to traversal.
        let bounds = [
            Aabb::new(Point3::new(0.0, 0.0, 0.0), Point3::new(2.0, 1.0, 1.0)),
            Aabb::new(Point3::new(1.0, 0.0, 0.0), Point3::new(3.0, 1.0, 1.0)),
        ];
        let model = CostModel {
            intersection: 1.0,
            traversal: 100.0,
            empty_bonus: 0.0,
        };
        let built = Builder::new(&bounds, model, 1).build(&union_all(&bounds), 8);
        assert_eq!(built.nodes.len(), 1);
        assert_eq!(built.forced_leaves, 1);
    }

    /// (depth, primitive count) of every leaf.
    fn leaf_depths(nodes: &[KdNode]) -> Vec<(u32, usize)> {
        let mut leaves = Vec::new();
        let mut stack = vec![(0u32, 0u32)];
        while let Some((index, depth)) = stack.pop() {
            match &nodes[index as usize] {
                KdNode::Interior { above_child, .. } => {
                    stack.push((index + 1, depth + 1));
                    stack.push((*above_child, depth + 1));
                }
                leaf => leaves.push((depth, leaf.prim_count())),
            }
        }
        leaves
    }

    #[test]
    fn test_third_bad_refinement_forces_leaf() {
        // 64 long boxes overlapping along x: every plane leaves one side with
        // all of the node's boxes, so each split costs between 1x and 4x the
        // leaf cost and never shrinks a node below 16 boxes.
        let bounds: Vec<Aabb> = (0..64)
            .map(|i| {
                let x = i as f64;
                Aabb::new(Point3::new(x, 0.0, 0.0), Point3::new(x + 200.0, 1.0, 1.0))
            })
            .collect();
        let model = CostModel {
            intersection: 1.0,
            traversal: 20.0,
            empty_bonus: 0.0,
        };
        let built = Builder::new(&bounds, model, 1).build(&union_all(&bounds), 16);

        // Root and both children are accepted bad splits; every grandchild
        // would be the third and becomes a leaf instead.
        assert_eq!(built.nodes.len(), 7);
        assert_eq!(built.bad_refines, 3);
        assert_eq!(built.forced_leaves, 4);

        let leaves = leaf_depths(&built.nodes);
        assert_eq!(leaves.len(), 4);
        for (depth, prims) in leaves {
            assert_eq!(depth, 2);
            assert!(prims >= SMALL_NODE);
        }
    }

    #[test]
    fn test_below_child_follows_parent() {
        let bounds: Vec<Aabb> = (0..32).map(|i| unit_box_at(2.0 * i as f64)).collect();
        let built = Builder::new(&bounds, cost(), 1).build(&union_all(&bounds), 16);
        for (index, node) in built.nodes.iter().enumerate() {
            if let KdNode::Interior { above_child, .. } = node {
                assert!(*above_child as usize > index + 1);
                assert!((*above_child as usize) < built.nodes.len());
            }
        }
    }
}
