//! Compact kd-tree nodes and the arena that stores them.
//!
//! Nodes live in one flat array addressed by `u32` index. An interior node
//! only records its "above" child: the "below" child is always the next
//! slot, which the depth-first builder guarantees.

use kdtrace_math::Axis;

/// Initial node capacity; the store doubles from here.
const MIN_CAPACITY: usize = 512;

/// Primitive references held by a leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Leaf {
    /// No primitives. Never tested, never hit.
    Empty,
    /// Exactly one primitive, stored inline.
    Single(u32),
    /// `count > 1` primitives at `index_pool[offset..offset + count]`.
    Many {
        /// Start of this leaf's slice in the index pool.
        offset: u32,
        /// Number of primitives in the slice.
        count: u32,
    },
}

impl Leaf {
    /// Number of primitives referenced by this leaf.
    pub fn prim_count(&self) -> usize {
        match *self {
            Leaf::Empty => 0,
            Leaf::Single(_) => 1,
            Leaf::Many { count, .. } => count as usize,
        }
    }
}

/// A kd-tree node: either a split plane or a leaf.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum KdNode {
    /// Split plane. The below child is at `self_index + 1`.
    Interior {
        /// Axis the split plane is perpendicular to.
        axis: Axis,
        /// Coordinate of the split plane on `axis`.
        split: f64,
        /// Index of the subtree on the above side of the plane.
        above_child: u32,
    },
    /// Leaf holding primitive references.
    Leaf(Leaf),
}

impl KdNode {
    /// Interior node splitting `axis` at `split`.
    pub fn interior(axis: Axis, split: f64, above_child: u32) -> Self {
        KdNode::Interior {
            axis,
            split,
            above_child,
        }
    }

    /// Leaf for `prims`, appending to `index_pool` when it holds more than
    /// one primitive.
    pub fn leaf(prims: &[u32], index_pool: &mut Vec<u32>) -> Self {
        match prims {
            [] => KdNode::Leaf(Leaf::Empty),
            [only] => KdNode::Leaf(Leaf::Single(*only)),
            _ => {
                let offset = index_pool.len() as u32;
                index_pool.extend_from_slice(prims);
                KdNode::Leaf(Leaf::Many {
                    offset,
                    count: prims.len() as u32,
                })
            }
        }
    }

    /// True for leaf nodes.
    pub fn is_leaf(&self) -> bool {
        matches!(self, KdNode::Leaf(_))
    }

    /// Split axis of an interior node.
    pub fn split_axis(&self) -> Option<Axis> {
        match self {
            KdNode::Interior { axis, .. } => Some(*axis),
            KdNode::Leaf(_) => None,
        }
    }

    /// Number of primitives referenced by a leaf; zero for interior nodes.
    pub fn prim_count(&self) -> usize {
        match self {
            KdNode::Leaf(leaf) => leaf.prim_count(),
            KdNode::Interior { .. } => 0,
        }
    }
}

/// Growable node arena used during construction.
#[derive(Debug, Default)]
pub(crate) struct NodeStore {
    nodes: Vec<KdNode>,
}

impl NodeStore {
    pub fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    /// Reserve the next free slot and return its index.
    ///
    /// The slot holds an empty leaf until [`NodeStore::set`] overwrites it.
    pub fn alloc(&mut self) -> u32 {
        let len = self.nodes.len();
        if len == self.nodes.capacity() {
            let new_capacity = (2 * self.nodes.capacity()).max(MIN_CAPACITY);
            self.nodes.reserve_exact(new_capacity - len);
        }
        self.nodes.push(KdNode::Leaf(Leaf::Empty));
        len as u32
    }

    /// Index the next call to [`NodeStore::alloc`] will return.
    pub fn next_free(&self) -> u32 {
        self.nodes.len() as u32
    }

    pub fn set(&mut self, index: u32, node: KdNode) {
        self.nodes[index as usize] = node;
    }

    pub fn into_vec(self) -> Vec<KdNode> {
        self.nodes
    }
}
