//! Surface-area-heuristic split search over sorted bound edges.
//!
//! For one node and one axis, every candidate primitive contributes a start
//! edge at its box minimum and an end edge at its box maximum. Sweeping the
//! sorted edges keeps running below/above counts, and every edge strictly
//! inside the node is scored as a split plane.
//!
//! Edges are totally ordered by `(position, kind, primitive)` with
//! `Start < End`: at a shared coordinate every start is swept before any
//! end. Rebuilding from the same input therefore always yields the same
//! edge order and the same split.

use std::cmp::Ordering;

use kdtrace_math::Axis;

use crate::Aabb;

/// Which side of a primitive's extent an edge marks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum EdgeKind {
    /// The primitive's minimum on the axis.
    Start,
    /// The primitive's maximum on the axis.
    End,
}

/// One boundary event of a primitive's extent along an axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundEdge {
    /// Coordinate on the sweep axis.
    pub t: f64,
    /// Index of the primitive in the world.
    pub prim: u32,
    /// Start or end of the primitive's extent.
    pub kind: EdgeKind,
}

impl BoundEdge {
    fn new(t: f64, prim: u32, kind: EdgeKind) -> Self {
        // `-0.0 + 0.0 == +0.0`, so both zeros sort as one coordinate
        Self {
            t: t + 0.0,
            prim,
            kind,
        }
    }

    /// Total order used for the sweep.
    fn sweep_order(&self, other: &Self) -> Ordering {
        self.t
            .total_cmp(&other.t)
            .then(self.kind.cmp(&other.kind))
            .then(self.prim.cmp(&other.prim))
    }
}

/// Cost constants of the heuristic.
#[derive(Debug, Clone, Copy)]
pub struct CostModel {
    /// Cost of one ray-primitive test.
    pub intersection: f64,
    /// Cost of one interior-node step.
    pub traversal: f64,
    /// Discount for splits with an empty side.
    pub empty_bonus: f64,
}

impl CostModel {
    /// Cost of testing `n` primitives without splitting.
    pub fn leaf_cost(&self, n: usize) -> f64 {
        self.intersection * n as f64
    }
}

/// Best split found for a node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplitCandidate {
    /// Split axis.
    pub axis: Axis,
    /// Position of the splitting edge in the sorted edge list.
    pub offset: usize,
    /// Coordinate of the split plane.
    pub position: f64,
    /// Estimated cost of the split.
    pub cost: f64,
}

/// Fill `edges` with the sorted bound edges of `candidates` on `axis`.
pub fn collect_edges(
    axis: Axis,
    candidates: &[u32],
    prim_bounds: &[Aabb],
    edges: &mut Vec<BoundEdge>,
) {
    edges.clear();
    for &prim in candidates {
        let bb = &prim_bounds[prim as usize];
        edges.push(BoundEdge::new(bb.lo(axis), prim, EdgeKind::Start));
        edges.push(BoundEdge::new(bb.hi(axis), prim, EdgeKind::End));
    }
    edges.sort_unstable_by(BoundEdge::sweep_order);
}

/// Search for the cheapest split of a node.
///
/// Starts on the node's dominant axis and moves to the next axis (up to two
/// retries) only when an axis yields no admissible plane. On success
/// `edges` is left holding the sorted edges of the winning axis, which the
/// caller partitions with [`partition`]. A node with zero surface area never
/// has an admissible split.
pub fn find_split(
    node_bounds: &Aabb,
    candidates: &[u32],
    prim_bounds: &[Aabb],
    cost: &CostModel,
    edges: &mut Vec<BoundEdge>,
) -> Option<SplitCandidate> {
    let total_area = node_bounds.surface_area();
    if !(total_area > 0.0) {
        return None;
    }

    let mut axis = node_bounds.dominant_axis();
    for _retry in 0..=2 {
        collect_edges(axis, candidates, prim_bounds, edges);
        if let Some(best) = sweep(axis, edges, node_bounds, total_area, cost) {
            return Some(best);
        }
        axis = axis.next();
    }
    None
}

/// Score every admissible plane on one axis and keep the cheapest.
fn sweep(
    axis: Axis,
    edges: &[BoundEdge],
    node_bounds: &Aabb,
    total_area: f64,
    cost: &CostModel,
) -> Option<SplitCandidate> {
    let d = node_bounds.extent();
    let (o0, o1) = axis.others();
    let cap = d[o0.index()] * d[o1.index()];
    let girth = d[o0.index()] + d[o1.index()];
    let inv_total_area = 1.0 / total_area;
    let lo = node_bounds.lo(axis);
    let hi = node_bounds.hi(axis);

    let mut below = 0usize;
    let mut above = edges.len() / 2;
    let mut best: Option<SplitCandidate> = None;

    for (offset, edge) in edges.iter().enumerate() {
        if edge.kind == EdgeKind::End {
            above -= 1;
        }

        let t = edge.t;
        if t > lo && t < hi {
            let below_area = 2.0 * (cap + (t - lo) * girth);
            let above_area = 2.0 * (cap + (hi - t) * girth);
            let p_below = below_area * inv_total_area;
            let p_above = above_area * inv_total_area;
            let bonus = if below == 0 || above == 0 {
                cost.empty_bonus
            } else {
                0.0
            };
            let split_cost = cost.traversal
                + cost.intersection
                    * (1.0 - bonus)
                    * (p_below * below as f64 + p_above * above as f64);

            if best.map_or(true, |b| split_cost < b.cost) {
                best = Some(SplitCandidate {
                    axis,
                    offset,
                    position: t,
                    cost: split_cost,
                });
            }
        }

        if edge.kind == EdgeKind::Start {
            below += 1;
        }
    }

    best
}

/// Split candidates at `edges[offset]` into (below, above) sets.
///
/// Primitives starting before the splitting edge go below, primitives
/// ending after it go above; a primitive straddling the plane lands in both.
pub fn partition(edges: &[BoundEdge], offset: usize) -> (Vec<u32>, Vec<u32>) {
    let below = edges[..offset]
        .iter()
        .filter(|e| e.kind == EdgeKind::Start)
        .map(|e| e.prim)
        .collect();
    let above = edges[offset + 1..]
        .iter()
        .filter(|e| e.kind == EdgeKind::End)
        .map(|e| e.prim)
        .collect();
    (below, above)
}
