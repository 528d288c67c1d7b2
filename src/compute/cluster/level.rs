//! Per-zoom levels of the cluster hierarchy.

use crate::display::ClusterId;
use rstar::{Point as RstarPoint, RTree};
use smallvec::SmallVec;

/// Projected position of a node, indexed by the R-tree of its level.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct NodePosition {
    pub x: f64,
    pub y: f64,
    /// Slot of the node on its level
    pub slot: u32,
}

impl NodePosition {
    pub fn new(x: f64, y: f64, slot: u32) -> Self {
        Self { x, y, slot }
    }

    /// Position used only as a query corner or center.
    pub fn probe(x: f64, y: f64) -> Self {
        Self::new(x, y, u32::MAX)
    }
}

impl RstarPoint for NodePosition {
    type Scalar = f64;
    const DIMENSIONS: usize = 2;

    fn generate(mut generator: impl FnMut(usize) -> Self::Scalar) -> Self {
        Self::probe(generator(0), generator(1))
    }

    fn nth(&self, index: usize) -> Self::Scalar {
        match index {
            0 => self.x,
            1 => self.y,
            _ => unreachable!(),
        }
    }

    fn nth_mut(&mut self, index: usize) -> &mut Self::Scalar {
        match index {
            0 => &mut self.x,
            1 => &mut self.y,
            _ => unreachable!(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum NodeKind {
    /// A raw point; the value is its slot on the top level
    Point(u32),
    Cluster(ClusterId),
}

#[derive(Debug, Clone)]
pub(crate) struct Node {
    pub x: f64,
    pub y: f64,
    pub count: u32,
    pub kind: NodeKind,
    /// Slot of the node representing this one on the level below
    pub parent: Option<u32>,
    /// Slots on the level above that this node stands for
    pub children: SmallVec<[u32; 4]>,
}

impl Node {
    pub fn leaf(x: f64, y: f64, slot: u32) -> Self {
        Self {
            x,
            y,
            count: 1,
            kind: NodeKind::Point(slot),
            parent: None,
            children: SmallVec::new(),
        }
    }

    /// Copy of `self` for the level below, standing for slot `from`.
    fn carried(&self, from: u32) -> Self {
        let mut children = SmallVec::new();
        children.push(from);
        Self {
            x: self.x,
            y: self.y,
            count: self.count,
            kind: self.kind,
            parent: None,
            children,
        }
    }
}

/// All nodes visible at one zoom level.
#[derive(Debug, Clone)]
pub(crate) struct Level {
    pub nodes: Vec<Node>,
    /// Raw point slot -> slot of the node containing it on this level
    pub leaf_owner: Vec<u32>,
}

impl Level {
    pub fn node(&self, slot: u32) -> Option<&Node> {
        self.nodes.get(slot as usize)
    }
}

/// Parameters for collapsing one level into the next coarser one.
#[derive(Debug, Clone, Copy)]
pub(crate) struct MergeParams {
    /// Projected merge radius at the target zoom
    pub radius: f64,
    pub min_points: usize,
}

/// Collapse `upper` (zoom `zoom + 1`) into the nodes of `zoom`.
///
/// Nodes are visited in slot order. Each unclaimed node gathers the
/// unclaimed neighbours within `radius`; when their combined count reaches
/// `min_points` they become one cluster, otherwise the node is carried down
/// alone and its neighbours get their own turn. Sets `parent` on every node
/// of `upper`.
pub(crate) fn merge_level(upper: &mut [Node], zoom: u8, params: MergeParams) -> Vec<Node> {
    let tree = RTree::bulk_load(
        upper
            .iter()
            .enumerate()
            .map(|(slot, node)| NodePosition::new(node.x, node.y, slot as u32))
            .collect(),
    );

    let radius_sq = params.radius * params.radius;
    let mut claimed = vec![false; upper.len()];
    let mut lower: Vec<Node> = Vec::with_capacity(upper.len());

    for slot in 0..upper.len() {
        if claimed[slot] {
            continue;
        }
        claimed[slot] = true;

        let origin = NodePosition::probe(upper[slot].x, upper[slot].y);
        let mut neighbors: SmallVec<[u32; 8]> = tree
            .locate_within_distance(origin, radius_sq)
            .map(|p| p.slot)
            .filter(|&n| !claimed[n as usize])
            .collect();
        neighbors.sort_unstable();

        let total: u64 = upper[slot].count as u64
            + neighbors
                .iter()
                .map(|&n| upper[n as usize].count as u64)
                .sum::<u64>();

        let target = lower.len() as u32;

        if neighbors.is_empty() || total < params.min_points as u64 {
            upper[slot].parent = Some(target);
            lower.push(upper[slot].carried(slot as u32));
            continue;
        }

        let mut wx = upper[slot].x * upper[slot].count as f64;
        let mut wy = upper[slot].y * upper[slot].count as f64;
        let mut children: SmallVec<[u32; 4]> = SmallVec::with_capacity(neighbors.len() + 1);
        children.push(slot as u32);
        upper[slot].parent = Some(target);

        for &n in &neighbors {
            let member = &mut upper[n as usize];
            claimed[n as usize] = true;
            member.parent = Some(target);
            wx += member.x * member.count as f64;
            wy += member.y * member.count as f64;
            children.push(n);
        }
        children.sort_unstable();

        lower.push(Node {
            x: wx / total as f64,
            y: wy / total as f64,
            count: total as u32,
            kind: NodeKind::Cluster(ClusterId::new(zoom, target)),
            parent: None,
            children,
        });
    }

    lower
}
