//! Search state plumbing: shared path links, scores, heap ordering.

use std::cmp::Ordering;
use std::sync::Arc;

use crate::graph::NodeId;

use super::coverage::CoverageSet;

/// One link in an immutable, structurally shared path.
///
/// Paths only ever grow at the tip, so each successor state shares its
/// prefix with the parent instead of cloning the whole node list.
#[derive(Debug)]
pub struct PathLink {
    node: NodeId,
    hops: u32,
    parent: Option<Arc<PathLink>>,
}

impl PathLink {
    pub fn start(node: NodeId) -> Arc<Self> {
        Arc::new(Self {
            node,
            hops: 1,
            parent: None,
        })
    }

    pub fn extend(parent: &Arc<Self>, node: NodeId) -> Arc<Self> {
        Arc::new(Self {
            node,
            hops: parent.hops + 1,
            parent: Some(Arc::clone(parent)),
        })
    }

    /// Number of nodes on the path.
    pub fn hops(&self) -> u32 {
        self.hops
    }

    /// Whether the path already visits `node`.
    pub fn contains(&self, node: NodeId) -> bool {
        let mut link = self;
        loop {
            if link.node == node {
                return true;
            }
            match &link.parent {
                Some(parent) => link = parent,
                None => return false,
            }
        }
    }

    /// The path in visit order.
    pub fn collect(&self) -> Vec<NodeId> {
        let mut nodes = Vec::with_capacity(self.hops as usize);
        let mut link = self;
        loop {
            nodes.push(link.node);
            match &link.parent {
                Some(parent) => link = parent,
                None => break,
            }
        }
        nodes.reverse();
        nodes
    }
}

/// A path score. Lower is better.
///
/// Scores are finite by construction, so ordering by `total_cmp` and
/// hashing the raw bits are both deterministic.
#[derive(Debug, Clone, Copy)]
pub struct Score(pub f64);

impl Score {
    pub fn to_bits(self) -> u64 {
        self.0.to_bits()
    }
}

impl PartialEq for Score {
    fn eq(&self, other: &Self) -> bool {
        self.to_bits() == other.to_bits()
    }
}

impl Eq for Score {}

impl PartialOrd for Score {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Score {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

/// A queued search state.
#[derive(Debug, Clone)]
pub struct SearchState {
    pub node: NodeId,
    pub elapsed: f64,
    pub coverage: CoverageSet,
    pub path: Arc<PathLink>,
    pub advanced: u32,
}

/// Heap entry giving `BinaryHeap`, a max-heap, min-heap behavior on
/// (score, insertion order). Ties on score pop in insertion order, which
/// keeps runs reproducible.
#[derive(Debug)]
pub struct HeapEntry {
    pub score: Score,
    pub seq: u64,
    pub state: SearchState,
}

impl PartialEq for HeapEntry {
    fn eq(&self, other: &Self) -> bool {
        self.score == other.score && self.seq == other.seq
    }
}

impl Eq for HeapEntry {}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .score
            .cmp(&self.score)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}
