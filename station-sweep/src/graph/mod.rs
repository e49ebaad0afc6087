//! The time-expanded transit graph.
//!
//! Every node is one train calling at one station at one minute; edges are
//! either rides (staying on the train to its next stop) or transfers
//! (leaving the train and boarding another). The graph is a dense node
//! table with explicit adjacency lists, indexed by [`NodeId`].

pub mod builder;
pub mod canon;
pub mod interchange;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::{LineId, ServiceMinute, StationCode};

pub use builder::{BuildOptions, NetworkError, build_graph, synthesize_source};
pub use canon::{CanonicalId, CanonicalStations};
pub use interchange::InterchangeError;

/// Dense index of a node in the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

/// What an edge means for the rider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EdgeKind {
    /// Stay on the train to its next served stop.
    Ride,
    /// Leave the train and board another one, possibly walking first.
    Transfer,
}

/// One train calling at one station at one minute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventNode {
    pub line: LineId,
    pub station: StationCode,
    pub time: ServiceMinute,
}

impl EventNode {
    /// Stable string key, `{line}_{station}_{minutes}`.
    pub fn key(&self) -> String {
        format!("{}_{}_{}", self.line, self.station, self.time.minutes())
    }
}

impl fmt::Display for EventNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {} ({})", self.line, self.station, self.time)
    }
}

/// A directed edge to another event.
///
/// Ride and transfer costs are whole schedule minutes; edges leaving the
/// synthesized source carry tiny fractional costs that only order candidate
/// start times.
#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    pub to: NodeId,
    pub kind: EdgeKind,
    pub cost: f64,
}

/// The built graph: node table, adjacency lists, and which nodes are
/// reachable by staying on a train.
#[derive(Debug, Clone, Default)]
pub struct TransitGraph {
    nodes: Vec<EventNode>,
    adjacency: Vec<Vec<Edge>>,
    has_inbound_ride: Vec<bool>,
    source: Option<NodeId>,
}

impl TransitGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> &EventNode {
        &self.nodes[id.0 as usize]
    }

    /// All nodes with their ids, in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &EventNode)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (NodeId(i as u32), n))
    }

    pub fn edges_from(&self, id: NodeId) -> &[Edge] {
        &self.adjacency[id.0 as usize]
    }

    pub fn edge_count(&self) -> usize {
        self.adjacency.iter().map(Vec::len).sum()
    }

    /// Whether any ride edge arrives at this node. Nodes without one are
    /// the first served stop of a run, where a journey can begin.
    pub fn has_inbound_ride(&self, id: NodeId) -> bool {
        self.has_inbound_ride[id.0 as usize]
    }

    /// The synthesized source node, once added.
    pub fn source(&self) -> Option<NodeId> {
        self.source
    }

    /// Find a node by its identity triple.
    pub fn find(&self, line: &LineId, station: &StationCode, time: ServiceMinute) -> Option<NodeId> {
        self.nodes
            .iter()
            .position(|n| &n.line == line && &n.station == station && n.time == time)
            .map(|i| NodeId(i as u32))
    }

    pub(crate) fn push_node(&mut self, node: EventNode) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        self.adjacency.push(Vec::new());
        self.has_inbound_ride.push(false);
        id
    }

    /// Add an edge, ignoring an exact duplicate of one already present.
    pub(crate) fn push_edge(&mut self, from: NodeId, to: NodeId, kind: EdgeKind, cost: f64) {
        let edges = &mut self.adjacency[from.0 as usize];
        if edges.iter().any(|e| e.to == to && e.kind == kind) {
            return;
        }
        edges.push(Edge { to, kind, cost });
        if kind == EdgeKind::Ride {
            self.has_inbound_ride[to.0 as usize] = true;
        }
    }

    pub(crate) fn set_source(&mut self, id: NodeId) {
        self.source = Some(id);
    }
}
