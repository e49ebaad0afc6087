//! Plain-text rendering of a found path.

use crate::graph::{NodeId, TransitGraph};

/// Render a path as one `station, HH:MM` line per node, in visit order.
/// Times are wall clock, so an overnight stop folded past midnight prints
/// as its real time of day.
pub fn path_report(graph: &TransitGraph, path: &[NodeId]) -> String {
    let mut out = String::new();
    for &id in path {
        let node = graph.node(id);
        out.push_str(&format!("{}, {}\n", node.station, node.time));
    }
    out
}
