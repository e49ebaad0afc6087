//! JSON interchange format for built graphs.
//!
//! A graph serializes as flat node and edge lists. Node ids are the
//! `line_station_minute` keys, so a document round-trips without a
//! separate id table:
//!
//! ```json
//! {
//!   "nodes": [{ "id": "R_a_R28_480", "label": "R_a", "time": 480 }],
//!   "edges": [{ "source": "R_a_R28_480", "target": "R_a_R22_489",
//!               "type": "Ride", "time": 9 }]
//! }
//! ```
//!
//! The synthesized source node and its edges are never exported; a loaded
//! graph has no source until one is synthesized again. Canonical station
//! ids are not part of the format either, since they derive from the
//! timetable and rules rather than from the graph.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::domain::{LineId, ServiceMinute, StationCode};
use crate::transfers::TransferRules;

use super::{EdgeKind, EventNode, NodeId, TransitGraph};

/// Errors reading or writing graph documents.
#[derive(Debug, thiserror::Error)]
pub enum InterchangeError {
    #[error("failed to read {path}: {message}")]
    Read { path: String, message: String },

    #[error("failed to write {path}: {message}")]
    Write { path: String, message: String },

    #[error("JSON error: {message}")]
    Json { message: String },

    #[error("node id {id:?} is not a line_station_minute key")]
    BadNodeKey { id: String },

    #[error("duplicate node id {id:?}")]
    DuplicateNode { id: String },

    #[error("edge endpoint {id:?} has no node")]
    UnknownEndpoint { id: String },
}

#[derive(Debug, Serialize, Deserialize)]
struct NodeDto {
    id: String,
    label: String,
    time: u32,
}

#[derive(Debug, Serialize, Deserialize)]
struct EdgeDto {
    source: String,
    target: String,
    #[serde(rename = "type")]
    kind: EdgeKind,
    time: u32,
}

#[derive(Debug, Serialize, Deserialize)]
struct GraphDocument {
    nodes: Vec<NodeDto>,
    edges: Vec<EdgeDto>,
}

/// Serialize a graph to the interchange JSON text.
pub fn to_json(graph: &TransitGraph) -> Result<String, InterchangeError> {
    serde_json::to_string_pretty(&to_document(graph)).map_err(|e| InterchangeError::Json {
        message: e.to_string(),
    })
}

/// Rebuild a graph from interchange JSON text.
pub fn from_json(json: &str) -> Result<TransitGraph, InterchangeError> {
    let document: GraphDocument =
        serde_json::from_str(json).map_err(|e| InterchangeError::Json {
            message: e.to_string(),
        })?;
    from_document(document)
}

/// Write a graph to a JSON file.
pub fn save(graph: &TransitGraph, path: &Path) -> Result<(), InterchangeError> {
    let json = to_json(graph)?;
    std::fs::write(path, json).map_err(|e| InterchangeError::Write {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}

/// Load a graph from a JSON file.
pub fn load(path: &Path) -> Result<TransitGraph, InterchangeError> {
    let json = std::fs::read_to_string(path).map_err(|e| InterchangeError::Read {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    from_json(&json)
}

fn to_document(graph: &TransitGraph) -> GraphDocument {
    let source = graph.source();
    let mut nodes = Vec::with_capacity(graph.len());
    let mut edges = Vec::new();

    for (id, node) in graph.nodes() {
        if Some(id) == source {
            continue;
        }
        nodes.push(NodeDto {
            id: node.key(),
            label: node.line.as_str().to_owned(),
            time: node.time.minutes(),
        });
        for edge in graph.edges_from(id) {
            edges.push(EdgeDto {
                source: node.key(),
                target: graph.node(edge.to).key(),
                kind: edge.kind,
                // Ride and transfer costs are whole minutes.
                time: edge.cost as u32,
            });
        }
    }

    GraphDocument { nodes, edges }
}

fn from_document(document: GraphDocument) -> Result<TransitGraph, InterchangeError> {
    let mut graph = TransitGraph::new();
    let mut by_id: HashMap<String, NodeId> = HashMap::with_capacity(document.nodes.len());

    for node in document.nodes {
        // The id is authoritative; the label and time fields repeat what
        // it already encodes.
        let (line, station, time) = parse_node_key(&node.id)?;
        if by_id.contains_key(&node.id) {
            return Err(InterchangeError::DuplicateNode { id: node.id });
        }
        let id = graph.push_node(EventNode {
            line,
            station,
            time,
        });
        by_id.insert(node.id, id);
    }

    for edge in document.edges {
        let &from = by_id
            .get(&edge.source)
            .ok_or(InterchangeError::UnknownEndpoint { id: edge.source })?;
        let &to = by_id
            .get(&edge.target)
            .ok_or(InterchangeError::UnknownEndpoint { id: edge.target })?;
        graph.push_edge(from, to, edge.kind, edge.time as f64);
    }

    Ok(graph)
}

fn parse_node_key(id: &str) -> Result<(LineId, StationCode, ServiceMinute), InterchangeError> {
    let bad = || InterchangeError::BadNodeKey { id: id.to_owned() };

    let split = id.rfind('_').ok_or_else(bad)?;
    let minutes: u32 = id[split + 1..].parse().map_err(|_| bad())?;
    let (line, station) =
        TransferRules::parse_compound_key(&id[..split]).map_err(|_| bad())?;

    Ok((line, station, ServiceMinute::from_minutes(minutes)))
}
