//! Time-expanded graph construction.
//!
//! Each line contributes one node per (run, served stop) with ride edges
//! between consecutive served stops. Transfer edges between two lines are
//! generated while the second line of the pair is built: a rule whose
//! destination line is already in the graph yields, per arrival event at
//! the rule's origin, the earliest feasible departure on the destination
//! line (forward) and, simultaneously, an edge from the latest departure
//! that could have fed this arrival (reverse). One directed rule therefore
//! connects both lines regardless of build order.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::domain::{Line, LineId, ServiceMinute, StationCode};
use crate::transfers::TransferRules;

use super::canon::CanonicalStations;
use super::{EdgeKind, EventNode, NodeId, TransitGraph};

pub use crate::transfers::ReciprocalTransfers;

/// Error returned when transfer rules do not match the timetable.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NetworkError {
    #[error("transfer rule from {line} at {station}: no line named {line}")]
    UnknownOriginLine { line: String, station: String },

    #[error("transfer rule from {line} at {station}: {station} is not on that line")]
    OriginNotOnLine { line: String, station: String },

    #[error("transfer rule from {line} at {station}: no line named {target_line}")]
    UnknownTargetLine {
        line: String,
        station: String,
        target_line: String,
    },

    #[error(
        "transfer rule from {line} at {station}: {target_station} is not on line {target_line}"
    )]
    TargetNotOnLine {
        line: String,
        station: String,
        target_line: String,
        target_station: String,
    },
}

/// Options for graph construction.
#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    /// Also connect each event to the next run's event at the same station,
    /// modelling waiting on the platform for a later train of the same
    /// line. Off by default; it multiplies the edge count.
    pub every_stop_edges: bool,

    /// Automatic zero-minute transfers between opposite directions.
    pub reciprocal: ReciprocalTransfers,
}

/// Cost multiplier for edges out of the synthesized source. Keeps start
/// choice ordered by departure time without competing with real minutes.
const START_EPSILON: f64 = 1e-6;

/// Reference start of service (06:00) that source edge costs count from.
const START_REFERENCE_MINUTES: f64 = 360.0;

/// Build the time-expanded graph and the canonical station index for a
/// validated set of lines and transfer rules.
pub fn build_graph(
    lines: &[Line],
    rules: &TransferRules,
    options: &BuildOptions,
) -> Result<(TransitGraph, CanonicalStations), NetworkError> {
    let mut rules = rules.clone();
    rules.populate_reciprocals(lines, &options.reciprocal);
    validate_rules(lines, &rules)?;

    let canon = CanonicalStations::build(lines, &rules);
    let mut graph = TransitGraph::new();
    let mut ctx = BuildContext::default();

    for line in lines {
        add_line_events(&mut graph, &mut ctx, line, options);
        link_transfers(&mut graph, &ctx, line, &rules);
        ctx.built.insert(line.id().clone());
    }

    debug!(
        nodes = graph.len(),
        edges = graph.edge_count(),
        stations = canon.count(),
        "graph built"
    );
    Ok((graph, canon))
}

/// Add the virtual start node and an edge into every event no ride leads
/// to, so a search can begin at any run's first stop. Edge costs order the
/// candidate starts by departure time at a scale real minutes dwarf.
///
/// Idempotent: a second call returns the existing source.
pub fn synthesize_source(graph: &mut TransitGraph, canon: &mut CanonicalStations) -> NodeId {
    if let Some(existing) = graph.source() {
        return existing;
    }

    let starts: Vec<(NodeId, ServiceMinute)> = graph
        .nodes()
        .filter(|(id, _)| !graph.has_inbound_ride(*id))
        .map(|(id, node)| (id, node.time))
        .collect();

    // Literals are valid by inspection.
    let line = LineId::parse("S_a").expect("valid literal");
    let station = StationCode::parse("source").expect("valid literal");

    let source = graph.push_node(EventNode {
        line,
        station,
        time: ServiceMinute::from_minutes(0),
    });
    graph.set_source(source);
    canon.push_synthetic(station);

    for (id, time) in &starts {
        let cost = (time.minutes() as f64 - START_REFERENCE_MINUTES) * START_EPSILON;
        graph.push_edge(source, *id, EdgeKind::Transfer, cost);
    }

    debug!(starts = starts.len(), "source synthesized");
    source
}

#[derive(Default)]
struct BuildContext {
    /// Events per (line, station), in insertion order. Times are unique
    /// within one list because identical triples intern to one node.
    events: HashMap<(LineId, StationCode), Vec<(ServiceMinute, NodeId)>>,
    /// Identity triple to node, merging runs that call at the same minute.
    interned: HashMap<(LineId, StationCode, ServiceMinute), NodeId>,
    /// Lines whose events are already in the graph.
    built: HashSet<LineId>,
}

impl BuildContext {
    fn intern(
        &mut self,
        graph: &mut TransitGraph,
        line: &LineId,
        station: StationCode,
        time: ServiceMinute,
    ) -> NodeId {
        let key = (line.clone(), station, time);
        if let Some(&id) = self.interned.get(&key) {
            return id;
        }
        let id = graph.push_node(EventNode {
            line: line.clone(),
            station,
            time,
        });
        self.interned.insert(key, id);
        self.events
            .entry((line.clone(), station))
            .or_default()
            .push((time, id));
        id
    }

    fn events_at(&self, line: &LineId, station: &StationCode) -> &[(ServiceMinute, NodeId)] {
        self.events
            .get(&(line.clone(), *station))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

fn add_line_events(
    graph: &mut TransitGraph,
    ctx: &mut BuildContext,
    line: &Line,
    options: &BuildOptions,
) {
    let before = graph.len();
    let mut prev_run: Vec<Option<(NodeId, ServiceMinute)>> = vec![None; line.stations().len()];

    for run in line.runs() {
        let mut head: Option<(NodeId, ServiceMinute)> = None;
        for (index, time) in run.served() {
            let station = line.stations()[index];
            let id = ctx.intern(graph, line.id(), station, time);

            if let Some((prev_id, prev_time)) = head {
                // Validated monotone at Line construction.
                let cost = (time.minutes() - prev_time.minutes()) as f64;
                graph.push_edge(prev_id, id, EdgeKind::Ride, cost);
            }

            if options.every_stop_edges {
                if let Some((prior_id, prior_time)) = prev_run[index] {
                    // Runs need not be listed in time order; a wait edge
                    // only makes sense forwards.
                    if prior_id != id {
                        if let Some(wait) = time.checked_minutes_since(prior_time) {
                            graph.push_edge(prior_id, id, EdgeKind::Transfer, wait as f64);
                        }
                    }
                }
            }

            head = Some((id, time));
            prev_run[index] = Some((id, time));
        }
    }

    debug!(line = %line.id(), nodes = graph.len() - before, "line events added");
}

/// Generate transfer edges for every rule of `line` whose destination is
/// already built. Per arrival: forward to the earliest feasible departure,
/// reverse from the latest departure that still makes this arrival.
fn link_transfers(
    graph: &mut TransitGraph,
    ctx: &BuildContext,
    line: &Line,
    rules: &TransferRules,
) {
    let mut added = 0usize;

    for station in line.stations() {
        for target in rules.targets_from(line.id(), station) {
            if !ctx.built.contains(&target.line) {
                continue;
            }

            let dest_events = ctx.events_at(&target.line, &target.station);
            for &(arrival, arrival_id) in ctx.events_at(line.id(), station) {
                let forward = dest_events
                    .iter()
                    .filter(|(dep, _)| dep.minutes() >= arrival.minutes() + target.minutes)
                    .min_by_key(|(dep, _)| *dep);
                if let Some(&(dep, dep_id)) = forward {
                    let cost = (dep.minutes() - arrival.minutes()) as f64;
                    graph.push_edge(arrival_id, dep_id, EdgeKind::Transfer, cost);
                    added += 1;
                }

                let reverse = dest_events
                    .iter()
                    .filter(|(dep, _)| dep.minutes() + target.minutes <= arrival.minutes())
                    .max_by_key(|(dep, _)| *dep);
                if let Some(&(dep, dep_id)) = reverse {
                    let cost = (arrival.minutes() - dep.minutes()) as f64;
                    graph.push_edge(dep_id, arrival_id, EdgeKind::Transfer, cost);
                    added += 1;
                }
            }
        }
    }

    if added > 0 {
        debug!(line = %line.id(), transfers = added, "transfer edges linked");
    }
}

/// Reject rules that reference lines or stations absent from the
/// timetable. Target problems are reported in line order; origin problems
/// (rules keyed by a line or station that does not exist) afterwards, in
/// key order.
fn validate_rules(lines: &[Line], rules: &TransferRules) -> Result<(), NetworkError> {
    let by_id: HashMap<&LineId, &Line> = lines.iter().map(|l| (l.id(), l)).collect();

    for line in lines {
        for station in line.stations() {
            for target in rules.targets_from(line.id(), station) {
                let dest = by_id.get(&target.line).ok_or_else(|| {
                    NetworkError::UnknownTargetLine {
                        line: line.id().as_str().to_owned(),
                        station: station.as_str().to_owned(),
                        target_line: target.line.as_str().to_owned(),
                    }
                })?;
                if dest.station_position(&target.station).is_none() {
                    return Err(NetworkError::TargetNotOnLine {
                        line: line.id().as_str().to_owned(),
                        station: station.as_str().to_owned(),
                        target_line: target.line.as_str().to_owned(),
                        target_station: target.station.as_str().to_owned(),
                    });
                }
            }
        }
    }

    let mut stray: Vec<NetworkError> = Vec::new();
    for (line, station, _) in rules.iter() {
        match by_id.get(line) {
            None => stray.push(NetworkError::UnknownOriginLine {
                line: line.as_str().to_owned(),
                station: station.as_str().to_owned(),
            }),
            Some(l) if l.station_position(station).is_none() => {
                stray.push(NetworkError::OriginNotOnLine {
                    line: line.as_str().to_owned(),
                    station: station.as_str().to_owned(),
                })
            }
            Some(_) => {}
        }
    }
    stray.sort_by_key(|e| e.to_string());
    match stray.into_iter().next() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}
