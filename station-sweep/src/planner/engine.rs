//! The coverage sweep: a best-first search for a simple path that visits
//! as many canonical stations as possible.
//!
//! This is a greedy priority-ordered exploration, not an admissible A*.
//! The score trades covered stations against elapsed minutes and path
//! length, and the only pruning besides the simple-path rule is a
//! `(node, score)` memory of pushes. Two states with the same successor
//! and score are treated as interchangeable even when their paths and
//! coverage differ; that loses paths on purpose, in exchange for a queue
//! that stays tractable on a real network.

use std::collections::{BinaryHeap, HashSet};
use std::time::Instant;

use tracing::{debug, info, trace};

use crate::graph::{CanonicalId, CanonicalStations, NodeId, TransitGraph};

use super::coverage::CoverageSet;
use super::observer::{SearchObserver, SearchProgress};
use super::options::{AdvancePolicy, CoveragePolicy, SearchOptions};
use super::state::{HeapEntry, PathLink, Score, SearchState};

/// Error starting a search.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SearchError {
    /// A graph node's station code has no canonical id. Happens when the
    /// graph and the canonical index come from different networks.
    #[error("station {station} on the graph has no canonical id")]
    UnmappedStation { station: String },

    /// The start node is not in the graph.
    #[error("start node {index} is out of range for a graph of {len} nodes")]
    StartOutOfRange { index: u32, len: usize },
}

/// Why the search stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// Every canonical station is covered.
    FullCoverage,
    /// The queue emptied; the best path is partial. A normal outcome.
    Exhausted,
    /// `max_iterations` popped states were examined.
    IterationLimit,
    /// The wall-clock `time_limit` passed.
    TimeLimit,
}

/// The best path found by a search.
#[derive(Debug, Clone, PartialEq)]
pub struct BestPath {
    /// Nodes in visit order, starting at the search's start node.
    pub nodes: Vec<NodeId>,
    /// Canonical stations the path covers.
    pub covered: u32,
    /// Total edge cost along the path.
    pub elapsed: f64,
}

impl BestPath {
    /// The preferred of two results: higher coverage, then lower elapsed
    /// time, then fewer hops. Callers running independent searches merge
    /// their outcomes with this.
    pub fn prefer(self, other: Self) -> Self {
        if other.covered != self.covered {
            return if other.covered > self.covered {
                other
            } else {
                self
            };
        }
        if other.elapsed != self.elapsed {
            return if other.elapsed < self.elapsed {
                other
            } else {
                self
            };
        }
        if other.nodes.len() < self.nodes.len() {
            other
        } else {
            self
        }
    }
}

/// Everything a finished search reports.
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub best: BestPath,
    pub termination: Termination,
    /// States popped from the queue.
    pub iterations: u64,
}

/// A configured sweep over one graph.
pub struct CoverageSearch<'a> {
    graph: &'a TransitGraph,
    canon: &'a CanonicalStations,
    options: &'a SearchOptions,
}

impl<'a> CoverageSearch<'a> {
    pub fn new(
        graph: &'a TransitGraph,
        canon: &'a CanonicalStations,
        options: &'a SearchOptions,
    ) -> Self {
        Self {
            graph,
            canon,
            options,
        }
    }

    /// Run the sweep from `start`.
    ///
    /// Always produces a result: an empty queue, the iteration limit and
    /// the time limit all return the best path recorded so far, and a
    /// start with no outgoing edges yields a length-one path. The observer
    /// hears about every improvement but cannot change the outcome.
    pub fn run<O: SearchObserver>(
        &self,
        start: NodeId,
        observer: &mut O,
    ) -> Result<SearchOutcome, SearchError> {
        if start.0 as usize >= self.graph.len() {
            return Err(SearchError::StartOutOfRange {
                index: start.0,
                len: self.graph.len(),
            });
        }
        let stations = self.canonical_by_node()?;
        let width = self.canon.count();

        let mut queue: BinaryHeap<HeapEntry> = BinaryHeap::new();
        let mut pushed: HashSet<(NodeId, u64)> = HashSet::new();
        let mut seq: u64 = 0;

        let mut coverage = CoverageSet::new(width);
        coverage.insert(stations[start.0 as usize]);
        queue.push(HeapEntry {
            score: Score(0.0),
            seq,
            state: SearchState {
                node: start,
                elapsed: 0.0,
                coverage,
                path: PathLink::start(start),
                advanced: 0,
            },
        });

        let mut best = BestPath {
            nodes: Vec::new(),
            covered: 0,
            elapsed: 0.0,
        };
        let mut iterations: u64 = 0;
        let started = Instant::now();

        let termination = loop {
            if let Some(limit) = self.options.max_iterations {
                if iterations >= limit {
                    break Termination::IterationLimit;
                }
            }
            if let Some(limit) = self.options.time_limit {
                if started.elapsed() >= limit {
                    break Termination::TimeLimit;
                }
            }
            let Some(entry) = queue.pop() else {
                break Termination::Exhausted;
            };
            iterations += 1;
            let state = entry.state;

            let covered = state.coverage.len();
            if covered > best.covered {
                best = BestPath {
                    nodes: state.path.collect(),
                    covered,
                    elapsed: state.elapsed,
                };
                debug!(
                    covered,
                    elapsed = state.elapsed,
                    hops = state.path.hops(),
                    "improved best path"
                );
                observer.on_improved(self.graph, &best);
            }
            if state.coverage.is_full() {
                break Termination::FullCoverage;
            }

            if self.options.progress_every > 0 && iterations % self.options.progress_every == 0 {
                let progress = SearchProgress {
                    iterations,
                    queue_len: queue.len(),
                    best_covered: best.covered,
                };
                trace!(
                    iterations,
                    queue = progress.queue_len,
                    best = best.covered,
                    "search progress"
                );
                observer.on_progress(self.graph, &progress);
            }

            for edge in self.graph.edges_from(state.node) {
                if state.path.contains(edge.to) {
                    continue;
                }
                let successor = stations[edge.to.0 as usize];
                let current = stations[state.node.0 as usize];
                let fresh = !state.coverage.contains(successor);

                let mut coverage = state.coverage.clone();
                if self.marks_covered(fresh, current, successor, edge.cost) {
                    coverage.insert(successor);
                }
                let advanced = state.advanced + self.advance_delta(fresh, state.node, edge.to);
                let elapsed = state.elapsed + edge.cost;
                let path = PathLink::extend(&state.path, edge.to);
                let score = Score(
                    self.options.time_weight * elapsed
                        + self.options.station_weight * (width as f64 - advanced as f64)
                        + self.options.path_weight * path.hops() as f64,
                );

                if !pushed.insert((edge.to, score.to_bits())) {
                    continue;
                }
                seq += 1;
                queue.push(HeapEntry {
                    score,
                    seq,
                    state: SearchState {
                        node: edge.to,
                        elapsed,
                        coverage,
                        path,
                        advanced,
                    },
                });
            }
        };

        info!(
            covered = best.covered,
            of = width,
            iterations,
            ?termination,
            "search finished"
        );
        Ok(SearchOutcome {
            best,
            termination,
            iterations,
        })
    }

    /// Whether a move marks the successor's station as covered.
    fn marks_covered(
        &self,
        fresh: bool,
        current: CanonicalId,
        successor: CanonicalId,
        cost: f64,
    ) -> bool {
        if !fresh {
            return false;
        }
        match &self.options.coverage {
            CoveragePolicy::Everywhere => true,
            // Only dwelling at a station counts: the edge must stay at the
            // same place for longer than the threshold.
            CoveragePolicy::DwellOnly { min_dwell_minutes } => {
                successor == current && cost > *min_dwell_minutes as f64
            }
        }
    }

    /// How much a move advances the sweep. Granted whenever the
    /// successor's bit was unset before the move, whatever the coverage
    /// policy then decides about setting it.
    fn advance_delta(&self, fresh: bool, from: NodeId, to: NodeId) -> u32 {
        if !fresh {
            return 0;
        }
        match &self.options.advance {
            AdvancePolicy::PerStation => 1,
            AdvancePolicy::LineDistance { wraparound } => {
                let from = &self.graph.node(from).station;
                let to = &self.graph.node(to).station;
                if let Some(pair) = wraparound {
                    if (&pair.a == from && &pair.b == to) || (&pair.b == from && &pair.a == to) {
                        return pair.advance;
                    }
                }
                match (from.prefix_and_number(), to.prefix_and_number()) {
                    (Some((p, n)), Some((q, m))) if p == q => n.abs_diff(m),
                    _ => 0,
                }
            }
        }
    }

    /// Canonical id per node, indexed by `NodeId`.
    fn canonical_by_node(&self) -> Result<Vec<CanonicalId>, SearchError> {
        self.graph
            .nodes()
            .map(|(_, node)| {
                self.canon
                    .get(&node.station)
                    .ok_or_else(|| SearchError::UnmappedStation {
                        station: node.station.as_str().to_owned(),
                    })
            })
            .collect()
    }
}
