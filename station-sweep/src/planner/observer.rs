//! Observation hooks for a running search.
//!
//! The engine notifies an observer on every improvement and on a fixed
//! iteration cadence, replacing ad-hoc progress printing. Observers are
//! side-effect only: nothing they do feeds back into the search, so a run
//! with a file-writing observer pops the same states as one with none.

use std::path::{Path, PathBuf};

use tracing::warn;

use crate::graph::TransitGraph;

use super::engine::BestPath;

/// Periodic progress information.
#[derive(Debug, Clone, Copy)]
pub struct SearchProgress {
    /// States popped so far.
    pub iterations: u64,
    /// States currently queued.
    pub queue_len: usize,
    /// Stations covered by the best path so far.
    pub best_covered: u32,
}

/// Callbacks invoked by the search engine. All hooks default to no-ops,
/// so an observer only implements what it cares about.
pub trait SearchObserver {
    /// A new best path was recorded.
    fn on_improved(&mut self, _graph: &TransitGraph, _best: &BestPath) {}

    /// Called every `progress_every` popped states.
    fn on_progress(&mut self, _graph: &TransitGraph, _progress: &SearchProgress) {}
}

/// An observer that ignores everything.
pub struct NullObserver;

impl SearchObserver for NullObserver {}

/// Error writing a best-path file.
#[derive(Debug, thiserror::Error)]
#[error("failed to write best path to {path}: {message}")]
pub struct PersistError {
    pub path: String,
    pub message: String,
}

/// Persists each improved best path as a JSON array of node keys, so a
/// long search can be watched or interrupted without losing its result.
///
/// Write failures are logged and remembered, never surfaced mid-search;
/// check [`BestPathFile::last_error`] after the run.
pub struct BestPathFile {
    path: PathBuf,
    writes: u64,
    last_error: Option<PersistError>,
}

impl BestPathFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            writes: 0,
            last_error: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of successful writes.
    pub fn writes(&self) -> u64 {
        self.writes
    }

    /// The most recent write failure, if any.
    pub fn last_error(&self) -> Option<&PersistError> {
        self.last_error.as_ref()
    }
}

impl SearchObserver for BestPathFile {
    fn on_improved(&mut self, graph: &TransitGraph, best: &BestPath) {
        let keys: Vec<String> = best
            .nodes
            .iter()
            .map(|&id| graph.node(id).key())
            .collect();
        // Key lists always serialize; only the write can fail.
        let json = serde_json::to_string_pretty(&keys).unwrap_or_default();

        match std::fs::write(&self.path, json) {
            Ok(()) => self.writes += 1,
            Err(e) => {
                let error = PersistError {
                    path: self.path.display().to_string(),
                    message: e.to_string(),
                };
                warn!(path = %error.path, message = %error.message, "best path write failed");
                self.last_error = Some(error);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Line, LineId, ServiceMinute, StationCode, TrainRun};
    use crate::graph::{BuildOptions, build_graph};
    use crate::transfers::TransferRules;
    use tempfile::tempdir;

    fn tiny_graph() -> TransitGraph {
        let line = Line::new(
            LineId::parse("R_a").unwrap(),
            vec![
                StationCode::parse("R1").unwrap(),
                StationCode::parse("R2").unwrap(),
            ],
            vec![TrainRun::from_stops(vec![
                Some(ServiceMinute::from_minutes(480)),
                Some(ServiceMinute::from_minutes(489)),
            ])],
        )
        .unwrap();
        let (graph, _) =
            build_graph(&[line], &TransferRules::new(), &BuildOptions::default()).unwrap();
        graph
    }

    fn best_over(graph: &TransitGraph) -> BestPath {
        BestPath {
            nodes: graph.nodes().map(|(id, _)| id).collect(),
            covered: 2,
            elapsed: 9.0,
        }
    }

    #[test]
    fn writes_node_keys_as_json() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("best_path.json");
        let graph = tiny_graph();
        let mut observer = BestPathFile::new(&path);

        observer.on_improved(&graph, &best_over(&graph));

        assert_eq!(observer.writes(), 1);
        assert!(observer.last_error().is_none());
        let written = std::fs::read_to_string(&path).unwrap();
        let keys: Vec<String> = serde_json::from_str(&written).unwrap();
        assert_eq!(keys, vec!["R_a_R1_480", "R_a_R2_489"]);
    }

    #[test]
    fn each_improvement_replaces_the_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("best_path.json");
        let graph = tiny_graph();
        let mut observer = BestPathFile::new(&path);

        let shorter = BestPath {
            nodes: vec![graph.nodes().next().unwrap().0],
            covered: 1,
            elapsed: 0.0,
        };
        observer.on_improved(&graph, &shorter);
        observer.on_improved(&graph, &best_over(&graph));

        assert_eq!(observer.writes(), 2);
        let keys: Vec<String> =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(keys.len(), 2);
    }

    #[test]
    fn write_failure_is_remembered_not_raised() {
        let graph = tiny_graph();
        let mut observer = BestPathFile::new("/nonexistent/dir/best_path.json");

        observer.on_improved(&graph, &best_over(&graph));

        assert_eq!(observer.writes(), 0);
        assert!(observer.last_error().is_some());
    }
}
