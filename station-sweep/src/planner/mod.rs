//! The coverage planner.
//!
//! This module implements the core algorithm: given a time-expanded graph
//! and its canonical station index, find a simple path that visits as many
//! distinct stations as possible. The search is a best-first exploration
//! biased towards high coverage, low elapsed time and short paths; it is
//! deliberately inexact and reports the best path it has seen whenever it
//! stops.

mod coverage;
mod engine;
mod observer;
mod options;
mod state;

pub use coverage::CoverageSet;
pub use engine::{BestPath, CoverageSearch, SearchError, SearchOutcome, Termination};
pub use observer::{BestPathFile, NullObserver, PersistError, SearchObserver, SearchProgress};
pub use options::{
    AdvancePolicy, CoveragePolicy, DEFAULT_MIN_DWELL_MINUTES, SearchOptions, WraparoundPair,
};
