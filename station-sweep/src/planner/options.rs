//! Search configuration for the coverage sweep.

use std::time::Duration;

use crate::domain::StationCode;

/// Default minimum dwell, in minutes, for [`CoveragePolicy::DwellOnly`].
/// A stop shorter than this does not count as visiting the station.
pub const DEFAULT_MIN_DWELL_MINUTES: u32 = 2;

/// When a popped path counts a station as covered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CoveragePolicy {
    /// Passing through an event marks its station.
    #[default]
    Everywhere,

    /// A station is only marked when the path dwells there: the edge stays
    /// at the same canonical station and takes strictly more than
    /// `min_dwell_minutes`. Meant for graphs built with wait edges, where
    /// merely rolling through a platform should not count.
    DwellOnly { min_dwell_minutes: u32 },
}

/// How much a move towards an uncovered station advances the sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum AdvancePolicy {
    /// Each newly reached station advances by one.
    #[default]
    PerStation,

    /// Advance by the numeric distance between station codes that share a
    /// letter prefix, so that hops across a thinned-out network still
    /// reflect how many real stations they pass. Codes without a shared
    /// prefix, or that do not parse as prefix plus number, advance by
    /// zero.
    LineDistance { wraparound: Option<WraparoundPair> },
}

/// A pair of station codes that are adjacent in the real network despite
/// distant numbers, with the advance to use between them. Covers loop
/// lines whose numbering wraps around.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WraparoundPair {
    pub a: StationCode,
    pub b: StationCode,
    pub advance: u32,
}

/// Configuration parameters for the coverage sweep.
#[derive(Debug, Clone)]
pub struct SearchOptions {
    /// Weight of elapsed minutes in the score.
    pub time_weight: f64,

    /// Weight of each still-uncovered station in the score.
    pub station_weight: f64,

    /// Weight of each node on the path in the score.
    pub path_weight: f64,

    /// When a station counts as covered.
    pub coverage: CoveragePolicy,

    /// How moves towards uncovered stations are credited.
    pub advance: AdvancePolicy,

    /// Stop after this many popped states. `None` searches until the
    /// queue empties or coverage completes.
    pub max_iterations: Option<u64>,

    /// Stop after this much wall-clock time.
    pub time_limit: Option<Duration>,

    /// Report progress to the observer every this many popped states.
    /// Zero disables progress reports.
    pub progress_every: u64,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            time_weight: 0.25,
            station_weight: 1.0,
            path_weight: 0.5,
            coverage: CoveragePolicy::default(),
            advance: AdvancePolicy::default(),
            max_iterations: None,
            time_limit: None,
            progress_every: 100_000,
        }
    }
}
