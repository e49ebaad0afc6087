//! Timetabled lines and their train runs.
//!
//! A `Line` is one direction of service over an ordered station list. Each
//! `TrainRun` is a single train's column of the timetable: one optional stop
//! time per station, where `None` means the train passes without stopping.

use super::{LineId, ServiceMinute, StationCode};

/// Error returned when a timetable fails validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScheduleError {
    #[error("line {line} has an empty station list")]
    EmptyStations { line: String },

    #[error("line {line} run {run} has {actual} entries for {expected} stations")]
    RunLengthMismatch {
        line: String,
        run: usize,
        expected: usize,
        actual: usize,
    },

    #[error("line {line} run {run} goes back in time at stop {stop}")]
    NonMonotonicRun {
        line: String,
        run: usize,
        stop: usize,
    },
}

/// One train's stop times, aligned to its line's station list.
///
/// `None` entries are normal values: the train does not call there.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainRun {
    stops: Vec<Option<ServiceMinute>>,
}

impl TrainRun {
    pub fn from_stops(stops: Vec<Option<ServiceMinute>>) -> Self {
        Self { stops }
    }

    pub fn stops(&self) -> &[Option<ServiceMinute>] {
        &self.stops
    }

    /// The stops this train actually makes, as (station index, time) pairs
    /// in timetable order.
    pub fn served(&self) -> impl Iterator<Item = (usize, ServiceMinute)> + '_ {
        self.stops
            .iter()
            .enumerate()
            .filter_map(|(i, t)| t.map(|t| (i, t)))
    }
}

/// One direction of a timetabled line.
///
/// Validated at construction so downstream graph building never sees a
/// malformed schedule: the station list is non-empty, every run has exactly
/// one entry per station, and served times never decrease within a run
/// (overnight times are pre-folded by [`ServiceMinute`], so a decrease is a
/// data error rather than a midnight crossing).
///
/// # Examples
///
/// ```
/// use station_sweep::domain::{Line, LineId, ServiceMinute, StationCode, TrainRun};
///
/// let id = LineId::parse("R_a").unwrap();
/// let stations = vec![
///     StationCode::parse("R1").unwrap(),
///     StationCode::parse("R2").unwrap(),
/// ];
/// let run = TrainRun::from_stops(vec![
///     Some(ServiceMinute::parse_hhmm("08:00").unwrap()),
///     Some(ServiceMinute::parse_hhmm("08:07").unwrap()),
/// ]);
///
/// let line = Line::new(id, stations, vec![run]).unwrap();
/// assert_eq!(line.stations().len(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct Line {
    id: LineId,
    stations: Vec<StationCode>,
    runs: Vec<TrainRun>,
}

impl Line {
    /// Construct a line, validating every run against the station list.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the station list is empty, a run's length differs
    /// from the station count, or a run's served times decrease.
    pub fn new(
        id: LineId,
        stations: Vec<StationCode>,
        runs: Vec<TrainRun>,
    ) -> Result<Self, ScheduleError> {
        if stations.is_empty() {
            return Err(ScheduleError::EmptyStations {
                line: id.as_str().to_owned(),
            });
        }

        for (run_idx, run) in runs.iter().enumerate() {
            if run.stops.len() != stations.len() {
                return Err(ScheduleError::RunLengthMismatch {
                    line: id.as_str().to_owned(),
                    run: run_idx,
                    expected: stations.len(),
                    actual: run.stops.len(),
                });
            }

            let mut prev: Option<ServiceMinute> = None;
            for (stop_idx, time) in run.served() {
                if let Some(p) = prev {
                    if time < p {
                        return Err(ScheduleError::NonMonotonicRun {
                            line: id.as_str().to_owned(),
                            run: run_idx,
                            stop: stop_idx,
                        });
                    }
                }
                prev = Some(time);
            }
        }

        Ok(Self { id, stations, runs })
    }

    pub fn id(&self) -> &LineId {
        &self.id
    }

    pub fn stations(&self) -> &[StationCode] {
        &self.stations
    }

    pub fn runs(&self) -> &[TrainRun] {
        &self.runs
    }

    /// Position of a station in this line's station list.
    pub fn station_position(&self, code: &StationCode) -> Option<usize> {
        self.stations.iter().position(|s| s == code)
    }
}
