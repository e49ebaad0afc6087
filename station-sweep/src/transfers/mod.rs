//! Transfer rules between lines.
//!
//! A rule says that a rider arriving at a station on one line may walk to a
//! station on another line, given a minimum number of minutes. Rules are
//! directed and potentially asymmetric; the graph builder compensates by
//! generating edges in both directions from whichever rule it sees.

use std::collections::HashMap;

use crate::domain::{InvalidLineId, InvalidStationCode, Line, LineId, StationCode};

/// Error returned when parsing a compound `line_station` rule key.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransferKeyError {
    #[error("transfer key {key:?} has no line/station separator")]
    MissingSeparator { key: String },

    #[error("transfer key {key:?}: {source}")]
    BadLine {
        key: String,
        source: InvalidLineId,
    },

    #[error("transfer key {key:?}: {source}")]
    BadStation {
        key: String,
        source: InvalidStationCode,
    },
}

/// A single transfer destination with its minimum duration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferTarget {
    pub line: LineId,
    pub station: StationCode,
    pub minutes: u32,
}

/// Which stations receive an automatic zero-minute transfer to the same
/// station code on the reciprocal-direction line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReciprocalTransfers {
    /// Every station of every line that has a reciprocal.
    Everywhere,
    /// Stations that already have two or more transfer targets, line
    /// endpoints, and the named keeps.
    AtInterchanges { keep: Vec<StationCode> },
    /// No automatic population.
    Off,
}

impl Default for ReciprocalTransfers {
    fn default() -> Self {
        Self::AtInterchanges { keep: Vec::new() }
    }
}

/// Directed transfer rules keyed by their (line, station) origin.
#[derive(Debug, Clone, Default)]
pub struct TransferRules {
    rules: HashMap<(LineId, StationCode), Vec<TransferTarget>>,
}

impl TransferRules {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a rule, replacing the duration of an existing rule to the same
    /// destination.
    pub fn add(&mut self, line: LineId, station: StationCode, target: TransferTarget) {
        let targets = self.rules.entry((line, station)).or_default();
        match targets
            .iter_mut()
            .find(|t| t.line == target.line && t.station == target.station)
        {
            Some(existing) => existing.minutes = target.minutes,
            None => targets.push(target),
        }
    }

    /// Targets reachable from a (line, station) origin. Empty when the
    /// origin has no rules.
    pub fn targets_from(&self, line: &LineId, station: &StationCode) -> &[TransferTarget] {
        self.rules
            .get(&(line.clone(), *station))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Number of targets from a (line, station) origin.
    pub fn target_count(&self, line: &LineId, station: &StationCode) -> usize {
        self.targets_from(line, station).len()
    }

    fn contains(
        &self,
        line: &LineId,
        station: &StationCode,
        dest_line: &LineId,
        dest_station: &StationCode,
    ) -> bool {
        self.targets_from(line, station)
            .iter()
            .any(|t| &t.line == dest_line && &t.station == dest_station)
    }

    /// Every (origin station, target station) code pair, for station
    /// canonicalization. Pair order within the map is arbitrary; callers
    /// must not depend on it.
    pub fn code_pairs(&self) -> impl Iterator<Item = (StationCode, StationCode)> + '_ {
        self.rules
            .iter()
            .flat_map(|((_, origin), targets)| targets.iter().map(|t| (*origin, t.station)))
    }

    /// Every rule as (origin line, origin station, target), for validation.
    pub fn iter(&self) -> impl Iterator<Item = (&LineId, &StationCode, &TransferTarget)> {
        self.rules
            .iter()
            .flat_map(|((line, station), targets)| {
                targets.iter().map(move |t| (line, station, t))
            })
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Add zero-minute transfers between a line and its reciprocal at the
    /// stations the policy selects. Only stations the reciprocal line also
    /// serves are linked; existing rules are never overwritten.
    pub fn populate_reciprocals(&mut self, lines: &[Line], policy: &ReciprocalTransfers) {
        if matches!(policy, ReciprocalTransfers::Off) {
            return;
        }

        for line in lines {
            let Some(reciprocal) = line.id().reciprocal() else {
                continue;
            };
            let Some(other) = lines.iter().find(|l| l.id() == &reciprocal) else {
                continue;
            };

            let last = line.stations().len() - 1;
            for (index, station) in line.stations().iter().enumerate() {
                if other.station_position(station).is_none() {
                    continue;
                }
                let eligible = match policy {
                    ReciprocalTransfers::Everywhere => true,
                    ReciprocalTransfers::AtInterchanges { keep } => {
                        self.target_count(line.id(), station) > 1
                            || keep.contains(station)
                            || index == 0
                            || index == last
                    }
                    ReciprocalTransfers::Off => unreachable!(),
                };

                if eligible && !self.contains(line.id(), station, &reciprocal, station) {
                    self.add(
                        line.id().clone(),
                        *station,
                        TransferTarget {
                            line: reciprocal.clone(),
                            station: *station,
                            minutes: 0,
                        },
                    );
                }
            }
        }
    }

    /// Parse a compound `{line}_{station}` key by splitting at the last
    /// underscore, since line ids themselves contain underscores.
    pub fn parse_compound_key(key: &str) -> Result<(LineId, StationCode), TransferKeyError> {
        let split = key
            .rfind('_')
            .ok_or_else(|| TransferKeyError::MissingSeparator {
                key: key.to_owned(),
            })?;
        let (line_part, station_part) = key.split_at(split);
        let station_part = &station_part[1..];

        let line = LineId::parse(line_part).map_err(|source| TransferKeyError::BadLine {
            key: key.to_owned(),
            source,
        })?;
        let station =
            StationCode::parse(station_part).map_err(|source| TransferKeyError::BadStation {
                key: key.to_owned(),
                source,
            })?;

        Ok((line, station))
    }
}
