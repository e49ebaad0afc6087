//! Raw timetable and transfer-rule feeds.
//!
//! Upstream tooling publishes two JSON documents: a timetable keyed by
//! line, and a transfer-time table keyed by line and station. This module
//! deserializes them and converts the raw shapes into validated domain
//! values, attaching the offending key to every failure.
//!
//! Timetable shape, one entry per line:
//!
//! ```json
//! { "R_a": { "stations": ["R1", "R2"],
//!            "trainSchedules": [[480, 489], [510, null]] } }
//! ```
//!
//! Stop times are integer minutes with the overnight fold already applied;
//! `null` means the run does not call there. Transfer rules, with compound
//! `line_station` destination keys and minutes to walk:
//!
//! ```json
//! { "R_a": { "R2": { "G_a_G1": 3 } } }
//! ```

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use serde::Deserialize;

use crate::domain::{
    InvalidLineId, InvalidStationCode, Line, LineId, ScheduleError, ServiceMinute, StationCode,
    TrainRun,
};
use crate::transfers::{TransferKeyError, TransferRules, TransferTarget};

/// Error loading or converting a feed document.
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    #[error("failed to read {path}: {message}")]
    Read { path: String, message: String },

    #[error("JSON error: {message}")]
    Json { message: String },

    #[error("line key {line:?}: {source}")]
    BadLineId { line: String, source: InvalidLineId },

    #[error("line {line}: station {code:?}: {source}")]
    BadStationCode {
        line: String,
        code: String,
        source: InvalidStationCode,
    },

    #[error("line {line}: {source}")]
    BadSchedule { line: String, source: ScheduleError },

    #[error("transfer rules for {line} at {station}: {source}")]
    BadTransferKey {
        line: String,
        station: String,
        source: TransferKeyError,
    },
}

#[derive(Debug, Deserialize)]
struct LineDto {
    stations: Vec<String>,
    #[serde(rename = "trainSchedules")]
    train_schedules: Vec<Vec<Option<u32>>>,
}

// BTreeMaps keep line and station order deterministic regardless of the
// JSON key order the producer happened to emit.
type TimetableDoc = BTreeMap<String, LineDto>;
type TransfersDoc = BTreeMap<String, BTreeMap<String, BTreeMap<String, u32>>>;

/// A loaded network: validated lines plus the transfer rules between them.
#[derive(Debug, Clone)]
pub struct Network {
    pub lines: Vec<Line>,
    pub rules: TransferRules,
}

impl Network {
    /// Thin the network to interchange stations only, for the simplified
    /// search variant. Lines without any transfer rule are dropped; on the
    /// rest, a station survives when it has two or more transfer targets,
    /// is a line endpoint, or is named in `keep`. Run columns follow their
    /// stations.
    pub fn retain_interchanges(&mut self, keep: &[StationCode]) -> Result<(), FeedError> {
        let with_rules: HashSet<LineId> =
            self.rules.iter().map(|(line, _, _)| line.clone()).collect();

        let mut thinned = Vec::with_capacity(self.lines.len());
        for line in &self.lines {
            if !with_rules.contains(line.id()) {
                continue;
            }
            let last = line.stations().len() - 1;
            let kept: Vec<usize> = (0..=last)
                .filter(|&index| {
                    let station = &line.stations()[index];
                    self.rules.target_count(line.id(), station) > 1
                        || keep.contains(station)
                        || index == 0
                        || index == last
                })
                .collect();

            let stations = kept.iter().map(|&i| line.stations()[i]).collect();
            let runs = line
                .runs()
                .iter()
                .map(|run| TrainRun::from_stops(kept.iter().map(|&i| run.stops()[i]).collect()))
                .collect();
            thinned.push(Line::new(line.id().clone(), stations, runs).map_err(|source| {
                FeedError::BadSchedule {
                    line: line.id().as_str().to_owned(),
                    source,
                }
            })?);
        }

        self.lines = thinned;
        Ok(())
    }
}

/// Parse a timetable document into validated lines, in key order.
pub fn parse_timetable(json: &str) -> Result<Vec<Line>, FeedError> {
    let doc: TimetableDoc = serde_json::from_str(json).map_err(|e| FeedError::Json {
        message: e.to_string(),
    })?;

    let mut lines = Vec::with_capacity(doc.len());
    for (key, dto) in doc {
        let id = LineId::parse(&key).map_err(|source| FeedError::BadLineId {
            line: key.clone(),
            source,
        })?;
        let stations = dto
            .stations
            .iter()
            .map(|code| {
                StationCode::parse(code).map_err(|source| FeedError::BadStationCode {
                    line: key.clone(),
                    code: code.clone(),
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        let runs = dto
            .train_schedules
            .into_iter()
            .map(|stops| {
                TrainRun::from_stops(
                    stops
                        .into_iter()
                        .map(|minute| minute.map(ServiceMinute::from_minutes))
                        .collect(),
                )
            })
            .collect();

        lines.push(
            Line::new(id, stations, runs).map_err(|source| FeedError::BadSchedule {
                line: key,
                source,
            })?,
        );
    }
    Ok(lines)
}

/// Parse a transfer-rule document.
pub fn parse_transfers(json: &str) -> Result<TransferRules, FeedError> {
    let doc: TransfersDoc = serde_json::from_str(json).map_err(|e| FeedError::Json {
        message: e.to_string(),
    })?;

    let mut rules = TransferRules::new();
    for (line_key, stations) in doc {
        let line = LineId::parse(&line_key).map_err(|source| FeedError::BadLineId {
            line: line_key.clone(),
            source,
        })?;
        for (station_key, targets) in stations {
            let station =
                StationCode::parse(&station_key).map_err(|source| FeedError::BadStationCode {
                    line: line_key.clone(),
                    code: station_key.clone(),
                    source,
                })?;
            for (compound, minutes) in targets {
                let (target_line, target_station) = TransferRules::parse_compound_key(&compound)
                    .map_err(|source| FeedError::BadTransferKey {
                        line: line_key.clone(),
                        station: station_key.clone(),
                        source,
                    })?;
                rules.add(
                    line.clone(),
                    station,
                    TransferTarget {
                        line: target_line,
                        station: target_station,
                        minutes,
                    },
                );
            }
        }
    }
    Ok(rules)
}

/// Load both feed documents from disk.
pub fn load_network(timetable: &Path, transfers: &Path) -> Result<Network, FeedError> {
    let read = |path: &Path| {
        std::fs::read_to_string(path).map_err(|e| FeedError::Read {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    };

    Ok(Network {
        lines: parse_timetable(&read(timetable)?)?,
        rules: parse_transfers(&read(transfers)?)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn code(s: &str) -> StationCode {
        StationCode::parse(s).unwrap()
    }

    fn line_id(s: &str) -> LineId {
        LineId::parse(s).unwrap()
    }

    const TIMETABLE: &str = r#"{
        "R_a": {
            "stations": ["R1", "R2", "R3"],
            "trainSchedules": [[480, 485, 490], [500, null, 510]]
        },
        "G_a": {
            "stations": ["G1", "G2"],
            "trainSchedules": [[481, 488]]
        }
    }"#;

    const TRANSFERS: &str = r#"{
        "R_a": { "R2": { "G_a_G1": 3, "G_a_G2": 5 } }
    }"#;

    #[test]
    fn parses_lines_in_key_order() {
        let lines = parse_timetable(TIMETABLE).unwrap();

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].id(), &line_id("G_a"));
        assert_eq!(lines[1].id(), &line_id("R_a"));
        assert_eq!(lines[1].stations().len(), 3);
        assert_eq!(lines[1].runs().len(), 2);

        // null is a skipped stop, not an error.
        let skipped: Vec<_> = lines[1].runs()[1].served().collect();
        assert_eq!(skipped.len(), 2);
        assert_eq!(skipped[0].0, 0);
        assert_eq!(skipped[1].0, 2);
    }

    #[test]
    fn parses_transfer_rules() {
        let rules = parse_transfers(TRANSFERS).unwrap();

        let targets = rules.targets_from(&line_id("R_a"), &code("R2"));
        assert_eq!(targets.len(), 2);
        let g1 = targets.iter().find(|t| t.station == code("G1")).unwrap();
        assert_eq!(g1.line, line_id("G_a"));
        assert_eq!(g1.minutes, 3);
    }

    #[test]
    fn rejects_run_length_mismatch() {
        let json = r#"{
            "R_a": { "stations": ["R1", "R2"], "trainSchedules": [[480]] }
        }"#;
        let err = parse_timetable(json).unwrap_err();
        assert!(matches!(err, FeedError::BadSchedule { .. }));
    }

    #[test]
    fn rejects_decreasing_run() {
        let json = r#"{
            "R_a": { "stations": ["R1", "R2"], "trainSchedules": [[490, 480]] }
        }"#;
        let err = parse_timetable(json).unwrap_err();
        assert!(matches!(err, FeedError::BadSchedule { .. }));
    }

    #[test]
    fn rejects_bad_station_code() {
        let json = r#"{
            "R_a": { "stations": ["R1!"], "trainSchedules": [[480]] }
        }"#;
        let err = parse_timetable(json).unwrap_err();
        match err {
            FeedError::BadStationCode { line, code, .. } => {
                assert_eq!(line, "R_a");
                assert_eq!(code, "R1!");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn rejects_bad_transfer_key() {
        let json = r#"{ "R_a": { "R2": { "nounderscore": 3 } } }"#;
        let err = parse_transfers(json).unwrap_err();
        assert!(matches!(err, FeedError::BadTransferKey { .. }));
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(matches!(
            parse_timetable("not json"),
            Err(FeedError::Json { .. })
        ));
        assert!(matches!(
            parse_transfers("[1, 2]"),
            Err(FeedError::Json { .. })
        ));
    }

    #[test]
    fn loads_both_documents() {
        let dir = tempdir().unwrap();
        let timetable = dir.path().join("timetable.json");
        let transfers = dir.path().join("transfers.json");
        std::fs::write(&timetable, TIMETABLE).unwrap();
        std::fs::write(&transfers, TRANSFERS).unwrap();

        let network = load_network(&timetable, &transfers).unwrap();
        assert_eq!(network.lines.len(), 2);
        assert!(!network.rules.is_empty());
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let dir = tempdir().unwrap();
        let timetable = dir.path().join("timetable.json");
        std::fs::write(&timetable, TIMETABLE).unwrap();

        let err = load_network(&timetable, &dir.path().join("missing.json")).unwrap_err();
        assert!(matches!(err, FeedError::Read { .. }));
    }

    #[test]
    fn retain_interchanges_keeps_endpoints_interchanges_and_named() {
        let json = r#"{
            "R_a": {
                "stations": ["R1", "R2", "R3", "R4", "R5"],
                "trainSchedules": [[480, 484, 488, 492, 496]]
            },
            "G_a": {
                "stations": ["G1", "G2"],
                "trainSchedules": [[500, 505]]
            }
        }"#;
        let rules_json = r#"{
            "R_a": { "R2": { "G_a_G1": 2, "G_a_G2": 4 } }
        }"#;
        let mut network = Network {
            lines: parse_timetable(json).unwrap(),
            rules: parse_transfers(rules_json).unwrap(),
        };

        network.retain_interchanges(&[code("R4")]).unwrap();

        // G_a has no rules of its own and disappears entirely.
        assert_eq!(network.lines.len(), 1);
        let line = &network.lines[0];
        assert_eq!(line.id(), &line_id("R_a"));
        // Endpoints, the two-target interchange and the named keep stay;
        // R3 goes.
        assert_eq!(
            line.stations(),
            &[code("R1"), code("R2"), code("R4"), code("R5")]
        );

        // Run columns follow their stations.
        let times: Vec<u32> = line.runs()[0].served().map(|(_, t)| t.minutes()).collect();
        assert_eq!(times, vec![480, 484, 492, 496]);
    }

    #[test]
    fn retain_interchanges_ignores_single_target_stations() {
        let json = r#"{
            "R_a": {
                "stations": ["R1", "R2", "R3"],
                "trainSchedules": [[480, 484, 488]]
            }
        }"#;
        let rules_json = r#"{
            "R_a": { "R2": { "G_a_G1": 2 } }
        }"#;
        let mut network = Network {
            lines: parse_timetable(json).unwrap(),
            rules: parse_transfers(rules_json).unwrap(),
        };

        network.retain_interchanges(&[]).unwrap();

        // One target is not an interchange; only the endpoints survive.
        assert_eq!(network.lines[0].stations(), &[code("R1"), code("R3")]);
    }
}
