//! Domain types for the timetable model.
//!
//! This module contains the validated core of the timetable: station codes,
//! line identifiers, schedule times and per-line train runs. All types
//! enforce their invariants at construction time, so code that receives
//! these types can trust their validity.

mod line;
mod station;
mod time;

pub use line::{Line, ScheduleError, TrainRun};
pub use station::{InvalidLineId, InvalidStationCode, LineId, StationCode};
pub use time::{ServiceMinute, TimeError};
