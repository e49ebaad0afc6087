//! Station coverage sweep planner.
//!
//! Turns published per-line rail timetables into a directed time-expanded
//! graph and searches it for a simple path that rides through as many
//! distinct physical stations as possible, respecting departure times and
//! minimum transfer durations.
//!
//! The pipeline: [`feed`] loads raw timetable and transfer JSON into
//! validated [`domain`] values, [`graph`] canonicalizes stations and
//! expands the schedule into event nodes with ride and transfer edges,
//! and [`planner`] runs the best-first coverage search over the result.

pub mod domain;
pub mod feed;
pub mod graph;
pub mod planner;
pub mod report;
pub mod transfers;
