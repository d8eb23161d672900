//! Volunteer rostering: ranked preference intake, genetic assignment search, and live
//! broadcasting of the current best assignment.

pub mod config;
pub mod error;
pub mod matching;
pub mod telemetry;
