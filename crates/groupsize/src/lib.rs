//! Command-line front end for group-size disparity sweeps
//!
//! Loads a sweep from YAML or a built-in preset, runs it through
//! `groupsize_core`, and writes the result table, derived analysis, and a run
//! manifest.

pub mod config;
pub mod io;
mod logging;
pub mod presets;
mod runner;

pub use config::{ConfigError, SweepFile};
pub use logging::init_logging;
pub use presets::Preset;
pub use runner::run_sweep;
