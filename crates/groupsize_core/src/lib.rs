//! Group-size disparity simulation library
//!
//! This crate models how the relative size of a disadvantaged group shapes
//! observed disparities in outcome rates between two groups. It supports:
//! - Direct-pathway models (ratio, bias, and additive) in closed form
//! - An indirect-pathway model that samples positions on a latent
//!   stratification dimension and normalizes position-driven rates
//! - Disparity measures (ratio, difference, bias parameter)
//! - Factorial parameter sweeps, sequential or parallel, with reproducible seeds
//! - Derived analysis: deviation from the population average, disparity
//!   buckets, and parameter/metric correlations
//!
//! # Example
//!
//! ```ignore
//! use groupsize_core::model::StandardModel;
//! use groupsize_core::sweep::{GridAxis, ParameterGrid, RunnerOptions, run_factorial};
//!
//! let grid = ParameterGrid::new()
//!     .axis(GridAxis::arange("p", 0.01, 1.0, 0.01)?)
//!     .axis(GridAxis::linspace("d", 1.0, 10.0, 30))
//!     .axis(GridAxis::fixed("avg_rate", 200.0));
//!
//! let table = run_factorial::<StandardModel>(&grid, RunnerOptions::seeded(42))?;
//! println!("{}", table.to_csv(false));
//! ```

#![warn(clippy::all)]

// ============================================================================
// Core modules
// ============================================================================

pub mod analysis;
pub mod disparity;
pub mod error;
pub mod model;
pub mod sweep;

// ============================================================================
// Test modules
// ============================================================================

#[cfg(test)]
mod tests;

// ============================================================================
// Public re-exports for convenience
// ============================================================================

pub use disparity::DisparityMeasures;
pub use error::{ModelError, SweepError};
pub use model::{Group, GroupRates, ModelKind, RateModel};
pub use sweep::{
    GridAxis, ParameterGrid, ParameterSet, ResultTable, RunnerOptions, SimulationRow,
    SweepProgress,
};
