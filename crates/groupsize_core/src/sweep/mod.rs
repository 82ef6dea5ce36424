//! Factorial parameter sweeps.
//!
//! A [`ParameterGrid`] defines the axes, the runner evaluates a [`RateModel`]
//! at every combination, and the rows are collected into a [`ResultTable`].
//!
//! [`RateModel`]: crate::model::RateModel

mod grid;
mod results;
mod runner;

pub use grid::{
    GridAxis, MAX_AXIS_LEN, PROPORTION_KEY, ParameterGrid, ParameterSet, arange, linspace, round_to,
};
pub use results::{BASE_COLUMNS, DEVIATION_COLUMNS, ResultTable, SimulationRow};
pub use runner::{
    RunnerOptions, SweepProgress, evaluate_combination, run_factorial, run_factorial_parallel,
    run_factorial_with_progress, run_model,
};
