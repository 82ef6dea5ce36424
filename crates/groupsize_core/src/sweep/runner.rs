//! Factorial runner: evaluates a rate model at every grid combination.
//!
//! Each combination gets its own `SmallRng` seeded from the run seed and the
//! combination index, so stochastic models give the same rows whether the
//! sweep runs sequentially or across the rayon pool.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use rand::SeedableRng;
use rand::rngs::SmallRng;
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::grid::{ParameterGrid, ParameterSet};
use super::results::{ResultTable, SimulationRow};
use crate::error::{ModelError, SweepError};
use crate::model::{
    BiasRedistributionModel, IndirectModel, ModelKind, NonRedistributiveModel, RateModel,
    StandardModel,
};

/// Execution settings for a sweep
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunnerOptions {
    /// Base seed for stochastic models
    pub seed: u64,
    /// Spread combinations over the rayon pool. Ignored without the
    /// `parallel` feature.
    pub parallel: bool,
}

impl Default for RunnerOptions {
    fn default() -> Self {
        Self {
            seed: 0,
            parallel: cfg!(feature = "parallel"),
        }
    }
}

impl RunnerOptions {
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self {
            seed,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }
}

/// Progress tracking for a sweep
#[derive(Debug, Clone)]
pub struct SweepProgress {
    completed: Arc<AtomicUsize>,
    total: Arc<AtomicUsize>,
    cancelled: Arc<AtomicBool>,
}

impl SweepProgress {
    #[must_use]
    pub fn new(total: usize) -> Self {
        Self {
            completed: Arc::new(AtomicUsize::new(0)),
            total: Arc::new(AtomicUsize::new(total)),
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Get the number of completed points
    #[must_use]
    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::Relaxed)
    }

    /// Get the total number of points
    #[must_use]
    pub fn total(&self) -> usize {
        self.total.load(Ordering::Relaxed)
    }

    pub fn increment(&self) {
        self.completed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn reset(&self, total: usize) {
        self.completed.store(0, Ordering::Relaxed);
        self.total.store(total, Ordering::Relaxed);
    }

    /// Ask a running sweep to stop before its next combination
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}

impl Default for SweepProgress {
    fn default() -> Self {
        Self::new(0)
    }
}

/// Seed for the combination at `index`
fn combination_seed(seed: u64, index: usize) -> u64 {
    seed ^ (index as u64)
        .wrapping_add(1)
        .wrapping_mul(0x9E37_79B9_7F4A_7C15)
}

/// Evaluate one combination: build the model, draw its rates, compute measures
pub fn evaluate_combination<M: RateModel>(
    params: ParameterSet,
    index: usize,
    seed: u64,
) -> Result<SimulationRow, ModelError> {
    let model = M::from_parameters(&params)?;
    let mut rng = SmallRng::seed_from_u64(combination_seed(seed, index));
    let rates = model.group_rates(&mut rng)?;
    Ok(SimulationRow::new(params, model.proportion(), rates))
}

/// Run every combination on the calling thread
pub fn run_factorial<M: RateModel>(
    grid: &ParameterGrid,
    options: RunnerOptions,
) -> Result<ResultTable, SweepError> {
    execute::<M>(grid, options.seed, false, None)
}

/// Run combinations across the rayon pool. Rows keep combination order.
pub fn run_factorial_parallel<M: RateModel>(
    grid: &ParameterGrid,
    options: RunnerOptions,
) -> Result<ResultTable, SweepError> {
    execute::<M>(grid, options.seed, true, None)
}

/// Run with `options.parallel` deciding the mode, reporting into `progress`
pub fn run_factorial_with_progress<M: RateModel>(
    grid: &ParameterGrid,
    options: RunnerOptions,
    progress: Option<&SweepProgress>,
) -> Result<ResultTable, SweepError> {
    execute::<M>(grid, options.seed, options.parallel, progress)
}

/// Run the model selected at runtime
pub fn run_model(
    kind: ModelKind,
    grid: &ParameterGrid,
    options: RunnerOptions,
    progress: Option<&SweepProgress>,
) -> Result<ResultTable, SweepError> {
    match kind {
        ModelKind::Standard => run_factorial_with_progress::<StandardModel>(grid, options, progress),
        ModelKind::Bias => {
            run_factorial_with_progress::<BiasRedistributionModel>(grid, options, progress)
        }
        ModelKind::NonRedistributive => {
            run_factorial_with_progress::<NonRedistributiveModel>(grid, options, progress)
        }
        ModelKind::Indirect => run_factorial_with_progress::<IndirectModel>(grid, options, progress),
    }
}

fn execute<M: RateModel>(
    grid: &ParameterGrid,
    seed: u64,
    parallel: bool,
    progress: Option<&SweepProgress>,
) -> Result<ResultTable, SweepError> {
    grid.validate()?;

    let total = grid.total_points();
    if let Some(p) = progress {
        p.reset(total);
    }
    tracing::debug!(model = M::NAME, points = total, seed, parallel, "starting sweep");

    let step = |index: usize, params: ParameterSet| -> Result<SimulationRow, SweepError> {
        if let Some(p) = progress
            && p.is_cancelled()
        {
            return Err(SweepError::Cancelled);
        }
        let row = evaluate_combination::<M>(params, index, seed)
            .map_err(|source| SweepError::Model { index, source })?;
        if let Some(p) = progress {
            p.increment();
        }
        Ok(row)
    };

    let names = grid.shared_names();

    #[cfg(feature = "parallel")]
    let rows = if parallel {
        (0..total)
            .into_par_iter()
            .map(|index| step(index, grid.bind_index(&names, index)))
            .collect::<Result<Vec<_>, _>>()
    } else {
        grid.combinations()
            .enumerate()
            .map(|(index, params)| step(index, params))
            .collect::<Result<Vec<_>, _>>()
    };

    #[cfg(not(feature = "parallel"))]
    let rows = grid
        .combinations()
        .enumerate()
        .map(|(index, params)| step(index, params))
        .collect::<Result<Vec<_>, _>>();

    let rows = rows.inspect_err(|e| tracing::debug!(error = %e, "sweep aborted"))?;
    tracing::debug!(model = M::NAME, rows = rows.len(), "sweep finished");

    Ok(ResultTable::new(names, rows))
}
