//! Sweep execution with periodic progress logging

use std::panic;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use groupsize_core::SweepError;
use groupsize_core::sweep::{ParameterGrid, ResultTable, RunnerOptions, SweepProgress, run_model};

use crate::config::SweepFile;

/// Run `sweep` on a worker thread while the calling thread logs
/// `progress` every `interval` until the worker returns.
pub fn run_sweep(
    sweep: &SweepFile,
    grid: &ParameterGrid,
    options: RunnerOptions,
    progress: &SweepProgress,
    interval: Duration,
) -> Result<ResultTable, SweepError> {
    let (done_tx, done_rx) = mpsc::channel::<()>();

    thread::scope(|scope| {
        let worker = scope.spawn(move || {
            let result = run_model(sweep.model, grid, options, Some(progress));
            let _ = done_tx.send(());
            result
        });

        // Disconnected means the worker is gone, with or without a result
        while let Err(RecvTimeoutError::Timeout) = done_rx.recv_timeout(interval) {
            tracing::info!(
                completed = progress.completed(),
                total = progress.total(),
                "Sweep progress"
            );
        }

        worker
            .join()
            .unwrap_or_else(|payload| panic::resume_unwind(payload))
    })
}
