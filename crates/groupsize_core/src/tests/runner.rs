//! Factorial runner behavior: ordering, reproducibility, and failures

use crate::error::{ModelError, SweepError};
use crate::model::{IndirectModel, StandardModel};
use crate::sweep::{
    GridAxis, ParameterGrid, RunnerOptions, run_factorial, run_factorial_parallel,
    run_factorial_with_progress,
};

fn indirect_grid() -> ParameterGrid {
    ParameterGrid::new()
        .axis(GridAxis::linspace("p", 0.001, 0.99, 6))
        .axis(GridAxis::linspace("gamma", 0.1, 5.0, 4))
        .axis(GridAxis::fixed("mu_disadv", 0.2))
        .axis(GridAxis::arange("z_position_gap", 0.0, 0.9, 0.2).unwrap())
        .axis(GridAxis::fixed("sample_size", 500.0))
        .axis(GridAxis::fixed("target_avg_rate", 500.0))
        .axis(GridAxis::values("min_rate", [0.0, 300.0]))
}

// ============================================================================
// Shape and ordering
// ============================================================================

#[test]
fn test_row_count_is_product_of_axes() {
    let grid = ParameterGrid::new()
        .axis(GridAxis::arange("p", 0.01, 1.0, 0.01).unwrap())
        .axis(GridAxis::linspace("d", 1.0, 10.0, 30))
        .axis(GridAxis::linspace("avg_rate", 50.0, 500.0, 100));
    assert_eq!(grid.total_points(), 297_000);

    let small = ParameterGrid::new()
        .axis(GridAxis::values("p", [0.1, 0.2, 0.3]))
        .axis(GridAxis::values("d", [1.0, 2.0]))
        .axis(GridAxis::values("avg_rate", [10.0, 20.0, 30.0, 40.0]));
    let table = run_factorial::<StandardModel>(&small, RunnerOptions::default()).unwrap();
    assert_eq!(table.len(), 24);
}

#[test]
fn test_rows_follow_combination_order() {
    let grid = ParameterGrid::new()
        .axis(GridAxis::values("p", [0.1, 0.2]))
        .axis(GridAxis::values("d", [1.0, 2.0, 3.0]))
        .axis(GridAxis::fixed("avg_rate", 100.0));
    let table = run_factorial_parallel::<StandardModel>(&grid, RunnerOptions::default()).unwrap();

    let combos: Vec<_> = grid.combinations().collect();
    let params: Vec<_> = table.iter().map(|r| r.parameters.clone()).collect();
    assert_eq!(params, combos);
    assert_eq!(table.column("d"), Some(vec![1.0, 2.0, 3.0, 1.0, 2.0, 3.0]));
}

#[test]
fn test_all_parameters_retained() {
    let table = run_factorial::<IndirectModel>(&indirect_grid(), RunnerOptions::seeded(1)).unwrap();
    assert_eq!(
        table.parameter_names(),
        &[
            "p",
            "gamma",
            "mu_disadv",
            "z_position_gap",
            "sample_size",
            "target_avg_rate",
            "min_rate"
        ]
    );
    for row in &table {
        assert_eq!(row.parameters.len(), 7);
        assert_eq!(row.parameters.get("p"), Some(row.prop_disadv));
    }
}

// ============================================================================
// Reproducibility
// ============================================================================

#[test]
fn test_sequential_and_parallel_identical() {
    let grid = indirect_grid();
    let options = RunnerOptions::seeded(42);
    let sequential = run_factorial::<IndirectModel>(&grid, options).unwrap();
    let parallel = run_factorial_parallel::<IndirectModel>(&grid, options).unwrap();
    assert_eq!(sequential, parallel);
}

#[test]
fn test_same_seed_same_table() {
    let grid = indirect_grid();
    let a = run_factorial_with_progress::<IndirectModel>(&grid, RunnerOptions::seeded(9), None)
        .unwrap();
    let b = run_factorial_with_progress::<IndirectModel>(&grid, RunnerOptions::seeded(9), None)
        .unwrap();
    assert_eq!(a, b);

    let c = run_factorial::<IndirectModel>(&grid, RunnerOptions::seeded(10)).unwrap();
    assert_ne!(a.column("rate_adv"), c.column("rate_adv"));
}

// ============================================================================
// Failures
// ============================================================================

#[test]
fn test_invalid_grids_rejected() {
    let options = RunnerOptions::default();
    assert_eq!(
        run_factorial::<StandardModel>(&ParameterGrid::new(), options),
        Err(SweepError::EmptyGrid)
    );
    let no_p = ParameterGrid::new().axis(GridAxis::fixed("d", 2.0));
    assert_eq!(
        run_factorial::<StandardModel>(&no_p, options),
        Err(SweepError::MissingProportion)
    );
}

#[test]
fn test_model_error_reports_combination() {
    // Every second combination has an invalid ratio; the run stops at the first
    let grid = ParameterGrid::new()
        .axis(GridAxis::values("p", [0.2, 0.4]))
        .axis(GridAxis::values("d", [2.0, 0.5]))
        .axis(GridAxis::fixed("avg_rate", 100.0));
    let expected = Err(SweepError::Model {
        index: 1,
        source: ModelError::InvalidParameter {
            parameter: "d",
            value: 0.5,
            reason: "disparity ratio must be at least 1",
        },
    });

    assert_eq!(
        run_factorial::<StandardModel>(&grid, RunnerOptions::default()),
        expected
    );

    let missing_ratio = ParameterGrid::new()
        .axis(GridAxis::values("p", [0.1, 0.2, 0.3, 0.4]))
        .axis(GridAxis::fixed("avg_rate", 100.0));
    let result = run_factorial_parallel::<StandardModel>(&missing_ratio, RunnerOptions::default());
    assert!(matches!(
        result,
        Err(SweepError::Model {
            source: ModelError::MissingParameter {
                model: "standard",
                parameter: "d"
            },
            ..
        })
    ));
}

#[test]
fn test_degenerate_sample_fails_fast() {
    let grid = ParameterGrid::new()
        .axis(GridAxis::values("p", [0.5, 0.9]))
        .axis(GridAxis::fixed("gamma", 1.0))
        .axis(GridAxis::fixed("sample_size", 1.0))
        .axis(GridAxis::fixed("target_avg_rate", 100.0));
    let result = run_factorial_parallel::<IndirectModel>(&grid, RunnerOptions::default());
    assert!(matches!(
        result,
        Err(SweepError::Model {
            source: ModelError::InsufficientSample { .. },
            ..
        })
    ));
}
