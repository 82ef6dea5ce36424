//! Parameter grids and the combinations they expand into.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, SweepError};

/// Grid key holding the minority-group proportion
pub const PROPORTION_KEY: &str = "p";

/// Longest axis a grid accepts
pub const MAX_AXIS_LEN: usize = 1_000_000;

/// One independent axis of a factorial grid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridAxis {
    pub name: String,
    pub values: Vec<f64>,
}

impl GridAxis {
    pub fn values(name: impl Into<String>, values: impl Into<Vec<f64>>) -> Self {
        Self {
            name: name.into(),
            values: values.into(),
        }
    }

    /// Axis holding a single value, for parameters held constant in a sweep
    pub fn fixed(name: impl Into<String>, value: f64) -> Self {
        Self::values(name, vec![value])
    }

    /// `num` evenly spaced values over `[start, stop]`, endpoints included
    pub fn linspace(name: impl Into<String>, start: f64, stop: f64, num: usize) -> Self {
        Self::values(name, linspace(start, stop, num))
    }

    /// Values `start, start + step, ...` strictly below `stop`
    pub fn arange(
        name: impl Into<String>,
        start: f64,
        stop: f64,
        step: f64,
    ) -> Result<Self, SweepError> {
        let name = name.into();
        match arange(start, stop, step) {
            Some(values) => Ok(Self { name, values }),
            None => Err(SweepError::InvalidAxis {
                name,
                reason: format!("cannot step from {start} to {stop} by {step}"),
            }),
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Evenly spaced values over a closed interval
#[must_use]
pub fn linspace(start: f64, stop: f64, num: usize) -> Vec<f64> {
    match num {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (stop - start) / (num - 1) as f64;
            let mut values: Vec<f64> = (0..num).map(|i| start + step * i as f64).collect();
            values[num - 1] = stop;
            values
        }
    }
}

/// Evenly stepped values over a half-open interval.
///
/// Returns `None` when the step is zero, non-finite, points away from `stop`,
/// or would produce more than [`MAX_AXIS_LEN`] values.
#[must_use]
pub fn arange(start: f64, stop: f64, step: f64) -> Option<Vec<f64>> {
    if !(start.is_finite() && stop.is_finite() && step.is_finite()) || step == 0.0 {
        return None;
    }
    let span = (stop - start) / step;
    if !(0.0..=MAX_AXIS_LEN as f64).contains(&span) {
        return None;
    }
    let count = span.ceil() as usize;
    Some((0..count).map(|i| start + step * i as f64).collect())
}

/// Round to a fixed number of decimal places, halves to even
#[must_use]
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let scale = 10f64.powi(decimals as i32);
    (value * scale).round_ties_even() / scale
}

/// Ordered set of axes whose Cartesian product defines a factorial sweep.
///
/// Combinations are enumerated in row-major order: the first axis varies
/// slowest and the last axis fastest.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParameterGrid {
    axes: Vec<GridAxis>,
}

impl ParameterGrid {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an axis (builder style)
    #[must_use]
    pub fn axis(mut self, axis: GridAxis) -> Self {
        self.axes.push(axis);
        self
    }

    pub fn push(&mut self, axis: GridAxis) {
        self.axes.push(axis);
    }

    pub fn axes(&self) -> &[GridAxis] {
        &self.axes
    }

    pub fn get(&self, name: &str) -> Option<&GridAxis> {
        self.axes.iter().find(|a| a.name == name)
    }

    pub fn names(&self) -> Vec<String> {
        self.axes.iter().map(|a| a.name.clone()).collect()
    }

    /// Length of each axis
    pub fn shape(&self) -> Vec<usize> {
        self.axes.iter().map(GridAxis::len).collect()
    }

    /// Number of combinations (product of axis lengths)
    pub fn total_points(&self) -> usize {
        if self.axes.is_empty() {
            return 0;
        }
        self.axes.iter().map(GridAxis::len).product()
    }

    /// Check the grid can be swept: non-empty, unique names, axis lengths in
    /// `1..=MAX_AXIS_LEN`, a proportion axis present, and a point count that
    /// fits in `usize`.
    pub fn validate(&self) -> Result<(), SweepError> {
        if self.axes.is_empty() {
            return Err(SweepError::EmptyGrid);
        }
        for (i, axis) in self.axes.iter().enumerate() {
            if axis.is_empty() {
                return Err(SweepError::EmptyAxis(axis.name.clone()));
            }
            if axis.len() > MAX_AXIS_LEN {
                return Err(SweepError::InvalidAxis {
                    name: axis.name.clone(),
                    reason: format!("{} values exceeds the limit of {MAX_AXIS_LEN}", axis.len()),
                });
            }
            if self.axes[..i].iter().any(|a| a.name == axis.name) {
                return Err(SweepError::DuplicateAxis(axis.name.clone()));
            }
        }
        if self.get(PROPORTION_KEY).is_none() {
            return Err(SweepError::MissingProportion);
        }
        if self
            .axes
            .iter()
            .try_fold(1usize, |acc, axis| acc.checked_mul(axis.len()))
            .is_none()
        {
            return Err(SweepError::InvalidAxis {
                name: self.names().join(" x "),
                reason: "number of combinations overflows".to_string(),
            });
        }
        Ok(())
    }

    pub(crate) fn shared_names(&self) -> Arc<[String]> {
        self.axes.iter().map(|a| a.name.clone()).collect()
    }

    /// Bind the combination at a flat row-major index
    pub fn combination(&self, flat: usize) -> Option<ParameterSet> {
        self.bind_flat(&self.shared_names(), flat)
    }

    pub(crate) fn bind_flat(&self, names: &Arc<[String]>, flat: usize) -> Option<ParameterSet> {
        (flat < self.total_points()).then(|| self.bind_index(names, flat))
    }

    /// Bind an index already known to be below `total_points()`
    pub(crate) fn bind_index(&self, names: &Arc<[String]>, flat: usize) -> ParameterSet {
        let strides = compute_strides(&self.shape());
        let mut remaining = flat;
        let values = self
            .axes
            .iter()
            .zip(&strides)
            .map(|(axis, &stride)| {
                let idx = remaining / stride;
                remaining %= stride;
                axis.values[idx]
            })
            .collect();
        ParameterSet {
            names: Arc::clone(names),
            values,
        }
    }

    /// Iterate over every combination in row-major order
    pub fn combinations(&self) -> impl Iterator<Item = ParameterSet> + '_ {
        let names = self.shared_names();
        let shape = self.shape();
        let done = self.total_points() == 0;
        GridIndices {
            current: vec![0; shape.len()],
            shape,
            done,
        }
        .map(move |indices| ParameterSet {
            names: Arc::clone(&names),
            values: indices
                .iter()
                .zip(&self.axes)
                .map(|(&i, axis)| axis.values[i])
                .collect(),
        })
    }
}

/// Compute strides for row-major order
fn compute_strides(shape: &[usize]) -> Vec<usize> {
    if shape.is_empty() {
        return Vec::new();
    }
    let mut strides = vec![1; shape.len()];
    for i in (0..shape.len() - 1).rev() {
        strides[i] = strides[i + 1] * shape[i + 1];
    }
    strides
}

/// Iterator over all indices in a grid
struct GridIndices {
    shape: Vec<usize>,
    current: Vec<usize>,
    done: bool,
}

impl Iterator for GridIndices {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let result = self.current.clone();

        // Last dimension varies fastest
        for i in (0..self.shape.len()).rev() {
            self.current[i] += 1;
            if self.current[i] < self.shape[i] {
                break;
            }
            self.current[i] = 0;
            if i == 0 {
                self.done = true;
            }
        }

        Some(result)
    }
}

/// One bound combination of grid values, keyed by axis name
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterSet {
    names: Arc<[String]>,
    values: Vec<f64>,
}

impl ParameterSet {
    /// Build a set directly from name/value pairs
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, f64)>) -> Self {
        let (names, values): (Vec<String>, Vec<f64>) =
            pairs.into_iter().map(|(n, v)| (n.to_string(), v)).unzip();
        Self {
            names: names.into(),
            values,
        }
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|i| self.values[i])
    }

    pub fn get_or(&self, name: &str, default: f64) -> f64 {
        self.get(name).unwrap_or(default)
    }

    /// Look up a parameter the model cannot run without
    pub fn require(&self, model: &'static str, name: &'static str) -> Result<f64, ModelError> {
        self.get(name).ok_or(ModelError::MissingParameter {
            model,
            parameter: name,
        })
    }

    /// Overwrite a bound value. Returns `false` when `name` is absent.
    pub(crate) fn set(&mut self, name: &str, value: f64) -> bool {
        match self.names.iter().position(|n| n == name) {
            Some(i) => {
                self.values[i] = value;
                true
            }
            None => false,
        }
    }

    /// Minority proportion of this combination
    pub fn proportion(&self) -> Option<f64> {
        self.get(PROPORTION_KEY)
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.names
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().copied())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn into_values(self) -> Vec<f64> {
        self.values
    }
}
