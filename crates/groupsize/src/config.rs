//! YAML sweep definitions.
//!
//! ```yaml
//! name: standard
//! model: standard
//! seed: 42
//! parameters:
//!   - name: p
//!     arange: { start: 0.01, stop: 1.0, step: 0.01 }
//!   - name: d
//!     linspace: { start: 1.0, stop: 10.0, num: 30 }
//!   - name: avg_rate
//!     values: [200.0]
//! ```

use std::fs;
use std::path::Path;

use groupsize_core::SweepError;
use groupsize_core::model::ModelKind;
use groupsize_core::sweep::{GridAxis, MAX_AXIS_LEN, ParameterGrid, RunnerOptions};
use serde::{Deserialize, Serialize};

/// Error types for loading and validating sweep files
#[derive(Debug)]
pub enum ConfigError {
    Io(String),
    Parse(String),
    /// Axis declares none of `values`, `linspace`, `arange`
    MissingValues(String),
    /// Axis declares more than one value source
    ConflictingValues(String),
    Grid(SweepError),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(msg) => write!(f, "IO error: {}", msg),
            ConfigError::Parse(msg) => write!(f, "Parse error: {}", msg),
            ConfigError::MissingValues(name) => write!(
                f,
                "Parameter '{}' needs one of values, linspace or arange",
                name
            ),
            ConfigError::ConflictingValues(name) => {
                write!(f, "Parameter '{}' declares more than one value source", name)
            }
            ConfigError::Grid(err) => write!(f, "Invalid grid: {}", err),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Grid(err) => Some(err),
            _ => None,
        }
    }
}

impl From<SweepError> for ConfigError {
    fn from(err: SweepError) -> Self {
        ConfigError::Grid(err)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinspaceSpec {
    pub start: f64,
    pub stop: f64,
    pub num: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArangeSpec {
    pub start: f64,
    pub stop: f64,
    pub step: f64,
}

/// One grid axis as written in YAML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AxisSpec {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linspace: Option<LinspaceSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arange: Option<ArangeSpec>,
}

impl AxisSpec {
    pub fn to_axis(&self) -> Result<GridAxis, ConfigError> {
        let name = self.name.clone();
        match (&self.values, &self.linspace, &self.arange) {
            (Some(values), None, None) => Ok(GridAxis::values(name, values.clone())),
            (None, Some(l), None) if l.num > MAX_AXIS_LEN => Err(SweepError::InvalidAxis {
                name,
                reason: format!("linspace of {} values exceeds the limit of {MAX_AXIS_LEN}", l.num),
            }
            .into()),
            (None, Some(l), None) => Ok(GridAxis::linspace(name, l.start, l.stop, l.num)),
            (None, None, Some(a)) => Ok(GridAxis::arange(name, a.start, a.stop, a.step)?),
            (None, None, None) => Err(ConfigError::MissingValues(name)),
            _ => Err(ConfigError::ConflictingValues(name)),
        }
    }
}

/// A complete sweep: which model to run over which grid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SweepFile {
    pub name: String,
    pub model: ModelKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parallel: Option<bool>,
    pub parameters: Vec<AxisSpec>,
}

impl SweepFile {
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        serde_saphyr::from_str(yaml).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {}", path.display(), e)))?;
        Self::from_yaml(&content)
    }

    /// Expand every axis and validate the resulting grid
    pub fn grid(&self) -> Result<ParameterGrid, ConfigError> {
        let mut grid = ParameterGrid::new();
        for spec in &self.parameters {
            grid.push(spec.to_axis()?);
        }
        grid.validate()?;
        Ok(grid)
    }

    /// Runner options, with command-line overrides taking precedence
    pub fn runner_options(&self, seed: Option<u64>, sequential: bool) -> RunnerOptions {
        let defaults = RunnerOptions::default();
        RunnerOptions {
            seed: seed.or(self.seed).unwrap_or(defaults.seed),
            parallel: !sequential && self.parallel.unwrap_or(defaults.parallel),
        }
    }

    /// Lowercased name with whitespace replaced, used for output file names
    pub fn file_stem(&self) -> String {
        self.name
            .trim()
            .to_lowercase()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join("_")
    }
}
