use std::fmt;

use crate::model::Group;

/// Errors raised while building or evaluating a rate model
#[derive(Debug, Clone, PartialEq)]
pub enum ModelError {
    /// Model name did not match any known rate model
    UnknownModel(String),
    /// Group label did not match `disadvantaged` or `advantaged`
    UnknownGroup(String),
    /// A parameter the model needs was absent from the combination
    MissingParameter {
        model: &'static str,
        parameter: &'static str,
    },
    InvalidParameter {
        parameter: &'static str,
        value: f64,
        reason: &'static str,
    },
    /// Beta distribution could not be built from a mean/concentration pair
    InvalidDistribution {
        group: Group,
        mean: f64,
        concentration: f64,
        reason: &'static str,
    },
    /// Sample too small to give both groups at least one individual
    InsufficientSample {
        proportion: f64,
        sample_size: usize,
    },
    /// Mean position effect was zero, so the population cannot be rescaled
    DegenerateNormalization { gamma: f64 },
}

impl fmt::Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelError::UnknownModel(name) => write!(f, "unknown rate model '{name}'"),
            ModelError::UnknownGroup(label) => write!(f, "unknown group label '{label}'"),
            ModelError::MissingParameter { model, parameter } => {
                write!(f, "{model} model requires parameter '{parameter}'")
            }
            ModelError::InvalidParameter {
                parameter,
                value,
                reason,
            } => write!(f, "invalid value {value} for '{parameter}': {reason}"),
            ModelError::InvalidDistribution {
                group,
                mean,
                concentration,
                reason,
            } => write!(
                f,
                "invalid beta parameters for {group} group (mean={mean}, concentration={concentration}): {reason}"
            ),
            ModelError::InsufficientSample {
                proportion,
                sample_size,
            } => write!(
                f,
                "sample size {sample_size} is too small to populate both groups at p={proportion}"
            ),
            ModelError::DegenerateNormalization { gamma } => write!(
                f,
                "mean position effect is zero at gamma={gamma}, cannot normalize rates"
            ),
        }
    }
}

impl std::error::Error for ModelError {}

/// Errors raised by the factorial runner
#[derive(Debug, Clone, PartialEq)]
pub enum SweepError {
    /// Grid has no axes
    EmptyGrid,
    /// Grid lacks the minority-proportion axis
    MissingProportion,
    DuplicateAxis(String),
    EmptyAxis(String),
    /// Axis range could not be expanded into values
    InvalidAxis { name: String, reason: String },
    /// Rate model failed for the combination at `index`
    Model { index: usize, source: ModelError },
    /// Sweep was cancelled through its progress handle
    Cancelled,
}

impl fmt::Display for SweepError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SweepError::EmptyGrid => write!(f, "parameter grid has no axes"),
            SweepError::MissingProportion => {
                write!(f, "parameter grid must include the proportion axis 'p'")
            }
            SweepError::DuplicateAxis(name) => write!(f, "axis '{name}' appears more than once"),
            SweepError::EmptyAxis(name) => write!(f, "axis '{name}' has no values"),
            SweepError::InvalidAxis { name, reason } => {
                write!(f, "invalid axis '{name}': {reason}")
            }
            SweepError::Model { index, source } => {
                write!(f, "combination {index} failed: {source}")
            }
            SweepError::Cancelled => write!(f, "sweep cancelled"),
        }
    }
}

impl std::error::Error for SweepError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SweepError::Model { source, .. } => Some(source),
            _ => None,
        }
    }
}
