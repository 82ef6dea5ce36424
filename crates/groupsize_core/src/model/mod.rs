//! Rate models mapping a parameter combination to per-group rates.
//!
//! Direct-pathway models are closed form; the indirect-pathway model samples a
//! stratified population and normalizes position-driven rates.

mod direct;
mod indirect;
pub mod normalize;
pub mod stratification;

use std::fmt;
use std::str::FromStr;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::ModelError;
use crate::sweep::ParameterSet;

pub use direct::{BiasRedistributionModel, NonRedistributiveModel, StandardModel};
pub use indirect::{IndirectModel, RateScaling};
pub use normalize::{NormalizationFactors, NormalizedRates};
pub use stratification::{StratificationParams, StratificationSample};

/// The two population subgroups being compared
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Group {
    Disadvantaged,
    Advantaged,
}

impl Group {
    pub fn as_str(self) -> &'static str {
        match self {
            Group::Disadvantaged => "disadvantaged",
            Group::Advantaged => "advantaged",
        }
    }
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Group {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("disadvantaged") {
            Ok(Group::Disadvantaged)
        } else if s.eq_ignore_ascii_case("advantaged") {
            Ok(Group::Advantaged)
        } else {
            Err(ModelError::UnknownGroup(s.to_string()))
        }
    }
}

/// Rates for both groups from a single model evaluation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GroupRates {
    pub disadvantaged: f64,
    pub advantaged: f64,
}

impl GroupRates {
    pub fn get(&self, group: Group) -> f64 {
        match group {
            Group::Disadvantaged => self.disadvantaged,
            Group::Advantaged => self.advantaged,
        }
    }

    /// Population-weighted average rate at minority proportion `p`
    pub fn population_average(&self, p: f64) -> f64 {
        p * self.disadvantaged + (1.0 - p) * self.advantaged
    }
}

/// A rate model configuration that the factorial runner can sweep.
///
/// Implementors are built from a bound grid combination, ignoring any
/// parameters they do not use.
pub trait RateModel: Sized {
    /// Name used in error messages and model selection
    const NAME: &'static str;

    /// Build the model from one grid combination
    fn from_parameters(params: &ParameterSet) -> Result<Self, ModelError>;

    /// Minority (disadvantaged) group proportion
    fn proportion(&self) -> f64;

    /// Evaluate both group rates. Stochastic models draw from `rng`.
    fn group_rates<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<GroupRates, ModelError>;

    /// Rate for a single group
    fn rate<R: Rng + ?Sized>(&self, group: Group, rng: &mut R) -> Result<f64, ModelError> {
        self.group_rates(rng).map(|rates| rates.get(group))
    }
}

/// Selectable rate models
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    /// Ratio-based redistribution holding the population average fixed
    Standard,
    /// Bias-parameter redistribution holding the population average fixed
    Bias,
    /// Additive disparity on top of a base rate
    NonRedistributive,
    /// Stratification sampling with position-driven rates
    Indirect,
}

impl ModelKind {
    pub const ALL: [ModelKind; 4] = [
        ModelKind::Standard,
        ModelKind::Bias,
        ModelKind::NonRedistributive,
        ModelKind::Indirect,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ModelKind::Standard => StandardModel::NAME,
            ModelKind::Bias => BiasRedistributionModel::NAME,
            ModelKind::NonRedistributive => NonRedistributiveModel::NAME,
            ModelKind::Indirect => IndirectModel::NAME,
        }
    }

    /// Whether repeated evaluation of the same combination can differ
    pub fn is_stochastic(self) -> bool {
        matches!(self, ModelKind::Indirect)
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ModelKind {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        ModelKind::ALL
            .into_iter()
            .find(|kind| kind.name() == normalized)
            .ok_or_else(|| ModelError::UnknownModel(s.to_string()))
    }
}

/// Require `p` strictly inside (0, 1)
pub(crate) fn check_proportion(p: f64) -> Result<f64, ModelError> {
    if p > 0.0 && p < 1.0 {
        Ok(p)
    } else {
        Err(ModelError::InvalidParameter {
            parameter: "p",
            value: p,
            reason: "proportion must lie strictly between 0 and 1",
        })
    }
}

pub(crate) fn check_non_negative(parameter: &'static str, value: f64) -> Result<f64, ModelError> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(ModelError::InvalidParameter {
            parameter,
            value,
            reason: "must be finite and non-negative",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_parse_case_insensitive() {
        assert_eq!("Disadvantaged".parse::<Group>(), Ok(Group::Disadvantaged));
        assert_eq!("ADVANTAGED".parse::<Group>(), Ok(Group::Advantaged));
        assert_eq!(
            "disadvantged".parse::<Group>(),
            Err(ModelError::UnknownGroup("disadvantged".into()))
        );
    }

    #[test]
    fn test_model_kind_parse() {
        assert_eq!("standard".parse::<ModelKind>(), Ok(ModelKind::Standard));
        assert_eq!(
            "non-redistributive".parse::<ModelKind>(),
            Ok(ModelKind::NonRedistributive)
        );
        assert_eq!(" Indirect ".parse::<ModelKind>(), Ok(ModelKind::Indirect));
        assert!(ModelKind::Indirect.is_stochastic());
        assert!(!ModelKind::Standard.is_stochastic());
        assert!(matches!(
            "quadratic".parse::<ModelKind>(),
            Err(ModelError::UnknownModel(_))
        ));
    }

    #[test]
    fn test_population_average() {
        let rates = GroupRates {
            disadvantaged: 300.0,
            advantaged: 100.0,
        };
        assert!((rates.population_average(0.25) - 150.0).abs() < 1e-12);
        assert_eq!(rates.get(Group::Advantaged), 100.0);
    }
}
