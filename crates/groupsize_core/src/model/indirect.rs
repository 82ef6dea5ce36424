//! Indirect-pathway model: rates follow from sampled positions on the
//! stratification dimension rather than from group membership directly.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::normalize::{absolute_rates, normalized_rates};
use super::stratification::{MAX_SAMPLE_SIZE, StratificationParams};
use super::{GroupRates, RateModel, check_non_negative, check_proportion};
use crate::error::ModelError;
use crate::sweep::ParameterSet;

/// How position effects become rates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum RateScaling {
    /// Two-stage normalization to a population average, with an optional floor
    Normalized {
        target_avg_rate: f64,
        floor_rate: f64,
    },
    /// `max_rate * (1 - z)^gamma` with no rescaling
    Absolute { max_rate: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndirectModel {
    pub stratification: StratificationParams,
    /// Exponent of the position effect; 0 means rates ignore position
    pub gamma: f64,
    pub scaling: RateScaling,
}

impl IndirectModel {
    pub fn new(
        stratification: StratificationParams,
        gamma: f64,
        scaling: RateScaling,
    ) -> Result<Self, ModelError> {
        check_proportion(stratification.p)?;
        check_non_negative("gamma", gamma)?;
        Ok(Self {
            stratification,
            gamma,
            scaling,
        })
    }

    /// Draw one population and compute both group rates from it
    pub fn evaluate<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<GroupRates, ModelError> {
        let sample = self.stratification.sample(rng)?;
        match self.scaling {
            RateScaling::Normalized {
                target_avg_rate,
                floor_rate,
            } => normalized_rates(&sample, self.gamma, target_avg_rate, floor_rate)
                .map(|out| out.group_rates()),
            RateScaling::Absolute { max_rate } => absolute_rates(&sample, self.gamma, max_rate),
        }
    }
}

fn sample_size(value: f64) -> Result<usize, ModelError> {
    if (1.0..=MAX_SAMPLE_SIZE as f64).contains(&value) && value.fract() == 0.0 {
        Ok(value as usize)
    } else {
        Err(ModelError::InvalidParameter {
            parameter: "sample_size",
            value,
            reason: "sample size must be a whole number between 1 and 100000000",
        })
    }
}

impl RateModel for IndirectModel {
    const NAME: &'static str = "indirect";

    fn from_parameters(params: &ParameterSet) -> Result<Self, ModelError> {
        let defaults = StratificationParams::default();
        let stratification = StratificationParams {
            p: params.require(Self::NAME, "p")?,
            mu_disadv: params.get_or("mu_disadv", defaults.mu_disadv),
            z_position_gap: params.get_or("z_position_gap", defaults.z_position_gap),
            c_disadv: params.get_or("c_disadv", defaults.c_disadv),
            c_adv: params.get_or("c_adv", defaults.c_adv),
            sample_size: sample_size(params.get_or("sample_size", defaults.sample_size as f64))?,
        };

        let normalized = match params.get("normalized") {
            Some(flag) => flag != 0.0,
            None => params.get("target_avg_rate").is_some(),
        };
        let scaling = if normalized {
            RateScaling::Normalized {
                target_avg_rate: params.require(Self::NAME, "target_avg_rate")?,
                floor_rate: params.get_or("min_rate", 0.0),
            }
        } else {
            RateScaling::Absolute {
                max_rate: params.require(Self::NAME, "max_rate")?,
            }
        };

        Self::new(stratification, params.require(Self::NAME, "gamma")?, scaling)
    }

    fn proportion(&self) -> f64 {
        self.stratification.p
    }

    fn group_rates<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<GroupRates, ModelError> {
        self.evaluate(rng)
    }
}
