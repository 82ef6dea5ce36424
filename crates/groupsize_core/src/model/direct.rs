//! Closed-form direct-pathway models.
//!
//! The standard and bias models redistribute a fixed population average
//! between the groups. The non-redistributive model adds disparity on top of a
//! base rate, so its population average moves with `p`.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::{GroupRates, RateModel, check_non_negative, check_proportion};
use crate::error::ModelError;
use crate::sweep::ParameterSet;

fn check_ratio(d: f64) -> Result<f64, ModelError> {
    if d.is_finite() && d >= 1.0 {
        Ok(d)
    } else {
        Err(ModelError::InvalidParameter {
            parameter: "d",
            value: d,
            reason: "disparity ratio must be at least 1",
        })
    }
}

/// Ratio-based redistribution at a fixed population average
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StandardModel {
    pub avg_rate: f64,
    /// Disparity ratio, `d >= 1`
    pub d: f64,
    pub p: f64,
}

impl StandardModel {
    pub fn new(avg_rate: f64, d: f64, p: f64) -> Result<Self, ModelError> {
        Ok(Self {
            avg_rate: check_non_negative("avg_rate", avg_rate)?,
            d: check_ratio(d)?,
            p: check_proportion(p)?,
        })
    }

    pub fn rates(&self) -> GroupRates {
        let advantaged = self.avg_rate / (self.d * self.p + (1.0 - self.p));
        GroupRates {
            disadvantaged: self.d * advantaged,
            advantaged,
        }
    }
}

impl RateModel for StandardModel {
    const NAME: &'static str = "standard";

    fn from_parameters(params: &ParameterSet) -> Result<Self, ModelError> {
        Self::new(
            params.require(Self::NAME, "avg_rate")?,
            params.require(Self::NAME, "d")?,
            params.require(Self::NAME, "p")?,
        )
    }

    fn proportion(&self) -> f64 {
        self.p
    }

    fn group_rates<R: Rng + ?Sized>(&self, _rng: &mut R) -> Result<GroupRates, ModelError> {
        Ok(self.rates())
    }
}

/// Redistribution controlled by a bias parameter `b` in `[0, 1]`.
///
/// At `b = 1` the advantaged rate is zero and the disadvantaged group carries
/// the whole population average (`avg_rate / p`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BiasRedistributionModel {
    pub avg_rate: f64,
    pub b: f64,
    pub p: f64,
}

impl BiasRedistributionModel {
    pub fn new(avg_rate: f64, b: f64, p: f64) -> Result<Self, ModelError> {
        if !(0.0..=1.0).contains(&b) {
            return Err(ModelError::InvalidParameter {
                parameter: "b",
                value: b,
                reason: "bias parameter must lie in [0, 1]",
            });
        }
        Ok(Self {
            avg_rate: check_non_negative("avg_rate", avg_rate)?,
            b,
            p: check_proportion(p)?,
        })
    }

    pub fn rates(&self) -> GroupRates {
        GroupRates {
            disadvantaged: self.avg_rate * (1.0 + self.b * ((1.0 - self.p) / self.p)),
            advantaged: self.avg_rate * (1.0 - self.b),
        }
    }
}

impl RateModel for BiasRedistributionModel {
    const NAME: &'static str = "bias";

    fn from_parameters(params: &ParameterSet) -> Result<Self, ModelError> {
        Self::new(
            params.require(Self::NAME, "avg_rate")?,
            params.require(Self::NAME, "b")?,
            params.require(Self::NAME, "p")?,
        )
    }

    fn proportion(&self) -> f64 {
        self.p
    }

    fn group_rates<R: Rng + ?Sized>(&self, _rng: &mut R) -> Result<GroupRates, ModelError> {
        Ok(self.rates())
    }
}

/// Additive disparity: the advantaged group keeps the base rate and the
/// disadvantaged group gets `d` times it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NonRedistributiveModel {
    pub base_rate: f64,
    pub d: f64,
    pub p: f64,
}

impl NonRedistributiveModel {
    pub fn new(base_rate: f64, d: f64, p: f64) -> Result<Self, ModelError> {
        Ok(Self {
            base_rate: check_non_negative("base_rate", base_rate)?,
            d: check_ratio(d)?,
            p: check_proportion(p)?,
        })
    }

    pub fn rates(&self) -> GroupRates {
        GroupRates {
            disadvantaged: self.d * self.base_rate,
            advantaged: self.base_rate,
        }
    }
}

impl RateModel for NonRedistributiveModel {
    const NAME: &'static str = "non_redistributive";

    fn from_parameters(params: &ParameterSet) -> Result<Self, ModelError> {
        Self::new(
            params.require(Self::NAME, "base_rate")?,
            params.require(Self::NAME, "d")?,
            params.require(Self::NAME, "p")?,
        )
    }

    fn proportion(&self) -> f64 {
        self.p
    }

    fn group_rates<R: Rng + ?Sized>(&self, _rng: &mut R) -> Result<GroupRates, ModelError> {
        Ok(self.rates())
    }
}
