//! Position-to-rate transform with two-stage normalization.
//!
//! Each individual's base effect is `(1 - z)^gamma`. Rates are first scaled so
//! the population mean equals the target average (expectation normalization).
//! When a floor rate is set, rates below it are raised to the floor and the
//! whole population is rescaled once more so the mean returns to the target.

use serde::{Deserialize, Serialize};

use super::stratification::StratificationSample;
use super::{Group, GroupRates, check_non_negative};
use crate::error::ModelError;

/// Base effect of a position: strictly decreasing in `z` for `gamma > 0`
#[inline]
pub fn base_effect(position: f64, gamma: f64) -> f64 {
    (1.0 - position).powf(gamma)
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Scale `rates` so their mean equals `target`. Returns the scaled rates and the factor.
pub fn normalize_rates_to_target(rates: &[f64], target: f64) -> (Vec<f64>, f64) {
    let factor = target / mean(rates);
    (rates.iter().map(|r| r * factor).collect(), factor)
}

/// Scale factors applied by the two normalization stages
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizationFactors {
    /// `1 / mean(base_effect)`
    pub first: f64,
    /// `target / mean(rate_with_floor)`, 1 without a floor
    pub second: f64,
    /// `first * second`
    pub total: f64,
}

impl NormalizationFactors {
    fn new(first: f64, second: f64) -> Self {
        Self {
            first,
            second,
            total: first * second,
        }
    }

    /// Rate at `position` using the combined factor.
    ///
    /// This skips the floor, so it only matches the two-stage result where the
    /// floor does not bind. Use [`rates_at_positions`] for exact rates.
    pub fn approximate_rate(&self, position: f64, gamma: f64, target_avg_rate: f64) -> f64 {
        target_avg_rate * base_effect(position, gamma) * self.total
    }
}

/// Output of the full two-stage normalization over a sampled population
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedRates {
    /// Final per-individual rates, aligned with the sample positions
    pub rates: Vec<f64>,
    /// Rates after flooring, before the second rescale
    pub rates_with_floor: Vec<f64>,
    pub rate_disadv: f64,
    pub rate_adv: f64,
    /// Mean of `rates`, equal to the target up to rounding
    pub pop_avg_rate: f64,
    pub factors: NormalizationFactors,
}

impl NormalizedRates {
    pub fn group_rates(&self) -> GroupRates {
        GroupRates {
            disadvantaged: self.rate_disadv,
            advantaged: self.rate_adv,
        }
    }
}

fn check_inputs(gamma: f64, target_avg_rate: f64, floor_rate: f64) -> Result<(), ModelError> {
    check_non_negative("gamma", gamma)?;
    check_non_negative("min_rate", floor_rate)?;
    if !(target_avg_rate.is_finite() && target_avg_rate > 0.0) {
        return Err(ModelError::InvalidParameter {
            parameter: "target_avg_rate",
            value: target_avg_rate,
            reason: "target average rate must be positive and finite",
        });
    }
    Ok(())
}

/// Stage one: `1 / mean(base_effect)` over the whole population
fn first_factor(positions: &[f64], gamma: f64) -> Result<f64, ModelError> {
    let expected_effect = positions.iter().map(|&z| base_effect(z, gamma)).sum::<f64>()
        / positions.len() as f64;
    if !(expected_effect.is_finite() && expected_effect > 0.0) {
        return Err(ModelError::DegenerateNormalization { gamma });
    }
    Ok(1.0 / expected_effect)
}

/// Both normalization stages over `positions`.
///
/// Returns `(rates_with_floor, final_rates, factors)`.
fn two_stage(
    positions: &[f64],
    gamma: f64,
    target_avg_rate: f64,
    floor_rate: f64,
) -> Result<(Vec<f64>, Vec<f64>, NormalizationFactors), ModelError> {
    check_inputs(gamma, target_avg_rate, floor_rate)?;
    let first = first_factor(positions, gamma)?;

    let initial: Vec<f64> = positions
        .iter()
        .map(|&z| target_avg_rate * base_effect(z, gamma) * first)
        .collect();

    if floor_rate > 0.0 {
        let with_floor: Vec<f64> = initial.iter().map(|&r| r.max(floor_rate)).collect();
        let (rates, second) = normalize_rates_to_target(&with_floor, target_avg_rate);
        Ok((with_floor, rates, NormalizationFactors::new(first, second)))
    } else {
        Ok((initial.clone(), initial, NormalizationFactors::new(first, 1.0)))
    }
}

/// Normalized rates for a sampled population.
///
/// The population mean of the final rates equals `target_avg_rate`; with a
/// positive `floor_rate` every floored rate is at least the floor before the
/// second rescale.
pub fn normalized_rates(
    sample: &StratificationSample,
    gamma: f64,
    target_avg_rate: f64,
    floor_rate: f64,
) -> Result<NormalizedRates, ModelError> {
    if sample.n_disadv() == 0 || sample.n_adv() == 0 {
        return Err(ModelError::InsufficientSample {
            proportion: sample.n_disadv() as f64 / sample.len().max(1) as f64,
            sample_size: sample.len(),
        });
    }
    let (rates_with_floor, rates, factors) =
        two_stage(sample.positions(), gamma, target_avg_rate, floor_rate)?;

    let n_disadv = sample.n_disadv();
    Ok(NormalizedRates {
        rate_disadv: mean(&rates[..n_disadv]),
        rate_adv: mean(&rates[n_disadv..]),
        pop_avg_rate: mean(&rates),
        rates,
        rates_with_floor,
        factors,
    })
}

/// Factors-only mode: the two scale factors without keeping per-individual rates
pub fn normalization_factors(
    positions: &[f64],
    gamma: f64,
    target_avg_rate: f64,
    floor_rate: f64,
) -> Result<NormalizationFactors, ModelError> {
    check_inputs(gamma, target_avg_rate, floor_rate)?;
    let first = first_factor(positions, gamma)?;
    if floor_rate <= 0.0 {
        return Ok(NormalizationFactors::new(first, 1.0));
    }
    let floored_mean = positions
        .iter()
        .map(|&z| (target_avg_rate * base_effect(z, gamma) * first).max(floor_rate))
        .sum::<f64>()
        / positions.len() as f64;
    Ok(NormalizationFactors::new(first, target_avg_rate / floored_mean))
}

/// Exact two-stage rates for an arbitrary set of positions, e.g. an evenly
/// spaced curve over `[0, 1)`. The curve itself is the normalization population.
pub fn rates_at_positions(
    positions: &[f64],
    gamma: f64,
    target_avg_rate: f64,
    floor_rate: f64,
) -> Result<Vec<f64>, ModelError> {
    two_stage(positions, gamma, target_avg_rate, floor_rate).map(|(_, rates, _)| rates)
}

/// Group rates without normalization: `max_rate * (1 - z)^gamma` averaged per group
pub fn absolute_rates(
    sample: &StratificationSample,
    gamma: f64,
    max_rate: f64,
) -> Result<GroupRates, ModelError> {
    check_non_negative("gamma", gamma)?;
    check_non_negative("max_rate", max_rate)?;
    if sample.n_disadv() == 0 || sample.n_adv() == 0 {
        return Err(ModelError::InsufficientSample {
            proportion: sample.n_disadv() as f64 / sample.len().max(1) as f64,
            sample_size: sample.len(),
        });
    }
    let group_mean = |group: Group| {
        let positions = match group {
            Group::Disadvantaged => sample.positions_disadv(),
            Group::Advantaged => sample.positions_adv(),
        };
        max_rate * mean(&positions.iter().map(|&z| base_effect(z, gamma)).collect::<Vec<_>>())
    };
    Ok(GroupRates {
        disadvantaged: group_mean(Group::Disadvantaged),
        advantaged: group_mean(Group::Advantaged),
    })
}
