//! Scalar comparison metrics between the two group rates.

use serde::{Deserialize, Serialize};

/// Disparity between the disadvantaged and advantaged group rates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DisparityMeasures {
    /// `rate_disadv / rate_adv`, infinite when the advantaged rate is zero
    pub disparity_ratio: f64,
    /// `rate_disadv - rate_adv`, may be negative
    pub disparity_difference: f64,
    /// Ratio adjusted for group size: `(r - 1) / (r + (1 - p) / p)`
    pub bias_parameter: f64,
}

impl DisparityMeasures {
    /// Compute the measures for a pair of group rates at minority proportion `p`.
    ///
    /// A zero advantaged rate yields an infinite ratio and a bias parameter of
    /// exactly 1.0: all punishment falls on the disadvantaged group.
    #[must_use]
    pub fn compute(rate_disadv: f64, rate_adv: f64, p: f64) -> Self {
        let disparity_difference = rate_disadv - rate_adv;

        if rate_adv > 0.0 {
            let disparity_ratio = rate_disadv / rate_adv;
            Self {
                disparity_ratio,
                disparity_difference,
                bias_parameter: bias_from_ratio(disparity_ratio, p),
            }
        } else {
            Self {
                disparity_ratio: f64::INFINITY,
                disparity_difference,
                bias_parameter: 1.0,
            }
        }
    }
}

/// Bias parameter implied by a finite disparity ratio at proportion `p`
#[must_use]
pub fn bias_from_ratio(disparity_ratio: f64, p: f64) -> f64 {
    (disparity_ratio - 1.0) / (disparity_ratio + (1.0 - p) / p)
}
