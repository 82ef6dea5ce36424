//! Synthetic populations on a latent 0-1 stratification dimension.
//!
//! Each group's positions follow a Beta distribution parameterized by a mean
//! and a concentration (`alpha + beta`). The advantaged group's mean sits
//! `z_position_gap` above the disadvantaged group's mean.

use rand::Rng;
use rand_distr::{Beta, Distribution};
use serde::{Deserialize, Serialize};

use super::{Group, check_proportion};
use crate::error::ModelError;

/// Bounds keeping the advantaged mean strictly inside (0, 1)
const MIN_MEAN: f64 = 0.001;
const MAX_MEAN: f64 = 0.999;

/// Largest population a single draw may allocate
pub const MAX_SAMPLE_SIZE: usize = 100_000_000;

/// Beta shape parameters `(alpha, beta)` from a mean and concentration
pub fn beta_shape(group: Group, mean: f64, concentration: f64) -> Result<(f64, f64), ModelError> {
    let invalid = |reason| ModelError::InvalidDistribution {
        group,
        mean,
        concentration,
        reason,
    };
    if !(mean > 0.0 && mean < 1.0) {
        return Err(invalid("mean must lie strictly between 0 and 1"));
    }
    if !(concentration.is_finite() && concentration > 0.0) {
        return Err(invalid("concentration must be positive and finite"));
    }
    Ok((mean * concentration, (1.0 - mean) * concentration))
}

/// Parameters of a stratified population draw
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StratificationParams {
    /// Disadvantaged-group proportion
    pub p: f64,
    /// Mean position of the disadvantaged group
    pub mu_disadv: f64,
    /// Offset from the disadvantaged mean to the advantaged mean
    pub z_position_gap: f64,
    pub c_disadv: f64,
    pub c_adv: f64,
    pub sample_size: usize,
}

impl Default for StratificationParams {
    fn default() -> Self {
        Self {
            p: 0.5,
            mu_disadv: 0.3,
            z_position_gap: 0.4,
            c_disadv: 5.0,
            c_adv: 5.0,
            sample_size: 10_000,
        }
    }
}

impl StratificationParams {
    /// Advantaged-group mean, clamped into `[0.001, 0.999]`
    pub fn mu_adv(&self) -> f64 {
        (self.mu_disadv + self.z_position_gap).clamp(MIN_MEAN, MAX_MEAN)
    }

    /// Split `sample_size` into `(n_disadv, n_adv)`.
    ///
    /// `n_disadv` is `floor(p * sample_size)` but never below one, so a tiny
    /// minority still yields a defined group mean. The advantaged group must
    /// also keep at least one individual. Sizes above [`MAX_SAMPLE_SIZE`]
    /// are rejected.
    pub fn group_sizes(&self) -> Result<(usize, usize), ModelError> {
        let p = check_proportion(self.p)?;
        if self.sample_size > MAX_SAMPLE_SIZE {
            return Err(ModelError::InvalidParameter {
                parameter: "sample_size",
                value: self.sample_size as f64,
                reason: "sample size exceeds 100000000",
            });
        }
        let n_disadv = ((p * self.sample_size as f64) as usize).max(1);
        if n_disadv >= self.sample_size {
            return Err(ModelError::InsufficientSample {
                proportion: p,
                sample_size: self.sample_size,
            });
        }
        Ok((n_disadv, self.sample_size - n_disadv))
    }

    /// Draw a fresh population
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<StratificationSample, ModelError> {
        let (n_disadv, n_adv) = self.group_sizes()?;
        let mu_adv = self.mu_adv();
        let shape_disadv = beta_shape(Group::Disadvantaged, self.mu_disadv, self.c_disadv)?;
        let shape_adv = beta_shape(Group::Advantaged, mu_adv, self.c_adv)?;

        let dist_disadv = beta_distribution(
            Group::Disadvantaged,
            self.mu_disadv,
            self.c_disadv,
            shape_disadv,
        )?;
        let dist_adv = beta_distribution(Group::Advantaged, mu_adv, self.c_adv, shape_adv)?;

        let mut positions = Vec::with_capacity(n_disadv + n_adv);
        positions.extend((0..n_disadv).map(|_| dist_disadv.sample(rng)));
        positions.extend((0..n_adv).map(|_| dist_adv.sample(rng)));

        Ok(StratificationSample {
            positions,
            n_disadv,
            mu_adv,
            shape_disadv,
            shape_adv,
        })
    }
}

fn beta_distribution(
    group: Group,
    mean: f64,
    concentration: f64,
    (alpha, beta): (f64, f64),
) -> Result<Beta<f64>, ModelError> {
    Beta::new(alpha, beta).map_err(|_| ModelError::InvalidDistribution {
        group,
        mean,
        concentration,
        reason: "shape parameters must be positive and finite",
    })
}

/// A sampled population. Disadvantaged individuals come first, then advantaged.
#[derive(Debug, Clone, PartialEq)]
pub struct StratificationSample {
    positions: Vec<f64>,
    n_disadv: usize,
    /// Advantaged-group mean after clamping
    pub mu_adv: f64,
    /// `(alpha, beta)` of the disadvantaged group's distribution
    pub shape_disadv: (f64, f64),
    /// `(alpha, beta)` of the advantaged group's distribution
    pub shape_adv: (f64, f64),
}

impl StratificationSample {
    /// Wrap fixed positions, e.g. to evaluate the normalizer deterministically.
    /// Shapes are left at zero since nothing was sampled.
    pub fn from_positions(positions_disadv: &[f64], positions_adv: &[f64]) -> Self {
        let mut positions = Vec::with_capacity(positions_disadv.len() + positions_adv.len());
        positions.extend_from_slice(positions_disadv);
        positions.extend_from_slice(positions_adv);
        Self {
            positions,
            n_disadv: positions_disadv.len(),
            mu_adv: 0.0,
            shape_disadv: (0.0, 0.0),
            shape_adv: (0.0, 0.0),
        }
    }

    /// All positions, aligned with `groups()`
    pub fn positions(&self) -> &[f64] {
        &self.positions
    }

    pub fn positions_disadv(&self) -> &[f64] {
        &self.positions[..self.n_disadv]
    }

    pub fn positions_adv(&self) -> &[f64] {
        &self.positions[self.n_disadv..]
    }

    /// Group membership of the individual at `index`
    pub fn group_of(&self, index: usize) -> Group {
        if index < self.n_disadv {
            Group::Disadvantaged
        } else {
            Group::Advantaged
        }
    }

    /// Group labels, aligned with `positions()`
    pub fn groups(&self) -> impl Iterator<Item = Group> + '_ {
        (0..self.positions.len()).map(|i| self.group_of(i))
    }

    /// Number of disadvantaged individuals
    pub fn n_disadv(&self) -> usize {
        self.n_disadv
    }

    pub fn n_adv(&self) -> usize {
        self.positions.len() - self.n_disadv
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    fn params(p: f64, sample_size: usize) -> StratificationParams {
        StratificationParams {
            p,
            sample_size,
            ..Default::default()
        }
    }

    #[test]
    fn test_beta_shape() {
        let (a, b) = beta_shape(Group::Disadvantaged, 0.2, 20.0).unwrap();
        assert!((a - 4.0).abs() < 1e-12);
        assert!((b - 16.0).abs() < 1e-12);

        assert!(beta_shape(Group::Advantaged, 0.0, 5.0).is_err());
        assert!(beta_shape(Group::Advantaged, 1.0, 5.0).is_err());
        assert!(beta_shape(Group::Advantaged, 0.5, 0.0).is_err());
        assert!(beta_shape(Group::Advantaged, 0.5, f64::INFINITY).is_err());
    }

    #[test]
    fn test_mu_adv_clamped() {
        let high = StratificationParams {
            mu_disadv: 0.8,
            z_position_gap: 0.6,
            ..Default::default()
        };
        assert_eq!(high.mu_adv(), 0.999);

        let low = StratificationParams {
            mu_disadv: 0.2,
            z_position_gap: -0.5,
            ..Default::default()
        };
        assert_eq!(low.mu_adv(), 0.001);
    }

    #[test]
    fn test_group_sizes_truncate() {
        assert_eq!(params(0.15, 10_000).group_sizes(), Ok((1500, 8500)));
        assert_eq!(params(0.333, 10).group_sizes(), Ok((3, 7)));
    }

    #[test]
    fn test_tiny_proportion_keeps_one_disadvantaged() {
        assert_eq!(params(0.001, 100).group_sizes(), Ok((1, 99)));
    }

    #[test]
    fn test_degenerate_sample_sizes() {
        assert!(matches!(
            params(0.5, 1).group_sizes(),
            Err(ModelError::InsufficientSample { .. })
        ));
        assert!(matches!(
            params(0.5, 0).group_sizes(),
            Err(ModelError::InsufficientSample { .. })
        ));
        assert!(matches!(
            params(0.0, 100).group_sizes(),
            Err(ModelError::InvalidParameter { parameter: "p", .. })
        ));
    }

    #[test]
    fn test_oversized_sample_rejected_before_drawing() {
        let mut rng = SmallRng::seed_from_u64(3);
        assert!(matches!(
            params(0.5, usize::MAX).sample(&mut rng),
            Err(ModelError::InvalidParameter {
                parameter: "sample_size",
                ..
            })
        ));
        assert!(params(0.5, MAX_SAMPLE_SIZE).group_sizes().is_ok());
    }

    #[test]
    fn test_sample_layout() {
        let mut rng = SmallRng::seed_from_u64(7);
        let sample = params(0.3, 1000).sample(&mut rng).unwrap();

        assert_eq!(sample.len(), 1000);
        assert_eq!(sample.n_disadv(), 300);
        assert_eq!(sample.n_adv(), 700);
        assert_eq!(sample.positions_disadv().len(), 300);
        assert!(sample.positions().iter().all(|z| (0.0..=1.0).contains(z)));

        let groups: Vec<Group> = sample.groups().collect();
        assert_eq!(groups[299], Group::Disadvantaged);
        assert_eq!(groups[300], Group::Advantaged);
    }

    #[test]
    fn test_sample_means_follow_gap() {
        let mut rng = SmallRng::seed_from_u64(11);
        let strat = StratificationParams {
            p: 0.5,
            mu_disadv: 0.2,
            z_position_gap: 0.4,
            c_disadv: 20.0,
            c_adv: 20.0,
            sample_size: 20_000,
        };
        let sample = strat.sample(&mut rng).unwrap();
        let mean = |xs: &[f64]| xs.iter().sum::<f64>() / xs.len() as f64;

        assert!((mean(sample.positions_disadv()) - 0.2).abs() < 0.01);
        assert!((mean(sample.positions_adv()) - 0.6).abs() < 0.01);
    }

    #[test]
    fn test_same_seed_same_sample() {
        let strat = params(0.4, 500);
        let a = strat.sample(&mut SmallRng::seed_from_u64(3)).unwrap();
        let b = strat.sample(&mut SmallRng::seed_from_u64(3)).unwrap();
        assert_eq!(a, b);
    }
}
