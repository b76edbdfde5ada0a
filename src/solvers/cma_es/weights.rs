//! Recombination weights of the population

use nalgebra::DVector;
use serde::{Deserialize, Serialize};

use std::ops::Deref;

/// The distribution of weights for the population. The default value is `Negative`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Weights {
    /// Weights are higher for better-ranked selected individuals and are zero for the rest of the
    /// population.
    Positive,
    /// Similar to `Positive`, but non-selected individuals have negative weights (active CMA-ES).
    Negative,
    /// Weights for selected individuals are equal and are zero for the rest of the population.
    Uniform,
}

impl Default for Weights {
    fn default() -> Self {
        Self::Negative
    }
}

/// Unnormalized weights `ln((lambda + 1) / 2) - ln(i)`, and the number of selected individuals
#[derive(Clone, Debug)]
pub(super) struct RawWeights {
    weights: DVector<f64>,
    mu: usize,
}

impl RawWeights {
    pub fn new(lambda: usize, setting: Weights) -> Self {
        let mu = lambda / 2;
        let rank_weight = |i: usize| ((lambda as f64 + 1.0) / 2.0).ln() - (i as f64).ln();
        let weights = match setting {
            Weights::Uniform => DVector::from_element(mu, 1.0),
            Weights::Positive => DVector::from_iterator(mu, (1..=mu).map(rank_weight)),
            Weights::Negative => DVector::from_iterator(lambda, (1..=lambda).map(rank_weight)),
        };

        Self { weights, mu }
    }

    pub fn mu(&self) -> usize {
        self.mu
    }

    /// Variance-effective selection mass of the first `mu` (positive) weights
    pub fn mu_eff(&self) -> f64 {
        selection_mass(&self.weights.as_slice()[..self.mu])
    }

    /// Variance-effective mass of the negative weights, if there are any
    fn mu_eff_minus(&self) -> Option<f64> {
        (self.weights.len() > self.mu).then(|| selection_mass(&self.weights.as_slice()[self.mu..]))
    }

    /// Scales positive weights to sum to one and negative weights to sum to
    /// `-min(1 + c1 / cmu, 1 + 2 mu_eff_minus / (mu_eff + 2), (1 - c1 - cmu) / (dim * cmu))`
    pub fn normalize(self, dim: usize, c1: f64, cmu: f64) -> NormalizedWeights {
        let mu_eff = self.mu_eff();
        let mu_eff_minus = self.mu_eff_minus();
        let mut weights = self.weights;

        let sum_positive = weights.iter().filter(|w| **w > 0.0).sum::<f64>();
        let sum_negative = weights.iter().filter(|w| **w < 0.0).sum::<f64>().abs();

        let negative_scale = mu_eff_minus.map(|mu_eff_minus| {
            let a_mu = 1.0 + c1 / cmu;
            let a_mu_eff = 1.0 + (2.0 * mu_eff_minus) / (mu_eff + 2.0);
            let a_pos_def = (1.0 - c1 - cmu) / (dim as f64 * cmu);
            a_mu.min(a_mu_eff).min(a_pos_def) / sum_negative
        });

        for w in weights.iter_mut() {
            if *w > 0.0 {
                *w /= sum_positive;
            } else if *w < 0.0 {
                if let Some(scale) = negative_scale {
                    *w *= scale;
                }
            }
        }

        NormalizedWeights { weights }
    }
}

fn selection_mass(weights: &[f64]) -> f64 {
    weights.iter().sum::<f64>().powi(2) / weights.iter().map(|w| w.powi(2)).sum::<f64>()
}

/// Weights after normalization, used for recombination and the covariance matrix update
#[derive(Clone, Debug)]
pub(super) struct NormalizedWeights {
    weights: DVector<f64>,
}

impl Deref for NormalizedWeights {
    type Target = DVector<f64>;

    fn deref(&self) -> &Self::Target {
        &self.weights
    }
}

#[cfg(test)]
mod tests {
    use assert_approx_eq::assert_approx_eq;

    use super::*;

    #[test]
    fn test_positive() {
        for lambda in 4..100 {
            let raw = RawWeights::new(lambda, Weights::Positive);
            assert_eq!(lambda / 2, raw.weights.len());
            assert!(raw.weights.iter().all(|w| *w > 0.0));

            let weights = raw.normalize(6, 0.2, 0.8);
            assert!(weights.iter().all(|w| *w > 0.0));
            assert_approx_eq!(1.0, weights.iter().sum::<f64>(), 1e-12);
        }
    }

    #[test]
    fn test_negative() {
        for lambda in 4..100 {
            let raw = RawWeights::new(lambda, Weights::Negative);
            let mu = raw.mu();
            assert_eq!(lambda, raw.weights.len());

            let weights = raw.normalize(4, 0.5, 0.5);
            assert_approx_eq!(1.0, weights.iter().take(mu).sum::<f64>(), 1e-12);
            assert!(weights.iter().take(mu).all(|w| *w > 0.0));
            assert!(weights.iter().skip(mu).all(|w| *w <= 0.0));
        }
    }

    #[test]
    fn test_uniform() {
        let weights = RawWeights::new(10, Weights::Uniform).normalize(3, 0.1, 0.1);

        assert_eq!(5, weights.len());
        assert!(weights.iter().all(|w| (*w - 0.2).abs() < 1e-12));
    }

    #[test]
    fn test_mu_eff() {
        // Equal weights give a selection mass of mu
        assert_approx_eq!(5.0, RawWeights::new(10, Weights::Uniform).mu_eff(), 1e-12);
        assert!(RawWeights::new(10, Weights::Positive).mu_eff() < 5.0);
    }
}
