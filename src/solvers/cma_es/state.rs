//! Variable state of a CMA-ES run and updating of that state

use nalgebra::{DMatrix, DVector};

use super::matrix::{CovarianceMatrix, PosDefCovError};
use super::parameters::Parameters;

/// Stores the variable state of the algorithm and handles updating it
#[derive(Clone, Debug)]
pub(super) struct State {
    /// The number of generations that have been fully completed
    generation: usize,
    /// The number of individuals used for updates so far
    function_evals: usize,
    /// The distribution mean
    mean: DVector<f64>,
    /// The distribution covariance matrix
    cov: CovarianceMatrix,
    /// The distribution step size
    sigma: f64,
    /// Evolution path of the mean used to update the covariance matrix
    path_c: DVector<f64>,
    /// Evolution path of the mean used to update the step size
    path_sigma: DVector<f64>,
    /// The last time the eigendecomposition was updated, in function evals
    last_eigen_update_evals: usize,
}

impl State {
    pub fn new(mean: DVector<f64>, sigma: f64) -> Self {
        let dim = mean.len();
        Self {
            generation: 0,
            function_evals: 0,
            mean,
            cov: CovarianceMatrix::new(dim),
            sigma,
            path_c: DVector::zeros(dim),
            path_sigma: DVector::zeros(dim),
            last_eigen_update_evals: 0,
        }
    }

    /// Updates the state from the steps `y = (x - mean) / sigma` of the evaluated individuals,
    /// which must be sorted from best to worst
    pub fn update(
        &mut self,
        params: &Parameters,
        steps: &[DVector<f64>],
    ) -> Result<(), PosDefCovError> {
        let dim = params.dim();
        let n = dim as f64;
        let mu_eff = params.mu_eff();
        let cc = params.cc();
        let c1 = params.c1();
        let cs = params.cs();
        let cmu = params.cmu();
        let weights = params.weights();

        self.function_evals += steps.len();

        // Weighted recombination of the mu best steps
        let yw = steps
            .iter()
            .take(params.mu())
            .zip(weights.iter())
            .map(|(y, w)| y * *w)
            .sum::<DVector<f64>>();
        self.mean += params.cm() * self.sigma * &yw;

        let sqrt_inv_c = self.cov.sqrt_inv();
        self.path_sigma = (1.0 - cs) * &self.path_sigma
            + (cs * (2.0 - cs) * mu_eff).sqrt() * sqrt_inv_c * &yw;

        // Expectation of ||N(0, I)||
        let chi_n = n.sqrt() * (1.0 - 1.0 / (4.0 * n) + 1.0 / (21.0 * n.powi(2)));

        let path_sigma_norm = self.path_sigma.magnitude()
            / (1.0 - (1.0 - cs).powi(2 * (self.generation as i32 + 1))).sqrt();
        let hs = if path_sigma_norm < (1.4 + 2.0 / (n + 1.0)) * chi_n {
            1.0
        } else {
            0.0
        };

        self.path_c = (1.0 - cc) * &self.path_c + hs * (cc * (2.0 - cc) * mu_eff).sqrt() * &yw;

        self.sigma *= ((cs / params.damp_s()) * (self.path_sigma.magnitude() / chi_n - 1.0)).exp();

        // Negative weights are rescaled so that they cannot make the matrix indefinite
        let rank_mu = steps
            .iter()
            .zip(weights.iter())
            .map(|(y, w)| {
                let wc = if *w >= 0.0 {
                    *w
                } else {
                    *w * n / (sqrt_inv_c * y).magnitude_squared()
                };
                wc * y * y.transpose()
            })
            .sum::<DMatrix<f64>>();

        let delta_hs = (1.0 - hs) * cc * (2.0 - cc);
        let new_cov = (1.0 + c1 * delta_hs - c1 - cmu * weights.sum()) * self.cov.cov()
            + c1 * &self.path_c * self.path_c.transpose()
            + cmu * rank_mu;

        // The eigendecomposition is only refreshed every few generations
        let evals_per_eigen = (0.5 * n * params.lambda() as f64 / ((c1 + cmu) * n.powi(2))) as usize;
        let update_eigen = self.function_evals > self.last_eigen_update_evals + evals_per_eigen;
        if update_eigen {
            self.last_eigen_update_evals = self.function_evals;
        }
        self.cov.set_cov(new_cov, update_eigen)?;

        self.generation += 1;
        Ok(())
    }

    pub fn generation(&self) -> usize {
        self.generation
    }

    pub fn mean(&self) -> &DVector<f64> {
        &self.mean
    }

    pub fn cov(&self) -> &CovarianceMatrix {
        &self.cov
    }

    pub fn sigma(&self) -> f64 {
        self.sigma
    }

    pub fn path_c(&self) -> &DVector<f64> {
        &self.path_c
    }

    #[cfg(test)]
    pub fn mut_sigma(&mut self) -> &mut f64 {
        &mut self.sigma
    }
}
