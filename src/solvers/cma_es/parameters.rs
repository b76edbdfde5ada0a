//! Constant parameters of a CMA-ES run, derived from the problem dimension and population size

use nalgebra::DVector;

use super::weights::{NormalizedWeights, RawWeights, Weights};

/// Learning rates, damping and termination tolerances
#[derive(Clone, Debug)]
pub(super) struct Parameters {
    /// Number of dimensions to search
    dim: usize,
    /// Population size
    lambda: usize,
    /// Number of individuals to select each generation
    mu: usize,
    /// Variance-effective selection mass
    mu_eff: f64,
    /// Individual weights
    weights: NormalizedWeights,
    /// Learning rate for rank-one update cumulation
    cc: f64,
    /// Learning rate for rank-one update
    c1: f64,
    /// Learning rate for step size update
    cs: f64,
    /// Learning rate for rank-mu update
    cmu: f64,
    /// Learning rate for the mean
    cm: f64,
    /// Damping parameter for step size update
    damp_s: f64,
    /// Value for the TolFun termination criterion
    tol_fun: f64,
    /// Value for the TolX termination criterion
    tol_x: f64,
}

impl Parameters {
    pub fn new(
        dim: usize,
        lambda: usize,
        weights: Weights,
        initial_sigma: f64,
        tol_fun: f64,
        tol_x: Option<f64>,
    ) -> Self {
        let raw_weights = RawWeights::new(lambda, weights);
        let mu = raw_weights.mu();
        let mu_eff = raw_weights.mu_eff();
        let n = dim as f64;

        // Covariance matrix adaptation
        let a_cov = 2.0;
        let cc = (4.0 + mu_eff / n) / (n + 4.0 + 2.0 * mu_eff / n);
        let c1 = a_cov / ((n + 1.3).powi(2) + mu_eff);
        let cmu = (1.0 - c1).min(
            a_cov * (mu_eff - 2.0 + 1.0 / mu_eff) / ((n + 2.0).powi(2) + a_cov * mu_eff / 2.0),
        );

        let weights = raw_weights.normalize(dim, c1, cmu);

        // Step size adaptation
        let cs = (mu_eff + 2.0) / (n + mu_eff + 5.0);
        let damp_s = 1.0 + cs + 2.0 * (((mu_eff - 1.0) / (n + 1.0)).sqrt() - 1.0).max(0.0);

        Self {
            dim,
            lambda,
            mu,
            mu_eff,
            weights,
            cc,
            c1,
            cs,
            cmu,
            cm: 1.0,
            damp_s,
            tol_fun,
            tol_x: tol_x.unwrap_or(1e-12 * initial_sigma),
        }
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn lambda(&self) -> usize {
        self.lambda
    }

    pub fn mu(&self) -> usize {
        self.mu
    }

    pub fn mu_eff(&self) -> f64 {
        self.mu_eff
    }

    pub fn weights(&self) -> &DVector<f64> {
        &self.weights
    }

    pub fn cc(&self) -> f64 {
        self.cc
    }

    pub fn c1(&self) -> f64 {
        self.c1
    }

    pub fn cs(&self) -> f64 {
        self.cs
    }

    pub fn cmu(&self) -> f64 {
        self.cmu
    }

    pub fn cm(&self) -> f64 {
        self.cm
    }

    pub fn damp_s(&self) -> f64 {
        self.damp_s
    }

    pub fn tol_fun(&self) -> f64 {
        self.tol_fun
    }

    pub fn tol_x(&self) -> f64 {
        self.tol_x
    }
}
