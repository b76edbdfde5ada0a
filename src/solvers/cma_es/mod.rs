//! The covariance matrix adaptation evolution strategy (CMA-ES).
//!
//! Each generation, `lambda` points are sampled from `N(mean, sigma^2 C)` and evaluated as one
//! batch. The mean moves towards the weighted recombination of the best points, `C` is adapted
//! with the rank-one and rank-mu updates, and `sigma` with cumulative step-size adaptation
//! (Hansen and Ostermeier, 2001).

mod matrix;
mod parameters;
mod state;
mod termination;
mod weights;

pub use weights::Weights;

use nalgebra::DVector;
use rand::distributions::Distribution;
use rand_chacha::ChaCha12Rng;
use serde::{Deserialize, Serialize};
use statrs::distribution::Normal;
use tracing::debug;

use std::collections::VecDeque;

use super::{check, Report, Solver, SolverError, TerminationReason};
use crate::evaluation::Evaluator;
use crate::{utils, Pars, SearchSpace};
use parameters::Parameters;
use state::State;

fn default_sigma() -> f64 {
    1.0
}

fn default_tol_fun() -> f64 {
    1e-12
}

/// Minimizes the objective function with CMA-ES, starting from a single point.
///
/// # Examples
///
/// ```
/// use optunity::solvers::{CmaEs, Solver};
/// use optunity::Pars;
///
/// let start = [("x".to_string(), 3.0), ("y".to_string(), -1.0)].into_iter().collect();
/// let solver = CmaEs::new(start, 200).unwrap().sigma(2.0).unwrap();
/// let solution = solver.minimize(|p: &Pars| p["x"].powi(2) + p["y"].powi(2)).unwrap();
///
/// assert!(solution.value < 1e-6);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CmaEs {
    /// The initial mean of the search distribution
    pub start: Pars,
    /// The maximum number of generations
    pub num_generations: usize,
    /// The initial step size. Default value is `1.0`.
    #[serde(default = "default_sigma")]
    pub sigma: f64,
    /// The population size. Default value is `4 + floor(3 ln d)`, used if this field is `None`.
    #[serde(default)]
    pub lambda: Option<usize>,
    /// The distribution of recombination weights. Default value is `Weights::Negative`.
    #[serde(default)]
    pub weights: Weights,
    /// The value for the `TolFun` termination criterion. Default value is `1e-12`.
    #[serde(default = "default_tol_fun")]
    pub tol_fun: f64,
    /// The value for the `TolX` termination criterion. Default value is `1e-12 * sigma`, used if
    /// this field is `None`.
    #[serde(default)]
    pub tol_x: Option<f64>,
    /// Optional box constraints. Sampled points outside the box are moved onto its boundary
    /// before they are evaluated.
    #[serde(default)]
    pub bounds: Option<SearchSpace>,
}

impl CmaEs {
    /// Creates a `CmaEs` with default options.
    pub fn new(start: Pars, num_generations: usize) -> Result<Self, SolverError> {
        let solver = Self {
            start,
            num_generations,
            sigma: default_sigma(),
            lambda: None,
            weights: Weights::default(),
            tol_fun: default_tol_fun(),
            tol_x: None,
            bounds: None,
        };
        solver.validate()?;
        Ok(solver)
    }

    /// Changes the initial step size from the default value.
    pub fn sigma(mut self, sigma: f64) -> Result<Self, SolverError> {
        self.sigma = sigma;
        self.validate()?;
        Ok(self)
    }

    /// Changes the population size from the default value (must be at least 4).
    pub fn lambda(mut self, lambda: usize) -> Result<Self, SolverError> {
        self.lambda = Some(lambda);
        self.validate()?;
        Ok(self)
    }

    /// Changes the weight distribution from the default of `Weights::Negative`.
    pub fn weights(mut self, weights: Weights) -> Result<Self, SolverError> {
        self.weights = weights;
        self.validate()?;
        Ok(self)
    }

    /// Constrains the search to a box.
    pub fn bounds(mut self, bounds: SearchSpace) -> Result<Self, SolverError> {
        self.bounds = Some(bounds);
        self.validate()?;
        Ok(self)
    }

    /// Keeps the start point and uses `ceil(num_evals / (4 + 3 ln d))` generations. This can use
    /// slightly more than `num_evals` evaluations.
    pub fn suggest_from_seed(num_evals: usize, start: Pars) -> Result<Self, SolverError> {
        check(num_evals > 0, "num_evals must be positive")?;
        check(!start.is_empty(), "start must not be empty")?;

        let fertility = 4.0 + 3.0 * (start.len() as f64).ln();
        let num_generations = (num_evals as f64 / fertility).ceil() as usize;
        Self::new(start, num_generations)
    }

    /// Starts from the center of the box with `sigma` set to a quarter of its widest range, and
    /// keeps the search inside the box.
    pub fn suggest_from_box(num_evals: usize, space: &SearchSpace) -> Result<Self, SolverError> {
        space.validate()?;
        let widest = space.widths().max();
        let solver = Self::suggest_from_seed(num_evals, space.to_pars(&space.center()))?;
        if widest > 0.0 {
            solver.sigma(widest / 4.0)?.bounds(space.clone())
        } else {
            solver.bounds(space.clone())
        }
    }

    /// Returns the population size that will be used.
    pub fn population_size(&self) -> usize {
        self.lambda
            .unwrap_or_else(|| 4 + (3.0 * (self.start.len() as f64).ln()).floor() as usize)
    }

    pub(crate) fn validate(&self) -> Result<(), SolverError> {
        check(
            self.start.values().all(|x| x.is_finite()),
            "start must be finite",
        )?;
        check(self.num_generations > 0, "num_generations must be positive")?;
        check(
            self.sigma.is_finite() && self.sigma > 0.0,
            "sigma must be positive",
        )?;
        check(self.population_size() >= 4, "lambda must be at least 4")?;
        check(self.tol_fun >= 0.0, "tol_fun must be non-negative")?;
        if let Some(tol_x) = self.tol_x {
            check(tol_x >= 0.0, "tol_x must be non-negative")?;
        }
        if let Some(bounds) = &self.bounds {
            bounds.validate()?;
            check(
                bounds.names() == self.start.keys().cloned().collect::<Vec<_>>(),
                "bounds must cover exactly the parameters of start",
            )?;
        }
        Ok(())
    }
}

impl Solver for CmaEs {
    fn name(&self) -> &'static str {
        "cma-es"
    }

    fn names(&self) -> Vec<String> {
        self.start.keys().cloned().collect()
    }

    fn solve(&self, evaluator: &mut Evaluator, rng: &mut ChaCha12Rng) -> Result<Report, SolverError> {
        self.validate()?;

        let mode = evaluator.mode();
        let dim = self.start.len();
        let lambda = self.population_size();
        let params = Parameters::new(
            dim,
            lambda,
            self.weights,
            self.sigma,
            self.tol_fun,
            self.tol_x,
        );
        let normal = Normal::new(0.0, 1.0)
            .map_err(|e| SolverError::InvalidOptions(e.to_string()))?;

        let mean = DVector::from_iterator(dim, self.start.values().cloned());
        let mut state = State::new(mean, self.sigma);
        let history_len = termination::tol_fun_history_len(dim, lambda);
        let mut best_cost_history = VecDeque::with_capacity(history_len + 1);

        let reason = loop {
            if state.generation() >= self.num_generations {
                break TerminationReason::Completed;
            }

            let points = (0..lambda)
                .map(|_| {
                    let z = DVector::from_fn(dim, |_, _| normal.sample(&mut *rng));
                    let mut x = state.mean() + state.sigma() * state.cov().transform(&z);
                    if let Some(bounds) = &self.bounds {
                        bounds.clamp(&mut x);
                    }
                    x
                })
                .collect::<Vec<_>>();

            let mut individuals = evaluator
                .evaluate(points)?
                .into_iter()
                .map(|p| {
                    let step = (p.point() - state.mean()) / state.sigma();
                    (step, mode.cost(p.value()))
                })
                .collect::<Vec<_>>();
            individuals.sort_by(|a, b| utils::partial_cmp(a.1, b.1));

            let costs = individuals.iter().map(|(_, c)| *c).collect::<Vec<_>>();
            let steps = individuals.into_iter().map(|(s, _)| s).collect::<Vec<_>>();

            best_cost_history.push_front(costs[0]);
            best_cost_history.truncate(history_len);

            if state.update(&params, &steps).is_err() {
                break TerminationReason::PosDefCov;
            }

            debug!(
                generation = state.generation(),
                best = mode.cost(costs[0]),
                sigma = state.sigma(),
                "cma-es generation"
            );

            if let Some(reason) = termination::check_termination_criteria(
                &params,
                &state,
                &best_cost_history,
                &costs,
            ) {
                break reason;
            }
        };

        Ok(Report {
            solver: self.name(),
            iterations: state.generation(),
            reason,
        })
    }
}

#[cfg(test)]
mod tests {
    use assert_approx_eq::assert_approx_eq;

    use super::*;
    use crate::Mode;

    fn start(values: &[f64]) -> Pars {
        ["x", "y", "z"]
            .iter()
            .zip(values)
            .map(|(name, v)| (name.to_string(), *v))
            .collect()
    }

    #[test]
    fn test_defaults() {
        let solver = CmaEs::new(start(&[0.0, 0.0, 0.0]), 10).unwrap();

        assert_eq!(1.0, solver.sigma);
        assert_eq!(7, solver.population_size());
        assert_eq!(Weights::Negative, solver.weights);
        assert!(solver.clone().lambda(3).is_err());
        assert!(solver.clone().sigma(0.0).is_err());
        assert!(CmaEs::new(start(&[0.0]), 0).is_err());
    }

    #[test]
    fn test_suggest_from_seed() {
        let solver = CmaEs::suggest_from_seed(100, start(&[1.0, 2.0])).unwrap();
        // fertility = 4 + 3 ln 2 ~= 6.08
        assert_eq!(17, solver.num_generations);
        assert_eq!(1.0, solver.start["x"]);
    }

    #[test]
    fn test_suggest_from_box() {
        let space = SearchSpace::new([("x", -4.0..=4.0), ("y", 0.0..=2.0)]).unwrap();
        let solver = CmaEs::suggest_from_box(200, &space).unwrap();

        assert_eq!(2.0, solver.sigma);
        assert_eq!(0.0, solver.start["x"]);
        assert_eq!(1.0, solver.start["y"]);
        assert_eq!(Some(space), solver.bounds);
    }

    #[test]
    fn test_minimize() {
        let solver = CmaEs::new(start(&[2.0, -3.0, 1.0]), 300).unwrap();
        let solution = solver
            .optimize_with_seed(
                |p: &Pars| (p["x"] - 1.0).powi(2) + (p["y"] + 1.0).powi(2) + p["z"].powi(2),
                Mode::Minimize,
                5,
            )
            .unwrap();

        assert_approx_eq!(1.0, solution.pars["x"], 1e-3);
        assert_approx_eq!(-1.0, solution.pars["y"], 1e-3);
        assert_approx_eq!(0.0, solution.pars["z"], 1e-3);
    }

    #[test]
    fn test_maximize() {
        let solver = CmaEs::new(start(&[1.0, 1.0]), 200).unwrap();
        let solution = solver
            .optimize_with_seed(
                |p: &Pars| 10.0 - p["x"].powi(2) - (p["y"] - 2.0).powi(2),
                Mode::Maximize,
                6,
            )
            .unwrap();

        assert_approx_eq!(0.0, solution.pars["x"], 1e-3);
        assert_approx_eq!(2.0, solution.pars["y"], 1e-3);
    }

    #[test]
    fn test_bounds() {
        let space = SearchSpace::new([("x", 1.0..=2.0), ("y", -1.0..=1.0)]).unwrap();
        let solver = CmaEs::suggest_from_box(500, &space).unwrap();
        let solution = solver
            .optimize_with_seed(|p: &Pars| p["x"].powi(2) + p["y"].powi(2), Mode::Minimize, 2)
            .unwrap();

        assert!(solution
            .call_log
            .iter()
            .all(|(p, _)| space.contains(&space.from_pars(p).unwrap())));
        assert_approx_eq!(1.0, solution.pars["x"], 5e-2);
        assert_approx_eq!(0.0, solution.pars["y"], 5e-2);
    }

    #[test]
    fn test_budget() {
        let solver = CmaEs::suggest_from_seed(100, start(&[1.0, 2.0, 3.0])).unwrap();
        let solution = solver
            .optimize_with_seed(|p: &Pars| p.values().map(|v| v.abs()).sum(), Mode::Minimize, 0)
            .unwrap();

        let generations = solution.report.iterations;
        assert!(generations <= solver.num_generations);
        assert_eq!(generations * solver.population_size(), solution.function_evals);
    }
}
