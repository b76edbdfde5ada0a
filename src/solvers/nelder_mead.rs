//! The Nelder-Mead simplex method

use nalgebra::DVector;
use rand_chacha::ChaCha12Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{check, Report, Solver, SolverError, TerminationReason};
use crate::evaluation::Evaluator;
use crate::{Pars, SearchSpace};

/// Reflection coefficient
const ALPHA: f64 = 1.0;
/// Expansion coefficient
const GAMMA: f64 = 2.0;
/// Contraction coefficient
const RHO: f64 = -0.5;
/// Shrink coefficient
const SIGMA: f64 = 0.5;
/// Relative change of non-zero coordinates for the initial simplex
const NONZERO_DELTA: f64 = 0.05;
/// Initial simplex coordinate replacing a zero coordinate
const ZERO_DELTA: f64 = 0.00025;

/// Minimizes the objective function with the Nelder-Mead simplex method, starting from a single
/// point. The search is not constrained to a box.
///
/// The initial simplex consists of the start point and one vertex per parameter, in which that
/// parameter is scaled by `1.05` (or set to `0.00025` if it is zero).
///
/// With a cap on the number of function evaluations (`max_evals`, set by the `suggest_*`
/// constructors), a converged simplex is rebuilt the same way around its best vertex until the
/// budget or `max_iter` runs out.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NelderMead {
    /// The initial point
    pub start: Pars,
    /// The algorithm has converged when the function values of the best and worst vertices of the
    /// simplex differ by at most `ftol`. Default value is `1e-4`.
    pub ftol: f64,
    /// The maximum number of iterations. Default value is `200 * d`.
    pub max_iter: usize,
    /// An optional cap on the number of function evaluations.
    #[serde(default)]
    pub max_evals: Option<usize>,
}

impl NelderMead {
    /// Creates a `NelderMead` starting from `start` with default options.
    pub fn new(start: Pars) -> Result<Self, SolverError> {
        let max_iter = 200 * start.len();
        let solver = Self {
            start,
            ftol: 1e-4,
            max_iter,
            max_evals: None,
        };
        solver.validate()?;
        Ok(solver)
    }

    /// Changes the convergence tolerance from the default value.
    pub fn ftol(mut self, ftol: f64) -> Result<Self, SolverError> {
        self.ftol = ftol;
        self.validate()?;
        Ok(self)
    }

    /// Changes the maximum number of iterations from the default value.
    pub fn max_iter(mut self, max_iter: usize) -> Result<Self, SolverError> {
        self.max_iter = max_iter;
        self.validate()?;
        Ok(self)
    }

    /// Keeps the start point and stops the search before it uses more than `num_evals` function
    /// evaluations.
    pub fn suggest_from_seed(num_evals: usize, start: Pars) -> Result<Self, SolverError> {
        check(num_evals > start.len(), "num_evals must exceed the number of parameters")?;
        let mut solver = Self::new(start)?;
        solver.max_evals = Some(num_evals);
        Ok(solver)
    }

    /// Starts from the center of the box.
    pub fn suggest_from_box(num_evals: usize, space: &SearchSpace) -> Result<Self, SolverError> {
        space.validate()?;
        Self::suggest_from_seed(num_evals, space.to_pars(&space.center()))
    }

    pub(crate) fn validate(&self) -> Result<(), SolverError> {
        check(
            self.start.values().all(|x| x.is_finite()),
            "start must be finite",
        )?;
        check(self.ftol >= 0.0, "ftol must be non-negative")?;
        check(self.max_iter > 0, "max_iter must be positive")?;
        if let Some(max_evals) = self.max_evals {
            check(
                max_evals > self.start.len(),
                "max_evals must exceed the number of parameters",
            )?;
        }
        Ok(())
    }

    /// Returns whether `count` more evaluations fit in the budget
    fn has_budget(&self, evaluator: &Evaluator, count: usize) -> bool {
        self.max_evals
            .map_or(true, |max| evaluator.function_evals() + count <= max)
    }
}

impl Solver for NelderMead {
    fn name(&self) -> &'static str {
        "nelder-mead"
    }

    fn names(&self) -> Vec<String> {
        self.start.keys().cloned().collect()
    }

    fn solve(&self, evaluator: &mut Evaluator, _: &mut ChaCha12Rng) -> Result<Report, SolverError> {
        self.validate()?;

        let mode = evaluator.mode();
        let dim = self.start.len();
        let x0 = DVector::from_iterator(dim, self.start.values().cloned());

        // Vertices paired with their costs
        let mut vertices = evaluator
            .evaluate(initial_simplex(&x0))?
            .into_iter()
            .map(|p| (p.point().clone(), mode.cost(p.value())))
            .collect::<Vec<_>>();

        let mut iterations = 1;
        let mut restarts = 0;
        let reason = loop {
            vertices.sort_by(|a, b| crate::utils::partial_cmp(a.1, b.1));

            let best = vertices[0].1;
            let worst = vertices[dim].1;
            if (best - worst).abs() <= self.ftol {
                // A capped run spends the rest of its budget on a new simplex around the best
                // vertex
                if self.max_evals.is_none() || !self.has_budget(evaluator, dim) {
                    break TerminationReason::Converged;
                }

                restarts += 1;
                debug!(restarts, best = mode.cost(best), "nelder-mead restart");
                let restarted = initial_simplex(&vertices[0].0).split_off(1);
                for (vertex, evaluated) in vertices[1..]
                    .iter_mut()
                    .zip(evaluator.evaluate(restarted)?)
                {
                    *vertex = (evaluated.point().clone(), mode.cost(evaluated.value()));
                }
                continue;
            }
            if iterations >= self.max_iter {
                break TerminationReason::MaxIterations;
            }
            // Reflection and expansion need at most two evaluations
            if !self.has_budget(evaluator, 2) {
                break TerminationReason::Completed;
            }

            iterations += 1;
            debug!(iteration = iterations, best = mode.cost(best), "nelder-mead iteration");

            let center = vertices[..dim]
                .iter()
                .map(|(x, _)| x)
                .sum::<DVector<f64>>()
                / dim as f64;
            let second_worst = vertices[dim - 1].1;

            let reflected = reflect(&center, &vertices[dim].0, ALPHA);
            let reflected_cost = mode.cost(evaluator.evaluate_one(reflected.clone())?);
            if best <= reflected_cost && reflected_cost < second_worst {
                vertices[dim] = (reflected, reflected_cost);
                continue;
            }

            if reflected_cost < best {
                let expanded = reflect(&center, &vertices[dim].0, GAMMA);
                let expanded_cost = mode.cost(evaluator.evaluate_one(expanded.clone())?);
                vertices[dim] = if expanded_cost < reflected_cost {
                    (expanded, expanded_cost)
                } else {
                    (reflected, reflected_cost)
                };
                continue;
            }

            let contracted = reflect(&center, &vertices[dim].0, RHO);
            let contracted_cost = mode.cost(evaluator.evaluate_one(contracted.clone())?);
            if contracted_cost < worst {
                vertices[dim] = (contracted, contracted_cost);
                continue;
            }

            if !self.has_budget(evaluator, dim) {
                break TerminationReason::Completed;
            }

            // Shrink towards the best vertex
            let shrunk = vertices[1..]
                .iter()
                .map(|(x, _)| reflect(&vertices[0].0, x, -SIGMA))
                .collect::<Vec<_>>();
            for (vertex, evaluated) in vertices[1..]
                .iter_mut()
                .zip(evaluator.evaluate(shrunk)?)
            {
                *vertex = (evaluated.point().clone(), mode.cost(evaluated.value()));
            }
        };

        Ok(Report {
            solver: self.name(),
            iterations,
            reason,
        })
    }
}

/// Returns `x0` followed by one vertex per coordinate, in which that coordinate is scaled by
/// `1 + NONZERO_DELTA` (or set to `ZERO_DELTA` if it is zero)
fn initial_simplex(x0: &DVector<f64>) -> Vec<DVector<f64>> {
    let mut simplex = vec![x0.clone()];
    for k in 0..x0.len() {
        let mut vertex = x0.clone();
        vertex[k] = if vertex[k] != 0.0 {
            (1.0 + NONZERO_DELTA) * vertex[k]
        } else {
            ZERO_DELTA
        };
        simplex.push(vertex);
    }
    simplex
}

/// Returns `center + coeff * (center - x)`
fn reflect(center: &DVector<f64>, x: &DVector<f64>, coeff: f64) -> DVector<f64> {
    center + (center - x) * coeff
}

#[cfg(test)]
mod tests {
    use assert_approx_eq::assert_approx_eq;

    use super::*;
    use crate::Mode;

    fn start(x: f64, y: f64) -> Pars {
        [("x".to_string(), x), ("y".to_string(), y)].into_iter().collect()
    }

    #[test]
    fn test_reflect() {
        let center = DVector::from(vec![1.0, 1.0]);
        let x = DVector::from(vec![2.0, 0.0]);

        assert_eq!(DVector::from(vec![0.0, 2.0]), reflect(&center, &x, ALPHA));
        assert_eq!(DVector::from(vec![-1.0, 3.0]), reflect(&center, &x, GAMMA));
        assert_eq!(DVector::from(vec![1.5, 0.5]), reflect(&center, &x, RHO));
    }

    #[test]
    fn test_defaults() {
        let solver = NelderMead::new(start(1.0, 1.0)).unwrap();

        assert_eq!(1e-4, solver.ftol);
        assert_eq!(400, solver.max_iter);
        assert!(NelderMead::new(start(f64::NAN, 1.0)).is_err());
        assert!(solver.clone().ftol(-1.0).is_err());
        assert!(solver.max_iter(0).is_err());
    }

    #[test]
    fn test_minimize() {
        let solver = NelderMead::new(start(3.0, -2.0)).unwrap().ftol(1e-10).unwrap();
        let solution = solver
            .optimize_with_seed(
                |p: &Pars| (p["x"] - 1.0).powi(2) + (p["y"] - 0.5).powi(2),
                Mode::Minimize,
                0,
            )
            .unwrap();

        assert_approx_eq!(1.0, solution.pars["x"], 1e-3);
        assert_approx_eq!(0.5, solution.pars["y"], 1e-3);
        assert_eq!(TerminationReason::Converged, solution.report.reason);
    }

    #[test]
    fn test_maximize() {
        let solver = NelderMead::new(start(1.0, 1.0)).unwrap().ftol(1e-10).unwrap();
        let solution = solver
            .optimize_with_seed(
                |p: &Pars| -p["x"].powi(2) - p["y"].powi(2),
                Mode::Maximize,
                0,
            )
            .unwrap();

        assert_approx_eq!(0.0, solution.pars["x"], 1e-3);
        assert_approx_eq!(0.0, solution.pars["y"], 1e-3);
    }

    #[test]
    fn test_max_iter() {
        let solver = NelderMead::new(start(10.0, 10.0)).unwrap().max_iter(3).unwrap();
        let solution = solver
            .optimize_with_seed(|p: &Pars| p["x"].abs() + p["y"].abs(), Mode::Minimize, 0)
            .unwrap();

        assert_eq!(3, solution.report.iterations);
        assert_eq!(TerminationReason::MaxIterations, solution.report.reason);
    }

    #[test]
    fn test_budget() {
        let solver = NelderMead::suggest_from_seed(30, start(5.0, 5.0)).unwrap();
        let solution = solver
            .optimize_with_seed(
                |p: &Pars| (p["x"] - 1.0).powi(4) + (p["y"] - 1.0).powi(4),
                Mode::Minimize,
                0,
            )
            .unwrap();

        assert!(solution.function_evals <= 30);
    }

    #[test]
    fn test_restart() {
        let space = SearchSpace::new([("x", -5.0..=5.0), ("y", -5.0..=5.0), ("z", -5.0..=5.0)])
            .unwrap();
        let sphere =
            |p: &Pars| (p["x"] - 1.0).powi(2) + (p["y"] - 2.0).powi(2) + (p["z"] + 3.0).powi(2);

        // The small simplex around the center collapses early
        let uncapped = NelderMead::new(space.to_pars(&space.center())).unwrap();
        let solution = uncapped.minimize(sphere).unwrap();
        assert_eq!(TerminationReason::Converged, solution.report.reason);
        assert!(solution.value > 0.05);

        let capped = NelderMead::suggest_from_box(2000, &space).unwrap();
        let solution = capped.minimize(sphere).unwrap();
        assert!(solution.value < 1e-3);
        assert!(solution.function_evals <= 2000);
        assert_approx_eq!(1.0, solution.pars["x"], 0.05);
        assert_approx_eq!(2.0, solution.pars["y"], 0.05);
        assert_approx_eq!(-3.0, solution.pars["z"], 0.05);
    }
}
