//! Convenience functions for easier use of the library.

use thiserror::Error;

use crate::options::{InvalidOptionsError, OptimizeOptions};
use crate::solvers::{Solution, SolverError, SolverKind};
use crate::{Mode, ObjectiveFunction, ParallelObjectiveFunction, SearchSpace};

/// Represents a failure of one of the convenience functions.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum OptimizeError {
    /// The options could not be turned into a solver.
    #[error(transparent)]
    InvalidOptions(#[from] InvalidOptionsError),
    /// The solver failed while running.
    #[error(transparent)]
    Solver(#[from] SolverError),
}

/// Minimizes the value of `f` within `space` using at most about `num_evals` evaluations, and
/// returns the best solution found.
///
/// Equivalent to [`OptimizeOptions`] with the default solver (particle swarm) and a random seed.
/// [`OptimizeOptions`] should be used instead if further configuration is desired.
///
/// # Examples
///
/// ```
/// use optunity::{Pars, SearchSpace};
///
/// let space = SearchSpace::new([("x", -5.0..=5.0), ("y", -5.0..=5.0)]).unwrap();
/// let solution = optunity::minimize(|p: &Pars| p["x"].powi(2) + p["y"].powi(2), 500, space)
///     .unwrap();
///
/// assert!(solution.value < 1.0);
/// ```
pub fn minimize<F: ObjectiveFunction>(
    f: F,
    num_evals: usize,
    space: SearchSpace,
) -> Result<Solution, OptimizeError> {
    optimize(f, num_evals, space, SolverKind::default(), Mode::Minimize)
}

/// Like [`minimize`], but executes the objective function in parallel using multiple threads.
///
/// Requires that `F` implements [`ParallelObjectiveFunction`][crate::ParallelObjectiveFunction].
pub fn minimize_parallel<F: ParallelObjectiveFunction>(
    f: F,
    num_evals: usize,
    space: SearchSpace,
) -> Result<Solution, OptimizeError> {
    optimize_parallel(f, num_evals, space, SolverKind::default(), Mode::Minimize)
}

/// Maximizes the value of `f` within `space` and returns the best solution found.
///
/// # Examples
///
/// ```
/// use optunity::{Pars, SearchSpace};
///
/// let space = SearchSpace::new([("x", -5.0..=5.0)]).unwrap();
/// let solution = optunity::maximize(|p: &Pars| 1.0 - (p["x"] - 2.0).abs(), 100, space).unwrap();
///
/// assert!(solution.value > 0.0);
/// ```
pub fn maximize<F: ObjectiveFunction>(
    f: F,
    num_evals: usize,
    space: SearchSpace,
) -> Result<Solution, OptimizeError> {
    optimize(f, num_evals, space, SolverKind::default(), Mode::Maximize)
}

/// Like [`maximize`], but executes the objective function in parallel using multiple threads.
pub fn maximize_parallel<F: ParallelObjectiveFunction>(
    f: F,
    num_evals: usize,
    space: SearchSpace,
) -> Result<Solution, OptimizeError> {
    optimize_parallel(f, num_evals, space, SolverKind::default(), Mode::Maximize)
}

/// Optimizes `f` with a solver of the given kind, configured from the budget.
///
/// # Examples
///
/// ```
/// use optunity::solvers::SolverKind;
/// use optunity::{Mode, Pars, SearchSpace};
///
/// let space = SearchSpace::new([("x", 0.0..=4.0)]).unwrap();
/// let solution = optunity::optimize(
///     |p: &Pars| (p["x"] - 1.0).powi(2),
///     5,
///     space,
///     SolverKind::GridSearch,
///     Mode::Minimize,
/// )
/// .unwrap();
///
/// assert_eq!(1.0, solution.pars["x"]);
/// ```
pub fn optimize<F: ObjectiveFunction>(
    f: F,
    num_evals: usize,
    space: SearchSpace,
    solver: SolverKind,
    mode: Mode,
) -> Result<Solution, OptimizeError> {
    let optimizer = OptimizeOptions::new(space)
        .solver(solver)
        .num_evals(num_evals)
        .mode(mode)
        .build()?;
    Ok(optimizer.run(f)?)
}

/// Like [`optimize`], but executes the objective function in parallel using multiple threads.
pub fn optimize_parallel<F: ParallelObjectiveFunction>(
    f: F,
    num_evals: usize,
    space: SearchSpace,
    solver: SolverKind,
    mode: Mode,
) -> Result<Solution, OptimizeError> {
    let optimizer = OptimizeOptions::new(space)
        .solver(solver)
        .num_evals(num_evals)
        .mode(mode)
        .build()?;
    Ok(optimizer.run_parallel(f)?)
}
