//! The solvers and the [`Solver`] trait they implement.
//!
//! A solver drives the search: it decides which points to evaluate and hands them to an
//! [`Evaluator`] in batches. The evaluator keeps track of the best point, so every solver returns
//! the best point it evaluated.
//!
//! Solvers can be used directly:
//!
//! ```
//! use optunity::solvers::{GridSearch, Solver};
//! use optunity::Pars;
//!
//! let solver = GridSearch::new([("x", vec![1.0, 2.0, 3.0]), ("y", vec![-1.0, 0.0, 1.0])]).unwrap();
//! let solution = solver.maximize(|p: &Pars| p["x"] * p["y"]).unwrap();
//!
//! assert_eq!(3.0, solution.pars["x"]);
//! assert_eq!(1.0, solution.pars["y"]);
//! ```
//!
//! or configured from an evaluation budget through the [`registry`].

mod annealing;
pub mod cma_es;
mod grid_search;
mod nelder_mead;
mod particle_swarm;
mod random_search;
pub mod registry;

pub use annealing::Annealing;
pub use cma_es::CmaEs;
pub use grid_search::GridSearch;
pub use nelder_mead::NelderMead;
pub use particle_swarm::ParticleSwarm;
pub use random_search::RandomSearch;
pub use registry::{SolverConfig, SolverKind};

use rand::SeedableRng;
use rand_chacha::ChaCha12Rng;
use thiserror::Error;
use tracing::{info, warn};

use std::fmt::{self, Debug};

use crate::evaluation::{CallLog, Evaluator, InvalidFunctionValueError};
use crate::objective_function::{Batch, Parallel, Sequential};
use crate::search_space::InvalidSearchSpaceError;
use crate::{Mode, ObjectiveFunction, ParallelObjectiveFunction, Pars};

/// Errors produced while configuring or running a solver.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum SolverError {
    /// A solver option has an invalid value.
    #[error("invalid solver options: {0}")]
    InvalidOptions(String),
    /// The solver needs at least one parameter to search over.
    #[error("the search space has no parameters")]
    EmptySearchSpace,
    /// The search space or a starting point is invalid.
    #[error(transparent)]
    InvalidSearchSpace(#[from] InvalidSearchSpaceError),
    /// The objective function returned NAN.
    #[error(transparent)]
    InvalidFunctionValue(#[from] InvalidFunctionValueError),
    /// No solver is registered under the given name.
    #[error("unknown solver `{0}`")]
    UnknownSolver(String),
    /// The solver finished without evaluating the objective function.
    #[error("the solver finished without evaluating the objective function")]
    NoEvaluations,
}

/// Represents the reason for a solver terminating.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TerminationReason {
    /// Every planned evaluation was made (the grid was exhausted, the number of samples or
    /// generations was reached).
    Completed,
    /// The maximum number of iterations was reached before convergence.
    MaxIterations,
    /// The spread of function values in the simplex fell below `ftol`.
    Converged,
    /// The range of recent best function values and of the current generation lie below
    /// `tol_fun`.
    TolFun,
    /// The standard deviation of the distribution is smaller than `tol_x` in every coordinate.
    TolX,
    /// The condition number of the covariance matrix exceeds `10^14` or is non-normal.
    ConditionCov,
    /// The covariance matrix is not positive definite.
    PosDefCov,
}

impl fmt::Display for TerminationReason {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        Debug::fmt(self, fmt)
    }
}

/// Auxiliary data returned by a solver along with the best point.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Report {
    /// The name of the solver (see [`SolverKind::name`]).
    pub solver: &'static str,
    /// The number of iterations/generations performed. Solvers that evaluate a single batch
    /// report one iteration.
    pub iterations: usize,
    /// Why the solver stopped.
    pub reason: TerminationReason,
}

/// The result of an optimization.
#[derive(Clone, Debug)]
pub struct Solution {
    /// The best parameter values found.
    pub pars: Pars,
    /// The objective function value at `pars`.
    pub value: f64,
    /// Whether `value` was minimized or maximized.
    pub mode: Mode,
    /// The number of times the objective function was evaluated.
    pub function_evals: usize,
    /// Solver metadata.
    pub report: Report,
    /// Every evaluation that was made, in order.
    pub call_log: CallLog,
}

/// A trait implemented by all solvers.
///
/// Only [`solve`][Self::solve] needs to be implemented; the `optimize`, `minimize` and `maximize`
/// methods (and their `*_parallel` variants) set up the evaluation and collect the result.
pub trait Solver {
    /// Returns the registered name of the solver, e.g. `"grid search"`.
    fn name(&self) -> &'static str;

    /// Returns the names of the parameters the solver searches over.
    fn names(&self) -> Vec<String>;

    /// Runs the solver, evaluating points through `evaluator`. `rng` must be used for all random
    /// numbers so that runs are reproducible from a seed.
    fn solve(&self, evaluator: &mut Evaluator, rng: &mut ChaCha12Rng) -> Result<Report, SolverError>;

    /// Optimizes `f` using a random seed.
    fn optimize<F: ObjectiveFunction>(&self, f: F, mode: Mode) -> Result<Solution, SolverError>
    where
        Self: Sized,
    {
        self.optimize_with_seed(f, mode, rand::random())
    }

    /// Optimizes `f` using the given seed.
    fn optimize_with_seed<F: ObjectiveFunction>(
        &self,
        f: F,
        mode: Mode,
        seed: u64,
    ) -> Result<Solution, SolverError>
    where
        Self: Sized,
    {
        run(self, Box::new(Sequential(f)), mode, seed)
    }

    /// Minimizes `f`.
    fn minimize<F: ObjectiveFunction>(&self, f: F) -> Result<Solution, SolverError>
    where
        Self: Sized,
    {
        self.optimize(f, Mode::Minimize)
    }

    /// Maximizes `f`.
    fn maximize<F: ObjectiveFunction>(&self, f: F) -> Result<Solution, SolverError>
    where
        Self: Sized,
    {
        self.optimize(f, Mode::Maximize)
    }

    /// Like [`optimize`][Self::optimize], but evaluates each batch of points in parallel.
    fn optimize_parallel<F: ParallelObjectiveFunction>(
        &self,
        f: F,
        mode: Mode,
    ) -> Result<Solution, SolverError>
    where
        Self: Sized,
    {
        self.optimize_parallel_with_seed(f, mode, rand::random())
    }

    /// Like [`optimize_with_seed`][Self::optimize_with_seed], but evaluates each batch of points
    /// in parallel. Produces the same result as the sequential version for the same seed.
    fn optimize_parallel_with_seed<F: ParallelObjectiveFunction>(
        &self,
        f: F,
        mode: Mode,
        seed: u64,
    ) -> Result<Solution, SolverError>
    where
        Self: Sized,
    {
        run(self, Box::new(Parallel(f)), mode, seed)
    }

    /// Like [`minimize`][Self::minimize], but evaluates each batch of points in parallel.
    fn minimize_parallel<F: ParallelObjectiveFunction>(&self, f: F) -> Result<Solution, SolverError>
    where
        Self: Sized,
    {
        self.optimize_parallel(f, Mode::Minimize)
    }

    /// Like [`maximize`][Self::maximize], but evaluates each batch of points in parallel.
    fn maximize_parallel<F: ParallelObjectiveFunction>(&self, f: F) -> Result<Solution, SolverError>
    where
        Self: Sized,
    {
        self.optimize_parallel(f, Mode::Maximize)
    }
}

/// Shared logic between the `optimize*` methods
pub(crate) fn run<'a, S: Solver + ?Sized>(
    solver: &S,
    batch: Box<dyn Batch + 'a>,
    mode: Mode,
    seed: u64,
) -> Result<Solution, SolverError> {
    let names = solver.names();
    if names.is_empty() {
        return Err(SolverError::EmptySearchSpace);
    }

    info!(solver = solver.name(), dim = names.len(), ?mode, seed, "starting solver");

    let mut rng = ChaCha12Rng::seed_from_u64(seed);
    let mut evaluator = Evaluator::new(batch, mode, names);
    let report = solver.solve(&mut evaluator, &mut rng)?;

    let best = evaluator.best().cloned().ok_or(SolverError::NoEvaluations)?;
    let function_evals = evaluator.function_evals();
    let pars = evaluator.to_pars(best.point());

    match report.reason {
        TerminationReason::PosDefCov | TerminationReason::ConditionCov => {
            warn!(solver = report.solver, reason = %report.reason, "solver terminated early")
        }
        _ => (),
    }
    info!(
        solver = report.solver,
        value = best.value(),
        function_evals,
        iterations = report.iterations,
        reason = %report.reason,
        "solver finished"
    );

    Ok(Solution {
        pars,
        value: best.value(),
        mode,
        function_evals,
        report,
        call_log: evaluator.into_call_log(),
    })
}

/// Returns `Err` with a description of the option if `condition` is false
pub(crate) fn check(condition: bool, description: &str) -> Result<(), SolverError> {
    if condition {
        Ok(())
    } else {
        Err(SolverError::InvalidOptions(description.to_string()))
    }
}
