//! Types related to configuring an optimization run. See [`OptimizeOptions`] for full
//! documentation.

use thiserror::Error;
use tracing::debug;

use crate::solvers::{Solution, Solver, SolverConfig, SolverError, SolverKind};
use crate::{Mode, ObjectiveFunction, ParallelObjectiveFunction, SearchSpace};

/// The number of evaluations used if none is chosen.
pub const DEFAULT_NUM_EVALS: usize = 100;

/// A builder for [`Optimizer`]. Used to choose the solver, the evaluation budget and the
/// optimization mode.
///
/// By default, a solver of kind [`SolverKind::ParticleSwarm`] is configured from the search
/// space and a budget of [`DEFAULT_NUM_EVALS`] evaluations, and the function is minimized.
///
/// # Examples
///
/// ```
/// use optunity::solvers::SolverKind;
/// use optunity::{Mode, OptimizeOptions, Pars, SearchSpace};
///
/// let space = SearchSpace::new([("x", -2.0..=2.0), ("y", -2.0..=2.0)]).unwrap();
/// let solution = OptimizeOptions::new(space)
///     .solver(SolverKind::RandomSearch)
///     .num_evals(500)
///     .mode(Mode::Maximize)
///     .seed(7)
///     .build()
///     .unwrap()
///     .run(|p: &Pars| -p["x"].powi(2) - p["y"].powi(2))
///     .unwrap();
///
/// assert_eq!(500, solution.function_evals);
/// assert!(solution.value > -0.1);
/// ```
#[derive(Clone, Debug)]
pub struct OptimizeOptions {
    /// The box constraints of the parameters.
    pub space: SearchSpace,
    /// The kind of solver to configure from the budget. Default value is
    /// [`SolverKind::ParticleSwarm`].
    pub solver: SolverKind,
    /// A fully configured solver. If set, it is used instead of configuring one from `solver`
    /// and `num_evals`.
    pub solver_config: Option<SolverConfig>,
    /// The evaluation budget used to configure the solver. Default value is
    /// [`DEFAULT_NUM_EVALS`].
    pub num_evals: usize,
    /// Whether to minimize or maximize the function. Default value is [`Mode::Minimize`].
    pub mode: Mode,
    /// The seed of the random number generator. A random seed is chosen if this field is `None`.
    pub seed: Option<u64>,
}

impl OptimizeOptions {
    /// Creates a new `OptimizeOptions` with default values. Set individual options using the
    /// provided methods.
    pub fn new(space: SearchSpace) -> Self {
        Self {
            space,
            solver: SolverKind::default(),
            solver_config: None,
            num_evals: DEFAULT_NUM_EVALS,
            mode: Mode::default(),
            seed: None,
        }
    }

    /// Changes the kind of solver from the default of [`SolverKind::ParticleSwarm`].
    pub fn solver(mut self, solver: SolverKind) -> Self {
        self.solver = solver;
        self
    }

    /// Uses a fully configured solver instead of configuring one from the budget. Its parameter
    /// names must match the search space.
    pub fn solver_config<C: Into<SolverConfig>>(mut self, config: C) -> Self {
        self.solver_config = Some(config.into());
        self
    }

    /// Changes the evaluation budget from the default value.
    pub fn num_evals(mut self, num_evals: usize) -> Self {
        self.num_evals = num_evals;
        self
    }

    /// Changes the optimization mode from the default of [`Mode::Minimize`].
    pub fn mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    /// Sets the seed of the random number generator, making the run reproducible.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Attempts to build the [`Optimizer`] using the chosen options.
    pub fn build(self) -> Result<Optimizer, InvalidOptionsError> {
        if self.space.is_empty() {
            return Err(InvalidOptionsError::EmptySearchSpace);
        }
        self.space.validate().map_err(SolverError::from)?;

        let config = match self.solver_config {
            Some(config) => {
                config.validate()?;
                if config.names() != self.space.names() {
                    return Err(InvalidOptionsError::NameMismatch);
                }
                config
            }
            None => {
                if self.num_evals == 0 {
                    return Err(InvalidOptionsError::ZeroEvaluations);
                }
                SolverConfig::suggest(self.solver, self.num_evals, &self.space)?
            }
        };

        let seed = self.seed.unwrap_or_else(rand::random);
        debug!(solver = config.name(), seed, "configured solver");

        Ok(Optimizer {
            config,
            mode: self.mode,
            seed,
        })
    }
}

/// Represents invalid [`OptimizeOptions`].
#[derive(Clone, Debug, PartialEq, Error)]
pub enum InvalidOptionsError {
    /// The evaluation budget is zero.
    #[error("the number of evaluations must be positive")]
    ZeroEvaluations,
    /// The search space has no parameters.
    #[error("the search space has no parameters")]
    EmptySearchSpace,
    /// The parameters of the solver configuration differ from those of the search space.
    #[error("the solver configuration does not search over the parameters of the search space")]
    NameMismatch,
    /// The solver could not be configured.
    #[error(transparent)]
    Solver(#[from] SolverError),
}

/// A configured solver, ready to optimize a function. Use [`OptimizeOptions`] to create an
/// `Optimizer`.
#[derive(Clone, Debug)]
pub struct Optimizer {
    config: SolverConfig,
    mode: Mode,
    seed: u64,
}

impl Optimizer {
    /// Optimizes `f`, evaluating it on the current thread.
    pub fn run<F: ObjectiveFunction>(&self, f: F) -> Result<Solution, SolverError> {
        self.config.optimize_with_seed(f, self.mode, self.seed)
    }

    /// Like [`run`][Self::run], but evaluates each batch of points in parallel. Returns the same
    /// solution as `run`.
    pub fn run_parallel<F: ParallelObjectiveFunction>(
        &self,
        f: F,
    ) -> Result<Solution, SolverError> {
        self.config.optimize_parallel_with_seed(f, self.mode, self.seed)
    }

    /// Returns the configured solver.
    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Returns whether the function is minimized or maximized.
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Returns the seed of every run, drawn at random if none was given.
    pub fn seed(&self) -> u64 {
        self.seed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solvers::{GridSearch, NelderMead};
    use crate::Pars;

    fn space() -> SearchSpace {
        SearchSpace::new([("x", -1.0..=1.0)]).unwrap()
    }

    #[test]
    fn test_defaults() {
        let optimizer = OptimizeOptions::new(space()).seed(1).build().unwrap();

        assert_eq!(SolverKind::ParticleSwarm, optimizer.config().kind());
        assert_eq!(Mode::Minimize, optimizer.mode());
        assert_eq!(1, optimizer.seed());
    }

    #[test]
    fn test_invalid_options() {
        assert_eq!(
            Some(InvalidOptionsError::EmptySearchSpace),
            OptimizeOptions::new(SearchSpace::default()).build().err(),
        );
        assert_eq!(
            Some(InvalidOptionsError::ZeroEvaluations),
            OptimizeOptions::new(space()).num_evals(0).build().err(),
        );

        let other = GridSearch::new([("y", vec![0.0])]).unwrap();
        assert_eq!(
            Some(InvalidOptionsError::NameMismatch),
            OptimizeOptions::new(space()).solver_config(other).build().err(),
        );

        let mut invalid = NelderMead::new([("x".to_string(), 0.0)].into_iter().collect()).unwrap();
        invalid.ftol = -1.0;
        assert!(matches!(
            OptimizeOptions::new(space()).solver_config(invalid).build(),
            Err(InvalidOptionsError::Solver(SolverError::InvalidOptions(_))),
        ));
    }

    #[test]
    fn test_solver_config() {
        let grid = GridSearch::new([("x", vec![-1.0, 0.25, 1.0])]).unwrap();
        let solution = OptimizeOptions::new(space())
            .solver_config(grid)
            .build()
            .unwrap()
            .run(|p: &Pars| p["x"].powi(2))
            .unwrap();

        assert_eq!(0.25, solution.pars["x"]);
        assert_eq!(3, solution.function_evals);
        assert_eq!("grid search", solution.report.solver);
    }

    #[test]
    fn test_run_parallel() {
        let optimizer = OptimizeOptions::new(space())
            .num_evals(60)
            .seed(5)
            .build()
            .unwrap();
        let function = |p: &Pars| (p["x"] - 0.3).abs();

        let sequential = optimizer.run(function).unwrap();
        let parallel = optimizer.run_parallel(function).unwrap();

        assert_eq!(sequential.pars, parallel.pars);
        assert_eq!(sequential.call_log, parallel.call_log);
    }
}
