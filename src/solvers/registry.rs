//! Lookup of solvers by name, and solver configurations that can be suggested from an evaluation
//! budget or read from any serde format.
//!
//! ```
//! use optunity::solvers::{registry, SolverConfig, SolverKind};
//! use optunity::SearchSpace;
//!
//! assert!(registry::solver_names().contains(&"particle swarm"));
//!
//! let kind = "random search".parse::<SolverKind>().unwrap();
//! let space = SearchSpace::new([("x", 0.0..=1.0)]).unwrap();
//! let config = SolverConfig::suggest(kind, 50, &space).unwrap();
//!
//! assert_eq!(SolverKind::RandomSearch, config.kind());
//! ```

use rand_chacha::ChaCha12Rng;
use serde::{Deserialize, Serialize};

use std::fmt;
use std::str::FromStr;

use super::{
    Annealing, CmaEs, GridSearch, NelderMead, ParticleSwarm, RandomSearch, Report, Solver,
    SolverError,
};
use crate::evaluation::Evaluator;
use crate::SearchSpace;

/// The registered solvers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SolverKind {
    /// [`GridSearch`]
    #[serde(rename = "grid search")]
    GridSearch,
    /// [`RandomSearch`]
    #[serde(rename = "random search")]
    RandomSearch,
    /// [`NelderMead`]
    #[serde(rename = "nelder-mead")]
    NelderMead,
    /// [`ParticleSwarm`], the default
    #[serde(rename = "particle swarm")]
    ParticleSwarm,
    /// [`CmaEs`]
    #[serde(rename = "cma-es")]
    CmaEs,
    /// [`Annealing`] (coupled simulated annealing)
    #[serde(rename = "annealing")]
    Annealing,
}

/// Particle swarm optimization is the default solver.
impl Default for SolverKind {
    fn default() -> Self {
        Self::ParticleSwarm
    }
}

impl SolverKind {
    /// Returns every registered solver, in registration order.
    pub fn all() -> [SolverKind; 6] {
        [
            Self::GridSearch,
            Self::RandomSearch,
            Self::NelderMead,
            Self::ParticleSwarm,
            Self::CmaEs,
            Self::Annealing,
        ]
    }

    /// Returns the name the solver is registered under.
    pub fn name(&self) -> &'static str {
        match self {
            Self::GridSearch => "grid search",
            Self::RandomSearch => "random search",
            Self::NelderMead => "nelder-mead",
            Self::ParticleSwarm => "particle swarm",
            Self::CmaEs => "cma-es",
            Self::Annealing => "annealing",
        }
    }

    /// Returns a one-line description of the solver.
    pub fn description(&self) -> &'static str {
        match self {
            Self::GridSearch => "finds optimal parameter values on a predefined grid",
            Self::RandomSearch => "random parameter tuples sampled uniformly within box constraints",
            Self::NelderMead => "simplex method for unconstrained optimization",
            Self::ParticleSwarm => "particle swarm optimization",
            Self::CmaEs => "covariance matrix adaptation evolution strategy",
            Self::Annealing => "coupled simulated annealing",
        }
    }

    /// Returns a longer help text, one line per element.
    pub fn help(&self) -> &'static [&'static str] {
        match self {
            Self::GridSearch => &[
                "Evaluates every combination of the values on a predefined grid.",
                "",
                "Options:",
                "- grid :: the values to test for each parameter",
                "",
                "The number of evaluations is the product of the lengths of the value lists.",
                "When suggested from a budget, every parameter gets floor(num_evals^(1/d))",
                "equally spaced values that include both bounds.",
            ],
            Self::RandomSearch => &[
                "Evaluates points sampled uniformly within the box constraints.",
                "",
                "Options:",
                "- num_evals :: the number of points to sample",
                "- space :: box constraints [lb, ub] for each parameter",
                "",
                "Bergstra and Bengio, 2012. Random search for hyper-parameter optimization.",
                "Journal of Machine Learning Research 13, 281-305.",
            ],
            Self::NelderMead => &[
                "Minimizes the function with the Nelder-Mead simplex method.",
                "",
                "The function should be fairly well behaved (ideally convex).",
                "The search is not restricted to the box constraints.",
                "",
                "Options:",
                "- start :: the starting point",
                "- ftol :: tolerance on function values for convergence (default 1e-4)",
                "- max_iter :: maximum number of iterations (default 200 * d)",
            ],
            Self::ParticleSwarm => &[
                "Searches the box with a swarm of particles.",
                "",
                "1. Initialization: num_particles particles are placed uniformly in the box.",
                "2. Iteration: for num_generations generations, particles move based on their",
                "   speed and their attraction to their own best point and the swarm's best point.",
                "",
                "Options:",
                "- num_particles :: the number of particles in the swarm",
                "- num_generations :: the number of generations",
                "- max_speed :: maximum speed as a fraction of the box width (default 2 / num_generations)",
                "- space :: box constraints [lb, ub] for each parameter",
            ],
            Self::CmaEs => &[
                "Covariance matrix adaptation evolution strategy.",
                "",
                "Options:",
                "- start :: the initial mean of the search distribution",
                "- num_generations :: the maximum number of generations",
                "- sigma :: the initial step size (default 1)",
                "- lambda :: the population size (default 4 + floor(3 ln d))",
                "",
                "Hansen and Ostermeier, 2001. Completely derandomized self-adaptation in",
                "evolution strategies. Evolutionary Computation 9(2), 159-195.",
            ],
            Self::Annealing => &[
                "Coupled simulated annealing within the box constraints.",
                "",
                "Options:",
                "- num_processes :: the number of coupled annealing processes",
                "- num_generations :: the number of generations",
                "- t0 :: the initial generation temperature (default 1)",
                "- tacc0 :: the initial acceptance temperature (default 0.9)",
                "- space :: box constraints [lb, ub] for each parameter",
            ],
        }
    }
}

impl fmt::Display for SolverKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SolverKind {
    type Err = SolverError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        Self::all()
            .into_iter()
            .find(|kind| kind.name() == name)
            .ok_or_else(|| SolverError::UnknownSolver(name.to_string()))
    }
}

/// Returns the names of all registered solvers.
pub fn solver_names() -> Vec<&'static str> {
    SolverKind::all().iter().map(|kind| kind.name()).collect()
}

/// Returns the help text of the solver registered under `name`.
pub fn solver_help(name: &str) -> Result<&'static [&'static str], SolverError> {
    Ok(name.parse::<SolverKind>()?.help())
}

/// A configured solver of any kind.
///
/// Serialized with a `solver_name` tag, e.g.
/// `{"solver_name": "random search", "num_evals": 10, "space": {"x": {"start": 0.0, "end": 1.0}}}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "solver_name")]
pub enum SolverConfig {
    #[serde(rename = "grid search")]
    GridSearch(GridSearch),
    #[serde(rename = "random search")]
    RandomSearch(RandomSearch),
    #[serde(rename = "nelder-mead")]
    NelderMead(NelderMead),
    #[serde(rename = "particle swarm")]
    ParticleSwarm(ParticleSwarm),
    #[serde(rename = "cma-es")]
    CmaEs(CmaEs),
    #[serde(rename = "annealing")]
    Annealing(Annealing),
}

impl SolverConfig {
    /// Configures a solver of the given kind to use about `num_evals` evaluations within `space`.
    pub fn suggest(
        kind: SolverKind,
        num_evals: usize,
        space: &SearchSpace,
    ) -> Result<Self, SolverError> {
        if space.is_empty() {
            return Err(SolverError::EmptySearchSpace);
        }

        Ok(match kind {
            SolverKind::GridSearch => {
                Self::GridSearch(GridSearch::suggest_from_box(num_evals, space)?)
            }
            SolverKind::RandomSearch => {
                Self::RandomSearch(RandomSearch::suggest_from_box(num_evals, space)?)
            }
            SolverKind::NelderMead => {
                Self::NelderMead(NelderMead::suggest_from_box(num_evals, space)?)
            }
            SolverKind::ParticleSwarm => {
                Self::ParticleSwarm(ParticleSwarm::suggest_from_box(num_evals, space)?)
            }
            SolverKind::CmaEs => Self::CmaEs(CmaEs::suggest_from_box(num_evals, space)?),
            SolverKind::Annealing => {
                Self::Annealing(Annealing::suggest_from_box(num_evals, space)?)
            }
        })
    }

    /// Returns the kind of the configured solver.
    pub fn kind(&self) -> SolverKind {
        match self {
            Self::GridSearch(_) => SolverKind::GridSearch,
            Self::RandomSearch(_) => SolverKind::RandomSearch,
            Self::NelderMead(_) => SolverKind::NelderMead,
            Self::ParticleSwarm(_) => SolverKind::ParticleSwarm,
            Self::CmaEs(_) => SolverKind::CmaEs,
            Self::Annealing(_) => SolverKind::Annealing,
        }
    }

    /// Checks the options, e.g. after deserialization.
    pub fn validate(&self) -> Result<(), SolverError> {
        match self {
            Self::GridSearch(s) => s.validate(),
            Self::RandomSearch(s) => s.validate(),
            Self::NelderMead(s) => s.validate(),
            Self::ParticleSwarm(s) => s.validate(),
            Self::CmaEs(s) => s.validate(),
            Self::Annealing(s) => s.validate(),
        }
    }

    fn as_solver(&self) -> &dyn Solver {
        match self {
            Self::GridSearch(s) => s,
            Self::RandomSearch(s) => s,
            Self::NelderMead(s) => s,
            Self::ParticleSwarm(s) => s,
            Self::CmaEs(s) => s,
            Self::Annealing(s) => s,
        }
    }
}

impl Solver for SolverConfig {
    fn name(&self) -> &'static str {
        self.as_solver().name()
    }

    fn names(&self) -> Vec<String> {
        self.as_solver().names()
    }

    fn solve(&self, evaluator: &mut Evaluator, rng: &mut ChaCha12Rng) -> Result<Report, SolverError> {
        self.as_solver().solve(evaluator, rng)
    }
}

macro_rules! impl_from {
    ($($solver:ident),*) => {
        $(
            impl From<$solver> for SolverConfig {
                fn from(solver: $solver) -> Self {
                    Self::$solver(solver)
                }
            }
        )*
    };
}

impl_from!(GridSearch, RandomSearch, NelderMead, ParticleSwarm, CmaEs, Annealing);
