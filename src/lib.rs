//! Black-box optimization of functions of named, box-constrained parameters, as used for tuning
//! the hyperparameters of machine learning models.
//!
//! # Quick Start
//!
//! To optimize a function, describe the parameters with a [`SearchSpace`] and call [`minimize`]
//! or [`maximize`] with an evaluation budget. The default solver is particle swarm optimization.
//!
//! ```
//! use optunity::{Pars, SearchSpace};
//!
//! let space = SearchSpace::new([("x", -5.0..=5.0), ("y", -5.0..=5.0)]).unwrap();
//! let f = |p: &Pars| (p["x"] - 1.0).powi(2) + (p["y"] + 2.0).powi(2);
//!
//! let solution = optunity::minimize(f, 1000, space).unwrap();
//!
//! println!("best parameters: {:?}", solution.pars);
//! assert_eq!(1000, solution.function_evals);
//! ```
//!
//! [`OptimizeOptions`] chooses the solver, the mode and the seed, and the [`solvers`] module
//! gives full control over each solver's options. Every evaluation is recorded in the
//! [`CallLog`][evaluation::CallLog] of the returned [`Solution`], which can also be plotted (see
//! [`Plot`][plotting::Plot]). The [`score_functions`] module turns the predictions of a model into
//! an objective value.
//!
//! Runs are reproducible: all random numbers are drawn from a generator seeded with a `u64`, and
//! the `*_parallel` variants, which evaluate batches of points on the rayon thread pool, return
//! the same result as the sequential ones for the same seed.
//!
//! Progress is reported through [`tracing`](https://docs.rs/tracing) events.

// Solvers request batches of points from an `Evaluator` (`evaluation`), which names the
// coordinates, calls the objective function through a `Batch` (`objective_function`) and records
// the result.
//
// `solvers` contains the `Solver` trait and one module per solver; `solvers::registry` maps
// solver names to configurations.
//
// `options` and `functions` are the entry points that configure a solver from a budget.

pub mod evaluation;
mod functions;
mod mode;
pub mod objective_function;
pub mod options;
#[cfg(feature = "plotters")]
pub mod plotting;
pub mod score_functions;
pub mod search_space;
pub mod solvers;
mod utils;

pub use nalgebra::DVector;

pub use crate::functions::{
    maximize, maximize_parallel, minimize, minimize_parallel, optimize, optimize_parallel,
    OptimizeError,
};
pub use crate::mode::Mode;
pub use crate::objective_function::{ObjectiveFunction, ParallelObjectiveFunction};
pub use crate::options::{InvalidOptionsError, OptimizeOptions, Optimizer};
pub use crate::search_space::{InvalidSearchSpaceError, Pars, SearchSpace};
pub use crate::solvers::{Solution, Solver, SolverError, SolverKind};
