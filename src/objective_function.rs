//! Traits for types that can be used as an objective function, and the batch evaluators that call
//! them. See [`ObjectiveFunction`] and [`ParallelObjectiveFunction`] for full documentation.

use rayon::prelude::*;

use crate::Pars;

/// A trait for types that can be used as an objective function. Implemented automatically for
/// closures of the form `FnMut(&Pars) -> f64`.
///
/// Parameters are accessed by name:
///
/// ```
/// use optunity::{ObjectiveFunction, Pars};
///
/// let mut f = |p: &Pars| (p["x"] - 1.0).powi(2) + p["y"].powi(2);
///
/// let pars = [("x".to_string(), 1.0), ("y".to_string(), 2.0)].into_iter().collect();
/// assert_eq!(4.0, f.evaluate(&pars));
/// ```
///
/// Custom types can store state between evaluations:
///
/// ```
/// use optunity::{ObjectiveFunction, Pars};
///
/// struct Counted {
///     calls: usize,
/// }
///
/// impl ObjectiveFunction for Counted {
///     fn evaluate(&mut self, pars: &Pars) -> f64 {
///         self.calls += 1;
///         pars.values().map(|v| v.powi(2)).sum()
///     }
/// }
/// ```
pub trait ObjectiveFunction {
    /// Returns the objective function value at `pars`.
    fn evaluate(&mut self, pars: &Pars) -> f64;
}

impl<F: FnMut(&Pars) -> f64> ObjectiveFunction for F {
    fn evaluate(&mut self, pars: &Pars) -> f64 {
        (self)(pars)
    }
}

/// Like [`ObjectiveFunction`], but evaluated from multiple threads at once. Implemented
/// automatically for closures of the form `Fn(&Pars) -> f64 + Sync`.
///
/// Used by the `*_parallel` methods, which evaluate each batch of points requested by a solver
/// on the rayon thread pool.
pub trait ParallelObjectiveFunction: Sync {
    /// Returns the objective function value at `pars`.
    fn evaluate_parallel(&self, pars: &Pars) -> f64;
}

impl<F: Fn(&Pars) -> f64 + Sync> ParallelObjectiveFunction for F {
    fn evaluate_parallel(&self, pars: &Pars) -> f64 {
        (self)(pars)
    }
}

/// Evaluates a batch of points at once. Results are returned in the same order as `points`.
pub trait Batch {
    fn evaluate_batch(&mut self, points: &[Pars]) -> Vec<f64>;
}

/// Evaluates each point in order on the calling thread.
pub struct Sequential<F>(pub F);

impl<F: ObjectiveFunction> Batch for Sequential<F> {
    fn evaluate_batch(&mut self, points: &[Pars]) -> Vec<f64> {
        points.iter().map(|p| self.0.evaluate(p)).collect()
    }
}

/// Evaluates the points of a batch concurrently using rayon.
pub struct Parallel<F>(pub F);

impl<F: ParallelObjectiveFunction> Batch for Parallel<F> {
    fn evaluate_batch(&mut self, points: &[Pars]) -> Vec<f64> {
        let function = &self.0;
        points
            .par_iter()
            .map(|p| function.evaluate_parallel(p))
            .collect()
    }
}
