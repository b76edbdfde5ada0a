//! Exhaustive evaluation of a grid of parameter values

use nalgebra::DVector;
use rand_chacha::ChaCha12Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use std::collections::BTreeMap;

use super::{check, Report, Solver, SolverError, TerminationReason};
use crate::evaluation::Evaluator;
use crate::SearchSpace;

/// The number of grid points evaluated per batch
const BATCH_SIZE: usize = 1024;

/// Evaluates every combination of the given parameter values and returns the best one.
///
/// The number of evaluations is the product of the lengths of the value lists.
///
/// # Examples
///
/// ```
/// use optunity::solvers::{GridSearch, Solver};
/// use optunity::{Pars, SearchSpace};
///
/// let space = SearchSpace::new([("x", -1.0..=1.0), ("y", 0.0..=4.0)]).unwrap();
/// let solver = GridSearch::suggest_from_box(25, &space).unwrap();
///
/// assert_eq!(Some(25), solver.num_evals());
/// assert_eq!(&[0.0, 1.0, 2.0, 3.0, 4.0], solver.values("y").unwrap());
///
/// let solution = solver.minimize(|p: &Pars| p["x"].powi(2) + (p["y"] - 3.0).powi(2)).unwrap();
/// assert_eq!(0.0, solution.value);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GridSearch {
    /// The values to evaluate for each parameter
    grid: BTreeMap<String, Vec<f64>>,
}

impl GridSearch {
    /// Creates a `GridSearch` from `(name, values)` pairs.
    pub fn new<S, V, I>(grid: I) -> Result<Self, SolverError>
    where
        S: Into<String>,
        V: Into<Vec<f64>>,
        I: IntoIterator<Item = (S, V)>,
    {
        let mut map = BTreeMap::new();
        for (name, values) in grid {
            let name = name.into();
            check(
                !map.contains_key(&name),
                &format!("grid parameter `{}` is defined more than once", name),
            )?;
            map.insert(name, values.into());
        }

        let solver = Self { grid: map };
        solver.validate()?;
        Ok(solver)
    }

    /// Creates a grid with `floor(num_evals^(1/d))` equally spaced values per parameter, including
    /// both bounds. A single value per parameter is placed at the center of its range.
    pub fn suggest_from_box(num_evals: usize, space: &SearchSpace) -> Result<Self, SolverError> {
        check(num_evals > 0, "num_evals must be positive")?;
        space.validate()?;

        let points_per_dim = points_per_dim(num_evals, space.dim());
        let grid = space
            .iter()
            .map(|(name, range)| (name, linspace(*range.start(), *range.end(), points_per_dim)))
            .collect::<Vec<_>>();

        Self::new(grid)
    }

    /// Returns the values evaluated for a parameter.
    pub fn values(&self, name: &str) -> Option<&[f64]> {
        self.grid.get(name).map(|v| v.as_slice())
    }

    /// Returns the number of points in the grid, or `None` if it does not fit in a `usize`.
    pub fn num_evals(&self) -> Option<usize> {
        self.grid
            .values()
            .try_fold(1usize, |acc, values| acc.checked_mul(values.len()))
    }

    pub(crate) fn validate(&self) -> Result<(), SolverError> {
        for (name, values) in &self.grid {
            check(
                !values.is_empty(),
                &format!("grid parameter `{}` has no values", name),
            )?;
            check(
                values.iter().all(|v| v.is_finite()),
                &format!("grid parameter `{}` has a non-finite value", name),
            )?;
        }
        check(self.num_evals().is_some(), "the grid has too many points")?;
        Ok(())
    }
}

impl Solver for GridSearch {
    fn name(&self) -> &'static str {
        "grid search"
    }

    fn names(&self) -> Vec<String> {
        self.grid.keys().cloned().collect()
    }

    fn solve(&self, evaluator: &mut Evaluator, _: &mut ChaCha12Rng) -> Result<Report, SolverError> {
        self.validate()?;

        let axes = self.grid.values().collect::<Vec<_>>();
        let total = self
            .num_evals()
            .ok_or_else(|| SolverError::InvalidOptions("the grid has too many points".into()))?;
        debug!(points = total, "evaluating grid");

        let mut indices = vec![0; axes.len()];
        let mut remaining = total;
        while remaining > 0 {
            let batch_size = remaining.min(BATCH_SIZE);
            let mut batch = Vec::with_capacity(batch_size);
            for _ in 0..batch_size {
                batch.push(DVector::from_iterator(
                    axes.len(),
                    axes.iter().zip(&indices).map(|(axis, &i)| axis[i]),
                ));
                advance(&mut indices, &axes);
            }
            evaluator.evaluate(batch)?;
            remaining -= batch_size;
        }

        Ok(Report {
            solver: self.name(),
            iterations: 1,
            reason: TerminationReason::Completed,
        })
    }
}

/// Moves to the next grid point, with the last parameter varying fastest
fn advance(indices: &mut [usize], axes: &[&Vec<f64>]) {
    for (i, axis) in indices.iter_mut().zip(axes).rev() {
        *i += 1;
        if *i < axis.len() {
            return;
        }
        *i = 0;
    }
}

/// Returns the largest `k >= 1` such that `k^dim <= num_evals`
fn points_per_dim(num_evals: usize, dim: usize) -> usize {
    if dim == 0 {
        return 1;
    }

    let mut k = ((num_evals as f64).powf(1.0 / dim as f64).floor() as usize).max(1);
    // Correct for rounding in `powf`
    while k > 1 && checked_pow(k, dim).map_or(true, |n| n > num_evals) {
        k -= 1;
    }
    while checked_pow(k + 1, dim).map_or(false, |n| n <= num_evals) {
        k += 1;
    }
    k
}

fn checked_pow(base: usize, exp: usize) -> Option<usize> {
    (0..exp).try_fold(1usize, |acc, _| acc.checked_mul(base))
}

/// Returns `n` equally spaced values from `lb` to `ub` (inclusive), or the midpoint if `n == 1`
fn linspace(lb: f64, ub: f64, n: usize) -> Vec<f64> {
    if n == 1 {
        return vec![(lb + ub) / 2.0];
    }
    (0..n)
        .map(|i| lb + (ub - lb) * i as f64 / (n - 1) as f64)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Mode, Pars};

    #[test]
    fn test_points_per_dim() {
        assert_eq!(21, points_per_dim(10000, 3));
        assert_eq!(10, points_per_dim(1000, 3));
        assert_eq!(100, points_per_dim(10000, 2));
        assert_eq!(10000, points_per_dim(10000, 1));
        assert_eq!(1, points_per_dim(5, 4));
        assert_eq!(1, points_per_dim(1, 10));
    }

    #[test]
    fn test_linspace() {
        assert_eq!(vec![0.0], linspace(-1.0, 1.0, 1));
        assert_eq!(vec![-1.0, 0.0, 1.0], linspace(-1.0, 1.0, 3));
        assert_eq!(vec![2.0, 2.0], linspace(2.0, 2.0, 2));
    }

    #[test]
    fn test_new() {
        assert!(GridSearch::new([("x", vec![1.0])]).is_ok());
        assert!(matches!(
            GridSearch::new([("x", Vec::<f64>::new())]),
            Err(SolverError::InvalidOptions(_))
        ));
        assert!(matches!(
            GridSearch::new([("x", vec![f64::NAN])]),
            Err(SolverError::InvalidOptions(_))
        ));
        assert!(matches!(
            GridSearch::new([("x", vec![1.0]), ("x", vec![2.0])]),
            Err(SolverError::InvalidOptions(_))
        ));

        // 100000^4 points overflow a `usize`
        let axis = linspace(0.0, 1.0, 100_000);
        let huge = ["a", "b", "c", "d"].map(|name| (name, axis.clone()));
        assert_eq!(
            Err(SolverError::InvalidOptions("the grid has too many points".into())),
            GridSearch::new(huge),
        );
        let mut deserialized = GridSearch::new([("a", axis.clone()), ("b", axis.clone())]).unwrap();
        assert_eq!(Some(10_000_000_000), deserialized.num_evals());
        deserialized.grid.insert("c".into(), axis.clone());
        deserialized.grid.insert("d".into(), axis);
        assert_eq!(None, deserialized.num_evals());
        assert!(deserialized.minimize(|_: &Pars| 0.0).is_err());
    }

    #[test]
    fn test_order() {
        let solver = GridSearch::new([("b", vec![1.0, 2.0]), ("a", vec![10.0, 20.0, 30.0])])
            .unwrap();
        let solution = solver
            .optimize_with_seed(|p: &Pars| p["a"] + p["b"], Mode::Minimize, 0)
            .unwrap();

        let visited = solution
            .call_log
            .iter()
            .map(|(p, _)| (p["a"], p["b"]))
            .collect::<Vec<_>>();
        assert_eq!(
            vec![
                (10.0, 1.0),
                (10.0, 2.0),
                (20.0, 1.0),
                (20.0, 2.0),
                (30.0, 1.0),
                (30.0, 2.0),
            ],
            visited,
        );
        assert_eq!(11.0, solution.value);
    }

    #[test]
    fn test_suggest_from_box() {
        let space = SearchSpace::new([("x", -5.0..=5.0), ("y", -5.0..=5.0), ("z", -5.0..=5.0)])
            .unwrap();
        let solver = GridSearch::suggest_from_box(10000, &space).unwrap();

        assert_eq!(Some(9261), solver.num_evals());
        for name in ["x", "y", "z"] {
            let values = solver.values(name).unwrap();
            assert_eq!(21, values.len());
            assert_eq!(-5.0, values[0]);
            assert_eq!(5.0, values[20]);
        }

        assert!(GridSearch::suggest_from_box(0, &space).is_err());
    }

    #[test]
    fn test_large_grid_batches() {
        let solver = GridSearch::new([("x", (0..3000).map(|i| i as f64).collect::<Vec<_>>())])
            .unwrap();
        let solution = solver
            .optimize_with_seed(|p: &Pars| (p["x"] - 2500.0).abs(), Mode::Minimize, 0)
            .unwrap();

        assert_eq!(3000, solution.function_evals);
        assert_eq!(2500.0, solution.pars["x"]);
    }
}
