//! Uniform random sampling within box constraints

use rand_chacha::ChaCha12Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{check, Report, Solver, SolverError, TerminationReason};
use crate::evaluation::Evaluator;
use crate::SearchSpace;

/// Evaluates `num_evals` points sampled uniformly within the box and returns the best one.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RandomSearch {
    /// The number of points to sample
    pub num_evals: usize,
    /// The box to sample from
    pub space: SearchSpace,
}

impl RandomSearch {
    pub fn new(num_evals: usize, space: SearchSpace) -> Result<Self, SolverError> {
        let solver = Self { num_evals, space };
        solver.validate()?;
        Ok(solver)
    }

    /// Uses the whole budget for sampling.
    pub fn suggest_from_box(num_evals: usize, space: &SearchSpace) -> Result<Self, SolverError> {
        Self::new(num_evals, space.clone())
    }

    pub(crate) fn validate(&self) -> Result<(), SolverError> {
        check(self.num_evals > 0, "num_evals must be positive")?;
        self.space.validate()?;
        Ok(())
    }
}

impl Solver for RandomSearch {
    fn name(&self) -> &'static str {
        "random search"
    }

    fn names(&self) -> Vec<String> {
        self.space.names()
    }

    fn solve(&self, evaluator: &mut Evaluator, rng: &mut ChaCha12Rng) -> Result<Report, SolverError> {
        self.validate()?;
        debug!(samples = self.num_evals, "sampling uniformly");

        let points = (0..self.num_evals)
            .map(|_| self.space.sample_uniform(rng))
            .collect();
        evaluator.evaluate(points)?;

        Ok(Report {
            solver: self.name(),
            iterations: 1,
            reason: TerminationReason::Completed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Mode, Pars};

    #[test]
    fn test_random_search() {
        let space = SearchSpace::new([("x", 0.0..=1.0), ("y", 5.0..=6.0)]).unwrap();
        let solver = RandomSearch::new(200, space.clone()).unwrap();
        let solution = solver
            .optimize_with_seed(|p: &Pars| p["x"] + p["y"], Mode::Minimize, 42)
            .unwrap();

        assert_eq!(200, solution.function_evals);
        assert!(solution
            .call_log
            .iter()
            .all(|(p, _)| space.contains(&space.from_pars(p).unwrap())));
        assert!(solution.value < 5.3);
    }

    #[test]
    fn test_invalid() {
        let space = SearchSpace::new([("x", 0.0..=1.0)]).unwrap();
        assert!(matches!(
            RandomSearch::new(0, space),
            Err(SolverError::InvalidOptions(_))
        ));
    }
}
