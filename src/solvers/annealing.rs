//! Coupled simulated annealing (CSA) within box constraints.
//!
//! Based on Xavier-de-Souza et al., "Coupled Simulated Annealing", IEEE Transactions on Systems,
//! Man, and Cybernetics (2010).

use nalgebra::DVector;
use rand::distributions::Distribution;
use rand::Rng;
use rand_chacha::ChaCha12Rng;
use serde::{Deserialize, Serialize};
use statrs::distribution::Cauchy;
use tracing::debug;

use super::particle_swarm::split_budget;
use super::{check, Report, Solver, SolverError, TerminationReason};
use crate::evaluation::Evaluator;
use crate::SearchSpace;

fn default_t0() -> f64 {
    1.0
}

fn default_tacc0() -> f64 {
    0.9
}

/// Runs `num_processes` simulated annealing processes whose acceptance probabilities are coupled
/// through the costs of all current states.
///
/// Processes start uniformly within the box. Each later generation `k` (counting from zero), every
/// process proposes `y = x + T(k) * C` with `C` standard Cauchy per coordinate (moved back into the
/// box), where `T(k) = t0 / (k + 1)`. A better candidate is always accepted. Otherwise it is accepted
/// with probability `exp(-cost(y) / Tacc) / (exp(-cost(y) / Tacc) + gamma)`, where
/// `gamma = sum_i exp(-cost(x_i) / Tacc)`, `Tacc(0) = tacc0` and `Tacc(k) = tacc0 / ln(k + 1)`.
///
/// Uses `num_processes * num_generations` evaluations and returns the best evaluated state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Annealing {
    /// The number of coupled processes, evaluated together each generation
    pub num_processes: usize,
    /// The number of generations, including the initial one
    pub num_generations: usize,
    /// The initial generation temperature. Default value is `1.0`.
    #[serde(default = "default_t0")]
    pub t0: f64,
    /// The initial acceptance temperature. Default value is `0.9`.
    #[serde(default = "default_tacc0")]
    pub tacc0: f64,
    /// The box to search
    pub space: SearchSpace,
}

impl Annealing {
    pub fn new(
        num_processes: usize,
        num_generations: usize,
        space: SearchSpace,
    ) -> Result<Self, SolverError> {
        let solver = Self {
            num_processes,
            num_generations,
            t0: default_t0(),
            tacc0: default_tacc0(),
            space,
        };
        solver.validate()?;
        Ok(solver)
    }

    /// Changes the initial temperatures from the default values.
    pub fn temperatures(mut self, t0: f64, tacc0: f64) -> Result<Self, SolverError> {
        self.t0 = t0;
        self.tacc0 = tacc0;
        self.validate()?;
        Ok(self)
    }

    /// Splits the budget into processes and generations the same way as
    /// [`ParticleSwarm::suggest_from_box`][super::ParticleSwarm::suggest_from_box].
    pub fn suggest_from_box(num_evals: usize, space: &SearchSpace) -> Result<Self, SolverError> {
        check(num_evals > 0, "num_evals must be positive")?;
        let (num_processes, num_generations) = split_budget(num_evals);
        Self::new(num_processes, num_generations, space.clone())
    }

    pub(crate) fn validate(&self) -> Result<(), SolverError> {
        check(self.num_processes > 0, "num_processes must be positive")?;
        check(self.num_generations > 0, "num_generations must be positive")?;
        check(self.t0.is_finite() && self.t0 > 0.0, "t0 must be positive")?;
        check(
            self.tacc0.is_finite() && self.tacc0 > 0.0,
            "tacc0 must be positive",
        )?;
        self.space.validate()?;
        Ok(())
    }

    /// Generation temperature
    fn temperature(&self, k: usize) -> f64 {
        self.t0 / (k as f64 + 1.0)
    }

    /// Acceptance temperature
    fn acceptance_temperature(&self, k: usize) -> f64 {
        if k == 0 {
            self.tacc0
        } else {
            self.tacc0 / (k as f64 + 1.0).ln()
        }
    }
}

impl Solver for Annealing {
    fn name(&self) -> &'static str {
        "annealing"
    }

    fn names(&self) -> Vec<String> {
        self.space.names()
    }

    fn solve(&self, evaluator: &mut Evaluator, rng: &mut ChaCha12Rng) -> Result<Report, SolverError> {
        self.validate()?;

        let mode = evaluator.mode();
        let cauchy = Cauchy::new(0.0, 1.0).map_err(|e| SolverError::InvalidOptions(e.to_string()))?;

        let initial = (0..self.num_processes)
            .map(|_| self.space.sample_uniform(rng))
            .collect();
        // Current state and cost of each process
        let mut states = evaluator
            .evaluate(initial)?
            .into_iter()
            .map(|p| (p.point().clone(), mode.cost(p.value())))
            .collect::<Vec<_>>();

        for k in 0..self.num_generations - 1 {
            let temperature = self.temperature(k);
            let tacc = self.acceptance_temperature(k);

            let candidates = states
                .iter()
                .map(|(x, _)| {
                    let mut y = x + DVector::from_fn(x.len(), |_, _| {
                        temperature * cauchy.sample(&mut *rng)
                    });
                    self.space.clamp(&mut y);
                    y
                })
                .collect();
            let candidates = evaluator.evaluate(candidates)?;

            // All exponentials are scaled by exp(shift / tacc), which cancels in the acceptance
            // probability
            let candidate_costs = candidates.iter().map(|p| mode.cost(p.value()));
            let shift = states
                .iter()
                .map(|(_, cost)| *cost)
                .chain(candidate_costs)
                .fold(f64::INFINITY, f64::min);
            let shifted_exp = |cost: f64| (-(cost - shift) / tacc).exp();
            let gamma = states.iter().map(|(_, cost)| shifted_exp(*cost)).sum::<f64>();

            let mut accepted = 0;
            for (state, candidate) in states.iter_mut().zip(candidates) {
                let candidate_cost = mode.cost(candidate.value());
                let probability = if candidate_cost < state.1 {
                    1.0
                } else {
                    let exp_cost = shifted_exp(candidate_cost);
                    exp_cost / (exp_cost + gamma)
                };

                if rng.gen_range(0.0..=1.0) <= probability {
                    *state = (candidate.point().clone(), candidate_cost);
                    accepted += 1;
                }
            }

            debug!(
                generation = k + 1,
                temperature,
                tacc,
                accepted,
                "annealing generation"
            );
        }

        Ok(Report {
            solver: self.name(),
            iterations: self.num_generations,
            reason: TerminationReason::Completed,
        })
    }
}
