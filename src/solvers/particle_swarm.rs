//! Particle swarm optimization within box constraints

use nalgebra::DVector;
use rand::Rng;
use rand_chacha::ChaCha12Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{check, Report, Solver, SolverError, TerminationReason};
use crate::evaluation::Evaluator;
use crate::SearchSpace;

/// Searches the box with a swarm of particles.
///
/// Particles are initialized uniformly within the box with uniformly random speeds. Each
/// generation, every particle is evaluated (as a single batch) and its personal best and the
/// global best are updated. Then speeds are pulled towards both bests,
/// `v += U(0, phi1) * (personal_best - x) + U(0, phi2) * (global_best - x)`, limited to
/// `±max_speed * (ub - lb)` per coordinate, and the particles move by their speed. Particles that
/// leave the box are moved back onto its boundary.
///
/// This is the default solver.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ParticleSwarm {
    /// The number of particles, evaluated together each generation
    pub num_particles: usize,
    /// The number of generations
    pub num_generations: usize,
    /// The maximum speed of a particle as a fraction of the width of the box. Default value is
    /// `2 / num_generations`.
    pub max_speed: f64,
    /// Attraction towards the personal best. Default value is `2.0`.
    #[serde(default = "default_phi")]
    pub phi1: f64,
    /// Attraction towards the global best. Default value is `2.0`.
    #[serde(default = "default_phi")]
    pub phi2: f64,
    /// The box to search
    pub space: SearchSpace,
}

impl ParticleSwarm {
    pub fn new(
        num_particles: usize,
        num_generations: usize,
        space: SearchSpace,
    ) -> Result<Self, SolverError> {
        check(num_generations > 0, "num_generations must be positive")?;
        let solver = Self {
            num_particles,
            num_generations,
            max_speed: 2.0 / num_generations as f64,
            phi1: default_phi(),
            phi2: default_phi(),
            space,
        };
        solver.validate()?;
        Ok(solver)
    }

    /// Changes the maximum speed from the default value.
    pub fn max_speed(mut self, max_speed: f64) -> Result<Self, SolverError> {
        self.max_speed = max_speed;
        self.validate()?;
        Ok(self)
    }

    /// Splits the budget into particles and generations: 50 particles if `num_evals > 200`, 10
    /// particles if `num_evals > 10`, and a single generation otherwise.
    pub fn suggest_from_box(num_evals: usize, space: &SearchSpace) -> Result<Self, SolverError> {
        check(num_evals > 0, "num_evals must be positive")?;
        let (num_particles, num_generations) = split_budget(num_evals);
        Self::new(num_particles, num_generations, space.clone())
    }

    pub(crate) fn validate(&self) -> Result<(), SolverError> {
        check(self.num_particles > 0, "num_particles must be positive")?;
        check(self.num_generations > 0, "num_generations must be positive")?;
        check(
            self.max_speed.is_finite() && self.max_speed > 0.0,
            "max_speed must be positive",
        )?;
        check(
            self.phi1.is_finite() && self.phi1 >= 0.0 && self.phi2.is_finite() && self.phi2 >= 0.0,
            "phi1 and phi2 must be finite and non-negative",
        )?;
        self.space.validate()?;
        // Initial speeds are drawn from `±max_speed * (ub - lb)`
        check(
            self.space
                .widths()
                .iter()
                .all(|w| (2.0 * w * self.max_speed).is_finite()),
            "max_speed is too large for the search space",
        )?;
        Ok(())
    }
}

fn default_phi() -> f64 {
    2.0
}

/// Returns `(num_particles, num_generations)` for a budget of `num_evals` evaluations
pub(crate) fn split_budget(num_evals: usize) -> (usize, usize) {
    if num_evals > 200 {
        (50, ceil_div(num_evals, 50))
    } else if num_evals > 10 {
        (10, ceil_div(num_evals, 10))
    } else {
        (num_evals, 1)
    }
}

fn ceil_div(a: usize, b: usize) -> usize {
    (a + b - 1) / b
}

struct Particle {
    position: DVector<f64>,
    speed: DVector<f64>,
    best: DVector<f64>,
    best_cost: f64,
}

impl Solver for ParticleSwarm {
    fn name(&self) -> &'static str {
        "particle swarm"
    }

    fn names(&self) -> Vec<String> {
        self.space.names()
    }

    fn solve(&self, evaluator: &mut Evaluator, rng: &mut ChaCha12Rng) -> Result<Report, SolverError> {
        self.validate()?;

        let mode = evaluator.mode();
        let max_speed = self.space.widths() * self.max_speed;

        let mut particles = (0..self.num_particles)
            .map(|_| {
                let position = self.space.sample_uniform(rng);
                let speed = max_speed.map(|s| if s > 0.0 { rng.gen_range(-s..=s) } else { 0.0 });
                Particle {
                    best: position.clone(),
                    position,
                    speed,
                    best_cost: f64::INFINITY,
                }
            })
            .collect::<Vec<_>>();
        let mut global_best: Option<(DVector<f64>, f64)> = None;

        for generation in 0..self.num_generations {
            let positions = particles.iter().map(|p| p.position.clone()).collect();
            let evaluated = evaluator.evaluate(positions)?;

            for (particle, point) in particles.iter_mut().zip(&evaluated) {
                let cost = mode.cost(point.value());
                if cost < particle.best_cost {
                    particle.best = point.point().clone();
                    particle.best_cost = cost;
                }
                if global_best.as_ref().map_or(true, |(_, best)| cost < *best) {
                    global_best = Some((point.point().clone(), cost));
                }
            }

            let (best, best_cost) = match &global_best {
                Some(best) => best,
                None => return Err(SolverError::NoEvaluations),
            };
            debug!(generation, best = mode.cost(*best_cost), "particle swarm generation");

            for particle in &mut particles {
                let dim = particle.position.len();
                let u1 = DVector::from_fn(dim, |_, _| rng.gen_range(0.0..=self.phi1));
                let u2 = DVector::from_fn(dim, |_, _| rng.gen_range(0.0..=self.phi2));

                particle.speed += u1.component_mul(&(&particle.best - &particle.position))
                    + u2.component_mul(&(best - &particle.position));
                for (s, max) in particle.speed.iter_mut().zip(max_speed.iter()) {
                    *s = s.max(-*max).min(*max);
                }
                particle.position += &particle.speed;
                self.space.clamp(&mut particle.position);
            }
        }

        Ok(Report {
            solver: self.name(),
            iterations: self.num_generations,
            reason: TerminationReason::Completed,
        })
    }
}

#[cfg(test)]
mod tests {
    use assert_approx_eq::assert_approx_eq;

    use super::*;
    use crate::{Mode, Pars};

    #[test]
    fn test_split_budget() {
        assert_eq!((50, 200), split_budget(10000));
        assert_eq!((50, 5), split_budget(201));
        assert_eq!((10, 20), split_budget(200));
        assert_eq!((10, 2), split_budget(11));
        assert_eq!((10, 1), split_budget(10));
        assert_eq!((1, 1), split_budget(1));
    }

    #[test]
    fn test_defaults() {
        let space = SearchSpace::new([("x", 0.0..=1.0)]).unwrap();
        let solver = ParticleSwarm::new(10, 4, space.clone()).unwrap();

        assert_eq!(0.5, solver.max_speed);
        assert_eq!(2.0, solver.phi1);
        assert_eq!(2.0, solver.phi2);
        assert!(ParticleSwarm::new(0, 4, space.clone()).is_err());
        assert!(ParticleSwarm::new(10, 0, space).is_err());
        assert!(solver.max_speed(-1.0).is_err());
    }

    #[test]
    fn test_invalid_attraction() {
        let space = SearchSpace::new([("x", 0.0..=1.0)]).unwrap();

        for (phi1, phi2) in [(f64::INFINITY, 2.0), (2.0, f64::NAN), (-1.0, 2.0)] {
            let mut solver = ParticleSwarm::new(5, 3, space.clone()).unwrap();
            solver.phi1 = phi1;
            solver.phi2 = phi2;

            assert!(solver.validate().is_err());
            assert!(matches!(
                solver.minimize(|p: &Pars| p["x"]),
                Err(SolverError::InvalidOptions(_)),
            ));
        }

        let wide = SearchSpace::new([("x", -1e307..=1e307)]).unwrap();
        let solver = ParticleSwarm::new(5, 3, wide).unwrap();
        assert!(solver.max_speed(1e10).is_err());
    }

    #[test]
    fn test_minimize() {
        let space = SearchSpace::new([("x", -5.0..=5.0), ("y", -5.0..=5.0)]).unwrap();
        let solver = ParticleSwarm::suggest_from_box(2000, &space).unwrap();
        let solution = solver
            .optimize_with_seed(
                |p: &Pars| (p["x"] - 1.0).powi(2) + (p["y"] + 2.0).powi(2),
                Mode::Minimize,
                1,
            )
            .unwrap();

        assert_eq!(2000, solution.function_evals);
        assert_eq!(40, solution.report.iterations);
        assert_approx_eq!(1.0, solution.pars["x"], 0.2);
        assert_approx_eq!(-2.0, solution.pars["y"], 0.2);
    }

    #[test]
    fn test_stays_in_box() {
        let space = SearchSpace::new([("x", -1.0..=1.0), ("y", 0.0..=2.0)]).unwrap();
        let solver = ParticleSwarm::new(10, 30, space.clone())
            .unwrap()
            .max_speed(0.5)
            .unwrap();
        // The unconstrained optimum lies outside the box
        let solution = solver
            .optimize_with_seed(|p: &Pars| p["x"] + p["y"], Mode::Minimize, 7)
            .unwrap();

        assert!(solution
            .call_log
            .iter()
            .all(|(p, _)| space.contains(&space.from_pars(p).unwrap())));
        assert_approx_eq!(-1.0, solution.pars["x"], 0.2);
        assert_approx_eq!(0.0, solution.pars["y"], 0.2);
    }
}
