//! General tests

use assert_approx_eq::assert_approx_eq;
use optunity::solvers::SolverKind;
use optunity::{Mode, OptimizeOptions, Pars, SearchSpace, Solution};

// Maximum distance of each parameter from the known optimum
const TOLERANCE: f64 = 0.2;
// Number of seeds to try for each randomized test
const TEST_REPETITIONS: u64 = 10;

fn quartic(p: &Pars) -> f64 {
    (p["x"] - 1.0).powi(2) + (p["y"] - 2.0).powi(2) + (p["z"] + 3.0).powi(4)
}

fn quartic_space() -> SearchSpace {
    SearchSpace::new([("x", -5.0..=5.0), ("y", -5.0..=5.0), ("z", -5.0..=5.0)]).unwrap()
}

// The minimum lies on the lower bound of `y`
fn cubic(p: &Pars) -> f64 {
    p["x"].powi(2) + (p["y"] - 1.0).powi(3) + (p["z"] - 2.0).powi(2)
}

fn cubic_space() -> SearchSpace {
    SearchSpace::new([("x", -2.0..=2.0), ("y", -2.0..=2.0), ("z", -3.0..=3.0)]).unwrap()
}

fn is_close(solution: &Solution, expected: &[(&str, f64)]) -> bool {
    expected
        .iter()
        .all(|(name, value)| (solution.pars[*name] - value).abs() <= TOLERANCE)
}

// Runs the options with several seeds and checks how often the optimum is missed
fn run_test(
    options: OptimizeOptions,
    f: fn(&Pars) -> f64,
    expected: &[(&str, f64)],
    max_failures: usize,
) {
    let mut failures = Vec::new();
    for seed in 0..TEST_REPETITIONS {
        let solution = options
            .clone()
            .seed(seed)
            .build()
            .unwrap()
            .run(f)
            .unwrap();

        if !is_close(&solution, expected) {
            failures.push((seed, solution.pars));
        }
    }

    println!("failures: {:?}", failures);
    assert!(
        failures.len() <= max_failures,
        "max failures exceeded: {:?}",
        failures,
    );
}

#[test]
fn test_grid_search_quartic() {
    let solution = optunity::optimize(
        quartic,
        10000,
        quartic_space(),
        SolverKind::GridSearch,
        Mode::Minimize,
    )
    .unwrap();

    assert_approx_eq!(1.0, solution.pars["x"], TOLERANCE);
    assert_approx_eq!(2.0, solution.pars["y"], TOLERANCE);
    assert_approx_eq!(-3.0, solution.pars["z"], TOLERANCE);
    // 21 values per parameter
    assert_eq!(9261, solution.function_evals);
}

#[test]
fn test_default_solver_cubic() {
    let solution = optunity::minimize(cubic, 10000, cubic_space()).unwrap();

    assert_eq!("particle swarm", solution.report.solver);
    assert_approx_eq!(0.0, solution.pars["x"], TOLERANCE);
    assert_approx_eq!(-2.0, solution.pars["y"], TOLERANCE);
    assert_approx_eq!(2.0, solution.pars["z"], TOLERANCE);
    assert_eq!(10000, solution.function_evals);
}

#[test]
fn test_default_solver_cubic_seeds() {
    run_test(
        OptimizeOptions::new(cubic_space()).num_evals(10000),
        cubic,
        &[("x", 0.0), ("y", -2.0), ("z", 2.0)],
        1,
    );
}

#[test]
fn test_annealing_cubic_seeds() {
    run_test(
        OptimizeOptions::new(cubic_space())
            .solver(SolverKind::Annealing)
            .num_evals(10000),
        cubic,
        &[("x", 0.0), ("y", -2.0), ("z", 2.0)],
        2,
    );
}

#[test]
fn test_local_solvers_sphere() {
    let sphere =
        |p: &Pars| (p["x"] - 1.0).powi(2) + (p["y"] - 2.0).powi(2) + (p["z"] + 3.0).powi(2);

    // Both start from the center of the box
    for kind in [SolverKind::NelderMead, SolverKind::CmaEs] {
        let solution = OptimizeOptions::new(quartic_space())
            .solver(kind)
            .num_evals(2000)
            .seed(0)
            .build()
            .unwrap()
            .run(sphere)
            .unwrap();

        assert!(
            is_close(&solution, &[("x", 1.0), ("y", 2.0), ("z", -3.0)]),
            "{} missed the optimum: {:?}",
            kind,
            solution.pars,
        );
    }
}

#[test]
fn test_maximize() {
    let negated = |p: &Pars| -cubic(p);
    let solution = OptimizeOptions::new(cubic_space())
        .num_evals(10000)
        .mode(Mode::Maximize)
        .seed(3)
        .build()
        .unwrap()
        .run(negated)
        .unwrap();

    assert!(is_close(&solution, &[("x", 0.0), ("y", -2.0), ("z", 2.0)]));
    assert_eq!(Mode::Maximize, solution.mode);
}
