//! Early termination criteria of CMA-ES

use std::collections::VecDeque;

use super::parameters::Parameters;
use super::state::State;
use crate::solvers::TerminationReason;
use crate::utils;

/// The number of past generations considered by the TolFun criterion
pub(super) fn tol_fun_history_len(dim: usize, lambda: usize) -> usize {
    10 + (30.0 * dim as f64 / lambda as f64).ceil() as usize
}

/// Checks the state, the history of best costs (most recent first) and the costs of the current
/// generation, and returns the first criterion that is met
pub(super) fn check_termination_criteria(
    parameters: &Parameters,
    state: &State,
    best_cost_history: &VecDeque<f64>,
    costs: &[f64],
) -> Option<TerminationReason> {
    let dim = parameters.dim();
    let sigma = state.sigma();
    let cov = state.cov().cov();

    // The range of recent best costs and of the current generation are both tiny
    let history_len = tol_fun_history_len(dim, parameters.lambda());
    if best_cost_history.len() >= history_len {
        let range_history = utils::range(best_cost_history.iter().take(history_len).cloned());
        let range_current = utils::range(costs.iter().cloned());

        if let (Some(range_history), Some(range_current)) = (range_history, range_current) {
            if range_history < parameters.tol_fun() && range_current < parameters.tol_fun() {
                return Some(TerminationReason::TolFun);
            }
        }
    }

    let tol_x = parameters.tol_x();
    if (0..dim).all(|i| (sigma * cov[(i, i)]).abs() < tol_x)
        && state.path_c().iter().all(|x| (sigma * *x).abs() < tol_x)
    {
        return Some(TerminationReason::TolX);
    }

    let condition = state.cov().axis_ratio().powi(2);
    if !condition.is_normal() || condition > 1e14 {
        return Some(TerminationReason::ConditionCov);
    }

    None
}

#[cfg(test)]
mod tests {
    use nalgebra::DVector;

    use super::*;
    use crate::solvers::cma_es::Weights;

    const DIM: usize = 2;
    const LAMBDA: usize = 6;

    fn parameters() -> Parameters {
        Parameters::new(DIM, LAMBDA, Weights::Negative, 0.5, 1e-12, None)
    }

    #[test]
    fn test_tol_fun_history_len() {
        assert_eq!(20, tol_fun_history_len(2, 6));
        assert_eq!(11, tol_fun_history_len(1, 100));
    }

    #[test]
    fn test_no_termination() {
        let state = State::new(DVector::zeros(DIM), 0.5);
        let history = (0..30).map(|i| i as f64).collect::<VecDeque<_>>();

        assert_eq!(
            None,
            check_termination_criteria(&parameters(), &state, &history, &[1.0, 2.0]),
        );
    }

    #[test]
    fn test_tol_fun() {
        let state = State::new(DVector::zeros(DIM), 0.5);
        let history = vec![1.0; 20].into_iter().collect::<VecDeque<_>>();
        let costs = [1.0; LAMBDA];

        assert_eq!(
            Some(TerminationReason::TolFun),
            check_termination_criteria(&parameters(), &state, &history, &costs),
        );

        // Too little history
        let short = vec![1.0; 19].into_iter().collect::<VecDeque<_>>();
        assert_eq!(
            None,
            check_termination_criteria(&parameters(), &state, &short, &costs),
        );
    }

    #[test]
    fn test_tol_x() {
        let mut state = State::new(DVector::zeros(DIM), 0.5);
        *state.mut_sigma() = 1e-13;

        assert_eq!(
            Some(TerminationReason::TolX),
            check_termination_criteria(&parameters(), &state, &VecDeque::new(), &[1.0, 2.0]),
        );
    }
}
