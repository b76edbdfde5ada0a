//! Data points for the plot, extracted from a call log

use crate::evaluation::CallLog;
use crate::Mode;

// Added to distances so that they can be drawn on a log scale
const LOG_OFFSET: f64 = 1e-20;

/// Data points for the plot.
#[derive(Clone, Debug)]
pub struct PlotData {
    /// 1-based index of each evaluation
    evaluations: Vec<usize>,
    /// The objective function value of each evaluation
    values: Vec<f64>,
    /// The best value up to and including each evaluation
    best_so_far: Vec<f64>,
    /// The index (into the vectors above) and value of the overall best evaluation
    best: Option<(usize, f64)>,
}

impl PlotData {
    pub fn new(call_log: &CallLog, mode: Mode) -> Self {
        let values = call_log.values().collect::<Vec<_>>();
        let best = values
            .iter()
            .cloned()
            .enumerate()
            .fold(None, |best, (i, value)| match best {
                Some((_, best_value)) if !mode.is_better(value, best_value) => best,
                _ => Some((i, value)),
            });

        Self {
            evaluations: (1..=values.len()).collect(),
            best_so_far: call_log.best_so_far(mode),
            values,
            best,
        }
    }

    /// Returns the number of data points
    pub fn len(&self) -> usize {
        self.evaluations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn evaluations(&self) -> &[usize] {
        &self.evaluations
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn best_so_far(&self) -> &[f64] {
        &self.best_so_far
    }

    pub fn best(&self) -> Option<(usize, f64)> {
        self.best
    }

    /// Returns `abs(best so far - overall best)` for each evaluation, offset away from zero
    pub fn distance_to_best(&self) -> Vec<f64> {
        match self.best {
            Some((_, best_value)) => self
                .best_so_far
                .iter()
                .map(|y| (y - best_value).abs() + LOG_OFFSET)
                .collect(),
            None => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solvers::{GridSearch, Solver};
    use crate::Pars;

    fn call_log(mode: Mode) -> CallLog {
        let solver = GridSearch::new([("x", vec![3.0, 1.0, 2.0, 1.0])]).unwrap();
        solver
            .optimize_with_seed(|p: &Pars| p["x"], mode, 0)
            .unwrap()
            .call_log
    }

    #[test]
    fn test_minimize() {
        let data = PlotData::new(&call_log(Mode::Minimize), Mode::Minimize);

        assert_eq!(4, data.len());
        assert_eq!(&[1, 2, 3, 4], data.evaluations());
        assert_eq!(&[3.0, 1.0, 2.0, 1.0], data.values());
        assert_eq!(&[3.0, 1.0, 1.0, 1.0], data.best_so_far());
        // Ties keep the earliest evaluation
        assert_eq!(Some((1, 1.0)), data.best());
        assert_eq!(vec![2.0, 1e-20, 1e-20, 1e-20], data.distance_to_best());
    }

    #[test]
    fn test_maximize() {
        let data = PlotData::new(&call_log(Mode::Maximize), Mode::Maximize);

        assert_eq!(&[3.0, 3.0, 3.0, 3.0], data.best_so_far());
        assert_eq!(Some((0, 3.0)), data.best());
    }

    #[test]
    fn test_empty() {
        let data = PlotData::new(&CallLog::default(), Mode::Minimize);

        assert!(data.is_empty());
        assert_eq!(None, data.best());
        assert!(data.distance_to_best().is_empty());
    }
}
