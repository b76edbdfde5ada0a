//! Evaluation of points requested by solvers, and the record of every evaluation

use nalgebra::DVector;
use thiserror::Error;
use tracing::trace;

use crate::objective_function::Batch;
use crate::{Mode, Pars};

/// A type for evaluating the points requested by a solver. Converts points to named parameters,
/// calls the objective function, validates the results, and keeps track of the best point and the
/// [`CallLog`].
pub struct Evaluator<'a> {
    /// Calls the objective function
    batch: Box<dyn Batch + 'a>,
    /// Whether lower or higher values are better
    mode: Mode,
    /// Parameter names in the order of the coordinates of the points
    names: Vec<String>,
    /// The number of times the objective function has been evaluated
    function_evals: usize,
    /// Every evaluation so far, in order
    call_log: CallLog,
    /// The best point evaluated so far
    best: Option<EvaluatedPoint>,
}

impl<'a> Evaluator<'a> {
    /// Creates an `Evaluator` for points whose coordinates are named by `names`.
    pub fn new(batch: Box<dyn Batch + 'a>, mode: Mode, names: Vec<String>) -> Self {
        Self {
            batch,
            mode,
            names,
            function_evals: 0,
            call_log: CallLog::default(),
            best: None,
        }
    }

    /// Returns the optimization mode.
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Returns the number of parameters.
    pub fn dim(&self) -> usize {
        self.names.len()
    }

    /// Returns the parameter names in the order of the coordinates of the points.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Names the coordinates of `point`.
    pub fn to_pars(&self, point: &DVector<f64>) -> Pars {
        self.names
            .iter()
            .cloned()
            .zip(point.iter().cloned())
            .collect()
    }

    /// Evaluates a batch of points and returns them with their objective function values, in the
    /// same order.
    ///
    /// Returns `Err` if the objective function returned NAN for any point.
    pub fn evaluate(
        &mut self,
        points: Vec<DVector<f64>>,
    ) -> Result<Vec<EvaluatedPoint>, InvalidFunctionValueError> {
        let pars = points.iter().map(|p| self.to_pars(p)).collect::<Vec<_>>();
        let values = self.batch.evaluate_batch(&pars);

        if values.iter().any(|v| v.is_nan()) {
            return Err(InvalidFunctionValueError);
        }

        self.function_evals += values.len();
        trace!(
            batch_size = values.len(),
            function_evals = self.function_evals,
            "evaluated batch"
        );

        let evaluated = points
            .into_iter()
            .zip(values)
            .map(|(point, value)| EvaluatedPoint { point, value })
            .collect::<Vec<_>>();

        for (p, point) in pars.into_iter().zip(&evaluated) {
            self.call_log.push(p, point.value);
            self.update_best(point);
        }

        Ok(evaluated)
    }

    /// Evaluates a single point and returns its objective function value.
    pub fn evaluate_one(&mut self, point: DVector<f64>) -> Result<f64, InvalidFunctionValueError> {
        Ok(self.evaluate(vec![point])?[0].value)
    }

    /// Replaces the best point if `point` is strictly better, so ties keep the earliest point
    fn update_best(&mut self, point: &EvaluatedPoint) {
        match self.best {
            Some(ref mut best) => {
                if self.mode.is_better(point.value, best.value) {
                    *best = point.clone();
                }
            }
            None => self.best = Some(point.clone()),
        }
    }

    /// Returns the number of times the objective function has been evaluated.
    pub fn function_evals(&self) -> usize {
        self.function_evals
    }

    /// Returns the best point evaluated so far. Always `Some` once a point has been evaluated.
    pub fn best(&self) -> Option<&EvaluatedPoint> {
        self.best.as_ref()
    }

    /// Returns the record of every evaluation so far.
    pub fn call_log(&self) -> &CallLog {
        &self.call_log
    }

    /// Consumes `self` and returns the record of every evaluation.
    pub fn into_call_log(self) -> CallLog {
        self.call_log
    }
}

/// A point that has been evaluated by the objective function
#[derive(Clone, Debug, PartialEq)]
pub struct EvaluatedPoint {
    /// The evaluated point
    point: DVector<f64>,
    /// The objective value at the point
    value: f64,
}

impl EvaluatedPoint {
    /// Returns the evaluated point, with coordinates in the order of the parameter names.
    pub fn point(&self) -> &DVector<f64> {
        &self.point
    }

    /// Returns the objective function value at the point.
    pub fn value(&self) -> f64 {
        self.value
    }
}

/// The objective function returned an invalid value (NAN)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
#[error("the objective function returned an invalid value (NAN)")]
pub struct InvalidFunctionValueError;

/// A record of every objective function evaluation in the order they were made.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CallLog {
    entries: Vec<(Pars, f64)>,
}

impl CallLog {
    fn push(&mut self, pars: Pars, value: f64) {
        self.entries.push((pars, value));
    }

    /// Returns the number of recorded evaluations.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns whether no evaluations were recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over `(parameters, value)` pairs in evaluation order.
    pub fn iter(&self) -> impl Iterator<Item = (&Pars, f64)> {
        self.entries.iter().map(|(pars, value)| (pars, *value))
    }

    /// Iterates over the objective function values in evaluation order.
    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.entries.iter().map(|(_, value)| *value)
    }

    /// Returns the best recorded evaluation according to `mode` (the earliest one in case of
    /// ties).
    pub fn best(&self, mode: Mode) -> Option<(&Pars, f64)> {
        self.iter().fold(None, |best, (pars, value)| match best {
            Some((_, best_value)) if !mode.is_better(value, best_value) => best,
            _ => Some((pars, value)),
        })
    }

    /// Returns the best value found up to and including each evaluation.
    pub fn best_so_far(&self, mode: Mode) -> Vec<f64> {
        self.values()
            .scan(None, |best: &mut Option<f64>, value| {
                let next = best.map_or(value, |b| mode.choose_best(b, value));
                *best = Some(next);
                Some(next)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objective_function::Sequential;

    fn evaluator<'a>(mode: Mode) -> Evaluator<'a> {
        let function = |p: &Pars| p["x"] + 2.0 * p["y"];
        Evaluator::new(
            Box::new(Sequential(function)),
            mode,
            vec!["x".into(), "y".into()],
        )
    }

    #[test]
    fn test_evaluate() {
        let mut evaluator = evaluator(Mode::Minimize);
        let points = vec![
            DVector::from(vec![1.0, 1.0]),
            DVector::from(vec![0.0, -1.0]),
            DVector::from(vec![2.0, -1.0]),
        ];

        let evaluated = evaluator.evaluate(points.clone()).unwrap();

        assert_eq!(3, evaluated.len());
        assert_eq!(&points[0], evaluated[0].point());
        assert_eq!(3.0, evaluated[0].value());
        assert_eq!(-2.0, evaluated[1].value());
        assert_eq!(0.0, evaluated[2].value());
        assert_eq!(3, evaluator.function_evals());
        assert_eq!(3, evaluator.call_log().len());
        assert_eq!(-2.0, evaluator.best().unwrap().value());

        assert_eq!(5.0, evaluator.evaluate_one(DVector::from(vec![3.0, 1.0])).unwrap());
        assert_eq!(4, evaluator.function_evals());
        assert_eq!(-2.0, evaluator.best().unwrap().value());
    }

    #[test]
    fn test_best_maximize() {
        let mut evaluator = evaluator(Mode::Maximize);
        evaluator
            .evaluate(vec![
                DVector::from(vec![1.0, 1.0]),
                DVector::from(vec![0.0, -1.0]),
            ])
            .unwrap();

        assert_eq!(3.0, evaluator.best().unwrap().value());
        assert_eq!(3.0, evaluator.call_log().best(Mode::Maximize).unwrap().1);
        assert_eq!(-2.0, evaluator.call_log().best(Mode::Minimize).unwrap().1);
    }

    #[test]
    fn test_ties_keep_earliest() {
        let mut evaluator = Evaluator::new(
            Box::new(Sequential(|_: &Pars| 1.0)),
            Mode::Minimize,
            vec!["x".into()],
        );
        evaluator
            .evaluate(vec![DVector::from(vec![1.0]), DVector::from(vec![2.0])])
            .unwrap();

        assert_eq!(&DVector::from(vec![1.0]), evaluator.best().unwrap().point());
        assert_eq!(1.0, evaluator.call_log().best(Mode::Minimize).unwrap().0["x"]);
    }

    #[test]
    fn test_invalid_function_value() {
        let mut evaluator = Evaluator::new(
            Box::new(Sequential(|p: &Pars| if p["x"] > 0.0 { f64::NAN } else { 0.0 })),
            Mode::Minimize,
            vec!["x".into()],
        );

        assert!(evaluator.evaluate_one(DVector::from(vec![-1.0])).is_ok());
        assert_eq!(
            Err(InvalidFunctionValueError),
            evaluator.evaluate(vec![DVector::from(vec![-1.0]), DVector::from(vec![1.0])]),
        );
        assert_eq!(1, evaluator.function_evals());
    }

    #[test]
    fn test_call_log() {
        let mut evaluator = evaluator(Mode::Minimize);
        for x in [3.0, 1.0, 2.0, 0.0] {
            evaluator.evaluate_one(DVector::from(vec![x, 0.0])).unwrap();
        }

        let log = evaluator.into_call_log();
        assert_eq!(vec![3.0, 1.0, 2.0, 0.0], log.values().collect::<Vec<_>>());
        assert_eq!(vec![3.0, 1.0, 1.0, 0.0], log.best_so_far(Mode::Minimize));
        assert_eq!(vec![3.0, 3.0, 3.0, 3.0], log.best_so_far(Mode::Maximize));
        assert_eq!(2.0, log.iter().nth(2).unwrap().0["x"]);
    }
}
