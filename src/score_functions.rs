//! Score functions that turn the predictions of a model into an objective function value.
//!
//! Scores for classification are computed from [`ContingencyTable`]s. Labels can be of any type
//! that can be compared; one of them is chosen as the positive label.
//!
//! ```
//! use optunity::score_functions;
//!
//! let ys = [true, true, true, false];
//! let yhats = [true, false, true, true];
//!
//! assert_eq!(2.0 / 3.0, score_functions::precision(&ys, &yhats, &true).unwrap());
//! assert_eq!(0.5, score_functions::accuracy(&ys, &yhats).unwrap());
//! ```
//!
//! Ratios with a zero denominator are `NAN`.

use thiserror::Error;

use crate::utils;

/// Represents invalid input to a score function.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ScoreError {
    /// The labels and the predictions have different lengths.
    #[error("expected {expected} predictions, got {got}")]
    LengthMismatch { expected: usize, got: usize },
    /// There are no labels.
    #[error("no labels were given")]
    Empty,
}

/// Checks that both slices have the same, nonzero length
fn check_lengths<A, B>(ys: &[A], yhats: &[B]) -> Result<(), ScoreError> {
    if ys.len() != yhats.len() {
        return Err(ScoreError::LengthMismatch {
            expected: ys.len(),
            got: yhats.len(),
        });
    }
    if ys.is_empty() {
        return Err(ScoreError::Empty);
    }
    Ok(())
}

/// The number of true positives, false positives, true negatives and false negatives of a set of
/// predictions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ContingencyTable {
    /// True positives
    pub tp: usize,
    /// False positives
    pub fp: usize,
    /// True negatives
    pub tn: usize,
    /// False negatives
    pub fn_: usize,
}

impl ContingencyTable {
    /// Creates a table from its four counts.
    pub fn new(tp: usize, fp: usize, tn: usize, fn_: usize) -> Self {
        Self { tp, fp, tn, fn_ }
    }

    /// Returns the number of instances.
    pub fn total(&self) -> usize {
        self.tp + self.fp + self.tn + self.fn_
    }

    /// True positives over positive predictions
    pub fn precision(&self) -> f64 {
        self.tp as f64 / (self.tp + self.fp) as f64
    }

    /// True positives over positive labels, also known as the true positive rate
    pub fn recall(&self) -> f64 {
        self.tp as f64 / (self.tp + self.fn_) as f64
    }

    /// True negatives over negative predictions
    pub fn npv(&self) -> f64 {
        self.tn as f64 / (self.tn + self.fn_) as f64
    }

    /// False positives over negative labels
    pub fn false_positive_rate(&self) -> f64 {
        self.fp as f64 / (self.fp + self.tn) as f64
    }

    /// Correct predictions over all predictions
    pub fn accuracy(&self) -> f64 {
        (self.tp + self.tn) as f64 / self.total() as f64
    }

    /// The F-beta score, `(1 + b^2) TP / ((1 + b^2) TP + b^2 FN + FP)`.
    pub fn fbeta(&self, beta: f64) -> f64 {
        let bsq = beta.powi(2);
        let tp = self.tp as f64;
        (1.0 + bsq) * tp / ((1.0 + bsq) * tp + bsq * self.fn_ as f64 + self.fp as f64)
    }
}

/// Computes the contingency table of the predictions `yhats` of the labels `ys`.
///
/// Labels other than `positive` are all negative, so predicting one negative label for another
/// is a true negative.
///
/// ```
/// use optunity::score_functions::{contingency_table, ContingencyTable};
///
/// let ys = [true, true, true, true, true, false];
/// let yhats = [true, true, false, false, false, true];
///
/// assert_eq!(
///     ContingencyTable::new(2, 1, 0, 3),
///     contingency_table(&ys, &yhats, &true).unwrap(),
/// );
/// ```
pub fn contingency_table<T: PartialEq>(
    ys: &[T],
    yhats: &[T],
    positive: &T,
) -> Result<ContingencyTable, ScoreError> {
    check_lengths(ys, yhats)?;

    let mut table = ContingencyTable::default();
    for (y, yhat) in ys.iter().zip(yhats) {
        match (y == positive, yhat == positive) {
            (true, true) => table.tp += 1,
            (true, false) => table.fn_ += 1,
            (false, true) => table.fp += 1,
            (false, false) => table.tn += 1,
        }
    }
    Ok(table)
}

/// Computes a contingency table for every unique decision value, where an instance is predicted
/// positive if its decision value is at least the threshold. Higher decision values indicate
/// stronger positives.
///
/// Returns the tables and their thresholds, sorted by decreasing threshold.
///
/// ```
/// use optunity::score_functions::{contingency_tables, ContingencyTable};
///
/// let ys = [0, 0, 0, 0, 1, 1, 1, 1];
/// let decision_values = [2.0, 2.0, 1.0, 1.0, 1.0, 2.0, 3.0, 3.0];
/// let (tables, thresholds) = contingency_tables(&ys, &decision_values, &1).unwrap();
///
/// assert_eq!(
///     vec![
///         ContingencyTable::new(2, 0, 4, 2),
///         ContingencyTable::new(3, 2, 2, 1),
///         ContingencyTable::new(4, 4, 0, 0),
///     ],
///     tables,
/// );
/// assert_eq!(vec![3.0, 2.0, 1.0], thresholds);
/// ```
pub fn contingency_tables<T: PartialEq>(
    ys: &[T],
    decision_values: &[f64],
    positive: &T,
) -> Result<(Vec<ContingencyTable>, Vec<f64>), ScoreError> {
    check_lengths(ys, decision_values)?;

    let mut sorted = decision_values
        .iter()
        .zip(ys)
        .map(|(d, y)| (*d, y == positive))
        .collect::<Vec<_>>();
    sorted.sort_by(|a, b| utils::partial_cmp(b.0, a.0));

    let num_pos = sorted.iter().filter(|(_, pos)| *pos).count();
    // Everything is predicted negative above the highest threshold
    let mut table = ContingencyTable::new(0, 0, sorted.len() - num_pos, num_pos);
    let mut tables = Vec::new();
    let mut thresholds = Vec::new();

    // Instances with equal decision values change sides together
    let mut start = 0;
    while start < sorted.len() {
        let threshold = sorted[start].0;
        let num_ties = sorted[start..]
            .iter()
            .take_while(|(d, _)| *d == threshold)
            .count()
            .max(1);
        let ties = &sorted[start..start + num_ties];
        let new_pos = ties.iter().filter(|(_, pos)| *pos).count();
        let new_neg = num_ties - new_pos;

        table.tp += new_pos;
        table.fn_ -= new_pos;
        table.fp += new_neg;
        table.tn -= new_neg;

        tables.push(table);
        thresholds.push(threshold);
        start += num_ties;
    }

    Ok((tables, thresholds))
}

/// Returns the mean squared error between `ys` and `yhats`. Lower is better.
pub fn mse(ys: &[f64], yhats: &[f64]) -> Result<f64, ScoreError> {
    check_lengths(ys, yhats)?;
    let sum = ys.iter().zip(yhats).map(|(y, p)| (y - p).powi(2)).sum::<f64>();
    Ok(sum / ys.len() as f64)
}

/// Returns the fraction of correct predictions. Higher is better.
pub fn accuracy<T: PartialEq>(ys: &[T], yhats: &[T]) -> Result<f64, ScoreError> {
    check_lengths(ys, yhats)?;
    let correct = ys.iter().zip(yhats).filter(|(y, p)| y == p).count();
    Ok(correct as f64 / ys.len() as f64)
}

/// Returns the fraction of incorrect predictions. Lower is better.
pub fn error_rate<T: PartialEq>(ys: &[T], yhats: &[T]) -> Result<f64, ScoreError> {
    Ok(1.0 - accuracy(ys, yhats)?)
}

/// Returns the mean log loss `-(y ln p + (1 - y) ln(1 - p))` of the predicted probabilities
/// `yhats` of the binary labels `ys`. Lower is better.
///
/// Only meaningful for probabilistic models.
pub fn logloss(ys: &[bool], yhats: &[f64]) -> Result<f64, ScoreError> {
    check_lengths(ys, yhats)?;
    let loss = ys
        .iter()
        .zip(yhats)
        .map(|(y, p)| if *y { p.ln() } else { (1.0 - p).ln() })
        .sum::<f64>();
    Ok(-loss / ys.len() as f64)
}

/// Returns the Brier score, the mean squared difference between the predicted probabilities
/// `yhats` and the indicator of the positive label. Lower is better.
pub fn brier<T: PartialEq>(ys: &[T], yhats: &[f64], positive: &T) -> Result<f64, ScoreError> {
    check_lengths(ys, yhats)?;
    let sum = ys
        .iter()
        .zip(yhats)
        .map(|(y, p)| {
            let indicator = if y == positive { 1.0 } else { 0.0 };
            (p - indicator).powi(2)
        })
        .sum::<f64>();
    Ok(sum / ys.len() as f64)
}

/// Returns the score for learning from positive and unlabeled data,
/// `P(yhat = 1 | y = 1)^2 / P(yhat = 1)`. Higher is better.
///
/// Returns `0.0` if nothing is predicted positive.
///
/// See Lee and Liu, "Learning with positive and unlabeled examples using weighted logistic
/// regression", ICML 2003.
pub fn pu_score(ys: &[bool], yhats: &[bool]) -> Result<f64, ScoreError> {
    check_lengths(ys, yhats)?;

    let num_pos = ys.iter().filter(|y| **y).count() as f64;
    let p_pred_pos = yhats.iter().filter(|p| **p).count() as f64 / ys.len() as f64;
    if p_pred_pos == 0.0 {
        return Ok(0.0);
    }

    let tp = ys.iter().zip(yhats).filter(|(y, p)| **y && **p).count() as f64;
    Ok(tp.powi(2) / (num_pos.powi(2) * p_pred_pos))
}

/// Returns the F-beta score. Higher is better.
pub fn fbeta<T: PartialEq>(ys: &[T], yhats: &[T], beta: f64, positive: &T) -> Result<f64, ScoreError> {
    Ok(contingency_table(ys, yhats, positive)?.fbeta(beta))
}

/// Returns the number of true positives over the number of positive predictions. Higher is better.
pub fn precision<T: PartialEq>(ys: &[T], yhats: &[T], positive: &T) -> Result<f64, ScoreError> {
    Ok(contingency_table(ys, yhats, positive)?.precision())
}

/// Returns the number of true positives over the number of positive labels. Higher is better.
pub fn recall<T: PartialEq>(ys: &[T], yhats: &[T], positive: &T) -> Result<f64, ScoreError> {
    Ok(contingency_table(ys, yhats, positive)?.recall())
}

/// Returns the negative predictive value, the number of true negatives over the number of
/// negative predictions. Higher is better.
pub fn npv<T: PartialEq>(ys: &[T], yhats: &[T], positive: &T) -> Result<f64, ScoreError> {
    Ok(contingency_table(ys, yhats, positive)?.npv())
}

/// Returns the area under the ROC curve of the decision values, using the trapezoidal rule over
/// the points of [`contingency_tables`]. Higher is better.
///
/// `NAN` if all labels are positive or all are negative.
pub fn roc_auc<T: PartialEq>(
    ys: &[T],
    decision_values: &[f64],
    positive: &T,
) -> Result<f64, ScoreError> {
    let (tables, _) = contingency_tables(ys, decision_values, positive)?;

    let mut area = 0.0;
    let mut previous = (0.0, 0.0);
    for table in tables {
        let point = (table.false_positive_rate(), table.recall());
        area += (point.0 - previous.0) * (point.1 + previous.1) / 2.0;
        previous = point;
    }
    Ok(area)
}

#[cfg(test)]
mod tests {
    use assert_approx_eq::assert_approx_eq;

    use super::*;

    #[test]
    fn test_contingency_table_labels() {
        let ys = ["a", "b", "c", "a", "c"];
        let yhats = ["a", "c", "b", "b", "a"];
        let table = contingency_table(&ys, &yhats, &"a").unwrap();

        // "b" predicted as "c" and the reverse are true negatives

        assert_eq!(ContingencyTable::new(1, 1, 2, 1), table);
        assert_eq!(5, table.total());
    }

    #[test]
    fn test_contingency_tables_ties() {
        let ys = [true, false, true];
        let (tables, thresholds) = contingency_tables(&ys, &[0.5, 0.5, 0.5], &true).unwrap();

        assert_eq!(vec![ContingencyTable::new(2, 1, 0, 0)], tables);
        assert_eq!(vec![0.5], thresholds);
    }

    #[test]
    fn test_errors() {
        assert_eq!(
            Err(ScoreError::LengthMismatch {
                expected: 2,
                got: 1
            }),
            mse(&[1.0, 2.0], &[1.0]),
        );
        assert_eq!(Err(ScoreError::Empty), accuracy::<bool>(&[], &[]));
        assert!(contingency_tables(&[1], &[], &1).is_err());
    }

    #[test]
    fn test_regression_scores() {
        assert_eq!(0.625, mse(&[1.0, 2.0], &[2.0, 1.5]).unwrap());
        assert_approx_eq!(
            (0.04 + 0.09 + 0.64) / 3.0,
            brier(&[1, 0, 1], &[0.8, 0.3, 0.2], &1).unwrap()
        );
        assert_approx_eq!(
            -(0.9f64.ln() + 0.8f64.ln()) / 2.0,
            logloss(&[true, false], &[0.9, 0.2]).unwrap()
        );
    }

    #[test]
    fn test_classification_scores() {
        let ys = [true, true, true, false, false];
        let yhats = [true, false, true, true, false];

        assert_eq!(0.6, accuracy(&ys, &yhats).unwrap());
        assert_approx_eq!(0.4, error_rate(&ys, &yhats).unwrap());
        assert_approx_eq!(2.0 / 3.0, precision(&ys, &yhats, &true).unwrap());
        assert_approx_eq!(2.0 / 3.0, recall(&ys, &yhats, &true).unwrap());
        assert_eq!(0.5, npv(&ys, &yhats, &true).unwrap());
        // Precision and recall are equal, so every F-beta equals them
        assert_approx_eq!(2.0 / 3.0, fbeta(&ys, &yhats, 1.0, &true).unwrap());
        assert_approx_eq!(2.0 / 3.0, fbeta(&ys, &yhats, 2.0, &true).unwrap());
        assert!(precision(&ys, &[false; 5], &true).unwrap().is_nan());
    }

    #[test]
    fn test_pu_score() {
        let ys = [true, true, false, false];

        // recall 1/2, half predicted positive
        assert_approx_eq!(0.5, pu_score(&ys, &[true, false, true, false]).unwrap());
        assert_eq!(0.0, pu_score(&ys, &[false; 4]).unwrap());
    }

    #[test]
    fn test_roc_auc() {
        let ys = [0, 0, 0, 0, 1, 1, 1, 1];
        let decision_values = [2.0, 2.0, 1.0, 1.0, 1.0, 2.0, 3.0, 3.0];
        assert_approx_eq!(0.75, roc_auc(&ys, &decision_values, &1).unwrap());

        assert_eq!(1.0, roc_auc(&[1, 1, 0], &[0.9, 0.8, 0.1], &1).unwrap());
        assert_eq!(0.0, roc_auc(&[0, 1], &[0.9, 0.1], &1).unwrap());
        assert!(roc_auc(&[1, 1], &[0.9, 0.1], &1).unwrap().is_nan());
    }
}
