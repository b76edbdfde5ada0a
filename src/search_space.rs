//! Named parameters and their box constraints. See [`SearchSpace`] for full documentation.

use nalgebra::DVector;
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use std::collections::BTreeMap;
use std::ops::RangeInclusive;

/// A set of named parameter values, e.g. the solution returned by a solver.
///
/// Parameters are ordered by name, which is also the order in which solvers see them.
pub type Pars = BTreeMap<String, f64>;

/// Represents an invalid [`SearchSpace`].
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum InvalidSearchSpaceError {
    /// The same parameter name was given twice.
    #[error("parameter `{0}` is defined more than once")]
    DuplicateName(String),
    /// The lower bound of a parameter is greater than its upper bound.
    #[error("parameter `{0}` has a lower bound greater than its upper bound")]
    EmptyRange(String),
    /// A bound is infinite or NAN.
    #[error("parameter `{0}` has a non-finite bound")]
    NonFiniteBound(String),
    /// The bounds are finite, but the width of the range (or its midpoint) overflows.
    #[error("parameter `{0}` has a range too wide to sample")]
    RangeTooWide(String),
    /// A set of parameter values is missing a parameter of the search space.
    #[error("parameter `{0}` is missing")]
    MissingParameter(String),
}

/// Box constraints `[lb, ub]` for a set of named parameters.
///
/// # Examples
///
/// ```
/// use optunity::SearchSpace;
///
/// let space = SearchSpace::new([("y", -5.0..=5.0), ("x", 0.0..=1.0)]).unwrap();
///
/// assert_eq!(2, space.dim());
/// // Parameters are always sorted by name
/// assert_eq!(vec!["x", "y"], space.names());
/// assert_eq!(0.5, space.center()[0]);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SearchSpace {
    bounds: BTreeMap<String, RangeInclusive<f64>>,
}

impl SearchSpace {
    /// Creates a `SearchSpace` from `(name, lb..=ub)` pairs.
    pub fn new<S, I>(bounds: I) -> Result<Self, InvalidSearchSpaceError>
    where
        S: Into<String>,
        I: IntoIterator<Item = (S, RangeInclusive<f64>)>,
    {
        let mut space = Self::default();
        for (name, range) in bounds {
            space.insert(name, range)?;
        }
        Ok(space)
    }

    /// Adds a parameter with the given bounds.
    pub fn insert<S: Into<String>>(
        &mut self,
        name: S,
        range: RangeInclusive<f64>,
    ) -> Result<(), InvalidSearchSpaceError> {
        let name = name.into();

        if self.bounds.contains_key(&name) {
            return Err(InvalidSearchSpaceError::DuplicateName(name));
        }
        check_range(&name, &range)?;

        self.bounds.insert(name, range);
        Ok(())
    }

    /// Checks every bound again. Only needed for search spaces that were deserialized.
    pub fn validate(&self) -> Result<(), InvalidSearchSpaceError> {
        self.bounds
            .iter()
            .try_for_each(|(name, range)| check_range(name, range))
    }

    /// Returns the number of parameters.
    pub fn dim(&self) -> usize {
        self.bounds.len()
    }

    /// Returns whether the search space has no parameters.
    pub fn is_empty(&self) -> bool {
        self.bounds.is_empty()
    }

    /// Returns the parameter names in sorted order.
    pub fn names(&self) -> Vec<String> {
        self.bounds.keys().cloned().collect()
    }

    /// Returns the bounds of a parameter.
    pub fn get(&self, name: &str) -> Option<&RangeInclusive<f64>> {
        self.bounds.get(name)
    }

    /// Iterates over `(name, bounds)` pairs in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &RangeInclusive<f64>)> {
        self.bounds.iter().map(|(name, range)| (name.as_str(), range))
    }

    /// Returns the lower bounds in sorted parameter order.
    pub fn lower(&self) -> DVector<f64> {
        DVector::from_iterator(self.dim(), self.bounds.values().map(|r| *r.start()))
    }

    /// Returns the upper bounds in sorted parameter order.
    pub fn upper(&self) -> DVector<f64> {
        DVector::from_iterator(self.dim(), self.bounds.values().map(|r| *r.end()))
    }

    /// Returns `ub - lb` for each parameter.
    pub fn widths(&self) -> DVector<f64> {
        self.upper() - self.lower()
    }

    /// Returns the center of the box.
    pub fn center(&self) -> DVector<f64> {
        (self.lower() + self.upper()) * 0.5
    }

    /// Returns whether `point` lies within the box (bounds included).
    pub fn contains(&self, point: &DVector<f64>) -> bool {
        point.len() == self.dim()
            && self
                .bounds
                .values()
                .zip(point.iter())
                .all(|(range, x)| range.contains(x))
    }

    /// Moves every coordinate of `point` that lies outside the box onto the nearest bound.
    pub fn clamp(&self, point: &mut DVector<f64>) {
        for (x, range) in point.iter_mut().zip(self.bounds.values()) {
            *x = x.max(*range.start()).min(*range.end());
        }
    }

    /// Samples a point uniformly within the box.
    pub fn sample_uniform<R: Rng>(&self, rng: &mut R) -> DVector<f64> {
        DVector::from_iterator(
            self.dim(),
            self.bounds
                .values()
                .map(|range| rng.gen_range(range.clone()))
                .collect::<Vec<_>>(),
        )
    }

    /// Names the coordinates of `point`.
    pub fn to_pars(&self, point: &DVector<f64>) -> Pars {
        self.bounds
            .keys()
            .cloned()
            .zip(point.iter().cloned())
            .collect()
    }

    /// Orders the values in `pars` as the coordinates of a point. Extra parameters are ignored.
    pub fn from_pars(&self, pars: &Pars) -> Result<DVector<f64>, InvalidSearchSpaceError> {
        let values = self
            .bounds
            .keys()
            .map(|name| {
                pars.get(name)
                    .cloned()
                    .ok_or_else(|| InvalidSearchSpaceError::MissingParameter(name.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(DVector::from(values))
    }
}

fn check_range(name: &str, range: &RangeInclusive<f64>) -> Result<(), InvalidSearchSpaceError> {
    if !range.start().is_finite() || !range.end().is_finite() {
        return Err(InvalidSearchSpaceError::NonFiniteBound(name.to_string()));
    }
    if range.start() > range.end() {
        return Err(InvalidSearchSpaceError::EmptyRange(name.to_string()));
    }
    // Uniform sampling divides the width by slightly less than one, so leave a factor of two
    let width = range.end() - range.start();
    if !(2.0 * width).is_finite() || !(range.start() + range.end()).is_finite() {
        return Err(InvalidSearchSpaceError::RangeTooWide(name.to_string()));
    }
    Ok(())
}
