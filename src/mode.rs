//! Whether the objective function is minimized or maximized

use serde::{Deserialize, Serialize};

/// The direction of an optimization.
///
/// Solvers always minimize a cost internally; in `Maximize` mode the cost is the negated function
/// value. Reported values are never negated.
///
/// The default value is `Minimize`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Search for the lowest function value.
    Minimize,
    /// Search for the highest function value.
    Maximize,
}

impl Default for Mode {
    fn default() -> Self {
        Self::Minimize
    }
}

impl Mode {
    /// Returns whether `a` is strictly better than `b`, so ties keep the earlier value
    pub(crate) fn is_better(&self, a: f64, b: f64) -> bool {
        match self {
            Mode::Minimize => a < b,
            Mode::Maximize => a > b,
        }
    }

    pub(crate) fn choose_best(&self, a: f64, b: f64) -> f64 {
        if self.is_better(b, a) {
            b
        } else {
            a
        }
    }

    /// Maps a function value to a cost that is always minimized
    pub(crate) fn cost(&self, value: f64) -> f64 {
        match self {
            Mode::Minimize => value,
            Mode::Maximize => -value,
        }
    }
}
