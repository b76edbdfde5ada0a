//! Types for plotting support. See [`Plot`] for usage and what is plotted.

mod data;
mod draw;
mod options;

pub use options::PlotOptions;

use plotters::coord;
use plotters::drawing::{DrawingArea, DrawingAreaErrorKind, IntoDrawingArea};
use plotters::prelude::{BitMapBackend, DrawingBackend};
use plotters::style::colors;
use thiserror::Error;
use tracing::debug;

use std::fs::DirBuilder;
use std::io;
use std::path::Path;

use crate::evaluation::CallLog;
use crate::solvers::Solution;
use crate::Mode;
use data::PlotData;

/// The drawing backend to use for rendering the plot.
pub type Backend<'a> = BitMapBackend<'a>;
/// The error type returned by drawing functions.
pub type DrawingError = DrawingAreaErrorKind<<Backend<'static> as DrawingBackend>::ErrorType>;

/// The height of plot images in pixels.
pub const PLOT_HEIGHT: u32 = 1200;
/// The width of plot images in pixels.
pub const PLOT_WIDTH: u32 = 1200;

/// Convergence plot of an optimization run. Can be obtained from
/// [`Solution::plot`][crate::solvers::Solution::plot] or [`CallLog::plot`] and should be saved with
/// [`save_to_file`][`Self::save_to_file`].
///
/// Plots against the evaluation index the:
/// - Objective function value of each evaluation
/// - Best value found so far
/// - Distance of the best value so far from the overall best value (log scale)
///
/// Captions, axis labels and the legend are only drawn with the `ttf` feature enabled.
///
/// # Examples
///
/// ```no_run
/// use optunity::{Pars, SearchSpace};
///
/// let space = SearchSpace::new([("x", -5.0..=5.0), ("y", -5.0..=5.0)]).unwrap();
/// let solution = optunity::minimize(|p: &Pars| p["x"].powi(2) + p["y"].powi(2), 500, space)
///     .unwrap();
///
/// solution.save_plot("plot.png", true).unwrap();
/// ```
#[derive(Clone, Debug)]
pub struct Plot {
    data: PlotData,
    options: PlotOptions,
}

impl Plot {
    /// Creates a plot of the evaluations in `call_log`.
    pub fn new(call_log: &CallLog, mode: Mode, options: PlotOptions) -> Self {
        Self {
            data: PlotData::new(call_log, mode),
            options,
        }
    }

    /// Saves the plot to a bitmap image file. Recursively creates the necessary directories if
    /// `create_dirs` is `true`.
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P, create_dirs: bool) -> Result<(), PlotError> {
        let path = path.as_ref();
        if create_dirs {
            if let Some(parent) = path.parent() {
                DirBuilder::new().recursive(true).create(parent)?;
            }
        }

        let plot = self.build_plot(&path)?;
        plot.present()?;
        debug!(path = %path.display(), points = self.len(), "saved plot");
        Ok(())
    }

    /// Builds the plot and returns it (does not save to a file)
    fn build_plot<'a, P: AsRef<Path> + 'a>(
        &self,
        path: &'a P,
    ) -> Result<DrawingArea<Backend<'a>, coord::Shift>, DrawingError> {
        let root_area = Backend::new(path, (PLOT_WIDTH, PLOT_HEIGHT)).into_drawing_area();

        root_area.fill(&colors::WHITE)?;

        let (top, bottom) = root_area.split_vertically(PLOT_HEIGHT * 3 / 5);

        draw::draw_values(&self.data, &self.options, &top)?;
        draw::draw_distance_to_best(&self.data, &bottom)?;

        Ok(root_area)
    }

    /// Returns the number of data points in the plot.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns whether there are no data points in the plot.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl CallLog {
    /// Returns a convergence plot of the evaluations.
    pub fn plot(&self, mode: Mode, options: PlotOptions) -> Plot {
        Plot::new(self, mode, options)
    }
}

impl Solution {
    /// Returns a convergence plot of the evaluations made while finding this solution.
    pub fn plot(&self) -> Plot {
        self.call_log.plot(self.mode, PlotOptions::default())
    }

    /// Saves a convergence plot to a bitmap image file. Recursively creates the necessary
    /// directories if `create_dirs` is `true`.
    pub fn save_plot<P: AsRef<Path>>(&self, path: P, create_dirs: bool) -> Result<(), PlotError> {
        self.plot().save_to_file(path, create_dirs)
    }
}

/// An error produced while creating or saving a plot.
#[derive(Debug, Error)]
pub enum PlotError {
    #[error("failed to draw the plot: {0}")]
    DrawingError(#[from] DrawingError),
    #[error(transparent)]
    IoError(#[from] io::Error),
}
