//! Drawing of the data points to the plot

use plotters::chart::{ChartBuilder, ChartContext, SeriesAnno, SeriesLabelPosition};
use plotters::coord;
use plotters::coord::cartesian::Cartesian2d;
use plotters::coord::combinators::{IntoLogRange, LogCoord};
use plotters::coord::ranged1d::{AsRangedCoord, ValueFormatter};
use plotters::coord::types::RangedCoordusize;
use plotters::drawing::DrawingArea;
use plotters::element::{Cross, PathElement};
use plotters::series::LineSeries;
use plotters::style::{colors, Color};

use std::ops::Range;

use super::data::PlotData;
use super::options::PlotOptions;
use super::{Backend, DrawingError};
use crate::utils::partial_cmp;

/// The font to use for text in the plot
const FONT: &str = "sans-serif";

/// Captions, axis labels and the legend need a font backend, which is only available with the
/// `ttf` feature. Without it, only the series are drawn.
const DRAW_TEXT: bool = cfg!(feature = "ttf");

/// Parameters for a y-axis
struct YAxis<Y> {
    /// The range of the y values to be drawn
    range: Y,
    /// The preferred number of axis labels to use (may not be used exactly)
    num_labels: usize,
    /// The kind of axis `range` represents
    kind: YAxisKind,
}

impl<Y> YAxis<Y> {
    fn new(range: Y, num_labels: usize, kind: YAxisKind) -> Self {
        Self {
            range,
            num_labels,
            kind,
        }
    }
}

/// Represents which kind of scale and labels to use for the y-axis
#[derive(Clone, Copy)]
enum YAxisKind {
    /// A log scale
    Log,
    /// A linear scale
    Linear {
        /// Whether to use scientific notation for the linear axis labels
        scientific_notation: bool,
    },
}

/// Draws the value of each evaluation and the running best value to the drawing area
pub fn draw_values(
    data: &PlotData,
    options: &PlotOptions,
    area: &DrawingArea<Backend, coord::Shift>,
) -> Result<(), DrawingError> {
    let shown_values: &[f64] = if options.hide_values {
        &[]
    } else {
        data.values()
    };
    let all_y_values = shown_values
        .iter()
        .chain(data.best_so_far())
        .cloned();
    let y_axis = get_linear_y_axis(all_y_values, options.scientific_notation);

    let draw = |context: &mut ChartContext<_, _>| {
        let evaluations = data.evaluations().iter().cloned();

        if !options.hide_values {
            let points_values = get_points(evaluations.clone(), data.values().iter().cloned());
            add_to_legend(
                context.draw_series(LineSeries::new(points_values, &colors::BLUE.mix(0.4)))?,
                "f",
                colors::BLUE,
            );
        }

        let points_best = get_points(evaluations, data.best_so_far().iter().cloned());
        add_to_legend(
            context.draw_series(LineSeries::new(points_best, &colors::RED))?,
            "best f",
            colors::RED,
        );

        // Marker for the overall best evaluation
        if let Some((index, value)) = data.best() {
            if value.is_finite() {
                context
                    .plotting_area()
                    .draw(&Cross::new((data.evaluations()[index], value), 10, colors::RED))?;
            }
        }

        Ok(())
    };

    DrawingAreaSetup {
        area,
        evaluations: data.evaluations(),
        caption: "Objective Function Value",
        legend_position: Some(SeriesLabelPosition::UpperRight),
        y_axis,
        draw,
    }
    .configure_area()
}

/// Draws the distance of the running best value to the overall best value to the drawing area
pub fn draw_distance_to_best(
    data: &PlotData,
    area: &DrawingArea<Backend, coord::Shift>,
) -> Result<(), DrawingError> {
    let distance = data.distance_to_best();
    let y_axis = get_log_y_axis(distance.iter().cloned());

    let draw = |context: &mut ChartContext<_, _>| {
        let points = get_points(data.evaluations().iter().cloned(), distance.iter().cloned());
        context.draw_series(LineSeries::new(points, &colors::CYAN))?;
        Ok(())
    };

    DrawingAreaSetup {
        area,
        evaluations: data.evaluations(),
        caption: "abs(best f - overall best)",
        legend_position: None,
        y_axis,
        draw,
    }
    .configure_area()
}

/// Stores parameters for configuring a drawing area
struct DrawingAreaSetup<'a, 'b, Y, F> {
    // The drawing area to configure
    area: &'a DrawingArea<Backend<'b>, coord::Shift>,
    // The x values of the data points
    evaluations: &'a [usize],
    // The caption for the drawing area
    caption: &'static str,
    // The position of the legend (disabled if `None`)
    legend_position: Option<SeriesLabelPosition>,
    // Parameters for the y-axis
    y_axis: YAxis<Y>,
    // Called on the `ChartContext` after setup
    // Should be used to draw elements onto the drawing area
    draw: F,
}

impl<'a, 'b, Y, F> DrawingAreaSetup<'a, 'b, Y, F>
where
    Y: AsRangedCoord<Value = f64>,
    Y::CoordDescType: ValueFormatter<f64>,
    F: FnOnce(
        &mut ChartContext<'a, Backend<'b>, Cartesian2d<RangedCoordusize, Y::CoordDescType>>,
    ) -> Result<(), DrawingError>,
{
    /// Creates a `ChartContext` with a common style, configures it according to the stored options,
    /// and calls `draw` to draw to it
    fn configure_area(self) -> Result<(), DrawingError> {
        let x_end = self.evaluations.last().cloned().unwrap_or(1);
        let x_range = 1..(x_end as f64 * 1.05).ceil() as usize + 1;

        let mut builder = ChartBuilder::on(self.area);
        builder.margin(30);
        if DRAW_TEXT {
            builder
                .x_label_area_size(50)
                .y_label_area_size(60)
                .caption(self.caption, (FONT, 28));
        }
        let y_kind = self.y_axis.kind;
        let y_num_labels = self.y_axis.num_labels;
        let mut context = builder.build_cartesian_2d(x_range, self.y_axis.range)?;

        if DRAW_TEXT {
            let y_label_formatter = |v: &f64| match y_kind {
                YAxisKind::Log => format!("1e{}", v.log10().round()),
                YAxisKind::Linear {
                    scientific_notation: true,
                } => format!("{:e}", v),
                YAxisKind::Linear {
                    scientific_notation: false,
                } => format!("{}", v),
            };

            context
                .configure_mesh()
                // Hide the fine mesh lines
                .light_line_style(&colors::WHITE)
                .x_labels(8)
                .x_label_formatter(&|v: &usize| format!("{}", v))
                .x_label_style((FONT, 22))
                .x_desc("Function Evaluations")
                .y_labels(y_num_labels)
                .y_label_formatter(&y_label_formatter)
                .y_label_style((FONT, 22))
                .axis_desc_style((FONT, 22))
                .draw()?;
        }

        (self.draw)(&mut context)?;

        if let (true, Some(position)) = (DRAW_TEXT, self.legend_position) {
            context
                .configure_series_labels()
                .label_font((FONT, 20))
                .border_style(&colors::BLACK)
                .position(position)
                .draw()?;
        }

        Ok(())
    }
}

/// Adds the series to the legend with the provided label and color
fn add_to_legend<C: Color + 'static>(annotation: &mut SeriesAnno<Backend>, label: &str, color: C) {
    annotation
        .label(label)
        .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &color));
}

/// Returns an iterator of (x, y) points with non-finite y points filtered out
fn get_points<'a, X, Y>(x: X, y: Y) -> impl Iterator<Item = (usize, f64)> + 'a
where
    X: IntoIterator<Item = usize> + 'a,
    Y: IntoIterator<Item = f64> + 'a,
{
    x.into_iter().zip(y).filter(|&(_, y)| y.is_finite())
}

/// Returns the smallest and largest finite values of the iterator
fn finite_range<I: Iterator<Item = f64>>(iter: I) -> Option<(f64, f64)> {
    let finite = iter.filter(|y| y.is_finite()).collect::<Vec<_>>();
    let min = finite.iter().cloned().min_by(|a, b| partial_cmp(*a, *b))?;
    let max = finite.iter().cloned().max_by(|a, b| partial_cmp(*a, *b))?;
    Some((min, max))
}

/// Returns a log axis encompassing all positive values in the iterator. The range has a small
/// margin added to either end.
fn get_log_y_axis<I: Iterator<Item = f64>>(iter: I) -> YAxis<LogCoord<f64>> {
    // Margin to be added to the top and bottom of the range
    let margin = 0.4;
    let (min, max) = finite_range(iter.filter(|y| *y > 0.0)).unwrap_or((1.0, 1.0));
    let log_min = min.log10() - margin;
    let log_max = max.log10() + margin;

    let num_labels = ((log_max - log_min).round() as usize).clamp(1, 26);
    let y_range: LogCoord<f64> = (10f64.powf(log_min)..10f64.powf(log_max))
        .log_scale()
        .into();

    YAxis::new(y_range, num_labels, YAxisKind::Log)
}

/// Returns a linear axis encompassing all finite values in the iterator. The range has a small
/// margin added to either end.
///
/// Uses scientific notation for axis labels if `scientific_notation` is true
fn get_linear_y_axis<I: Iterator<Item = f64>>(
    iter: I,
    scientific_notation: bool,
) -> YAxis<Range<f64>> {
    let (mut min, mut max) = finite_range(iter).unwrap_or((0.0, 0.0));
    let mut margin = (max - min) * 0.15;

    if margin == 0.0 {
        if max == 0.0 {
            margin = 0.15;
        } else {
            margin = max.abs() * 0.15;
        }
    }

    min -= margin;
    max += margin;

    YAxis::new(
        min..max,
        26,
        YAxisKind::Linear {
            scientific_notation,
        },
    )
}
