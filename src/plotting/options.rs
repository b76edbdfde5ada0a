//! Configuration of plot generation

/// Configuration of the plot.
#[derive(Clone, Debug, Default)]
pub struct PlotOptions {
    /// Whether to use scientific notation for the labels of the objective value axis.
    pub scientific_notation: bool,
    /// Whether to draw the value of every evaluation, or only the running best.
    pub hide_values: bool,
}

impl PlotOptions {
    /// Creates a new `PlotOptions` with the provided values.
    pub fn new(scientific_notation: bool, hide_values: bool) -> Self {
        Self {
            scientific_notation,
            hide_values,
        }
    }
}
