//! Charts module - figure model, chart builders and rendering

mod figure;
mod plotter;
mod renderer;

pub use figure::{Axes, Figure, Mark, Orientation, Rgb};
pub use plotter::{ChartError, ChartPlotter};
pub use renderer::StaticChartRenderer;
