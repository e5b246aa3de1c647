//! Charts module - Chart rendering

mod html;
mod plotter;
mod renderer;

pub use html::{HtmlChartWriter, SEASONAL_TITLE};
pub use plotter::ChartPlotter;
pub use renderer::BoxPlotRenderer;

use thiserror::Error;

/// Title of the incentive box plot.
pub const BOXPLOT_TITLE: &str = "Effect of Incentives on Purchase Amount";
pub const BOXPLOT_X_LABEL: &str = "Incentive Type";
pub const BOXPLOT_Y_LABEL: &str = "Purchase Amount (USD)";

/// Box fill colors, one per incentive category in chart order.
pub const PALETTE: [(u8, u8, u8); 4] = [
    (52, 152, 219),  // Blue
    (231, 76, 60),   // Red
    (46, 204, 113),  // Green
    (155, 89, 182),  // Purple
];

pub fn palette_color(index: usize) -> (u8, u8, u8) {
    PALETTE[index % PALETTE.len()]
}

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Plot error: {0}")]
    Plot(String),
    #[error("Nothing to plot")]
    NoData,
}
