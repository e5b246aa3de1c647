//! Incentive Box Plot Window
//! Shows the purchase amount box plot and the per-category statistics table.

use crate::charts::{ChartPlotter, BOXPLOT_TITLE};
use crate::config::BOXPLOT_SIZE;
use crate::stats::{IncentiveStats, SIGNIFICANCE_THRESHOLD};
use egui::RichText;
use tracing::info;

/// Space kept below the plot for the statistics table.
const TABLE_HEIGHT: f32 = 150.0;
const MIN_PLOT_HEIGHT: f32 = 200.0;

/// Main application window.
pub struct IncentiveApp {
    stats: IncentiveStats,
}

impl IncentiveApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, stats: IncentiveStats) -> Self {
        Self { stats }
    }
}

impl eframe::App for IncentiveApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                ui.label(RichText::new(BOXPLOT_TITLE).size(14.0).strong());
                if self.stats.has_significant_results() {
                    ui.label(
                        RichText::new(format!(
                            "⚠ Significant difference from \"{}\" (p ≤ {})",
                            self.stats.control, SIGNIFICANCE_THRESHOLD
                        ))
                        .size(11.0),
                    );
                }
            });
            ui.add_space(6.0);

            let plot_height = (ui.available_height() - TABLE_HEIGHT).max(MIN_PLOT_HEIGHT);
            ChartPlotter::draw_boxplot_chart(ui, &self.stats, plot_height);

            ui.add_space(8.0);
            ChartPlotter::draw_stats_table(ui, &self.stats);
        });
    }
}

/// Open the box plot window and block until it is closed.
pub fn run_incentive_viewer(stats: IncentiveStats) -> eframe::Result<()> {
    let (width, height) = BOXPLOT_SIZE;
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([width as f32, height as f32])
            .with_min_inner_size([600.0, 450.0])
            .with_title(BOXPLOT_TITLE),
        ..Default::default()
    };

    info!("opening box plot window");
    eframe::run_native(
        BOXPLOT_TITLE,
        options,
        Box::new(move |cc| Ok(Box::new(IncentiveApp::new(cc, stats)))),
    )
}
