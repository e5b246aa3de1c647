//! Chart Plotter Module
//! Draws the interactive incentive box plot using egui_plot.

use crate::charts::{palette_color, BOXPLOT_X_LABEL, BOXPLOT_Y_LABEL};
use crate::stats::IncentiveStats;
use egui::{Color32, RichText};
use egui_plot::{BoxElem, BoxPlot, BoxSpread, GridMark, Legend, Plot, Points};

/// Text color for categories that differ significantly from the control.
const SIGNIFICANT_COLOR: Color32 = Color32::from_rgb(220, 53, 69);

/// Draws incentive charts into an egui UI.
pub struct ChartPlotter;

impl ChartPlotter {
    /// Get color for a category by its chart position.
    pub fn get_group_color(index: usize) -> Color32 {
        let (r, g, b) = palette_color(index);
        Color32::from_rgb(r, g, b)
    }

    /// Label for an x axis position, or empty between categories.
    pub fn x_label(labels: &[String], value: f64) -> String {
        let idx = value.round();
        if (value - idx).abs() > 1e-6 || idx < 0.0 {
            return String::new();
        }
        labels.get(idx as usize).cloned().unwrap_or_default()
    }

    /// Draw box plot of purchase amounts per incentive category.
    /// X-axis: categories, Y-axis: purchase amount
    pub fn draw_boxplot_chart(ui: &mut egui::Ui, stats: &IncentiveStats, height: f32) {
        let x_labels: Vec<String> = stats
            .groups
            .iter()
            .map(|g| g.incentive.label().to_string())
            .collect();
        let n = x_labels.len();

        Plot::new("incentive_boxplot")
            .height(height)
            .legend(Legend::default())
            .allow_scroll(false)
            .x_axis_label(BOXPLOT_X_LABEL)
            .y_axis_label(BOXPLOT_Y_LABEL)
            .include_x(-0.5)
            .include_x(n as f64 - 0.5)
            .x_grid_spacer(move |_input| {
                (0..n)
                    .map(|i| GridMark {
                        value: i as f64,
                        step_size: 1.0,
                    })
                    .collect()
            })
            .x_axis_formatter(move |mark, _range| Self::x_label(&x_labels, mark.value))
            .show(ui, |plot_ui| {
                for (i, group) in stats.groups.iter().enumerate() {
                    let Some(b) = &group.box_stats else {
                        continue;
                    };
                    let color = Self::get_group_color(i);
                    let name = group.incentive.label();

                    let box_elem = BoxElem::new(
                        i as f64,
                        BoxSpread::new(b.whisker_low, b.q1, b.median, b.q3, b.whisker_high),
                    )
                    .name(name)
                    .box_width(0.5)
                    .whisker_width(0.25)
                    .fill(color.gamma_multiply(0.5))
                    .stroke(egui::Stroke::new(1.5, color));

                    plot_ui.box_plot(BoxPlot::new(vec![box_elem]).name(name));

                    if !b.outliers.is_empty() {
                        let fliers: Vec<[f64; 2]> =
                            b.outliers.iter().map(|&v| [i as f64, v]).collect();
                        plot_ui.points(
                            Points::new(fliers)
                                .radius(3.0)
                                .filled(false)
                                .color(color)
                                .name(format!("{} outliers", name)),
                        );
                    }
                }
            });
    }

    /// Draw statistics table
    pub fn draw_stats_table(ui: &mut egui::Ui, stats: &IncentiveStats) {
        egui::Frame::none()
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .rounding(5.0)
            .inner_margin(8.0)
            .show(ui, |ui| {
                egui::Grid::new("incentive_stats_table")
                    .striped(true)
                    .min_col_width(55.0)
                    .spacing([8.0, 4.0])
                    .show(ui, |ui| {
                        // Headers
                        for header in ["Incentive Type", "N", "Mean", "Median", "Std", "Δ Mean", "P-value"] {
                            ui.label(RichText::new(header).strong().size(11.0));
                        }
                        ui.end_row();

                        let default_text_color = ui.visuals().text_color();

                        for (i, gs) in stats.groups.iter().enumerate() {
                            let name_color = if gs.is_significant {
                                SIGNIFICANT_COLOR
                            } else {
                                Self::get_group_color(i)
                            };
                            ui.label(
                                RichText::new(gs.incentive.label())
                                    .size(11.0)
                                    .color(name_color),
                            );

                            match &gs.box_stats {
                                Some(b) => {
                                    ui.label(RichText::new(b.count.to_string()).size(11.0));
                                    ui.label(RichText::new(format!("{:.2}", b.mean)).size(11.0));
                                    ui.label(RichText::new(format!("{:.2}", b.median)).size(11.0));
                                    ui.label(RichText::new(format!("{:.2}", b.std)).size(11.0));
                                }
                                None => {
                                    ui.label(RichText::new("0").size(11.0));
                                    for _ in 0..3 {
                                        ui.label(RichText::new("-").size(11.0));
                                    }
                                }
                            }

                            if let Some(diff) = gs.mean_diff_from_control {
                                ui.label(RichText::new(format!("{:+.2}", diff)).size(11.0));
                            } else {
                                ui.label(RichText::new("-").size(11.0));
                            }

                            if let Some(p) = gs.p_value {
                                let p_color = if gs.is_significant {
                                    SIGNIFICANT_COLOR
                                } else {
                                    default_text_color
                                };
                                ui.label(
                                    RichText::new(format!("{:.4}", p))
                                        .size(11.0)
                                        .color(p_color),
                                );
                            } else {
                                ui.label(RichText::new("-").size(11.0));
                            }
                            ui.end_row();
                        }
                    });
            });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn x_labels_only_at_category_positions() {
        let labels = vec!["Used Both".to_string(), "Used Neither".to_string()];
        assert_eq!(ChartPlotter::x_label(&labels, 0.0), "Used Both");
        assert_eq!(ChartPlotter::x_label(&labels, 1.0), "Used Neither");
        assert_eq!(ChartPlotter::x_label(&labels, 0.5), "");
        assert_eq!(ChartPlotter::x_label(&labels, 2.0), "");
        assert_eq!(ChartPlotter::x_label(&labels, -1.0), "");
    }

    #[test]
    fn group_colors_cycle_through_palette() {
        assert_eq!(ChartPlotter::get_group_color(0), Color32::from_rgb(52, 152, 219));
        assert_eq!(ChartPlotter::get_group_color(4), ChartPlotter::get_group_color(0));
    }
}
