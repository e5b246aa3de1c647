//! Static Chart Renderer
//! Renders the incentive box plot to a PNG file with plotters.
//!
//! Layout matches the interactive window: bold title on top, one filled box
//! per incentive category with whiskers at 1.5 IQR and hollow outlier markers.

use crate::charts::{
    palette_color, RenderError, BOXPLOT_TITLE, BOXPLOT_X_LABEL, BOXPLOT_Y_LABEL,
};
use crate::stats::IncentiveStats;
use plotters::prelude::*;
use std::path::Path;
use tracing::info;

/// Box width in category units.
const BOX_WIDTH: f64 = 0.5;
/// Whisker cap width in category units.
const CAP_WIDTH: f64 = 0.25;

fn plot_err<E: std::fmt::Display>(e: E) -> RenderError {
    RenderError::Plot(e.to_string())
}

pub struct BoxPlotRenderer;

impl BoxPlotRenderer {
    /// Y axis range covering every group with 5% padding.
    pub fn get_y_range(stats: &IncentiveStats) -> (f64, f64) {
        match stats.value_range() {
            None => (0.0, 100.0),
            Some((min, max)) if max <= min => (min - 1.0, max + 1.0),
            Some((min, max)) => {
                let pad = (max - min) * 0.05;
                (min - pad, max + pad)
            }
        }
    }

    /// Render the box plot as a PNG image at `path`.
    pub fn render_png(
        stats: &IncentiveStats,
        path: &Path,
        width: u32,
        height: u32,
    ) -> Result<(), RenderError> {
        if stats.groups.iter().all(|g| g.box_stats.is_none()) {
            return Err(RenderError::NoData);
        }

        let root = BitMapBackend::new(path, (width, height)).into_drawing_area();
        root.fill(&WHITE).map_err(plot_err)?;

        let labels: Vec<&str> = stats.groups.iter().map(|g| g.incentive.label()).collect();
        let n = labels.len();
        let (y_min, y_max) = Self::get_y_range(stats);

        let mut chart = ChartBuilder::on(&root)
            .caption(
                BOXPLOT_TITLE,
                ("sans-serif", 22).into_font().style(FontStyle::Bold),
            )
            .margin(15)
            .x_label_area_size(45)
            .y_label_area_size(60)
            .build_cartesian_2d(-0.5f64..(n as f64 - 0.5), y_min..y_max)
            .map_err(plot_err)?;

        let x_formatter = |x: &f64| {
            let idx = x.round();
            if (x - idx).abs() > 1e-6 || idx < 0.0 {
                return String::new();
            }
            labels
                .get(idx as usize)
                .map(|s| s.to_string())
                .unwrap_or_default()
        };

        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(n)
            .x_label_formatter(&x_formatter)
            .x_desc(BOXPLOT_X_LABEL)
            .y_desc(BOXPLOT_Y_LABEL)
            .axis_desc_style(("sans-serif", 16))
            .draw()
            .map_err(plot_err)?;

        for (i, group) in stats.groups.iter().enumerate() {
            let Some(b) = &group.box_stats else {
                continue;
            };
            let (r, g, bl) = palette_color(i);
            let color = RGBColor(r, g, bl);
            let x = i as f64;
            let half = BOX_WIDTH / 2.0;
            let cap = CAP_WIDTH / 2.0;

            // Box
            chart
                .draw_series(std::iter::once(Rectangle::new(
                    [(x - half, b.q1), (x + half, b.q3)],
                    color.mix(0.5).filled(),
                )))
                .map_err(plot_err)?;
            chart
                .draw_series(std::iter::once(Rectangle::new(
                    [(x - half, b.q1), (x + half, b.q3)],
                    BLACK.stroke_width(1),
                )))
                .map_err(plot_err)?;

            // Median, whiskers and caps
            let segments = [
                vec![(x - half, b.median), (x + half, b.median)],
                vec![(x, b.q3), (x, b.whisker_high)],
                vec![(x, b.q1), (x, b.whisker_low)],
                vec![(x - cap, b.whisker_high), (x + cap, b.whisker_high)],
                vec![(x - cap, b.whisker_low), (x + cap, b.whisker_low)],
            ];
            chart
                .draw_series(
                    segments
                        .into_iter()
                        .map(|points| PathElement::new(points, BLACK.stroke_width(2))),
                )
                .map_err(plot_err)?;

            chart
                .draw_series(
                    b.outliers
                        .iter()
                        .map(|&v| Circle::new((x, v), 3, BLACK.stroke_width(1))),
                )
                .map_err(plot_err)?;
        }

        root.present().map_err(plot_err)?;
        info!(path = %path.display(), "saved box plot image");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::IncentiveType;
    use crate::stats::StatsCalculator;

    fn stats_from(groups: Vec<(IncentiveType, Vec<f64>)>) -> IncentiveStats {
        StatsCalculator::compute_incentive_stats(groups, IncentiveType::UsedNeither)
    }

    #[test]
    fn y_range_pads_data_extent() {
        let stats = stats_from(vec![
            (IncentiveType::UsedBoth, vec![20.0, 60.0]),
            (IncentiveType::UsedNeither, vec![40.0, 120.0]),
        ]);
        assert_eq!(BoxPlotRenderer::get_y_range(&stats), (15.0, 125.0));
    }

    #[test]
    fn y_range_of_constant_data_is_widened() {
        let stats = stats_from(vec![(IncentiveType::UsedNeither, vec![50.0, 50.0])]);
        assert_eq!(BoxPlotRenderer::get_y_range(&stats), (49.0, 51.0));
    }

    #[test]
    fn renders_png_for_all_categories() {
        let stats = stats_from(vec![
            (IncentiveType::UsedBoth, vec![53.0, 49.0, 61.0, 70.0]),
            (IncentiveType::UsedDiscountOnly, vec![64.0, 80.0, 22.0]),
            (IncentiveType::UsedPromoOnly, vec![73.0, 90.0]),
            (IncentiveType::UsedNeither, vec![20.0, 85.0, 40.0, 41.0, 39.0, 400.0]),
        ]);
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("incentives.png");

        BoxPlotRenderer::render_png(&stats, &target, 800, 600).unwrap();

        let metadata = std::fs::metadata(&target).unwrap();
        assert!(metadata.is_file());
        assert!(metadata.len() > 0);
    }

    #[test]
    fn empty_stats_are_not_rendered() {
        let stats = stats_from(vec![(IncentiveType::UsedNeither, vec![])]);
        assert_eq!(BoxPlotRenderer::get_y_range(&stats), (0.0, 100.0));

        let dir = tempfile::tempdir().unwrap();
        let result = BoxPlotRenderer::render_png(&stats, &dir.path().join("box.png"), 800, 600);
        assert!(matches!(result, Err(RenderError::NoData)));
    }
}
