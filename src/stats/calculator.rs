//! Statistics Calculator Module
//! Box plot summaries per incentive category and Welch's t-test against the
//! control category.

use crate::data::IncentiveType;
use rayon::prelude::*;
use statrs::distribution::{ContinuousCDF, StudentsT};
use statrs::statistics::Statistics;
use tracing::debug;

/// Significance threshold for t-test
pub const SIGNIFICANCE_THRESHOLD: f64 = 0.05;

/// Whiskers reach the furthest point within this many IQRs of the box.
pub const WHISKER_IQR_FACTOR: f64 = 1.5;

/// Five-number summary plus outliers, as drawn by a box plot.
#[derive(Debug, Clone, PartialEq)]
pub struct BoxStats {
    pub count: usize,
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub max: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub whisker_low: f64,
    pub whisker_high: f64,
    pub outliers: Vec<f64>,
}

impl BoxStats {
    pub fn iqr(&self) -> f64 {
        self.q3 - self.q1
    }
}

/// Statistics for one incentive category.
#[derive(Debug, Clone)]
pub struct GroupStats {
    pub incentive: IncentiveType,
    pub values: Vec<f64>,
    pub box_stats: Option<BoxStats>,
    pub mean_diff_from_control: Option<f64>,
    pub p_value: Option<f64>,
    pub is_significant: bool,
}

/// Statistics for all incentive categories, in chart order.
#[derive(Debug, Clone)]
pub struct IncentiveStats {
    pub control: IncentiveType,
    pub groups: Vec<GroupStats>,
}

impl IncentiveStats {
    pub fn get(&self, incentive: IncentiveType) -> Option<&GroupStats> {
        self.groups.iter().find(|g| g.incentive == incentive)
    }

    /// Check if any non-control group differs significantly from control.
    pub fn has_significant_results(&self) -> bool {
        self.groups
            .iter()
            .any(|g| g.incentive != self.control && g.is_significant)
    }

    /// Lowest and highest value across all groups, if any group has data.
    pub fn value_range(&self) -> Option<(f64, f64)> {
        self.groups
            .iter()
            .filter_map(|g| g.box_stats.as_ref())
            .map(|b| (b.min, b.max))
            .reduce(|(lo, hi), (min, max)| (lo.min(min), hi.max(max)))
    }
}

/// Handles statistical calculations with multi-threading support.
pub struct StatsCalculator;

impl StatsCalculator {
    /// Compute the box plot summary of a sample. Returns `None` for an empty sample.
    pub fn box_stats(values: &[f64]) -> Option<BoxStats> {
        let n = values.len();
        if n == 0 {
            return None;
        }

        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        let q1 = Self::percentile(&sorted, 25.0);
        let median = Self::percentile(&sorted, 50.0);
        let q3 = Self::percentile(&sorted, 75.0);
        let iqr = q3 - q1;
        let low_fence = q1 - WHISKER_IQR_FACTOR * iqr;
        let high_fence = q3 + WHISKER_IQR_FACTOR * iqr;

        let whisker_low = sorted
            .iter()
            .copied()
            .find(|&v| v >= low_fence)
            .unwrap_or(q1);
        let whisker_high = sorted
            .iter()
            .rev()
            .copied()
            .find(|&v| v <= high_fence)
            .unwrap_or(q3);
        let outliers = sorted
            .iter()
            .copied()
            .filter(|&v| v < whisker_low || v > whisker_high)
            .collect();

        let std = if n > 1 { values.iter().std_dev() } else { 0.0 };

        Some(BoxStats {
            count: n,
            mean: values.iter().mean(),
            std,
            min: sorted[0],
            max: sorted[n - 1],
            q1,
            median,
            q3,
            whisker_low,
            whisker_high,
            outliers,
        })
    }

    /// Calculate percentile using linear interpolation (NumPy compatible).
    fn percentile(sorted_values: &[f64], p: f64) -> f64 {
        let n = sorted_values.len();
        if n == 0 {
            return f64::NAN;
        }
        if n == 1 {
            return sorted_values[0];
        }

        let rank = (p / 100.0) * (n - 1) as f64;
        let lower = rank.floor() as usize;
        let upper = (rank.ceil() as usize).min(n - 1);
        let frac = rank - lower as f64;

        if lower == upper {
            sorted_values[lower]
        } else {
            sorted_values[lower] * (1.0 - frac) + sorted_values[upper] * frac
        }
    }

    /// Two-tailed p-value of Welch's t-test (independent samples, unequal variance).
    ///
    /// Returns `None` when either sample has fewer than two values.
    pub fn welch_p_value(group_values: &[f64], control_values: &[f64]) -> Option<f64> {
        let n1 = group_values.len() as f64;
        let n2 = control_values.len() as f64;

        if n1 < 2.0 || n2 < 2.0 {
            return None;
        }

        let mean1 = group_values.iter().mean();
        let mean2 = control_values.iter().mean();
        let var1 = group_values.iter().variance();
        let var2 = control_values.iter().variance();

        let se = (var1 / n1 + var2 / n2).sqrt();
        if se == 0.0 {
            // Both samples constant: identical means or a certain difference.
            return Some(if mean1 == mean2 { 1.0 } else { 0.0 });
        }

        let t = (mean1 - mean2) / se;

        // Welch-Satterthwaite degrees of freedom
        let df_num = (var1 / n1 + var2 / n2).powi(2);
        let df_denom = (var1 / n1).powi(2) / (n1 - 1.0) + (var2 / n2).powi(2) / (n2 - 1.0);
        let df = df_num / df_denom;

        StudentsT::new(0.0, 1.0, df)
            .ok()
            .map(|dist| 2.0 * (1.0 - dist.cdf(t.abs())))
    }

    /// Compute statistics for every category in parallel, comparing each to `control`.
    pub fn compute_incentive_stats(
        groups: Vec<(IncentiveType, Vec<f64>)>,
        control: IncentiveType,
    ) -> IncentiveStats {
        let control_values: Vec<f64> = groups
            .iter()
            .find(|(incentive, _)| *incentive == control)
            .map(|(_, values)| values.clone())
            .unwrap_or_default();
        let control_mean = Self::box_stats(&control_values).map(|b| b.mean);

        let groups = groups
            .into_par_iter()
            .map(|(incentive, values)| {
                let box_stats = Self::box_stats(&values);
                let mut gs = GroupStats {
                    incentive,
                    values,
                    box_stats,
                    mean_diff_from_control: None,
                    p_value: None,
                    is_significant: false,
                };

                if incentive != control {
                    if let (Some(b), Some(cm)) = (&gs.box_stats, control_mean) {
                        gs.mean_diff_from_control = Some(b.mean - cm);
                    }
                    gs.p_value = Self::welch_p_value(&gs.values, &control_values);
                    gs.is_significant = gs
                        .p_value
                        .is_some_and(|p| p <= SIGNIFICANCE_THRESHOLD);
                }

                debug!(
                    category = %incentive,
                    count = gs.values.len(),
                    p_value = ?gs.p_value,
                    "computed group statistics"
                );
                gs
            })
            .collect();

        IncentiveStats { control, groups }
    }
}
