//! Stats module - Box plot summaries and group comparisons

mod calculator;

pub use calculator::{IncentiveStats, StatsCalculator, SIGNIFICANCE_THRESHOLD};
