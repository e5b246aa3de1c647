//! Pipelines: load the dataset, transform it and render one chart.

use crate::charts::{BoxPlotRenderer, HtmlChartWriter, SEASONAL_TITLE};
use crate::config::{Settings, BOXPLOT_SIZE, REGIONAL_OUTPUT, SEASONAL_OUTPUT};
use crate::data::{columns, derive_incentive_column, DataLoader, DataProcessor, IncentiveType};
use crate::gui;
use crate::stats::{IncentiveStats, StatsCalculator};
use anyhow::{anyhow, Context, Result};
use polars::prelude::DataFrame;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

fn load(path: &Path, required: &[&str]) -> Result<DataFrame> {
    let mut loader = DataLoader::new();
    loader
        .load_with_columns(path, required)
        .with_context(|| format!("loading {}", path.display()))?;
    Ok(loader.into_dataframe()?)
}

/// Classify incentive usage and compute per-category purchase statistics.
pub fn incentive_stats(settings: &Settings) -> Result<IncentiveStats> {
    let df = load(
        settings.input(),
        &[
            columns::DISCOUNT_APPLIED,
            columns::PROMO_CODE_USED,
            columns::PURCHASE_AMOUNT,
        ],
    )?;

    let df = derive_incentive_column(&df, settings.flag_policy)
        .context("classifying incentive usage")?;
    let groups = DataProcessor::amounts_by_incentive(&df).context("grouping purchase amounts")?;

    for (incentive, amounts) in &groups {
        if amounts.is_empty() {
            warn!(category = %incentive, "no purchases in category, box omitted");
        }
    }

    let stats = StatsCalculator::compute_incentive_stats(groups, IncentiveType::UsedNeither);
    for gs in &stats.groups {
        if let Some(b) = &gs.box_stats {
            info!(
                category = %gs.incentive,
                n = b.count,
                median = b.median,
                iqr = b.iqr(),
                mean = b.mean,
                p_value = ?gs.p_value,
                "purchase amounts"
            );
        }
    }
    Ok(stats)
}

/// Box plot of purchase amount per incentive category.
pub fn run_incentives(settings: &Settings) -> Result<()> {
    let stats = incentive_stats(settings)?;

    if let Some(png) = &settings.boxplot_png {
        let (width, height) = BOXPLOT_SIZE;
        BoxPlotRenderer::render_png(&stats, png, width, height)
            .with_context(|| format!("rendering {}", png.display()))?;
        let saved = std::fs::canonicalize(png)
            .with_context(|| format!("resolving {}", png.display()))?;
        println!("Saved chart to: {}", saved.display());
    }

    if settings.show_window {
        gui::run_incentive_viewer(stats).map_err(|e| anyhow!("box plot window failed: {e}"))?;
    }
    Ok(())
}

fn publish(
    settings: &Settings,
    file_name: &str,
    title: &str,
    spec: &serde_json::Value,
) -> Result<PathBuf> {
    let html = HtmlChartWriter::page(title, spec)?;
    let target = settings.output_path(file_name);
    let saved = HtmlChartWriter::write(&target, &html)
        .with_context(|| format!("writing {}", target.display()))?;
    println!("Saved chart to: {}", saved.display());

    if settings.open_browser {
        HtmlChartWriter::open_in_browser(&saved)
            .with_context(|| format!("opening {} in browser", saved.display()))?;
    }
    Ok(saved)
}

/// Stacked bar chart of purchase counts per season and product category.
pub fn run_seasons(settings: &Settings) -> Result<PathBuf> {
    let df = load(settings.input(), &[columns::SEASON, columns::CATEGORY])?;
    let counts = DataProcessor::seasonal_counts(&df).context("counting seasonal purchases")?;

    let counted: u64 = counts.iter().map(|c| c.count).sum();
    info!(rows = df.height(), counted, "seasonal counts");

    let spec = HtmlChartWriter::seasonal_spec(&counts);
    publish(settings, SEASONAL_OUTPUT, SEASONAL_TITLE, &spec)
}

/// Stacked bar chart of spend per gender and age group for one location.
pub fn run_regional(settings: &Settings) -> Result<PathBuf> {
    let df = load(
        settings.input(),
        &[
            columns::LOCATION,
            columns::GENDER,
            columns::AGE,
            columns::PURCHASE_AMOUNT,
        ],
    )?;
    let spend = DataProcessor::regional_spend(&df, &settings.location)
        .context("aggregating regional spend")?;

    if spend.is_empty() {
        warn!(location = %settings.location, "no purchases for location, chart will be empty");
    }

    let spec = HtmlChartWriter::regional_spec(&spend, &settings.location);
    let title = format!("Purchases in {}", settings.location);
    publish(settings, REGIONAL_OUTPUT, &title, &spec)
}
