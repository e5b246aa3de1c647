//! Shopping Insights - Shopping Behavior Analysis & Chart Viewer
//!
//! Reads the shopping behavior dataset and renders exploratory charts:
//! purchase amounts per incentive usage category, purchase counts per season
//! and product category, and spend per gender and age group in one location.

mod charts;
mod config;
mod data;
mod gui;
mod pipeline;
mod stats;

use clap::{Parser, Subcommand};
use config::{Settings, DEFAULT_INPUT, DEFAULT_LOCATION};
use data::FlagPolicy;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "shopping-insights")]
#[command(version)]
#[command(about = "Exploratory charts for the shopping behavior dataset")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Dataset to read
    #[arg(long, short, global = true, env = "SHOPPING_DATA", default_value = DEFAULT_INPUT)]
    input: PathBuf,

    /// Directory for generated HTML charts
    #[arg(long, global = true, default_value = ".")]
    output_dir: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Box plot of purchase amount per incentive usage category
    Incentives {
        /// Fail on discount/promo flags other than "Yes" or "No"
        #[arg(long)]
        strict_flags: bool,

        /// Also save the box plot as a PNG image
        #[arg(long)]
        save: Option<PathBuf>,

        /// Do not open the interactive window
        #[arg(long)]
        no_window: bool,
    },

    /// Stacked bar chart of purchases per season and product category
    Seasons {
        /// Write the chart without opening a browser
        #[arg(long)]
        no_open: bool,
    },

    /// Stacked bar chart of spend per gender and age group for one location
    Regional {
        /// Location to chart
        #[arg(long, default_value = DEFAULT_LOCATION)]
        location: String,

        /// Write the chart without opening a browser
        #[arg(long)]
        no_open: bool,
    },
}

impl Cli {
    fn settings(&self) -> Settings {
        let mut settings = Settings {
            input: self.input.clone(),
            output_dir: self.output_dir.clone(),
            ..Settings::default()
        };

        match &self.command {
            Commands::Incentives {
                strict_flags,
                save,
                no_window,
            } => {
                if *strict_flags {
                    settings.flag_policy = FlagPolicy::Strict;
                }
                settings.boxplot_png = save.clone();
                settings.show_window = !no_window;
            }
            Commands::Seasons { no_open } => {
                settings.open_browser = !no_open;
            }
            Commands::Regional { location, no_open } => {
                settings.location = location.clone();
                settings.open_browser = !no_open;
            }
        }
        settings
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let settings = cli.settings();

    match cli.command {
        Commands::Incentives { .. } => pipeline::run_incentives(&settings),
        Commands::Seasons { .. } => pipeline::run_seasons(&settings).map(|_| ()),
        Commands::Regional { .. } => pipeline::run_regional(&settings).map(|_| ()),
    }
}
