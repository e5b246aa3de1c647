//! Run configuration shared by the pipelines.

use crate::data::FlagPolicy;
use std::path::{Path, PathBuf};

/// Dataset read when no input is given.
pub const DEFAULT_INPUT: &str = "shopping_behavior_updated.csv";
/// Location charted by the regional pipeline when none is given.
pub const DEFAULT_LOCATION: &str = "Massachusetts";

pub const SEASONAL_OUTPUT: &str = "seasonal_category_popularity.html";
pub const REGIONAL_OUTPUT: &str = "regional_spend_by_gender.html";

/// Pixel size of the box plot window and PNG export.
pub const BOXPLOT_SIZE: (u32, u32) = (800, 600);

/// Settings for one run.
#[derive(Debug, Clone)]
pub struct Settings {
    pub input: PathBuf,
    pub output_dir: PathBuf,
    pub flag_policy: FlagPolicy,
    /// Where to save a PNG rendering of the box plot, if anywhere.
    pub boxplot_png: Option<PathBuf>,
    pub show_window: bool,
    pub open_browser: bool,
    pub location: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            input: PathBuf::from(DEFAULT_INPUT),
            output_dir: PathBuf::from("."),
            flag_policy: FlagPolicy::default(),
            boxplot_png: None,
            show_window: true,
            open_browser: true,
            location: DEFAULT_LOCATION.to_string(),
        }
    }
}

impl Settings {
    /// Path of an output file inside the output directory.
    pub fn output_path(&self, file_name: &str) -> PathBuf {
        self.output_dir.join(file_name)
    }

    pub fn input(&self) -> &Path {
        &self.input
    }
}
