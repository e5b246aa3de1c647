//! GUI module - Interactive box plot window

mod app;

pub use app::run_incentive_viewer;
