//! Data module - CSV loading, incentive classification and aggregation

mod incentive;
mod loader;
mod processor;

pub use incentive::{derive_incentive_column, ClassifyError, FlagPolicy, IncentiveType};
pub use loader::DataLoader;
pub use processor::{
    AgeGroup, DataProcessor, RegionalSpend, SeasonalCount, SEASON_ORDER,
};

/// Column names of the shopping behavior dataset.
pub mod columns {
    pub const DISCOUNT_APPLIED: &str = "Discount Applied";
    pub const PROMO_CODE_USED: &str = "Promo Code Used";
    pub const PURCHASE_AMOUNT: &str = "Purchase Amount (USD)";
    pub const CATEGORY: &str = "Category";
    pub const SEASON: &str = "Season";
    pub const LOCATION: &str = "Location";
    pub const GENDER: &str = "Gender";
    pub const AGE: &str = "Age";

    /// Derived column appended by the incentive classifier.
    pub const INCENTIVE_TYPE: &str = "Incentive Type";
}
