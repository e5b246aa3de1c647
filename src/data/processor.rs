//! Data Processor Module
//! Groups purchases for charting: amounts per incentive category, purchase
//! counts per season and category, and spend per gender and age group.

use crate::data::columns;
use crate::data::IncentiveType;
use polars::prelude::*;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use thiserror::Error;
use tracing::{debug, info};

/// Calendar order used on the seasonal chart's x axis.
pub const SEASON_ORDER: [&str; 4] = ["Winter", "Spring", "Summer", "Fall"];

/// Label used for missing season or category values.
const UNKNOWN: &str = "Unknown";

#[derive(Error, Debug)]
pub enum ProcessorError {
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
}

/// Number of purchases of one category in one season.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeasonalCount {
    #[serde(rename = "Season")]
    pub season: String,
    #[serde(rename = "Category")]
    pub category: String,
    pub count: u64,
}

/// Ten-year customer age bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AgeGroup {
    UpTo10,
    From11To20,
    From21To30,
    From31To40,
    From41To50,
    From51To60,
    From61To70,
    Over70,
}

impl AgeGroup {
    pub const ALL: [AgeGroup; 8] = [
        AgeGroup::UpTo10,
        AgeGroup::From11To20,
        AgeGroup::From21To30,
        AgeGroup::From31To40,
        AgeGroup::From41To50,
        AgeGroup::From51To60,
        AgeGroup::From61To70,
        AgeGroup::Over70,
    ];

    /// Inclusive upper age bound of each bucket below "71+".
    const UPPER_BOUNDS: [(f64, AgeGroup); 7] = [
        (10.0, AgeGroup::UpTo10),
        (20.0, AgeGroup::From11To20),
        (30.0, AgeGroup::From21To30),
        (40.0, AgeGroup::From31To40),
        (50.0, AgeGroup::From41To50),
        (60.0, AgeGroup::From51To60),
        (70.0, AgeGroup::From61To70),
    ];

    /// First bucket whose upper bound is at least `age`, else "71+".
    pub fn from_age(age: f64) -> Self {
        Self::UPPER_BOUNDS
            .iter()
            .find(|(upper, _)| age <= *upper)
            .map(|(_, group)| *group)
            .unwrap_or(AgeGroup::Over70)
    }

    pub fn label(self) -> &'static str {
        match self {
            AgeGroup::UpTo10 => "0-10",
            AgeGroup::From11To20 => "11-20",
            AgeGroup::From21To30 => "21-30",
            AgeGroup::From31To40 => "31-40",
            AgeGroup::From41To50 => "41-50",
            AgeGroup::From51To60 => "51-60",
            AgeGroup::From61To70 => "61-70",
            AgeGroup::Over70 => "71+",
        }
    }
}

impl fmt::Display for AgeGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for AgeGroup {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

/// Total spend and purchase count of one gender within one age group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionalSpend {
    #[serde(rename = "Gender")]
    pub gender: String,
    #[serde(rename = "AgeGroup")]
    pub age_group: AgeGroup,
    #[serde(rename = "PurchaseAmount")]
    pub amount: f64,
    #[serde(rename = "Count")]
    pub count: u64,
}

/// Handles grouping and aggregation of purchase rows.
pub struct DataProcessor;

impl DataProcessor {
    /// Purchase amounts per incentive category, in chart order.
    ///
    /// Expects the "Incentive Type" column produced by the classifier.
    pub fn amounts_by_incentive(
        df: &DataFrame,
    ) -> Result<Vec<(IncentiveType, Vec<f64>)>, ProcessorError> {
        IncentiveType::ALL
            .iter()
            .map(|&incentive| -> Result<(IncentiveType, Vec<f64>), ProcessorError> {
                let filtered = df
                    .clone()
                    .lazy()
                    .filter(col(columns::INCENTIVE_TYPE).eq(lit(incentive.label())))
                    .select([col(columns::PURCHASE_AMOUNT).cast(DataType::Float64)])
                    .collect()?;

                let amounts: Vec<f64> = filtered
                    .column(columns::PURCHASE_AMOUNT)?
                    .f64()?
                    .into_iter()
                    .flatten()
                    .filter(|v| !v.is_nan())
                    .collect();

                debug!(category = %incentive, rows = amounts.len(), "grouped purchase amounts");
                Ok((incentive, amounts))
            })
            .collect()
    }

    /// Sort key placing known seasons in calendar order and others after them.
    pub fn season_rank(season: &str) -> usize {
        SEASON_ORDER
            .iter()
            .position(|s| *s == season)
            .unwrap_or(SEASON_ORDER.len())
    }

    /// Count purchases per (season, category).
    ///
    /// Missing values are counted under "Unknown" so the counts always sum
    /// to the number of input rows.
    pub fn seasonal_counts(df: &DataFrame) -> Result<Vec<SeasonalCount>, ProcessorError> {
        let season_col = df.column(columns::SEASON)?.cast(&DataType::String)?;
        let category_col = df.column(columns::CATEGORY)?.cast(&DataType::String)?;
        let seasons = season_col.str()?;
        let categories = category_col.str()?;

        let mut counts: HashMap<(&str, &str), u64> = HashMap::new();
        for (season, category) in seasons.into_iter().zip(categories.into_iter()) {
            let key = (season.unwrap_or(UNKNOWN), category.unwrap_or(UNKNOWN));
            *counts.entry(key).or_insert(0) += 1;
        }

        let mut result: Vec<SeasonalCount> = counts
            .into_iter()
            .map(|((season, category), count)| SeasonalCount {
                season: season.to_string(),
                category: category.to_string(),
                count,
            })
            .collect();

        result.sort_by(|a, b| {
            (Self::season_rank(&a.season), &a.season, &a.category).cmp(&(
                Self::season_rank(&b.season),
                &b.season,
                &b.category,
            ))
        });

        info!(groups = result.len(), "aggregated seasonal category counts");
        Ok(result)
    }

    /// Total purchase amount and count per (gender, age group) for one location.
    ///
    /// Rows missing gender, age or amount are skipped.
    pub fn regional_spend(
        df: &DataFrame,
        location: &str,
    ) -> Result<Vec<RegionalSpend>, ProcessorError> {
        let filtered = df
            .clone()
            .lazy()
            .filter(col(columns::LOCATION).eq(lit(location)))
            .select([
                col(columns::GENDER).cast(DataType::String),
                col(columns::AGE).cast(DataType::Float64),
                col(columns::PURCHASE_AMOUNT).cast(DataType::Float64),
            ])
            .collect()?;

        let genders = filtered.column(columns::GENDER)?.str()?;
        let ages = filtered.column(columns::AGE)?.f64()?;
        let amounts = filtered.column(columns::PURCHASE_AMOUNT)?.f64()?;

        let mut totals: BTreeMap<(String, AgeGroup), (f64, u64)> = BTreeMap::new();
        let mut skipped = 0usize;

        for ((gender, age), amount) in genders
            .into_iter()
            .zip(ages.into_iter())
            .zip(amounts.into_iter())
        {
            let (Some(gender), Some(age), Some(amount)) = (gender, age, amount) else {
                skipped += 1;
                continue;
            };
            let entry = totals
                .entry((gender.to_string(), AgeGroup::from_age(age)))
                .or_insert((0.0, 0));
            entry.0 += amount;
            entry.1 += 1;
        }

        if skipped > 0 {
            debug!(skipped, "rows with missing gender, age or amount");
        }
        info!(
            location,
            rows = filtered.height() - skipped,
            "aggregated regional spend"
        );

        Ok(totals
            .into_iter()
            .map(|((gender, age_group), (amount, count))| RegionalSpend {
                gender,
                age_group,
                amount,
                count,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{derive_incentive_column, FlagPolicy};

    fn shopping_frame() -> DataFrame {
        df!(
            columns::DISCOUNT_APPLIED => ["Yes", "Yes", "No", "No", "Yes", "No"],
            columns::PROMO_CODE_USED => ["Yes", "No", "Yes", "No", "Yes", "No"],
            columns::PURCHASE_AMOUNT => [53i64, 64, 73, 90, 49, 20],
            columns::CATEGORY => ["Clothing", "Footwear", "Clothing", "Accessories", "Clothing", "Outerwear"],
            columns::SEASON => ["Winter", "Fall", "Winter", "Summer", "Spring", "Fall"],
            columns::LOCATION => ["Massachusetts", "Massachusetts", "Kentucky", "Massachusetts", "Massachusetts", "Massachusetts"],
            columns::GENDER => ["Male", "Female", "Male", "Male", "Female", "Male"],
            columns::AGE => [55i64, 19, 50, 10, 71, 58]
        )
        .unwrap()
    }

    #[test]
    fn amounts_grouped_by_incentive_in_chart_order() {
        let df = derive_incentive_column(&shopping_frame(), FlagPolicy::Strict).unwrap();
        let groups = DataProcessor::amounts_by_incentive(&df).unwrap();

        let order: Vec<IncentiveType> = groups.iter().map(|(t, _)| *t).collect();
        assert_eq!(order, IncentiveType::ALL.to_vec());

        assert_eq!(groups[0].1, vec![53.0, 49.0]);
        assert_eq!(groups[1].1, vec![64.0]);
        assert_eq!(groups[2].1, vec![73.0]);
        assert_eq!(groups[3].1, vec![90.0, 20.0]);

        let total: usize = groups.iter().map(|(_, v)| v.len()).sum();
        assert_eq!(total, df.height());
    }

    #[test]
    fn seasonal_counts_cover_every_row() {
        let df = shopping_frame();
        let counts = DataProcessor::seasonal_counts(&df).unwrap();

        let total: u64 = counts.iter().map(|c| c.count).sum();
        assert_eq!(total as usize, df.height());

        let winter_clothing = counts
            .iter()
            .find(|c| c.season == "Winter" && c.category == "Clothing")
            .unwrap();
        assert_eq!(winter_clothing.count, 2);
    }

    #[test]
    fn seasonal_counts_follow_calendar_order() {
        let counts = DataProcessor::seasonal_counts(&shopping_frame()).unwrap();
        let keys: Vec<(&str, &str)> = counts
            .iter()
            .map(|c| (c.season.as_str(), c.category.as_str()))
            .collect();

        assert_eq!(
            keys,
            vec![
                ("Winter", "Clothing"),
                ("Spring", "Clothing"),
                ("Summer", "Accessories"),
                ("Fall", "Footwear"),
                ("Fall", "Outerwear"),
            ]
        );
    }

    #[test]
    fn seasonal_counts_are_repeatable() {
        let df = shopping_frame();
        let first = DataProcessor::seasonal_counts(&df).unwrap();
        let second = DataProcessor::seasonal_counts(&df).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn missing_season_counted_as_unknown() {
        let df = df!(
            columns::SEASON => [Some("Winter"), None, Some("Monsoon")],
            columns::CATEGORY => [Some("Clothing"), Some("Clothing"), Some("Clothing")]
        )
        .unwrap();

        let counts = DataProcessor::seasonal_counts(&df).unwrap();
        let seasons: Vec<&str> = counts.iter().map(|c| c.season.as_str()).collect();
        assert_eq!(seasons, vec!["Winter", "Monsoon", "Unknown"]);
        assert_eq!(counts.iter().map(|c| c.count).sum::<u64>(), 3);
    }

    #[test]
    fn unknown_seasons_rank_after_calendar() {
        assert_eq!(DataProcessor::season_rank("Winter"), 0);
        assert_eq!(DataProcessor::season_rank("Fall"), 3);
        assert_eq!(DataProcessor::season_rank("winter"), 4);
    }

    #[test]
    fn age_group_boundaries() {
        assert_eq!(AgeGroup::from_age(0.0), AgeGroup::UpTo10);
        assert_eq!(AgeGroup::from_age(10.0), AgeGroup::UpTo10);
        assert_eq!(AgeGroup::from_age(11.0), AgeGroup::From11To20);
        assert_eq!(AgeGroup::from_age(30.0), AgeGroup::From21To30);
        assert_eq!(AgeGroup::from_age(70.0), AgeGroup::From61To70);
        assert_eq!(AgeGroup::from_age(71.0), AgeGroup::Over70);
        assert_eq!(AgeGroup::Over70.label(), "71+");
    }

    #[test]
    fn fractional_ages_round_up_into_next_bucket() {
        assert_eq!(AgeGroup::from_age(10.5), AgeGroup::From11To20);
        assert_eq!(AgeGroup::from_age(70.1), AgeGroup::Over70);

        let df = df!(
            columns::LOCATION => ["Massachusetts", "Massachusetts"],
            columns::GENDER => ["Female", "Female"],
            columns::AGE => [10.5f64, 10.0],
            columns::PURCHASE_AMOUNT => [30i64, 12]
        )
        .unwrap();

        let spend = DataProcessor::regional_spend(&df, "Massachusetts").unwrap();
        let groups: Vec<(AgeGroup, f64)> = spend.iter().map(|s| (s.age_group, s.amount)).collect();
        assert_eq!(
            groups,
            vec![(AgeGroup::UpTo10, 12.0), (AgeGroup::From11To20, 30.0)]
        );
    }

    #[test]
    fn regional_spend_filters_location_and_buckets_ages() {
        let spend = DataProcessor::regional_spend(&shopping_frame(), "Massachusetts").unwrap();

        let total: f64 = spend.iter().map(|s| s.amount).sum();
        assert_eq!(total, 53.0 + 64.0 + 90.0 + 49.0 + 20.0);

        let male_51_60 = spend
            .iter()
            .find(|s| s.gender == "Male" && s.age_group == AgeGroup::From51To60)
            .unwrap();
        assert_eq!(male_51_60.amount, 73.0);
        assert_eq!(male_51_60.count, 2);

        let genders: Vec<&str> = spend.iter().map(|s| s.gender.as_str()).collect();
        assert_eq!(genders, vec!["Female", "Female", "Male", "Male"]);
    }

    #[test]
    fn regional_spend_for_unknown_location_is_empty() {
        let spend = DataProcessor::regional_spend(&shopping_frame(), "Atlantis").unwrap();
        assert!(spend.is_empty());
    }

    #[test]
    fn regional_spend_serializes_chart_fields() {
        let row = RegionalSpend {
            gender: "Female".to_string(),
            age_group: AgeGroup::From11To20,
            amount: 64.0,
            count: 1,
        };
        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json["Gender"], "Female");
        assert_eq!(json["AgeGroup"], "11-20");
        assert_eq!(json["PurchaseAmount"], 64.0);
        assert_eq!(json["Count"], 1);
    }
}
