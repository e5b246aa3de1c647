//! Incentive Classifier Module
//! Derives the incentive usage category of a purchase from its discount and
//! promo code flags.

use crate::data::columns;
use polars::prelude::*;
use std::fmt;
use thiserror::Error;
use tracing::{debug, warn};

/// Flag value that marks an incentive as used.
const FLAG_YES: &str = "Yes";
/// Flag value that marks an incentive as not used.
const FLAG_NO: &str = "No";

#[derive(Error, Debug)]
pub enum ClassifyError {
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
    #[error("Unexpected value {value:?} in column '{column}' at row {row} (expected \"Yes\" or \"No\")")]
    InvalidFlag {
        column: &'static str,
        row: usize,
        value: Option<String>,
    },
}

/// Which combination of discount and promo code applied to a purchase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum IncentiveType {
    UsedBoth,
    UsedDiscountOnly,
    UsedPromoOnly,
    UsedNeither,
}

impl IncentiveType {
    /// All categories in chart order.
    pub const ALL: [IncentiveType; 4] = [
        IncentiveType::UsedBoth,
        IncentiveType::UsedDiscountOnly,
        IncentiveType::UsedPromoOnly,
        IncentiveType::UsedNeither,
    ];

    pub fn label(self) -> &'static str {
        match self {
            IncentiveType::UsedBoth => "Used Both",
            IncentiveType::UsedDiscountOnly => "Used Discount Only",
            IncentiveType::UsedPromoOnly => "Used Promo Only",
            IncentiveType::UsedNeither => "Used Neither",
        }
    }
}

impl fmt::Display for IncentiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// How flag values other than "Yes"/"No" are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlagPolicy {
    /// Unexpected values count as "not used" and are reported as a warning.
    #[default]
    Lenient,
    /// Unexpected values abort classification.
    Strict,
}

/// Classify a purchase by its two incentive flags.
///
/// Only the exact value "Yes" counts as used; anything else falls through.
pub fn classify(discount: &str, promo: &str) -> IncentiveType {
    let discount = discount == FLAG_YES;
    let promo = promo == FLAG_YES;

    if discount && promo {
        IncentiveType::UsedBoth
    } else if discount {
        IncentiveType::UsedDiscountOnly
    } else if promo {
        IncentiveType::UsedPromoOnly
    } else {
        IncentiveType::UsedNeither
    }
}

fn is_known_flag(value: Option<&str>) -> bool {
    matches!(value, Some(FLAG_YES) | Some(FLAG_NO))
}

/// Classify every row of the DataFrame.
///
/// Returns the per-row categories and the number of flag values outside
/// "Yes"/"No" that lenient mode absorbed.
pub fn classify_rows(
    df: &DataFrame,
    policy: FlagPolicy,
) -> Result<(Vec<IncentiveType>, usize), ClassifyError> {
    let discount_col = df.column(columns::DISCOUNT_APPLIED)?.cast(&DataType::String)?;
    let promo_col = df.column(columns::PROMO_CODE_USED)?.cast(&DataType::String)?;
    let discount = discount_col.str()?;
    let promo = promo_col.str()?;

    let mut unexpected = 0usize;
    let mut labels = Vec::with_capacity(df.height());

    for (row, (d, p)) in discount.into_iter().zip(promo.into_iter()).enumerate() {
        for (column, value) in [
            (columns::DISCOUNT_APPLIED, d),
            (columns::PROMO_CODE_USED, p),
        ] {
            if is_known_flag(value) {
                continue;
            }
            match policy {
                FlagPolicy::Strict => {
                    return Err(ClassifyError::InvalidFlag {
                        column,
                        row,
                        value: value.map(str::to_string),
                    });
                }
                FlagPolicy::Lenient => {
                    debug!(row, column, ?value, "unexpected flag value");
                    unexpected += 1;
                }
            }
        }

        labels.push(classify(d.unwrap_or_default(), p.unwrap_or_default()));
    }

    if unexpected > 0 {
        warn!(
            count = unexpected,
            "flag values other than \"Yes\"/\"No\" were treated as not used"
        );
    }

    Ok((labels, unexpected))
}

/// Return a copy of the DataFrame with an "Incentive Type" column appended.
pub fn derive_incentive_column(
    df: &DataFrame,
    policy: FlagPolicy,
) -> Result<DataFrame, ClassifyError> {
    let (incentives, _) = classify_rows(df, policy)?;
    let labels: Vec<&str> = incentives
        .into_iter()
        .map(IncentiveType::label)
        .collect();

    let mut out = df.clone();
    out.with_column(Column::new(columns::INCENTIVE_TYPE.into(), labels))?;
    Ok(out)
}
