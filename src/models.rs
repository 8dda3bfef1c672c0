use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::indicators::Block;

/// One `(date, value)` observation.
///
/// Dates stay in the provider's textual form (`YYYY-MM-DD` or `YYYY-MM`) so a
/// malformed date degrades a single lookup instead of rejecting the series.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct DataPoint {
    pub date: String,
    pub value: f64,
}

impl DataPoint {
    pub fn new(date: impl Into<String>, value: f64) -> Self {
        Self { date: date.into(), value }
    }

    /// Calendar date of this point, `None` when the text is not a date.
    pub fn parsed_date(&self) -> Option<NaiveDate> {
        parse_date(&self.date)
    }
}

/// Raw provider history, ascending by date with no duplicate dates.
pub type ObservationSeries = Vec<DataPoint>;

/// Output of a series transform; same ordering guarantees as the input.
pub type DerivedSeries = Vec<DataPoint>;

/// Latest readings keyed by indicator key. Missing keys and non-finite values
/// both mean "no current reading".
pub type IndicatorValues = HashMap<String, f64>;

/// Accepts `YYYY-MM-DD` and `YYYY-MM` (first of month).
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .or_else(|| NaiveDate::parse_from_str(&format!("{}-01", text), "%Y-%m-%d").ok())
}

/// Finite reading for `key`, or `None`.
pub fn reading(values: &IndicatorValues, key: &str) -> Option<f64> {
    values.get(key).copied().filter(|v| v.is_finite())
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ObservedValue {
    pub key: String,
    pub value: Option<f64>,
    pub as_of: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
pub struct BlockScore {
    pub score: Option<f64>,
    pub total_weight: f64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CompositeResult {
    pub score: Option<f64>,
    pub macro_block: BlockScore,
    pub valuation_block: BlockScore,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Contribution {
    pub key: String,
    pub label: String,
    pub block: Block,
    pub tier: Option<u8>,
    pub stress: f64,
    pub points: f64,
    pub share_pct: f64,
}

/// Percentage change of the latest value against 3, 6 and 12 months earlier.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct ChangePct {
    pub m3: Option<f64>,
    pub m6: Option<f64>,
    pub m12: Option<f64>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct HistoryStats {
    pub current: f64,
    pub change_pct: ChangePct,
}
