//! Data-quality view of a scoring run: how much of the catalog is populated,
//! how old the provider cache is, and the headline alert derived from both.

use serde::Serialize;

use crate::indicators::{Block, Catalog, SourceType};
use crate::models::{reading, IndicatorValues};

/// Cache older than this many days raises the stale flag on the alert.
pub const STALE_CACHE_DAYS: f64 = 10.0;
/// Coverage below this ratio marks the composite as tentative.
pub const MIN_COVERAGE: f64 = 0.8;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coverage {
    pub total: usize,
    pub used: usize,
    pub ratio: f64,
}

/// Counts catalog indicators with a finite reading in their own block's map.
pub fn coverage(catalog: &Catalog, macro_values: &IndicatorValues, valuation_values: &IndicatorValues) -> Coverage {
    let total = catalog.indicators.len();
    let used = catalog
        .indicators
        .iter()
        .filter(|spec| {
            let values = match spec.block {
                Block::Macro => macro_values,
                Block::Valuation => valuation_values,
            };
            reading(values, &spec.key).is_some()
        })
        .count();

    Coverage {
        total,
        used,
        ratio: if total == 0 { 0.0 } else { used as f64 / total as f64 },
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Freshness {
    Fresh,
    Ok,
    Stale,
    VeryStale,
    Unknown,
}

impl Freshness {
    pub fn from_age_days(age_days: Option<f64>) -> Self {
        match age_days.filter(|a| a.is_finite()) {
            None => Freshness::Unknown,
            Some(a) if a <= 3.0 => Freshness::Fresh,
            Some(a) if a <= 10.0 => Freshness::Ok,
            Some(a) if a <= 30.0 => Freshness::Stale,
            Some(_) => Freshness::VeryStale,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Freshness::Fresh => "Fresh",
            Freshness::Ok => "OK",
            Freshness::Stale => "Stale",
            Freshness::VeryStale => "Very stale",
            Freshness::Unknown => "Unknown",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertLevel {
    Normal,
    Warning,
    Critical,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Alert {
    /// `None` when there is no composite to grade.
    pub level: Option<AlertLevel>,
    pub stale_cache: bool,
    pub low_coverage: bool,
    pub message: String,
}

pub fn build_alert(composite: Option<f64>, coverage: &Coverage, cache_age_days: Option<f64>) -> Alert {
    let stale_cache = cache_age_days.is_some_and(|a| a.is_finite() && a > STALE_CACHE_DAYS);
    let low_coverage = coverage.ratio < MIN_COVERAGE;

    let mut prefix = String::new();
    if stale_cache {
        if let Some(age) = cache_age_days {
            prefix.push_str(&format!("Data warning: provider cache is {:.1} days old. ", age));
        }
    }

    let Some(score) = composite.filter(|c| c.is_finite()) else {
        return Alert {
            level: None,
            stale_cache,
            low_coverage,
            message: format!("{}No composite yet. Check the provider cache and manual inputs.", prefix),
        };
    };

    if low_coverage {
        prefix.push_str("Coverage below 80%. Treat composite as tentative. ");
    }

    let v = score.round();
    let (level, body) = if v >= 70.0 {
        (AlertLevel::Critical, format!("Critical: composite = {}. Macro and valuations in historical danger cluster.", v))
    } else if v >= 50.0 {
        (AlertLevel::Warning, format!("Warning: composite = {}. Elevated risk, inspect the indicators.", v))
    } else {
        (AlertLevel::Normal, format!("Composite = {}. No classic crash cluster on this configuration.", v))
    };

    Alert {
        level: Some(level),
        stale_cache,
        low_coverage,
        message: prefix + &body,
    }
}

/// Keys without a usable reading, grouped by where the reading should come from.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MissingInputs {
    pub provider: Vec<String>,
    pub manual: Vec<String>,
    pub valuation: Vec<String>,
}

impl MissingInputs {
    pub fn is_empty(&self) -> bool {
        self.provider.is_empty() && self.manual.is_empty() && self.valuation.is_empty()
    }
}

pub fn missing_inputs(
    catalog: &Catalog,
    macro_values: &IndicatorValues,
    valuation_values: &IndicatorValues,
) -> MissingInputs {
    let mut missing = MissingInputs::default();
    for spec in &catalog.indicators {
        let bucket = match (spec.block, &spec.source) {
            (Block::Valuation, _) => {
                if reading(valuation_values, &spec.key).is_some() {
                    continue;
                }
                &mut missing.valuation
            }
            (Block::Macro, SourceType::Fred { .. }) => {
                if reading(macro_values, &spec.key).is_some() {
                    continue;
                }
                &mut missing.provider
            }
            (Block::Macro, SourceType::Manual) => {
                if reading(macro_values, &spec.key).is_some() {
                    continue;
                }
                &mut missing.manual
            }
        };
        bucket.push(spec.key.clone());
    }
    missing
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataAudit {
    pub coverage: Coverage,
    pub cache_age_days: Option<f64>,
    pub freshness: Freshness,
    pub missing: MissingInputs,
}

pub fn audit(
    catalog: &Catalog,
    macro_values: &IndicatorValues,
    valuation_values: &IndicatorValues,
    cache_age_days: Option<f64>,
) -> DataAudit {
    DataAudit {
        coverage: coverage(catalog, macro_values, valuation_values),
        cache_age_days,
        freshness: Freshness::from_age_days(cache_age_days),
        missing: missing_inputs(catalog, macro_values, valuation_values),
    }
}
