use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::analysis::audit::{self, Alert, DataAudit};
use crate::analysis::bootstrap::{bootstrap_composite, BootstrapBand};
use crate::analysis::labels::{self, Regime, RiskLevel, StressVerdict};
use crate::analysis::{compute_composite, compute_contributions, compute_stats, normalize_indicator};
use crate::core::cache::SeriesCache;
use crate::core::periods::{select_period, PeriodWindow};
use crate::core::timeseries::transform;
use crate::fetcher::{DataSource, ManualInputs};
use crate::indicators::{Block, Catalog, SourceType};
use crate::models::{
    CompositeResult, Contribution, DerivedSeries, HistoryStats, IndicatorValues, ObservationSeries, ObservedValue,
};

/// Current reading of one indicator with its stress and display form.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndicatorReading {
    pub key: String,
    pub label: String,
    pub block: Block,
    pub value: Option<f64>,
    pub display: String,
    pub as_of: Option<String>,
    pub stress: Option<f64>,
    pub verdict: Option<StressVerdict>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub composite: CompositeResult,
    pub regime: Option<Regime>,
    pub recession_risk: Option<&'static str>,
    pub valuation_risk: Option<RiskLevel>,
    pub labor_stress: Option<RiskLevel>,
    pub readings: Vec<IndicatorReading>,
    pub contributions: Vec<Contribution>,
    pub audit: DataAudit,
    pub alert: Alert,
    pub bootstrap: Option<BootstrapBand>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndicatorHistory {
    pub key: String,
    pub label: String,
    pub window: PeriodWindow,
    pub series: DerivedSeries,
    /// Computed over the full derived series, not just the window.
    pub stats: Option<HistoryStats>,
}

/// Bootstrap settings for a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BootstrapConfig {
    pub rounds: usize,
    pub seed: u64,
}

/// Holds one run's inputs and answers scoring and history queries over them.
///
/// Raw observations are fetched once at load; derived series are memoized per
/// indicator key, so a `Radar` can be shared across threads behind an `Arc`.
#[derive(Debug)]
pub struct Radar {
    catalog: Arc<Catalog>,
    raw: HashMap<String, ObservationSeries>,
    manual: ManualInputs,
    cache_age_days: Option<f64>,
    derived: SeriesCache,
}

impl Radar {
    pub fn from_parts(
        catalog: Arc<Catalog>,
        raw: HashMap<String, ObservationSeries>,
        manual: ManualInputs,
        cache_age_days: Option<f64>,
    ) -> Self {
        Self {
            catalog,
            raw,
            manual,
            cache_age_days,
            derived: SeriesCache::new(),
        }
    }

    /// Pulls the raw history of every provider-backed indicator from `source`.
    ///
    /// A series the source cannot deliver is logged and left empty; the
    /// indicator then simply has no reading.
    pub async fn load(
        catalog: Arc<Catalog>,
        source: &dyn DataSource,
        manual: ManualInputs,
        cache_age_days: Option<f64>,
    ) -> Self {
        let mut raw = HashMap::new();
        for spec in &catalog.indicators {
            let SourceType::Fred { series_id } = &spec.source else {
                continue;
            };
            match source.fetch_series(series_id).await {
                Ok(points) => {
                    debug!(key = %spec.key, series_id = %series_id, points = points.len(), "fetched series");
                    raw.insert(spec.key.clone(), points);
                }
                Err(e) => warn!(key = %spec.key, series_id = %series_id, source = source.name(), error = %e, "series unavailable"),
            }
        }
        info!(source = source.name(), series = raw.len(), "radar inputs loaded");
        Self::from_parts(catalog, raw, manual, cache_age_days)
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn cache_age_days(&self) -> Option<f64> {
        self.cache_age_days
    }

    /// Transformed history for a provider-backed indicator. Empty for manual
    /// or unknown keys.
    pub fn derived_series(&self, key: &str) -> Arc<DerivedSeries> {
        self.derived.get_or_compute(key, || {
            match (self.catalog.get(key), self.raw.get(key)) {
                (Some(spec), Some(raw)) => transform(raw, spec.transform),
                _ => Vec::new(),
            }
        })
    }

    pub fn observed_value(&self, key: &str) -> Option<ObservedValue> {
        let spec = self.catalog.get(key)?;
        let observed = match spec.source {
            SourceType::Fred { .. } => {
                let series = self.derived_series(key);
                let last = series.last();
                ObservedValue {
                    key: key.to_string(),
                    value: last.map(|dp| dp.value).filter(|v| v.is_finite()),
                    as_of: last.map(|dp| dp.date.clone()),
                }
            }
            SourceType::Manual => ObservedValue {
                key: key.to_string(),
                value: self.manual.get(key),
                as_of: None,
            },
        };
        Some(observed)
    }

    /// Current readings split into the macro and valuation maps the scoring
    /// functions take.
    pub fn current_values(&self) -> (IndicatorValues, IndicatorValues) {
        let mut macro_values = IndicatorValues::new();
        let mut valuation_values = IndicatorValues::new();
        for spec in &self.catalog.indicators {
            let Some(value) = self.observed_value(&spec.key).and_then(|o| o.value) else {
                continue;
            };
            match spec.block {
                Block::Macro => macro_values.insert(spec.key.clone(), value),
                Block::Valuation => valuation_values.insert(spec.key.clone(), value),
            };
        }
        (macro_values, valuation_values)
    }

    fn readings(&self) -> Vec<IndicatorReading> {
        self.catalog
            .indicators
            .iter()
            .map(|spec| {
                let observed = self.observed_value(&spec.key);
                let value = observed.as_ref().and_then(|o| o.value);
                let stress = value.and_then(|v| normalize_indicator(spec, v, &self.catalog.scoring));
                IndicatorReading {
                    key: spec.key.clone(),
                    label: spec.label.clone(),
                    block: spec.block,
                    value,
                    display: spec.format.format(value),
                    as_of: observed.and_then(|o| o.as_of),
                    stress,
                    verdict: stress.map(StressVerdict::from_stress),
                }
            })
            .collect()
    }

    pub fn snapshot(&self, bootstrap: Option<BootstrapConfig>) -> Snapshot {
        let catalog = self.catalog.as_ref();
        let (macro_values, valuation_values) = self.current_values();

        let composite = compute_composite(catalog, &macro_values, &valuation_values);
        let contributions = compute_contributions(catalog, &macro_values, &valuation_values, composite.score);
        let audit = audit::audit(catalog, &macro_values, &valuation_values, self.cache_age_days);
        let alert = audit::build_alert(composite.score, &audit.coverage, self.cache_age_days);
        let band = bootstrap.and_then(|b| bootstrap_composite(catalog, &macro_values, &valuation_values, b.rounds, b.seed));

        match composite.score {
            Some(score) => info!(composite = score, used = audit.coverage.used, total = audit.coverage.total, "composite computed"),
            None => warn!(used = audit.coverage.used, "no composite, insufficient data"),
        }

        Snapshot {
            regime: composite.score.map(Regime::from_composite),
            recession_risk: composite.score.map(labels::recession_risk_band),
            valuation_risk: composite.score.and(labels::valuation_risk(&composite.valuation_block)),
            labor_stress: composite.score.and(labels::catalog_labor_stress(catalog, &macro_values)),
            readings: self.readings(),
            contributions,
            audit,
            alert,
            bootstrap: band,
            composite,
        }
    }

    /// Windowed history and change statistics for one provider-backed indicator.
    pub fn indicator_history(&self, key: &str, window: PeriodWindow) -> Option<IndicatorHistory> {
        let spec = self.catalog.get(key)?;
        if !matches!(spec.source, SourceType::Fred { .. }) {
            return None;
        }
        let series = self.derived_series(key);
        Some(IndicatorHistory {
            key: spec.key.clone(),
            label: spec.label.clone(),
            window,
            series: select_period(&series, window),
            stats: compute_stats(&series),
        })
    }

    /// Keys of the indicators that have a provider history.
    pub fn history_keys(&self) -> Vec<String> {
        self.catalog
            .indicators
            .iter()
            .filter(|spec| matches!(spec.source, SourceType::Fred { .. }))
            .map(|spec| spec.key.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DataPoint;

    fn monthly(start_year: i32, values: &[f64]) -> ObservationSeries {
        values
            .iter()
            .enumerate()
            .map(|(i, v)| DataPoint::new(format!("{}-{:02}-01", start_year + (i / 12) as i32, i % 12 + 1), *v))
            .collect()
    }

    fn radar() -> Radar {
        let mut raw = HashMap::new();
        raw.insert("YIELD_CURVE".to_string(), monthly(2023, &[0.2, -0.1, -0.5]));
        raw.insert("CREDIT_SPREAD".to_string(), monthly(2023, &[4.0, 5.0, f64::NAN]));
        let mut m2 = vec![100.0; 12];
        m2.push(97.0);
        raw.insert("M2_GROWTH".to_string(), monthly(2023, &m2));

        let mut manual = ManualInputs::new();
        manual.set("LEI", -4.0);
        manual.set("BUFFETT", 190.0);
        manual.set("SHILLER_PE", 34.0);

        Radar::from_parts(Arc::new(Catalog::builtin()), raw, manual, Some(2.0))
    }

    #[test]
    fn test_current_values_take_last_transformed_point() {
        let radar = radar();
        let (macro_values, valuation_values) = radar.current_values();
        assert_eq!(macro_values.get("YIELD_CURVE"), Some(&-0.5));
        // NaN tail dropped by the raw transform
        assert_eq!(macro_values.get("CREDIT_SPREAD"), Some(&5.0));
        assert!((macro_values["M2_GROWTH"] + 3.0).abs() < 1e-9);
        assert_eq!(macro_values.get("LEI"), Some(&-4.0));
        assert!(!macro_values.contains_key("SAHM_RULE"));
        assert_eq!(valuation_values.len(), 2);
    }

    #[test]
    fn test_observed_value_as_of() {
        let radar = radar();
        let yc = radar.observed_value("YIELD_CURVE").unwrap();
        assert_eq!(yc.as_of.as_deref(), Some("2023-03-01"));
        let lei = radar.observed_value("LEI").unwrap();
        assert_eq!(lei.as_of, None);
        assert!(radar.observed_value("NOPE").is_none());
    }

    #[test]
    fn test_snapshot_is_consistent() {
        let radar = radar();
        let snap = radar.snapshot(Some(BootstrapConfig { rounds: 100, seed: 3 }));
        let score = snap.composite.score.unwrap();
        assert!((0.0..=100.0).contains(&score));

        let total: f64 = snap.contributions.iter().map(|c| c.points).sum();
        assert!((total - score).abs() < 1e-6);

        assert_eq!(snap.readings.len(), 12);
        assert_eq!(snap.audit.coverage.used, 6);
        assert!(snap.alert.low_coverage);
        assert_eq!(snap.regime, Some(Regime::from_composite(score)));
        assert!(snap.bootstrap.is_some());
        // no claims or sahm reading
        assert_eq!(snap.labor_stress, None);
    }

    #[test]
    fn test_empty_radar_has_no_composite() {
        let radar = Radar::from_parts(Arc::new(Catalog::builtin()), HashMap::new(), ManualInputs::new(), None);
        let snap = radar.snapshot(None);
        assert_eq!(snap.composite.score, None);
        assert_eq!(snap.regime, None);
        assert!(snap.contributions.is_empty());
        assert_eq!(snap.alert.level, None);
    }

    #[test]
    fn test_indicator_history() {
        let radar = radar();
        let history = radar.indicator_history("YIELD_CURVE", PeriodWindow::Max).unwrap();
        assert_eq!(history.series.len(), 3);
        assert_eq!(history.stats.unwrap().current, -0.5);

        assert!(radar.indicator_history("LEI", PeriodWindow::Max).is_none());
        assert!(radar.indicator_history("NOPE", PeriodWindow::Max).is_none());
        assert_eq!(radar.history_keys().len(), 9);
    }

    #[test]
    fn test_derived_series_is_memoized() {
        let radar = radar();
        let a = radar.derived_series("M2_GROWTH");
        let b = radar.derived_series("M2_GROWTH");
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(a.len(), 1);
    }
}
