use async_trait::async_trait;
use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use tracing::{info, warn};

use super::{numeric_value, DataSource};
use crate::models::DataPoint;

#[derive(Debug, Deserialize)]
struct RawObservation {
    date: String,
    #[serde(default)]
    value: Value,
}

#[derive(Debug, Deserialize)]
struct RawSeries {
    #[serde(default)]
    last_updated: Option<String>,
    #[serde(default)]
    observations: Vec<RawObservation>,
}

#[derive(Debug, Deserialize)]
struct RawCache {
    #[serde(default)]
    generated_at: Option<String>,
    #[serde(default)]
    series: HashMap<String, RawSeries>,
}

#[derive(Debug, Clone)]
struct CachedSeries {
    last_updated: Option<String>,
    observations: Vec<DataPoint>,
}

/// Provider cache written by the fetch job:
/// `{ generated_at, series: { ID: { last_updated, observations: [{date, value}] } } }`.
#[derive(Debug, Clone)]
pub struct FredCacheFile {
    generated_at: Option<DateTime<Utc>>,
    series: HashMap<String, CachedSeries>,
}

impl FredCacheFile {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let raw: RawCache = serde_json::from_str(json).context("invalid provider cache JSON")?;

        let generated_at = match raw.generated_at.as_deref() {
            Some(text) => match DateTime::parse_from_rfc3339(text) {
                Ok(ts) => Some(ts.with_timezone(&Utc)),
                Err(e) => {
                    warn!(generated_at = text, error = %e, "unreadable cache timestamp, age unknown");
                    None
                }
            },
            None => None,
        };

        let series = raw
            .series
            .into_iter()
            .map(|(id, s)| {
                let observations = s
                    .observations
                    .into_iter()
                    .map(|o| DataPoint { date: o.date, value: numeric_value(&o.value) })
                    .collect();
                (id, CachedSeries { last_updated: s.last_updated, observations })
            })
            .collect();

        Ok(Self { generated_at, series })
    }

    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read provider cache {}", path.display()))?;
        let cache = Self::from_json_str(&text).with_context(|| format!("in {}", path.display()))?;
        info!(path = %path.display(), series = cache.series.len(), "loaded provider cache");
        Ok(cache)
    }

    pub fn generated_at(&self) -> Option<DateTime<Utc>> {
        self.generated_at
    }

    /// Fractional days between `generated_at` and `now`, never negative.
    pub fn cache_age_days(&self, now: DateTime<Utc>) -> Option<f64> {
        let generated = self.generated_at?;
        let seconds = (now - generated).num_seconds().max(0) as f64;
        Some(seconds / 86_400.0)
    }

    pub fn series_ids(&self) -> impl Iterator<Item = &str> {
        self.series.keys().map(String::as_str)
    }

    pub fn last_updated(&self, series_id: &str) -> Option<&str> {
        self.series.get(series_id)?.last_updated.as_deref()
    }

    /// Observations sorted ascending by date, as the transforms expect.
    pub fn observations(&self, series_id: &str) -> Option<Vec<DataPoint>> {
        let mut points = self.series.get(series_id)?.observations.clone();
        points.sort_by(|a, b| a.date.cmp(&b.date));
        Some(points)
    }
}

#[async_trait]
impl DataSource for FredCacheFile {
    fn name(&self) -> &str {
        "fred-cache"
    }

    async fn fetch_series(&self, series_id: &str) -> Result<Vec<DataPoint>> {
        self.observations(series_id)
            .ok_or_else(|| anyhow!("series {} not present in provider cache", series_id))
    }
}
