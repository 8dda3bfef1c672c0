use async_trait::async_trait;
use anyhow::Result;
use serde_json::Value;
use crate::models::DataPoint;

pub mod cache_file;
pub mod manual;

pub use cache_file::FredCacheFile;
pub use manual::ManualInputs;

/// Source of raw observation histories, keyed by the provider's series id.
#[async_trait]
pub trait DataSource: Send + Sync {
    fn name(&self) -> &str;
    async fn fetch_series(&self, series_id: &str) -> Result<Vec<DataPoint>>;
}

/// Provider values arrive as numbers, numeric strings, "." or null.
/// Anything that is not a number becomes NaN so downstream transforms drop it.
pub(crate) fn numeric_value(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().unwrap_or(f64::NAN),
        Value::String(s) => s.trim().parse::<f64>().unwrap_or(f64::NAN),
        _ => f64::NAN,
    }
}
