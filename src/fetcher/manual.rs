use anyhow::{Context, Result};
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use tracing::info;

use super::numeric_value;
use crate::models::reading;

/// Hand-entered readings for indicators without a provider series
/// (leading index, valuations). JSON object of key to number or null.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ManualInputs {
    values: HashMap<String, f64>,
}

impl ManualInputs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let raw: HashMap<String, Value> = serde_json::from_str(json).context("invalid manual inputs JSON")?;
        let values = raw
            .into_iter()
            .map(|(key, v)| (key, numeric_value(&v)))
            .collect();
        Ok(Self { values })
    }

    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read manual inputs {}", path.display()))?;
        let inputs = Self::from_json_str(&text).with_context(|| format!("in {}", path.display()))?;
        info!(path = %path.display(), entries = inputs.values.len(), "loaded manual inputs");
        Ok(inputs)
    }

    pub fn set(&mut self, key: impl Into<String>, value: f64) {
        self.values.insert(key.into(), value);
    }

    /// Finite reading for `key`; null or non-numeric entries read as missing.
    pub fn get(&self, key: &str) -> Option<f64> {
        reading(&self.values, key)
    }
}
