pub mod models;
pub mod indicators;
pub mod analysis;
pub mod core;
pub mod fetcher;

use anyhow::Result;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

pub use crate::core::{BootstrapConfig, PeriodWindow, Radar, Snapshot};
pub use crate::fetcher::{DataSource, FredCacheFile, ManualInputs};
pub use crate::indicators::{Catalog, CatalogError};

/// Loads the provider cache and optional manual inputs from disk and builds a
/// `Radar` over them.
pub async fn open_radar(catalog: Arc<Catalog>, cache_path: &Path, manual_path: Option<&Path>) -> Result<Radar> {
    let cache = FredCacheFile::load(cache_path).await?;
    let manual = match manual_path {
        Some(path) => ManualInputs::load(path).await?,
        None => ManualInputs::new(),
    };
    let age = cache.cache_age_days(chrono::Utc::now());
    info!(cache_age_days = ?age, indicators = catalog.indicators.len(), "opening radar");
    Ok(Radar::load(catalog, &cache, manual, age).await)
}
