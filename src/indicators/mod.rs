use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;

pub mod format;
pub mod registry;

pub use format::FormatKind;

// ============================================================================
// ENUMS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Block {
    Macro,
    Valuation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Readings above the threshold are worse (credit spreads, claims).
    AboveIsWorse,
    /// Readings below the threshold are worse (yield curve, sentiment).
    BelowIsWorse,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceType {
    /// Pulled from the FRED cache by series id.
    Fred { series_id: String },
    /// Entered by the user (LEI, valuation gauges).
    Manual,
}

/// How a raw observation series becomes the indicator's reading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SeriesTransform {
    #[default]
    Raw,
    YoyPercent,
    PctChangeMonths { months: u32 },
    TrailingAverage {
        window: usize,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        divisor: Option<f64>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AmplifierCondition {
    AtOrBelow(f64),
    AtOrAbove(f64),
}

impl AmplifierCondition {
    pub fn holds(&self, value: f64) -> bool {
        match *self {
            AmplifierCondition::AtOrBelow(limit) => value <= limit,
            AmplifierCondition::AtOrAbove(limit) => value >= limit,
        }
    }
}

/// Multiplies the curve output when `when` holds for the raw reading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Amplifier {
    pub when: AmplifierCondition,
    pub multiplier: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdCurve {
    pub threshold: f64,
    pub direction: Direction,
    /// Distance beyond the threshold that reaches 100. Non-positive means
    /// `max(1, |threshold| / 2)`.
    #[serde(default)]
    pub span: f64,
    /// Neutral zone before stress starts climbing. Non-positive means `span / 2`.
    #[serde(default)]
    pub buffer: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amplifier: Option<Amplifier>,
}

impl ThresholdCurve {
    pub fn effective_span(&self) -> f64 {
        if self.span > 0.0 {
            self.span
        } else {
            (self.threshold.abs() * 0.5).max(1.0)
        }
    }

    pub fn effective_buffer(&self) -> f64 {
        if self.buffer > 0.0 {
            self.buffer
        } else {
            self.effective_span() * 0.5
        }
    }
}

/// Calm / watch / danger breakpoints of a valuation gauge (higher is worse).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValuationBands {
    pub calm_max: f64,
    pub watch_max: f64,
    pub danger_max: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StressCurve {
    Threshold(ThresholdCurve),
    Bands(ValuationBands),
}

// ============================================================================
// INDICATORS + CATALOG
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSpec {
    pub key: String,
    pub label: String,
    #[serde(default)]
    pub description: String,
    pub block: Block,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tier: Option<u8>,
    pub weight: f64,
    pub source: SourceType,
    #[serde(default)]
    pub transform: SeriesTransform,
    #[serde(default)]
    pub format: FormatKind,
    pub curve: StressCurve,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Stress at the threshold itself; the "watch" to "danger" pivot.
    pub warn_max: f64,
    pub macro_block_weight: f64,
    pub valuation_block_weight: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            warn_max: 40.0,
            macro_block_weight: 0.65,
            valuation_block_weight: 0.35,
        }
    }
}

/// Which readings feed the labour stress gauge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaborGauge {
    pub claims_key: String,
    pub sahm_key: String,
}

#[derive(Debug, Error, PartialEq)]
pub enum CatalogError {
    #[error("duplicate indicator key: {0}")]
    DuplicateKey(String),
    #[error("indicator {key}: weight must be finite and non-negative, got {weight}")]
    InvalidWeight { key: String, weight: f64 },
    #[error("indicator {key}: tier must be 1 or 2, got {tier}")]
    InvalidTier { key: String, tier: u8 },
    #[error("indicator {key}: tiers apply to macro indicators only")]
    TierOnValuation { key: String },
    #[error("indicator {key}: valuation bands must be strictly increasing")]
    UnorderedBands { key: String },
    #[error("indicator {key}: {detail}")]
    InvalidTransform { key: String, detail: String },
    #[error("indicator {key}: curve parameters must be finite")]
    NonFiniteCurve { key: String },
    #[error("warn_max must lie strictly between 0 and 100, got {0}")]
    InvalidWarnMax(f64),
    #[error("block weights must be finite and non-negative")]
    InvalidBlockWeights,
    #[error("labor gauge references unknown indicator {0}")]
    UnknownLaborKey(String),
    #[error("failed to parse catalog: {0}")]
    Parse(String),
    #[error("failed to read catalog {path}: {message}")]
    Io { path: String, message: String },
}

/// Immutable indicator catalog. Built once, then passed by reference.
///
/// Deserializing goes through validation, so every `Catalog` in hand is valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "CatalogDef")]
pub struct Catalog {
    pub scoring: ScoringConfig,
    pub indicators: Vec<IndicatorSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labor_gauge: Option<LaborGauge>,
}

/// Unvalidated wire form of a catalog.
#[derive(Deserialize)]
struct CatalogDef {
    #[serde(default)]
    scoring: ScoringConfig,
    indicators: Vec<IndicatorSpec>,
    #[serde(default)]
    labor_gauge: Option<LaborGauge>,
}

impl TryFrom<CatalogDef> for Catalog {
    type Error = CatalogError;

    fn try_from(def: CatalogDef) -> Result<Self, Self::Error> {
        Catalog::new(def.scoring, def.indicators, def.labor_gauge)
    }
}

impl Catalog {
    /// Validates and wraps a set of indicators.
    pub fn new(
        scoring: ScoringConfig,
        indicators: Vec<IndicatorSpec>,
        labor_gauge: Option<LaborGauge>,
    ) -> Result<Self, CatalogError> {
        let catalog = Self { scoring, indicators, labor_gauge };
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn from_json_str(json: &str) -> Result<Self, CatalogError> {
        let def: CatalogDef =
            serde_json::from_str(json).map_err(|e| CatalogError::Parse(e.to_string()))?;
        Catalog::try_from(def)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| CatalogError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_json_str(&text)
    }

    pub fn get(&self, key: &str) -> Option<&IndicatorSpec> {
        self.indicators.iter().find(|spec| spec.key == key)
    }

    /// Indicators of one block, in catalog order.
    pub fn block(&self, block: Block) -> impl Iterator<Item = &IndicatorSpec> {
        self.indicators.iter().filter(move |spec| spec.block == block)
    }

    fn validate(&self) -> Result<(), CatalogError> {
        let s = &self.scoring;
        if !(s.warn_max > 0.0 && s.warn_max < 100.0) {
            return Err(CatalogError::InvalidWarnMax(s.warn_max));
        }
        let block_weights = [s.macro_block_weight, s.valuation_block_weight];
        if block_weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(CatalogError::InvalidBlockWeights);
        }

        let mut seen = HashSet::new();
        for spec in &self.indicators {
            if !seen.insert(spec.key.as_str()) {
                return Err(CatalogError::DuplicateKey(spec.key.clone()));
            }
            validate_spec(spec)?;
        }

        if let Some(gauge) = &self.labor_gauge {
            for key in [&gauge.claims_key, &gauge.sahm_key] {
                if self.get(key).is_none() {
                    return Err(CatalogError::UnknownLaborKey(key.clone()));
                }
            }
        }
        Ok(())
    }
}

fn validate_spec(spec: &IndicatorSpec) -> Result<(), CatalogError> {
    let key = || spec.key.clone();

    if !spec.weight.is_finite() || spec.weight < 0.0 {
        return Err(CatalogError::InvalidWeight { key: key(), weight: spec.weight });
    }
    match (spec.block, spec.tier) {
        (Block::Valuation, Some(_)) => return Err(CatalogError::TierOnValuation { key: key() }),
        (Block::Macro, Some(tier)) if tier != 1 && tier != 2 => {
            return Err(CatalogError::InvalidTier { key: key(), tier });
        }
        _ => {}
    }

    match spec.curve {
        StressCurve::Threshold(curve) => {
            let amp_ok = curve.amplifier.map_or(true, |amp| {
                let limit = match amp.when {
                    AmplifierCondition::AtOrBelow(x) | AmplifierCondition::AtOrAbove(x) => x,
                };
                amp.multiplier.is_finite() && amp.multiplier >= 0.0 && limit.is_finite()
            });
            if !curve.threshold.is_finite()
                || !curve.span.is_finite()
                || !curve.buffer.is_finite()
                || !amp_ok
            {
                return Err(CatalogError::NonFiniteCurve { key: key() });
            }
        }
        StressCurve::Bands(b) => {
            if ![b.calm_max, b.watch_max, b.danger_max].iter().all(|v| v.is_finite()) {
                return Err(CatalogError::NonFiniteCurve { key: key() });
            }
            if !(b.calm_max < b.watch_max && b.watch_max < b.danger_max) {
                return Err(CatalogError::UnorderedBands { key: key() });
            }
        }
    }

    match spec.transform {
        SeriesTransform::PctChangeMonths { months: 0 } => Err(CatalogError::InvalidTransform {
            key: key(),
            detail: "lookback months must be positive".into(),
        }),
        SeriesTransform::TrailingAverage { window: 0, .. } => Err(CatalogError::InvalidTransform {
            key: key(),
            detail: "trailing window must be positive".into(),
        }),
        SeriesTransform::TrailingAverage { divisor: Some(d), .. } if !d.is_finite() || d == 0.0 => {
            Err(CatalogError::InvalidTransform {
                key: key(),
                detail: format!("divisor must be finite and non-zero, got {}", d),
            })
        }
        _ => Ok(()),
    }
}
