use serde::Serialize;

use crate::indicators::{Catalog, LaborGauge};
use crate::models::{reading, BlockScore, IndicatorValues};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StressVerdict {
    Calm,
    Watch,
    Danger,
}

impl StressVerdict {
    pub fn from_stress(stress: f64) -> Self {
        if stress < 33.0 {
            StressVerdict::Calm
        } else if stress < 66.0 {
            StressVerdict::Watch
        } else {
            StressVerdict::Danger
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            StressVerdict::Calm => "Calm",
            StressVerdict::Watch => "Watch",
            StressVerdict::Danger => "Danger",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Regime {
    LowStress,
    Elevated,
    High,
    Critical,
}

impl Regime {
    /// Classifies the composite after rounding to a whole score.
    pub fn from_composite(composite: f64) -> Self {
        let v = composite.round();
        if v <= 30.0 {
            Regime::LowStress
        } else if v <= 50.0 {
            Regime::Elevated
        } else if v <= 70.0 {
            Regime::High
        } else {
            Regime::Critical
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Regime::LowStress => "Low stress regime",
            Regime::Elevated => "Elevated - monitor",
            Regime::High => "High - defensive bias",
            Regime::Critical => "Critical regime",
        }
    }
}

/// Rough recession-probability band shown next to the composite.
pub fn recession_risk_band(composite: f64) -> &'static str {
    match composite {
        c if c < 20.0 => "<10%",
        c if c < 35.0 => "10-25%",
        c if c < 50.0 => "25-40%",
        c if c < 65.0 => "40-60%",
        c if c < 80.0 => "60-75%",
        _ => "75-90%",
    }
}

/// Low / Moderate / High bucket shared by the valuation and labour gauges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Moderate,
    High,
}

impl RiskLevel {
    pub fn label(&self) -> &'static str {
        match self {
            RiskLevel::Low => "Low",
            RiskLevel::Moderate => "Moderate",
            RiskLevel::High => "High",
        }
    }
}

pub fn valuation_risk(valuation_block: &BlockScore) -> Option<RiskLevel> {
    let score = valuation_block.score?;
    Some(if score < 33.0 {
        RiskLevel::Low
    } else if score < 66.0 {
        RiskLevel::Moderate
    } else {
        RiskLevel::High
    })
}

// Claims in thousands above which labour stress starts, and the scalings that
// put claims and the Sahm reading on a common 0-100 scale.
const CLAIMS_PIVOT: f64 = 250.0;
const CLAIMS_SCALE: f64 = 0.5;
const SAHM_SCALE: f64 = 200.0;

/// Labour-market stress from initial claims (thousands) and the Sahm reading.
pub fn labor_stress(claims: Option<f64>, sahm: Option<f64>) -> Option<RiskLevel> {
    let claims = claims.filter(|v| v.is_finite())?;
    let sahm = sahm.filter(|v| v.is_finite())?;

    let cs = ((claims - CLAIMS_PIVOT) * CLAIMS_SCALE).clamp(0.0, 100.0);
    let ss = (sahm * SAHM_SCALE).clamp(0.0, 100.0);
    let avg = (cs + ss) / 2.0;

    Some(if avg < 30.0 {
        RiskLevel::Low
    } else if avg < 60.0 {
        RiskLevel::Moderate
    } else {
        RiskLevel::High
    })
}

/// Reads the catalog's labour gauge inputs out of the macro readings.
pub fn catalog_labor_stress(catalog: &Catalog, macro_values: &IndicatorValues) -> Option<RiskLevel> {
    let LaborGauge { claims_key, sahm_key } = catalog.labor_gauge.as_ref()?;
    labor_stress(reading(macro_values, claims_key), reading(macro_values, sahm_key))
}
