//! Maps one raw reading onto the 0-100 stress scale.
//!
//! Macro indicators use a two-segment threshold curve: zero stress outside a
//! neutral buffer, a ramp to `warn_max` across the buffer, then a ramp from
//! `warn_max` to 100 across `span` beyond the threshold. Valuation gauges use
//! three bands (calm / watch / danger) that saturate at 100.

use crate::indicators::{
    Catalog, Direction, IndicatorSpec, ScoringConfig, StressCurve, ThresholdCurve, ValuationBands,
};

/// Stress for `value` under `spec`'s curve, or `None` when there is no usable
/// reading.
pub fn normalize_indicator(spec: &IndicatorSpec, value: f64, scoring: &ScoringConfig) -> Option<f64> {
    if !value.is_finite() {
        return None;
    }
    let stress = match &spec.curve {
        StressCurve::Threshold(curve) => threshold_stress(curve, value, scoring.warn_max),
        StressCurve::Bands(bands) => band_stress(bands, value, scoring.warn_max),
    };
    stress.is_finite().then(|| stress.clamp(0.0, 100.0))
}

/// Catalog-level lookup: `None` for an unknown key or a missing reading.
pub fn normalize_key(catalog: &Catalog, key: &str, value: Option<f64>) -> Option<f64> {
    let spec = catalog.get(key)?;
    normalize_indicator(spec, value?, &catalog.scoring)
}

/// Valuation entry point. Only valuation-curve indicators are scored here.
pub fn normalize_valuation(catalog: &Catalog, key: &str, value: Option<f64>) -> Option<f64> {
    let spec = catalog.get(key)?;
    match &spec.curve {
        StressCurve::Bands(bands) => {
            let v = value.filter(|v| v.is_finite())?;
            Some(band_stress(bands, v, catalog.scoring.warn_max).clamp(0.0, 100.0))
        }
        StressCurve::Threshold(_) => None,
    }
}

pub fn threshold_stress(curve: &ThresholdCurve, value: f64, warn_max: f64) -> f64 {
    let t = curve.threshold;
    let span = curve.effective_span();
    let buffer = curve.effective_buffer();

    // Distance into the "bad" side, positive when past the threshold.
    let past = match curve.direction {
        Direction::BelowIsWorse => t - value,
        Direction::AboveIsWorse => value - t,
    };

    let mut stress = if past <= -buffer {
        0.0
    } else if past <= 0.0 {
        ((buffer + past) / buffer) * warn_max
    } else {
        let frac = (past / span).clamp(0.0, 1.0);
        warn_max + frac * (100.0 - warn_max)
    };

    if let Some(amp) = curve.amplifier {
        if amp.when.holds(value) {
            stress = (stress * amp.multiplier).min(100.0);
        }
    }

    stress.clamp(0.0, 100.0)
}

pub fn band_stress(bands: &ValuationBands, value: f64, warn_max: f64) -> f64 {
    let ValuationBands { calm_max, watch_max, danger_max } = *bands;
    if value <= calm_max {
        0.0
    } else if value <= watch_max {
        (value - calm_max) / (watch_max - calm_max) * warn_max
    } else if value <= danger_max {
        warn_max + (value - watch_max) / (danger_max - watch_max) * (100.0 - warn_max)
    } else {
        100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{Amplifier, AmplifierCondition};

    const WARN: f64 = 40.0;

    fn curve(threshold: f64, direction: Direction, span: f64, buffer: f64) -> ThresholdCurve {
        ThresholdCurve { threshold, direction, span, buffer, amplifier: None }
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_below_is_worse_segments() {
        let c = curve(0.0, Direction::BelowIsWorse, 1.0, 0.35);
        assert_eq!(threshold_stress(&c, 0.35, WARN), 0.0);
        assert_eq!(threshold_stress(&c, 2.0, WARN), 0.0);
        assert!(approx(threshold_stress(&c, 0.0, WARN), WARN));
        // halfway through the buffer
        assert!(approx(threshold_stress(&c, 0.175, WARN), 20.0));
        // halfway through the span
        assert!(approx(threshold_stress(&c, -0.5, WARN), 70.0));
        assert_eq!(threshold_stress(&c, -1.2, WARN), 100.0);
    }

    #[test]
    fn test_above_is_worse_mirrors() {
        let c = curve(5.0, Direction::AboveIsWorse, 3.0, 0.0);
        // buffer defaults to span / 2
        assert_eq!(threshold_stress(&c, 3.5, WARN), 0.0);
        assert!(approx(threshold_stress(&c, 4.25, WARN), 20.0));
        assert!(approx(threshold_stress(&c, 5.0, WARN), WARN));
        assert!(approx(threshold_stress(&c, 6.5, WARN), 70.0));
        assert_eq!(threshold_stress(&c, 20.0, WARN), 100.0);
    }

    #[test]
    fn test_amplifier_is_capped() {
        let mut c = curve(0.0, Direction::BelowIsWorse, 1.0, 0.5);
        c.amplifier = Some(Amplifier { when: AmplifierCondition::AtOrBelow(0.0), multiplier: 1.2 });
        assert!(approx(threshold_stress(&c, 0.0, WARN), 48.0));
        assert!(approx(threshold_stress(&c, -0.5, WARN), 84.0));
        assert_eq!(threshold_stress(&c, -0.9, WARN), 100.0);
        // condition does not hold inside the buffer
        assert!(approx(threshold_stress(&c, 0.25, WARN), 20.0));
    }

    #[test]
    fn test_valuation_bands() {
        let buffett = ValuationBands { calm_max: 120.0, watch_max: 150.0, danger_max: 200.0 };
        assert_eq!(band_stress(&buffett, 100.0, WARN), 0.0);
        assert_eq!(band_stress(&buffett, 120.0, WARN), 0.0);
        assert!(approx(band_stress(&buffett, 135.0, WARN), 20.0));
        assert!(approx(band_stress(&buffett, 150.0, WARN), 40.0));
        assert!(approx(band_stress(&buffett, 175.0, WARN), 70.0));
        assert_eq!(band_stress(&buffett, 250.0, WARN), 100.0);
    }

    #[test]
    fn test_missing_inputs_are_none() {
        let catalog = Catalog::builtin();
        assert_eq!(normalize_key(&catalog, "UNKNOWN", Some(1.0)), None);
        assert_eq!(normalize_key(&catalog, "YIELD_CURVE", None), None);
        assert_eq!(normalize_key(&catalog, "YIELD_CURVE", Some(f64::NAN)), None);
        assert_eq!(normalize_key(&catalog, "YIELD_CURVE", Some(f64::INFINITY)), None);
    }

    #[test]
    fn test_catalog_lookups() {
        let catalog = Catalog::builtin();
        assert_eq!(normalize_key(&catalog, "YIELD_CURVE", Some(2.0)), Some(0.0));
        assert!(approx(normalize_key(&catalog, "SAHM_RULE", Some(0.5)).unwrap(), 52.0));
        assert!(approx(normalize_valuation(&catalog, "SHILLER_PE", Some(35.0)).unwrap(), 70.0));
        assert_eq!(normalize_valuation(&catalog, "YIELD_CURVE", Some(1.0)), None);
        assert_eq!(normalize_valuation(&catalog, "BUFFETT", None), None);
    }
}
