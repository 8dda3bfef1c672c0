use super::{
    Amplifier, AmplifierCondition, Block, Catalog, Direction, FormatKind, IndicatorSpec,
    LaborGauge, ScoringConfig, SeriesTransform, SourceType, StressCurve, ThresholdCurve,
    ValuationBands,
};

// Helper macros to reduce boilerplate
macro_rules! fred {
    ($id:expr) => {
        SourceType::Fred { series_id: $id.to_string() }
    };
}

macro_rules! macro_ind {
    // Pattern with amplifier
    ($key:expr, $label:expr, $source:expr, $transform:expr, $fmt:expr, $tier:expr,
     $threshold:expr, $dir:expr, $span:expr, $desc:expr, $amp:expr) => {
        IndicatorSpec {
            key: $key.to_string(),
            label: $label.to_string(),
            description: $desc.to_string(),
            block: Block::Macro,
            tier: Some($tier),
            weight: 1.0,
            source: $source,
            transform: $transform,
            format: $fmt,
            curve: StressCurve::Threshold(ThresholdCurve {
                threshold: $threshold,
                direction: $dir,
                span: $span,
                buffer: 0.0,
                amplifier: $amp,
            }),
        }
    };
    // Pattern without amplifier
    ($key:expr, $label:expr, $source:expr, $transform:expr, $fmt:expr, $tier:expr,
     $threshold:expr, $dir:expr, $span:expr, $desc:expr) => {
        macro_ind!($key, $label, $source, $transform, $fmt, $tier, $threshold, $dir, $span, $desc, None)
    };
}

macro_rules! valuation_ind {
    ($key:expr, $label:expr, $fmt:expr, $calm:expr, $watch:expr, $danger:expr, $desc:expr) => {
        IndicatorSpec {
            key: $key.to_string(),
            label: $label.to_string(),
            description: $desc.to_string(),
            block: Block::Valuation,
            tier: None,
            weight: 1.0,
            source: SourceType::Manual,
            transform: SeriesTransform::Raw,
            format: $fmt,
            curve: StressCurve::Bands(ValuationBands {
                calm_max: $calm,
                watch_max: $watch,
                danger_max: $danger,
            }),
        }
    };
}

use Direction::{AboveIsWorse, BelowIsWorse};
use SeriesTransform::{Raw, YoyPercent};

const YOY: SeriesTransform = YoyPercent;
const CLAIMS_4W_THOUSANDS: SeriesTransform =
    SeriesTransform::TrailingAverage { window: 4, divisor: Some(1000.0) };

impl Catalog {
    /// The stock radar configuration: ten macro indicators, two valuation gauges.
    pub fn builtin() -> Catalog {
        let indicators = vec![
            // =================================================================
            // TIER 1 - LEADING
            // =================================================================
            macro_ind!("YIELD_CURVE", "Yield Curve (10Y-3M, %)", fred!("T10Y3M"), Raw, FormatKind::Pct1, 1,
                       0.0, BelowIsWorse, 1.0, "Treasury 10-year minus 3-month spread.",
                       Some(Amplifier { when: AmplifierCondition::AtOrBelow(0.0), multiplier: 1.2 })),
            macro_ind!("CREDIT_SPREAD", "High Yield Credit Spread (%)", fred!("BAMLH0A0HYM2"), Raw, FormatKind::Pct1, 1,
                       5.0, AboveIsWorse, 3.0, "ICE BofA US High Yield OAS."),
            macro_ind!("CONSUMER_SENTIMENT", "Consumer Sentiment (UMich)", fred!("UMCSENT"), Raw, FormatKind::Plain0, 1,
                       80.0, BelowIsWorse, 20.0, "University of Michigan consumer sentiment."),
            macro_ind!("M2_GROWTH", "M2 Money Supply YoY (%)", fred!("M2SL"), YOY, FormatKind::Pct1, 1,
                       0.0, BelowIsWorse, 5.0, "YoY change in M2 money supply."),
            macro_ind!("LEI", "Leading Economic Index (6m %chg)", SourceType::Manual, Raw, FormatKind::Pct1, 1,
                       -4.1, BelowIsWorse, 3.0, "Six-month percentage change in the Conference Board LEI."),

            // =================================================================
            // TIER 2 - CONFIRMING
            // =================================================================
            macro_ind!("FIN_STRESS", "Financial Stress (NFCI)", fred!("NFCI"), Raw, FormatKind::Plain2, 2,
                       0.0, AboveIsWorse, 0.5, "Chicago Fed National Financial Conditions Index."),
            macro_ind!("INITIAL_CLAIMS", "Initial Claims (4w MA, thousands)", fred!("ICSA"), CLAIMS_4W_THOUSANDS, FormatKind::Plain1, 2,
                       250.0, AboveIsWorse, 100.0, "Initial jobless claims, 4-week moving average."),
            macro_ind!("SAHM_RULE", "Sahm Rule (%)", fred!("SAHMREALTIME"), Raw, FormatKind::Plain1, 2,
                       0.5, AboveIsWorse, 0.5, "Sahm Rule recession indicator.",
                       Some(Amplifier { when: AmplifierCondition::AtOrAbove(0.5), multiplier: 1.3 })),
            macro_ind!("INDUSTRIAL_PRODUCTION", "Industrial Production YoY (%)", fred!("INDPRO"), YOY, FormatKind::Pct1, 2,
                       0.0, BelowIsWorse, 5.0, "YoY change in industrial production."),
            macro_ind!("BUILDING_PERMITS", "Building Permits YoY (%)", fred!("PERMIT"), YOY, FormatKind::Pct1, 2,
                       0.0, BelowIsWorse, 5.0, "US building permits, YoY."),

            // =================================================================
            // VALUATION
            // =================================================================
            valuation_ind!("BUFFETT", "Buffett Indicator (Mkt Cap / GDP, %)", FormatKind::Pct0,
                           120.0, 150.0, 200.0, "Total US market cap divided by GDP."),
            valuation_ind!("SHILLER_PE", "Shiller CAPE (x)", FormatKind::Plain1,
                           22.0, 30.0, 40.0, "Cyclically adjusted P/E ratio."),
        ];

        Catalog {
            scoring: ScoringConfig::default(),
            indicators,
            labor_gauge: Some(LaborGauge {
                claims_key: "INITIAL_CLAIMS".to_string(),
                sahm_key: "SAHM_RULE".to_string(),
            }),
        }
    }
}
