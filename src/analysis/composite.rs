use tracing::debug;

use crate::analysis::normalizer::normalize_indicator;
use crate::indicators::{Block, Catalog, IndicatorSpec};
use crate::models::{reading, BlockScore, CompositeResult, IndicatorValues};

/// One indicator that made it into a block: has a reading and positive weight.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ScoredIndicator<'a> {
    pub spec: &'a IndicatorSpec,
    pub stress: f64,
}

/// Stresses of every usable indicator in `block`, in catalog order.
pub(crate) fn scored_indicators<'a>(
    catalog: &'a Catalog,
    block: Block,
    values: &IndicatorValues,
) -> Vec<ScoredIndicator<'a>> {
    catalog
        .block(block)
        .filter_map(|spec| {
            if spec.weight <= 0.0 {
                return None;
            }
            let Some(value) = reading(values, &spec.key) else {
                debug!(key = %spec.key, "no current reading, excluded from block");
                return None;
            };
            normalize_indicator(spec, value, &catalog.scoring)
                .map(|stress| ScoredIndicator { spec, stress })
        })
        .collect()
}

pub(crate) fn block_score_of(scored: &[ScoredIndicator<'_>]) -> BlockScore {
    let (weighted_sum, total_weight) = scored
        .iter()
        .fold((0.0, 0.0), |(sum, total), s| (sum + s.stress * s.spec.weight, total + s.spec.weight));

    BlockScore {
        score: (total_weight > 0.0).then(|| weighted_sum / total_weight),
        total_weight,
    }
}

/// Weighted mean stress of one block.
pub fn compute_block(catalog: &Catalog, block: Block, values: &IndicatorValues) -> BlockScore {
    block_score_of(&scored_indicators(catalog, block, values))
}

/// Effective `(macro, valuation)` weights given which blocks produced a score.
///
/// Both present: the configured weights, not renormalized. Only one present:
/// that block carries the whole composite.
pub(crate) fn effective_block_weights(
    catalog: &Catalog,
    macro_block: &BlockScore,
    valuation_block: &BlockScore,
) -> (f64, f64) {
    match (macro_block.score, valuation_block.score) {
        (Some(_), Some(_)) => (
            catalog.scoring.macro_block_weight,
            catalog.scoring.valuation_block_weight,
        ),
        (Some(_), None) => (1.0, 0.0),
        (None, Some(_)) => (0.0, 1.0),
        (None, None) => (0.0, 0.0),
    }
}

pub(crate) fn blend(catalog: &Catalog, macro_block: BlockScore, valuation_block: BlockScore) -> CompositeResult {
    let (mw, vw) = effective_block_weights(catalog, &macro_block, &valuation_block);
    let score = match (macro_block.score, valuation_block.score) {
        (None, None) => None,
        (m, v) => Some(m.unwrap_or(0.0) * mw + v.unwrap_or(0.0) * vw),
    }
    .filter(|s| s.is_finite())
    .map(|s| s.clamp(0.0, 100.0));

    CompositeResult { score, macro_block, valuation_block }
}

/// Blends the macro and valuation blocks into the composite stress score.
pub fn compute_composite(
    catalog: &Catalog,
    macro_values: &IndicatorValues,
    valuation_values: &IndicatorValues,
) -> CompositeResult {
    let macro_block = compute_block(catalog, Block::Macro, macro_values);
    let valuation_block = compute_block(catalog, Block::Valuation, valuation_values);
    blend(catalog, macro_block, valuation_block)
}
