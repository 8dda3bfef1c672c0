use std::cmp::Ordering;

use crate::analysis::composite::{block_score_of, effective_block_weights, scored_indicators};
use crate::indicators::{Block, Catalog};
use crate::models::{Contribution, IndicatorValues};

/// Splits `composite` into per-indicator points.
///
/// Uses the same stresses and block branching as `compute_composite`. When
/// block weights above 1 pushed the blend past the clamp, points are scaled
/// down so they still sum to the composite. Sorted by points descending, ties
/// by key.
pub fn compute_contributions(
    catalog: &Catalog,
    macro_values: &IndicatorValues,
    valuation_values: &IndicatorValues,
    composite: Option<f64>,
) -> Vec<Contribution> {
    let composite = match composite {
        Some(c) if c.is_finite() && c > 0.0 => c,
        _ => return Vec::new(),
    };

    let macro_scored = scored_indicators(catalog, Block::Macro, macro_values);
    let valuation_scored = scored_indicators(catalog, Block::Valuation, valuation_values);
    let macro_block = block_score_of(&macro_scored);
    let valuation_block = block_score_of(&valuation_scored);
    let (macro_weight, valuation_weight) =
        effective_block_weights(catalog, &macro_block, &valuation_block);

    let blocks = [
        (macro_scored, macro_block.total_weight, macro_weight),
        (valuation_scored, valuation_block.total_weight, valuation_weight),
    ];

    let mut items: Vec<Contribution> = blocks
        .iter()
        .filter(|(_, total, _)| *total > 0.0)
        .flat_map(|(scored, total, block_weight)| {
            scored.iter().filter_map(move |s| {
                let points = (s.stress * s.spec.weight / total) * block_weight;
                (points > 0.0).then(|| Contribution {
                    key: s.spec.key.clone(),
                    label: s.spec.label.clone(),
                    block: s.spec.block,
                    tier: s.spec.tier,
                    stress: s.stress,
                    points,
                    share_pct: 0.0,
                })
            })
        })
        .collect();

    let raw: f64 = items.iter().map(|c| c.points).sum();
    let scale = if raw > composite { composite / raw } else { 1.0 };
    for item in &mut items {
        item.points *= scale;
        item.share_pct = item.points / composite * 100.0;
    }

    items.sort_by(|a, b| {
        b.points
            .partial_cmp(&a.points)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.key.cmp(&b.key))
    });
    items
}
