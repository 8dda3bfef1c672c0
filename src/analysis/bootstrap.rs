use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tracing::debug;

use crate::analysis::composite::{blend, block_score_of, scored_indicators, ScoredIndicator};
use crate::indicators::{Block, Catalog};
use crate::models::IndicatorValues;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BootstrapBand {
    pub rounds: usize,
    pub seed: u64,
    pub p5: f64,
    pub p95: f64,
}

fn resample<'a, R: Rng>(rng: &mut R, scored: &[ScoredIndicator<'a>]) -> Vec<ScoredIndicator<'a>> {
    (0..scored.len()).map(|_| scored[rng.gen_range(0..scored.len())]).collect()
}

/// Nearest-rank percentile of an ascending, non-empty slice.
fn percentile(sorted: &[f64], p: f64) -> f64 {
    let rank = ((p / 100.0) * sorted.len() as f64).ceil() as usize;
    sorted[rank.clamp(1, sorted.len()) - 1]
}

/// Uncertainty band for the composite: each round draws every block's
/// indicators with replacement and recomputes the blend.
///
/// `None` when `rounds` is zero or no composite can be formed. The same seed
/// always gives the same band.
pub fn bootstrap_composite(
    catalog: &Catalog,
    macro_values: &IndicatorValues,
    valuation_values: &IndicatorValues,
    rounds: usize,
    seed: u64,
) -> Option<BootstrapBand> {
    if rounds == 0 {
        return None;
    }
    let macro_scored = scored_indicators(catalog, Block::Macro, macro_values);
    let valuation_scored = scored_indicators(catalog, Block::Valuation, valuation_values);
    if macro_scored.is_empty() && valuation_scored.is_empty() {
        return None;
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut scores: Vec<f64> = (0..rounds)
        .filter_map(|_| {
            let m = block_score_of(&resample(&mut rng, &macro_scored));
            let v = block_score_of(&resample(&mut rng, &valuation_scored));
            blend(catalog, m, v).score
        })
        .collect();
    if scores.is_empty() {
        return None;
    }
    scores.sort_by(|a, b| a.total_cmp(b));
    debug!(rounds, seed, "bootstrap complete");

    Some(BootstrapBand {
        rounds,
        seed,
        p5: percentile(&scores, 5.0),
        p95: percentile(&scores, 95.0),
    })
}
