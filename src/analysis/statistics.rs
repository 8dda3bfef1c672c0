use chrono::NaiveDate;

use crate::core::timeseries::{anchor_at_or_before, months_before};
use crate::models::{ChangePct, DataPoint, HistoryStats};

/// Anchors older than this many horizons back are too far out to stand in for
/// the horizon. With 2023-01, 2023-04 and 2024-01 the 3-month change has no
/// anchor, since 2023-04 sits nine months back.
const MAX_ANCHOR_HORIZONS: u32 = 2;

/// Current value plus 3/6/12-month percentage change of a derived series.
///
/// Returns `None` for fewer than two points. An unreadable latest date leaves
/// every change empty.
pub fn compute_stats(series: &[DataPoint]) -> Option<HistoryStats> {
    if series.len() < 2 {
        return None;
    }
    let last = series.last()?;
    let current = last.value;
    let latest_date = last.parsed_date();

    // Prior dated points, ascending; the latest point itself is never an anchor.
    let prior: Vec<(NaiveDate, f64)> = series[..series.len() - 1]
        .iter()
        .filter_map(|dp| dp.parsed_date().map(|d| (d, dp.value)))
        .collect();

    let change = |months: u32| {
        latest_date.and_then(|latest| change_since(&prior, latest, current, months))
    };

    Some(HistoryStats {
        current,
        change_pct: ChangePct {
            m3: change(3),
            m6: change(6),
            m12: change(12),
        },
    })
}

/// Percent change against the latest point at or before `latest - months`.
///
/// The anchor must also be no older than `latest - MAX_ANCHOR_HORIZONS * months`; a sparse
/// series whose only earlier reading is far outside the horizon yields
/// `None` rather than a change measured over the wrong period.
fn change_since(prior: &[(NaiveDate, f64)], latest: NaiveDate, current: f64, months: u32) -> Option<f64> {
    let cutoff = months_before(latest, months)?;
    let oldest = months_before(latest, months * MAX_ANCHOR_HORIZONS)?;

    let &(anchor_date, anchor) = anchor_at_or_before(prior, prior.len(), cutoff)?;
    if anchor_date < oldest || !anchor.is_finite() || anchor == 0.0 || !current.is_finite() {
        return None;
    }
    Some((current - anchor) / anchor.abs() * 100.0)
}
