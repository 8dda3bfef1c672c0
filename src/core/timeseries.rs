use chrono::{Months, NaiveDate};
use tracing::debug;

use crate::indicators::SeriesTransform;
use crate::models::{DataPoint, DerivedSeries};

/// `date` shifted back by whole calendar months (end-of-month clamped,
/// e.g. 2024-03-31 minus one month is 2024-02-29).
pub fn months_before(date: NaiveDate, months: u32) -> Option<NaiveDate> {
    date.checked_sub_months(Months::new(months))
}

/// Latest point at or before `cutoff` within `points[..end]`.
///
/// `points` is ascending, so the first hit scanning back is the nearest
/// prior-or-equal observation.
pub fn anchor_at_or_before(
    points: &[(NaiveDate, f64)],
    end: usize,
    cutoff: NaiveDate,
) -> Option<&(NaiveDate, f64)> {
    points[..end].iter().rev().find(|(d, _)| *d <= cutoff)
}

/// Applies `kind` to an ascending observation series.
///
/// Only points where the transform is defined are emitted; the output keeps
/// the input's chronological order. Every transform writes readable dates as
/// `YYYY-MM-DD`; an unreadable date is passed through as given.
pub fn transform(series: &[DataPoint], kind: SeriesTransform) -> DerivedSeries {
    match kind {
        SeriesTransform::Raw => series
            .iter()
            .filter(|dp| dp.value.is_finite())
            .map(|dp| DataPoint { date: output_date(dp), value: dp.value })
            .collect(),
        SeriesTransform::YoyPercent => pct_change_months(series, 12),
        SeriesTransform::PctChangeMonths { months } => pct_change_months(series, months),
        SeriesTransform::TrailingAverage { window, divisor } => trailing_average(series, window, divisor),
    }
}

/// Percent change against the nearest observation at or before `months`
/// earlier. The anchor is found by calendar date, not by index offset, so
/// irregular spacing is handled.
pub fn pct_change_months(series: &[DataPoint], months: u32) -> DerivedSeries {
    if months == 0 {
        return Vec::new();
    }

    // Finite, dated points only; anything else can be neither base nor anchor.
    let dated: Vec<(NaiveDate, f64)> = series
        .iter()
        .filter(|dp| dp.value.is_finite())
        .filter_map(|dp| match dp.parsed_date() {
            Some(d) => Some((d, dp.value)),
            None => {
                debug!(date = %dp.date, "skipping observation with unparseable date");
                None
            }
        })
        .collect();

    let mut result = Vec::new();
    for (i, &(date, value)) in dated.iter().enumerate() {
        let Some(cutoff) = months_before(date, months) else {
            continue;
        };
        if let Some(&(_, anchor)) = anchor_at_or_before(&dated, i, cutoff) {
            if anchor != 0.0 {
                result.push(DataPoint {
                    date: format_date(date),
                    value: (value - anchor) / anchor * 100.0,
                });
            }
        }
    }
    result
}

/// Mean of the last `window` observations, emitted only when every value in
/// the window is finite. Optionally divided by `divisor`.
pub fn trailing_average(series: &[DataPoint], window: usize, divisor: Option<f64>) -> DerivedSeries {
    if window == 0 || series.len() < window {
        return Vec::new();
    }
    let scale = divisor.filter(|d| d.is_finite() && *d != 0.0).unwrap_or(1.0);

    series
        .windows(window)
        .filter(|w| w.iter().all(|dp| dp.value.is_finite()))
        .map(|w| {
            let mean = w.iter().map(|dp| dp.value).sum::<f64>() / window as f64;
            DataPoint {
                // window is non-empty, the last point is its date
                date: output_date(&w[window - 1]),
                value: mean / scale,
            }
        })
        .collect()
}

fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn output_date(dp: &DataPoint) -> String {
    dp.parsed_date().map(format_date).unwrap_or_else(|| dp.date.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_datapoint(date: &str, value: f64) -> DataPoint {
        DataPoint::new(date, value)
    }

    fn monthly(start_year: i32, values: &[f64]) -> Vec<DataPoint> {
        values
            .iter()
            .enumerate()
            .map(|(i, v)| {
                let year = start_year + (i / 12) as i32;
                let month = (i % 12) + 1;
                create_datapoint(&format!("{}-{:02}-01", year, month), *v)
            })
            .collect()
    }

    #[test]
    fn test_raw_drops_non_finite() {
        let series = vec![
            create_datapoint("2023-01-01", 1.0),
            create_datapoint("2023-02-01", f64::NAN),
            create_datapoint("2023-03-01", 3.0),
        ];
        let out = transform(&series, SeriesTransform::Raw);
        assert_eq!(out, vec![create_datapoint("2023-01-01", 1.0), create_datapoint("2023-03-01", 3.0)]);
    }

    #[test]
    fn test_yoy_single_point() {
        let mut values = vec![100.0; 12];
        values.push(110.0);
        let out = transform(&monthly(2023, &values), SeriesTransform::YoyPercent);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].date, "2024-01-01");
        assert!((out[0].value - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_yoy_uses_nearest_prior_date_across_gaps() {
        // quarterly gap: no observation exactly one year before 2024-02-15
        let series = vec![
            create_datapoint("2022-12-01", 80.0),
            create_datapoint("2023-01-20", 100.0),
            create_datapoint("2023-04-01", 120.0),
            create_datapoint("2024-02-15", 150.0),
        ];
        let out = transform(&series, SeriesTransform::YoyPercent);
        assert_eq!(out.len(), 1);
        // anchor is 2023-01-20 (latest at or before 2023-02-15)
        assert!((out[0].value - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_yoy_zero_anchor_skipped() {
        let series = vec![create_datapoint("2023-01-01", 0.0), create_datapoint("2024-01-01", 5.0)];
        assert!(transform(&series, SeriesTransform::YoyPercent).is_empty());
    }

    #[test]
    fn test_pct_change_n_months() {
        let out = transform(
            &monthly(2023, &[100.0, 101.0, 102.0, 105.0, 99.0]),
            SeriesTransform::PctChangeMonths { months: 3 },
        );
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].date, "2023-04-01");
        assert!((out[0].value - 5.0).abs() < 1e-9);
        assert!((out[1].value - (99.0 - 101.0) / 101.0 * 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_unparseable_dates_are_skipped_by_lookback() {
        let series = vec![
            create_datapoint("2023-01", 100.0),
            create_datapoint("garbage", 500.0),
            create_datapoint("2024-01", 120.0),
        ];
        let out = transform(&series, SeriesTransform::YoyPercent);
        assert_eq!(out.len(), 1);
        assert!((out[0].value - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_trailing_average_with_divisor() {
        let series = vec![
            create_datapoint("2024-01-06", 200_000.0),
            create_datapoint("2024-01-13", 220_000.0),
            create_datapoint("2024-01-20", 240_000.0),
            create_datapoint("2024-01-27", 260_000.0),
            create_datapoint("2024-02-03", 280_000.0),
        ];
        let out = transform(&series, SeriesTransform::TrailingAverage { window: 4, divisor: Some(1000.0) });
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].date, "2024-01-27");
        assert!((out[0].value - 230.0).abs() < 1e-9);
        assert!((out[1].value - 250.0).abs() < 1e-9);
    }

    #[test]
    fn test_all_transforms_emit_full_dates() {
        let series: Vec<DataPoint> = (1..=13)
            .map(|m| create_datapoint(&format!("{}-{:02}", 2023 + (m - 1) / 12, (m - 1) % 12 + 1), m as f64))
            .collect();

        let raw = transform(&series, SeriesTransform::Raw);
        assert_eq!(raw[3].date, "2023-04-01");
        let avg = transform(&series, SeriesTransform::TrailingAverage { window: 4, divisor: None });
        assert_eq!(avg[0].date, "2023-04-01");
        let yoy = transform(&series, SeriesTransform::YoyPercent);
        assert_eq!(yoy[0].date, "2024-01-01");
        let change = transform(&series, SeriesTransform::PctChangeMonths { months: 3 });
        assert_eq!(change[0].date, "2023-04-01");
    }

    #[test]
    fn test_trailing_average_skips_windows_with_gaps() {
        let series = vec![
            create_datapoint("d1", 1.0),
            create_datapoint("d2", f64::NAN),
            create_datapoint("d3", 3.0),
            create_datapoint("d4", 5.0),
        ];
        let out = trailing_average(&series, 2, None);
        assert_eq!(out, vec![create_datapoint("d4", 4.0)]);
        assert!(trailing_average(&series, 5, None).is_empty());
    }

    #[test]
    fn test_months_before_clamps_month_end() {
        let d = NaiveDate::from_ymd_opt(2024, 3, 31).unwrap();
        assert_eq!(months_before(d, 1), NaiveDate::from_ymd_opt(2024, 2, 29));
        assert_eq!(months_before(d, 12), NaiveDate::from_ymd_opt(2023, 3, 31));
    }
}
