use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::warn;

use crate::core::timeseries::months_before;
use crate::models::{DataPoint, DerivedSeries};

/// Points kept when the latest date cannot be read.
const FALLBACK_POINTS: usize = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PeriodWindow {
    #[serde(rename = "3M")]
    ThreeMonths,
    #[serde(rename = "6M")]
    SixMonths,
    #[serde(rename = "12M")]
    TwelveMonths,
    #[serde(rename = "5Y")]
    FiveYears,
    #[serde(rename = "MAX")]
    Max,
}

impl PeriodWindow {
    pub const ALL: [PeriodWindow; 5] = [
        PeriodWindow::ThreeMonths,
        PeriodWindow::SixMonths,
        PeriodWindow::TwelveMonths,
        PeriodWindow::FiveYears,
        PeriodWindow::Max,
    ];

    /// Calendar lookback in months, `None` for the full history.
    pub fn months(&self) -> Option<u32> {
        match self {
            PeriodWindow::ThreeMonths => Some(3),
            PeriodWindow::SixMonths => Some(6),
            PeriodWindow::TwelveMonths => Some(12),
            PeriodWindow::FiveYears => Some(60),
            PeriodWindow::Max => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PeriodWindow::ThreeMonths => "3M",
            PeriodWindow::SixMonths => "6M",
            PeriodWindow::TwelveMonths => "12M",
            PeriodWindow::FiveYears => "5Y",
            PeriodWindow::Max => "MAX",
        }
    }
}

impl fmt::Display for PeriodWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for PeriodWindow {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "3M" => Ok(PeriodWindow::ThreeMonths),
            "6M" => Ok(PeriodWindow::SixMonths),
            "12M" | "1Y" => Ok(PeriodWindow::TwelveMonths),
            "5Y" | "60M" => Ok(PeriodWindow::FiveYears),
            "MAX" | "ALL" => Ok(PeriodWindow::Max),
            other => Err(format!("unknown period '{}' (expected 3M, 6M, 12M, 5Y or MAX)", other)),
        }
    }
}

/// Trailing slice of `series` covering `window`, measured back from the last
/// point's date.
pub fn select_period(series: &[DataPoint], window: PeriodWindow) -> DerivedSeries {
    let Some(months) = window.months() else {
        return series.to_vec();
    };
    let Some(last) = series.last() else {
        return Vec::new();
    };

    let cutoff = last.parsed_date().and_then(|d| months_before(d, months));
    let Some(cutoff) = cutoff else {
        warn!(date = %last.date, "latest date unreadable, keeping last {} points", FALLBACK_POINTS);
        let start = series.len().saturating_sub(FALLBACK_POINTS);
        return series[start..].to_vec();
    };

    series
        .iter()
        .filter(|dp| dp.parsed_date().is_some_and(|d| d >= cutoff))
        .cloned()
        .collect()
}
