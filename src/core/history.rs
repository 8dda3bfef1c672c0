use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::{DataPoint, DerivedSeries};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub date: String,
    pub score: f64,
}

/// Daily record of the composite score, one entry per date, ascending.
///
/// Serializes as a plain JSON array so a caller can persist it wherever it
/// likes and hand it back with `from_json_str`. Deserializing re-sorts and
/// deduplicates (last one wins), since the stored form may have been edited
/// by hand.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<HistoryEntry>", into = "Vec<HistoryEntry>")]
pub struct CompositeHistory {
    entries: Vec<HistoryEntry>,
}

impl CompositeHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `score` for `date`, replacing any earlier score for that date.
    /// Returns whether the history changed.
    pub fn record(&mut self, date: NaiveDate, score: f64) -> bool {
        if !score.is_finite() {
            debug!(%date, "ignoring non-finite composite");
            return false;
        }
        let date = date.format("%Y-%m-%d").to_string();

        match self.entries.binary_search_by(|e| e.date.as_str().cmp(date.as_str())) {
            Ok(i) => {
                if self.entries[i].score == score {
                    return false;
                }
                self.entries[i].score = score;
            }
            Err(i) => self.entries.insert(i, HistoryEntry { date, score }),
        }
        true
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn latest(&self) -> Option<&HistoryEntry> {
        self.entries.last()
    }

    /// The history as a derived series, ready for period selection and stats.
    pub fn to_series(&self) -> DerivedSeries {
        self.entries
            .iter()
            .map(|e| DataPoint::new(e.date.clone(), e.score))
            .collect()
    }

    pub fn from_json_str(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

impl From<Vec<HistoryEntry>> for CompositeHistory {
    fn from(mut raw: Vec<HistoryEntry>) -> Self {
        raw.retain(|e| e.score.is_finite());
        raw.sort_by(|a, b| a.date.cmp(&b.date));

        let mut entries: Vec<HistoryEntry> = Vec::with_capacity(raw.len());
        for entry in raw {
            match entries.last_mut() {
                Some(last) if last.date == entry.date => *last = entry,
                _ => entries.push(entry),
            }
        }
        Self { entries }
    }
}

impl From<CompositeHistory> for Vec<HistoryEntry> {
    fn from(history: CompositeHistory) -> Self {
        history.entries
    }
}
