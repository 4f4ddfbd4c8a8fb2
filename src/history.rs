//! Prediction history
//!
//! Keeps a bounded rolling window of past predictions so a long-lived
//! processor can report how a cohort has been classified over time.

use crate::types::{CompositeIndices, SpatialClass, StudentPrediction};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};

/// Default number of predictions kept
pub const DEFAULT_HISTORY_WINDOW: usize = 100;

/// One remembered prediction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub recorded_at: DateTime<Utc>,
    pub predicted_class: SpatialClass,
    pub confidence: f64,
    pub raw_score: f64,
    pub indices: CompositeIndices,
}

impl HistoryEntry {
    fn from_prediction(prediction: &StudentPrediction, recorded_at: DateTime<Utc>) -> Self {
        Self {
            recorded_at,
            predicted_class: prediction.prediction.predicted_class,
            confidence: prediction.prediction.confidence,
            raw_score: prediction.prediction.raw_score,
            indices: prediction.indices,
        }
    }
}

/// Aggregate view over the current window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistorySummary {
    pub entries: usize,
    pub class_counts: BTreeMap<SpatialClass, usize>,
    pub mean_confidence: Option<f64>,
    pub mean_raw_score: Option<f64>,
    pub first_recorded_at: Option<DateTime<Utc>>,
    pub last_recorded_at: Option<DateTime<Utc>>,
}

/// Rolling window of predictions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionHistory {
    entries: VecDeque<HistoryEntry>,
    /// Maximum window size
    window_size: usize,
}

impl Default for PredictionHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_WINDOW)
    }
}

impl PredictionHistory {
    /// Create an empty history with the given window size
    pub fn new(window_size: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(window_size),
            window_size,
        }
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries from oldest to newest
    pub fn entries(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    /// Remember a prediction, timestamped now
    pub fn record(&mut self, prediction: &StudentPrediction) {
        self.record_at(prediction, Utc::now());
    }

    /// Remember a prediction with an explicit timestamp
    pub fn record_at(&mut self, prediction: &StudentPrediction, recorded_at: DateTime<Utc>) {
        self.entries
            .push_back(HistoryEntry::from_prediction(prediction, recorded_at));
        self.trim();
    }

    /// Change the window size, dropping the oldest entries that no longer fit
    pub fn set_window_size(&mut self, window_size: usize) {
        self.window_size = window_size;
        self.trim();
    }

    fn trim(&mut self) {
        while self.entries.len() > self.window_size {
            self.entries.pop_front();
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Summarize the current window
    pub fn summary(&self) -> HistorySummary {
        let mut class_counts: BTreeMap<SpatialClass, usize> =
            SpatialClass::ALL.iter().map(|class| (*class, 0)).collect();
        for entry in &self.entries {
            *class_counts.entry(entry.predicted_class).or_insert(0) += 1;
        }

        HistorySummary {
            entries: self.entries.len(),
            class_counts,
            mean_confidence: Self::mean(self.entries.iter().map(|e| e.confidence)),
            mean_raw_score: Self::mean(self.entries.iter().map(|e| e.raw_score)),
            first_recorded_at: self.entries.front().map(|e| e.recorded_at),
            last_recorded_at: self.entries.back().map(|e| e.recorded_at),
        }
    }

    fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
        let (sum, count) = values.fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
        if count == 0 {
            None
        } else {
            Some(sum / count as f64)
        }
    }

    /// Load history from JSON
    ///
    /// Snapshots holding more entries than their window keep only the newest.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let mut history: Self = serde_json::from_str(json)?;
        history.trim();
        Ok(history)
    }

    /// Serialize history to JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::predict_one;
    use crate::schema::RawFieldsAdapter;
    use chrono::TimeZone;

    fn make_prediction(gpa: f64) -> StudentPrediction {
        let raw = RawFieldsAdapter::parse_object(&format!(
            r#"{{"age": 16, "gender": "Female", "gpa": {gpa}, "study_time": 12,
                "visual_learning": 6, "map_usage": 1}}"#
        ))
        .unwrap();
        predict_one(&raw).unwrap()
    }

    #[test]
    fn test_history_window_rolling() {
        let mut history = PredictionHistory::new(3);
        for gpa in [1.0, 1.5, 2.0, 3.0, 4.0] {
            history.record(&make_prediction(gpa));
        }

        assert_eq!(history.len(), 3);
        let scores: Vec<f64> = history.entries().map(|e| e.raw_score).collect();
        // Oldest two were evicted, remaining scores still ascend with GPA
        assert!(scores.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(history.summary().entries, 3);
    }

    #[test]
    fn test_summary_counts_every_class() {
        let history = PredictionHistory::default();
        let summary = history.summary();

        assert_eq!(summary.entries, 0);
        assert_eq!(summary.class_counts.len(), 5);
        assert!(summary.class_counts.values().all(|count| *count == 0));
        assert_eq!(summary.mean_confidence, None);
        assert_eq!(summary.first_recorded_at, None);
    }

    #[test]
    fn test_summary_statistics() {
        let mut history = PredictionHistory::new(10);
        let first = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
        let last = Utc.with_ymd_and_hms(2024, 3, 2, 9, 0, 0).unwrap();
        let a = make_prediction(2.0);
        let b = make_prediction(3.5);
        history.record_at(&a, first);
        history.record_at(&b, last);

        let summary = history.summary();
        let expected = (a.prediction.confidence + b.prediction.confidence) / 2.0;
        assert!((summary.mean_confidence.unwrap() - expected).abs() < 1e-12);
        assert_eq!(summary.first_recorded_at, Some(first));
        assert_eq!(summary.last_recorded_at, Some(last));
        assert_eq!(summary.class_counts.values().sum::<usize>(), 2);
    }

    #[test]
    fn test_serialization() {
        let mut history = PredictionHistory::new(5);
        history.record(&make_prediction(3.0));

        let json = history.to_json().unwrap();
        let loaded = PredictionHistory::from_json(&json).unwrap();

        assert_eq!(loaded.window_size(), 5);
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded, history);
    }

    #[test]
    fn test_oversized_snapshot_keeps_newest() {
        let mut history = PredictionHistory::new(5);
        let start = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
        for (day, gpa) in [1.0, 1.5, 2.0, 3.0, 4.0].into_iter().enumerate() {
            history.record_at(&make_prediction(gpa), start + chrono::Duration::days(day as i64));
        }

        let mut snapshot: serde_json::Value =
            serde_json::from_str(&history.to_json().unwrap()).unwrap();
        snapshot["window_size"] = serde_json::json!(2);
        let loaded = PredictionHistory::from_json(&snapshot.to_string()).unwrap();

        assert_eq!(loaded.window_size(), 2);
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded.summary().entries, 2);
        assert_eq!(loaded.summary().first_recorded_at, Some(start + chrono::Duration::days(3)));
    }

    #[test]
    fn test_shrinking_window_drops_oldest() {
        let mut history = PredictionHistory::new(4);
        for gpa in [1.0, 2.0, 3.0, 4.0] {
            history.record(&make_prediction(gpa));
        }
        let newest = history.entries().last().unwrap().clone();

        history.set_window_size(1);

        assert_eq!(history.len(), 1);
        assert_eq!(history.entries().next(), Some(&newest));
    }
}
