//! Pipeline orchestration
//!
//! This module provides the public API for SpatialIQ.
//! It runs raw student fields through every stage and bundles the outputs.

use crate::classifier::{ClassifierConfig, HeuristicClassifier};
use crate::error::{ComputeError, ValidationError};
use crate::features::FeatureDeriver;
use crate::history::{HistorySummary, PredictionHistory};
use crate::normalizer::Normalizer;
use crate::recommend::RecommendationEngine;
use crate::schema::RawFields;
use crate::types::{
    BatchResult, BatchRow, BatchSummary, RowOutcome, SpatialClass, StudentPrediction,
    StudentRecord,
};
use std::collections::{BTreeMap, HashMap};

/// Default number of memoized predictions held by a processor
pub const DEFAULT_CACHE_CAPACITY: usize = 256;

/// Predict a single student from raw fields.
///
/// # Arguments
/// * `raw` - Field name to raw value mapping
///
/// # Returns
/// The full prediction bundle, or the first validation failure
///
/// # Example
/// ```ignore
/// let raw = RawFieldsAdapter::parse_object(r#"{"age": 16, "gender": "Female", ...}"#)?;
/// let bundle = predict_one(&raw)?;
/// println!("{}", bundle.prediction.predicted_class);
/// ```
pub fn predict_one(raw: &RawFields) -> Result<StudentPrediction, ValidationError> {
    SpatialPipeline::default().predict(raw)
}

/// Predict every row of a batch.
///
/// Rows are processed in order; a row that fails validation becomes a failure
/// row and the remaining rows are still processed.
pub fn run_batch(rows: &[RawFields]) -> BatchResult {
    SpatialPipeline::default().run_batch(rows)
}

/// Alias of [`run_batch`]
pub fn predict_batch(rows: &[RawFields]) -> BatchResult {
    run_batch(rows)
}

/// Configured pipeline: classifier plus rule table.
///
/// Pipeline stages:
/// 1. Normalizer - Validate and coerce raw fields
/// 2. FeatureDeriver - Compute composite indices
/// 3. HeuristicClassifier - Score and classify
/// 4. RecommendationEngine - Apply the rule table
#[derive(Debug, Clone, Default)]
pub struct SpatialPipeline {
    classifier: HeuristicClassifier,
    engine: RecommendationEngine,
}

impl SpatialPipeline {
    pub fn new(classifier: HeuristicClassifier, engine: RecommendationEngine) -> Self {
        Self { classifier, engine }
    }

    /// Pipeline with a classifier built from config and the default rules
    pub fn from_config(config: &ClassifierConfig) -> Result<Self, ComputeError> {
        Ok(Self::new(
            HeuristicClassifier::from_config(config)?,
            RecommendationEngine::default(),
        ))
    }

    pub fn classifier(&self) -> &HeuristicClassifier {
        &self.classifier
    }

    pub fn engine(&self) -> &RecommendationEngine {
        &self.engine
    }

    /// Run one raw row through every stage
    pub fn predict(&self, raw: &RawFields) -> Result<StudentPrediction, ValidationError> {
        // Stage 1: Validate and coerce
        let record = Normalizer::normalize(raw)?;
        Ok(self.predict_record(record))
    }

    /// Run an already validated record through the remaining stages
    pub fn predict_record(&self, record: StudentRecord) -> StudentPrediction {
        // Stage 2: Composite indices
        let indices = FeatureDeriver::derive(&record);
        log::debug!(
            "indices: efficiency={:.4} spatial={:.4} gaming={:.1}",
            indices.study_efficiency,
            indices.spatial_score,
            indices.gaming_engagement
        );

        // Stage 3: Classification
        let prediction = self.classifier.classify(&record, &indices);
        let factors = self.classifier.contributions(&record, &indices);

        // Stage 4: Recommendations
        let recommendations = self.engine.recommend(&record, &prediction);

        StudentPrediction {
            record,
            indices,
            prediction,
            factors,
            recommendations,
        }
    }

    /// Predict every row, isolating failures
    pub fn run_batch(&self, rows: &[RawFields]) -> BatchResult {
        process_rows(rows, |raw| self.predict(raw))
    }
}

/// Run `predict` over every row in order, turning errors into failure rows
fn process_rows<F>(rows: &[RawFields], mut predict: F) -> BatchResult
where
    F: FnMut(&RawFields) -> Result<StudentPrediction, ValidationError>,
{
    let rows: Vec<BatchRow> = rows
        .iter()
        .enumerate()
        .map(|(index, raw)| {
            let outcome = match predict(raw) {
                Ok(prediction) => RowOutcome::Success(Box::new(prediction)),
                Err(err) => {
                    log::warn!("row {index} rejected: {err}");
                    RowOutcome::Failure(err)
                }
            };
            BatchRow { index, outcome }
        })
        .collect();

    let summary = summarize(&rows);
    log::info!(
        "batch complete: {} rows, {} succeeded, {} failed",
        summary.total_rows,
        summary.succeeded,
        summary.failed
    );

    BatchResult { rows, summary }
}

/// Aggregate statistics over processed rows
pub fn summarize(rows: &[BatchRow]) -> BatchSummary {
    let mut class_counts: BTreeMap<SpatialClass, usize> =
        SpatialClass::ALL.iter().map(|class| (*class, 0)).collect();
    let mut confidence_sum = 0.0;
    let mut succeeded = 0;

    for row in rows {
        if let RowOutcome::Success(prediction) = &row.outcome {
            succeeded += 1;
            confidence_sum += prediction.prediction.confidence;
            *class_counts
                .entry(prediction.prediction.predicted_class)
                .or_insert(0) += 1;
        }
    }

    let count_of = |classes: &[SpatialClass]| -> usize {
        classes
            .iter()
            .map(|class| class_counts.get(class).copied().unwrap_or(0))
            .sum()
    };
    let high_or_above = count_of(&[SpatialClass::High, SpatialClass::VeryHigh]);
    let low_or_below = count_of(&[SpatialClass::VeryLow, SpatialClass::Low]);

    BatchSummary {
        total_rows: rows.len(),
        succeeded,
        failed: rows.len() - succeeded,
        class_counts,
        mean_confidence: if succeeded > 0 {
            Some(confidence_sum / succeeded as f64)
        } else {
            None
        },
        high_or_above,
        low_or_below,
    }
}

/// Stateful processor with a memo cache and persistent prediction history.
///
/// Use this when predictions are made over a long-lived session and the
/// history should survive between runs.
pub struct SpatialProcessor {
    pipeline: SpatialPipeline,
    history: PredictionHistory,
    cache: Option<HashMap<String, StudentPrediction>>,
    cache_capacity: usize,
    cache_hits: u64,
}

impl Default for SpatialProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl SpatialProcessor {
    /// Create a new processor with default settings
    pub fn new() -> Self {
        Self {
            pipeline: SpatialPipeline::default(),
            history: PredictionHistory::default(),
            cache: Some(HashMap::new()),
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            cache_hits: 0,
        }
    }

    /// Create a processor with a specific history window size
    pub fn with_history_window(window: usize) -> Self {
        Self {
            history: PredictionHistory::new(window),
            ..Self::new()
        }
    }

    /// Create a processor with a custom classifier configuration
    pub fn with_config(config: &ClassifierConfig) -> Result<Self, ComputeError> {
        Ok(Self {
            pipeline: SpatialPipeline::from_config(config)?,
            ..Self::new()
        })
    }

    /// Enable or disable memoization of identical records
    pub fn with_cache(mut self, enabled: bool) -> Self {
        self.cache = if enabled { Some(HashMap::new()) } else { None };
        self
    }

    /// Bound the number of memoized predictions
    pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = capacity;
        self
    }

    pub fn pipeline(&self) -> &SpatialPipeline {
        &self.pipeline
    }

    pub fn history(&self) -> &PredictionHistory {
        &self.history
    }

    pub fn history_summary(&self) -> HistorySummary {
        self.history.summary()
    }

    pub fn cache_hits(&self) -> u64 {
        self.cache_hits
    }

    pub fn cache_len(&self) -> usize {
        self.cache.as_ref().map_or(0, HashMap::len)
    }

    pub fn clear_cache(&mut self) {
        if let Some(cache) = self.cache.as_mut() {
            cache.clear();
        }
    }

    /// Predict one student and remember the result
    pub fn predict(&mut self, raw: &RawFields) -> Result<StudentPrediction, ValidationError> {
        let record = Normalizer::normalize(raw)?;
        let prediction = self.predict_cached(record);
        self.history.record(&prediction);
        Ok(prediction)
    }

    /// Predict a batch, remembering every successful row
    pub fn predict_batch(&mut self, rows: &[RawFields]) -> BatchResult {
        let result = process_rows(rows, |raw| self.predict(raw));
        log::debug!("{} cache hits so far", self.cache_hits);
        result
    }

    /// Load history state from JSON.
    ///
    /// The processor keeps its configured window; a snapshot with more
    /// entries keeps only the newest that fit.
    pub fn load_history(&mut self, json: &str) -> Result<(), ComputeError> {
        let mut history = PredictionHistory::from_json(json)
            .map_err(|e| ComputeError::ParseError(e.to_string()))?;
        history.set_window_size(self.history.window_size());
        self.history = history;
        Ok(())
    }

    /// Save history state to JSON
    pub fn save_history(&self) -> Result<String, ComputeError> {
        self.history
            .to_json()
            .map_err(|e| ComputeError::EncodingError(e.to_string()))
    }

    fn predict_cached(&mut self, record: StudentRecord) -> StudentPrediction {
        let key = match (&self.cache, serde_json::to_string(&record)) {
            (Some(_), Ok(key)) => key,
            _ => return self.pipeline.predict_record(record),
        };

        if let Some(hit) = self.cache.as_ref().and_then(|cache| cache.get(&key)) {
            self.cache_hits += 1;
            log::debug!("cache hit ({} total)", self.cache_hits);
            return hit.clone();
        }

        let prediction = self.pipeline.predict_record(record);
        if let Some(cache) = self.cache.as_mut() {
            if cache.len() >= self.cache_capacity {
                cache.clear();
            }
            if self.cache_capacity > 0 {
                cache.insert(key, prediction.clone());
            }
        }
        prediction
    }
}
