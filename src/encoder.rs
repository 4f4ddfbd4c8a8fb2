//! Report encoding
//!
//! This module wraps prediction results in a JSON report envelope carrying
//! producer metadata, so downstream consumers can tell which build and which
//! encoder instance computed a report.

use crate::error::ComputeError;
use crate::history::HistorySummary;
use crate::types::{BatchResult, StudentPrediction};
use crate::{PRODUCER_NAME, SPATIALIQ_VERSION};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Current report envelope version
pub const REPORT_VERSION: &str = "1.0.0";

/// Who computed a report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportProducer {
    pub name: String,
    pub version: String,
    pub instance_id: String,
}

/// Report envelope around a body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report<B> {
    pub report_version: String,
    pub producer: ReportProducer,
    /// RFC 3339 timestamp
    pub computed_at_utc: String,
    pub body: B,
}

/// Encoder for producing report envelopes
pub struct ReportEncoder {
    instance_id: String,
}

impl Default for ReportEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportEncoder {
    /// Create a new encoder with a unique instance ID
    pub fn new() -> Self {
        Self {
            instance_id: Uuid::new_v4().to_string(),
        }
    }

    /// Create an encoder with a specific instance ID
    pub fn with_instance_id(instance_id: String) -> Self {
        Self { instance_id }
    }

    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    /// Wrap any body in an envelope stamped now
    pub fn wrap<B>(&self, body: B) -> Report<B> {
        Report {
            report_version: REPORT_VERSION.to_string(),
            producer: ReportProducer {
                name: PRODUCER_NAME.to_string(),
                version: SPATIALIQ_VERSION.to_string(),
                instance_id: self.instance_id.clone(),
            },
            computed_at_utc: Utc::now().to_rfc3339(),
            body,
        }
    }

    pub fn encode_prediction<'a>(
        &self,
        prediction: &'a StudentPrediction,
    ) -> Report<&'a StudentPrediction> {
        self.wrap(prediction)
    }

    pub fn encode_batch<'a>(&self, batch: &'a BatchResult) -> Report<&'a BatchResult> {
        self.wrap(batch)
    }

    pub fn encode_history<'a>(&self, summary: &'a HistorySummary) -> Report<&'a HistorySummary> {
        self.wrap(summary)
    }

    /// Encode a single prediction to a JSON string
    pub fn prediction_to_json(
        &self,
        prediction: &StudentPrediction,
        pretty: bool,
    ) -> Result<String, ComputeError> {
        to_json(&self.encode_prediction(prediction), pretty)
    }

    /// Encode a batch result to a JSON string
    pub fn batch_to_json(&self, batch: &BatchResult, pretty: bool) -> Result<String, ComputeError> {
        to_json(&self.encode_batch(batch), pretty)
    }
}

/// Serialize a report, optionally pretty-printed
pub fn to_json<T: Serialize>(report: &T, pretty: bool) -> Result<String, ComputeError> {
    let json = if pretty {
        serde_json::to_string_pretty(report)
    } else {
        serde_json::to_string(report)
    };
    json.map_err(ComputeError::JsonError)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{predict_one, run_batch};
    use crate::schema::RawFieldsAdapter;
    use pretty_assertions::assert_eq;

    fn make_prediction() -> StudentPrediction {
        let raw = RawFieldsAdapter::parse_object(
            r#"{"age": 17, "gender": "Other", "gpa": 3.1, "study_time": 9,
                "visual_learning": 4, "gis_experience": "yes"}"#,
        )
        .unwrap();
        predict_one(&raw).unwrap()
    }

    #[test]
    fn test_encode_prediction_envelope() {
        let prediction = make_prediction();
        let encoder = ReportEncoder::with_instance_id("test-instance".to_string());
        let report = encoder.encode_prediction(&prediction);

        assert_eq!(report.report_version, REPORT_VERSION);
        assert_eq!(
            report.producer,
            ReportProducer {
                name: PRODUCER_NAME.to_string(),
                version: SPATIALIQ_VERSION.to_string(),
                instance_id: "test-instance".to_string(),
            }
        );
        assert!(chrono::DateTime::parse_from_rfc3339(&report.computed_at_utc).is_ok());
        assert_eq!(report.body, &prediction);
    }

    #[test]
    fn test_prediction_to_json() {
        let prediction = make_prediction();
        let encoder = ReportEncoder::new();
        let json = encoder.prediction_to_json(&prediction, false).unwrap();

        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["producer"]["name"], "spatialiq");
        assert_eq!(parsed["body"]["record"]["gender"], "Other");
        assert_eq!(
            parsed["body"]["prediction"]["predicted_class"],
            prediction.prediction.predicted_class.label()
        );
        assert_eq!(
            parsed["producer"]["instance_id"].as_str(),
            Some(encoder.instance_id())
        );
    }

    #[test]
    fn test_batch_to_json() {
        let raw = vec![RawFieldsAdapter::parse_object(r#"{"age": 16}"#).unwrap()];
        let batch = run_batch(&raw);
        let json = ReportEncoder::new().batch_to_json(&batch, true).unwrap();

        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["body"]["summary"]["failed"], 1);
        assert_eq!(parsed["body"]["rows"][0]["outcome"]["status"], "failure");
        assert_eq!(parsed["body"]["rows"][0]["outcome"]["field"], "gender");
        assert!(json.contains('\n'));
    }

    #[test]
    fn test_instance_ids_are_unique() {
        assert_ne!(
            ReportEncoder::new().instance_id(),
            ReportEncoder::new().instance_id()
        );
    }
}
