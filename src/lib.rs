//! SpatialIQ - Spatial intelligence scoring for student records
//!
//! SpatialIQ turns raw student attributes into a five-level spatial
//! intelligence prediction through a deterministic pipeline: field
//! normalization → composite indices → heuristic classification →
//! recommendations.
//!
//! ## Modules
//!
//! - **Pipeline**: Single and batch prediction, plus a stateful processor
//! - **Tabular**: CSV import/export and template generation
//! - **Encoder**: JSON report envelopes for downstream consumers

pub mod classifier;
pub mod encoder;
pub mod error;
pub mod features;
pub mod history;
pub mod normalizer;
pub mod pipeline;
pub mod recommend;
pub mod schema;
pub mod tabular;
pub mod types;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use classifier::{classify, ClassifierConfig, HeuristicClassifier};
pub use error::{ComputeError, ValidationError, ValidationReason};
pub use features::compute_indices;
pub use normalizer::normalize;
pub use pipeline::{predict_batch, predict_one, run_batch, SpatialPipeline, SpatialProcessor};
pub use recommend::recommend;

// Schema exports
pub use schema::{RawFields, RawFieldsAdapter, SCHEMA_VERSION};

/// SpatialIQ version embedded in all reports
pub const SPATIALIQ_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for reports
pub const PRODUCER_NAME: &str = "spatialiq";
