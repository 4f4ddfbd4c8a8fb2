//! Composite index derivation
//!
//! This module derives secondary indices from a normalized student record:
//! - Study efficiency (GPA per study hour)
//! - Gaming engagement and digital lifestyle
//! - Spatial score from visual learning, map usage and GIS experience

use crate::types::{CompositeIndices, StudentRecord};

/// Added to study time before dividing so zero study hours never divides by zero
pub const STUDY_EPSILON: f64 = 0.1;

/// Spatial score weight of visual learning (scaled to 0-1)
pub const SPATIAL_VISUAL_WEIGHT: f64 = 0.6;
/// Spatial score weight of map usage
pub const SPATIAL_MAP_WEIGHT: f64 = 0.2;
/// Spatial score weight of GIS experience
pub const SPATIAL_GIS_WEIGHT: f64 = 0.2;

/// Feature deriver for computing composite indices
pub struct FeatureDeriver;

impl FeatureDeriver {
    /// Derive composite indices from a student record
    pub fn derive(record: &StudentRecord) -> CompositeIndices {
        let gaming_engagement = compute_gaming_engagement(record);

        CompositeIndices {
            study_efficiency: compute_study_efficiency(record),
            gaming_engagement,
            spatial_score: compute_spatial_score(record),
            digital_lifestyle: record.internet_usage + gaming_engagement,
        }
    }
}

/// Derive composite indices from a student record
pub fn compute_indices(record: &StudentRecord) -> CompositeIndices {
    FeatureDeriver::derive(record)
}

/// GPA per study hour: gpa / (study_time + epsilon)
fn compute_study_efficiency(record: &StudentRecord) -> f64 {
    record.gpa / (record.study_time + STUDY_EPSILON)
}

/// Sum of every genre preference
fn compute_gaming_engagement(record: &StudentRecord) -> f64 {
    record.gaming.total()
}

/// Spatial score (0-1):
/// 0.6 * visual_learning / 10 + 0.2 * map_usage + 0.2 * gis_experience
fn compute_spatial_score(record: &StudentRecord) -> f64 {
    let visual = record.visual_learning / 10.0;
    let map = if record.map_usage { 1.0 } else { 0.0 };
    let gis = if record.gis_experience { 1.0 } else { 0.0 };

    SPATIAL_VISUAL_WEIGHT * visual + SPATIAL_MAP_WEIGHT * map + SPATIAL_GIS_WEIGHT * gis
}
