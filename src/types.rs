//! Core types for the SpatialIQ pipeline
//!
//! This module defines the data structures that flow through each stage of the
//! pipeline: the normalized student record, composite indices, the classifier's
//! prediction, recommendations, and batch results.

use crate::error::ValidationError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Closed set of labelled categories accepted by the normalizer.
///
/// Labels are matched case-insensitively, ignoring spaces, `-` and `_`.
pub trait Categorical: Sized + Copy + 'static {
    /// Every variant, in declaration order
    const VARIANTS: &'static [Self];

    /// Canonical label as it appears in tabular input and output
    fn label(&self) -> &'static str;

    /// Additional accepted spellings
    fn aliases(&self) -> &'static [&'static str] {
        &[]
    }

    /// Resolve a raw label to a variant
    fn from_label(raw: &str) -> Option<Self> {
        let key = label_key(raw);
        if key.is_empty() {
            return None;
        }
        Self::VARIANTS.iter().copied().find(|variant| {
            label_key(variant.label()) == key
                || variant.aliases().iter().any(|alias| label_key(alias) == key)
        })
    }

    /// Human-readable list of accepted labels
    fn domain() -> String {
        Self::VARIANTS
            .iter()
            .map(|v| v.label())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

fn label_key(raw: &str) -> String {
    raw.chars()
        .filter(|c| !matches!(c, ' ' | '-' | '_'))
        .flat_map(char::to_lowercase)
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Categorical for Gender {
    const VARIANTS: &'static [Self] = &[Gender::Male, Gender::Female, Gender::Other];

    fn label(&self) -> &'static str {
        match self {
            Gender::Male => "Male",
            Gender::Female => "Female",
            Gender::Other => "Other",
        }
    }

    fn aliases(&self) -> &'static [&'static str] {
        match self {
            Gender::Male => &["M"],
            Gender::Female => &["F"],
            Gender::Other => &["O"],
        }
    }
}

/// Living environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Urban,
    Suburban,
    Rural,
}

impl Categorical for Environment {
    const VARIANTS: &'static [Self] = &[
        Environment::Urban,
        Environment::Suburban,
        Environment::Rural,
    ];

    fn label(&self) -> &'static str {
        match self {
            Environment::Urban => "Urban",
            Environment::Suburban => "Suburban",
            Environment::Rural => "Rural",
        }
    }
}

/// Academic track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Major {
    Science,
    Technical,
    Mathematical,
    Vocational,
    Humanism,
    Engineering,
    Health,
    #[serde(rename = "Not chosen yet")]
    NotChosen,
}

impl Categorical for Major {
    const VARIANTS: &'static [Self] = &[
        Major::Science,
        Major::Technical,
        Major::Mathematical,
        Major::Vocational,
        Major::Humanism,
        Major::Engineering,
        Major::Health,
        Major::NotChosen,
    ];

    fn label(&self) -> &'static str {
        match self {
            Major::Science => "Science",
            Major::Technical => "Technical",
            Major::Mathematical => "Mathematical",
            Major::Vocational => "Vocational",
            Major::Humanism => "Humanism",
            Major::Engineering => "Engineering",
            Major::Health => "Health",
            Major::NotChosen => "Not chosen yet",
        }
    }

    fn aliases(&self) -> &'static [&'static str] {
        match self {
            Major::Mathematical => &["Math", "Mathematics"],
            Major::NotChosen => &["None", "Undecided"],
            _ => &[],
        }
    }
}

/// Teacher's assessment of the student
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TeacherAssessment {
    Low,
    Medium,
    High,
}

impl Categorical for TeacherAssessment {
    const VARIANTS: &'static [Self] = &[
        TeacherAssessment::Low,
        TeacherAssessment::Medium,
        TeacherAssessment::High,
    ];

    fn label(&self) -> &'static str {
        match self {
            TeacherAssessment::Low => "Low",
            TeacherAssessment::Medium => "Medium",
            TeacherAssessment::High => "High",
        }
    }
}

/// Highest education level of the parents
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ParentalEducation {
    #[serde(rename = "High School")]
    HighSchool,
    Bachelor,
    Master,
    #[serde(rename = "PhD")]
    Phd,
}

impl Categorical for ParentalEducation {
    const VARIANTS: &'static [Self] = &[
        ParentalEducation::HighSchool,
        ParentalEducation::Bachelor,
        ParentalEducation::Master,
        ParentalEducation::Phd,
    ];

    fn label(&self) -> &'static str {
        match self {
            ParentalEducation::HighSchool => "High School",
            ParentalEducation::Bachelor => "Bachelor",
            ParentalEducation::Master => "Master",
            ParentalEducation::Phd => "PhD",
        }
    }
}

/// Family income bracket
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FamilyIncome {
    Low,
    #[serde(rename = "Middle-Low")]
    MiddleLow,
    Middle,
    #[serde(rename = "Middle-High")]
    MiddleHigh,
    High,
}

impl Categorical for FamilyIncome {
    const VARIANTS: &'static [Self] = &[
        FamilyIncome::Low,
        FamilyIncome::MiddleLow,
        FamilyIncome::Middle,
        FamilyIncome::MiddleHigh,
        FamilyIncome::High,
    ];

    fn label(&self) -> &'static str {
        match self {
            FamilyIncome::Low => "Low",
            FamilyIncome::MiddleLow => "Middle-Low",
            FamilyIncome::Middle => "Middle",
            FamilyIncome::MiddleHigh => "Middle-High",
            FamilyIncome::High => "High",
        }
    }
}

/// Per-genre gaming preferences (0-5 each)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GamingPreferences {
    pub action: f64,
    pub strategy: f64,
    pub puzzle: f64,
    pub adventure: f64,
    pub simulation: f64,
    pub sports: f64,
}

impl GamingPreferences {
    /// Sum over all genres
    pub fn total(&self) -> f64 {
        self.action + self.strategy + self.puzzle + self.adventure + self.simulation + self.sports
    }
}

/// Family background attributes
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FamilyBackground {
    pub parental_education: ParentalEducation,
    pub family_size: u32,
    pub income: FamilyIncome,
}

/// One student's canonical attributes after normalization.
///
/// GPA is on the 0.0-4.0 scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentRecord {
    /// Age in years (10-25)
    pub age: u32,
    pub gender: Gender,
    pub environment: Environment,
    pub major: Major,
    /// Grade point average (0.0-4.0)
    pub gpa: f64,
    /// Study time (hours/week)
    pub study_time: f64,
    /// Number of extra classes taken
    pub extra_classes: u32,
    pub teacher_assessment: TeacherAssessment,
    /// Internet usage (hours/day)
    pub internet_usage: f64,
    /// TV watching (hours/day)
    pub tv_watching: f64,
    /// Pattern recognition self-assessment (0-10)
    pub spatial_skills: f64,
    pub gaming: GamingPreferences,
    /// Visual learning preference (0-10)
    pub visual_learning: f64,
    pub map_usage: bool,
    pub gis_experience: bool,
    pub family: FamilyBackground,
}

/// Secondary indices derived from a student record
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CompositeIndices {
    /// GPA per study hour (gpa / (study_time + epsilon))
    pub study_efficiency: f64,
    /// Sum of all gaming genre preferences
    pub gaming_engagement: f64,
    /// Weighted visual learning, map usage and GIS experience (0-1)
    pub spatial_score: f64,
    /// Internet usage plus gaming engagement
    pub digital_lifestyle: f64,
}

/// Ordered spatial intelligence level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SpatialClass {
    #[serde(rename = "Very Low")]
    VeryLow,
    Low,
    Medium,
    High,
    #[serde(rename = "Very High")]
    VeryHigh,
}

impl SpatialClass {
    /// All classes, lowest first
    pub const ALL: [SpatialClass; 5] = [
        SpatialClass::VeryLow,
        SpatialClass::Low,
        SpatialClass::Medium,
        SpatialClass::High,
        SpatialClass::VeryHigh,
    ];

    /// Ordinal position (0 = VeryLow)
    pub fn ordinal(&self) -> usize {
        match self {
            SpatialClass::VeryLow => 0,
            SpatialClass::Low => 1,
            SpatialClass::Medium => 2,
            SpatialClass::High => 3,
            SpatialClass::VeryHigh => 4,
        }
    }

    pub fn from_ordinal(ordinal: usize) -> Option<Self> {
        Self::ALL.get(ordinal).copied()
    }

    pub fn label(&self) -> &'static str {
        match self {
            SpatialClass::VeryLow => "Very Low",
            SpatialClass::Low => "Low",
            SpatialClass::Medium => "Medium",
            SpatialClass::High => "High",
            SpatialClass::VeryHigh => "Very High",
        }
    }
}

impl fmt::Display for SpatialClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Output of the heuristic classifier for one record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub predicted_class: SpatialClass,
    /// Score of the predicted class (0-1)
    pub confidence: f64,
    /// Aptitude score before thresholding (0-1)
    pub raw_score: f64,
    /// Full distribution over all five classes, summing to 1
    pub class_scores: BTreeMap<SpatialClass, f64>,
}

impl PredictionResult {
    pub fn score_for(&self, class: SpatialClass) -> f64 {
        self.class_scores.get(&class).copied().unwrap_or(0.0)
    }
}

/// Advisory (title, rationale) pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    pub title: String,
    pub rationale: String,
}

/// How much one score term contributed to the raw aptitude score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactorContribution {
    pub name: String,
    pub weight: f64,
    /// Term value after scaling to 0-1
    pub value: f64,
    /// weight * value
    pub contribution: f64,
}

/// Everything the pipeline produces for one student
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentPrediction {
    pub record: StudentRecord,
    pub indices: CompositeIndices,
    pub prediction: PredictionResult,
    /// Score terms, in term table order
    pub factors: Vec<FactorContribution>,
    pub recommendations: Vec<Recommendation>,
}

/// Outcome of one batch row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RowOutcome {
    Success(Box<StudentPrediction>),
    Failure(ValidationError),
}

/// One batch row tagged with its original position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchRow {
    pub index: usize,
    pub outcome: RowOutcome,
}

/// A row-level failure as reported to callers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowFailure {
    pub index: usize,
    pub field: String,
    /// "missing", "wrong type" or "out of domain"
    pub reason: String,
    pub message: String,
}

/// Aggregate statistics over a batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub total_rows: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Count per predicted class; every class is present
    pub class_counts: BTreeMap<SpatialClass, usize>,
    /// Mean confidence over successful rows
    pub mean_confidence: Option<f64>,
    /// Rows predicted High or Very High
    pub high_or_above: usize,
    /// Rows predicted Low or Very Low
    pub low_or_below: usize,
}

/// Result of a batch invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchResult {
    /// Rows in input order
    pub rows: Vec<BatchRow>,
    pub summary: BatchSummary,
}

impl BatchResult {
    /// Successful rows in input order
    pub fn successful(&self) -> Vec<(usize, &StudentPrediction)> {
        self.rows
            .iter()
            .filter_map(|row| match &row.outcome {
                RowOutcome::Success(prediction) => Some((row.index, prediction.as_ref())),
                RowOutcome::Failure(_) => None,
            })
            .collect()
    }

    /// Failed rows in input order
    pub fn failures(&self) -> Vec<RowFailure> {
        self.rows
            .iter()
            .filter_map(|row| match &row.outcome {
                RowOutcome::Failure(err) => Some(RowFailure {
                    index: row.index,
                    field: err.field.clone(),
                    reason: err.reason.label().to_string(),
                    message: err.to_string(),
                }),
                RowOutcome::Success(_) => None,
            })
            .collect()
    }

    /// Prediction for a given input row, if it succeeded
    pub fn prediction_at(&self, index: usize) -> Option<&StudentPrediction> {
        self.rows.get(index).and_then(|row| match &row.outcome {
            RowOutcome::Success(prediction) => Some(prediction.as_ref()),
            RowOutcome::Failure(_) => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categorical_label_matching() {
        assert_eq!(Gender::from_label("F"), Some(Gender::Female));
        assert_eq!(Gender::from_label(" female "), Some(Gender::Female));
        assert_eq!(FamilyIncome::from_label("middle_high"), Some(FamilyIncome::MiddleHigh));
        assert_eq!(
            ParentalEducation::from_label("high school"),
            Some(ParentalEducation::HighSchool)
        );
        assert_eq!(Major::from_label("Math"), Some(Major::Mathematical));
        assert_eq!(Major::from_label("not-chosen-yet"), Some(Major::NotChosen));
        assert_eq!(Environment::from_label("coastal"), None);
        assert_eq!(Environment::from_label(""), None);
    }

    #[test]
    fn test_spatial_class_ordering() {
        assert!(SpatialClass::VeryLow < SpatialClass::Low);
        assert!(SpatialClass::High < SpatialClass::VeryHigh);
        for (i, class) in SpatialClass::ALL.iter().enumerate() {
            assert_eq!(class.ordinal(), i);
            assert_eq!(SpatialClass::from_ordinal(i), Some(*class));
        }
        assert_eq!(SpatialClass::from_ordinal(5), None);
    }

    #[test]
    fn test_spatial_class_serializes_as_label() {
        let json = serde_json::to_string(&SpatialClass::VeryHigh).unwrap();
        assert_eq!(json, "\"Very High\"");
        let back: SpatialClass = serde_json::from_str("\"Very Low\"").unwrap();
        assert_eq!(back, SpatialClass::VeryLow);
    }

    #[test]
    fn test_gaming_total() {
        let gaming = GamingPreferences {
            action: 2.0,
            strategy: 2.0,
            puzzle: 3.0,
            adventure: 2.0,
            simulation: 0.5,
            sports: 0.0,
        };
        assert!((gaming.total() - 9.5).abs() < 1e-12);
    }
}
