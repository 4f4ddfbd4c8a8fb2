//! Heuristic classification
//!
//! A deterministic scoring-and-thresholding function that stands in for a
//! trained model. It never reads a model file and never draws random numbers.
//!
//! 1. Raw aptitude score: weighted sum of score terms, each scaled to 0-1.
//!    Weights sum to 1, so the raw score is in 0-1.
//! 2. Class: number of cut-points strictly below the raw score. Upper bounds
//!    are inclusive (a score of exactly 0.4 is Low, not Medium).
//! 3. Class scores: each class gets `exp(-d / width)` where `d` is the distance
//!    from the raw score to the class interval (0 inside it), normalized to
//!    sum 1. The containing class always has the largest score; on an exact
//!    cut-point the two adjacent classes tie and the lower one wins.

use crate::error::ComputeError;
use crate::types::{
    CompositeIndices, FactorContribution, PredictionResult, SpatialClass, StudentRecord,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Score term value before weighting
pub type TermFn = fn(&StudentRecord, &CompositeIndices) -> f64;

/// One entry of the score term table
#[derive(Debug, Clone, Copy)]
pub struct ScoreTerm {
    pub name: &'static str,
    pub weight: f64,
    /// Scaled value; clamped to 0-1 before weighting
    pub value: TermFn,
}

/// Study efficiency at which the study efficiency term saturates
pub const STUDY_EFFICIENCY_SATURATION: f64 = 0.5;

/// Gaming engagement at which the gaming term saturates
pub const GAMING_SATURATION: f64 = 30.0;

/// Default score terms and weights
pub const SCORE_TERMS: &[ScoreTerm] = &[
    ScoreTerm {
        name: "gpa",
        weight: 0.35,
        value: |record, _| record.gpa / 4.0,
    },
    ScoreTerm {
        name: "spatial_score",
        weight: 0.25,
        value: |_, indices| indices.spatial_score,
    },
    ScoreTerm {
        name: "study_efficiency",
        weight: 0.15,
        value: |_, indices| indices.study_efficiency / STUDY_EFFICIENCY_SATURATION,
    },
    ScoreTerm {
        name: "visual_learning",
        weight: 0.10,
        value: |record, _| record.visual_learning / 10.0,
    },
    ScoreTerm {
        name: "spatial_skills",
        weight: 0.10,
        value: |record, _| record.spatial_skills / 10.0,
    },
    ScoreTerm {
        name: "gaming_engagement",
        weight: 0.05,
        value: |_, indices| indices.gaming_engagement / GAMING_SATURATION,
    },
];

/// Default cut-points between VeryLow|Low|Medium|High|VeryHigh
pub const CUT_POINTS: [f64; 4] = [0.2, 0.4, 0.6, 0.8];

/// Default kernel width for class score smoothing
pub const KERNEL_WIDTH: f64 = 0.05;

/// Widest accepted kernel. Wider kernels flatten the class scores until
/// neighbouring classes round to the same value.
pub const MAX_KERNEL_WIDTH: f64 = 1.0;

/// Serializable classifier settings.
///
/// Weights are keyed by term name; omitted terms keep their default weight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    pub weights: BTreeMap<String, f64>,
    pub cut_points: [f64; 4],
    pub kernel_width: f64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            weights: SCORE_TERMS
                .iter()
                .map(|term| (term.name.to_string(), term.weight))
                .collect(),
            cut_points: CUT_POINTS,
            kernel_width: KERNEL_WIDTH,
        }
    }
}

impl ClassifierConfig {
    /// Load settings from JSON
    pub fn from_json(json: &str) -> Result<Self, ComputeError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Deterministic five-class heuristic classifier
#[derive(Debug, Clone)]
pub struct HeuristicClassifier {
    terms: Vec<ScoreTerm>,
    cut_points: [f64; 4],
    kernel_width: f64,
}

impl Default for HeuristicClassifier {
    fn default() -> Self {
        Self {
            terms: SCORE_TERMS.to_vec(),
            cut_points: CUT_POINTS,
            kernel_width: KERNEL_WIDTH,
        }
    }
}

impl HeuristicClassifier {
    /// Build a classifier from validated settings.
    ///
    /// Weights are re-normalized to sum to 1.
    pub fn from_config(config: &ClassifierConfig) -> Result<Self, ComputeError> {
        if let Some(unknown) = config
            .weights
            .keys()
            .find(|name| !SCORE_TERMS.iter().any(|term| term.name == name.as_str()))
        {
            return Err(ComputeError::InvalidConfig(format!(
                "unknown score term '{unknown}'"
            )));
        }

        let mut terms: Vec<ScoreTerm> = SCORE_TERMS
            .iter()
            .map(|term| ScoreTerm {
                weight: config.weights.get(term.name).copied().unwrap_or(term.weight),
                ..*term
            })
            .collect();

        if let Some(bad) = terms.iter().find(|t| !t.weight.is_finite() || t.weight < 0.0) {
            return Err(ComputeError::InvalidConfig(format!(
                "weight for '{}' must be a non-negative number",
                bad.name
            )));
        }

        let total: f64 = terms.iter().map(|t| t.weight).sum();
        if total <= 0.0 {
            return Err(ComputeError::InvalidConfig(
                "weights must not all be zero".to_string(),
            ));
        }
        for term in &mut terms {
            term.weight /= total;
        }

        let cuts = config.cut_points;
        let in_range = cuts.iter().all(|c| c.is_finite() && *c > 0.0 && *c < 1.0);
        let increasing = cuts.windows(2).all(|pair| pair[0] < pair[1]);
        if !in_range || !increasing {
            return Err(ComputeError::InvalidConfig(format!(
                "cut points must be strictly increasing inside (0, 1), got {cuts:?}"
            )));
        }

        let width = config.kernel_width;
        if !width.is_finite() || width <= 0.0 || width > MAX_KERNEL_WIDTH {
            return Err(ComputeError::InvalidConfig(format!(
                "kernel width must be in (0, {MAX_KERNEL_WIDTH}], got {width}"
            )));
        }

        Ok(Self {
            terms,
            cut_points: cuts,
            kernel_width: config.kernel_width,
        })
    }

    /// Score terms with their effective weights
    pub fn terms(&self) -> &[ScoreTerm] {
        &self.terms
    }

    pub fn cut_points(&self) -> [f64; 4] {
        self.cut_points
    }

    pub fn kernel_width(&self) -> f64 {
        self.kernel_width
    }

    /// Per-term contributions to the raw score, in term table order
    pub fn contributions(
        &self,
        record: &StudentRecord,
        indices: &CompositeIndices,
    ) -> Vec<FactorContribution> {
        self.terms
            .iter()
            .map(|term| {
                let value = (term.value)(record, indices).clamp(0.0, 1.0);
                FactorContribution {
                    name: term.name.to_string(),
                    weight: term.weight,
                    value,
                    contribution: term.weight * value,
                }
            })
            .collect()
    }

    /// Raw aptitude score (0-1)
    pub fn raw_score(&self, record: &StudentRecord, indices: &CompositeIndices) -> f64 {
        self.terms
            .iter()
            .map(|term| term.weight * (term.value)(record, indices).clamp(0.0, 1.0))
            .sum::<f64>()
            .clamp(0.0, 1.0)
    }

    /// Class whose cut-point interval contains the score
    pub fn class_for_score(&self, score: f64) -> SpatialClass {
        let passed = self.cut_points.iter().filter(|cut| score > **cut).count();
        SpatialClass::from_ordinal(passed).unwrap_or(SpatialClass::VeryHigh)
    }

    /// Smoothed distribution over all five classes for a raw score
    pub fn class_scores(&self, score: f64) -> BTreeMap<SpatialClass, f64> {
        let weights: Vec<(SpatialClass, f64)> = SpatialClass::ALL
            .iter()
            .map(|class| {
                let distance = self.interval_distance(score, *class);
                (*class, (-distance / self.kernel_width).exp())
            })
            .collect();

        let total: f64 = weights.iter().map(|(_, w)| w).sum();
        weights.into_iter().map(|(class, w)| (class, w / total)).collect()
    }

    /// Classify a record
    pub fn classify(&self, record: &StudentRecord, indices: &CompositeIndices) -> PredictionResult {
        let raw_score = self.raw_score(record, indices);
        let class_scores = self.class_scores(raw_score);

        // The containing class is the argmax; reading it from the cut-points
        // keeps ties on an exact cut-point with the lower class.
        let predicted_class = self.class_for_score(raw_score);
        let confidence = class_scores.get(&predicted_class).copied().unwrap_or(0.0);

        log::debug!(
            "raw score {raw_score:.4} -> {predicted_class} ({:.1}% confidence)",
            confidence * 100.0
        );

        PredictionResult {
            predicted_class,
            confidence,
            raw_score,
            class_scores,
        }
    }

    /// Distance from a score to a class interval (lower, upper]
    fn interval_distance(&self, score: f64, class: SpatialClass) -> f64 {
        let k = class.ordinal();
        let lower = if k == 0 {
            f64::NEG_INFINITY
        } else {
            self.cut_points[k - 1]
        };
        let upper = if k == self.cut_points.len() {
            f64::INFINITY
        } else {
            self.cut_points[k]
        };

        if score < lower {
            lower - score
        } else if score > upper {
            score - upper
        } else {
            0.0
        }
    }
}

/// Classify a record with the default classifier
pub fn classify(record: &StudentRecord, indices: &CompositeIndices) -> PredictionResult {
    HeuristicClassifier::default().classify(record, indices)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::compute_indices;
    use crate::types::{
        Environment, FamilyBackground, FamilyIncome, GamingPreferences, Gender, Major,
        ParentalEducation, TeacherAssessment,
    };

    fn make_test_record(gpa: f64) -> StudentRecord {
        StudentRecord {
            age: 17,
            gender: Gender::Male,
            environment: Environment::Suburban,
            major: Major::Technical,
            gpa,
            study_time: 12.0,
            extra_classes: 0,
            teacher_assessment: TeacherAssessment::Medium,
            internet_usage: 4.0,
            tv_watching: 2.0,
            spatial_skills: 5.0,
            gaming: GamingPreferences {
                action: 3.0,
                strategy: 2.0,
                puzzle: 1.0,
                ..Default::default()
            },
            visual_learning: 6.0,
            map_usage: false,
            gis_experience: false,
            family: FamilyBackground {
                parental_education: ParentalEducation::Master,
                family_size: 3,
                income: FamilyIncome::MiddleLow,
            },
        }
    }

    fn assert_valid_distribution(result: &PredictionResult) {
        assert_eq!(result.class_scores.len(), 5);
        let sum: f64 = result.class_scores.values().sum();
        assert!((sum - 1.0).abs() < 1e-9, "sum was {sum}");
        for score in result.class_scores.values() {
            assert!((0.0..=1.0).contains(score));
        }
        let best = result
            .class_scores
            .values()
            .cloned()
            .fold(f64::NEG_INFINITY, f64::max);
        assert_eq!(result.score_for(result.predicted_class), best);
        assert_eq!(result.confidence, best);
    }

    #[test]
    fn test_default_weights_sum_to_one() {
        let total: f64 = SCORE_TERMS.iter().map(|t| t.weight).sum();
        assert!((total - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_cut_point_mapping() {
        let classifier = HeuristicClassifier::default();
        assert_eq!(classifier.class_for_score(0.0), SpatialClass::VeryLow);
        assert_eq!(classifier.class_for_score(0.2), SpatialClass::VeryLow);
        assert_eq!(classifier.class_for_score(0.21), SpatialClass::Low);
        assert_eq!(classifier.class_for_score(0.4), SpatialClass::Low);
        assert_eq!(classifier.class_for_score(0.5), SpatialClass::Medium);
        assert_eq!(classifier.class_for_score(0.79), SpatialClass::High);
        assert_eq!(classifier.class_for_score(0.81), SpatialClass::VeryHigh);
        assert_eq!(classifier.class_for_score(1.0), SpatialClass::VeryHigh);
    }

    #[test]
    fn test_containing_class_strictly_highest() {
        let classifier = HeuristicClassifier::default();
        for step in 0..=1000 {
            let score = step as f64 / 1000.0;
            if CUT_POINTS.contains(&score) {
                continue;
            }
            let expected = classifier.class_for_score(score);
            let scores = classifier.class_scores(score);
            let top = scores[&expected];
            for (class, value) in &scores {
                if *class != expected {
                    assert!(top > *value, "score {score}: {class} tied or beat {expected}");
                }
            }
        }
    }

    #[test]
    fn test_widest_kernel_keeps_containing_class_on_top() {
        let config = ClassifierConfig {
            kernel_width: MAX_KERNEL_WIDTH,
            ..Default::default()
        };
        let classifier = HeuristicClassifier::from_config(&config).unwrap();
        for score in [0.1, 0.3, 0.5, 0.7, 0.9] {
            let expected = classifier.class_for_score(score);
            let scores = classifier.class_scores(score);
            let top = scores[&expected];
            for (class, value) in &scores {
                if *class != expected {
                    assert!(top > *value, "score {score}: {class} tied or beat {expected}");
                }
            }
        }

        let record = make_test_record(2.0);
        let indices = compute_indices(&record);
        let result = classifier.classify(&record, &indices);
        assert_eq!(result.predicted_class, classifier.class_for_score(result.raw_score));
        assert_eq!(result.confidence, result.class_scores[&result.predicted_class]);
    }

    #[test]
    fn test_exact_cut_point_ties_go_lower() {
        let classifier = HeuristicClassifier::default();
        let scores = classifier.class_scores(0.4);
        assert_eq!(scores[&SpatialClass::Low], scores[&SpatialClass::Medium]);

        let record = make_test_record(2.0);
        let indices = compute_indices(&record);
        let result = classifier.classify(&record, &indices);
        assert_eq!(result.predicted_class, classifier.class_for_score(result.raw_score));
    }

    #[test]
    fn test_distribution_valid_across_gpa_range() {
        for step in 0..=40 {
            let record = make_test_record(step as f64 / 10.0);
            let result = classify(&record, &compute_indices(&record));
            assert_valid_distribution(&result);
        }
    }

    #[test]
    fn test_classify_deterministic() {
        let record = make_test_record(3.1);
        let indices = compute_indices(&record);
        let first = classify(&record, &indices);
        let second = classify(&record, &indices);
        assert_eq!(first, second);
        assert_eq!(first.confidence.to_bits(), second.confidence.to_bits());
    }

    #[test]
    fn test_higher_gpa_never_lowers_class() {
        let mut previous = SpatialClass::VeryLow;
        let mut previous_score = 0.0;
        for step in 0..=400 {
            let record = make_test_record(step as f64 / 100.0);
            let result = classify(&record, &compute_indices(&record));
            assert!(result.predicted_class >= previous);
            assert!(result.raw_score >= previous_score);
            previous = result.predicted_class;
            previous_score = result.raw_score;
        }
    }

    #[test]
    fn test_strong_profile_is_very_high() {
        let mut record = make_test_record(4.0);
        record.visual_learning = 10.0;
        record.map_usage = true;
        record.gis_experience = true;
        record.study_time = 5.0;
        record.spatial_skills = 8.0;
        let indices = compute_indices(&record);

        let result = classify(&record, &indices);
        assert_eq!(result.predicted_class, SpatialClass::VeryHigh);
        assert!(result.confidence > 0.6);
        assert_valid_distribution(&result);
    }

    #[test]
    fn test_weak_profile_is_low() {
        let mut record = make_test_record(0.5);
        record.visual_learning = 1.0;
        record.spatial_skills = 1.0;
        record.gaming = GamingPreferences::default();
        record.study_time = 40.0;
        let result = classify(&record, &compute_indices(&record));
        assert!(result.predicted_class <= SpatialClass::Low);
    }

    #[test]
    fn test_contributions_add_up_to_raw_score() {
        let classifier = HeuristicClassifier::default();
        let record = make_test_record(3.0);
        let indices = compute_indices(&record);

        let factors = classifier.contributions(&record, &indices);
        assert_eq!(factors.len(), SCORE_TERMS.len());
        assert_eq!(factors[0].name, "gpa");
        let total: f64 = factors.iter().map(|f| f.contribution).sum();
        assert!((total - classifier.raw_score(&record, &indices)).abs() < 1e-12);
    }

    #[test]
    fn test_config_renormalizes_weights() {
        let mut config = ClassifierConfig::default();
        config.weights.insert("gpa".to_string(), 1.35);
        let classifier = HeuristicClassifier::from_config(&config).unwrap();

        let total: f64 = classifier.terms().iter().map(|t| t.weight).sum();
        assert!((total - 1.0).abs() < 1e-12);
        assert!((classifier.terms()[0].weight - 1.35 / 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_config_validation() {
        let mut config = ClassifierConfig::default();
        config.weights.insert("shoe_size".to_string(), 0.1);
        assert!(matches!(
            HeuristicClassifier::from_config(&config),
            Err(ComputeError::InvalidConfig(_))
        ));

        let mut config = ClassifierConfig::default();
        config.cut_points = [0.2, 0.6, 0.4, 0.8];
        assert!(HeuristicClassifier::from_config(&config).is_err());

        let mut config = ClassifierConfig::default();
        config.kernel_width = 0.0;
        assert!(HeuristicClassifier::from_config(&config).is_err());

        let mut config = ClassifierConfig::default();
        config.kernel_width = 1e17;
        assert!(matches!(
            HeuristicClassifier::from_config(&config),
            Err(ComputeError::InvalidConfig(_))
        ));

        let mut config = ClassifierConfig::default();
        config.weights.insert("gpa".to_string(), -1.0);
        assert!(HeuristicClassifier::from_config(&config).is_err());

        let config = ClassifierConfig {
            weights: SCORE_TERMS.iter().map(|t| (t.name.to_string(), 0.0)).collect(),
            ..Default::default()
        };
        assert!(HeuristicClassifier::from_config(&config).is_err());
    }

    #[test]
    fn test_config_from_partial_json() {
        let config = ClassifierConfig::from_json(r#"{"kernel_width": 0.1}"#).unwrap();
        assert_eq!(config.cut_points, CUT_POINTS);
        assert_eq!(config.weights.len(), SCORE_TERMS.len());

        let classifier = HeuristicClassifier::from_config(&config).unwrap();
        assert_eq!(classifier.kernel_width(), 0.1);
    }
}
