//! Recommendation rules
//!
//! Advice is produced from a fixed, ordered rule table. Every rule whose
//! trigger holds contributes one recommendation, in table order. When nothing
//! fires, a single "no action" recommendation is returned instead of an empty
//! list.

use crate::types::{PredictionResult, Recommendation, SpatialClass, StudentRecord};

/// Rule trigger over the record and its prediction
pub type TriggerFn = fn(&StudentRecord, &PredictionResult) -> bool;

/// Rationale template filled with observed values
pub type RationaleFn = fn(&StudentRecord, &PredictionResult) -> String;

/// One entry of the rule table
#[derive(Debug, Clone, Copy)]
pub struct Rule {
    pub id: &'static str,
    pub title: &'static str,
    pub trigger: TriggerFn,
    pub rationale: RationaleFn,
}

pub const GPA_THRESHOLD: f64 = 2.5;
pub const VISUAL_LEARNING_THRESHOLD: f64 = 5.0;
pub const GAMING_THRESHOLD: f64 = 8.0;
pub const SPATIAL_SKILLS_THRESHOLD: f64 = 5.0;
pub const STUDY_TIME_THRESHOLD: f64 = 10.0;
/// Combined internet and TV hours per day
pub const SCREEN_TIME_THRESHOLD: f64 = 8.0;

pub const NO_ACTION_TITLE: &str = "No immediate action needed";
pub const NO_ACTION_RATIONALE: &str =
    "Excellent profile! Continue leveraging your strengths in spatial reasoning. \
     Consider mentoring peers or exploring advanced spatial concepts.";

/// Default rule table
pub const RULES: &[Rule] = &[
    Rule {
        id: "academic_performance",
        title: "Improve Academic Performance",
        trigger: |record, _| record.gpa < GPA_THRESHOLD,
        rationale: |record, _| {
            format!(
                "GPA of {:.2} is below {GPA_THRESHOLD:.1}. Strong GPA correlates with spatial \
                 intelligence; focus on quantitative subjects and consistent study habits.",
                record.gpa
            )
        },
    },
    Rule {
        id: "visual_learning",
        title: "Enhance Visual Learning",
        trigger: |record, _| record.visual_learning < VISUAL_LEARNING_THRESHOLD,
        rationale: |record, _| {
            format!(
                "Visual learning preference is {:.1}/10. Practice with maps, diagrams and 3D \
                 visualizations to strengthen spatial reasoning.",
                record.visual_learning
            )
        },
    },
    Rule {
        id: "strategic_gaming",
        title: "Strategic Gaming",
        trigger: |record, _| record.gaming.total() < GAMING_THRESHOLD,
        rationale: |record, _| {
            format!(
                "Gaming engagement is {:.1}. Strategy and puzzle games are known to enhance \
                 spatial problem-solving.",
                record.gaming.total()
            )
        },
    },
    Rule {
        id: "pattern_recognition",
        title: "Pattern Recognition Training",
        trigger: |record, _| record.spatial_skills < SPATIAL_SKILLS_THRESHOLD,
        rationale: |record, _| {
            format!(
                "Pattern recognition is {:.1}/10. Practice identifying and manipulating spatial \
                 patterns through geometry and architecture problems.",
                record.spatial_skills
            )
        },
    },
    Rule {
        id: "study_time",
        title: "Increase Study Time",
        trigger: |record, _| record.study_time < STUDY_TIME_THRESHOLD,
        rationale: |record, _| {
            format!(
                "Only {:.1} study hours per week. Dedicate more focused time to problem-solving \
                 and visualization exercises.",
                record.study_time
            )
        },
    },
    Rule {
        id: "maps_and_gis",
        title: "Explore Maps and GIS",
        trigger: |record, _| !record.map_usage && !record.gis_experience,
        rationale: |_, _| {
            "No map or GIS usage reported. Navigating with maps and trying introductory GIS tools \
             builds real-world spatial reasoning."
                .to_string()
        },
    },
    Rule {
        id: "screen_time",
        title: "Balance Screen Time",
        trigger: |record, _| record.internet_usage + record.tv_watching > SCREEN_TIME_THRESHOLD,
        rationale: |record, _| {
            format!(
                "{:.1} hours per day of internet and TV. Trading some passive screen time for \
                 hands-on building or drawing activities helps spatial development.",
                record.internet_usage + record.tv_watching
            )
        },
    },
    Rule {
        id: "structured_practice",
        title: "Structured Spatial Practice",
        trigger: |_, result| result.predicted_class <= SpatialClass::Low,
        rationale: |_, result| {
            format!(
                "Predicted level is {} ({:.0}% confidence). A weekly routine of mental rotation, \
                 origami or construction puzzles gives steady, measurable progress.",
                result.predicted_class,
                result.confidence * 100.0
            )
        },
    },
];

/// Evaluates a rule table against a record and its prediction
#[derive(Debug, Clone)]
pub struct RecommendationEngine {
    rules: Vec<Rule>,
}

impl Default for RecommendationEngine {
    fn default() -> Self {
        Self::new(RULES.to_vec())
    }
}

impl RecommendationEngine {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Recommendations for every firing rule, in table order; never empty
    pub fn recommend(
        &self,
        record: &StudentRecord,
        result: &PredictionResult,
    ) -> Vec<Recommendation> {
        let mut recommendations: Vec<Recommendation> = self
            .rules
            .iter()
            .filter(|rule| (rule.trigger)(record, result))
            .map(|rule| Recommendation {
                title: rule.title.to_string(),
                rationale: (rule.rationale)(record, result),
            })
            .collect();

        if recommendations.is_empty() {
            recommendations.push(no_action());
        }

        log::debug!(
            "{} recommendation(s) for predicted level {}",
            recommendations.len(),
            result.predicted_class
        );

        recommendations
    }
}

/// Canned recommendation used when no rule fires
pub fn no_action() -> Recommendation {
    Recommendation {
        title: NO_ACTION_TITLE.to_string(),
        rationale: NO_ACTION_RATIONALE.to_string(),
    }
}

/// Recommend with the default rule table
pub fn recommend(record: &StudentRecord, result: &PredictionResult) -> Vec<Recommendation> {
    RecommendationEngine::default().recommend(record, result)
}
