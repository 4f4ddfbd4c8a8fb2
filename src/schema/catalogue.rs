//! Field catalogue
//!
//! One entry per raw field the normalizer understands. The catalogue is the
//! single source for domains and defaults: the normalizer, the CSV template and
//! the CLI `schema` command all read it.

use crate::types::{
    Categorical, Environment, FamilyIncome, Gender, Major, ParentalEducation, TeacherAssessment,
};
use serde::Serialize;

/// Current input schema version
pub const SCHEMA_VERSION: &str = "spatialiq.student.v1";

/// Declared type and domain of a raw field
#[derive(Debug, Clone, Copy)]
pub enum FieldKind {
    /// Whole number in an inclusive range
    Integer { min: u32, max: u32 },
    /// Finite real in an inclusive range
    Real { min: f64, max: f64 },
    /// yes/no, true/false, 1/0
    Boolean,
    /// One of a closed set of labels
    Category { labels: fn() -> Vec<&'static str> },
}

impl FieldKind {
    /// Short type name used in "wrong type" reasons
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldKind::Integer { .. } => "integer",
            FieldKind::Real { .. } => "number",
            FieldKind::Boolean => "boolean",
            FieldKind::Category { .. } => "text label",
        }
    }

    /// Human-readable domain used in "out of domain" reasons
    pub fn domain(&self) -> String {
        match self {
            FieldKind::Integer { min, max } => format!("{min}-{max}"),
            FieldKind::Real { min, max } => format!("{min:.1}-{max:.1}"),
            FieldKind::Boolean => "yes/no".to_string(),
            FieldKind::Category { labels } => labels().join(", "),
        }
    }
}

/// Catalogue entry for one raw field
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    /// Raw default applied when an optional field is absent
    pub default: Option<&'static str>,
    pub description: &'static str,
    /// Values used for the three rows of the CSV template
    pub examples: [&'static str; 3],
}

fn labels_of<T: Categorical>() -> Vec<&'static str> {
    T::VARIANTS.iter().map(|v| v.label()).collect()
}

pub const AGE: FieldSpec = FieldSpec {
    name: "age",
    kind: FieldKind::Integer { min: 10, max: 25 },
    required: true,
    default: None,
    description: "Age in years",
    examples: ["16", "17", "15"],
};

pub const GENDER: FieldSpec = FieldSpec {
    name: "gender",
    kind: FieldKind::Category {
        labels: labels_of::<Gender>,
    },
    required: true,
    default: None,
    description: "Gender",
    examples: ["Male", "Female", "Male"],
};

pub const GPA: FieldSpec = FieldSpec {
    name: "gpa",
    kind: FieldKind::Real { min: 0.0, max: 4.0 },
    required: true,
    default: None,
    description: "Cumulative GPA on the 0.0-4.0 scale",
    examples: ["3.5", "2.8", "3.2"],
};

pub const STUDY_TIME: FieldSpec = FieldSpec {
    name: "study_time",
    kind: FieldKind::Real {
        min: 0.0,
        max: 168.0,
    },
    required: true,
    default: None,
    description: "Study time in hours per week",
    examples: ["15", "12", "18"],
};

pub const VISUAL_LEARNING: FieldSpec = FieldSpec {
    name: "visual_learning",
    kind: FieldKind::Real { min: 0.0, max: 10.0 },
    required: true,
    default: None,
    description: "Visual learning preference (0-10)",
    examples: ["7", "8", "6"],
};

pub const ENVIRONMENT: FieldSpec = FieldSpec {
    name: "environment",
    kind: FieldKind::Category {
        labels: labels_of::<Environment>,
    },
    required: false,
    default: Some("Urban"),
    description: "Living environment",
    examples: ["Urban", "Rural", "Suburban"],
};

pub const MAJOR: FieldSpec = FieldSpec {
    name: "major",
    kind: FieldKind::Category {
        labels: labels_of::<Major>,
    },
    required: false,
    default: Some("Not chosen yet"),
    description: "Academic track",
    examples: ["Science", "Engineering", "Mathematical"],
};

pub const EXTRA_CLASSES: FieldSpec = FieldSpec {
    name: "extra_classes",
    kind: FieldKind::Integer { min: 0, max: 10 },
    required: false,
    default: Some("0"),
    description: "Number of extra classes",
    examples: ["1", "0", "2"],
};

pub const TEACHER_ASSESSMENT: FieldSpec = FieldSpec {
    name: "teacher_assessment",
    kind: FieldKind::Category {
        labels: labels_of::<TeacherAssessment>,
    },
    required: false,
    default: Some("Medium"),
    description: "Teacher's assessment",
    examples: ["High", "Medium", "Medium"],
};

pub const INTERNET_USAGE: FieldSpec = FieldSpec {
    name: "internet_usage",
    kind: FieldKind::Real {
        min: 0.0,
        max: 24.0,
    },
    required: false,
    default: Some("0"),
    description: "Internet usage in hours per day",
    examples: ["3", "5", "2"],
};

pub const TV_WATCHING: FieldSpec = FieldSpec {
    name: "tv_watching",
    kind: FieldKind::Real {
        min: 0.0,
        max: 24.0,
    },
    required: false,
    default: Some("0"),
    description: "TV watching in hours per day",
    examples: ["2", "3", "1"],
};

pub const SPATIAL_SKILLS: FieldSpec = FieldSpec {
    name: "spatial_skills",
    kind: FieldKind::Real { min: 0.0, max: 10.0 },
    required: false,
    default: Some("5"),
    description: "Pattern recognition self-assessment (0-10)",
    examples: ["6", "4", "7"],
};

pub const ACTION_GAMES: FieldSpec = game_field(
    "action_games",
    "Action games preference (0-5)",
    ["2", "4", "1"],
);
pub const STRATEGY_GAMES: FieldSpec = game_field(
    "strategy_games",
    "Strategy games preference (0-5)",
    ["2", "3", "4"],
);
pub const PUZZLE_GAMES: FieldSpec = game_field(
    "puzzle_games",
    "Puzzle games preference (0-5)",
    ["3", "2", "4"],
);
pub const ADVENTURE_GAMES: FieldSpec = game_field(
    "adventure_games",
    "Adventure games preference (0-5)",
    ["2", "3", "1"],
);
pub const SIMULATION_GAMES: FieldSpec = game_field(
    "simulation_games",
    "Simulation games preference (0-5)",
    ["1", "2", "0"],
);
pub const SPORTS_GAMES: FieldSpec = game_field(
    "sports_games",
    "Sports games preference (0-5)",
    ["0", "3", "1"],
);

const fn game_field(
    name: &'static str,
    description: &'static str,
    examples: [&'static str; 3],
) -> FieldSpec {
    FieldSpec {
        name,
        kind: FieldKind::Real { min: 0.0, max: 5.0 },
        required: false,
        default: Some("0"),
        description,
        examples,
    }
}

pub const MAP_USAGE: FieldSpec = FieldSpec {
    name: "map_usage",
    kind: FieldKind::Boolean,
    required: false,
    default: Some("no"),
    description: "Uses maps regularly",
    examples: ["yes", "no", "yes"],
};

pub const GIS_EXPERIENCE: FieldSpec = FieldSpec {
    name: "gis_experience",
    kind: FieldKind::Boolean,
    required: false,
    default: Some("no"),
    description: "Has GIS experience",
    examples: ["no", "no", "yes"],
};

pub const PARENTAL_EDUCATION: FieldSpec = FieldSpec {
    name: "parental_education",
    kind: FieldKind::Category {
        labels: labels_of::<ParentalEducation>,
    },
    required: false,
    default: Some("High School"),
    description: "Highest education level of parents",
    examples: ["Bachelor", "High School", "Master"],
};

pub const FAMILY_SIZE: FieldSpec = FieldSpec {
    name: "family_size",
    kind: FieldKind::Integer { min: 1, max: 20 },
    required: false,
    default: Some("3"),
    description: "Number of family members",
    examples: ["4", "3", "5"],
};

pub const FAMILY_INCOME: FieldSpec = FieldSpec {
    name: "family_income",
    kind: FieldKind::Category {
        labels: labels_of::<FamilyIncome>,
    },
    required: false,
    default: Some("Middle"),
    description: "Family income bracket",
    examples: ["Middle", "Middle-Low", "High"],
};

/// Every known field, in validation order (required fields first)
pub const FIELDS: &[FieldSpec] = &[
    AGE,
    GENDER,
    GPA,
    STUDY_TIME,
    VISUAL_LEARNING,
    ENVIRONMENT,
    MAJOR,
    EXTRA_CLASSES,
    TEACHER_ASSESSMENT,
    INTERNET_USAGE,
    TV_WATCHING,
    SPATIAL_SKILLS,
    ACTION_GAMES,
    STRATEGY_GAMES,
    PUZZLE_GAMES,
    ADVENTURE_GAMES,
    SIMULATION_GAMES,
    SPORTS_GAMES,
    MAP_USAGE,
    GIS_EXPERIENCE,
    PARENTAL_EDUCATION,
    FAMILY_SIZE,
    FAMILY_INCOME,
];

/// Look up a field by name
pub fn field(name: &str) -> Option<&'static FieldSpec> {
    FIELDS.iter().find(|spec| spec.name == name)
}

/// Names of the required fields
pub fn required_fields() -> impl Iterator<Item = &'static str> {
    FIELDS.iter().filter(|spec| spec.required).map(|spec| spec.name)
}

/// Serializable view of a catalogue entry
#[derive(Debug, Clone, Serialize)]
pub struct FieldDescription {
    pub name: &'static str,
    #[serde(rename = "type")]
    pub type_name: &'static str,
    pub domain: String,
    pub required: bool,
    pub default: Option<&'static str>,
    pub description: &'static str,
}

/// Describe the whole catalogue
pub fn describe_fields() -> Vec<FieldDescription> {
    FIELDS
        .iter()
        .map(|spec| FieldDescription {
            name: spec.name,
            type_name: spec.kind.type_name(),
            domain: spec.kind.domain(),
            required: spec.required,
            default: spec.default,
            description: spec.description,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_field_names_unique() {
        let names: HashSet<_> = FIELDS.iter().map(|f| f.name).collect();
        assert_eq!(names.len(), FIELDS.len());
    }

    #[test]
    fn test_required_fields_have_no_default() {
        for spec in FIELDS {
            assert_eq!(spec.required, spec.default.is_none(), "{}", spec.name);
        }
    }

    #[test]
    fn test_required_fields_come_first() {
        let first_optional = FIELDS.iter().position(|f| !f.required).unwrap();
        assert!(FIELDS[first_optional..].iter().all(|f| !f.required));
        assert_eq!(
            required_fields().collect::<Vec<_>>(),
            vec!["age", "gender", "gpa", "study_time", "visual_learning"]
        );
    }

    #[test]
    fn test_domain_rendering() {
        assert_eq!(GPA.kind.domain(), "0.0-4.0");
        assert_eq!(AGE.kind.domain(), "10-25");
        assert_eq!(GENDER.kind.domain(), "Male, Female, Other");
        assert_eq!(field("family_income").unwrap().kind.type_name(), "text label");
        assert!(field("shoe_size").is_none());
    }
}
