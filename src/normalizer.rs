//! Feature normalization
//!
//! This module turns a raw field mapping into a validated [`StudentRecord`].
//! - String cells are coerced to numbers, booleans and labels
//! - Every value is checked against its catalogue domain
//! - Optional fields fall back to their catalogue default
//!
//! Out-of-domain values are rejected, never clamped.

use crate::error::ValidationError;
use crate::schema::{self, FieldKind, FieldSpec, RawFields};
use crate::types::{
    Categorical, Environment, FamilyBackground, FamilyIncome, GamingPreferences, Gender, Major,
    ParentalEducation, StudentRecord, TeacherAssessment,
};
use serde_json::Value;
use std::borrow::Cow;

/// Normalizer for converting raw fields to student records
pub struct Normalizer;

impl Normalizer {
    /// Normalize a raw field mapping.
    ///
    /// Fields are checked in catalogue order and the first violation is
    /// returned. Unknown fields are ignored.
    pub fn normalize(raw: &RawFields) -> Result<StudentRecord, ValidationError> {
        let age = read_integer(raw, &schema::AGE)?;
        let gender: Gender = read_category(raw, &schema::GENDER)?;
        let gpa = read_real(raw, &schema::GPA)?;
        let study_time = read_real(raw, &schema::STUDY_TIME)?;
        let visual_learning = read_real(raw, &schema::VISUAL_LEARNING)?;

        let environment: Environment = read_category(raw, &schema::ENVIRONMENT)?;
        let major: Major = read_category(raw, &schema::MAJOR)?;
        let extra_classes = read_integer(raw, &schema::EXTRA_CLASSES)?;
        let teacher_assessment: TeacherAssessment =
            read_category(raw, &schema::TEACHER_ASSESSMENT)?;
        let internet_usage = read_real(raw, &schema::INTERNET_USAGE)?;
        let tv_watching = read_real(raw, &schema::TV_WATCHING)?;
        let spatial_skills = read_real(raw, &schema::SPATIAL_SKILLS)?;

        let gaming = GamingPreferences {
            action: read_real(raw, &schema::ACTION_GAMES)?,
            strategy: read_real(raw, &schema::STRATEGY_GAMES)?,
            puzzle: read_real(raw, &schema::PUZZLE_GAMES)?,
            adventure: read_real(raw, &schema::ADVENTURE_GAMES)?,
            simulation: read_real(raw, &schema::SIMULATION_GAMES)?,
            sports: read_real(raw, &schema::SPORTS_GAMES)?,
        };

        let map_usage = read_bool(raw, &schema::MAP_USAGE)?;
        let gis_experience = read_bool(raw, &schema::GIS_EXPERIENCE)?;

        let family = FamilyBackground {
            parental_education: read_category::<ParentalEducation>(
                raw,
                &schema::PARENTAL_EDUCATION,
            )?,
            family_size: read_integer(raw, &schema::FAMILY_SIZE)?,
            income: read_category::<FamilyIncome>(raw, &schema::FAMILY_INCOME)?,
        };

        Ok(StudentRecord {
            age,
            gender,
            environment,
            major,
            gpa,
            study_time,
            extra_classes,
            teacher_assessment,
            internet_usage,
            tv_watching,
            spatial_skills,
            gaming,
            visual_learning,
            map_usage,
            gis_experience,
            family,
        })
    }
}

/// Normalize a raw field mapping into a student record
pub fn normalize(raw: &RawFields) -> Result<StudentRecord, ValidationError> {
    Normalizer::normalize(raw)
}

/// Resolve a field to a present value, applying the catalogue default.
///
/// JSON null and blank strings count as absent.
fn lookup<'a>(raw: &'a RawFields, spec: &FieldSpec) -> Result<Cow<'a, Value>, ValidationError> {
    let present = raw.get(spec.name).filter(|value| match value {
        Value::Null => false,
        Value::String(s) => !s.trim().is_empty(),
        _ => true,
    });

    match (present, spec.default) {
        (Some(value), _) => Ok(Cow::Borrowed(value)),
        (None, Some(default)) if !spec.required => {
            Ok(Cow::Owned(Value::String(default.to_string())))
        }
        _ => Err(ValidationError::missing(spec.name)),
    }
}

fn coerce_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    number.is_finite().then_some(number)
}

fn read_real(raw: &RawFields, spec: &FieldSpec) -> Result<f64, ValidationError> {
    let value = lookup(raw, spec)?;
    let number = coerce_number(&value)
        .ok_or_else(|| ValidationError::wrong_type(spec.name, spec.kind.type_name()))?;

    match spec.kind {
        FieldKind::Real { min, max } if number < min || number > max => {
            Err(ValidationError::out_of_domain(spec.name, spec.kind.domain()))
        }
        _ => Ok(number),
    }
}

fn read_integer(raw: &RawFields, spec: &FieldSpec) -> Result<u32, ValidationError> {
    let value = lookup(raw, spec)?;
    let number = coerce_number(&value)
        .filter(|n| n.fract() == 0.0)
        .ok_or_else(|| ValidationError::wrong_type(spec.name, spec.kind.type_name()))?;

    match spec.kind {
        FieldKind::Integer { min, max } if number >= min as f64 && number <= max as f64 => {
            Ok(number as u32)
        }
        _ => Err(ValidationError::out_of_domain(spec.name, spec.kind.domain())),
    }
}

fn read_bool(raw: &RawFields, spec: &FieldSpec) -> Result<bool, ValidationError> {
    let value = lookup(raw, spec)?;
    let wrong_type = || ValidationError::wrong_type(spec.name, spec.kind.type_name());

    match value.as_ref() {
        Value::Bool(b) => Ok(*b),
        Value::Number(_) => match coerce_number(&value) {
            Some(n) if n == 0.0 => Ok(false),
            Some(n) if n == 1.0 => Ok(true),
            Some(_) => Err(ValidationError::out_of_domain(spec.name, "0 or 1")),
            None => Err(wrong_type()),
        },
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "1" | "yes" | "y" | "true" | "t" => Ok(true),
            "0" | "no" | "n" | "false" | "f" => Ok(false),
            _ => Err(wrong_type()),
        },
        _ => Err(wrong_type()),
    }
}

fn read_category<T: Categorical>(raw: &RawFields, spec: &FieldSpec) -> Result<T, ValidationError> {
    let value = lookup(raw, spec)?;
    match value.as_ref() {
        Value::String(s) => T::from_label(s)
            .ok_or_else(|| ValidationError::out_of_domain(spec.name, T::domain())),
        _ => Err(ValidationError::wrong_type(spec.name, spec.kind.type_name())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationReason;
    use serde_json::json;

    fn make_test_raw() -> RawFields {
        match json!({
            "age": 16,
            "gender": "F",
            "gpa": 3.8,
            "study_time": 15,
            "visual_learning": 7,
            "environment": "Rural",
            "major": "Engineering",
            "action_games": 2,
            "puzzle_games": "3",
            "map_usage": "yes",
            "gis_experience": 0,
            "family_income": "middle-high",
        }) {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_normalize_valid_record() {
        let record = Normalizer::normalize(&make_test_raw()).unwrap();

        assert_eq!(record.age, 16);
        assert_eq!(record.gender, Gender::Female);
        assert!((record.gpa - 3.8).abs() < 1e-12);
        assert!((record.study_time - 15.0).abs() < 1e-12);
        assert_eq!(record.environment, Environment::Rural);
        assert_eq!(record.major, Major::Engineering);
        assert!((record.gaming.puzzle - 3.0).abs() < 1e-12);
        assert!(record.map_usage);
        assert!(!record.gis_experience);
        assert_eq!(record.family.income, FamilyIncome::MiddleHigh);
    }

    #[test]
    fn test_optional_defaults_applied() {
        let record = Normalizer::normalize(&make_test_raw()).unwrap();

        assert_eq!(record.extra_classes, 0);
        assert_eq!(record.teacher_assessment, TeacherAssessment::Medium);
        assert!((record.spatial_skills - 5.0).abs() < 1e-12);
        assert_eq!(record.gaming.sports, 0.0);
        assert_eq!(record.family.parental_education, ParentalEducation::HighSchool);
        assert_eq!(record.family.family_size, 3);
    }

    #[test]
    fn test_every_required_field_reported_when_missing() {
        for name in schema::required_fields() {
            let mut raw = make_test_raw();
            raw.remove(name);

            let err = Normalizer::normalize(&raw).unwrap_err();
            assert_eq!(err.field, name);
            assert_eq!(err.reason, ValidationReason::Missing);
        }
    }

    #[test]
    fn test_blank_and_null_count_as_missing() {
        let mut raw = make_test_raw();
        raw.insert("gpa".to_string(), json!("   "));
        assert_eq!(Normalizer::normalize(&raw).unwrap_err().reason.label(), "missing");

        raw.insert("gpa".to_string(), Value::Null);
        assert_eq!(Normalizer::normalize(&raw).unwrap_err().reason.label(), "missing");
    }

    #[test]
    fn test_negative_gpa_out_of_domain() {
        let mut raw = make_test_raw();
        raw.insert("gpa".to_string(), json!(-1));

        let err = Normalizer::normalize(&raw).unwrap_err();
        assert_eq!(err.field, "gpa");
        assert_eq!(err.reason.label(), "out of domain");
    }

    #[test]
    fn test_non_numeric_gpa_wrong_type() {
        let mut raw = make_test_raw();
        raw.insert("gpa".to_string(), json!("not-a-number"));

        let err = Normalizer::normalize(&raw).unwrap_err();
        assert_eq!(err.field, "gpa");
        assert_eq!(err.reason.label(), "wrong type");
    }

    #[test]
    fn test_non_finite_numbers_rejected() {
        let mut raw = make_test_raw();
        raw.insert("study_time".to_string(), json!("NaN"));
        assert_eq!(Normalizer::normalize(&raw).unwrap_err().reason.label(), "wrong type");

        raw.insert("study_time".to_string(), json!("inf"));
        assert_eq!(Normalizer::normalize(&raw).unwrap_err().reason.label(), "wrong type");
    }

    #[test]
    fn test_integer_fields() {
        let mut raw = make_test_raw();
        raw.insert("age".to_string(), json!("17.0"));
        assert_eq!(Normalizer::normalize(&raw).unwrap().age, 17);

        raw.insert("age".to_string(), json!(16.5));
        assert_eq!(Normalizer::normalize(&raw).unwrap_err().reason.label(), "wrong type");

        raw.insert("age".to_string(), json!(-3));
        let err = Normalizer::normalize(&raw).unwrap_err();
        assert_eq!(err.field, "age");
        assert_eq!(err.reason.label(), "out of domain");

        raw.insert("age".to_string(), json!(30));
        assert_eq!(Normalizer::normalize(&raw).unwrap_err().reason.label(), "out of domain");
    }

    #[test]
    fn test_category_errors() {
        let mut raw = make_test_raw();
        raw.insert("environment".to_string(), json!("Lunar"));
        let err = Normalizer::normalize(&raw).unwrap_err();
        assert_eq!(err.field, "environment");
        assert_eq!(
            err.reason,
            ValidationReason::OutOfDomain {
                domain: "Urban, Suburban, Rural".to_string()
            }
        );

        raw.insert("environment".to_string(), json!(2));
        assert_eq!(Normalizer::normalize(&raw).unwrap_err().reason.label(), "wrong type");
    }

    #[test]
    fn test_boolean_coercion() {
        let mut raw = make_test_raw();
        raw.insert("gis_experience".to_string(), json!(true));
        assert!(Normalizer::normalize(&raw).unwrap().gis_experience);

        raw.insert("gis_experience".to_string(), json!("No"));
        assert!(!Normalizer::normalize(&raw).unwrap().gis_experience);

        raw.insert("gis_experience".to_string(), json!(2));
        assert_eq!(Normalizer::normalize(&raw).unwrap_err().reason.label(), "out of domain");

        raw.insert("gis_experience".to_string(), json!("sometimes"));
        assert_eq!(Normalizer::normalize(&raw).unwrap_err().reason.label(), "wrong type");
    }

    #[test]
    fn test_unknown_fields_ignored() {
        let mut raw = make_test_raw();
        raw.insert("favourite_colour".to_string(), json!("green"));
        raw.insert("gaming_engagement".to_string(), json!(10));
        assert!(Normalizer::normalize(&raw).is_ok());
    }

    #[test]
    fn test_first_violation_in_catalogue_order() {
        let mut raw = make_test_raw();
        raw.remove("age");
        raw.insert("gpa".to_string(), json!(9));
        assert_eq!(Normalizer::normalize(&raw).unwrap_err().field, "age");
    }
}
