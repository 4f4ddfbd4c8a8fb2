//! Raw field mappings
//!
//! A raw student row is a mapping of field name to JSON value. JSON callers
//! pass numbers, booleans and strings directly; tabular callers pass every
//! cell as a string and let the normalizer coerce it.

use crate::error::ComputeError;
use serde_json::Value;

/// Field name → raw value, as received from the caller
pub type RawFields = serde_json::Map<String, Value>;

/// Parser for raw field mappings
pub struct RawFieldsAdapter;

impl RawFieldsAdapter {
    /// Parse a single JSON object
    pub fn parse_object(json: &str) -> Result<RawFields, ComputeError> {
        match serde_json::from_str::<Value>(json)? {
            Value::Object(map) => Ok(map),
            other => Err(ComputeError::ParseError(format!(
                "expected a JSON object, got {}",
                json_kind(&other)
            ))),
        }
    }

    /// Parse a JSON array of objects
    pub fn parse_array(json: &str) -> Result<Vec<RawFields>, ComputeError> {
        let values: Vec<Value> = serde_json::from_str(json)?;
        values
            .into_iter()
            .enumerate()
            .map(|(idx, value)| match value {
                Value::Object(map) => Ok(map),
                other => Err(ComputeError::ParseError(format!(
                    "element {} is {}, expected an object",
                    idx,
                    json_kind(&other)
                ))),
            })
            .collect()
    }

    /// Parse NDJSON (one object per line, blank lines skipped)
    pub fn parse_ndjson(ndjson: &str) -> Result<Vec<RawFields>, ComputeError> {
        let mut rows = Vec::new();
        for (line_num, line) in ndjson.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            match Self::parse_object(trimmed) {
                Ok(row) => rows.push(row),
                Err(e) => {
                    return Err(ComputeError::ParseError(format!(
                        "Failed to parse line {}: {}",
                        line_num + 1,
                        e
                    )));
                }
            }
        }
        Ok(rows)
    }

    /// Build a mapping from string cells (tabular input)
    pub fn from_cells<'a, I>(cells: I) -> RawFields
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        cells
            .into_iter()
            .map(|(name, cell)| (name.trim().to_string(), Value::String(cell.to_string())))
            .collect()
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_object() {
        let raw = RawFieldsAdapter::parse_object(r#"{"age": 16, "gender": "F"}"#).unwrap();
        assert_eq!(raw["age"], 16);
        assert_eq!(raw["gender"], "F");
    }

    #[test]
    fn test_parse_object_rejects_non_object() {
        let err = RawFieldsAdapter::parse_object("[1, 2]").unwrap_err();
        assert!(err.to_string().contains("an array"));
    }

    #[test]
    fn test_parse_array_reports_bad_element() {
        let err = RawFieldsAdapter::parse_array(r#"[{"age": 16}, 3]"#).unwrap_err();
        assert!(err.to_string().contains("element 1"));
    }

    #[test]
    fn test_parse_ndjson() {
        let input = "{\"age\": 16}\n\n{\"age\": 17}\n";
        let rows = RawFieldsAdapter::parse_ndjson(input).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1]["age"], 17);

        let err = RawFieldsAdapter::parse_ndjson("{\"age\": 16}\nnope").unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn test_from_cells_trims_names() {
        let raw = RawFieldsAdapter::from_cells(vec![(" gpa ", "3.5")]);
        assert_eq!(raw["gpa"], "3.5");
    }
}
