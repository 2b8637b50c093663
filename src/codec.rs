//! Record codec - section documents to flat rows and back
//!
//! A section document is a JSON object keyed by field name. A row is the
//! list of column values in the order given by [`SectionKind::fields`].
//!
//! Encoding is lenient about missing keys (they get empty defaults) and
//! strict about wrong types. Decoding is strict: a list column that is not a
//! JSON array of strings is a [`Error::MalformedRecord`].

use crate::section::{FieldKind, FieldSpec, SectionKind};
use crate::{Error, Result};
use rusqlite::types::Value as SqlValue;
use serde_json::{Map, Value};

/// Column values of one section row, in field order
pub type SectionRow = Vec<SqlValue>;

/// A section document fragment
pub type Fragment = Map<String, Value>;

/// Encode a section document into column values.
pub fn to_row(kind: SectionKind, fragment: &Fragment) -> Result<SectionRow> {
    for key in fragment.keys() {
        if !kind.fields().iter().any(|f| f.key == key) {
            tracing::debug!("Ignoring unknown field {}.{}", kind, key);
        }
    }

    kind.fields()
        .iter()
        .map(|field| encode_field(kind, field, fragment.get(field.key)))
        .collect()
}

/// Decode column values back into a section document.
pub fn from_row(kind: SectionKind, row: &[SqlValue]) -> Result<Fragment> {
    let fields = kind.fields();
    if row.len() != fields.len() {
        return Err(Error::MalformedRecord {
            section: kind.table(),
            column: "*",
            reason: format!("expected {} columns, found {}", fields.len(), row.len()),
        });
    }

    let mut fragment = Fragment::new();
    for (field, value) in fields.iter().zip(row) {
        fragment.insert(field.key.to_string(), decode_field(kind, field, value)?);
    }
    Ok(fragment)
}

/// Check that a document can be encoded for `kind` without touching storage.
pub fn validate(kind: SectionKind, fragment: &Fragment) -> Result<()> {
    to_row(kind, fragment).map(|_| ())
}

/// An empty document for `kind`, with every field at its default.
pub fn empty_fragment(kind: SectionKind) -> Fragment {
    kind.fields()
        .iter()
        .map(|field| {
            let value = match field.kind {
                FieldKind::Text => Value::String(String::new()),
                FieldKind::List => Value::Array(Vec::new()),
                FieldKind::Flag => Value::Bool(false),
            };
            (field.key.to_string(), value)
        })
        .collect()
}

fn encode_field(kind: SectionKind, field: &FieldSpec, value: Option<&Value>) -> Result<SqlValue> {
    let invalid = |reason: String| Error::InvalidSectionData {
        section: kind.as_str(),
        field: field.key,
        reason,
    };

    match (field.kind, value) {
        (FieldKind::Text, None | Some(Value::Null)) => Ok(SqlValue::Text(String::new())),
        (FieldKind::Text, Some(Value::String(s))) => Ok(SqlValue::Text(s.clone())),
        (FieldKind::Text, Some(v @ (Value::Number(_) | Value::Bool(_)))) => {
            Ok(SqlValue::Text(v.to_string()))
        }
        (FieldKind::Text, Some(other)) => {
            Err(invalid(format!("expected text, found {}", type_name(other))))
        }

        (FieldKind::List, None | Some(Value::Null)) => Ok(SqlValue::Text("[]".to_string())),
        (FieldKind::List, Some(Value::Array(items))) => {
            let strings = items
                .iter()
                .enumerate()
                .map(|(i, item)| match item {
                    Value::String(s) => Ok(s.as_str()),
                    other => Err(invalid(format!(
                        "item {} must be a string, found {}",
                        i,
                        type_name(other)
                    ))),
                })
                .collect::<Result<Vec<&str>>>()?;
            let encoded = serde_json::to_string(&strings).map_err(|e| invalid(e.to_string()))?;
            Ok(SqlValue::Text(encoded))
        }
        (FieldKind::List, Some(other)) => {
            Err(invalid(format!("expected a list of strings, found {}", type_name(other))))
        }

        (FieldKind::Flag, None | Some(Value::Null)) => Ok(SqlValue::Integer(0)),
        (FieldKind::Flag, Some(Value::Bool(b))) => Ok(SqlValue::Integer(i64::from(*b))),
        (FieldKind::Flag, Some(other)) => {
            Err(invalid(format!("expected a boolean, found {}", type_name(other))))
        }
    }
}

fn decode_field(kind: SectionKind, field: &FieldSpec, value: &SqlValue) -> Result<Value> {
    let malformed = |reason: String| Error::MalformedRecord {
        section: kind.table(),
        column: field.column,
        reason,
    };

    match (field.kind, value) {
        (FieldKind::Text, SqlValue::Null) => Ok(Value::String(String::new())),
        (FieldKind::Text, SqlValue::Text(s)) => Ok(Value::String(s.clone())),
        (FieldKind::Text, SqlValue::Integer(i)) => Ok(Value::String(i.to_string())),
        (FieldKind::Text, SqlValue::Real(r)) => Ok(Value::String(r.to_string())),
        (FieldKind::Text, SqlValue::Blob(_)) => Err(malformed("unexpected blob".to_string())),

        (FieldKind::List, SqlValue::Text(s)) => {
            let items: Vec<String> = serde_json::from_str(s)
                .map_err(|e| malformed(format!("not a JSON list of strings: {}", e)))?;
            Ok(Value::Array(items.into_iter().map(Value::String).collect()))
        }
        (FieldKind::List, other) => Err(malformed(format!(
            "expected JSON text, found {}",
            sql_type_name(other)
        ))),

        (FieldKind::Flag, SqlValue::Null) => Ok(Value::Bool(false)),
        (FieldKind::Flag, SqlValue::Integer(i)) => Ok(Value::Bool(*i != 0)),
        (FieldKind::Flag, other) => Err(malformed(format!(
            "expected an integer flag, found {}",
            sql_type_name(other)
        ))),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn sql_type_name(value: &SqlValue) -> &'static str {
    match value {
        SqlValue::Null => "NULL",
        SqlValue::Integer(_) => "INTEGER",
        SqlValue::Real(_) => "REAL",
        SqlValue::Text(_) => "TEXT",
        SqlValue::Blob(_) => "BLOB",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fragment(value: Value) -> Fragment {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_roundtrip_basic_info() {
        let doc = fragment(json!({
            "projectName": "POTLESS",
            "duration": "2024-04-08 ~ 2024-05-20",
            "teamSize": "6",
            "yourRole": "",
            "mainObjectives": ["detect potholes", "", "detect potholes"],
        }));

        let row = to_row(SectionKind::BasicInfo, &doc).unwrap();
        assert_eq!(row.len(), 5);
        assert_eq!(
            row[4],
            SqlValue::Text(r#"["detect potholes","","detect potholes"]"#.to_string())
        );

        let decoded = from_row(SectionKind::BasicInfo, &row).unwrap();
        assert_eq!(decoded, doc);
    }

    #[test]
    fn test_roundtrip_every_section_with_empty_lists() {
        for kind in SectionKind::all() {
            let doc = empty_fragment(*kind);
            let row = to_row(*kind, &doc).unwrap();
            assert_eq!(from_row(*kind, &row).unwrap(), doc, "{}", kind);
        }
    }

    #[test]
    fn test_roundtrip_flag() {
        let doc = fragment(json!({
            "readmeGenerated": true,
            "createdAt": "2024-05-01T00:00:00Z",
            "lastUpdated": "2024-05-02T00:00:00Z",
        }));
        let row = to_row(SectionKind::DocumentationStatus, &doc).unwrap();
        assert_eq!(row[0], SqlValue::Integer(1));
        assert_eq!(from_row(SectionKind::DocumentationStatus, &row).unwrap(), doc);
    }

    #[test]
    fn test_missing_fields_get_defaults() {
        let doc = fragment(json!({ "frontendTech": ["Flutter"] }));
        let row = to_row(SectionKind::TechnicalInfo, &doc).unwrap();
        let decoded = from_row(SectionKind::TechnicalInfo, &row).unwrap();
        assert_eq!(decoded["frontendTech"], json!(["Flutter"]));
        assert_eq!(decoded["backendTech"], json!([]));
        assert_eq!(decoded["otherTools"], json!([]));
    }

    #[test]
    fn test_wrong_type_is_rejected() {
        let doc = fragment(json!({ "frontendTech": "Flutter" }));
        let err = to_row(SectionKind::TechnicalInfo, &doc).unwrap_err();
        assert!(matches!(err, Error::InvalidSectionData { field: "frontendTech", .. }));

        let doc = fragment(json!({ "mainObjectives": ["ok", 3] }));
        assert!(validate(SectionKind::BasicInfo, &doc).is_err());
    }

    #[test]
    fn test_numbers_coerce_to_text() {
        let doc = fragment(json!({ "teamSize": 6 }));
        let row = to_row(SectionKind::BasicInfo, &doc).unwrap();
        assert_eq!(row[2], SqlValue::Text("6".to_string()));
    }

    #[test]
    fn test_malformed_list_column() {
        let row = vec![
            SqlValue::Text("[\"React\"]".to_string()),
            SqlValue::Text("not json".to_string()),
            SqlValue::Text("[]".to_string()),
            SqlValue::Text("[]".to_string()),
            SqlValue::Text("[]".to_string()),
        ];
        let err = from_row(SectionKind::TechnicalInfo, &row).unwrap_err();
        assert!(matches!(
            err,
            Error::MalformedRecord { section: "technical_info", column: "backend_tech", .. }
        ));
    }

    #[test]
    fn test_list_of_non_strings_is_malformed() {
        let row = vec![
            SqlValue::Text("[1, 2]".to_string()),
            SqlValue::Text("[]".to_string()),
            SqlValue::Text("[]".to_string()),
        ];
        assert!(from_row(SectionKind::RefactoringStatus, &row).is_err());
    }

    #[test]
    fn test_null_list_column_is_malformed() {
        let row = vec![
            SqlValue::Text("".to_string()),
            SqlValue::Null,
            SqlValue::Text("[]".to_string()),
        ];
        assert!(matches!(
            from_row(SectionKind::ArchitectureInfo, &row),
            Err(Error::MalformedRecord { column: "pain_points", .. })
        ));
    }

    #[test]
    fn test_column_count_mismatch() {
        let row = vec![SqlValue::Text("x".to_string())];
        assert!(from_row(SectionKind::GithubInfo, &row).is_err());
    }
}
