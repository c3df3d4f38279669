//! Raw schema facts and payload parsing.
//!
//! Introspection returns text. Whether it came from the SQLite catalog or from
//! a language model, it goes through [`parse_schema_payload`] before the graph
//! builder sees it.
//!
//! # Payload format
//!
//! ```json
//! [
//!   {
//!     "tableName": "orders",
//!     "columns": [
//!       {
//!         "columnName": "customer_id",
//!         "columnType": "INTEGER",
//!         "isOptional": false,
//!         "foreignKeyReference": {"table": "customers", "column": "id"}
//!       }
//!     ]
//!   }
//! ]
//! ```

use crate::types::{AgentError, Result};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value as JsonValue;

/// Foreign-key target of a column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKeyRef {
    /// Referenced table name
    #[serde(default)]
    pub table: String,

    /// Referenced column name
    #[serde(default)]
    pub column: String,
}

/// One column of a table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnFact {
    pub column_name: String,

    /// Declared type; empty when the column has none
    #[serde(default, deserialize_with = "null_as_empty")]
    pub column_type: String,

    /// Nullable and not part of the primary key
    #[serde(default, deserialize_with = "lenient_bool")]
    pub is_optional: bool,

    #[serde(default)]
    pub foreign_key_reference: Option<ForeignKeyRef>,
}

impl ColumnFact {
    /// Create a column without a foreign key.
    pub fn new(name: &str, column_type: &str, is_optional: bool) -> Self {
        Self {
            column_name: name.to_string(),
            column_type: column_type.to_string(),
            is_optional,
            foreign_key_reference: None,
        }
    }

    /// Attach a foreign-key reference.
    pub fn references(mut self, table: &str, column: &str) -> Self {
        self.foreign_key_reference = Some(ForeignKeyRef {
            table: table.to_string(),
            column: column.to_string(),
        });
        self
    }
}

/// One table with its columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableFact {
    pub table_name: String,

    #[serde(default)]
    pub columns: Vec<ColumnFact>,
}

/// Models sometimes quote booleans; accept `true`, `"true"`, `"yes"`, `1`.
fn lenient_bool<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = JsonValue::deserialize(deserializer)?;
    Ok(match value {
        JsonValue::Bool(b) => b,
        JsonValue::Number(n) => n.as_i64().is_some_and(|n| n != 0),
        JsonValue::String(s) => matches!(s.trim().to_lowercase().as_str(), "true" | "yes" | "1"),
        _ => false,
    })
}

/// SQLite columns may have no declared type; `null` reads as `""`.
fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Locate the JSON payload inside a model or catalog reply.
///
/// Handles:
/// - ```json ... ``` fences (first line and closing fence dropped)
/// - leading/trailing prose around a bare `[...]` array
pub fn extract_json_payload(text: &str) -> &str {
    let mut body = text.trim();

    if body.starts_with("```") {
        body = match body.find('\n') {
            Some(i) => &body[i + 1..],
            None => "",
        };
        if let Some(end) = body.rfind("```") {
            body = &body[..end];
        }
        body = body.trim();
    }

    if body.starts_with('[') || body.starts_with('{') {
        return body;
    }

    match (body.find('['), body.rfind(']')) {
        (Some(start), Some(end)) if start < end => &body[start..=end],
        _ => body,
    }
}

/// Parse an introspection reply into table facts.
///
/// Accepts a bare array or an object wrapping it under `"tables"`.
///
/// # Errors
///
/// Returns `AgentError::ParseError` if the payload is not valid JSON or does
/// not have the table/column shape.
pub fn parse_schema_payload(text: &str) -> Result<Vec<TableFact>> {
    let payload = extract_json_payload(text);

    let value: JsonValue = serde_json::from_str(payload).map_err(|e| {
        AgentError::parse(format!("invalid JSON ({}): {}", e, preview(payload)))
    })?;

    let tables = match value {
        JsonValue::Array(items) => JsonValue::Array(items),
        JsonValue::Object(mut map) => match map.remove("tables") {
            Some(tables @ JsonValue::Array(_)) => tables,
            _ => {
                return Err(AgentError::parse(
                    "expected a JSON array of tables or an object with a \"tables\" array",
                ))
            }
        },
        _ => return Err(AgentError::parse("expected a JSON array of tables")),
    };

    serde_json::from_value(tables)
        .map_err(|e| AgentError::parse(format!("unexpected table shape: {}", e)))
}

fn preview(payload: &str) -> String {
    const MAX: usize = 120;
    if payload.chars().count() <= MAX {
        payload.to_string()
    } else {
        let head: String = payload.chars().take(MAX).collect();
        format!("{}...", head)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FENCED: &str = "```json\n[\n  {\"tableName\": \"artists\", \"columns\": [\n    {\"columnName\": \"ArtistId\", \"columnType\": \"INTEGER\", \"isOptional\": false, \"foreignKeyReference\": null}\n  ]}\n]\n```";

    #[test]
    fn test_parse_fenced_payload() {
        let tables = parse_schema_payload(FENCED).unwrap();
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].table_name, "artists");
        assert_eq!(tables[0].columns[0].column_name, "ArtistId");
        assert!(!tables[0].columns[0].is_optional);
        assert!(tables[0].columns[0].foreign_key_reference.is_none());
    }

    #[test]
    fn test_parse_bare_and_wrapped_payloads() {
        let bare = r#"[{"tableName": "t", "columns": []}]"#;
        assert_eq!(parse_schema_payload(bare).unwrap().len(), 1);

        let wrapped = r#"{"tables": [{"tableName": "t"}]}"#;
        let tables = parse_schema_payload(wrapped).unwrap();
        assert_eq!(tables[0].table_name, "t");
        assert!(tables[0].columns.is_empty());
    }

    #[test]
    fn test_parse_payload_with_prose() {
        let text = "Here is the schema:\n[{\"tableName\": \"albums\", \"columns\": []}]\nLet me know!";
        let tables = parse_schema_payload(text).unwrap();
        assert_eq!(tables[0].table_name, "albums");
    }

    #[test]
    fn test_lenient_booleans() {
        let text = r#"[{"tableName": "t", "columns": [
            {"columnName": "a", "isOptional": "true"},
            {"columnName": "b", "isOptional": 0},
            {"columnName": "c"}
        ]}]"#;
        let columns = &parse_schema_payload(text).unwrap()[0].columns;
        assert!(columns[0].is_optional);
        assert!(!columns[1].is_optional);
        assert!(!columns[2].is_optional);
        assert_eq!(columns[2].column_type, "");
    }

    #[test]
    fn test_untyped_column() {
        let text = r#"[{"tableName": "t", "columns": [
            {"columnName": "a", "columnType": null},
            {"columnName": "b", "columnType": "TEXT"}
        ]}]"#;
        let columns = &parse_schema_payload(text).unwrap()[0].columns;
        assert_eq!(columns[0].column_type, "");
        assert_eq!(columns[1].column_type, "TEXT");
    }

    #[test]
    fn test_foreign_key_reference() {
        let text = r#"[{"tableName": "orders", "columns": [
            {"columnName": "customer_id", "columnType": "INTEGER", "isOptional": false,
             "foreignKeyReference": {"table": "customers", "column": "id"}}
        ]}]"#;
        let fk = parse_schema_payload(text).unwrap()[0].columns[0]
            .foreign_key_reference
            .clone()
            .unwrap();
        assert_eq!(fk.table, "customers");
        assert_eq!(fk.column, "id");
    }

    #[test]
    fn test_invalid_payloads_are_parse_errors() {
        for text in ["I could not find any tables.", "```json\n{not json}\n```", "42", r#"{"rows": []}"#] {
            let err = parse_schema_payload(text).unwrap_err();
            assert!(matches!(err, AgentError::ParseError(_)), "{}: {:?}", text, err);
        }
    }
}
