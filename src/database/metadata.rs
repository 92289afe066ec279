//! Catalog queries and schema row normalization.

use crate::error::ServerError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A catalog query with its bound parameters.
///
/// Parameters are positional in the dialect's placeholder style (`?` or `$n`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogQuery {
    pub sql: String,
    pub params: Vec<String>,
}

impl CatalogQuery {
    pub fn new(sql: impl Into<String>, params: Vec<String>) -> Self {
        Self {
            sql: sql.into(),
            params,
        }
    }

    /// A query with no bound parameters.
    pub fn unbound(sql: impl Into<String>) -> Self {
        Self::new(sql, Vec::new())
    }
}

/// Column metadata, normalized across dialects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnInfo {
    pub column_name: String,
    pub data_type: String,
    /// `"YES"` or `"NO"`.
    pub is_nullable: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column_default: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<String>,
}

/// One row of a schema query, columns in select order.
pub type SchemaRow = [Value];

/// Fail unless `row` has exactly `expected` columns.
pub(crate) fn expect_arity(row: &SchemaRow, expected: usize) -> Result<(), ServerError> {
    if row.len() != expected {
        return Err(ServerError::invalid_input(format!(
            "schema row has {} columns, expected {}",
            row.len(),
            expected
        )));
    }
    Ok(())
}

/// Extract a required text column.
pub(crate) fn extract_string(row: &SchemaRow, idx: usize, name: &str) -> Result<String, ServerError> {
    extract_optional_string(row, idx, name)?
        .ok_or_else(|| ServerError::invalid_input(format!("schema column {} is NULL", name)))
}

/// Extract a nullable text column. Numbers are rendered as text.
pub(crate) fn extract_optional_string(
    row: &SchemaRow,
    idx: usize,
    name: &str,
) -> Result<Option<String>, ServerError> {
    match row.get(idx) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(Value::Bool(b)) => Ok(Some(b.to_string())),
        Some(other) => Err(ServerError::invalid_input(format!(
            "schema column {} has unexpected value {}",
            name, other
        ))),
    }
}

/// Extract a required integer column. Numeric strings are accepted.
pub(crate) fn extract_i64(row: &SchemaRow, idx: usize, name: &str) -> Result<i64, ServerError> {
    let parsed = match row.get(idx) {
        Some(Value::Number(n)) => n.as_i64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        Some(Value::Bool(b)) => Some(i64::from(*b)),
        _ => None,
    };
    parsed.ok_or_else(|| {
        ServerError::invalid_input(format!("schema column {} is not an integer", name))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_column_info_omits_absent_fields() {
        let column = ColumnInfo {
            column_name: "id".to_string(),
            data_type: "integer".to_string(),
            is_nullable: "NO".to_string(),
            column_key: None,
            column_default: None,
            extra: None,
        };
        let value = serde_json::to_value(&column).unwrap();
        assert_eq!(
            value,
            json!({"column_name": "id", "data_type": "integer", "is_nullable": "NO"})
        );
    }

    #[test]
    fn test_extract_helpers() {
        let row = vec![json!("name"), json!(null), json!(3), json!("1"), json!([1])];
        assert_eq!(extract_string(&row, 0, "a").unwrap(), "name");
        assert!(extract_string(&row, 1, "b").is_err());
        assert_eq!(extract_optional_string(&row, 1, "b").unwrap(), None);
        assert_eq!(extract_optional_string(&row, 2, "c").unwrap().as_deref(), Some("3"));
        assert_eq!(extract_i64(&row, 2, "c").unwrap(), 3);
        assert_eq!(extract_i64(&row, 3, "d").unwrap(), 1);
        assert!(extract_i64(&row, 0, "a").is_err());
        assert!(extract_optional_string(&row, 4, "e").is_err());
    }

    #[test]
    fn test_expect_arity() {
        let row = vec![json!(1), json!(2)];
        assert!(expect_arity(&row, 2).is_ok());
        assert!(expect_arity(&row, 3).is_err());
    }
}
