use crate::error::AppError;
use std::str::FromStr;

/// ===============================
/// SQL bindable value enum
/// ===============================
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Text(String),
    I64(i64),
}

/// ===============================
/// Dynamic WHERE clause
/// ===============================
/// Conditions are ANDed in the order they are pushed; `values` lines up with
/// the `?` placeholders in `sql()`.
#[derive(Debug, Default)]
pub struct WhereClause {
    conditions: Vec<&'static str>,
    values: Vec<SqlValue>,
}

impl WhereClause {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `condition` (one `?` placeholder) when `value` is present.
    pub fn push_opt(&mut self, condition: &'static str, value: Option<SqlValue>) -> &mut Self {
        if let Some(value) = value {
            self.conditions.push(condition);
            self.values.push(value);
        }
        self
    }

    pub fn sql(&self) -> String {
        if self.conditions.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.conditions.join(" AND "))
        }
    }

    pub fn into_values(self) -> Vec<SqlValue> {
        self.values
    }
}

/// Query-string values arrive as strings; blank means "no filter".
pub fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Parses an optional query-string value. Blank is treated as absent.
pub fn parse_non_blank<T: FromStr>(value: Option<&str>, field: &str) -> Result<Option<T>, AppError> {
    non_blank(value)
        .map(|raw| {
            raw.parse::<T>()
                .map_err(|_| AppError::bad_request(format!("Invalid {field}: {raw}")))
        })
        .transpose()
}
