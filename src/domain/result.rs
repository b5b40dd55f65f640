use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::fmt;
use uuid::Uuid;

/// A single cell of a query result
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ScalarValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Numeric(Decimal),
    Text(String),
    Date(NaiveDate),
    Timestamp(NaiveDateTime),
    TimestampTz(DateTime<Utc>),
    /// Rendered interval, e.g. "00:00:14.2"
    Interval(String),
    Uuid(Uuid),
}

impl ScalarValue {
    pub fn is_null(&self) -> bool {
        matches!(self, ScalarValue::Null)
    }
}

impl fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarValue::Null => write!(f, "NULL"),
            ScalarValue::Bool(v) => write!(f, "{}", v),
            ScalarValue::Int(v) => write!(f, "{}", v),
            ScalarValue::Float(v) => {
                if v.fract() == 0.0 && v.abs() < 1e15 {
                    write!(f, "{:.0}", v)
                } else {
                    write!(f, "{:.3}", v)
                }
            }
            ScalarValue::Numeric(v) => write!(f, "{}", v.normalize()),
            ScalarValue::Text(v) => write!(f, "{}", v),
            ScalarValue::Date(v) => write!(f, "{}", v),
            ScalarValue::Timestamp(v) => write!(f, "{}", v),
            ScalarValue::TimestampTz(v) => write!(f, "{}", v.to_rfc3339()),
            ScalarValue::Interval(v) => write!(f, "{}", v),
            ScalarValue::Uuid(v) => write!(f, "{}", v),
        }
    }
}

/// Tabular output of an executed query
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<ScalarValue>>,
}

/// Whether a column looks like it carries row identifiers (`id`, `game_id`, `playerId`)
pub fn is_identifier_column(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    if lower == "id" || lower.ends_with("_id") || lower.starts_with("id_") {
        return true;
    }
    // camelCase: gameId, personId
    name.len() > 2
        && name.ends_with("Id")
        && name[..name.len() - 2]
            .chars()
            .last()
            .map(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
            .unwrap_or(false)
}

impl QueryResult {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<ScalarValue>>) -> Self {
        Self { columns, rows }
    }

    /// No rows matched; distinct from a failed execution
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Copy of the result with identifier-looking columns removed.
    ///
    /// Matching is by column name only: an id aliased to a plain name
    /// (`SELECT id AS player`) is kept. The interpretation prompt's rule
    /// against repeating identifiers covers that case.
    pub fn without_identifier_columns(&self) -> QueryResult {
        let keep: Vec<usize> = self
            .columns
            .iter()
            .enumerate()
            .filter(|(_, name)| !is_identifier_column(name))
            .map(|(idx, _)| idx)
            .collect();

        QueryResult {
            columns: keep.iter().map(|&i| self.columns[i].clone()).collect(),
            rows: self
                .rows
                .iter()
                .map(|row| {
                    keep.iter()
                        .filter_map(|&i| row.get(i).cloned())
                        .collect()
                })
                .collect(),
        }
    }

    /// Copy of the result holding at most `max_rows` rows
    pub fn truncated(&self, max_rows: usize) -> QueryResult {
        QueryResult {
            columns: self.columns.clone(),
            rows: self.rows.iter().take(max_rows).cloned().collect(),
        }
    }
}
