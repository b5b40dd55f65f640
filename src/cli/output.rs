//! Output formatting for `bball-oracle sql`.
//!
//! Supports two modes: human-readable tables (default) and JSON (--json).

use serde_json::{Map, Value};
use tabled::builder::Builder;

use crate::domain::QueryResult;

/// Output mode for command results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Table,
    Json,
}

impl OutputMode {
    pub fn from_json_flag(json: bool) -> Self {
        if json {
            OutputMode::Json
        } else {
            OutputMode::Table
        }
    }
}

/// Render a query result as an ASCII table.
pub fn render_table(result: &QueryResult) -> String {
    let mut builder = Builder::default();
    builder.push_record(result.columns.iter().cloned());
    for row in &result.rows {
        builder.push_record(row.iter().map(|v| v.to_string()));
    }
    builder.build().to_string()
}

/// Render a query result as a JSON array of objects keyed by column.
pub fn render_json(result: &QueryResult) -> anyhow::Result<String> {
    let rows: Vec<Value> = result
        .rows
        .iter()
        .map(|row| -> serde_json::Result<Value> {
            let mut obj = Map::new();
            for (col, value) in result.columns.iter().zip(row) {
                obj.insert(col.clone(), serde_json::to_value(value)?);
            }
            Ok(Value::Object(obj))
        })
        .collect::<serde_json::Result<_>>()?;
    Ok(serde_json::to_string_pretty(&rows)?)
}

/// Print a query result in the chosen mode.
pub fn print_result(result: &QueryResult, mode: OutputMode) -> anyhow::Result<()> {
    match mode {
        OutputMode::Table => {
            if result.is_empty() {
                println!("(no results)");
            } else {
                println!("{}", render_table(result));
            }
        }
        OutputMode::Json => println!("{}", render_json(result)?),
    }
    Ok(())
}
