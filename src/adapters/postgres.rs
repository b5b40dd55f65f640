use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::types::PgInterval;
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions, PgRow};
use sqlx::{Column, Executor, Row, TypeInfo, ValueRef};
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::config::DatabaseConfig;
use crate::domain::{QueryResult, ScalarValue, ValidatedQuery};
use crate::error::{OracleError, Result};
use crate::pipeline::QueryStore;

/// Slack on top of the server-side statement timeout before we give up locally
const EXECUTION_GRACE: Duration = Duration::from_secs(2);

/// PostgreSQL storage adapter.
///
/// Every connection is opened with `default_transaction_read_only=on`, and
/// every query additionally runs inside an explicit read-only transaction
/// that is rolled back afterwards.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
    statement_timeout: Duration,
}

impl PostgresStore {
    /// Create a new PostgreSQL store
    pub async fn new(config: &DatabaseConfig) -> Result<Self> {
        let options = PgConnectOptions::from_str(&config.url)?
            .options([("default_transaction_read_only", "on")]);

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
            .connect_with(options)
            .await?;

        info!("Connected to PostgreSQL at {}", config.redacted_url());
        Ok(Self {
            pool,
            statement_timeout: Duration::from_millis(config.statement_timeout_ms),
        })
    }

    /// Create a PostgreSQL store from an existing connection pool
    pub fn from_pool(pool: PgPool, statement_timeout: Duration) -> Self {
        Self {
            pool,
            statement_timeout,
        }
    }

    /// Get the connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Cheap liveness probe
    pub async fn ping(&self) -> bool {
        let probe = sqlx::query("SELECT 1").execute(&self.pool);
        matches!(
            tokio::time::timeout(self.statement_timeout, probe).await,
            Ok(Ok(_))
        )
    }

    /// Run `sql` in a rolled-back read-only transaction.
    ///
    /// The transaction guard returns the connection to the pool on every exit
    /// path, including when this future is dropped mid-query.
    async fn run_read_only(&self, sql: &str) -> std::result::Result<QueryResult, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("SET TRANSACTION READ ONLY")
            .execute(&mut *tx)
            .await?;
        sqlx::query(&format!(
            "SET LOCAL statement_timeout = {}",
            self.statement_timeout.as_millis()
        ))
        .execute(&mut *tx)
        .await?;

        // Model-written SQL is one-off; keep it out of the statement cache
        let rows = sqlx::query(sql)
            .persistent(false)
            .fetch_all(&mut *tx)
            .await?;

        let columns = match rows.first() {
            Some(row) => column_names(row),
            None => {
                let described = (&mut *tx).describe(sql).await?;
                described
                    .columns()
                    .iter()
                    .map(|c| c.name().to_string())
                    .collect()
            }
        };

        let decoded = rows
            .iter()
            .map(decode_row)
            .collect::<std::result::Result<Vec<_>, sqlx::Error>>()?;

        tx.rollback().await?;
        Ok(QueryResult::new(columns, decoded))
    }
}

#[async_trait]
impl QueryStore for PostgresStore {
    #[instrument(skip_all)]
    async fn execute(&self, query: &ValidatedQuery) -> Result<QueryResult> {
        let deadline = self.statement_timeout + EXECUTION_GRACE;

        match tokio::time::timeout(deadline, self.run_read_only(query.as_str())).await {
            Ok(Ok(result)) => {
                debug!("Query returned {} rows", result.row_count());
                Ok(result)
            }
            Ok(Err(e)) => {
                warn!("Error running query on play-by-play data: {}", e);
                Err(OracleError::ExecutionFailure(summarize(&e).to_string()))
            }
            Err(_) => {
                warn!("Query exceeded {:?}, abandoned", deadline);
                Err(OracleError::ExecutionFailure("query timed out".to_string()))
            }
        }
    }
}

/// Non-sensitive description of a store error
fn summarize(err: &sqlx::Error) -> &'static str {
    match err {
        sqlx::Error::Database(_) => "store rejected the query",
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => "no database connection available",
        sqlx::Error::Io(_) | sqlx::Error::Tls(_) | sqlx::Error::Protocol(_) => {
            "database unreachable"
        }
        sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => {
            "result could not be decoded"
        }
        _ => "query execution failed",
    }
}

fn column_names(row: &PgRow) -> Vec<String> {
    row.columns().iter().map(|c| c.name().to_string()).collect()
}

fn decode_row(row: &PgRow) -> std::result::Result<Vec<ScalarValue>, sqlx::Error> {
    (0..row.len()).map(|idx| decode_cell(row, idx)).collect()
}

fn decode_cell(row: &PgRow, idx: usize) -> std::result::Result<ScalarValue, sqlx::Error> {
    if row.try_get_raw(idx)?.is_null() {
        return Ok(ScalarValue::Null);
    }

    let type_name = row.column(idx).type_info().name().to_string();
    let value = match type_name.as_str() {
        "BOOL" => ScalarValue::Bool(row.try_get(idx)?),
        "INT2" => ScalarValue::Int(row.try_get::<i16, _>(idx)?.into()),
        "INT4" => ScalarValue::Int(row.try_get::<i32, _>(idx)?.into()),
        "INT8" => ScalarValue::Int(row.try_get(idx)?),
        "FLOAT4" => ScalarValue::Float(row.try_get::<f32, _>(idx)?.into()),
        "FLOAT8" => ScalarValue::Float(row.try_get(idx)?),
        "NUMERIC" => ScalarValue::Numeric(row.try_get::<Decimal, _>(idx)?),
        "TEXT" | "VARCHAR" | "BPCHAR" | "NAME" => ScalarValue::Text(row.try_get(idx)?),
        "DATE" => ScalarValue::Date(row.try_get::<NaiveDate, _>(idx)?),
        "TIMESTAMP" => ScalarValue::Timestamp(row.try_get::<NaiveDateTime, _>(idx)?),
        "TIMESTAMPTZ" => ScalarValue::TimestampTz(row.try_get::<DateTime<Utc>, _>(idx)?),
        "INTERVAL" => {
            let interval: PgInterval = row.try_get(idx)?;
            ScalarValue::Interval(format_interval(
                interval.months,
                interval.days,
                interval.microseconds,
            ))
        }
        "UUID" => ScalarValue::Uuid(row.try_get::<Uuid, _>(idx)?),
        other => match row.try_get::<String, _>(idx) {
            Ok(text) => ScalarValue::Text(text),
            Err(_) => ScalarValue::Text(format!("<{}>", other.to_lowercase())),
        },
    };
    Ok(value)
}

/// Render an interval the way psql does for the common cases ("00:00:14.2", "3 days 01:00:00")
fn format_interval(months: i32, days: i32, microseconds: i64) -> String {
    let mut parts = Vec::new();
    if months != 0 {
        parts.push(format!("{} mons", months));
    }
    if days != 0 {
        parts.push(format!("{} days", days));
    }

    if microseconds != 0 || parts.is_empty() {
        let sign = if microseconds < 0 { "-" } else { "" };
        let total = microseconds.unsigned_abs();
        let hours = total / 3_600_000_000;
        let minutes = (total / 60_000_000) % 60;
        let seconds = (total / 1_000_000) % 60;
        let fraction = total % 1_000_000;

        let mut clock = format!("{}{:02}:{:02}:{:02}", sign, hours, minutes, seconds);
        if fraction != 0 {
            let digits = format!("{:06}", fraction);
            clock.push('.');
            clock.push_str(digits.trim_end_matches('0'));
        }
        parts.push(clock);
    }

    parts.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_interval() {
        assert_eq!(format_interval(0, 0, 14_200_000), "00:00:14.2");
        assert_eq!(format_interval(0, 0, 0), "00:00:00");
        assert_eq!(format_interval(0, 3, 3_600_000_000), "3 days 01:00:00");
        assert_eq!(format_interval(2, 0, 0), "2 mons");
        assert_eq!(format_interval(0, 0, -90_000_000), "-00:01:30");
    }

    #[test]
    fn test_summarize_hides_store_text() {
        let err = sqlx::Error::Protocol("column \"secret\" of relation \"users\"".to_string());
        assert_eq!(summarize(&err), "database unreachable");
        assert_eq!(summarize(&sqlx::Error::PoolTimedOut), "no database connection available");
        assert_eq!(summarize(&sqlx::Error::RowNotFound), "query execution failed");
    }
}
