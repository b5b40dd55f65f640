//! Executor tests against a real PostgreSQL.
//!
//! Skipped unless ORACLE_TEST_DATABASE_URL points at a reachable database.

use bball_oracle::{
    adapters::PostgresStore,
    config::DatabaseConfig,
    domain::ScalarValue,
    error::ErrorKind,
    pipeline::{run_checked, QuerySanitizer},
};
use sqlx::postgres::PgPoolOptions;
use std::env;

async fn store(max_connections: u32) -> Option<PostgresStore> {
    let Ok(url) = env::var("ORACLE_TEST_DATABASE_URL") else {
        eprintln!("Skipping integration test: ORACLE_TEST_DATABASE_URL is not set");
        return None;
    };

    let config = DatabaseConfig {
        url,
        max_connections,
        acquire_timeout_secs: 2,
        statement_timeout_ms: 2_000,
    };
    Some(
        PostgresStore::new(&config)
            .await
            .expect("failed to connect postgres test database"),
    )
}

#[tokio::test]
async fn decodes_scalar_columns() {
    let Some(store) = store(2).await else {
        return;
    };

    let (_, result) = run_checked(
        &QuerySanitizer::default(),
        &store,
        "SELECT 'Jalen Brunson'::text AS player, 43::int4 AS points, 0.5::numeric AS pct, \
         NULL::int AS missing, true AS made, '00:00:14.2'::interval AS clock",
    )
    .await
    .expect("query should succeed");

    assert_eq!(
        result.columns,
        vec!["player", "points", "pct", "missing", "made", "clock"]
    );
    let row = &result.rows[0];
    assert_eq!(row[0], ScalarValue::Text("Jalen Brunson".to_string()));
    assert_eq!(row[1], ScalarValue::Int(43));
    assert_eq!(row[2].to_string(), "0.5");
    assert_eq!(row[3], ScalarValue::Null);
    assert_eq!(row[4], ScalarValue::Bool(true));
    assert_eq!(row[5], ScalarValue::Interval("00:00:14.2".to_string()));
}

#[tokio::test]
async fn empty_result_keeps_column_names() {
    let Some(store) = store(2).await else {
        return;
    };

    let (_, result) = run_checked(
        &QuerySanitizer::default(),
        &store,
        "SELECT 1 AS points, 'x'::text AS player WHERE false",
    )
    .await
    .expect("query should succeed");

    assert!(result.is_empty());
    assert_eq!(result.columns, vec!["points", "player"]);
}

#[tokio::test]
async fn writes_hidden_in_select_are_refused() {
    let Some(store) = store(2).await else {
        return;
    };

    // The store's own pool is read-only; set up through a plain connection
    let url = env::var("ORACLE_TEST_DATABASE_URL").expect("checked above");
    let admin = PgPoolOptions::new()
        .max_connections(1)
        .connect(&url)
        .await
        .expect("failed to connect postgres test database");

    let seq = format!("oracle_seq_{}", uuid::Uuid::new_v4().simple());
    sqlx::query(&format!("CREATE SEQUENCE IF NOT EXISTS {}", seq))
        .execute(&admin)
        .await
        .expect("failed to create test sequence");

    // Passes the sanitizer but writes: only the read-only transaction stops it
    let sql = format!("SELECT nextval('{}') AS next", seq);
    assert!(QuerySanitizer::default().check(&sql).is_ok());
    let err = run_checked(&QuerySanitizer::default(), &store, &sql)
        .await
        .unwrap_err();

    let _ = sqlx::query(&format!("DROP SEQUENCE IF EXISTS {}", seq))
        .execute(&admin)
        .await;

    assert_eq!(err.kind(), ErrorKind::ExecutionFailure);
}

#[tokio::test]
async fn store_errors_are_summarized_and_release_the_connection() {
    // One connection: a leaked connection would make the follow-up query time out
    let Some(store) = store(1).await else {
        return;
    };

    for _ in 0..3 {
        let err = run_checked(
            &QuerySanitizer::default(),
            &store,
            "SELECT no_such_column FROM pg_catalog.pg_class",
        )
        .await
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ExecutionFailure);
        assert!(!err.to_string().contains("no_such_column"));
        assert!(!err.public_message().contains("no_such_column"));
    }

    let (_, result) = run_checked(&QuerySanitizer::default(), &store, "SELECT 1 AS one")
        .await
        .expect("connection should be back in the pool");
    assert_eq!(result.rows, vec![vec![ScalarValue::Int(1)]]);
}

#[tokio::test]
async fn multi_statement_text_is_refused() {
    let Some(store) = store(1).await else {
        return;
    };

    let err = run_checked(&QuerySanitizer::default(), &store, "SELECT 1; SELECT 2")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ExecutionFailure);
}
