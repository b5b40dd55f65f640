use async_trait::async_trait;

use crate::domain::{GeneratedQuery, QueryResult, ValidatedQuery};
use crate::error::Result;
use crate::pipeline::sanitizer::QuerySanitizer;

/// Read-only execution against the statistics store.
///
/// Takes `ValidatedQuery` only, so unsanitized text cannot reach the store
/// through this seam. Implementations hold a connection for the duration of
/// a single call and release it on every exit path.
///
/// Errors are `OracleError::ExecutionFailure` carrying a non-sensitive
/// summary; store error text is logged, never returned.
#[async_trait]
pub trait QueryStore: Send + Sync {
    async fn execute(&self, query: &ValidatedQuery) -> Result<QueryResult>;
}

/// Sanitize operator-supplied query text and execute it, skipping the model.
pub async fn run_checked(
    sanitizer: &QuerySanitizer,
    store: &dyn QueryStore,
    sql: &str,
) -> Result<(ValidatedQuery, QueryResult)> {
    let validated = sanitizer.sanitize(&GeneratedQuery::new(sql))?;
    let result = store.execute(&validated).await?;
    Ok((validated, result))
}
