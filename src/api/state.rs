use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::adapters::PostgresStore;
use crate::pipeline::QueryPipeline;

/// Shared application state for API handlers
#[derive(Clone)]
pub struct AppState {
    /// Question answering pipeline (immutable after startup)
    pub pipeline: Arc<QueryPipeline>,

    /// Store used for health probes (absent when running against a stub)
    pub store: Option<PostgresStore>,

    /// Application start time
    pub start_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(pipeline: Arc<QueryPipeline>, store: Option<PostgresStore>) -> Self {
        Self {
            pipeline,
            store,
            start_time: Utc::now(),
        }
    }

    /// Get system uptime in seconds
    pub fn uptime_seconds(&self) -> i64 {
        (Utc::now() - self.start_time).num_seconds()
    }
}
