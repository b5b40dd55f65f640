pub mod adapters;
pub mod agent;
pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod pipeline;
pub mod schema;

pub use adapters::PostgresStore;
pub use agent::{OpenAiClient, Prompt, TextGenerator};
pub use config::AppConfig;
pub use domain::{Answer, GeneratedQuery, PipelineStage, Question, QueryResult, ValidatedQuery};
pub use error::{OracleError, Result};
pub use pipeline::{QueryPipeline, QuerySanitizer, QueryStore, Rejection};
pub use schema::SchemaDescription;
