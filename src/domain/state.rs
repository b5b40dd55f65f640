use serde::{Deserialize, Serialize};
use std::fmt;

/// Stages a single question moves through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PipelineStage {
    /// Question accepted, nothing done yet
    Start,
    /// Schema description available to the generator
    SchemaLoaded,
    /// Model returned a candidate query
    QueryGenerated,
    /// Candidate query passed the sanitizer
    QueryValidated,
    /// Store returned a result set
    ResultFetched,
    /// Answer produced for the caller
    AnswerReady,
    /// Stopped at the first failure
    Error,
}

impl PipelineStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineStage::Start => "START",
            PipelineStage::SchemaLoaded => "SCHEMA_LOADED",
            PipelineStage::QueryGenerated => "QUERY_GENERATED",
            PipelineStage::QueryValidated => "QUERY_VALIDATED",
            PipelineStage::ResultFetched => "RESULT_FETCHED",
            PipelineStage::AnswerReady => "ANSWER_READY",
            PipelineStage::Error => "ERROR",
        }
    }

    /// Check if this stage can transition to another stage
    pub fn can_transition_to(&self, target: PipelineStage) -> bool {
        use PipelineStage::*;

        match (self, target) {
            (Start, SchemaLoaded) => true,
            (SchemaLoaded, QueryGenerated) => true,
            (QueryGenerated, QueryValidated) => true,
            (QueryValidated, ResultFetched) => true,
            (ResultFetched, AnswerReady) => true,

            // Any non-terminal stage may fail
            (from, Error) => !from.is_terminal(),

            // No branching back
            _ => false,
        }
    }

    /// The single forward successor, if any
    pub fn next(&self) -> Option<PipelineStage> {
        use PipelineStage::*;

        match self {
            Start => Some(SchemaLoaded),
            SchemaLoaded => Some(QueryGenerated),
            QueryGenerated => Some(QueryValidated),
            QueryValidated => Some(ResultFetched),
            ResultFetched => Some(AnswerReady),
            AnswerReady | Error => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelineStage::AnswerReady | PipelineStage::Error)
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
