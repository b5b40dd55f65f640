use serde::{Deserialize, Serialize};
use std::fmt;

/// Optional plan the model may wrap around its SQL
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerPlan {
    /// Whether the result needs explanation beyond filling in a template
    #[serde(default = "default_requires_elaboration")]
    pub requires_elaboration: bool,
    /// Sentence with `{{column}}` placeholders for single-row results
    #[serde(default, alias = "answer template")]
    pub answer_template: Option<String>,
}

fn default_requires_elaboration() -> bool {
    true
}

/// Candidate query text produced by the model. Untrusted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedQuery {
    sql: String,
    plan: Option<AnswerPlan>,
}

impl GeneratedQuery {
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            plan: None,
        }
    }

    pub fn with_plan(sql: impl Into<String>, plan: AnswerPlan) -> Self {
        Self {
            sql: sql.into(),
            plan: Some(plan),
        }
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn plan(&self) -> Option<&AnswerPlan> {
        self.plan.as_ref()
    }
}

/// A query that passed the sanitizer.
///
/// Only `QuerySanitizer::sanitize` can build one, so anything holding a
/// `ValidatedQuery` has been through the policy gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedQuery {
    sql: String,
    plan: Option<AnswerPlan>,
}

impl ValidatedQuery {
    pub(crate) fn from_generated(query: &GeneratedQuery) -> Self {
        Self {
            sql: query.sql.clone(),
            plan: query.plan.clone(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.sql
    }

    pub fn plan(&self) -> Option<&AnswerPlan> {
        self.plan.as_ref()
    }

    /// Back to untrusted form, e.g. to re-check it
    pub fn to_generated(&self) -> GeneratedQuery {
        GeneratedQuery {
            sql: self.sql.clone(),
            plan: self.plan.clone(),
        }
    }
}

impl fmt::Display for ValidatedQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql)
    }
}
