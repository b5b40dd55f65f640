use std::sync::Arc;
use tracing::{debug, warn};

use crate::agent::TextGenerator;
use crate::domain::{Answer, Question, QueryResult, ValidatedQuery};
use crate::pipeline::generator::strip_code_fences;
use crate::pipeline::prompt::interpretation_prompt;

/// Turns a result set into prose via the model
pub struct ResponseInterpreter {
    llm: Arc<dyn TextGenerator>,
    max_rows: usize,
}

/// Keep only the prose before any code block the model adds
fn clean_answer(raw: &str) -> &str {
    let trimmed = raw.trim();
    if trimmed.starts_with("```") {
        return strip_code_fences(trimmed);
    }
    trimmed.split("```").next().unwrap_or_default().trim()
}

impl ResponseInterpreter {
    pub fn new(llm: Arc<dyn TextGenerator>, max_rows: usize) -> Self {
        Self {
            llm,
            max_rows: max_rows.max(1),
        }
    }

    /// Produce an answer, or `None` if the model could not be reached or said nothing.
    ///
    /// Identifier columns are dropped before the rows are shown to the model.
    /// An empty result is phrased as "no matching data", not as a failure.
    pub async fn interpret(
        &self,
        question: &Question,
        query: &ValidatedQuery,
        result: &QueryResult,
    ) -> Option<Answer> {
        let visible = result
            .without_identifier_columns()
            .truncated(self.max_rows);
        let prompt = interpretation_prompt(question, query, &visible, result.row_count());

        let raw = match self.llm.generate_interpretation(&prompt).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Interpretation call failed: {}", e);
                return None;
            }
        };

        let answer = Answer::new(clean_answer(&raw));
        match &answer {
            Some(answer) => debug!("Interpretation produced {} chars", answer.as_str().len()),
            None => warn!("Model returned an empty interpretation"),
        }
        answer
    }
}
