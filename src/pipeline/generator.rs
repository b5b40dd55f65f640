use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::agent::TextGenerator;
use crate::domain::{AnswerPlan, GeneratedQuery, Question};
use crate::pipeline::prompt::{query_prompt, SeasonContext};
use crate::schema::SchemaDescription;

/// JSON plan contract the query prompt asks for
#[derive(Debug, Deserialize)]
struct RawPlan {
    #[serde(default)]
    sql: String,
    #[serde(flatten)]
    plan: AnswerPlan,
}

/// Remove a surrounding Markdown code fence (```sql ... ```), if any
pub(crate) fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(start) = trimmed.find("```") else {
        return trimmed;
    };

    let after = &trimmed[start + 3..];
    // Language tag runs to the end of the opening line
    let body = match after.find('\n') {
        Some(nl) if after[..nl].trim().chars().all(|c| c.is_ascii_alphanumeric()) => {
            &after[nl + 1..]
        }
        _ => after,
    };
    let end = body.find("```").unwrap_or(body.len());
    body[..end].trim()
}

/// Locate a JSON object embedded in surrounding prose
fn extract_json(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

fn parse_plan(json: &str) -> Result<Option<GeneratedQuery>, serde_json::Error> {
    let parsed: RawPlan = serde_json::from_str(json)?;
    let sql = strip_code_fences(&parsed.sql).to_string();
    if sql.is_empty() {
        return Ok(None);
    }
    Ok(Some(GeneratedQuery::with_plan(sql, parsed.plan)))
}

/// Turn raw model output into a candidate query.
///
/// Accepts either bare SQL or the JSON plan, also when the plan is preceded
/// by prose. Returns `None` when nothing usable is present.
pub fn parse_generated(raw: &str) -> Option<GeneratedQuery> {
    let cleaned = strip_code_fences(raw);
    if cleaned.is_empty() {
        return None;
    }

    if let Some(json) = extract_json(cleaned) {
        match parse_plan(json) {
            Ok(parsed) => return parsed,
            // Output that is nothing but a broken object has no SQL to fall back on
            Err(e) if cleaned.starts_with('{') => {
                warn!("Invalid JSON plan returned by the model: {}", e);
                return None;
            }
            Err(e) => debug!("Braces in output are not a plan ({}), treating as SQL", e),
        }
    } else if cleaned.starts_with('{') {
        warn!("Unterminated JSON plan returned by the model");
        return None;
    }

    Some(GeneratedQuery::new(cleaned))
}

/// Produces candidate SQL for a question
pub struct QueryGenerator {
    llm: Arc<dyn TextGenerator>,
    season: SeasonContext,
}

impl QueryGenerator {
    pub fn new(llm: Arc<dyn TextGenerator>, season: SeasonContext) -> Self {
        Self { llm, season }
    }

    /// Ask the model for a query.
    ///
    /// Every failure (transport, status, unusable output) is logged and
    /// collapsed into `None`; the caller decides what that means.
    pub async fn generate(
        &self,
        question: &Question,
        schema: &SchemaDescription,
    ) -> Option<GeneratedQuery> {
        let prompt = query_prompt(question, schema, &self.season);

        let raw = match self.llm.generate_query(&prompt).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Query generation call failed: {}", e);
                return None;
            }
        };

        let generated = parse_generated(&raw);
        match &generated {
            Some(query) => debug!("Generated query ({} chars)", query.sql().len()),
            None => warn!("Model returned no usable query ({} chars of output)", raw.len()),
        }
        generated
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::MockTextGenerator;
    use crate::error::OracleError;

    fn season() -> SeasonContext {
        SeasonContext {
            label: "2025-26".to_string(),
            season_id: 22025,
        }
    }

    fn schema() -> SchemaDescription {
        SchemaDescription::from_text("CREATE TABLE game (id BIGINT);").unwrap()
    }

    fn question() -> Question {
        Question::parse("How many games this season?", 500).unwrap()
    }

    #[test]
    fn test_strip_code_fences() {
        assert_eq!(strip_code_fences("```sql\nSELECT 1;\n```"), "SELECT 1;");
        assert_eq!(strip_code_fences("```\nSELECT 1;\n```"), "SELECT 1;");
        assert_eq!(strip_code_fences("```SELECT 1;```"), "SELECT 1;");
        assert_eq!(strip_code_fences("  SELECT 1;  "), "SELECT 1;");
        assert_eq!(
            strip_code_fences("Here you go:\n```json\n{\"sql\": \"SELECT 1\"}\n```\nEnjoy"),
            "{\"sql\": \"SELECT 1\"}"
        );
    }

    #[test]
    fn test_parse_bare_sql() {
        let query = parse_generated("SELECT COUNT(*) FROM game").unwrap();
        assert_eq!(query.sql(), "SELECT COUNT(*) FROM game");
        assert!(query.plan().is_none());
    }

    #[test]
    fn test_parse_json_plan() {
        let raw = r#"```json
{"sql": "SELECT COUNT(*) AS value FROM game", "requires_elaboration": false, "answer_template": "There were {{value}} games."}
```"#;
        let query = parse_generated(raw).unwrap();
        assert_eq!(query.sql(), "SELECT COUNT(*) AS value FROM game");
        let plan = query.plan().unwrap();
        assert!(!plan.requires_elaboration);
        assert_eq!(plan.answer_template.as_deref(), Some("There were {{value}} games."));
    }

    #[test]
    fn test_plan_defaults_to_elaboration() {
        let query = parse_generated(r#"{"sql": "SELECT 1"}"#).unwrap();
        assert!(query.plan().unwrap().requires_elaboration);
    }

    #[test]
    fn test_parse_plan_after_prose() {
        let raw = r#"Here is the plan: {"sql": "SELECT COUNT(*) AS value FROM game", "requires_elaboration": false, "answer_template": "{{value}} games."} Hope it helps"#;
        let query = parse_generated(raw).unwrap();
        assert_eq!(query.sql(), "SELECT COUNT(*) AS value FROM game");
        assert!(!query.plan().unwrap().requires_elaboration);
    }

    #[test]
    fn test_braces_that_are_not_a_plan_stay_sql() {
        let raw = "SELECT full_name FROM player WHERE full_name ~ '^[A-Z]{2}'";
        let query = parse_generated(raw).unwrap();
        assert_eq!(query.sql(), raw);
        assert!(query.plan().is_none());
    }

    #[test]
    fn test_unusable_output_is_none() {
        assert!(parse_generated("").is_none());
        assert!(parse_generated("```\n```").is_none());
        assert!(parse_generated(r#"{"sql": ""}"#).is_none());
        assert!(parse_generated("{not json").is_none());
    }

    #[tokio::test]
    async fn test_generate_passes_schema_prompt() {
        let mut llm = MockTextGenerator::new();
        llm.expect_generate_query()
            .withf(|prompt| {
                prompt.system.contains("CREATE TABLE game")
                    && prompt.user.contains("How many games this season?")
            })
            .times(1)
            .returning(|_| Ok("```sql\nSELECT COUNT(*) FROM game WHERE season_id = 22025\n```".to_string()));

        let generator = QueryGenerator::new(Arc::new(llm), season());
        let query = generator.generate(&question(), &schema()).await.unwrap();
        assert_eq!(query.sql(), "SELECT COUNT(*) FROM game WHERE season_id = 22025");
    }

    #[tokio::test]
    async fn test_generate_failure_is_none() {
        let mut llm = MockTextGenerator::new();
        llm.expect_generate_query()
            .returning(|_| Err(OracleError::generation("chat completions", "timed out")));

        let generator = QueryGenerator::new(Arc::new(llm), season());
        assert!(generator.generate(&question(), &schema()).await.is_none());
    }
}
