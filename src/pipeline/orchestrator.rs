use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

use crate::agent::TextGenerator;
use crate::config::PipelineConfig;
use crate::domain::{Answer, PipelineStage, Question};
use crate::error::{OracleError, Result};
use crate::pipeline::executor::QueryStore;
use crate::pipeline::generator::QueryGenerator;
use crate::pipeline::interpreter::ResponseInterpreter;
use crate::pipeline::prompt::SeasonContext;
use crate::pipeline::sanitizer::QuerySanitizer;
use crate::pipeline::template::answer_from_plan;
use crate::schema::SchemaDescription;

/// Tracks one question's progress through the stages
struct StageTracker {
    stage: PipelineStage,
}

impl StageTracker {
    fn new() -> Self {
        Self {
            stage: PipelineStage::Start,
        }
    }

    fn advance(&mut self, next: PipelineStage) {
        debug_assert!(
            self.stage.can_transition_to(next),
            "invalid stage transition {} -> {}",
            self.stage,
            next
        );
        debug!("Stage {} -> {}", self.stage, next);
        self.stage = next;
    }

    /// Record the failure against the current stage and hand the error back
    fn fail(&mut self, err: OracleError) -> OracleError {
        if err.is_client_error() {
            info!(stage = %self.stage, kind = %err.kind(), "Question refused: {}", err);
        } else {
            error!(stage = %self.stage, kind = %err.kind(), "Pipeline failed: {}", err);
        }
        self.stage = PipelineStage::Error;
        err
    }
}

/// Question → SQL → guarded execution → answer
pub struct QueryPipeline {
    schema: SchemaDescription,
    generator: QueryGenerator,
    sanitizer: QuerySanitizer,
    store: Arc<dyn QueryStore>,
    interpreter: ResponseInterpreter,
    max_question_chars: usize,
    answer_templates: bool,
}

impl QueryPipeline {
    pub fn new(
        schema: SchemaDescription,
        llm: Arc<dyn TextGenerator>,
        store: Arc<dyn QueryStore>,
        config: &PipelineConfig,
    ) -> Self {
        let season = SeasonContext {
            label: config.current_season.clone(),
            season_id: config.current_season_id,
        };

        Self {
            schema,
            generator: QueryGenerator::new(llm.clone(), season),
            sanitizer: QuerySanitizer::new(config.max_query_chars),
            store,
            interpreter: ResponseInterpreter::new(llm, config.max_result_rows),
            max_question_chars: config.max_question_chars,
            answer_templates: config.answer_templates,
        }
    }

    /// Answer one natural-language question.
    ///
    /// Stops at the first failing stage; nothing is retried.
    #[instrument(skip_all, fields(request_id = %uuid::Uuid::new_v4()))]
    pub async fn answer(&self, raw_question: &str) -> Result<Answer> {
        let mut run = StageTracker::new();

        let question =
            Question::parse(raw_question, self.max_question_chars).map_err(|e| run.fail(e))?;
        info!("Answering question ({} chars)", question.as_str().chars().count());

        // Loaded once at startup; every request starts with it in hand
        run.advance(PipelineStage::SchemaLoaded);

        let generated = self
            .generator
            .generate(&question, &self.schema)
            .await
            .ok_or_else(|| {
                run.fail(OracleError::generation(
                    "query generation",
                    "no usable query returned",
                ))
            })?;
        run.advance(PipelineStage::QueryGenerated);
        debug!(sql = generated.sql(), "Candidate query");

        let validated = self.sanitizer.sanitize(&generated).map_err(|rejection| {
            warn!("Potentially unsafe query rejected: {}", rejection);
            run.fail(rejection.into())
        })?;
        run.advance(PipelineStage::QueryValidated);

        let result = self.store.execute(&validated).await.map_err(|e| run.fail(e))?;
        run.advance(PipelineStage::ResultFetched);
        debug!(
            "Result: {} columns, {} rows",
            result.columns.len(),
            result.row_count()
        );

        let templated = if self.answer_templates {
            validated
                .plan()
                .and_then(|plan| answer_from_plan(plan, &result.without_identifier_columns()))
        } else {
            None
        };

        let answer = match templated {
            Some(answer) => {
                debug!("Answer rendered from template");
                answer
            }
            None => self
                .interpreter
                .interpret(&question, &validated, &result)
                .await
                .ok_or_else(|| {
                    run.fail(OracleError::generation(
                        "interpretation",
                        "no usable answer returned",
                    ))
                })?,
        };
        run.advance(PipelineStage::AnswerReady);

        Ok(answer)
    }
}
