use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    Json,
};
use tracing::{debug, info};

use crate::api::{state::AppState, types::*};
use crate::error::OracleError;

async fn answer(state: &AppState, question: &str) -> std::result::Result<Json<AnswerResponse>, ApiError> {
    match state.pipeline.answer(question).await {
        Ok(answer) => Ok(Json(AnswerResponse {
            answer: answer.into_inner(),
        })),
        Err(e) => Err(api_error(&e)),
    }
}

/// Malformed request input is a client error like any other bad question
fn malformed(detail: String) -> ApiError {
    debug!("Malformed query request: {}", detail);
    api_error(&OracleError::InvalidQuestion(
        "a non-empty \"question\" string is required".to_string(),
    ))
}

/// GET /query?question=...
pub async fn get_answer(
    State(state): State<AppState>,
    params: std::result::Result<Query<QuestionParams>, QueryRejection>,
) -> std::result::Result<Json<AnswerResponse>, ApiError> {
    info!("GET /query");
    let Query(params) = params.map_err(|e| malformed(e.body_text()))?;
    answer(&state, &params.question).await
}

/// POST /api/query
pub async fn post_answer(
    State(state): State<AppState>,
    body: std::result::Result<Json<QuestionParams>, JsonRejection>,
) -> std::result::Result<Json<AnswerResponse>, ApiError> {
    info!("POST /api/query");
    let Json(body) = body.map_err(|e| malformed(e.body_text()))?;
    answer(&state, &body.question).await
}
