//! POST /predict: answers a user message with RAG context.

use std::sync::Arc;

use axum::{Json, extract::State};
use tracing::info;

use crate::{
    core::app_state::AppState,
    error_handler::AppResult,
    middleware_layer::json_extractor::LenientJson,
    routes::predict::predict_request::{PredictRequest, PredictResponse},
};

/// Handler: POST /predict
///
/// # Example
/// ```bash
/// curl -X POST http://127.0.0.1:8000/predict \
///   -H 'content-type: application/json' \
///   -d '{"text":"Quels sont les frais d'\''inscription ?"}'
/// ```
pub async fn predict(
    State(state): State<Arc<AppState>>,
    LenientJson(body): LenientJson<PredictRequest>,
) -> AppResult<Json<PredictResponse>> {
    let text = body.text.unwrap_or_default();
    let answer = state.pipeline.answer(&text).await?;
    info!(tag = %answer.tag, "predict answered");
    Ok(Json(PredictResponse {
        reply: answer.reply,
        tag: answer.tag,
    }))
}
