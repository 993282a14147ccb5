use std::sync::Arc;

use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use nq_inference::Backend;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::AppState;

fn default_backend() -> Backend {
    Backend::Groq
}

fn default_days() -> i64 {
    7
}

#[derive(Deserialize)]
pub struct ChatRequest {
    pub question: String,
    #[serde(default = "default_backend")]
    pub backend: Backend,
}

#[derive(Serialize)]
pub struct ChatResponse {
    pub response: String,
}

pub async fn chat(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ChatRequest>,
) -> impl IntoResponse {
    let response = state.synthesizer.answer_question(&req.question, req.backend).await;
    Json(ChatResponse { response })
}

#[derive(Deserialize)]
pub struct SummarizeParams {
    #[serde(default = "default_backend")]
    pub backend: Backend,
    #[serde(default = "default_days")]
    pub days: i64,
}

pub async fn summarize(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SummarizeParams>,
) -> impl IntoResponse {
    let summary = state.synthesizer.summarize_period(params.days, params.backend).await;
    Json(json!({ "summary": summary }))
}
