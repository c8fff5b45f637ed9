use super::AppState;
use crate::knowledge::PROJECT_NAME;
use crate::types::HealthOut;
use axum::{extract::State, Json};
use std::sync::Arc;

pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthOut> {
    Json(HealthOut {
        status: "ok",
        project: PROJECT_NAME,
        model: state.config.gen_model.clone(),
        chat_model: state.config.chat_model.clone(),
        credential_configured: state.config.gemini_api_key.is_some(),
    })
}
