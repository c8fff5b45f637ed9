//! Stateless agronomist chat. The client keeps the conversation and sends it
//! back on every turn; the service replays it to Gemini under a fixed Uzbek
//! system instruction.
use super::{read_body, AppState};
use crate::error::AppError;
use crate::gemini_client::{GenerateRequest, Role, Turn};
use crate::knowledge::{CHAT_EMPTY, CHAT_FALLBACK, CHAT_SYSTEM_INSTRUCTION};
use crate::types::{ChatReq, InsightResp};
use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, State},
    Json,
};
use std::sync::Arc;
use tracing::{debug, warn};

fn conversation(req: ChatReq) -> Vec<Turn> {
    let mut turns: Vec<Turn> = req
        .history
        .into_iter()
        .map(|t| Turn {
            role: Some(t.role),
            text: t.text,
        })
        .collect();
    turns.push(Turn {
        role: Some(Role::User),
        text: req.message,
    });
    turns
}

pub async fn chat(
    State(state): State<Arc<AppState>>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<InsightResp>, AppError> {
    let body = read_body(body)?;
    let req: ChatReq = serde_json::from_slice(&body).map_err(|e| {
        debug!(error = %e, "chat: rejected body");
        AppError::InvalidChat
    })?;
    if req.message.trim().is_empty() {
        return Err(AppError::MissingMessage);
    }

    let api_key = state.api_key()?;
    let history_len = req.history.len();
    let gen_req = GenerateRequest {
        model: state.config.chat_model.clone(),
        system_instruction: Some(CHAT_SYSTEM_INSTRUCTION.to_string()),
        turns: conversation(req),
        maps_grounding: false,
    };

    let resp = match state.generator.generate(&gen_req, api_key).await {
        Ok(gen) => InsightResp {
            text: gen.text.unwrap_or_else(|| CHAT_EMPTY.to_string()),
            model: Some(gen_req.model),
            fallback: None,
        },
        Err(e) => {
            warn!(error = %e, history_len, "chat: upstream failed, using fallback");
            InsightResp {
                text: CHAT_FALLBACK.to_string(),
                model: None,
                fallback: Some(true),
            }
        }
    };
    Ok(Json(resp))
}
