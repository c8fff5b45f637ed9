use super::{read_body, AppState};
use crate::error::AppError;
use crate::gemini_client::GenerateRequest;
use crate::knowledge::{
    ask_prompt, match_canned, CANNED_MODEL_LABEL, FALLBACK_UNAVAILABLE, FALLBACK_VISIT_SITE,
    NO_ANSWER,
};
use crate::types::{Answer, AskReq};
use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, State},
    Json,
};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub async fn ask(
    State(state): State<Arc<AppState>>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<Answer>, AppError> {
    let t0 = std::time::Instant::now();
    let body = read_body(body)?;

    // Malformed JSON is deliberately read as `{}` and reported as a missing field.
    let req = AskReq::from_lenient(&body);
    let Some(question) = req.question() else {
        debug!("ask: rejected, no question");
        return Err(AppError::MissingQuestion);
    };

    let api_key = state.api_key().inspect_err(|_| {
        warn!("ask: no Gemini API key configured");
    })?;

    // 1) Canned answers never touch the network
    if let Some((key, answer)) = match_canned(question) {
        info!(key, "ask: canned hit");
        return Ok(Json(Answer::Canned {
            answer: answer.to_string(),
            model: CANNED_MODEL_LABEL.to_string(),
        }));
    }

    // 2) Miss -> one Gemini call, no retry
    let req = GenerateRequest::prompt(&state.config.gen_model, ask_prompt(question));
    let answer = match state.generator.generate(&req, api_key).await {
        Ok(gen) => Answer::Model {
            answer: gen.text.unwrap_or_else(|| NO_ANSWER.to_string()),
            model: state.config.gen_model.clone(),
        },
        // 3) Any upstream failure is a soft answer, never an HTTP error
        Err(e) => {
            warn!(error = %e, "ask: upstream failed, using fallback");
            let text = if e.is_status() {
                FALLBACK_VISIT_SITE
            } else {
                FALLBACK_UNAVAILABLE
            };
            Answer::Fallback {
                answer: text.to_string(),
            }
        }
    };

    debug!(latency_ms = t0.elapsed().as_millis() as u64, "ask: answered");
    Ok(Json(answer))
}
