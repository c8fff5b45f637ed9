//! Short Gemini readings of sensor data: a two-sentence field status and an
//! action/reason/benefit recommendation. Both degrade to fixed Uzbek text.
use super::{read_body, AppState};
use crate::error::AppError;
use crate::gemini_client::GenerateRequest;
use crate::knowledge::{
    advice_prompt, status_prompt, ADVICE_EMPTY, ADVICE_FALLBACK, STATUS_EMPTY, STATUS_FALLBACK,
};
use crate::types::{AdviceReq, InsightResp, SensorReadings};
use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, State},
    Json,
};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::{debug, warn};

fn parse_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, AppError> {
    serde_json::from_slice(body).map_err(|e| {
        debug!(error = %e, "insights: rejected body");
        AppError::InvalidReadings
    })
}

async fn run_insight(
    state: &AppState,
    prompt: String,
    empty: &str,
    fallback: &str,
) -> Result<Json<InsightResp>, AppError> {
    let api_key = state.api_key()?;
    let req = GenerateRequest::prompt(&state.config.gen_model, prompt);
    let resp = match state.generator.generate(&req, api_key).await {
        Ok(gen) => InsightResp {
            text: gen.text.unwrap_or_else(|| empty.to_string()),
            model: Some(state.config.gen_model.clone()),
            fallback: None,
        },
        Err(e) => {
            warn!(error = %e, "insights: upstream failed, using fallback");
            InsightResp {
                text: fallback.to_string(),
                model: None,
                fallback: Some(true),
            }
        }
    };
    Ok(Json(resp))
}

pub async fn field_status(
    State(state): State<Arc<AppState>>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<InsightResp>, AppError> {
    let readings: SensorReadings = parse_body(&read_body(body)?)?;
    run_insight(&state, status_prompt(&readings), STATUS_EMPTY, STATUS_FALLBACK).await
}

pub async fn agronomy_advice(
    State(state): State<Arc<AppState>>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<InsightResp>, AppError> {
    let req: AdviceReq = parse_body(&read_body(body)?)?;
    run_insight(
        &state,
        advice_prompt(&req.sensors, &req.weather),
        ADVICE_EMPTY,
        ADVICE_FALLBACK,
    )
    .await
}
