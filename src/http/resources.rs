use super::{read_body, AppState};
use crate::error::AppError;
use crate::gemini_client::GenerateRequest;
use crate::knowledge::{resources_prompt, RESOURCES_EMPTY, RESOURCES_FALLBACK};
use crate::types::{ResourcesReq, ResourcesResp};
use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, State},
    Json,
};
use std::sync::Arc;
use tracing::{debug, warn};

/// Nearby suppliers and services, found through Gemini with Maps grounding.
pub async fn local_resources(
    State(state): State<Arc<AppState>>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<ResourcesResp>, AppError> {
    let req = ResourcesReq::from_lenient(&read_body(body)?);
    let (query, location) = (req.query.trim(), req.location.trim());
    if query.is_empty() || location.is_empty() {
        return Err(AppError::MissingResourceQuery);
    }

    let api_key = state.api_key()?;
    let prompt = resources_prompt(query, location);
    let gen_req = GenerateRequest::prompt(&state.config.chat_model, prompt).with_maps_grounding();

    let resp = match state.generator.generate(&gen_req, api_key).await {
        Ok(gen) => {
            debug!(places = gen.places.len(), "resources: grounded answer");
            ResourcesResp {
                text: gen.text.unwrap_or_else(|| RESOURCES_EMPTY.to_string()),
                places: gen.places,
                model: Some(gen_req.model),
                fallback: None,
            }
        }
        Err(e) => {
            warn!(error = %e, "resources: upstream failed, using fallback");
            ResourcesResp {
                text: RESOURCES_FALLBACK.to_string(),
                places: Vec::new(),
                model: None,
                fallback: Some(true),
            }
        }
    };
    Ok(Json(resp))
}
