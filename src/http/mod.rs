use crate::config::Config;
use crate::error::AppError;
use crate::gemini_client::Generator;
use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, DefaultBodyLimit},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, MethodRouter},
    Router,
};
use std::{any::Any, sync::Arc};
use tower_http::{
    catch_panic::CatchPanicLayer, set_header::SetResponseHeaderLayer, trace::TraceLayer,
};
use tracing::error;

pub mod ask;
pub mod chat;
pub mod health;
pub mod insights;
pub mod resources;

pub use ask::ask;
pub use chat::chat;
pub use health::health;
pub use insights::{agronomy_advice, field_status};
pub use resources::local_resources;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub generator: Arc<dyn Generator>,
}

impl AppState {
    pub fn api_key(&self) -> Result<&str, AppError> {
        self.config
            .gemini_api_key
            .as_deref()
            .ok_or(AppError::MissingApiKey)
    }
}

/// Unwraps a buffered body. Only the length limit gets its own status.
pub(crate) fn read_body(body: Result<Bytes, BytesRejection>) -> Result<Bytes, AppError> {
    body.map_err(|e| {
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            AppError::BodyTooLarge(e.body_text())
        } else {
            AppError::Internal(e.body_text())
        }
    })
}

/// POST-only endpoint that also answers CORS preflight.
fn post_only(handler: MethodRouter<Arc<AppState>>) -> MethodRouter<Arc<AppState>> {
    handler.options(preflight).fallback(method_not_allowed)
}

/// Questions of any size still reach the canned table.
fn ask_route() -> MethodRouter<Arc<AppState>> {
    post_only(post(ask)).layer(DefaultBodyLimit::disable())
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/ask", ask_route())
        .route("/api/ask", ask_route())
        .route("/.netlify/functions/ask", ask_route())
        .route("/insights/status", post_only(post(field_status)))
        .route("/insights/advice", post_only(post(agronomy_advice)))
        .route("/chat", post_only(post(chat)))
        .route("/resources", post_only(post(local_resources)))
        .route("/health", get(health))
        .with_state(state)
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("*"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static("Content-Type"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static("POST, OPTIONS"),
        ))
        .layer(TraceLayer::new_for_http())
}

async fn preflight() -> StatusCode {
    StatusCode::OK
}

async fn method_not_allowed() -> AppError {
    AppError::MethodNotAllowed
}

// Last-resort boundary: a panicking handler still yields the 500 error envelope.
fn panic_response(payload: Box<dyn Any + Send + 'static>) -> Response {
    let message = if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };
    error!(%message, "handler panicked");
    AppError::Internal(message).into_response()
}
