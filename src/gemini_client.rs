use crate::config::Config;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Failures talking to the generative endpoint. None of these reach the caller
/// as an HTTP error; handlers turn them into fallback answers.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("upstream returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("undecodable upstream body: {0}")]
    Decode(String),
}

impl UpstreamError {
    /// The upstream answered, just not with a 2xx (quota, bad key, ...).
    pub fn is_status(&self) -> bool {
        matches!(self, UpstreamError::Status { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

/// One entry of `contents`. A single-prompt call leaves the role unset.
#[derive(Debug, Clone, PartialEq)]
pub struct Turn {
    pub role: Option<Role>,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenerateRequest {
    pub model: String,
    pub system_instruction: Option<String>,
    pub turns: Vec<Turn>,
    pub maps_grounding: bool,
}

impl GenerateRequest {
    pub fn prompt(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            system_instruction: None,
            turns: vec![Turn {
                role: None,
                text: prompt.into(),
            }],
            maps_grounding: false,
        }
    }

    pub fn with_system_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = Some(instruction.into());
        self
    }

    pub fn with_maps_grounding(mut self) -> Self {
        self.maps_grounding = true;
        self
    }

    /// Text of the final turn, which is what the caller just asked.
    pub fn last_text(&self) -> Option<&str> {
        self.turns.last().map(|t| t.text.as_str())
    }
}

/// A grounding source (a Maps place or a web page).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Place {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
}

#[derive(Debug, Default, PartialEq)]
pub struct Generation {
    /// `None` when the upstream succeeded but produced no usable text.
    pub text: Option<String>,
    pub places: Vec<Place>,
}

#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(
        &self,
        req: &GenerateRequest,
        api_key: &str,
    ) -> Result<Generation, UpstreamError>;
}

// ============================
// Wire types
// ============================

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenReq<'a> {
    contents: Vec<Content<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<SystemInstruction<'a>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<Tool>,
}

#[derive(Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<Role>,
    parts: [Part<'a>; 1],
}

#[derive(Serialize)]
struct SystemInstruction<'a> {
    parts: [Part<'a>; 1],
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Tool {
    google_maps: GoogleMaps,
}

#[derive(Serialize)]
struct GoogleMaps {}

impl<'a> From<&'a GenerateRequest> for GenReq<'a> {
    fn from(req: &'a GenerateRequest) -> Self {
        GenReq {
            contents: req
                .turns
                .iter()
                .map(|t| Content {
                    role: t.role,
                    parts: [Part { text: &t.text }],
                })
                .collect(),
            system_instruction: req.system_instruction.as_deref().map(|text| SystemInstruction {
                parts: [Part { text }],
            }),
            tools: if req.maps_grounding {
                vec![Tool {
                    google_maps: GoogleMaps {},
                }]
            } else {
                Vec::new()
            },
        }
    }
}

#[derive(Deserialize, Default)]
struct GenResp {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
    #[serde(default)]
    grounding_metadata: Option<GroundingMetadata>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GroundingMetadata {
    #[serde(default)]
    grounding_chunks: Vec<GroundingChunk>,
}

#[derive(Deserialize)]
struct GroundingChunk {
    #[serde(default)]
    maps: Option<Place>,
    #[serde(default)]
    web: Option<Place>,
}

impl GenResp {
    /// `candidates[0].content.parts[0].text` (when non-empty) plus the Maps or
    /// web sources of `candidates[0].groundingMetadata.groundingChunks`.
    fn into_generation(self) -> Generation {
        let Some(first) = self.candidates.into_iter().next() else {
            return Generation::default();
        };
        let text = first
            .content
            .and_then(|c| c.parts.into_iter().next())
            .and_then(|p| p.text)
            .filter(|t| !t.is_empty());
        let places = first
            .grounding_metadata
            .map(|g| g.grounding_chunks)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|chunk| chunk.maps.or(chunk.web))
            .filter(|p| p.uri.is_some() || p.title.is_some())
            .collect();
        Generation { text, places }
    }
}

// ============================
// Client
// ============================

/// Gemini `generateContent` over HTTPS, one attempt per call.
pub struct GeminiClient {
    http: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl GeminiClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            timeout,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.gemini_base_url.clone(), config.upstream_timeout)
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/models/{}:generateContent", self.base_url, model)
    }
}

#[async_trait]
impl Generator for GeminiClient {
    async fn generate(
        &self,
        req: &GenerateRequest,
        api_key: &str,
    ) -> Result<Generation, UpstreamError> {
        // The key travels in the query string; strip URLs from errors so it is never logged.
        let resp = self
            .http
            .post(self.endpoint(&req.model))
            .query(&[("key", api_key)])
            .timeout(self.timeout)
            .json(&GenReq::from(req))
            .send()
            .await
            .map_err(|e| UpstreamError::Transport(e.without_url()))?;

        let status = resp.status();
        let bytes = resp
            .bytes()
            .await
            .map_err(|e| UpstreamError::Transport(e.without_url()))?;
        debug!(
            model = %req.model,
            status = status.as_u16(),
            len = bytes.len(),
            "gemini response"
        );

        if !status.is_success() {
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&bytes).chars().take(512).collect(),
            });
        }

        let parsed: GenResp =
            serde_json::from_slice(&bytes).map_err(|e| UpstreamError::Decode(e.to_string()))?;
        Ok(parsed.into_generation())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        http::{StatusCode, Uri},
        response::{IntoResponse, Response},
        Json, Router,
    };
    use serde_json::{json, Value};

    const MODEL: &str = "gemini-2.0-flash-lite";

    async fn fake_gemini(uri: Uri, body: String) -> Response {
        let path = uri.path();
        let query = uri.query().unwrap_or_default();
        let expected = format!("/models/{MODEL}:generateContent");
        if !path.ends_with(&expected) || query != "key=test-key" {
            return (StatusCode::NOT_FOUND, "wrong endpoint").into_response();
        }

        if path.starts_with("/ok/") {
            let req: Value = serde_json::from_str(&body).unwrap_or_default();
            let prompt = req["contents"][0]["parts"][0]["text"]
                .as_str()
                .unwrap_or("<none>");
            Json(json!({
                "candidates": [{"content": {"parts": [{"text": format!("echo: {prompt}")}]}}]
            }))
            .into_response()
        } else if path.starts_with("/mirror/") {
            // Hands the request body back as the answer text.
            Json(json!({
                "candidates": [{"content": {"parts": [{"text": body}]}}]
            }))
            .into_response()
        } else if path.starts_with("/maps/") {
            Json(json!({
                "candidates": [{
                    "content": {"parts": [{"text": "Yaqin atrofda 2 ta do'kon bor."}]},
                    "groundingMetadata": {"groundingChunks": [
                        {"maps": {
                            "uri": "https://maps.google.com/?cid=1",
                            "title": "Agro Servis",
                            "placeId": "p1"
                        }},
                        {"web": {"uri": "https://agro.uz", "title": "Agro UZ"}},
                        {"maps": {}},
                        {"retrievedContext": {"uri": "ignored"}}
                    ]}
                }]
            }))
            .into_response()
        } else if path.starts_with("/quota/") {
            (
                StatusCode::TOO_MANY_REQUESTS,
                Json(json!({"error": {"code": 429, "status": "RESOURCE_EXHAUSTED"}})),
            )
                .into_response()
        } else if path.starts_with("/html/") {
            "<html>gateway</html>".into_response()
        } else if path.starts_with("/empty/") {
            Json(json!({"candidates": []})).into_response()
        } else if path.starts_with("/blank/") {
            Json(json!({"candidates": [{"content": {"parts": [{"text": ""}]}}]})).into_response()
        } else if path.starts_with("/slow/") {
            tokio::time::sleep(Duration::from_secs(3)).await;
            Json(json!({"candidates": []})).into_response()
        } else {
            (StatusCode::NOT_FOUND, "unknown").into_response()
        }
    }

    async fn spawn_fake_gemini() -> String {
        let app = Router::new().fallback(fake_gemini);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn client(base: &str, scenario: &str) -> GeminiClient {
        GeminiClient::new(format!("{base}/{scenario}"), Duration::from_millis(500))
    }

    fn prompt(text: &str) -> GenerateRequest {
        GenerateRequest::prompt(MODEL, text)
    }

    #[tokio::test]
    async fn test_success_extracts_first_text() {
        let base = spawn_fake_gemini().await;
        let out = client(&base, "ok")
            .generate(&prompt("Salom dunyo"), "test-key")
            .await
            .unwrap();
        assert_eq!(out.text.as_deref(), Some("echo: Salom dunyo"));
        assert!(out.places.is_empty());
    }

    #[tokio::test]
    async fn test_single_prompt_wire_shape() {
        let base = spawn_fake_gemini().await;
        let out = client(&base, "mirror")
            .generate(&prompt("Salom"), "test-key")
            .await
            .unwrap();
        let sent: Value = serde_json::from_str(&out.text.unwrap()).unwrap();
        assert_eq!(sent, json!({"contents": [{"parts": [{"text": "Salom"}]}]}));
    }

    #[tokio::test]
    async fn test_conversation_wire_shape() {
        let base = spawn_fake_gemini().await;
        let req = GenerateRequest {
            model: MODEL.into(),
            system_instruction: None,
            turns: vec![
                Turn {
                    role: Some(Role::User),
                    text: "Salom".into(),
                },
                Turn {
                    role: Some(Role::Model),
                    text: "Assalomu alaykum!".into(),
                },
            ],
            maps_grounding: false,
        }
        .with_system_instruction("Siz AgroNIS")
        .with_maps_grounding();

        let out = client(&base, "mirror").generate(&req, "test-key").await.unwrap();
        let sent: Value = serde_json::from_str(&out.text.unwrap()).unwrap();
        assert_eq!(
            sent,
            json!({
                "contents": [
                    {"role": "user", "parts": [{"text": "Salom"}]},
                    {"role": "model", "parts": [{"text": "Assalomu alaykum!"}]}
                ],
                "systemInstruction": {"parts": [{"text": "Siz AgroNIS"}]},
                "tools": [{"googleMaps": {}}]
            })
        );
    }

    #[tokio::test]
    async fn test_grounding_chunks_become_places() {
        let base = spawn_fake_gemini().await;
        let out = client(&base, "maps")
            .generate(&prompt("o'g'it do'koni"), "test-key")
            .await
            .unwrap();
        assert_eq!(out.text.as_deref(), Some("Yaqin atrofda 2 ta do'kon bor."));
        assert_eq!(
            out.places,
            vec![
                Place {
                    title: Some("Agro Servis".into()),
                    uri: Some("https://maps.google.com/?cid=1".into()),
                },
                Place {
                    title: Some("Agro UZ".into()),
                    uri: Some("https://agro.uz".into()),
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_non_2xx_is_status_error() {
        let base = spawn_fake_gemini().await;
        let err = client(&base, "quota")
            .generate(&prompt("x"), "test-key")
            .await
            .unwrap_err();
        assert!(err.is_status());
        match err {
            UpstreamError::Status { status, body } => {
                assert_eq!(status, 429);
                assert!(body.contains("RESOURCE_EXHAUSTED"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_non_json_success_is_decode_error() {
        let base = spawn_fake_gemini().await;
        let err = client(&base, "html")
            .generate(&prompt("x"), "test-key")
            .await
            .unwrap_err();
        assert!(matches!(err, UpstreamError::Decode(_)));
    }

    #[tokio::test]
    async fn test_missing_or_blank_candidate_has_no_text() {
        let base = spawn_fake_gemini().await;
        for scenario in ["empty", "blank"] {
            let out = client(&base, scenario)
                .generate(&prompt("x"), "test-key")
                .await
                .unwrap();
            assert_eq!(out, Generation::default(), "{scenario}");
        }
    }

    #[tokio::test]
    async fn test_timeout_is_transport_error() {
        let base = spawn_fake_gemini().await;
        let err = client(&base, "slow")
            .generate(&prompt("x"), "test-key")
            .await
            .unwrap_err();
        assert!(matches!(err, UpstreamError::Transport(ref e) if e.is_timeout()));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_transport_error() {
        // Bind then drop to get a port nothing listens on.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = client(&format!("http://{addr}"), "ok")
            .generate(&prompt("x"), "test-key")
            .await
            .unwrap_err();
        assert!(matches!(err, UpstreamError::Transport(_)));
        assert!(!err.to_string().contains("test-key"));
    }

    #[test]
    fn test_first_text_paths() {
        let parse = |v: Value| {
            serde_json::from_value::<GenResp>(v)
                .unwrap()
                .into_generation()
                .text
        };
        assert_eq!(parse(json!({})), None);
        assert_eq!(parse(json!({"candidates": [{}]})), None);
        assert_eq!(parse(json!({"candidates": [{"content": {"parts": []}}]})), None);
        assert_eq!(
            parse(json!({"candidates": [
                {"content": {"parts": [{"text": "first"}, {"text": "second"}]}},
                {"content": {"parts": [{"text": "other"}]}}
            ]})),
            Some("first".to_string())
        );
    }
}
