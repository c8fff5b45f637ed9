use crate::gemini_client::{Place, Role};
use crate::knowledge::PROJECT_NAME;
use serde::{Deserialize, Serialize};

// ============================
// Ask
// ============================

/// Inbound body for the ask endpoint. Unknown fields are ignored.
#[derive(Deserialize, Default, Debug)]
pub struct AskReq {
    #[serde(default)]
    pub question: Option<serde_json::Value>,
}

impl AskReq {
    /// Parses a raw body, treating anything that is not valid JSON as `{}`.
    pub fn from_lenient(body: &[u8]) -> Self {
        serde_json::from_slice(body).unwrap_or_default()
    }

    /// The question text, if present as a non-empty string.
    pub fn question(&self) -> Option<&str> {
        match &self.question {
            Some(serde_json::Value::String(q)) if !q.is_empty() => Some(q.as_str()),
            _ => None,
        }
    }
}

/// One answer, tagged by how it was produced. Serialized through `AnswerBody`
/// into the flat `{answer, project, model?, cached?, fallback?}` shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(into = "AnswerBody")]
pub enum Answer {
    Canned { answer: String, model: String },
    Model { answer: String, model: String },
    Fallback { answer: String },
}

#[derive(Serialize)]
pub struct AnswerBody {
    answer: String,
    project: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    cached: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    fallback: Option<bool>,
}

impl From<Answer> for AnswerBody {
    fn from(a: Answer) -> Self {
        let (answer, model, cached, fallback) = match a {
            Answer::Canned { answer, model } => (answer, Some(model), Some(true), None),
            Answer::Model { answer, model } => (answer, Some(model), None, None),
            Answer::Fallback { answer } => (answer, None, None, Some(true)),
        };
        AnswerBody {
            answer,
            project: PROJECT_NAME,
            model,
            cached,
            fallback,
        }
    }
}

// ============================
// Insights
// ============================

#[derive(Deserialize, Debug, Clone)]
pub struct SensorReadings {
    pub moisture: f64,
    pub temp: f64,
    pub ec: f64,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Weather {
    pub condition: String,
    pub temp: f64,
    pub precip_chance: f64,
    pub forecast: String,
}

#[derive(Deserialize, Debug)]
pub struct AdviceReq {
    pub sensors: SensorReadings,
    pub weather: Weather,
}

#[derive(Serialize, Debug, PartialEq)]
pub struct InsightResp {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback: Option<bool>,
}

// ============================
// Chat
// ============================

#[derive(Deserialize, Debug, Clone)]
pub struct ChatTurn {
    pub role: Role,
    pub text: String,
}

/// Earlier turns of the conversation plus the new user message.
#[derive(Deserialize, Debug)]
pub struct ChatReq {
    #[serde(default)]
    pub history: Vec<ChatTurn>,
    #[serde(default)]
    pub message: String,
}

// ============================
// Resources
// ============================

#[derive(Deserialize, Default, Debug)]
pub struct ResourcesReq {
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub location: String,
}

impl ResourcesReq {
    /// Same leniency as the ask body: anything unparsable is `{}`.
    pub fn from_lenient(body: &[u8]) -> Self {
        serde_json::from_slice(body).unwrap_or_default()
    }
}

#[derive(Serialize, Debug, PartialEq)]
pub struct ResourcesResp {
    pub text: String,
    pub places: Vec<Place>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback: Option<bool>,
}

#[derive(Serialize)]
pub struct HealthOut {
    pub status: &'static str,
    pub project: &'static str,
    pub model: String,
    pub chat_model: String,
    pub credential_configured: bool,
}

// ============================
// Errors
// ============================

#[derive(Serialize, Debug)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}
