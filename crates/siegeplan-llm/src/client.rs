// Gemini client for structured strategy generation.
//
// Sends the rendered prompt together with the response schema to the
// `generateContent` endpoint, requesting JSON output, and turns the returned
// text into a `Strategy`.

use async_trait::async_trait;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{debug, info, warn};

use siegeplan_core::strategy::Strategy;

use crate::extract::parse_strategy;
use crate::prompt::PromptRequest;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

// ---------------------------------------------------------------------------
// Errors and the generator seam
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerateError {
    /// The generative service failed or could not be reached.
    #[error("strategy generation failed: {0}")]
    Generation(String),

    /// The service answered, but not with a strategy.
    #[error("invalid response from the generative service: {0}")]
    InvalidResponse(String),
}

/// Anything that can turn a prompt request into a strategy.
#[async_trait]
pub trait StrategyGenerator: Send + Sync {
    async fn generate(&self, request: &PromptRequest) -> Result<Strategy, GenerateError>;
}

// ---------------------------------------------------------------------------
// GeminiClient
// ---------------------------------------------------------------------------

pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
    temperature: f32,
}

impl GeminiClient {
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key,
            model,
            base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
        }
    }

    /// Point the client at a different API root (e.g. a local mock).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }

    fn request_body(&self, request: &PromptRequest) -> Value {
        json!({
            "contents": [{ "role": "user", "parts": [{ "text": request.prompt }] }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": request.schema,
                "temperature": self.temperature
            }
        })
    }
}

#[async_trait]
impl StrategyGenerator for GeminiClient {
    async fn generate(&self, request: &PromptRequest) -> Result<Strategy, GenerateError> {
        info!(
            players = request.player_count(),
            map = %request.map,
            site = %request.site,
            model = %self.model,
            "Requesting strategy"
        );

        let response = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&self.request_body(request))
            .send()
            .await
            .map_err(|e| {
                warn!(?e, "Generative service request failed");
                GenerateError::Generation(format!("Network error: {e}"))
            })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| GenerateError::Generation(format!("Failed to read response: {e}")))?;

        if !status.is_success() {
            let detail = extract_error_message(&text);
            warn!(%status, detail = detail.as_deref().unwrap_or(""), "Generative service error");
            return Err(GenerateError::Generation(match detail {
                Some(msg) => format!("API returned status {status}: {msg}"),
                None => format!("API returned status {status}"),
            }));
        }

        let body: Value = serde_json::from_str(&text)
            .map_err(|e| GenerateError::InvalidResponse(format!("response is not JSON: {e}")))?;
        let generated = parse_candidate_text(&body).ok_or_else(|| {
            GenerateError::InvalidResponse("response contained no generated text".into())
        })?;
        debug!(chars = generated.len(), "Received generated text");

        let strategy = parse_strategy(&generated)?;
        if strategy.player_roles.len() != request.player_count() {
            warn!(
                expected = request.player_count(),
                got = strategy.player_roles.len(),
                "Strategy role count does not match the roster"
            );
        }
        Ok(strategy)
    }
}

// ---------------------------------------------------------------------------
// Response JSON helpers
// ---------------------------------------------------------------------------

/// Concatenate the text parts of the first candidate.
///
/// Expected shape: `{ "candidates": [ { "content": { "parts": [ { "text": "..." } ] } } ] }`
pub(crate) fn parse_candidate_text(body: &Value) -> Option<String> {
    let parts = body
        .get("candidates")?
        .get(0)?
        .get("content")?
        .get("parts")?
        .as_array()?;
    let text: String = parts
        .iter()
        .filter_map(|p| p.get("text").and_then(Value::as_str))
        .collect();
    (!text.trim().is_empty()).then_some(text)
}

/// Extract `error.message` from an error body, if it has one.
fn extract_error_message(body: &str) -> Option<String> {
    let v: Value = serde_json::from_str(body).ok()?;
    v.get("error")?
        .get("message")?
        .as_str()
        .map(|s| s.to_string())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
