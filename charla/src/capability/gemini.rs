//! Gemini REST clients for the generation and code-execution capabilities.

use async_trait::async_trait;
use serde_json::{json, Value};

use super::{CodeExecution, Generation, MODEL_NO_RESPONSE_TEXT};
use crate::error::CapabilityError;

const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_MODEL: &str = "gemini-2.5-flash";

#[derive(Clone)]
struct GeminiClient {
    api_key: String,
    endpoint: String,
    model: String,
    http: reqwest::Client,
}

impl GeminiClient {
    fn new(api_key: String) -> Self {
        Self {
            api_key,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            http: reqwest::Client::new(),
        }
    }

    async fn generate(&self, payload: Value) -> Result<Value, CapabilityError> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.endpoint, self.model, self.api_key
        );
        let response = self.http.post(&url).json(&payload).send().await?;
        if !response.status().is_success() {
            return Err(CapabilityError::Status(response.status().as_u16()));
        }
        Ok(response.json().await?)
    }
}

/// Joined text of `candidates[0].content.parts[*].text`.
fn joined_text(response: &Value) -> String {
    let joined = response["candidates"][0]["content"]["parts"]
        .as_array()
        .map(|parts| {
            parts
                .iter()
                .filter_map(|part| part["text"].as_str())
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default();
    joined.trim().to_string()
}

/// Generation via the `generateContent` API.
pub struct GeminiGeneration {
    client: GeminiClient,
}

impl GeminiGeneration {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: GeminiClient::new(api_key.into()),
        }
    }

    /// Overrides the API endpoint (tests point this at a local stub).
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.client.endpoint = endpoint.into();
        self
    }
}

#[async_trait]
impl Generation for GeminiGeneration {
    async fn complete(&self, prompt: &str) -> Result<String, CapabilityError> {
        let payload = json!({
            "contents": [ { "role": "user", "parts": [ { "text": prompt } ] } ]
        });
        let response = self.client.generate(payload).await?;
        let text = joined_text(&response);
        if text.is_empty() {
            Ok(MODEL_NO_RESPONSE_TEXT.to_string())
        } else {
            Ok(text)
        }
    }
}

/// Code execution via the same API with the code-execution tool enabled.
/// Returns the raw response body; result parts vary in shape, so
/// normalization happens in the execution service.
pub struct GeminiCodeExecution {
    client: GeminiClient,
}

impl GeminiCodeExecution {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: GeminiClient::new(api_key.into()),
        }
    }

    /// Overrides the API endpoint (tests point this at a local stub).
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.client.endpoint = endpoint.into();
        self
    }
}

#[async_trait]
impl CodeExecution for GeminiCodeExecution {
    async fn execute(&self, language: &str, code: &str) -> Result<Value, CapabilityError> {
        let prompt = format!(
            "Run the following {language} code and return its output.\n\n```{language}\n{code}\n```"
        );
        let payload = json!({
            "contents": [ { "role": "user", "parts": [ { "text": prompt } ] } ],
            "tools": [ { "code_execution": {} } ]
        });
        self.client.generate(payload).await
    }
}
