//! External capabilities: text generation and code execution.
//!
//! Both are traits so the server and tests can inject mocks. Without
//! credentials the deterministic simulated implementations are used, which
//! keeps the whole system operable (and testable) offline.

mod gemini;

pub use gemini::{GeminiCodeExecution, GeminiGeneration};

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::CapabilityError;

/// Fixed reply when the model returns an empty completion.
pub const MODEL_NO_RESPONSE_TEXT: &str = "No response received from the model.";

/// Deterministic execution output used when no API key is configured.
pub const SIMULATED_EXEC_TEXT: &str =
    "Simulated execution (no GEMINI_API_KEY): code execution is not configured.";

/// Deterministic reply used when no API key is configured.
pub fn simulated_reply(text: &str) -> String {
    format!("Simulated reply (no GEMINI_API_KEY): received your message \"{text}\"")
}

/// Text generation: one completion per chat message.
#[async_trait]
pub trait Generation: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, CapabilityError>;
}

/// Code execution: runs a fragment and returns the raw capability response.
/// The response shape varies (structured result object or plain text); the
/// server-side execution service normalizes it.
#[async_trait]
pub trait CodeExecution: Send + Sync {
    async fn execute(&self, language: &str, code: &str) -> Result<Value, CapabilityError>;
}

/// Simulated generation: embeds the user text in a fixed template.
pub struct SimulatedGeneration;

#[async_trait]
impl Generation for SimulatedGeneration {
    async fn complete(&self, prompt: &str) -> Result<String, CapabilityError> {
        Ok(simulated_reply(prompt))
    }
}

/// Simulated execution: fixed "not configured" text.
pub struct SimulatedCodeExecution;

#[async_trait]
impl CodeExecution for SimulatedCodeExecution {
    async fn execute(&self, _language: &str, _code: &str) -> Result<Value, CapabilityError> {
        Ok(Value::String(SIMULATED_EXEC_TEXT.to_string()))
    }
}

/// Generation from the environment: Gemini when `GEMINI_API_KEY` is set,
/// simulated otherwise.
pub fn generation_from_env() -> Arc<dyn Generation> {
    match std::env::var("GEMINI_API_KEY") {
        Ok(key) if !key.is_empty() => Arc::new(GeminiGeneration::new(key)),
        _ => {
            tracing::warn!("GEMINI_API_KEY not set, using simulated replies");
            Arc::new(SimulatedGeneration)
        }
    }
}

/// Code execution from the environment, same rule as [`generation_from_env`].
pub fn code_execution_from_env() -> Arc<dyn CodeExecution> {
    match std::env::var("GEMINI_API_KEY") {
        Ok(key) if !key.is_empty() => Arc::new(GeminiCodeExecution::new(key)),
        _ => {
            tracing::warn!("GEMINI_API_KEY not set, code execution is simulated");
            Arc::new(SimulatedCodeExecution)
        }
    }
}
