//! Server-side execution service.
//!
//! Validates the language against the allow-list, invokes the code-execution
//! capability, and normalizes its heterogeneous result shapes into one
//! output string. Normalization is an ordered list of extraction strategies
//! tried in sequence; the first that matches wins.

use std::sync::Arc;

use charla::{CodeExecution, ExecRequest};
use serde_json::Value;

/// Languages with a server-supported execution capability.
const ALLOWED_LANGUAGES: &[&str] = &["python", "py"];

/// Fixed reply for a language outside the allow-list.
pub const UNSUPPORTED_LANGUAGE_TEXT: &str = "Code execution is only supported for Python.";

/// Fixed reply when the capability call fails.
pub const EXECUTION_ERROR_TEXT: &str = "Error: code execution failed.";

/// Fixed reply when the capability response contains no usable output.
pub const NO_OUTPUT_TEXT: &str = "The execution returned no output.";

/// Execution service bound to one code-execution capability.
#[derive(Clone)]
pub struct ExecutionService {
    capability: Arc<dyn CodeExecution>,
}

impl ExecutionService {
    pub fn new(capability: Arc<dyn CodeExecution>) -> Self {
        Self { capability }
    }

    /// Runs one request. Unsupported languages are rejected before any
    /// capability call; capability failures never propagate past here.
    pub async fn run(&self, request: &ExecRequest) -> String {
        let language = request.language.to_ascii_lowercase();
        if !ALLOWED_LANGUAGES.contains(&language.as_str()) {
            return UNSUPPORTED_LANGUAGE_TEXT.to_string();
        }
        match self.capability.execute(&language, &request.code).await {
            Ok(response) => {
                normalize_output(&response).unwrap_or_else(|| NO_OUTPUT_TEXT.to_string())
            }
            Err(e) => {
                tracing::warn!("code execution failed: {}", e);
                EXECUTION_ERROR_TEXT.to_string()
            }
        }
    }
}

/// Extraction strategies in priority order: structured execution results
/// (under either known key), then candidate text, then a bare string.
const EXTRACTORS: &[fn(&Value) -> Option<String>] = &[
    extract_execution_result_camel,
    extract_execution_result_snake,
    extract_parts_text,
    extract_plain_text,
];

/// Normalizes a capability response into a single output string.
pub fn normalize_output(response: &Value) -> Option<String> {
    EXTRACTORS.iter().find_map(|extract| extract(response))
}

fn result_output_by_key(response: &Value, key: &str) -> Option<String> {
    let candidates = response.get("candidates")?.as_array()?;
    candidates
        .iter()
        .filter_map(|candidate| candidate.pointer("/content/parts")?.as_array())
        .flatten()
        .find_map(|part| Some(part.get(key)?.get("output")?.as_str()?.to_string()))
}

fn extract_execution_result_camel(response: &Value) -> Option<String> {
    result_output_by_key(response, "codeExecutionResult")
}

fn extract_execution_result_snake(response: &Value) -> Option<String> {
    result_output_by_key(response, "code_execution_result")
}

/// Joined text parts of the first candidate, when non-empty.
fn extract_parts_text(response: &Value) -> Option<String> {
    let parts = response.pointer("/candidates/0/content/parts")?.as_array()?;
    let joined: String = parts
        .iter()
        .filter_map(|part| part.get("text")?.as_str())
        .collect();
    let joined = joined.trim().to_string();
    if joined.is_empty() {
        None
    } else {
        Some(joined)
    }
}

/// A bare string reply (the simulated capability returns one).
fn extract_plain_text(response: &Value) -> Option<String> {
    response.as_str().map(str::to_string)
}
