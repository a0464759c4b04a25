#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! LLM provider abstraction used to phrase alert recommendations.
//!
//! Supports Anthropic Claude, `OpenAI`, and any `OpenAI`-compatible
//! local/self-hosted server (Ollama, vLLM, llama.cpp, LM Studio) via the
//! `AI_BASE_URL` environment variable. Generated text is best-effort:
//! callers are expected to fall back to static content on any error.

pub mod providers;

use thiserror::Error;

/// Errors that can occur during AI operations.
#[derive(Debug, Error)]
pub enum AiError {
    /// HTTP request to LLM provider failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Provider-specific error.
    #[error("Provider error: {message}")]
    Provider {
        /// Description of what went wrong.
        message: String,
    },

    /// The model answered, but not with the requested JSON object.
    #[error("Malformed response: {message}")]
    MalformedResponse {
        /// Description of what went wrong.
        message: String,
    },

    /// Configuration error.
    #[error("Configuration error: {message}")]
    Config {
        /// Description.
        message: String,
    },
}

/// Extracts the first top-level JSON object from model output.
///
/// Models frequently wrap JSON in a Markdown code fence or surround it with
/// prose; everything outside the outermost braces is ignored.
///
/// # Errors
///
/// Returns [`AiError::MalformedResponse`] if no braces are found, or
/// [`AiError::Json`] if the enclosed text is not valid JSON.
pub fn extract_json_object(text: &str) -> Result<serde_json::Value, AiError> {
    let (Some(start), Some(end)) = (text.find('{'), text.rfind('}')) else {
        return Err(AiError::MalformedResponse {
            message: "no JSON object in response".to_string(),
        });
    };

    if end < start {
        return Err(AiError::MalformedResponse {
            message: "unbalanced braces in response".to_string(),
        });
    }

    Ok(serde_json::from_str(&text[start..=end])?)
}
