// ABOUTME: LLM client seam: the Generator and Quality Judge realize prompts through this
// ABOUTME: Concrete implementation talks to the Gemini API; a scripted client backs tests

//! The LLM is an external collaborator (§1, §6): this crate only needs a
//! narrow seam to send a prompt and get text back. Every concrete client
//! must be safe for concurrent use, since it is shared across a service's
//! handlers (§5).

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;

use crate::error::{PipelineError, Result};

/// A single text-generation call to an LLM provider.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String>;
}

pub type SharedLlmClient = Arc<dyn LlmClient>;

/// Gemini-backed implementation. One client is shared across a service's
/// concurrent handlers; `reqwest::Client` is itself pool-backed and cheap
/// to clone internally.
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::builder()
                .timeout(Duration::from_secs(60))
                .build()
                .expect("reqwest client builds with default TLS backend"),
            api_key: api_key.into(),
            model: model.into(),
        }
    }

    /// `gemini-2.0-flash` per the original deployment's fast text tier.
    pub fn flash(api_key: impl Into<String>) -> Self {
        Self::new(api_key, "gemini-2.0-flash")
    }

    /// `gemini-2.5-pro` per the original deployment's complex-reasoning tier.
    pub fn pro(api_key: impl Into<String>) -> Self {
        Self::new(api_key, "gemini-2.5-pro")
    }
}

#[async_trait]
impl LlmClient for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let url = format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent",
            self.model
        );

        let body = json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
        });

        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(PipelineError::from)?;

        if !response.status().is_success() {
            return Err(PipelineError::transport(format!(
                "gemini request failed: {}",
                response.status()
            )));
        }

        let payload: serde_json::Value = response.json().await.map_err(PipelineError::from)?;
        payload["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| PipelineError::generation("gemini response had no candidate text"))
    }
}

/// Deterministic test double: replays a fixed queue of responses.
#[cfg(test)]
pub struct ScriptedLlmClient {
    responses: std::sync::Mutex<std::collections::VecDeque<String>>,
}

#[cfg(test)]
impl ScriptedLlmClient {
    pub fn new(responses: Vec<String>) -> Self {
        Self {
            responses: std::sync::Mutex::new(responses.into_iter().collect()),
        }
    }
}

#[cfg(test)]
#[async_trait]
impl LlmClient for ScriptedLlmClient {
    async fn generate(&self, _prompt: &str) -> Result<String> {
        self.responses
            .lock()
            .expect("scripted llm client mutex poisoned")
            .pop_front()
            .ok_or_else(|| PipelineError::internal("scripted llm client ran out of responses"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn scripted_client_replays_queued_responses_in_order() {
        let client = ScriptedLlmClient::new(vec!["first".into(), "second".into()]);
        assert_eq!(client.generate("p").await.unwrap(), "first");
        assert_eq!(client.generate("p").await.unwrap(), "second");
        assert!(client.generate("p").await.is_err());
    }
}
