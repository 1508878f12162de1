// ABOUTME: Service-to-service JSON-RPC client for agent-to-agent calls
// ABOUTME: Wraps reqwest with envelope framing, timeouts, and call logging

//! Service-to-service JSON-RPC client.
//!
//! Every agent talks to its peers exclusively through [`AgentClient::call`],
//! which POSTs a JSON-RPC envelope to the peer's base URL and decodes the
//! reply. Networking failures and non-2xx responses are normalized into
//! [`PipelineError::Transport`].

use std::sync::atomic::{AtomicI64, Ordering};
use std::time::{Duration, Instant};

use serde_json::Value;
use uuid::Uuid;

use crate::error::{PipelineError, Result};
use crate::transport::{JsonRpcRequest, JsonRpcResponse, DEFAULT_CALL_TIMEOUT};

/// Client configuration for reaching a single peer service.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: DEFAULT_CALL_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Thin JSON-RPC client bound to a single peer's base URL.
#[derive(Debug, Clone)]
pub struct AgentClient {
    http: reqwest::Client,
    config: ClientConfig,
    next_id: std::sync::Arc<AtomicI64>,
    caller: String,
}

impl AgentClient {
    pub fn new(caller: impl Into<String>, config: ClientConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
            next_id: std::sync::Arc::new(AtomicI64::new(1)),
            caller: caller.into(),
        }
    }

    /// Call `action` on the peer, sending `body` as the inner JSON payload.
    /// An `action` field is injected into `body` if not already present, so
    /// the peer's dispatcher can route on it.
    pub async fn call(&self, action: &str, mut body: Value) -> Result<Value> {
        if let Some(obj) = body.as_object_mut() {
            obj.entry("action")
                .or_insert_with(|| Value::String(action.to_string()));
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let correlation_id = Uuid::new_v4();
        let request = JsonRpcRequest::new(id, action, &body, correlation_id);

        let span = tracing::info_span!(
            "agent_call",
            caller = %self.caller,
            callee = %self.config.base_url,
            skill = %action,
            correlation_id = %correlation_id,
        );
        let _enter = span.enter();

        let started = Instant::now();
        let result = self.send(request).await;
        let elapsed_ms = started.elapsed().as_millis();

        match &result {
            Ok(_) => tracing::info!(elapsed_ms, "agent call completed"),
            Err(e) => tracing::warn!(elapsed_ms, error = %e, "agent call failed"),
        }

        result
    }

    async fn send(&self, request: JsonRpcRequest) -> Result<Value> {
        let response = tokio::time::timeout(
            self.config.timeout,
            self.http.post(&self.config.base_url).json(&request).send(),
        )
        .await??;

        if !response.status().is_success() {
            return Err(PipelineError::transport(format!(
                "non-2xx response: {}",
                response.status()
            )));
        }

        let rpc_response: JsonRpcResponse = response.json().await?;
        rpc_response.into_payload()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_config_defaults_to_the_standard_call_timeout() {
        let config = ClientConfig::new("http://localhost:5000");
        assert_eq!(config.timeout, DEFAULT_CALL_TIMEOUT);
    }
}
