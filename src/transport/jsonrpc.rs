// ABOUTME: JSON-RPC 2.0 wire format for the A2A inter-service contract
// ABOUTME: Translates between the wire envelope and the handler-facing Envelope<Value>

//! JSON-RPC 2.0 wire types for agent-to-agent communication.
//!
//! Every service speaks the same wire contract: a request carries an action
//! name and a JSON-encoded payload nested in `params.message.parts[0].text`;
//! a response carries the lifecycle state and the handler's JSON reply in the
//! same shape, or a top-level JSON-RPC `error`.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::{PipelineError, Result};

/// A single part of a message; the A2A contract only ever uses the `text` variant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Part {
    pub text: String,
}

impl Part {
    pub fn json(payload: &Value) -> Self {
        Self {
            text: payload.to_string(),
        }
    }

    pub fn parse(&self) -> Result<Value> {
        serde_json::from_str(&self.text)
            .map_err(|e| PipelineError::payload(format!("invalid JSON in task message: {e}")))
    }
}

/// Message envelope nested inside JSON-RPC params/result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    pub message_id: Uuid,
    pub parts: Vec<Part>,
}

impl Message {
    pub fn user(payload: &Value) -> Self {
        Self {
            role: "user".to_string(),
            message_id: Uuid::new_v4(),
            parts: vec![Part::json(payload)],
        }
    }

    pub fn agent(payload: &Value) -> Self {
        Self {
            role: "agent".to_string(),
            message_id: Uuid::new_v4(),
            parts: vec![Part::json(payload)],
        }
    }

    pub fn first_text(&self) -> Result<&str> {
        self.parts
            .first()
            .map(|p| p.text.as_str())
            .ok_or_else(|| PipelineError::payload("message has no parts"))
    }
}

/// Lifecycle state published for a single JSON-RPC call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleState {
    Submitted,
    Working,
    Completed,
    Failed,
    Canceled,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcParams {
    pub message: Message,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub id: i64,
    pub method: String,
    pub params: JsonRpcParams,
}

impl JsonRpcRequest {
    /// Build a request whose `method` is the action name and whose message
    /// carries `payload` (which must itself include an `action` field).
    pub fn new(id: i64, method: impl Into<String>, payload: &Value, correlation_id: Uuid) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            method: method.into(),
            params: JsonRpcParams {
                message: Message::user(payload),
                metadata: Some(serde_json::json!({ "correlation_id": correlation_id })),
            },
        }
    }

    pub fn correlation_id(&self) -> Option<Uuid> {
        self.params
            .metadata
            .as_ref()
            .and_then(|m| m.get("correlation_id"))
            .and_then(|v| v.as_str())
            .and_then(|s| Uuid::parse_str(s).ok())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Status {
    pub state: LifecycleState,
    pub message: Message,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResult {
    pub status: Status,
}

/// JSON-RPC 2.0 error codes used on this wire, per the JSON-RPC spec's
/// reserved range plus a domain-specific extension for quality rejections.
pub mod error_codes {
    pub const PARSE_ERROR: i32 = -32700;
    pub const INVALID_REQUEST: i32 = -32600;
    pub const METHOD_NOT_FOUND: i32 = -32601;
    pub const INVALID_PARAMS: i32 = -32602;
    pub const INTERNAL_ERROR: i32 = -32603;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcErrorObject {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcErrorObject {
    pub fn from_pipeline_error(err: &PipelineError) -> Self {
        let code = match err {
            PipelineError::Payload(_) => error_codes::PARSE_ERROR,
            PipelineError::Config(_) => error_codes::INVALID_PARAMS,
            _ => error_codes::INTERNAL_ERROR,
        };
        Self {
            code,
            message: err.to_string(),
            data: Some(serde_json::json!({ "tag": err.tag() })),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    pub id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<JsonRpcResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcErrorObject>,
}

impl JsonRpcResponse {
    pub fn completed(id: i64, payload: &Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: Some(JsonRpcResult {
                status: Status {
                    state: LifecycleState::Completed,
                    message: Message::agent(payload),
                },
            }),
            error: None,
        }
    }

    pub fn failed(id: i64, payload: &Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: Some(JsonRpcResult {
                status: Status {
                    state: LifecycleState::Failed,
                    message: Message::agent(payload),
                },
            }),
            error: None,
        }
    }

    pub fn transport_error(id: i64, err: &PipelineError) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(JsonRpcErrorObject::from_pipeline_error(err)),
        }
    }

    /// Parse this response's inner payload, surfacing either the `error`
    /// object or the agent message's decoded JSON text.
    pub fn into_payload(self) -> Result<Value> {
        if let Some(err) = self.error {
            return Err(PipelineError::transport(err.message));
        }
        let result = self
            .result
            .ok_or_else(|| PipelineError::transport("response has neither result nor error"))?;
        result.status.message.first_text()?.parse::<Value>().map_err(|e| {
            PipelineError::payload(format!("invalid JSON in response message: {e}"))
        })
    }
}
