// ABOUTME: Transport layer constants and the JSON-RPC wire format
// ABOUTME: Owns per-call and batch timeouts shared by client and server

//! Transport-layer types shared between client and server.

pub mod jsonrpc;

use std::time::Duration;

/// Default per-call timeout for service-to-service JSON-RPC calls.
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(120);

/// Timeout used by the orchestrator for batch-driving calls.
pub const BATCH_CALL_TIMEOUT: Duration = Duration::from_secs(300);

pub use jsonrpc::{
    JsonRpcErrorObject, JsonRpcParams, JsonRpcRequest, JsonRpcResponse, JsonRpcResult,
    LifecycleState, Message, Part, Status,
};
