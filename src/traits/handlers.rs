// ABOUTME: Handler trait bridging JSON-RPC dispatch and business logic
// ABOUTME: Every service implements this once per advertised action

//! Handler trait definitions for framework-internal processing.
//!
//! A service's `ServiceHost` receives the decoded inner JSON payload for a
//! request and dispatches it to an [`ActionHandler`] on the `action` field.
//! The handler returns the JSON payload that goes back out as the agent's
//! response text.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;

/// Handles a single named action and returns its JSON response payload.
#[async_trait]
pub trait ActionHandler: Send + Sync {
    async fn handle(&self, action: &str, payload: Value) -> Result<Value>;
}
