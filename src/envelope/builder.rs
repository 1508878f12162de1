// ABOUTME: Envelope builder and container structures
// ABOUTME: Provides fluent API for building envelopes with metadata and payload

//! Envelope builder and container structures.

use super::meta::Meta;
use crate::error::{PipelineError, Result};

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Universal wrapper for inter-service communication: metadata plus payload,
/// with an optional error set when the operation failed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub meta: Meta,
    pub payload: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<EnvelopeError>,
}

/// Error information carried inside an envelope response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvelopeError {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl EnvelopeError {
    pub fn from_pipeline_error(err: &PipelineError) -> Self {
        let details = if let PipelineError::QualityRejected { issues } = err {
            Some(serde_json::json!({ "issues": issues }))
        } else {
            None
        };
        Self {
            code: err.tag().to_string(),
            message: err.to_string(),
            details,
        }
    }
}

/// Fluent builder for [`Envelope`].
#[derive(Debug)]
pub struct EnvelopeBuilder<T> {
    meta: Meta,
    payload: Option<T>,
    error: Option<EnvelopeError>,
}

impl<T> EnvelopeBuilder<T> {
    pub fn new() -> Self {
        Self {
            meta: Meta::default(),
            payload: None,
            error: None,
        }
    }

    pub fn with_payload(mut self, payload: T) -> Self {
        self.payload = Some(payload);
        self
    }

    pub fn with_meta(mut self, meta: Meta) -> Self {
        self.meta = meta;
        self
    }

    pub fn with_error(mut self, error: EnvelopeError) -> Self {
        self.error = Some(error);
        self
    }

    pub fn build(self) -> Result<Envelope<T>> {
        let payload = self
            .payload
            .ok_or_else(|| PipelineError::payload("envelope payload is required"))?;

        Ok(Envelope {
            meta: self.meta,
            payload,
            error: self.error,
        })
    }
}

impl<T> Default for EnvelopeBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Envelope<T> {
    pub fn new(meta: Meta, payload: T) -> Self {
        Self {
            meta,
            payload,
            error: None,
        }
    }

    pub fn new_minimal(payload: T) -> Self {
        Self::new(Meta::for_new_request(), payload)
    }

    pub fn error(meta: Meta, payload: T, error: EnvelopeError) -> Self {
        Self {
            meta,
            payload,
            error: Some(error),
        }
    }

    pub fn builder() -> EnvelopeBuilder<T> {
        EnvelopeBuilder::new()
    }

    pub fn extract(self) -> (Meta, T) {
        (self.meta, self.payload)
    }

    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}
