// ABOUTME: Error types and handling for the qexam pipeline
// ABOUTME: Provides comprehensive error handling with domain-specific error variants

//! Error types and utilities for the pipeline.
//!
//! This module provides a comprehensive error type that covers all possible
//! error scenarios within the pipeline, from transport and payload problems
//! to the domain-specific terminal states the controller produces.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Comprehensive error type for all pipeline operations.
#[derive(Debug, Error, Clone, Serialize, Deserialize)]
pub enum PipelineError {
    /// Network failure, non-2xx response, timeout, or malformed envelope.
    #[error("transport error: {0}")]
    Transport(String),

    /// Inner JSON payload was missing, not an object, or failed validation.
    #[error("payload error: {0}")]
    Payload(String),

    /// Concept Registry had no candidate for the requested (subtopic, difficulty).
    #[error("no eligible concept for subtopic")]
    NoEligibleConcept,

    /// Generator could not produce a valid blueprint or question.
    #[error("generation error: {0}")]
    Generation(String),

    /// Terminal rejection from the Quality Judge after exhausting revisions.
    #[error("quality rejected: {issues:?}")]
    QualityRejected { issues: Vec<String> },

    /// Configuration is missing or invalid for the requested role.
    #[error("configuration error: {0}")]
    Config(String),

    /// Anything else internal to this process; should surface rarely.
    #[error("internal error: {0}")]
    Internal(String),
}

impl PipelineError {
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    pub fn payload(msg: impl Into<String>) -> Self {
        Self::Payload(msg.into())
    }

    pub fn generation(msg: impl Into<String>) -> Self {
        Self::Generation(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Stable tag used when reporting this error in-band on the wire.
    pub fn tag(&self) -> &'static str {
        match self {
            PipelineError::Transport(_) => "transport",
            PipelineError::Payload(_) => "payload",
            PipelineError::NoEligibleConcept => "domain/no_eligible_concept",
            PipelineError::Generation(_) => "domain/generation",
            PipelineError::QualityRejected { .. } => "domain/quality_rejected",
            PipelineError::Config(_) => "config",
            PipelineError::Internal(_) => "internal",
        }
    }
}

impl From<reqwest::Error> for PipelineError {
    fn from(err: reqwest::Error) -> Self {
        PipelineError::Transport(err.to_string())
    }
}

impl From<serde_json::Error> for PipelineError {
    fn from(err: serde_json::Error) -> Self {
        PipelineError::Payload(err.to_string())
    }
}

impl From<tokio::time::error::Elapsed> for PipelineError {
    fn from(err: tokio::time::error::Elapsed) -> Self {
        PipelineError::Transport(format!("operation timed out: {err}"))
    }
}
