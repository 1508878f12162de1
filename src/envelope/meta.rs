// ABOUTME: Envelope metadata carried alongside every A2A message
// ABOUTME: Correlation id and timing fields threaded through the pipeline

//! Metadata structures for envelope sections.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Metadata carried alongside every envelope payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<Uuid>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<f64>,
}

impl Default for Meta {
    fn default() -> Self {
        Self {
            timestamp: None,
            correlation_id: None,
            version: None,
            duration_ms: None,
        }
    }
}

impl Meta {
    /// Metadata for a freshly originated request: stamped with a new correlation id.
    pub fn for_new_request() -> Self {
        Self {
            timestamp: Some(Utc::now()),
            correlation_id: Some(Uuid::new_v4()),
            version: Some("1.0".to_string()),
            duration_ms: None,
        }
    }

    /// Build response metadata that carries the request's correlation id forward.
    pub fn preserve_for_response(original: Option<&Meta>) -> Self {
        match original {
            Some(orig) => Self {
                timestamp: Some(Utc::now()),
                correlation_id: orig.correlation_id,
                version: orig.version.clone(),
                duration_ms: None,
            },
            None => Self::for_new_request(),
        }
    }
}

/// Builder for metadata sections.
#[derive(Debug, Default)]
pub struct MetaBuilder {
    meta: Meta,
}

impl MetaBuilder {
    pub fn new() -> Self {
        Self { meta: Meta::default() }
    }

    pub fn correlation_id(mut self, id: Uuid) -> Self {
        self.meta.correlation_id = Some(id);
        self
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.meta.version = Some(version.into());
        self
    }

    pub fn build(self) -> Meta {
        self.meta
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_request_gets_a_correlation_id() {
        let meta = Meta::for_new_request();
        assert!(meta.correlation_id.is_some());
        assert!(meta.timestamp.is_some());
    }

    #[test]
    fn response_meta_preserves_the_original_correlation_id() {
        let request = Meta::for_new_request();
        let response = Meta::preserve_for_response(Some(&request));
        assert_eq!(response.correlation_id, request.correlation_id);
    }
}
