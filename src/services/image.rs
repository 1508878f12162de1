// ABOUTME: Image service stub: diagram rendering and object-store upload are external collaborators
// ABOUTME: Out of scope per the pipeline core spec; this advertises the interface only

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::error::Result;
use crate::traits::ActionHandler;

/// Geometry/spatial diagram rendering and the R2 upload are external
/// collaborators (§1, §6). This service is addressable on the wire but
/// does not render or upload anything.
#[derive(Default)]
pub struct ImageService;

#[async_trait]
impl ActionHandler for ImageService {
    async fn handle(&self, action: &str, _payload: Value) -> Result<Value> {
        match action {
            "generate_image" => Ok(json!({
                "success": false,
                "error": "image rendering is an external collaborator; not implemented in the pipeline core",
            })),
            other => Ok(json!({"success": false, "error": format!("Unknown action: {other}")})),
        }
    }
}
