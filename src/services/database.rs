// ABOUTME: Database service stub: the PostgreSQL persistence layer is an external collaborator
// ABOUTME: Out of scope per the pipeline core spec; this advertises the interface only

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::error::Result;
use crate::traits::ActionHandler;

/// The persistence layer lives outside the pipeline core (§1, §6): this
/// service exists so the role is addressable on the wire, but every action
/// reports itself as an external collaborator rather than touching a
/// database.
#[derive(Default)]
pub struct DatabaseService;

#[async_trait]
impl ActionHandler for DatabaseService {
    async fn handle(&self, action: &str, _payload: Value) -> Result<Value> {
        match action {
            "insert_questions" | "create_exam" | "get_subtopics" => Ok(json!({
                "success": false,
                "error": "database is an external collaborator; not implemented in the pipeline core",
            })),
            other => Ok(json!({"success": false, "error": format!("Unknown action: {other}")})),
        }
    }
}
