// ABOUTME: Shared integration-test helpers: spin up a real ServiceHost on an ephemeral port
// ABOUTME: Every pipeline integration test drives the real HTTP path, never a mocked transport

use std::sync::Arc;

use qexam_pipeline::client::{AgentClient, ClientConfig};
use qexam_pipeline::server::ServiceHost;
use qexam_pipeline::traits::ActionHandler;
use qexam_pipeline::types::AgentCard;

/// Binds `handler` to an ephemeral `127.0.0.1` port and serves it for the
/// life of the test process, returning its base URL.
pub async fn spawn_test_host(name: &str, handler: Arc<dyn ActionHandler>) -> String {
    let card = AgentCard::new(name, "http://127.0.0.1:0", vec![]);
    let host = ServiceHost::new(card, handler);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, host.router()).await.unwrap();
    });
    format!("http://{addr}")
}

pub fn test_client(base_url: String) -> AgentClient {
    AgentClient::new("integration-test", ClientConfig::new(base_url))
}

/// Writes a one-concept catalog file for a subtopic under `dir/concepts/<file>.json`.
pub fn write_concept_catalog(dir: &std::path::Path, file_stem: &str, concept_id: &str, subtopic_name: &str) {
    let path = dir.join(format!("{file_stem}.json"));
    std::fs::write(
        &path,
        format!(
            r#"{{
                "subtopic_id": "00000000-0000-0000-0000-000000000001",
                "subtopic_name": "{subtopic_name}",
                "topic_id": "00000000-0000-0000-0000-000000000002",
                "topic_name": "Thinking Skills",
                "concepts": [{{
                    "id": "{concept_id}",
                    "name": "Concept {concept_id}",
                    "description": "d",
                    "subtopic_id": "00000000-0000-0000-0000-000000000001",
                    "subtopic_name": "{subtopic_name}",
                    "topic_id": "00000000-0000-0000-0000-000000000002",
                    "difficulty_min": 1,
                    "difficulty_max": 3,
                    "common_misconceptions": ["m1"],
                    "question_patterns": ["p1"]
                }}]
            }}"#
        ),
    )
    .unwrap();
}
