// ABOUTME: Concept Registry service (C3): loads and serves the concept catalog
// ABOUTME: Catalog load is lazy and happens-at-most-once under concurrent first access

use std::collections::HashMap;
use std::path::PathBuf;

use async_trait::async_trait;
use rand::seq::{IteratorRandom, SliceRandom};
use serde_json::{json, Value};
use tokio::sync::OnceCell;

use crate::error::{PipelineError, Result};
use crate::models::{AtomicConcept, BloomLevel, ConceptGraph, ConceptSelection};
use crate::traits::ActionHandler;

/// On-disk shape of a subtopic's concept file: `{subtopic_id, subtopic_name,
/// topic_id, topic_name, concepts: [...]}`, matching the Concept Guide's
/// catalog format.
pub struct ConceptRegistryService {
    catalog_dir: PathBuf,
    catalogs: OnceCell<HashMap<String, ConceptGraph>>,
}

impl ConceptRegistryService {
    pub fn new(catalog_dir: impl Into<PathBuf>) -> Self {
        Self {
            catalog_dir: catalog_dir.into(),
            catalogs: OnceCell::new(),
        }
    }

    async fn catalogs(&self) -> Result<&HashMap<String, ConceptGraph>> {
        self.catalogs
            .get_or_try_init(|| async { self.load_catalogs().await })
            .await
    }

    async fn load_catalogs(&self) -> Result<HashMap<String, ConceptGraph>> {
        let mut graphs = HashMap::new();
        let mut entries = match tokio::fs::read_dir(&self.catalog_dir).await {
            Ok(entries) => entries,
            Err(_) => {
                tracing::warn!(dir = %self.catalog_dir.display(), "concepts directory not found");
                return Ok(graphs);
            }
        };

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| PipelineError::internal(format!("reading concepts dir: {e}")))?
        {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let subtopic_key = path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or_default()
                .to_string();

            let text = tokio::fs::read_to_string(&path)
                .await
                .map_err(|e| PipelineError::internal(format!("reading {}: {e}", path.display())))?;
            let graph: ConceptGraph = serde_json::from_str(&text)
                .map_err(|e| PipelineError::internal(format!("parsing {}: {e}", path.display())))?;

            tracing::info!(subtopic = %subtopic_key, concepts = graph.concepts.len(), "loaded concept catalog");
            graphs.insert(subtopic_key, graph);
        }

        Ok(graphs)
    }

    pub async fn list_subtopics(&self) -> Result<Value> {
        let catalogs = self.catalogs().await?;
        let mut subtopics = Vec::new();
        let mut total_concepts = 0;

        for (key, graph) in catalogs {
            let min = graph.concepts.iter().map(|c| c.difficulty_min).min().unwrap_or(1);
            let max = graph.concepts.iter().map(|c| c.difficulty_max).max().unwrap_or(3);
            total_concepts += graph.concepts.len();
            subtopics.push(json!({
                "key": key,
                "subtopic_id": graph.subtopic_id,
                "subtopic_name": graph.subtopic_name,
                "topic_name": graph.topic_name,
                "concept_count": graph.concepts.len(),
                "difficulty_range": {"min": min, "max": max},
            }));
        }

        Ok(json!({
            "success": true,
            "subtopics": subtopics,
            "total_subtopics": catalogs.len(),
            "total_concepts": total_concepts,
        }))
    }

    pub async fn get_concepts(&self, subtopic: Option<&str>) -> Result<Value> {
        let catalogs = self.catalogs().await?;

        match subtopic {
            Some(key) => match catalogs.get(key) {
                Some(graph) => Ok(json!({
                    "success": true,
                    "subtopic": key,
                    "subtopic_id": graph.subtopic_id,
                    "subtopic_name": graph.subtopic_name,
                    "concept_count": graph.concepts.len(),
                    "concepts": graph.concepts,
                })),
                None => Ok(json!({
                    "success": false,
                    "error": format!("Unknown subtopic: {key}"),
                    "available": catalogs.keys().collect::<Vec<_>>(),
                })),
            },
            None => {
                let mut all = Vec::new();
                for (key, graph) in catalogs {
                    for concept in &graph.concepts {
                        let mut value = serde_json::to_value(concept)?;
                        value["subtopic_key"] = json!(key);
                        all.push(value);
                    }
                }
                Ok(json!({"success": true, "total_concepts": all.len(), "concepts": all}))
            }
        }
    }

    /// Algorithm per §4.3: filter by difficulty window and exclusions,
    /// relax to exclusions-only if empty, fail with `no_eligible` if still
    /// empty. Select uniformly at random from the eligible set.
    pub async fn select_concept(
        &self,
        subtopic: &str,
        difficulty: u8,
        exclude_ids: &[String],
    ) -> Result<Value> {
        let catalogs = self.catalogs().await?;
        let Some(graph) = catalogs.get(subtopic) else {
            return Ok(json!({
                "success": false,
                "error": format!("Unknown subtopic: {subtopic}"),
                "available": catalogs.keys().collect::<Vec<_>>(),
            }));
        };

        let not_excluded = |c: &&AtomicConcept| !exclude_ids.iter().any(|id| id == &c.id);

        let mut eligible: Vec<&AtomicConcept> = graph
            .concepts
            .iter()
            .filter(|c| c.covers_difficulty(difficulty))
            .filter(not_excluded)
            .collect();

        if eligible.is_empty() {
            eligible = graph.concepts.iter().filter(not_excluded).collect();
        }

        let Some(selected) = eligible.choose(&mut rand::rng()) else {
            return Ok(json!({"success": false, "error": "no_eligible"}));
        };

        let target_bloom = if difficulty >= 3 && selected.bloom_levels.contains(&BloomLevel::Analysis) {
            BloomLevel::Analysis
        } else if difficulty <= 1 && selected.bloom_levels.contains(&BloomLevel::Comprehension) {
            BloomLevel::Comprehension
        } else {
            BloomLevel::Application
        };

        let selected_misconceptions: Vec<String> =
            selected.common_misconceptions.iter().take(3).cloned().collect();

        let selected_pattern = selected
            .question_patterns
            .iter()
            .choose(&mut rand::rng())
            .cloned();

        let selection = ConceptSelection {
            concept: (*selected).clone(),
            target_difficulty: difficulty,
            target_bloom,
            selected_misconceptions,
            selected_pattern,
        };

        Ok(json!({"success": true, "selection": selection}))
    }
}

#[async_trait]
impl ActionHandler for ConceptRegistryService {
    async fn handle(&self, action: &str, payload: Value) -> Result<Value> {
        match action {
            "list_subtopics" => self.list_subtopics().await,
            "get_concepts" => {
                let subtopic = payload.get("subtopic").and_then(|v| v.as_str());
                self.get_concepts(subtopic).await
            }
            "select_concept" => {
                let subtopic = payload
                    .get("subtopic")
                    .and_then(|v| v.as_str())
                    .ok_or_else(|| PipelineError::payload("select_concept requires 'subtopic'"))?;
                let difficulty = payload.get("difficulty").and_then(|v| v.as_u64()).unwrap_or(3) as u8;
                let exclude_ids: Vec<String> = payload
                    .get("exclude_ids")
                    .and_then(|v| v.as_array())
                    .map(|a| a.iter().filter_map(|v| v.as_str().map(str::to_string)).collect())
                    .unwrap_or_default();
                self.select_concept(subtopic, difficulty, &exclude_ids).await
            }
            other => Ok(json!({"success": false, "error": format!("Unknown action: {other}")})),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_catalog(dir: &std::path::Path, subtopic: &str) {
        let path = dir.join(format!("{subtopic}.json"));
        let mut file = std::fs::File::create(&path).unwrap();
        write!(
            file,
            r#"{{
                "subtopic_id": "00000000-0000-0000-0000-000000000001",
                "subtopic_name": "X",
                "topic_id": "00000000-0000-0000-0000-000000000002",
                "topic_name": "Thinking Skills",
                "concepts": [{{
                    "id": "c1",
                    "name": "Only concept",
                    "description": "d",
                    "subtopic_id": "00000000-0000-0000-0000-000000000001",
                    "subtopic_name": "X",
                    "topic_id": "00000000-0000-0000-0000-000000000002",
                    "difficulty_min": 1,
                    "difficulty_max": 2,
                    "common_misconceptions": ["m1", "m2"],
                    "question_patterns": []
                }}]
            }}"#
        )
        .unwrap();
    }

    #[tokio::test]
    async fn select_concept_falls_back_to_difficulty_relaxation() {
        // S2: one concept with difficulty_max=2, requested difficulty=3.
        let dir = tempdir();
        write_catalog(dir.path(), "x");
        let service = ConceptRegistryService::new(dir.path());

        let result = service.select_concept("x", 3, &[]).await.unwrap();
        assert_eq!(result["success"], true);
        assert_eq!(result["selection"]["target_bloom"], "application");
        assert_eq!(result["selection"]["concept"]["id"], "c1");
    }

    #[tokio::test]
    async fn select_concept_with_all_ids_excluded_reports_no_eligible() {
        let dir = tempdir();
        write_catalog(dir.path(), "x");
        let service = ConceptRegistryService::new(dir.path());

        let result = service
            .select_concept("x", 1, &["c1".to_string()])
            .await
            .unwrap();
        assert_eq!(result["success"], false);
        assert_eq!(result["error"], "no_eligible");
    }

    #[tokio::test]
    async fn concurrent_first_access_loads_the_catalog_once() {
        let dir = tempdir();
        write_catalog(dir.path(), "x");
        let service = std::sync::Arc::new(ConceptRegistryService::new(dir.path()));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let service = service.clone();
                tokio::spawn(async move { service.list_subtopics().await.unwrap() })
            })
            .collect();

        for handle in handles {
            let result = handle.await.unwrap();
            assert_eq!(result["total_subtopics"], 1);
        }
    }

    fn tempdir() -> tempfile_stub::TempDir {
        tempfile_stub::TempDir::new()
    }

    /// Minimal throwaway temp-dir helper so this module doesn't need an
    /// extra dev-dependency just for two tests.
    mod tempfile_stub {
        use std::path::{Path, PathBuf};

        pub struct TempDir(PathBuf);

        impl TempDir {
            pub fn new() -> Self {
                let mut path = std::env::temp_dir();
                path.push(format!("qexam-concept-test-{}", uuid::Uuid::new_v4()));
                std::fs::create_dir_all(&path).unwrap();
                Self(path)
            }

            pub fn path(&self) -> &Path {
                &self.0
            }
        }

        impl Drop for TempDir {
            fn drop(&mut self) {
                let _ = std::fs::remove_dir_all(&self.0);
            }
        }
    }
}
