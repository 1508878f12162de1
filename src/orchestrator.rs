// ABOUTME: Batch planner: quota plans per exam type, parallel fan-out, shortfall retry rounds
// ABOUTME: Up to 3 retry rounds regenerate only the shortfall per subtopic (§4.8, scenario S3)

use std::collections::HashMap;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{json, Value};

use crate::controller::{PipelineConfig, PipelineController, PipelineResult};
use crate::error::Result;
use crate::traits::ActionHandler;

const MAX_RETRY_ROUNDS: u32 = 3;

/// Default NSW Selective thinking-skills distribution (40 questions total).
pub fn default_thinking_skills_counts() -> HashMap<String, u32> {
    [
        ("critical_thinking", 7),
        ("deduction", 4),
        ("inference", 4),
        ("logical_reasoning", 11),
        ("spatial_reasoning", 6),
        ("numerical_reasoning", 8),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect()
}

/// Default NSW Selective math distribution (35 questions total).
pub fn default_math_counts() -> HashMap<String, u32> {
    [
        ("geometry", 4),
        ("number_operations", 5),
        ("measurement", 5),
        ("algebra_patterns", 5),
        ("fractions_decimals", 5),
        ("probability", 3),
        ("data_statistics", 4),
        ("number_theory", 4),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect()
}

/// Aggregate result of generating one exam's worth of questions.
#[derive(Debug, Clone, Serialize)]
pub struct ExamBatchResult {
    pub exam_type: String,
    pub total_questions: usize,
    pub questions: Vec<Value>,
    pub errors: Vec<String>,
}

/// Plans and runs a batch of question pipelines, one independent concurrent
/// run per question. Runs within a single batch never exclude each other's
/// concepts (§4.8's explicit throughput trade-off): duplicate concepts are
/// possible but every pipeline dispatches immediately.
pub struct Orchestrator {
    controller: PipelineController,
}

impl Orchestrator {
    pub fn new(controller: PipelineController) -> Self {
        Self { controller }
    }

    /// Runs `count` independent pipelines for `subtopic` concurrently.
    pub async fn generate_batch(&self, subtopic: &str, count: u32, difficulty: u8) -> Vec<PipelineResult> {
        let runs = (0..count).map(|_| {
            let controller = self.controller.clone();
            let config = PipelineConfig {
                subtopic: subtopic.to_string(),
                difficulty,
                exclude_ids: vec![],
            };
            tokio::spawn(async move { controller.run_one(&config).await })
        });

        let mut results = Vec::with_capacity(count as usize);
        for handle in runs {
            match handle.await {
                Ok(result) => results.push(result),
                Err(join_err) => results.push(PipelineResult {
                    accepted: false,
                    question: None,
                    concept_id: None,
                    revision_count: 0,
                    judgment: None,
                    errors: vec![format!("pipeline task panicked: {join_err}")],
                }),
            }
        }
        results
    }

    /// Generates a full exam's question set across subtopics, retrying only
    /// the shortfall per subtopic for up to `MAX_RETRY_ROUNDS` additional
    /// rounds (§4.8, scenario S3).
    pub async fn generate_exam(
        &self,
        exam_type: &str,
        subtopic_counts: HashMap<String, u32>,
        difficulty: u8,
    ) -> ExamBatchResult {
        let mut by_subtopic: HashMap<String, Vec<Value>> =
            subtopic_counts.keys().map(|s| (s.clone(), Vec::new())).collect();
        let mut errors = Vec::new();

        for retry_round in 0..=MAX_RETRY_ROUNDS {
            let shortfall: Vec<(String, u32)> = subtopic_counts
                .iter()
                .filter_map(|(subtopic, target)| {
                    let have = by_subtopic.get(subtopic).map(Vec::len).unwrap_or(0) as u32;
                    (*target > have).then(|| (subtopic.clone(), target - have))
                })
                .collect();

            if shortfall.is_empty() {
                break;
            }

            if retry_round > 0 {
                tracing::info!(round = retry_round, subtopics = shortfall.len(), "retrying shortfall");
            }

            let round_results = futures::future::join_all(shortfall.iter().map(|(subtopic, needed)| {
                let subtopic = subtopic.clone();
                let needed = *needed;
                async move {
                    let results = self.generate_batch(&subtopic, needed, difficulty).await;
                    (subtopic, results)
                }
            }))
            .await;

            for (subtopic, results) in round_results {
                let bucket = by_subtopic.entry(subtopic).or_default();
                for result in results {
                    if result.accepted {
                        if let Some(question) = result.question {
                            bucket.push(question);
                        }
                    } else {
                        errors.extend(result.errors);
                    }
                }
            }
        }

        let mut all_questions = Vec::new();
        for (subtopic, target) in &subtopic_counts {
            let questions = by_subtopic.get(subtopic).cloned().unwrap_or_default();
            if (questions.len() as u32) < *target {
                tracing::warn!(
                    subtopic,
                    have = questions.len(),
                    target,
                    retries = MAX_RETRY_ROUNDS,
                    "subtopic short after retry rounds"
                );
            }
            all_questions.extend(questions);
        }

        ExamBatchResult {
            exam_type: exam_type.to_string(),
            total_questions: all_questions.len(),
            questions: all_questions,
            errors,
        }
    }
}

/// Exposes `generate_exam` on the wire; `check_agents` health-checks are
/// the caller's concern here, since every peer already serves its own
/// `/.well-known/agent.json`.
#[async_trait]
impl ActionHandler for Orchestrator {
    async fn handle(&self, action: &str, payload: Value) -> Result<Value> {
        match action {
            "generate_exam" => {
                let exam_type = payload
                    .get("exam_type")
                    .and_then(Value::as_str)
                    .unwrap_or("thinking_skills")
                    .to_string();
                let difficulty = payload.get("difficulty").and_then(Value::as_u64).unwrap_or(3) as u8;

                let subtopic_counts = payload
                    .get("subtopic_questions")
                    .and_then(Value::as_object)
                    .map(|obj| {
                        obj.iter()
                            .filter_map(|(k, v)| v.as_u64().map(|n| (k.clone(), n as u32)))
                            .collect()
                    })
                    .unwrap_or_else(|| match exam_type.as_str() {
                        "math" => default_math_counts(),
                        _ => default_thinking_skills_counts(),
                    });

                let result = self.generate_exam(&exam_type, subtopic_counts, difficulty).await;
                Ok(json!({
                    "success": true,
                    "exam_type": result.exam_type,
                    "total_questions": result.total_questions,
                    "questions": result.questions,
                    "errors": result.errors,
                }))
            }
            other => Ok(json!({"success": false, "error": format!("Unknown action: {other}")})),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_thinking_skills_counts_total_forty() {
        let counts = default_thinking_skills_counts();
        assert_eq!(counts.values().sum::<u32>(), 40);
    }

    #[test]
    fn default_math_counts_total_thirty_five() {
        let counts = default_math_counts();
        assert_eq!(counts.values().sum::<u32>(), 35);
    }
}
