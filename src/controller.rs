// ABOUTME: Per-question pipeline state machine: select concept, generate, verify, judge, revise
// ABOUTME: Bounds revisions to max_revisions+1 judge calls per pipeline (§4.7, §8 invariants 5/11)

use serde::Serialize;
use serde_json::{json, Value};

use crate::client::AgentClient;
use crate::config::PipelineThresholds;
use crate::models::CorrectnessVerification;

/// Inputs for a single question pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub subtopic: String,
    pub difficulty: u8,
    pub exclude_ids: Vec<String>,
}

/// Outcome of a single question pipeline run.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineResult {
    pub accepted: bool,
    pub question: Option<Value>,
    pub concept_id: Option<String>,
    pub revision_count: u32,
    pub judgment: Option<Value>,
    pub errors: Vec<String>,
}

impl PipelineResult {
    fn failed(concept_id: Option<String>, revision_count: u32, errors: Vec<String>) -> Self {
        Self {
            accepted: false,
            question: None,
            concept_id,
            revision_count,
            judgment: None,
            errors,
        }
    }
}

/// Drives a single question through SELECT_CONCEPT → GENERATE →
/// VERIFY_CORRECTNESS → CHECK_QUALITY → {ACCEPT | REVISE → GENERATE | FAIL},
/// talking to peer agents purely through [`AgentClient::call`].
#[derive(Clone)]
pub struct PipelineController {
    concept_guide: AgentClient,
    question_generator: AgentClient,
    correctness_verifier: AgentClient,
    quality_checker: AgentClient,
    thresholds: PipelineThresholds,
}

fn extract_issues(payload: &Value, key: &str) -> Vec<String> {
    payload
        .get(key)
        .and_then(|v| v.as_array())
        .map(|a| a.iter().filter_map(|v| v.as_str().map(str::to_string)).collect())
        .unwrap_or_default()
}

impl PipelineController {
    pub fn new(
        concept_guide: AgentClient,
        question_generator: AgentClient,
        correctness_verifier: AgentClient,
        quality_checker: AgentClient,
        thresholds: PipelineThresholds,
    ) -> Self {
        Self {
            concept_guide,
            question_generator,
            correctness_verifier,
            quality_checker,
            thresholds,
        }
    }

    async fn select_concept(&self, config: &PipelineConfig) -> Result<Value, Vec<String>> {
        let payload = json!({
            "subtopic": config.subtopic,
            "difficulty": config.difficulty,
            "exclude_ids": config.exclude_ids,
        });
        match self.concept_guide.call("select_concept", payload).await {
            Ok(v) if v.get("success").and_then(Value::as_bool).unwrap_or(false) => {
                Ok(v.get("selection").cloned().unwrap_or(Value::Null))
            }
            Ok(v) => Err(vec![v
                .get("error")
                .and_then(Value::as_str)
                .unwrap_or("concept selection failed")
                .to_string()]),
            Err(e) => Err(vec![e.to_string()]),
        }
    }

    async fn generate(&self, selection: Value) -> Result<(Value, Value), Vec<String>> {
        match self
            .question_generator
            .call("generate_question", json!({"selection": selection}))
            .await
        {
            Ok(v) if v.get("success").and_then(Value::as_bool).unwrap_or(false) => Ok((
                v.get("question").cloned().unwrap_or(Value::Null),
                v.get("blueprint").cloned().unwrap_or(Value::Null),
            )),
            Ok(v) => Err(vec![v
                .get("error")
                .and_then(Value::as_str)
                .unwrap_or("generation failed")
                .to_string()]),
            Err(e) => Err(vec![e.to_string()]),
        }
    }

    async fn revise(
        &self,
        question: &Value,
        blueprint: &Value,
        issues: Vec<String>,
        suggestions: Vec<String>,
    ) -> Result<(Value, Value), Vec<String>> {
        let payload = json!({
            "question": question,
            "blueprint": blueprint,
            "issues": issues,
            "suggestions": suggestions,
        });
        match self.question_generator.call("revise_question", payload).await {
            Ok(v) if v.get("success").and_then(Value::as_bool).unwrap_or(false) => Ok((
                v.get("question").cloned().unwrap_or(Value::Null),
                v.get("blueprint").cloned().unwrap_or(Value::Null),
            )),
            Ok(v) => Err(vec![v
                .get("error")
                .and_then(Value::as_str)
                .unwrap_or("revision failed")
                .to_string()]),
            Err(e) => Err(vec![e.to_string()]),
        }
    }

    /// On internal verifier failure this still returns `Ok`, reporting a
    /// pass, per §4.5/§9 — only transport/payload faults produce `Err`.
    async fn verify_correctness(&self, question: &Value, blueprint: &Value) -> Result<(bool, Vec<String>), Vec<String>> {
        let payload = json!({"question": question, "blueprint": blueprint});
        match self.correctness_verifier.call("verify_correctness", payload).await {
            Ok(v) if v.get("success").and_then(Value::as_bool).unwrap_or(false) => {
                let verified = v.get("verified").and_then(Value::as_bool).unwrap_or(true);
                if verified {
                    Ok((true, vec![]))
                } else {
                    let issues = extract_issues(&v, "issues");
                    let issues = if issues.is_empty() {
                        CorrectnessVerification::internal_failure_passes().issues
                    } else {
                        issues
                    };
                    Ok((false, issues))
                }
            }
            // Transport/payload failure at this boundary is terminal for this
            // pipeline run; the controller does not retry transport faults,
            // only domain-level revision rounds (retries are the orchestrator's concern).
            Ok(v) => Err(vec![v
                .get("error")
                .and_then(Value::as_str)
                .unwrap_or("correctness verification failed")
                .to_string()]),
            Err(e) => Err(vec![e.to_string()]),
        }
    }

    async fn check_quality(&self, question: &Value, blueprint: &Value) -> Result<Value, Vec<String>> {
        let payload = json!({"question": question, "blueprint": blueprint});
        match self.quality_checker.call("check_quality", payload).await {
            Ok(v) if v.get("success").and_then(Value::as_bool).unwrap_or(false) => Ok(v),
            Ok(v) => Err(vec![v
                .get("error")
                .and_then(Value::as_str)
                .unwrap_or("quality check failed")
                .to_string()]),
            Err(e) => Err(vec![e.to_string()]),
        }
    }

    /// Runs one question through the full pipeline. `max_revisions=0` means
    /// accept-on-first-try-or-fail: no revision round is attempted.
    pub async fn run_one(&self, config: &PipelineConfig) -> PipelineResult {
        let selection = match self.select_concept(config).await {
            Ok(selection) => selection,
            Err(errors) => return PipelineResult::failed(None, 0, errors),
        };
        let concept_id = selection
            .get("concept")
            .and_then(|c| c.get("id"))
            .and_then(Value::as_str)
            .map(str::to_string);

        let (mut question, mut blueprint) = match self.generate(selection).await {
            Ok(pair) => pair,
            Err(errors) => return PipelineResult::failed(concept_id, 0, errors),
        };

        for attempt in 0..=self.thresholds.max_revisions {
            let (verified, verification_issues) = match self.verify_correctness(&question, &blueprint).await {
                Ok(pair) => pair,
                Err(errors) => return PipelineResult::failed(concept_id, attempt, errors),
            };

            if !verified {
                if attempt == self.thresholds.max_revisions {
                    return PipelineResult::failed(concept_id, attempt, verification_issues);
                }
                match self.revise(&question, &blueprint, verification_issues, vec![]).await {
                    Ok((q, b)) => {
                        question = q;
                        blueprint = b;
                        continue;
                    }
                    Err(errors) => return PipelineResult::failed(concept_id, attempt + 1, errors),
                }
            }

            let judgment = match self.check_quality(&question, &blueprint).await {
                Ok(judgment) => judgment,
                Err(errors) => return PipelineResult::failed(concept_id, attempt, errors),
            };

            let status = judgment.get("status").and_then(Value::as_str).unwrap_or("rejected");
            if status == "accepted" {
                return PipelineResult {
                    accepted: true,
                    question: Some(question),
                    concept_id,
                    revision_count: attempt,
                    judgment: Some(judgment),
                    errors: vec![],
                };
            }

            if status == "rejected" || attempt == self.thresholds.max_revisions {
                let errors = extract_issues(&judgment, "issues");
                return PipelineResult {
                    accepted: false,
                    question: Some(question),
                    concept_id,
                    revision_count: attempt,
                    judgment: Some(judgment),
                    errors,
                };
            }

            let issues = extract_issues(&judgment, "issues");
            let suggestions = extract_issues(&judgment, "suggestions");
            match self.revise(&question, &blueprint, issues, suggestions).await {
                Ok((q, b)) => {
                    question = q;
                    blueprint = b;
                }
                Err(errors) => return PipelineResult::failed(concept_id, attempt + 1, errors),
            }
        }

        PipelineResult::failed(concept_id, self.thresholds.max_revisions, vec!["exhausted max revisions".to_string()])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ClientConfig;
    use crate::server::ServiceHost;
    use crate::services::{ConceptRegistryService, GeneratorService, QualityJudgeService, VerifierService};
    use crate::llm::ScriptedLlmClient;
    use crate::types::AgentCard;
    use std::io::Write;
    use std::sync::Arc;

    fn write_catalog(dir: &std::path::Path) {
        let path = dir.join("analogies.json");
        let mut file = std::fs::File::create(&path).unwrap();
        write!(
            file,
            r#"{{
                "subtopic_id": "00000000-0000-0000-0000-000000000001",
                "subtopic_name": "Analogies",
                "topic_id": "00000000-0000-0000-0000-000000000002",
                "topic_name": "Thinking Skills",
                "concepts": [{{
                    "id": "c1",
                    "name": "Analogy reasoning",
                    "description": "d",
                    "subtopic_id": "00000000-0000-0000-0000-000000000001",
                    "subtopic_name": "Analogies",
                    "topic_id": "00000000-0000-0000-0000-000000000002",
                    "difficulty_min": 1,
                    "difficulty_max": 3,
                    "common_misconceptions": ["m1"],
                    "question_patterns": ["p1"]
                }}]
            }}"#
        )
        .unwrap();
    }

    async fn spawn_service(handler: Arc<dyn crate::traits::ActionHandler>, name: &str) -> String {
        let card = AgentCard::new(name, "http://127.0.0.1:0", vec![]);
        let host = ServiceHost::new(card, handler);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, host.router()).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn client(base_url: String) -> AgentClient {
        AgentClient::new("test-controller", ClientConfig::new(base_url))
    }

    #[tokio::test]
    async fn accepts_on_first_attempt_when_every_stage_passes() {
        let dir = std::env::temp_dir().join(format!("qexam-controller-test-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        write_catalog(&dir);

        let concept_guide_url = spawn_service(Arc::new(ConceptRegistryService::new(&dir)), "concept_guide").await;

        let generator_llm = Arc::new(ScriptedLlmClient::new(vec![serde_json::to_string(&json!({
            "concept_name": "Analogy reasoning",
            "difficulty_target": 2,
            "question_stem_structure": "stem",
            "correct_answer_value": "A",
            "correct_answer_reasoning": "because",
            "question_text": "Bird is to sky as fish is to ?",
            "choices": ["Water", "Rock", "Air", "Fire"],
            "explanation": "Fish live in water.",
        }))
        .unwrap()]));
        let generator_url = spawn_service(Arc::new(GeneratorService::new(generator_llm)), "question_generator").await;

        let verifier_llm = Arc::new(ScriptedLlmClient::new(vec![serde_json::to_string(&json!({
            "backwards_verification": {"consistent": true},
            "independent_solution": {"my_answer": "Water"},
            "answer_is_correct": true,
            "issues": [],
            "suggestions": [],
        }))
        .unwrap()]));
        let verifier_url = spawn_service(Arc::new(VerifierService::new(verifier_llm)), "verifier").await;

        let judge_llm = Arc::new(ScriptedLlmClient::new(vec![serde_json::to_string(&json!({
            "num_reasoning_steps": 4,
            "solved_answer_id": "1",
            "difficulty_assessment": {"is_too_easy": false, "estimated_year6_success_rate": "20-30%"},
            "vulnerabilities": [],
            "clarity_score": 0.9,
            "verdict": "accept",
        }))
        .unwrap()]));
        let judge_url = spawn_service(Arc::new(QualityJudgeService::new(judge_llm)), "quality_checker").await;

        let controller = PipelineController::new(
            client(concept_guide_url),
            client(generator_url),
            client(verifier_url),
            client(judge_url),
            PipelineThresholds::default(),
        );

        let result = controller
            .run_one(&PipelineConfig {
                subtopic: "analogies".to_string(),
                difficulty: 2,
                exclude_ids: vec![],
            })
            .await;

        assert!(result.accepted, "expected acceptance, got {result:?}");
        assert_eq!(result.revision_count, 0);
        assert_eq!(result.concept_id.as_deref(), Some("c1"));

        let _ = std::fs::remove_dir_all(&dir);
    }
}
