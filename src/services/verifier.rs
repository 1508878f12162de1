// ABOUTME: Correctness Verifier service (C5): independent forward/backward solve agreement
// ABOUTME: Internal failure reports a pass rather than blocking the pipeline (§4.5, §9)

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::error::Result;
use crate::llm::LlmClient;
use crate::models::CorrectnessVerification;
use crate::traits::ActionHandler;

pub struct VerifierService {
    llm: Arc<dyn LlmClient>,
}

impl VerifierService {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }

    fn correct_answer_text(question: &Value) -> String {
        question
            .get("choices")
            .and_then(|v| v.as_array())
            .and_then(|choices| choices.iter().find(|c| c.get("is_correct") == Some(&Value::Bool(true))))
            .and_then(|c| c.get("text"))
            .and_then(|v| v.as_str())
            .unwrap_or("Unknown")
            .to_string()
    }

    fn build_prompt(question: &Value, blueprint: &Value) -> String {
        format!(
            "Verify this question's marked answer by working backwards and forwards.\n\
             Question: {}\nMarked answer: {}\nConcept: {}\n\n\
             Respond as JSON: {{\"backwards_verification\": {{\"consistent\": bool}}, \
             \"independent_solution\": {{\"my_answer\": string}}, \"answer_is_correct\": bool, \
             \"issues\": [string], \"suggestions\": [string]}}",
            question.get("question").and_then(|v| v.as_str()).unwrap_or_default(),
            Self::correct_answer_text(question),
            blueprint.get("concept_name").and_then(|v| v.as_str()).unwrap_or("Unknown"),
        )
    }

    pub async fn verify_correctness(&self, question: Value, blueprint: Value) -> Result<Value> {
        let prompt = Self::build_prompt(&question, &blueprint);

        let raw = match self.llm.generate(&prompt).await {
            Ok(raw) => raw,
            // §4.5 / §9: internal verifier failure is reported as a pass,
            // never surfaced as an error, so it never blocks the pipeline.
            Err(err) => {
                tracing::warn!(error = %err, "verifier LLM call failed; reporting a pass");
                let verification = CorrectnessVerification::internal_failure_passes();
                return Ok(json!({"success": true, "verified": verification.verified,
                    "backwards_check": null, "forwards_solution": null,
                    "answer_matches": true, "issues": Vec::<String>::new(), "suggestions": Vec::<String>::new()}));
            }
        };

        let data: Value = match serde_json::from_str(&raw) {
            Ok(data) => data,
            Err(err) => {
                tracing::warn!(error = %err, "verifier LLM returned malformed JSON; reporting a pass");
                let verification = CorrectnessVerification::internal_failure_passes();
                return Ok(json!({"success": true, "verified": verification.verified,
                    "backwards_check": null, "forwards_solution": null,
                    "answer_matches": true, "issues": Vec::<String>::new(), "suggestions": Vec::<String>::new()}));
            }
        };

        let backwards = data.get("backwards_verification").cloned().unwrap_or(Value::Null);
        let forwards = data.get("independent_solution").cloned().unwrap_or(Value::Null);
        let answer_correct = data.get("answer_is_correct").and_then(|v| v.as_bool()).unwrap_or(false);
        let consistent = backwards.get("consistent").and_then(|v| v.as_bool()).unwrap_or(false);

        let verification = CorrectnessVerification {
            verified: answer_correct,
            backwards_check: Some(backwards.to_string()),
            forwards_solution: Some(forwards.to_string()),
            answer_matches: consistent && answer_correct,
            issues: data.get("issues").and_then(|v| v.as_array()).map(|a| a.iter().filter_map(|v| v.as_str().map(str::to_string)).collect()).unwrap_or_default(),
            suggestions: data.get("suggestions").and_then(|v| v.as_array()).map(|a| a.iter().filter_map(|v| v.as_str().map(str::to_string)).collect()).unwrap_or_default(),
        };

        Ok(json!({
            "success": true,
            "verified": verification.verified,
            "backwards_check": backwards,
            "forwards_solution": forwards,
            "answer_matches": verification.answer_matches,
            "issues": verification.issues,
            "suggestions": verification.suggestions,
        }))
    }
}

#[async_trait]
impl ActionHandler for VerifierService {
    async fn handle(&self, action: &str, payload: Value) -> Result<Value> {
        match action {
            "verify_correctness" => {
                let question = payload.get("question").cloned().unwrap_or(Value::Null);
                let blueprint = payload.get("blueprint").cloned().unwrap_or(Value::Null);
                self.verify_correctness(question, blueprint).await
            }
            other => Ok(json!({"success": false, "error": format!("Unknown action: {other}")})),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ScriptedLlmClient;

    fn question() -> Value {
        json!({
            "question": "2 + 2 = ?",
            "choices": [{"id": "1", "text": "4", "is_correct": true}, {"id": "2", "text": "5", "is_correct": false}],
        })
    }

    #[tokio::test]
    async fn agreement_between_backward_and_forward_checks_verifies() {
        let llm = Arc::new(ScriptedLlmClient::new(vec![serde_json::to_string(&json!({
            "backwards_verification": {"consistent": true},
            "independent_solution": {"my_answer": "4"},
            "answer_is_correct": true,
            "issues": [],
            "suggestions": [],
        })).unwrap()]));
        let service = VerifierService::new(llm);

        let result = service.verify_correctness(question(), json!({"concept_name": "Addition"})).await.unwrap();
        assert_eq!(result["verified"], true);
        assert_eq!(result["answer_matches"], true);
    }

    #[tokio::test]
    async fn internal_llm_failure_reports_a_pass_rather_than_blocking() {
        let llm = Arc::new(ScriptedLlmClient::new(vec![]));
        let service = VerifierService::new(llm);

        let result = service.verify_correctness(question(), json!({})).await.unwrap();
        assert_eq!(result["success"], true);
        assert_eq!(result["verified"], true);
    }

    #[tokio::test]
    async fn inconsistent_backward_check_reports_s5_style_issue() {
        let llm = Arc::new(ScriptedLlmClient::new(vec![serde_json::to_string(&json!({
            "backwards_verification": {"consistent": false},
            "independent_solution": {"my_answer": "5"},
            "answer_is_correct": false,
            "issues": ["Answer inconsistent with setup"],
            "suggestions": ["Recheck the arithmetic"],
        })).unwrap()]));
        let service = VerifierService::new(llm);

        let result = service.verify_correctness(question(), json!({})).await.unwrap();
        assert_eq!(result["verified"], false);
        assert_eq!(result["answer_matches"], false);
    }
}
