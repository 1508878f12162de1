// ABOUTME: Quality Judge service (C6): solves, attacks, and judges a question in one pass
// ABOUTME: Final status is derived by QualityJudgment::derive_status per §4.6's strict precedence

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::error::{PipelineError, Result};
use crate::llm::LlmClient;
use crate::models::{JudgmentScores, QualityJudgment, Vulnerability, VulnerabilitySeverity};
use crate::traits::ActionHandler;

pub struct QualityJudgeService {
    llm: Arc<dyn LlmClient>,
}

impl QualityJudgeService {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }

    fn format_mcq_choices(question: &Value) -> String {
        question
            .get("choices")
            .and_then(|v| v.as_array())
            .map(|choices| {
                choices
                    .iter()
                    .map(|c| {
                        format!(
                            "  ({}) {}\n",
                            c.get("id").and_then(|v| v.as_str()).unwrap_or("?"),
                            c.get("text").and_then(|v| v.as_str()).unwrap_or("Unknown"),
                        )
                    })
                    .collect::<String>()
            })
            .unwrap_or_default()
    }

    fn build_prompt(question: &Value, blueprint: &Value) -> String {
        let question_type = question.get("type").and_then(|v| v.as_str()).unwrap_or("multiple-choice");
        let concept = blueprint.get("concept_name").and_then(|v| v.as_str()).unwrap_or("Unknown");
        let difficulty = blueprint.get("difficulty_target").and_then(|v| v.as_u64()).unwrap_or(3);

        // Drag-and-drop and cloze questions route through the same prompt
        // shape — the solve/attack/judge tasks and decision rules below are
        // type-agnostic, with only the answer-matching field varying.
        format!(
            "You are a strict quality checker for a selective-entry exam question bank.\n\
             Question type: {question_type}\n\
             Question: {}\n\
             Options:\n{}\n\
             Concept: {concept}\n\
             Target difficulty: {difficulty}/3\n\n\
             Solve it step by step, attack it for shortcuts and ambiguity, then judge its \
             clarity and difficulty match.\n\n\
             Respond as JSON: {{\"solution_steps\": [{{\"step\": int, \"action\": string, \"result\": string}}], \
             \"num_reasoning_steps\": int, \"solved_answer_id\": string, \"solve_confidence\": number, \
             \"order_is_correct\": bool, \"solved_order\": [string], \
             \"blanks_correct\": bool, \"solved_blanks\": object, \
             \"difficulty_assessment\": {{\"is_too_easy\": bool, \"estimated_year6_success_rate\": string}}, \
             \"vulnerabilities\": [{{\"type\": string, \"severity\": string, \"description\": string}}], \
             \"can_solve_without_understanding\": bool, \"vulnerability_score\": number, \
             \"clarity_score\": number, \"alignment_score\": number, \"actual_difficulty\": int, \
             \"difficulty_match\": bool, \"issues\": [string], \"revision_suggestions\": [string], \
             \"verdict\": \"accept|needs_revision|reject\"}}",
            question.get("question").and_then(|v| v.as_str()).unwrap_or_default(),
            Self::format_mcq_choices(question),
        )
    }

    fn answer_matches(result_data: &Value, question_type: &str) -> bool {
        match question_type {
            "drag-and-drop" => result_data.get("order_is_correct").and_then(|v| v.as_bool()).unwrap_or(false),
            "cloze" => result_data.get("blanks_correct").and_then(|v| v.as_bool()).unwrap_or(false),
            _ => result_data
                .get("solved_answer_id")
                .and_then(|v| v.as_str())
                .map(|id| id == "1")
                .unwrap_or(false),
        }
    }

    fn severity_from_str(s: &str) -> VulnerabilitySeverity {
        match s {
            "critical" => VulnerabilitySeverity::Critical,
            "major" => VulnerabilitySeverity::Major,
            _ => VulnerabilitySeverity::Minor,
        }
    }

    fn parse_vulnerabilities(result_data: &Value) -> Vec<Vulnerability> {
        result_data
            .get("vulnerabilities")
            .and_then(|v| v.as_array())
            .map(|items| {
                items
                    .iter()
                    .map(|v| Vulnerability {
                        kind: v.get("type").and_then(|v| v.as_str()).unwrap_or("unknown").to_string(),
                        severity: Self::severity_from_str(v.get("severity").and_then(|v| v.as_str()).unwrap_or("minor")),
                        description: v.get("description").and_then(|v| v.as_str()).unwrap_or_default().to_string(),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Parses `"20-30%"` / `"40%"` into its leading number, matching the
    /// original's tolerant `int(s.replace("%", "").split("-")[0])` parse.
    fn parse_success_rate(raw: Option<&str>) -> f64 {
        raw.and_then(|s| s.trim_end_matches('%').split('-').next())
            .and_then(|n| n.trim().parse::<f64>().ok())
            .unwrap_or(0.0)
    }

    pub async fn check_quality(&self, question: Value, blueprint: Value) -> Result<Value> {
        let prompt = Self::build_prompt(&question, &blueprint);
        let raw = self.llm.generate(&prompt).await?;
        let result_data: Value = serde_json::from_str(&raw)
            .map_err(|e| PipelineError::generation(format!("quality judge returned malformed JSON: {e}")))?;

        let question_type = question.get("type").and_then(|v| v.as_str()).unwrap_or("multiple-choice").to_string();
        let answer_matches = Self::answer_matches(&result_data, &question_type);
        let vulnerabilities = Self::parse_vulnerabilities(&result_data);

        let difficulty_assessment = result_data.get("difficulty_assessment").cloned().unwrap_or(Value::Null);
        let is_too_easy = difficulty_assessment.get("is_too_easy").and_then(|v| v.as_bool()).unwrap_or(false);
        let success_rate = Self::parse_success_rate(
            difficulty_assessment.get("estimated_year6_success_rate").and_then(|v| v.as_str()),
        );
        let high_success_rate = success_rate > 40.0;

        let worst_vulnerability = vulnerabilities.iter().map(|v| v.severity).fold(None, |worst, sev| match (worst, sev) {
            (Some(VulnerabilitySeverity::Critical), _) => worst,
            (_, VulnerabilitySeverity::Critical) => Some(VulnerabilitySeverity::Critical),
            (Some(VulnerabilitySeverity::Major), _) => worst,
            (_, VulnerabilitySeverity::Major) => Some(VulnerabilitySeverity::Major),
            (Some(_), _) => worst,
            (None, sev) => Some(sev),
        });
        let has_too_easy_vulnerability = vulnerabilities.iter().any(|v| v.kind == "too_easy");

        let num_reasoning_steps = result_data.get("num_reasoning_steps").and_then(|v| v.as_u64()).unwrap_or(0) as u32;
        let clarity_score = result_data.get("clarity_score").and_then(|v| v.as_f64()).unwrap_or(0.5);
        let vulnerability_score = result_data.get("vulnerability_score").and_then(|v| v.as_f64()).unwrap_or(0.0);

        let status = QualityJudgment::derive_status(
            answer_matches,
            is_too_easy,
            high_success_rate,
            worst_vulnerability,
            has_too_easy_vulnerability,
            num_reasoning_steps,
            clarity_score,
            vulnerability_score,
        );

        let scores = JudgmentScores {
            clarity_score,
            vulnerability_score,
            num_reasoning_steps,
            estimated_year6_success_rate: success_rate,
            too_easy: is_too_easy,
        };

        let judgment = QualityJudgment {
            status,
            issues: result_data.get("issues").and_then(|v| v.as_array()).map(|a| a.iter().filter_map(|v| v.as_str().map(str::to_string)).collect()).unwrap_or_default(),
            suggestions: result_data.get("revision_suggestions").and_then(|v| v.as_array()).map(|a| a.iter().filter_map(|v| v.as_str().map(str::to_string)).collect()).unwrap_or_default(),
            vulnerabilities,
            scores,
            solution: result_data.get("solution_steps").map(|v| v.to_string()),
            answer_matches,
        };

        Ok(json!({
            "success": true,
            "question_type": question_type,
            "solution": {
                "steps": result_data.get("solution_steps").cloned().unwrap_or(json!([])),
                "selected_answer_id": result_data.get("solved_answer_id"),
                "solved_order": result_data.get("solved_order"),
                "solved_blanks": result_data.get("solved_blanks"),
                "confidence": result_data.get("solve_confidence").and_then(|v| v.as_f64()).unwrap_or(0.5),
            },
            "answer_matches": judgment.answer_matches,
            "vulnerabilities": judgment.vulnerabilities,
            "can_shortcut": result_data.get("can_solve_without_understanding").and_then(|v| v.as_bool()).unwrap_or(false),
            "vulnerability_score": judgment.scores.vulnerability_score,
            "scores": judgment.scores,
            "status": judgment.status,
            "accepted": judgment.accepted(),
            "issues": judgment.issues,
            "suggestions": judgment.suggestions,
        }))
    }
}

#[async_trait]
impl ActionHandler for QualityJudgeService {
    async fn handle(&self, action: &str, payload: Value) -> Result<Value> {
        match action {
            "check_quality" => {
                let question = payload.get("question").cloned().unwrap_or(Value::Null);
                let blueprint = payload.get("blueprint").cloned().unwrap_or(Value::Null);
                self.check_quality(question, blueprint).await
            }
            other => Ok(json!({"success": false, "error": format!("Unknown action: {other}")})),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ScriptedLlmClient;

    fn mcq_question() -> Value {
        json!({
            "type": "multiple-choice",
            "question": "What comes next: 2, 4, 8, 16, ?",
            "choices": [{"id": "1", "text": "32"}, {"id": "2", "text": "24"}],
        })
    }

    fn blueprint() -> Value {
        json!({"concept_name": "Geometric sequences", "difficulty_target": 3})
    }

    #[tokio::test]
    async fn genuinely_hard_question_with_clean_solve_is_accepted() {
        let llm = Arc::new(ScriptedLlmClient::new(vec![serde_json::to_string(&json!({
            "solution_steps": [{"step": 1, "action": "ratio", "result": "x2"}],
            "num_reasoning_steps": 4,
            "solved_answer_id": "1",
            "solve_confidence": 0.95,
            "difficulty_assessment": {"is_too_easy": false, "estimated_year6_success_rate": "20-30%"},
            "vulnerabilities": [],
            "can_solve_without_understanding": false,
            "vulnerability_score": 0.1,
            "clarity_score": 0.9,
            "alignment_score": 0.85,
            "actual_difficulty": 3,
            "difficulty_match": true,
            "issues": [],
            "revision_suggestions": [],
            "verdict": "accept",
        })).unwrap()]));
        let service = QualityJudgeService::new(llm);

        let result = service.check_quality(mcq_question(), blueprint()).await.unwrap();
        assert_eq!(result["status"], "accepted");
        assert_eq!(result["accepted"], true);
    }

    #[tokio::test]
    async fn wrong_solved_answer_is_rejected_regardless_of_verdict() {
        let llm = Arc::new(ScriptedLlmClient::new(vec![serde_json::to_string(&json!({
            "num_reasoning_steps": 4,
            "solved_answer_id": "2",
            "difficulty_assessment": {"is_too_easy": false, "estimated_year6_success_rate": "20%"},
            "vulnerabilities": [],
            "clarity_score": 0.9,
            "verdict": "accept",
        })).unwrap()]));
        let service = QualityJudgeService::new(llm);

        let result = service.check_quality(mcq_question(), blueprint()).await.unwrap();
        assert_eq!(result["status"], "rejected");
        assert_eq!(result["answer_matches"], false);
    }

    #[tokio::test]
    async fn high_success_rate_alone_needs_revision_not_rejected() {
        let llm = Arc::new(ScriptedLlmClient::new(vec![serde_json::to_string(&json!({
            "num_reasoning_steps": 5,
            "solved_answer_id": "1",
            "difficulty_assessment": {"is_too_easy": false, "estimated_year6_success_rate": "50%"},
            "vulnerabilities": [],
            "clarity_score": 0.9,
            "verdict": "accept",
        })).unwrap()]));
        let service = QualityJudgeService::new(llm);

        let result = service.check_quality(mcq_question(), blueprint()).await.unwrap();
        assert_eq!(result["status"], "needs_revision");
    }

    #[tokio::test]
    async fn too_easy_question_is_rejected() {
        let llm = Arc::new(ScriptedLlmClient::new(vec![serde_json::to_string(&json!({
            "num_reasoning_steps": 5,
            "solved_answer_id": "1",
            "difficulty_assessment": {"is_too_easy": true, "estimated_year6_success_rate": "70%"},
            "vulnerabilities": [],
            "clarity_score": 0.9,
            "verdict": "accept",
        })).unwrap()]));
        let service = QualityJudgeService::new(llm);

        let result = service.check_quality(mcq_question(), blueprint()).await.unwrap();
        assert_eq!(result["status"], "rejected");
    }

    #[tokio::test]
    async fn drag_and_drop_uses_order_is_correct_for_answer_matching() {
        let llm = Arc::new(ScriptedLlmClient::new(vec![serde_json::to_string(&json!({
            "num_reasoning_steps": 4,
            "order_is_correct": true,
            "solved_order": ["1", "2", "3"],
            "difficulty_assessment": {"is_too_easy": false, "estimated_year6_success_rate": "25%"},
            "vulnerabilities": [],
            "clarity_score": 0.9,
            "verdict": "accept",
        })).unwrap()]));
        let service = QualityJudgeService::new(llm);

        let question = json!({"type": "drag-and-drop", "question": "Order these", "choices": []});
        let result = service.check_quality(question, blueprint()).await.unwrap();
        assert_eq!(result["answer_matches"], true);
        assert_eq!(result["status"], "accepted");
    }

    #[tokio::test]
    async fn major_vulnerability_needs_revision_even_with_clean_solve() {
        let llm = Arc::new(ScriptedLlmClient::new(vec![serde_json::to_string(&json!({
            "num_reasoning_steps": 4,
            "solved_answer_id": "1",
            "difficulty_assessment": {"is_too_easy": false, "estimated_year6_success_rate": "25%"},
            "vulnerabilities": [{"type": "shortcut", "severity": "major", "description": "length clue"}],
            "clarity_score": 0.9,
            "verdict": "accept",
        })).unwrap()]));
        let service = QualityJudgeService::new(llm);

        let result = service.check_quality(mcq_question(), blueprint()).await.unwrap();
        assert_eq!(result["status"], "needs_revision");
    }
}
