// ABOUTME: Generator service (C4): realizes a ConceptSelection into a Blueprint+Question
// ABOUTME: Normalizes the LLM's raw JSON to the choice-count and first-choice-correct invariants

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::config::topic_uuids;
use crate::error::{PipelineError, Result};
use crate::llm::LlmClient;
use crate::models::{Choice, DistractorSpec, Question, QuestionBlueprint, QuestionType, SolutionStep, TargetSkill};
use crate::traits::ActionHandler;

/// Math questions carry 5 choices (1 correct + 4 distractors); every other
/// subject carries 4 (1 correct + 3 distractors).
fn choice_count_for_topic(topic: &str) -> usize {
    if topic == "math" {
        5
    } else {
        4
    }
}

pub struct GeneratorService {
    llm: Arc<dyn LlmClient>,
}

impl GeneratorService {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }

    fn detect_topic(concept: &Value) -> &'static str {
        let topic_name = concept
            .get("topic_name")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_lowercase();
        if topic_name.contains("math") {
            "math"
        } else {
            "thinking_skills"
        }
    }

    /// Strip enclosing markdown fences and parse as JSON; reject if invalid.
    /// This is the one normalization boundary every LLM-sourced payload in
    /// this service MUST cross before it is trusted (§4.4, §9).
    fn normalize_llm_json(raw: &str) -> Result<Value> {
        let trimmed = raw.trim();
        let without_fence = trimmed
            .strip_prefix("```json")
            .or_else(|| trimmed.strip_prefix("```"))
            .unwrap_or(trimmed);
        let without_fence = without_fence.strip_suffix("```").unwrap_or(without_fence);
        serde_json::from_str(without_fence.trim())
            .map_err(|e| PipelineError::generation(format!("invalid JSON from LLM: {e}")))
    }

    fn build_generation_prompt(selection: &Value, topic: &str) -> String {
        let concept = selection.get("concept").cloned().unwrap_or(Value::Null);
        format!(
            "Generate a {topic} multiple-choice question for concept '{}' at difficulty {}.\n\
             Respond with a single JSON object with fields: choices (first = correct), \
             setup_elements, question_stem_structure, constraints, correct_answer_reasoning, \
             solution_steps, question_text, explanation.\n\nConcept: {concept}",
            concept.get("name").and_then(|v| v.as_str()).unwrap_or("unknown"),
            selection.get("target_difficulty").and_then(|v| v.as_u64()).unwrap_or(3),
        )
    }

    fn build_revision_prompt(question: &Value, blueprint: &Value, issues: &[Value], suggestions: &[Value]) -> String {
        format!(
            "Revise this question given feedback.\nQuestion: {question}\nBlueprint: {blueprint}\n\
             Issues: {issues:?}\nSuggestions: {suggestions:?}\n\
             Respond with the same JSON shape as a fresh generation: choices (first = correct), \
             setup_elements, question_stem_structure, constraints, correct_answer_reasoning, \
             solution_steps, question_text, explanation."
        )
    }

    fn parse_blueprint(data: &Value, concept: &Value, target_difficulty: u8, topic: &str) -> QuestionBlueprint {
        let num_distractors = if topic == "math" { 4 } else { 3 };
        let raw_choices = data.get("choices").and_then(|v| v.as_array()).cloned().unwrap_or_default();

        let mut distractors: Vec<DistractorSpec> = raw_choices
            .iter()
            .skip(1)
            .take(num_distractors)
            .enumerate()
            .map(|(i, c)| DistractorSpec {
                id: c.get("id").and_then(|v| v.as_str()).map(str::to_string).unwrap_or_else(|| (i + 2).to_string()),
                misconception: c
                    .get("misconception")
                    .and_then(|v| v.as_str())
                    .unwrap_or("Plausible but incorrect")
                    .to_string(),
                error_type: "conceptual".to_string(),
                text_hint: c.get("text").and_then(|v| v.as_str()).map(str::to_string),
                plausibility_score: 0.5,
            })
            .collect();

        while distractors.len() < num_distractors {
            distractors.push(DistractorSpec {
                id: (distractors.len() + 2).to_string(),
                misconception: "Plausible but incorrect".to_string(),
                error_type: "conceptual".to_string(),
                text_hint: None,
                plausibility_score: 0.5,
            });
        }

        let solution_steps: Vec<SolutionStep> = data
            .get("solution_steps")
            .and_then(|v| v.as_array())
            .map(|steps| {
                steps
                    .iter()
                    .enumerate()
                    .map(|(i, s)| SolutionStep {
                        step_number: s.get("step_number").and_then(|v| v.as_u64()).unwrap_or((i + 1) as u64) as u32,
                        description: s.get("description").and_then(|v| v.as_str()).unwrap_or_default().to_string(),
                        operation: None,
                        intermediate_result: None,
                        reasoning: s.get("reasoning").and_then(|v| v.as_str()).unwrap_or_default().to_string(),
                    })
                    .collect()
            })
            .unwrap_or_default();

        let subtopic_id = concept
            .get("subtopic_id")
            .and_then(|v| v.as_str())
            .and_then(|s| Uuid::parse_str(s).ok())
            .unwrap_or(Uuid::nil());

        let topic_uuid_key = if topic == "math" { "mathematics" } else { "thinking_skills" };
        let topic_id = topic_uuids()
            .get(topic_uuid_key)
            .and_then(|s| Uuid::parse_str(s).ok())
            .unwrap_or(Uuid::nil());

        let correct_answer_value = raw_choices
            .first()
            .and_then(|c| c.get("text"))
            .cloned()
            .unwrap_or(Value::Null);

        QuestionBlueprint {
            id: Uuid::new_v4(),
            concept_id: concept.get("id").and_then(|v| v.as_str()).unwrap_or("unknown").to_string(),
            concept_name: concept.get("name").and_then(|v| v.as_str()).unwrap_or("Unknown").to_string(),
            subtopic_id,
            subtopic_name: concept.get("subtopic_name").and_then(|v| v.as_str()).unwrap_or("Unknown").to_string(),
            topic_id,
            question_type: QuestionType::Mcq,
            target_skill: TargetSkill::Application,
            difficulty_target: target_difficulty,
            setup_elements: string_array(data, "setup_elements"),
            question_stem_structure: data.get("question_stem_structure").and_then(|v| v.as_str()).unwrap_or_default().to_string(),
            constraints: string_array(data, "constraints"),
            correct_answer_value,
            correct_answer_reasoning: data.get("correct_answer_reasoning").and_then(|v| v.as_str()).unwrap_or_default().to_string(),
            distractors,
            solution_steps,
            requires_image: data.get("requires_image").and_then(|v| v.as_bool()).unwrap_or(false),
            image_spec: data.get("image_spec").and_then(|v| v.as_str()).map(str::to_string),
            tags: string_array(data, "tags"),
            revision_count: 0,
            revision_feedback: vec![],
        }
    }

    fn parse_question(data: &Value, blueprint: &QuestionBlueprint, topic: &str) -> Question {
        let num_choices = choice_count_for_topic(topic);
        let raw_choices = data.get("choices").and_then(|v| v.as_array()).cloned().unwrap_or_default();

        let mut choices: Vec<Choice> = raw_choices
            .iter()
            .enumerate()
            .map(|(i, c)| Choice {
                id: c.get("id").and_then(|v| v.as_str()).map(str::to_string).unwrap_or_else(|| (i + 1).to_string()),
                text: c.get("text").and_then(|v| v.as_str()).unwrap_or_default().to_string(),
                is_correct: i == 0,
                misconception: c.get("misconception").and_then(|v| v.as_str()).map(str::to_string),
            })
            .collect();

        while choices.len() < num_choices {
            let next_id = choices.len() + 1;
            choices.push(Choice {
                id: next_id.to_string(),
                text: format!("Option {next_id}"),
                is_correct: false,
                misconception: None,
            });
        }

        Question {
            id: Uuid::new_v4(),
            content: data.get("content").and_then(|v| v.as_str()).map(str::to_string),
            question: data.get("question_text").and_then(|v| v.as_str()).unwrap_or_default().to_string(),
            choices,
            explanation: data.get("explanation").and_then(|v| v.as_str()).unwrap_or("No explanation provided.").to_string(),
            r#type: "multiple-choice".to_string(),
            difficulty: blueprint.difficulty_target,
            topic_id: Some(blueprint.topic_id),
            subtopic_id: Some(blueprint.subtopic_id),
            subtopic_name: blueprint.subtopic_name.clone(),
            requires_image: blueprint.requires_image,
            image_description: blueprint.image_spec.clone(),
            image_url: None,
            tags: blueprint.tags.clone(),
            showup: true,
            is_active: true,
        }
    }

    pub async fn generate_question(&self, selection: Value) -> Result<Value> {
        let topic = Self::detect_topic(selection.get("concept").unwrap_or(&Value::Null));
        let target_difficulty = selection.get("target_difficulty").and_then(|v| v.as_u64()).unwrap_or(3) as u8;
        let concept = selection.get("concept").cloned().unwrap_or(Value::Null);

        let prompt = Self::build_generation_prompt(&selection, topic);
        let raw = self.llm.generate(&prompt).await.map_err(|e| PipelineError::generation(e.to_string()))?;
        let data = match Self::normalize_llm_json(&raw) {
            Ok(data) => data,
            Err(err) => return Ok(json!({"success": false, "error": err.to_string()})),
        };

        let blueprint = Self::parse_blueprint(&data, &concept, target_difficulty, topic);
        let question = Self::parse_question(&data, &blueprint, topic);

        Ok(json!({"success": true, "blueprint": blueprint, "question": question}))
    }

    pub async fn revise_question(
        &self,
        question: Value,
        blueprint: Value,
        issues: Vec<Value>,
        suggestions: Vec<Value>,
    ) -> Result<Value> {
        let original: QuestionBlueprint = serde_json::from_value(blueprint.clone())
            .map_err(|e| PipelineError::payload(format!("invalid blueprint: {e}")))?;
        let topic = if original.subtopic_name.to_lowercase().contains("math") {
            "math"
        } else {
            "thinking_skills"
        };

        let prompt = Self::build_revision_prompt(&question, &blueprint, &issues, &suggestions);
        let raw = self.llm.generate(&prompt).await.map_err(|e| PipelineError::generation(e.to_string()))?;
        let data = match Self::normalize_llm_json(&raw) {
            Ok(data) => data,
            Err(err) => return Ok(json!({"success": false, "error": err.to_string()})),
        };

        let concept_stub = json!({
            "id": original.concept_id,
            "name": original.concept_name,
            "subtopic_id": original.subtopic_id,
            "subtopic_name": original.subtopic_name,
            "topic_name": topic,
        });

        let issue_strings: Vec<String> = issues.iter().filter_map(|v| v.as_str().map(str::to_string)).collect();
        let mut revised_blueprint = Self::parse_blueprint(&data, &concept_stub, original.difficulty_target, topic);
        revised_blueprint.revision_count = original.revision_count;
        let revised_blueprint = revised_blueprint.into_revision(&issue_strings);
        let revised_question = Self::parse_question(&data, &revised_blueprint, topic);

        Ok(json!({"success": true, "blueprint": revised_blueprint, "question": revised_question}))
    }
}

fn string_array(data: &Value, key: &str) -> Vec<String> {
    data.get(key)
        .and_then(|v| v.as_array())
        .map(|a| a.iter().filter_map(|v| v.as_str().map(str::to_string)).collect())
        .unwrap_or_default()
}

#[async_trait]
impl ActionHandler for GeneratorService {
    async fn handle(&self, action: &str, payload: Value) -> Result<Value> {
        match action {
            "generate_question" => {
                let selection = payload.get("selection").cloned().unwrap_or(Value::Null);
                self.generate_question(selection).await
            }
            "revise_question" => {
                let question = payload.get("question").cloned().unwrap_or(Value::Null);
                let blueprint = payload.get("blueprint").cloned().unwrap_or(Value::Null);
                let issues = payload.get("issues").and_then(|v| v.as_array()).cloned().unwrap_or_default();
                let suggestions = payload.get("suggestions").and_then(|v| v.as_array()).cloned().unwrap_or_default();
                self.revise_question(question, blueprint, issues, suggestions).await
            }
            other => Ok(json!({"success": false, "error": format!("Unknown action: {other}")})),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ScriptedLlmClient;

    fn selection(difficulty: u8) -> Value {
        json!({
            "concept": {
                "id": "c1",
                "name": "Pattern completion",
                "subtopic_id": "00000000-0000-0000-0000-000000000001",
                "subtopic_name": "Pattern Recognition",
                "topic_name": "Thinking Skills",
            },
            "target_difficulty": difficulty,
        })
    }

    fn llm_response(num_choices: usize) -> String {
        let choices: Vec<Value> = (0..num_choices)
            .map(|i| json!({"id": (i + 1).to_string(), "text": format!("choice {i}")}))
            .collect();
        serde_json::to_string(&json!({
            "choices": choices,
            "question_text": "What comes next?",
            "explanation": "because",
            "correct_answer_reasoning": "the pattern repeats",
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn pads_short_choice_lists_and_keeps_first_choice_correct() {
        // S6: 2 choices for an MCQ pads to 4 with placeholder incorrect choices.
        let llm = Arc::new(ScriptedLlmClient::new(vec![llm_response(2)]));
        let service = GeneratorService::new(llm);

        let result = service.generate_question(selection(2)).await.unwrap();
        assert_eq!(result["success"], true);
        let choices = result["question"]["choices"].as_array().unwrap();
        assert_eq!(choices.len(), 4);
        assert_eq!(choices[0]["is_correct"], true);
        assert!(choices[1..].iter().all(|c| c["is_correct"] == false));
    }

    #[tokio::test]
    async fn math_topic_gets_five_choices() {
        let llm = Arc::new(ScriptedLlmClient::new(vec![llm_response(5)]));
        let service = GeneratorService::new(llm);
        let mut sel = selection(3);
        sel["concept"]["topic_name"] = json!("Mathematics");

        let result = service.generate_question(sel).await.unwrap();
        assert_eq!(result["question"]["choices"].as_array().unwrap().len(), 5);
        assert_eq!(result["blueprint"]["distractors"].as_array().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn malformed_llm_json_is_a_domain_generation_failure_not_a_panic() {
        let llm = Arc::new(ScriptedLlmClient::new(vec!["not json at all".to_string()]));
        let service = GeneratorService::new(llm);

        let result = service.generate_question(selection(2)).await.unwrap();
        assert_eq!(result["success"], false);
    }

    #[tokio::test]
    async fn revision_strictly_increases_revision_count() {
        let llm = Arc::new(ScriptedLlmClient::new(vec![llm_response(4), llm_response(4)]));
        let service = GeneratorService::new(llm);

        let generated = service.generate_question(selection(2)).await.unwrap();
        let blueprint = generated["blueprint"].clone();
        let question = generated["question"].clone();

        let revised = service
            .revise_question(question, blueprint.clone(), vec![json!("too easy")], vec![])
            .await
            .unwrap();

        assert!(revised["blueprint"]["revision_count"].as_u64().unwrap() > blueprint["revision_count"].as_u64().unwrap());
    }
}
