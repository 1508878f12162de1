// ABOUTME: Blueprint types: the structured plan a question is realized from
// ABOUTME: Produced by the Generator, carried through the revision loop

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Question type, matching the database schema the pipeline feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuestionType {
    #[serde(rename = "multiple-choice")]
    Mcq,
    #[serde(rename = "multiple-choice-with-images")]
    McqImages,
    #[serde(rename = "drag-and-drop")]
    DragAndDrop,
    #[serde(rename = "multi-subquestion")]
    MultiSubquestion,
    Cloze,
    Writing,
}

impl Default for QuestionType {
    fn default() -> Self {
        Self::Mcq
    }
}

/// Target cognitive skill for a generated question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetSkill {
    Recall,
    Application,
    Transfer,
    Analysis,
}

impl Default for TargetSkill {
    fn default() -> Self {
        Self::Application
    }
}

/// A planned distractor (wrong choice), before text realization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DistractorSpec {
    pub id: String,
    pub misconception: String,
    pub error_type: String,
    #[serde(default)]
    pub text_hint: Option<String>,
    #[serde(default = "default_plausibility")]
    pub plausibility_score: f64,
}

fn default_plausibility() -> f64 {
    0.5
}

/// A single step in the blueprint's solution path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolutionStep {
    pub step_number: u32,
    pub description: String,
    #[serde(default)]
    pub operation: Option<String>,
    #[serde(default)]
    pub intermediate_result: Option<Value>,
    pub reasoning: String,
}

/// The structured plan for a question prior to text realization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionBlueprint {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,

    pub concept_id: String,
    pub concept_name: String,
    pub subtopic_id: Uuid,
    pub subtopic_name: String,
    pub topic_id: Uuid,

    #[serde(default)]
    pub question_type: QuestionType,
    #[serde(default)]
    pub target_skill: TargetSkill,
    pub difficulty_target: u8,

    #[serde(default)]
    pub setup_elements: Vec<String>,
    pub question_stem_structure: String,
    #[serde(default)]
    pub constraints: Vec<String>,

    pub correct_answer_value: Value,
    pub correct_answer_reasoning: String,

    #[serde(default)]
    pub distractors: Vec<DistractorSpec>,

    #[serde(default)]
    pub solution_steps: Vec<SolutionStep>,

    #[serde(default)]
    pub requires_image: bool,
    #[serde(default)]
    pub image_spec: Option<String>,

    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub revision_count: u32,
    #[serde(default)]
    pub revision_feedback: Vec<String>,
}

impl QuestionBlueprint {
    /// A blueprint for the next revision round: bumps `revision_count` and
    /// appends the feedback that drove this revision.
    pub fn into_revision(mut self, issues: &[String]) -> Self {
        self.revision_count += 1;
        self.revision_feedback.extend(issues.iter().cloned());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn into_revision_bumps_the_counter_and_keeps_feedback() {
        let blueprint = QuestionBlueprint {
            id: Uuid::new_v4(),
            concept_id: "c1".into(),
            concept_name: "concept".into(),
            subtopic_id: Uuid::nil(),
            subtopic_name: "analogies".into(),
            topic_id: Uuid::nil(),
            question_type: QuestionType::Mcq,
            target_skill: TargetSkill::Application,
            difficulty_target: 2,
            setup_elements: vec![],
            question_stem_structure: "stem".into(),
            constraints: vec![],
            correct_answer_value: Value::String("A".into()),
            correct_answer_reasoning: "because".into(),
            distractors: vec![],
            solution_steps: vec![],
            requires_image: false,
            image_spec: None,
            tags: vec![],
            revision_count: 0,
            revision_feedback: vec![],
        };
        let revised = blueprint.into_revision(&["too easy".to_string()]);
        assert_eq!(revised.revision_count, 1);
        assert_eq!(revised.revision_feedback, vec!["too easy".to_string()]);
    }
}
