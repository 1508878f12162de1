// ABOUTME: The presentation artifact returned to end users after acceptance
// ABOUTME: Realized from a QuestionBlueprint by the Generator

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single answer choice for a multiple-choice style question.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Choice {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub is_correct: bool,
    #[serde(default)]
    pub misconception: Option<String>,
}

/// The presentable question artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    #[serde(default)]
    pub content: Option<String>,
    pub question: String,
    pub choices: Vec<Choice>,
    pub explanation: String,
    #[serde(default = "default_question_type")]
    pub r#type: String,
    pub difficulty: u8,
    #[serde(default)]
    pub topic_id: Option<Uuid>,
    #[serde(default)]
    pub subtopic_id: Option<Uuid>,
    pub subtopic_name: String,
    #[serde(default)]
    pub requires_image: bool,
    #[serde(default)]
    pub image_description: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default = "default_true")]
    pub showup: bool,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_question_type() -> String {
    "multiple-choice".to_string()
}

fn default_true() -> bool {
    true
}

impl Question {
    /// §8 invariant 1: for MCQ, exactly one choice is correct and it is first.
    pub fn has_well_formed_mcq_choices(&self) -> bool {
        if self.r#type != "multiple-choice" {
            return true;
        }
        let correct_count = self.choices.iter().filter(|c| c.is_correct).count();
        correct_count == 1 && self.choices.first().is_some_and(|c| c.is_correct)
    }
}
