// ABOUTME: Concept catalog types owned by the Concept Registry service
// ABOUTME: The catalog is loaded once per process and never mutated after load

//! The concept catalog: the smallest testable units of subject matter, and
//! the selection result the Generator consumes.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Bloom's taxonomy levels used to target a concept's cognitive demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BloomLevel {
    Recall,
    Comprehension,
    Application,
    Analysis,
    Synthesis,
    Evaluation,
}

/// An atomic, testable concept within a subtopic. Immutable once loaded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AtomicConcept {
    pub id: String,
    pub name: String,
    pub description: String,
    pub subtopic_id: Uuid,
    pub subtopic_name: String,
    pub topic_id: Uuid,
    #[serde(default)]
    pub topic_name: String,

    /// Difficulty window this concept can be tested at, 1 ≤ min ≤ max ≤ 3.
    pub difficulty_min: u8,
    pub difficulty_max: u8,

    #[serde(default = "default_bloom_levels")]
    pub bloom_levels: Vec<BloomLevel>,

    /// Ordered, so the first N can be taken as distractor seeds.
    #[serde(default)]
    pub common_misconceptions: Vec<String>,

    #[serde(default)]
    pub question_patterns: Vec<String>,

    #[serde(default)]
    pub example_stems: Vec<String>,

    #[serde(default)]
    pub typically_requires_image: bool,

    #[serde(default)]
    pub image_types: Vec<String>,
}

fn default_bloom_levels() -> Vec<BloomLevel> {
    vec![BloomLevel::Application]
}

impl AtomicConcept {
    /// True if `difficulty` falls within this concept's tested range.
    pub fn covers_difficulty(&self, difficulty: u8) -> bool {
        self.difficulty_min <= difficulty && difficulty <= self.difficulty_max
    }
}

/// A subtopic's full set of concepts, as loaded from its catalog file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConceptGraph {
    pub subtopic_id: Uuid,
    pub subtopic_name: String,
    pub topic_id: Uuid,
    #[serde(default)]
    pub topic_name: String,
    pub concepts: Vec<AtomicConcept>,
}

impl ConceptGraph {
    pub fn get(&self, concept_id: &str) -> Option<&AtomicConcept> {
        self.concepts.iter().find(|c| c.id == concept_id)
    }

    pub fn eligible_for_difficulty(&self, difficulty: u8) -> Vec<&AtomicConcept> {
        self.concepts
            .iter()
            .filter(|c| c.covers_difficulty(difficulty))
            .collect()
    }
}

/// Result of selecting a concept for question generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConceptSelection {
    pub concept: AtomicConcept,
    pub target_difficulty: u8,
    pub target_bloom: BloomLevel,
    /// At most 3, preserving the concept's declared order.
    pub selected_misconceptions: Vec<String>,
    pub selected_pattern: Option<String>,
}
