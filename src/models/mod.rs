// ABOUTME: Domain models shared across the pipeline's services
// ABOUTME: Concept catalog, blueprints, questions, verification, and judgment records

//! Domain types passed between services as JSON payloads.

pub mod blueprint;
pub mod concept;
pub mod judgment;
pub mod question;
pub mod verification;

pub use blueprint::{DistractorSpec, QuestionBlueprint, QuestionType, SolutionStep, TargetSkill};
pub use concept::{AtomicConcept, BloomLevel, ConceptGraph, ConceptSelection};
pub use judgment::{JudgmentScores, JudgmentStatus, QualityJudgment, Vulnerability, VulnerabilitySeverity};
pub use question::{Choice, Question};
pub use verification::CorrectnessVerification;
