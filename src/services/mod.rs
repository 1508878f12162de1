// ABOUTME: Service implementations: one ActionHandler per agent role
// ABOUTME: Each is stateless per-request except the Concept Registry's cached catalog

//! The worker services behind the pipeline: Concept Registry, Generator,
//! Correctness Verifier, and Quality Judge, plus the Image and Database
//! collaborators treated as external interfaces (§6) with minimal stubs.

pub mod concept_registry;
pub mod database;
pub mod generator;
pub mod image;
pub mod quality_judge;
pub mod verifier;

pub use concept_registry::ConceptRegistryService;
pub use database::DatabaseService;
pub use generator::GeneratorService;
pub use image::ImageService;
pub use quality_judge::QualityJudgeService;
pub use verifier::VerifierService;
