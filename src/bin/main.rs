// ABOUTME: CLI entry point: binds a single agent role, or every role, to its configured port
// ABOUTME: Role dispatch is a closed set matching the deployment contract in config::AgentPorts

use std::process::ExitCode;
use std::sync::Arc;

use qexam_pipeline::client::{AgentClient, ClientConfig};
use qexam_pipeline::config::Settings;
use qexam_pipeline::controller::PipelineController;
use qexam_pipeline::error::Result;
use qexam_pipeline::llm::{GeminiClient, LlmClient};
use qexam_pipeline::orchestrator::Orchestrator;
use qexam_pipeline::server::ServiceHost;
use qexam_pipeline::services::{ConceptRegistryService, DatabaseService, GeneratorService, ImageService, QualityJudgeService, VerifierService};
use qexam_pipeline::traits::ActionHandler;
use qexam_pipeline::types::{AgentCard, Skill};

const ROLES: &[&str] = &[
    "orchestrator",
    "concept_guide",
    "question_generator",
    "quality_checker",
    "correctness",
    "verifier",
    "image",
    "database",
    "all",
];

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let role = std::env::args().nth(1).unwrap_or_default();

    match run(&role).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(role, error = %err, "agent exited with an error");
            ExitCode::FAILURE
        }
    }
}

async fn run(role: &str) -> Result<()> {
    let settings = Settings::load()?;

    if role == "all" {
        return run_all(settings).await;
    }

    if !ROLES.contains(&role) {
        tracing::error!(role, available = ?ROLES, "unknown role");
        return Err(qexam_pipeline::error::PipelineError::config(format!("unknown role '{role}'")));
    }

    if role == "orchestrator" {
        return run_orchestrator(&settings).await;
    }

    let llm = gemini(&settings);
    let (card, handler) = service_for(role, llm);
    let bind_addr = settings.bind_addr(role)?;
    tracing::info!(role, %bind_addr, "starting agent");
    ServiceHost::new(card, handler).serve(bind_addr).await
}

fn gemini(settings: &Settings) -> Arc<dyn LlmClient> {
    Arc::new(GeminiClient::flash(settings.gemini.api_key.clone()))
}

fn service_for(role: &str, llm: Arc<dyn LlmClient>) -> (AgentCard, Arc<dyn ActionHandler>) {
    match role {
        "concept_guide" => (
            AgentCard::new("concept_guide", "http://0.0.0.0", vec![Skill::new("select_concept", "Select Concept")]),
            Arc::new(ConceptRegistryService::new("concepts")),
        ),
        "question_generator" => (
            AgentCard::new(
                "question_generator",
                "http://0.0.0.0",
                vec![Skill::new("generate_question", "Generate Question"), Skill::new("revise_question", "Revise Question")],
            ),
            Arc::new(GeneratorService::new(llm)),
        ),
        "quality_checker" => (
            AgentCard::new("quality_checker", "http://0.0.0.0", vec![Skill::new("check_quality", "Check Quality")]),
            Arc::new(QualityJudgeService::new(llm)),
        ),
        "correctness" | "verifier" => (
            AgentCard::new(role, "http://0.0.0.0", vec![Skill::new("verify_correctness", "Verify Correctness")]),
            Arc::new(VerifierService::new(llm)),
        ),
        "image" => (
            AgentCard::new("image", "http://0.0.0.0", vec![Skill::new("generate_image", "Generate Image")]),
            Arc::new(ImageService),
        ),
        "database" => (
            AgentCard::new(
                "database",
                "http://0.0.0.0",
                vec![
                    Skill::new("insert_questions", "Insert Questions"),
                    Skill::new("create_exam", "Create Exam"),
                    Skill::new("get_subtopics", "Get Subtopics"),
                ],
            ),
            Arc::new(DatabaseService),
        ),
        other => unreachable!("role '{other}' is not a standalone service"),
    }
}

fn peer_url(settings: &Settings, role: &str) -> String {
    let port = settings.ports.for_role(role).expect("every peer role has an assigned port");
    format!("http://127.0.0.1:{port}")
}

fn build_controller(settings: &Settings) -> PipelineController {
    PipelineController::new(
        AgentClient::new("orchestrator", ClientConfig::new(peer_url(settings, "concept_guide"))),
        AgentClient::new("orchestrator", ClientConfig::new(peer_url(settings, "question_generator"))),
        AgentClient::new("orchestrator", ClientConfig::new(peer_url(settings, "correctness"))),
        AgentClient::new("orchestrator", ClientConfig::new(peer_url(settings, "quality_checker"))),
        settings.pipeline.clone(),
    )
}

async fn run_orchestrator(settings: &Settings) -> Result<()> {
    let orchestrator = Orchestrator::new(build_controller(settings));
    let card = AgentCard::new(
        "orchestrator",
        "http://0.0.0.0",
        vec![Skill::new("generate_exam", "Generate Exam")],
    );
    let bind_addr = settings.bind_addr("orchestrator")?;
    tracing::info!(%bind_addr, "starting orchestrator");
    ServiceHost::new(card, Arc::new(orchestrator)).serve(bind_addr).await
}

/// Runs every role as a concurrent task in a single process, for local
/// development: each role still binds its own configured port.
async fn run_all(settings: Settings) -> Result<()> {
    let settings = Arc::new(settings);
    let mut handles = Vec::new();

    for role in ["concept_guide", "question_generator", "quality_checker", "correctness", "image", "database"] {
        let settings = settings.clone();
        handles.push(tokio::spawn(async move {
            let llm = gemini(&settings);
            let (card, handler) = service_for(role, llm);
            let bind_addr = settings.bind_addr(role).expect("role in ROLES has an assigned port");
            tracing::info!(role, %bind_addr, "starting agent");
            ServiceHost::new(card, handler).serve(bind_addr).await
        }));
    }

    {
        let settings = settings.clone();
        handles.push(tokio::spawn(async move { run_orchestrator(&settings).await }));
    }

    for handle in handles {
        handle.await.map_err(|e| qexam_pipeline::error::PipelineError::internal(format!("agent task panicked: {e}")))??;
    }

    Ok(())
}
