// ABOUTME: Runtime configuration for the pipeline's agents and external collaborators
// ABOUTME: Loaded from an optional `.env` file layered under process environment

//! Runtime configuration.
//!
//! Settings are loaded once at process start through a layered [`Figment`]:
//! struct defaults, then an optional `.env` file (via `dotenvy`, read into
//! the process environment before Figment's `Env` provider sees it), then
//! the process environment itself. The topic and subtopic UUID tables and
//! the default agent port assignments are fixed data, not meant to be
//! overridden per-deployment.

pub mod curriculum;

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use figment::providers::{Env, Serialized};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};

pub use curriculum::{topic_uuids, Subtopic, MATH_SUBTOPICS, THINKING_SKILLS_SUBTOPICS};

/// Layer a type's own `Default` under the given env-var provider and
/// extract it, surfacing malformed values as a config error.
fn layered<T>(env: Env) -> Result<T>
where
    T: Default + Serialize + for<'de> Deserialize<'de>,
{
    Figment::from(Serialized::defaults(T::default()))
        .merge(env)
        .extract()
        .map_err(|e| PipelineError::config(format!("failed to load configuration: {e}")))
}

/// Default bind ports for each agent role, `5000`-`5009` per the deployment contract.
#[derive(Debug, Clone, Copy)]
pub struct AgentPorts {
    pub orchestrator: u16,
    pub image: u16,
    pub database: u16,
    pub math: u16,
    pub reading: u16,
    pub verifier: u16,
    pub concept_guide: u16,
    pub question_generator: u16,
    pub quality_checker: u16,
}

impl Default for AgentPorts {
    fn default() -> Self {
        Self {
            orchestrator: 5000,
            image: 5002,
            database: 5003,
            math: 5004,
            reading: 5005,
            verifier: 5006,
            concept_guide: 5007,
            question_generator: 5008,
            quality_checker: 5009,
        }
    }
}

impl AgentPorts {
    /// Resolve the port assigned to a role by its CLI name, if any.
    pub fn for_role(&self, role: &str) -> Option<u16> {
        match role {
            "orchestrator" => Some(self.orchestrator),
            "image" => Some(self.image),
            "database" => Some(self.database),
            "math" => Some(self.math),
            "reading" => Some(self.reading),
            "verifier" | "correctness" => Some(self.verifier),
            "concept_guide" => Some(self.concept_guide),
            "question_generator" => Some(self.question_generator),
            "quality_checker" => Some(self.quality_checker),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub name: String,
    pub user: String,
    pub password: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            name: "selective".to_string(),
            user: "postgres".to_string(),
            password: String::new(),
        }
    }
}

impl DatabaseConfig {
    pub fn connection_string(&self) -> String {
        format!(
            "postgresql://{}:{}@{}:{}/{}?sslmode=require",
            self.user, self.password, self.host, self.port, self.name
        )
    }

    fn from_env() -> Result<Self> {
        layered(Env::prefixed("DB_"))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub struct R2Config {
    pub account_id: String,
    pub bucket_name: String,
    pub access_key: String,
    pub secret_key: String,
    pub public_url: String,
}

impl R2Config {
    fn from_env() -> Result<Self> {
        layered(Env::prefixed("R2_"))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub struct GeminiConfig {
    pub api_key: String,
}

impl GeminiConfig {
    fn from_env() -> Result<Self> {
        layered(Env::prefixed("GEMINI_"))
    }
}

/// Selective logging toggles, all default-on per the wire contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(rename = "LEVEL")]
    pub level: String,
    #[serde(rename = "VERBOSE")]
    pub verbose: bool,
    #[serde(rename = "LLM")]
    pub log_llm: bool,
    #[serde(rename = "MESSAGES")]
    pub log_messages: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            verbose: false,
            log_llm: true,
            log_messages: true,
        }
    }
}

impl LoggingConfig {
    fn from_env() -> Result<Self> {
        layered(Env::prefixed("A2A_LOG_"))
    }
}

/// Pipeline-tunable thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineThresholds {
    #[serde(rename = "MAX_PIPELINE_RETRIES")]
    pub max_revisions: u32,
    #[serde(rename = "MIN_QUALITY_THRESHOLD")]
    pub min_quality_threshold: f64,
    #[serde(rename = "MIN_SOLVER_CONFIDENCE")]
    pub min_solver_confidence: f64,
    #[serde(rename = "MIN_ADVERSARIAL_ROBUSTNESS")]
    pub min_adversarial_robustness: f64,
    /// Open question (§9): verifier internal errors are treated as a pass
    /// unless an operator opts into fail-closed behavior.
    #[serde(rename = "STRICT_CORRECTNESS")]
    pub strict_correctness: bool,
}

impl Default for PipelineThresholds {
    fn default() -> Self {
        Self {
            max_revisions: 3,
            min_quality_threshold: 0.7,
            min_solver_confidence: 0.9,
            min_adversarial_robustness: 0.7,
            strict_correctness: false,
        }
    }
}

impl PipelineThresholds {
    fn from_env() -> Result<Self> {
        layered(Env::raw())
    }
}

#[derive(Debug, Clone, Default)]
pub struct Settings {
    pub ports: AgentPorts,
    pub database: DatabaseConfig,
    pub gemini: GeminiConfig,
    pub r2: R2Config,
    pub logging: LoggingConfig,
    pub pipeline: PipelineThresholds,
}

impl Settings {
    /// Load settings from an optional `./.env` file, then process
    /// environment variables, falling back to documented defaults.
    pub fn load() -> Result<Self> {
        let _ = dotenvy::dotenv();

        Ok(Self {
            ports: AgentPorts::default(),
            database: DatabaseConfig::from_env()?,
            gemini: GeminiConfig::from_env()?,
            r2: R2Config::from_env()?,
            logging: LoggingConfig::from_env()?,
            pipeline: PipelineThresholds::from_env()?,
        })
    }

    /// Resolve the bind address for a role on all interfaces.
    pub fn bind_addr(&self, role: &str) -> Result<SocketAddr> {
        let port = self
            .ports
            .for_role(role)
            .ok_or_else(|| PipelineError::config(format!("no assigned port for role '{role}'")))?;
        Ok(SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), port))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_ports_match_the_deployment_contract() {
        let ports = AgentPorts::default();
        assert_eq!(ports.orchestrator, 5000);
        assert_eq!(ports.quality_checker, 5009);
        assert_eq!(ports.for_role("correctness"), Some(ports.verifier));
        assert_eq!(ports.for_role("nonexistent"), None);
    }

    #[test]
    fn default_thresholds_allow_three_revisions() {
        let thresholds = PipelineThresholds::default();
        assert_eq!(thresholds.max_revisions, 3);
        assert!(!thresholds.strict_correctness);
    }

    #[test]
    fn bind_addr_resolves_the_configured_port() {
        let settings = Settings {
            ports: AgentPorts::default(),
            ..Default::default()
        };
        let addr = settings.bind_addr("database").unwrap();
        assert_eq!(addr.port(), 5003);
        assert!(settings.bind_addr("not_a_role").is_err());
    }

    #[test]
    fn database_config_layers_env_over_defaults() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("DB_HOST", "db.internal");
            jail.set_env("DB_PORT", "6543");

            let config = DatabaseConfig::from_env().unwrap();
            assert_eq!(config.host, "db.internal");
            assert_eq!(config.port, 6543);
            // DB_NAME untouched, default carries through the merge.
            assert_eq!(config.name, "selective");
            Ok(())
        });
    }

    #[test]
    fn pipeline_thresholds_reads_legacy_env_names() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("MAX_PIPELINE_RETRIES", "5");
            jail.set_env("STRICT_CORRECTNESS", "true");

            let thresholds = PipelineThresholds::from_env().unwrap();
            assert_eq!(thresholds.max_revisions, 5);
            assert!(thresholds.strict_correctness);
            assert_eq!(thresholds.min_quality_threshold, 0.7);
            Ok(())
        });
    }
}
