// ABOUTME: Main library entry point for the exam question generation pipeline
// ABOUTME: Wires the transport envelope, services, and controller into a single crate

//! # qexam-pipeline
//!
//! A distributed pipeline of cooperating agent services that generate and
//! quality-gate exam questions. A [`controller::PipelineController`] drives
//! a single question through concept selection, generation, correctness
//! verification, and quality judgment; an [`orchestrator::Orchestrator`]
//! fans that out across a batch plan with retry rounds for any shortfall.
//!
//! Services talk to each other over the JSON-RPC contract in
//! [`transport::jsonrpc`], each exposed through a [`server::ServiceHost`]
//! and reached through an [`client::AgentClient`].

pub mod client;
pub mod config;
pub mod controller;
pub mod error;
pub mod envelope;
pub mod llm;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod server;
pub mod traits;
pub mod transport;
pub mod types;

pub mod prelude {
    pub use crate::client::{AgentClient, ClientConfig};
    pub use crate::config::Settings;
    pub use crate::controller::{PipelineController, PipelineResult};
    pub use crate::envelope::{Envelope, EnvelopeBuilder, Meta};
    pub use crate::error::{PipelineError, Result};
    pub use crate::orchestrator::Orchestrator;
    pub use crate::server::ServiceHost;
    pub use crate::traits::ActionHandler;
    pub use crate::types::{AgentCard, Skill};
}

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_is_not_empty() {
        assert!(!VERSION.is_empty());
    }
}
