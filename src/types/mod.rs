// ABOUTME: Agent identification and descriptor types shared across services
// ABOUTME: Backs the /.well-known/agent.json descriptor every service exposes

//! Shared types describing an agent and its advertised skills.

pub mod a2a;

pub use a2a::{AgentCard, Skill};
