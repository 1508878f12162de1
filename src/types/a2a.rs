// ABOUTME: A2A agent descriptor types
// ABOUTME: Contains the name, version, base URL, and skill list a service advertises

//! Agent descriptor types served at `/.well-known/agent.json`.

use serde::{Deserialize, Serialize};

/// A single capability a service advertises.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Skill {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Skill {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
        }
    }
}

/// Agent descriptor returned by `/.well-known/agent.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentCard {
    pub name: String,
    pub version: String,
    pub base_url: String,
    pub skills: Vec<Skill>,
}

impl AgentCard {
    pub fn new(name: impl Into<String>, base_url: impl Into<String>, skills: Vec<Skill>) -> Self {
        Self {
            name: name.into(),
            version: crate::VERSION.to_string(),
            base_url: base_url.into(),
            skills,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn card_carries_the_crate_version() {
        let card = AgentCard::new("concept_guide", "http://localhost:5002", vec![]);
        assert_eq!(card.version, crate::VERSION);
    }
}
