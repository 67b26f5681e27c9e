//! Agent discovery and capability types

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A named unit of work an agent can perform
///
/// Schemas are declarative documentation for callers; nothing checks inputs against them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentCapability {
    /// Name used for discovery (exact match)
    pub skill_name: String,

    /// Human-readable description of the capability
    pub description: String,

    /// JSON schema of the expected input
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_schema: Option<Value>,

    /// JSON schema of the produced output
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_schema: Option<Value>,
}

impl AgentCapability {
    /// Create a capability without schemas
    pub fn new(skill_name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            skill_name: skill_name.into(),
            description: description.into(),
            input_schema: None,
            output_schema: None,
        }
    }

    /// Set the input schema
    pub fn with_input_schema(mut self, schema: Value) -> Self {
        self.input_schema = Some(schema);
        self
    }

    /// Set the output schema
    pub fn with_output_schema(mut self, schema: Value) -> Self {
        self.output_schema = Some(schema);
        self
    }
}

/// Agent Card describing an agent and what it can do
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentCard {
    /// Unique, immutable agent identifier
    pub agent_id: String,

    /// Name of the agent
    pub name: String,

    /// Human-readable description of the agent
    #[serde(default)]
    pub description: String,

    /// Capabilities in registration order
    #[serde(default)]
    pub capabilities: Vec<AgentCapability>,

    /// Agent version
    #[serde(default = "default_version")]
    pub version: String,
}

fn default_version() -> String {
    "0.1.0".to_string()
}

impl AgentCard {
    /// Create a new agent card with no capabilities
    pub fn new(
        agent_id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            agent_id: agent_id.into(),
            name: name.into(),
            description: description.into(),
            capabilities: Vec::new(),
            version: default_version(),
        }
    }

    /// Set the agent version
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Add a capability to the card
    pub fn with_capability(mut self, capability: AgentCapability) -> Self {
        self.capabilities.push(capability);
        self
    }

    /// First capability with the given skill name
    pub fn capability(&self, skill_name: &str) -> Option<&AgentCapability> {
        self.capabilities
            .iter()
            .find(|capability| capability.skill_name == skill_name)
    }

    /// Whether the card offers the given skill
    pub fn offers(&self, skill_name: &str) -> bool {
        self.capability(skill_name).is_some()
    }

    /// Skill names in registration order
    pub fn skill_names(&self) -> Vec<&str> {
        self.capabilities
            .iter()
            .map(|capability| capability.skill_name.as_str())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_agent_card_creation() {
        let card = AgentCard::new("writer-1", "Writing Agent", "Writes drafts")
            .with_version("1.0.0")
            .with_capability(AgentCapability::new("write_content", "Writes a draft"));

        assert_eq!(card.agent_id, "writer-1");
        assert_eq!(card.version, "1.0.0");
        assert!(card.offers("write_content"));
        assert!(!card.offers("write"));
    }

    #[test]
    fn test_duplicate_skill_first_match_wins() {
        let card = AgentCard::new("a", "A", "")
            .with_capability(AgentCapability::new("summarize", "first"))
            .with_capability(AgentCapability::new("summarize", "second"));

        assert_eq!(card.capabilities.len(), 2);
        assert_eq!(card.capability("summarize").unwrap().description, "first");
        assert_eq!(card.skill_names(), vec!["summarize", "summarize"]);
    }

    #[test]
    fn test_agent_card_serialization() {
        let card = AgentCard::new("seo-1", "SEO Agent", "Optimizes drafts").with_capability(
            AgentCapability::new("optimize_seo", "SEO pass")
                .with_input_schema(json!({"type": "object"})),
        );

        let json = serde_json::to_value(&card).unwrap();
        assert_eq!(json["agent_id"], "seo-1");
        assert_eq!(json["capabilities"][0]["skill_name"], "optimize_seo");
        assert!(json["capabilities"][0].get("output_schema").is_none());

        let deserialized: AgentCard = serde_json::from_value(json).unwrap();
        assert_eq!(card, deserialized);
    }

    #[test]
    fn test_version_defaults() {
        let card: AgentCard =
            serde_json::from_value(json!({"agent_id": "x", "name": "X"})).unwrap();
        assert_eq!(card.version, "0.1.0");
        assert!(card.capabilities.is_empty());
    }
}
