//! Orchestrator configuration

use std::time::Duration;

/// Default time to wait for a delegated task
pub const DEFAULT_TASK_TIMEOUT: Duration = Duration::from_secs(300);

/// Capability names the blog post workflow looks up, one per step
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowSkills {
    /// Required: turns the topic into research notes
    pub research: String,

    /// Required: turns research into a draft
    pub writing: String,

    /// Optional: optimizes the draft
    pub seo: String,

    /// Optional: illustrates the optimized draft; `find_images_openai` by default
    pub image: String,
}

impl Default for WorkflowSkills {
    fn default() -> Self {
        Self {
            research: "research_topic_web".to_string(),
            writing: "write_content".to_string(),
            seo: "optimize_seo".to_string(),
            image: "find_images_openai".to_string(),
        }
    }
}

/// Configuration for an orchestrator
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Id the orchestrator is addressed by
    pub agent_id: String,

    /// Display name on the card
    pub name: String,

    /// Description on the card
    pub description: String,

    /// Card version
    pub version: String,

    /// How long `assign_task_and_wait` waits when no timeout is given
    pub task_timeout: Duration,

    /// Capabilities used by the workflow
    pub skills: WorkflowSkills,
}

impl OrchestratorConfig {
    /// Create a configuration with the given agent id and defaults for everything else
    pub fn new(agent_id: impl Into<String>) -> Self {
        Self {
            agent_id: agent_id.into(),
            name: "Orchestrator Agent".to_string(),
            description: "Manages and coordinates other agents to complete complex tasks."
                .to_string(),
            version: "0.1.0".to_string(),
            task_timeout: DEFAULT_TASK_TIMEOUT,
            skills: WorkflowSkills::default(),
        }
    }

    /// Set the display name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the card version
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Set the default task timeout
    pub fn with_task_timeout(mut self, timeout: Duration) -> Self {
        self.task_timeout = timeout;
        self
    }

    /// Set the workflow capability names
    pub fn with_skills(mut self, skills: WorkflowSkills) -> Self {
        self.skills = skills;
        self
    }
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self::new("orchestrator_agent_001")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = OrchestratorConfig::default();

        assert_eq!(config.agent_id, "orchestrator_agent_001");
        assert_eq!(config.task_timeout, Duration::from_secs(300));
        assert_eq!(config.skills.research, "research_topic_web");
        assert_eq!(config.skills.image, "find_images_openai");
    }

    #[test]
    fn test_builder() {
        let config = OrchestratorConfig::new("conductor")
            .with_name("Conductor")
            .with_version("1.2.0")
            .with_task_timeout(Duration::from_secs(5))
            .with_skills(WorkflowSkills {
                image: "generate_images".into(),
                ..WorkflowSkills::default()
            });

        assert_eq!(config.agent_id, "conductor");
        assert_eq!(config.name, "Conductor");
        assert_eq!(config.version, "1.2.0");
        assert_eq!(config.task_timeout.as_secs(), 5);
        assert_eq!(config.skills.image, "generate_images");
        assert_eq!(config.skills.writing, "write_content");
    }
}
