//! Blog post pipeline definition

use crate::{
    orchestrator::config::WorkflowSkills,
    protocol::{
        task::{Task, TaskStatus},
        Artifact,
    },
};

/// Prefix of task descriptions the orchestrator itself knows how to execute
pub const BLOG_POST_PREFIX: &str = "Create a blog post on topic:";

/// Capability the orchestrator advertises for running the whole pipeline
pub const BLOG_POST_SKILL: &str = "manage_blog_post_creation";

/// Whether the pipeline can continue without a step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepKind {
    /// Missing provider or unsuccessful result aborts the workflow
    Required,

    /// Missing provider or unsuccessful result passes the previous artifact through
    Optional,
}

/// One stage of the pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowStep {
    /// Short name for logs
    pub label: &'static str,

    /// Capability a provider must offer
    pub skill_name: String,

    /// Description given to the delegated task
    pub description: String,

    pub kind: StepKind,
}

impl WorkflowStep {
    /// Whether the workflow must stop when this step yields nothing
    pub fn is_required(&self) -> bool {
        self.kind == StepKind::Required
    }
}

/// research → writing → SEO → image, each consuming the previous step's artifact
pub fn blog_post_steps(skills: &WorkflowSkills, topic: &str) -> Vec<WorkflowStep> {
    vec![
        WorkflowStep {
            label: "research",
            skill_name: skills.research.clone(),
            description: format!("Research recent news on the topic: {}", topic),
            kind: StepKind::Required,
        },
        WorkflowStep {
            label: "writing",
            skill_name: skills.writing.clone(),
            description: format!("Write a blog post: {}", topic),
            kind: StepKind::Required,
        },
        WorkflowStep {
            label: "seo",
            skill_name: skills.seo.clone(),
            description: format!("Optimize SEO: {}", topic),
            kind: StepKind::Optional,
        },
        WorkflowStep {
            label: "image",
            skill_name: skills.image.clone(),
            description: format!("Generate images for: {}", topic),
            kind: StepKind::Optional,
        },
    ]
}

/// The artifact a finished step hands to the next one
///
/// Only a completed task with at least one output counts as a result.
pub fn step_output(task: &Task) -> Option<&Artifact> {
    if task.status == TaskStatus::Completed {
        task.primary_output()
    } else {
        None
    }
}

/// Topic of a `manage_blog_post_creation` task
///
/// Taken from the first input artifact when it holds text, otherwise from the text
/// following [`BLOG_POST_PREFIX`] in the description.
pub fn topic_of(task: &Task) -> Option<String> {
    let from_input = task
        .input_artifacts
        .first()
        .and_then(Artifact::text)
        .map(str::trim)
        .filter(|topic| !topic.is_empty());
    if let Some(topic) = from_input {
        return Some(topic.to_string());
    }

    task.description
        .strip_prefix(BLOG_POST_PREFIX)
        .map(str::trim)
        .filter(|topic| !topic.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_step_order_and_kinds() {
        let steps = blog_post_steps(&WorkflowSkills::default(), "Rust");

        let labels: Vec<&str> = steps.iter().map(|s| s.label).collect();
        assert_eq!(labels, vec!["research", "writing", "seo", "image"]);
        assert!(steps[0].is_required() && steps[1].is_required());
        assert!(!steps[2].is_required() && !steps[3].is_required());
        assert_eq!(steps[1].description, "Write a blog post: Rust");
    }

    #[test]
    fn test_step_output_requires_completion() {
        let mut task = Task::new("t", "d", "o", "w");
        task.push_output(Artifact::new("t", "w", "text/markdown", json!("D")));
        assert!(step_output(&task).is_none());

        task.transition(TaskStatus::Completed).unwrap();
        assert_eq!(step_output(&task).unwrap().data, json!("D"));

        let empty = {
            let mut t = Task::new("t2", "d", "o", "w");
            t.transition(TaskStatus::Completed).unwrap();
            t
        };
        assert!(step_output(&empty).is_none());
    }

    #[test]
    fn test_topic_from_description_or_input() {
        let by_description = Task::new("t", "Create a blog post on topic:  Tokio ", "main", "o");
        assert_eq!(topic_of(&by_description).as_deref(), Some("Tokio"));

        let by_input = by_description.clone().with_inputs(vec![Artifact::new(
            "t",
            "main",
            "text/plain",
            json!("Tower"),
        )]);
        assert_eq!(topic_of(&by_input).as_deref(), Some("Tower"));

        let unknown = Task::new("t", "Summarize something", "main", "o");
        assert!(topic_of(&unknown).is_none());
    }
}
