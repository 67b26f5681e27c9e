//! Orchestrator: delegates tasks to capable agents and waits for their results
//!
//! The orchestrator owns the [`AgentDirectory`] its workers are registered in and is the
//! directory's owner, so status updates addressed to it are delivered to its own
//! [`Agent::handle_incoming_message`]. Each delegated task is tracked until a terminal
//! status update arrives or the wait times out.

pub mod config;
mod outbox;
mod pending;
pub mod workflow;

pub use config::{OrchestratorConfig, WorkflowSkills, DEFAULT_TASK_TIMEOUT};
pub use workflow::{StepKind, WorkflowStep, BLOG_POST_PREFIX, BLOG_POST_SKILL};

use std::{
    sync::{Arc, Weak},
    time::Duration,
};

use async_trait::async_trait;
use futures::FutureExt;
use serde_json::json;
use tower::ServiceExt;

use crate::{
    directory::AgentDirectory,
    protocol::{
        error::{A2AError, TaskError},
        message::{AgentMessage, ErrorReport, MessagePayload},
        task::{StatusUpdate, Task, TaskStatus},
        Artifact,
    },
    runtime::{Agent, AgentRuntime},
};

use self::{
    outbox::Outbox,
    pending::{Resolution, TaskTable},
    workflow::{blog_post_steps, step_output, topic_of},
};

/// Coordinating agent running the blog post pipeline
pub struct Orchestrator {
    runtime: AgentRuntime,
    directory: Arc<AgentDirectory>,
    tasks: Arc<TaskTable>,
    outbox: Outbox,
    config: OrchestratorConfig,
}

impl Orchestrator {
    /// Create an orchestrator with its own directory
    pub fn new(config: OrchestratorConfig) -> Arc<Self> {
        Arc::new_cyclic(|me: &Weak<Orchestrator>| {
            let owner: Weak<dyn Agent> = me.clone();
            let directory = Arc::new(AgentDirectory::with_owner(
                config.agent_id.clone(),
                owner,
            ));

            let runtime = AgentRuntime::new(
                config.agent_id.clone(),
                config.name.clone(),
                config.description.clone(),
            )
            .with_version(config.version.clone());
            runtime.register_capability(
                BLOG_POST_SKILL,
                "Orchestrates the creation of a blog post from topic to final draft.",
                Some(json!({
                    "type": "object",
                    "properties": {"topic": {"type": "string"}}
                })),
                None,
            );
            runtime.set_message_handler(directory.transport());

            Self {
                runtime,
                directory,
                tasks: Arc::new(TaskTable::default()),
                outbox: Outbox::default(),
                config,
            }
        })
    }

    /// The orchestrator's configuration
    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Directory of agents this orchestrator delegates to
    pub fn directory(&self) -> &Arc<AgentDirectory> {
        &self.directory
    }

    /// Register a worker; duplicate ids are ignored and return `false`
    pub fn register_agent(&self, agent: Arc<dyn Agent>) -> bool {
        self.directory.register(agent)
    }

    /// Registered agents offering `skill_name`, in registration order
    pub fn discover(&self, skill_name: &str) -> Vec<Arc<dyn Agent>> {
        self.directory.discover(skill_name)
    }

    /// Number of tasks currently awaiting a result
    pub async fn in_flight_count(&self) -> usize {
        self.tasks.in_flight_len().await
    }

    /// Number of result handles not yet written
    pub async fn pending_count(&self) -> usize {
        self.tasks.pending_len().await
    }

    /// Delegate a task to `agent` and wait for its terminal status
    ///
    /// Always returns a terminal task. Timeouts and delivery failures come back as
    /// `failed` tasks with an explanatory `error_message`; the worker is never told to
    /// stop. `timeout` defaults to the configured task timeout.
    pub async fn assign_task_and_wait(
        &self,
        agent: &dyn Agent,
        description: impl Into<String>,
        input_artifacts: Vec<Artifact>,
        timeout: Option<Duration>,
    ) -> Task {
        self.delegate(agent, description.into(), input_artifacts, None, timeout)
            .await
    }

    async fn delegate(
        &self,
        agent: &dyn Agent,
        description: String,
        input_artifacts: Vec<Artifact>,
        parent_task_id: Option<&str>,
        timeout: Option<Duration>,
    ) -> Task {
        let timeout = timeout.unwrap_or(self.config.task_timeout);
        let target = agent.agent_id().to_string();

        let mut task = self
            .runtime
            .create_task(description, self.runtime.agent_id(), target.clone())
            .with_inputs(input_artifacts);
        if let Some(parent) = parent_task_id {
            task = task.with_parent(parent);
        }
        let task_id = task.task_id.clone();

        if !self.directory.can_route(&target) {
            let error = A2AError::UnknownAgent { agent_id: target };
            tracing::error!(
                agent_id = %self.runtime.agent_id(),
                task_id = %task_id,
                "Cannot assign task: {}",
                error
            );
            let _ = task.fail(
                TaskStatus::Failed,
                format!("Failed to send task assignment: {}", error),
            );
            return task;
        }

        tracing::info!(
            agent_id = %self.runtime.agent_id(),
            task_id = %task_id,
            "Assigning task '{}' to agent {} ({})",
            task.description,
            agent.runtime().name(),
            target
        );

        let receiver = self.tasks.track(task.clone()).await;
        self.dispatch_assignment(task.clone());

        let settled = match tokio::time::timeout(timeout, receiver).await {
            Ok(Ok(update)) => self.tasks.settle(&task_id, &update).await,
            Ok(Err(_)) => {
                self.tasks
                    .expire(
                        &task_id,
                        format!("Task {} lost its result handle before completing", task_id),
                    )
                    .await
            }
            Err(_) => {
                tracing::error!(
                    agent_id = %self.runtime.agent_id(),
                    task_id = %task_id,
                    "Timeout waiting for task assigned to {}",
                    target
                );
                self.tasks
                    .expire(
                        &task_id,
                        format!(
                            "Task {} timed out after {}s waiting for agent {}",
                            task_id,
                            timeout.as_secs_f64(),
                            target
                        ),
                    )
                    .await
            }
        };

        let result = settled.unwrap_or_else(|| {
            let _ = task.fail(
                TaskStatus::Failed,
                format!("Task {} was no longer tracked when its wait ended", task_id),
            );
            task
        });

        tracing::info!(
            agent_id = %self.runtime.agent_id(),
            task_id = %result.task_id,
            status = %result.status,
            "Delegated task finished"
        );
        result
    }

    /// Send the assignment without waiting for delivery
    ///
    /// Routing runs the worker inline, so the send is posted to the receiver's outbox
    /// lane to let the caller's wait own the deadline. Assignments to one receiver reach
    /// it in the order they were made. A rejected send fails the task right away.
    fn dispatch_assignment(&self, task: Task) {
        let agent_id = self.runtime.agent_id().to_string();
        let task_id = task.task_id.clone();
        let message = self.runtime.new_message(
            task.assigned_to_agent_id.clone(),
            MessagePayload::TaskAssignment(task),
        );
        let receiver = message.receiver_agent_id.clone();
        let handler = self.runtime.message_handler();
        let tasks = self.tasks.clone();

        let delivery = async move {
            let sent = match handler {
                Some(handler) => handler.oneshot(message).await,
                None => Err(A2AError::NoMessageHandler {
                    agent_id: agent_id.clone(),
                }),
            };

            if let Err(e) = sent {
                tracing::error!(
                    agent_id = %agent_id,
                    task_id = %task_id,
                    "Failed to send task assignment: {}",
                    e
                );
                let update = StatusUpdate::new(task_id, TaskStatus::Failed)
                    .with_error(format!("Failed to send task assignment: {}", e));
                tasks.resolve(update).await;
            }
        };
        self.outbox.post(&receiver, delivery.boxed());
    }

    /// Run the blog post pipeline for `topic`
    ///
    /// Returns the last artifact produced, or `None` when a required step has no provider
    /// or does not complete with an output.
    pub async fn execute_workflow(&self, topic: &str) -> Option<Artifact> {
        let agent_id = self.runtime.agent_id();
        let root = self.runtime.create_task(
            format!("{} {}", BLOG_POST_PREFIX, topic),
            agent_id,
            agent_id,
        );
        let seed = self.runtime.create_artifact(
            &root.task_id,
            "text/plain",
            json!(topic),
            Some("Initial blog post topic".to_string()),
        );

        self.run_workflow(&root.task_id, topic, seed).await
    }

    async fn run_workflow(&self, root_task_id: &str, topic: &str, seed: Artifact) -> Option<Artifact> {
        tracing::info!(
            agent_id = %self.runtime.agent_id(),
            task_id = %root_task_id,
            "Starting blog post workflow for topic '{}'",
            topic
        );

        let mut current = seed;
        for step in blog_post_steps(&self.config.skills, topic) {
            let Some(provider) = self.discover(&step.skill_name).into_iter().next() else {
                if step.is_required() {
                    tracing::error!(
                        task_id = %root_task_id,
                        "No agent offers '{}', required for the {} step",
                        step.skill_name,
                        step.label
                    );
                    return None;
                }
                tracing::warn!(
                    task_id = %root_task_id,
                    "No agent offers '{}', skipping the {} step",
                    step.skill_name,
                    step.label
                );
                continue;
            };

            let result = self
                .delegate(
                    &*provider,
                    step.description.clone(),
                    vec![current.clone()],
                    Some(root_task_id),
                    None,
                )
                .await;

            match step_output(&result) {
                Some(artifact) => {
                    tracing::info!(
                        task_id = %result.task_id,
                        artifact_id = %artifact.artifact_id,
                        "The {} step completed",
                        step.label
                    );
                    current = artifact.clone();
                }
                None if step.is_required() => {
                    tracing::error!(
                        task_id = %result.task_id,
                        status = %result.status,
                        "The {} step failed or produced no artifacts: {}",
                        step.label,
                        result.error_message.as_deref().unwrap_or("no output")
                    );
                    return None;
                }
                None => {
                    tracing::warn!(
                        task_id = %result.task_id,
                        status = %result.status,
                        "The {} step failed, keeping the previous artifact",
                        step.label
                    );
                }
            }
        }

        tracing::info!(
            task_id = %root_task_id,
            artifact_id = %current.artifact_id,
            "Blog post workflow for topic '{}' completed",
            topic
        );
        Some(current)
    }

    async fn on_status_update(&self, sender: &str, update: StatusUpdate) {
        let task_id = update.task_id.clone();
        let status = update.status;

        match self.tasks.resolve(update).await {
            Resolution::Resolved => tracing::info!(
                agent_id = %self.runtime.agent_id(),
                task_id = %task_id,
                "Task reported {} by {}",
                status,
                sender
            ),
            Resolution::Progressed => tracing::info!(
                agent_id = %self.runtime.agent_id(),
                task_id = %task_id,
                "Task is now {}",
                status
            ),
            Resolution::Untracked => tracing::warn!(
                agent_id = %self.runtime.agent_id(),
                task_id = %task_id,
                "Received status update for untracked or already completed task from {}",
                sender
            ),
            Resolution::Rejected(e) => tracing::warn!(
                agent_id = %self.runtime.agent_id(),
                task_id = %task_id,
                "Discarding status update from {}: {}",
                sender,
                e
            ),
        }
    }

    async fn on_error_report(&self, sender: &str, report: ErrorReport) {
        let Some(task_id) = report.task_id else {
            tracing::warn!(
                agent_id = %self.runtime.agent_id(),
                "Error reported by {}: {}",
                sender,
                report.message
            );
            return;
        };

        let update = StatusUpdate::new(task_id, TaskStatus::Failed).with_error(report.message);
        self.on_status_update(sender, update).await;
    }

    async fn finish_own_task(&self, task: &mut Task) -> Result<(), A2AError> {
        let outcome = match topic_of(task) {
            Some(topic) => {
                let seed = match task.input_artifacts.first() {
                    Some(artifact) if artifact.text().is_some() => artifact.clone(),
                    _ => self.runtime.create_artifact(
                        &task.task_id,
                        "text/plain",
                        json!(topic),
                        Some("Initial blog post topic".to_string()),
                    ),
                };
                self.run_workflow(&task.task_id, &topic, seed)
                    .await
                    .ok_or_else(|| {
                        TaskError::failed(format!(
                            "Blog post workflow for '{}' did not produce a final artifact",
                            topic
                        ))
                    })
            }
            None => Err(TaskError::failed(format!(
                "Orchestrator cannot process task: {}",
                task.description
            ))),
        };

        match outcome {
            Ok(artifact) => {
                self.runtime.add_output_artifact(task, artifact);
                self.runtime.update_task_status(task, TaskStatus::Completed)
            }
            Err(error) => self.runtime.fail_task(task, error),
        }
    }
}

#[async_trait]
impl Agent for Orchestrator {
    fn runtime(&self) -> &AgentRuntime {
        &self.runtime
    }

    /// Runs the whole workflow for a `manage_blog_post_creation` task
    async fn process_task(&self, mut task: Task) {
        tracing::info!(
            agent_id = %self.runtime.agent_id(),
            task_id = %task.task_id,
            "Orchestrator processing its own assigned task: {}",
            task.description
        );

        let finished = match self.runtime.update_task_status(&mut task, TaskStatus::InProgress) {
            Ok(()) => self.finish_own_task(&mut task).await,
            Err(e) => Err(e),
        };
        if let Err(e) = finished {
            tracing::error!(
                agent_id = %self.runtime.agent_id(),
                task_id = %task.task_id,
                "Task could not be processed: {}",
                e
            );
            return;
        }

        if task.initiator_agent_id == self.runtime.agent_id() {
            let sender = self.runtime.agent_id().to_string();
            self.on_status_update(&sender, StatusUpdate::from(&task))
                .await;
        } else {
            self.runtime.send_status_update(&task).await;
        }
    }

    async fn handle_message(&self, message: AgentMessage) {
        let sender = message.sender_agent_id;
        match message.payload {
            MessagePayload::TaskStatusUpdate(update) => self.on_status_update(&sender, update).await,
            MessagePayload::Error(report) => self.on_error_report(&sender, report).await,
            other => tracing::debug!(
                agent_id = %self.runtime.agent_id(),
                "Ignoring {} message from {}",
                other.message_type(),
                sender
            ),
        }
    }
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("agent_id", &self.runtime.agent_id())
            .field("directory", &self.directory)
            .field("config", &self.config)
            .finish()
    }
}
