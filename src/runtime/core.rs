//! Per-agent runtime state: card, outbound transport, and task bookkeeping

use std::{
    collections::HashMap,
    sync::{Mutex, PoisonError, RwLock},
};

use chrono::{DateTime, Utc};
use serde_json::Value;
use tower_service::Service;
use uuid::Uuid;

use crate::{
    protocol::{
        agent::{AgentCapability, AgentCard},
        error::{A2AError, A2AResult, TaskError},
        message::{AgentMessage, MessagePayload},
        task::{StatusUpdate, Task, TaskStatus},
        Artifact,
    },
    runtime::handler::{HandlerSlot, MessageHandler},
};

/// State shared by every agent implementation
///
/// The runtime owns the agent's card, the handler used for all outbound messages, and the
/// record of status updates already reported. Task factories here are pure: they stamp
/// ids and timestamps and never touch the transport.
pub struct AgentRuntime {
    agent_id: String,
    card: RwLock<AgentCard>,
    handler: HandlerSlot,
    reported: Mutex<HashMap<String, Option<DateTime<Utc>>>>,
}

impl AgentRuntime {
    /// Create a runtime with an empty capability list
    pub fn new(
        agent_id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        let agent_id = agent_id.into();
        let card = AgentCard::new(agent_id.clone(), name, description);
        tracing::info!(agent_id = %agent_id, name = %card.name, "Agent initialized");

        Self {
            agent_id,
            card: RwLock::new(card),
            handler: HandlerSlot::default(),
            reported: Mutex::new(HashMap::new()),
        }
    }

    /// Set the version advertised on the card
    pub fn with_version(self, version: impl Into<String>) -> Self {
        self.card
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .version = version.into();
        self
    }

    /// The agent's unique id
    pub fn agent_id(&self) -> &str {
        &self.agent_id
    }

    /// Snapshot of the agent card
    pub fn card(&self) -> AgentCard {
        self.card
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Display name from the card
    pub fn name(&self) -> String {
        self.card
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .name
            .clone()
    }

    /// Whether the card lists the given skill
    pub fn offers(&self, skill_name: &str) -> bool {
        self.card
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .offers(skill_name)
    }

    /// Append a capability to the card
    ///
    /// Duplicate skill names are kept; lookups return the first one.
    pub fn register_capability(
        &self,
        skill_name: impl Into<String>,
        description: impl Into<String>,
        input_schema: Option<Value>,
        output_schema: Option<Value>,
    ) {
        let capability = AgentCapability {
            skill_name: skill_name.into(),
            description: description.into(),
            input_schema,
            output_schema,
        };
        tracing::debug!(
            agent_id = %self.agent_id,
            skill = %capability.skill_name,
            "Registered capability"
        );

        self.card
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .capabilities
            .push(capability);
    }

    /// Install the transport used by [`send_message`](Self::send_message)
    pub fn set_message_handler<S>(&self, service: S)
    where
        S: Service<AgentMessage, Response = (), Error = A2AError> + Clone + Send + 'static,
        S::Future: Send + 'static,
    {
        self.handler.install(service);
        tracing::info!(agent_id = %self.agent_id, "Message handler set");
    }

    /// Whether a transport is installed
    pub fn has_message_handler(&self) -> bool {
        self.handler.is_installed()
    }

    /// Clone of the installed transport, for sends that outlive the caller
    pub fn message_handler(&self) -> Option<MessageHandler> {
        self.handler.current()
    }

    /// Build a message from this agent
    pub fn new_message(
        &self,
        receiver_agent_id: impl Into<String>,
        payload: MessagePayload,
    ) -> AgentMessage {
        AgentMessage::new(self.agent_id.clone(), receiver_agent_id, payload)
    }

    /// Send a message through the installed handler
    pub async fn send_message(
        &self,
        receiver_agent_id: impl Into<String>,
        payload: MessagePayload,
    ) -> A2AResult<()> {
        let message = self.new_message(receiver_agent_id, payload);
        tracing::debug!(
            agent_id = %self.agent_id,
            message_id = %message.message_id,
            receiver = %message.receiver_agent_id,
            "Sending {} message. Payload: {}",
            message.message_type(),
            message.payload_preview(200)
        );

        self.handler.dispatch(&self.agent_id, message).await
    }

    /// Create a pending task
    pub fn create_task(
        &self,
        description: impl Into<String>,
        initiator_agent_id: impl Into<String>,
        assigned_to_agent_id: impl Into<String>,
    ) -> Task {
        let task = Task::new(
            Uuid::now_v7().to_string(),
            description,
            initiator_agent_id,
            assigned_to_agent_id,
        );
        tracing::debug!(
            agent_id = %self.agent_id,
            task_id = %task.task_id,
            "Created task: {}",
            task.description
        );
        task
    }

    /// Create an artifact credited to this agent
    pub fn create_artifact(
        &self,
        task_id: impl Into<String>,
        content_type: impl Into<String>,
        data: Value,
        description: Option<String>,
    ) -> Artifact {
        let mut artifact = Artifact::new(task_id, self.agent_id.clone(), content_type, data);
        artifact.description = description;
        tracing::debug!(
            agent_id = %self.agent_id,
            artifact_id = %artifact.artifact_id,
            task_id = %artifact.task_id,
            content_type = %artifact.content_type,
            "Created artifact"
        );
        artifact
    }

    /// Move a task to a new status
    pub fn update_task_status(&self, task: &mut Task, status: TaskStatus) -> A2AResult<()> {
        task.transition(status)?;
        tracing::info!(
            agent_id = %self.agent_id,
            task_id = %task.task_id,
            "Task status updated to {}",
            status
        );
        Ok(())
    }

    /// End a task with a worker-reported error
    pub fn fail_task(&self, task: &mut Task, error: TaskError) -> A2AResult<()> {
        task.fail(error.status(), error.message())?;
        tracing::warn!(
            agent_id = %self.agent_id,
            task_id = %task.task_id,
            "Task ended as {}: {}",
            task.status,
            error
        );
        Ok(())
    }

    /// Attach an output artifact to a task
    pub fn add_output_artifact(&self, task: &mut Task, artifact: Artifact) {
        tracing::debug!(
            agent_id = %self.agent_id,
            task_id = %task.task_id,
            artifact_id = %artifact.artifact_id,
            "Added output artifact"
        );
        task.push_output(artifact);
    }

    /// Report the task's current state to its initiator
    ///
    /// Nothing is sent for self-initiated tasks, or when this exact status change
    /// (`task_id`, `status_updated_at`) has already been reported. A task is forgotten
    /// once its terminal status is sent. Send failures are logged, not returned.
    pub async fn send_status_update(&self, task: &Task) {
        if task.initiator_agent_id == self.agent_id {
            tracing::info!(
                agent_id = %self.agent_id,
                task_id = %task.task_id,
                "Task was initiated by self. No status message sent"
            );
            return;
        }

        let stamp = task.status_updated_at;
        {
            let mut reported = self.reported.lock().unwrap_or_else(PoisonError::into_inner);
            if reported.insert(task.task_id.clone(), stamp) == Some(stamp) {
                tracing::debug!(
                    agent_id = %self.agent_id,
                    task_id = %task.task_id,
                    "Status already reported, skipping duplicate"
                );
                return;
            }
        }

        let payload = MessagePayload::TaskStatusUpdate(StatusUpdate::from(task));
        match self
            .send_message(task.initiator_agent_id.clone(), payload)
            .await
        {
            Ok(()) => {
                if task.is_terminal() {
                    self.reported
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner)
                        .remove(&task.task_id);
                }
                tracing::debug!(
                    agent_id = %self.agent_id,
                    task_id = %task.task_id,
                    initiator = %task.initiator_agent_id,
                    "Sent task_status_update"
                );
            }
            Err(e) => {
                self.reported
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .remove(&task.task_id);
                tracing::error!(
                    agent_id = %self.agent_id,
                    task_id = %task.task_id,
                    "Failed to send status update to {}: {}",
                    task.initiator_agent_id,
                    e
                );
            }
        }
    }
}

impl std::fmt::Debug for AgentRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentRuntime")
            .field("agent_id", &self.agent_id)
            .field("name", &self.name())
            .finish()
    }
}
