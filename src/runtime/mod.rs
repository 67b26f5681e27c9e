//! Agent runtime: the per-agent state and the default task execution behavior
//!
//! Every agent embeds an [`AgentRuntime`] and implements [`Agent`]. The trait's default
//! methods implement the task state machine; concrete agents usually override only
//! [`Agent::perform`].

mod core;
mod handler;
mod worker;

pub use self::core::AgentRuntime;
pub use handler::MessageHandler;
pub use worker::Worker;

use async_trait::async_trait;

use crate::protocol::{
    error::{A2AResult, TaskError},
    message::{AgentMessage, MessagePayload},
    task::{Task, TaskStatus},
    Artifact,
};

/// An independently addressable unit that executes assigned tasks
#[async_trait]
pub trait Agent: Send + Sync + 'static {
    /// Runtime state backing this agent
    fn runtime(&self) -> &AgentRuntime;

    /// The agent's unique id
    fn agent_id(&self) -> &str {
        self.runtime().agent_id()
    }

    /// Do the actual work for a task that is in progress
    ///
    /// `Ok(outputs)` completes the task with those outputs; `Err` fails or cancels it with
    /// the error's message. A future that never resolves leaves the initiator to time out.
    async fn perform(&self, _task: &Task) -> Result<Vec<Artifact>, TaskError> {
        Ok(Vec::new())
    }

    /// Run an assigned task to a terminal state and report it to the initiator
    async fn process_task(&self, task: Task) {
        execute_task(self, task).await
    }

    /// Entry point for every message routed to this agent
    async fn handle_incoming_message(&self, message: AgentMessage) {
        dispatch_message(self, message).await
    }

    /// Extension point for non-assignment messages
    async fn handle_message(&self, message: AgentMessage) {
        tracing::debug!(
            agent_id = %self.agent_id(),
            message_id = %message.message_id,
            "No handler for {} message from {}",
            message.message_type(),
            message.sender_agent_id
        );
    }
}

/// Default [`Agent::handle_incoming_message`] behavior
///
/// Assignments go to [`Agent::process_task`] exactly once, unless the task is not
/// pending, in which case the message is dropped. Everything else goes to
/// [`Agent::handle_message`].
pub async fn dispatch_message<A: Agent + ?Sized>(agent: &A, message: AgentMessage) {
    tracing::debug!(
        agent_id = %agent.agent_id(),
        message_id = %message.message_id,
        sender = %message.sender_agent_id,
        "Received {} message. Payload: {}",
        message.message_type(),
        message.payload_preview(200)
    );

    match message.payload {
        MessagePayload::TaskAssignment(task) => {
            if task.status != TaskStatus::Pending {
                tracing::error!(
                    agent_id = %agent.agent_id(),
                    message_id = %message.message_id,
                    task_id = %task.task_id,
                    "Dropping task assignment: task is {} instead of pending",
                    task.status
                );
                return;
            }

            tracing::info!(
                agent_id = %agent.agent_id(),
                task_id = %task.task_id,
                "Received task assignment from {}: {}",
                message.sender_agent_id,
                task.description
            );
            agent.process_task(task).await;
        }
        _ => agent.handle_message(message).await,
    }
}

/// Default [`Agent::process_task`] behavior
pub async fn execute_task<A: Agent + ?Sized>(agent: &A, mut task: Task) {
    tracing::info!(
        agent_id = %agent.agent_id(),
        task_id = %task.task_id,
        "Processing task: {}",
        task.description
    );

    if let Err(e) = run_to_completion(agent, &mut task).await {
        tracing::error!(
            agent_id = %agent.agent_id(),
            task_id = %task.task_id,
            "Task could not be processed: {}",
            e
        );
        return;
    }

    agent.runtime().send_status_update(&task).await;
}

async fn run_to_completion<A: Agent + ?Sized>(agent: &A, task: &mut Task) -> A2AResult<()> {
    let runtime = agent.runtime();

    if task.input_artifacts.is_empty() {
        let reason = format!("Task {} has no input artifacts", task.task_id);
        return runtime.fail_task(task, TaskError::Failed(reason));
    }

    runtime.update_task_status(task, TaskStatus::InProgress)?;

    match agent.perform(task).await {
        Ok(outputs) => {
            for artifact in outputs {
                runtime.add_output_artifact(task, artifact);
            }
            runtime.update_task_status(task, TaskStatus::Completed)
        }
        Err(error) => runtime.fail_task(task, error),
    }
}
