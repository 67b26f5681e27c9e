//! Validation layer for outbound agent messages

use std::{
    future::Future,
    pin::Pin,
    task::{Context, Poll},
};

use tower_layer::Layer;
use tower_service::Service;

use crate::protocol::{
    error::A2AError,
    message::{AgentMessage, MessagePayload},
    task::TaskStatus,
};

/// Layer that rejects inconsistent messages before they reach the router
#[derive(Clone, Debug, Default)]
pub struct MessageValidationLayer;

impl MessageValidationLayer {
    /// Create a new validation layer
    pub fn new() -> Self {
        Self
    }
}

impl<S> Layer<S> for MessageValidationLayer {
    type Service = MessageValidationService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        MessageValidationService { inner }
    }
}

/// Validation service that wraps an inner service
#[derive(Clone, Debug)]
pub struct MessageValidationService<S> {
    inner: S,
}

impl<S> MessageValidationService<S> {
    /// Validate a message envelope and its payload
    fn validate_message(message: &AgentMessage) -> Result<(), A2AError> {
        if message.message_id.is_empty() {
            return Err(A2AError::Validation("Message ID cannot be empty".into()));
        }
        if message.sender_agent_id.is_empty() {
            return Err(A2AError::Validation("Sender agent ID cannot be empty".into()));
        }
        if message.receiver_agent_id.is_empty() {
            return Err(A2AError::Validation(
                "Receiver agent ID cannot be empty".into(),
            ));
        }

        match &message.payload {
            MessagePayload::TaskAssignment(task) => {
                if task.task_id.is_empty() {
                    return Err(A2AError::Validation("Task ID cannot be empty".into()));
                }
                if task.assigned_to_agent_id != message.receiver_agent_id {
                    return Err(A2AError::Validation(format!(
                        "Task {} is assigned to {} but addressed to {}",
                        task.task_id, task.assigned_to_agent_id, message.receiver_agent_id
                    )));
                }
                if task.status != TaskStatus::Pending {
                    return Err(A2AError::Validation(format!(
                        "Task {} must be pending when assigned, found {}",
                        task.task_id, task.status
                    )));
                }
            }
            MessagePayload::TaskStatusUpdate(update) => {
                if update.task_id.is_empty() {
                    return Err(A2AError::Validation("Task ID cannot be empty".into()));
                }
            }
            MessagePayload::QueryCapability(query) => {
                if query.skill_name.is_empty() {
                    return Err(A2AError::Validation("Skill name cannot be empty".into()));
                }
            }
            MessagePayload::Error(report) => {
                if report.message.is_empty() {
                    return Err(A2AError::Validation(
                        "Error message cannot be empty".into(),
                    ));
                }
            }
            MessagePayload::ArtifactDelivery(_) => {}
        }

        Ok(())
    }
}

impl<S> Service<AgentMessage> for MessageValidationService<S>
where
    S: Service<AgentMessage, Response = (), Error = A2AError> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = ();
    type Error = A2AError;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, message: AgentMessage) -> Self::Future {
        if let Err(e) = Self::validate_message(&message) {
            tracing::error!(
                message_id = %message.message_id,
                sender = %message.sender_agent_id,
                "Rejected outbound {} message: {}",
                message.message_type(),
                e
            );
            return Box::pin(async move { Err(e) });
        }

        let mut inner = self.inner.clone();
        Box::pin(async move { inner.call(message).await })
    }
}
