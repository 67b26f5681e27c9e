//! Outbound message handler slot

use std::sync::{Mutex, PoisonError};

use tower::{util::BoxCloneService, ServiceExt};
use tower_service::Service;

use crate::protocol::{
    error::{A2AError, A2AResult},
    message::AgentMessage,
};

/// Type-erased outbound transport an agent sends every message through
pub type MessageHandler = BoxCloneService<AgentMessage, (), A2AError>;

/// Holds the installed handler; replacing it affects subsequent sends only
#[derive(Default)]
pub(crate) struct HandlerSlot {
    handler: Mutex<Option<MessageHandler>>,
}

impl HandlerSlot {
    pub(crate) fn install<S>(&self, service: S)
    where
        S: Service<AgentMessage, Response = (), Error = A2AError> + Clone + Send + 'static,
        S::Future: Send + 'static,
    {
        let mut slot = self.handler.lock().unwrap_or_else(PoisonError::into_inner);
        *slot = Some(BoxCloneService::new(service));
    }

    pub(crate) fn is_installed(&self) -> bool {
        self.handler
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Clone of the current handler, taken so no lock is held while sending
    pub(crate) fn current(&self) -> Option<MessageHandler> {
        self.handler
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Push a message through the installed handler
    pub(crate) async fn dispatch(&self, agent_id: &str, message: AgentMessage) -> A2AResult<()> {
        let handler = self.current().ok_or_else(|| A2AError::NoMessageHandler {
            agent_id: agent_id.to_string(),
        })?;

        handler.oneshot(message).await
    }
}
