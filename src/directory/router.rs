//! Router exposed to agents as their outbound transport

use std::{
    future::Future,
    pin::Pin,
    sync::Weak,
    task::{Context, Poll},
};

use tower_service::Service;

use crate::{
    directory::AgentDirectory,
    protocol::{error::A2AError, message::AgentMessage},
};

/// Tower service that delivers each message through an [`AgentDirectory`]
///
/// The router holds the directory weakly so the agents it is installed on do not keep
/// the directory alive. Messages sent after the directory is dropped fail with a
/// transport error; messages to unknown receivers are dropped by the directory and
/// still succeed from the sender's point of view.
#[derive(Clone, Debug)]
pub struct RouterService {
    directory: Weak<AgentDirectory>,
}

impl RouterService {
    /// Create a router delivering through `directory`
    pub fn new(directory: Weak<AgentDirectory>) -> Self {
        Self { directory }
    }
}

impl Service<AgentMessage> for RouterService {
    type Response = ();
    type Error = A2AError;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, message: AgentMessage) -> Self::Future {
        let directory = self.directory.clone();

        Box::pin(async move {
            let directory = directory.upgrade().ok_or_else(|| {
                A2AError::Transport(format!(
                    "Agent directory is gone, cannot deliver message {}",
                    message.message_id
                ))
            })?;

            directory.route(message).await;
            Ok(())
        })
    }
}
