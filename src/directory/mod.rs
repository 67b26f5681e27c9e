//! Agent directory: id and capability lookup plus message routing

mod router;

pub use router::RouterService;

use std::{
    collections::HashMap,
    fmt,
    sync::{Arc, PoisonError, RwLock, Weak},
};

use tower::ServiceBuilder;

use crate::{
    codec::{Codec, JsonCodec},
    layer::{MessageValidationLayer, MessageValidationService},
    protocol::message::AgentMessage,
    runtime::Agent,
};

/// What happened to a routed message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteOutcome {
    /// Delivered to the directory's owner
    Local,

    /// Delivered to a registered agent
    Forwarded,

    /// Receiver unknown or frame undecodable; nothing was delivered
    Dropped,
}

/// Service stack installed as the message handler of every registered agent
pub type DirectoryTransport = MessageValidationService<RouterService>;

struct Owner {
    agent_id: String,
    agent: Weak<dyn Agent>,
}

#[derive(Default)]
struct Registry {
    order: Vec<Arc<dyn Agent>>,
    by_id: HashMap<String, Arc<dyn Agent>>,
}

/// Registry of agents reachable through one router
///
/// Agents are kept in registration order, which is the order [`discover`] returns them
/// in. An optional owner (normally the orchestrator) receives messages addressed to its
/// id without being part of the registry.
///
/// [`discover`]: AgentDirectory::discover
pub struct AgentDirectory {
    owner: Option<Owner>,
    registry: RwLock<Registry>,
    codec: Arc<dyn Codec>,
}

impl AgentDirectory {
    /// Create a directory without an owner
    pub fn new() -> Self {
        Self {
            owner: None,
            registry: RwLock::new(Registry::default()),
            codec: Arc::new(JsonCodec::new()),
        }
    }

    /// Create a directory that delivers messages for `owner_id` to `owner`
    pub fn with_owner(owner_id: impl Into<String>, owner: Weak<dyn Agent>) -> Self {
        Self {
            owner: Some(Owner {
                agent_id: owner_id.into(),
                agent: owner,
            }),
            ..Self::new()
        }
    }

    /// Replace the codec used by [`route_frame`](Self::route_frame)
    pub fn with_codec(mut self, codec: Arc<dyn Codec>) -> Self {
        self.codec = codec;
        self
    }

    /// Build the validated router handle for agents of this directory
    pub fn transport(self: &Arc<Self>) -> DirectoryTransport {
        ServiceBuilder::new()
            .layer(MessageValidationLayer::new())
            .service(RouterService::new(Arc::downgrade(self)))
    }

    /// Register an agent and install this directory's router as its message handler
    ///
    /// Returns `false` without touching the existing entry when the id is already taken.
    pub fn register(self: &Arc<Self>, agent: Arc<dyn Agent>) -> bool {
        let agent_id = agent.agent_id().to_string();

        if self.is_owner(&agent_id) {
            tracing::warn!(agent_id = %agent_id, "Agent id belongs to the directory owner");
            return false;
        }

        {
            let mut registry = self.registry.write().unwrap_or_else(PoisonError::into_inner);
            if registry.by_id.contains_key(&agent_id) {
                tracing::warn!(agent_id = %agent_id, "Agent already registered");
                return false;
            }
            registry.by_id.insert(agent_id.clone(), agent.clone());
            registry.order.push(agent.clone());
        }

        agent.runtime().set_message_handler(self.transport());
        tracing::info!(
            agent_id = %agent_id,
            name = %agent.runtime().name(),
            "Registered agent"
        );
        true
    }

    /// Agents offering `skill_name`, in registration order
    pub fn discover(&self, skill_name: &str) -> Vec<Arc<dyn Agent>> {
        let found: Vec<Arc<dyn Agent>> = self
            .registry
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .order
            .iter()
            .filter(|agent| agent.runtime().offers(skill_name))
            .cloned()
            .collect();

        if found.is_empty() {
            tracing::warn!(skill = %skill_name, "No agents found with capability");
        } else {
            tracing::debug!(
                skill = %skill_name,
                count = found.len(),
                "Discovered agents with capability"
            );
        }
        found
    }

    /// Look up a registered agent by id
    pub fn agent(&self, agent_id: &str) -> Option<Arc<dyn Agent>> {
        self.registry
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .by_id
            .get(agent_id)
            .cloned()
    }

    /// Registered agent ids in registration order
    pub fn agent_ids(&self) -> Vec<String> {
        self.registry
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .order
            .iter()
            .map(|agent| agent.agent_id().to_string())
            .collect()
    }

    /// Number of registered agents, not counting the owner
    pub fn len(&self) -> usize {
        self.registry
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .order
            .len()
    }

    /// Whether no agent is registered
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether a message addressed to `agent_id` has somewhere to go
    pub fn can_route(&self, agent_id: &str) -> bool {
        self.is_owner(agent_id)
            || self
                .registry
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .by_id
                .contains_key(agent_id)
    }

    fn is_owner(&self, agent_id: &str) -> bool {
        self.owner
            .as_ref()
            .is_some_and(|owner| owner.agent_id == agent_id)
    }

    /// Deliver a message to its receiver and wait for the receiver to handle it
    pub async fn route(&self, message: AgentMessage) -> RouteOutcome {
        tracing::debug!(
            message_id = %message.message_id,
            sender = %message.sender_agent_id,
            receiver = %message.receiver_agent_id,
            "Routing {} message",
            message.message_type()
        );

        if let Some(owner) = self
            .owner
            .as_ref()
            .filter(|owner| owner.agent_id == message.receiver_agent_id)
        {
            return match owner.agent.upgrade() {
                Some(agent) => {
                    agent.handle_incoming_message(message).await;
                    RouteOutcome::Local
                }
                None => {
                    tracing::warn!(
                        message_id = %message.message_id,
                        receiver = %message.receiver_agent_id,
                        "Directory owner is gone, dropping message"
                    );
                    RouteOutcome::Dropped
                }
            };
        }

        match self.agent(&message.receiver_agent_id) {
            Some(agent) => {
                agent.handle_incoming_message(message).await;
                RouteOutcome::Forwarded
            }
            None => {
                tracing::error!(
                    message_id = %message.message_id,
                    sender = %message.sender_agent_id,
                    "Cannot route {} message: receiver {} not found",
                    message.message_type(),
                    message.receiver_agent_id
                );
                RouteOutcome::Dropped
            }
        }
    }

    /// Decode a raw frame with the directory's codec and route it
    ///
    /// Frames that fail to decode are logged and dropped.
    pub async fn route_frame(&self, frame: &[u8]) -> RouteOutcome {
        match self.codec.decode_message(frame) {
            Ok(message) => self.route(message).await,
            Err(e) => {
                tracing::error!(
                    frame_len = frame.len(),
                    "Dropping malformed message frame: {}",
                    e
                );
                RouteOutcome::Dropped
            }
        }
    }
}

impl Default for AgentDirectory {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for AgentDirectory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgentDirectory")
            .field("owner", &self.owner.as_ref().map(|o| o.agent_id.as_str()))
            .field("agents", &self.agent_ids())
            .finish()
    }
}
