//! # A2A Conductor
//!
//! An agent coordination substrate: agents advertise capabilities in a directory, exchange
//! typed messages through a Tower-based router, and an orchestrator delegates tasks to
//! them and waits for each result under a deadline.
//!
//! ## Features
//!
//! - **Typed Messages**: a closed set of message kinds, decoded once at the boundary
//! - **Task State Machine**: monotonic `pending → in_progress → terminal` lifecycle
//! - **Composable Routing**: the router is a Tower service behind a validation layer
//! - **Delegate and Await**: one-shot result handles with timeouts, never an error
//!
//! ## Example
//!
//! ```rust,no_run
//! use a2a_conductor::prelude::*;
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let orchestrator = Orchestrator::new(OrchestratorConfig::default());
//!
//!     for (id, skill) in [("researcher", "research_topic_web"), ("writer", "write_content")] {
//!         let runtime = AgentRuntime::new(id, id, "simulated worker");
//!         runtime.register_capability(skill, "simulated", None, None);
//!         let worker = Worker::new(runtime, move |task: Task| async move {
//!             Ok::<_, TaskError>(vec![Artifact::new(task.task_id, id, "text/markdown", json!("..."))])
//!         });
//!         orchestrator.register_agent(Arc::new(worker));
//!     }
//!
//!     if let Some(post) = orchestrator.execute_workflow("Structured concurrency").await {
//!         println!("{}", post.data);
//!     }
//! }
//! ```

pub mod codec;
pub mod directory;
pub mod layer;
pub mod orchestrator;
pub mod protocol;
pub mod runtime;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        directory::{AgentDirectory, RouteOutcome},
        orchestrator::{Orchestrator, OrchestratorConfig, WorkflowSkills},
        protocol::error::{A2AError, A2AResult, TaskError},
        protocol::{
            AgentCapability, AgentCard, AgentMessage, Artifact, MessagePayload, MessageType,
            StatusUpdate, Task, TaskStatus,
        },
        runtime::{Agent, AgentRuntime, Worker},
    };
}
