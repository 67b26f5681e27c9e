//! Closure-backed agent for capability providers

use std::future::Future;

use async_trait::async_trait;
use futures::future::{BoxFuture, FutureExt};

use crate::{
    protocol::{error::TaskError, task::Task, Artifact},
    runtime::{Agent, AgentRuntime},
};

type WorkFn = dyn Fn(Task) -> BoxFuture<'static, Result<Vec<Artifact>, TaskError>> + Send + Sync;

/// An agent whose [`perform`](Agent::perform) step is a closure
///
/// The closure receives a snapshot of the in-progress task and returns its outputs. Build
/// artifacts with [`Artifact::new`] using the task id and the worker's agent id.
///
/// ```rust,no_run
/// use a2a_conductor::prelude::*;
/// use serde_json::json;
///
/// let worker = Worker::new(
///     AgentRuntime::new("writer_agent_001", "Writer", "Drafts posts"),
///     |task: Task| async move {
///         let draft = Artifact::new(task.task_id, "writer_agent_001", "text/markdown", json!("# Draft"));
///         Ok::<_, TaskError>(vec![draft])
///     },
/// );
/// worker.runtime().register_capability("write_content", "Writes a draft", None, None);
/// ```
pub struct Worker {
    runtime: AgentRuntime,
    work: Box<WorkFn>,
}

impl Worker {
    /// Create a worker from a runtime and its unit of work
    pub fn new<F, Fut>(runtime: AgentRuntime, work: F) -> Self
    where
        F: Fn(Task) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Vec<Artifact>, TaskError>> + Send + 'static,
    {
        Self {
            runtime,
            work: Box::new(move |task| work(task).boxed()),
        }
    }
}

#[async_trait]
impl Agent for Worker {
    fn runtime(&self) -> &AgentRuntime {
        &self.runtime
    }

    async fn perform(&self, task: &Task) -> Result<Vec<Artifact>, TaskError> {
        (self.work)(task.clone()).await
    }
}

impl std::fmt::Debug for Worker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Worker")
            .field("runtime", &self.runtime)
            .finish_non_exhaustive()
    }
}
