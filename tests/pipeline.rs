//! End-to-end delegation and workflow tests
//!
//! Workers are simulated with closures that complete, fail, cancel or never answer.

use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use a2a_conductor::{directory::RouteOutcome, prelude::*};
use serde_json::json;

const ORCHESTRATOR: &str = "orchestrator_agent_001";

fn orchestrator() -> Arc<Orchestrator> {
    Orchestrator::new(OrchestratorConfig::default().with_task_timeout(Duration::from_secs(10)))
}

fn topic_input() -> Vec<Artifact> {
    vec![Artifact::new("root", ORCHESTRATOR, "text/plain", json!("topic X"))]
}

/// Worker that records every task it performs and returns its scripted outcome
struct Scripted {
    worker: Arc<Worker>,
    seen: Arc<Mutex<Vec<Task>>>,
}

impl Scripted {
    fn calls(&self) -> usize {
        self.seen.lock().unwrap().len()
    }
}

fn scripted(
    agent_id: &'static str,
    skill: &str,
    outcome: Result<&'static str, TaskError>,
) -> Scripted {
    let runtime = AgentRuntime::new(agent_id, agent_id, "scripted worker");
    runtime.register_capability(skill, "scripted", None, None);

    let seen = Arc::new(Mutex::new(Vec::new()));
    let log = seen.clone();
    let worker = Worker::new(runtime, move |task: Task| {
        log.lock().unwrap().push(task.clone());
        let outcome = outcome.clone();
        async move {
            let data = outcome?;
            Ok::<_, TaskError>(vec![Artifact::new(
                task.task_id,
                agent_id,
                "text/markdown",
                json!(data),
            )])
        }
    });

    Scripted {
        worker: Arc::new(worker),
        seen,
    }
}

fn silent(agent_id: &'static str, skill: &str) -> Arc<Worker> {
    let runtime = AgentRuntime::new(agent_id, agent_id, "never answers");
    runtime.register_capability(skill, "silent", None, None);
    Arc::new(Worker::new(runtime, |_task: Task| {
        std::future::pending::<Result<Vec<Artifact>, TaskError>>()
    }))
}

#[tokio::test]
async fn test_completed_update_completes_task() {
    let orchestrator = orchestrator();
    let research = scripted("research", "research_topic_web", Ok("R"));
    orchestrator.register_agent(research.worker.clone());

    let task = orchestrator
        .assign_task_and_wait(&*research.worker, "Research", topic_input(), None)
        .await;

    assert_eq!(task.status, TaskStatus::Completed);
    assert_eq!(task.primary_output().unwrap().data, json!("R"));
    assert_eq!(task.primary_output().unwrap().content_type, "text/markdown");
    assert_eq!(research.calls(), 1);
    assert_eq!(orchestrator.in_flight_count().await, 0);
    assert_eq!(orchestrator.pending_count().await, 0);
}

#[tokio::test]
async fn test_worker_failure_surfaces_verbatim() {
    let orchestrator = orchestrator();
    let writer = scripted(
        "writer",
        "write_content",
        Err(TaskError::failed("model returned an empty draft")),
    );
    let seo = scripted("seo", "optimize_seo", Err(TaskError::cancelled("quota exhausted")));
    orchestrator.register_agent(writer.worker.clone());
    orchestrator.register_agent(seo.worker.clone());

    let failed = orchestrator
        .assign_task_and_wait(&*writer.worker, "Write", topic_input(), None)
        .await;
    assert_eq!(failed.status, TaskStatus::Failed);
    assert_eq!(
        failed.error_message.as_deref(),
        Some("model returned an empty draft")
    );

    let cancelled = orchestrator
        .assign_task_and_wait(&*seo.worker, "Optimize", topic_input(), None)
        .await;
    assert_eq!(cancelled.status, TaskStatus::Cancelled);
    assert_eq!(cancelled.error_message.as_deref(), Some("quota exhausted"));
}

#[tokio::test]
async fn test_task_without_inputs_fails_at_worker() {
    let orchestrator = orchestrator();
    let writer = scripted("writer", "write_content", Ok("D"));
    orchestrator.register_agent(writer.worker.clone());

    let task = orchestrator
        .assign_task_and_wait(&*writer.worker, "Write", Vec::new(), None)
        .await;

    assert_eq!(task.status, TaskStatus::Failed);
    assert!(task.error_message.unwrap().contains("no input artifacts"));
    assert_eq!(writer.calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_silent_worker_times_out() {
    let orchestrator = orchestrator();
    let worker = silent("silent", "research_topic_web");
    orchestrator.register_agent(worker.clone());

    let started = tokio::time::Instant::now();
    let task = orchestrator
        .assign_task_and_wait(
            &*worker,
            "Research",
            topic_input(),
            Some(Duration::from_secs(3)),
        )
        .await;
    let elapsed = started.elapsed();

    assert_eq!(task.status, TaskStatus::Failed);
    assert_eq!(
        task.error_message.as_deref(),
        Some(format!("Task {} timed out after 3s waiting for agent silent", task.task_id).as_str())
    );
    assert!(elapsed >= Duration::from_secs(3));
    assert!(elapsed < Duration::from_secs(4));
    assert_eq!(orchestrator.in_flight_count().await, 0);
    assert_eq!(orchestrator.pending_count().await, 0);
}

#[tokio::test(start_paused = true)]
async fn test_default_timeout_from_config() {
    let orchestrator = orchestrator();
    let worker = silent("silent", "research_topic_web");
    orchestrator.register_agent(worker.clone());

    let started = tokio::time::Instant::now();
    let task = orchestrator
        .assign_task_and_wait(&*worker, "Research", topic_input(), None)
        .await;

    assert_eq!(task.status, TaskStatus::Failed);
    assert!(task.error_message.unwrap().contains("timed out after 10s"));
    assert!(started.elapsed() >= Duration::from_secs(10));
}

#[tokio::test(start_paused = true)]
async fn test_late_update_after_timeout_is_discarded() {
    let orchestrator = orchestrator();
    let worker = silent("silent", "research_topic_web");
    orchestrator.register_agent(worker.clone());

    let task = orchestrator
        .assign_task_and_wait(
            &*worker,
            "Research",
            topic_input(),
            Some(Duration::from_secs(1)),
        )
        .await;
    assert_eq!(task.status, TaskStatus::Failed);

    let late = AgentMessage::new(
        "silent",
        ORCHESTRATOR,
        MessagePayload::TaskStatusUpdate(StatusUpdate::new(&task.task_id, TaskStatus::Completed)),
    );
    let outcome = orchestrator.directory().route(late).await;

    assert_eq!(outcome, RouteOutcome::Local);
    assert_eq!(orchestrator.in_flight_count().await, 0);
    assert_eq!(orchestrator.pending_count().await, 0);
}

#[tokio::test]
async fn test_concurrent_delegations() {
    let orchestrator = orchestrator();
    let research = scripted("research", "research_topic_web", Ok("R"));
    let writer = scripted("writer", "write_content", Ok("D"));
    orchestrator.register_agent(research.worker.clone());
    orchestrator.register_agent(writer.worker.clone());

    let (a, b) = tokio::join!(
        orchestrator.assign_task_and_wait(&*research.worker, "Research", topic_input(), None),
        orchestrator.assign_task_and_wait(&*writer.worker, "Write", topic_input(), None),
    );

    assert_eq!(a.status, TaskStatus::Completed);
    assert_eq!(b.status, TaskStatus::Completed);
    assert_eq!(a.primary_output().unwrap().data, json!("R"));
    assert_eq!(b.primary_output().unwrap().data, json!("D"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_assignments_to_one_worker_arrive_in_order() {
    let orchestrator = orchestrator();
    let writer = scripted("writer", "write_content", Ok("D"));
    orchestrator.register_agent(writer.worker.clone());

    let descriptions: Vec<String> = (0..16).map(|i| format!("Draft {}", i)).collect();
    let results = futures::future::join_all(descriptions.iter().map(|description| {
        orchestrator.assign_task_and_wait(
            &*writer.worker,
            description.clone(),
            topic_input(),
            None,
        )
    }))
    .await;

    assert!(results.iter().all(|task| task.status == TaskStatus::Completed));
    let arrived: Vec<String> = writer
        .seen
        .lock()
        .unwrap()
        .iter()
        .map(|task| task.description.clone())
        .collect();
    assert_eq!(arrived, descriptions);
}

#[tokio::test]
async fn test_workflow_returns_writer_draft() {
    let orchestrator = orchestrator();
    let research = scripted("research", "research_topic_web", Ok("R"));
    let writer = scripted("writer", "write_content", Ok("D"));
    orchestrator.register_agent(research.worker.clone());
    orchestrator.register_agent(writer.worker.clone());

    let artifact = orchestrator.execute_workflow("topic X").await.unwrap();

    assert_eq!(artifact.data, json!("D"));
    assert_eq!(artifact.creator_agent_id, "writer");

    let research_task = research.seen.lock().unwrap()[0].clone();
    let writer_task = writer.seen.lock().unwrap()[0].clone();
    assert_eq!(research_task.input_artifacts[0].data, json!("topic X"));
    assert_eq!(research_task.input_artifacts[0].content_type, "text/plain");
    assert_eq!(writer_task.input_artifacts[0].data, json!("R"));

    let root = research_task.parent_task_id.clone().unwrap();
    assert_eq!(writer_task.parent_task_id.as_deref(), Some(root.as_str()));
    assert_eq!(research_task.input_artifacts[0].task_id, root);
}

#[tokio::test]
async fn test_failed_writer_stops_workflow() {
    let orchestrator = orchestrator();
    let research = scripted("research", "research_topic_web", Ok("R"));
    let writer = scripted("writer", "write_content", Err(TaskError::failed("no draft")));
    let seo = scripted("seo", "optimize_seo", Ok("S"));
    let image = scripted("image", "find_images_openai", Ok("I"));
    for agent in [&research, &writer, &seo, &image] {
        orchestrator.register_agent(agent.worker.clone());
    }

    assert!(orchestrator.execute_workflow("topic X").await.is_none());

    assert_eq!(research.calls(), 1);
    assert_eq!(writer.calls(), 1);
    assert_eq!(seo.calls(), 0);
    assert_eq!(image.calls(), 0);
}

#[tokio::test]
async fn test_missing_research_provider_sends_nothing() {
    let orchestrator = orchestrator();
    let writer = scripted("writer", "write_content", Ok("D"));
    orchestrator.register_agent(writer.worker.clone());

    assert!(orchestrator.execute_workflow("topic X").await.is_none());

    assert_eq!(writer.calls(), 0);
    assert_eq!(orchestrator.in_flight_count().await, 0);
}

#[tokio::test]
async fn test_failed_seo_passes_draft_through() {
    let orchestrator = orchestrator();
    let research = scripted("research", "research_topic_web", Ok("R"));
    let writer = scripted("writer", "write_content", Ok("D"));
    let seo = scripted("seo", "optimize_seo", Err(TaskError::failed("keyword API down")));
    for agent in [&research, &writer, &seo] {
        orchestrator.register_agent(agent.worker.clone());
    }

    let artifact = orchestrator.execute_workflow("topic X").await.unwrap();

    assert_eq!(artifact.data, json!("D"));
    assert_eq!(artifact.creator_agent_id, "writer");
    assert_eq!(seo.calls(), 1);
}

#[tokio::test]
async fn test_full_pipeline_chains_artifacts() {
    let orchestrator = orchestrator();
    let research = scripted("research", "research_topic_web", Ok("R"));
    let writer = scripted("writer", "write_content", Ok("D"));
    let seo = scripted("seo", "optimize_seo", Ok("S"));
    let image = scripted("image", "find_images_openai", Ok("I"));
    for agent in [&research, &writer, &seo, &image] {
        orchestrator.register_agent(agent.worker.clone());
    }

    let artifact = orchestrator.execute_workflow("topic X").await.unwrap();

    assert_eq!(artifact.data, json!("I"));
    assert_eq!(seo.seen.lock().unwrap()[0].input_artifacts[0].data, json!("D"));
    assert_eq!(image.seen.lock().unwrap()[0].input_artifacts[0].data, json!("S"));
}

#[tokio::test(start_paused = true)]
async fn test_silent_optional_step_times_out_and_passes_through() {
    let orchestrator = Orchestrator::new(
        OrchestratorConfig::default().with_task_timeout(Duration::from_secs(2)),
    );
    let research = scripted("research", "research_topic_web", Ok("R"));
    let writer = scripted("writer", "write_content", Ok("D"));
    orchestrator.register_agent(research.worker.clone());
    orchestrator.register_agent(writer.worker.clone());
    orchestrator.register_agent(silent("image", "find_images_openai"));

    let artifact = orchestrator.execute_workflow("topic X").await.unwrap();

    assert_eq!(artifact.data, json!("D"));
    assert_eq!(orchestrator.in_flight_count().await, 0);
}

#[tokio::test]
async fn test_first_registered_provider_is_used() {
    let orchestrator = orchestrator();
    let first = scripted("research-a", "research_topic_web", Ok("A"));
    let second = scripted("research-b", "research_topic_web", Ok("B"));
    let writer = scripted("writer", "write_content", Ok("D"));
    for agent in [&first, &second, &writer] {
        orchestrator.register_agent(agent.worker.clone());
    }

    orchestrator.execute_workflow("topic X").await.unwrap();

    assert_eq!(first.calls(), 1);
    assert_eq!(second.calls(), 0);
    assert_eq!(writer.seen.lock().unwrap()[0].input_artifacts[0].data, json!("A"));
}

#[tokio::test]
async fn test_reregistration_keeps_original() {
    let orchestrator = orchestrator();
    let original = scripted("writer", "write_content", Ok("D"));
    let impostor = scripted("writer", "optimize_seo", Ok("X"));

    assert!(orchestrator.register_agent(original.worker.clone()));
    assert!(!orchestrator.register_agent(impostor.worker.clone()));

    assert_eq!(orchestrator.discover("write_content").len(), 1);
    assert!(orchestrator.discover("optimize_seo").is_empty());
    assert!(orchestrator.discover("unknown_skill").is_empty());
}

#[tokio::test]
async fn test_malformed_assignment_frame_never_processed() {
    let orchestrator = orchestrator();
    let counter = Arc::new(AtomicUsize::new(0));
    let count = counter.clone();
    let runtime = AgentRuntime::new("writer", "Writer", "");
    runtime.register_capability("write_content", "", None, None);
    orchestrator.register_agent(Arc::new(Worker::new(runtime, move |_task: Task| {
        count.fetch_add(1, Ordering::SeqCst);
        async { Ok::<_, TaskError>(Vec::new()) }
    })));

    let frame = json!({
        "message_id": "m-1",
        "sender_agent_id": ORCHESTRATOR,
        "receiver_agent_id": "writer",
        "timestamp": "2024-01-01T00:00:00Z",
        "message_type": "task_assignment",
        "payload": {"task_id": 42, "description": ["not", "a", "task"]}
    })
    .to_string();

    let outcome = orchestrator.directory().route_frame(frame.as_bytes()).await;

    assert_eq!(outcome, RouteOutcome::Dropped);
    assert_eq!(counter.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_orchestrator_runs_assigned_blog_post_task() {
    let orchestrator = orchestrator();
    let research = scripted("research", "research_topic_web", Ok("R"));
    let writer = scripted("writer", "write_content", Ok("D"));
    orchestrator.register_agent(research.worker.clone());
    orchestrator.register_agent(writer.worker.clone());

    let requester = scripted("requester", "nothing", Ok(""));
    orchestrator.register_agent(requester.worker.clone());

    let task = requester.worker.runtime().create_task(
        "Create a blog post on topic: topic X",
        "requester",
        ORCHESTRATOR,
    );
    let task_id = task.task_id.clone();

    let outcome = orchestrator
        .directory()
        .route(AgentMessage::new(
            "requester",
            ORCHESTRATOR,
            MessagePayload::TaskAssignment(task),
        ))
        .await;

    assert_eq!(outcome, RouteOutcome::Local);
    assert_eq!(research.calls(), 1);
    assert_eq!(writer.calls(), 1);
    let research_task = research.seen.lock().unwrap()[0].clone();
    assert_eq!(research_task.parent_task_id.as_deref(), Some(task_id.as_str()));
    assert_eq!(research_task.input_artifacts[0].data, json!("topic X"));
}
