//! Runs the blog post pipeline against simulated workers
//!
//! ```text
//! RUST_LOG=a2a_conductor=debug cargo run --example blog_pipeline -- "Rust async runtimes"
//! ```

use std::{sync::Arc, time::Duration};

use a2a_conductor::prelude::*;
use anyhow::{bail, Context};
use serde_json::json;
use tracing_subscriber::EnvFilter;

fn simulated(
    agent_id: &'static str,
    name: &str,
    skill: &str,
    skill_description: &str,
    render: fn(&str) -> String,
) -> Arc<Worker> {
    let runtime = AgentRuntime::new(agent_id, name, format!("Simulated {}", name));
    runtime.register_capability(
        skill,
        skill_description,
        Some(json!({"type": "object", "properties": {"text": {"type": "string"}}})),
        Some(json!({"type": "string", "contentMediaType": "text/markdown"})),
    );

    Arc::new(Worker::new(runtime, move |task: Task| async move {
        let Some(input) = task
            .input_artifacts
            .first()
            .and_then(Artifact::text)
            .map(str::to_string)
        else {
            return Err(TaskError::failed("Input artifact carries no text"));
        };

        // Stand-in for the model or API call a real worker would make
        tokio::time::sleep(Duration::from_millis(50)).await;

        let output = Artifact::new(task.task_id, agent_id, "text/markdown", json!(render(&input)))
            .with_description(format!("{} output", agent_id));
        Ok::<_, TaskError>(vec![output])
    }))
}

fn research(topic: &str) -> String {
    format!(
        "## Research Summary for: {topic}\n\n\
         - {topic} has seen steady adoption over the last year.\n\
         - Practitioners cite reliability and tooling as the main draws.\n"
    )
}

fn write(research: &str) -> String {
    format!(
        "# Draft\n\nThis post builds on the following notes.\n\n{research}\n\
         ## Conclusion\n\nThe trend is likely to continue.\n"
    )
}

fn optimize(draft: &str) -> String {
    format!("{draft}\n<!-- keywords: guide, best practices, trends -->\n")
}

fn illustrate(post: &str) -> String {
    format!("![Header illustration](https://images.example.com/header.png)\n\n{post}")
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let topic = std::env::args().skip(1).collect::<Vec<_>>().join(" ");
    if topic.trim().is_empty() {
        bail!("usage: blog_pipeline <topic>");
    }

    let orchestrator = Orchestrator::new(
        OrchestratorConfig::default().with_task_timeout(Duration::from_secs(30)),
    );

    let workers = [
        simulated(
            "content_research_agent_001",
            "Content Research Agent",
            "research_topic_web",
            "Performs research on a given topic and returns a summary.",
            research,
        ),
        simulated(
            "writing_agent_001",
            "Writing Agent",
            "write_content",
            "Writes a blog post draft from research notes.",
            write,
        ),
        simulated(
            "seo_agent_001",
            "SEO Agent",
            "optimize_seo",
            "Adds keywords to a draft.",
            optimize,
        ),
        simulated(
            "image_agent_001",
            "Image Agent",
            "find_images_openai",
            "Illustrates a blog post.",
            illustrate,
        ),
    ];
    for worker in workers {
        orchestrator.register_agent(worker);
    }

    match orchestrator.execute_workflow(&topic).await {
        Some(post) => {
            let text = post.text().context("final artifact is not text")?;
            println!("--- Final blog post: {topic} ---\n{text}");
        }
        None => bail!("the pipeline did not produce a blog post for '{topic}'"),
    }

    Ok(())
}
