use anyhow::Context;
use grading_engine::config::{get_config, init_config, LogFormat};
use grading_engine::dto::grading_dto::GradingTask;
use grading_engine::GradingEngine;
use serde::Deserialize;
use std::io::Read;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Deserialize)]
struct TaskFile {
    tasks: Vec<GradingTask>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_config()?;
    let config = get_config();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match config.log_format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init(),
        LogFormat::Pretty => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init(),
    }

    let raw = match std::env::args().nth(1) {
        Some(path) => std::fs::read_to_string(&path).with_context(|| format!("Failed to read {}", path))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read tasks from stdin")?;
            buf
        }
    };
    let TaskFile { tasks } = serde_json::from_str(&raw).context("Invalid tasks JSON")?;
    info!(tasks = tasks.len(), "Loaded grading tasks");

    let engine = GradingEngine::new(config);
    let report = engine.batch_auto_grade(tasks).await;

    println!("{}", serde_json::to_string_pretty(&report.summary)?);
    Ok(())
}
