//! Subcommand handlers

use std::path::Path;

use anyhow::{Context, Result};
use studio::{ServiceConfig, TaskManager, TaskState, capability};
use tokio::sync::broadcast::error::RecvError;

use crate::output::OutputHandler;

fn load_config(path: Option<&Path>) -> Result<ServiceConfig> {
    ServiceConfig::load(path).context("Failed to load services configuration")
}

/// Run the pipeline inline and print the terminal task. Exits non-zero when the task failed.
pub async fn run(persona: &str, config_path: Option<&Path>, json: bool) -> Result<()> {
    let config = load_config(config_path)?;
    let manager = TaskManager::with_http_providers(config);
    let output = OutputHandler;

    let progress = if json {
        None
    } else {
        output.print_header(&format!("Generating video for {}", persona.trim()));
        let mut events = manager.subscribe();
        Some(tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => {
                        output.print_event(&event);
                        if event.is_terminal() {
                            break;
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::debug!("Progress stream skipped {} events", skipped);
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        }))
    };

    let task = manager.run(persona).await?;

    if let Some(handle) = progress {
        let _ = handle.await;
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&task)?);
    } else {
        output.print_task_report(&task);
    }

    if let TaskState::Failed { stage, .. } = task.state {
        anyhow::bail!("Task {} failed at stage {}", task.id, stage);
    }
    Ok(())
}

pub fn capabilities(config_path: Option<&Path>) -> Result<()> {
    let config = load_config(config_path)?;
    let output = OutputHandler;

    output.print_header("Capabilities");
    output.print_decisions_table(&capability::resolve_all(&config));

    println!();
    let ffmpeg = config.media.ffmpeg_path.as_deref().unwrap_or("ffmpeg");
    match utils::toolchain::resolve_executable(ffmpeg) {
        Some(path) => output.print_success(&format!("ffmpeg: {}", path.display())),
        None => output.print_warning(&format!(
            "ffmpeg not found on PATH ({}); set media.ffmpeg_path to enable composition",
            ffmpeg
        )),
    }
    output.print_info(&format!(
        "Output directory: {}",
        config.storage.output_path().display()
    ));

    Ok(())
}
