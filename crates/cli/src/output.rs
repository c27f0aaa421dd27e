//! Terminal rendering for pipeline runs

use colored::{ColoredString, Colorize};
use studio::{CapabilityDecision, Mode, Task, TaskEvent, TaskState};

/// Shorten `text` to at most `max` characters, marking the cut with `...`.
fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let kept: String = text.chars().take(max.saturating_sub(3)).collect();
    format!("{}...", kept)
}

fn mode_label(mode: Mode) -> ColoredString {
    match mode {
        Mode::Production => "production".bright_green(),
        Mode::Dummy => "dummy".bright_yellow(),
    }
}

fn providers_column(decision: &CapabilityDecision) -> String {
    if decision.providers.is_empty() {
        return "-".to_string();
    }
    decision
        .providers
        .iter()
        .map(|p| p.name())
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Clone, Copy)]
pub struct OutputHandler;

impl OutputHandler {
    pub fn print_header(&self, text: &str) {
        println!();
        println!("{}", format!("▶ {}", text).bright_yellow().bold());
        println!("{}", "─".repeat(60).dimmed());
    }

    pub fn print_success(&self, text: &str) {
        println!("{} {}", "✓".bright_green(), text.bright_white());
    }

    pub fn print_error(&self, text: &str) {
        println!("{} {}", "✗".bright_red(), text.bright_red());
    }

    pub fn print_warning(&self, text: &str) {
        println!("{} {}", "⚠".bright_yellow(), text.yellow());
    }

    pub fn print_info(&self, text: &str) {
        println!("{} {}", "ℹ".bright_blue(), text);
    }

    pub fn print_decisions_table(&self, decisions: &[CapabilityDecision]) {
        println!(
            "{}",
            format!("{:<14} {:<12} {:<28} {}", "Stage", "Mode", "Providers", "Missing")
                .bright_white()
                .bold()
        );
        println!("{}", "─".repeat(80).dimmed());

        for decision in decisions {
            let mut missing = decision.missing_keys.join(", ");
            if let Some(unknown) = &decision.unknown_provider {
                missing = format!("unknown provider '{}'", unknown);
            }
            println!(
                "{:<14} {:<12} {:<28} {}",
                decision.stage.name().bright_white(),
                mode_label(decision.mode),
                truncate(&providers_column(decision), 28),
                missing.dimmed()
            );
        }
    }

    /// One line per orchestrator event; creation is left to the caller.
    pub fn print_event(&self, event: &TaskEvent) {
        match event {
            TaskEvent::TaskCreated { .. } => {}
            TaskEvent::StageStarted {
                stage, decision, ..
            } => {
                println!(
                    "  {} [{}/6] {} ({})",
                    "…".dimmed(),
                    stage.index(),
                    stage.name(),
                    mode_label(decision.mode)
                );
            }
            TaskEvent::StageCompleted { stage, .. } => {
                println!("  {} {}", "✓".bright_green(), stage.name());
            }
            TaskEvent::StageFailed { stage, error, .. } => {
                println!(
                    "  {} {} {}",
                    "✗".bright_red(),
                    stage.name(),
                    format!("[{}] {}", error.kind, truncate(&error.message, 120)).red()
                );
            }
            TaskEvent::TaskCompleted { .. } | TaskEvent::TaskFailed { .. } => {}
        }
    }

    pub fn print_task_report(&self, task: &Task) {
        self.print_header(&format!("Task {}", task.id));
        println!("  {} {}", "Persona:".dimmed(), task.context.persona);

        match &task.state {
            TaskState::Completed {
                execution_time_ms, ..
            } => {
                let seconds = *execution_time_ms as f64 / 1000.0;
                self.print_success(&format!("Completed in {:.1}s", seconds));
            }
            TaskState::Failed {
                stage,
                stage_name,
                error,
            } => {
                self.print_error(&format!(
                    "Failed at stage {} ({}): [{}] {}",
                    stage, stage_name, error.kind, error.message
                ));
            }
            TaskState::Created | TaskState::Running { .. } => {
                self.print_warning("Task has not finished");
            }
        }

        if let Some(script) = task.context.script() {
            println!(
                "  {} {} sections, {:.0}s",
                "Script:".dimmed(),
                script.sections.len(),
                script.total_seconds()
            );
        }
        if let Some(scenes) = task.context.storyboard() {
            println!("  {} {} scenes", "Storyboard:".dimmed(), scenes.len());
        }
        if let Some(timeline) = task.context.timeline() {
            println!(
                "  {} {} ({:.0}s)",
                "Timeline:".dimmed(),
                timeline.handle,
                timeline.duration_seconds
            );
        }
        if let Some(output) = task.context.output() {
            let video = output.video_uri.to_string();
            println!("  {} {}", "Video:".dimmed(), video.bright_cyan());
            if let Some(subtitles) = &output.subtitles {
                println!("  {} {}", "Subtitles:".dimmed(), subtitles);
            }
        }
        println!();
    }
}
