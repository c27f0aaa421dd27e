use std::{sync::Arc, time::Instant};

use tokio::sync::broadcast;

use super::types::{Stage, StageFailure, Task, TaskEvent};
use crate::{
    agents::{RunScope, StageAgent},
    capability::{self, CapabilityDecision},
    config::ServiceConfig,
    providers::ProviderFactory,
    task_manager::TaskStore,
};

/// Drives one task through the six stages in order. Holds no per-task state between runs.
pub struct WorkflowOrchestrator {
    factory: Arc<dyn ProviderFactory>,
    event_sender: broadcast::Sender<TaskEvent>,
}

impl WorkflowOrchestrator {
    pub fn new(factory: Arc<dyn ProviderFactory>) -> Self {
        let (event_sender, _) = broadcast::channel(1000);
        Self {
            factory,
            event_sender,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TaskEvent> {
        self.event_sender.subscribe()
    }

    pub(crate) fn emit(&self, event: TaskEvent) {
        // No subscribers is fine
        let _ = self.event_sender.send(event);
    }

    /// Run every stage against `config`, publishing each transition to `store`. Returns the
    /// terminal task. A task that is already terminal is returned untouched.
    pub async fn run(&self, mut task: Task, config: Arc<ServiceConfig>, store: &TaskStore) -> Task {
        if task.is_terminal() {
            return task;
        }

        let started = Instant::now();
        let scope = RunScope::new(task.id, &config.storage.output_path());

        for stage in Stage::ALL {
            let decision = capability::resolve(stage, &config);
            log_decision(&task, &decision);

            task.begin_stage(stage, decision.clone());
            store.put(&task).await;
            self.emit(TaskEvent::StageStarted {
                task_id: task.id,
                stage,
                decision: decision.clone(),
            });

            let outcome = match StageAgent::build(&decision, &config, self.factory.as_ref()) {
                Ok(agent) => agent.run(&task.context, &scope).await,
                Err(failure) => Err(failure),
            };
            let outcome = outcome
                .and_then(|output| task.context.apply(output).map_err(StageFailure::from));

            match outcome {
                Ok(()) => {
                    task.complete_stage(stage);
                    store.put(&task).await;
                    tracing::info!(
                        "[ORCHESTRATOR] Task {} finished stage {} ({})",
                        task.id,
                        stage.index(),
                        stage
                    );
                    self.emit(TaskEvent::StageCompleted {
                        task_id: task.id,
                        stage,
                    });
                }
                Err(failure) => {
                    tracing::warn!(
                        "[ORCHESTRATOR] Task {} failed at stage {} ({}): {}",
                        task.id,
                        stage.index(),
                        stage,
                        failure
                    );
                    let error = failure.into();
                    task.fail(stage, error);
                    store.put(&task).await;

                    if let Some(error) = task.error().cloned() {
                        self.emit(TaskEvent::StageFailed {
                            task_id: task.id,
                            stage,
                            error: error.clone(),
                        });
                        self.emit(TaskEvent::TaskFailed {
                            task_id: task.id,
                            stage,
                            error,
                        });
                    }
                    return task;
                }
            }
        }

        let execution_time_ms = started.elapsed().as_millis() as u64;
        task.complete(execution_time_ms);
        store.put(&task).await;
        tracing::info!(
            "[ORCHESTRATOR] Task {} completed in {}ms",
            task.id,
            execution_time_ms
        );
        self.emit(TaskEvent::TaskCompleted {
            task_id: task.id,
            execution_time_ms,
        });

        task
    }
}

fn log_decision(task: &Task, decision: &CapabilityDecision) {
    if let Some(unknown) = &decision.unknown_provider {
        tracing::warn!(
            "[ORCHESTRATOR] Task {} stage {}: unknown provider '{}', using dummy",
            task.id,
            decision.stage,
            unknown
        );
    } else if !decision.missing_keys.is_empty() {
        tracing::info!(
            "[ORCHESTRATOR] Task {} stage {}: dummy (missing {})",
            task.id,
            decision.stage,
            decision.missing_keys.join(", ")
        );
    } else {
        tracing::info!(
            "[ORCHESTRATOR] Task {} stage {}: {:?} via {:?}",
            task.id,
            decision.stage,
            decision.mode,
            decision.providers
        );
    }
}
