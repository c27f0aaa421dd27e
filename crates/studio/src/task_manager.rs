//! Task manager
//!
//! Owns the in-memory task collection, hands out identities and drives the orchestrator for
//! each task. The collection sits behind one lock that is never held across a stage.

use std::{collections::HashMap, sync::Arc};

use thiserror::Error;
use tokio::sync::{RwLock, broadcast};
use uuid::Uuid;

use crate::{
    config::ServiceConfig,
    providers::{FailureKind, HttpProviderFactory, ProviderFactory},
    workflow::{Stage, Task, TaskError, TaskEvent, TaskState, TaskSummary, WorkflowOrchestrator},
};

#[derive(Debug, Error)]
pub enum TaskManagerError {
    #[error("Task {0} not found")]
    NotFound(Uuid),
    #[error("Persona must not be empty")]
    InvalidSeed,
}

/// Shared task map. Terminal records are never overwritten.
#[derive(Clone, Default)]
pub struct TaskStore {
    tasks: Arc<RwLock<HashMap<Uuid, Task>>>,
}

impl TaskStore {
    pub async fn insert(&self, task: Task) {
        self.tasks.write().await.insert(task.id, task);
    }

    pub async fn get(&self, id: Uuid) -> Option<Task> {
        self.tasks.read().await.get(&id).cloned()
    }

    /// Store a newer snapshot of a task. Returns false if the stored record is already terminal.
    pub async fn put(&self, task: &Task) -> bool {
        let mut tasks = self.tasks.write().await;
        match tasks.get(&task.id) {
            Some(existing) if existing.is_terminal() => {
                tracing::warn!("[TASK_MANAGER] Ignoring update to finished task {}", task.id);
                false
            }
            _ => {
                tasks.insert(task.id, task.clone());
                true
            }
        }
    }

    /// Summaries, oldest first.
    pub async fn list(&self) -> Vec<TaskSummary> {
        let tasks = self.tasks.read().await;
        let mut summaries: Vec<TaskSummary> = tasks.values().map(TaskSummary::from).collect();
        summaries.sort_by_key(|s| s.created_at);
        summaries
    }
}

pub struct TaskManager {
    store: TaskStore,
    config: RwLock<Arc<ServiceConfig>>,
    orchestrator: Arc<WorkflowOrchestrator>,
}

impl TaskManager {
    pub fn new(config: ServiceConfig, factory: Arc<dyn ProviderFactory>) -> Self {
        Self {
            store: TaskStore::default(),
            config: RwLock::new(Arc::new(config)),
            orchestrator: Arc::new(WorkflowOrchestrator::new(factory)),
        }
    }

    pub fn with_http_providers(config: ServiceConfig) -> Self {
        Self::new(config, Arc::new(HttpProviderFactory))
    }

    /// The snapshot new runs will use.
    pub async fn config(&self) -> Arc<ServiceConfig> {
        self.config.read().await.clone()
    }

    /// Swap the snapshot for future runs. Runs already in flight keep theirs.
    pub async fn replace_config(&self, config: ServiceConfig) {
        *self.config.write().await = Arc::new(config);
        tracing::info!("[TASK_MANAGER] Configuration replaced");
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TaskEvent> {
        self.orchestrator.subscribe()
    }

    async fn allocate(&self, persona: &str) -> Result<Task, TaskManagerError> {
        let persona = persona.trim();
        if persona.is_empty() {
            return Err(TaskManagerError::InvalidSeed);
        }

        let task = Task::new(persona);
        self.store.insert(task.clone()).await;
        tracing::info!("[TASK_MANAGER] Created task {} for '{}'", task.id, persona);
        self.orchestrator.emit(TaskEvent::TaskCreated {
            task_id: task.id,
            persona: persona.to_string(),
        });
        Ok(task)
    }

    /// Allocate a task and run the pipeline in the background. Returns immediately.
    pub async fn create(&self, persona: &str) -> Result<Uuid, TaskManagerError> {
        let task = self.allocate(persona).await?;
        let task_id = task.id;
        let config = self.config().await;
        let orchestrator = self.orchestrator.clone();
        let store = self.store.clone();

        tokio::spawn(supervise(orchestrator, store, task, config));

        Ok(task_id)
    }

    /// Allocate a task and run the pipeline to completion on the caller's task.
    pub async fn run(&self, persona: &str) -> Result<Task, TaskManagerError> {
        let task = self.allocate(persona).await?;
        let config = self.config().await;
        Ok(supervise(self.orchestrator.clone(), self.store.clone(), task, config).await)
    }

    pub async fn status(&self, task_id: Uuid) -> Result<Task, TaskManagerError> {
        self.store
            .get(task_id)
            .await
            .ok_or(TaskManagerError::NotFound(task_id))
    }

    pub async fn list(&self) -> Vec<TaskSummary> {
        self.store.list().await
    }

    /// Resolve once the task is `Completed` or `Failed`.
    pub async fn wait(&self, task_id: Uuid) -> Result<Task, TaskManagerError> {
        let mut events = self.subscribe();
        let task = self.status(task_id).await?;
        if task.is_terminal() {
            return Ok(task);
        }

        loop {
            match events.recv().await {
                Ok(event) if event.task_id() == task_id && event.is_terminal() => {
                    return self.status(task_id).await;
                }
                Ok(_) => {}
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::debug!("[TASK_MANAGER] Event stream lagged by {}", skipped);
                    let task = self.status(task_id).await?;
                    if task.is_terminal() {
                        return Ok(task);
                    }
                }
                Err(broadcast::error::RecvError::Closed) => return self.status(task_id).await,
            }
        }
    }
}

/// Drive one run on its own tokio task. If the run panics or is cancelled the task is failed
/// at the stage it was in, so it still reaches a terminal state and `wait` callers wake up.
async fn supervise(
    orchestrator: Arc<WorkflowOrchestrator>,
    store: TaskStore,
    task: Task,
    config: Arc<ServiceConfig>,
) -> Task {
    let fallback = task.clone();
    let handle = {
        let orchestrator = orchestrator.clone();
        let store = store.clone();
        tokio::spawn(async move { orchestrator.run(task, config, &store).await })
    };

    match handle.await {
        Ok(task) => task,
        Err(err) => {
            let message = if err.is_panic() {
                let payload = err.into_panic();
                let detail = payload
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                format!("stage panicked: {}", detail)
            } else {
                "run was cancelled".to_string()
            };
            abort_run(&orchestrator, &store, fallback, message).await
        }
    }
}

async fn abort_run(
    orchestrator: &WorkflowOrchestrator,
    store: &TaskStore,
    fallback: Task,
    message: String,
) -> Task {
    let mut task = store.get(fallback.id).await.unwrap_or(fallback);
    if task.is_terminal() {
        return task;
    }

    let stage = match &task.state {
        TaskState::Running { stage_name, .. } => *stage_name,
        _ => Stage::Script,
    };
    tracing::error!(
        "[TASK_MANAGER] Task {} aborted in stage {}: {}",
        task.id,
        stage.name(),
        message
    );

    let error = TaskError {
        kind: FailureKind::Permanent,
        message,
    };
    task.fail(stage, error.clone());
    store.put(&task).await;
    orchestrator.emit(TaskEvent::StageFailed {
        task_id: task.id,
        stage,
        error: error.clone(),
    });
    orchestrator.emit(TaskEvent::TaskFailed {
        task_id: task.id,
        stage,
        error,
    });
    task
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        capability::Mode,
        testing::{FakeFactory, production_config},
        workflow::TaskState,
    };

    fn manager(config: ServiceConfig) -> TaskManager {
        TaskManager::new(config, Arc::new(FakeFactory::default()))
    }

    #[tokio::test]
    async fn test_create_then_wait_completes() {
        let manager = manager(ServiceConfig::default());
        let id = manager.create("诸葛亮").await.unwrap();

        let task = manager.wait(id).await.unwrap();
        assert_eq!(task.id, id);
        assert!(matches!(task.state, TaskState::Completed { .. }));

        let status = manager.status(id).await.unwrap();
        assert_eq!(status, task);
    }

    #[tokio::test]
    async fn test_unknown_task_is_not_found() {
        let manager = manager(ServiceConfig::default());
        let id = Uuid::new_v4();
        assert!(matches!(
            manager.status(id).await,
            Err(TaskManagerError::NotFound(missing)) if missing == id
        ));
        assert!(manager.wait(id).await.is_err());
    }

    #[tokio::test]
    async fn test_blank_persona_is_rejected() {
        let manager = manager(ServiceConfig::default());
        assert!(matches!(
            manager.create("   ").await,
            Err(TaskManagerError::InvalidSeed)
        ));
        assert!(manager.list().await.is_empty());
    }

    #[tokio::test]
    async fn test_replacing_config_does_not_touch_running_task() {
        let manager = manager(production_config());
        let id = manager.create("诸葛亮").await.unwrap();
        manager.replace_config(ServiceConfig::default()).await;

        let task = manager.wait(id).await.unwrap();
        assert!(task.decisions.iter().all(|d| d.mode == Mode::Production));

        let next = manager.run("诸葛亮").await.unwrap();
        assert!(next.decisions.iter().all(|d| d.mode == Mode::Dummy));
    }

    #[tokio::test]
    async fn test_concurrent_tasks_are_isolated() {
        let manager = Arc::new(manager(ServiceConfig::default()));
        let personas = ["诸葛亮", "曹操", "孙权", "刘备"];

        let mut ids = Vec::new();
        for persona in personas {
            ids.push(manager.create(persona).await.unwrap());
        }
        for (id, persona) in ids.iter().zip(personas) {
            let task = manager.wait(*id).await.unwrap();
            assert!(matches!(task.state, TaskState::Completed { .. }));
            assert!(task.context.script().unwrap().text.contains(persona));
        }

        let listed = manager.list().await;
        assert_eq!(listed.len(), 4);
    }

    #[tokio::test]
    async fn test_panicking_stage_fails_the_task() {
        let factory = FakeFactory {
            panicking_text: true,
            ..Default::default()
        };
        let manager = TaskManager::new(production_config(), Arc::new(factory));
        let mut events = manager.subscribe();
        let id = manager.create("诸葛亮").await.unwrap();

        let task = tokio::time::timeout(std::time::Duration::from_secs(5), manager.wait(id))
            .await
            .expect("wait should resolve after a panic")
            .unwrap();

        assert_eq!(task.failed_stage(), Some(1));
        let error = task.error().unwrap();
        assert_eq!(error.kind, FailureKind::Permanent);
        assert!(error.message.contains("fake text adapter blew up"));
        assert_eq!(manager.status(id).await.unwrap(), task);

        let mut terminal = None;
        while let Ok(event) = events.try_recv() {
            if event.is_terminal() {
                terminal = Some(event);
            }
        }
        assert!(matches!(
            terminal,
            Some(TaskEvent::TaskFailed { stage: Stage::Script, .. })
        ));
    }

    #[tokio::test]
    async fn test_inline_run_survives_panic() {
        let factory = FakeFactory {
            panicking_text: true,
            ..Default::default()
        };
        let manager = TaskManager::new(production_config(), Arc::new(factory));
        let task = manager.run("诸葛亮").await.unwrap();

        assert!(task.is_terminal());
        assert_eq!(task.failed_stage(), Some(1));
        assert!(task.context.script().is_none());
    }

    #[tokio::test]
    async fn test_store_keeps_terminal_records() {
        let store = TaskStore::default();
        let mut task = Task::new("诸葛亮");
        store.insert(task.clone()).await;

        task.complete(5);
        assert!(store.put(&task).await);

        let mut late = task.clone();
        late.last_completed_stage = Some(1);
        assert!(!store.put(&late).await);
        assert_eq!(store.get(task.id).await.unwrap(), task);
    }
}
