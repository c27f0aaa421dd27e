//! Six-stage pipeline: core types and the orchestrator that walks a task through them

pub mod orchestrator;
pub mod types;

pub use orchestrator::WorkflowOrchestrator;
pub use types::{
    Stage, StageFailure, StageOutput, Task, TaskContext, TaskError, TaskEvent, TaskState,
    TaskSummary,
};
