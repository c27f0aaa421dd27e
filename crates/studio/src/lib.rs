//! Persona video studio
//!
//! A fixed six-stage pipeline (script, storyboard, assets, camera, composition, audio) where
//! each stage runs either against a real provider or a deterministic offline stand-in,
//! depending on which credentials the configuration snapshot carries.

pub mod agents;
pub mod capability;
pub mod config;
pub mod providers;
pub mod task_manager;
pub mod workflow;

#[cfg(test)]
pub(crate) mod testing;

pub use capability::{CapabilityDecision, Mode, Provider};
pub use config::{ConfigError, ServiceConfig};
pub use task_manager::{TaskManager, TaskManagerError};
pub use workflow::{Stage, Task, TaskEvent, TaskState, TaskSummary};
