pub mod error;
pub mod middleware;
pub mod routes;

use std::sync::Arc;

use studio::TaskManager;

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub manager: Arc<TaskManager>,
}

impl AppState {
    pub fn new(manager: TaskManager) -> Self {
        Self {
            manager: Arc::new(manager),
        }
    }
}
