use axum::{
    Json, Router,
    extract::{Path, State},
    response::Json as ResponseJson,
    routing::get,
};
use serde::{Deserialize, Serialize};
use studio::{
    Task, TaskState, TaskSummary,
    workflow::{TaskContext, TaskError},
};
use uuid::Uuid;

use crate::{AppState, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct CreateTask {
    pub persona: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedTask {
    pub task_id: Uuid,
}

/// Status view of one task
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskStatus {
    pub id: Uuid,
    pub state: TaskState,
    pub last_completed_stage: Option<usize>,
    pub context: TaskContext,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<TaskError>,
}

impl From<Task> for TaskStatus {
    fn from(task: Task) -> Self {
        let error = task.error().cloned();
        Self {
            id: task.id,
            state: task.state,
            last_completed_stage: task.last_completed_stage,
            context: task.context,
            error,
        }
    }
}

pub async fn create_task(
    State(state): State<AppState>,
    Json(payload): Json<CreateTask>,
) -> Result<ResponseJson<CreatedTask>, ApiError> {
    let task_id = state.manager.create(&payload.persona).await?;
    tracing::info!("Accepted task {} for persona '{}'", task_id, payload.persona.trim());
    Ok(ResponseJson(CreatedTask { task_id }))
}

pub async fn get_tasks(State(state): State<AppState>) -> ResponseJson<Vec<TaskSummary>> {
    ResponseJson(state.manager.list().await)
}

pub async fn get_task(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> Result<ResponseJson<TaskStatus>, ApiError> {
    let task_id = Uuid::parse_str(task_id.trim())
        .map_err(|_| ApiError::BadRequest(format!("'{}' is not a valid task id", task_id)))?;
    let task = state.manager.status(task_id).await?;
    Ok(ResponseJson(task.into()))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/tasks", get(get_tasks).post(create_task))
        .route("/tasks/{task_id}", get(get_task))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use super::*;
    use crate::routes::test_support::{app, dummy_state, get, post_json, send};

    #[tokio::test]
    async fn test_create_returns_task_id() {
        let state = dummy_state();
        let (status, body) = send(
            app(&state),
            post_json("/api/tasks", json!({ "persona": "诸葛亮" })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let task_id = body["taskId"].as_str().unwrap();
        assert!(Uuid::parse_str(task_id).is_ok());
    }

    #[tokio::test]
    async fn test_blank_persona_is_rejected() {
        let state = dummy_state();
        let (status, body) = send(
            app(&state),
            post_json("/api/tasks", json!({ "persona": "   " })),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert_eq!(body["error_type"], "InvalidPersona");
    }

    #[tokio::test]
    async fn test_unknown_task_is_404() {
        let state = dummy_state();
        let uri = format!("/api/tasks/{}", Uuid::new_v4());
        let (status, body) = send(app(&state), get(&uri)).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error_type"], "TaskNotFound");
    }

    #[tokio::test]
    async fn test_malformed_task_id_is_400() {
        let state = dummy_state();
        let (status, _) = send(app(&state), get("/api/tasks/not-a-uuid")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_completed_task_status() {
        let state = dummy_state();
        let task = state.manager.run("诸葛亮").await.unwrap();

        let uri = format!("/api/tasks/{}", task.id);
        let (status, body) = send(app(&state), get(&uri)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["state"]["status"], "completed");
        assert_eq!(body["lastCompletedStage"], 6);
        assert_eq!(body["context"]["persona"], "诸葛亮");
        assert_eq!(body["context"]["storyboard"].as_array().unwrap().len(), 3);
        assert!(body.get("error").is_none());
    }

    #[tokio::test]
    async fn test_list_includes_created_tasks() {
        let state = dummy_state();
        state.manager.run("李白").await.unwrap();
        state.manager.run("杜甫").await.unwrap();

        let (status, body) = send(app(&state), get("/api/tasks")).await;

        assert_eq!(status, StatusCode::OK);
        let personas: Vec<&str> = body
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["persona"].as_str().unwrap())
            .collect();
        assert_eq!(personas.len(), 2);
        assert!(personas.contains(&"李白"));
        assert!(personas.contains(&"杜甫"));
    }
}
