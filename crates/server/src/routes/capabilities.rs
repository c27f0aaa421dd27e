use axum::{Router, extract::State, response::Json as ResponseJson, routing::get};
use studio::{CapabilityDecision, capability};

use crate::AppState;

/// Per-stage decision against the manager's current configuration snapshot.
pub async fn get_capabilities(
    State(state): State<AppState>,
) -> ResponseJson<Vec<CapabilityDecision>> {
    let config = state.manager.config().await;
    ResponseJson(capability::resolve_all(&config))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/capabilities", get(get_capabilities))
}
