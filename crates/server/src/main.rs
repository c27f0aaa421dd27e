use server::{AppState, routes};
use studio::{ConfigError, ServiceConfig, TaskManager, capability};
use thiserror::Error;

const DEFAULT_PORT: u16 = 8000;

#[derive(Debug, Error)]
pub enum StudioServerError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

#[tokio::main]
async fn main() -> Result<(), StudioServerError> {
    // Pick up provider keys from `.env` during local development
    dotenv::dotenv().ok();

    utils::logging::init_tracing(&["server", "studio", "utils"]);

    let config = ServiceConfig::load(None)?;
    for decision in capability::resolve_all(&config) {
        tracing::info!(
            "Stage {} resolves to {:?} ({} missing keys)",
            decision.stage.name(),
            decision.mode,
            decision.missing_keys.len()
        );
    }

    let state = AppState::new(TaskManager::with_http_providers(config));
    let app_router = routes::router(state);

    let port = std::env::var("PORT")
        .or_else(|_| std::env::var("BACKEND_PORT"))
        .ok()
        .and_then(|s| s.trim().parse::<u16>().ok())
        .unwrap_or_else(|| {
            tracing::info!("No PORT environment variable set, using {}", DEFAULT_PORT);
            DEFAULT_PORT
        });

    let host = std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let listener = tokio::net::TcpListener::bind(format!("{host}:{port}")).await?;
    let actual_port = listener.local_addr()?.port();

    tracing::info!("Server running on http://{host}:{actual_port}");

    axum::serve(listener, app_router).await?;
    Ok(())
}
