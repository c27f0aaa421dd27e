//! Provider adapters
//!
//! Each adapter wraps one remote capability behind a single call. Adapters classify their
//! failures and never retry on their own; the caller wraps each call in [`RetryPolicy`].

pub mod chat;
pub mod dashscope;
pub mod deepseek;
pub mod doubao;
pub mod error;
pub mod factory;
pub mod freesound;
pub mod http;
pub mod media;
pub mod openai;
pub mod retry;
pub mod xunfei;

use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use error::{AdapterError, FailureKind, truncate_body};
pub use factory::{HttpProviderFactory, ProviderFactory};
pub use retry::RetryPolicy;

use crate::{
    capability::Provider,
    workflow::types::{CameraMovement, Transition},
};

/// Opaque reference to a media object: a local path, a remote URL, or a placeholder URI.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MediaHandle(String);

impl MediaHandle {
    pub const PLACEHOLDER_SCHEME: &'static str = "placeholder://";

    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn from_path(path: &std::path::Path) -> Self {
        Self(path.display().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_placeholder(&self) -> bool {
        self.0.starts_with(Self::PLACEHOLDER_SCHEME)
    }
}

impl std::fmt::Display for MediaHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Chat completion that must answer with a JSON object.
#[derive(Debug, Clone)]
pub struct JsonCompletionRequest {
    pub system_prompt: String,
    pub user_content: String,
}

#[derive(Debug, Clone)]
pub struct ImageRequest {
    pub scene_index: usize,
    pub prompt: String,
    pub negative_prompt: Option<String>,
    /// Where inline (base64) image payloads are written.
    pub output_path: PathBuf,
}

#[derive(Debug, Clone)]
pub struct SpeechRequest {
    pub text: String,
    pub output_path: PathBuf,
}

/// Music or ambience for a persona's story.
#[derive(Debug, Clone)]
pub struct SoundtrackRequest {
    pub persona: String,
    pub output_path: PathBuf,
}

/// One scene on the silent timeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Clip {
    pub scene_index: usize,
    pub image: MediaHandle,
    pub movement: CameraMovement,
    pub speed: f32,
    pub transition: Option<Transition>,
    pub duration_seconds: f64,
}

#[derive(Debug, Clone)]
pub struct ComposeRequest {
    pub clips: Vec<Clip>,
    pub output_path: PathBuf,
}

#[derive(Debug, Clone)]
pub struct MuxRequest {
    pub timeline: MediaHandle,
    pub narration: MediaHandle,
    pub music: MediaHandle,
    pub ambience: MediaHandle,
    pub output_path: PathBuf,
}

#[async_trait]
pub trait TextGenerator: Send + Sync {
    fn provider(&self) -> Provider;

    async fn complete_json(
        &self,
        request: &JsonCompletionRequest,
    ) -> Result<serde_json::Value, AdapterError>;
}

#[async_trait]
pub trait ImageGenerator: Send + Sync {
    fn provider(&self) -> Provider;

    async fn generate_image(&self, request: &ImageRequest) -> Result<MediaHandle, AdapterError>;
}

#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn synthesize(&self, request: &SpeechRequest) -> Result<MediaHandle, AdapterError>;
}

#[async_trait]
pub trait MusicGenerator: Send + Sync {
    async fn generate_music(&self, request: &SoundtrackRequest)
    -> Result<MediaHandle, AdapterError>;
}

#[async_trait]
pub trait AmbienceGenerator: Send + Sync {
    fn provider(&self) -> Provider;

    async fn generate_ambience(
        &self,
        request: &SoundtrackRequest,
    ) -> Result<MediaHandle, AdapterError>;
}

/// The external media-processing collaborator. Both operations are idempotent for
/// identical inputs.
#[async_trait]
pub trait MediaComposer: Send + Sync {
    async fn compose(&self, request: &ComposeRequest) -> Result<MediaHandle, AdapterError>;

    async fn mux(&self, request: &MuxRequest) -> Result<MediaHandle, AdapterError>;
}

/// Write a payload to disk, creating parent directories first.
pub(crate) async fn write_media(
    path: &std::path::Path,
    bytes: &[u8],
) -> Result<MediaHandle, AdapterError> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, bytes).await?;
    Ok(MediaHandle::from_path(path))
}
