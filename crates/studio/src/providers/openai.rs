//! OpenAI text and image adapters

use async_trait::async_trait;
use base64::Engine;
use reqwest::Client;

use super::{
    AdapterError, ImageGenerator, ImageRequest, MediaHandle,
    chat::ChatCompletionsClient,
    http::{ProxyPolicy, build_client, read_json},
    write_media,
};
use crate::{capability::Provider, config::OpenAiSettings};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_TIMEOUT_SECS: u64 = 60;
const IMAGE_SIZE: &str = "1024x1024";

fn api_key(settings: &OpenAiSettings) -> Result<&str, AdapterError> {
    settings
        .api_key
        .as_deref()
        .ok_or_else(|| AdapterError::Config("openai.api_key is not set".into()))
}

fn base_url(settings: &OpenAiSettings) -> &str {
    settings.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL)
}

/// The only adapter allowed to route through a configured proxy.
pub fn text_generator(settings: &OpenAiSettings) -> Result<ChatCompletionsClient, AdapterError> {
    let client = build_client(
        "openai",
        &settings.network,
        DEFAULT_TIMEOUT_SECS,
        ProxyPolicy::Configured,
    )?;
    Ok(ChatCompletionsClient::new(
        Provider::OpenAi,
        client,
        base_url(settings),
        api_key(settings)?,
        settings.model.clone(),
        settings.temperature,
    ))
}

pub struct OpenAiImageGenerator {
    client: Client,
    endpoint: String,
    api_key: String,
    model: String,
}

impl OpenAiImageGenerator {
    pub fn new(settings: &OpenAiSettings) -> Result<Self, AdapterError> {
        let client = build_client(
            "openai images",
            &settings.network,
            DEFAULT_TIMEOUT_SECS,
            ProxyPolicy::Ignore,
        )?;
        Ok(Self {
            client,
            endpoint: format!("{}/images/generations", base_url(settings).trim_end_matches('/')),
            api_key: api_key(settings)?.to_string(),
            model: settings.image_model.clone(),
        })
    }
}

/// Resolve the first image of a `data[]` payload into a handle: remote URLs are kept as is,
/// inline base64 is written to `output_path`.
pub(crate) async fn store_image(
    json: &serde_json::Value,
    request: &ImageRequest,
) -> Result<MediaHandle, AdapterError> {
    let image = json["data"]
        .as_array()
        .and_then(|items| items.first())
        .ok_or_else(|| AdapterError::Parse("image response contained no data".into()))?;

    if let Some(url) = image["url"].as_str().filter(|u| !u.is_empty()) {
        return Ok(MediaHandle::new(url));
    }

    let encoded = image["b64_json"]
        .as_str()
        .filter(|b| !b.is_empty())
        .ok_or_else(|| AdapterError::Parse("image payload missing url and b64_json".into()))?;
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(encoded)
        .map_err(|e| AdapterError::Parse(format!("invalid base64 image: {}", e)))?;

    write_media(&request.output_path, &bytes).await
}

#[async_trait]
impl ImageGenerator for OpenAiImageGenerator {
    fn provider(&self) -> Provider {
        Provider::OpenAi
    }

    async fn generate_image(&self, request: &ImageRequest) -> Result<MediaHandle, AdapterError> {
        tracing::debug!("OpenAI image for scene {}", request.scene_index);

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&serde_json::json!({
                "model": self.model,
                "prompt": request.prompt,
                "size": IMAGE_SIZE,
                "n": 1,
            }))
            .send()
            .await?;

        let json = read_json(response).await?;
        store_image(&json, request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::TextGenerator;

    fn settings() -> OpenAiSettings {
        OpenAiSettings {
            api_key: Some("sk-test".into()),
            ..Default::default()
        }
    }

    #[test]
    fn test_text_generator_uses_configured_model() {
        let generator = text_generator(&settings()).unwrap();
        assert_eq!(generator.provider(), Provider::OpenAi);
        assert_eq!(generator.model(), "gpt-4o-mini");
        assert_eq!(generator.endpoint(), "https://api.openai.com/v1/chat/completions");
    }

    #[test]
    fn test_missing_key_is_misconfigured() {
        let err = text_generator(&OpenAiSettings::default()).err().unwrap();
        assert_eq!(err.kind(), crate::providers::FailureKind::Misconfigured);
    }

    #[test]
    fn test_custom_base_url() {
        let mut settings = settings();
        settings.base_url = Some("https://proxy.internal/v1/".into());
        let images = OpenAiImageGenerator::new(&settings).unwrap();
        assert_eq!(images.endpoint, "https://proxy.internal/v1/images/generations");
    }

    #[tokio::test]
    async fn test_store_image_prefers_url() {
        let request = ImageRequest {
            scene_index: 1,
            prompt: "p".into(),
            negative_prompt: None,
            output_path: "/nonexistent/scene-01.png".into(),
        };
        let json = serde_json::json!({ "data": [{ "url": "https://cdn.example.com/1.png" }] });
        let handle = store_image(&json, &request).await.unwrap();
        assert_eq!(handle.as_str(), "https://cdn.example.com/1.png");
    }

    #[tokio::test]
    async fn test_store_image_writes_base64() {
        let dir = tempfile::tempdir().unwrap();
        let request = ImageRequest {
            scene_index: 2,
            prompt: "p".into(),
            negative_prompt: None,
            output_path: dir.path().join("scene-02.png"),
        };
        let json = serde_json::json!({ "data": [{ "b64_json": "aGVsbG8=" }] });
        let handle = store_image(&json, &request).await.unwrap();
        assert_eq!(std::fs::read(handle.as_str()).unwrap(), b"hello");
    }

    #[tokio::test]
    async fn test_store_image_without_payload_is_parse_error() {
        let request = ImageRequest {
            scene_index: 1,
            prompt: "p".into(),
            negative_prompt: None,
            output_path: "/tmp/unused.png".into(),
        };
        let err = store_image(&serde_json::json!({ "data": [] }), &request)
            .await
            .unwrap_err();
        assert!(matches!(err, AdapterError::Parse(_)));
    }
}
