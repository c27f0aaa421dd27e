//! Doubao (Volcengine Ark) image adapter

use async_trait::async_trait;
use reqwest::Client;

use super::{
    AdapterError, ImageGenerator, ImageRequest, MediaHandle,
    http::{ProxyPolicy, build_client, read_json},
    openai::store_image,
};
use crate::{capability::Provider, config::DoubaoSettings};

pub const DEFAULT_BASE_URL: &str = "https://ark.cn-beijing.volces.com/api/v3";
const DEFAULT_TIMEOUT_SECS: u64 = 60;
const IMAGE_SIZE: &str = "1024*1024";

pub struct DoubaoImageGenerator {
    client: Client,
    endpoint: String,
    api_key: String,
    model: String,
    negative_prompt: Option<String>,
}

impl DoubaoImageGenerator {
    pub fn new(settings: &DoubaoSettings) -> Result<Self, AdapterError> {
        let api_key = settings
            .api_key
            .as_deref()
            .ok_or_else(|| AdapterError::Config("doubao.api_key is not set".into()))?;
        let client = build_client(
            "doubao",
            &settings.network,
            DEFAULT_TIMEOUT_SECS,
            ProxyPolicy::Ignore,
        )?;
        let base_url = settings.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL);

        Ok(Self {
            client,
            endpoint: format!("{}/images", base_url.trim_end_matches('/')),
            api_key: api_key.to_string(),
            model: settings.model.clone(),
            negative_prompt: settings.negative_prompt.clone(),
        })
    }

    fn build_payload(&self, request: &ImageRequest) -> serde_json::Value {
        let negative_prompt = request
            .negative_prompt
            .as_ref()
            .or(self.negative_prompt.as_ref());
        serde_json::json!({
            "model": self.model,
            "input": {
                "prompt": request.prompt,
                "negative_prompt": negative_prompt,
                "size": IMAGE_SIZE,
            }
        })
    }
}

#[async_trait]
impl ImageGenerator for DoubaoImageGenerator {
    fn provider(&self) -> Provider {
        Provider::Doubao
    }

    async fn generate_image(&self, request: &ImageRequest) -> Result<MediaHandle, AdapterError> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&self.build_payload(request))
            .send()
            .await?;

        let json = read_json(response).await?;
        if let Some(message) = json["error"]["message"].as_str() {
            return Err(AdapterError::Rejected(super::truncate_body(message)));
        }
        store_image(&json, request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generator(negative: Option<&str>) -> DoubaoImageGenerator {
        DoubaoImageGenerator::new(&DoubaoSettings {
            api_key: Some("db".into()),
            negative_prompt: negative.map(String::from),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_endpoint() {
        assert_eq!(
            generator(None).endpoint,
            "https://ark.cn-beijing.volces.com/api/v3/images"
        );
    }

    #[test]
    fn test_payload_uses_configured_negative_prompt() {
        let request = ImageRequest {
            scene_index: 1,
            prompt: "诸葛亮 草庐".into(),
            negative_prompt: None,
            output_path: "/tmp/scene-01.png".into(),
        };
        let payload = generator(Some("现代元素")).build_payload(&request);
        assert_eq!(payload["model"], "doubao-vision");
        assert_eq!(payload["input"]["negative_prompt"], "现代元素");
        assert_eq!(payload["input"]["size"], "1024*1024");

        let payload = generator(None).build_payload(&request);
        assert!(payload["input"]["negative_prompt"].is_null());
    }
}
