//! OpenAI-compatible chat completions in JSON mode, shared by OpenAI and DeepSeek

use async_trait::async_trait;
use reqwest::Client;

use super::{AdapterError, JsonCompletionRequest, TextGenerator, http::read_json};
use crate::capability::Provider;

pub struct ChatCompletionsClient {
    provider: Provider,
    client: Client,
    endpoint: String,
    api_key: String,
    model: String,
    temperature: f32,
}

impl ChatCompletionsClient {
    pub fn new(
        provider: Provider,
        client: Client,
        base_url: &str,
        api_key: impl Into<String>,
        model: impl Into<String>,
        temperature: f32,
    ) -> Self {
        Self {
            provider,
            client,
            endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            api_key: api_key.into(),
            model: model.into(),
            temperature,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn build_payload(&self, request: &JsonCompletionRequest) -> serde_json::Value {
        // JSON mode requires the word "json" somewhere in the prompt.
        let system_prompt = if request.system_prompt.to_lowercase().contains("json") {
            request.system_prompt.clone()
        } else {
            format!("{} Respond with valid JSON.", request.system_prompt.trim())
        };

        serde_json::json!({
            "model": self.model,
            "temperature": self.temperature,
            "response_format": { "type": "json_object" },
            "messages": [
                { "role": "system", "content": system_prompt },
                { "role": "user", "content": request.user_content },
            ]
        })
    }
}

/// Pull `choices[0].message.content` out of a completion and parse it as JSON.
/// Message content is either a string or a list of typed parts; text parts are concatenated.
fn message_content(content: &serde_json::Value) -> String {
    match content {
        serde_json::Value::String(text) => text.clone(),
        serde_json::Value::Array(parts) => parts
            .iter()
            .filter_map(|part| match part {
                serde_json::Value::String(text) => Some(text.as_str()),
                part if part["type"].as_str().is_none_or(|t| t == "text") => {
                    part["text"].as_str()
                }
                _ => None,
            })
            .collect(),
        _ => String::new(),
    }
}

pub fn parse_completion(json: &serde_json::Value) -> Result<serde_json::Value, AdapterError> {
    if let Some(message) = json["error"]["message"].as_str() {
        return Err(AdapterError::Rejected(super::truncate_body(message)));
    }

    let content = message_content(&json["choices"][0]["message"]["content"]);
    let content = content.trim();
    if content.is_empty() {
        return Err(AdapterError::Parse("completion returned empty content".into()));
    }

    // Some models wrap JSON mode output in a markdown fence.
    let content = content
        .strip_prefix("```json")
        .or_else(|| content.strip_prefix("```"))
        .and_then(|c| c.strip_suffix("```"))
        .map(str::trim)
        .unwrap_or(content);

    serde_json::from_str(content).map_err(|e| {
        AdapterError::Parse(format!(
            "completion is not valid JSON ({}): {}",
            e,
            super::truncate_body(content)
        ))
    })
}

#[async_trait]
impl TextGenerator for ChatCompletionsClient {
    fn provider(&self) -> Provider {
        self.provider
    }

    async fn complete_json(
        &self,
        request: &JsonCompletionRequest,
    ) -> Result<serde_json::Value, AdapterError> {
        tracing::debug!("{} chat completion with model {}", self.provider, self.model);

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&self.build_payload(request))
            .send()
            .await?;

        let json = read_json(response).await?;
        parse_completion(&json)
    }
}
