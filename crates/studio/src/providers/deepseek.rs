//! DeepSeek text adapter (OpenAI-compatible chat endpoint)

use super::{
    AdapterError,
    chat::ChatCompletionsClient,
    http::{ProxyPolicy, build_client},
};
use crate::{capability::Provider, config::DeepSeekSettings};

pub const DEFAULT_BASE_URL: &str = "https://api.deepseek.com/v1";
const DEFAULT_TIMEOUT_SECS: u64 = 60;

pub fn text_generator(settings: &DeepSeekSettings) -> Result<ChatCompletionsClient, AdapterError> {
    let api_key = settings
        .api_key
        .as_deref()
        .ok_or_else(|| AdapterError::Config("deepseek.api_key is not set".into()))?;
    let client = build_client(
        "deepseek",
        &settings.network,
        DEFAULT_TIMEOUT_SECS,
        ProxyPolicy::Ignore,
    )?;

    Ok(ChatCompletionsClient::new(
        Provider::DeepSeek,
        client,
        settings.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL),
        api_key,
        settings.model.clone(),
        settings.temperature,
    ))
}
