//! DashScope text-to-music, used for both background music and ambience

use async_trait::async_trait;
use base64::Engine;
use reqwest::Client;

use super::{
    AdapterError, AmbienceGenerator, MediaHandle, MusicGenerator, SoundtrackRequest,
    http::{ProxyPolicy, build_client, read_json},
    write_media,
};
use crate::{capability::Provider, config::DashscopeSettings};

pub const MUSIC_API_URL: &str =
    "https://dashscope.aliyuncs.com/api/v1/services/audio-generation/text-to-music";
pub const AMBIENCE_API_URL: &str =
    "https://dashscope.aliyun.com/api/v1/services/audio-generation/text-to-music";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Purpose {
    Music,
    Ambience,
}

impl Purpose {
    fn default_style(self) -> &'static str {
        match self {
            Purpose::Music => "中国古风",
            Purpose::Ambience => "中国场景环境音",
        }
    }

    fn default_duration(self) -> u32 {
        match self {
            Purpose::Music => 120,
            Purpose::Ambience => 45,
        }
    }

    fn default_timeout_secs(self) -> u64 {
        match self {
            Purpose::Music => 120,
            Purpose::Ambience => 60,
        }
    }

    fn prompt(self, persona: &str) -> String {
        match self {
            Purpose::Music => format!("为历史人物{}的生平故事创作具有中国传统氛围的配乐", persona),
            Purpose::Ambience => format!(
                "为中国历史人物{}的生平故事营造真实场景环境音，包含宫殿、战场、书院等氛围元素",
                persona
            ),
        }
    }
}

pub struct DashscopeAudioGenerator {
    purpose: Purpose,
    client: Client,
    endpoint: &'static str,
    api_key: String,
    model: String,
    style: String,
    duration_seconds: u32,
}

impl DashscopeAudioGenerator {
    pub fn new(purpose: Purpose, settings: &DashscopeSettings) -> Result<Self, AdapterError> {
        let (label, endpoint) = match purpose {
            Purpose::Music => ("dashscope_music", MUSIC_API_URL),
            Purpose::Ambience => ("dashscope_ambience", AMBIENCE_API_URL),
        };
        let api_key = settings
            .api_key
            .as_deref()
            .ok_or_else(|| AdapterError::Config(format!("{}.api_key is not set", label)))?;

        Ok(Self {
            purpose,
            client: build_client(
                label,
                &settings.network,
                purpose.default_timeout_secs(),
                ProxyPolicy::Ignore,
            )?,
            endpoint,
            api_key: api_key.to_string(),
            model: settings.model.clone(),
            style: settings
                .style
                .clone()
                .unwrap_or_else(|| purpose.default_style().to_string()),
            duration_seconds: settings
                .duration_seconds
                .unwrap_or_else(|| purpose.default_duration()),
        })
    }

    fn build_payload(&self, persona: &str) -> serde_json::Value {
        serde_json::json!({
            "model": self.model,
            "input": {
                "prompt": self.purpose.prompt(persona),
                "duration": self.duration_seconds,
            },
            "parameters": {
                "style": self.style,
            }
        })
    }

    async fn generate(&self, request: &SoundtrackRequest) -> Result<MediaHandle, AdapterError> {
        let response = self
            .client
            .post(self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&self.build_payload(&request.persona))
            .send()
            .await?;

        let json = read_json(response).await?;
        let bytes = extract_audio(&json)?;
        write_media(&request.output_path, &bytes).await
    }
}

/// The audio block may sit under `output.audio`, `output.audios` or `output.results`, as an
/// object or as the first element of a list.
fn extract_audio(json: &serde_json::Value) -> Result<Vec<u8>, AdapterError> {
    if let Some(code) = json["code"].as_str().filter(|c| !c.is_empty()) {
        let message = json["message"].as_str().unwrap_or("");
        let detail = format!("dashscope {}: {}", code, super::truncate_body(message));
        return Err(if code.contains("ApiKey") || code.contains("AccessDenied") {
            AdapterError::Auth(detail)
        } else {
            AdapterError::Rejected(detail)
        });
    }

    let output = &json["output"];
    let block = ["audio", "audios", "results"]
        .iter()
        .map(|key| &output[*key])
        .find_map(|value| match value {
            serde_json::Value::Object(_) => Some(value),
            serde_json::Value::Array(items) => items.iter().find(|i| i.is_object()),
            _ => None,
        })
        .ok_or_else(|| AdapterError::Parse("dashscope response missing audio payload".into()))?;

    let content = block["audio"]
        .as_str()
        .or_else(|| block["data"].as_str())
        .filter(|c| !c.is_empty())
        .ok_or_else(|| AdapterError::Parse("dashscope audio payload is empty".into()))?;

    base64::engine::general_purpose::STANDARD
        .decode(content)
        .map_err(|e| AdapterError::Parse(format!("invalid base64 audio: {}", e)))
}

#[async_trait]
impl MusicGenerator for DashscopeAudioGenerator {
    async fn generate_music(
        &self,
        request: &SoundtrackRequest,
    ) -> Result<MediaHandle, AdapterError> {
        self.generate(request).await
    }
}

#[async_trait]
impl AmbienceGenerator for DashscopeAudioGenerator {
    fn provider(&self) -> Provider {
        Provider::DashscopeAmbience
    }

    async fn generate_ambience(
        &self,
        request: &SoundtrackRequest,
    ) -> Result<MediaHandle, AdapterError> {
        self.generate(request).await
    }
}
