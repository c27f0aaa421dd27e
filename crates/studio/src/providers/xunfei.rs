//! Xunfei (iFlytek) TTS adapter over the REST WebAPI

use async_trait::async_trait;
use base64::Engine;
use reqwest::Client;

use super::{
    AdapterError, MediaHandle, SpeechRequest, SpeechSynthesizer,
    http::{ProxyPolicy, build_client, read_json},
    write_media,
};
use crate::config::XunfeiSettings;

pub const API_URL: &str = "https://tts-api.xfyun.cn/v2/tts";
const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Vendor codes meaning the app id or key pair is not accepted.
const AUTH_ERROR_CODES: [i64; 3] = [10105, 10313, 11200];

pub struct XunfeiSpeechSynthesizer {
    client: Client,
    app_id: String,
    api_key: String,
    api_secret: String,
    voice: String,
    format: String,
    speed: u32,
}

impl XunfeiSpeechSynthesizer {
    pub fn new(settings: &XunfeiSettings) -> Result<Self, AdapterError> {
        let require = |value: &Option<String>, key: &str| {
            value
                .clone()
                .ok_or_else(|| AdapterError::Config(format!("xunfei_tts.{} is not set", key)))
        };

        Ok(Self {
            client: build_client(
                "xunfei",
                &settings.network,
                DEFAULT_TIMEOUT_SECS,
                ProxyPolicy::Ignore,
            )?,
            app_id: require(&settings.app_id, "app_id")?,
            api_key: require(&settings.api_key, "api_key")?,
            api_secret: require(&settings.api_secret, "api_secret")?,
            voice: settings.voice.clone(),
            format: settings.format.clone(),
            speed: settings.speed,
        })
    }

    /// Base64 of the JSON business parameters sent in `X-Param`.
    fn encoded_params(&self) -> String {
        let aue = match self.format.as_str() {
            "wav" | "raw" | "pcm" => "raw",
            _ => "lame",
        };
        let params = serde_json::json!({
            "auf": "audio/L16;rate=16000",
            "aue": aue,
            "voice_name": self.voice,
            "speed": self.speed.to_string(),
            "engine_type": "intp65",
        });
        base64::engine::general_purpose::STANDARD.encode(params.to_string())
    }

    fn checksum(&self, cur_time: &str, param_b64: &str) -> String {
        let digest = md5::compute(format!("{}{}{}", self.api_key, cur_time, param_b64));
        format!("{:x}", digest)
    }
}

fn classify_vendor_code(code: i64, message: &str) -> AdapterError {
    if AUTH_ERROR_CODES.contains(&code) {
        AdapterError::Auth(format!("xunfei code {}: {}", code, message))
    } else {
        AdapterError::Rejected(format!("xunfei code {}: {}", code, message))
    }
}

#[async_trait]
impl SpeechSynthesizer for XunfeiSpeechSynthesizer {
    async fn synthesize(&self, request: &SpeechRequest) -> Result<MediaHandle, AdapterError> {
        let text = request.text.trim();
        if text.is_empty() {
            return Err(AdapterError::Rejected("narration text is empty".into()));
        }

        let cur_time = chrono::Utc::now().timestamp().to_string();
        let param_b64 = self.encoded_params();
        let checksum = self.checksum(&cur_time, &param_b64);

        let response = self
            .client
            .post(API_URL)
            .header("X-Appid", &self.app_id)
            .header("X-CurTime", &cur_time)
            .header("X-Param", &param_b64)
            .header("X-CheckSum", checksum)
            .json(&serde_json::json!({
                "text": base64::engine::general_purpose::STANDARD.encode(text),
                "app_id": self.app_id,
                "api_secret": self.api_secret,
            }))
            .send()
            .await?;

        let json = read_json(response).await?;
        let code = json["code"].as_i64().unwrap_or(-1);
        if code != 0 {
            let message = json["desc"]
                .as_str()
                .or_else(|| json["message"].as_str())
                .unwrap_or("unknown error");
            return Err(classify_vendor_code(code, &super::truncate_body(message)));
        }

        let audio = json["data"]["audio"]
            .as_str()
            .filter(|a| !a.is_empty())
            .ok_or_else(|| AdapterError::Parse("xunfei response has no audio".into()))?;
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(audio)
            .map_err(|e| AdapterError::Parse(format!("invalid base64 audio: {}", e)))?;

        write_media(&request.output_path, &bytes).await
    }
}
