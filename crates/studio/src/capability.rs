//! Capability registry
//!
//! Decides per stage whether the production agent can run, purely from the declared
//! required keys of the selected provider(s) and the configuration snapshot.

use serde::{Deserialize, Serialize};

use crate::{config::ServiceConfig, workflow::types::Stage};

/// Every external provider the pipeline knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provider {
    #[serde(rename = "openai")]
    OpenAi,
    #[serde(rename = "deepseek")]
    DeepSeek,
    Doubao,
    Xunfei,
    DashscopeMusic,
    DashscopeAmbience,
    Freesound,
    Ffmpeg,
}

impl Provider {
    /// Configuration keys that must be present and non-empty for the provider to be usable.
    pub fn required_keys(self) -> &'static [&'static str] {
        match self {
            Provider::OpenAi => &["openai.api_key"],
            Provider::DeepSeek => &["deepseek.api_key"],
            Provider::Doubao => &["doubao.api_key"],
            Provider::Xunfei => &[
                "xunfei_tts.app_id",
                "xunfei_tts.api_key",
                "xunfei_tts.api_secret",
            ],
            Provider::DashscopeMusic => &["dashscope_music.api_key"],
            Provider::DashscopeAmbience => &["dashscope_ambience.api_key"],
            Provider::Freesound => &["freesound.api_key"],
            Provider::Ffmpeg => &["media.ffmpeg_path"],
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Provider::OpenAi => "openai",
            Provider::DeepSeek => "deepseek",
            Provider::Doubao => "doubao",
            Provider::Xunfei => "xunfei",
            Provider::DashscopeMusic => "dashscope_music",
            Provider::DashscopeAmbience => "dashscope_ambience",
            Provider::Freesound => "freesound",
            Provider::Ffmpeg => "ffmpeg",
        }
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

pub const TEXT_BASELINE: &str = "openai";
pub const IMAGE_BASELINE: &str = "openai";
pub const AMBIENCE_BASELINE: &str = "dashscope";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Mode {
    Production,
    Dummy,
}

/// The outcome of resolving one stage against one configuration snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapabilityDecision {
    pub stage: Stage,
    pub mode: Mode,
    /// Providers the production agent would use, in call order.
    pub providers: Vec<Provider>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub missing_keys: Vec<String>,
    /// Set when a switchable stage names a provider that does not exist.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unknown_provider: Option<String>,
}

impl CapabilityDecision {
    pub fn is_production(&self) -> bool {
        self.mode == Mode::Production
    }

    fn dummy_for_unknown(stage: Stage, name: String) -> Self {
        Self {
            stage,
            mode: Mode::Dummy,
            providers: Vec::new(),
            missing_keys: Vec::new(),
            unknown_provider: Some(name),
        }
    }
}

/// Text provider chosen for the script, storyboard and camera stages.
pub fn text_provider(config: &ServiceConfig) -> Result<Provider, String> {
    match config.text_generation.selected_or(TEXT_BASELINE).as_str() {
        "openai" => Ok(Provider::OpenAi),
        "deepseek" => Ok(Provider::DeepSeek),
        other => Err(other.to_string()),
    }
}

pub fn image_provider(config: &ServiceConfig) -> Result<Provider, String> {
    match config.image_generation.selected_or(IMAGE_BASELINE).as_str() {
        "openai" => Ok(Provider::OpenAi),
        "doubao" => Ok(Provider::Doubao),
        other => Err(other.to_string()),
    }
}

pub fn ambience_provider(config: &ServiceConfig) -> Result<Provider, String> {
    match config.ambience_generation.selected_or(AMBIENCE_BASELINE).as_str() {
        "dashscope" | "dashscope_ambience" => Ok(Provider::DashscopeAmbience),
        "freesound" => Ok(Provider::Freesound),
        other => Err(other.to_string()),
    }
}

/// Providers a stage's production agent depends on.
pub fn stage_providers(stage: Stage, config: &ServiceConfig) -> Result<Vec<Provider>, String> {
    Ok(match stage {
        Stage::Script | Stage::Storyboard | Stage::Camera => vec![text_provider(config)?],
        Stage::Asset => vec![image_provider(config)?],
        Stage::Composition => vec![Provider::Ffmpeg],
        Stage::Audio => vec![
            Provider::Xunfei,
            Provider::DashscopeMusic,
            ambience_provider(config)?,
            Provider::Ffmpeg,
        ],
    })
}

/// Resolve a stage to Production or Dummy. A missing key on the selected provider always
/// yields Dummy; there is no fallback to a sibling provider.
pub fn resolve(stage: Stage, config: &ServiceConfig) -> CapabilityDecision {
    let providers = match stage_providers(stage, config) {
        Ok(providers) => providers,
        Err(unknown) => return CapabilityDecision::dummy_for_unknown(stage, unknown),
    };

    let missing_keys: Vec<String> = providers
        .iter()
        .flat_map(|p| p.required_keys().iter())
        .filter(|key| !config.is_present(key))
        .map(|key| key.to_string())
        .collect();

    let mode = if missing_keys.is_empty() {
        Mode::Production
    } else {
        Mode::Dummy
    };

    CapabilityDecision {
        stage,
        mode,
        providers,
        missing_keys,
        unknown_provider: None,
    }
}

/// Decisions for all six stages, in pipeline order.
pub fn resolve_all(config: &ServiceConfig) -> Vec<CapabilityDecision> {
    Stage::ALL.iter().map(|stage| resolve(*stage, config)).collect()
}
