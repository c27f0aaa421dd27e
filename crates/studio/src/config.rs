//! Service configuration snapshot
//!
//! Values are read from an optional TOML file and then overlaid with environment variables.
//! The result is immutable: a task run captures one `Arc<ServiceConfig>` and never re-reads
//! the environment while it executes.

use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utils::paths::expand_path;

/// Environment variable pointing at the TOML file.
pub const CONFIG_PATH_ENV: &str = "VIDEO_GEN_CONFIG";
/// File picked up from the working directory when nothing else is configured.
pub const DEFAULT_CONFIG_PATH: &str = "config/services.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid config in {origin}: {source}")]
    Parse {
        origin: String,
        #[source]
        source: toml::de::Error,
    },
    #[error("Invalid value for {key}: {value:?}")]
    InvalidValue { key: String, value: String },
}

/// TLS verification: `verify = false` disables it, `verify = "/path/ca.pem"` adds a trust root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TlsVerify {
    Enabled(bool),
    TrustRoot(PathBuf),
}

impl Default for TlsVerify {
    fn default() -> Self {
        TlsVerify::Enabled(true)
    }
}

/// Per-provider network options, flattened into each provider table.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct NetworkSettings {
    pub timeout_seconds: Option<f64>,
    pub proxy: Option<String>,
    /// Honour `HTTP(S)_PROXY` from the environment. Off unless set explicitly.
    pub trust_env: bool,
    pub verify: TlsVerify,
}

impl NetworkSettings {
    pub fn timeout_or(&self, default_seconds: u64) -> Duration {
        match self.timeout_seconds {
            Some(secs) if secs > 0.0 => Duration::try_from_secs_f64(secs)
                .unwrap_or_else(|_| Duration::from_secs(default_seconds)),
            _ => Duration::from_secs(default_seconds),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct OpenAiSettings {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub model: String,
    pub image_model: String,
    pub temperature: f32,
    #[serde(flatten)]
    pub network: NetworkSettings,
}

impl Default for OpenAiSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: None,
            model: "gpt-4o-mini".to_string(),
            image_model: "gpt-image-1".to_string(),
            temperature: 0.3,
            network: NetworkSettings::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DeepSeekSettings {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub model: String,
    pub temperature: f32,
    #[serde(flatten)]
    pub network: NetworkSettings,
}

impl Default for DeepSeekSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: None,
            model: "deepseek-chat".to_string(),
            temperature: 0.3,
            network: NetworkSettings::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DoubaoSettings {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub model: String,
    pub negative_prompt: Option<String>,
    #[serde(flatten)]
    pub network: NetworkSettings,
}

impl Default for DoubaoSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: None,
            model: "doubao-vision".to_string(),
            negative_prompt: None,
            network: NetworkSettings::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct XunfeiSettings {
    pub app_id: Option<String>,
    pub api_key: Option<String>,
    pub api_secret: Option<String>,
    pub voice: String,
    pub format: String,
    pub speed: u32,
    #[serde(flatten)]
    pub network: NetworkSettings,
}

impl Default for XunfeiSettings {
    fn default() -> Self {
        Self {
            app_id: None,
            api_key: None,
            api_secret: None,
            voice: "xiaoyan".to_string(),
            format: "mp3".to_string(),
            speed: 50,
            network: NetworkSettings::default(),
        }
    }
}

/// Shared by the music and ambience tables; style and duration fall back to per-purpose
/// defaults in the adapter.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DashscopeSettings {
    pub api_key: Option<String>,
    pub model: String,
    pub style: Option<String>,
    pub duration_seconds: Option<u32>,
    #[serde(flatten)]
    pub network: NetworkSettings,
}

impl Default for DashscopeSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            model: "text-to-music-001".to_string(),
            style: None,
            duration_seconds: None,
            network: NetworkSettings::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct FreesoundSettings {
    pub api_key: Option<String>,
    pub search_query: String,
    pub license: String,
    #[serde(flatten)]
    pub network: NetworkSettings,
}

impl Default for FreesoundSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            search_query: "ancient chinese ambience".to_string(),
            license: "Creative Commons 0".to_string(),
            network: NetworkSettings::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct MediaSettings {
    pub ffmpeg_path: Option<String>,
    /// Upper bound for a single compose or mux invocation.
    pub timeout_seconds: u64,
}

impl Default for MediaSettings {
    fn default() -> Self {
        Self {
            ffmpeg_path: None,
            timeout_seconds: 600,
        }
    }
}

/// `provider = "..."` selection for a switchable stage.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ProviderSelection {
    pub provider: Option<String>,
}

impl ProviderSelection {
    /// The lower-cased selection, or the baseline when nothing is configured.
    pub fn selected_or(&self, baseline: &str) -> String {
        self.provider
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .unwrap_or(baseline)
            .to_lowercase()
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    pub output_dir: String,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            output_dir: "./var/output".to_string(),
        }
    }
}

impl StorageSettings {
    pub fn output_path(&self) -> PathBuf {
        expand_path(&self.output_dir)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    /// Pause before the single retry of a transient failure.
    pub delay_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self { delay_ms: 500 }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub openai: OpenAiSettings,
    pub deepseek: DeepSeekSettings,
    pub doubao: DoubaoSettings,
    #[serde(rename = "xunfei_tts")]
    pub xunfei: XunfeiSettings,
    pub dashscope_music: DashscopeSettings,
    pub dashscope_ambience: DashscopeSettings,
    pub freesound: FreesoundSettings,
    pub media: MediaSettings,
    pub text_generation: ProviderSelection,
    pub image_generation: ProviderSelection,
    pub ambience_generation: ProviderSelection,
    pub storage: StorageSettings,
    pub retry: RetrySettings,
}

/// Environment overlay. For each key the first non-empty variable wins over the file value.
const ENV_OVERRIDES: &[(&str, &[&str])] = &[
    ("openai.api_key", &["OPENAI_API_KEY"]),
    ("openai.base_url", &["OPENAI_BASE_URL"]),
    ("openai.model", &["OPENAI_MODEL"]),
    ("openai.image_model", &["OPENAI_IMAGE_MODEL"]),
    ("openai.temperature", &["OPENAI_TEMPERATURE"]),
    ("openai.proxy", &["OPENAI_PROXY"]),
    ("deepseek.api_key", &["DEEPSEEK_API_KEY"]),
    ("deepseek.base_url", &["DEEPSEEK_BASE_URL"]),
    ("deepseek.model", &["DEEPSEEK_MODEL"]),
    ("deepseek.temperature", &["DEEPSEEK_TEMPERATURE"]),
    ("doubao.api_key", &["DOUBAO_API_KEY"]),
    ("doubao.base_url", &["DOUBAO_BASE_URL"]),
    ("doubao.model", &["DOUBAO_MODEL"]),
    ("doubao.negative_prompt", &["DOUBAO_NEGATIVE_PROMPT"]),
    ("xunfei_tts.app_id", &["XUNFEI_APP_ID"]),
    ("xunfei_tts.api_key", &["XUNFEI_API_KEY"]),
    ("xunfei_tts.api_secret", &["XUNFEI_API_SECRET"]),
    ("xunfei_tts.voice", &["XUNFEI_VOICE"]),
    ("xunfei_tts.format", &["XUNFEI_FORMAT"]),
    ("xunfei_tts.speed", &["XUNFEI_SPEED"]),
    ("dashscope_music.api_key", &["DASHSCOPE_API_KEY"]),
    ("dashscope_music.model", &["DASHSCOPE_MUSIC_MODEL"]),
    ("dashscope_music.style", &["DASHSCOPE_MUSIC_STYLE"]),
    ("dashscope_music.duration_seconds", &["DASHSCOPE_MUSIC_DURATION"]),
    (
        "dashscope_ambience.api_key",
        &["DASHSCOPE_AMBIENCE_API_KEY", "DASHSCOPE_API_KEY"],
    ),
    ("dashscope_ambience.model", &["DASHSCOPE_AMBIENCE_MODEL"]),
    ("dashscope_ambience.style", &["DASHSCOPE_AMBIENCE_STYLE"]),
    (
        "dashscope_ambience.duration_seconds",
        &["DASHSCOPE_AMBIENCE_DURATION"],
    ),
    ("freesound.api_key", &["FREESOUND_API_KEY"]),
    ("media.ffmpeg_path", &["FFMPEG_PATH"]),
    ("text_generation.provider", &["TEXT_GENERATION_PROVIDER"]),
    ("image_generation.provider", &["IMAGE_GENERATION_PROVIDER"]),
    ("ambience_generation.provider", &["AMBIENCE_GENERATION_PROVIDER"]),
    ("storage.output_dir", &["VIDEO_GEN_OUTPUT_DIR"]),
];

impl ServiceConfig {
    /// Load from the process environment: explicit path, then `VIDEO_GEN_CONFIG`, then
    /// `config/services.toml` when present, then environment variables alone.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let env = |name: &str| std::env::var(name).ok();

        let config_path = match path {
            Some(p) => Some(p.to_path_buf()),
            None => match env(CONFIG_PATH_ENV).filter(|v| !v.trim().is_empty()) {
                Some(p) => Some(expand_path(&p)),
                None => {
                    let candidate = PathBuf::from(DEFAULT_CONFIG_PATH);
                    candidate.exists().then_some(candidate)
                }
            },
        };

        let file_contents = match &config_path {
            Some(p) => {
                tracing::debug!("Loading service config from {}", p.display());
                Some((
                    p.display().to_string(),
                    std::fs::read_to_string(p).map_err(|source| ConfigError::Read {
                        path: p.clone(),
                        source,
                    })?,
                ))
            }
            None => None,
        };

        Self::from_sources(
            file_contents.as_ref().map(|(o, c)| (o.as_str(), c.as_str())),
            env,
        )
    }

    /// Build a snapshot from optional `(origin, toml)` file contents and an environment lookup.
    pub fn from_sources<F>(file: Option<(&str, &str)>, env: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match file {
            Some((origin, contents)) => {
                toml::from_str::<ServiceConfig>(contents).map_err(|source| ConfigError::Parse {
                    origin: origin.to_string(),
                    source,
                })?
            }
            None => ServiceConfig::default(),
        };

        for (key, vars) in ENV_OVERRIDES {
            let value = vars
                .iter()
                .filter_map(|name| env(name))
                .map(|v| v.trim().to_string())
                .find(|v| !v.is_empty());
            if let Some(value) = value {
                config.set(key, value)?;
            }
        }

        config.normalize();
        Ok(config)
    }

    /// Parse TOML text without any environment overlay.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        Self::from_sources(Some(("<inline>", contents)), |_| None)
    }

    /// Look up a declared key (`section.field`). Empty strings count as absent.
    pub fn value(&self, key: &str) -> Option<&str> {
        let value = match key {
            "openai.api_key" => self.openai.api_key.as_deref(),
            "deepseek.api_key" => self.deepseek.api_key.as_deref(),
            "doubao.api_key" => self.doubao.api_key.as_deref(),
            "xunfei_tts.app_id" => self.xunfei.app_id.as_deref(),
            "xunfei_tts.api_key" => self.xunfei.api_key.as_deref(),
            "xunfei_tts.api_secret" => self.xunfei.api_secret.as_deref(),
            "dashscope_music.api_key" => self.dashscope_music.api_key.as_deref(),
            "dashscope_ambience.api_key" => self.dashscope_ambience.api_key.as_deref(),
            "freesound.api_key" => self.freesound.api_key.as_deref(),
            "media.ffmpeg_path" => self.media.ffmpeg_path.as_deref(),
            "text_generation.provider" => self.text_generation.provider.as_deref(),
            "image_generation.provider" => self.image_generation.provider.as_deref(),
            "ambience_generation.provider" => self.ambience_generation.provider.as_deref(),
            _ => None,
        };
        value.map(str::trim).filter(|v| !v.is_empty())
    }

    pub fn is_present(&self, key: &str) -> bool {
        self.value(key).is_some()
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), ConfigError> {
        let invalid = |value: &str| ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        };

        match key {
            "openai.api_key" => self.openai.api_key = Some(value),
            "openai.base_url" => self.openai.base_url = Some(value),
            "openai.model" => self.openai.model = value,
            "openai.image_model" => self.openai.image_model = value,
            "openai.temperature" => {
                self.openai.temperature = value.parse().map_err(|_| invalid(&value))?
            }
            "openai.proxy" => self.openai.network.proxy = Some(value),
            "deepseek.api_key" => self.deepseek.api_key = Some(value),
            "deepseek.base_url" => self.deepseek.base_url = Some(value),
            "deepseek.model" => self.deepseek.model = value,
            "deepseek.temperature" => {
                self.deepseek.temperature = value.parse().map_err(|_| invalid(&value))?
            }
            "doubao.api_key" => self.doubao.api_key = Some(value),
            "doubao.base_url" => self.doubao.base_url = Some(value),
            "doubao.model" => self.doubao.model = value,
            "doubao.negative_prompt" => self.doubao.negative_prompt = Some(value),
            "xunfei_tts.app_id" => self.xunfei.app_id = Some(value),
            "xunfei_tts.api_key" => self.xunfei.api_key = Some(value),
            "xunfei_tts.api_secret" => self.xunfei.api_secret = Some(value),
            "xunfei_tts.voice" => self.xunfei.voice = value,
            "xunfei_tts.format" => self.xunfei.format = value,
            "xunfei_tts.speed" => self.xunfei.speed = value.parse().map_err(|_| invalid(&value))?,
            "dashscope_music.api_key" => self.dashscope_music.api_key = Some(value),
            "dashscope_music.model" => self.dashscope_music.model = value,
            "dashscope_music.style" => self.dashscope_music.style = Some(value),
            "dashscope_music.duration_seconds" => {
                self.dashscope_music.duration_seconds =
                    Some(value.parse().map_err(|_| invalid(&value))?)
            }
            "dashscope_ambience.api_key" => self.dashscope_ambience.api_key = Some(value),
            "dashscope_ambience.model" => self.dashscope_ambience.model = value,
            "dashscope_ambience.style" => self.dashscope_ambience.style = Some(value),
            "dashscope_ambience.duration_seconds" => {
                self.dashscope_ambience.duration_seconds =
                    Some(value.parse().map_err(|_| invalid(&value))?)
            }
            "freesound.api_key" => self.freesound.api_key = Some(value),
            "media.ffmpeg_path" => self.media.ffmpeg_path = Some(value),
            "text_generation.provider" => self.text_generation.provider = Some(value),
            "image_generation.provider" => self.image_generation.provider = Some(value),
            "ambience_generation.provider" => self.ambience_generation.provider = Some(value),
            "storage.output_dir" => self.storage.output_dir = value,
            _ => return Err(invalid(&value)),
        }
        Ok(())
    }

    /// Blank strings from the file are treated the same as missing keys.
    fn normalize(&mut self) {
        fn blank_to_none(value: &mut Option<String>) {
            if value.as_deref().is_some_and(|v| v.trim().is_empty()) {
                *value = None;
            }
        }

        for value in [
            &mut self.openai.api_key,
            &mut self.openai.base_url,
            &mut self.openai.network.proxy,
            &mut self.deepseek.api_key,
            &mut self.deepseek.base_url,
            &mut self.doubao.api_key,
            &mut self.doubao.base_url,
            &mut self.xunfei.app_id,
            &mut self.xunfei.api_key,
            &mut self.xunfei.api_secret,
            &mut self.dashscope_music.api_key,
            &mut self.dashscope_ambience.api_key,
            &mut self.freesound.api_key,
            &mut self.media.ffmpeg_path,
        ] {
            blank_to_none(value);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults_without_sources() {
        let config = ServiceConfig::from_sources(None, |_| None).unwrap();
        assert_eq!(config.openai.model, "gpt-4o-mini");
        assert_eq!(config.openai.image_model, "gpt-image-1");
        assert_eq!(config.xunfei.voice, "xiaoyan");
        assert_eq!(config.xunfei.speed, 50);
        assert_eq!(config.storage.output_dir, "./var/output");
        assert_eq!(config.retry.delay_ms, 500);
        assert!(!config.is_present("openai.api_key"));
        assert_eq!(config.text_generation.selected_or("openai"), "openai");
    }

    #[test]
    fn test_file_values_are_parsed() {
        let toml = r#"
            [openai]
            api_key = "sk-file"
            model = "gpt-4o"
            timeout_seconds = 12.5
            proxy = "http://127.0.0.1:7890"
            verify = false

            [xunfei_tts]
            app_id = "app"
            api_key = "key"
            api_secret = "secret"

            [doubao]
            api_key = "doubao-key"
            verify = "/etc/ssl/custom.pem"

            [text_generation]
            provider = "DeepSeek"
        "#;
        let config = ServiceConfig::from_toml_str(toml).unwrap();
        assert_eq!(config.value("openai.api_key"), Some("sk-file"));
        assert_eq!(config.openai.model, "gpt-4o");
        assert_eq!(config.openai.network.timeout_or(60), Duration::from_secs_f64(12.5));
        assert_eq!(config.openai.network.proxy.as_deref(), Some("http://127.0.0.1:7890"));
        assert_eq!(config.openai.network.verify, TlsVerify::Enabled(false));
        assert_eq!(
            config.doubao.network.verify,
            TlsVerify::TrustRoot(PathBuf::from("/etc/ssl/custom.pem"))
        );
        assert!(config.is_present("xunfei_tts.api_secret"));
        assert_eq!(config.text_generation.selected_or("openai"), "deepseek");
    }

    #[test]
    fn test_env_overrides_file() {
        let toml = r#"
            [openai]
            api_key = "sk-file"
        "#;
        let env = env_from(&[("OPENAI_API_KEY", "sk-env"), ("OPENAI_MODEL", "gpt-4.1")]);
        let config = ServiceConfig::from_sources(Some(("test", toml)), env).unwrap();
        assert_eq!(config.value("openai.api_key"), Some("sk-env"));
        assert_eq!(config.openai.model, "gpt-4.1");
    }

    #[test]
    fn test_blank_env_does_not_override() {
        let toml = r#"
            [openai]
            api_key = "sk-file"
        "#;
        let env = env_from(&[("OPENAI_API_KEY", "   ")]);
        let config = ServiceConfig::from_sources(Some(("test", toml)), env).unwrap();
        assert_eq!(config.value("openai.api_key"), Some("sk-file"));
    }

    #[test]
    fn test_blank_file_value_counts_as_absent() {
        let toml = r#"
            [openai]
            api_key = "  "
        "#;
        let config = ServiceConfig::from_toml_str(toml).unwrap();
        assert!(!config.is_present("openai.api_key"));
        assert!(config.openai.api_key.is_none());
    }

    #[test]
    fn test_ambience_key_falls_back_to_shared_dashscope_key() {
        let env = env_from(&[("DASHSCOPE_API_KEY", "shared")]);
        let config = ServiceConfig::from_sources(None, env).unwrap();
        assert_eq!(config.value("dashscope_music.api_key"), Some("shared"));
        assert_eq!(config.value("dashscope_ambience.api_key"), Some("shared"));

        let env = env_from(&[
            ("DASHSCOPE_API_KEY", "shared"),
            ("DASHSCOPE_AMBIENCE_API_KEY", "dedicated"),
        ]);
        let config = ServiceConfig::from_sources(None, env).unwrap();
        assert_eq!(config.value("dashscope_ambience.api_key"), Some("dedicated"));
    }

    #[test]
    fn test_invalid_numeric_env_is_rejected() {
        let env = env_from(&[("XUNFEI_SPEED", "fast")]);
        let err = ServiceConfig::from_sources(None, env).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue { ref key, .. } if key == "xunfei_tts.speed"
        ));
    }

    #[test]
    fn test_malformed_file_is_parse_error() {
        let err = ServiceConfig::from_toml_str("[openai\napi_key = 1").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_load_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("services.toml");
        std::fs::write(
            &path,
            "[media]\nffmpeg_path = \"/usr/bin/ffmpeg\"\n[storage]\noutput_dir = \"/tmp/out\"\n",
        )
        .unwrap();

        let config = ServiceConfig::load(Some(&path)).unwrap();
        // FFMPEG_PATH may be set on the host; only the storage value is asserted strictly.
        assert!(config.is_present("media.ffmpeg_path"));
        if std::env::var("VIDEO_GEN_OUTPUT_DIR").is_err() {
            assert_eq!(config.storage.output_path(), PathBuf::from("/tmp/out"));
        }
    }

    #[test]
    fn test_load_missing_path_is_read_error() {
        let err = ServiceConfig::load(Some(Path::new("/definitely/missing/services.toml")))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_timeout_fallbacks() {
        let mut network = NetworkSettings::default();
        assert_eq!(network.timeout_or(60), Duration::from_secs(60));
        network.timeout_seconds = Some(-1.0);
        assert_eq!(network.timeout_or(30), Duration::from_secs(30));
        network.timeout_seconds = Some(f64::NAN);
        assert_eq!(network.timeout_or(30), Duration::from_secs(30));
    }

    #[test]
    fn test_out_of_range_timeout_falls_back() {
        let config = ServiceConfig::from_toml_str(
            r#"
            [openai]
            api_key = "sk"
            timeout_seconds = 1e30
            "#,
        )
        .unwrap();
        assert_eq!(config.openai.network.timeout_or(60), Duration::from_secs(60));

        let mut network = NetworkSettings::default();
        network.timeout_seconds = Some(f64::INFINITY);
        assert_eq!(network.timeout_or(45), Duration::from_secs(45));
    }
}
