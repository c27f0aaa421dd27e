//! In-process fakes for pipeline tests. No network, no ffmpeg.

use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use async_trait::async_trait;
use serde_json::json;

use crate::{
    capability::Provider,
    config::ServiceConfig,
    providers::{
        AdapterError, AmbienceGenerator, ComposeRequest, ImageGenerator, ImageRequest,
        JsonCompletionRequest, MediaComposer, MediaHandle, MusicGenerator, MuxRequest,
        ProviderFactory, SoundtrackRequest, SpeechRequest, SpeechSynthesizer, TextGenerator,
    },
};

const PRODUCTION_TOML: &str = r#"
    [openai]
    api_key = "sk-test"
    [deepseek]
    api_key = "ds-test"
    [xunfei_tts]
    app_id = "app"
    api_key = "key"
    api_secret = "secret"
    [dashscope_music]
    api_key = "music"
    [dashscope_ambience]
    api_key = "ambience"
    [media]
    ffmpeg_path = "/usr/bin/ffmpeg"
    [retry]
    delay_ms = 0
"#;

fn with_temp_output(mut config: ServiceConfig) -> ServiceConfig {
    config.storage.output_dir = std::env::temp_dir()
        .join("studio-tests")
        .display()
        .to_string();
    config
}

/// Every stage resolves to production.
pub fn production_config() -> ServiceConfig {
    with_temp_output(ServiceConfig::from_toml_str(PRODUCTION_TOML).unwrap())
}

/// The selected text provider (deepseek) has no key; everything else is configured.
pub fn mixed_config() -> ServiceConfig {
    let mut config = production_config();
    config.deepseek.api_key = None;
    config.text_generation.provider = Some("deepseek".into());
    config
}

#[derive(Clone, Default)]
pub struct FakeFactory {
    /// Image calls that fail with a timeout before the fake starts succeeding.
    pub image_failures: usize,
    pub image_calls: Arc<AtomicUsize>,
    /// Every image call answers HTTP 401.
    pub unauthorized_images: bool,
    pub broken_composer: bool,
    /// The text adapter panics mid-call.
    pub panicking_text: bool,
    /// Narration calls that time out before the fake starts succeeding.
    pub narration_failures: usize,
    /// Narration answers with a vendor auth code.
    pub narration_auth_error: bool,
    /// Whole ambience invocations that fail with a 503, as a failed preview download would.
    pub ambience_failures: usize,
    pub narration_calls: Arc<AtomicUsize>,
    pub music_calls: Arc<AtomicUsize>,
    pub ambience_calls: Arc<AtomicUsize>,
}

impl FakeFactory {
    pub fn failing_images(failures: usize) -> Self {
        Self {
            image_failures: failures,
            ..Default::default()
        }
    }

    pub fn failing_narration(failures: usize) -> Self {
        Self {
            narration_failures: failures,
            ..Default::default()
        }
    }

    fn audio(&self) -> FakeAudio {
        FakeAudio {
            narration_failures: self.narration_failures,
            narration_auth_error: self.narration_auth_error,
            ambience_failures: self.ambience_failures,
            narration_calls: self.narration_calls.clone(),
            music_calls: self.music_calls.clone(),
            ambience_calls: self.ambience_calls.clone(),
        }
    }
}

pub fn calls(counter: &Arc<AtomicUsize>) -> usize {
    counter.load(Ordering::SeqCst)
}

struct FakeText {
    provider: Provider,
    panics: bool,
}

#[async_trait]
impl TextGenerator for FakeText {
    fn provider(&self) -> Provider {
        self.provider
    }

    async fn complete_json(
        &self,
        request: &JsonCompletionRequest,
    ) -> Result<serde_json::Value, AdapterError> {
        if self.panics {
            panic!("fake text adapter blew up");
        }
        if request.system_prompt.contains("director") {
            return Ok(json!({
                "shots": [
                    { "shot_id": "1", "scene": "隆中草庐", "mood": "calm", "start_seconds": 0, "duration_seconds": 20 },
                    { "shot_id": "2", "scene": "赤壁火攻", "mood": "epic", "start_seconds": 20, "duration_seconds": 25 },
                ]
            }));
        }
        Ok(json!({
            "sections": [
                { "section": "introduction", "timeframe": "181", "summary": "生于琅琊", "citations": ["三国志"] },
                { "section": "legacy", "timeframe": "234", "summary": "鞠躬尽瘁", "citations": "出师表" },
            ]
        }))
    }
}

struct FakeImages {
    failures: usize,
    unauthorized: bool,
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl ImageGenerator for FakeImages {
    fn provider(&self) -> Provider {
        Provider::OpenAi
    }

    async fn generate_image(&self, request: &ImageRequest) -> Result<MediaHandle, AdapterError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if self.unauthorized {
            return Err(AdapterError::from_status(
                401,
                r#"{"error":{"code":"invalid_api_key"}}"#,
                None,
            ));
        }
        if call < self.failures {
            return Err(AdapterError::Timeout("fake image timeout".into()));
        }
        Ok(MediaHandle::new(format!(
            "fake://scene-{:02}.png",
            request.scene_index
        )))
    }
}

struct FakeAudio {
    narration_failures: usize,
    narration_auth_error: bool,
    ambience_failures: usize,
    narration_calls: Arc<AtomicUsize>,
    music_calls: Arc<AtomicUsize>,
    ambience_calls: Arc<AtomicUsize>,
}

#[async_trait]
impl SpeechSynthesizer for FakeAudio {
    async fn synthesize(&self, _request: &SpeechRequest) -> Result<MediaHandle, AdapterError> {
        let call = self.narration_calls.fetch_add(1, Ordering::SeqCst);
        if self.narration_auth_error {
            return Err(AdapterError::Auth("xunfei code 10105: illegal access".into()));
        }
        if call < self.narration_failures {
            return Err(AdapterError::Timeout("fake narration timeout".into()));
        }
        Ok(MediaHandle::new("fake://narration.mp3"))
    }
}

#[async_trait]
impl MusicGenerator for FakeAudio {
    async fn generate_music(
        &self,
        _request: &SoundtrackRequest,
    ) -> Result<MediaHandle, AdapterError> {
        self.music_calls.fetch_add(1, Ordering::SeqCst);
        Ok(MediaHandle::new("fake://music.mp3"))
    }
}

#[async_trait]
impl AmbienceGenerator for FakeAudio {
    fn provider(&self) -> Provider {
        Provider::DashscopeAmbience
    }

    async fn generate_ambience(
        &self,
        _request: &SoundtrackRequest,
    ) -> Result<MediaHandle, AdapterError> {
        let call = self.ambience_calls.fetch_add(1, Ordering::SeqCst);
        if call < self.ambience_failures {
            return Err(AdapterError::from_status(503, "preview download unavailable", None));
        }
        Ok(MediaHandle::new("fake://ambience.mp3"))
    }
}

struct FakeComposer;

#[async_trait]
impl MediaComposer for FakeComposer {
    async fn compose(&self, _request: &ComposeRequest) -> Result<MediaHandle, AdapterError> {
        Ok(MediaHandle::new("fake://timeline.mp4"))
    }

    async fn mux(&self, _request: &MuxRequest) -> Result<MediaHandle, AdapterError> {
        Ok(MediaHandle::new("fake://final.mp4"))
    }
}

impl ProviderFactory for FakeFactory {
    fn text_generator(
        &self,
        provider: Provider,
        _config: &ServiceConfig,
    ) -> Result<Arc<dyn TextGenerator>, AdapterError> {
        Ok(Arc::new(FakeText {
            provider,
            panics: self.panicking_text,
        }))
    }

    fn image_generator(
        &self,
        _provider: Provider,
        _config: &ServiceConfig,
    ) -> Result<Arc<dyn ImageGenerator>, AdapterError> {
        Ok(Arc::new(FakeImages {
            failures: self.image_failures,
            unauthorized: self.unauthorized_images,
            calls: self.image_calls.clone(),
        }))
    }

    fn speech_synthesizer(
        &self,
        _config: &ServiceConfig,
    ) -> Result<Arc<dyn SpeechSynthesizer>, AdapterError> {
        Ok(Arc::new(self.audio()))
    }

    fn music_generator(
        &self,
        _config: &ServiceConfig,
    ) -> Result<Arc<dyn MusicGenerator>, AdapterError> {
        Ok(Arc::new(self.audio()))
    }

    fn ambience_generator(
        &self,
        _provider: Provider,
        _config: &ServiceConfig,
    ) -> Result<Arc<dyn AmbienceGenerator>, AdapterError> {
        Ok(Arc::new(self.audio()))
    }

    fn media_composer(
        &self,
        _config: &ServiceConfig,
    ) -> Result<Arc<dyn MediaComposer>, AdapterError> {
        if self.broken_composer {
            return Err(AdapterError::Config("ffmpeg not found at /usr/bin/ffmpeg".into()));
        }
        Ok(Arc::new(FakeComposer))
    }
}
