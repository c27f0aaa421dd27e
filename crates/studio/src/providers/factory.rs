use std::sync::Arc;

use super::{
    AdapterError, AmbienceGenerator, ImageGenerator, MediaComposer, MusicGenerator,
    SpeechSynthesizer, TextGenerator,
    dashscope::{DashscopeAudioGenerator, Purpose},
    deepseek, doubao::DoubaoImageGenerator,
    freesound::FreesoundAmbience,
    media::FfmpegComposer,
    openai::{self, OpenAiImageGenerator},
    xunfei::XunfeiSpeechSynthesizer,
};
use crate::{capability::Provider, config::ServiceConfig};

/// Builds adapters for production agents. Swapped for fakes in tests.
pub trait ProviderFactory: Send + Sync {
    fn text_generator(
        &self,
        provider: Provider,
        config: &ServiceConfig,
    ) -> Result<Arc<dyn TextGenerator>, AdapterError>;

    fn image_generator(
        &self,
        provider: Provider,
        config: &ServiceConfig,
    ) -> Result<Arc<dyn ImageGenerator>, AdapterError>;

    fn speech_synthesizer(
        &self,
        config: &ServiceConfig,
    ) -> Result<Arc<dyn SpeechSynthesizer>, AdapterError>;

    fn music_generator(&self, config: &ServiceConfig)
    -> Result<Arc<dyn MusicGenerator>, AdapterError>;

    fn ambience_generator(
        &self,
        provider: Provider,
        config: &ServiceConfig,
    ) -> Result<Arc<dyn AmbienceGenerator>, AdapterError>;

    fn media_composer(&self, config: &ServiceConfig)
    -> Result<Arc<dyn MediaComposer>, AdapterError>;
}

fn unsupported(role: &str, provider: Provider) -> AdapterError {
    AdapterError::Config(format!("{} is not a {} provider", provider, role))
}

/// The real HTTP and ffmpeg adapters.
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpProviderFactory;

impl ProviderFactory for HttpProviderFactory {
    fn text_generator(
        &self,
        provider: Provider,
        config: &ServiceConfig,
    ) -> Result<Arc<dyn TextGenerator>, AdapterError> {
        match provider {
            Provider::OpenAi => Ok(Arc::new(openai::text_generator(&config.openai)?)),
            Provider::DeepSeek => Ok(Arc::new(deepseek::text_generator(&config.deepseek)?)),
            other => Err(unsupported("text", other)),
        }
    }

    fn image_generator(
        &self,
        provider: Provider,
        config: &ServiceConfig,
    ) -> Result<Arc<dyn ImageGenerator>, AdapterError> {
        match provider {
            Provider::OpenAi => Ok(Arc::new(OpenAiImageGenerator::new(&config.openai)?)),
            Provider::Doubao => Ok(Arc::new(DoubaoImageGenerator::new(&config.doubao)?)),
            other => Err(unsupported("image", other)),
        }
    }

    fn speech_synthesizer(
        &self,
        config: &ServiceConfig,
    ) -> Result<Arc<dyn SpeechSynthesizer>, AdapterError> {
        Ok(Arc::new(XunfeiSpeechSynthesizer::new(&config.xunfei)?))
    }

    fn music_generator(
        &self,
        config: &ServiceConfig,
    ) -> Result<Arc<dyn MusicGenerator>, AdapterError> {
        Ok(Arc::new(DashscopeAudioGenerator::new(
            Purpose::Music,
            &config.dashscope_music,
        )?))
    }

    fn ambience_generator(
        &self,
        provider: Provider,
        config: &ServiceConfig,
    ) -> Result<Arc<dyn AmbienceGenerator>, AdapterError> {
        match provider {
            Provider::DashscopeAmbience => Ok(Arc::new(DashscopeAudioGenerator::new(
                Purpose::Ambience,
                &config.dashscope_ambience,
            )?)),
            Provider::Freesound => Ok(Arc::new(FreesoundAmbience::new(&config.freesound)?)),
            other => Err(unsupported("ambience", other)),
        }
    }

    fn media_composer(
        &self,
        config: &ServiceConfig,
    ) -> Result<Arc<dyn MediaComposer>, AdapterError> {
        Ok(Arc::new(FfmpegComposer::new(&config.media)?))
    }
}
