//! Stage agents
//!
//! Every stage is a closed `{Production, Dummy}` pair. Production variants hold their adapters
//! and a retry policy; Dummy variants are offline and deterministic for a given persona.

pub mod asset;
pub mod audio;
pub mod camera;
pub mod composition;
pub mod script;
pub mod storyboard;

use std::path::{Path, PathBuf};

use uuid::Uuid;

pub use asset::AssetAgent;
pub use audio::AudioAgent;
pub use camera::CameraAgent;
pub use composition::CompositionAgent;
pub use script::ScriptAgent;
pub use storyboard::StoryboardAgent;

use crate::{
    capability::{CapabilityDecision, Mode, Provider},
    config::ServiceConfig,
    providers::{FailureKind, ProviderFactory, RetryPolicy, media::short_digest},
    workflow::types::{Stage, StageFailure, StageOutput, TaskContext},
};

/// Where one task's production artifacts are written.
#[derive(Debug, Clone)]
pub struct RunScope {
    pub task_id: Uuid,
    pub output_dir: PathBuf,
}

impl RunScope {
    pub fn new(task_id: Uuid, base_dir: &Path) -> Self {
        Self {
            task_id,
            output_dir: base_dir.join(task_id.to_string()),
        }
    }

    pub fn path(&self, file_name: &str) -> PathBuf {
        self.output_dir.join(file_name)
    }
}

/// Stable short digest of a persona, used to namespace placeholder URIs.
pub fn persona_digest(persona: &str) -> String {
    short_digest(&[persona.trim()])
}

fn provider_at(decision: &CapabilityDecision, position: usize) -> Result<Provider, StageFailure> {
    decision.providers.get(position).copied().ok_or_else(|| {
        StageFailure::new(
            FailureKind::Misconfigured,
            format!("{} decision names no provider", decision.stage),
        )
    })
}

/// The agent chosen for one stage of one run.
pub enum StageAgent {
    Script(ScriptAgent),
    Storyboard(StoryboardAgent),
    Asset(AssetAgent),
    Camera(CameraAgent),
    Composition(CompositionAgent),
    Audio(AudioAgent),
}

impl StageAgent {
    /// Build the variant the decision asks for. Adapter construction failures surface as
    /// `Misconfigured`.
    pub fn build(
        decision: &CapabilityDecision,
        config: &ServiceConfig,
        factory: &dyn ProviderFactory,
    ) -> Result<Self, StageFailure> {
        if decision.mode == Mode::Dummy {
            return Ok(Self::dummy(decision.stage));
        }

        let retry = RetryPolicy::from_settings(&config.retry);
        let agent = match decision.stage {
            Stage::Script => StageAgent::Script(ScriptAgent::Production {
                text: factory.text_generator(provider_at(decision, 0)?, config)?,
                retry,
            }),
            Stage::Storyboard => StageAgent::Storyboard(StoryboardAgent::Production {
                text: factory.text_generator(provider_at(decision, 0)?, config)?,
                retry,
            }),
            Stage::Asset => StageAgent::Asset(AssetAgent::Production {
                images: factory.image_generator(provider_at(decision, 0)?, config)?,
                retry,
            }),
            Stage::Camera => StageAgent::Camera(CameraAgent::Production),
            Stage::Composition => StageAgent::Composition(CompositionAgent::Production {
                composer: factory.media_composer(config)?,
                retry,
            }),
            Stage::Audio => StageAgent::Audio(AudioAgent::Production {
                speech: factory.speech_synthesizer(config)?,
                music: factory.music_generator(config)?,
                ambience: factory.ambience_generator(provider_at(decision, 2)?, config)?,
                composer: factory.media_composer(config)?,
                retry,
            }),
        };
        Ok(agent)
    }

    pub fn dummy(stage: Stage) -> Self {
        match stage {
            Stage::Script => StageAgent::Script(ScriptAgent::Dummy),
            Stage::Storyboard => StageAgent::Storyboard(StoryboardAgent::Dummy),
            Stage::Asset => StageAgent::Asset(AssetAgent::Dummy),
            Stage::Camera => StageAgent::Camera(CameraAgent::Dummy),
            Stage::Composition => StageAgent::Composition(CompositionAgent::Dummy),
            Stage::Audio => StageAgent::Audio(AudioAgent::Dummy),
        }
    }

    pub fn stage(&self) -> Stage {
        match self {
            StageAgent::Script(_) => Stage::Script,
            StageAgent::Storyboard(_) => Stage::Storyboard,
            StageAgent::Asset(_) => Stage::Asset,
            StageAgent::Camera(_) => Stage::Camera,
            StageAgent::Composition(_) => Stage::Composition,
            StageAgent::Audio(_) => Stage::Audio,
        }
    }

    pub fn mode(&self) -> Mode {
        let production = match self {
            StageAgent::Script(a) => matches!(a, ScriptAgent::Production { .. }),
            StageAgent::Storyboard(a) => matches!(a, StoryboardAgent::Production { .. }),
            StageAgent::Asset(a) => matches!(a, AssetAgent::Production { .. }),
            StageAgent::Camera(a) => matches!(a, CameraAgent::Production),
            StageAgent::Composition(a) => matches!(a, CompositionAgent::Production { .. }),
            StageAgent::Audio(a) => matches!(a, AudioAgent::Production { .. }),
        };
        if production { Mode::Production } else { Mode::Dummy }
    }

    /// Run the stage against a read-only view of the context.
    pub async fn run(
        &self,
        context: &TaskContext,
        scope: &RunScope,
    ) -> Result<StageOutput, StageFailure> {
        match self {
            StageAgent::Script(agent) => {
                Ok(StageOutput::Script(agent.run(&context.persona).await?))
            }
            StageAgent::Storyboard(agent) => Ok(StageOutput::Storyboard(
                agent
                    .run(&context.persona, context.require_script(Stage::Storyboard)?)
                    .await?,
            )),
            StageAgent::Asset(agent) => Ok(StageOutput::Assets(
                agent
                    .run(
                        &context.persona,
                        context.require_storyboard(Stage::Asset)?,
                        scope,
                    )
                    .await?,
            )),
            StageAgent::Camera(agent) => Ok(StageOutput::CameraPlan(
                agent.run(context.require_storyboard(Stage::Camera)?),
            )),
            StageAgent::Composition(agent) => Ok(StageOutput::Timeline(
                agent.run(context, scope).await?,
            )),
            StageAgent::Audio(agent) => Ok(StageOutput::Output(agent.run(context, scope).await?)),
        }
    }
}
