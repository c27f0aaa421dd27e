use std::{collections::HashMap, sync::Arc};

use super::RunScope;
use crate::{
    providers::{
        Clip, ComposeRequest, MediaComposer, RetryPolicy, media::PlaceholderComposer,
    },
    workflow::types::{
        CameraDirective, ComposedTimeline, ContractViolation, SceneAsset, Stage, StageFailure,
        TaskContext,
    },
};

pub const TIMELINE_FILE: &str = "timeline.mp4";

pub enum CompositionAgent {
    Production {
        composer: Arc<dyn MediaComposer>,
        retry: RetryPolicy,
    },
    Dummy,
}

impl CompositionAgent {
    pub async fn run(
        &self,
        context: &TaskContext,
        scope: &RunScope,
    ) -> Result<ComposedTimeline, StageFailure> {
        let request = ComposeRequest {
            clips: build_clips(context)?,
            output_path: scope.path(TIMELINE_FILE),
        };
        let duration_seconds: f64 = request.clips.iter().map(|c| c.duration_seconds).sum();

        let handle = match self {
            CompositionAgent::Production { composer, retry } => {
                retry
                    .call("timeline composition", || composer.compose(&request))
                    .await?
            }
            CompositionAgent::Dummy => PlaceholderComposer.compose(&request).await?,
        };

        Ok(ComposedTimeline {
            handle,
            scene_count: request.clips.len(),
            duration_seconds,
        })
    }
}

/// Join scenes with their camera directive and first image by scene index.
fn build_clips(context: &TaskContext) -> Result<Vec<Clip>, ContractViolation> {
    let scenes = context.require_storyboard(Stage::Composition)?;
    let plan: HashMap<usize, &CameraDirective> = context
        .require_camera_plan(Stage::Composition)?
        .iter()
        .map(|d| (d.scene_index, d))
        .collect();
    let assets: HashMap<usize, &SceneAsset> = context
        .require_assets(Stage::Composition)?
        .iter()
        .map(|a| (a.scene_index, a))
        .collect();

    scenes
        .iter()
        .map(|scene| {
            let missing = |what: &str| ContractViolation::Inconsistent {
                stage: Stage::Composition,
                detail: format!("scene {} has no {}", scene.index, what),
            };
            let directive = plan.get(&scene.index).ok_or_else(|| missing("camera directive"))?;
            let image = assets
                .get(&scene.index)
                .and_then(|a| a.handles.first())
                .ok_or_else(|| missing("image"))?;

            Ok(Clip {
                scene_index: scene.index,
                image: image.clone(),
                movement: directive.movement,
                speed: directive.speed,
                transition: directive.transition,
                duration_seconds: directive.duration_seconds,
            })
        })
        .collect()
}
