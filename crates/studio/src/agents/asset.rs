use std::sync::Arc;

use super::{RunScope, persona_digest};
use crate::{
    capability::Provider,
    providers::{ImageGenerator, ImageRequest, MediaHandle, RetryPolicy},
    workflow::types::{Scene, SceneAsset, StageFailure},
};

pub enum AssetAgent {
    Production {
        images: Arc<dyn ImageGenerator>,
        retry: RetryPolicy,
    },
    Dummy,
}

fn image_prompt(provider: Provider, persona: &str, description: &str) -> String {
    match provider {
        Provider::Doubao => format!("{} {}. 中国风格，高清细节，纪录片质感。", persona, description),
        _ => format!(
            "{} {}. Historical authenticity, cinematic lighting, fine details.",
            persona, description
        ),
    }
}

pub fn scene_file_name(scene_index: usize) -> String {
    format!("scene-{:02}.png", scene_index)
}

impl AssetAgent {
    /// One image per scene, in storyboard order, keyed by scene index.
    pub async fn run(
        &self,
        persona: &str,
        scenes: &[Scene],
        scope: &RunScope,
    ) -> Result<Vec<SceneAsset>, StageFailure> {
        match self {
            AssetAgent::Production { images, retry } => {
                let mut assets = Vec::with_capacity(scenes.len());
                for scene in scenes {
                    let request = ImageRequest {
                        scene_index: scene.index,
                        prompt: image_prompt(images.provider(), persona, &scene.description),
                        negative_prompt: None,
                        output_path: scope.path(&scene_file_name(scene.index)),
                    };
                    let handle = retry
                        .call("image generation", || images.generate_image(&request))
                        .await?;
                    tracing::debug!("Scene {} image ready: {}", scene.index, handle);

                    assets.push(SceneAsset {
                        scene_index: scene.index,
                        prompt: request.prompt,
                        handles: vec![handle],
                    });
                }
                Ok(assets)
            }
            AssetAgent::Dummy => {
                let digest = persona_digest(persona);
                Ok(scenes
                    .iter()
                    .map(|scene| SceneAsset {
                        scene_index: scene.index,
                        prompt: format!("油画风格呈现{}{}", persona, scene.description),
                        handles: vec![MediaHandle::new(format!(
                            "{}assets/{}/{}",
                            MediaHandle::PLACEHOLDER_SCHEME,
                            digest,
                            scene_file_name(scene.index)
                        ))],
                    })
                    .collect())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use uuid::Uuid;

    use super::*;

    fn scenes() -> Vec<Scene> {
        (1..=3)
            .map(|index| Scene {
                index,
                description: format!("场景{}", index),
                mood: "reflective".into(),
                subtitle: String::new(),
                start_seconds: 0.0,
                duration_seconds: 10.0,
            })
            .collect()
    }

    #[tokio::test]
    async fn test_dummy_assets_are_placeholders_per_scene() {
        let scope = RunScope::new(Uuid::new_v4(), Path::new("/tmp"));
        let assets = AssetAgent::Dummy.run("诸葛亮", &scenes(), &scope).await.unwrap();

        assert_eq!(assets.len(), 3);
        let digest = persona_digest("诸葛亮");
        assert_eq!(
            assets[1].handles[0].as_str(),
            format!("placeholder://assets/{}/scene-02.png", digest)
        );
        assert!(assets.iter().all(|a| a.handles[0].is_placeholder()));
        assert!(assets[0].prompt.starts_with("油画风格呈现诸葛亮"));
    }

    #[test]
    fn test_prompt_style_follows_provider() {
        assert!(image_prompt(Provider::Doubao, "诸葛亮", "草庐").contains("中国风格"));
        assert!(image_prompt(Provider::OpenAi, "诸葛亮", "草庐").contains("cinematic lighting"));
    }
}
