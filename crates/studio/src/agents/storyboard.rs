use std::sync::Arc;

use serde_json::Value;

use crate::{
    providers::{AdapterError, JsonCompletionRequest, RetryPolicy, TextGenerator},
    workflow::types::{Scene, Script, StageFailure},
};

/// Scene count of the offline storyboard.
pub const SCENE_COUNT: usize = 3;

const FALLBACK_TOTAL_SECONDS: f64 = 120.0;
const DEFAULT_SHOT_SECONDS: f64 = 30.0;

const DIRECTOR_PROMPT: &str = "You are a senior video director. \
    Convert the provided script sections into a storyboard. \
    Return JSON with 'shots', each containing shot_id, start_seconds, duration_seconds, scene, \
    mood, subtitle.";

pub enum StoryboardAgent {
    Production {
        text: Arc<dyn TextGenerator>,
        retry: RetryPolicy,
    },
    Dummy,
}

impl StoryboardAgent {
    pub async fn run(&self, persona: &str, script: &Script) -> Result<Vec<Scene>, StageFailure> {
        match self {
            StoryboardAgent::Production { text, retry } => {
                let request = storyboard_request(persona, script);
                let json = retry
                    .call("storyboard generation", || text.complete_json(&request))
                    .await?;
                Ok(parse_shots(&json)?)
            }
            StoryboardAgent::Dummy => Ok(dummy_scenes(persona, script)),
        }
    }
}

fn storyboard_request(persona: &str, script: &Script) -> JsonCompletionRequest {
    let sections: Vec<Value> = script
        .sections
        .iter()
        .map(|s| {
            serde_json::json!({
                "section": s.section,
                "timeframe": s.timeframe,
                "summary": s.summary,
            })
        })
        .collect();

    JsonCompletionRequest {
        system_prompt: DIRECTOR_PROMPT.to_string(),
        user_content: serde_json::json!({ "persona": persona, "script": sections }).to_string(),
    }
}

fn seconds(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    parsed.filter(|v| v.is_finite() && *v >= 0.0)
}

/// Shots are re-indexed in the order returned; missing start times run back to back.
pub fn parse_shots(json: &Value) -> Result<Vec<Scene>, AdapterError> {
    let shots = json["shots"].as_array().map(Vec::as_slice).unwrap_or(&[]);

    let mut cursor = 0.0;
    let mut scenes = Vec::with_capacity(shots.len());
    for shot in shots.iter().filter(|s| s.is_object()) {
        let start_seconds = seconds(&shot["start_seconds"]).unwrap_or(cursor);
        let duration_seconds = seconds(&shot["duration_seconds"])
            .filter(|d| *d > 0.0)
            .unwrap_or(DEFAULT_SHOT_SECONDS);
        cursor = start_seconds + duration_seconds;

        scenes.push(Scene {
            index: scenes.len() + 1,
            description: shot["scene"].as_str().unwrap_or_default().to_string(),
            mood: shot["mood"]
                .as_str()
                .filter(|m| !m.trim().is_empty())
                .unwrap_or("neutral")
                .to_string(),
            subtitle: shot["subtitle"].as_str().unwrap_or_default().to_string(),
            start_seconds,
            duration_seconds,
        });
    }

    if scenes.is_empty() {
        return Err(AdapterError::Parse(
            "storyboard generation returned no shots".into(),
        ));
    }
    Ok(scenes)
}

/// Split the script's timeline into `SCENE_COUNT` equal scenes.
fn dummy_scenes(persona: &str, script: &Script) -> Vec<Scene> {
    let total = match script.total_seconds() {
        t if t > 0.0 => t,
        _ => FALLBACK_TOTAL_SECONDS,
    };
    let duration = total / SCENE_COUNT as f64;

    (0..SCENE_COUNT)
        .map(|i| {
            let section = script.sections.get(i);
            let name = section.map(|s| s.section.as_str()).unwrap_or("scene");
            Scene {
                index: i + 1,
                description: format!("视觉化{}，展示{}的相关场景", name, persona),
                mood: if i == 1 { "dramatic" } else { "reflective" }.to_string(),
                subtitle: section.map(|s| s.summary.clone()).unwrap_or_default(),
                start_seconds: i as f64 * duration,
                duration_seconds: duration,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::agents::script::ScriptAgent;

    #[tokio::test]
    async fn test_dummy_storyboard_has_three_equal_scenes() {
        let script = ScriptAgent::Dummy.run("诸葛亮").await.unwrap();
        let scenes = StoryboardAgent::Dummy.run("诸葛亮", &script).await.unwrap();

        assert_eq!(scenes.len(), SCENE_COUNT);
        assert_eq!(
            scenes.iter().map(|s| s.index).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
        assert!(scenes.iter().all(|s| s.duration_seconds == 40.0));
        assert_eq!(scenes[1].mood, "dramatic");
        assert!(scenes[0].description.contains("introduction"));
        assert_eq!(scenes[2].subtitle, script.sections[2].summary);
    }

    #[test]
    fn test_dummy_storyboard_with_empty_script() {
        let script = Script::from_sections(Vec::new(), 40.0);
        let scenes = dummy_scenes("诸葛亮", &script);
        assert_eq!(scenes.len(), 3);
        assert_eq!(scenes[2].start_seconds, 80.0);
        assert!(scenes[0].subtitle.is_empty());
    }

    #[test]
    fn test_parse_shots_fills_defaults() {
        let scenes = parse_shots(&json!({
            "shots": [
                { "shot_id": "a", "scene": "草庐", "mood": "calm", "duration_seconds": 20 },
                { "shot_id": "b", "scene": "赤壁", "start_seconds": "25" },
            ]
        }))
        .unwrap();
        assert_eq!(scenes[0].start_seconds, 0.0);
        assert_eq!(scenes[0].duration_seconds, 20.0);
        assert_eq!(scenes[1].index, 2);
        assert_eq!(scenes[1].start_seconds, 25.0);
        assert_eq!(scenes[1].duration_seconds, DEFAULT_SHOT_SECONDS);
        assert_eq!(scenes[1].mood, "neutral");
    }

    #[test]
    fn test_parse_shots_empty_is_error() {
        assert!(parse_shots(&json!({ "shots": [] })).is_err());
        assert!(parse_shots(&json!({})).is_err());
    }
}
