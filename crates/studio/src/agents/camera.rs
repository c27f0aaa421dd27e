use crate::workflow::types::{CameraDirective, CameraMovement, Scene, Transition};

const DUMMY_CYCLE: [CameraMovement; 3] = [
    CameraMovement::ZoomIn,
    CameraMovement::PanRight,
    CameraMovement::KenBurns,
];

/// Shot design is offline in both variants; production reads the storyboard's moods.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraAgent {
    Production,
    Dummy,
}

impl CameraAgent {
    pub fn run(&self, scenes: &[Scene]) -> Vec<CameraDirective> {
        scenes
            .iter()
            .enumerate()
            .map(|(position, scene)| {
                let (movement, speed) = match self {
                    CameraAgent::Production => mood_template(&scene.mood, position),
                    CameraAgent::Dummy => (DUMMY_CYCLE[position % DUMMY_CYCLE.len()], 0.5),
                };
                CameraDirective {
                    scene_index: scene.index,
                    movement,
                    speed,
                    transition: (position > 0).then_some(Transition::Crossfade),
                    duration_seconds: scene.duration_seconds,
                }
            })
            .collect()
    }
}

/// Movement and speed for a scene mood. Unrecognised moods alternate pans by position.
pub fn mood_template(mood: &str, position: usize) -> (CameraMovement, f32) {
    match mood.trim().to_lowercase().as_str() {
        "dramatic" | "tense" | "epic" => (CameraMovement::ZoomIn, 0.8),
        "reflective" | "calm" | "melancholy" | "nostalgic" => (CameraMovement::KenBurns, 0.4),
        "triumphant" | "hopeful" => (CameraMovement::ZoomOut, 0.6),
        _ if position % 2 == 0 => (CameraMovement::PanRight, 0.5),
        _ => (CameraMovement::PanLeft, 0.5),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scene(index: usize, mood: &str) -> Scene {
        Scene {
            index,
            description: String::new(),
            mood: mood.into(),
            subtitle: String::new(),
            start_seconds: 0.0,
            duration_seconds: 12.5,
        }
    }

    #[test]
    fn test_dummy_cycles_movements() {
        let scenes: Vec<Scene> = (1..=4).map(|i| scene(i, "neutral")).collect();
        let plan = CameraAgent::Dummy.run(&scenes);
        let movements: Vec<CameraMovement> = plan.iter().map(|d| d.movement).collect();
        assert_eq!(
            movements,
            vec![
                CameraMovement::ZoomIn,
                CameraMovement::PanRight,
                CameraMovement::KenBurns,
                CameraMovement::ZoomIn
            ]
        );
        assert_eq!(plan[0].transition, None);
        assert_eq!(plan[1].transition, Some(Transition::Crossfade));
        assert_eq!(plan[3].duration_seconds, 12.5);
    }

    #[test]
    fn test_production_follows_mood() {
        let scenes = vec![
            scene(1, "Dramatic"),
            scene(2, "calm"),
            scene(3, "hopeful"),
            scene(4, "mysterious"),
            scene(5, "mysterious"),
        ];
        let plan = CameraAgent::Production.run(&scenes);
        assert_eq!(plan[0].movement, CameraMovement::ZoomIn);
        assert_eq!(plan[0].speed, 0.8);
        assert_eq!(plan[1].movement, CameraMovement::KenBurns);
        assert_eq!(plan[2].movement, CameraMovement::ZoomOut);
        assert_eq!(plan[3].movement, CameraMovement::PanLeft);
        assert_eq!(plan[4].movement, CameraMovement::PanRight);
        assert_eq!(
            plan.iter().map(|d| d.scene_index).collect::<Vec<_>>(),
            vec![1, 2, 3, 4, 5]
        );
    }
}
