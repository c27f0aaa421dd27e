use std::sync::Arc;

use super::{RunScope, persona_digest};
use crate::{
    providers::{
        AmbienceGenerator, MediaComposer, MediaHandle, MusicGenerator, MuxRequest, RetryPolicy,
        SoundtrackRequest, SpeechRequest, SpeechSynthesizer, media::PlaceholderComposer,
        write_media,
    },
    workflow::types::{FinalOutput, Script, Stage, StageFailure, TaskContext},
};

pub const NARRATION_FILE: &str = "narration.mp3";
pub const MUSIC_FILE: &str = "music.mp3";
pub const AMBIENCE_FILE: &str = "ambience.mp3";
pub const SUBTITLES_FILE: &str = "subtitles.srt";
pub const FINAL_FILE: &str = "final.mp4";

pub enum AudioAgent {
    Production {
        speech: Arc<dyn SpeechSynthesizer>,
        music: Arc<dyn MusicGenerator>,
        ambience: Arc<dyn AmbienceGenerator>,
        composer: Arc<dyn MediaComposer>,
        retry: RetryPolicy,
    },
    Dummy,
}

impl AudioAgent {
    pub async fn run(
        &self,
        context: &TaskContext,
        scope: &RunScope,
    ) -> Result<FinalOutput, StageFailure> {
        let script = context.require_script(Stage::Audio)?;
        let timeline = context.require_timeline(Stage::Audio)?;

        match self {
            AudioAgent::Production {
                speech,
                music,
                ambience,
                composer,
                retry,
            } => {
                let speech_request = SpeechRequest {
                    text: script.text.clone(),
                    output_path: scope.path(NARRATION_FILE),
                };
                let music_request = SoundtrackRequest {
                    persona: context.persona.clone(),
                    output_path: scope.path(MUSIC_FILE),
                };
                let ambience_request = SoundtrackRequest {
                    persona: context.persona.clone(),
                    output_path: scope.path(AMBIENCE_FILE),
                };

                // Retry is per call: a sibling that already succeeded is never re-issued.
                let (narration, music, ambience) = tokio::join!(
                    retry.call("narration", || speech.synthesize(&speech_request)),
                    retry.call("music", || music.generate_music(&music_request)),
                    retry.call("ambience", || ambience.generate_ambience(&ambience_request)),
                );
                let (narration, music, ambience) = (narration?, music?, ambience?);

                let subtitles =
                    write_media(&scope.path(SUBTITLES_FILE), render_srt(script).as_bytes()).await?;

                let mux_request = MuxRequest {
                    timeline: timeline.handle.clone(),
                    narration: narration.clone(),
                    music: music.clone(),
                    ambience: ambience.clone(),
                    output_path: scope.path(FINAL_FILE),
                };
                let video_uri = retry
                    .call("final mux", || composer.mux(&mux_request))
                    .await?;

                Ok(FinalOutput {
                    narration,
                    music,
                    ambience,
                    video_uri,
                    subtitles: Some(subtitles),
                })
            }
            AudioAgent::Dummy => {
                let digest = persona_digest(&context.persona);
                let placeholder = |file: &str| {
                    MediaHandle::new(format!(
                        "{}audio/{}/{}",
                        MediaHandle::PLACEHOLDER_SCHEME,
                        digest,
                        file
                    ))
                };
                let mux_request = MuxRequest {
                    timeline: timeline.handle.clone(),
                    narration: placeholder(NARRATION_FILE),
                    music: placeholder(MUSIC_FILE),
                    ambience: placeholder(AMBIENCE_FILE),
                    output_path: scope.path(FINAL_FILE),
                };
                let video_uri = PlaceholderComposer.mux(&mux_request).await?;

                Ok(FinalOutput {
                    narration: mux_request.narration,
                    music: mux_request.music,
                    ambience: mux_request.ambience,
                    video_uri,
                    subtitles: Some(placeholder(SUBTITLES_FILE)),
                })
            }
        }
    }
}

/// `HH:MM:SS,mmm`
pub fn srt_timestamp(total_seconds: f64) -> String {
    let total_ms = (total_seconds.max(0.0) * 1000.0).round() as u64;
    let (hours, rest) = (total_ms / 3_600_000, total_ms % 3_600_000);
    let (minutes, rest) = (rest / 60_000, rest % 60_000);
    let (seconds, millis) = (rest / 1000, rest % 1000);
    format!("{:02}:{:02}:{:02},{:03}", hours, minutes, seconds, millis)
}

/// One cue per script section, timed by the script's markers.
pub fn render_srt(script: &Script) -> String {
    let mut out = String::new();
    for (i, (marker, section)) in script.markers.iter().zip(&script.sections).enumerate() {
        out.push_str(&format!(
            "{}\n{} --> {}\n{}\n\n",
            i + 1,
            srt_timestamp(marker.start_seconds),
            srt_timestamp(marker.start_seconds + marker.duration_seconds),
            section.summary.trim()
        ));
    }
    out
}
