//! Media composition collaborator: an ffmpeg-backed composer and a deterministic placeholder

use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use async_trait::async_trait;
use base64::Engine;
use sha2::{Digest, Sha256};
use tokio::process::Command;

use super::{
    AdapterError, Clip, ComposeRequest, MediaComposer, MediaHandle, MuxRequest, truncate_body,
};
use crate::{
    config::MediaSettings,
    workflow::types::{CameraMovement, Transition},
};

const WIDTH: u32 = 1280;
const HEIGHT: u32 = 720;
const FPS: f64 = 25.0;
const FADE_SECONDS: f64 = 0.5;

/// First 16 hex characters of the SHA-256 over the parts, separated by NUL.
pub fn short_digest(parts: &[&str]) -> String {
    let mut hasher = Sha256::new();
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            hasher.update([0u8]);
        }
        hasher.update(part.as_bytes());
    }
    let digest = hex::encode(hasher.finalize());
    digest[..16].to_string()
}

/// Stand-in composer that returns URIs derived only from its inputs.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaceholderComposer;

#[async_trait]
impl MediaComposer for PlaceholderComposer {
    async fn compose(&self, request: &ComposeRequest) -> Result<MediaHandle, AdapterError> {
        let clips = serde_json::to_string(&request.clips)?;
        Ok(MediaHandle::new(format!(
            "{}timeline/{}.mp4",
            MediaHandle::PLACEHOLDER_SCHEME,
            short_digest(&[&clips])
        )))
    }

    async fn mux(&self, request: &MuxRequest) -> Result<MediaHandle, AdapterError> {
        let digest = short_digest(&[
            request.timeline.as_str(),
            request.narration.as_str(),
            request.music.as_str(),
            request.ambience.as_str(),
        ]);
        Ok(MediaHandle::new(format!(
            "{}video/{}.mp4",
            MediaHandle::PLACEHOLDER_SCHEME,
            digest
        )))
    }
}

/// Drives a local ffmpeg binary. Every invocation is bounded by the configured timeout.
pub struct FfmpegComposer {
    ffmpeg: PathBuf,
    timeout: Duration,
}

impl FfmpegComposer {
    pub fn new(settings: &MediaSettings) -> Result<Self, AdapterError> {
        let configured = settings
            .ffmpeg_path
            .as_deref()
            .ok_or_else(|| AdapterError::Config("media.ffmpeg_path is not set".into()))?;
        let ffmpeg = utils::toolchain::resolve_executable(configured)
            .ok_or_else(|| AdapterError::Config(format!("ffmpeg not found at {}", configured)))?;

        Ok(Self {
            ffmpeg,
            timeout: Duration::from_secs(settings.timeout_seconds.max(1)),
        })
    }

    pub fn ffmpeg_path(&self) -> &Path {
        &self.ffmpeg
    }

    async fn run(&self, args: &[String], what: &str) -> Result<(), AdapterError> {
        tracing::debug!("ffmpeg {}: {}", what, args.join(" "));

        let output = Command::new(&self.ffmpeg)
            .args(args)
            .kill_on_drop(true)
            .output();
        let output = tokio::time::timeout(self.timeout, output)
            .await
            .map_err(|_| AdapterError::timeout(self.timeout))?
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    AdapterError::Config(format!("ffmpeg not found at {}", self.ffmpeg.display()))
                } else {
                    AdapterError::Media(format!("failed to spawn ffmpeg: {}", e))
                }
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let tail: Vec<&str> = stderr.lines().rev().take(3).collect();
            let tail: Vec<&str> = tail.into_iter().rev().collect();
            return Err(AdapterError::Media(format!(
                "ffmpeg {} failed with {}: {}",
                what,
                output.status,
                truncate_body(&tail.join(" | "))
            )));
        }
        Ok(())
    }

    /// Turn a clip's image handle into an ffmpeg input, materialising inline data URIs.
    async fn clip_input(
        &self,
        clip: &Clip,
        work_dir: &Path,
    ) -> Result<ClipInput, AdapterError> {
        let image = clip.image.as_str();
        if clip.image.is_placeholder() {
            return Ok(ClipInput::Blank);
        }

        if let Some(rest) = image.strip_prefix("data:") {
            let encoded = rest
                .split_once(";base64,")
                .map(|(_, data)| data)
                .ok_or_else(|| AdapterError::Media("unsupported data URI for clip".into()))?;
            let bytes = base64::engine::general_purpose::STANDARD
                .decode(encoded)
                .map_err(|e| AdapterError::Media(format!("invalid inline image: {}", e)))?;
            let path = work_dir.join(format!("scene-{:02}.png", clip.scene_index));
            tokio::fs::write(&path, bytes).await?;
            return Ok(ClipInput::Image(path.display().to_string()));
        }

        Ok(ClipInput::Image(image.to_string()))
    }
}

enum ClipInput {
    Image(String),
    Blank,
}

fn frame_count(duration_seconds: f64) -> u64 {
    (duration_seconds.max(0.04) * FPS).round() as u64
}

/// zoompan expression for a camera movement over `frames` output frames.
pub fn motion_filter(movement: CameraMovement, speed: f32, frames: u64) -> String {
    let rate = 0.0005 + 0.0025 * f64::from(speed.clamp(0.0, 1.0));
    let center_x = "iw/2-(iw/zoom/2)";
    let center_y = "ih/2-(ih/zoom/2)";
    let (z, x, y) = match movement {
        CameraMovement::Static => ("1".to_string(), "0".to_string(), "0".to_string()),
        CameraMovement::ZoomIn => (
            format!("min(zoom+{:.4},1.5)", rate),
            center_x.to_string(),
            center_y.to_string(),
        ),
        CameraMovement::ZoomOut => (
            format!("if(eq(on,0),1.5,max(zoom-{:.4},1.0))", rate),
            center_x.to_string(),
            center_y.to_string(),
        ),
        CameraMovement::PanRight => (
            "1.2".to_string(),
            format!("(iw-iw/zoom)*on/{}", frames),
            center_y.to_string(),
        ),
        CameraMovement::PanLeft => (
            "1.2".to_string(),
            format!("(iw-iw/zoom)*(1-on/{})", frames),
            center_y.to_string(),
        ),
        CameraMovement::KenBurns => (
            format!("min(zoom+{:.4},1.3)", rate),
            format!("(iw-iw/zoom)*on/{}", frames),
            format!("(ih-ih/zoom)*on/{}", frames),
        ),
    };

    format!(
        "scale={w}*2:{h}*2:force_original_aspect_ratio=increase,crop={w}*2:{h}*2,\
         zoompan=z='{z}':x='{x}':y='{y}':d={frames}:s={w}x{h}:fps={fps}",
        w = WIDTH,
        h = HEIGHT,
        z = z,
        x = x,
        y = y,
        frames = frames,
        fps = FPS
    )
}

fn transition_filter(transition: Option<Transition>, duration_seconds: f64) -> Option<String> {
    match transition {
        Some(Transition::Crossfade) => Some(format!("fade=t=in:st=0:d={}", FADE_SECONDS)),
        Some(Transition::FadeToBlack) => Some(format!(
            "fade=t=out:st={:.2}:d={}",
            (duration_seconds - FADE_SECONDS).max(0.0),
            FADE_SECONDS
        )),
        Some(Transition::Cut) | None => None,
    }
}

fn clip_args(input: &ClipInput, clip: &Clip, output: &Path) -> Vec<String> {
    let frames = frame_count(clip.duration_seconds);
    let mut args = vec!["-y".to_string()];

    let mut filters = Vec::new();
    match input {
        ClipInput::Blank => {
            args.extend([
                "-f".to_string(),
                "lavfi".to_string(),
                "-i".to_string(),
                format!(
                    "color=c=black:s={}x{}:r={}:d={:.2}",
                    WIDTH, HEIGHT, FPS, clip.duration_seconds
                ),
            ]);
        }
        ClipInput::Image(source) => {
            args.extend(["-i".to_string(), source.clone()]);
            filters.push(motion_filter(clip.movement, clip.speed, frames));
        }
    }
    if let Some(fade) = transition_filter(clip.transition, clip.duration_seconds) {
        filters.push(fade);
    }
    if !filters.is_empty() {
        args.extend(["-vf".to_string(), filters.join(",")]);
    }

    args.extend([
        "-frames:v".to_string(),
        frames.to_string(),
        "-c:v".to_string(),
        "libx264".to_string(),
        "-pix_fmt".to_string(),
        "yuv420p".to_string(),
        "-r".to_string(),
        FPS.to_string(),
        output.to_string_lossy().to_string(),
    ]);
    args
}

fn mux_args(request: &MuxRequest) -> Vec<String> {
    let mut args = vec!["-y".to_string()];
    for input in [
        &request.timeline,
        &request.narration,
        &request.music,
        &request.ambience,
    ] {
        args.extend(["-i".to_string(), input.as_str().to_string()]);
    }
    args.extend([
        "-filter_complex".to_string(),
        "[1:a]volume=1.0[n];[2:a]volume=0.25[m];[3:a]volume=0.35[a];\
         [n][m][a]amix=inputs=3:duration=first:dropout_transition=2[aout]"
            .to_string(),
        "-map".to_string(),
        "0:v".to_string(),
        "-map".to_string(),
        "[aout]".to_string(),
        "-c:v".to_string(),
        "copy".to_string(),
        "-c:a".to_string(),
        "aac".to_string(),
        "-shortest".to_string(),
        request.output_path.to_string_lossy().to_string(),
    ]);
    args
}

#[async_trait]
impl MediaComposer for FfmpegComposer {
    async fn compose(&self, request: &ComposeRequest) -> Result<MediaHandle, AdapterError> {
        if request.clips.is_empty() {
            return Err(AdapterError::Media("no clips to compose".into()));
        }

        let output = &request.output_path;
        let work_dir = output
            .parent()
            .unwrap_or(Path::new("."))
            .join("clips");
        tokio::fs::create_dir_all(&work_dir).await?;

        let mut list = String::new();
        for clip in &request.clips {
            let input = self.clip_input(clip, &work_dir).await?;
            let clip_path = work_dir.join(format!("clip-{:02}.mp4", clip.scene_index));
            self.run(&clip_args(&input, clip, &clip_path), "clip").await?;
            list.push_str(&format!("file '{}'\n", clip_path.to_string_lossy()));
        }

        let list_file = work_dir.join("concat_list.txt");
        tokio::fs::write(&list_file, &list).await?;

        let args = vec![
            "-y".to_string(),
            "-f".to_string(),
            "concat".to_string(),
            "-safe".to_string(),
            "0".to_string(),
            "-i".to_string(),
            list_file.to_string_lossy().to_string(),
            "-c".to_string(),
            "copy".to_string(),
            output.to_string_lossy().to_string(),
        ];
        let result = self.run(&args, "concat").await;
        let _ = tokio::fs::remove_file(&list_file).await;
        result?;

        Ok(MediaHandle::from_path(output))
    }

    async fn mux(&self, request: &MuxRequest) -> Result<MediaHandle, AdapterError> {
        if request.timeline.is_placeholder() {
            return Err(AdapterError::Media(format!(
                "timeline {} was never rendered",
                request.timeline
            )));
        }
        if let Some(parent) = request.output_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        self.run(&mux_args(request), "mux").await?;
        Ok(MediaHandle::from_path(&request.output_path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::FailureKind;

    fn clip(index: usize, image: &str) -> Clip {
        Clip {
            scene_index: index,
            image: MediaHandle::new(image),
            movement: CameraMovement::ZoomIn,
            speed: 0.5,
            transition: None,
            duration_seconds: 4.0,
        }
    }

    #[test]
    fn test_short_digest_is_stable_and_separated() {
        assert_eq!(short_digest(&["诸葛亮"]), short_digest(&["诸葛亮"]));
        assert_eq!(short_digest(&["a"]).len(), 16);
        assert_ne!(short_digest(&["ab", "c"]), short_digest(&["a", "bc"]));
    }

    #[tokio::test]
    async fn test_placeholder_compose_is_deterministic() {
        let request = ComposeRequest {
            clips: vec![clip(1, "placeholder://assets/x/scene-01.png")],
            output_path: PathBuf::from("/unused"),
        };
        let first = PlaceholderComposer.compose(&request).await.unwrap();
        let second = PlaceholderComposer.compose(&request).await.unwrap();
        assert_eq!(first, second);
        assert!(first.as_str().starts_with("placeholder://timeline/"));
    }

    #[tokio::test]
    async fn test_placeholder_mux_depends_on_inputs() {
        let mut request = MuxRequest {
            timeline: MediaHandle::new("placeholder://timeline/a.mp4"),
            narration: MediaHandle::new("n"),
            music: MediaHandle::new("m"),
            ambience: MediaHandle::new("a"),
            output_path: PathBuf::from("/unused"),
        };
        let first = PlaceholderComposer.mux(&request).await.unwrap();
        request.music = MediaHandle::new("m2");
        let second = PlaceholderComposer.mux(&request).await.unwrap();
        assert_ne!(first, second);
        assert!(first.as_str().starts_with("placeholder://video/"));
    }

    #[test]
    fn test_missing_binary_is_misconfigured() {
        let err = FfmpegComposer::new(&MediaSettings {
            ffmpeg_path: Some("/definitely/not/ffmpeg".into()),
            ..Default::default()
        })
        .err()
        .unwrap();
        assert_eq!(err.kind(), FailureKind::Misconfigured);
    }

    #[test]
    fn test_clip_args_for_image_and_blank() {
        let image_clip = Clip {
            transition: Some(Transition::Crossfade),
            ..clip(1, "/tmp/scene-01.png")
        };
        let args = clip_args(
            &ClipInput::Image("/tmp/scene-01.png".into()),
            &image_clip,
            Path::new("/tmp/clip-01.mp4"),
        );
        let vf = args.iter().position(|a| a == "-vf").unwrap();
        assert!(args[vf + 1].contains("zoompan"));
        assert!(args[vf + 1].contains("fade=t=in"));
        assert!(args.contains(&"100".to_string()));
        assert_eq!(args.last().unwrap(), "/tmp/clip-01.mp4");

        let blank = clip(2, "placeholder://assets/x/scene-02.png");
        let args = clip_args(&ClipInput::Blank, &blank, Path::new("/tmp/clip-02.mp4"));
        assert!(args.contains(&"lavfi".to_string()));
        assert!(!args.contains(&"-vf".to_string()));
    }

    #[test]
    fn test_motion_filters_differ_per_movement() {
        let pan = motion_filter(CameraMovement::PanRight, 0.5, 100);
        let zoom = motion_filter(CameraMovement::ZoomOut, 0.5, 100);
        assert!(pan.contains("on/100"));
        assert!(zoom.contains("max(zoom-"));
        assert_ne!(pan, zoom);
    }

    #[test]
    fn test_mux_args_map_video_and_mixed_audio() {
        let request = MuxRequest {
            timeline: MediaHandle::new("/out/timeline.mp4"),
            narration: MediaHandle::new("/out/narration.mp3"),
            music: MediaHandle::new("/out/music.mp3"),
            ambience: MediaHandle::new("/out/ambience.mp3"),
            output_path: PathBuf::from("/out/final.mp4"),
        };
        let args = mux_args(&request);
        assert_eq!(args.iter().filter(|a| *a == "-i").count(), 4);
        assert!(args.iter().any(|a| a.contains("amix=inputs=3")));
        assert_eq!(args.last().unwrap(), "/out/final.mp4");
    }
}
