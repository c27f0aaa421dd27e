//! Core types for the video pipeline: stages, the append-only task context, and task records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::{
    capability::CapabilityDecision,
    providers::{AdapterError, FailureKind, MediaHandle},
};

/// The six fixed pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Script,
    Storyboard,
    Asset,
    Camera,
    Composition,
    Audio,
}

impl Stage {
    pub const ALL: [Stage; 6] = [
        Stage::Script,
        Stage::Storyboard,
        Stage::Asset,
        Stage::Camera,
        Stage::Composition,
        Stage::Audio,
    ];

    /// 1-based position in the pipeline.
    pub fn index(self) -> usize {
        match self {
            Stage::Script => 1,
            Stage::Storyboard => 2,
            Stage::Asset => 3,
            Stage::Camera => 4,
            Stage::Composition => 5,
            Stage::Audio => 6,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Stage::Script => "script",
            Stage::Storyboard => "storyboard",
            Stage::Asset => "asset",
            Stage::Camera => "camera",
            Stage::Composition => "composition",
            Stage::Audio => "audio",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptSection {
    pub section: String,
    pub timeframe: String,
    pub summary: String,
    #[serde(default)]
    pub citations: Vec<String>,
}

/// Where a script section sits on the narration timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineMarker {
    pub section: String,
    pub start_seconds: f64,
    pub duration_seconds: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Script {
    pub text: String,
    pub sections: Vec<ScriptSection>,
    pub markers: Vec<TimelineMarker>,
}

impl Script {
    /// Build a script from sections laid out back to back, `seconds_per_section` each.
    pub fn from_sections(sections: Vec<ScriptSection>, seconds_per_section: f64) -> Self {
        let text = sections
            .iter()
            .map(|s| s.summary.trim())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n");
        let markers = sections
            .iter()
            .enumerate()
            .map(|(i, s)| TimelineMarker {
                section: s.section.clone(),
                start_seconds: i as f64 * seconds_per_section,
                duration_seconds: seconds_per_section,
            })
            .collect();

        Self {
            text,
            sections,
            markers,
        }
    }

    pub fn total_seconds(&self) -> f64 {
        self.markers
            .iter()
            .map(|m| m.start_seconds + m.duration_seconds)
            .fold(0.0, f64::max)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    /// 1-based; the correlation key for assets and camera directives.
    pub index: usize,
    pub description: String,
    pub mood: String,
    pub subtitle: String,
    pub start_seconds: f64,
    pub duration_seconds: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneAsset {
    pub scene_index: usize,
    pub prompt: String,
    pub handles: Vec<MediaHandle>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CameraMovement {
    Static,
    PanLeft,
    PanRight,
    ZoomIn,
    ZoomOut,
    KenBurns,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transition {
    Cut,
    Crossfade,
    FadeToBlack,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraDirective {
    pub scene_index: usize,
    pub movement: CameraMovement,
    /// Relative motion speed, 0.0 to 1.0.
    pub speed: f32,
    pub transition: Option<Transition>,
    pub duration_seconds: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComposedTimeline {
    pub handle: MediaHandle,
    pub scene_count: usize,
    pub duration_seconds: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalOutput {
    pub narration: MediaHandle,
    pub music: MediaHandle,
    pub ambience: MediaHandle,
    pub video_uri: MediaHandle,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitles: Option<MediaHandle>,
}

/// What a single stage hands back to the orchestrator.
#[derive(Debug, Clone, PartialEq)]
pub enum StageOutput {
    Script(Script),
    Storyboard(Vec<Scene>),
    Assets(Vec<SceneAsset>),
    CameraPlan(Vec<CameraDirective>),
    Timeline(ComposedTimeline),
    Output(FinalOutput),
}

impl StageOutput {
    pub fn stage(&self) -> Stage {
        match self {
            StageOutput::Script(_) => Stage::Script,
            StageOutput::Storyboard(_) => Stage::Storyboard,
            StageOutput::Assets(_) => Stage::Asset,
            StageOutput::CameraPlan(_) => Stage::Camera,
            StageOutput::Timeline(_) => Stage::Composition,
            StageOutput::Output(_) => Stage::Audio,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContractViolation {
    #[error("{stage} output was already recorded")]
    AlreadyWritten { stage: Stage },
    #[error("{stage} requires {field}, which has not been produced")]
    MissingField { stage: Stage, field: &'static str },
    #[error("{stage}: {detail}")]
    Inconsistent { stage: Stage, detail: String },
}

/// The single record threaded through all six stages. Each field is written once by its
/// stage and read-only afterwards.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TaskContext {
    pub persona: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    script: Option<Script>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    storyboard: Option<Vec<Scene>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    assets: Option<Vec<SceneAsset>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    camera_plan: Option<Vec<CameraDirective>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    timeline: Option<ComposedTimeline>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    output: Option<FinalOutput>,
}

impl TaskContext {
    pub fn new(persona: impl Into<String>) -> Self {
        Self {
            persona: persona.into(),
            ..Default::default()
        }
    }

    pub fn script(&self) -> Option<&Script> {
        self.script.as_ref()
    }

    pub fn storyboard(&self) -> Option<&[Scene]> {
        self.storyboard.as_deref()
    }

    pub fn assets(&self) -> Option<&[SceneAsset]> {
        self.assets.as_deref()
    }

    pub fn camera_plan(&self) -> Option<&[CameraDirective]> {
        self.camera_plan.as_deref()
    }

    pub fn timeline(&self) -> Option<&ComposedTimeline> {
        self.timeline.as_ref()
    }

    pub fn output(&self) -> Option<&FinalOutput> {
        self.output.as_ref()
    }

    pub fn require_script(&self, reader: Stage) -> Result<&Script, ContractViolation> {
        self.script().ok_or(ContractViolation::MissingField {
            stage: reader,
            field: "script",
        })
    }

    pub fn require_storyboard(&self, reader: Stage) -> Result<&[Scene], ContractViolation> {
        self.storyboard().ok_or(ContractViolation::MissingField {
            stage: reader,
            field: "storyboard",
        })
    }

    pub fn require_assets(&self, reader: Stage) -> Result<&[SceneAsset], ContractViolation> {
        self.assets().ok_or(ContractViolation::MissingField {
            stage: reader,
            field: "assets",
        })
    }

    pub fn require_camera_plan(
        &self,
        reader: Stage,
    ) -> Result<&[CameraDirective], ContractViolation> {
        self.camera_plan().ok_or(ContractViolation::MissingField {
            stage: reader,
            field: "camera_plan",
        })
    }

    pub fn require_timeline(&self, reader: Stage) -> Result<&ComposedTimeline, ContractViolation> {
        self.timeline().ok_or(ContractViolation::MissingField {
            stage: reader,
            field: "timeline",
        })
    }

    /// Record a stage's output. Writing a field twice is a contract violation.
    pub fn apply(&mut self, output: StageOutput) -> Result<(), ContractViolation> {
        fn write_once<T>(
            slot: &mut Option<T>,
            value: T,
            stage: Stage,
        ) -> Result<(), ContractViolation> {
            if slot.is_some() {
                return Err(ContractViolation::AlreadyWritten { stage });
            }
            *slot = Some(value);
            Ok(())
        }

        let stage = output.stage();
        match output {
            StageOutput::Script(v) => write_once(&mut self.script, v, stage),
            StageOutput::Storyboard(v) => write_once(&mut self.storyboard, v, stage),
            StageOutput::Assets(v) => write_once(&mut self.assets, v, stage),
            StageOutput::CameraPlan(v) => write_once(&mut self.camera_plan, v, stage),
            StageOutput::Timeline(v) => write_once(&mut self.timeline, v, stage),
            StageOutput::Output(v) => write_once(&mut self.output, v, stage),
        }
    }

    /// Whether the field owned by `stage` has been written.
    pub fn has_output(&self, stage: Stage) -> bool {
        match stage {
            Stage::Script => self.script.is_some(),
            Stage::Storyboard => self.storyboard.is_some(),
            Stage::Asset => self.assets.is_some(),
            Stage::Camera => self.camera_plan.is_some(),
            Stage::Composition => self.timeline.is_some(),
            Stage::Audio => self.output.is_some(),
        }
    }
}

/// An agent's failure, carrying the classification it was given at the source.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {detail}")]
pub struct StageFailure {
    pub kind: FailureKind,
    pub detail: String,
}

impl StageFailure {
    pub fn new(kind: FailureKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
        }
    }
}

impl From<AdapterError> for StageFailure {
    fn from(err: AdapterError) -> Self {
        StageFailure::new(err.kind(), err.to_string())
    }
}

impl From<ContractViolation> for StageFailure {
    fn from(err: ContractViolation) -> Self {
        StageFailure::new(FailureKind::ContractViolation, err.to_string())
    }
}

/// Error record kept on a failed task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskError {
    pub kind: FailureKind,
    pub message: String,
}

impl From<StageFailure> for TaskError {
    fn from(failure: StageFailure) -> Self {
        Self {
            kind: failure.kind,
            message: failure.detail,
        }
    }
}

/// Lifecycle of a task run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum TaskState {
    Created,
    Running {
        stage: usize,
        stage_name: Stage,
    },
    Completed {
        total_stages: usize,
        execution_time_ms: u64,
    },
    Failed {
        stage: usize,
        stage_name: Stage,
        error: TaskError,
    },
}

impl TaskState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskState::Completed { .. } | TaskState::Failed { .. })
    }
}

/// Bookkeeping record for one pipeline run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,
    pub state: TaskState,
    pub context: TaskContext,
    pub last_completed_stage: Option<usize>,
    /// Capability decision for every stage that started, in order.
    pub decisions: Vec<CapabilityDecision>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl Task {
    pub fn new(persona: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            state: TaskState::Created,
            context: TaskContext::new(persona),
            last_completed_stage: None,
            decisions: Vec::new(),
            created_at: now,
            updated_at: now,
            finished_at: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    pub fn error(&self) -> Option<&TaskError> {
        match &self.state {
            TaskState::Failed { error, .. } => Some(error),
            _ => None,
        }
    }

    pub fn failed_stage(&self) -> Option<usize> {
        match &self.state {
            TaskState::Failed { stage, .. } => Some(*stage),
            _ => None,
        }
    }

    pub(crate) fn begin_stage(&mut self, stage: Stage, decision: CapabilityDecision) {
        self.state = TaskState::Running {
            stage: stage.index(),
            stage_name: stage,
        };
        self.decisions.push(decision);
        self.updated_at = Utc::now();
    }

    pub(crate) fn complete_stage(&mut self, stage: Stage) {
        self.last_completed_stage = Some(stage.index());
        self.updated_at = Utc::now();
    }

    pub(crate) fn complete(&mut self, execution_time_ms: u64) {
        let now = Utc::now();
        self.state = TaskState::Completed {
            total_stages: Stage::ALL.len(),
            execution_time_ms,
        };
        self.updated_at = now;
        self.finished_at = Some(now);
    }

    pub(crate) fn fail(&mut self, stage: Stage, error: TaskError) {
        let now = Utc::now();
        self.state = TaskState::Failed {
            stage: stage.index(),
            stage_name: stage,
            error,
        };
        self.updated_at = now;
        self.finished_at = Some(now);
    }
}

/// Lightweight listing entry
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskSummary {
    pub id: Uuid,
    pub persona: String,
    pub state: TaskState,
    pub last_completed_stage: Option<usize>,
    pub created_at: DateTime<Utc>,
}

impl From<&Task> for TaskSummary {
    fn from(task: &Task) -> Self {
        Self {
            id: task.id,
            persona: task.context.persona.clone(),
            state: task.state.clone(),
            last_completed_stage: task.last_completed_stage,
            created_at: task.created_at,
        }
    }
}

/// Events emitted while tasks run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum TaskEvent {
    TaskCreated {
        task_id: Uuid,
        persona: String,
    },
    StageStarted {
        task_id: Uuid,
        stage: Stage,
        decision: CapabilityDecision,
    },
    StageCompleted {
        task_id: Uuid,
        stage: Stage,
    },
    StageFailed {
        task_id: Uuid,
        stage: Stage,
        error: TaskError,
    },
    TaskCompleted {
        task_id: Uuid,
        execution_time_ms: u64,
    },
    TaskFailed {
        task_id: Uuid,
        stage: Stage,
        error: TaskError,
    },
}

impl TaskEvent {
    pub fn task_id(&self) -> Uuid {
        match self {
            TaskEvent::TaskCreated { task_id, .. }
            | TaskEvent::StageStarted { task_id, .. }
            | TaskEvent::StageCompleted { task_id, .. }
            | TaskEvent::StageFailed { task_id, .. }
            | TaskEvent::TaskCompleted { task_id, .. }
            | TaskEvent::TaskFailed { task_id, .. } => *task_id,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskEvent::TaskCompleted { .. } | TaskEvent::TaskFailed { .. }
        )
    }
}
