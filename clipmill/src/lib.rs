//! Clipmill is a batch video-clip generator.
//!
//! Given named groups of source videos plus per-line timing/speed/caption
//! parameters, clipmill plans a deterministic set of render jobs, executes
//! them against an external renderer (the system `ffmpeg` by default), and
//! packages the combined outputs into a single archive.
//!
//! The public API is session-oriented:
//!
//! - Register source groups on a [`BatchSession`]
//! - Roll or edit per-group timing/speed/caption settings, then plan
//! - Take a [`SelectionAudit`] (execution is gated on it)
//! - Execute the plans into combined outputs and pack them with an
//!   [`Archiver`]
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod foundation;

/// Output packaging (zip archiving).
pub mod archive;
/// Source assets: probing, groups, and the group registry.
pub mod assets;
/// JSON job definitions for non-interactive runs.
pub mod job;
/// Per-line parameter parsing for timings, speeds, and captions.
pub mod params;
/// Sequence planning: settings buckets, plans, and the selection audit.
pub mod plan;
/// Rendering: the renderer seam, the ffmpeg implementation, and the batch
/// executor.
pub mod render;
/// Session-oriented orchestration of the whole pipeline.
pub mod session;

pub use crate::foundation::core::{END_CLAMP_EPSILON_S, FrameSize, Speed, TimeRange};
pub use crate::foundation::error::{ClipmillError, ClipmillResult};

pub use crate::archive::zip::{Archiver, PackOutcome, ZipArchiver};
pub use crate::assets::media::{SourceInfo, probe_source};
pub use crate::assets::registry::{Asset, Group, GroupRegistry, SelectionStrategy, UniformSelection};
pub use crate::job::def::{GroupDef, JobDef, SourceDef};
pub use crate::params::parse::LinePolicy;
pub use crate::plan::planner::{
    AuditRow, ClipSlot, GenerationMode, Plan, SelectionAudit, SettingsBucket,
};
pub use crate::render::executor::{
    BatchProgress, BatchResult, CancelToken, CombinedOutput, ExecuteOpts, NullProgress,
    PlanFailure, ProgressSink, execute,
};
pub use crate::render::ffmpeg::FfmpegRenderer;
pub use crate::render::renderer::{ClipJob, DryRunRenderer, RenderedClip, Renderer};
pub use crate::session::batch_session::{BatchSession, BatchSessionOpts};
