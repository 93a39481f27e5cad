use std::path::{Path, PathBuf};

use crate::foundation::core::{FrameSize, Speed, TimeRange};
use crate::foundation::error::{ClipmillError, ClipmillResult};

/// One fully-resolved render request: everything the renderer needs to
/// produce a processed clip.
///
/// The range is expected to be end-clamped and validated before a job is
/// built; renderers may assume `range.start_s < range.end_s`.
#[derive(Clone, Debug)]
pub struct ClipJob {
    /// Source media location.
    pub source: PathBuf,
    /// Trim range in source seconds (already clamped and validated).
    pub range: TimeRange,
    /// Speed multiplier to apply after trimming.
    pub speed: Speed,
    /// Overlay caption; `None` means no overlay pass.
    pub caption: Option<String>,
    /// Target frame size applied before any other transform.
    pub frame_size: FrameSize,
}

/// A processed clip artifact.
///
/// Ephemeral: owned by the executor for the duration of one concatenation,
/// then released.
#[derive(Clone, Debug)]
pub struct RenderedClip {
    /// Location of the staged artifact.
    pub path: PathBuf,
    /// Duration after trimming and speed adjustment, in seconds.
    pub duration_s: f64,
    /// Frame dimensions.
    pub frame_size: FrameSize,
}

/// External renderer collaborator.
///
/// Implementations trim, resize, speed-adjust, and caption a clip
/// ([`Renderer::render`]), join processed clips ([`Renderer::concatenate`]),
/// and persist a result ([`Renderer::write`]).
pub trait Renderer {
    /// Produce one processed clip for a job.
    fn render(&mut self, job: &ClipJob) -> ClipmillResult<RenderedClip>;

    /// Concatenate processed clips, in order, into one clip.
    fn concatenate(&mut self, clips: &[RenderedClip]) -> ClipmillResult<RenderedClip>;

    /// Persist a clip to `dest`.
    fn write(&mut self, clip: &RenderedClip, dest: &Path) -> ClipmillResult<()>;
}

/// Renderer stand-in for tests and `--dry-run` flows.
///
/// No subprocess is spawned and no media is produced; staged clip paths are
/// fabricated, durations follow the trim/speed arithmetic, and `write`
/// persists a small text manifest in place of the video file.
#[derive(Debug, Default)]
pub struct DryRunRenderer {
    seq: usize,
    jobs: Vec<ClipJob>,
}

impl DryRunRenderer {
    /// Create a new dry-run renderer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Jobs rendered so far, in render order.
    pub fn jobs(&self) -> &[ClipJob] {
        &self.jobs
    }
}

impl Renderer for DryRunRenderer {
    fn render(&mut self, job: &ClipJob) -> ClipmillResult<RenderedClip> {
        self.seq += 1;
        self.jobs.push(job.clone());
        Ok(RenderedClip {
            path: PathBuf::from(format!("dry-run/clip_{:03}.mp4", self.seq)),
            duration_s: job.speed.scaled_duration_s(job.range.duration_s()),
            frame_size: job.frame_size,
        })
    }

    fn concatenate(&mut self, clips: &[RenderedClip]) -> ClipmillResult<RenderedClip> {
        let first = clips
            .first()
            .ok_or_else(|| ClipmillError::render("nothing to concatenate"))?;
        self.seq += 1;
        Ok(RenderedClip {
            path: PathBuf::from(format!("dry-run/combined_{:03}.mp4", self.seq)),
            duration_s: clips.iter().map(|c| c.duration_s).sum(),
            frame_size: first.frame_size,
        })
    }

    fn write(&mut self, clip: &RenderedClip, dest: &Path) -> ClipmillResult<()> {
        crate::render::ffmpeg::ensure_parent_dir(dest)?;
        std::fs::write(
            dest,
            format!(
                "dry-run clip: {:.3}s {}x{}\n",
                clip.duration_s, clip.frame_size.width, clip.frame_size.height
            ),
        )
        .map_err(|e| {
            ClipmillError::render(format!("failed to write '{}': {e}", dest.display()))
        })?;
        Ok(())
    }
}
