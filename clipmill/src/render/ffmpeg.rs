use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::foundation::error::{ClipmillError, ClipmillResult};
use crate::render::renderer::{ClipJob, RenderedClip, Renderer};

/// Renderer that shells out to the system `ffmpeg` binary.
///
/// Each job is trimmed with demuxer-level seeking (`-ss` before `-i`), scaled
/// and padded to the target frame size, speed-adjusted by rescaling
/// presentation timestamps, and optionally captioned with `drawtext`.
/// Intermediate artifacts are staged under `work_dir` and removed on drop.
///
/// Intermediate and combined outputs are video-only (h264/yuv420p); audio is
/// not carried through the speed/concat chain.
pub struct FfmpegRenderer {
    work_dir: PathBuf,
    seq: usize,
    staged: Vec<PathBuf>,
}

impl FfmpegRenderer {
    /// Create a renderer staging into `work_dir`.
    ///
    /// Checks for `ffmpeg` on `PATH` up front and creates the staging
    /// directory.
    pub fn new(work_dir: impl Into<PathBuf>) -> ClipmillResult<Self> {
        if !is_ffmpeg_on_path() {
            return Err(ClipmillError::render(
                "ffmpeg is required for rendering, but was not found on PATH",
            ));
        }
        let work_dir = work_dir.into();
        std::fs::create_dir_all(&work_dir).map_err(|e| {
            ClipmillError::render(format!(
                "failed to create work directory '{}': {e}",
                work_dir.display()
            ))
        })?;
        Ok(Self {
            work_dir,
            seq: 0,
            staged: Vec::new(),
        })
    }

    fn next_path(&mut self, stem: &str) -> PathBuf {
        self.seq += 1;
        let path = self.work_dir.join(format!("{stem}_{:03}.mp4", self.seq));
        self.staged.push(path.clone());
        path
    }

    fn run_clip_encode(
        &self,
        job: &ClipJob,
        caption: Option<&str>,
        out: &Path,
    ) -> ClipmillResult<()> {
        let trimmed_s = job.range.duration_s();

        let mut vf = format!(
            "scale={w}:{h}:force_original_aspect_ratio=decrease,\
             pad={w}:{h}:(ow-iw)/2:(oh-ih)/2:black,setsar=1",
            w = job.frame_size.width,
            h = job.frame_size.height
        );
        if !job.speed.is_identity() {
            vf.push_str(&format!(",setpts=PTS/{}", job.speed.factor()));
        }
        if let Some(text) = caption {
            vf.push_str(&format!(
                ",drawtext=text='{}':fontsize=80:fontcolor=white:borderw=5:bordercolor=black:\
                 x=(w-text_w)/2:y=(h-text_h)/2",
                escape_drawtext(text)
            ));
        }

        let mut cmd = Command::new("ffmpeg");
        cmd.args([
            "-y",
            "-loglevel",
            "error",
            "-ss",
            &format!("{:.3}", job.range.start_s),
            "-t",
            &format!("{trimmed_s:.3}"),
        ])
        .arg("-i")
        .arg(&job.source)
        .args([
            "-vf",
            &vf,
            "-an",
            "-c:v",
            "libx264",
            "-preset",
            "veryfast",
            "-pix_fmt",
            "yuv420p",
            "-movflags",
            "+faststart",
        ])
        .arg(out);

        run_ffmpeg(cmd)
    }
}

impl Renderer for FfmpegRenderer {
    fn render(&mut self, job: &ClipJob) -> ClipmillResult<RenderedClip> {
        job.range.validate_for_render()?;
        let out = self.next_path(&format!(
            "slot_start{}_end{}",
            job.range.start_s as i64, job.range.end_s as i64
        ));

        let caption = job.caption.as_deref().filter(|c| !c.trim().is_empty());
        if let Some(text) = caption {
            // A bad font setup or hostile caption text should cost the
            // overlay, not the clip: retry once without the caption.
            if let Err(e) = self.run_clip_encode(job, Some(text), &out) {
                tracing::warn!(error = %e, "caption overlay failed, rendering without it");
                self.run_clip_encode(job, None, &out)?;
            }
        } else {
            self.run_clip_encode(job, None, &out)?;
        }

        Ok(RenderedClip {
            path: out,
            duration_s: job.speed.scaled_duration_s(job.range.duration_s()),
            frame_size: job.frame_size,
        })
    }

    fn concatenate(&mut self, clips: &[RenderedClip]) -> ClipmillResult<RenderedClip> {
        let first = clips
            .first()
            .ok_or_else(|| ClipmillError::render("nothing to concatenate"))?;
        if clips.len() == 1 {
            return Ok(first.clone());
        }

        self.seq += 1;
        let list_path = self.work_dir.join(format!("concat_{:03}.txt", self.seq));
        let mut list = String::new();
        for clip in clips {
            let path = clip.path.to_string_lossy().replace('\'', "'\\''");
            list.push_str(&format!("file '{path}'\n"));
        }
        std::fs::write(&list_path, list).map_err(|e| {
            ClipmillError::render(format!(
                "failed to write concat list '{}': {e}",
                list_path.display()
            ))
        })?;
        self.staged.push(list_path.clone());

        let out = self.next_path("combined_stage");
        let mut cmd = Command::new("ffmpeg");
        cmd.args(["-y", "-loglevel", "error", "-f", "concat", "-safe", "0", "-i"])
            .arg(&list_path)
            .args(["-c", "copy"])
            .arg(&out);
        run_ffmpeg(cmd)?;

        Ok(RenderedClip {
            path: out,
            duration_s: clips.iter().map(|c| c.duration_s).sum(),
            frame_size: first.frame_size,
        })
    }

    fn write(&mut self, clip: &RenderedClip, dest: &Path) -> ClipmillResult<()> {
        ensure_parent_dir(dest)?;
        if std::fs::rename(&clip.path, dest).is_err() {
            // Rename fails across filesystems; fall back to copy + remove.
            std::fs::copy(&clip.path, dest).map_err(|e| {
                ClipmillError::render(format!(
                    "failed to persist '{}' to '{}': {e}",
                    clip.path.display(),
                    dest.display()
                ))
            })?;
            let _ = std::fs::remove_file(&clip.path);
        }
        Ok(())
    }
}

impl Drop for FfmpegRenderer {
    fn drop(&mut self) {
        for path in self.staged.drain(..) {
            let _ = std::fs::remove_file(path);
        }
    }
}

fn run_ffmpeg(mut cmd: Command) -> ClipmillResult<()> {
    let out = cmd
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .map_err(|e| {
            ClipmillError::render(format!(
                "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
            ))
        })?;
    if !out.status.success() {
        return Err(ClipmillError::render(format!(
            "ffmpeg exited with status {}: {}",
            out.status,
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }
    Ok(())
}

/// Escape caption text for use inside a single-quoted `drawtext` value.
fn escape_drawtext(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len() + 8);
    for ch in text.chars() {
        match ch {
            '\\' => escaped.push_str("\\\\"),
            '\'' => escaped.push_str("'\\''"),
            ':' => escaped.push_str("\\:"),
            ',' => escaped.push_str("\\,"),
            '%' => escaped.push_str("\\%"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

/// Ensure the parent directory of `path` exists.
pub fn ensure_parent_dir(path: &Path) -> ClipmillResult<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        use anyhow::Context as _;
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

/// Return `true` when `ffmpeg` can be invoked from `PATH`.
pub fn is_ffmpeg_on_path() -> bool {
    std::process::Command::new("ffmpeg")
        .arg("-version")
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}
