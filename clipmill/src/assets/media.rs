use std::path::{Path, PathBuf};

use crate::foundation::error::{ClipmillError, ClipmillResult};

/// Basic metadata about a source video file.
#[derive(Clone, Debug, serde::Serialize)]
pub struct SourceInfo {
    /// Absolute source path used for probing/decoding.
    pub path: PathBuf,
    /// Total duration in seconds.
    pub duration_s: f64,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Whether ffprobe detected at least one audio stream.
    pub has_audio: bool,
}

/// Probe source video metadata through `ffprobe`.
pub fn probe_source(path: &Path) -> ClipmillResult<SourceInfo> {
    #[derive(serde::Deserialize)]
    struct ProbeStream {
        codec_type: Option<String>,
        width: Option<u32>,
        height: Option<u32>,
        duration: Option<String>,
    }
    #[derive(serde::Deserialize)]
    struct ProbeFormat {
        duration: Option<String>,
    }
    #[derive(serde::Deserialize)]
    struct ProbeOut {
        streams: Vec<ProbeStream>,
        format: Option<ProbeFormat>,
    }

    let out = std::process::Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-print_format",
            "json",
            "-show_streams",
            "-show_format",
        ])
        .arg(path)
        .output()
        .map_err(|e| ClipmillError::render(format!("failed to run ffprobe: {e}")))?;
    if !out.status.success() {
        return Err(ClipmillError::render(format!(
            "ffprobe failed for '{}': {}",
            path.display(),
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }

    let parsed: ProbeOut = serde_json::from_slice(&out.stdout)
        .map_err(|e| ClipmillError::parse(format!("ffprobe json parse failed: {e}")))?;
    let video_stream = parsed
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
        .ok_or_else(|| {
            ClipmillError::render(format!("no video stream found in '{}'", path.display()))
        })?;
    let width = video_stream
        .width
        .ok_or_else(|| ClipmillError::parse("missing video width from ffprobe"))?;
    let height = video_stream
        .height
        .ok_or_else(|| ClipmillError::parse("missing video height from ffprobe"))?;
    let has_audio = parsed
        .streams
        .iter()
        .any(|s| s.codec_type.as_deref() == Some("audio"));

    // Stream duration when present, container duration otherwise.
    let duration_s = video_stream
        .duration
        .as_deref()
        .and_then(|d| d.parse::<f64>().ok())
        .or_else(|| {
            parsed
                .format
                .as_ref()
                .and_then(|f| f.duration.as_deref())
                .and_then(|d| d.parse::<f64>().ok())
        })
        .ok_or_else(|| {
            ClipmillError::parse(format!(
                "ffprobe reported no duration for '{}'",
                path.display()
            ))
        })?;

    Ok(SourceInfo {
        path: path.to_path_buf(),
        duration_s,
        width,
        height,
        has_audio,
    })
}

// No unit tests here: probing shells out to `ffprobe` and is best validated
// via integration tests that can be conditionally skipped when the tool is
// unavailable.
