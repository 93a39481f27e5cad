//! JSON job definitions.
//!
//! A job file is the non-interactive equivalent of the session parameter
//! surface: named source groups, optional per-group settings text, the
//! requested output count, and packaging options.

use std::collections::BTreeSet;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use crate::foundation::error::{ClipmillError, ClipmillResult};
use crate::plan::planner::GenerationMode;

/// One source entry: a bare path (probed via `ffprobe` at registration) or a
/// path with a known duration (probing skipped; used by dry runs and tests).
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum SourceDef {
    /// Path probed at registration.
    Path(PathBuf),
    /// Pre-probed path.
    Probed {
        /// Source media location.
        path: PathBuf,
        /// Known total duration in seconds.
        duration_s: f64,
    },
}

impl SourceDef {
    /// The source's path regardless of variant.
    pub fn path(&self) -> &Path {
        match self {
            SourceDef::Path(p) => p,
            SourceDef::Probed { path, .. } => path,
        }
    }
}

/// One named group of sources with optional settings text.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct GroupDef {
    /// Group name; defaults to `Group {n}` by position.
    #[serde(default)]
    pub name: Option<String>,
    /// Source videos in this group.
    pub sources: Vec<SourceDef>,
    /// Timings text (`start,end` per line); auto-rolled when omitted.
    #[serde(default)]
    pub timings: Option<String>,
    /// Speeds text (one multiplier per line); auto-rolled when omitted.
    #[serde(default)]
    pub speeds: Option<String>,
    /// Captions text (one caption per line); auto-rolled when omitted.
    #[serde(default)]
    pub captions: Option<String>,
}

impl GroupDef {
    /// Effective group name for position `idx`.
    pub fn display_name(&self, idx: usize) -> String {
        self.name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_owned)
            .unwrap_or_else(|| format!("Group {}", idx + 1))
    }
}

/// A full batch job.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct JobDef {
    /// Number of combined outputs to produce.
    pub count: usize,
    /// Session seed for deterministic selection and rolling.
    #[serde(default)]
    pub seed: u64,
    /// How auto-rolled settings are generated.
    #[serde(default)]
    pub mode: GenerationMode,
    /// Directory outputs and the archive are written into.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Archive base name.
    #[serde(default = "default_archive_name")]
    pub archive: String,
    /// Source groups.
    pub groups: Vec<GroupDef>,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("clipmill_out")
}

fn default_archive_name() -> String {
    "edited_clips.zip".to_owned()
}

impl JobDef {
    /// Parse a job definition from a JSON reader.
    pub fn from_reader<R: std::io::Read>(r: R) -> ClipmillResult<Self> {
        serde_json::from_reader(r)
            .map_err(|e| ClipmillError::parse(format!("parse job JSON: {e}")))
    }

    /// Parse a job definition from a JSON file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> ClipmillResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            ClipmillError::validation(format!("open job JSON '{}': {e}", path.display()))
        })?;
        Self::from_reader(BufReader::new(f))
    }

    /// Validate structural invariants before the job is run.
    pub fn validate(&self) -> ClipmillResult<()> {
        if self.count == 0 {
            return Err(ClipmillError::validation("job count must be >= 1"));
        }
        if self.groups.is_empty() {
            return Err(ClipmillError::validation(
                "job must declare at least one group",
            ));
        }
        if self.groups.iter().all(|g| g.sources.is_empty()) {
            return Err(ClipmillError::validation(
                "at least one group must have sources",
            ));
        }

        let mut seen = BTreeSet::new();
        for (idx, group) in self.groups.iter().enumerate() {
            let name = group.display_name(idx);
            if !seen.insert(name.clone()) {
                return Err(ClipmillError::validation(format!(
                    "duplicate group name '{name}'"
                )));
            }
            for source in &group.sources {
                if let SourceDef::Probed { duration_s, .. } = source
                    && (!duration_s.is_finite() || *duration_s < 0.0)
                {
                    return Err(ClipmillError::validation(format!(
                        "group '{name}': source '{}' has invalid duration {duration_s}",
                        source.path().display()
                    )));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/job/def.rs"]
mod tests;
