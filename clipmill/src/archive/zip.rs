//! Packaging of combined outputs into a single downloadable archive.

use std::io::Write as _;
use std::path::{Path, PathBuf};

use crate::foundation::error::{ClipmillError, ClipmillResult};

/// Outcome of a packaging request.
///
/// Zero outputs is a legitimate terminal state of a fully-failed batch, so it
/// is modeled as an outcome distinct from a packaging error.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PackOutcome {
    /// An archive was written at the contained path.
    Archive(PathBuf),
    /// There were no files to package; no archive was written.
    NothingToPackage,
}

/// Archiver collaborator: bundles output files into one artifact.
pub trait Archiver {
    /// Pack `files` into an archive at `dest`, preserving base file names.
    fn pack(&self, files: &[PathBuf], dest: &Path) -> ClipmillResult<PackOutcome>;
}

/// Zip archiver storing each file under its base name (deflate).
#[derive(Clone, Copy, Debug, Default)]
pub struct ZipArchiver;

impl Archiver for ZipArchiver {
    fn pack(&self, files: &[PathBuf], dest: &Path) -> ClipmillResult<PackOutcome> {
        if files.is_empty() {
            return Ok(PackOutcome::NothingToPackage);
        }

        crate::render::ffmpeg::ensure_parent_dir(dest)?;
        let file = std::fs::File::create(dest).map_err(|e| {
            ClipmillError::package(format!("failed to create '{}': {e}", dest.display()))
        })?;
        let mut zip = zip::ZipWriter::new(file);
        let options = zip::write::SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Deflated);

        for path in files {
            let name = path
                .file_name()
                .and_then(|n| n.to_str())
                .ok_or_else(|| {
                    ClipmillError::package(format!(
                        "output path '{}' has no usable file name",
                        path.display()
                    ))
                })?;
            zip.start_file(name, options).map_err(|e| {
                ClipmillError::package(format!("failed to start zip entry '{name}': {e}"))
            })?;
            let bytes = std::fs::read(path).map_err(|e| {
                ClipmillError::package(format!("failed to read '{}': {e}", path.display()))
            })?;
            zip.write_all(&bytes).map_err(|e| {
                ClipmillError::package(format!("failed to write zip entry '{name}': {e}"))
            })?;
        }

        zip.finish().map_err(|e| {
            ClipmillError::package(format!("failed to finalize '{}': {e}", dest.display()))
        })?;
        Ok(PackOutcome::Archive(dest.to_path_buf()))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/archive/zip.rs"]
mod tests;
