/// Convenience result type used across clipmill.
pub type ClipmillResult<T> = Result<T, ClipmillError>;

/// Top-level error taxonomy used by pipeline APIs.
#[derive(thiserror::Error, Debug)]
pub enum ClipmillError {
    /// Invalid user-provided data (ranges, speeds, frame sizes, job files).
    #[error("validation error: {0}")]
    Validation(String),

    /// Errors while parsing boundary data (job JSON, ffprobe output).
    #[error("parse error: {0}")]
    Parse(String),

    /// A planned asset could not be resolved against the current registry.
    #[error("resolution error: {0}")]
    Resolution(String),

    /// Errors from the external renderer (ffmpeg invocation, media decode).
    #[error("render error: {0}")]
    Render(String),

    /// Errors while packaging outputs into an archive.
    #[error("packaging error: {0}")]
    Package(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ClipmillError {
    /// Build a [`ClipmillError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`ClipmillError::Parse`] value.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    /// Build a [`ClipmillError::Resolution`] value.
    pub fn resolution(msg: impl Into<String>) -> Self {
        Self::Resolution(msg.into())
    }

    /// Build a [`ClipmillError::Render`] value.
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Build a [`ClipmillError::Package`] value.
    pub fn package(msg: impl Into<String>) -> Self {
        Self::Package(msg.into())
    }
}
