//! Rendering: the external-renderer seam, the `ffmpeg` implementation, and
//! the sequential batch executor.

/// Batch execution of plans: ordering, failure policy, cancellation,
/// progress.
pub mod executor;
/// `ffmpeg`-backed renderer (trim, scale, speed, caption, concat).
pub mod ffmpeg;
/// Renderer trait and built-in stand-ins.
pub mod renderer;
