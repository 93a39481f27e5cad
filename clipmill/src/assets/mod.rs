//! Source assets: probing via `ffprobe`, named groups, and the registry the
//! planner selects from.

/// `ffprobe`-based source metadata probing.
pub mod media;
/// Groups, assets, and deterministic per-slot selection.
pub mod registry;
