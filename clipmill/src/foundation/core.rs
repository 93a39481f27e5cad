use crate::foundation::error::{ClipmillError, ClipmillResult};

/// Margin subtracted from a source's total duration when clamping a range's
/// end, so the renderer never requests frames past end-of-stream.
pub const END_CLAMP_EPSILON_S: f64 = 0.01;

/// Half-open time range `[start_s, end_s)` in source-media seconds.
///
/// A `TimeRange` is deliberately not validated on construction: malformed or
/// inverted pairs are tolerated while parsing user text and rejected at
/// render time with a per-slot diagnostic ([`TimeRange::validate_for_render`]).
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TimeRange {
    /// Range start in seconds.
    pub start_s: f64,
    /// Range end in seconds.
    pub end_s: f64,
}

impl TimeRange {
    /// Create a range without validating it.
    pub fn new(start_s: f64, end_s: f64) -> Self {
        Self { start_s, end_s }
    }

    /// Length of the range in seconds (may be non-positive for invalid pairs).
    pub fn duration_s(self) -> f64 {
        self.end_s - self.start_s
    }

    /// Clamp the end to `duration_s − ε` so decoding never runs past
    /// end-of-stream. The start is left untouched.
    pub fn clamped_to(self, duration_s: f64) -> Self {
        Self {
            start_s: self.start_s,
            end_s: self.end_s.min(duration_s - END_CLAMP_EPSILON_S),
        }
    }

    /// Check the invariants required before handing the range to a renderer.
    ///
    /// Both bounds must be finite, the start non-negative, and the start
    /// strictly before the end.
    pub fn validate_for_render(self) -> ClipmillResult<()> {
        if !self.start_s.is_finite() || !self.end_s.is_finite() {
            return Err(ClipmillError::validation(format!(
                "time range ({}, {}) must be finite",
                self.start_s, self.end_s
            )));
        }
        if self.start_s < 0.0 {
            return Err(ClipmillError::validation(format!(
                "time range start ({}) must be >= 0",
                self.start_s
            )));
        }
        if self.start_s >= self.end_s {
            return Err(ClipmillError::validation(format!(
                "time range start ({}) must be < end ({})",
                self.start_s, self.end_s
            )));
        }
        Ok(())
    }
}

/// Playback-speed multiplier applied to a trimmed clip.
///
/// `1.0` is identity; the constructors guarantee the factor is finite and
/// positive, non-conforming input falls back to [`Speed::NORMAL`].
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Speed(f64);

impl Speed {
    /// No speed change.
    pub const NORMAL: Speed = Speed(1.0);

    /// Create a validated speed.
    pub fn new(factor: f64) -> ClipmillResult<Self> {
        if !factor.is_finite() || factor <= 0.0 {
            return Err(ClipmillError::validation(format!(
                "speed multiplier must be finite and > 0, got {factor}"
            )));
        }
        Ok(Self(factor))
    }

    /// Create a speed, falling back to [`Speed::NORMAL`] when `factor` is not
    /// a positive finite number.
    pub fn or_normal(factor: f64) -> Self {
        Self::new(factor).unwrap_or(Self::NORMAL)
    }

    /// Raw multiplier.
    pub fn factor(self) -> f64 {
        self.0
    }

    /// `true` when applying this speed is a no-op.
    pub fn is_identity(self) -> bool {
        self.0 == 1.0
    }

    /// Duration of a clip after this speed is applied.
    pub fn scaled_duration_s(self, duration_s: f64) -> f64 {
        duration_s / self.0
    }
}

/// Output frame dimensions in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct FrameSize {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl FrameSize {
    /// The system-wide vertical target every clip is scaled to before any
    /// other transform.
    pub const PORTRAIT_1080X1920: FrameSize = FrameSize {
        width: 1080,
        height: 1920,
    };

    /// Validate encoder constraints: non-zero, even dimensions (required for
    /// yuv420p output).
    pub fn validate(self) -> ClipmillResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(ClipmillError::validation(
                "frame size width/height must be non-zero",
            ));
        }
        if !self.width.is_multiple_of(2) || !self.height.is_multiple_of(2) {
            return Err(ClipmillError::validation(
                "frame size width/height must be even (required for yuv420p output)",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
