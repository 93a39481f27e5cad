//! Per-line parsing of the three user-edited text blocks.
//!
//! Parsing is total: for any input text (empty, malformed, or partially
//! malformed) these functions return a value and never fail. Malformed lines
//! are reported through [`ParseWarning`]s and handled per [`LinePolicy`].

use crate::foundation::core::{Speed, TimeRange};

/// What to do with a malformed timing line.
///
/// `Skip` drops the line (interactive single-group flows, where positional
/// alignment does not matter). `DefaultFill` substitutes a neutral
/// `(0.0, 0.0)` entry so that positions stay aligned with the speed and
/// caption lists edited alongside; the placeholder fails `start < end`
/// validation later and drops only its own plan index. Whenever clips are
/// addressed by positional index across the three text blocks, `DefaultFill`
/// is required to avoid silent index drift.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LinePolicy {
    /// Drop malformed lines, surfacing a warning per line.
    Skip,
    /// Replace malformed lines with `(0.0, 0.0)`, surfacing a warning.
    DefaultFill,
}

/// Diagnostic for one unusable input line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseWarning {
    /// 1-based line number in the source text.
    pub line_no: usize,
    /// The offending line, trimmed.
    pub raw: String,
    /// Human-readable reason the line was unusable.
    pub reason: String,
}

/// Result of parsing a timings text block.
#[derive(Clone, Debug, Default)]
pub struct ParsedTimings {
    /// Parsed ranges, in input order.
    pub ranges: Vec<TimeRange>,
    /// Per-line diagnostics for unusable lines.
    pub warnings: Vec<ParseWarning>,
}

/// Result of parsing a speeds text block.
#[derive(Clone, Debug, Default)]
pub struct ParsedSpeeds {
    /// Parsed speeds, in input order.
    pub speeds: Vec<Speed>,
    /// Per-line diagnostics for lines that fell back to 1.0.
    pub warnings: Vec<ParseWarning>,
}

/// Parse timing lines of the form `start,end` (seconds).
///
/// Each non-empty line is split on the first comma; both halves are trimmed
/// and parsed as finite floats. Blank lines are ignored.
pub fn parse_timings(text: &str, policy: LinePolicy) -> ParsedTimings {
    let mut out = ParsedTimings::default();

    for (idx, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }

        match parse_timing_line(line) {
            Ok(range) => out.ranges.push(range),
            Err(reason) => {
                out.warnings.push(ParseWarning {
                    line_no: idx + 1,
                    raw: line.to_owned(),
                    reason,
                });
                if policy == LinePolicy::DefaultFill {
                    out.ranges.push(TimeRange::new(0.0, 0.0));
                }
            }
        }
    }

    out
}

fn parse_timing_line(line: &str) -> Result<TimeRange, String> {
    let Some((start_str, end_str)) = line.split_once(',') else {
        return Err("expected 'start,end'".to_owned());
    };
    let start = parse_finite(start_str.trim())?;
    let end = parse_finite(end_str.trim())?;
    Ok(TimeRange::new(start, end))
}

/// Parse speed lines, one float per line.
///
/// Invalid or non-positive values fall back to `1.0` (with a warning) rather
/// than being dropped, so positions stay aligned with the timing list.
/// Blank lines are ignored.
pub fn parse_speeds(text: &str) -> ParsedSpeeds {
    let mut out = ParsedSpeeds::default();

    for (idx, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }

        match parse_finite(line).and_then(|v| {
            if v > 0.0 {
                Ok(v)
            } else {
                Err(format!("speed must be > 0, got {v}"))
            }
        }) {
            Ok(v) => out.speeds.push(Speed::or_normal(v)),
            Err(reason) => {
                out.warnings.push(ParseWarning {
                    line_no: idx + 1,
                    raw: line.to_owned(),
                    reason,
                });
                out.speeds.push(Speed::NORMAL);
            }
        }
    }

    out
}

/// Parse caption lines.
///
/// Every line is kept (trimmed), including empty ones, to preserve position;
/// an empty caption means "no overlay" for that slot.
pub fn parse_captions(text: &str) -> Vec<String> {
    text.lines().map(|l| l.trim().to_owned()).collect()
}

fn parse_finite(s: &str) -> Result<f64, String> {
    match s.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        Ok(v) => Err(format!("value must be finite, got {v}")),
        Err(_) => Err(format!("not a number: '{s}'")),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/params/parse.rs"]
mod tests;
