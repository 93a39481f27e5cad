//! Sequence planning.
//!
//! The planner turns per-group settings text (timings, speeds, captions) plus
//! the group registry into `N` immutable [`Plan`]s, one per output index.
//! Settings text is either user-edited or auto-rolled; rolls are deterministic
//! in the session seed and re-run only when explicitly requested or when the
//! requested count diverges from an auto-managed bucket.

use std::collections::BTreeMap;

use crate::assets::registry::{Group, GroupRegistry, SelectionStrategy};
use crate::foundation::core::{Speed, TimeRange};
use crate::foundation::error::{ClipmillError, ClipmillResult};
use crate::foundation::math::round_rng;
use crate::params::parse::{LinePolicy, parse_captions, parse_speeds, parse_timings};

/// Smallest window auto-rolled timings aim for, in seconds.
const MIN_WINDOW_S: f64 = 0.5;

// Distinct stream salts so re-rolling timings never perturbs asset selection
// (which draws from the unsalted stream) and vice versa.
const TIMING_STREAM: u64 = 0x7414_9A8C_55B1_63D1;
const SPEED_STREAM: u64 = 0x2F6E_2A1B_9D03_77E5;

/// How auto-rolled settings are generated.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GenerationMode {
    /// Random windows (≥ 0.5 s) and right-skewed speed-up multipliers.
    #[default]
    Random,
    /// Full-range `(0, duration)` windows at normal speed.
    FullLength,
}

/// Per-group settings: the three user-visible text blocks plus roll state.
///
/// Text is authoritative once a user edits it; auto-managed buckets are
/// re-rolled when a roll is requested or when the requested output count no
/// longer matches their line count.
#[derive(Clone, Debug)]
pub struct SettingsBucket {
    timings_text: String,
    speeds_text: String,
    captions_text: String,
    needs_roll: bool,
    auto: bool,
}

impl Default for SettingsBucket {
    fn default() -> Self {
        Self {
            timings_text: String::new(),
            speeds_text: String::new(),
            captions_text: String::new(),
            needs_roll: true,
            auto: true,
        }
    }
}

impl SettingsBucket {
    /// A bucket holding user-provided text; it will never be auto-rolled
    /// unless a roll is explicitly requested.
    pub fn from_text(
        timings: impl Into<String>,
        speeds: impl Into<String>,
        captions: impl Into<String>,
    ) -> Self {
        Self {
            timings_text: timings.into(),
            speeds_text: speeds.into(),
            captions_text: captions.into(),
            needs_roll: false,
            auto: false,
        }
    }

    /// Current timings text.
    pub fn timings_text(&self) -> &str {
        &self.timings_text
    }

    /// Current speeds text.
    pub fn speeds_text(&self) -> &str {
        &self.speeds_text
    }

    /// Current captions text.
    pub fn captions_text(&self) -> &str {
        &self.captions_text
    }

    /// Replace the timings text with a user edit. Edits always win: the
    /// bucket stops being auto-managed.
    pub fn set_timings_text(&mut self, text: impl Into<String>) {
        self.timings_text = text.into();
        self.auto = false;
        self.needs_roll = false;
    }

    /// Replace the speeds text with a user edit.
    pub fn set_speeds_text(&mut self, text: impl Into<String>) {
        self.speeds_text = text.into();
        self.auto = false;
        self.needs_roll = false;
    }

    /// Replace the captions text with a user edit.
    pub fn set_captions_text(&mut self, text: impl Into<String>) {
        self.captions_text = text.into();
        self.auto = false;
        self.needs_roll = false;
    }

    /// Request a fresh auto-roll on the next [`ensure_settings`] call.
    pub fn request_roll(&mut self) {
        self.needs_roll = true;
    }

    /// `true` when the next [`ensure_settings`] call will regenerate this
    /// bucket for the given output count.
    pub fn is_stale(&self, n: usize) -> bool {
        self.needs_roll || (self.auto && self.timing_line_count() != n)
    }

    fn timing_line_count(&self) -> usize {
        self.timings_text
            .lines()
            .filter(|l| !l.trim().is_empty())
            .count()
    }
}

/// One (group, asset, range, speed, caption) binding: the atomic unit of
/// rendering work.
#[derive(Clone, Debug, serde::Serialize)]
pub struct ClipSlot {
    /// Owning group name.
    pub group: String,
    /// Selected asset's file name within the group.
    pub asset_file: String,
    /// Trim range in source seconds.
    pub range: TimeRange,
    /// Speed multiplier.
    pub speed: Speed,
    /// Overlay caption; empty means no overlay.
    pub caption: String,
}

/// One full cross-group selection destined to become one combined output.
///
/// Plans are immutable after creation; re-rolling regenerates new plans
/// rather than editing in place.
#[derive(Clone, Debug, serde::Serialize)]
pub struct Plan {
    /// Output index in `[0, N)`.
    pub index: usize,
    /// One slot per non-empty group, in group registration order.
    pub slots: Vec<ClipSlot>,
}

/// One row of the pre-execution selection audit.
#[derive(Clone, Debug, serde::Serialize)]
pub struct AuditRow {
    /// Output index.
    pub index: usize,
    /// Group name.
    pub group: String,
    /// Chosen asset file name.
    pub asset_file: String,
    /// Chosen asset duration, when still resolvable.
    pub duration_s: Option<f64>,
}

/// The audit table (group × index → chosen asset + duration) that must be
/// taken before execution proceeds.
#[derive(Clone, Debug, Default, serde::Serialize)]
pub struct SelectionAudit {
    /// Rows in (index, group) order.
    pub rows: Vec<AuditRow>,
}

/// Roll fresh settings text for one group.
///
/// The roll is a pure function of `(group, n, mode, seed)`; asset selection
/// inside the roll uses the same stream the planner uses, so the rolled
/// timings always fit the asset that will actually be chosen.
pub fn roll_settings(
    group: &Group,
    n: usize,
    mode: GenerationMode,
    seed: u64,
    strategy: &dyn SelectionStrategy,
) -> SettingsBucket {
    let mut timings = String::new();
    let mut speeds = String::new();
    let mut captions = String::new();

    for i in 0..n {
        let duration_s = strategy
            .select(group, i, seed)
            .and_then(|idx| group.assets().get(idx))
            .map(|a| a.duration_s)
            .unwrap_or(0.0);

        let range = match mode {
            GenerationMode::FullLength => TimeRange::new(0.0, duration_s),
            GenerationMode::Random => auto_time_range(duration_s, seed, group.name(), i),
        };
        let speed = match mode {
            GenerationMode::FullLength => Speed::NORMAL,
            GenerationMode::Random => skewed_speed(seed, group.name(), i),
        };

        timings.push_str(&format!("{:.2}, {:.2}\n", range.start_s, range.end_s));
        speeds.push_str(&format!("{:.2}\n", speed.factor()));
        captions.push_str(&format!("Clip {}\n", i + 1));
    }

    SettingsBucket {
        timings_text: timings,
        speeds_text: speeds,
        captions_text: captions,
        needs_roll: false,
        auto: true,
    }
}

/// Random trim window within `[0, duration)`.
///
/// Sources of one second or shorter get the trivial full range; the random
/// path keeps at least one second of headroom for the start so the window
/// never inverts.
fn auto_time_range(duration_s: f64, seed: u64, group_name: &str, round: usize) -> TimeRange {
    if duration_s <= 1.0 {
        return TimeRange::new(0.0, duration_s.max(0.0));
    }
    let mut rng = round_rng(seed ^ TIMING_STREAM, group_name, round);
    let start = rng.next_f64_01() * (duration_s - 1.0);
    let max_len = duration_s - start;
    let len = MIN_WINDOW_S + rng.next_f64_01() * (max_len - MIN_WINDOW_S);
    TimeRange::new(start, start + len)
}

/// Right-skewed speed draw favoring > 1.0 "speed-up" multipliers.
///
/// Maps a uniform draw through `0.75 + 2.25·u^0.6`, which puts roughly 70%
/// of the mass above 1.0, then rounds to two decimals for the text form.
fn skewed_speed(seed: u64, group_name: &str, round: usize) -> Speed {
    let mut rng = round_rng(seed ^ SPEED_STREAM, group_name, round);
    let u = rng.next_f64_01();
    let factor = 0.75 + 2.25 * u.powf(0.6);
    Speed::or_normal((factor * 100.0).round() / 100.0)
}

/// Roll every stale bucket for the registry's non-empty groups.
///
/// Buckets that are neither dirty nor count-diverged are left byte-identical,
/// so repeated calls with unchanged inputs are idempotent.
pub fn ensure_settings(
    registry: &GroupRegistry,
    buckets: &mut BTreeMap<String, SettingsBucket>,
    n: usize,
    mode: GenerationMode,
    seed: u64,
    strategy: &dyn SelectionStrategy,
) {
    for group in registry.non_empty_groups() {
        let bucket = buckets.entry(group.name().to_owned()).or_default();
        if bucket.is_stale(n) {
            *bucket = roll_settings(group, n, mode, seed, strategy);
        }
    }
}

/// Build `n` plans from the current settings.
///
/// Timings are parsed under [`LinePolicy::DefaultFill`] and all three lists
/// are padded with neutral defaults past their last line, so every plan index
/// gets a slot for every non-empty group and positions never drift across the
/// three text blocks. Neutral placeholders fail validation at render time and
/// drop only their own index.
#[tracing::instrument(skip(registry, buckets, strategy))]
pub fn plan(
    registry: &GroupRegistry,
    buckets: &BTreeMap<String, SettingsBucket>,
    n: usize,
    seed: u64,
    strategy: &dyn SelectionStrategy,
) -> ClipmillResult<Vec<Plan>> {
    if n == 0 {
        return Err(ClipmillError::validation("output count must be >= 1"));
    }

    struct GroupParams<'a> {
        group: &'a Group,
        ranges: Vec<TimeRange>,
        speeds: Vec<Speed>,
        captions: Vec<String>,
    }

    let mut per_group = Vec::new();
    for group in registry.non_empty_groups() {
        let bucket = buckets.get(group.name()).ok_or_else(|| {
            ClipmillError::validation(format!(
                "no settings for group '{}'; roll or edit settings first",
                group.name()
            ))
        })?;
        per_group.push(GroupParams {
            group,
            ranges: parse_timings(bucket.timings_text(), LinePolicy::DefaultFill).ranges,
            speeds: parse_speeds(bucket.speeds_text()).speeds,
            captions: parse_captions(bucket.captions_text()),
        });
    }

    let mut plans = Vec::with_capacity(n);
    for i in 0..n {
        let mut slots = Vec::with_capacity(per_group.len());
        for gp in &per_group {
            let Some(asset_idx) = strategy.select(gp.group, i, seed) else {
                continue;
            };
            let asset = &gp.group.assets()[asset_idx];
            slots.push(ClipSlot {
                group: gp.group.name().to_owned(),
                asset_file: asset.file_name.clone(),
                range: gp
                    .ranges
                    .get(i)
                    .copied()
                    .unwrap_or_else(|| TimeRange::new(0.0, 0.0)),
                speed: gp.speeds.get(i).copied().unwrap_or(Speed::NORMAL),
                caption: gp.captions.get(i).cloned().unwrap_or_default(),
            });
        }
        plans.push(Plan { index: i, slots });
    }

    Ok(plans)
}

/// Build the audit table for a set of plans.
pub fn selection_audit(plans: &[Plan], registry: &GroupRegistry) -> SelectionAudit {
    let mut rows = Vec::new();
    for plan in plans {
        for slot in &plan.slots {
            rows.push(AuditRow {
                index: plan.index,
                group: slot.group.clone(),
                asset_file: slot.asset_file.clone(),
                duration_s: registry
                    .resolve(&slot.group, &slot.asset_file)
                    .ok()
                    .map(|a| a.duration_s),
            });
        }
    }
    SelectionAudit { rows }
}

#[cfg(test)]
#[path = "../../tests/unit/plan/planner.rs"]
mod tests;
