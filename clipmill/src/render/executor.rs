//! Sequential batch execution of plans.
//!
//! Plan indices are processed strictly in order; a failure inside one index
//! drops that index and moves on (recorded in [`BatchResult::failures`]),
//! and cancellation is polled between indices only.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crate::assets::registry::GroupRegistry;
use crate::foundation::core::FrameSize;
use crate::foundation::error::{ClipmillError, ClipmillResult};
use crate::plan::planner::Plan;
use crate::render::renderer::{ClipJob, RenderedClip, Renderer};

/// Cooperative cancellation flag, settable from another thread.
///
/// The executor polls the token at the start of each plan index; once set,
/// no further indices are started and already-completed outputs are kept.
/// The executor resets the token after its terminal report so the next run
/// starts clean.
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    /// Create a fresh, unset token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    /// `true` when cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }

    /// Clear the flag.
    pub fn reset(&self) {
        self.flag.store(false, Ordering::Relaxed);
    }
}

/// Progress snapshot reported after each finished plan index.
#[derive(Clone, Debug, PartialEq)]
pub struct BatchProgress {
    /// Plan indices finished so far (successes and failures).
    pub completed: usize,
    /// Total plan indices in this batch.
    pub total: usize,
    /// Wall time since the batch started.
    pub elapsed: Duration,
    /// Running-average estimate of the remaining time; `None` until at least
    /// one index has finished.
    pub eta: Option<Duration>,
}

/// Observer for per-index progress reports.
pub trait ProgressSink {
    /// Called after each plan index finishes (successfully or not).
    fn on_progress(&mut self, progress: &BatchProgress);
}

/// Progress sink that discards all reports.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullProgress;

impl ProgressSink for NullProgress {
    fn on_progress(&mut self, _progress: &BatchProgress) {}
}

/// One successfully produced combined output.
#[derive(Clone, Debug)]
pub struct CombinedOutput {
    /// Plan index this output came from.
    pub index: usize,
    /// Persisted output path (`combined_{index+1}.mp4`).
    pub path: PathBuf,
    /// Combined duration in seconds.
    pub duration_s: f64,
}

/// A plan index that produced no output, with the reason.
#[derive(Clone, Debug)]
pub struct PlanFailure {
    /// Failing plan index.
    pub index: usize,
    /// Scoped, human-readable reason.
    pub reason: String,
}

/// Outcome of one batch execution.
#[derive(Clone, Debug, Default)]
pub struct BatchResult {
    /// Combined outputs in plan-index order.
    pub successes: Vec<CombinedOutput>,
    /// Dropped plan indices with reasons.
    pub failures: Vec<PlanFailure>,
}

/// Execution settings.
#[derive(Clone, Debug)]
pub struct ExecuteOpts {
    /// Directory combined outputs are written into.
    pub out_dir: PathBuf,
    /// Frame size every clip is scaled to before any other transform.
    pub frame_size: FrameSize,
}

impl Default for ExecuteOpts {
    fn default() -> Self {
        Self {
            out_dir: PathBuf::from("clipmill_out"),
            frame_size: FrameSize::PORTRAIT_1080X1920,
        }
    }
}

/// Execute plans strictly in index order.
///
/// Per index, each slot's asset is resolved, its range end-clamped and
/// validated, and the slot rendered; the index's clips are concatenated in
/// group order and persisted as `combined_{index+1}.mp4`. Any slot failure
/// (resolution, validation, or renderer error) voids that index and is
/// recorded in [`BatchResult::failures`]; the batch itself never aborts.
#[tracing::instrument(skip_all, fields(plans = plans.len()))]
pub fn execute(
    plans: &[Plan],
    registry: &GroupRegistry,
    renderer: &mut dyn Renderer,
    opts: &ExecuteOpts,
    cancel: &CancelToken,
    progress: &mut dyn ProgressSink,
) -> ClipmillResult<BatchResult> {
    opts.frame_size.validate()?;
    std::fs::create_dir_all(&opts.out_dir).map_err(|e| {
        ClipmillError::render(format!(
            "failed to create output directory '{}': {e}",
            opts.out_dir.display()
        ))
    })?;

    let total = plans.len();
    let started = Instant::now();
    let mut result = BatchResult::default();

    for plan in plans {
        if cancel.is_cancelled() {
            tracing::debug!(index = plan.index, "cancellation requested, stopping batch");
            break;
        }

        match execute_plan(plan, registry, renderer, opts) {
            Ok(output) => result.successes.push(output),
            Err(e) => {
                tracing::warn!(index = plan.index, error = %e, "plan index dropped");
                result.failures.push(PlanFailure {
                    index: plan.index,
                    reason: e.to_string(),
                });
            }
        }

        let completed = result.successes.len() + result.failures.len();
        let elapsed = started.elapsed();
        progress.on_progress(&BatchProgress {
            completed,
            total,
            elapsed,
            eta: estimate_remaining(elapsed, completed, total),
        });
    }

    cancel.reset();
    Ok(result)
}

fn execute_plan(
    plan: &Plan,
    registry: &GroupRegistry,
    renderer: &mut dyn Renderer,
    opts: &ExecuteOpts,
) -> ClipmillResult<CombinedOutput> {
    if plan.slots.is_empty() {
        return Err(ClipmillError::validation("plan has no renderable slots"));
    }

    let mut clips = Vec::<RenderedClip>::with_capacity(plan.slots.len());
    for slot in &plan.slots {
        let asset = registry
            .resolve(&slot.group, &slot.asset_file)
            .map_err(|e| with_slot_context(&slot.group, e))?;

        let range = slot.range.clamped_to(asset.duration_s);
        range
            .validate_for_render()
            .map_err(|e| with_slot_context(&slot.group, e))?;

        let job = ClipJob {
            source: asset.location.clone(),
            range,
            speed: slot.speed,
            caption: Some(slot.caption.trim().to_owned()).filter(|c| !c.is_empty()),
            frame_size: opts.frame_size,
        };
        let clip = renderer
            .render(&job)
            .map_err(|e| with_slot_context(&slot.group, e))?;
        clips.push(clip);
    }

    let combined = renderer.concatenate(&clips)?;
    let dest = opts.out_dir.join(format!("combined_{}.mp4", plan.index + 1));
    renderer.write(&combined, &dest)?;

    Ok(CombinedOutput {
        index: plan.index,
        path: dest,
        duration_s: combined.duration_s,
    })
}

/// Running-average remaining-time estimator.
fn estimate_remaining(elapsed: Duration, completed: usize, total: usize) -> Option<Duration> {
    if completed == 0 {
        return None;
    }
    let per_index = elapsed.as_secs_f64() / completed as f64;
    Some(Duration::from_secs_f64(
        per_index * total.saturating_sub(completed) as f64,
    ))
}

fn with_slot_context(group: &str, err: ClipmillError) -> ClipmillError {
    let scope = |m: String| format!("group '{group}': {m}");
    match err {
        ClipmillError::Validation(m) => ClipmillError::Validation(scope(m)),
        ClipmillError::Parse(m) => ClipmillError::Parse(scope(m)),
        ClipmillError::Resolution(m) => ClipmillError::Resolution(scope(m)),
        ClipmillError::Render(m) => ClipmillError::Render(scope(m)),
        ClipmillError::Package(m) => ClipmillError::Package(scope(m)),
        other @ ClipmillError::Other(_) => other,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/executor.rs"]
mod tests;
