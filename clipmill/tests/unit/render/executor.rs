use std::time::Duration;

use super::*;
use crate::assets::registry::Asset;
use crate::foundation::core::{Speed, TimeRange};
use crate::plan::planner::ClipSlot;
use crate::render::renderer::DryRunRenderer;

fn registry() -> GroupRegistry {
    let mut reg = GroupRegistry::new();
    reg.register("A", vec![Asset::new("/media/a.mp4", 30.0).unwrap()])
        .unwrap();
    reg.register("B", vec![Asset::new("/media/b.mp4", 20.0).unwrap()])
        .unwrap();
    reg
}

fn slot(group: &str, asset_file: &str, range: TimeRange) -> ClipSlot {
    ClipSlot {
        group: group.to_owned(),
        asset_file: asset_file.to_owned(),
        range,
        speed: Speed::NORMAL,
        caption: String::new(),
    }
}

fn two_group_plan(index: usize, range: TimeRange) -> Plan {
    Plan {
        index,
        slots: vec![slot("A", "a.mp4", range), slot("B", "b.mp4", range)],
    }
}

fn opts(test: &str) -> ExecuteOpts {
    ExecuteOpts {
        out_dir: std::env::temp_dir()
            .join("clipmill_executor_tests")
            .join(format!("{test}_{}", std::process::id())),
        ..ExecuteOpts::default()
    }
}

struct Recording {
    reports: Vec<BatchProgress>,
}

impl ProgressSink for Recording {
    fn on_progress(&mut self, progress: &BatchProgress) {
        self.reports.push(progress.clone());
    }
}

struct CancelAfter {
    token: CancelToken,
    after: usize,
}

impl ProgressSink for CancelAfter {
    fn on_progress(&mut self, progress: &BatchProgress) {
        if progress.completed >= self.after {
            self.token.cancel();
        }
    }
}

#[test]
fn outputs_are_produced_in_plan_index_order() {
    let reg = registry();
    let plans = vec![
        two_group_plan(0, TimeRange::new(0.0, 5.0)),
        two_group_plan(1, TimeRange::new(1.0, 4.0)),
    ];
    let mut renderer = DryRunRenderer::new();
    let opts = opts("ordered");

    let result = execute(
        &plans,
        &reg,
        &mut renderer,
        &opts,
        &CancelToken::new(),
        &mut NullProgress,
    )
    .unwrap();

    assert!(result.failures.is_empty());
    assert_eq!(result.successes.len(), 2);
    assert_eq!(result.successes[0].index, 0);
    assert_eq!(result.successes[1].index, 1);
    assert!(result.successes[0].path.ends_with("combined_1.mp4"));
    assert!(result.successes[0].path.exists());
    // Two 5s slots concatenated at 1x.
    assert!((result.successes[0].duration_s - 10.0).abs() < 1e-9);
    // One render job per slot, in group order.
    assert_eq!(renderer.jobs().len(), 4);
    assert!(renderer.jobs()[0].source.ends_with("a.mp4"));
    assert!(renderer.jobs()[1].source.ends_with("b.mp4"));
}

#[test]
fn ranges_are_end_clamped_before_rendering() {
    let reg = registry();
    let plans = vec![Plan {
        index: 0,
        slots: vec![slot("A", "a.mp4", TimeRange::new(0.0, 100.0))],
    }];
    let mut renderer = DryRunRenderer::new();

    let result = execute(
        &plans,
        &reg,
        &mut renderer,
        &opts("clamped"),
        &CancelToken::new(),
        &mut NullProgress,
    )
    .unwrap();

    assert_eq!(result.successes.len(), 1);
    let job = &renderer.jobs()[0];
    assert!(job.range.end_s <= 30.0 - crate::foundation::core::END_CLAMP_EPSILON_S + 1e-9);
}

#[test]
fn an_invalid_slot_drops_only_its_own_index() {
    let reg = registry();
    let plans = vec![
        two_group_plan(0, TimeRange::new(0.0, 5.0)),
        // The (0, 0) placeholder from default-substitution fails validation.
        two_group_plan(1, TimeRange::new(0.0, 0.0)),
        two_group_plan(2, TimeRange::new(2.0, 6.0)),
    ];
    let mut renderer = DryRunRenderer::new();

    let result = execute(
        &plans,
        &reg,
        &mut renderer,
        &opts("invalid_slot"),
        &CancelToken::new(),
        &mut NullProgress,
    )
    .unwrap();

    assert_eq!(result.successes.len(), 2);
    assert_eq!(result.successes[0].index, 0);
    assert_eq!(result.successes[1].index, 2);
    assert_eq!(result.failures.len(), 1);
    assert_eq!(result.failures[0].index, 1);
    assert!(result.failures[0].reason.contains("group 'A'"));
    assert!(result.failures[0].reason.contains("start"));
}

#[test]
fn unresolvable_assets_drop_the_index_and_continue() {
    let reg = registry();
    let plans = vec![
        Plan {
            index: 0,
            slots: vec![slot("A", "gone.mp4", TimeRange::new(0.0, 5.0))],
        },
        two_group_plan(1, TimeRange::new(0.0, 5.0)),
    ];
    let mut renderer = DryRunRenderer::new();

    let result = execute(
        &plans,
        &reg,
        &mut renderer,
        &opts("unresolvable"),
        &CancelToken::new(),
        &mut NullProgress,
    )
    .unwrap();

    assert_eq!(result.failures.len(), 1);
    assert_eq!(result.failures[0].index, 0);
    assert!(result.failures[0].reason.contains("resolution error"));
    assert!(result.failures[0].reason.contains("gone.mp4"));
    assert_eq!(result.successes.len(), 1);
    assert_eq!(result.successes[0].index, 1);
}

#[test]
fn renderer_errors_are_per_index_failures() {
    struct FailSecond {
        inner: DryRunRenderer,
        calls: usize,
    }
    impl Renderer for FailSecond {
        fn render(&mut self, job: &ClipJob) -> ClipmillResult<RenderedClip> {
            self.calls += 1;
            if self.calls == 2 {
                return Err(ClipmillError::render("decoder blew up"));
            }
            self.inner.render(job)
        }
        fn concatenate(&mut self, clips: &[RenderedClip]) -> ClipmillResult<RenderedClip> {
            self.inner.concatenate(clips)
        }
        fn write(&mut self, clip: &RenderedClip, dest: &std::path::Path) -> ClipmillResult<()> {
            self.inner.write(clip, dest)
        }
    }

    let reg = registry();
    let plans = vec![
        Plan {
            index: 0,
            slots: vec![slot("A", "a.mp4", TimeRange::new(0.0, 5.0))],
        },
        Plan {
            index: 1,
            slots: vec![slot("A", "a.mp4", TimeRange::new(0.0, 5.0))],
        },
        Plan {
            index: 2,
            slots: vec![slot("A", "a.mp4", TimeRange::new(0.0, 5.0))],
        },
    ];
    let mut renderer = FailSecond {
        inner: DryRunRenderer::new(),
        calls: 0,
    };

    let result = execute(
        &plans,
        &reg,
        &mut renderer,
        &opts("renderer_error"),
        &CancelToken::new(),
        &mut NullProgress,
    )
    .unwrap();

    assert_eq!(result.successes.len(), 2);
    assert_eq!(result.failures.len(), 1);
    assert_eq!(result.failures[0].index, 1);
    assert!(result.failures[0].reason.contains("decoder blew up"));
}

#[test]
fn cancellation_stops_before_the_next_index_and_keeps_outputs() {
    let reg = registry();
    let plans: Vec<Plan> = (0..5)
        .map(|i| two_group_plan(i, TimeRange::new(0.0, 2.0)))
        .collect();
    let mut renderer = DryRunRenderer::new();
    let cancel = CancelToken::new();
    let mut progress = CancelAfter {
        token: cancel.clone(),
        after: 3,
    };

    let result = execute(
        &plans,
        &reg,
        &mut renderer,
        &opts("cancel"),
        &cancel,
        &mut progress,
    )
    .unwrap();

    assert_eq!(result.successes.len(), 3);
    assert!(result.failures.is_empty());
    let indices: Vec<usize> = result.successes.iter().map(|s| s.index).collect();
    assert_eq!(indices, vec![0, 1, 2]);
    // The flag is cleared after the terminal report so the next run starts
    // clean.
    assert!(!cancel.is_cancelled());
}

#[test]
fn progress_reports_count_every_finished_index() {
    let reg = registry();
    let plans = vec![
        two_group_plan(0, TimeRange::new(0.0, 2.0)),
        two_group_plan(1, TimeRange::new(0.0, 0.0)),
        two_group_plan(2, TimeRange::new(0.0, 2.0)),
    ];
    let mut renderer = DryRunRenderer::new();
    let mut progress = Recording {
        reports: Vec::new(),
    };

    execute(
        &plans,
        &reg,
        &mut renderer,
        &opts("progress"),
        &CancelToken::new(),
        &mut progress,
    )
    .unwrap();

    let completed: Vec<usize> = progress.reports.iter().map(|r| r.completed).collect();
    assert_eq!(completed, vec![1, 2, 3]);
    assert!(progress.reports.iter().all(|r| r.total == 3));
    assert!(progress.reports.iter().all(|r| r.eta.is_some()));
    assert_eq!(progress.reports.last().unwrap().eta, Some(Duration::ZERO));
}

#[test]
fn eta_short_circuits_with_nothing_completed() {
    assert_eq!(estimate_remaining(Duration::from_secs(10), 0, 5), None);
    assert_eq!(
        estimate_remaining(Duration::from_secs(10), 2, 5),
        Some(Duration::from_secs(15))
    );
}

#[test]
fn a_plan_with_no_slots_is_a_recorded_failure() {
    let reg = registry();
    let plans = vec![Plan {
        index: 0,
        slots: Vec::new(),
    }];
    let mut renderer = DryRunRenderer::new();

    let result = execute(
        &plans,
        &reg,
        &mut renderer,
        &opts("no_slots"),
        &CancelToken::new(),
        &mut NullProgress,
    )
    .unwrap();

    assert!(result.successes.is_empty());
    assert_eq!(result.failures.len(), 1);
}
