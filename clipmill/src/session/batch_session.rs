//! Session-oriented orchestration.
//!
//! A [`BatchSession`] owns all state the pipeline mutates between runs: the
//! group registry, per-group settings buckets, generated plans, the audit
//! latch, and the cancellation token. All mutation goes through its entry
//! points; during one `execute` call the registry and settings are read-only
//! snapshots (enforced by `&mut self`).

use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::archive::zip::{Archiver, PackOutcome};
use crate::assets::registry::{Asset, GroupRegistry, SelectionStrategy, UniformSelection};
use crate::foundation::core::FrameSize;
use crate::foundation::error::{ClipmillError, ClipmillResult};
use crate::foundation::math::Rng64;
use crate::plan::planner::{
    GenerationMode, Plan, SelectionAudit, SettingsBucket, ensure_settings, plan, selection_audit,
};
use crate::render::executor::{BatchResult, CancelToken, ExecuteOpts, ProgressSink, execute};
use crate::render::renderer::Renderer;

/// Options controlling a [`BatchSession`].
#[derive(Clone, Debug)]
pub struct BatchSessionOpts {
    /// Seed all selection and rolling derives from.
    pub seed: u64,
    /// Directory combined outputs and the archive are written into.
    pub out_dir: PathBuf,
    /// Frame size applied to every clip.
    pub frame_size: FrameSize,
    /// Base name of the archive produced by [`BatchSession::package`].
    pub archive_name: String,
}

impl Default for BatchSessionOpts {
    fn default() -> Self {
        Self {
            seed: 0,
            out_dir: PathBuf::from("clipmill_out"),
            frame_size: FrameSize::PORTRAIT_1080X1920,
            archive_name: "edited_clips.zip".to_owned(),
        }
    }
}

/// One user session of the batch pipeline.
pub struct BatchSession {
    opts: BatchSessionOpts,
    seed: u64,
    registry: GroupRegistry,
    buckets: BTreeMap<String, SettingsBucket>,
    plans: Vec<Plan>,
    audited: bool,
    cancel: CancelToken,
    strategy: Box<dyn SelectionStrategy>,
}

impl BatchSession {
    /// Create a session with uniform-random asset selection.
    pub fn new(opts: BatchSessionOpts) -> Self {
        Self::with_strategy(opts, Box::new(UniformSelection))
    }

    /// Create a session with a custom selection strategy.
    pub fn with_strategy(opts: BatchSessionOpts, strategy: Box<dyn SelectionStrategy>) -> Self {
        let seed = opts.seed;
        Self {
            opts,
            seed,
            registry: GroupRegistry::new(),
            buckets: BTreeMap::new(),
            plans: Vec::new(),
            audited: false,
            cancel: CancelToken::new(),
            strategy,
        }
    }

    /// Current selection seed (changes on [`BatchSession::randomize`]).
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// The registered groups.
    pub fn registry(&self) -> &GroupRegistry {
        &self.registry
    }

    /// Settings bucket for a group, if one exists.
    pub fn settings(&self, group: &str) -> Option<&SettingsBucket> {
        self.buckets.get(group)
    }

    /// Currently stored plans (empty until [`BatchSession::ensure_plans`]).
    pub fn plans(&self) -> &[Plan] {
        &self.plans
    }

    /// A clone of the session's cancellation token, settable from elsewhere
    /// between plan indices.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Register a named group with pre-probed assets.
    pub fn add_group(&mut self, name: impl Into<String>, assets: Vec<Asset>) -> ClipmillResult<()> {
        let name = name.into();
        self.registry.register(name.clone(), assets)?;
        self.buckets.insert(name, SettingsBucket::default());
        self.invalidate_plans();
        Ok(())
    }

    /// Register a named group, probing each source through `ffprobe`.
    pub fn add_group_sources(
        &mut self,
        name: impl Into<String>,
        sources: &[PathBuf],
    ) -> ClipmillResult<()> {
        let name = name.into();
        self.registry.register_sources(name.clone(), sources)?;
        self.buckets.insert(name, SettingsBucket::default());
        self.invalidate_plans();
        Ok(())
    }

    /// Replace a group's timings text with a user edit.
    pub fn edit_timings(&mut self, group: &str, text: impl Into<String>) -> ClipmillResult<()> {
        self.bucket_mut(group)?.set_timings_text(text);
        self.invalidate_plans();
        Ok(())
    }

    /// Replace a group's speeds text with a user edit.
    pub fn edit_speeds(&mut self, group: &str, text: impl Into<String>) -> ClipmillResult<()> {
        self.bucket_mut(group)?.set_speeds_text(text);
        self.invalidate_plans();
        Ok(())
    }

    /// Replace a group's captions text with a user edit.
    pub fn edit_captions(&mut self, group: &str, text: impl Into<String>) -> ClipmillResult<()> {
        self.bucket_mut(group)?.set_captions_text(text);
        self.invalidate_plans();
        Ok(())
    }

    /// Request a fresh auto-roll of one group's settings on the next
    /// [`BatchSession::ensure_plans`] call, without touching the seed (other
    /// groups' selections are unaffected).
    pub fn regenerate_settings(&mut self, group: &str) -> ClipmillResult<()> {
        self.bucket_mut(group)?.request_roll();
        self.invalidate_plans();
        Ok(())
    }

    /// Re-roll everything: advance the selection seed and mark every bucket
    /// for regeneration. The new seed is derived deterministically from the
    /// old one, so a randomize is reproducibly distinct from the prior roll.
    pub fn randomize(&mut self) {
        self.seed = Rng64::new(self.seed).next_u64();
        for bucket in self.buckets.values_mut() {
            bucket.request_roll();
        }
        self.invalidate_plans();
    }

    /// Roll stale settings and (re)build plans for `n` outputs.
    ///
    /// Idempotent: with unchanged `n` and no pending edits or roll requests,
    /// stored settings text and plans are left untouched, and a previously
    /// taken audit stays valid.
    pub fn ensure_plans(&mut self, n: usize, mode: GenerationMode) -> ClipmillResult<&[Plan]> {
        if n == 0 {
            return Err(ClipmillError::validation("output count must be >= 1"));
        }

        let stale = self
            .registry
            .non_empty_groups()
            .any(|g| self.buckets.get(g.name()).is_none_or(|b| b.is_stale(n)));
        if !stale && self.plans.len() == n {
            return Ok(&self.plans);
        }

        ensure_settings(
            &self.registry,
            &mut self.buckets,
            n,
            mode,
            self.seed,
            self.strategy.as_ref(),
        );
        self.plans = plan(
            &self.registry,
            &self.buckets,
            n,
            self.seed,
            self.strategy.as_ref(),
        )?;
        self.audited = false;
        Ok(&self.plans)
    }

    /// Produce the audit table for the stored plans and unlock execution.
    pub fn selection_audit(&mut self) -> ClipmillResult<SelectionAudit> {
        if self.plans.is_empty() {
            return Err(ClipmillError::validation(
                "no plans to audit; call ensure_plans first",
            ));
        }
        self.audited = true;
        Ok(selection_audit(&self.plans, &self.registry))
    }

    /// Execute the stored plans.
    ///
    /// Gated on the selection audit having been taken since the last
    /// (re)plan.
    pub fn execute(
        &mut self,
        renderer: &mut dyn Renderer,
        progress: &mut dyn ProgressSink,
    ) -> ClipmillResult<BatchResult> {
        if self.plans.is_empty() {
            return Err(ClipmillError::validation(
                "no plans to execute; call ensure_plans first",
            ));
        }
        if !self.audited {
            return Err(ClipmillError::validation(
                "selection audit must be taken before executing",
            ));
        }
        let opts = ExecuteOpts {
            out_dir: self.opts.out_dir.clone(),
            frame_size: self.opts.frame_size,
        };
        execute(
            &self.plans,
            &self.registry,
            renderer,
            &opts,
            &self.cancel,
            progress,
        )
    }

    /// Pack a batch's successful outputs into the session archive.
    pub fn package(
        &self,
        archiver: &dyn Archiver,
        result: &BatchResult,
    ) -> ClipmillResult<PackOutcome> {
        let files: Vec<PathBuf> = result.successes.iter().map(|s| s.path.clone()).collect();
        let dest = self.opts.out_dir.join(&self.opts.archive_name);
        archiver.pack(&files, &dest)
    }

    fn bucket_mut(&mut self, group: &str) -> ClipmillResult<&mut SettingsBucket> {
        self.buckets.get_mut(group).ok_or_else(|| {
            ClipmillError::validation(format!("group '{group}' is not registered"))
        })
    }

    fn invalidate_plans(&mut self) {
        self.plans.clear();
        self.audited = false;
    }
}
