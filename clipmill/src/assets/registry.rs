use std::path::PathBuf;

use crate::assets::media::probe_source;
use crate::foundation::error::{ClipmillError, ClipmillResult};
use crate::foundation::math::round_rng;

/// One registered source video.
///
/// Immutable once registered; owned by the [`GroupRegistry`] for the lifetime
/// of a session.
#[derive(Clone, Debug)]
pub struct Asset {
    /// Original file name, the asset's identity within its group.
    pub file_name: String,
    /// Storage location handed to the renderer.
    pub location: PathBuf,
    /// Total duration in seconds.
    pub duration_s: f64,
}

impl Asset {
    /// Build an asset from a path and a known duration.
    ///
    /// The file name component of `location` becomes the asset's identity.
    pub fn new(location: impl Into<PathBuf>, duration_s: f64) -> ClipmillResult<Self> {
        let location = location.into();
        if !duration_s.is_finite() || duration_s < 0.0 {
            return Err(ClipmillError::validation(format!(
                "asset duration must be finite and >= 0, got {duration_s}"
            )));
        }
        let file_name = location
            .file_name()
            .and_then(|n| n.to_str())
            .map(str::to_owned)
            .ok_or_else(|| {
                ClipmillError::validation(format!(
                    "asset path '{}' has no usable file name",
                    location.display()
                ))
            })?;
        Ok(Self {
            file_name,
            location,
            duration_s,
        })
    }
}

/// A named bucket of assets, one of which is chosen per output index.
#[derive(Clone, Debug)]
pub struct Group {
    name: String,
    assets: Vec<Asset>,
}

impl Group {
    /// Group name (unique within a registry).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Registered assets in registration order.
    pub fn assets(&self) -> &[Asset] {
        &self.assets
    }

    /// Known durations, in registration order.
    pub fn durations(&self) -> Vec<f64> {
        self.assets.iter().map(|a| a.duration_s).collect()
    }

    /// Look up an asset by file name.
    pub fn find(&self, file_name: &str) -> Option<&Asset> {
        self.assets.iter().find(|a| a.file_name == file_name)
    }

    /// `true` when the group holds no assets.
    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }
}

/// Session-scoped store of named groups.
///
/// Groups keep their registration order so that plan slots and combined
/// outputs iterate groups deterministically.
#[derive(Clone, Debug, Default)]
pub struct GroupRegistry {
    groups: Vec<Group>,
}

impl GroupRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a named group with pre-probed assets.
    ///
    /// Group names must be unique; an empty asset list is allowed (the group
    /// simply contributes nothing to any plan).
    pub fn register(&mut self, name: impl Into<String>, assets: Vec<Asset>) -> ClipmillResult<()> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ClipmillError::validation("group name must be non-empty"));
        }
        if self.get(&name).is_some() {
            return Err(ClipmillError::validation(format!(
                "group '{name}' is already registered"
            )));
        }
        self.groups.push(Group { name, assets });
        Ok(())
    }

    /// Register a named group, probing each source through `ffprobe`.
    pub fn register_sources(
        &mut self,
        name: impl Into<String>,
        sources: &[PathBuf],
    ) -> ClipmillResult<()> {
        let mut assets = Vec::with_capacity(sources.len());
        for src in sources {
            let info = probe_source(src)?;
            assets.push(Asset::new(src.clone(), info.duration_s)?);
        }
        self.register(name, assets)
    }

    /// All groups in registration order.
    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    /// Groups that can contribute a clip slot.
    pub fn non_empty_groups(&self) -> impl Iterator<Item = &Group> {
        self.groups.iter().filter(|g| !g.is_empty())
    }

    /// Look up a group by name.
    pub fn get(&self, name: &str) -> Option<&Group> {
        self.groups.iter().find(|g| g.name == name)
    }

    /// Resolve an asset by group and file name.
    ///
    /// Failure here means the stored plan references an asset that is no
    /// longer registered (e.g. removed after sequence generation).
    pub fn resolve(&self, group: &str, file_name: &str) -> ClipmillResult<&Asset> {
        let g = self.get(group).ok_or_else(|| {
            ClipmillError::resolution(format!("group '{group}' is not registered"))
        })?;
        g.find(file_name).ok_or_else(|| {
            ClipmillError::resolution(format!(
                "asset '{file_name}' is not registered in group '{group}'"
            ))
        })
    }
}

/// Strategy seam for choosing one asset per (group, round).
///
/// Selection must be a pure function of `(group, round, seed)` so that a
/// "randomize" action (new seed) is reproducibly distinct from a prior roll
/// while regenerating timings leaves selections untouched.
pub trait SelectionStrategy {
    /// Pick an asset index for `round`, or `None` for an empty group.
    fn select(&self, group: &Group, round: usize, seed: u64) -> Option<usize>;
}

/// Uniform-random selection over a group's assets (the default strategy).
#[derive(Clone, Copy, Debug, Default)]
pub struct UniformSelection;

impl SelectionStrategy for UniformSelection {
    fn select(&self, group: &Group, round: usize, seed: u64) -> Option<usize> {
        if group.is_empty() {
            return None;
        }
        let mut rng = round_rng(seed, group.name(), round);
        Some((rng.next_u64() % group.assets().len() as u64) as usize)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/registry.rs"]
mod tests;
