//! Source synchronization.
//!
//! Materializes the V8 tree at the requested reference, then the subset of
//! its `DEPS` needed to build it.

pub mod deps;
pub mod git;

use anyhow::{Context, Result};

use crate::core::source_spec::SourceSpec;
pub use deps::{DepEntry, DepsManifest};
pub use git::{FetchedSource, GitFetcher};

/// Name of the dependency manifest at the root of the tree.
pub const DEPS_FILE: &str = "DEPS";

/// Which dependencies to fetch.
#[derive(Debug, Clone, Default)]
pub struct DependencyFilter {
    /// Manifest paths to fetch
    pub allow: Vec<String>,

    /// Path prefixes never fetched
    pub exclude: Vec<String>,
}

/// Result of a synchronization.
#[derive(Debug, Clone)]
pub struct SyncReport {
    pub root: FetchedSource,
    pub dependencies: Vec<FetchedSource>,
}

/// Fetch `root`, then the dependencies `filter` selects from its manifest.
pub fn sync(fetcher: &GitFetcher<'_>, root: &SourceSpec, filter: &DependencyFilter) -> Result<SyncReport> {
    let fetched_root = fetcher.fetch(root)?;

    let manifest = DepsManifest::load(&fetched_root.path.join(DEPS_FILE))?;
    let root_name = root
        .path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("v8");

    let selected = manifest.select(root_name, &filter.allow, &filter.exclude);
    tracing::info!(
        "Fetching {} of {} dependencies",
        selected.len(),
        manifest.len()
    );

    let mut dependencies = Vec::with_capacity(selected.len());
    for spec in &selected {
        let fetched = fetcher
            .fetch(spec)
            .with_context(|| format!("failed to fetch dependency {}", spec.path.display()))?;
        dependencies.push(fetched);
    }

    Ok(SyncReport {
        root: fetched_root,
        dependencies,
    })
}
