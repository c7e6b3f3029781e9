//! Git working copies of pinned sources.
//!
//! Sources are fetched shallowly with the git CLI: the tree is initialized
//! if needed, the single requested reference is fetched, and `FETCH_HEAD`
//! is force-checked-out onto a branch named after the reference. If the
//! fetch fails, the working copy is deleted, re-initialized and fetched one
//! more time before giving up.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use git2::Repository;

use crate::core::error::PipelineError;
use crate::core::source_spec::SourceSpec;
use crate::util::fs::remove_dir_all_if_exists;
use crate::util::process::{ProcessBuilder, ProcessRunner};

/// A materialized working copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedSource {
    /// What was fetched
    pub spec: SourceSpec,

    /// Working copy location
    pub path: PathBuf,

    /// Commit checked out, if it could be read back
    pub commit: Option<String>,
}

/// Fetches sources with an external git client.
pub struct GitFetcher<'a> {
    runner: &'a dyn ProcessRunner,

    /// git executable
    git: PathBuf,

    /// Directory relative source paths are resolved against
    base_dir: PathBuf,
}

impl<'a> GitFetcher<'a> {
    pub fn new(runner: &'a dyn ProcessRunner, base_dir: impl Into<PathBuf>) -> Self {
        GitFetcher {
            runner,
            git: PathBuf::from("git"),
            base_dir: base_dir.into(),
        }
    }

    /// Use a specific git executable.
    pub fn with_git(mut self, git: impl Into<PathBuf>) -> Self {
        self.git = git.into();
        self
    }

    /// Fetch `spec` into its working copy.
    pub fn fetch(&self, spec: &SourceSpec) -> Result<FetchedSource> {
        spec.validate()?;

        let target = self.base_dir.join(&spec.path);
        tracing::info!("Fetching {}", spec);

        if !target.join(".git").is_dir() {
            self.init(&target)?;
        }

        let fetch = self.fetch_command(spec, &target);
        let status = self.runner.run(&fetch)?;

        if !status.is_success() {
            tracing::warn!(
                "fetch of {} failed (exit code {:?}), retrying from scratch",
                target.display(),
                status.code
            );

            remove_dir_all_if_exists(&target)?;
            self.init(&target)?;

            let status = self.runner.run(&fetch)?;
            if !status.is_success() {
                return Err(PipelineError::FetchFailure {
                    url: spec.url.clone(),
                    reference: spec.reference.clone(),
                    path: target,
                    code: status.code,
                }
                .into());
            }
        }

        self.checkout(spec, &target)?;

        let commit = head_commit(&target);
        if let Some(ref commit) = commit {
            tracing::debug!("{} is at {}", target.display(), commit);
        }

        Ok(FetchedSource {
            spec: spec.clone(),
            path: target,
            commit,
        })
    }

    fn init(&self, target: &Path) -> Result<()> {
        let cmd = ProcessBuilder::new(&self.git)
            .arg("init")
            .arg(target)
            .cwd(&self.base_dir);
        self.runner
            .run_checked("git init", &cmd)
            .with_context(|| format!("failed to initialize {}", target.display()))
    }

    fn fetch_command(&self, spec: &SourceSpec, target: &Path) -> ProcessBuilder {
        ProcessBuilder::new(&self.git)
            .args([
                "fetch",
                "--depth=1",
                "--update-shallow",
                "--update-head-ok",
                "--verbose",
            ])
            .arg(&spec.url)
            .arg(&spec.reference)
            .cwd(target)
    }

    fn checkout(&self, spec: &SourceSpec, target: &Path) -> Result<()> {
        let cmd = ProcessBuilder::new(&self.git)
            .args(["checkout", "-f", "-B"])
            .arg(spec.branch_name())
            .arg("FETCH_HEAD")
            .cwd(target);
        self.runner
            .run_checked("git checkout", &cmd)
            .with_context(|| format!("failed to check out {}", spec))
    }
}

/// Read the commit HEAD points at, if `path` is a readable repository.
pub fn head_commit(path: &Path) -> Option<String> {
    let repo = Repository::open(path).ok()?;
    let commit = repo.head().ok()?.peel_to_commit().ok()?;
    Some(commit.id().to_string())
}
