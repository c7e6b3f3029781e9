//! gn/ninja invocation.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::core::options::BuildOptionSet;
use crate::util::process::{ProcessBuilder, ProcessRunner};

/// The generator and executor of one source tree.
pub struct GnNinja<'a> {
    runner: &'a dyn ProcessRunner,

    /// Path to gn
    pub gn: PathBuf,

    /// Path to ninja
    pub ninja: PathBuf,

    /// Source root both tools run in
    pub source_root: PathBuf,

    /// Environment overrides for both tools
    pub env: BTreeMap<String, String>,
}

impl<'a> GnNinja<'a> {
    pub fn new(
        runner: &'a dyn ProcessRunner,
        gn: impl Into<PathBuf>,
        ninja: impl Into<PathBuf>,
        source_root: impl Into<PathBuf>,
    ) -> Self {
        GnNinja {
            runner,
            gn: gn.into(),
            ninja: ninja.into(),
            source_root: source_root.into(),
            env: BTreeMap::new(),
        }
    }

    pub fn with_env(mut self, env: BTreeMap<String, String>) -> Self {
        self.env = env;
        self
    }

    /// `gn gen <out_dir> --args=...`
    pub fn gen_command(&self, out_dir: &Path, options: &BuildOptionSet) -> ProcessBuilder {
        ProcessBuilder::new(&self.gn)
            .arg("gen")
            .arg(out_dir)
            .arg(format!("--args={}", options.to_gn_args()))
            .envs(&self.env)
            .cwd(&self.source_root)
    }

    /// `ninja -C <out_dir> <target>`
    pub fn build_command(&self, out_dir: &Path, target: &str) -> ProcessBuilder {
        ProcessBuilder::new(&self.ninja)
            .arg("-C")
            .arg(out_dir)
            .arg(target)
            .envs(&self.env)
            .cwd(&self.source_root)
    }

    /// Generate build files for `out_dir`, relative to the source root.
    pub fn generate(&self, out_dir: &Path, options: &BuildOptionSet) -> Result<()> {
        tracing::debug!("gn args: {}", options.to_gn_args());
        self.runner
            .run_checked("gn gen", &self.gen_command(out_dir, options))
            .with_context(|| format!("failed to generate {}", out_dir.display()))
    }

    /// Build `target` in `out_dir`, relative to the source root.
    pub fn build(&self, out_dir: &Path, target: &str) -> Result<()> {
        self.runner
            .run_checked("ninja", &self.build_command(out_dir, target))
            .with_context(|| format!("failed to build {} in {}", target, out_dir.display()))
    }
}
