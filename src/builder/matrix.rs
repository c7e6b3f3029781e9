//! Build matrix driver.
//!
//! Walks the matrix platform-major, then linkage, then configuration. Each
//! leaf gets its own gn output directory and option set; the defines read
//! back from every leaf of a (platform, linkage) pair are accumulated and
//! handed over once the pair's last configuration has built.

use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::builder::defines::{extract_from_out_dir, render_fragment, DefineSet};
use crate::builder::gn::GnNinja;
use crate::core::axis::{BuildMatrix, Configuration, MatrixLeaf, PackagePair};
use crate::core::options::BuildOptionSet;

/// Root of all output directories, relative to the source root.
pub const OUT_ROOT: &str = "out.gn";

/// Defines collected from the leaves of one package pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairDefines {
    pub pair: PackagePair,

    /// Defines per configuration, in build order
    pub leaves: Vec<(Configuration, DefineSet)>,

    fragments: String,
}

impl PairDefines {
    pub fn new(pair: PackagePair) -> Self {
        PairDefines {
            pair,
            leaves: Vec::new(),
            fragments: String::new(),
        }
    }

    /// Record the defines of one configuration.
    pub fn push(&mut self, configuration: Configuration, defines: DefineSet) {
        self.fragments
            .push_str(&render_fragment(configuration, &defines));
        self.leaves.push((configuration, defines));
    }

    /// The MSBuild define elements of every recorded configuration.
    pub fn fragments(&self) -> &str {
        &self.fragments
    }

    pub fn into_fragments(self) -> String {
        self.fragments
    }
}

/// Builds every leaf of a matrix with gn and ninja.
pub struct BuildMatrixDriver<'a> {
    tools: GnNinja<'a>,
    matrix: BuildMatrix,

    /// Options every leaf starts from
    base: BuildOptionSet,

    /// Caller overrides, applied last
    overrides: BuildOptionSet,

    use_clang: bool,

    /// Version token, first output directory component
    version_token: String,

    /// Toolset id, second output directory component
    toolset: String,
}

impl<'a> BuildMatrixDriver<'a> {
    pub fn new(
        tools: GnNinja<'a>,
        matrix: BuildMatrix,
        version_token: impl Into<String>,
        toolset: impl Into<String>,
    ) -> Self {
        BuildMatrixDriver {
            tools,
            matrix,
            base: BuildOptionSet::base(),
            overrides: BuildOptionSet::new(),
            use_clang: true,
            version_token: version_token.into(),
            toolset: toolset.into(),
        }
    }

    pub fn with_base(mut self, base: BuildOptionSet) -> Self {
        self.base = base;
        self
    }

    pub fn with_overrides(mut self, overrides: BuildOptionSet) -> Self {
        self.overrides = overrides;
        self
    }

    pub fn with_clang(mut self, use_clang: bool) -> Self {
        self.use_clang = use_clang;
        self
    }

    /// Output directory of a leaf, relative to the source root.
    pub fn out_dir(&self, leaf: &MatrixLeaf) -> PathBuf {
        [
            OUT_ROOT,
            self.version_token.as_str(),
            self.toolset.as_str(),
            leaf.platform.as_str(),
            leaf.configuration.as_str(),
            leaf.linkage.as_str(),
        ]
        .iter()
        .collect()
    }

    /// Effective options of a leaf.
    pub fn options_for(&self, leaf: &MatrixLeaf) -> BuildOptionSet {
        BuildOptionSet::for_leaf(&self.base, leaf, self.use_clang, &self.overrides)
    }

    /// Generate and build one leaf, then read back its defines.
    pub fn build_leaf(&self, leaf: &MatrixLeaf) -> Result<DefineSet> {
        let out_dir = self.out_dir(leaf);
        let options = self.options_for(leaf);

        tracing::info!("Building V8 {} {} {}", self.version_token, self.toolset, leaf);
        self.tools.generate(&out_dir, &options)?;
        self.tools.build(&out_dir, leaf.linkage.ninja_target())?;

        extract_from_out_dir(&self.tools.source_root.join(&out_dir))
            .with_context(|| format!("failed to read build metadata of {}", leaf))
    }

    /// Build every configuration of `pair`, stopping at the first failure.
    pub fn build_pair(&self, pair: PackagePair) -> Result<PairDefines> {
        let mut defines = PairDefines::new(pair);
        for leaf in self.matrix.leaves_of(pair) {
            let set = self.build_leaf(&leaf)?;
            tracing::debug!("{} defines: {:?}", leaf, set);
            defines.push(leaf.configuration, set);
        }
        Ok(defines)
    }

    /// Build the whole matrix, handing each finished pair to `on_pair`.
    ///
    /// A failure in either a build or `on_pair` stops the run.
    pub fn run<F>(&self, mut on_pair: F) -> Result<()>
    where
        F: FnMut(PairDefines) -> Result<()>,
    {
        for pair in self.matrix.pairs() {
            let defines = self.build_pair(pair)?;
            on_pair(defines)?;
        }
        Ok(())
    }
}
