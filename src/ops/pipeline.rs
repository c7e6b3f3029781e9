//! Implementation of `v8pack build` and `v8pack sync`.
//!
//! A run fetches the V8 tree and its build dependencies, resolves the
//! version, prepares the toolchain, builds the matrix and packs each
//! (platform, linkage) pair as soon as its configurations are built.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::builder::matrix::BuildMatrixDriver;
use crate::builder::package::{package_names, PackageGenerator};
use crate::builder::GnNinja;
use crate::core::axis::BuildMatrix;
use crate::core::options::BuildOptionSet;
use crate::core::source_spec::SourceSpec;
use crate::core::toolset::{Toolset, ToolsetEnv};
use crate::core::version::{normalize_token, resolve_source_root, Version};
use crate::ops::prepare::{resolve_toolchain, ToolchainPreparer};
use crate::sources::deps::required_deps;
use crate::sources::{sync, DependencyFilter, GitFetcher, SyncReport};
use crate::util::config::DEFAULT_V8_URL;
use crate::util::process::ProcessRunner;

/// Directory of the V8 checkout inside the working directory.
pub const SOURCE_DIR: &str = "v8";

/// Default package template directory inside the working directory.
pub const PACKAGE_DIR: &str = "nuget";

/// External tools a run invokes.
#[derive(Debug, Clone)]
pub struct Tools {
    pub git: PathBuf,
    pub gn: PathBuf,
    pub ninja: PathBuf,
    pub nuget: PathBuf,
    pub python: PathBuf,
}

impl Default for Tools {
    fn default() -> Self {
        Tools {
            git: PathBuf::from("git"),
            gn: PathBuf::from("gn"),
            ninja: PathBuf::from("ninja"),
            nuget: PathBuf::from("nuget"),
            python: PathBuf::from("python"),
        }
    }
}

/// Options for a packaging run.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Directory the checkout, templates and packages live in
    pub work_dir: PathBuf,

    /// V8 repository
    pub url: String,

    /// Requested version token, before normalization
    pub version: String,

    /// Axes to build
    pub matrix: BuildMatrix,

    /// Build with the Windows XP toolset
    pub xp: bool,

    /// Build with clang instead of MSVC
    pub use_clang: bool,

    pub tools: Tools,

    /// Options every leaf starts from
    pub base_options: BuildOptionSet,

    /// Options applied on top of the axis values
    pub gn_overrides: BuildOptionSet,

    /// Dependencies fetched in addition to the built-in allow-list
    pub extra_deps: Vec<String>,

    /// Dependency path prefixes never fetched
    pub exclude: Vec<String>,

    /// Template directory, defaults to `<work_dir>/nuget`
    pub package_dir: Option<PathBuf>,

    /// Package output directory, defaults to `<work_dir>`
    pub output_dir: Option<PathBuf>,

    /// Build the existing checkout without fetching
    pub skip_sync: bool,

    /// Toolset selection variables
    pub toolset_env: ToolsetEnv,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        PipelineOptions {
            work_dir: PathBuf::from("."),
            url: DEFAULT_V8_URL.to_string(),
            version: crate::core::version::DEFAULT_VERSION_TOKEN.to_string(),
            matrix: BuildMatrix::default(),
            xp: false,
            use_clang: true,
            tools: Tools::default(),
            base_options: BuildOptionSet::base(),
            gn_overrides: BuildOptionSet::new(),
            extra_deps: Vec::new(),
            exclude: Vec::new(),
            package_dir: None,
            output_dir: None,
            skip_sync: false,
            toolset_env: ToolsetEnv::default(),
        }
    }
}

impl PipelineOptions {
    pub fn source_root(&self) -> PathBuf {
        self.work_dir.join(SOURCE_DIR)
    }

    pub fn package_dir(&self) -> PathBuf {
        self.package_dir
            .clone()
            .unwrap_or_else(|| self.work_dir.join(PACKAGE_DIR))
    }

    pub fn output_dir(&self) -> PathBuf {
        self.output_dir.clone().unwrap_or_else(|| self.work_dir.clone())
    }

    /// Version token the tree is fetched at and builds are named after.
    pub fn version_token(&self) -> String {
        normalize_token(&self.version)
    }
}

/// Outcome of a packaging run.
#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub version: Version,
    pub version_token: String,
    pub toolset: Toolset,

    /// Commit of the V8 checkout, when it was fetched
    pub commit: Option<String>,

    /// Packed package names, in packing order
    pub packages: Vec<String>,
}

/// Fetch V8 and the dependencies needed to build it.
pub fn sync_sources(runner: &dyn ProcessRunner, opts: &PipelineOptions) -> Result<SyncReport> {
    let fetcher = GitFetcher::new(runner, &opts.work_dir).with_git(&opts.tools.git);
    let root = SourceSpec::new(&opts.url, opts.version_token(), SOURCE_DIR);
    let filter = DependencyFilter {
        allow: required_deps(opts.use_clang, &opts.extra_deps),
        exclude: opts.exclude.clone(),
    };
    sync(&fetcher, &root, &filter)
}

/// Run the whole pipeline.
pub fn run(runner: &dyn ProcessRunner, opts: &PipelineOptions) -> Result<PipelineReport> {
    let version_token = opts.version_token();

    // Resolved before the fetch so an unusable environment fails fast.
    let toolchain = resolve_toolchain(&opts.toolset_env, opts.xp, |name| std::env::var(name).ok())?;

    let commit = if opts.skip_sync {
        tracing::info!("Skipping source synchronization");
        None
    } else {
        sync_sources(runner, opts)?.root.commit
    };

    let source_root = opts.source_root();
    let version = resolve_source_root(&source_root)?;
    tracing::info!("V8 {} ({})", version, version_token);

    ToolchainPreparer::new(runner, &opts.tools.python, &opts.tools.gn, &source_root)
        .with_clang(opts.use_clang)
        .run(&toolchain.env)
        .context("failed to prepare the toolchain")?;

    let tools = GnNinja::new(runner, &opts.tools.gn, &opts.tools.ninja, &source_root)
        .with_env(toolchain.env.clone());
    let driver = BuildMatrixDriver::new(
        tools,
        opts.matrix.clone(),
        &version_token,
        &toolchain.toolset.id,
    )
    .with_base(opts.base_options.clone())
    .with_overrides(opts.gn_overrides.clone())
    .with_clang(opts.use_clang);

    let generator = PackageGenerator::new(
        runner,
        opts.package_dir(),
        absolute(&opts.output_dir())?,
        version,
        &version_token,
        &toolchain.toolset.id,
    )
    .with_nuget(&opts.tools.nuget);

    let mut packages = Vec::new();
    driver.run(|defines| {
        tracing::info!(
            "Packaging {} for {}",
            package_names(defines.pair.linkage),
            defines.pair.platform
        );
        let packed = generator.package_pair(defines.pair, defines.fragments())?;
        packages.extend(packed);
        Ok(())
    })?;

    Ok(PipelineReport {
        version,
        version_token,
        toolset: toolchain.toolset,
        commit,
        packages,
    })
}

/// nuget runs in the template directory, so relative output paths would
/// land in the wrong place.
fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir().context("failed to read the current directory")?;
    Ok(cwd.join(path))
}
