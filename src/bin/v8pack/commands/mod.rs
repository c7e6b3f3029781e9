//! Command implementations

pub mod build;
pub mod completions;
pub mod defines;
pub mod sync;
pub mod version;

use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{anyhow, Result};

use crate::cli::SourceArgs;
use v8pack::core::toolset::ToolsetEnv;
use v8pack::ops::PipelineOptions;
use v8pack::util::config::{global_config_path, load_config, project_config_path};
use v8pack::util::process::resolve_tool;
use v8pack::util::Config;

/// Load the configuration of a working directory.
pub fn config_for(work_dir: &Path) -> Config {
    load_config(
        global_config_path().as_deref(),
        &project_config_path(work_dir),
    )
}

/// Pipeline options from the shared source arguments and configuration.
///
/// Command-line values win over the configuration files.
pub fn source_options(args: &SourceArgs, config: &Config) -> PipelineOptions {
    let mut opts = PipelineOptions {
        work_dir: args.work_dir.clone(),
        url: args
            .url
            .clone()
            .unwrap_or_else(|| config.url().to_string()),
        version: args.v8_version.clone(),
        use_clang: args.use_clang,
        extra_deps: config.source.extra_deps.clone(),
        exclude: config.source.exclude.clone(),
        toolset_env: ToolsetEnv::from_env(),
        ..PipelineOptions::default()
    };
    if let Some(ref git) = args.git {
        opts.tools.git = resolve_tool(git);
    }
    opts
}

/// Parse axis values given as repeated flags, comma or whitespace separated.
pub fn parse_axis<T>(raw: &[String]) -> Result<Vec<T>>
where
    T: FromStr<Err = String>,
{
    raw.iter()
        .flat_map(|value| value.split(|c: char| c == ',' || c.is_whitespace()))
        .filter(|value| !value.is_empty())
        .map(|value| value.parse::<T>().map_err(|e| anyhow!(e)))
        .collect()
}

/// Pick a tool from the command line, the configuration, or a default.
pub fn pick_tool(cli: Option<&PathBuf>, config: Option<&PathBuf>, default: PathBuf) -> PathBuf {
    let tool = cli.or(config).cloned().unwrap_or(default);
    resolve_tool(&tool)
}
