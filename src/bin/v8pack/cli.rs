//! CLI definitions using clap.

use std::path::PathBuf;

use clap::builder::FalseyValueParser;
use clap::{ArgAction, Args, Parser, Subcommand};
use clap_complete::Shell;

use v8pack::core::options::{parse_override, OptionValue};

/// v8pack - Builds V8 across a platform/configuration/linkage matrix and packages it for NuGet
#[derive(Parser)]
#[command(name = "v8pack")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch, build and package V8
    Build(BuildArgs),

    /// Fetch V8 and its build dependencies only
    Sync(SyncArgs),

    /// Print the version of a V8 checkout
    Version(VersionArgs),

    /// Print the preprocessor defines of a gn output directory
    Defines(DefinesArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Arguments shared by every command that touches the checkout.
#[derive(Args)]
pub struct SourceArgs {
    /// Source url
    #[arg(long)]
    pub url: Option<String>,

    /// Version tag or branch name
    #[arg(long = "version", env = "V8_VERSION", default_value = "lkgr")]
    pub v8_version: String,

    /// Directory holding the checkout, templates and packages
    #[arg(long, default_value = ".")]
    pub work_dir: PathBuf,

    /// Compile with MSVC instead of clang
    #[arg(
        long = "no-clang",
        env = "USE_CLANG",
        action = ArgAction::SetFalse,
        value_parser = FalseyValueParser::new()
    )]
    pub use_clang: bool,

    /// Path to git executable
    #[arg(long)]
    pub git: Option<PathBuf>,
}

#[derive(Args)]
pub struct BuildArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Target platforms (x86, x64)
    #[arg(long = "platform", env = "PLATFORM", num_args = 1..)]
    pub platforms: Vec<String>,

    /// Target configurations (Debug, Release)
    #[arg(long = "config", env = "CONFIGURATION", num_args = 1..)]
    pub configurations: Vec<String>,

    /// Target libraries (shared, monolith)
    #[arg(long = "libs", env = "LIBS", num_args = 1..)]
    pub libs: Vec<String>,

    /// Build for Windows XP toolset
    #[arg(
        long,
        env = "XP",
        action = ArgAction::SetTrue,
        value_parser = FalseyValueParser::new()
    )]
    pub xp: bool,

    /// Path to gn executable
    #[arg(long)]
    pub gn: Option<PathBuf>,

    /// Path to ninja executable
    #[arg(long)]
    pub ninja: Option<PathBuf>,

    /// Path to nuget executable
    #[arg(long)]
    pub nuget: Option<PathBuf>,

    /// Path to the Python interpreter running the toolchain hooks
    #[arg(long)]
    pub python: Option<PathBuf>,

    /// Add gn option
    #[arg(long = "gn-option", value_name = "KEY=VAL", value_parser = parse_gn_option)]
    pub gn_options: Vec<(String, OptionValue)>,

    /// Directory holding the .nuspec and .props templates
    #[arg(long)]
    pub packages_dir: Option<PathBuf>,

    /// Directory packages are written to
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Build the existing checkout without fetching
    #[arg(long)]
    pub skip_sync: bool,
}

#[derive(Args)]
pub struct SyncArgs {
    #[command(flatten)]
    pub source: SourceArgs,
}

#[derive(Args)]
pub struct VersionArgs {
    /// V8 source root
    #[arg(default_value = "v8")]
    pub path: PathBuf,

    /// Also print the normalized form of this version token
    #[arg(long)]
    pub token: Option<String>,
}

#[derive(Args)]
pub struct DefinesArgs {
    /// gn output directory
    pub out_dir: PathBuf,

    /// Print an MSBuild element for this configuration instead of a list
    #[arg(long)]
    pub msbuild: Option<String>,
}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

fn parse_gn_option(raw: &str) -> Result<(String, OptionValue), String> {
    parse_override(raw).map_err(|e| e.to_string())
}
