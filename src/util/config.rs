//! Configuration file support for v8pack.
//!
//! Two configuration file locations are read:
//! - Global: `~/.v8pack/config.toml` - User-wide defaults
//! - Project: `.v8pack/config.toml` - Per build-directory overrides
//!
//! Project config takes precedence over global config. Command-line flags
//! and environment variables take precedence over both.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::core::options::BuildOptionSet;

/// Default V8 repository.
pub const DEFAULT_V8_URL: &str = "https://chromium.googlesource.com/v8/v8.git";

/// v8pack configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Source checkout settings
    pub source: SourceConfig,

    /// gn settings
    pub gn: GnConfig,

    /// Packaging settings
    pub package: PackageConfig,

    /// External tool locations
    pub tools: ToolsConfig,
}

/// Source checkout configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// V8 repository URL
    pub url: Option<String>,

    /// Dependencies fetched in addition to the built-in allow-list
    pub extra_deps: Vec<String>,

    /// Path prefixes never fetched (e.g. `v8/test/`)
    pub exclude: Vec<String>,
}

/// gn configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GnConfig {
    /// Overrides of the built-in base options
    pub options: BuildOptionSet,
}

/// Packaging configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PackageConfig {
    /// Directory holding the `.nuspec` and `.props` templates
    pub dir: Option<PathBuf>,

    /// Directory packages are written to
    pub output_dir: Option<PathBuf>,
}

/// External tool configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    pub gn: Option<PathBuf>,
    pub ninja: Option<PathBuf>,
    pub nuget: Option<PathBuf>,
    pub python: Option<PathBuf>,
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    /// Load configuration with fallback to defaults if file doesn't exist.
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            Self::load(path).unwrap_or_else(|e| {
                tracing::warn!("Failed to load config from {}: {:#}", path.display(), e);
                Self::default()
            })
        } else {
            Self::default()
        }
    }

    /// Merge another config into this one (other takes precedence).
    pub fn merge(&mut self, other: Config) {
        // Source settings
        if other.source.url.is_some() {
            self.source.url = other.source.url;
        }
        for dep in other.source.extra_deps {
            if !self.source.extra_deps.contains(&dep) {
                self.source.extra_deps.push(dep);
            }
        }
        for prefix in other.source.exclude {
            if !self.source.exclude.contains(&prefix) {
                self.source.exclude.push(prefix);
            }
        }

        // gn options are merged key by key
        self.gn.options.merge(&other.gn.options);

        // Package settings
        if other.package.dir.is_some() {
            self.package.dir = other.package.dir;
        }
        if other.package.output_dir.is_some() {
            self.package.output_dir = other.package.output_dir;
        }

        // Tools
        if other.tools.gn.is_some() {
            self.tools.gn = other.tools.gn;
        }
        if other.tools.ninja.is_some() {
            self.tools.ninja = other.tools.ninja;
        }
        if other.tools.nuget.is_some() {
            self.tools.nuget = other.tools.nuget;
        }
        if other.tools.python.is_some() {
            self.tools.python = other.tools.python;
        }
    }

    /// Repository URL, falling back to upstream V8.
    pub fn url(&self) -> &str {
        self.source.url.as_deref().unwrap_or(DEFAULT_V8_URL)
    }
}

/// Load merged configuration from global and project locations.
///
/// Order of precedence (highest to lowest):
/// 1. Project config (.v8pack/config.toml)
/// 2. Global config (~/.v8pack/config.toml)
/// 3. Defaults
pub fn load_config(global_path: Option<&Path>, project_path: &Path) -> Config {
    let mut config = Config::default();

    // Load global config first
    if let Some(global_path) = global_path {
        if global_path.exists() {
            config.merge(Config::load_or_default(global_path));
        }
    }

    // Project config overrides global
    if project_path.exists() {
        config.merge(Config::load_or_default(project_path));
    }

    config
}

/// Get the global config directory (~/.v8pack).
pub fn global_config_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(".v8pack"))
}

/// Get the global config path (~/.v8pack/config.toml).
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("config.toml"))
}

/// Get the project config path (.v8pack/config.toml).
pub fn project_config_path(work_dir: &Path) -> PathBuf {
    work_dir.join(".v8pack").join("config.toml")
}
