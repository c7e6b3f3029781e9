//! Build axes and the matrix they span.

use std::fmt;
use std::str::FromStr;

/// Target architecture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Platform {
    X86,
    X64,
}

impl Platform {
    pub const ALL: [Platform; 2] = [Platform::X86, Platform::X64];

    /// Value of gn's `target_cpu` and of MSBuild's `$(Platform)`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::X86 => "x86",
            Platform::X64 => "x64",
        }
    }

    /// Legacy MSBuild platform name that also designates this architecture.
    pub fn legacy_alias(&self) -> Option<&'static str> {
        match self {
            Platform::X86 => Some("Win32"),
            Platform::X64 => None,
        }
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "x86" | "win32" => Ok(Platform::X86),
            "x64" => Ok(Platform::X64),
            _ => Err(format!("invalid platform '{}'; expected 'x86' or 'x64'", s)),
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Build configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Configuration {
    Debug,
    Release,
}

impl Configuration {
    pub const ALL: [Configuration; 2] = [Configuration::Debug, Configuration::Release];

    pub fn as_str(&self) -> &'static str {
        match self {
            Configuration::Debug => "Debug",
            Configuration::Release => "Release",
        }
    }

    pub fn is_debug(&self) -> bool {
        matches!(self, Configuration::Debug)
    }
}

impl FromStr for Configuration {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "debug" => Ok(Configuration::Debug),
            "release" => Ok(Configuration::Release),
            _ => Err(format!(
                "invalid configuration '{}'; expected 'Debug' or 'Release'",
                s
            )),
        }
    }
}

impl fmt::Display for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Library linkage mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LinkageMode {
    /// Component build: several DLLs loaded at runtime.
    Shared,
    /// One static library with every internal component linked in.
    Monolith,
}

impl LinkageMode {
    pub const ALL: [LinkageMode; 2] = [LinkageMode::Shared, LinkageMode::Monolith];

    pub fn as_str(&self) -> &'static str {
        match self {
            LinkageMode::Shared => "shared",
            LinkageMode::Monolith => "monolith",
        }
    }

    pub fn is_component_build(&self) -> bool {
        matches!(self, LinkageMode::Shared)
    }

    /// Ninja target producing this linkage mode's artifacts.
    pub fn ninja_target(&self) -> &'static str {
        match self {
            LinkageMode::Shared => "v8",
            LinkageMode::Monolith => "v8_monolith",
        }
    }

    /// NuGet packages produced for this linkage mode.
    pub fn packages(&self) -> &'static [&'static str] {
        match self {
            LinkageMode::Shared => &["v8", "v8.redist", "v8.symbols"],
            LinkageMode::Monolith => &["v8.monolith"],
        }
    }
}

impl FromStr for LinkageMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "shared" => Ok(LinkageMode::Shared),
            "monolith" => Ok(LinkageMode::Monolith),
            _ => Err(format!(
                "invalid library mode '{}'; expected 'shared' or 'monolith'",
                s
            )),
        }
    }
}

impl fmt::Display for LinkageMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One (platform, linkage mode) pair; the unit packages are produced for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PackagePair {
    pub platform: Platform,
    pub linkage: LinkageMode,
}

/// One leaf of the build matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MatrixLeaf {
    pub platform: Platform,
    pub linkage: LinkageMode,
    pub configuration: Configuration,
}

impl fmt::Display for MatrixLeaf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.platform, self.configuration, self.linkage)
    }
}

/// The selected values of every axis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildMatrix {
    platforms: Vec<Platform>,
    configurations: Vec<Configuration>,
    linkages: Vec<LinkageMode>,
}

impl Default for BuildMatrix {
    fn default() -> Self {
        BuildMatrix::new(&Platform::ALL, &Configuration::ALL, &LinkageMode::ALL)
    }
}

impl BuildMatrix {
    /// Create a matrix from caller-selected axis values.
    ///
    /// An empty axis selects every value of that axis. Repeated values are
    /// dropped, keeping the first occurrence.
    pub fn new(
        platforms: &[Platform],
        configurations: &[Configuration],
        linkages: &[LinkageMode],
    ) -> Self {
        BuildMatrix {
            platforms: select(platforms, &Platform::ALL),
            configurations: select(configurations, &Configuration::ALL),
            linkages: select(linkages, &LinkageMode::ALL),
        }
    }

    pub fn platforms(&self) -> &[Platform] {
        &self.platforms
    }

    pub fn configurations(&self) -> &[Configuration] {
        &self.configurations
    }

    pub fn linkages(&self) -> &[LinkageMode] {
        &self.linkages
    }

    /// Package pairs in platform-major order.
    pub fn pairs(&self) -> Vec<PackagePair> {
        self.platforms
            .iter()
            .flat_map(|&platform| {
                self.linkages
                    .iter()
                    .map(move |&linkage| PackagePair { platform, linkage })
            })
            .collect()
    }

    /// Leaves of one pair, in configuration order.
    pub fn leaves_of(&self, pair: PackagePair) -> Vec<MatrixLeaf> {
        self.configurations
            .iter()
            .map(|&configuration| MatrixLeaf {
                platform: pair.platform,
                linkage: pair.linkage,
                configuration,
            })
            .collect()
    }

    /// Every leaf, nested platform, then linkage, then configuration.
    pub fn leaves(&self) -> Vec<MatrixLeaf> {
        self.pairs()
            .into_iter()
            .flat_map(|pair| self.leaves_of(pair))
            .collect()
    }
}

fn select<T: Copy + PartialEq>(requested: &[T], all: &[T]) -> Vec<T> {
    let source = if requested.is_empty() { all } else { requested };
    let mut selected = Vec::with_capacity(source.len());
    for value in source {
        if !selected.contains(value) {
            selected.push(*value);
        }
    }
    selected
}
