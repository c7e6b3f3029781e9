//! Dependency manifest (`DEPS`) loading and subset selection.

pub mod parser;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::core::source_spec::SourceSpec;
pub use parser::DepsValue;
use parser::dict_get;

/// Dependencies always fetched alongside V8.
pub const REQUIRED_DEPS: &[&str] = &[
    "v8/build",
    "v8/third_party/icu",
    "v8/base/trace_event/common",
    "v8/third_party/jinja2",
    "v8/third_party/markupsafe",
    "v8/third_party/googletest/src",
    "v8/third_party/zlib",
];

/// Extra dependency needed to build with clang.
pub const CLANG_DEP: &str = "v8/tools/clang";

/// One `deps` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DepEntry {
    /// A plain `URL@REF` location.
    Location(String),
    /// A dict entry (conditional, CIPD, ...). These are never fetched.
    Structured(DepsValue),
}

/// A parsed `DEPS` file.
#[derive(Debug, Clone, Default)]
pub struct DepsManifest {
    /// Entries of `deps`, in file order.
    entries: Vec<(String, DepEntry)>,
    /// The `vars` dict, used to expand `{name}` placeholders in locations.
    vars: Vec<(String, DepsValue)>,
    /// `use_relative_paths = True`: entry paths are relative to the manifest's directory.
    use_relative_paths: bool,
}

impl DepsManifest {
    /// Parse manifest text.
    pub fn parse(src: &str) -> Result<Self> {
        let assignments = parser::parse(src)?;

        let mut manifest = DepsManifest::default();
        for (name, value) in assignments {
            match name.as_str() {
                "vars" => {
                    if let DepsValue::Dict(entries) = value {
                        manifest.vars = entries;
                    }
                }
                "use_relative_paths" => manifest.use_relative_paths = value.is_truthy(),
                "deps" => {
                    if let DepsValue::Dict(entries) = value {
                        manifest.entries = entries
                            .into_iter()
                            .map(|(path, value)| match value {
                                DepsValue::Str(location) => (path, DepEntry::Location(location)),
                                other => (path, DepEntry::Structured(other)),
                            })
                            .collect();
                    }
                }
                _ => {}
            }
        }

        Ok(manifest)
    }

    /// Load a manifest file.
    pub fn load(path: &Path) -> Result<Self> {
        let src = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read dependency manifest: {}", path.display()))?;
        Self::parse(&src)
            .with_context(|| format!("failed to parse dependency manifest: {}", path.display()))
    }

    pub fn entries(&self) -> &[(String, DepEntry)] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn use_relative_paths(&self) -> bool {
        self.use_relative_paths
    }

    /// Replace `{name}` placeholders with string values from `vars`.
    fn expand(&self, location: &str) -> String {
        let mut expanded = location.to_string();
        for (name, value) in &self.vars {
            if let Some(s) = value.as_str() {
                expanded = expanded.replace(&format!("{{{}}}", name), s);
            }
        }
        expanded
    }

    /// Select the entries to fetch.
    ///
    /// Only entries named by `allow` are kept, and of those only entries
    /// whose path starts with none of `exclude`. Structured entries are
    /// always skipped. Manifest order is preserved. When the manifest uses
    /// relative paths, entry paths are prefixed with `root_name` before
    /// matching.
    pub fn select(
        &self,
        root_name: &str,
        allow: &[String],
        exclude: &[String],
    ) -> Vec<SourceSpec> {
        self.entries
            .iter()
            .filter_map(|(path, entry)| {
                let location = match entry {
                    DepEntry::Location(location) => location,
                    DepEntry::Structured(value) => {
                        tracing::debug!(
                            "skipping conditional dependency {} ({})",
                            path,
                            structured_url(value).unwrap_or("no url")
                        );
                        return None;
                    }
                };

                let path = if self.use_relative_paths {
                    format!("{}/{}", root_name, path)
                } else {
                    path.clone()
                };

                if !allow.iter().any(|a| *a == path) {
                    return None;
                }
                if exclude.iter().any(|prefix| path.starts_with(prefix.as_str())) {
                    tracing::debug!("excluding dependency {}", path);
                    return None;
                }

                Some(SourceSpec::from_location(&self.expand(location), PathBuf::from(path)))
            })
            .collect()
    }
}

/// The `url` of a structured entry, if it has one.
pub fn structured_url(value: &DepsValue) -> Option<&str> {
    value
        .as_dict()
        .and_then(|entries| dict_get(entries, "url"))
        .and_then(DepsValue::as_str)
}

/// The default allow-list, with the clang toolchain when requested.
pub fn required_deps(use_clang: bool, extra: &[String]) -> Vec<String> {
    let mut deps: Vec<String> = REQUIRED_DEPS.iter().map(|s| s.to_string()).collect();
    if use_clang {
        deps.push(CLANG_DEP.to_string());
    }
    for dep in extra {
        if !deps.contains(dep) {
            deps.push(dep.clone());
        }
    }
    deps
}
