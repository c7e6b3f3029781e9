//! V8 version resolution.
//!
//! Two kinds of version show up in a run: the token the user asked for
//! (a tag, a branch, or a bare `major.minor` that gets mapped onto the
//! matching last-known-good branch), and the canonical four-part version
//! that the fetched tree reports in `include/v8-version.h`.

use std::fmt;
use std::path::Path;
use std::sync::LazyLock;

use anyhow::{Context, Result};
use regex::Regex;

use crate::core::error::PipelineError;

/// Suffix of the rolling last-known-good branches.
pub const LKGR_SUFFIX: &str = "-lkgr";

/// Default version token: the rolling last-known-good branch.
pub const DEFAULT_VERSION_TOKEN: &str = "lkgr";

/// Header constants, in version order.
const HEADER_CONSTANTS: [&str; 4] = [
    "V8_MAJOR_VERSION",
    "V8_MINOR_VERSION",
    "V8_BUILD_NUMBER",
    "V8_PATCH_LEVEL",
];

static DEFINE_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^#define\s+(\w+)\s+(\d+)\s*$").unwrap());

/// Canonical four-part V8 version, e.g. `8.1.307.31`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
    pub build: u32,
    pub patch: u32,
}

impl Version {
    pub fn new(major: u32, minor: u32, build: u32, patch: u32) -> Self {
        Version {
            major,
            minor,
            build,
            patch,
        }
    }

    /// Parse the version out of the text of `v8-version.h`.
    ///
    /// Each constant is matched on its own `#define NAME NUMBER` line, so
    /// the order of the defines in the header does not matter.
    pub fn from_header(text: &str) -> Result<Self, PipelineError> {
        let mut parts = [0u32; 4];

        for (slot, name) in parts.iter_mut().zip(HEADER_CONSTANTS) {
            *slot = DEFINE_LINE
                .captures_iter(text)
                .find(|caps| &caps[1] == name)
                .and_then(|caps| caps[2].parse().ok())
                .ok_or_else(|| PipelineError::metadata_missing(name))?;
        }

        Ok(Version::new(parts[0], parts[1], parts[2], parts[3]))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}.{}", self.major, self.minor, self.build, self.patch)
    }
}

/// Resolve the version from header text, returning the dot-joined form.
pub fn resolve_header(text: &str) -> Result<Version> {
    Ok(Version::from_header(text)?)
}

/// Read and resolve `include/v8-version.h` under the source root.
pub fn resolve_source_root(root: &Path) -> Result<Version> {
    let header = root.join("include").join("v8-version.h");
    let text = std::fs::read_to_string(&header)
        .with_context(|| format!("failed to read version header: {}", header.display()))?;

    let version = resolve_header(&text)
        .with_context(|| format!("invalid version header: {}", header.display()))?;
    tracing::debug!("resolved V8 {} from {}", version, header.display());
    Ok(version)
}

/// Normalize a user-supplied version token.
///
/// A bare numeric token with fewer than two dots (`8`, `8.1`) names a
/// release line, which is only built from its last-known-good branch.
/// Everything else (full versions, branch names, already suffixed tokens)
/// is passed through unchanged.
pub fn normalize_token(token: &str) -> String {
    let numeric = token
        .split('.')
        .all(|part| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit()));

    if token.matches('.').count() < 2 && numeric {
        format!("{}{}", token, LKGR_SUFFIX)
    } else {
        token.to_string()
    }
}
