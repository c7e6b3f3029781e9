//! Pinned source locations.

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use url::Url;

/// Reference fetched when a location does not pin one.
pub const DEFAULT_REFERENCE: &str = "HEAD";

/// A repository, a reference in it, and where to materialize it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSpec {
    /// Remote repository URL
    pub url: String,
    /// Tag, branch or commit
    pub reference: String,
    /// Working copy location
    pub path: PathBuf,
}

impl SourceSpec {
    pub fn new(url: impl Into<String>, reference: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        SourceSpec {
            url: url.into(),
            reference: reference.into(),
            path: path.into(),
        }
    }

    /// Parse a dependency location of the form `URL.git@REF`.
    ///
    /// A location without a pinned reference tracks `HEAD`.
    pub fn from_location(location: &str, path: impl AsRef<Path>) -> Self {
        let (url, reference) = match location.split_once(".git@") {
            Some((repo, reference)) if !reference.is_empty() => {
                (format!("{}.git", repo), reference.to_string())
            }
            _ => (location.to_string(), DEFAULT_REFERENCE.to_string()),
        };

        SourceSpec {
            url,
            reference,
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Validate the URL before handing it to git.
    ///
    /// Anything with a scheme must be a well-formed URL. Local paths and
    /// scp-style `[user@]host:path` remotes are accepted as git reads them.
    pub fn validate(&self) -> Result<()> {
        let url = self.url.as_str();
        if url.contains("://") {
            Url::parse(url).with_context(|| format!("invalid repository URL `{}`", url))?;
            return Ok(());
        }
        if is_local_path(url) || is_scp_like(url) {
            return Ok(());
        }
        bail!("invalid repository URL `{}`", url)
    }

    /// Branch the working copy is checked out on.
    pub fn branch_name(&self) -> String {
        let sanitized: String = self
            .reference
            .chars()
            .map(|c| match c {
                ' ' | '~' | '^' | ':' | '?' | '*' | '[' | '\\' => '_',
                c => c,
            })
            .collect();
        format!("Branch_{}", sanitized)
    }
}

fn is_local_path(url: &str) -> bool {
    Path::new(url).is_absolute() || url.starts_with('.') || is_drive_path(url)
}

/// `C:\...` or `C:/...`, whatever the host platform.
fn is_drive_path(url: &str) -> bool {
    let bytes = url.as_bytes();
    bytes.len() > 2
        && bytes[0].is_ascii_alphabetic()
        && bytes[1] == b':'
        && matches!(bytes[2], b'\\' | b'/')
}

/// `[user@]host:path`, with the `:` before any `/`.
fn is_scp_like(url: &str) -> bool {
    let Some((host, path)) = url.split_once(':') else {
        return false;
    };
    let host = host.rsplit_once('@').map_or(host, |(_, h)| h);
    !host.is_empty()
        && !path.is_empty()
        && !host.contains('/')
        && !url.chars().any(char::is_whitespace)
}

impl fmt::Display for SourceSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{} into {}", self.url, self.reference, self.path.display())
    }
}
