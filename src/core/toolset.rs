//! Visual C++ toolset resolution.
//!
//! The toolset is resolved once per run from the environment the developer
//! prompt sets up, and then stays fixed: it names output directories,
//! conditions every generated property sheet and is passed to NuGet.

use std::path::{Path, PathBuf};

use crate::core::error::PipelineError;

/// Default `VisualStudioVersion` when the environment does not set one.
pub const DEFAULT_VS_VERSION: &str = "14.0";

/// `VisualStudioVersion` → (product year, toolset id).
const TOOLSET_MAPPING: &[(&str, &str, &str)] = &[
    ("12.0", "2013", "v120"),
    ("14.0", "2015", "v140"),
    ("15.0", "2017", "v141"),
    ("16.0", "2019", "v142"),
    ("17.0", "2022", "v143"),
];

/// Environment variables consulted during resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolsetEnv {
    /// `VisualStudioVersion`
    pub vs_version: Option<String>,
    /// `VCToolsVersion`, e.g. `14.16.27023`
    pub vc_tools_version: Option<String>,
    /// `VCToolsInstallDir`
    pub vc_tools_install_dir: Option<PathBuf>,
    /// `VCINSTALLDIR`
    pub vc_install_dir: Option<PathBuf>,
}

impl ToolsetEnv {
    /// Read the variables from the process environment.
    pub fn from_env() -> Self {
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.is_empty());
        ToolsetEnv {
            vs_version: var("VisualStudioVersion"),
            vc_tools_version: var("VCToolsVersion"),
            vc_tools_install_dir: var("VCToolsInstallDir").map(PathBuf::from),
            vc_install_dir: var("VCINSTALLDIR").map(PathBuf::from),
        }
    }
}

/// The resolved toolset of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toolset {
    /// Display version (`2017`, or the exact `VCToolsVersion`).
    pub display_version: String,
    /// Toolset id, e.g. `v141` or `v140_xp`.
    pub id: String,
    /// Visual Studio install directory, when discoverable.
    pub install_dir: Option<PathBuf>,
    /// Whether the Windows XP toolset was selected.
    pub xp: bool,
}

impl Toolset {
    /// Resolve the toolset from the environment.
    pub fn resolve(env: &ToolsetEnv, xp: bool) -> Result<Self, PipelineError> {
        let selector = env.vs_version.as_deref().unwrap_or(DEFAULT_VS_VERSION);

        let (_, year, toolset) = TOOLSET_MAPPING
            .iter()
            .find(|(vs, _, _)| *vs == selector)
            .ok_or_else(|| {
                PipelineError::ToolsetResolutionFailure(format!(
                    "VisualStudioVersion `{}` is not supported; expected one of {}",
                    selector,
                    supported_versions().join(", ")
                ))
            })?;

        let mut display_version = year.to_string();
        let mut id = toolset.to_string();

        if let Some(ref tools_version) = env.vc_tools_version {
            id = toolset_from_tools_version(tools_version)?;
            display_version = tools_version.clone();
        }

        if xp {
            if toolset_number(&id).is_some_and(|n| n >= 142) {
                return Err(PipelineError::ToolsetResolutionFailure(format!(
                    "the Windows XP toolset is not available for {}",
                    id
                )));
            }
            id.push_str("_xp");
        }

        Ok(Toolset {
            display_version,
            id,
            install_dir: install_dir(env),
            xp,
        })
    }
}

/// Supported `VisualStudioVersion` values.
pub fn supported_versions() -> Vec<&'static str> {
    TOOLSET_MAPPING.iter().map(|(vs, _, _)| *vs).collect()
}

/// `14.16.27023` → `v141`.
fn toolset_from_tools_version(version: &str) -> Result<String, PipelineError> {
    let digits: String = version.chars().filter(|c| *c != '.').take(3).collect();
    if digits.len() != 3 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(PipelineError::ToolsetResolutionFailure(format!(
            "cannot derive a toolset from VCToolsVersion `{}`",
            version
        )));
    }
    Ok(format!("v{}", digits))
}

fn toolset_number(id: &str) -> Option<u32> {
    id.strip_prefix('v')
        .and_then(|rest| rest.get(..3))
        .and_then(|n| n.parse().ok())
}

fn install_dir(env: &ToolsetEnv) -> Option<PathBuf> {
    if let Some(ref dir) = env.vc_tools_install_dir {
        return Some(dir.clone());
    }
    env.vc_install_dir
        .as_deref()
        .map(|dir| dir.parent().unwrap_or(dir))
        .map(Path::to_path_buf)
}
