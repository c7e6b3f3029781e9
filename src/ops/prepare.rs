//! Toolchain preparation.
//!
//! Resolves the Visual C++ toolset, computes the environment every build
//! tool runs with, and runs the upstream hooks a fresh checkout needs
//! before `gn gen` works: the toolchain and clang download scripts, the gn
//! binary placement and the `LASTCHANGE` stamp.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::core::toolset::{Toolset, ToolsetEnv};
use crate::util::fs::copy_into;
use crate::util::process::{ProcessBuilder, ProcessRunner};

/// Keeps depot_tools from substituting its own packaged toolchain.
pub const DEPOT_TOOLS_WIN_TOOLCHAIN: &str = "DEPOT_TOOLS_WIN_TOOLCHAIN";

/// Windows 7.1A SDK, relative to `%ProgramFiles(x86)%`.
const XP_SDK_DIR: &str = r"Microsoft SDKs\Windows\7.1A";

/// (environment variable, SDK subdirectory) pairs the XP toolset needs.
const XP_SDK_PATHS: &[(&str, &str)] = &[("INCLUDE", "Include"), ("PATH", "Bin"), ("LIB", "Lib")];

/// A resolved toolset and the environment derived from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedToolchain {
    pub toolset: Toolset,

    /// Variables set on every build tool invocation
    pub env: BTreeMap<String, String>,
}

/// Resolve the toolset and its child environment.
///
/// `lookup` reads the current value of an environment variable; XP builds
/// prepend the SDK directories to the existing `INCLUDE`, `PATH` and `LIB`.
pub fn resolve_toolchain<F>(env: &ToolsetEnv, xp: bool, lookup: F) -> Result<PreparedToolchain>
where
    F: Fn(&str) -> Option<String>,
{
    let toolset = Toolset::resolve(env, xp)?;

    tracing::info!(
        "Using Visual Studio {} toolset {}",
        toolset.display_version,
        toolset.id
    );
    match toolset.install_dir {
        Some(ref dir) => tracing::info!("Visual Studio installed in {}", dir.display()),
        None => tracing::warn!("Visual Studio install directory is unknown"),
    }

    let mut child_env = BTreeMap::new();
    child_env.insert(DEPOT_TOOLS_WIN_TOOLCHAIN.to_string(), "0".to_string());

    if toolset.xp {
        // Left for the shell to expand when the variable is not visible here.
        let program_files =
            lookup("ProgramFiles(x86)").unwrap_or_else(|| "%ProgramFiles(x86)%".to_string());
        let sdk = format!(r"{}\{}", program_files.trim_end_matches('\\'), XP_SDK_DIR);
        for (var, subdir) in XP_SDK_PATHS {
            let dir = format!(r"{}\{}", sdk, subdir);
            child_env.insert(var.to_string(), prepend_path(&dir, lookup(var).as_deref()));
        }
    }

    Ok(PreparedToolchain {
        toolset,
        env: child_env,
    })
}

/// Prepend `dir` to a `;`-separated search path.
fn prepend_path(dir: &str, existing: Option<&str>) -> String {
    match existing {
        Some(rest) if !rest.is_empty() => format!("{};{}", dir, rest),
        _ => dir.to_string(),
    }
}

/// Runs the upstream preparation hooks of a source tree.
pub struct ToolchainPreparer<'a> {
    runner: &'a dyn ProcessRunner,

    /// Python interpreter for the hook scripts
    pub python: PathBuf,

    /// gn binary placed into the tree
    pub gn: PathBuf,

    pub source_root: PathBuf,

    pub use_clang: bool,
}

impl<'a> ToolchainPreparer<'a> {
    pub fn new(
        runner: &'a dyn ProcessRunner,
        python: impl Into<PathBuf>,
        gn: impl Into<PathBuf>,
        source_root: impl Into<PathBuf>,
    ) -> Self {
        ToolchainPreparer {
            runner,
            python: python.into(),
            gn: gn.into(),
            source_root: source_root.into(),
            use_clang: true,
        }
    }

    pub fn with_clang(mut self, use_clang: bool) -> Self {
        self.use_clang = use_clang;
        self
    }

    fn script(&self, dir: &Path, args: &[&str], env: &BTreeMap<String, String>) -> ProcessBuilder {
        ProcessBuilder::new(&self.python)
            .args(args)
            .envs(env)
            .cwd(dir)
    }

    /// Run every hook, in order.
    pub fn run(&self, env: &BTreeMap<String, String>) -> Result<()> {
        let build_dir = self.source_root.join("build");
        tracing::info!("Updating the Visual Studio toolchain");
        self.runner.run_checked(
            "vs_toolchain",
            &self.script(&build_dir, &["vs_toolchain.py", "update"], env),
        )?;

        if self.use_clang {
            tracing::info!("Updating clang");
            let scripts = self.source_root.join("tools").join("clang").join("scripts");
            self.runner
                .run_checked("clang update", &self.script(&scripts, &["update.py"], env))?;
        }

        let gn_dir = self.source_root.join("buildtools").join("win");
        copy_into(&self.gn, &gn_dir)
            .with_context(|| format!("failed to place gn into {}", gn_dir.display()))?;

        let util_dir = build_dir.join("util");
        if util_dir.join("lastchange.py").is_file() {
            self.runner.run_checked(
                "lastchange",
                &self.script(&util_dir, &["lastchange.py", "-o", "LASTCHANGE"], env),
            )?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::{find_pipeline_error, PipelineError};
    use crate::test_support::{MockExecutor, MockProcessOutput, V8TreeFixture};

    fn vs2017() -> ToolsetEnv {
        ToolsetEnv {
            vs_version: Some("15.0".into()),
            ..Default::default()
        }
    }

    #[test]
    fn test_child_env_disables_depot_toolchain() {
        let prepared = resolve_toolchain(&vs2017(), false, |_| None).unwrap();
        assert_eq!(prepared.toolset.id, "v141");
        assert_eq!(prepared.env.len(), 1);
        assert_eq!(prepared.env[DEPOT_TOOLS_WIN_TOOLCHAIN], "0");
    }

    #[test]
    fn test_xp_prepends_sdk_paths() {
        let lookup = |name: &str| match name {
            "ProgramFiles(x86)" => Some(r"C:\Program Files (x86)".to_string()),
            "PATH" => Some(r"C:\Windows".to_string()),
            _ => None,
        };
        let prepared = resolve_toolchain(&vs2017(), true, lookup).unwrap();

        assert_eq!(prepared.toolset.id, "v141_xp");
        assert_eq!(
            prepared.env["PATH"],
            r"C:\Program Files (x86)\Microsoft SDKs\Windows\7.1A\Bin;C:\Windows"
        );
        assert_eq!(
            prepared.env["INCLUDE"],
            r"C:\Program Files (x86)\Microsoft SDKs\Windows\7.1A\Include"
        );
        assert_eq!(
            prepared.env["LIB"],
            r"C:\Program Files (x86)\Microsoft SDKs\Windows\7.1A\Lib"
        );
    }

    #[test]
    fn test_xp_without_program_files_keeps_placeholder() {
        let prepared = resolve_toolchain(&vs2017(), true, |_| None).unwrap();
        assert_eq!(
            prepared.env["LIB"],
            r"%ProgramFiles(x86)%\Microsoft SDKs\Windows\7.1A\Lib"
        );
    }

    #[test]
    fn test_xp_rejected_for_newer_toolsets() {
        let env = ToolsetEnv {
            vs_version: Some("16.0".into()),
            ..Default::default()
        };
        let err = resolve_toolchain(&env, true, |_| None).unwrap_err();
        assert!(matches!(
            find_pipeline_error(&err),
            Some(PipelineError::ToolsetResolutionFailure(_))
        ));
    }

    #[test]
    fn test_hooks_run_in_order() {
        let fixture = V8TreeFixture::new(8, 1, 307, 31).with_lastchange();
        let exec = MockExecutor::new();
        exec.set_default(MockProcessOutput::success(""));

        let env = BTreeMap::from([(DEPOT_TOOLS_WIN_TOOLCHAIN.to_string(), "0".to_string())]);
        ToolchainPreparer::new(&exec, "python", fixture.gn(), fixture.source_root())
            .run(&env)
            .unwrap();

        assert_eq!(
            exec.calls(),
            vec![
                "python vs_toolchain.py update",
                "python update.py",
                "python lastchange.py -o LASTCHANGE",
            ]
        );
        assert!(fixture.source_root().join("buildtools/win/gn.exe").is_file());
    }

    #[test]
    fn test_hooks_without_clang_or_lastchange() {
        let fixture = V8TreeFixture::new(8, 1, 307, 31);
        let exec = MockExecutor::new();
        exec.set_default(MockProcessOutput::success(""));

        ToolchainPreparer::new(&exec, "python", fixture.gn(), fixture.source_root())
            .with_clang(false)
            .run(&BTreeMap::new())
            .unwrap();

        assert_eq!(exec.calls(), vec!["python vs_toolchain.py update"]);
    }

    #[test]
    fn test_hook_failure_stops_preparation() {
        let fixture = V8TreeFixture::new(8, 1, 307, 31);
        let exec = MockExecutor::new();
        exec.expect_prefix("python vs_toolchain.py", MockProcessOutput::failure(5, ""));

        let err = ToolchainPreparer::new(&exec, "python", fixture.gn(), fixture.source_root())
            .run(&BTreeMap::new())
            .unwrap_err();

        assert_eq!(find_pipeline_error(&err).map(|e| e.exit_code()), Some(5));
        assert_eq!(exec.calls().len(), 1);
        assert!(!fixture.source_root().join("buildtools/win/gn.exe").exists());
    }
}
