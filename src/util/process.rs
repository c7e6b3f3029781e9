//! Subprocess execution utilities.
//!
//! Every external tool (git, gn, ninja, nuget, python) is started through a
//! [`ProcessBuilder`] and run by a [`ProcessRunner`]. The real runner
//! inherits stdio and blocks until the child exits; tests swap in a scripted
//! runner.

use std::collections::BTreeMap;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Context, Result};

use crate::core::error::PipelineError;

/// Builder for subprocess execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessBuilder {
    program: PathBuf,
    args: Vec<String>,
    env: BTreeMap<String, String>,
    cwd: Option<PathBuf>,
}

impl ProcessBuilder {
    /// Create a new process builder for the given program.
    pub fn new(program: impl AsRef<Path>) -> Self {
        ProcessBuilder {
            program: program.as_ref().to_path_buf(),
            args: Vec::new(),
            env: BTreeMap::new(),
            cwd: None,
        }
    }

    /// Add a single argument.
    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_string_lossy().into_owned());
        self
    }

    /// Add multiple arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args.extend(
            args.into_iter()
                .map(|s| s.as_ref().to_string_lossy().into_owned()),
        );
        self
    }

    /// Set several environment variables.
    pub fn envs<'a>(mut self, vars: impl IntoIterator<Item = (&'a String, &'a String)>) -> Self {
        for (key, value) in vars {
            self.env.insert(key.clone(), value.clone());
        }
        self
    }

    /// Set the working directory.
    pub fn cwd(mut self, cwd: impl AsRef<Path>) -> Self {
        self.cwd = Some(cwd.as_ref().to_path_buf());
        self
    }

    /// Get the arguments.
    pub fn get_args(&self) -> &[String] {
        &self.args
    }

    /// Get the working directory.
    pub fn get_cwd(&self) -> Option<&Path> {
        self.cwd.as_deref()
    }

    /// Get an environment override.
    pub fn get_env(&self, key: &str) -> Option<&str> {
        self.env.get(key).map(String::as_str)
    }

    /// Build the Command.
    fn build_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);

        for (key, value) in &self.env {
            cmd.env(key, value);
        }

        if let Some(ref cwd) = self.cwd {
            cmd.current_dir(cwd);
        }

        cmd
    }

    /// Execute with inherited stdio and return the exit code.
    pub fn status(&self) -> Result<RunStatus> {
        let mut cmd = self.build_command();
        let status = cmd
            .status()
            .with_context(|| format!("failed to execute `{}`", self.display_command()))?;
        Ok(RunStatus {
            code: status.code(),
        })
    }

    /// Display the command for error messages.
    pub fn display_command(&self) -> String {
        let mut parts = vec![self.program.display().to_string()];
        parts.extend(self.args.iter().cloned());
        parts.join(" ")
    }
}

/// Exit status of a finished child.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunStatus {
    /// Exit code, `None` when the child was killed by a signal.
    pub code: Option<i32>,
}

impl RunStatus {
    pub fn is_success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Runs external processes.
pub trait ProcessRunner {
    /// Run to completion and report how the child exited.
    fn run(&self, cmd: &ProcessBuilder) -> Result<RunStatus>;

    /// Run and turn a non-zero exit into an [`PipelineError::ExternalProcessFailure`].
    fn run_checked(&self, stage: &str, cmd: &ProcessBuilder) -> Result<()> {
        tracing::debug!("running `{}`", cmd.display_command());
        let status = self.run(cmd)?;
        if !status.is_success() {
            return Err(PipelineError::process(stage, cmd.display_command(), status.code).into());
        }
        Ok(())
    }
}

/// Runs processes on the host, blocking until each exits.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl ProcessRunner for SystemRunner {
    fn run(&self, cmd: &ProcessBuilder) -> Result<RunStatus> {
        cmd.status()
    }
}

/// Find an executable in PATH.
pub fn find_executable(name: &str) -> Option<PathBuf> {
    which::which(name).ok()
}

/// Resolve a tool given on the command line.
///
/// Paths that exist are used as they are; bare names are looked up on PATH.
/// When neither works the name is returned unchanged so the spawn error
/// names the missing tool.
pub fn resolve_tool(tool: &Path) -> PathBuf {
    if tool.exists() {
        return tool.to_path_buf();
    }
    tool.to_str()
        .and_then(find_executable)
        .unwrap_or_else(|| tool.to_path_buf())
}

/// Find a Python interpreter for the upstream toolchain scripts.
pub fn find_python() -> Option<PathBuf> {
    if let Ok(python) = std::env::var("PYTHON") {
        if let Some(path) = find_executable(&python) {
            return Some(path);
        }
    }

    for python in &["python3", "python", "py"] {
        if let Some(path) = find_executable(python) {
            return Some(path);
        }
    }

    None
}
