//! Test utilities and mocks for v8pack unit tests.
//!
//! Every external tool the pipeline drives (git, gn, ninja, nuget, python)
//! goes through [`ProcessRunner`], so tests swap in [`MockExecutor`] and
//! assert on the recorded command lines.
//!
//! # Example
//!
//! ```rust,ignore
//! use v8pack::test_support::{MockExecutor, MockProcessOutput};
//!
//! #[test]
//! fn test_example() {
//!     let exec = MockExecutor::new();
//!     exec.expect_prefix("git fetch", MockProcessOutput::failure(128, "unreachable"));
//!     exec.set_default(MockProcessOutput::success(""));
//!
//!     // Hand `&exec` to a GitFetcher, GnNinja, ...
//!     assert!(exec.calls().is_empty());
//! }
//! ```

pub mod fixtures;

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::{bail, Result};

use crate::util::process::{ProcessBuilder, ProcessRunner, RunStatus};

pub use fixtures::*;

/// Mock process output for testing command execution.
#[derive(Debug, Clone)]
pub struct MockProcessOutput {
    /// Exit status code (0 = success).
    pub status: i32,
    /// Standard output.
    pub stdout: String,
    /// Standard error.
    pub stderr: String,
}

impl MockProcessOutput {
    /// Create a successful output with the given stdout.
    pub fn success(stdout: impl Into<String>) -> Self {
        MockProcessOutput {
            status: 0,
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// Create a failure output with the given stderr and status code.
    pub fn failure(status: i32, stderr: impl Into<String>) -> Self {
        MockProcessOutput {
            status,
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }
}

impl Default for MockProcessOutput {
    fn default() -> Self {
        MockProcessOutput::success("")
    }
}

/// Pattern for matching commands in MockExecutor.
#[derive(Debug, Clone)]
pub enum CommandPattern {
    /// Exact match on full command string.
    Exact(String),
    /// Match if command starts with prefix.
    StartsWith(String),
    /// Match if command contains substring.
    Contains(String),
}

impl CommandPattern {
    /// Check if this pattern matches the given command.
    pub fn matches(&self, cmd: &str) -> bool {
        match self {
            CommandPattern::Exact(s) => cmd == s,
            CommandPattern::StartsWith(s) => cmd.starts_with(s),
            CommandPattern::Contains(s) => cmd.contains(s),
        }
    }
}

type Action = Arc<dyn Fn(&ProcessBuilder) -> MockProcessOutput + Send + Sync>;

/// What a matched command produces.
#[derive(Clone)]
pub enum MockResponse {
    /// A canned output.
    Output(MockProcessOutput),
    /// A callback run in place of the process, e.g. to write the files the
    /// real tool would have produced.
    Action(Action),
}

impl fmt::Debug for MockResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MockResponse::Output(out) => f.debug_tuple("Output").field(out).finish(),
            MockResponse::Action(_) => f.write_str("Action(..)"),
        }
    }
}

/// Expectation for a command execution.
#[derive(Debug, Clone)]
pub struct CommandExpectation {
    /// Pattern to match against commands.
    pub pattern: CommandPattern,
    /// Response when matched.
    pub response: MockResponse,
    /// Number of times this expectation can be used (None = unlimited).
    pub times: Option<usize>,
    /// Number of times this expectation has been used.
    pub used: usize,
}

impl CommandExpectation {
    /// Create a new expectation.
    pub fn new(pattern: CommandPattern, output: MockProcessOutput) -> Self {
        CommandExpectation {
            pattern,
            response: MockResponse::Output(output),
            times: None,
            used: 0,
        }
    }

    /// Set the number of times this expectation can be used.
    pub fn times(mut self, n: usize) -> Self {
        self.times = Some(n);
        self
    }

    /// Check if this expectation can still be used.
    pub fn available(&self) -> bool {
        match self.times {
            Some(n) => self.used < n,
            None => true,
        }
    }
}

#[derive(Debug, Default)]
struct MockState {
    expectations: Vec<CommandExpectation>,
    calls: Vec<String>,
    default_output: Option<MockProcessOutput>,
}

/// Mock process executor for testing command execution.
///
/// Expectations are tried in the order they were added; the first one that
/// matches and is not used up answers. Commands are recorded by their
/// display form, e.g. `git fetch --depth=1 ... lkgr`.
#[derive(Debug, Default)]
pub struct MockExecutor {
    state: Mutex<MockState>,
}

impl MockExecutor {
    /// Create a new mock executor.
    pub fn new() -> Self {
        MockExecutor::default()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Add an expectation for an exact command match.
    pub fn expect(&self, cmd: &str, output: MockProcessOutput) -> &Self {
        self.expect_pattern(CommandExpectation::new(
            CommandPattern::Exact(cmd.to_string()),
            output,
        ))
    }

    /// Add an expectation for a command starting with a prefix.
    pub fn expect_prefix(&self, prefix: &str, output: MockProcessOutput) -> &Self {
        self.expect_pattern(CommandExpectation::new(
            CommandPattern::StartsWith(prefix.to_string()),
            output,
        ))
    }

    /// Add an expectation for a command starting with a prefix, usable `n` times.
    pub fn expect_prefix_times(&self, prefix: &str, output: MockProcessOutput, n: usize) -> &Self {
        self.expect_pattern(
            CommandExpectation::new(CommandPattern::StartsWith(prefix.to_string()), output)
                .times(n),
        )
    }

    /// Run `action` for every command starting with `prefix`.
    pub fn on_prefix<F>(&self, prefix: &str, action: F) -> &Self
    where
        F: Fn(&ProcessBuilder) -> MockProcessOutput + Send + Sync + 'static,
    {
        self.on_pattern(CommandPattern::StartsWith(prefix.to_string()), action)
    }

    /// Run `action` for every command matching `pattern`.
    pub fn on_pattern<F>(&self, pattern: CommandPattern, action: F) -> &Self
    where
        F: Fn(&ProcessBuilder) -> MockProcessOutput + Send + Sync + 'static,
    {
        self.expect_pattern(CommandExpectation {
            pattern,
            response: MockResponse::Action(Arc::new(action)),
            times: None,
            used: 0,
        })
    }

    /// Add a custom expectation.
    pub fn expect_pattern(&self, expectation: CommandExpectation) -> &Self {
        self.state().expectations.push(expectation);
        self
    }

    /// Set a default output for commands that don't match any expectation.
    pub fn set_default(&self, output: MockProcessOutput) -> &Self {
        self.state().default_output = Some(output);
        self
    }

    /// Record a command and find its response.
    fn respond(&self, full_cmd: &str) -> Result<MockResponse> {
        let mut state = self.state();
        state.calls.push(full_cmd.to_string());

        for exp in &mut state.expectations {
            if exp.pattern.matches(full_cmd) && exp.available() {
                exp.used += 1;
                return Ok(exp.response.clone());
            }
        }

        if let Some(ref default) = state.default_output {
            return Ok(MockResponse::Output(default.clone()));
        }

        bail!("unexpected command: {}", full_cmd)
    }

    /// Get all commands that were called.
    pub fn calls(&self) -> Vec<String> {
        self.state().calls.clone()
    }

    /// Clear all recorded calls.
    pub fn clear_calls(&self) {
        self.state().calls.clear();
    }

    /// Verify that all expectations with a specific count were satisfied.
    pub fn verify(&self) -> Result<()> {
        for (i, exp) in self.state().expectations.iter().enumerate() {
            if let Some(expected) = exp.times {
                if exp.used != expected {
                    bail!(
                        "expectation {} was used {} times, expected {}",
                        i,
                        exp.used,
                        expected
                    );
                }
            }
        }
        Ok(())
    }
}

impl ProcessRunner for MockExecutor {
    fn run(&self, cmd: &ProcessBuilder) -> Result<RunStatus> {
        // The lock is released before an action runs so it may inspect the mock.
        let output = match self.respond(&cmd.display_command())? {
            MockResponse::Output(output) => output,
            MockResponse::Action(action) => action(cmd),
        };
        // Children inherit stdio; captured test output stands in for it.
        print!("{}", output.stdout);
        eprint!("{}", output.stderr);
        Ok(RunStatus {
            code: Some(output.status),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_executor_basic() {
        let exec = MockExecutor::new();
        exec.expect("gn --version", MockProcessOutput::success("2024"));

        let status = exec.run(&ProcessBuilder::new("gn").arg("--version")).unwrap();
        assert!(status.is_success());
        assert_eq!(exec.calls(), vec!["gn --version"]);
    }

    #[test]
    fn test_mock_executor_unexpected() {
        let exec = MockExecutor::new();
        assert!(exec.run(&ProcessBuilder::new("ninja")).is_err());
    }

    #[test]
    fn test_mock_executor_limited_expectation_falls_through() {
        let exec = MockExecutor::new();
        exec.expect_prefix_times("git fetch", MockProcessOutput::failure(1, ""), 1);
        exec.set_default(MockProcessOutput::success(""));

        let cmd = ProcessBuilder::new("git").arg("fetch");
        assert_eq!(exec.run(&cmd).unwrap().code, Some(1));
        assert!(exec.run(&cmd).unwrap().is_success());
        exec.verify().unwrap();
    }

    #[test]
    fn test_mock_executor_action_sees_command() {
        let exec = MockExecutor::new();
        exec.on_prefix("ninja", |cmd| {
            assert_eq!(cmd.get_args(), ["-C", "out"]);
            MockProcessOutput::failure(2, "")
        });

        let status = exec
            .run(&ProcessBuilder::new("ninja").args(["-C", "out"]))
            .unwrap();
        assert_eq!(status.code, Some(2));
    }

    #[test]
    fn test_run_checked_reports_stage() {
        let exec = MockExecutor::new();
        exec.set_default(MockProcessOutput::failure(3, ""));
        let err = exec
            .run_checked("ninja", &ProcessBuilder::new("ninja"))
            .unwrap_err();
        assert!(err.to_string().contains("ninja"));
    }
}
