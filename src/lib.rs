//! v8pack - Builds V8 across a platform/configuration/linkage matrix and
//! packages the results for NuGet
//!
//! This crate provides the core library functionality for v8pack,
//! including source synchronization, build orchestration, define
//! extraction and package generation.

pub mod builder;
pub mod core;
pub mod ops;
pub mod sources;
pub mod util;

/// Test utilities and mocks for v8pack unit tests.
///
/// This module is only available when compiling with `--cfg test` or
/// running tests. It provides a scripted process runner and on-disk
/// fixtures of a V8 checkout.
#[cfg(test)]
pub mod test_support;

pub use core::{
    BuildMatrix, BuildOptionSet, Configuration, LinkageMode, PipelineError, Platform, SourceSpec,
    Toolset, Version,
};
