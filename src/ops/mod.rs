//! High-level operations.
//!
//! This module contains the implementation of v8pack commands.

pub mod pipeline;
pub mod prepare;

pub use pipeline::{run, sync_sources, PipelineOptions, PipelineReport, Tools};
pub use prepare::{resolve_toolchain, PreparedToolchain, ToolchainPreparer};
