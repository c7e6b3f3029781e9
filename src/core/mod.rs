//! Core data structures for v8pack.
//!
//! This module contains the foundational types used throughout v8pack:
//! - Build axes and the matrix they span
//! - Typed gn build options
//! - Source specifications and V8 versions
//! - Toolset resolution and the error taxonomy

pub mod axis;
pub mod error;
pub mod options;
pub mod source_spec;
pub mod toolset;
pub mod version;

pub use axis::{BuildMatrix, Configuration, LinkageMode, MatrixLeaf, PackagePair, Platform};
pub use error::PipelineError;
pub use options::{BuildOptionSet, OptionValue};
pub use source_spec::SourceSpec;
pub use toolset::{Toolset, ToolsetEnv};
pub use version::Version;
