//! V8 build and packaging.
//!
//! This module drives gn and ninja over the build matrix, reads the
//! resulting defines back and renders them into NuGet packages.

pub mod defines;
pub mod gn;
pub mod matrix;
pub mod package;

pub use defines::DefineSet;
pub use gn::GnNinja;
pub use matrix::{BuildMatrixDriver, PairDefines};
pub use package::{PackageDescriptor, PackageGenerator};
