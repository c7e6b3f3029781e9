//! Preprocessor defines from gn build metadata.
//!
//! gn writes the effective build flags of an output directory to
//! `v8_build_config.json` (and, in newer trees, `v8_features.json`). Code
//! embedding V8 must be compiled with the matching `V8_*` defines, so they
//! are derived here and written into the package property sheets.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use anyhow::{Context, Result};
use serde_json::Value;

use crate::core::axis::Configuration;
use crate::core::error::PipelineError;
use crate::util::fs::read_optional;

/// Primary build metadata written by gn.
pub const BUILD_CONFIG_FILE: &str = "v8_build_config.json";

/// Supplemental feature metadata written by gn.
pub const FEATURES_FILE: &str = "v8_features.json";

/// Which build flags enable which defines.
///
/// Several flags may enable the same define.
const DEFINE_TABLE: &[(&str, &[&str])] = &[
    ("is_debug", &["V8_ENABLE_CHECKS"]),
    ("is_full_debug", &["V8_ENABLE_CHECKS"]),
    ("v8_enable_v8_checks", &["V8_ENABLE_CHECKS"]),
    (
        "v8_enable_pointer_compression",
        &["V8_COMPRESS_POINTERS", "V8_31BIT_SMIS_ON_64BIT_ARCH"],
    ),
    (
        "v8_enable_31bit_smis_on_64bit_arch",
        &["V8_31BIT_SMIS_ON_64BIT_ARCH"],
    ),
    ("v8_deprecation_warnings", &["V8_DEPRECATION_WARNINGS"]),
    (
        "v8_imminent_deprecation_warnings",
        &["V8_IMMINENT_DEPRECATION_WARNINGS"],
    ),
    (
        "v8_enable_pointer_compression_shared_cage",
        &["V8_COMPRESS_POINTERS_IN_SHARED_CAGE"],
    ),
    ("v8_enable_sandbox", &["V8_ENABLE_SANDBOX"]),
];

/// Build flags as read from a metadata file.
pub type BuildConfigMap = BTreeMap<String, Value>;

/// A sorted set of define tokens.
pub type DefineSet = BTreeSet<String>;

/// Derive the defines enabled by the given build flags.
///
/// Either source may be absent. Keys in `supplemental` replace keys in
/// `primary`. Unknown keys are ignored.
pub fn extract(primary: Option<&BuildConfigMap>, supplemental: Option<&BuildConfigMap>) -> DefineSet {
    let mut merged: BTreeMap<&str, &Value> = BTreeMap::new();
    for source in [primary, supplemental].into_iter().flatten() {
        for (key, value) in source {
            merged.insert(key, value);
        }
    }

    let mut defines = DefineSet::new();
    for (key, tokens) in DEFINE_TABLE {
        if merged.get(key).is_some_and(|v| is_truthy(v)) {
            defines.extend(tokens.iter().map(|t| t.to_string()));
        }
    }
    defines
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
        Value::Null => false,
    }
}

/// Parse a metadata file's contents.
pub fn parse_build_config(text: &str) -> Result<BuildConfigMap> {
    serde_json::from_str(text).context("build metadata is not a JSON object")
}

/// Load a metadata file.
///
/// A missing file is reported as [`PipelineError::MetadataMissing`]; callers
/// decide whether that is fatal.
pub fn load_build_config(path: &Path) -> Result<BuildConfigMap> {
    let text = read_optional(path)?
        .ok_or_else(|| PipelineError::metadata_missing(path.display().to_string()))?;
    parse_build_config(&text).with_context(|| format!("invalid build metadata: {}", path.display()))
}

/// Load a metadata file that may legitimately be absent.
fn load_optional(path: &Path) -> Result<Option<BuildConfigMap>> {
    match load_build_config(path) {
        Ok(map) => Ok(Some(map)),
        Err(e)
            if matches!(
                e.downcast_ref::<PipelineError>(),
                Some(PipelineError::MetadataMissing { .. })
            ) =>
        {
            tracing::debug!("{}", e);
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

/// Extract the defines of a gn output directory.
pub fn extract_from_out_dir(out_dir: &Path) -> Result<DefineSet> {
    let primary = load_optional(&out_dir.join(BUILD_CONFIG_FILE))?;
    let supplemental = load_optional(&out_dir.join(FEATURES_FILE))?;
    Ok(extract(primary.as_ref(), supplemental.as_ref()))
}

/// Render the defines of one configuration as an MSBuild element.
pub fn render_fragment(configuration: Configuration, defines: &DefineSet) -> String {
    let joined = defines.iter().cloned().collect::<Vec<_>>().join(";");
    format!(
        "\n\t<PreprocessorDefinitions Condition=\"'$(Configuration)' == '{}'\">{};%(PreprocessorDefinitions)</PreprocessorDefinitions>\n\t",
        configuration, joined
    )
}
