//! gn build options.
//!
//! Options are typed so the rendered `--args` string quotes strings and
//! leaves integers and booleans bare, the way gn expects them.

use std::collections::BTreeMap;
use std::fmt;

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use crate::core::axis::MatrixLeaf;

/// A single gn argument value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    Integer(i64),
    Boolean(bool),
    String(String),
}

impl OptionValue {
    /// Parse a command-line value.
    ///
    /// Integers win over boolean keywords, and anything that is neither is
    /// kept as a literal string.
    pub fn parse(raw: &str) -> Self {
        if let Ok(n) = raw.parse::<i64>() {
            return OptionValue::Integer(n);
        }

        match raw.to_ascii_lowercase().as_str() {
            "true" | "yes" | "on" => OptionValue::Boolean(true),
            "false" | "no" | "off" => OptionValue::Boolean(false),
            _ => OptionValue::String(raw.to_string()),
        }
    }
}

impl From<bool> for OptionValue {
    fn from(value: bool) -> Self {
        OptionValue::Boolean(value)
    }
}

impl From<i64> for OptionValue {
    fn from(value: i64) -> Self {
        OptionValue::Integer(value)
    }
}

impl From<&str> for OptionValue {
    fn from(value: &str) -> Self {
        OptionValue::String(value.to_string())
    }
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionValue::Integer(n) => write!(f, "{}", n),
            OptionValue::Boolean(b) => write!(f, "{}", b),
            OptionValue::String(s) => {
                f.write_str("\"")?;
                for c in s.chars() {
                    if matches!(c, '"' | '\\' | '$') {
                        f.write_str("\\")?;
                    }
                    write!(f, "{}", c)?;
                }
                f.write_str("\"")
            }
        }
    }
}

/// Parse a `KEY=VAL` override.
pub fn parse_override(raw: &str) -> Result<(String, OptionValue)> {
    let Some((key, value)) = raw.split_once('=') else {
        bail!("invalid gn option `{}`; expected KEY=VAL", raw);
    };

    let key = key.trim();
    if key.is_empty() {
        bail!("invalid gn option `{}`; empty key", raw);
    }

    Ok((key.to_string(), OptionValue::parse(value.trim())))
}

/// An ordered set of gn options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BuildOptionSet {
    options: BTreeMap<String, OptionValue>,
}

impl BuildOptionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults every leaf starts from.
    pub fn base() -> Self {
        let mut set = Self::new();
        set.set("treat_warnings_as_errors", false);
        set.set("fatal_linker_warnings", false);
        // Removed upstream in 8.1; older gn files still honour it.
        set.set("use_jumbo_build", true);
        set.set("v8_enable_fast_mksnapshot", true);
        set.set("v8_enable_fast_torque", true);
        // Debug builds fail to link with the heap verifier enabled.
        set.set("v8_enable_verify_heap", false);
        set.set("v8_use_external_startup_data", false);
        set.set("use_custom_libcxx", false);
        set
    }

    /// Options derived from the axes of one matrix leaf.
    pub fn axis_overrides(leaf: &MatrixLeaf, use_clang: bool) -> Self {
        let debug = leaf.configuration.is_debug();
        let component = leaf.linkage.is_component_build();

        let mut set = Self::new();
        set.set("target_cpu", leaf.platform.as_str());
        set.set("is_component_build", component);
        set.set("v8_monolithic", !component);
        set.set("is_debug", debug);
        set.set("is_full_debug", debug);
        set.set("enable_iterator_debugging", debug);
        set.set("is_clang", use_clang);
        set
    }

    /// Compute the options of one leaf.
    ///
    /// Always builds a new set: `base`, then the leaf's axis values, then
    /// the caller's overrides. Nothing carries over between leaves.
    pub fn for_leaf(
        base: &BuildOptionSet,
        leaf: &MatrixLeaf,
        use_clang: bool,
        overrides: &BuildOptionSet,
    ) -> Self {
        let mut set = base.clone();
        set.merge(&Self::axis_overrides(leaf, use_clang));
        set.merge(overrides);
        set
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<OptionValue>) {
        self.options.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&OptionValue> {
        self.options.get(key)
    }

    pub fn len(&self) -> usize {
        self.options.len()
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }

    /// Overlay `other` on top of this set; `other` wins on collision.
    pub fn merge(&mut self, other: &BuildOptionSet) {
        for (key, value) in &other.options {
            self.options.insert(key.clone(), value.clone());
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &OptionValue)> {
        self.options.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Render as the value of `gn gen --args=`.
    pub fn to_gn_args(&self) -> String {
        self.iter()
            .map(|(key, value)| format!("{}={}", key, value))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl FromIterator<(String, OptionValue)> for BuildOptionSet {
    fn from_iter<I: IntoIterator<Item = (String, OptionValue)>>(iter: I) -> Self {
        BuildOptionSet {
            options: iter.into_iter().collect(),
        }
    }
}
