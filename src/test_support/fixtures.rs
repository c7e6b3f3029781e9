//! Test fixtures for common test scenarios.
//!
//! Builds just enough of a V8 checkout on disk for the pipeline to run
//! against: the version header, a `DEPS` manifest, the toolchain scripts
//! and the NuGet package templates.

use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// Version header with the given components.
pub fn version_header(major: u32, minor: u32, build: u32, patch: u32) -> String {
    format!(
        r#"// Copyright 2015 the V8 project authors. All rights reserved.
#ifndef V8_INCLUDE_VERSION_H_
#define V8_INCLUDE_VERSION_H_

#define V8_MAJOR_VERSION {major}
#define V8_MINOR_VERSION {minor}
#define V8_BUILD_NUMBER {build}
#define V8_PATCH_LEVEL {patch}

// Use 1 for candidates and 0 otherwise.
#define V8_IS_CANDIDATE_VERSION 0

#endif  // V8_INCLUDE_VERSION_H_
"#
    )
}

/// A `DEPS` manifest listing the build dependencies and some that are
/// never fetched.
pub fn deps_manifest() -> &'static str {
    r#"# Note: The buildbots evaluate this file with CWD set to the parent
# directory and assume that the root of the checkout is in ./v8/

vars = {
  'chromium_url': 'https://chromium.googlesource.com',
  'build_for_node': False,
}

deps = {
  'v8/build':
    Var('chromium_url') + '/chromium/src/build.git' + '@' + 'b5df2518',
  'v8/third_party/depot_tools':
    Var('chromium_url') + '/chromium/tools/depot_tools.git' + '@' + '6fbb3c3',
  'v8/third_party/icu':
    Var('chromium_url') + '/chromium/deps/icu.git' + '@' + 'dbd3825',
  'v8/third_party/instrumented_libraries':
    Var('chromium_url') + '/chromium/src/third_party/instrumented_libraries.git' + '@' + 'bb3f1802',
  'v8/buildtools':
    Var('chromium_url') + '/chromium/src/buildtools.git' + '@' + '74cfb57',
  'v8/base/trace_event/common':
    Var('chromium_url') + '/chromium/src/base/trace_event/common.git' + '@' + '5e4fce1',
  'v8/third_party/jinja2':
    Var('chromium_url') + '/chromium/src/third_party/jinja2.git' + '@' + 'b41863e',
  'v8/third_party/markupsafe':
    Var('chromium_url') + '/chromium/src/third_party/markupsafe.git' + '@' + '8f45f5c',
  'v8/tools/clang':
    Var('chromium_url') + '/chromium/src/tools/clang.git' + '@' + '105a8460',
  'v8/test/test262/data':
    Var('chromium_url') + '/external/github.com/tc39/test262.git' + '@' + 'f6b2ccd',
  'v8/third_party/android_ndk': {
    'url': Var('chromium_url') + '/android_ndk.git' + '@' + '27c0a8d',
    'condition': 'checkout_android',
  },
}
"#
}

/// Property sheet template with both slots.
pub fn props_template() -> &'static str {
    r#"<?xml version="1.0" encoding="utf-8"?>
<Project ToolsVersion="4.0" xmlns="http://schemas.microsoft.com/developer/msbuild/2003">
  <ItemDefinitionGroup Condition="$Condition$">
    <ClCompile>
      <AdditionalIncludeDirectories>$(MSBuildThisFileDirectory)..\..\include;%(AdditionalIncludeDirectories)</AdditionalIncludeDirectories>
      <PreprocessorDefinitions />
    </ClCompile>
  </ItemDefinitionGroup>
</Project>
"#
}

/// Every package the pipeline can produce.
pub const PACKAGE_NAMES: &[&str] = &["v8", "v8.redist", "v8.symbols", "v8.monolith"];

/// Fixture for a working directory holding a V8 checkout.
#[derive(Debug)]
pub struct V8TreeFixture {
    dir: TempDir,
}

impl V8TreeFixture {
    /// Create a checkout of V8 `major.minor.build.patch`.
    pub fn new(major: u32, minor: u32, build: u32, patch: u32) -> Self {
        let dir = TempDir::new().expect("failed to create temp dir");
        let fixture = V8TreeFixture { dir };

        fixture.write("v8/.git/HEAD", "ref: refs/heads/main\n");
        fixture.write(
            "v8/include/v8-version.h",
            &version_header(major, minor, build, patch),
        );
        fixture.write("v8/DEPS", deps_manifest());
        fixture.write("v8/build/vs_toolchain.py", "");
        fixture.write("v8/tools/clang/scripts/update.py", "");
        fixture.write("v8/buildtools/win/.keep", "");
        fixture.write("bin/gn.exe", "");

        for name in PACKAGE_NAMES {
            fixture.write(&format!("nuget/{}.nuspec", name), "<package />\n");
            fixture.write(&format!("nuget/{}.props", name), props_template());
        }
        fixture
    }

    /// Also provide the script that stamps the last change.
    pub fn with_lastchange(self) -> Self {
        self.write("v8/build/util/lastchange.py", "");
        self
    }

    /// Working directory.
    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// V8 source root.
    pub fn source_root(&self) -> PathBuf {
        self.root().join("v8")
    }

    /// Package template directory.
    pub fn package_dir(&self) -> PathBuf {
        self.root().join("nuget")
    }

    /// Fake gn executable.
    pub fn gn(&self) -> PathBuf {
        self.root().join("bin/gn.exe")
    }

    /// Write a file relative to the working directory.
    pub fn write(&self, rel: &str, contents: &str) {
        let path = self.root().join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("failed to create fixture dir");
        }
        std::fs::write(&path, contents).expect("failed to write fixture file");
    }
}

/// Write gn build metadata into `out_dir`, as `gn gen` would.
pub fn write_build_config(out_dir: &Path, json: &str) {
    std::fs::create_dir_all(out_dir).expect("failed to create out dir");
    std::fs::write(out_dir.join("v8_build_config.json"), json)
        .expect("failed to write build config");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_v8_tree_fixture_layout() {
        let fixture = V8TreeFixture::new(8, 1, 307, 31);
        assert!(fixture.source_root().join("include/v8-version.h").is_file());
        assert!(fixture.source_root().join("DEPS").is_file());
        assert!(fixture.package_dir().join("v8.monolith.props").is_file());
        assert!(!fixture.source_root().join("build/util/lastchange.py").exists());

        let fixture = fixture.with_lastchange();
        assert!(fixture.source_root().join("build/util/lastchange.py").is_file());
    }

    #[test]
    fn test_version_header_is_parseable() {
        let version = crate::core::version::resolve_header(&version_header(9, 4, 146, 24)).unwrap();
        assert_eq!(version.to_string(), "9.4.146.24");
    }
}
