//! NuGet package generation.
//!
//! Every package ships an MSBuild property sheet template. Before packing,
//! the template is specialized for one (platform, toolset) pair: its
//! `$Condition$` slot is replaced with an MSBuild condition selecting that
//! pair, and its empty `<PreprocessorDefinitions />` slot with the defines
//! collected from the pair's builds. The specialized sheet is only needed
//! while `nuget pack` runs and is removed right after.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::core::axis::{LinkageMode, PackagePair, Platform};
use crate::core::version::Version;
use crate::util::fs::{read_to_string, write_string, TempFileGuard};
use crate::util::process::{ProcessBuilder, ProcessRunner};

/// A named placeholder in a property sheet template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    /// Condition of the sheet's item definition group
    Condition,
    /// Preprocessor defines of the compiler settings
    Defines,
}

impl Slot {
    /// Literal text the slot occupies in a template.
    pub fn marker(&self) -> &'static str {
        match self {
            Slot::Condition => "$Condition$",
            Slot::Defines => "<PreprocessorDefinitions />",
        }
    }
}

/// A property sheet template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropsTemplate {
    text: String,
}

impl PropsTemplate {
    pub fn new(text: impl Into<String>) -> Self {
        PropsTemplate { text: text.into() }
    }

    pub fn load(path: &Path) -> Result<Self> {
        Ok(Self::new(read_to_string(path)?))
    }

    pub fn has_slot(&self, slot: Slot) -> bool {
        self.text.contains(slot.marker())
    }

    /// Fill the slots.
    ///
    /// The defines slot is only replaced when `defines` is non-empty, so a
    /// pair without collected defines keeps the template's own element.
    pub fn render(&self, condition: &str, defines: &str) -> String {
        let rendered = self.text.replace(Slot::Condition.marker(), condition);
        if defines.is_empty() {
            rendered
        } else {
            rendered.replace(Slot::Defines.marker(), defines)
        }
    }
}

/// MSBuild condition selecting one platform and toolset.
pub fn build_condition(platform: Platform, toolset: &str) -> String {
    let platform_clause = match platform.legacy_alias() {
        Some(alias) => format!(
            "('$(Platform)' == '{}' Or '$(Platform)' == '{}')",
            platform, alias
        ),
        None => format!("'$(Platform)' == '{}'", platform),
    };
    format!(
        "'$(PlatformToolset)' == '{}' And {}",
        toolset, platform_clause
    )
}

/// The data one package of a pair is rendered from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageDescriptor {
    /// Package name, e.g. `v8.redist`
    pub name: String,

    /// MSBuild condition for the pair
    pub condition: String,

    /// Per-configuration define fragments, concatenated
    pub defines: String,
}

impl PackageDescriptor {
    /// Descriptors of every package of `pair`.
    pub fn for_pair(pair: PackagePair, toolset: &str, defines: &str) -> Vec<Self> {
        let condition = build_condition(pair.platform, toolset);
        pair.linkage
            .packages()
            .iter()
            .map(|name| PackageDescriptor {
                name: name.to_string(),
                condition: condition.clone(),
                defines: defines.to_string(),
            })
            .collect()
    }
}

/// Renders property sheets and runs `nuget pack`.
pub struct PackageGenerator<'a> {
    runner: &'a dyn ProcessRunner,

    /// nuget executable
    pub nuget: PathBuf,

    /// Directory holding `<name>.nuspec` and `<name>.props`
    pub package_dir: PathBuf,

    /// Directory packages are written to
    pub output_dir: PathBuf,

    /// Canonical V8 version, used as the package version
    pub version: Version,

    /// Version token the tree was fetched at
    pub version_token: String,

    /// Resolved toolset id
    pub toolset: String,
}

impl<'a> PackageGenerator<'a> {
    pub fn new(
        runner: &'a dyn ProcessRunner,
        package_dir: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
        version: Version,
        version_token: impl Into<String>,
        toolset: impl Into<String>,
    ) -> Self {
        PackageGenerator {
            runner,
            nuget: PathBuf::from("nuget"),
            package_dir: package_dir.into(),
            output_dir: output_dir.into(),
            version,
            version_token: version_token.into(),
            toolset: toolset.into(),
        }
    }

    pub fn with_nuget(mut self, nuget: impl Into<PathBuf>) -> Self {
        self.nuget = nuget.into();
        self
    }

    /// Location of the rendered property sheet of a package.
    pub fn rendered_path(&self, name: &str, platform: Platform) -> PathBuf {
        self.package_dir
            .join(format!("{}-{}-{}.props", name, self.toolset, platform))
    }

    /// `nuget pack` command line for one package.
    pub fn pack_command(&self, name: &str, platform: Platform) -> ProcessBuilder {
        ProcessBuilder::new(&self.nuget)
            .arg("pack")
            .arg(format!("{}.nuspec", name))
            .arg("-NoPackageAnalysis")
            .arg("-Version")
            .arg(self.version.to_string())
            .arg("-Properties")
            .arg(format!(
                "Platform={};PlatformToolset={};BuildVersion={}",
                platform, self.toolset, self.version_token
            ))
            .arg("-OutputDirectory")
            .arg(&self.output_dir)
            .cwd(&self.package_dir)
    }

    /// Render and pack every package of `pair`.
    pub fn package_pair(&self, pair: PackagePair, defines: &str) -> Result<Vec<String>> {
        let descriptors = PackageDescriptor::for_pair(pair, &self.toolset, defines);
        let mut packed = Vec::with_capacity(descriptors.len());
        for descriptor in &descriptors {
            self.package(descriptor, pair.platform)?;
            packed.push(descriptor.name.clone());
        }
        Ok(packed)
    }

    /// Render and pack one package.
    pub fn package(&self, descriptor: &PackageDescriptor, platform: Platform) -> Result<()> {
        let template_path = self.package_dir.join(format!("{}.props", descriptor.name));
        let template = PropsTemplate::load(&template_path)?;
        if !template.has_slot(Slot::Condition) {
            tracing::warn!(
                "{} has no {} slot",
                template_path.display(),
                Slot::Condition.marker()
            );
        }

        let rendered = template.render(&descriptor.condition, &descriptor.defines);
        let rendered_path = self.rendered_path(&descriptor.name, platform);
        // Armed first so a partial write is removed too.
        let _rendered = TempFileGuard::new(&rendered_path);
        write_string(&rendered_path, &rendered)?;

        tracing::info!(
            "NuGet pack {}.nuspec for V8 {} {} {}",
            descriptor.name,
            self.version,
            self.toolset,
            platform
        );
        self.runner
            .run_checked("nuget pack", &self.pack_command(&descriptor.name, platform))
            .with_context(|| format!("failed to pack {} for {}", descriptor.name, platform))
    }
}

/// Packages produced for a linkage mode, for display.
pub fn package_names(linkage: LinkageMode) -> String {
    linkage.packages().join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{MockExecutor, MockProcessOutput};
    use tempfile::TempDir;

    const TEMPLATE: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<Project ToolsVersion="4.0" xmlns="http://schemas.microsoft.com/developer/msbuild/2003">
  <ItemDefinitionGroup Condition="$Condition$">
    <ClCompile>
      <PreprocessorDefinitions />
    </ClCompile>
  </ItemDefinitionGroup>
</Project>
"#;

    #[test]
    fn test_condition_x86_matches_legacy_alias() {
        assert_eq!(
            build_condition(Platform::X86, "v141"),
            "'$(PlatformToolset)' == 'v141' And ('$(Platform)' == 'x86' Or '$(Platform)' == 'Win32')"
        );
    }

    #[test]
    fn test_condition_x64() {
        assert_eq!(
            build_condition(Platform::X64, "v143"),
            "'$(PlatformToolset)' == 'v143' And '$(Platform)' == 'x64'"
        );
    }

    #[test]
    fn test_render_fills_slots() {
        let template = PropsTemplate::new(TEMPLATE);
        let rendered = template.render("COND", "DEFS");
        assert!(rendered.contains("Condition=\"COND\""));
        assert!(rendered.contains("DEFS"));
        assert!(!rendered.contains("<PreprocessorDefinitions />"));
    }

    #[test]
    fn test_render_keeps_default_defines_when_empty() {
        let template = PropsTemplate::new(TEMPLATE);
        let rendered = template.render("COND", "");
        assert!(rendered.contains("<PreprocessorDefinitions />"));
        assert!(!rendered.contains("$Condition$"));
    }

    #[test]
    fn test_descriptors_for_pair() {
        let pair = PackagePair {
            platform: Platform::X64,
            linkage: LinkageMode::Shared,
        };
        let descriptors = PackageDescriptor::for_pair(pair, "v142", "D");
        let names: Vec<_> = descriptors.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["v8", "v8.redist", "v8.symbols"]);
        assert!(descriptors.iter().all(|d| d.defines == "D"));
    }

    fn generator<'a>(exec: &'a MockExecutor, dir: &Path) -> PackageGenerator<'a> {
        PackageGenerator::new(
            exec,
            dir.join("nuget"),
            dir.join("dist"),
            Version::new(8, 1, 307, 31),
            "8.1-lkgr",
            "v141",
        )
    }

    fn write_templates(dir: &Path) {
        for name in ["v8", "v8.redist", "v8.symbols", "v8.monolith"] {
            write_string(&dir.join("nuget").join(format!("{}.props", name)), TEMPLATE).unwrap();
        }
    }

    #[test]
    fn test_package_pair_packs_and_cleans_up() {
        let tmp = TempDir::new().unwrap();
        write_templates(tmp.path());

        let exec = MockExecutor::new();
        let rendered = tmp.path().join("nuget/v8.monolith-v141-x86.props");
        let seen = rendered.clone();
        exec.on_prefix("nuget pack", move |_| {
            let text = std::fs::read_to_string(&seen).unwrap();
            assert!(text.contains("'$(Platform)' == 'Win32'"));
            assert!(text.contains("V8_ENABLE_CHECKS"));
            MockProcessOutput::success("")
        });

        let pair = PackagePair {
            platform: Platform::X86,
            linkage: LinkageMode::Monolith,
        };
        let packed = generator(&exec, tmp.path())
            .package_pair(pair, "<PreprocessorDefinitions>V8_ENABLE_CHECKS</PreprocessorDefinitions>")
            .unwrap();

        assert_eq!(packed, vec!["v8.monolith"]);
        assert!(!rendered.exists());

        let calls = exec.calls();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].starts_with("nuget pack v8.monolith.nuspec -NoPackageAnalysis -Version 8.1.307.31"));
        assert!(calls[0].contains("-Properties Platform=x86;PlatformToolset=v141;BuildVersion=8.1-lkgr"));
        assert!(calls[0].contains("-OutputDirectory"));
    }

    #[test]
    fn test_package_failure_still_removes_rendered_file() {
        let tmp = TempDir::new().unwrap();
        write_templates(tmp.path());

        let exec = MockExecutor::new();
        exec.expect_prefix("nuget pack", MockProcessOutput::failure(1, "bad nuspec"));

        let pair = PackagePair {
            platform: Platform::X64,
            linkage: LinkageMode::Shared,
        };
        let err = generator(&exec, tmp.path()).package_pair(pair, "").unwrap_err();

        assert!(format!("{:#}", err).contains("failed to pack v8 for x64"));
        assert!(!tmp.path().join("nuget/v8-v141-x64.props").exists());
        // Aborts at the first failing package.
        assert_eq!(exec.calls().len(), 1);
    }

    #[test]
    fn test_package_requires_template() {
        let tmp = TempDir::new().unwrap();
        let exec = MockExecutor::new();
        let pair = PackagePair {
            platform: Platform::X64,
            linkage: LinkageMode::Monolith,
        };
        assert!(generator(&exec, tmp.path()).package_pair(pair, "").is_err());
        assert!(exec.calls().is_empty());
    }

    #[test]
    fn test_package_names() {
        assert_eq!(package_names(LinkageMode::Shared), "v8, v8.redist, v8.symbols");
    }
}
