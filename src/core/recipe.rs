//! Slipway.toml recipe parsing and schema.
//!
//! The recipe is the declarative description of a package: identity,
//! dependency specifiers, build options, exported sources, copy rules, and
//! the consumer-facing package info. Immutable once loaded.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{bail, Context, Result};
use semver::Version;
use serde::Deserialize;

use crate::core::settings::{
    BuildConfiguration, InvalidOption, OptionValue, Settings,
};
use crate::core::specifier::DependencySpecifier;
use crate::package::CopyRule;
use crate::util::fs::read_to_string;

/// Declared domain and default for one recipe option.
#[derive(Debug, Clone, Deserialize)]
pub struct OptionDecl {
    /// Allowed values
    pub values: Vec<OptionValue>,

    /// Value applied when the option is not explicitly set
    pub default: OptionValue,
}

/// Consumer-facing metadata declared by the recipe.
///
/// `libs` order is significant: it is the link order downstream consumers
/// must use, preserved verbatim.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PackageInfo {
    #[serde(default)]
    pub libs: Vec<String>,

    /// Preprocessor definitions consumers must set
    #[serde(default)]
    pub defines: Vec<String>,
}

/// Raw `[recipe]` section.
#[derive(Debug, Deserialize)]
struct RecipeSection {
    name: String,
    version: String,
    #[serde(default)]
    license: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    description: String,
    #[serde(default = "default_settings")]
    settings: Vec<String>,
    #[serde(default)]
    requires: Vec<String>,
    #[serde(default)]
    exports: Vec<String>,
}

fn default_settings() -> Vec<String> {
    ["os", "compiler", "build_type", "arch"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// Raw `[package]` section.
#[derive(Debug, Default, Deserialize)]
struct PackageSection {
    #[serde(default)]
    copy: Vec<CopyRule>,
}

/// The raw recipe file as serde sees it.
#[derive(Debug, Deserialize)]
struct RecipeFile {
    recipe: RecipeSection,
    #[serde(default)]
    options: BTreeMap<String, OptionDecl>,
    #[serde(default)]
    package: PackageSection,
    #[serde(default, rename = "package-info")]
    package_info: PackageInfo,
}

/// A parsed and validated recipe.
#[derive(Debug, Clone)]
pub struct Recipe {
    name: String,
    version: Version,
    license: String,
    url: String,
    description: String,
    settings: Vec<String>,
    options: BTreeMap<String, OptionDecl>,
    requires: Vec<DependencySpecifier>,
    exports: Vec<String>,
    copy_rules: Vec<CopyRule>,
    package_info: PackageInfo,
}

impl Recipe {
    /// Load and validate a recipe from a `Slipway.toml` file.
    pub fn load(path: &Path) -> Result<Recipe> {
        let content = read_to_string(path)?;
        Recipe::parse(&content)
            .with_context(|| format!("failed to load recipe: {}", path.display()))
    }

    /// Parse and validate a recipe from TOML source.
    pub fn parse(content: &str) -> Result<Recipe> {
        let raw: RecipeFile = toml::from_str(content).context("invalid recipe TOML")?;

        let version = parse_version_lenient(&raw.recipe.version).with_context(|| {
            format!("invalid recipe version `{}`", raw.recipe.version)
        })?;

        let mut requires = Vec::with_capacity(raw.recipe.requires.len());
        for spec in &raw.recipe.requires {
            let spec: DependencySpecifier = spec
                .parse()
                .with_context(|| format!("invalid dependency specifier `{}`", spec))?;
            requires.push(spec);
        }

        for (name, decl) in &raw.options {
            if decl.values.is_empty() {
                bail!("option `{}` declares an empty value domain", name);
            }
            if !decl.values.contains(&decl.default) {
                bail!(
                    "default `{}` for option `{}` is outside its declared values",
                    decl.default,
                    name
                );
            }
        }

        Ok(Recipe {
            name: raw.recipe.name,
            version,
            license: raw.recipe.license,
            url: raw.recipe.url,
            description: raw.recipe.description,
            settings: raw.recipe.settings,
            options: raw.options,
            requires,
            exports: raw.recipe.exports,
            copy_rules: raw.package.copy,
            package_info: raw.package_info,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &Version {
        &self.version
    }

    pub fn license(&self) -> &str {
        &self.license
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Declared settings dimension names.
    pub fn settings(&self) -> &[String] {
        &self.settings
    }

    /// Declared options with their domains and defaults.
    pub fn options(&self) -> &BTreeMap<String, OptionDecl> {
        &self.options
    }

    /// Ordered dependency specifiers.
    pub fn requires(&self) -> &[DependencySpecifier] {
        &self.requires
    }

    /// Exported source glob patterns, relative to the recipe location.
    pub fn exports(&self) -> &[String] {
        &self.exports
    }

    /// Ordered package copy rules.
    pub fn copy_rules(&self) -> &[CopyRule] {
        &self.copy_rules
    }

    pub fn package_info(&self) -> &PackageInfo {
        &self.package_info
    }

    /// Canonical `name/version` identity.
    pub fn id(&self) -> String {
        format!("{}/{}", self.name, self.version)
    }

    /// Validate option overrides against the declared domains, apply
    /// defaults for everything unset, and produce the immutable
    /// [`BuildConfiguration`] for this invocation.
    pub fn canonicalize(
        &self,
        settings: Settings,
        overrides: &BTreeMap<String, OptionValue>,
    ) -> Result<BuildConfiguration, InvalidOption> {
        for (name, value) in overrides {
            let decl = self.options.get(name).ok_or_else(|| InvalidOption::Unknown {
                name: name.clone(),
                declared: self.options.keys().cloned().collect(),
            })?;

            if !decl.values.contains(value) {
                return Err(InvalidOption::OutOfDomain {
                    name: name.clone(),
                    value: value.to_string(),
                    allowed: decl.values.iter().map(|v| v.to_string()).collect(),
                });
            }
        }

        let mut options = BTreeMap::new();
        for (name, decl) in &self.options {
            let value = overrides.get(name).cloned().unwrap_or(decl.default.clone());
            options.insert(name.clone(), value);
        }

        Ok(BuildConfiguration::new(settings, options))
    }
}

/// Parse a version string, allowing for incomplete versions.
///
/// Recipes commonly write `0.3` where semver wants `0.3.0`.
pub fn parse_version_lenient(s: &str) -> Result<Version> {
    if let Ok(v) = s.parse() {
        return Ok(v);
    }

    let parts: Vec<&str> = s.split('.').collect();
    let parsed = match parts.len() {
        1 => parts[0].parse().ok().map(|major| Version::new(major, 0, 0)),
        2 => {
            let major = parts[0].parse().ok();
            let minor = parts[1].parse().ok();
            match (major, minor) {
                (Some(major), Some(minor)) => Some(Version::new(major, minor, 0)),
                _ => None,
            }
        }
        _ => None,
    };

    parsed.ok_or_else(|| anyhow::anyhow!("`{}` is not a version", s))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SELENE: &str = r#"
        [recipe]
        name = "selene"
        version = "0.3"
        license = "MIT"
        url = "https://github.com/kmhofmann/selene"
        description = "A C++17 image representation, processing and I/O library."
        settings = ["os", "compiler", "build_type", "arch"]
        requires = [
            "libjpeg-turbo/>=1.5.0@stable",
            "libpng/>=1.2.0@stable",
            "libtiff/>=4.0.9@stable",
        ]
        exports = ["selene*", "cmake*", "CMakeLists.txt", "LICENSE"]

        [options.shared]
        values = [true, false]
        default = false

        [[package.copy]]
        pattern = "license*"
        dest = "licenses"
        ignore_case = true
        keep_path = false
        required = true

        [package-info]
        libs = [
            "selene_base",
            "selene_base_io",
            "selene_img",
            "selene_img_io",
            "selene_img_io_jpeg",
            "selene_img_io_png",
            "selene_img_io_tiff",
            "selene_img_ops",
            "selene_io",
        ]
    "#;

    #[test]
    fn test_parse_selene_recipe() {
        let recipe = Recipe::parse(SELENE).unwrap();

        assert_eq!(recipe.name(), "selene");
        assert_eq!(recipe.version(), &Version::new(0, 3, 0));
        assert_eq!(recipe.id(), "selene/0.3.0");
        assert_eq!(recipe.requires().len(), 3);
        assert_eq!(recipe.requires()[0].name(), "libjpeg-turbo");
        assert_eq!(recipe.copy_rules().len(), 1);
        assert!(recipe.copy_rules()[0].ignore_case);
        assert_eq!(recipe.package_info().libs.len(), 9);
        assert_eq!(recipe.package_info().libs[0], "selene_base");
        assert_eq!(recipe.package_info().libs[8], "selene_io");
    }

    #[test]
    fn test_canonicalize_applies_defaults() {
        let recipe = Recipe::parse(SELENE).unwrap();
        let config = recipe
            .canonicalize(Settings::host(), &BTreeMap::new())
            .unwrap();

        assert_eq!(config.bool_option("shared"), Some(false));
    }

    #[test]
    fn test_canonicalize_accepts_in_domain_override() {
        let recipe = Recipe::parse(SELENE).unwrap();

        let mut overrides = BTreeMap::new();
        overrides.insert("shared".to_string(), OptionValue::Bool(true));
        let config = recipe.canonicalize(Settings::host(), &overrides).unwrap();

        assert_eq!(config.bool_option("shared"), Some(true));
    }

    #[test]
    fn test_canonicalize_rejects_unknown_option() {
        let recipe = Recipe::parse(SELENE).unwrap();

        let mut overrides = BTreeMap::new();
        overrides.insert("fpic".to_string(), OptionValue::Bool(true));
        let err = recipe
            .canonicalize(Settings::host(), &overrides)
            .unwrap_err();

        assert!(matches!(err, InvalidOption::Unknown { .. }));
    }

    #[test]
    fn test_canonicalize_rejects_out_of_domain_value() {
        let recipe = Recipe::parse(SELENE).unwrap();

        let mut overrides = BTreeMap::new();
        overrides.insert(
            "shared".to_string(),
            OptionValue::Str("maybe".to_string()),
        );
        let err = recipe
            .canonicalize(Settings::host(), &overrides)
            .unwrap_err();

        assert!(matches!(err, InvalidOption::OutOfDomain { .. }));
    }

    #[test]
    fn test_default_must_be_in_domain() {
        let bad = r#"
            [recipe]
            name = "x"
            version = "1.0.0"

            [options.shared]
            values = [true, false]
            default = "sometimes"
        "#;
        assert!(Recipe::parse(bad).is_err());
    }

    #[test]
    fn test_parse_version_lenient() {
        assert_eq!(parse_version_lenient("1").unwrap(), Version::new(1, 0, 0));
        assert_eq!(parse_version_lenient("0.3").unwrap(), Version::new(0, 3, 0));
        assert_eq!(
            parse_version_lenient("1.2.3").unwrap(),
            Version::new(1, 2, 3)
        );
        assert!(parse_version_lenient("banana").is_err());
    }
}
