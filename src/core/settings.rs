//! Build settings and the canonical configuration key.
//!
//! Settings are the build-matrix dimensions (os, compiler, build type,
//! arch); options are recipe-declared knobs like `shared`. Together they
//! form a [`BuildConfiguration`], whose key identifies one build variant in
//! the artifact cache.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::specifier::ResolvedDependency;
use crate::util::hash::Fingerprint;

/// Build type dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildType {
    Debug,
    #[default]
    Release,
}

impl BuildType {
    /// The CMake spelling of this build type.
    pub fn as_cmake(&self) -> &'static str {
        match self {
            BuildType::Debug => "Debug",
            BuildType::Release => "Release",
        }
    }
}

impl FromStr for BuildType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "debug" | "Debug" => Ok(BuildType::Debug),
            "release" | "Release" => Ok(BuildType::Release),
            other => Err(format!("unknown build type `{}`", other)),
        }
    }
}

impl fmt::Display for BuildType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildType::Debug => write!(f, "debug"),
            BuildType::Release => write!(f, "release"),
        }
    }
}

/// The build-matrix settings for one invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    pub os: String,
    pub compiler: String,
    pub build_type: BuildType,
    pub arch: String,
}

impl Settings {
    /// Settings describing the host platform.
    pub fn host() -> Self {
        Settings {
            os: std::env::consts::OS.to_string(),
            compiler: default_compiler(),
            build_type: BuildType::Release,
            arch: std::env::consts::ARCH.to_string(),
        }
    }

    /// The settings as sorted `key=value` pairs.
    fn pairs(&self) -> Vec<(String, String)> {
        vec![
            ("arch".to_string(), self.arch.clone()),
            ("build_type".to_string(), self.build_type.to_string()),
            ("compiler".to_string(), self.compiler.clone()),
            ("os".to_string(), self.os.clone()),
        ]
    }
}

impl Default for Settings {
    fn default() -> Self {
        Settings::host()
    }
}

fn default_compiler() -> String {
    if cfg!(windows) {
        "msvc".to_string()
    } else if cfg!(target_os = "macos") {
        "clang".to_string()
    } else {
        "gcc".to_string()
    }
}

/// A recipe option value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    Bool(bool),
    Str(String),
}

impl OptionValue {
    /// Parse a command-line value string: `true`/`false` become booleans,
    /// anything else stays a string.
    pub fn parse(s: &str) -> Self {
        match s {
            "true" | "True" => OptionValue::Bool(true),
            "false" | "False" => OptionValue::Bool(false),
            other => OptionValue::Str(other.to_string()),
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            OptionValue::Bool(b) => Some(*b),
            OptionValue::Str(_) => None,
        }
    }
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionValue::Bool(b) => write!(f, "{}", b),
            OptionValue::Str(s) => write!(f, "{}", s),
        }
    }
}

/// An option value outside its declared domain, or an undeclared option.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InvalidOption {
    #[error("unknown option `{name}`, declared options: {declared:?}")]
    Unknown { name: String, declared: Vec<String> },

    #[error("invalid value `{value}` for option `{name}`, allowed: {allowed:?}")]
    OutOfDomain {
        name: String,
        value: String,
        allowed: Vec<String>,
    },
}

/// A fully-determined build configuration.
///
/// Immutable for the duration of one build. Option values are stored in a
/// `BTreeMap`, so the configuration key is independent of the order options
/// were supplied in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildConfiguration {
    settings: Settings,
    options: BTreeMap<String, OptionValue>,
}

impl BuildConfiguration {
    pub fn new(settings: Settings, options: BTreeMap<String, OptionValue>) -> Self {
        BuildConfiguration { settings, options }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn options(&self) -> &BTreeMap<String, OptionValue> {
        &self.options
    }

    pub fn option(&self, name: &str) -> Option<&OptionValue> {
        self.options.get(name)
    }

    /// Get a boolean option, if present and boolean.
    pub fn bool_option(&self, name: &str) -> Option<bool> {
        self.option(name).and_then(OptionValue::as_bool)
    }

    /// Compute the canonical configuration key.
    ///
    /// The key digests the recipe identity, the sorted settings and option
    /// pairs, and the sorted resolved-dependency references, so distinct
    /// dependency graphs never share a cache slot.
    pub fn key(&self, recipe_id: &str, deps: &[ResolvedDependency]) -> ConfigKey {
        let mut fp = Fingerprint::new();
        fp.update_str(recipe_id);

        for (k, v) in self.settings.pairs() {
            fp.update_str(&format!("{}={}", k, v));
        }

        for (k, v) in &self.options {
            fp.update_str(&format!("{}={}", k, v));
        }

        let mut refs: Vec<String> = deps
            .iter()
            .map(|d| format!("{}#{}", d.id(), d.reference))
            .collect();
        refs.sort();
        for r in &refs {
            fp.update_str(r);
        }

        ConfigKey(fp.finish())
    }
}

/// Canonical encoding of settings + options + dependency graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConfigKey(String);

impl ConfigKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short form for log lines and directory listings.
    pub fn short(&self) -> &str {
        &self.0[..16]
    }
}

impl fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.short())
    }
}
