//! Dependency specifiers.
//!
//! A specifier names a dependency as `name/range@channel`, e.g.
//! `libjpeg-turbo/>=1.5.0@stable`. Resolution binds it to exactly one
//! concrete version published in that channel.

use std::fmt;
use std::str::FromStr;

use semver::Version;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error parsing a dependency specifier.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SpecifierError {
    #[error("malformed specifier `{0}`, expected `name/range@channel`")]
    Malformed(String),

    #[error("invalid version `{version}` in specifier `{specifier}`")]
    InvalidVersion { specifier: String, version: String },

    #[error("empty channel in specifier `{0}`")]
    EmptyChannel(String),
}

/// A version range as it appears in a specifier.
///
/// Narrower than semver requirement syntax on purpose: recipes only ever
/// express `>=X.Y.Z`, `>X.Y.Z`, or an exact version. A bare `X.Y.Z` means
/// exactly that version, not a caret range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionRange {
    Exact(Version),
    Greater(Version),
    GreaterEq(Version),
}

impl VersionRange {
    /// Check whether a concrete version satisfies this range.
    pub fn matches(&self, version: &Version) -> bool {
        match self {
            VersionRange::Exact(v) => version == v,
            VersionRange::Greater(v) => version > v,
            VersionRange::GreaterEq(v) => version >= v,
        }
    }
}

impl FromStr for VersionRange {
    type Err = semver::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(rest) = s.strip_prefix(">=") {
            Ok(VersionRange::GreaterEq(rest.trim().parse()?))
        } else if let Some(rest) = s.strip_prefix('>') {
            Ok(VersionRange::Greater(rest.trim().parse()?))
        } else {
            Ok(VersionRange::Exact(s.trim().parse()?))
        }
    }
}

impl fmt::Display for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VersionRange::Exact(v) => write!(f, "{}", v),
            VersionRange::Greater(v) => write!(f, ">{}", v),
            VersionRange::GreaterEq(v) => write!(f, ">={}", v),
        }
    }
}

/// A parsed dependency specifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencySpecifier {
    name: String,
    range: VersionRange,
    channel: String,
}

impl DependencySpecifier {
    /// Create a specifier from its parts.
    pub fn new(name: impl Into<String>, range: VersionRange, channel: impl Into<String>) -> Self {
        DependencySpecifier {
            name: name.into(),
            range,
            channel: channel.into(),
        }
    }

    /// Get the package name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the version range.
    pub fn range(&self) -> &VersionRange {
        &self.range
    }

    /// Get the channel.
    pub fn channel(&self) -> &str {
        &self.channel
    }
}

impl FromStr for DependencySpecifier {
    type Err = SpecifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (head, channel) = s
            .rsplit_once('@')
            .ok_or_else(|| SpecifierError::Malformed(s.to_string()))?;

        if channel.is_empty() {
            return Err(SpecifierError::EmptyChannel(s.to_string()));
        }

        let (name, range) = head
            .split_once('/')
            .ok_or_else(|| SpecifierError::Malformed(s.to_string()))?;

        if name.is_empty() || range.is_empty() {
            return Err(SpecifierError::Malformed(s.to_string()));
        }

        let range: VersionRange =
            range
                .parse()
                .map_err(|_| SpecifierError::InvalidVersion {
                    specifier: s.to_string(),
                    version: range.to_string(),
                })?;

        Ok(DependencySpecifier::new(name, range, channel))
    }
}

impl fmt::Display for DependencySpecifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}@{}", self.name, self.range, self.channel)
    }
}

/// A specifier bound to one concrete version in the repository index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedDependency {
    /// Package name
    pub name: String,

    /// Concrete version selected from the index
    pub version: Version,

    /// Channel the version was published in
    pub channel: String,

    /// Content digest of the published package
    pub reference: String,
}

impl ResolvedDependency {
    /// Canonical `name/version@channel` form, used in configuration keys.
    pub fn id(&self) -> String {
        format!("{}/{}@{}", self.name, self.version, self.channel)
    }
}

impl fmt::Display for ResolvedDependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}@{}", self.name, self.version, self.channel)
    }
}
