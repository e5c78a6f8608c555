//! Repository index access.
//!
//! The repository is an external collaborator holding published packages.
//! This module only models the read-only index query the resolver needs:
//! which versions of a package exist in a channel, and under which content
//! reference. Transport (local file vs. remote) is behind the
//! [`RepositoryIndex`] trait.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use semver::Version;
use serde::Deserialize;

use crate::util::fs::read_to_string;
use crate::util::hash::sha256_str;

/// One published version of a package within a channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    /// Published version
    pub version: Version,

    /// Content digest of the published package
    pub reference: String,
}

/// Read-only view of the package repository's index.
pub trait RepositoryIndex {
    /// All published versions of `name` in `channel`.
    ///
    /// Returns `None` when the channel does not exist for that package,
    /// which is distinct from an existing channel with no satisfying
    /// version.
    fn lookup_versions(&self, name: &str, channel: &str) -> Option<Vec<IndexEntry>>;
}

/// Raw entry in an index file.
#[derive(Debug, Deserialize)]
struct RawVersion {
    version: String,
    #[serde(default)]
    reference: Option<String>,
}

/// Raw per-channel package record in an index file.
#[derive(Debug, Deserialize)]
struct RawPackage {
    name: String,
    channel: String,
    versions: Vec<RawVersion>,
}

#[derive(Debug, Deserialize)]
struct RawIndex {
    #[serde(default)]
    packages: Vec<RawPackage>,
}

/// A repository index backed by a local TOML file.
///
/// ```toml
/// [[packages]]
/// name = "libpng"
/// channel = "stable"
/// versions = [
///     { version = "1.2.0" },
///     { version = "1.6.37", reference = "9f3c..." },
/// ]
/// ```
#[derive(Debug, Default)]
pub struct FileIndex {
    packages: HashMap<(String, String), Vec<IndexEntry>>,
}

impl FileIndex {
    /// Load an index from a TOML file.
    pub fn load(path: &Path) -> Result<FileIndex> {
        let content = read_to_string(path)?;
        FileIndex::parse(&content)
            .with_context(|| format!("failed to load repository index: {}", path.display()))
    }

    /// Parse an index from TOML source.
    pub fn parse(content: &str) -> Result<FileIndex> {
        let raw: RawIndex = toml::from_str(content).context("invalid index TOML")?;

        let mut packages: HashMap<(String, String), Vec<IndexEntry>> = HashMap::new();
        for pkg in raw.packages {
            let slot = packages
                .entry((pkg.name.clone(), pkg.channel.clone()))
                .or_default();

            for v in pkg.versions {
                let version: Version = v.version.parse().with_context(|| {
                    format!("invalid version `{}` for `{}`", v.version, pkg.name)
                })?;

                // Handwritten index files may omit the reference; derive a
                // stable one from the identity so keys stay deterministic.
                let reference = v.reference.unwrap_or_else(|| {
                    sha256_str(&format!("{}/{}@{}", pkg.name, version, pkg.channel))
                        [..16]
                        .to_string()
                });

                slot.push(IndexEntry { version, reference });
            }
        }

        Ok(FileIndex { packages })
    }
}

impl RepositoryIndex for FileIndex {
    fn lookup_versions(&self, name: &str, channel: &str) -> Option<Vec<IndexEntry>> {
        self.packages
            .get(&(name.to_string(), channel.to_string()))
            .cloned()
    }
}

/// An in-memory index, used by tests and by callers that assemble an index
/// programmatically.
#[derive(Debug, Default)]
pub struct MemoryIndex {
    packages: HashMap<(String, String), Vec<IndexEntry>>,
}

impl MemoryIndex {
    pub fn new() -> Self {
        MemoryIndex::default()
    }

    /// Publish a version into a channel.
    pub fn publish(&mut self, name: &str, channel: &str, version: Version) -> &mut Self {
        let reference =
            sha256_str(&format!("{}/{}@{}", name, version, channel))[..16].to_string();
        self.packages
            .entry((name.to_string(), channel.to_string()))
            .or_default()
            .push(IndexEntry { version, reference });
        self
    }
}

impl RepositoryIndex for MemoryIndex {
    fn lookup_versions(&self, name: &str, channel: &str) -> Option<Vec<IndexEntry>> {
        self.packages
            .get(&(name.to_string(), channel.to_string()))
            .cloned()
    }
}
