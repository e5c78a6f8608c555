//! Artifact cache.
//!
//! Built packages are stored one directory per configuration key. The cache
//! is the only resource shared between concurrent invocations, so publishing
//! stages the package inside a temporary directory in the cache root (same
//! filesystem) and moves it into place with a single rename; a concurrent
//! reader never observes a partially-written package, and a failed publish
//! removes its staging on drop.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::core::settings::ConfigKey;
use crate::util::fs::{
    copy_dir_all, ensure_dir, publish_dir, read_to_string, remove_dir_all_if_exists,
    write_string,
};

/// Sidecar metadata stored next to each cached package.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    /// `name/version` of the recipe that produced the package
    pub recipe_id: String,

    /// Full configuration key
    pub key: String,

    /// Resolved dependency ids, in specifier order
    pub dependencies: Vec<String>,
}

/// Configuration-key-addressed package store.
#[derive(Debug)]
pub struct PackageCache {
    root: PathBuf,
}

impl PackageCache {
    pub fn new(root: PathBuf) -> Self {
        PackageCache { root }
    }

    /// The platform cache location (`~/.cache/slipway` on Linux).
    pub fn default_root() -> Result<PathBuf> {
        let dirs = directories::ProjectDirs::from("", "", "slipway")
            .context("could not determine a cache directory for this platform")?;
        Ok(dirs.cache_dir().join("packages"))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn slot(&self, key: &ConfigKey) -> PathBuf {
        self.root.join(key.as_str())
    }

    fn entry_path(&self, key: &ConfigKey) -> PathBuf {
        self.root.join(format!("{}.json", key.as_str()))
    }

    /// Look up a published package for this key.
    ///
    /// Only packages with their sidecar entry present count as hits; a slot
    /// directory alone is not trusted.
    pub fn lookup(&self, key: &ConfigKey) -> Option<PathBuf> {
        let slot = self.slot(key);
        if slot.is_dir() && self.entry_path(key).is_file() {
            Some(slot)
        } else {
            None
        }
    }

    /// Load the sidecar entry for a key, if cached.
    pub fn entry(&self, key: &ConfigKey) -> Result<Option<CacheEntry>> {
        let path = self.entry_path(key);
        if !path.is_file() {
            return Ok(None);
        }
        let content = read_to_string(&path)?;
        let entry = serde_json::from_str(&content)
            .with_context(|| format!("corrupt cache entry: {}", path.display()))?;
        Ok(Some(entry))
    }

    /// Atomically publish an assembled package under this key.
    ///
    /// Returns the final cached package path. The sidecar entry is written
    /// only after the rename, so a crash mid-publish leaves no visible hit.
    pub fn publish(
        &self,
        key: &ConfigKey,
        package_dir: &Path,
        entry: &CacheEntry,
    ) -> Result<PathBuf> {
        ensure_dir(&self.root)?;

        let staging = tempfile::TempDir::new_in(&self.root)
            .context("failed to create cache staging directory")?;
        let staged = staging.path().join("package");
        copy_dir_all(package_dir, &staged)?;

        let slot = self.slot(key);
        publish_dir(&staged, &slot)?;

        let json = serde_json::to_string_pretty(entry)?;
        write_string(&self.entry_path(key), &json)?;

        tracing::info!("published {} as {}", entry.recipe_id, key);
        Ok(slot)
    }

    /// Drop every cached package.
    pub fn clean(&self) -> Result<()> {
        remove_dir_all_if_exists(&self.root)
    }
}
