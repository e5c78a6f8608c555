//! Consumer manifest emission.
//!
//! The manifest tells downstream recipes how to consume the package. It is
//! a pure function of the recipe's declared metadata: artifact names are
//! trusted as declared and their order is preserved verbatim, because it is
//! the link order for order-sensitive toolchains.

use std::path::Path;

use anyhow::{Context, Result};
use semver::Version;
use serde::{Deserialize, Serialize};

use crate::core::recipe::Recipe;
use crate::util::fs::{read_to_string, write_string};

/// Manifest file name inside an assembled package.
pub const MANIFEST_FILE: &str = "slipway-manifest.toml";

/// Consumption metadata for downstream recipes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsumerManifest {
    pub name: String,
    pub version: Version,

    /// Library artifact names, in link order
    pub libs: Vec<String>,

    /// Preprocessor definitions consumers must set
    #[serde(default)]
    pub defines: Vec<String>,
}

impl ConsumerManifest {
    /// Build the manifest from a recipe's declared package info.
    pub fn from_recipe(recipe: &Recipe) -> ConsumerManifest {
        ConsumerManifest {
            name: recipe.name().to_string(),
            version: recipe.version().clone(),
            libs: recipe.package_info().libs.clone(),
            defines: recipe.package_info().defines.clone(),
        }
    }

    /// Write the manifest into a package directory.
    pub fn write(&self, package_dir: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("failed to serialize manifest")?;
        write_string(&package_dir.join(MANIFEST_FILE), &content)
    }

    /// Load the manifest from a package directory.
    pub fn load(package_dir: &Path) -> Result<ConsumerManifest> {
        let path = package_dir.join(MANIFEST_FILE);
        let content = read_to_string(&path)?;
        toml::from_str(&content)
            .with_context(|| format!("invalid manifest: {}", path.display()))
    }
}

/// Emit the consumer manifest into an assembled package.
pub fn emit(recipe: &Recipe, package_dir: &Path) -> Result<ConsumerManifest> {
    let manifest = ConsumerManifest::from_recipe(recipe);
    manifest.write(package_dir)?;
    tracing::debug!(
        "emitted manifest for {} with {} lib(s)",
        recipe.id(),
        manifest.libs.len()
    );
    Ok(manifest)
}
