//! Implementation of `slipway create`.
//!
//! The orchestrator sequences the fixed build lifecycle as an explicit
//! pipeline of stage calls over immutable data: resolve dependencies,
//! canonicalize the configuration, check the cache, and only on a miss
//! export sources, drive the build, assemble the package, emit the
//! manifest, and publish. A fatal stage error aborts the remainder and is
//! surfaced with its original type intact, so callers can still downcast to
//! the component error.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::builder::{BuildDriver, BuildTool};
use crate::cache::{CacheEntry, PackageCache};
use crate::core::recipe::Recipe;
use crate::core::settings::{ConfigKey, OptionValue, Settings};
use crate::core::specifier::ResolvedDependency;
use crate::package::assemble::copy_matching;
use crate::package::manifest::ConsumerManifest;
use crate::package::{assemble, emit, CopyRule};
use crate::repository::RepositoryIndex;
use crate::resolver::resolve;
use crate::util::fs::{ensure_dir, remove_dir_all_if_exists, write_string};

/// Options for the create operation.
#[derive(Debug, Clone, Default)]
pub struct CreateOptions {
    /// Build-matrix settings for this invocation
    pub settings: Settings,

    /// Explicit option overrides (defaults applied for the rest)
    pub options: BTreeMap<String, OptionValue>,

    /// Build even when the cache already holds this key
    pub force_build: bool,
}

/// Result of a create operation.
#[derive(Debug)]
pub struct CreateOutcome {
    pub key: ConfigKey,
    pub package_dir: PathBuf,
    pub manifest: ConsumerManifest,
    pub dependencies: Vec<ResolvedDependency>,

    /// True when the package came from the cache without building
    pub cached: bool,
}

/// Run the full recipe lifecycle and return the published package.
#[allow(clippy::too_many_arguments)]
pub fn create(
    recipe: &Recipe,
    recipe_dir: &Path,
    index: &dyn RepositoryIndex,
    tool: &mut dyn BuildTool,
    cache: &PackageCache,
    work_dir: &Path,
    opts: &CreateOptions,
) -> Result<CreateOutcome> {
    let dependencies = resolve(index, recipe.requires())?;
    tracing::info!(
        "resolved {} dependenc{} for {}",
        dependencies.len(),
        if dependencies.len() == 1 { "y" } else { "ies" },
        recipe.id()
    );

    let config = recipe.canonicalize(opts.settings.clone(), &opts.options)?;
    let key = config.key(&recipe.id(), &dependencies);
    tracing::debug!("configuration key {}", key);

    if !opts.force_build {
        if let Some(package_dir) = cache.lookup(&key) {
            tracing::info!("cache hit for {}, skipping build", key);
            let manifest = ConsumerManifest::load(&package_dir)?;
            return Ok(CreateOutcome {
                key,
                package_dir,
                manifest,
                dependencies,
                cached: true,
            });
        }
    }

    // Scratch layout for this invocation, scoped to the configuration key
    let work = work_dir.join(key.short());
    remove_dir_all_if_exists(&work)?;
    let source_dir = export_sources(recipe, recipe_dir, &work)?;
    let build_dir = work.join("build");
    let staging_dir = work.join("staging");
    let package_dir = work.join("package");

    ensure_dir(&build_dir)?;
    write_dependency_snippet(&build_dir, &dependencies)?;

    let mut driver = BuildDriver::new();
    let staging = driver.run(tool, &config, &source_dir, &build_dir, &staging_dir)?;

    let package = assemble(staging.dir(), &source_dir, recipe.copy_rules(), &package_dir)?;
    let manifest = emit(recipe, package.dir())?;

    let entry = CacheEntry {
        recipe_id: recipe.id(),
        key: key.as_str().to_string(),
        dependencies: dependencies.iter().map(|d| d.id()).collect(),
    };
    let published = cache.publish(&key, package.dir(), &entry)?;

    Ok(CreateOutcome {
        key,
        package_dir: published,
        manifest,
        dependencies,
        cached: false,
    })
}

/// Snapshot the recipe's exported sources into the work directory.
///
/// With no export patterns the recipe directory itself is the source tree.
fn export_sources(recipe: &Recipe, recipe_dir: &Path, work: &Path) -> Result<PathBuf> {
    if recipe.exports().is_empty() {
        return Ok(recipe_dir.to_path_buf());
    }

    let source_dir = work.join("source");
    ensure_dir(&source_dir)?;

    for pattern in recipe.exports() {
        let rule = CopyRule::exporting(pattern);
        let copied = copy_matching(recipe_dir, &rule, &source_dir)?;
        tracing::debug!("exported {} file(s) for `{}`", copied.len(), pattern);
    }

    Ok(source_dir)
}

/// Write the resolved-dependency snippet consumed by the native build.
fn write_dependency_snippet(build_dir: &Path, deps: &[ResolvedDependency]) -> Result<()> {
    let mut out = String::from("# Generated by slipway; do not edit.\n");

    let ids: Vec<String> = deps.iter().map(|d| d.id()).collect();
    out.push_str(&format!("set(SLIPWAY_DEPENDENCIES \"{}\")\n", ids.join(";")));

    for dep in deps {
        let var = dep
            .name
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_uppercase() } else { '_' })
            .collect::<String>();
        out.push_str(&format!(
            "set(SLIPWAY_DEP_{}_VERSION \"{}\")\n",
            var, dep.version
        ));
    }

    write_string(&build_dir.join("slipway_deps.cmake"), &out)
        .context("failed to write dependency snippet")
}
