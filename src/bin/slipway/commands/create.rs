//! `slipway create` command

use anyhow::{Context, Result};

use slipway::cache::PackageCache;
use slipway::core::Recipe;
use slipway::ops::create::{create, CreateOptions};
use slipway::repository::FileIndex;
use slipway::CMakeTool;

use crate::cli::CreateArgs;
use crate::commands::{open_cache, parse_options, settings_from};

pub fn execute(args: CreateArgs) -> Result<()> {
    let recipe = Recipe::load(&args.recipe)?;
    let recipe_dir = args
        .recipe
        .parent()
        .map(|p| if p.as_os_str().is_empty() { ".".into() } else { p.to_path_buf() })
        .context("recipe path has no parent directory")?;

    let index = FileIndex::load(&args.index)?;
    let cache: PackageCache = open_cache(&args.cache_dir)?;

    let work_dir = args
        .work_dir
        .unwrap_or_else(|| recipe_dir.join(".slipway"));

    let opts = CreateOptions {
        settings: settings_from(&args.config)?,
        options: parse_options(&args.config.options)?,
        force_build: args.force_build,
    };

    let mut tool = CMakeTool::new()?.args(&args.cmake_args);

    let outcome = create(
        &recipe,
        &recipe_dir,
        &index,
        &mut tool,
        &cache,
        &work_dir,
        &opts,
    )?;

    if outcome.cached {
        println!(
            "{} already built for {} (cache hit)",
            recipe.id(),
            outcome.key
        );
    } else {
        println!("{} built and published as {}", recipe.id(), outcome.key);
    }
    println!("  package: {}", outcome.package_dir.display());
    for dep in &outcome.dependencies {
        println!("  requires: {}", dep);
    }
    println!("  libs: {}", outcome.manifest.libs.join(", "));

    Ok(())
}
