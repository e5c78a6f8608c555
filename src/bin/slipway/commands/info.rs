//! `slipway info` command

use anyhow::{bail, Result};

use slipway::core::Recipe;
use slipway::package::ConsumerManifest;
use slipway::repository::FileIndex;
use slipway::resolve;

use crate::cli::InfoArgs;
use crate::commands::{open_cache, parse_options, settings_from};

pub fn execute(args: InfoArgs) -> Result<()> {
    let recipe = Recipe::load(&args.recipe)?;
    let index = FileIndex::load(&args.index)?;
    let cache = open_cache(&args.cache_dir)?;

    let resolved = resolve(&index, recipe.requires())?;
    let config = recipe.canonicalize(settings_from(&args.config)?, &parse_options(&args.config.options)?)?;
    let key = config.key(&recipe.id(), &resolved);

    let Some(package_dir) = cache.lookup(&key) else {
        bail!(
            "no cached package for {} with key {}\n\
             run `slipway create` first",
            recipe.id(),
            key
        );
    };

    let manifest = ConsumerManifest::load(&package_dir)?;

    println!("{} ({})", recipe.id(), key);
    println!("  package: {}", package_dir.display());
    println!("  libs (link order):");
    for lib in &manifest.libs {
        println!("    {}", lib);
    }
    if !manifest.defines.is_empty() {
        println!("  defines: {}", manifest.defines.join(", "));
    }

    Ok(())
}
