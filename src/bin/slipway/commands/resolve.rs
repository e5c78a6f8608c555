//! `slipway resolve` command

use anyhow::{Context, Result};

use slipway::core::Recipe;
use slipway::repository::FileIndex;
use slipway::resolve;

use crate::cli::ResolveArgs;

pub fn execute(args: ResolveArgs) -> Result<()> {
    let recipe = Recipe::load(&args.recipe)?;
    let index = FileIndex::load(&args.index)?;

    let resolved = resolve(&index, recipe.requires())
        .with_context(|| format!("failed to resolve dependencies of {}", recipe.id()))?;

    if resolved.is_empty() {
        println!("{} has no dependencies", recipe.id());
        return Ok(());
    }

    println!("{} resolves to:", recipe.id());
    for (spec, dep) in recipe.requires().iter().zip(&resolved) {
        println!("  {} -> {}", spec, dep);
    }

    Ok(())
}
