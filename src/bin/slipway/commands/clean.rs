//! `slipway clean` command

use anyhow::Result;

use crate::cli::CleanArgs;
use crate::commands::open_cache;

pub fn execute(args: CleanArgs) -> Result<()> {
    let cache = open_cache(&args.cache_dir)?;
    cache.clean()?;
    println!("removed {}", cache.root().display());
    Ok(())
}
