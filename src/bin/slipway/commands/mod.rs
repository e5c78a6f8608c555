//! Subcommand implementations.

pub mod clean;
pub mod completions;
pub mod create;
pub mod info;
pub mod resolve;

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use slipway::core::settings::{BuildType, OptionValue, Settings};
use slipway::PackageCache;

use crate::cli::ConfigFlags;

/// Build the invocation settings from host defaults plus CLI overrides.
pub fn settings_from(flags: &ConfigFlags) -> Result<Settings> {
    let mut settings = Settings::host();

    if let Some(ref bt) = flags.build_type {
        settings.build_type = bt
            .parse::<BuildType>()
            .map_err(|e| anyhow::anyhow!(e))
            .context("invalid --build-type")?;
    }
    if let Some(ref os) = flags.os {
        settings.os = os.clone();
    }
    if let Some(ref compiler) = flags.compiler {
        settings.compiler = compiler.clone();
    }
    if let Some(ref arch) = flags.arch {
        settings.arch = arch.clone();
    }

    Ok(settings)
}

/// Parse repeated `-o name=value` flags into option overrides.
pub fn parse_options(raw: &[String]) -> Result<BTreeMap<String, OptionValue>> {
    let mut options = BTreeMap::new();

    for item in raw {
        let Some((name, value)) = item.split_once('=') else {
            bail!("invalid option `{}`, expected `name=value`", item);
        };
        options.insert(name.to_string(), OptionValue::parse(value));
    }

    Ok(options)
}

/// Open the package cache at the chosen or default location.
pub fn open_cache(cache_dir: &Option<PathBuf>) -> Result<PackageCache> {
    let root = match cache_dir {
        Some(dir) => dir.clone(),
        None => PackageCache::default_root()?,
    };
    Ok(PackageCache::new(root))
}
