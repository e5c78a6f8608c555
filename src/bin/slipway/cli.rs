//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Slipway - a recipe-driven build orchestrator for native libraries
#[derive(Parser)]
#[command(name = "slipway")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build a recipe and publish the package to the cache
    Create(CreateArgs),

    /// Resolve a recipe's dependency specifiers and print the result
    Resolve(ResolveArgs),

    /// Show the consumer manifest of a cached package
    Info(InfoArgs),

    /// Remove all cached packages
    Clean(CleanArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Settings and option flags shared by build-facing commands.
#[derive(Args)]
pub struct ConfigFlags {
    /// Option override, `name=value` (repeatable)
    #[arg(short = 'o', long = "option", value_name = "NAME=VALUE")]
    pub options: Vec<String>,

    /// Build type (debug or release)
    #[arg(long, value_name = "TYPE")]
    pub build_type: Option<String>,

    /// Target OS setting (defaults to the host)
    #[arg(long)]
    pub os: Option<String>,

    /// Compiler setting (defaults to the host toolchain)
    #[arg(long)]
    pub compiler: Option<String>,

    /// Architecture setting (defaults to the host)
    #[arg(long)]
    pub arch: Option<String>,
}

#[derive(Args)]
pub struct CreateArgs {
    /// Path to the recipe file
    #[arg(long, default_value = "Slipway.toml")]
    pub recipe: PathBuf,

    /// Path to the repository index file
    #[arg(long, env = "SLIPWAY_INDEX")]
    pub index: PathBuf,

    #[command(flatten)]
    pub config: ConfigFlags,

    /// Cache directory (defaults to the platform cache location)
    #[arg(long, env = "SLIPWAY_CACHE")]
    pub cache_dir: Option<PathBuf>,

    /// Scratch directory for source, build, and staging trees
    #[arg(long)]
    pub work_dir: Option<PathBuf>,

    /// Extra argument passed to the CMake configure step (repeatable)
    #[arg(long = "cmake-arg", value_name = "ARG", allow_hyphen_values = true)]
    pub cmake_args: Vec<String>,

    /// Build even when a cached package exists for this configuration
    #[arg(long)]
    pub force_build: bool,
}

#[derive(Args)]
pub struct ResolveArgs {
    /// Path to the recipe file
    #[arg(long, default_value = "Slipway.toml")]
    pub recipe: PathBuf,

    /// Path to the repository index file
    #[arg(long, env = "SLIPWAY_INDEX")]
    pub index: PathBuf,
}

#[derive(Args)]
pub struct InfoArgs {
    /// Path to the recipe file
    #[arg(long, default_value = "Slipway.toml")]
    pub recipe: PathBuf,

    /// Path to the repository index file
    #[arg(long, env = "SLIPWAY_INDEX")]
    pub index: PathBuf,

    #[command(flatten)]
    pub config: ConfigFlags,

    /// Cache directory (defaults to the platform cache location)
    #[arg(long, env = "SLIPWAY_CACHE")]
    pub cache_dir: Option<PathBuf>,
}

#[derive(Args)]
pub struct CleanArgs {
    /// Cache directory (defaults to the platform cache location)
    #[arg(long, env = "SLIPWAY_CACHE")]
    pub cache_dir: Option<PathBuf>,
}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
