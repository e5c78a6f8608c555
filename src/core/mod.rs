//! Core data model for slipway.
//!
//! This module contains the foundational types used throughout slipway:
//! - Recipes and their declared options
//! - Dependency specifiers and resolved dependencies
//! - Build settings and the canonical configuration key

pub mod recipe;
pub mod settings;
pub mod specifier;

pub use recipe::{OptionDecl, PackageInfo, Recipe};
pub use settings::{
    BuildConfiguration, BuildType, ConfigKey, InvalidOption, OptionValue, Settings,
};
pub use specifier::{DependencySpecifier, ResolvedDependency, SpecifierError, VersionRange};
