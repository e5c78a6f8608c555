//! Slipway - a recipe-driven build orchestrator for native libraries
//!
//! This crate provides the core library functionality for slipway:
//! evaluating declarative recipes, resolving their dependency specifiers
//! against a repository index, driving the external build tool, and
//! assembling packages with consumer-facing metadata.

pub mod builder;
pub mod cache;
pub mod core;
pub mod ops;
pub mod package;
pub mod repository;
pub mod resolver;
pub mod util;

/// Test utilities and mocks for slipway unit tests.
///
/// This module is only available when compiling with `--cfg test`. It
/// provides a recording build tool so tests never shell out.
#[cfg(test)]
pub mod test_support;

pub use core::{
    BuildConfiguration, ConfigKey, DependencySpecifier, OptionValue, Recipe,
    ResolvedDependency, Settings,
};

pub use builder::{BuildDriver, BuildTool, CMakeTool};
pub use cache::PackageCache;
pub use package::ConsumerManifest;
pub use resolver::{resolve, ResolveError};
