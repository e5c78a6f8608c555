//! Dependency resolution.
//!
//! The resolver is pure and deterministic: all I/O lives behind the
//! [`RepositoryIndex`] collaborator, and each specifier is bound
//! independently to the highest published version satisfying its range.
//! Versions are unique per channel, so ties cannot occur, and channels never
//! cross: a specifier's channel is always disambiguating.

use thiserror::Error;

use crate::core::specifier::{DependencySpecifier, ResolvedDependency};
use crate::repository::RepositoryIndex;

/// Error during dependency resolution.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The channel exists but no published version satisfies the range.
    #[error("no version of `{name}` in channel `{channel}` satisfies `{range}`")]
    UnresolvedDependency {
        name: String,
        range: String,
        channel: String,
        available: Vec<String>,
    },

    /// The package has no such channel in the index.
    #[error("no channel `{channel}` for package `{name}` in the index")]
    AmbiguousChannel { name: String, channel: String },
}

/// Resolve every specifier to exactly one concrete dependency.
///
/// Output order matches the input specifier order. Fails on the first
/// specifier that cannot be bound; resolution is all-or-nothing.
pub fn resolve(
    index: &dyn RepositoryIndex,
    specifiers: &[DependencySpecifier],
) -> Result<Vec<ResolvedDependency>, ResolveError> {
    let mut resolved = Vec::with_capacity(specifiers.len());

    for spec in specifiers {
        resolved.push(resolve_one(index, spec)?);
    }

    Ok(resolved)
}

fn resolve_one(
    index: &dyn RepositoryIndex,
    spec: &DependencySpecifier,
) -> Result<ResolvedDependency, ResolveError> {
    let entries = index
        .lookup_versions(spec.name(), spec.channel())
        .ok_or_else(|| ResolveError::AmbiguousChannel {
            name: spec.name().to_string(),
            channel: spec.channel().to_string(),
        })?;

    let best = entries
        .iter()
        .filter(|e| spec.range().matches(&e.version))
        .max_by(|a, b| a.version.cmp(&b.version));

    match best {
        Some(entry) => {
            tracing::debug!(
                "resolved {} -> {}/{}@{}",
                spec,
                spec.name(),
                entry.version,
                spec.channel()
            );
            Ok(ResolvedDependency {
                name: spec.name().to_string(),
                version: entry.version.clone(),
                channel: spec.channel().to_string(),
                reference: entry.reference.clone(),
            })
        }
        None => Err(ResolveError::UnresolvedDependency {
            name: spec.name().to_string(),
            range: spec.range().to_string(),
            channel: spec.channel().to_string(),
            available: entries.iter().map(|e| e.version.to_string()).collect(),
        }),
    }
}
