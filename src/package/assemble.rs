//! Package assembly from the staging and source trees.
//!
//! Copy rules are an explicit, ordered list; the final package contains
//! exactly the files matched by at least one rule, never an implicit copy of
//! the whole staging tree. Conflicts at the same destination are
//! last-write-wins in rule declaration order, and within a rule the matches
//! are applied in sorted path order, so assembly is deterministic regardless
//! of filesystem traversal order.

use std::path::{Path, PathBuf};

use glob::{MatchOptions, Pattern};
use serde::Deserialize;
use thiserror::Error;
use walkdir::WalkDir;

use crate::util::fs::{copy_file, ensure_dir};

/// One file-selection rule applied during packaging.
#[derive(Debug, Clone, Deserialize)]
pub struct CopyRule {
    /// Glob pattern matched against paths relative to each search root
    pub pattern: String,

    /// Destination subdirectory inside the package
    #[serde(default)]
    pub dest: String,

    /// Match case-insensitively (`license*` also takes `LICENSE`)
    #[serde(default)]
    pub ignore_case: bool,

    /// Preserve the matched file's relative directory structure
    #[serde(default = "default_true")]
    pub keep_path: bool,

    /// Fail the assembly when this rule matches nothing
    #[serde(default)]
    pub required: bool,
}

fn default_true() -> bool {
    true
}

/// Error during package assembly.
#[derive(Debug, Error)]
pub enum AssembleError {
    /// A required rule matched zero files. Packaging defect, never skipped.
    #[error("required pattern `{pattern}` matched no files")]
    CopyError { pattern: String },

    #[error("invalid copy pattern `{pattern}`")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    #[error(transparent)]
    Io(#[from] anyhow::Error),
}

/// The assembled package directory.
#[derive(Debug)]
pub struct Package {
    dir: PathBuf,
    files: Vec<PathBuf>,
}

impl Package {
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Destination-relative paths of every copied file, sorted.
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }
}

/// Assemble the package by applying `rules` in declaration order.
///
/// Each rule is matched against the staging tree first, then the source
/// tree, so install output wins over stray same-named source files only
/// when a later rule does not overwrite it.
pub fn assemble(
    staging_dir: &Path,
    source_dir: &Path,
    rules: &[CopyRule],
    package_dir: &Path,
) -> Result<Package, AssembleError> {
    ensure_dir(package_dir)?;

    let mut copied = Vec::new();

    for rule in rules {
        let matched = apply_rule(&[staging_dir, source_dir], rule, package_dir)?;

        if matched.is_empty() && rule.required {
            return Err(AssembleError::CopyError {
                pattern: rule.pattern.clone(),
            });
        }

        tracing::debug!("rule `{}` copied {} file(s)", rule.pattern, matched.len());
        copied.extend(matched);
    }

    copied.sort();
    copied.dedup();

    Ok(Package {
        dir: package_dir.to_path_buf(),
        files: copied,
    })
}

/// Apply one rule across the search roots, returning destination-relative
/// paths of the copies made.
fn apply_rule(
    roots: &[&Path],
    rule: &CopyRule,
    package_dir: &Path,
) -> Result<Vec<PathBuf>, AssembleError> {
    let mut copied = Vec::new();
    for root in roots {
        copied.extend(copy_matching(root, rule, package_dir)?);
    }
    Ok(copied)
}

/// Copy the files under `root` matched by one rule into `dest_dir`.
///
/// Also used by the orchestrator to export recipe source patterns into the
/// build's source snapshot.
pub fn copy_matching(
    root: &Path,
    rule: &CopyRule,
    dest_dir: &Path,
) -> Result<Vec<PathBuf>, AssembleError> {
    let pattern =
        Pattern::new(&rule.pattern).map_err(|source| AssembleError::InvalidPattern {
            pattern: rule.pattern.clone(),
            source,
        })?;

    let options = MatchOptions {
        case_sensitive: !rule.ignore_case,
        require_literal_separator: false,
        require_literal_leading_dot: false,
    };

    let mut matches = Vec::new();
    for entry in WalkDir::new(root).into_iter().filter_map(|e| e.ok()) {
        if !entry.file_type().is_file() {
            continue;
        }
        let rel = match entry.path().strip_prefix(root) {
            Ok(rel) => rel.to_path_buf(),
            Err(_) => continue,
        };
        if pattern.matches_path_with(&rel, options) {
            matches.push(rel);
        }
    }

    // Sorted so overwrites within a rule are deterministic
    matches.sort();

    let mut copied = Vec::new();
    for rel in matches {
        let dest_rel = if rule.keep_path {
            Path::new(&rule.dest).join(&rel)
        } else {
            // Flatten to the file name
            match rel.file_name() {
                Some(name) => Path::new(&rule.dest).join(name),
                None => continue,
            }
        };

        copy_file(&root.join(&rel), &dest_dir.join(&dest_rel))?;
        copied.push(dest_rel);
    }

    Ok(copied)
}

impl CopyRule {
    /// A plain structure-preserving rule for one pattern.
    pub fn exporting(pattern: &str) -> CopyRule {
        CopyRule {
            pattern: pattern.to_string(),
            dest: String::new(),
            ignore_case: false,
            keep_path: true,
            required: false,
        }
    }
}
