//! High-level operations invoked by the CLI.

pub mod create;

pub use create::{create, CreateOptions, CreateOutcome};
