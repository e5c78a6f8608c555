//! Package assembly and consumer metadata.

pub mod assemble;
pub mod manifest;

pub use assemble::{assemble, AssembleError, CopyRule, Package};
pub use manifest::{emit, ConsumerManifest, MANIFEST_FILE};
