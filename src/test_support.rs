//! Test utilities and mocks for slipway unit tests.
//!
//! Only compiled for tests. Provides a recording build tool so tests can
//! assert on invocation counts and ordering without shelling out.

use std::path::{Path, PathBuf};

use crate::builder::{BuildTool, StepOutput};
use crate::core::settings::BuildConfiguration;

/// Mock build tool that records step invocations.
///
/// Can be told to fail one phase, and to drop files into the install prefix
/// during the install step to simulate real build output.
pub struct RecordingTool {
    pub calls: Vec<&'static str>,
    pub fail_at: Option<&'static str>,

    /// (relative path, contents) written under the install prefix on install
    pub install_files: Vec<(PathBuf, String)>,

    install_dir: Option<PathBuf>,
}

impl Default for RecordingTool {
    fn default() -> Self {
        RecordingTool::new()
    }
}

impl RecordingTool {
    pub fn new() -> Self {
        RecordingTool {
            calls: Vec::new(),
            fail_at: None,
            install_files: Vec::new(),
            install_dir: None,
        }
    }

    fn step(&mut self, name: &'static str) -> anyhow::Result<StepOutput> {
        self.calls.push(name);
        if self.fail_at == Some(name) {
            Ok(StepOutput {
                success: false,
                exit_code: Some(1),
                log: format!("{} exploded", name),
            })
        } else {
            Ok(StepOutput::ok())
        }
    }
}

impl BuildTool for RecordingTool {
    fn name(&self) -> &str {
        "recording"
    }

    fn configure(
        &mut self,
        _config: &BuildConfiguration,
        _source_dir: &Path,
        _build_dir: &Path,
        install_dir: &Path,
    ) -> anyhow::Result<StepOutput> {
        self.install_dir = Some(install_dir.to_path_buf());
        self.step("configure")
    }

    fn build(&mut self, _build_dir: &Path) -> anyhow::Result<StepOutput> {
        self.step("build")
    }

    fn install(&mut self, _build_dir: &Path) -> anyhow::Result<StepOutput> {
        let result = self.step("install")?;

        if result.success {
            if let Some(ref prefix) = self.install_dir {
                for (rel, contents) in &self.install_files {
                    crate::util::fs::write_string(&prefix.join(rel), contents)?;
                }
            }
        }

        Ok(result)
    }
}
