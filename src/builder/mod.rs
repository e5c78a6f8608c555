//! Build driver.
//!
//! Drives the external build tool through its configure, build, and install
//! steps against an exported source tree, writing the install output into a
//! staging directory. The driver is a strict state machine; it never
//! retries, and a failed step is surfaced with the tool's captured output.

pub mod cmake;

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::core::settings::BuildConfiguration;
use crate::util::fs::ensure_dir;

pub use cmake::CMakeTool;

/// Captured result of one build-tool step.
#[derive(Debug, Clone)]
pub struct StepOutput {
    pub success: bool,
    pub exit_code: Option<i32>,

    /// Combined stdout and stderr, surfaced verbatim on failure
    pub log: String,
}

impl StepOutput {
    /// Build a step output from a captured process output.
    pub fn from_output(output: &std::process::Output) -> StepOutput {
        let mut log = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr);
        if !stderr.is_empty() {
            if !log.is_empty() {
                log.push('\n');
            }
            log.push_str(&stderr);
        }

        StepOutput {
            success: output.status.success(),
            exit_code: output.status.code(),
            log,
        }
    }

    /// A successful step with no output, for tools that have nothing to say.
    pub fn ok() -> StepOutput {
        StepOutput {
            success: true,
            exit_code: Some(0),
            log: String::new(),
        }
    }
}

/// The external build tool driven by the [`BuildDriver`].
///
/// Implementations shell out (see [`CMakeTool`]); tests substitute a
/// recording mock to assert on invocation counts and ordering.
pub trait BuildTool {
    /// Tool name for log lines.
    fn name(&self) -> &str;

    /// Run the configure step against the source tree.
    fn configure(
        &mut self,
        config: &BuildConfiguration,
        source_dir: &Path,
        build_dir: &Path,
        install_dir: &Path,
    ) -> anyhow::Result<StepOutput>;

    /// Run the compile step.
    fn build(&mut self, build_dir: &Path) -> anyhow::Result<StepOutput>;

    /// Run the install step.
    fn install(&mut self, build_dir: &Path) -> anyhow::Result<StepOutput>;
}

/// Build driver phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    NotStarted,
    Configuring,
    Building,
    Installing,
    Done,
    Failed,
}

/// A failed build step, carrying the phase and the tool's output.
#[derive(Debug, Error)]
pub enum DriverError {
    #[error("configure step failed (exit code {exit_code:?})\n{log}")]
    Configure { exit_code: Option<i32>, log: String },

    #[error("build step failed (exit code {exit_code:?})\n{log}")]
    Build { exit_code: Option<i32>, log: String },

    #[error("install step failed (exit code {exit_code:?})\n{log}")]
    Install { exit_code: Option<i32>, log: String },
}

/// The install tree produced by a successful build.
///
/// Owned by the driver until the package assembler consumes it.
#[derive(Debug)]
pub struct Staging {
    dir: PathBuf,
}

impl Staging {
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

/// Sequences the build tool through configure, build, and install.
#[derive(Debug)]
pub struct BuildDriver {
    phase: Phase,
}

impl Default for BuildDriver {
    fn default() -> Self {
        BuildDriver::new()
    }
}

impl BuildDriver {
    pub fn new() -> Self {
        BuildDriver {
            phase: Phase::NotStarted,
        }
    }

    /// Current phase, terminal after `run` returns.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Run the full configure -> build -> install sequence.
    ///
    /// Any step failure moves the driver to `Failed` and returns the
    /// corresponding [`DriverError`]; later steps never run. Re-invocation
    /// is the orchestrator's decision, not this component's.
    pub fn run(
        &mut self,
        tool: &mut dyn BuildTool,
        config: &BuildConfiguration,
        source_dir: &Path,
        build_dir: &Path,
        staging_dir: &Path,
    ) -> Result<Staging, DriverError> {
        self.phase = Phase::Configuring;
        tracing::info!("configuring with {}", tool.name());

        let prep = ensure_dir(build_dir).and_then(|_| ensure_dir(staging_dir));
        if let Err(e) = prep {
            self.phase = Phase::Failed;
            return Err(DriverError::Configure {
                exit_code: None,
                log: format!("{:#}", e),
            });
        }

        let step = tool.configure(config, source_dir, build_dir, staging_dir);
        self.check(step, |exit_code, log| DriverError::Configure { exit_code, log })?;

        self.phase = Phase::Building;
        tracing::info!("building");
        let step = tool.build(build_dir);
        self.check(step, |exit_code, log| DriverError::Build { exit_code, log })?;

        self.phase = Phase::Installing;
        tracing::info!("installing to {}", staging_dir.display());
        let step = tool.install(build_dir);
        self.check(step, |exit_code, log| DriverError::Install { exit_code, log })?;

        self.phase = Phase::Done;
        Ok(Staging {
            dir: staging_dir.to_path_buf(),
        })
    }

    fn check(
        &mut self,
        step: anyhow::Result<StepOutput>,
        make_err: impl FnOnce(Option<i32>, String) -> DriverError,
    ) -> Result<(), DriverError> {
        match step {
            Ok(output) if output.success => Ok(()),
            Ok(output) => {
                self.phase = Phase::Failed;
                Err(make_err(output.exit_code, output.log))
            }
            // Spawn failures (tool missing, unreadable dirs) are reported
            // under the phase they interrupted.
            Err(e) => {
                self.phase = Phase::Failed;
                Err(make_err(None, format!("{:#}", e)))
            }
        }
    }
}
