//! CMake adapter for the build driver.

use std::path::{Path, PathBuf};

use anyhow::{bail, Result};

use crate::builder::{BuildTool, StepOutput};
use crate::core::settings::BuildConfiguration;
use crate::util::process::{find_cmake, ProcessBuilder};

/// Drives a CMake project through configure, build, and install.
pub struct CMakeTool {
    cmake: PathBuf,
    extra_args: Vec<String>,
}

impl CMakeTool {
    /// Create a CMake tool, locating the executable.
    pub fn new() -> Result<Self> {
        let Some(cmake) = find_cmake() else {
            bail!(
                "CMake not found\n\
                 \n\
                 CMake is required to build recipes.\n\
                 Install CMake and ensure it's in your PATH (or set CMAKE)."
            );
        };

        Ok(CMakeTool {
            cmake,
            extra_args: Vec::new(),
        })
    }

    /// Add extra arguments passed to the configure step.
    pub fn args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.extra_args.extend(args.into_iter().map(|s| s.into()));
        self
    }

    /// Translate the configuration into CMake cache definitions.
    fn definitions(&self, config: &BuildConfiguration, install_dir: &Path) -> Vec<String> {
        let mut defs = vec![
            format!(
                "-DCMAKE_BUILD_TYPE={}",
                config.settings().build_type.as_cmake()
            ),
            format!("-DCMAKE_INSTALL_PREFIX={}", install_dir.display()),
            "-DCMAKE_POSITION_INDEPENDENT_CODE=ON".to_string(),
        ];

        // `shared` is the conventional linkage option; other options are
        // exposed verbatim as cache variables for the project to consume.
        for (name, value) in config.options() {
            if name == "shared" {
                let on = value.as_bool().unwrap_or(false);
                defs.push(format!(
                    "-DBUILD_SHARED_LIBS={}",
                    if on { "ON" } else { "OFF" }
                ));
            } else {
                defs.push(format!("-D{}={}", name.to_uppercase(), value));
            }
        }

        defs
    }
}

impl BuildTool for CMakeTool {
    fn name(&self) -> &str {
        "cmake"
    }

    fn configure(
        &mut self,
        config: &BuildConfiguration,
        source_dir: &Path,
        build_dir: &Path,
        install_dir: &Path,
    ) -> Result<StepOutput> {
        let mut cmd = ProcessBuilder::new(&self.cmake)
            .arg("-S")
            .arg(source_dir)
            .arg("-B")
            .arg(build_dir)
            .args(self.definitions(config, install_dir));

        for arg in &self.extra_args {
            cmd = cmd.arg(arg);
        }

        tracing::debug!("running {}", cmd.display_command());
        let output = cmd.exec()?;
        Ok(StepOutput::from_output(&output))
    }

    fn build(&mut self, build_dir: &Path) -> Result<StepOutput> {
        let cmd = ProcessBuilder::new(&self.cmake).arg("--build").arg(build_dir);

        tracing::debug!("running {}", cmd.display_command());
        let output = cmd.exec()?;
        Ok(StepOutput::from_output(&output))
    }

    fn install(&mut self, build_dir: &Path) -> Result<StepOutput> {
        let cmd = ProcessBuilder::new(&self.cmake)
            .arg("--install")
            .arg(build_dir);

        tracing::debug!("running {}", cmd.display_command());
        let output = cmd.exec()?;
        Ok(StepOutput::from_output(&output))
    }
}
