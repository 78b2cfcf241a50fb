use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tracing::debug;

use crate::config::GrabConfig;
use crate::errors::{GrabError, Result};

/// Rewrites a generated file in place.
#[allow(async_fn_in_trait)]
pub trait Formatter {
    async fn format(&self, path: &Path) -> Result<()>;
}

/// Runs `prettier --write` on the generated file.
///
/// Uses a `prettier` found on `PATH`, falling back to `npx --no-install
/// prettier` so a project-local install is picked up.
pub struct PrettierFormatter {
    program: PathBuf,
    args: Vec<String>,
    timeout: Duration,
}

impl PrettierFormatter {
    pub fn from_config(config: &GrabConfig) -> Self {
        let (program, mut args) = match which::which("prettier") {
            Ok(path) => (path, Vec::new()),
            Err(_) => (
                PathBuf::from("npx"),
                vec!["--no-install".to_string(), "prettier".to_string()],
            ),
        };
        args.extend(config.formatter_args());
        Self {
            program,
            args,
            timeout: Duration::from_secs(config.formatter_timeout_secs),
        }
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }
}

impl Formatter for PrettierFormatter {
    async fn format(&self, path: &Path) -> Result<()> {
        debug!(program = %self.program.display(), file = %path.display(), "running formatter");
        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .arg("--write")
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = tokio::time::timeout(self.timeout, command.output())
            .await
            .map_err(|_| GrabError::Format {
                message: format!("formatter timed out after {}s", self.timeout.as_secs()),
            })?
            .map_err(|e| GrabError::Format {
                message: format!("failed to start {}: {}", self.program.display(), e),
            })?;

        if !output.status.success() {
            return Err(GrabError::Format {
                message: format!(
                    "formatter exited with {}: {}",
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            });
        }
        Ok(())
    }
}

/// Leaves the file untouched.
pub struct NoopFormatter;

impl Formatter for NoopFormatter {
    async fn format(&self, _path: &Path) -> Result<()> {
        Ok(())
    }
}
