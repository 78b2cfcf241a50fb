use std::io::Write;
use std::process::{Command, Stdio};

use tracing::debug;

use crate::errors::{GrabError, Result};

/// Receives the final document.
pub trait Clipboard {
    fn copy(&self, text: &str) -> Result<()>;
}

/// Writes to the system clipboard through the platform's copy command.
#[derive(Debug, Clone)]
pub struct SystemClipboard {
    program: String,
    args: Vec<String>,
}

impl SystemClipboard {
    /// Picks the copy command for this platform: `pbcopy` on macOS, `clip` on
    /// Windows, otherwise the first of `wl-copy` (under Wayland), `xclip` and
    /// `xsel` installed on `PATH`.
    pub fn detect() -> Result<Self> {
        if cfg!(target_os = "macos") {
            return Ok(Self::command("pbcopy", &[]));
        }
        if cfg!(target_os = "windows") {
            return Ok(Self::command("clip", &[]));
        }

        let wayland = std::env::var_os("WAYLAND_DISPLAY").is_some();
        let candidates: [(&str, &[&str], bool); 3] = [
            ("wl-copy", &[], wayland),
            ("xclip", &["-selection", "clipboard"], true),
            ("xsel", &["--clipboard", "--input"], true),
        ];
        candidates
            .iter()
            .filter(|(_, _, enabled)| *enabled)
            .find(|(program, _, _)| which::which(program).is_ok())
            .map(|(program, args, _)| Self::command(program, args))
            .ok_or_else(|| GrabError::Clipboard {
                message: "no clipboard command found (install wl-copy, xclip or xsel)".to_string(),
            })
    }

    fn command(program: &str, args: &[&str]) -> Self {
        Self {
            program: program.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }
}

impl Clipboard for SystemClipboard {
    fn copy(&self, text: &str) -> Result<()> {
        debug!(program = %self.program, bytes = text.len(), "copying to clipboard");
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| GrabError::Clipboard {
                message: format!("failed to start {}: {}", self.program, e),
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            if let Err(e) = stdin.write_all(text.as_bytes()) {
                drop(stdin);
                let _ = child.kill();
                let _ = child.wait();
                return Err(e.into());
            }
        }

        let status = child.wait()?;
        if !status.success() {
            return Err(GrabError::Clipboard {
                message: format!("{} exited with {}", self.program, status),
            });
        }
        Ok(())
    }
}
