//! External process launching
//!
//! Every process githelp starts (git, the explanation backend) goes through
//! [`ProcessLauncher`], so the runner and the gateway can be tested with a
//! scripted launcher instead of real binaries.
//!
//! Calls block until the child exits. There is no timeout.

use std::io::Write;
use std::process::{Command, Stdio};
use tracing::debug;

/// Captured result of one finished process
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    pub success: bool,
    /// Exit code, `None` when killed by a signal
    pub code: Option<i32>,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl ProcessOutput {
    /// stdout followed by stderr, invalid UTF-8 replaced
    pub fn combined_lossy(&self) -> String {
        let mut text = String::from_utf8_lossy(&self.stdout).into_owned();
        text.push_str(&String::from_utf8_lossy(&self.stderr));
        text
    }
}

/// Runs an external program to completion
pub trait ProcessLauncher {
    /// Run `program` with `args`, writing `stdin` to its input when given.
    ///
    /// A missing executable surfaces as an `io::Error` of kind `NotFound`.
    fn launch(
        &self,
        program: &str,
        args: &[String],
        stdin: Option<&str>,
    ) -> std::io::Result<ProcessOutput>;
}

/// Launcher backed by `std::process::Command`
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemLauncher;

impl ProcessLauncher for SystemLauncher {
    fn launch(
        &self,
        program: &str,
        args: &[String],
        stdin: Option<&str>,
    ) -> std::io::Result<ProcessOutput> {
        debug!(program, ?args, "launching process");

        let mut cmd = Command::new(program);
        cmd.args(args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .stdin(if stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            });

        let mut child = cmd.spawn()?;

        if let Some(input) = stdin {
            if let Some(mut pipe) = child.stdin.take() {
                // A child that exits without reading its input still has an
                // exit status worth reporting.
                if let Err(e) = pipe.write_all(input.as_bytes()) {
                    if e.kind() != std::io::ErrorKind::BrokenPipe {
                        return Err(e);
                    }
                }
                // pipe dropped here so the child sees EOF
            }
        }

        let output = child.wait_with_output()?;
        Ok(ProcessOutput {
            success: output.status.success(),
            code: output.status.code(),
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }
}
