use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;
use std::process::{Command, Stdio};

use thanatos_core::config::ShellSettings;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Why a toolchain command did not complete successfully.
#[derive(Debug, Error)]
pub enum InvocationFailure {
    #[error("failed to spawn process: {0}")]
    Spawn(#[source] std::io::Error),
    #[error("process exited with status {}", exit_code_label(*.code))]
    Exit { code: Option<i32> },
    #[error("failed to capture process output: {0}")]
    Capture(#[source] std::io::Error),
}

fn exit_code_label(code: Option<i32>) -> String {
    match code {
        Some(code) => code.to_string(),
        None => "unknown (terminated by signal)".to_string(),
    }
}

/// A failed toolchain command.
///
/// The command text and the captured output are kept as separate fields so
/// callers can pull either one out without parsing the rendered message.
#[derive(Debug, Error)]
#[error("command '{shell} {command}' failed: {failure}\noutput:\n{output}")]
pub struct ToolchainInvocationError {
    pub shell: String,
    pub command: String,
    pub output: String,
    #[source]
    pub failure: InvocationFailure,
}

impl ToolchainInvocationError {
    pub fn new(
        shell: impl Into<String>,
        command: impl Into<String>,
        output: impl Into<String>,
        failure: InvocationFailure,
    ) -> Self {
        Self {
            shell: shell.into(),
            command: command.into(),
            output: output.into(),
            failure,
        }
    }
}

pub trait ToolchainInvoker {
    /// Runs `command` through a shell rooted at `working_dir` and returns the
    /// combined stdout/stderr on success.
    fn run(&self, working_dir: &Path, command: &str) -> Result<Vec<u8>, ToolchainInvocationError>;
}

impl<T: ToolchainInvoker + ?Sized> ToolchainInvoker for &T {
    fn run(&self, working_dir: &Path, command: &str) -> Result<Vec<u8>, ToolchainInvocationError> {
        (**self).run(working_dir, command)
    }
}

#[derive(Clone, Debug, Default)]
pub struct ShellInvoker {
    shell: ShellSettings,
}

impl ShellInvoker {
    pub fn new(shell: ShellSettings) -> Self {
        Self { shell }
    }

    fn shell_line(&self) -> String {
        let mut parts = vec![self.shell.program.clone()];
        parts.extend(self.shell.args.iter().cloned());
        parts.join(" ")
    }

    fn failure(&self, command: &str, output: &[u8], failure: InvocationFailure) -> ToolchainInvocationError {
        ToolchainInvocationError::new(
            self.shell_line(),
            command,
            String::from_utf8_lossy(output).into_owned(),
            failure,
        )
    }
}

impl ToolchainInvoker for ShellInvoker {
    fn run(&self, working_dir: &Path, command: &str) -> Result<Vec<u8>, ToolchainInvocationError> {
        info!(command = %command, working_dir = %working_dir.display(), "running toolchain command");

        // stdout and stderr share one file so their interleaving survives.
        let mut capture = tempfile::tempfile()
            .map_err(|error| self.failure(command, &[], InvocationFailure::Capture(error)))?;
        let stdout = capture
            .try_clone()
            .map_err(|error| self.failure(command, &[], InvocationFailure::Capture(error)))?;
        let stderr = capture
            .try_clone()
            .map_err(|error| self.failure(command, &[], InvocationFailure::Capture(error)))?;

        let status = Command::new(&self.shell.program)
            .args(&self.shell.args)
            .arg(command)
            .current_dir(working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::from(stdout))
            .stderr(Stdio::from(stderr))
            .status();

        let output = read_capture(&mut capture)
            .map_err(|error| self.failure(command, &[], InvocationFailure::Capture(error)))?;

        let status = match status {
            Ok(status) => status,
            Err(error) => {
                warn!(command = %command, error = %error, "toolchain command could not be spawned");
                return Err(self.failure(command, &output, InvocationFailure::Spawn(error)));
            }
        };

        if !status.success() {
            warn!(
                command = %command,
                code = ?status.code(),
                output = %String::from_utf8_lossy(&output),
                "toolchain command failed"
            );
            return Err(self.failure(
                command,
                &output,
                InvocationFailure::Exit {
                    code: status.code(),
                },
            ));
        }

        debug!(output = %String::from_utf8_lossy(&output), "toolchain command output");
        Ok(output)
    }
}

fn read_capture(capture: &mut File) -> std::io::Result<Vec<u8>> {
    capture.seek(SeekFrom::Start(0))?;
    let mut output = Vec::new();
    capture.read_to_end(&mut output)?;
    Ok(output)
}
