use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;

/// Timeout for the short version probe that decides whether a native
/// tool is installed at all.
const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Captured output of a finished tool invocation.
#[derive(Debug)]
pub struct ToolOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

/// Why a tool invocation produced no usable output.
///
/// Both variants are recoverable: the scanner falls back to manifest
/// parsing and records a warning.
#[derive(Debug, Error)]
pub enum ToolFailure {
    #[error("'{program}' did not finish within {timeout_secs} seconds")]
    Timeout { program: String, timeout_secs: u64 },

    #[error("failed to launch '{program}': {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

/// Probes whether a tool is installed and answers its version command
/// within a short timeout.
pub async fn tool_available(program: &str, probe_args: &[&str]) -> bool {
    matches!(
        run_tool(program, probe_args, None, PROBE_TIMEOUT).await,
        Ok(output) if output.success
    )
}

/// Runs an external tool with captured output and a hard timeout.
///
/// The child is spawned with `kill_on_drop`, so hitting the timeout or
/// cancelling the surrounding future terminates the process instead of
/// orphaning it.
///
/// # Arguments
/// * `program` - Executable name resolved via PATH
/// * `args` - Arguments passed verbatim
/// * `cwd` - Working directory for the invocation, if any
/// * `timeout` - Ceiling on the total run time
pub async fn run_tool(
    program: &str,
    args: &[&str],
    cwd: Option<&Path>,
    timeout: Duration,
) -> std::result::Result<ToolOutput, ToolFailure> {
    let mut command = Command::new(program);
    command
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    if let Some(dir) = cwd {
        command.current_dir(dir);
    }

    let child = command.spawn().map_err(|source| ToolFailure::Launch {
        program: program.to_string(),
        source,
    })?;

    match tokio::time::timeout(timeout, child.wait_with_output()).await {
        Ok(Ok(output)) => Ok(ToolOutput {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        }),
        Ok(Err(source)) => Err(ToolFailure::Launch {
            program: program.to_string(),
            source,
        }),
        Err(_) => Err(ToolFailure::Timeout {
            program: program.to_string(),
            timeout_secs: timeout.as_secs(),
        }),
    }
}
