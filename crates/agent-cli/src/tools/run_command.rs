//! Shell command execution tool

use std::process::{ExitStatus, Stdio};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio::time::{timeout, Duration};
use tracing::{debug, warn};

use crate::error::AgentError;
use crate::progress::Indicator;
use crate::tools::ToolContext;

/// Substrings that reject a command outright (matched case-insensitively)
pub const BLOCKED_PATTERNS: &[&str] = &[
    "rm -rf /",
    "rm -rf ~",
    "del /f /s /q",
    "format",
    "mkfs",
    "dd if=/dev/zero",
    "shutdown",
    "reboot",
    ":(){",
];

/// The first blocked pattern `command` contains, if any
pub fn blocked_pattern(command: &str) -> Option<&'static str> {
    let lowered = command.to_lowercase();
    BLOCKED_PATTERNS
        .iter()
        .copied()
        .find(|pattern| lowered.contains(pattern))
}

enum Capture {
    Exited(ExitStatus),
    Overflow,
}

/// Run `command` through the platform shell in the working directory.
///
/// Returns stdout followed by stderr. Timeouts, oversized output and non-zero
/// exits are errors that carry whatever output was captured.
pub async fn run_command(ctx: &ToolContext, command: &str) -> Result<String, AgentError> {
    if let Some(pattern) = blocked_pattern(command) {
        warn!(command, pattern, "Blocked command");
        return Err(AgentError::CommandRejected {
            command: command.to_string(),
            pattern: pattern.to_string(),
        });
    }

    let (shell, shell_arg) = if cfg!(target_os = "windows") {
        ("cmd", "/C")
    } else {
        ("sh", "-c")
    };

    let mut child = Command::new(shell)
        .arg(shell_arg)
        .arg(command)
        .current_dir(&ctx.working_dir)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(AgentError::Spawn)?;

    debug!(command, timeout_secs = ctx.command_timeout_secs, "Running command");
    let indicator = Indicator::loading(format!("Running: {}", command));

    let mut stdout = Vec::new();
    let mut stderr = Vec::new();
    let limit = Duration::from_secs(ctx.command_timeout_secs);
    let result = timeout(
        limit,
        capture(&mut child, &mut stdout, &mut stderr, ctx.max_output_bytes),
    )
    .await;

    indicator.finish();

    let outcome = match result {
        Ok(Ok(capture)) => capture,
        Ok(Err(e)) => {
            let _ = child.kill().await;
            return Err(AgentError::CommandFailed {
                reason: format!("failed to collect output: {}", e),
                output: combine(&stdout, &stderr),
            });
        }
        Err(_) => {
            let _ = child.kill().await;
            return Err(AgentError::CommandTimeout {
                secs: ctx.command_timeout_secs,
                output: combine(&stdout, &stderr),
            });
        }
    };

    let output = combine(&stdout, &stderr);
    match outcome {
        Capture::Overflow => {
            let _ = child.kill().await;
            Err(AgentError::CommandFailed {
                reason: format!("output exceeded {} bytes", ctx.max_output_bytes),
                output,
            })
        }
        Capture::Exited(status) if status.success() => {
            if output.is_empty() {
                Ok("Command executed successfully".to_string())
            } else {
                Ok(output)
            }
        }
        Capture::Exited(status) => {
            let code = status
                .code()
                .map(|c| c.to_string())
                .unwrap_or_else(|| "unknown".to_string());
            Err(AgentError::CommandFailed {
                reason: format!("exited with code {}", code),
                output,
            })
        }
    }
}

/// Drain both pipes until they close or one exceeds `max_bytes`, then reap
/// the child.
async fn capture(
    child: &mut Child,
    stdout: &mut Vec<u8>,
    stderr: &mut Vec<u8>,
    max_bytes: usize,
) -> std::io::Result<Capture> {
    let mut out_pipe = child.stdout.take();
    let mut err_pipe = child.stderr.take();
    let mut out_buf = [0u8; 8192];
    let mut err_buf = [0u8; 8192];

    while out_pipe.is_some() || err_pipe.is_some() {
        tokio::select! {
            n = read_some(&mut out_pipe, &mut out_buf), if out_pipe.is_some() => {
                match n? {
                    0 => out_pipe = None,
                    n => stdout.extend_from_slice(&out_buf[..n]),
                }
            }
            n = read_some(&mut err_pipe, &mut err_buf), if err_pipe.is_some() => {
                match n? {
                    0 => err_pipe = None,
                    n => stderr.extend_from_slice(&err_buf[..n]),
                }
            }
        }

        if stdout.len() > max_bytes || stderr.len() > max_bytes {
            return Ok(Capture::Overflow);
        }
    }

    Ok(Capture::Exited(child.wait().await?))
}

async fn read_some<R: AsyncRead + Unpin>(
    pipe: &mut Option<R>,
    buf: &mut [u8],
) -> std::io::Result<usize> {
    match pipe {
        Some(reader) => reader.read(buf).await,
        None => Ok(0),
    }
}

fn combine(stdout: &[u8], stderr: &[u8]) -> String {
    let stdout = String::from_utf8_lossy(stdout);
    let stderr = String::from_utf8_lossy(stderr);

    let mut combined = String::new();
    if !stdout.is_empty() {
        combined.push_str(&stdout);
    }
    if !stderr.is_empty() {
        if !combined.is_empty() {
            combined.push_str("\n--- stderr ---\n");
        }
        combined.push_str(&stderr);
    }
    combined
}
