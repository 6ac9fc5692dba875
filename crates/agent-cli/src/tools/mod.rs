//! Side-effecting implementations behind each action kind

pub mod chat;
pub mod diff;
pub mod read_file;
pub mod run_command;
pub mod write_file;

use std::path::{Path, PathBuf};

/// Default wall-clock limit for shell commands
pub const DEFAULT_COMMAND_TIMEOUT_SECS: u64 = 30;
/// Default cap on captured output per stream
pub const DEFAULT_MAX_OUTPUT_BYTES: usize = 1024 * 1024;

/// Context provided to tools during execution
#[derive(Debug, Clone)]
pub struct ToolContext {
    /// Directory relative paths and commands resolve against
    pub working_dir: PathBuf,
    /// Timeout for shell commands in seconds
    pub command_timeout_secs: u64,
    /// Captured output limit per stream, in bytes
    pub max_output_bytes: usize,
}

impl Default for ToolContext {
    fn default() -> Self {
        Self {
            working_dir: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            command_timeout_secs: DEFAULT_COMMAND_TIMEOUT_SECS,
            max_output_bytes: DEFAULT_MAX_OUTPUT_BYTES,
        }
    }
}

impl ToolContext {
    /// Create a new context with the given working directory
    pub fn new(working_dir: PathBuf) -> Self {
        Self {
            working_dir,
            ..Default::default()
        }
    }

    /// Set command timeout
    pub fn with_command_timeout(mut self, secs: u64) -> Self {
        self.command_timeout_secs = secs;
        self
    }

    /// Set captured output limit
    pub fn with_max_output(mut self, bytes: usize) -> Self {
        self.max_output_bytes = bytes;
        self
    }

    /// Resolve `target` against the working directory
    pub fn resolve(&self, target: &str) -> PathBuf {
        let path = Path::new(target);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.working_dir.join(path)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve() {
        let ctx = ToolContext::new(PathBuf::from("/work"));
        assert_eq!(ctx.resolve("src/main.rs"), PathBuf::from("/work/src/main.rs"));
        assert_eq!(ctx.resolve("/etc/hosts"), PathBuf::from("/etc/hosts"));
    }

    #[test]
    fn test_defaults() {
        let ctx = ToolContext::default();
        assert_eq!(ctx.command_timeout_secs, 30);
        assert_eq!(ctx.max_output_bytes, 1_048_576);
    }
}
