//! Error taxonomy for planning and execution

use std::path::PathBuf;
use thiserror::Error;

/// Failures raised while validating or executing an action.
///
/// Every variant is recoverable at the orchestrator boundary: it is logged,
/// remembered as a failed attempt, and the session continues.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("malformed action: {0}")]
    MalformedAction(String),

    #[error("command rejected: '{command}' contains blocked pattern '{pattern}'")]
    CommandRejected { command: String, pattern: String },

    #[error("command timed out after {secs}s")]
    CommandTimeout { secs: u64, output: String },

    #[error("command failed: {reason}")]
    CommandFailed { reason: String, output: String },

    #[error("failed to start command: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("no backups available to roll back")]
    BackupMissing,

    #[error("backup file not found: {}", .0.display())]
    BackupArtifactMissing(PathBuf),

    #[error("failed to read {}: {source}", path.display())]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {}: {source}", path.display())]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to restore {}: {source}", path.display())]
    RestoreFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("model request failed: {0}")]
    Gateway(String),
}

impl AgentError {
    /// Captured process output carried by command failures, if any
    pub fn output(&self) -> Option<&str> {
        match self {
            AgentError::CommandTimeout { output, .. } | AgentError::CommandFailed { output, .. } => {
                Some(output.as_str())
            }
            _ => None,
        }
    }

    pub fn gateway(err: anyhow::Error) -> Self {
        AgentError::Gateway(format!("{:#}", err))
    }
}

/// Reasons a model reply could not be read as an action or plan.
///
/// Never surfaced to the user: planners turn every variant into a chat
/// fallback.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseFailure {
    #[error("reply was empty")]
    EmptyReply,

    #[error("reply was not valid JSON ({0})")]
    InvalidJson(String),

    #[error("reply was not a JSON object")]
    NotAnObject,

    #[error("reply had no action type")]
    MissingKind,

    #[error("reply used unknown action type '{0}'")]
    UnknownKind(String),

    #[error("reply failed validation: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_errors_carry_output() {
        let err = AgentError::CommandTimeout {
            secs: 30,
            output: "partial".to_string(),
        };
        assert_eq!(err.output(), Some("partial"));
        assert_eq!(err.to_string(), "command timed out after 30s");
        assert!(AgentError::BackupMissing.output().is_none());
    }

    #[test]
    fn test_gateway_error_keeps_context_chain() {
        let inner = anyhow::anyhow!("connection refused").context("Failed to reach the model API");
        let err = AgentError::gateway(inner);
        let msg = err.to_string();
        assert!(msg.contains("Failed to reach the model API"));
        assert!(msg.contains("connection refused"));
    }
}
