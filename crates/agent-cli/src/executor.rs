//! Dispatch of validated actions to their tools

use llm_core::Gateway;
use std::sync::Arc;
use tracing::{instrument, warn};

use crate::action::Action;
use crate::backup::{self, SharedBackups};
use crate::error::AgentError;
use crate::input::Prompter;
use crate::tools::write_file::WriteOutcome;
use crate::tools::{chat, read_file, run_command, write_file, ToolContext};
use crate::ui;

/// Runs one action at a time against the filesystem, the shell or the model
pub struct Executor {
    gateway: Arc<dyn Gateway>,
    backups: SharedBackups,
    ctx: ToolContext,
}

impl Executor {
    pub fn new(gateway: Arc<dyn Gateway>, backups: SharedBackups, ctx: ToolContext) -> Self {
        Self {
            gateway,
            backups,
            ctx,
        }
    }

    pub fn backups(&self) -> &SharedBackups {
        &self.backups
    }

    /// Execute `action` and return its result text.
    ///
    /// `context` is the recent-action summary used by chat. Tool errors are
    /// logged here and passed on unchanged.
    #[instrument(skip_all, fields(kind = %action.kind()))]
    pub async fn execute(
        &self,
        action: &Action,
        context: &str,
        prompter: &mut dyn Prompter,
    ) -> Result<String, AgentError> {
        let result = match action {
            Action::Read { target } => read_file::read_file(&self.ctx, target),
            Action::Write { target, content } => {
                write_file::write_file(&self.ctx, target, content, &self.backups, prompter).map(
                    |outcome| match outcome {
                        WriteOutcome::Written { .. } => format!("Written to {}", target),
                        WriteOutcome::Declined => format!("Write to {} cancelled", target),
                    },
                )
            }
            Action::Run { command } => {
                let output = run_command::run_command(&self.ctx, command).await;
                if let Ok(text) = &output {
                    ui::success("Command completed");
                    ui::dim(text);
                }
                output
            }
            Action::Rollback => backup::restore_latest(&self.backups).map(|entry| {
                let message = format!(
                    "Rolled back {} to version from {}",
                    entry.original_path.display(),
                    entry.timestamp
                );
                ui::success(&message);
                message
            }),
            Action::Chat { message } => {
                let reply = chat::chat(self.gateway.as_ref(), message, context).await;
                if let Ok(text) = &reply {
                    println!("\n{}\n", text);
                }
                reply
            }
        };

        if let Err(e) = &result {
            warn!(error = %e, "Action failed");
        }
        result
    }
}
