//! The single line-input surface of a session
//!
//! One [`Prompter`] is created at startup and handed by `&mut` to every place
//! that needs an answer: the REPL prompt, plan confirmation, the
//! continue-after-failure question and write confirmation. Nothing else
//! reads stdin.

use anyhow::Result;
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::{Config, Editor};
use std::fs;
use std::path::PathBuf;
use tracing::debug;

use crate::ui::{RESET, YELLOW};

/// Source of user answers
pub trait Prompter {
    /// Read one line. `None` means input is closed.
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>>;

    /// Remember an instruction for line-editing history
    fn add_history(&mut self, _line: &str) {}

    /// Ask a yes/no question; anything but an answer starting with `y` is no
    fn confirm(&mut self, question: &str) -> bool {
        let prompt = format!("{}{} (y/N): {}", YELLOW, question, RESET);
        match self.read_line(&prompt) {
            Ok(Some(answer)) => is_affirmative(&answer),
            _ => false,
        }
    }
}

/// `y`, `yes`, `Yes please`...
pub fn is_affirmative(answer: &str) -> bool {
    answer.trim().to_lowercase().starts_with('y')
}

/// rustyline-backed prompter for a real terminal
pub struct TerminalPrompter {
    editor: Editor<(), DefaultHistory>,
    history_path: Option<PathBuf>,
}

impl TerminalPrompter {
    pub fn new(history_size: usize) -> Result<Self> {
        let config = Config::builder()
            .max_history_size(history_size)?
            .auto_add_history(false)
            .build();
        let mut editor = Editor::with_config(config)?;

        let history_path = history_file();
        if let Some(path) = &history_path {
            if editor.load_history(path).is_err() {
                debug!(path = %path.display(), "No previous history");
            }
        }

        Ok(Self {
            editor,
            history_path,
        })
    }

    /// Persist line history
    pub fn save_history(&mut self) {
        if let Some(path) = &self.history_path {
            if let Err(e) = self.editor.save_history(path) {
                debug!(error = %e, "Failed to save history");
            }
        }
    }
}

impl Prompter for TerminalPrompter {
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>> {
        match self.editor.readline(prompt) {
            Ok(line) => Ok(Some(line)),
            // Ctrl-C abandons the current line only
            Err(ReadlineError::Interrupted) => Ok(Some(String::new())),
            Err(ReadlineError::Eof) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn add_history(&mut self, line: &str) {
        let _ = self.editor.add_history_entry(line);
    }
}

impl Drop for TerminalPrompter {
    fn drop(&mut self) {
        self.save_history();
    }
}

/// `{data_dir}/my-agent/history`
fn history_file() -> Option<PathBuf> {
    let dir = dirs::data_dir()?.join("my-agent");
    fs::create_dir_all(&dir).ok()?;
    Some(dir.join("history"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedPrompter;

    #[test]
    fn test_is_affirmative() {
        assert!(is_affirmative("y"));
        assert!(is_affirmative("  Yes "));
        assert!(is_affirmative("YEP"));
        assert!(!is_affirmative("n"));
        assert!(!is_affirmative(""));
        assert!(!is_affirmative("sure"));
    }

    #[test]
    fn test_confirm_uses_read_line() {
        let mut prompter = ScriptedPrompter::new(["yes", "no"]);
        assert!(prompter.confirm("Apply these changes?"));
        assert!(!prompter.confirm("Apply these changes?"));
        // closed input declines
        assert!(!prompter.confirm("Apply these changes?"));
        assert_eq!(prompter.prompts().len(), 3);
        assert!(prompter.prompts()[0].contains("Apply these changes? (y/N)"));
    }
}
