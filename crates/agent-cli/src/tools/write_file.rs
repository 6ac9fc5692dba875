//! File write tool
//!
//! Shows what will change, asks, snapshots the old file, then writes.

use std::fs;
use std::path::PathBuf;
use tracing::info;

use crate::backup::{self, SharedBackups};
use crate::error::AgentError;
use crate::input::Prompter;
use crate::memory::truncate_chars;
use crate::tools::diff;
use crate::tools::ToolContext;
use crate::ui::{self, BOLD, RESET};

const NEW_FILE_PREVIEW_CHARS: usize = 500;

/// What happened to a proposed write
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    Written {
        path: PathBuf,
        backup: Option<PathBuf>,
    },
    /// The user said no; nothing on disk changed
    Declined,
}

pub fn write_file(
    ctx: &ToolContext,
    target: &str,
    content: &str,
    backups: &SharedBackups,
    prompter: &mut dyn Prompter,
) -> Result<WriteOutcome, AgentError> {
    let path = ctx.resolve(target);

    let existing = if path.is_file() {
        let bytes = fs::read(&path).map_err(|source| AgentError::ReadFailed {
            path: path.clone(),
            source,
        })?;
        Some(String::from_utf8_lossy(&bytes).into_owned())
    } else {
        None
    };

    match &existing {
        Some(old) => {
            let lines = diff::diff_lines(old, content);
            let (added, removed) = diff::stats(&lines);
            println!(
                "\n{}Changes to {}{} (+{} -{})",
                BOLD, target, RESET, added, removed
            );
            println!("{}\n", diff::render(&lines, true));
        }
        None => {
            println!("\n{}New file {}{}", BOLD, target, RESET);
            ui::dim(truncate_chars(content, NEW_FILE_PREVIEW_CHARS));
            println!();
        }
    }

    if !prompter.confirm("Apply these changes?") {
        ui::warning(format!("Write to {} cancelled", target));
        return Ok(WriteOutcome::Declined);
    }

    let backup = if existing.is_some() {
        backup::snapshot(backups, &path)?
    } else {
        None
    };

    if let Some(parent) = path.parent() {
        if !parent.exists() {
            fs::create_dir_all(parent).map_err(|source| AgentError::WriteFailed {
                path: path.clone(),
                source,
            })?;
        }
    }

    fs::write(&path, content).map_err(|source| AgentError::WriteFailed {
        path: path.clone(),
        source,
    })?;

    info!(path = %path.display(), bytes = content.len(), "File written");
    ui::success(format!("Written to {}", target));
    Ok(WriteOutcome::Written { path, backup })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backup::BackupManager;
    use crate::testing::ScriptedPrompter;
    use tempfile::TempDir;

    #[test]
    fn test_write_new_file_creates_dirs_without_backup() {
        let dir = TempDir::new().unwrap();
        let ctx = ToolContext::new(dir.path().to_path_buf());
        let backups = BackupManager::shared();
        let mut prompter = ScriptedPrompter::new(["y"]);

        let outcome = write_file(&ctx, "a/b/new.txt", "hello", &backups, &mut prompter).unwrap();

        let path = dir.path().join("a/b/new.txt");
        assert_eq!(outcome, WriteOutcome::Written { path: path.clone(), backup: None });
        assert_eq!(fs::read_to_string(path).unwrap(), "hello");
        assert!(backups.lock().is_empty());
    }

    #[test]
    fn test_overwrite_backs_up_old_content() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("config.toml");
        fs::write(&file, "old = true\n").unwrap();

        let ctx = ToolContext::new(dir.path().to_path_buf());
        let backups = BackupManager::shared();
        let mut prompter = ScriptedPrompter::new(["yes"]);

        let outcome = write_file(&ctx, "config.toml", "new = true\n", &backups, &mut prompter).unwrap();
        let backup = match outcome {
            WriteOutcome::Written { backup: Some(b), .. } => b,
            other => panic!("unexpected outcome: {:?}", other),
        };

        assert_eq!(fs::read_to_string(&file).unwrap(), "new = true\n");
        assert_eq!(fs::read_to_string(&backup).unwrap(), "old = true\n");
        assert_eq!(backups.lock().most_recent().unwrap().backup_path, backup);
    }

    #[test]
    fn test_declined_write_leaves_file_untouched() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("keep.txt");
        fs::write(&file, b"original bytes").unwrap();

        let ctx = ToolContext::new(dir.path().to_path_buf());
        let backups = BackupManager::shared();
        let mut prompter = ScriptedPrompter::new(["n"]);

        let outcome = write_file(&ctx, "keep.txt", "clobbered", &backups, &mut prompter).unwrap();

        assert_eq!(outcome, WriteOutcome::Declined);
        assert_eq!(fs::read(&file).unwrap(), b"original bytes");
        assert!(backups.lock().is_empty());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }
}
