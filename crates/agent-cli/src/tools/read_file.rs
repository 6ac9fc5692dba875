//! File read tool

use std::fs;

use crate::error::AgentError;
use crate::memory::truncate_chars;
use crate::tools::ToolContext;
use crate::ui;

/// Files longer than this are previewed rather than echoed
const ECHO_LIMIT_CHARS: usize = 1000;
const PREVIEW_CHARS: usize = 500;

/// Return the file's contents verbatim
pub fn read_file(ctx: &ToolContext, target: &str) -> Result<String, AgentError> {
    let path = ctx.resolve(target);
    let content =
        fs::read_to_string(&path).map_err(|source| AgentError::ReadFailed { path, source })?;

    let chars = content.chars().count();
    ui::success(format!("Read {} ({} characters)", target, chars));
    if chars > ECHO_LIMIT_CHARS {
        ui::dim(truncate_chars(&content, PREVIEW_CHARS));
    } else if !content.is_empty() {
        ui::dim(&content);
    }

    Ok(content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_read_returns_contents_verbatim() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("package.json"), "{\"a\":1}").unwrap();

        let ctx = ToolContext::new(dir.path().to_path_buf());
        assert_eq!(read_file(&ctx, "package.json").unwrap(), "{\"a\":1}");
    }

    #[test]
    fn test_read_missing_file() {
        let dir = TempDir::new().unwrap();
        let ctx = ToolContext::new(dir.path().to_path_buf());
        let err = read_file(&ctx, "missing.txt").unwrap_err();
        assert!(matches!(err, AgentError::ReadFailed { .. }));
        assert!(err.to_string().contains("missing.txt"));
    }
}
