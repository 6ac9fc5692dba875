//! Description of the machine and project the agent works in
//!
//! Planner prompts include the OS, shell, working directory, a shallow file
//! tree, git state and available package managers. Building it walks the
//! filesystem and spawns git, so a [`WorkspaceProbe`] builds it once and hands
//! out the same text afterwards.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tokio::sync::OnceCell;
use tokio::time::{timeout, Duration};
use tracing::debug;
use walkdir::{DirEntry, WalkDir};

const TREE_DEPTH: usize = 2;
const TREE_MAX_ENTRIES: usize = 200;
const GIT_TIMEOUT: Duration = Duration::from_secs(5);
const NO_GIT: &str = "Not a git repository or git not available";

const IGNORED_DIRS: &[&str] = &[
    "node_modules",
    ".git",
    "dist",
    "build",
    "coverage",
    ".next",
    "target",
    ".idea",
    ".vscode",
    "__pycache__",
    ".pytest_cache",
    "venv",
    ".env",
];

const PACKAGE_MANAGERS: &[&str] = &["cargo", "npm", "yarn", "pnpm", "bun", "pip"];

/// Lazily built, cached environment description
pub struct WorkspaceProbe {
    root: PathBuf,
    description: OnceCell<String>,
}

impl WorkspaceProbe {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            description: OnceCell::new(),
        }
    }

    /// The environment description, built on first use
    pub async fn describe(&self) -> &str {
        self.description
            .get_or_init(|| build_description(&self.root))
            .await
    }
}

async fn build_description(root: &Path) -> String {
    debug!(root = %root.display(), "Probing workspace");
    let git = git_info(root).await;
    let managers = detect_package_managers();
    let managers = if managers.is_empty() {
        "none detected".to_string()
    } else {
        managers.join(", ")
    };

    format!(
        "SYSTEM INFORMATION:\n\
         - OS: {os} ({arch})\n\
         - Shell: {shell}\n\
         - Working directory: {cwd}\n\
         - Package managers: {managers}\n\n\
         PROJECT STRUCTURE:\n{tree}\n\n\
         GIT STATUS:\n{git}\n\n\
         SHELL GUIDELINES:\n{guidelines}",
        os = std::env::consts::OS,
        arch = std::env::consts::ARCH,
        shell = shell_name(),
        cwd = root.display(),
        managers = managers,
        tree = file_tree(root),
        git = git,
        guidelines = shell_guidelines(),
    )
}

fn shell_name() -> String {
    std::env::var("SHELL")
        .ok()
        .and_then(|s| {
            Path::new(&s)
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
        })
        .unwrap_or_else(|| {
            if cfg!(target_os = "windows") {
                "cmd".to_string()
            } else {
                "sh".to_string()
            }
        })
}

fn shell_guidelines() -> &'static str {
    if cfg!(target_os = "windows") {
        "- Commands run through cmd /C\n\
         - Use dir, type, copy, move, del; paths use backslashes"
    } else {
        "- Commands run through sh -c\n\
         - Use ls, cat, cp, mv, rm, grep, find; paths use forward slashes\n\
         - Chain dependent commands with &&"
    }
}

fn detect_package_managers() -> Vec<&'static str> {
    PACKAGE_MANAGERS
        .iter()
        .copied()
        .filter(|name| which::which(name).is_ok())
        .collect()
}

fn is_ignored(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .map(|name| IGNORED_DIRS.contains(&name))
            .unwrap_or(false)
}

/// Indented tree to a fixed depth, directories first then by name
fn file_tree(root: &Path) -> String {
    let walker = WalkDir::new(root)
        .min_depth(1)
        .max_depth(TREE_DEPTH)
        .sort_by(|a, b| {
            b.file_type()
                .is_dir()
                .cmp(&a.file_type().is_dir())
                .then_with(|| a.file_name().cmp(b.file_name()))
        })
        .into_iter()
        .filter_entry(|e| !is_ignored(e))
        .filter_map(|e| e.ok());

    let mut lines = Vec::new();
    let mut skipped = 0usize;
    for entry in walker {
        if lines.len() >= TREE_MAX_ENTRIES {
            skipped += 1;
            continue;
        }
        let indent = "  ".repeat(entry.depth() - 1);
        let name = entry.file_name().to_string_lossy();
        let suffix = if entry.file_type().is_dir() { "/" } else { "" };
        lines.push(format!("{}{}{}", indent, name, suffix));
    }

    if lines.is_empty() {
        return "(empty directory)".to_string();
    }
    if skipped > 0 {
        lines.push(format!("... ({} more entries)", skipped));
    }
    lines.join("\n")
}

async fn git_output(root: &Path, args: &[&str]) -> Option<String> {
    let output = Command::new("git")
        .args(args)
        .current_dir(root)
        .stdin(Stdio::null())
        .kill_on_drop(true)
        .output();

    match timeout(GIT_TIMEOUT, output).await {
        Ok(Ok(out)) if out.status.success() => {
            Some(String::from_utf8_lossy(&out.stdout).trim().to_string())
        }
        _ => None,
    }
}

async fn git_info(root: &Path) -> String {
    let Some(branch) = git_output(root, &["branch", "--show-current"]).await else {
        return NO_GIT.to_string();
    };
    let status = git_output(root, &["status", "--short"])
        .await
        .unwrap_or_default();

    let branch: &str = if branch.is_empty() { "(detached)" } else { &branch };
    let status = if status.is_empty() {
        "clean".to_string()
    } else {
        status
    };
    format!("Branch: {}\nChanges:\n{}", branch, status)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_file_tree_order_depth_and_ignores() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("src/deep/deeper")).unwrap();
        fs::create_dir_all(dir.path().join("node_modules/pkg")).unwrap();
        fs::create_dir_all(dir.path().join("target/debug")).unwrap();
        fs::write(dir.path().join("src/main.rs"), "").unwrap();
        fs::write(dir.path().join("Cargo.toml"), "").unwrap();
        fs::write(dir.path().join("README.md"), "").unwrap();

        let tree = file_tree(dir.path());
        let lines: Vec<&str> = tree.lines().collect();

        assert_eq!(lines[0], "src/");
        assert!(lines.contains(&"  deep/"));
        assert!(lines.contains(&"  main.rs"));
        assert!(!tree.contains("deeper"));
        assert!(!tree.contains("node_modules"));
        assert!(!tree.contains("target"));
        let cargo = lines.iter().position(|l| *l == "Cargo.toml").unwrap();
        let readme = lines.iter().position(|l| *l == "README.md").unwrap();
        assert!(cargo < readme);
    }

    #[test]
    fn test_empty_tree() {
        let dir = TempDir::new().unwrap();
        assert_eq!(file_tree(dir.path()), "(empty directory)");
    }

    #[tokio::test]
    async fn test_description_is_built_once() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("first.txt"), "").unwrap();

        let probe = WorkspaceProbe::new(dir.path());
        let first = probe.describe().await.to_string();
        fs::write(dir.path().join("second.txt"), "").unwrap();
        let second = probe.describe().await;

        assert_eq!(first, second);
        assert!(first.contains("first.txt"));
        assert!(!second.contains("second.txt"));
        assert!(first.contains(std::env::consts::OS));
    }

    #[tokio::test]
    async fn test_non_repository() {
        let dir = TempDir::new().unwrap();
        // a temp dir may sit inside a repository on some machines
        let info = git_info(dir.path()).await;
        assert!(info == NO_GIT || info.starts_with("Branch:"));
    }
}
