//! Interactive session
//!
//! Reads instructions until `exit`, hands each one to the orchestrator and
//! keeps going whatever the outcome. Lines starting with `/` are session
//! commands.

use anyhow::Result;
use std::io::{stdout, Write};

use crate::agent::Orchestrator;
use crate::input::Prompter;
use crate::ui::{self, BOLD, CYAN, DIM, GREEN, RESET};

const PROMPT: &str = "my-agent> ";

/// Run the read-eval loop until the user leaves or input closes
pub async fn run(
    orchestrator: &mut Orchestrator,
    prompter: &mut dyn Prompter,
    model: &str,
    show_welcome: bool,
) -> Result<()> {
    if show_welcome {
        print_welcome(model);
    }

    let prompt = format!("{}{}{}", GREEN, PROMPT, RESET);
    loop {
        let Some(line) = prompter.read_line(&prompt)? else {
            break;
        };

        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        prompter.add_history(input);

        if is_exit(input) {
            break;
        }

        if input.starts_with('/') {
            if handle_command(input, orchestrator)? {
                break;
            }
            continue;
        }

        orchestrator.handle(input, prompter).await;
        println!();
        ui::dim("Ready for next command");
        ui::separator();
    }

    println!("{}Goodbye!{}", DIM, RESET);
    Ok(())
}

fn is_exit(input: &str) -> bool {
    matches!(input.to_lowercase().as_str(), "exit" | "quit" | "q")
}

fn print_welcome(model: &str) {
    ui::header("my-agent: plan-and-act coding assistant");
    println!("{}Model:{} {}", DIM, RESET, model);
    println!(
        "{}Type an instruction, /help for commands, or exit to quit.{}",
        DIM, RESET
    );
    println!();
}

/// Handle a slash command. Returns true if the session should end.
fn handle_command(input: &str, orchestrator: &mut Orchestrator) -> Result<bool> {
    let command = input.split_whitespace().next().unwrap_or(input);

    match command {
        "/help" | "/?" => print_help(),
        "/memory" => print_memory(orchestrator),
        "/backups" => print_backups(orchestrator),
        "/forget" => {
            orchestrator.memory_mut().clear();
            ui::success("Memory cleared");
        }
        "/clear" => {
            print!("\x1b[2J\x1b[H");
            stdout().flush()?;
        }
        "/exit" | "/quit" => return Ok(true),
        other => ui::warning(format!("Unknown command: {} (try /help)", other)),
    }

    Ok(false)
}

fn print_help() {
    println!("{}Commands:{}", BOLD, RESET);
    println!("  {}/help{}      Show this help", CYAN, RESET);
    println!("  {}/memory{}    Show recent instructions and results", CYAN, RESET);
    println!("  {}/backups{}   Show files that can be rolled back", CYAN, RESET);
    println!("  {}/forget{}    Clear recent-action memory", CYAN, RESET);
    println!("  {}/clear{}     Clear the screen", CYAN, RESET);
    println!("  {}exit{}       Leave (also quit, q, Ctrl-D)", CYAN, RESET);
    println!();
    println!("{}Examples:{}", BOLD, RESET);
    println!("  read Cargo.toml");
    println!("  run the test suite");
    println!("  create a CLI flag for verbose output and then update the README");
    println!("  undo the last change");
}

fn print_memory(orchestrator: &Orchestrator) {
    let memory = orchestrator.memory();
    if memory.is_empty() {
        ui::info("Nothing remembered yet");
        return;
    }

    println!("{}Recent actions:{}", BOLD, RESET);
    for (i, entry) in memory.entries().enumerate() {
        let action = entry
            .action
            .as_ref()
            .map(|a| a.summary())
            .unwrap_or_else(|| "none".to_string());
        println!(
            "  {}{}.{} [{}] {} {}-> {}{}",
            CYAN,
            i + 1,
            RESET,
            entry.timestamp.format("%H:%M:%S"),
            entry.instruction,
            DIM,
            action,
            RESET
        );
    }
}

fn print_backups(orchestrator: &Orchestrator) {
    let backups = orchestrator.backups().lock();
    if backups.is_empty() {
        ui::info("No backups yet");
        return;
    }

    println!("{}Backups (newest last):{}", BOLD, RESET);
    for entry in backups.entries() {
        println!(
            "  {} {}<- {}{}",
            entry.original_path.display(),
            DIM,
            entry.timestamp,
            RESET
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backup::BackupManager;
    use crate::testing::{ScriptedGateway, ScriptedPrompter};
    use crate::tools::ToolContext;
    use std::fs;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn orchestrator(dir: &TempDir, gateway: Arc<ScriptedGateway>) -> Orchestrator {
        Orchestrator::new(
            gateway,
            BackupManager::shared(),
            ToolContext::new(dir.path().to_path_buf()),
        )
    }

    #[test]
    fn test_exit_words() {
        assert!(is_exit("exit"));
        assert!(is_exit("QUIT"));
        assert!(is_exit("q"));
        assert!(!is_exit("quiet"));
    }

    #[tokio::test]
    async fn test_loop_runs_instructions_until_exit() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.txt"), "alpha").unwrap();
        let gateway = Arc::new(ScriptedGateway::new([r#"{"type": "read", "target": "a.txt"}"#]));
        let mut agent = orchestrator(&dir, gateway.clone());
        let mut prompter = ScriptedPrompter::new(["", "read a.txt", "exit", "read a.txt"]);

        run(&mut agent, &mut prompter, "test/model", false).await.unwrap();

        assert_eq!(gateway.calls(), 1);
        assert_eq!(agent.memory().len(), 1);
        assert_eq!(prompter.prompts().len(), 3);
    }

    #[tokio::test]
    async fn test_loop_survives_failures_and_ends_on_eof() {
        let dir = TempDir::new().unwrap();
        let gateway = Arc::new(ScriptedGateway::default());
        gateway.push_error("boom");
        let mut agent = orchestrator(&dir, gateway);
        let mut prompter = ScriptedPrompter::new(["hello", "/memory"]);

        run(&mut agent, &mut prompter, "test/model", false).await.unwrap();

        assert_eq!(agent.memory().len(), 1);
        assert_eq!(prompter.prompts().len(), 3);
    }

    #[test]
    fn test_slash_commands() {
        let dir = TempDir::new().unwrap();
        let mut agent = orchestrator(&dir, Arc::new(ScriptedGateway::default()));
        agent.memory_mut().add("x", None, "y");

        assert!(!handle_command("/forget", &mut agent).unwrap());
        assert!(agent.memory().is_empty());
        assert!(!handle_command("/backups", &mut agent).unwrap());
        assert!(!handle_command("/nonsense", &mut agent).unwrap());
        assert!(handle_command("/exit", &mut agent).unwrap());
    }
}
