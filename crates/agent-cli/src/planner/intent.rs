//! Single-action planning

use llm_core::{ChatMessage, Gateway};
use std::sync::Arc;
use tracing::{debug, instrument, warn};

use crate::action::ActionSpec;
use crate::error::{AgentError, ParseFailure};
use crate::planner::reply::parse_action_reply;
use crate::workspace::WorkspaceProbe;

const ACTION_SHAPES: &str = r#"Available actions:
- {"type": "read", "target": "path/to/file", "reasoning": "why"}: read a file
- {"type": "write", "target": "path/to/file", "content": "full file content", "reasoning": "why"}: create or replace a file
- {"type": "run", "command": "shell command", "reasoning": "why"}: run a shell command
- {"type": "rollback", "reasoning": "why"}: undo the most recent file write
- {"type": "chat", "message": "reply or question", "reasoning": "why"}: answer without touching files"#;

/// Asks the model for exactly one action per instruction
pub struct IntentPlanner {
    gateway: Arc<dyn Gateway>,
    probe: Arc<WorkspaceProbe>,
}

impl IntentPlanner {
    pub fn new(gateway: Arc<dyn Gateway>, probe: Arc<WorkspaceProbe>) -> Self {
        Self { gateway, probe }
    }

    /// Plan one action for `instruction`.
    ///
    /// An unusable reply becomes a chat action carrying the instruction
    /// verbatim. Only a failed model call is an error.
    #[instrument(skip(self, context))]
    pub async fn plan(&self, instruction: &str, context: &str) -> Result<ActionSpec, AgentError> {
        let environment = self.probe.describe().await;
        let messages = [
            ChatMessage::system(system_prompt(environment, context)),
            ChatMessage::user(instruction),
        ];

        let reply = self
            .gateway
            .chat(&messages, None)
            .await
            .map_err(AgentError::gateway)?;

        match parse_action_reply(&reply) {
            Ok(spec) => {
                debug!(action = %spec.summary(), "Planned action");
                Ok(spec)
            }
            Err(cause) => {
                warn!(%cause, "Unusable planner reply, falling back to chat");
                Ok(fallback_action(instruction, &cause))
            }
        }
    }
}

/// Chat action used when the model's reply cannot be read
pub fn fallback_action(instruction: &str, cause: &ParseFailure) -> ActionSpec {
    ActionSpec::chat(instruction, format!("Fallback to chat: {}", cause))
}

fn system_prompt(environment: &str, context: &str) -> String {
    format!(
        "You are a coding agent working in a terminal. Turn the user's instruction \
         into exactly one action.\n\n\
         {shapes}\n\n\
         {environment}\n\n\
         Context from recent actions:\n{context}\n\n\
         Rules:\n\
         - Use commands that work on this operating system and shell\n\
         - Paths are relative to the working directory unless absolute\n\
         - Prefer chat when the instruction is a question\n\
         - Respond ONLY with valid JSON, no prose and no code fences",
        shapes = ACTION_SHAPES,
        environment = environment,
        context = context,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::ActionKind;
    use crate::testing::ScriptedGateway;
    use tempfile::TempDir;

    fn planner(dir: &TempDir, gateway: Arc<ScriptedGateway>) -> IntentPlanner {
        IntentPlanner::new(gateway, Arc::new(WorkspaceProbe::new(dir.path())))
    }

    #[tokio::test]
    async fn test_valid_reply() {
        let dir = TempDir::new().unwrap();
        let gateway = Arc::new(ScriptedGateway::new([
            r#"{"type": "read", "target": "package.json", "reasoning": "inspect"}"#,
        ]));
        let spec = planner(&dir, gateway.clone())
            .plan("read package.json", "No previous context")
            .await
            .unwrap();

        assert_eq!(spec.parsed_kind(), Some(ActionKind::Read));
        assert_eq!(spec.target.as_deref(), Some("package.json"));

        let request = &gateway.requests()[0];
        assert!(request[0].content.contains("Respond ONLY with valid JSON"));
        assert!(request[0].content.contains("No previous context"));
        assert_eq!(request[1].content, "read package.json");
    }

    #[tokio::test]
    async fn test_empty_and_non_json_replies_fall_back_to_chat() {
        let dir = TempDir::new().unwrap();
        let instruction = "  explain   this repo, please ";
        for reply in ["", "I think you should read the README."] {
            let gateway = Arc::new(ScriptedGateway::new([reply]));
            let spec = planner(&dir, gateway).plan(instruction, "").await.unwrap();

            assert_eq!(spec.parsed_kind(), Some(ActionKind::Chat));
            assert_eq!(spec.message.as_deref(), Some(instruction));
            assert!(spec.reasoning.unwrap().starts_with("Fallback to chat"));
        }
    }

    #[tokio::test]
    async fn test_missing_kind_falls_back() {
        let dir = TempDir::new().unwrap();
        let gateway = Arc::new(ScriptedGateway::new([r#"{"target": "a.txt"}"#]));
        let spec = planner(&dir, gateway).plan("open a.txt", "").await.unwrap();
        assert_eq!(spec.message.as_deref(), Some("open a.txt"));
        assert!(spec.reasoning.unwrap().contains("no action type"));
    }

    #[tokio::test]
    async fn test_gateway_failure_propagates() {
        let dir = TempDir::new().unwrap();
        let gateway = Arc::new(ScriptedGateway::default());
        gateway.push_error("503 Service Unavailable");
        let err = planner(&dir, gateway).plan("hi", "").await.unwrap_err();
        assert!(matches!(err, AgentError::Gateway(_)));
    }

    #[tokio::test]
    async fn test_environment_probed_once() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("before.txt"), "").unwrap();
        let gateway = Arc::new(ScriptedGateway::new(["", ""]));
        let planner = planner(&dir, gateway.clone());

        planner.plan("one", "").await.unwrap();
        std::fs::write(dir.path().join("after.txt"), "").unwrap();
        planner.plan("two", "").await.unwrap();

        let requests = gateway.requests();
        assert!(requests[0][0].content.contains("before.txt"));
        assert!(!requests[1][0].content.contains("after.txt"));
    }
}
