//! Action model
//!
//! The model speaks `ActionSpec`: a lenient JSON record where every field is
//! optional. `Action` is the closed, validated form the executor accepts; the
//! only way to build one is `Action::from_spec`, which enforces the
//! required fields of each kind.

use serde_json::Value;

use crate::error::AgentError;

/// The closed set of operations the agent can perform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    Read,
    Write,
    Run,
    Rollback,
    Chat,
}

impl ActionKind {
    #[cfg(test)]
    pub const ALL: [ActionKind; 5] = [
        ActionKind::Read,
        ActionKind::Write,
        ActionKind::Run,
        ActionKind::Rollback,
        ActionKind::Chat,
    ];

    /// Parse a kind name, ignoring case and surrounding whitespace
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "read" => Some(ActionKind::Read),
            "write" => Some(ActionKind::Write),
            "run" => Some(ActionKind::Run),
            "rollback" => Some(ActionKind::Rollback),
            "chat" => Some(ActionKind::Chat),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Read => "read",
            ActionKind::Write => "write",
            ActionKind::Run => "run",
            ActionKind::Rollback => "rollback",
            ActionKind::Chat => "chat",
        }
    }
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An action as proposed by the model, before validation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionSpec {
    /// Raw kind name (`type` or `kind` in the reply)
    pub kind: Option<String>,
    pub target: Option<String>,
    pub content: Option<String>,
    pub command: Option<String>,
    pub message: Option<String>,
    pub reasoning: Option<String>,
}

impl ActionSpec {
    /// Read the action fields out of a JSON object. Returns `None` for
    /// anything that is not an object. Unknown keys are ignored.
    pub fn from_json(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        let field = |name: &str| obj.get(name).and_then(|v| v.as_str()).map(str::to_string);

        Some(Self {
            kind: field("type").or_else(|| field("kind")),
            target: field("target"),
            content: field("content"),
            command: field("command"),
            message: field("message"),
            reasoning: field("reasoning"),
        })
    }

    /// A chat action carrying `message`
    pub fn chat(message: impl Into<String>, reasoning: impl Into<String>) -> Self {
        Self {
            kind: Some(ActionKind::Chat.to_string()),
            message: Some(message.into()),
            reasoning: Some(reasoning.into()),
            ..Default::default()
        }
    }

    /// The parsed kind, if the name is one we know
    pub fn parsed_kind(&self) -> Option<ActionKind> {
        self.kind.as_deref().and_then(ActionKind::from_name)
    }

    /// Compact `kind(target-or-command)` rendering used in memory and logs
    pub fn summary(&self) -> String {
        let kind = self
            .parsed_kind()
            .map(|k| k.to_string())
            .or_else(|| self.kind.clone())
            .unwrap_or_else(|| "unknown".to_string());
        let subject = self
            .target
            .as_deref()
            .or(self.command.as_deref())
            .unwrap_or("");
        format!("{}({})", kind, subject)
    }
}

/// A validated action, ready for dispatch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Read { target: String },
    Write { target: String, content: String },
    Run { command: String },
    Rollback,
    Chat { message: String },
}

impl Action {
    /// Validate `spec` against the required fields of its kind.
    ///
    /// A chat action without a message uses `fallback_message`. Blank targets
    /// and commands count as missing; write content may be empty.
    pub fn from_spec(spec: &ActionSpec, fallback_message: &str) -> Result<Self, AgentError> {
        let name = spec
            .kind
            .as_deref()
            .ok_or_else(|| AgentError::MalformedAction("action has no type".to_string()))?;
        let kind = ActionKind::from_name(name)
            .ok_or_else(|| AgentError::MalformedAction(format!("unknown action type '{}'", name)))?;

        let required = |value: &Option<String>, field: &str| -> Result<String, AgentError> {
            match value.as_deref().map(str::trim) {
                Some(v) if !v.is_empty() => Ok(v.to_string()),
                _ => Err(AgentError::MalformedAction(format!(
                    "{} action requires '{}'",
                    kind, field
                ))),
            }
        };

        match kind {
            ActionKind::Read => Ok(Action::Read {
                target: required(&spec.target, "target")?,
            }),
            ActionKind::Write => {
                let target = required(&spec.target, "target")?;
                let content = spec.content.clone().ok_or_else(|| {
                    AgentError::MalformedAction("write action requires 'content'".to_string())
                })?;
                Ok(Action::Write { target, content })
            }
            ActionKind::Run => Ok(Action::Run {
                command: required(&spec.command, "command")?,
            }),
            ActionKind::Rollback => Ok(Action::Rollback),
            ActionKind::Chat => {
                let message = spec
                    .message
                    .clone()
                    .filter(|m| !m.trim().is_empty())
                    .unwrap_or_else(|| fallback_message.to_string());
                Ok(Action::Chat { message })
            }
        }
    }

    pub fn kind(&self) -> ActionKind {
        match self {
            Action::Read { .. } => ActionKind::Read,
            Action::Write { .. } => ActionKind::Write,
            Action::Run { .. } => ActionKind::Run,
            Action::Rollback => ActionKind::Rollback,
            Action::Chat { .. } => ActionKind::Chat,
        }
    }
}
