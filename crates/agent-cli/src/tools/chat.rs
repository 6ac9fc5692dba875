//! Conversational reply tool

use llm_core::{ChatMessage, Gateway};

use crate::error::AgentError;
use crate::progress::Indicator;

fn system_prompt(context: &str) -> String {
    format!(
        "You are a helpful coding assistant. Provide clear, concise, and accurate \
         responses to coding questions and requests.\n\n\
         Context from recent actions:\n{}",
        context
    )
}

/// Ask the model `message` with the recent-action context; returns its reply
/// verbatim.
pub async fn chat(
    gateway: &dyn Gateway,
    message: &str,
    context: &str,
) -> Result<String, AgentError> {
    let messages = [
        ChatMessage::system(system_prompt(context)),
        ChatMessage::user(message),
    ];

    let indicator = Indicator::thinking("Thinking...");
    let reply = gateway.chat(&messages, None).await;
    indicator.finish();

    reply.map_err(AgentError::gateway)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedGateway;
    use llm_core::Role;

    #[tokio::test]
    async fn test_chat_sends_context_and_returns_reply() {
        let gateway = ScriptedGateway::new(["A closure captures its environment."]);
        let reply = chat(&gateway, "what is a closure?", "No previous context")
            .await
            .unwrap();

        assert_eq!(reply, "A closure captures its environment.");
        let requests = gateway.requests();
        assert_eq!(requests[0].len(), 2);
        assert_eq!(requests[0][0].role, Role::System);
        assert!(requests[0][0].content.contains("Context from recent actions:\nNo previous context"));
        assert_eq!(requests[0][1].content, "what is a closure?");
    }

    #[tokio::test]
    async fn test_gateway_failure_maps_to_error() {
        let gateway = ScriptedGateway::default();
        gateway.push_error("rate limited");
        let err = chat(&gateway, "hi", "").await.unwrap_err();
        assert!(matches!(err, AgentError::Gateway(ref m) if m.contains("rate limited")));
    }
}
