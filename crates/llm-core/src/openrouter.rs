//! OpenRouter API client (OpenAI-compatible chat completions)

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};

use crate::config::GatewayConfig;
use crate::gateway::{ChatMessage, Gateway};

const REFERER: &str = "https://github.com/coding-agent-cli";
const TITLE: &str = "Coding Agent CLI";

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    #[serde(default)]
    message: Option<ReplyMessage>,
}

#[derive(Debug, Deserialize)]
struct ReplyMessage {
    #[serde(default)]
    content: Option<String>,
}

/// OpenRouter API client
#[derive(Debug, Clone)]
pub struct OpenRouterClient {
    config: GatewayConfig,
    client: reqwest::Client,
}

impl OpenRouterClient {
    pub fn new(config: GatewayConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { config, client })
    }

    /// Model used when a call does not override it
    pub fn default_model(&self) -> &str {
        &self.config.model
    }
}

#[async_trait]
impl Gateway for OpenRouterClient {
    #[instrument(skip(self, messages), fields(count = messages.len()))]
    async fn chat(&self, messages: &[ChatMessage], model: Option<&str>) -> Result<String> {
        let model = model.unwrap_or(&self.config.model);
        let req = CompletionRequest {
            model,
            messages,
            temperature: self.config.temperature,
        };

        let resp = self
            .client
            .post(self.config.completions_url())
            .bearer_auth(&self.config.api_key)
            .header("HTTP-Referer", REFERER)
            .header("X-Title", TITLE)
            .json(&req)
            .send()
            .await
            .context("Failed to reach the model API")?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            bail!("Model API returned {}: {}", status, body.trim());
        }

        let body: CompletionResponse = resp
            .json()
            .await
            .context("Failed to parse chat completion response")?;

        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message)
            .and_then(|m| m.content)
            .unwrap_or_default();

        debug!(model, chars = content.len(), "Chat completion received");
        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> OpenRouterClient {
        let config = GatewayConfig::new("sk-test").with_base_url(server.uri());
        OpenRouterClient::new(config).unwrap()
    }

    #[tokio::test]
    async fn test_chat_returns_first_choice() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .and(header("x-title", TITLE))
            .and(body_partial_json(json!({
                "model": "openai/gpt-oss-20b:free",
                "messages": [{"role": "user", "content": "hello"}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"role": "assistant", "content": "{\"type\":\"rollback\"}"}}]
            })))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let reply = client.chat(&[ChatMessage::user("hello")], None).await.unwrap();
        assert_eq!(reply, "{\"type\":\"rollback\"}");
    }

    #[tokio::test]
    async fn test_model_override() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({"model": "other/model"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"content": "ok"}}]
            })))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let reply = client
            .chat(&[ChatMessage::user("hi")], Some("other/model"))
            .await
            .unwrap();
        assert_eq!(reply, "ok");
    }

    #[tokio::test]
    async fn test_missing_content_is_empty_reply() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let reply = client.chat(&[ChatMessage::user("hi")], None).await.unwrap();
        assert!(reply.is_empty());
    }

    #[tokio::test]
    async fn test_error_status_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid key"))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let err = client.chat(&[ChatMessage::user("hi")], None).await.unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("401"));
        assert!(msg.contains("invalid key"));
    }
}
