//! llm-core: Language model gateway for my-agent
//!
//! Provides:
//! - Chat message types shared by every prompt site
//! - The `Gateway` trait (one request, one text reply)
//! - OpenRouter client (OpenAI-compatible chat completions)
//! - Gateway configuration from the environment

pub mod config;
pub mod gateway;
pub mod openrouter;

pub use config::GatewayConfig;
pub use gateway::{ChatMessage, Gateway, Role};
pub use openrouter::OpenRouterClient;
