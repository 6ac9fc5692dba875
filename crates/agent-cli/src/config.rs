//! User configuration for my-agent
//!
//! Configuration file: ~/.config/my-agent/config.toml (or platform equivalent)

use anyhow::{Context, Result};
use llm_core::config::{DEFAULT_BASE_URL, DEFAULT_MODEL, DEFAULT_TEMPERATURE, DEFAULT_TIMEOUT_SECS};
use llm_core::GatewayConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::tools::{ToolContext, DEFAULT_COMMAND_TIMEOUT_SECS, DEFAULT_MAX_OUTPUT_BYTES};

/// User configuration for the my-agent CLI
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UserConfig {
    /// Model connection settings
    #[serde(default)]
    pub llm: LlmConfig,

    /// Interactive session settings
    #[serde(default)]
    pub repl: ReplConfig,

    /// Tool limits
    #[serde(default)]
    pub tools: ToolsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Default model (overridden by MY_AGENT_MODEL and --model)
    #[serde(default)]
    pub model: Option<String>,

    /// API base URL (overridden by OPENROUTER_BASE_URL)
    #[serde(default)]
    pub base_url: Option<String>,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplConfig {
    /// Maximum history entries to keep
    #[serde(default = "default_history_size")]
    pub history_size: usize,

    /// Print the banner on start
    #[serde(default = "default_true")]
    pub show_welcome: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// Seconds before a shell command is killed
    #[serde(default = "default_command_timeout")]
    pub command_timeout_secs: u64,

    /// Cap on captured output per stream, in bytes
    #[serde(default = "default_max_output")]
    pub max_output_bytes: usize,
}

fn default_temperature() -> f32 {
    DEFAULT_TEMPERATURE
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_history_size() -> usize {
    1000
}

fn default_true() -> bool {
    true
}

fn default_command_timeout() -> u64 {
    DEFAULT_COMMAND_TIMEOUT_SECS
}

fn default_max_output() -> usize {
    DEFAULT_MAX_OUTPUT_BYTES
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: None,
            base_url: None,
            temperature: default_temperature(),
            timeout_secs: default_timeout(),
        }
    }
}

impl Default for ReplConfig {
    fn default() -> Self {
        Self {
            history_size: default_history_size(),
            show_welcome: true,
        }
    }
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            command_timeout_secs: default_command_timeout(),
            max_output_bytes: default_max_output(),
        }
    }
}

impl ToolsConfig {
    /// Tool context rooted at `working_dir` with these limits
    pub fn context(&self, working_dir: PathBuf) -> ToolContext {
        ToolContext::new(working_dir)
            .with_command_timeout(self.command_timeout_secs)
            .with_max_output(self.max_output_bytes)
    }
}

/// Which gateway settings the environment set explicitly
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvOverrides {
    pub model: bool,
    pub base_url: bool,
}

impl EnvOverrides {
    pub fn from_env() -> Self {
        let set = |key: &str| std::env::var(key).map(|v| !v.trim().is_empty()).unwrap_or(false);
        Self {
            model: set(llm_core::config::MODEL_VAR),
            base_url: set(llm_core::config::BASE_URL_VAR),
        }
    }
}

impl UserConfig {
    /// Load user configuration from default location
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;

        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config from {}", path.display()))
    }

    /// Get the configuration file path
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("my-agent").join("config.toml"))
    }

    /// Create a default configuration file with comments
    pub fn create_default() -> Result<PathBuf> {
        let path = Self::config_path()?;

        if path.exists() {
            anyhow::bail!("Config file already exists: {}", path.display());
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let default_config = format!(
            r#"# my-agent configuration
# Location: ~/.config/my-agent/config.toml
# The API key is read from OPENROUTER_API_KEY (a .env file works too).

[llm]
# Model to use (MY_AGENT_MODEL and --model take precedence)
# model = "{model}"

# API base URL (OPENROUTER_BASE_URL takes precedence)
# base_url = "{base_url}"

# Sampling temperature
temperature = {temperature}

# Request timeout in seconds
timeout_secs = {timeout}

[repl]
# Maximum history entries to keep
history_size = 1000

# Print the banner on start
show_welcome = true

[tools]
# Seconds before a shell command is killed
command_timeout_secs = {command_timeout}

# Cap on captured output per stream, in bytes
max_output_bytes = {max_output}
"#,
            model = DEFAULT_MODEL,
            base_url = DEFAULT_BASE_URL,
            temperature = DEFAULT_TEMPERATURE,
            timeout = DEFAULT_TIMEOUT_SECS,
            command_timeout = DEFAULT_COMMAND_TIMEOUT_SECS,
            max_output = DEFAULT_MAX_OUTPUT_BYTES,
        );

        fs::write(&path, default_config)?;

        Ok(path)
    }

    /// Layer file settings under the environment and the command line.
    ///
    /// `env` already holds the credential and any environment overrides;
    /// `overridden` says which of model and base URL came from there.
    pub fn apply(
        &self,
        mut env: GatewayConfig,
        cli_model: Option<String>,
        overridden: EnvOverrides,
    ) -> GatewayConfig {
        if !overridden.model {
            if let Some(model) = &self.llm.model {
                env = env.with_model(model.clone());
            }
        }
        if !overridden.base_url {
            if let Some(url) = &self.llm.base_url {
                env = env.with_base_url(url.clone());
            }
        }
        if let Some(model) = cli_model {
            env = env.with_model(model);
        }
        env.with_temperature(self.llm.temperature)
            .with_timeout(self.llm.timeout_secs)
    }
}
