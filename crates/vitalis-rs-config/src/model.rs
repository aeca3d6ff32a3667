//! Configuration schema for Vitalis.

use serde::{Deserialize, Serialize};

/// Root config for the Vitalis assistant.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct VitalisConfig {
    #[serde(default, rename = "$schema")]
    pub schema: Option<String>,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub prompts: PromptsConfig,
    #[serde(default)]
    pub memory: MemoryConfig,
    #[serde(default)]
    pub orchestrator: OrchestratorConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

impl VitalisConfig {
    /// Start building a config programmatically with defaults applied.
    pub fn builder() -> VitalisConfigBuilder {
        VitalisConfigBuilder::new()
    }
}

/// Builder for assembling a `VitalisConfig` in code.
#[derive(Debug, Default, Clone)]
pub struct VitalisConfigBuilder {
    config: VitalisConfig,
}

impl VitalisConfigBuilder {
    /// Create a new builder seeded with default config values.
    pub fn new() -> Self {
        Self {
            config: VitalisConfig::default(),
        }
    }

    /// Set the `provider/model` identifier.
    pub fn model_id(mut self, id: impl Into<String>) -> Self {
        self.config.model.id = id.into();
        self
    }

    /// Replace the prompt overrides.
    pub fn prompts(mut self, prompts: PromptsConfig) -> Self {
        self.config.prompts = prompts;
        self
    }

    /// Replace the memory configuration.
    pub fn memory(mut self, memory: MemoryConfig) -> Self {
        self.config.memory = memory;
        self
    }

    /// Replace the orchestrator configuration.
    pub fn orchestrator(mut self, orchestrator: OrchestratorConfig) -> Self {
        self.config.orchestrator = orchestrator;
        self
    }

    /// Replace the HTTP server configuration.
    pub fn server(mut self, server: ServerConfig) -> Self {
        self.config.server = server;
        self
    }

    /// Finalize and return the config.
    pub fn build(self) -> VitalisConfig {
        self.config
    }
}

/// Language model selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// `provider/model` identifier, e.g. `anthropic/claude-3-5-sonnet-20240620`.
    #[serde(default = "default_model_id")]
    pub id: String,
    /// Environment variable holding the API key; provider default when unset.
    #[serde(default)]
    pub api_key_env: Option<String>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            id: default_model_id(),
            api_key_env: None,
        }
    }
}

fn default_model_id() -> String {
    "anthropic/claude-3-5-sonnet-20240620".to_string()
}

/// Prompt overrides; built-in prompts apply when unset.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PromptsConfig {
    /// Base system prompt template with `{user_info}` and `{time}` placeholders.
    #[serde(default)]
    pub system: Option<String>,
    /// Instruction used by the memory evaluation step.
    #[serde(default)]
    pub memory_evaluation: Option<String>,
}

/// Long-term memory settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Collection component of every user namespace.
    #[serde(default = "default_collection")]
    pub collection: String,
    /// Result bound for the search keyed on the latest user message.
    #[serde(default = "default_targeted_limit")]
    pub targeted_limit: usize,
    /// Result bound for the broad, empty-query search.
    #[serde(default = "default_general_limit")]
    pub general_limit: usize,
    /// Number of trailing messages the evaluation step looks at.
    #[serde(default = "default_evaluation_window")]
    pub evaluation_window: usize,
    /// Policy applied to memory writes.
    #[serde(default)]
    pub write: MemoryWriteConfig,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            collection: default_collection(),
            targeted_limit: default_targeted_limit(),
            general_limit: default_general_limit(),
            evaluation_window: default_evaluation_window(),
            write: MemoryWriteConfig::default(),
        }
    }
}

fn default_collection() -> String {
    "memories".to_string()
}

fn default_targeted_limit() -> usize {
    3
}

fn default_general_limit() -> usize {
    5
}

fn default_evaluation_window() -> usize {
    3
}

/// Write-time sanitization for stored memories.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryWriteConfig {
    #[serde(default)]
    pub redact_patterns: Vec<String>,
    #[serde(default)]
    pub max_content_chars: Option<usize>,
    #[serde(default = "default_detect_secrets")]
    pub detect_secrets: bool,
    #[serde(default = "default_secret_entropy_threshold")]
    pub secret_entropy_threshold: f32,
    #[serde(default = "default_redaction_replacement")]
    pub redaction_replacement: String,
}

impl Default for MemoryWriteConfig {
    fn default() -> Self {
        Self {
            redact_patterns: Vec::new(),
            max_content_chars: None,
            detect_secrets: default_detect_secrets(),
            secret_entropy_threshold: default_secret_entropy_threshold(),
            redaction_replacement: default_redaction_replacement(),
        }
    }
}

/// Default toggle for secret detection on write.
fn default_detect_secrets() -> bool {
    true
}

/// Default entropy threshold for identifying secrets.
fn default_secret_entropy_threshold() -> f32 {
    3.7
}

/// Default replacement string for redactions.
fn default_redaction_replacement() -> String {
    "[REDACTED]".to_string()
}

/// Turn orchestration limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Maximum state transitions per turn.
    #[serde(default = "default_step_limit")]
    pub step_limit: usize,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            step_limit: default_step_limit(),
        }
    }
}

fn default_step_limit() -> usize {
    10
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Socket address to bind.
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Allow any origin, method, and header.
    #[serde(default = "default_cors_allow_any")]
    pub cors_allow_any: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            cors_allow_any: default_cors_allow_any(),
        }
    }
}

fn default_bind() -> String {
    "0.0.0.0:8000".to_string()
}

fn default_cors_allow_any() -> bool {
    true
}
