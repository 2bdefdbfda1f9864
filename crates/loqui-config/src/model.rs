// SPDX-FileCopyrightText: 2026 Loqui Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for Loqui.
//!
//! All structs use `#[serde(deny_unknown_fields)]` so unrecognized keys are
//! rejected at startup with an actionable diagnostic.

use loqui_core::ModelDescriptor;
use serde::{Deserialize, Serialize};

/// Top-level Loqui configuration.
///
/// Loaded from TOML files following the XDG hierarchy, with environment
/// variable overrides. All sections default to sensible values; only
/// provider credentials are genuinely deployment-specific.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LoquiConfig {
    /// Gateway server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Interactive client settings.
    #[serde(default)]
    pub client: ClientConfig,

    /// Per-provider backend settings and credentials.
    #[serde(default)]
    pub providers: ProvidersConfig,

    /// Models offered through the registry. Defaults to one entry per
    /// supported provider; deployments usually override this list.
    #[serde(default = "default_models")]
    pub models: Vec<ModelDescriptor>,
}

impl Default for LoquiConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            client: ClientConfig::default(),
            providers: ProvidersConfig::default(),
            models: default_models(),
        }
    }
}

/// Gateway server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Address to bind the gateway to.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind the gateway to.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8321
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Interactive client configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    /// Base URL of the gateway the `chat` command connects to.
    #[serde(default = "default_server_url")]
    pub server_url: String,

    /// Guard timer window in seconds: a stream producing no event within
    /// this window is forced to a timeout error.
    #[serde(default = "default_guard_timeout_secs")]
    pub guard_timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: default_server_url(),
            guard_timeout_secs: default_guard_timeout_secs(),
        }
    }
}

fn default_server_url() -> String {
    "http://127.0.0.1:8321".to_string()
}

fn default_guard_timeout_secs() -> u64 {
    30
}

/// Settings for all supported provider backends.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ProvidersConfig {
    /// Anthropic Messages API settings.
    #[serde(default)]
    pub anthropic: AnthropicConfig,

    /// OpenAI-compatible chat-completions settings.
    #[serde(default)]
    pub openai: OpenAiConfig,
}

/// Anthropic provider configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AnthropicConfig {
    /// API key. `None` falls back to the `ANTHROPIC_API_KEY` environment
    /// variable; the provider is disabled when neither is set.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Messages API base URL.
    #[serde(default = "default_anthropic_base_url")]
    pub base_url: String,

    /// Anthropic API version header value.
    #[serde(default = "default_anthropic_api_version")]
    pub api_version: String,

    /// Maximum tokens to generate per reply.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Per-request timeout in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for AnthropicConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_anthropic_base_url(),
            api_version: default_anthropic_api_version(),
            max_tokens: default_max_tokens(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl AnthropicConfig {
    /// Resolves the credential: config value first, then `ANTHROPIC_API_KEY`.
    pub fn resolve_api_key(&self) -> Option<String> {
        resolve_key(&self.api_key, "ANTHROPIC_API_KEY")
    }
}

fn default_anthropic_base_url() -> String {
    "https://api.anthropic.com/v1/messages".to_string()
}

fn default_anthropic_api_version() -> String {
    "2023-06-01".to_string()
}

/// OpenAI-compatible provider configuration.
///
/// `base_url` makes this cover self-hosted OpenAI-compatible backends as
/// well as the hosted API.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct OpenAiConfig {
    /// API key. `None` falls back to the `OPENAI_API_KEY` environment
    /// variable; the provider is disabled when neither is set.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Chat-completions endpoint URL.
    #[serde(default = "default_openai_base_url")]
    pub base_url: String,

    /// Maximum tokens to generate per reply.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Per-request timeout in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_openai_base_url(),
            max_tokens: default_max_tokens(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl OpenAiConfig {
    /// Resolves the credential: config value first, then `OPENAI_API_KEY`.
    pub fn resolve_api_key(&self) -> Option<String> {
        resolve_key(&self.api_key, "OPENAI_API_KEY")
    }
}

fn default_openai_base_url() -> String {
    "https://api.openai.com/v1/chat/completions".to_string()
}

fn default_max_tokens() -> u32 {
    4096
}

fn default_request_timeout_secs() -> u64 {
    120
}

fn resolve_key(configured: &Option<String>, env_var: &str) -> Option<String> {
    if let Some(key) = configured
        && !key.is_empty()
    {
        return Some(key.clone());
    }
    std::env::var(env_var).ok().filter(|k| !k.is_empty())
}

/// Built-in model list used when the config file defines none.
pub fn default_models() -> Vec<ModelDescriptor> {
    vec![
        ModelDescriptor {
            id: "claude-sonnet-4-20250514".to_string(),
            display_name: "Claude Sonnet 4".to_string(),
            description: "Balanced Anthropic model".to_string(),
            provider: "anthropic".to_string(),
            default: true,
        },
        ModelDescriptor {
            id: "gpt-4o".to_string(),
            display_name: "GPT-4o".to_string(),
            description: "OpenAI flagship model".to_string(),
            provider: "openai".to_string(),
            default: false,
        },
    ]
}
