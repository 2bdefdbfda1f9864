// SPDX-FileCopyrightText: 2026 Loqui Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./loqui.toml` > `~/.config/loqui/loqui.toml` >
//! `/etc/loqui/loqui.toml` with environment variable overrides via the
//! `LOQUI_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::LoquiConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/loqui/loqui.toml` (system-wide)
/// 3. `~/.config/loqui/loqui.toml` (user XDG config)
/// 4. `./loqui.toml` (local directory)
/// 5. `LOQUI_*` environment variables
pub fn load_config() -> Result<LoquiConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(LoquiConfig::default()))
        .merge(Toml::file("/etc/loqui/loqui.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("loqui/loqui.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("loqui.toml"))
        .merge(env_provider())
        .extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
///
/// Used for testing and for callers that supply config inline.
pub fn load_config_from_str(toml_content: &str) -> Result<LoquiConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(LoquiConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<LoquiConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(LoquiConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Create the environment variable provider using explicit `map()` for
/// section-to-dot mapping.
///
/// Uses `Env::map()` rather than `Env::split("_")` to avoid ambiguity with
/// underscore-containing key names: `LOQUI_PROVIDERS_ANTHROPIC_API_KEY` must
/// map to `providers.anthropic.api_key`, not `providers.anthropic.api.key`.
fn env_provider() -> Env {
    Env::prefixed("LOQUI_").map(|key| {
        let key_str = key.as_str();
        let mapped = key_str
            .replacen("server_", "server.", 1)
            .replacen("client_", "client.", 1)
            .replacen("providers_anthropic_", "providers.anthropic.", 1)
            .replacen("providers_openai_", "providers.openai.", 1);
        mapped.into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_load_without_any_file() {
        let config = load_config_from_str("").unwrap();
        assert_eq!(config.server.port, 8321);
        assert_eq!(config.client.guard_timeout_secs, 30);
        assert_eq!(config.models.len(), 2);
    }

    #[test]
    fn toml_string_overrides_defaults() {
        let config = load_config_from_str(
            r#"
[server]
host = "0.0.0.0"
port = 9000

[client]
guard_timeout_secs = 5
"#,
        )
        .unwrap();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.client.guard_timeout_secs, 5);
    }

    #[test]
    fn provider_sections_merge() {
        let config = load_config_from_str(
            r#"
[providers.anthropic]
api_key = "sk-ant-test"

[providers.openai]
base_url = "http://localhost:8000/v1/chat/completions"
"#,
        )
        .unwrap();
        assert_eq!(
            config.providers.anthropic.api_key.as_deref(),
            Some("sk-ant-test")
        );
        assert!(config.providers.openai.base_url.contains("localhost"));
        // Untouched defaults survive the merge.
        assert_eq!(config.providers.anthropic.api_version, "2023-06-01");
    }

    #[test]
    fn load_from_path_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("loqui.toml");
        std::fs::write(&path, "[server]\nport = 4242\n").unwrap();

        let config = load_config_from_path(&path).unwrap();
        assert_eq!(config.server.port, 4242);
    }
}
