// SPDX-FileCopyrightText: 2026 Loqui Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde
//! attributes. The single-default-among-enabled-models invariant depends on
//! credential presence and is enforced by the provider registry at startup,
//! not here.

use std::collections::HashSet;

use crate::diagnostic::ConfigError;
use crate::model::LoquiConfig;

/// Provider identifiers a model descriptor may reference.
pub const KNOWN_PROVIDERS: &[&str] = &["anthropic", "openai"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &LoquiConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    let host = config.server.host.trim();
    if host.is_empty() {
        errors.push(ConfigError::Validation {
            message: "server.host must not be empty".to_string(),
        });
    } else {
        let is_valid_ip = host.parse::<std::net::IpAddr>().is_ok();
        let is_valid_hostname = host
            .chars()
            .all(|c| c.is_alphanumeric() || c == '.' || c == '-' || c == ':');
        if !is_valid_ip && !is_valid_hostname {
            errors.push(ConfigError::Validation {
                message: format!("server.host `{host}` is not a valid IP address or hostname"),
            });
        }
    }

    if config.client.server_url.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "client.server_url must not be empty".to_string(),
        });
    }

    if config.client.guard_timeout_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "client.guard_timeout_secs must be at least 1".to_string(),
        });
    }

    for (section, timeout) in [
        ("providers.anthropic", config.providers.anthropic.request_timeout_secs),
        ("providers.openai", config.providers.openai.request_timeout_secs),
    ] {
        if timeout == 0 {
            errors.push(ConfigError::Validation {
                message: format!("{section}.request_timeout_secs must be at least 1"),
            });
        }
    }

    if config.models.is_empty() {
        errors.push(ConfigError::Validation {
            message: "at least one [[models]] entry is required".to_string(),
        });
    }

    let mut seen_ids = HashSet::new();
    for (i, model) in config.models.iter().enumerate() {
        if model.id.trim().is_empty() {
            errors.push(ConfigError::Validation {
                message: format!("models[{i}].id must not be empty"),
            });
        }
        if !seen_ids.insert(&model.id) {
            errors.push(ConfigError::Validation {
                message: format!("duplicate model id `{}` in [[models]] array", model.id),
            });
        }
        if !KNOWN_PROVIDERS.contains(&model.provider.as_str()) {
            errors.push(ConfigError::Validation {
                message: format!(
                    "models[{i}].provider `{}` is not a known provider (expected one of: {})",
                    model.provider,
                    KNOWN_PROVIDERS.join(", ")
                ),
            });
        }
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}
