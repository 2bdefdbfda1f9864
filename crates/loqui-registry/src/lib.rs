// SPDX-FileCopyrightText: 2026 Loqui Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Provider registry: model-to-adapter resolution.
//!
//! Built once at startup from validated configuration and immutable
//! afterwards. A provider is enabled when its credential resolves; models
//! referencing disabled providers are hidden from listings and unresolvable,
//! identically to models that were never configured.

use std::collections::HashMap;
use std::sync::Arc;

use loqui_config::LoquiConfig;
use loqui_core::{ErrorCategory, LlmServiceError, ModelDescriptor, ProviderAdapter};
use miette::Diagnostic;
use thiserror::Error;
use tracing::{info, warn};

/// Startup failures while building the registry.
///
/// These abort the process; runtime lookups never produce them.
#[derive(Debug, Error, Diagnostic)]
pub enum RegistryError {
    #[error("no provider has a usable credential")]
    #[diagnostic(
        code(loqui::registry::no_providers),
        help(
            "set providers.anthropic.api_key / providers.openai.api_key in the config file, \
             or export ANTHROPIC_API_KEY / OPENAI_API_KEY"
        )
    )]
    NoProviders,

    #[error("no enabled model is marked as default")]
    #[diagnostic(
        code(loqui::registry::no_default),
        help("mark exactly one model of a credentialed provider with `default = true`")
    )]
    NoDefault,

    #[error("multiple enabled models are marked as default: {ids:?}")]
    #[diagnostic(
        code(loqui::registry::multiple_defaults),
        help("mark exactly one model with `default = true`")
    )]
    MultipleDefaults { ids: Vec<String> },

    #[error("provider '{provider}' failed to initialize")]
    #[diagnostic(code(loqui::registry::provider_init))]
    ProviderInit {
        provider: String,
        #[source]
        source: LlmServiceError,
    },
}

/// Immutable model-to-adapter mapping built from configuration.
#[derive(Debug)]
pub struct ProviderRegistry {
    adapters: HashMap<String, Arc<dyn ProviderAdapter>>,
    models: Vec<ModelDescriptor>,
    default_model: String,
}

impl ProviderRegistry {
    /// Builds the registry: constructs an adapter per credentialed provider,
    /// filters the model list down to enabled providers, and enforces the
    /// single-default invariant over what remains.
    pub fn from_config(config: &LoquiConfig) -> Result<Self, RegistryError> {
        let mut adapters: HashMap<String, Arc<dyn ProviderAdapter>> = HashMap::new();

        if let Some(key) = config.providers.anthropic.resolve_api_key() {
            let provider =
                loqui_anthropic::AnthropicProvider::new(&config.providers.anthropic, &key)
                    .map_err(|source| RegistryError::ProviderInit {
                        provider: loqui_anthropic::PROVIDER_ID.to_string(),
                        source,
                    })?;
            adapters.insert(
                loqui_anthropic::PROVIDER_ID.to_string(),
                Arc::new(provider),
            );
        }

        if let Some(key) = config.providers.openai.resolve_api_key() {
            let provider = loqui_openai::OpenAiProvider::new(&config.providers.openai, &key)
                .map_err(|source| RegistryError::ProviderInit {
                    provider: loqui_openai::PROVIDER_ID.to_string(),
                    source,
                })?;
            adapters.insert(loqui_openai::PROVIDER_ID.to_string(), Arc::new(provider));
        }

        if adapters.is_empty() {
            return Err(RegistryError::NoProviders);
        }

        let (models, hidden): (Vec<_>, Vec<_>) = config
            .models
            .iter()
            .cloned()
            .partition(|m| adapters.contains_key(&m.provider));
        for model in &hidden {
            warn!(
                model = %model.id,
                provider = %model.provider,
                "model hidden: provider has no credential"
            );
        }

        let defaults: Vec<&ModelDescriptor> = models.iter().filter(|m| m.default).collect();
        let default_model = match defaults.as_slice() {
            [only] => only.id.clone(),
            [] => return Err(RegistryError::NoDefault),
            many => {
                return Err(RegistryError::MultipleDefaults {
                    ids: many.iter().map(|m| m.id.clone()).collect(),
                });
            }
        };

        info!(
            providers = adapters.len(),
            models = models.len(),
            default = %default_model,
            "provider registry built"
        );

        Ok(Self {
            adapters,
            models,
            default_model,
        })
    }

    /// Resolves a model id (or the default when `None`) to its descriptor
    /// and adapter. Unknown or hidden models yield `invalid_request`.
    pub fn resolve(
        &self,
        model_id: Option<&str>,
    ) -> Result<(&ModelDescriptor, Arc<dyn ProviderAdapter>), LlmServiceError> {
        let id = model_id.unwrap_or(&self.default_model);
        let descriptor = self
            .models
            .iter()
            .find(|m| m.id == id)
            .ok_or_else(|| LlmServiceError::new(ErrorCategory::InvalidRequest))?;

        // The adapter exists for every listed model by construction.
        let adapter = self
            .adapters
            .get(&descriptor.provider)
            .cloned()
            .ok_or_else(|| LlmServiceError::new(ErrorCategory::Internal))?;

        Ok((descriptor, adapter))
    }

    /// Models of credentialed providers, in configuration order.
    pub fn list_enabled(&self) -> &[ModelDescriptor] {
        &self.models
    }

    /// Id of the model used when a request omits one.
    pub fn default_model(&self) -> &str {
        &self.default_model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use loqui_config::{AnthropicConfig, OpenAiConfig};

    fn model(id: &str, provider: &str, default: bool) -> ModelDescriptor {
        ModelDescriptor {
            id: id.to_string(),
            display_name: id.to_string(),
            description: String::new(),
            provider: provider.to_string(),
            default,
        }
    }

    fn config_with_keys(anthropic: bool, openai: bool) -> LoquiConfig {
        LoquiConfig {
            providers: loqui_config::ProvidersConfig {
                anthropic: AnthropicConfig {
                    api_key: anthropic.then(|| "sk-ant-test".to_string()),
                    ..Default::default()
                },
                openai: OpenAiConfig {
                    api_key: openai.then(|| "sk-test".to_string()),
                    ..Default::default()
                },
            },
            models: vec![
                model("claude-sonnet-4-20250514", "anthropic", true),
                model("gpt-4o", "openai", false),
            ],
            ..Default::default()
        }
    }

    #[test]
    fn resolves_explicit_and_default_model() {
        let registry = ProviderRegistry::from_config(&config_with_keys(true, true)).unwrap();

        let (descriptor, adapter) = registry.resolve(Some("gpt-4o")).unwrap();
        assert_eq!(descriptor.provider, "openai");
        assert_eq!(adapter.describe().id, "openai");

        let (descriptor, _) = registry.resolve(None).unwrap();
        assert_eq!(descriptor.id, "claude-sonnet-4-20250514");
    }

    #[test]
    fn unknown_model_is_invalid_request() {
        let registry = ProviderRegistry::from_config(&config_with_keys(true, true)).unwrap();
        let err = registry.resolve(Some("no-such-model")).unwrap_err();
        assert_eq!(err.category, ErrorCategory::InvalidRequest);
    }

    #[test]
    fn uncredentialed_provider_models_are_hidden() {
        let mut config = config_with_keys(true, false);
        // Force the env fallback off for this case.
        // SAFETY: test-only env mutation; no other thread in this test
        // reads OPENAI_API_KEY concurrently by contract of this suite.
        unsafe { std::env::remove_var("OPENAI_API_KEY") };
        config.providers.openai.api_key = None;

        let registry = ProviderRegistry::from_config(&config).unwrap();
        let listed = registry.list_enabled();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].provider, "anthropic");

        // Hidden models resolve exactly like unknown ones.
        let err = registry.resolve(Some("gpt-4o")).unwrap_err();
        assert_eq!(err.category, ErrorCategory::InvalidRequest);
    }

    #[test]
    fn missing_default_among_enabled_fails_startup() {
        let mut config = config_with_keys(false, true);
        unsafe { std::env::remove_var("ANTHROPIC_API_KEY") };
        config.providers.anthropic.api_key = None;

        // The only default model belongs to the disabled provider.
        let err = ProviderRegistry::from_config(&config).unwrap_err();
        assert!(matches!(err, RegistryError::NoDefault));
    }

    #[test]
    fn multiple_defaults_fail_startup() {
        let mut config = config_with_keys(true, true);
        config.models = vec![
            model("claude-sonnet-4-20250514", "anthropic", true),
            model("gpt-4o", "openai", true),
        ];
        let err = ProviderRegistry::from_config(&config).unwrap_err();
        assert!(matches!(err, RegistryError::MultipleDefaults { .. }));
    }

    #[test]
    fn no_credentialed_provider_fails_startup() {
        let mut config = config_with_keys(false, false);
        unsafe {
            std::env::remove_var("ANTHROPIC_API_KEY");
            std::env::remove_var("OPENAI_API_KEY");
        }
        config.providers.anthropic.api_key = None;
        config.providers.openai.api_key = None;

        let err = ProviderRegistry::from_config(&config).unwrap_err();
        assert!(matches!(err, RegistryError::NoProviders));
    }
}
