// SPDX-FileCopyrightText: 2026 Loqui Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `loqui serve` command implementation.
//!
//! Builds the provider registry from configuration and serves the gateway
//! until the process is terminated.

use std::sync::Arc;

use loqui_config::LoquiConfig;
use loqui_gateway::InferenceGateway;
use loqui_registry::ProviderRegistry;
use tracing::info;

/// Runs the gateway server. Registry construction failures (no credentials,
/// default-model violations) abort startup with a diagnostic.
pub async fn run_serve(config: LoquiConfig) -> miette::Result<()> {
    let registry = ProviderRegistry::from_config(&config)?;
    info!(
        models = registry.list_enabled().len(),
        default = registry.default_model(),
        "starting gateway"
    );

    let gateway = Arc::new(InferenceGateway::new(Arc::new(registry)));
    loqui_gateway::start_server(&config.server, gateway)
        .await
        .map_err(|e| miette::miette!("{e}"))?;
    Ok(())
}
