// Copyright 2025 Adobe. All rights reserved.
// This file is licensed to you under the Apache License,
// Version 2.0 (http://www.apache.org/licenses/LICENSE-2.0)
// or the MIT license (http://opensource.org/licenses/MIT),
// at your option.
//
// Unless required by applicable law or agreed to in writing,
// this software is distributed on an "AS IS" BASIS, WITHOUT
// WARRANTIES OR REPRESENTATIONS OF ANY KIND, either express or
// implied. See the LICENSE-MIT and LICENSE-APACHE files for the
// specific language governing permissions and limitations under
// each license.

use super::report::{ProviderOutcome, Report};
use crate::error::{InventoryError, InventoryResult};
use crate::normalize::{normalize_all, ResourceMetadata};
use crate::provider::{
    AdapterFactory, ConfigBundle, ProviderAdapter, ProviderConfig, ProviderError, ProviderKind,
    ProviderResult,
};
use crate::util::retry::retry_with_max_retries;
use chrono::Utc;
use futures::future::join_all;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Timeout applied when neither the provider nor the builder sets one.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Builder for constructing an `Aggregator` instance.
///
/// # Examples
///
/// ```no_run
/// use cloud_inventory::aggregate::Aggregator;
/// use cloud_inventory::provider::ProviderConfig;
/// use std::time::Duration;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
/// let aggregator = Aggregator::builder()
///     .with_default_timeout(Duration::from_secs(30))
///     .with_default_max_retries(2)
///     .build();
///
/// let report = aggregator
///     .run(&[ProviderConfig::object_storage()
///         .with_option("bucket", "my-bucket")
///         .with_option("access_key_id", "ACCESS_KEY")
///         .with_option("secret_access_key", "SECRET_KEY")])
///     .await?;
/// println!("{}", report);
/// # Ok(())
/// # }
/// ```
#[derive(Default)]
pub struct AggregatorBuilder {
    default_timeout: Option<Duration>,
    default_max_retries: Option<usize>,
    adapters: HashMap<ProviderKind, Arc<dyn ProviderAdapter>>,
}

impl AggregatorBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the timeout for providers without their own `timeout_secs`.
    ///
    /// A zero duration is ignored.
    pub fn with_default_timeout(mut self, timeout: Duration) -> Self {
        if !timeout.is_zero() {
            self.default_timeout = Some(timeout);
        }
        self
    }

    /// Sets the retry count for providers without their own `max_retries`.
    pub fn with_default_max_retries(mut self, max_retries: usize) -> Self {
        self.default_max_retries = Some(max_retries);
        self
    }

    /// Takes the run-wide defaults from a configuration bundle.
    pub fn with_bundle_defaults(mut self, bundle: &ConfigBundle) -> Self {
        if let Some(timeout) = bundle.default_timeout() {
            self.default_timeout = Some(timeout);
        }
        if let Some(max_retries) = bundle.default_max_retries {
            self.default_max_retries = Some(max_retries);
        }
        self
    }

    /// Uses `adapter` for `kind` instead of building one from configuration.
    ///
    /// # Arguments
    ///
    /// * `kind` - The provider kind the adapter answers for
    /// * `adapter` - A ready adapter, e.g. one backed by an in-memory store
    pub fn with_adapter(mut self, kind: ProviderKind, adapter: Arc<dyn ProviderAdapter>) -> Self {
        self.adapters.insert(kind, adapter);
        self
    }

    pub fn build(self) -> Aggregator {
        Aggregator {
            default_timeout: self.default_timeout.unwrap_or(DEFAULT_TIMEOUT),
            default_max_retries: self.default_max_retries.unwrap_or(0),
            adapters: self.adapters,
        }
    }
}

/// Queries every enabled provider concurrently and merges the answers into
/// one [`Report`].
///
/// Each provider runs in its own task under its own timeout. A provider that
/// fails, times out or panics yields an error outcome; the others are
/// unaffected. The report lists outcomes in configuration order.
pub struct Aggregator {
    default_timeout: Duration,
    default_max_retries: usize,
    adapters: HashMap<ProviderKind, Arc<dyn ProviderAdapter>>,
}

impl Aggregator {
    pub fn builder() -> AggregatorBuilder {
        AggregatorBuilder::new()
    }

    /// Run one inventory over `configs`.
    ///
    /// Disabled providers are skipped and do not appear in the report.
    ///
    /// # Returns
    ///
    /// A report with exactly one outcome per enabled provider. Provider
    /// failures are recorded in the report and never fail the run.
    ///
    /// # Errors
    ///
    /// Returns `InventoryError::DuplicateProvider` if an enabled provider kind
    /// is configured more than once. No provider is queried in that case.
    pub async fn run(&self, configs: &[ProviderConfig]) -> InventoryResult<Report> {
        let enabled: Vec<&ProviderConfig> = configs.iter().filter(|c| c.is_enabled()).collect();

        let mut seen = HashSet::new();
        for config in &enabled {
            if !seen.insert(config.kind) {
                return Err(InventoryError::DuplicateProvider(config.kind));
            }
        }

        let generated_at = Utc::now();
        let start = Instant::now();
        info!("Starting inventory, providers={}", enabled.len());

        let handles: Vec<_> = enabled
            .iter()
            .map(|config| {
                let adapter = self.adapters.get(&config.kind).cloned();
                let timeout = config.timeout().unwrap_or(self.default_timeout);
                let max_retries = config.max_retries().unwrap_or(self.default_max_retries);
                tokio::spawn(query_provider(
                    (*config).clone(),
                    adapter,
                    timeout,
                    max_retries,
                ))
            })
            .collect();

        let outcomes = enabled
            .iter()
            .zip(join_all(handles).await)
            .map(|(config, joined)| {
                let outcome = joined.unwrap_or_else(|e| {
                    warn!("Provider task failed, provider={}: {}", config.kind, e);
                    let reason = if e.is_panic() { "panicked" } else { "was cancelled" };
                    ProviderError::UnknownError(format!("provider task {}", reason)).into()
                });
                (config.kind, outcome)
            })
            .collect();

        let report = Report::new(generated_at, outcomes)?;
        info!(
            "Inventory complete, resources={}, failed={}, took={}ms",
            report.resource_count(),
            report.failure_count(),
            start.elapsed().as_millis()
        );
        Ok(report)
    }

    /// Run one inventory over the providers of a bundle.
    pub async fn run_bundle(&self, bundle: &ConfigBundle) -> InventoryResult<Report> {
        self.run(&bundle.providers).await
    }
}

async fn query_provider(
    config: ProviderConfig,
    adapter: Option<Arc<dyn ProviderAdapter>>,
    timeout: Duration,
    max_retries: usize,
) -> ProviderOutcome {
    let kind = config.kind;
    let start = Instant::now();
    let result = collect_resources(&config, adapter, timeout, max_retries).await;

    match &result {
        Ok(resources) => info!(
            "Provider succeeded, provider={}, resources={}, took={}ms",
            kind,
            resources.len(),
            start.elapsed().as_millis()
        ),
        Err(e) => warn!(
            "Provider failed, provider={}, took={}ms: {}",
            kind,
            start.elapsed().as_millis(),
            e
        ),
    }
    result.into()
}

async fn collect_resources(
    config: &ProviderConfig,
    adapter: Option<Arc<dyn ProviderAdapter>>,
    timeout: Duration,
    max_retries: usize,
) -> ProviderResult<Vec<ResourceMetadata>> {
    let adapter = match adapter {
        Some(adapter) => adapter,
        None => AdapterFactory::from_config(config)?,
    };
    let adapter: &dyn ProviderAdapter = adapter.as_ref();
    let operation = format!("{} fetch_metadata", config.kind);

    let records = tokio::time::timeout(
        timeout,
        retry_with_max_retries(max_retries, &operation, move || adapter.fetch_metadata()),
    )
    .await
    .map_err(|_| ProviderError::timeout())??;

    Ok(normalize_all(config.kind, &records)?)
}
