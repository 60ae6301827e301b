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

//! Shared plumbing for the adapters built on the `object_store` crate.

use super::config::ProviderConfig;
use super::error::ProviderResult;
use futures::stream::StreamExt;
use object_store::path::Path as ObjectPath;
use object_store::{ClientOptions, ObjectMeta, ObjectStore, RetryConfig};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::debug;

/// Result of listing one bucket or container.
#[derive(Debug, Default)]
pub struct ObjectListing {
    pub objects: Vec<ObjectMeta>,
    /// Virtual directories, only filled for non-recursive listings.
    pub prefixes: Vec<ObjectPath>,
}

/// Build connection options from configuration.
///
/// The request timeout is left to the aggregator; only the connect timeout
/// and plain-HTTP switch are applied here.
pub fn build_connection_options(config: &ProviderConfig) -> ClientOptions {
    let mut client_options = ClientOptions::default();
    if let Some(connect_timeout) = config.duration_option("connect_timeout_secs") {
        if connect_timeout.is_zero() {
            client_options = client_options.with_connect_timeout_disabled();
        } else {
            client_options = client_options.with_connect_timeout(connect_timeout);
        }
    }
    if config.bool_option("allow_http", false) {
        client_options = client_options.with_allow_http(true);
    }
    client_options
}

/// Retry options for adapters: a single attempt, retries are the aggregator's job.
pub fn build_retry_options() -> RetryConfig {
    RetryConfig {
        backoff: Default::default(),
        max_retries: 0,
        retry_timeout: Duration::from_secs(0),
    }
}

/// The configured listing prefix, if any.
pub fn prefix_path(config: &ProviderConfig) -> Option<ObjectPath> {
    config
        .non_empty_option("prefix")
        .map(|p| ObjectPath::from(p.trim_matches('/')))
}

/// Attach configured tags to a native record under `tags`.
///
/// The listing APIs return no tags, so every record of the bucket or
/// container carries the configured set. Nothing is added when it is empty.
pub fn attach_tags(record: &mut Map<String, Value>, tags: &BTreeMap<String, String>) {
    if tags.is_empty() {
        return;
    }
    let tags = tags
        .iter()
        .map(|(k, v)| (k.clone(), Value::String(v.clone())))
        .collect();
    record.insert("tags".to_string(), Value::Object(tags));
}

/// List a store under an optional prefix.
///
/// # Arguments
///
/// * `store` - The store to list
/// * `prefix` - Restrict the listing to this prefix
/// * `recursive` - List every object below the prefix, or only the first
///   level (objects plus common prefixes)
///
/// # Errors
///
/// Any failed page fails the whole listing.
pub async fn list_store(
    store: &dyn ObjectStore,
    prefix: Option<&ObjectPath>,
    recursive: bool,
) -> ProviderResult<ObjectListing> {
    let mut listing = ObjectListing::default();

    if recursive {
        let mut stream = store.list(prefix);
        while let Some(meta) = stream.next().await {
            listing.objects.push(meta?);
        }
    } else {
        let result = store.list_with_delimiter(prefix).await?;
        listing.objects = result.objects;
        listing.prefixes = result.common_prefixes;
    }

    debug!(
        "Listed prefix={}, objects={}, prefixes={}",
        prefix.map(|p| p.as_ref()).unwrap_or(""),
        listing.objects.len(),
        listing.prefixes.len()
    );

    // Listing order is backend-defined; sort for stable reports.
    listing.objects.sort_by(|a, b| a.location.cmp(&b.location));
    listing.prefixes.sort();

    Ok(listing)
}

/// Check that credentials and connectivity work by listing the root level.
pub async fn validate_connection(store: &dyn ObjectStore) -> ProviderResult<()> {
    store.list_with_delimiter(None).await?;
    Ok(())
}
