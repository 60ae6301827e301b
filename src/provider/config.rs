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

use super::error::{ProviderError, ProviderResult};
use crate::error::{InventoryError, InventoryResult};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt::{Debug, Display, Formatter, Result as FmtResult};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Options whose values are never printed.
const SECRET_OPTIONS: &[&str] = &[
    "secret_access_key",
    "session_token",
    "access_key",
    "account_key",
    "sas_token",
    "connection_string",
    "client_secret",
    "token",
];

/// Options consumed by the aggregator rather than by an adapter.
pub const RUN_OPTIONS: &[&str] = &["timeout_secs", "max_retries", "enabled"];

/// Provider type
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "kebab-case")]
pub enum ProviderKind {
    /// Bucket-based object storage (AWS S3 and compatibles)
    ObjectStorage,
    /// Azure Blob Storage containers
    BlobStorage,
    /// SharePoint document libraries
    DocumentSite,
    /// Databricks workspaces
    AnalyticsWorkspace,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 4] = [
        ProviderKind::ObjectStorage,
        ProviderKind::BlobStorage,
        ProviderKind::DocumentSite,
        ProviderKind::AnalyticsWorkspace,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::ObjectStorage => "object-storage",
            ProviderKind::BlobStorage => "blob-storage",
            ProviderKind::DocumentSite => "document-site",
            ProviderKind::AnalyticsWorkspace => "analytics-workspace",
        }
    }
}

impl Display for ProviderKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = ProviderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "object-storage" | "s3" | "aws" => Ok(ProviderKind::ObjectStorage),
            "blob-storage" | "azure" => Ok(ProviderKind::BlobStorage),
            "document-site" | "sharepoint" => Ok(ProviderKind::DocumentSite),
            "analytics-workspace" | "databricks" => Ok(ProviderKind::AnalyticsWorkspace),
            other => Err(ProviderError::ConfigError(format!(
                "Unknown provider kind: {}",
                other
            ))),
        }
    }
}

/// Configuration for one provider
///
/// Like the storage configuration it descends from, options are a flat map of
/// strings. Each adapter picks the keys it understands and validates them
/// before touching the network.
///
/// # Examples
///
/// ```
/// use cloud_inventory::provider::ProviderConfig;
///
/// let config = ProviderConfig::object_storage()
///     .with_option("bucket", "my-bucket")
///     .with_option("region", "us-east-1")
///     .with_option("access_key_id", "ACCESS_KEY")
///     .with_option("secret_access_key", "SECRET_KEY");
/// ```
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProviderConfig {
    pub kind: ProviderKind,

    /// Provider-specific options.
    ///
    /// object-storage: bucket, region, access_key_id, secret_access_key,
    /// session_token, endpoint, allow_http, prefix, recursive, tags
    ///
    /// blob-storage: container, connection_string, account_name, access_key,
    /// sas_token, tenant_id, client_id, client_secret, endpoint, allow_http,
    /// prefix, recursive, tags
    ///
    /// document-site: tenant_id, client_id, client_secret, site_id, site_url,
    /// drive_id, graph_endpoint, authority_host, recursive
    ///
    /// analytics-workspace: host, token, catalog, schema, volume, dbfs_path,
    /// recursive
    ///
    /// All: timeout_secs, max_retries, connect_timeout_secs, enabled
    #[serde(default)]
    pub options: HashMap<String, String>,
}

impl ProviderConfig {
    pub fn new(kind: ProviderKind) -> Self {
        Self {
            kind,
            options: HashMap::new(),
        }
    }

    pub fn object_storage() -> Self {
        Self::new(ProviderKind::ObjectStorage)
    }

    pub fn blob_storage() -> Self {
        Self::new(ProviderKind::BlobStorage)
    }

    pub fn document_site() -> Self {
        Self::new(ProviderKind::DocumentSite)
    }

    pub fn analytics_workspace() -> Self {
        Self::new(ProviderKind::AnalyticsWorkspace)
    }

    /// Add a configuration option (for method chaining).
    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    /// Add multiple configuration options (for method chaining).
    pub fn with_options(mut self, options: HashMap<String, String>) -> Self {
        self.options.extend(options);
        self
    }

    pub fn get_option(&self, key: &str) -> Option<&String> {
        self.options.get(key)
    }

    /// Get an option, treating blank values as absent.
    pub fn non_empty_option(&self, key: &str) -> Option<&str> {
        self.options
            .get(key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    /// Get a required option.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError::ConfigError` if the option is missing or blank.
    pub fn require_option(&self, key: &str) -> ProviderResult<&str> {
        self.non_empty_option(key).ok_or_else(|| {
            ProviderError::ConfigError(format!("{} requires '{}' option", self.kind, key))
        })
    }

    /// Parse a boolean option; anything other than "true"/"false" falls back to `default`.
    pub fn bool_option(&self, key: &str, default: bool) -> bool {
        match self.non_empty_option(key).map(|v| v.to_lowercase()) {
            Some(v) if v == "true" => true,
            Some(v) if v == "false" => false,
            _ => default,
        }
    }

    /// Parse a seconds-valued option; unparsable values are ignored.
    pub fn duration_option(&self, key: &str) -> Option<Duration> {
        self.non_empty_option(key)
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_secs)
    }

    /// Per-provider timeout, if configured.
    pub fn timeout(&self) -> Option<Duration> {
        self.duration_option("timeout_secs")
            .filter(|d| !d.is_zero())
    }

    /// Per-provider retry count, if configured.
    pub fn max_retries(&self) -> Option<usize> {
        self.non_empty_option("max_retries")
            .and_then(|v| v.parse::<usize>().ok())
    }

    /// Whether recursive listing is requested (default true).
    pub fn recursive(&self) -> bool {
        self.bool_option("recursive", true)
    }

    pub fn is_enabled(&self) -> bool {
        self.bool_option("enabled", true)
    }

    /// Resource tags given as `key=value` pairs separated by commas.
    ///
    /// Keys and values are trimmed; an absent or blank option gives no tags.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError::ConfigError` for an entry without `=` or with
    /// an empty key.
    pub fn tags(&self) -> ProviderResult<BTreeMap<String, String>> {
        let Some(raw) = self.non_empty_option("tags") else {
            return Ok(BTreeMap::new());
        };
        raw.split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(|entry| match entry.split_once('=') {
                Some((key, value)) if !key.trim().is_empty() => {
                    Ok((key.trim().to_string(), value.trim().to_string()))
                }
                _ => Err(ProviderError::ConfigError(format!(
                    "Malformed tag '{}', expected key=value",
                    entry
                ))),
            })
            .collect()
    }
}

impl Debug for ProviderConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let mut keys: Vec<&String> = self.options.keys().collect();
        keys.sort();
        let redacted: Vec<(&str, &str)> = keys
            .into_iter()
            .map(|k| {
                let value = if SECRET_OPTIONS.contains(&k.as_str()) {
                    "***"
                } else {
                    self.options[k].as_str()
                };
                (k.as_str(), value)
            })
            .collect();
        f.debug_struct("ProviderConfig")
            .field("kind", &self.kind)
            .field("options", &redacted)
            .finish()
    }
}

/// All providers enabled for one run, plus run-wide defaults
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConfigBundle {
    #[serde(default)]
    pub providers: Vec<ProviderConfig>,

    /// Timeout applied to providers without their own `timeout_secs`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_timeout_secs: Option<u64>,

    /// Retry count applied to providers without their own `max_retries`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_max_retries: Option<usize>,
}

/// Environment variables per provider, as `(variable, option)` pairs.
const S3_ENV: &[(&str, &str)] = &[
    ("S3_BUCKET", "bucket"),
    ("AWS_ACCESS_KEY_ID", "access_key_id"),
    ("AWS_SECRET_ACCESS_KEY", "secret_access_key"),
    ("AWS_SESSION_TOKEN", "session_token"),
    ("AWS_REGION", "region"),
    ("S3_ENDPOINT", "endpoint"),
    ("S3_PREFIX", "prefix"),
    ("S3_TAGS", "tags"),
];

const AZURE_ENV: &[(&str, &str)] = &[
    ("AZURE_CONNECTION_STRING", "connection_string"),
    ("AZURE_CONTAINER", "container"),
    ("AZURE_ACCOUNT_NAME", "account_name"),
    ("AZURE_ACCOUNT_KEY", "access_key"),
    ("AZURE_SAS_TOKEN", "sas_token"),
    ("AZURE_TENANT_ID", "tenant_id"),
    ("AZURE_CLIENT_ID", "client_id"),
    ("AZURE_CLIENT_SECRET", "client_secret"),
    ("AZURE_ACCOUNT_TAGS", "tags"),
];

const SHAREPOINT_ENV: &[(&str, &str)] = &[
    ("SHAREPOINT_TENANT_ID", "tenant_id"),
    ("SHAREPOINT_CLIENT_ID", "client_id"),
    ("SHAREPOINT_CLIENT_SECRET", "client_secret"),
    ("SHAREPOINT_SITE_ID", "site_id"),
    ("SHAREPOINT_SITE_URL", "site_url"),
    ("SHAREPOINT_DRIVE_ID", "drive_id"),
];

const DATABRICKS_ENV: &[(&str, &str)] = &[
    ("DATABRICKS_HOST", "host"),
    ("DATABRICKS_TOKEN", "token"),
    ("DATABRICKS_CATALOG", "catalog"),
    ("DATABRICKS_SCHEMA", "schema"),
    ("DATABRICKS_VOLUME", "volume"),
    ("DATABRICKS_DBFS_PATH", "dbfs_path"),
];

impl ConfigBundle {
    pub fn new(providers: Vec<ProviderConfig>) -> Self {
        Self {
            providers,
            ..Default::default()
        }
    }

    /// Parse a bundle from a JSON document.
    ///
    /// ```
    /// use cloud_inventory::provider::ConfigBundle;
    ///
    /// let bundle = ConfigBundle::from_json_str(
    ///     r#"{"providers":[{"kind":"object-storage","options":{"bucket":"b"}}]}"#,
    /// ).unwrap();
    /// assert_eq!(bundle.providers.len(), 1);
    /// ```
    ///
    /// # Errors
    ///
    /// Returns `InventoryError::Config` if the document is not a valid bundle
    /// or configures a provider kind twice.
    pub fn from_json_str(json: &str) -> InventoryResult<Self> {
        let bundle: ConfigBundle = serde_json::from_str(json)
            .map_err(|e| InventoryError::Config(format!("Invalid configuration: {}", e)))?;
        bundle.validate()?;
        Ok(bundle)
    }

    /// Read a bundle from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> InventoryResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&content)
    }

    /// Build a bundle from process environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a bundle from an arbitrary variable lookup.
    ///
    /// A provider is enabled when its identifying variables are present:
    /// `S3_BUCKET` for object storage, `AZURE_CONNECTION_STRING` or
    /// `AZURE_ACCOUNT_NAME` for blob storage, `SHAREPOINT_CLIENT_ID` with a site
    /// id or url for the document site, `DATABRICKS_HOST` for the workspace.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let present = |key: &str| lookup(key).is_some_and(|v| !v.trim().is_empty());
        let collect = |kind: ProviderKind, vars: &[(&str, &str)]| {
            vars.iter()
                .fold(ProviderConfig::new(kind), |config, &(var, option)| {
                    match lookup(var).filter(|v| !v.trim().is_empty()) {
                        Some(value) => config.with_option(option, value),
                        None => config,
                    }
                })
        };

        let mut providers = Vec::new();
        if present("S3_BUCKET") {
            providers.push(collect(ProviderKind::ObjectStorage, S3_ENV));
        }
        if present("AZURE_CONNECTION_STRING") || present("AZURE_ACCOUNT_NAME") {
            providers.push(collect(ProviderKind::BlobStorage, AZURE_ENV));
        }
        if present("SHAREPOINT_CLIENT_ID")
            && (present("SHAREPOINT_SITE_ID") || present("SHAREPOINT_SITE_URL"))
        {
            providers.push(collect(ProviderKind::DocumentSite, SHAREPOINT_ENV));
        }
        if present("DATABRICKS_HOST") {
            providers.push(collect(ProviderKind::AnalyticsWorkspace, DATABRICKS_ENV));
        }

        Self {
            providers,
            default_timeout_secs: lookup("INVENTORY_TIMEOUT_SECS").and_then(|v| v.parse().ok()),
            default_max_retries: lookup("INVENTORY_MAX_RETRIES").and_then(|v| v.parse().ok()),
        }
    }

    /// Check that no provider kind is configured twice.
    pub fn validate(&self) -> InventoryResult<()> {
        let mut seen = HashSet::new();
        for config in self.providers.iter().filter(|c| c.is_enabled()) {
            if !seen.insert(config.kind) {
                return Err(InventoryError::DuplicateProvider(config.kind));
            }
        }
        Ok(())
    }

    /// The providers to query, in configuration order.
    pub fn enabled(&self) -> Vec<ProviderConfig> {
        self.providers
            .iter()
            .filter(|c| c.is_enabled())
            .cloned()
            .collect()
    }

    pub fn default_timeout(&self) -> Option<Duration> {
        self.default_timeout_secs
            .filter(|s| *s > 0)
            .map(Duration::from_secs)
    }
}
