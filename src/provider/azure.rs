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

use super::adapter::{ProviderAdapter, RawRecord};
use super::config::{ProviderConfig, ProviderKind, RUN_OPTIONS};
use super::error::{ProviderError, ProviderResult};
use super::object_store::{
    attach_tags, build_connection_options, build_retry_options, list_store, prefix_path,
    validate_connection,
};
use async_trait::async_trait;
use object_store::azure::MicrosoftAzureBuilder;
use object_store::path::Path as ObjectPath;
use object_store::{ObjectMeta, ObjectStore};
use serde_json::{json, Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::info;
use url::form_urlencoded;

const DEFAULT_ENDPOINT_SUFFIX: &str = "core.windows.net";

/// How the adapter authenticates against the storage account.
#[derive(Clone, PartialEq, Eq)]
enum AzureCredential {
    AccessKey(String),
    SasToken(Vec<(String, String)>),
    ClientSecret {
        tenant_id: String,
        client_id: String,
        client_secret: String,
    },
    Emulator,
}

/// Connection settings resolved from a connection string and explicit options.
#[derive(Clone)]
struct AzureSettings {
    account: String,
    container: String,
    credential: AzureCredential,
    endpoint: Option<String>,
    allow_http: bool,
    tags: BTreeMap<String, String>,
}

/// Split a storage connection string into its `Key=Value` segments.
///
/// Values may themselves contain `=` (account keys, SAS signatures), so each
/// segment is split on the first one only.
fn parse_connection_string(conn_str: &str) -> ProviderResult<HashMap<String, String>> {
    conn_str
        .split(';')
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .map(|segment| match segment.split_once('=') {
            Some((key, value)) if !key.trim().is_empty() => {
                Ok((key.trim().to_string(), value.trim().to_string()))
            }
            _ => Err(ProviderError::ConfigError(format!(
                "Malformed Azure connection string segment: '{}'",
                segment.split('=').next().unwrap_or_default()
            ))),
        })
        .collect()
}

/// Parse SAS token query parameters into decoded pairs.
///
/// The store encodes the pairs again when it builds each request URL.
fn parse_sas_token(token: &str) -> Vec<(String, String)> {
    form_urlencoded::parse(token.trim().trim_start_matches('?').as_bytes())
        .into_owned()
        .filter(|(key, _)| !key.is_empty())
        .collect()
}

impl AzureSettings {
    fn resolve(config: &ProviderConfig) -> ProviderResult<Self> {
        let parsed = match config.non_empty_option("connection_string") {
            Some(conn_str) => parse_connection_string(conn_str)?,
            None => HashMap::new(),
        };
        let from_conn = |key: &str| parsed.get(key).map(String::as_str).filter(|v| !v.is_empty());

        let emulator = from_conn("UseDevelopmentStorage")
            .is_some_and(|v| v.eq_ignore_ascii_case("true"));

        let account = config
            .non_empty_option("account_name")
            .or_else(|| from_conn("AccountName"))
            .map(String::from)
            .or_else(|| emulator.then(|| "devstoreaccount1".to_string()))
            .ok_or_else(|| {
                ProviderError::ConfigError(
                    "blob-storage requires 'account_name' or a connection string with AccountName"
                        .to_string(),
                )
            })?;
        let container = config.require_option("container")?.to_string();

        let credential = if let Some(key) = config
            .non_empty_option("access_key")
            .or_else(|| from_conn("AccountKey"))
        {
            AzureCredential::AccessKey(key.to_string())
        } else if let Some(sas) = config
            .non_empty_option("sas_token")
            .or_else(|| from_conn("SharedAccessSignature"))
        {
            AzureCredential::SasToken(parse_sas_token(sas))
        } else if let (Some(tenant_id), Some(client_id), Some(client_secret)) = (
            config.non_empty_option("tenant_id"),
            config.non_empty_option("client_id"),
            config.non_empty_option("client_secret"),
        ) {
            AzureCredential::ClientSecret {
                tenant_id: tenant_id.to_string(),
                client_id: client_id.to_string(),
                client_secret: client_secret.to_string(),
            }
        } else if emulator {
            AzureCredential::Emulator
        } else {
            return Err(ProviderError::ConfigError(
                "blob-storage requires 'access_key', 'sas_token' or 'tenant_id'/'client_id'/'client_secret'"
                    .to_string(),
            ));
        };

        let protocol = from_conn("DefaultEndpointsProtocol").unwrap_or("https");
        let endpoint = config
            .non_empty_option("endpoint")
            .or_else(|| from_conn("BlobEndpoint"))
            .map(|e| e.trim_end_matches('/').to_string())
            .or_else(|| {
                from_conn("EndpointSuffix")
                    .filter(|suffix| *suffix != DEFAULT_ENDPOINT_SUFFIX)
                    .map(|suffix| format!("{}://{}.blob.{}", protocol, account, suffix))
            });

        Ok(Self {
            account,
            container,
            credential,
            endpoint,
            allow_http: config.bool_option("allow_http", false) || protocol == "http",
            tags: config.tags()?,
        })
    }
}

/// Blob storage adapter for Azure Storage containers.
pub struct AzureBlobAdapter {
    store: Arc<dyn ObjectStore>,
    account: String,
    container: String,
    prefix: Option<ObjectPath>,
    recursive: bool,
    tags: BTreeMap<String, String>,
}

impl AzureBlobAdapter {
    /// Create a new Azure Blob Storage adapter.
    ///
    /// Credentials come from `connection_string` or from `account_name` plus
    /// one of `access_key`, `sas_token` or a service principal. Explicit
    /// options win over values found in the connection string.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError::ConfigError` when the container, account or
    /// credentials are missing, or the connection string is malformed.
    pub fn new(config: &ProviderConfig) -> ProviderResult<Self> {
        let settings = AzureSettings::resolve(config)?;
        let store = Self::build_azure_store(config, &settings)?;
        Ok(Self::from_settings(config, settings, Arc::new(store)))
    }

    /// Create an adapter over an already built store.
    pub fn with_store(config: &ProviderConfig, store: Arc<dyn ObjectStore>) -> ProviderResult<Self> {
        let settings = AzureSettings::resolve(config)?;
        Ok(Self::from_settings(config, settings, store))
    }

    fn from_settings(
        config: &ProviderConfig,
        settings: AzureSettings,
        store: Arc<dyn ObjectStore>,
    ) -> Self {
        Self {
            store,
            account: settings.account,
            container: settings.container,
            prefix: prefix_path(config),
            recursive: config.recursive(),
            tags: settings.tags,
        }
    }

    fn build_azure_store(
        config: &ProviderConfig,
        settings: &AzureSettings,
    ) -> ProviderResult<impl ObjectStore> {
        let mut builder = MicrosoftAzureBuilder::new()
            .with_client_options(build_connection_options(config))
            .with_retry(build_retry_options())
            .with_account(&settings.account)
            .with_container_name(&settings.container)
            .with_allow_http(settings.allow_http);

        builder = match &settings.credential {
            AzureCredential::AccessKey(key) => builder.with_access_key(key),
            AzureCredential::SasToken(pairs) => builder.with_sas_authorization(pairs.clone()),
            AzureCredential::ClientSecret {
                tenant_id,
                client_id,
                client_secret,
            } => builder
                .with_tenant_id(tenant_id)
                .with_client_id(client_id)
                .with_client_secret(client_secret),
            AzureCredential::Emulator => builder.with_use_emulator(true),
        };
        if let Some(endpoint) = &settings.endpoint {
            builder = builder.with_endpoint(endpoint.clone());
        }

        for key in config.options.keys() {
            match key.as_str() {
                "container" | "connection_string" | "account_name" | "access_key"
                | "sas_token" | "tenant_id" | "client_id" | "client_secret" | "endpoint"
                | "allow_http" | "prefix" | "recursive" | "tags" | "connect_timeout_secs" => (),
                k if RUN_OPTIONS.contains(&k) => (),
                _ => tracing::warn!("Unknown Azure option: {}", key),
            }
        }

        builder.build().map_err(|e| {
            ProviderError::ConfigError(format!("Failed to create Azure store: {}", e))
        })
    }

    fn container_record(&self) -> RawRecord {
        let mut record = Map::new();
        record.insert("AccountName".to_string(), json!(self.account));
        record.insert("ContainerName".to_string(), json!(self.container));
        attach_tags(&mut record, &self.tags);
        Value::Object(record)
    }

    fn blob_record(&self, meta: &ObjectMeta) -> RawRecord {
        let mut record = Map::new();
        record.insert("AccountName".to_string(), json!(self.account));
        record.insert("Container".to_string(), json!(self.container));
        record.insert("Name".to_string(), json!(meta.location.to_string()));
        record.insert("Content-Length".to_string(), json!(meta.size));
        record.insert(
            "Last-Modified".to_string(),
            json!(meta.last_modified.to_rfc2822()),
        );
        if let Some(e_tag) = &meta.e_tag {
            record.insert("Etag".to_string(), json!(e_tag));
        }
        if let Some(version) = &meta.version {
            record.insert("VersionId".to_string(), json!(version));
        }
        attach_tags(&mut record, &self.tags);
        Value::Object(record)
    }

    fn directory_record(&self, prefix: &ObjectPath) -> RawRecord {
        let mut record = Map::new();
        record.insert("AccountName".to_string(), json!(self.account));
        record.insert("Container".to_string(), json!(self.container));
        record.insert("BlobPrefix".to_string(), json!(format!("{}/", prefix)));
        attach_tags(&mut record, &self.tags);
        Value::Object(record)
    }
}

#[async_trait]
impl ProviderAdapter for AzureBlobAdapter {
    fn kind(&self) -> ProviderKind {
        ProviderKind::BlobStorage
    }

    async fn authenticate(&self) -> ProviderResult<()> {
        validate_connection(self.store.as_ref()).await
    }

    async fn describe_resource(&self) -> ProviderResult<RawRecord> {
        Ok(self.container_record())
    }

    async fn list_resources(&self) -> ProviderResult<Vec<RawRecord>> {
        let listing = list_store(self.store.as_ref(), self.prefix.as_ref(), self.recursive).await?;
        info!(
            "Listed container={}, blobs={}, directories={}",
            self.container,
            listing.objects.len(),
            listing.prefixes.len()
        );

        Ok(listing
            .prefixes
            .iter()
            .map(|p| self.directory_record(p))
            .chain(listing.objects.iter().map(|m| self.blob_record(m)))
            .collect())
    }
}
