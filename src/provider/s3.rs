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
use chrono::SecondsFormat;
use object_store::aws::AmazonS3Builder;
use object_store::path::Path as ObjectPath;
use object_store::{ObjectMeta, ObjectStore};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;

const DEFAULT_REGION: &str = "us-east-1";

/// Object storage adapter for AWS S3 and S3-compatible endpoints.
pub struct S3Adapter {
    store: Arc<dyn ObjectStore>,
    bucket: String,
    region: String,
    endpoint: Option<String>,
    prefix: Option<ObjectPath>,
    recursive: bool,
    tags: BTreeMap<String, String>,
}

impl S3Adapter {
    /// Create a new S3 adapter.
    ///
    /// # Arguments
    ///
    /// * `config` - Provider configuration with S3 options (bucket, credentials, region, etc.)
    ///
    /// # Errors
    ///
    /// Returns `ProviderError::ConfigError` if `bucket`, `access_key_id` or
    /// `secret_access_key` is missing, or if the store cannot be built from
    /// the given options. No network call is made.
    pub fn new(config: &ProviderConfig) -> ProviderResult<Self> {
        config.require_option("bucket")?;
        config.require_option("access_key_id")?;
        config.require_option("secret_access_key")?;

        let store = Self::build_aws_store(config)?;
        Self::with_store(config, Arc::new(store))
    }

    /// Create an adapter over an already built store.
    ///
    /// Credentials are the store's concern here; only `bucket` is required.
    pub fn with_store(config: &ProviderConfig, store: Arc<dyn ObjectStore>) -> ProviderResult<Self> {
        let bucket = config.require_option("bucket")?.to_string();
        let tags = config.tags()?;
        let region = config
            .non_empty_option("region")
            .unwrap_or(DEFAULT_REGION)
            .to_string();

        Ok(Self {
            store,
            bucket,
            region,
            endpoint: config.non_empty_option("endpoint").map(String::from),
            prefix: prefix_path(config),
            recursive: config.recursive(),
            tags,
        })
    }

    fn build_aws_store(config: &ProviderConfig) -> ProviderResult<impl ObjectStore> {
        let mut builder = AmazonS3Builder::new()
            .with_client_options(build_connection_options(config))
            .with_retry(build_retry_options())
            .with_region(DEFAULT_REGION);

        for (key, value) in &config.options {
            match key.as_str() {
                "bucket" => builder = builder.with_bucket_name(value.trim()),
                "region" => {
                    if !value.trim().is_empty() {
                        builder = builder.with_region(value.trim());
                    }
                }
                "access_key_id" => builder = builder.with_access_key_id(value.trim()),
                "secret_access_key" => builder = builder.with_secret_access_key(value.trim()),
                "session_token" => builder = builder.with_token(value.trim()),
                "endpoint" => {
                    if !value.trim().is_empty() {
                        builder = builder.with_endpoint(value.trim());
                    }
                }
                "allow_http" => builder = builder.with_allow_http(config.bool_option(key, false)),
                // Listing options and connection options handled elsewhere
                "prefix" | "recursive" | "tags" | "connect_timeout_secs" => (),
                k if RUN_OPTIONS.contains(&k) => (),
                _ => tracing::warn!("Unknown AWS S3 option: {}", key),
            }
        }

        builder
            .build()
            .map_err(|e| ProviderError::ConfigError(format!("Failed to create S3 store: {}", e)))
    }

    fn bucket_record(&self) -> RawRecord {
        let mut record = Map::new();
        record.insert("Name".to_string(), json!(self.bucket));
        record.insert("BucketRegion".to_string(), json!(self.region));
        if let Some(endpoint) = &self.endpoint {
            record.insert("Endpoint".to_string(), json!(endpoint));
        }
        attach_tags(&mut record, &self.tags);
        Value::Object(record)
    }

    fn object_record(&self, meta: &ObjectMeta) -> RawRecord {
        let mut record = Map::new();
        record.insert("Bucket".to_string(), json!(self.bucket));
        record.insert("Key".to_string(), json!(meta.location.to_string()));
        record.insert("Size".to_string(), json!(meta.size));
        record.insert(
            "LastModified".to_string(),
            json!(meta.last_modified.to_rfc3339_opts(SecondsFormat::Millis, true)),
        );
        if let Some(e_tag) = &meta.e_tag {
            record.insert("ETag".to_string(), json!(e_tag));
        }
        if let Some(version) = &meta.version {
            record.insert("VersionId".to_string(), json!(version));
        }
        attach_tags(&mut record, &self.tags);
        Value::Object(record)
    }

    fn prefix_record(&self, prefix: &ObjectPath) -> RawRecord {
        let mut record = Map::new();
        record.insert("Bucket".to_string(), json!(self.bucket));
        record.insert("Prefix".to_string(), json!(format!("{}/", prefix)));
        attach_tags(&mut record, &self.tags);
        Value::Object(record)
    }
}

#[async_trait]
impl ProviderAdapter for S3Adapter {
    fn kind(&self) -> ProviderKind {
        ProviderKind::ObjectStorage
    }

    async fn authenticate(&self) -> ProviderResult<()> {
        validate_connection(self.store.as_ref()).await
    }

    async fn describe_resource(&self) -> ProviderResult<RawRecord> {
        Ok(self.bucket_record())
    }

    async fn list_resources(&self) -> ProviderResult<Vec<RawRecord>> {
        let listing = list_store(self.store.as_ref(), self.prefix.as_ref(), self.recursive).await?;
        info!(
            "Listed bucket={}, objects={}, prefixes={}",
            self.bucket,
            listing.objects.len(),
            listing.prefixes.len()
        );

        let records = listing
            .prefixes
            .iter()
            .map(|p| self.prefix_record(p))
            .chain(listing.objects.iter().map(|m| self.object_record(m)))
            .collect();
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::error::ErrorKind;
    use object_store::memory::InMemory;
    use object_store::PutPayload;

    fn s3_config() -> ProviderConfig {
        ProviderConfig::object_storage()
            .with_option("bucket", "inventory")
            .with_option("region", "eu-west-1")
            .with_option("access_key_id", "AKIAEXAMPLE")
            .with_option("secret_access_key", "secret")
    }

    async fn adapter_with(config: &ProviderConfig, keys: &[(&str, &str)]) -> S3Adapter {
        let store = InMemory::new();
        for (key, body) in keys {
            store
                .put(&ObjectPath::from(*key), PutPayload::from(body.as_bytes().to_vec()))
                .await
                .unwrap();
        }
        S3Adapter::with_store(config, Arc::new(store)).unwrap()
    }

    #[test]
    fn test_new_requires_bucket() {
        let config = ProviderConfig::object_storage()
            .with_option("access_key_id", "a")
            .with_option("secret_access_key", "s");
        let err = S3Adapter::new(&config).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::ConfigError);
        assert!(err.message().contains("bucket"));
    }

    #[test]
    fn test_new_requires_credentials() {
        let config = ProviderConfig::object_storage().with_option("bucket", "b");
        let err = S3Adapter::new(&config).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::ConfigError);
        assert!(err.message().contains("access_key_id"));

        let config = config.with_option("access_key_id", "a");
        let err = S3Adapter::new(&config).err().unwrap();
        assert!(err.message().contains("secret_access_key"));
    }

    #[test]
    fn test_new_with_full_config() {
        let config = s3_config()
            .with_option("endpoint", "http://localhost:9000")
            .with_option("allow_http", "true")
            .with_option("timeout_secs", "10");
        let adapter = S3Adapter::new(&config).unwrap();
        assert_eq!(adapter.kind(), ProviderKind::ObjectStorage);
        assert_eq!(adapter.region, "eu-west-1");
        assert_eq!(adapter.endpoint.as_deref(), Some("http://localhost:9000"));
    }

    #[test]
    fn test_default_region() {
        let config = ProviderConfig::object_storage().with_option("bucket", "b");
        let adapter = S3Adapter::with_store(&config, Arc::new(InMemory::new())).unwrap();
        assert_eq!(adapter.region, "us-east-1");
    }

    #[test]
    fn test_malformed_tags_is_config_error() {
        let config = s3_config().with_option("tags", "owner");
        let err = S3Adapter::new(&config).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::ConfigError);
    }

    #[tokio::test]
    async fn test_tags_on_every_record() {
        let config = s3_config()
            .with_option("tags", "owner=Data Platform,env=prod")
            .with_option("recursive", "false");
        let adapter = adapter_with(&config, &[("logs/app.log", "x"), ("top.txt", "y")]).await;

        let records = adapter.fetch_metadata().await.unwrap();
        assert_eq!(records.len(), 3);
        for record in &records {
            assert_eq!(record["tags"]["owner"], "Data Platform");
            assert_eq!(record["tags"]["env"], "prod");
        }

        let resources =
            crate::normalize::normalize_all(ProviderKind::ObjectStorage, &records).unwrap();
        assert!(resources
            .iter()
            .all(|r| r.owner() == Some("Data Platform")));
    }

    #[tokio::test]
    async fn test_describe_bucket() {
        let adapter = adapter_with(&s3_config(), &[]).await;
        let record = adapter.describe_resource().await.unwrap();
        assert_eq!(record["Name"], "inventory");
        assert_eq!(record["BucketRegion"], "eu-west-1");
        assert!(record.get("Endpoint").is_none());
        assert!(record.get("tags").is_none());
    }

    #[tokio::test]
    async fn test_fetch_metadata_recursive() {
        let adapter = adapter_with(
            &s3_config(),
            &[("logs/app.log", "0123456789"), ("data.csv", "a,b")],
        )
        .await;

        let records = adapter.fetch_metadata().await.unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0]["Name"], "inventory");
        assert_eq!(records[1]["Key"], "data.csv");
        assert_eq!(records[1]["Size"], 3);
        assert_eq!(records[1]["Bucket"], "inventory");
        assert_eq!(records[2]["Key"], "logs/app.log");
        assert_eq!(records[2]["Size"], 10);

        let last_modified = records[2]["LastModified"].as_str().unwrap();
        assert!(chrono::DateTime::parse_from_rfc3339(last_modified).is_ok());
    }

    #[tokio::test]
    async fn test_list_non_recursive_reports_prefixes() {
        let config = s3_config().with_option("recursive", "false");
        let adapter = adapter_with(
            &config,
            &[("logs/app.log", "x"), ("logs/db.log", "y"), ("top.txt", "z")],
        )
        .await;

        let records = adapter.list_resources().await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["Prefix"], "logs/");
        assert_eq!(records[1]["Key"], "top.txt");
    }

    #[tokio::test]
    async fn test_list_with_prefix() {
        let config = s3_config().with_option("prefix", "logs/");
        let adapter = adapter_with(&config, &[("logs/app.log", "x"), ("top.txt", "z")]).await;

        let records = adapter.list_resources().await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["Key"], "logs/app.log");
    }

    #[tokio::test]
    async fn test_empty_bucket() {
        let adapter = adapter_with(&s3_config(), &[]).await;
        assert!(adapter.list_resources().await.unwrap().is_empty());
    }
}
