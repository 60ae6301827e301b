use std::sync::Arc;

use super::adapter::ProviderAdapter;
use super::azure::AzureBlobAdapter;
use super::config::{ProviderConfig, ProviderKind};
use super::databricks::DatabricksAdapter;
use super::error::ProviderResult;
use super::s3::S3Adapter;
use super::sharepoint::SharePointAdapter;

/// Factory for creating provider adapters
pub struct AdapterFactory;

impl AdapterFactory {
    /// Create a provider adapter from a configuration.
    ///
    /// Dispatches on the configured kind. Construction only validates options
    /// and builds clients; it never touches the network.
    ///
    /// # Arguments
    ///
    /// * `config` - The provider configuration specifying the kind and options
    ///
    /// # Returns
    ///
    /// A `Result` containing:
    /// * `Ok(Arc<dyn ProviderAdapter>)` - A thread-safe reference to the adapter
    /// * `Err(ProviderError)` - If the adapter cannot be created
    ///
    /// # Errors
    ///
    /// Returns `ProviderError::ConfigError` if a required option is missing,
    /// blank or malformed.
    pub fn from_config(config: &ProviderConfig) -> ProviderResult<Arc<dyn ProviderAdapter>> {
        let adapter: Arc<dyn ProviderAdapter> = match config.kind {
            ProviderKind::ObjectStorage => Arc::new(S3Adapter::new(config)?),
            ProviderKind::BlobStorage => Arc::new(AzureBlobAdapter::new(config)?),
            ProviderKind::DocumentSite => Arc::new(SharePointAdapter::new(config)?),
            ProviderKind::AnalyticsWorkspace => Arc::new(DatabricksAdapter::new(config)?),
        };
        Ok(adapter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::error::ErrorKind;

    #[test]
    fn test_from_config_dispatches_by_kind() {
        let configs = [
            ProviderConfig::object_storage()
                .with_option("bucket", "b")
                .with_option("access_key_id", "a")
                .with_option("secret_access_key", "s"),
            ProviderConfig::blob_storage()
                .with_option("account_name", "acct")
                .with_option("access_key", "a2V5")
                .with_option("container", "c"),
            ProviderConfig::document_site()
                .with_option("tenant_id", "t")
                .with_option("client_id", "c")
                .with_option("client_secret", "s")
                .with_option("site_id", "root"),
            ProviderConfig::analytics_workspace()
                .with_option("host", "https://dbc-1.cloud.databricks.com")
                .with_option("token", "dapi"),
        ];
        for config in &configs {
            let adapter = AdapterFactory::from_config(config).unwrap();
            assert_eq!(adapter.kind(), config.kind);
        }
    }

    #[test]
    fn test_from_config_empty_options_is_config_error() {
        for kind in ProviderKind::ALL {
            let err = AdapterFactory::from_config(&ProviderConfig::new(kind))
                .err()
                .unwrap();
            assert_eq!(err.kind(), ErrorKind::ConfigError, "kind {}", kind);
        }
    }
}
