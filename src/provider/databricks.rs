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
use super::http::{join_segments, parse_base_url, JsonClient};
use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::OnceCell;
use tracing::info;
use url::Url;

const KNOWN_OPTIONS: &[&str] = &[
    "host",
    "token",
    "catalog",
    "schema",
    "volume",
    "dbfs_path",
    "recursive",
    "connect_timeout_secs",
];

/// What part of the workspace is listed.
#[derive(Debug, Clone, PartialEq, Eq)]
enum ListingRoot {
    /// Unity Catalog volume, listed through the Files API.
    Volume {
        catalog: String,
        schema: String,
        volume: String,
    },
    /// Legacy DBFS path.
    Dbfs(String),
}

/// Analytics workspace adapter for Databricks.
pub struct DatabricksAdapter {
    client: JsonClient,
    host: Url,
    token: String,
    root: ListingRoot,
    recursive: bool,
    current_user: OnceCell<Value>,
}

impl DatabricksAdapter {
    /// Create a new Databricks adapter.
    ///
    /// `catalog`, `schema` and `volume` select a Unity Catalog volume and must
    /// be given together; without them the adapter lists DBFS from
    /// `dbfs_path` (default `/`).
    ///
    /// # Errors
    ///
    /// Returns `ProviderError::ConfigError` if `host` or `token` is missing,
    /// `host` is not an absolute URL, or the volume is only partly configured.
    pub fn new(config: &ProviderConfig) -> ProviderResult<Self> {
        let host = parse_base_url(config.require_option("host")?)?;
        let token = config.require_option("token")?.to_string();

        let root = match (
            config.non_empty_option("catalog"),
            config.non_empty_option("schema"),
            config.non_empty_option("volume"),
        ) {
            (Some(catalog), Some(schema), Some(volume)) => ListingRoot::Volume {
                catalog: catalog.to_string(),
                schema: schema.to_string(),
                volume: volume.to_string(),
            },
            (None, None, None) => {
                let path = config.non_empty_option("dbfs_path").unwrap_or("/");
                ListingRoot::Dbfs(path.trim_start_matches("dbfs:").to_string())
            }
            _ => {
                return Err(ProviderError::ConfigError(
                    "analytics-workspace requires 'catalog', 'schema' and 'volume' together"
                        .to_string(),
                ))
            }
        };

        for key in config.options.keys() {
            if !KNOWN_OPTIONS.contains(&key.as_str()) && !RUN_OPTIONS.contains(&key.as_str()) {
                tracing::warn!("Unknown Databricks option: {}", key);
            }
        }

        Ok(Self {
            client: JsonClient::new(config)?,
            host,
            token,
            root,
            recursive: config.recursive(),
            current_user: OnceCell::new(),
        })
    }

    fn api_url<S: AsRef<str>>(&self, segments: &[S]) -> ProviderResult<Url> {
        join_segments(&self.host, segments)
    }

    fn workspace_url(&self) -> &str {
        self.host.as_str().trim_end_matches('/')
    }

    async fn current_user(&self) -> ProviderResult<&Value> {
        self.current_user
            .get_or_try_init(|| async {
                let url = self.api_url(&["api", "2.0", "preview", "scim", "v2", "Me"])?;
                self.client.get_json(url, &self.token).await
            })
            .await
    }

    /// List a volume through the Files API, following page tokens.
    async fn list_volume(&self, root: String) -> ProviderResult<Vec<Value>> {
        let mut records = Vec::new();
        let mut pending = vec![root];

        while let Some(directory) = pending.pop() {
            let mut page_token: Option<String> = None;
            loop {
                let mut segments = vec!["api", "2.0", "fs", "directories"];
                segments.extend(path_segments(&directory));
                let mut url = self.api_url(&segments)?;
                if let Some(token) = &page_token {
                    url.query_pairs_mut().append_pair("page_token", token);
                }

                let page = self.client.get_json(url, &self.token).await?;
                let (entries, next) = parse_directory_page(page)?;
                for entry in entries {
                    if self.recursive && is_directory(&entry, "is_directory") {
                        if let Some(path) = entry.get("path").and_then(Value::as_str) {
                            pending.push(path.to_string());
                        }
                    }
                    records.push(entry);
                }

                match next {
                    Some(token) => page_token = Some(token),
                    None => break,
                }
            }
        }
        Ok(records)
    }

    /// List DBFS, descending into directories when recursive.
    async fn list_dbfs(&self, root: &str) -> ProviderResult<Vec<Value>> {
        let mut records = Vec::new();
        let mut pending = vec![root.to_string()];

        while let Some(directory) = pending.pop() {
            let mut url = self.api_url(&["api", "2.0", "dbfs", "list"])?;
            url.query_pairs_mut().append_pair("path", &directory);

            let listing = self.client.get_json(url, &self.token).await?;
            for entry in parse_dbfs_listing(listing)? {
                if self.recursive && is_directory(&entry, "is_dir") {
                    if let Some(path) = entry.get("path").and_then(Value::as_str) {
                        pending.push(path.to_string());
                    }
                }
                records.push(entry);
            }
        }
        Ok(records)
    }
}

/// Non-empty `/`-separated components of a workspace path.
fn path_segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

fn is_directory(entry: &Value, flag: &str) -> bool {
    entry.get(flag).and_then(Value::as_bool).unwrap_or(false)
}

/// Combine the workspace url with the SCIM `Me` document.
fn workspace_record(workspace_url: &str, me: &Value) -> RawRecord {
    let mut record = match me {
        Value::Object(map) => map.clone(),
        _ => Map::new(),
    };
    record.insert(
        "workspace_url".to_string(),
        Value::String(workspace_url.to_string()),
    );
    Value::Object(record)
}

/// Split a Files API directory page into entries and the next page token.
///
/// An empty directory comes back as `{}`.
fn parse_directory_page(page: Value) -> ProviderResult<(Vec<Value>, Option<String>)> {
    let Value::Object(mut map) = page else {
        return Err(ProviderError::UnknownError(
            "Malformed response: expected a JSON object".to_string(),
        ));
    };
    let next = map
        .get("next_page_token")
        .and_then(Value::as_str)
        .filter(|t| !t.is_empty())
        .map(String::from);
    match map.remove("contents") {
        Some(Value::Array(entries)) => Ok((entries, next)),
        None | Some(Value::Null) => Ok((Vec::new(), next)),
        Some(_) => Err(ProviderError::UnknownError(
            "Malformed response: 'contents' is not an array".to_string(),
        )),
    }
}

/// Entries of a DBFS listing; an empty directory has no `files` key.
fn parse_dbfs_listing(listing: Value) -> ProviderResult<Vec<Value>> {
    match listing {
        Value::Object(mut map) => match map.remove("files") {
            Some(Value::Array(files)) => Ok(files),
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(_) => Err(ProviderError::UnknownError(
                "Malformed response: 'files' is not an array".to_string(),
            )),
        },
        Value::Null => Ok(Vec::new()),
        _ => Err(ProviderError::UnknownError(
            "Malformed response: expected a JSON object".to_string(),
        )),
    }
}

#[async_trait]
impl ProviderAdapter for DatabricksAdapter {
    fn kind(&self) -> ProviderKind {
        ProviderKind::AnalyticsWorkspace
    }

    async fn authenticate(&self) -> ProviderResult<()> {
        self.current_user().await.map(|_| ())
    }

    async fn describe_resource(&self) -> ProviderResult<RawRecord> {
        let me = self.current_user().await?;
        Ok(workspace_record(self.workspace_url(), me))
    }

    async fn list_resources(&self) -> ProviderResult<Vec<RawRecord>> {
        let records = match &self.root {
            ListingRoot::Volume {
                catalog,
                schema,
                volume,
            } => {
                let root = format!("/Volumes/{}/{}/{}", catalog, schema, volume);
                let records = self.list_volume(root.clone()).await?;
                info!("Listed volume={}, entries={}", root, records.len());
                records
            }
            ListingRoot::Dbfs(path) => {
                let records = self.list_dbfs(path).await?;
                info!("Listed dbfs={}, entries={}", path, records.len());
                records
            }
        };
        Ok(records)
    }
}
