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
use serde_json::Value;
use tokio::sync::OnceCell;
use tracing::{debug, info};
use url::Url;

const DEFAULT_GRAPH_ENDPOINT: &str = "https://graph.microsoft.com/v1.0";
const DEFAULT_AUTHORITY_HOST: &str = "https://login.microsoftonline.com";

const KNOWN_OPTIONS: &[&str] = &[
    "tenant_id",
    "client_id",
    "client_secret",
    "site_id",
    "site_url",
    "drive_id",
    "graph_endpoint",
    "authority_host",
    "recursive",
    "connect_timeout_secs",
];

/// How the target site is addressed.
#[derive(Debug, Clone, PartialEq, Eq)]
enum SiteRef {
    Id(String),
    /// Hostname plus server-relative path, resolved through `/sites/{host}:/{path}`.
    Url { host: String, path: Vec<String> },
}

impl SiteRef {
    fn from_url(site_url: &str) -> ProviderResult<Self> {
        let url = parse_base_url(site_url)?;
        let host = url
            .host_str()
            .ok_or_else(|| ProviderError::ConfigError(format!("Invalid site_url: {}", site_url)))?
            .to_string();
        let path = url
            .path_segments()
            .map(|segments| {
                segments
                    .filter(|s| !s.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();
        Ok(SiteRef::Url { host, path })
    }

    /// Graph path segments addressing the site.
    fn segments(&self) -> Vec<String> {
        match self {
            SiteRef::Id(id) => vec!["sites".to_string(), id.clone()],
            SiteRef::Url { host, path } if path.is_empty() => {
                vec!["sites".to_string(), host.clone()]
            }
            SiteRef::Url { host, path } => {
                let mut segments = vec!["sites".to_string(), format!("{}:", host)];
                segments.extend(path.iter().cloned());
                segments
            }
        }
    }
}

/// Document site adapter for SharePoint Online, through Microsoft Graph.
///
/// Authenticates with the OAuth client-credentials flow, resolves the site,
/// enumerates its document libraries (or the configured one) and walks the
/// drive items. The token and the resolved site are cached for the lifetime
/// of the adapter, which is a single run.
pub struct SharePointAdapter {
    client: JsonClient,
    tenant_id: String,
    client_id: String,
    client_secret: String,
    site: SiteRef,
    drive_id: Option<String>,
    graph_endpoint: Url,
    authority_host: Url,
    recursive: bool,
    token: OnceCell<String>,
    site_resource: OnceCell<Value>,
}

impl SharePointAdapter {
    /// Create a new SharePoint adapter.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError::ConfigError` if the tenant, client id or
    /// secret is missing, if neither `site_id` nor `site_url` is given, or if
    /// one of the URLs is malformed.
    pub fn new(config: &ProviderConfig) -> ProviderResult<Self> {
        let tenant_id = config.require_option("tenant_id")?.to_string();
        let client_id = config.require_option("client_id")?.to_string();
        let client_secret = config.require_option("client_secret")?.to_string();

        let site = match (
            config.non_empty_option("site_id"),
            config.non_empty_option("site_url"),
        ) {
            (Some(id), _) => SiteRef::Id(id.to_string()),
            (None, Some(url)) => SiteRef::from_url(url)?,
            (None, None) => {
                return Err(ProviderError::ConfigError(
                    "document-site requires 'site_id' or 'site_url' option".to_string(),
                ))
            }
        };

        let graph_endpoint = parse_base_url(
            config
                .non_empty_option("graph_endpoint")
                .unwrap_or(DEFAULT_GRAPH_ENDPOINT),
        )?;
        let authority_host = parse_base_url(
            config
                .non_empty_option("authority_host")
                .unwrap_or(DEFAULT_AUTHORITY_HOST),
        )?;

        for key in config.options.keys() {
            if !KNOWN_OPTIONS.contains(&key.as_str()) && !RUN_OPTIONS.contains(&key.as_str()) {
                tracing::warn!("Unknown SharePoint option: {}", key);
            }
        }

        Ok(Self {
            client: JsonClient::new(config)?,
            tenant_id,
            client_id,
            client_secret,
            site,
            drive_id: config.non_empty_option("drive_id").map(String::from),
            graph_endpoint,
            authority_host,
            recursive: config.recursive(),
            token: OnceCell::new(),
            site_resource: OnceCell::new(),
        })
    }

    fn graph_url<S: AsRef<str>>(&self, segments: &[S]) -> ProviderResult<Url> {
        join_segments(&self.graph_endpoint, segments)
    }

    /// Scope for the client-credentials grant, derived from the Graph endpoint.
    fn scope(&self) -> String {
        format!("{}/.default", self.graph_endpoint.origin().ascii_serialization())
    }

    async fn access_token(&self) -> ProviderResult<&str> {
        let token = self
            .token
            .get_or_try_init(|| async {
                let url = join_segments(
                    &self.authority_host,
                    &[self.tenant_id.as_str(), "oauth2", "v2.0", "token"],
                )?;
                let scope = self.scope();
                let response = self
                    .client
                    .post_form(
                        url,
                        &[
                            ("grant_type", "client_credentials"),
                            ("client_id", self.client_id.as_str()),
                            ("client_secret", self.client_secret.as_str()),
                            ("scope", scope.as_str()),
                        ],
                    )
                    .await?;
                parse_token(&response)
            })
            .await?;
        Ok(token.as_str())
    }

    async fn site(&self) -> ProviderResult<&Value> {
        self.site_resource
            .get_or_try_init(|| async {
                let token = self.access_token().await?;
                let site = self
                    .client
                    .get_json(self.graph_url(&self.site.segments())?, token)
                    .await?;
                if site_id(&site).is_none() {
                    return Err(ProviderError::UnknownError(
                        "Malformed response: site without 'id'".to_string(),
                    ));
                }
                debug!("Resolved site id={}", site_id(&site).unwrap_or_default());
                Ok(site)
            })
            .await
    }

    /// Follow `@odata.nextLink` from `first` and collect every item.
    async fn collect_pages(&self, first: Url) -> ProviderResult<Vec<Value>> {
        let token = self.access_token().await?;
        let mut items = Vec::new();
        let mut next = Some(first);
        while let Some(url) = next.take() {
            let page = self.client.get_json(url, token).await?;
            let (values, next_link) = parse_page(page)?;
            items.extend(values);
            next = next_link;
        }
        Ok(items)
    }

    async fn drive_ids(&self, site_id: &str) -> ProviderResult<Vec<String>> {
        if let Some(drive_id) = &self.drive_id {
            return Ok(vec![drive_id.clone()]);
        }
        let drives = self
            .collect_pages(self.graph_url(&["sites", site_id, "drives"])?)
            .await?;
        drives
            .iter()
            .map(|drive| {
                drive
                    .get("id")
                    .and_then(Value::as_str)
                    .map(String::from)
                    .ok_or_else(|| {
                        ProviderError::UnknownError(
                            "Malformed response: drive without 'id'".to_string(),
                        )
                    })
            })
            .collect()
    }

    /// Walk one drive, descending into folders when recursive.
    async fn walk_drive(&self, drive_id: &str) -> ProviderResult<Vec<Value>> {
        let mut records = Vec::new();
        let mut pending = vec![self.graph_url(&["drives", drive_id, "root", "children"])?];

        while let Some(url) = pending.pop() {
            for item in self.collect_pages(url).await? {
                let item = with_drive_id(item, drive_id);
                if self.recursive {
                    if let Some(folder_id) = folder_id(&item) {
                        pending.push(self.graph_url(&[
                            "drives", drive_id, "items", folder_id, "children",
                        ])?);
                    }
                }
                records.push(item);
            }
        }
        Ok(records)
    }
}

/// Extract the bearer token from a token endpoint response.
fn parse_token(response: &Value) -> ProviderResult<String> {
    response
        .get("access_token")
        .and_then(Value::as_str)
        .filter(|t| !t.is_empty())
        .map(String::from)
        .ok_or_else(|| {
            ProviderError::AuthError("Token response did not contain an access_token".to_string())
        })
}

/// Split a Graph collection page into its items and the next page link.
fn parse_page(page: Value) -> ProviderResult<(Vec<Value>, Option<Url>)> {
    let next_link = match page.get("@odata.nextLink").and_then(Value::as_str) {
        Some(link) => Some(Url::parse(link).map_err(|e| {
            ProviderError::UnknownError(format!("Malformed response: bad nextLink: {}", e))
        })?),
        None => None,
    };
    match page {
        Value::Object(mut map) => match map.remove("value") {
            Some(Value::Array(items)) => Ok((items, next_link)),
            _ => Err(ProviderError::UnknownError(
                "Malformed response: collection without 'value' array".to_string(),
            )),
        },
        _ => Err(ProviderError::UnknownError(
            "Malformed response: expected a JSON object".to_string(),
        )),
    }
}

fn site_id(site: &Value) -> Option<&str> {
    site.get("id").and_then(Value::as_str)
}

/// The item id of a driveItem that is a folder.
fn folder_id(item: &Value) -> Option<&str> {
    if item.get("folder").is_some() {
        item.get("id").and_then(Value::as_str)
    } else {
        None
    }
}

/// Make sure `parentReference.driveId` is set; list responses may omit it.
fn with_drive_id(mut item: Value, drive_id: &str) -> Value {
    if let Value::Object(map) = &mut item {
        let parent = map
            .entry("parentReference")
            .or_insert_with(|| Value::Object(Default::default()));
        if let Value::Object(parent) = parent {
            parent
                .entry("driveId")
                .or_insert_with(|| Value::String(drive_id.to_string()));
        }
    }
    item
}

#[async_trait]
impl ProviderAdapter for SharePointAdapter {
    fn kind(&self) -> ProviderKind {
        ProviderKind::DocumentSite
    }

    async fn authenticate(&self) -> ProviderResult<()> {
        self.access_token().await.map(|_| ())
    }

    async fn describe_resource(&self) -> ProviderResult<RawRecord> {
        Ok(self.site().await?.clone())
    }

    async fn list_resources(&self) -> ProviderResult<Vec<RawRecord>> {
        let site_id = site_id(self.site().await?).unwrap_or_default().to_string();

        let mut records = Vec::new();
        for drive_id in self.drive_ids(&site_id).await? {
            let items = self.walk_drive(&drive_id).await?;
            info!("Listed site={}, drive={}, items={}", site_id, drive_id, items.len());
            records.extend(items);
        }
        Ok(records)
    }
}
