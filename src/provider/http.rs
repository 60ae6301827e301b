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

//! Minimal JSON-over-HTTPS client shared by the REST adapters.

use super::config::ProviderConfig;
use super::error::{ProviderError, ProviderResult};
use reqwest::{Client, Response};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;
use url::Url;

const DEFAULT_CONNECT_TIMEOUT: u64 = 10;
const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// A reqwest client that decodes JSON bodies and classifies failures.
///
/// Only the connect timeout is set; the aggregator bounds whole invocations.
#[derive(Clone)]
pub struct JsonClient {
    client: Client,
}

impl JsonClient {
    pub fn new(config: &ProviderConfig) -> ProviderResult<Self> {
        let connect_timeout = config
            .duration_option("connect_timeout_secs")
            .filter(|d| !d.is_zero())
            .unwrap_or(Duration::from_secs(DEFAULT_CONNECT_TIMEOUT));

        let client = Client::builder()
            .connect_timeout(connect_timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| {
                ProviderError::ConfigError(format!("Failed to build HTTP client: {}", e))
            })?;

        Ok(Self { client })
    }

    /// GET a JSON document with a bearer token.
    pub async fn get_json(&self, url: Url, bearer: &str) -> ProviderResult<Value> {
        debug!("GET {}", url.path());
        let response = self.client.get(url).bearer_auth(bearer).send().await?;
        read_json(response).await
    }

    /// POST a form and decode the JSON answer. Used for OAuth token requests.
    pub async fn post_form(&self, url: Url, form: &[(&str, &str)]) -> ProviderResult<Value> {
        debug!("POST {}", url.path());
        let response = self.client.post(url).form(form).send().await?;
        read_json(response).await
    }
}

/// Append path segments to a base URL, percent-encoding each one.
///
/// # Errors
///
/// Returns `ProviderError::ConfigError` if `base` cannot carry a path
/// (e.g. `mailto:` URLs).
pub fn join_segments<S: AsRef<str>>(base: &Url, segments: &[S]) -> ProviderResult<Url> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| ProviderError::ConfigError(format!("Invalid base URL: {}", base)))?
        .pop_if_empty()
        .extend(segments.iter().map(|s| s.as_ref()));
    Ok(url)
}

/// Parse a base URL option and check it can carry a path.
pub fn parse_base_url(value: &str) -> ProviderResult<Url> {
    let url = Url::parse(value.trim())?;
    if url.cannot_be_a_base() || url.host_str().is_none() {
        return Err(ProviderError::ConfigError(format!(
            "Invalid URL: '{}' is not an absolute http(s) URL",
            value
        )));
    }
    Ok(url)
}

async fn read_json(response: Response) -> ProviderResult<Value> {
    let status = response.status().as_u16();
    let body = response.text().await?;
    parse_body(status, &body)
}

/// Turn a status and body into a JSON value or a classified error.
fn parse_body(status: u16, body: &str) -> ProviderResult<Value> {
    if !(200..300).contains(&status) {
        return Err(ProviderError::from_status(status, body));
    }
    if body.trim().is_empty() {
        return Ok(Value::Null);
    }
    Ok(serde_json::from_str(body)?)
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::error::ErrorKind;

    #[test]
    fn test_parse_body_success() {
        let value = parse_body(200, r#"{"value":[1,2]}"#).unwrap();
        assert_eq!(value["value"][1], 2);
        assert_eq!(parse_body(204, "").unwrap(), Value::Null);
    }

    #[test]
    fn test_parse_body_status_classification() {
        assert_eq!(
            parse_body(401, r#"{"error":"unauthorized"}"#).unwrap_err().kind(),
            ErrorKind::AuthError
        );
        assert_eq!(
            parse_body(403, "").unwrap_err().kind(),
            ErrorKind::PermissionError
        );
        assert_eq!(
            parse_body(429, "slow down").unwrap_err().kind(),
            ErrorKind::RateLimitError
        );
    }

    #[test]
    fn test_parse_body_malformed_json() {
        let err = parse_body(200, "<html>proxy login</html>").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownError);
        assert!(err.message().contains("Malformed response"));
    }

    #[test]
    fn test_join_segments_encodes() {
        let base = Url::parse("https://graph.microsoft.com/v1.0/").unwrap();
        let url = join_segments(&base, &["sites", "contoso.sharepoint.com:", "sites", "HR Docs"])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://graph.microsoft.com/v1.0/sites/contoso.sharepoint.com:/sites/HR%20Docs"
        );
    }

    #[test]
    fn test_parse_base_url() {
        assert!(parse_base_url("https://adb-1.azuredatabricks.net").is_ok());
        assert_eq!(
            parse_base_url("adb-1.azuredatabricks.net").unwrap_err().kind(),
            ErrorKind::ConfigError
        );
        assert_eq!(
            parse_base_url("mailto:ops@example.com").unwrap_err().kind(),
            ErrorKind::ConfigError
        );
    }

    #[tokio::test]
    async fn test_canned_status_is_classified() {
        let server = testing::CannedServer::start(&[
            ("/ok", 200, r#"{"next":"{base}/ok"}"#),
            ("/busy", 429, "slow down"),
        ])
        .await;
        let client = JsonClient::new(&ProviderConfig::document_site()).unwrap();
        let base = parse_base_url(server.base()).unwrap();

        let value = client
            .get_json(join_segments(&base, &["ok"]).unwrap(), "token")
            .await
            .unwrap();
        assert_eq!(value["next"], format!("{}/ok", server.base()));

        let err = client
            .get_json(join_segments(&base, &["busy"]).unwrap(), "token")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RateLimitError);
        assert_eq!(server.requests(), vec!["GET /ok", "GET /busy"]);
    }

    #[tokio::test]
    async fn test_unreachable_host_is_network_error() {
        let client = JsonClient::new(&ProviderConfig::document_site()).unwrap();
        let url = Url::parse("http://127.0.0.1:1/v1.0/sites/root").unwrap();
        let err = client.get_json(url, "token").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NetworkError);
    }
}
