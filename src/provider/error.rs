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

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use thiserror::Error;

/// Classification of a provider failure as it appears in the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    ConfigError,
    AuthError,
    PermissionError,
    NetworkError,
    RateLimitError,
    UnknownError,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::ConfigError => "ConfigError",
            ErrorKind::AuthError => "AuthError",
            ErrorKind::PermissionError => "PermissionError",
            ErrorKind::NetworkError => "NetworkError",
            ErrorKind::RateLimitError => "RateLimitError",
            ErrorKind::UnknownError => "UnknownError",
        }
    }

    /// Transient failures worth another attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorKind::NetworkError | ErrorKind::RateLimitError)
    }
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

/// Errors that can occur while querying a single provider
///
/// Every failure of an adapter ends up in exactly one of these variants. They
/// are scoped to one provider and are recorded in that provider's outcome.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Authentication error: {0}")]
    AuthError(String),

    #[error("Permission error: {0}")]
    PermissionError(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Rate limit error: {0}")]
    RateLimitError(String),

    #[error("Unknown error: {0}")]
    UnknownError(String),
}

/// Result type for provider operations
pub type ProviderResult<T> = Result<T, ProviderError>;

impl ProviderError {
    /// Build an error of the given kind.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        let message = message.into();
        match kind {
            ErrorKind::ConfigError => ProviderError::ConfigError(message),
            ErrorKind::AuthError => ProviderError::AuthError(message),
            ErrorKind::PermissionError => ProviderError::PermissionError(message),
            ErrorKind::NetworkError => ProviderError::NetworkError(message),
            ErrorKind::RateLimitError => ProviderError::RateLimitError(message),
            ErrorKind::UnknownError => ProviderError::UnknownError(message),
        }
    }

    /// The error raised when a provider does not answer within its timeout.
    pub fn timeout() -> Self {
        ProviderError::NetworkError("timeout".to_string())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ProviderError::ConfigError(_) => ErrorKind::ConfigError,
            ProviderError::AuthError(_) => ErrorKind::AuthError,
            ProviderError::PermissionError(_) => ErrorKind::PermissionError,
            ProviderError::NetworkError(_) => ErrorKind::NetworkError,
            ProviderError::RateLimitError(_) => ErrorKind::RateLimitError,
            ProviderError::UnknownError(_) => ErrorKind::UnknownError,
        }
    }

    /// The bare message, without the kind prefix added by `Display`.
    pub fn message(&self) -> &str {
        match self {
            ProviderError::ConfigError(m)
            | ProviderError::AuthError(m)
            | ProviderError::PermissionError(m)
            | ProviderError::NetworkError(m)
            | ProviderError::RateLimitError(m)
            | ProviderError::UnknownError(m) => m,
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.kind().is_retryable()
    }

    /// Classify an HTTP error response.
    ///
    /// # Arguments
    ///
    /// * `status` - The HTTP status code
    /// * `body` - The response body, used for the message and for OAuth error codes
    pub fn from_status(status: u16, body: &str) -> Self {
        let message = format!("HTTP {}: {}", status, truncate(body.trim(), 512));
        let kind = match status {
            401 => ErrorKind::AuthError,
            403 => ErrorKind::PermissionError,
            429 | 503 => ErrorKind::RateLimitError,
            408 | 502 | 504 => ErrorKind::NetworkError,
            400 if is_oauth_client_error(body) => ErrorKind::AuthError,
            _ => ErrorKind::UnknownError,
        };
        ProviderError::new(kind, message)
    }

    /// Classify an error that only carries free text.
    ///
    /// Used for SDK errors that wrap the provider response in a generic message.
    pub fn from_message(message: impl Into<String>) -> Self {
        let message = message.into();
        let kind = classify_message(&message);
        ProviderError::new(kind, message)
    }
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

fn is_oauth_client_error(body: &str) -> bool {
    ["invalid_client", "unauthorized_client", "invalid_grant", "AADSTS"]
        .iter()
        .any(|marker| body.contains(marker))
}

/// Map free text from an SDK error onto the taxonomy.
///
/// Status codes and error codes only count as whole words, so a request id
/// or byte count that happens to contain `401` is not an auth failure.
pub fn classify_message(message: &str) -> ErrorKind {
    let lower = message.to_lowercase();
    let words: Vec<&str> = lower
        .split(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .filter(|w| !w.is_empty())
        .collect();
    let has_word = |markers: &[&str]| markers.iter().any(|m| words.contains(m));
    let has_phrase = |phrases: &[&str]| phrases.iter().any(|p| lower.contains(p));

    if has_word(&["429", "slowdown", "toomanyrequests", "serverbusy"])
        || has_phrase(&["too many requests", "throttl", "rate limit"])
    {
        ErrorKind::RateLimitError
    } else if has_word(&[
        "401",
        "invalidaccesskeyid",
        "signaturedoesnotmatch",
        "expiredtoken",
        "authenticationfailed",
        "invalidauthenticationinfo",
        "unauthenticated",
        "unauthorized",
        "invalid_client",
    ]) {
        ErrorKind::AuthError
    } else if has_word(&[
        "403",
        "accessdenied",
        "authorizationpermissionmismatch",
        "authorizationfailure",
        "forbidden",
    ]) || has_phrase(&["access denied", "permission"])
    {
        ErrorKind::PermissionError
    } else if has_phrase(&[
        "timed out",
        "timeout",
        "connection refused",
        "connection reset",
        "connection closed",
        "error sending request",
        "error trying to connect",
        "tcp connect error",
        "dns error",
        "failed to lookup address",
        "broken pipe",
    ]) {
        ErrorKind::NetworkError
    } else {
        ErrorKind::UnknownError
    }
}

impl From<object_store::Error> for ProviderError {
    fn from(e: object_store::Error) -> Self {
        match e {
            object_store::Error::Unauthenticated { .. } => ProviderError::AuthError(e.to_string()),
            object_store::Error::PermissionDenied { .. } => {
                ProviderError::PermissionError(e.to_string())
            }
            object_store::Error::UnknownConfigurationKey { .. } => {
                ProviderError::ConfigError(e.to_string())
            }
            other => ProviderError::from_message(other.to_string()),
        }
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(e: reqwest::Error) -> Self {
        if let Some(status) = e.status() {
            return ProviderError::from_status(status.as_u16(), &e.to_string());
        }
        if e.is_timeout() || e.is_connect() || e.is_request() {
            ProviderError::NetworkError(e.to_string())
        } else if e.is_decode() || e.is_body() {
            ProviderError::UnknownError(format!("Malformed response: {}", e))
        } else {
            ProviderError::from_message(e.to_string())
        }
    }
}

impl From<url::ParseError> for ProviderError {
    fn from(e: url::ParseError) -> Self {
        ProviderError::ConfigError(format!("Invalid URL: {}", e))
    }
}

impl From<serde_json::Error> for ProviderError {
    fn from(e: serde_json::Error) -> Self {
        ProviderError::UnknownError(format!("Malformed response: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error() {
        let error = ProviderError::ConfigError("Missing 'bucket' option".to_string());
        assert_eq!(
            error.to_string(),
            "Configuration error: Missing 'bucket' option"
        );
        assert_eq!(error.kind(), ErrorKind::ConfigError);
        assert_eq!(error.message(), "Missing 'bucket' option");
    }

    #[test]
    fn test_timeout_is_network_error() {
        let error = ProviderError::timeout();
        assert_eq!(error.kind(), ErrorKind::NetworkError);
        assert_eq!(error.message(), "timeout");
        assert!(error.is_retryable());
    }

    #[test]
    fn test_new_round_trips_kind() {
        let kinds = [
            ErrorKind::ConfigError,
            ErrorKind::AuthError,
            ErrorKind::PermissionError,
            ErrorKind::NetworkError,
            ErrorKind::RateLimitError,
            ErrorKind::UnknownError,
        ];
        for kind in kinds {
            let error = ProviderError::new(kind, "boom");
            assert_eq!(error.kind(), kind);
            assert_eq!(error.message(), "boom");
        }
    }

    #[test]
    fn test_retryable_kinds() {
        assert!(ErrorKind::NetworkError.is_retryable());
        assert!(ErrorKind::RateLimitError.is_retryable());
        assert!(!ErrorKind::AuthError.is_retryable());
        assert!(!ErrorKind::PermissionError.is_retryable());
        assert!(!ErrorKind::ConfigError.is_retryable());
        assert!(!ErrorKind::UnknownError.is_retryable());
    }

    #[test]
    fn test_error_kind_serialization() {
        assert_eq!(
            serde_json::to_string(&ErrorKind::AuthError).unwrap(),
            "\"AuthError\""
        );
        let kind: ErrorKind = serde_json::from_str("\"RateLimitError\"").unwrap();
        assert_eq!(kind, ErrorKind::RateLimitError);
    }

    #[test]
    fn test_from_status() {
        assert_eq!(
            ProviderError::from_status(401, "").kind(),
            ErrorKind::AuthError
        );
        assert_eq!(
            ProviderError::from_status(403, "").kind(),
            ErrorKind::PermissionError
        );
        assert_eq!(
            ProviderError::from_status(429, "").kind(),
            ErrorKind::RateLimitError
        );
        assert_eq!(
            ProviderError::from_status(503, "").kind(),
            ErrorKind::RateLimitError
        );
        assert_eq!(
            ProviderError::from_status(504, "").kind(),
            ErrorKind::NetworkError
        );
        assert_eq!(
            ProviderError::from_status(404, "not here").kind(),
            ErrorKind::UnknownError
        );
    }

    #[test]
    fn test_from_status_oauth_bad_request() {
        let body = r#"{"error":"invalid_client","error_description":"AADSTS7000215: Invalid client secret"}"#;
        let error = ProviderError::from_status(400, body);
        assert_eq!(error.kind(), ErrorKind::AuthError);
        assert!(error.message().starts_with("HTTP 400"));

        let plain = ProviderError::from_status(400, "bad path");
        assert_eq!(plain.kind(), ErrorKind::UnknownError);
    }

    #[test]
    fn test_from_status_truncates_body() {
        let body = "x".repeat(2000);
        let error = ProviderError::from_status(500, &body);
        assert!(error.message().len() < 600);
    }

    #[test]
    fn test_classify_message() {
        assert_eq!(
            classify_message("Error performing list: SlowDown, please reduce request rate"),
            ErrorKind::RateLimitError
        );
        assert_eq!(
            classify_message("The AWS Access Key Id you provided does not exist: InvalidAccessKeyId"),
            ErrorKind::AuthError
        );
        assert_eq!(
            classify_message("AccessDenied: Access Denied"),
            ErrorKind::PermissionError
        );
        assert_eq!(
            classify_message("error sending request for url: Connection refused"),
            ErrorKind::NetworkError
        );
        assert_eq!(
            classify_message("something odd happened"),
            ErrorKind::UnknownError
        );
    }

    #[test]
    fn test_classify_message_matches_whole_words() {
        assert_eq!(
            classify_message("Client error with status 429 Too Many Requests"),
            ErrorKind::RateLimitError
        );
        assert_eq!(classify_message("HTTP status 401"), ErrorKind::AuthError);
        assert_eq!(
            classify_message("Server returned 403: Forbidden"),
            ErrorKind::PermissionError
        );
        assert_eq!(
            classify_message("error trying to connect: tcp connect error"),
            ErrorKind::NetworkError
        );

        assert_eq!(
            classify_message("stream disconnected after 4010 bytes"),
            ErrorKind::UnknownError
        );
        assert_eq!(
            classify_message("request id 4291-ab40-4031 failed validation"),
            ErrorKind::UnknownError
        );
        assert_eq!(
            classify_message("NotConnected while reading body"),
            ErrorKind::UnknownError
        );
    }

    #[test]
    fn test_object_store_not_found_is_classified() {
        let error: ProviderError = object_store::Error::NotFound {
            path: "missing".to_string(),
            source: "NoSuchBucket".into(),
        }
        .into();
        assert_eq!(error.kind(), ErrorKind::UnknownError);
    }

    #[test]
    fn test_object_store_unauthenticated() {
        let error: ProviderError = object_store::Error::Unauthenticated {
            path: "bucket".to_string(),
            source: "bad signature".into(),
        }
        .into();
        assert_eq!(error.kind(), ErrorKind::AuthError);
    }

    #[test]
    fn test_object_store_permission_denied() {
        let error: ProviderError = object_store::Error::PermissionDenied {
            path: "bucket".to_string(),
            source: "missing s3:ListBucket".into(),
        }
        .into();
        assert_eq!(error.kind(), ErrorKind::PermissionError);
    }

    #[test]
    fn test_url_parse_error_conversion() {
        let error: ProviderError = url::ParseError::EmptyHost.into();
        assert_eq!(error.kind(), ErrorKind::ConfigError);
        assert!(error.to_string().contains("Invalid URL"));
    }

    #[test]
    fn test_json_error_conversion() {
        let json_error = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let error: ProviderError = json_error.into();
        assert_eq!(error.kind(), ErrorKind::UnknownError);
        assert!(error.message().contains("Malformed response"));
    }
}
