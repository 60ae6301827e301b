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

use crate::provider::{ProviderError, ProviderKind};
use thiserror::Error;

/// Errors raised while mapping a native record onto the common schema
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NormalizeError {
    #[error("Malformed {kind} record: {reason}")]
    MalformedRecord { kind: ProviderKind, reason: String },

    #[error("Malformed {kind} record: missing '{field}'")]
    MissingField { kind: ProviderKind, field: String },
}

/// Result type for normalization
pub type NormalizeResult<T> = Result<T, NormalizeError>;

impl From<NormalizeError> for ProviderError {
    fn from(e: NormalizeError) -> Self {
        ProviderError::UnknownError(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::ErrorKind;

    #[test]
    fn test_missing_field_message() {
        let error = NormalizeError::MissingField {
            kind: ProviderKind::ObjectStorage,
            field: "Key".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Malformed object-storage record: missing 'Key'"
        );
    }

    #[test]
    fn test_converts_to_unknown_provider_error() {
        let error: ProviderError = NormalizeError::MalformedRecord {
            kind: ProviderKind::AnalyticsWorkspace,
            reason: "unrecognized entry".to_string(),
        }
        .into();
        assert_eq!(error.kind(), ErrorKind::UnknownError);
        assert!(error.message().contains("analytics-workspace"));
    }
}
