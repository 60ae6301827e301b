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

use async_trait::async_trait;
use std::fmt::{Debug, Formatter, Result as FmtResult};

use super::config::ProviderKind;
use super::error::ProviderResult;

/// One provider-native record, as a JSON object using the provider's own field names.
pub type RawRecord = serde_json::Value;

/// Generic trait for provider adapters
///
/// This trait provides a uniform capability over the native listing and
/// description calls of each provider (S3, Azure Blob Storage, SharePoint,
/// Databricks). Adapters are read-only and make a single attempt per call;
/// retries and timeouts belong to the caller.
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    /// The provider kind this adapter serves.
    fn kind(&self) -> ProviderKind;

    /// Establish credentials with the provider.
    ///
    /// # Errors
    ///
    /// Returns `AuthError` for rejected credentials, `NetworkError` when the
    /// provider cannot be reached.
    async fn authenticate(&self) -> ProviderResult<()>;

    /// Describe the top-level resource this configuration points at
    /// (bucket, container, site or workspace).
    ///
    /// # Returns
    ///
    /// A single native record for the resource.
    async fn describe_resource(&self) -> ProviderResult<RawRecord>;

    /// List every resource visible under the top-level resource.
    ///
    /// # Returns
    ///
    /// Native records, possibly empty. A failure anywhere in the listing fails
    /// the whole call; partial listings are never returned.
    async fn list_resources(&self) -> ProviderResult<Vec<RawRecord>>;

    /// Fetch all metadata for this provider.
    ///
    /// Authenticates, then returns the top-level record followed by every
    /// listed resource.
    async fn fetch_metadata(&self) -> ProviderResult<Vec<RawRecord>> {
        self.authenticate().await?;
        let top_level = self.describe_resource().await?;
        let listed = self.list_resources().await?;

        let mut records = Vec::with_capacity(listed.len() + 1);
        records.push(top_level);
        records.extend(listed);
        Ok(records)
    }
}

impl Debug for dyn ProviderAdapter {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "ProviderAdapter(kind={})", self.kind())
    }
}
