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

//! Mapping of provider-native records onto the common schema
//!
//! Each provider kind has its own mapping module. All of them are pure: the
//! same record always yields the same [`ResourceMetadata`]. Attributes that do
//! not map onto a typed field are kept in `extra` under their native names,
//! and an `owner` is lifted into `extra["owner"]` when the record carries one
//! in a recognizable place.

mod analytics_workspace;
mod blob_storage;
mod document_site;
pub mod error;
pub mod fields;
pub mod metadata;
mod object_storage;

use crate::provider::{ProviderKind, RawRecord};
use fields::{find_owner, RecordFields};
use serde_json::Value;
use std::collections::HashSet;
use tracing::debug;

// Public exports
pub use error::{NormalizeError, NormalizeResult};
pub use metadata::{ResourceMetadata, ResourceType};

/// Normalize one native record.
///
/// # Errors
///
/// Returns `NormalizeError` if the record is not a JSON object, is of no
/// recognizable shape for `kind`, or lacks a field needed for `resource_id`.
pub fn normalize(kind: ProviderKind, record: &RawRecord) -> NormalizeResult<ResourceMetadata> {
    let fields = RecordFields::new(kind, record)?;
    let mut resource = match kind {
        ProviderKind::ObjectStorage => object_storage::normalize(fields)?,
        ProviderKind::BlobStorage => blob_storage::normalize(fields)?,
        ProviderKind::DocumentSite => document_site::normalize(fields)?,
        ProviderKind::AnalyticsWorkspace => analytics_workspace::normalize(fields)?,
    };

    if !resource.extra.contains_key("owner") {
        if let Some(owner) = find_owner(&resource.extra) {
            resource.extra.insert("owner".to_string(), Value::String(owner));
        }
    }
    Ok(resource)
}

/// Normalize every record of one provider, in order.
///
/// A single malformed record fails the whole batch. Records that repeat an
/// already seen `resource_id` are dropped, keeping the first occurrence.
pub fn normalize_all(
    kind: ProviderKind,
    records: &[RawRecord],
) -> NormalizeResult<Vec<ResourceMetadata>> {
    let mut seen = HashSet::with_capacity(records.len());
    let mut resources = Vec::with_capacity(records.len());

    for record in records {
        let resource = normalize(kind, record)?;
        if seen.insert(resource.resource_id.clone()) {
            resources.push(resource);
        } else {
            debug!(
                "Dropping duplicate resource provider={}, id={}",
                kind, resource.resource_id
            );
        }
    }
    Ok(resources)
}
