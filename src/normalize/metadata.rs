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

use crate::provider::ProviderKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter, Result as FmtResult};

/// What a resource is, across providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceType {
    Bucket,
    Object,
    Prefix,
    Container,
    Blob,
    Directory,
    Site,
    File,
    Folder,
    Workspace,
}

impl ResourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceType::Bucket => "bucket",
            ResourceType::Object => "object",
            ResourceType::Prefix => "prefix",
            ResourceType::Container => "container",
            ResourceType::Blob => "blob",
            ResourceType::Directory => "directory",
            ResourceType::Site => "site",
            ResourceType::File => "file",
            ResourceType::Folder => "folder",
            ResourceType::Workspace => "workspace",
        }
    }

    /// Top-level resources: the bucket, container, site or workspace itself.
    pub fn is_top_level(&self) -> bool {
        matches!(
            self,
            ResourceType::Bucket
                | ResourceType::Container
                | ResourceType::Site
                | ResourceType::Workspace
        )
    }
}

impl Display for ResourceType {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

/// One resource in the common schema.
///
/// `(provider_kind, resource_id)` is unique within a report. `extra` keeps
/// every native attribute that did not map onto a typed field, under its
/// original name; being a `BTreeMap` it serializes in sorted key order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceMetadata {
    pub provider_kind: ProviderKind,
    pub resource_id: String,
    pub resource_type: ResourceType,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<DateTime<Utc>>,
    #[serde(default)]
    pub extra: BTreeMap<String, Value>,
}

impl ResourceMetadata {
    pub fn owner(&self) -> Option<&str> {
        self.extra.get("owner").and_then(Value::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn sample() -> ResourceMetadata {
        ResourceMetadata {
            provider_kind: ProviderKind::BlobStorage,
            resource_id: "azure://acct/reports/2024/jan.parquet".to_string(),
            resource_type: ResourceType::Blob,
            name: "jan.parquet".to_string(),
            size_bytes: Some(2048),
            last_modified: Some(Utc.with_ymd_and_hms(2024, 2, 1, 8, 30, 0).unwrap()),
            extra: [
                ("owner".to_string(), json!("finance")),
                ("Etag".to_string(), json!("0x8DC")),
            ]
            .into_iter()
            .collect(),
        }
    }

    #[test]
    fn test_serialization_shape() {
        let value = serde_json::to_value(sample()).unwrap();
        assert_eq!(value["provider_kind"], "blob-storage");
        assert_eq!(value["resource_type"], "blob");
        assert_eq!(value["size_bytes"], 2048);
        assert_eq!(value["last_modified"], "2024-02-01T08:30:00Z");
        assert_eq!(value["extra"]["owner"], "finance");
    }

    #[test]
    fn test_absent_optionals_are_omitted() {
        let mut resource = sample();
        resource.size_bytes = None;
        resource.last_modified = None;
        let value = serde_json::to_value(&resource).unwrap();
        assert!(value.get("size_bytes").is_none());
        assert!(value.get("last_modified").is_none());

        let back: ResourceMetadata = serde_json::from_value(value).unwrap();
        assert_eq!(back, resource);
    }

    #[test]
    fn test_extra_keys_sorted() {
        let json = serde_json::to_string(&sample()).unwrap();
        let etag = json.find("\"Etag\"").unwrap();
        let owner = json.find("\"owner\"").unwrap();
        assert!(etag < owner);
    }

    #[test]
    fn test_owner_accessor() {
        assert_eq!(sample().owner(), Some("finance"));
    }

    #[test]
    fn test_top_level_types() {
        assert!(ResourceType::Site.is_top_level());
        assert!(!ResourceType::Folder.is_top_level());
    }
}
