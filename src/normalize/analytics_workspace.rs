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

//! Databricks workspaces, Unity Catalog volume entries and DBFS entries.

use super::error::{NormalizeError, NormalizeResult};
use super::fields::{last_segment, RecordFields};
use super::metadata::{ResourceMetadata, ResourceType};
use crate::provider::ProviderKind;
use url::Url;

const KIND: ProviderKind = ProviderKind::AnalyticsWorkspace;

pub(super) fn normalize(mut fields: RecordFields) -> NormalizeResult<ResourceMetadata> {
    if fields.has("workspace_url") {
        let workspace_url = fields.require_str("workspace_url")?;
        let name = Url::parse(&workspace_url)
            .ok()
            .and_then(|u| u.host_str().map(String::from))
            .unwrap_or_else(|| workspace_url.clone());
        Ok(ResourceMetadata {
            provider_kind: KIND,
            resource_id: workspace_url,
            resource_type: ResourceType::Workspace,
            name,
            size_bytes: None,
            last_modified: None,
            extra: fields.into_extra(),
        })
    } else if fields.has("is_directory") {
        // Files API entry
        let resource_type = if fields.peek_bool("is_directory") {
            ResourceType::Directory
        } else {
            ResourceType::File
        };
        fields.discard("is_directory");
        let path = fields.require_str("path")?;
        let name = fields
            .take_str("name")
            .unwrap_or_else(|| last_segment(&path).to_string());
        Ok(ResourceMetadata {
            provider_kind: KIND,
            resource_id: path,
            resource_type,
            name,
            size_bytes: fields.take_u64("file_size"),
            last_modified: fields.take_timestamp("last_modified"),
            extra: fields.into_extra(),
        })
    } else if fields.has("is_dir") {
        // DBFS entry
        let resource_type = if fields.peek_bool("is_dir") {
            ResourceType::Directory
        } else {
            ResourceType::File
        };
        fields.discard("is_dir");
        let path = fields.require_str("path")?;
        Ok(ResourceMetadata {
            provider_kind: KIND,
            resource_id: format!("dbfs:{}", path),
            resource_type,
            name: last_segment(&path).to_string(),
            size_bytes: fields.take_u64("file_size"),
            last_modified: fields.take_timestamp("modification_time"),
            extra: fields.into_extra(),
        })
    } else {
        Err(NormalizeError::MalformedRecord {
            kind: KIND,
            reason: "record is neither a workspace, a volume entry nor a DBFS entry".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    fn run(record: serde_json::Value) -> NormalizeResult<ResourceMetadata> {
        normalize(RecordFields::new(KIND, &record)?)
    }

    #[test]
    fn test_workspace_record() {
        let resource = run(json!({
            "workspace_url": "https://adb-1234.5.azuredatabricks.net",
            "userName": "ops@example.com",
            "id": "7001",
        }))
        .unwrap();
        assert_eq!(resource.resource_id, "https://adb-1234.5.azuredatabricks.net");
        assert_eq!(resource.resource_type, ResourceType::Workspace);
        assert_eq!(resource.name, "adb-1234.5.azuredatabricks.net");
        assert_eq!(resource.extra["userName"], "ops@example.com");
    }

    #[test]
    fn test_volume_file_entry() {
        let resource = run(json!({
            "path": "/Volumes/main/default/landing/a.csv",
            "is_directory": false,
            "file_size": 12,
            "last_modified": 1704067200000_i64,
            "name": "a.csv",
        }))
        .unwrap();
        assert_eq!(resource.resource_id, "/Volumes/main/default/landing/a.csv");
        assert_eq!(resource.resource_type, ResourceType::File);
        assert_eq!(resource.name, "a.csv");
        assert_eq!(resource.size_bytes, Some(12));
        assert_eq!(
            resource.last_modified,
            Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())
        );
        assert!(resource.extra.is_empty());
    }

    #[test]
    fn test_volume_directory_entry() {
        let resource = run(json!({
            "path": "/Volumes/main/default/landing/sub/",
            "is_directory": true,
        }))
        .unwrap();
        assert_eq!(resource.resource_type, ResourceType::Directory);
        assert_eq!(resource.name, "sub");
        assert_eq!(resource.size_bytes, None);
    }

    #[test]
    fn test_dbfs_entry() {
        let resource = run(json!({
            "path": "/mnt/raw",
            "is_dir": true,
            "file_size": 0,
            "modification_time": 0,
        }))
        .unwrap();
        assert_eq!(resource.resource_id, "dbfs:/mnt/raw");
        assert_eq!(resource.resource_type, ResourceType::Directory);
        assert_eq!(resource.name, "raw");
        assert_eq!(resource.size_bytes, Some(0));
        assert_eq!(resource.last_modified, None);
        assert_eq!(resource.extra["modification_time"], 0);
    }

    #[test]
    fn test_entry_without_path_is_malformed() {
        let err = run(json!({"is_dir": false, "file_size": 3})).unwrap_err();
        assert!(matches!(err, NormalizeError::MissingField { .. }));
        assert!(run(json!({"name": "what"})).is_err());
    }
}
