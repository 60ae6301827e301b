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

//! SharePoint sites and drive items as returned by Microsoft Graph.

use super::error::{NormalizeError, NormalizeResult};
use super::fields::RecordFields;
use super::metadata::{ResourceMetadata, ResourceType};
use crate::provider::ProviderKind;

const KIND: ProviderKind = ProviderKind::DocumentSite;

/// Drive items carry one of these facets; sites never do.
fn is_drive_item(fields: &RecordFields) -> bool {
    fields.has("file") || fields.has("folder") || fields.has("parentReference")
}

pub(super) fn normalize(mut fields: RecordFields) -> NormalizeResult<ResourceMetadata> {
    if is_drive_item(&fields) {
        let drive_id = fields
            .peek_path(&["parentReference", "driveId"])
            .map(String::from)
            .ok_or_else(|| NormalizeError::MissingField {
                kind: KIND,
                field: "parentReference.driveId".to_string(),
            })?;
        let item_id = fields.require_str("id")?;
        let resource_type = if fields.has("folder") {
            ResourceType::Folder
        } else {
            ResourceType::File
        };
        let name = fields.take_str("name").unwrap_or_else(|| item_id.clone());

        Ok(ResourceMetadata {
            provider_kind: KIND,
            resource_id: format!("sharepoint://{}/{}", drive_id, item_id),
            resource_type,
            name,
            // Graph reports the aggregate size of a folder's contents
            size_bytes: fields.take_u64("size"),
            last_modified: fields.take_timestamp("lastModifiedDateTime"),
            extra: fields.into_extra(),
        })
    } else if fields.has("id") {
        let site_id = fields.require_str("id")?;
        let name = fields
            .take_str("displayName")
            .or_else(|| fields.take_str("name"))
            .unwrap_or_else(|| site_id.clone());

        Ok(ResourceMetadata {
            provider_kind: KIND,
            resource_id: format!("sharepoint://sites/{}", site_id),
            resource_type: ResourceType::Site,
            name,
            size_bytes: None,
            last_modified: fields.take_timestamp("lastModifiedDateTime"),
            extra: fields.into_extra(),
        })
    } else {
        Err(NormalizeError::MissingField {
            kind: KIND,
            field: "id".to_string(),
        })
    }
}
