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

//! Azure containers, blobs and virtual directories.

use super::error::{NormalizeError, NormalizeResult};
use super::fields::{last_segment, RecordFields};
use super::metadata::{ResourceMetadata, ResourceType};
use crate::provider::ProviderKind;

const KIND: ProviderKind = ProviderKind::BlobStorage;

pub(super) fn normalize(mut fields: RecordFields) -> NormalizeResult<ResourceMetadata> {
    if fields.has("BlobPrefix") {
        let account = fields.require_str("AccountName")?;
        let container = fields.require_str("Container")?;
        let prefix = fields.require_str("BlobPrefix")?;
        Ok(ResourceMetadata {
            provider_kind: KIND,
            resource_id: format!("azure://{}/{}/{}", account, container, prefix),
            resource_type: ResourceType::Directory,
            name: last_segment(&prefix).to_string(),
            size_bytes: None,
            last_modified: None,
            extra: fields.into_extra(),
        })
    } else if fields.has("Name") {
        let account = fields.require_str("AccountName")?;
        let container = fields.require_str("Container")?;
        let name = fields.require_str("Name")?;
        Ok(ResourceMetadata {
            provider_kind: KIND,
            resource_id: format!("azure://{}/{}/{}", account, container, name),
            resource_type: ResourceType::Blob,
            name: last_segment(&name).to_string(),
            size_bytes: fields.take_u64("Content-Length"),
            last_modified: fields.take_timestamp("Last-Modified"),
            extra: fields.into_extra(),
        })
    } else if fields.has("ContainerName") {
        let account = fields.require_str("AccountName")?;
        let container = fields.require_str("ContainerName")?;
        Ok(ResourceMetadata {
            provider_kind: KIND,
            resource_id: format!("azure://{}/{}", account, container),
            resource_type: ResourceType::Container,
            name: container,
            size_bytes: None,
            last_modified: fields.take_timestamp("Last-Modified"),
            extra: fields.into_extra(),
        })
    } else {
        Err(NormalizeError::MalformedRecord {
            kind: KIND,
            reason: "record is neither a container, a blob nor a directory".to_string(),
        })
    }
}
