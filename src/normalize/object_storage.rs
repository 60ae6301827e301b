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

//! S3 buckets, objects and common prefixes.

use super::error::{NormalizeError, NormalizeResult};
use super::fields::{last_segment, RecordFields};
use super::metadata::{ResourceMetadata, ResourceType};
use crate::provider::ProviderKind;

const KIND: ProviderKind = ProviderKind::ObjectStorage;

pub(super) fn normalize(mut fields: RecordFields) -> NormalizeResult<ResourceMetadata> {
    if fields.has("Key") {
        let bucket = fields.require_str("Bucket")?;
        let key = fields.require_str("Key")?;
        Ok(ResourceMetadata {
            provider_kind: KIND,
            resource_id: format!("s3://{}/{}", bucket, key),
            resource_type: ResourceType::Object,
            name: last_segment(&key).to_string(),
            size_bytes: fields.take_u64("Size"),
            last_modified: fields.take_timestamp("LastModified"),
            extra: fields.into_extra(),
        })
    } else if fields.has("Prefix") {
        let bucket = fields.require_str("Bucket")?;
        let prefix = fields.require_str("Prefix")?;
        Ok(ResourceMetadata {
            provider_kind: KIND,
            resource_id: format!("s3://{}/{}", bucket, prefix),
            resource_type: ResourceType::Prefix,
            name: last_segment(&prefix).to_string(),
            size_bytes: None,
            last_modified: None,
            extra: fields.into_extra(),
        })
    } else if fields.has("Name") {
        let bucket = fields.require_str("Name")?;
        Ok(ResourceMetadata {
            provider_kind: KIND,
            resource_id: format!("s3://{}", bucket),
            resource_type: ResourceType::Bucket,
            name: bucket,
            size_bytes: None,
            last_modified: None,
            extra: fields.into_extra(),
        })
    } else {
        Err(NormalizeError::MalformedRecord {
            kind: KIND,
            reason: "record is neither a bucket, an object nor a prefix".to_string(),
        })
    }
}
