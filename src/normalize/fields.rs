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

use super::error::{NormalizeError, NormalizeResult};
use crate::provider::{ProviderKind, RawRecord};
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// A raw record being taken apart field by field.
///
/// Every `take_*` call that succeeds consumes the field; whatever is left at
/// the end becomes `extra`.
pub struct RecordFields {
    kind: ProviderKind,
    fields: Map<String, Value>,
}

impl RecordFields {
    pub fn new(kind: ProviderKind, record: &RawRecord) -> NormalizeResult<Self> {
        match record {
            Value::Object(map) => Ok(Self {
                kind,
                fields: map.clone(),
            }),
            other => Err(NormalizeError::MalformedRecord {
                kind,
                reason: format!("expected a JSON object, got {}", json_type(other)),
            }),
        }
    }

    pub fn has(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    pub fn peek_str(&self, key: &str) -> Option<&str> {
        self.fields
            .get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }

    /// Nested lookup without consuming anything, e.g. `["parentReference", "driveId"]`.
    pub fn peek_path(&self, path: &[&str]) -> Option<&str> {
        let (first, rest) = path.split_first()?;
        let mut value = self.fields.get(*first)?;
        for key in rest {
            value = value.get(key)?;
        }
        value.as_str().filter(|s| !s.is_empty())
    }

    pub fn peek_bool(&self, key: &str) -> bool {
        self.fields
            .get(key)
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    /// Consume a non-empty string field.
    pub fn take_str(&mut self, key: &str) -> Option<String> {
        self.peek_str(key)?;
        match self.fields.remove(key) {
            Some(Value::String(s)) => Some(s),
            _ => None,
        }
    }

    /// Consume a string field needed to identify the record.
    pub fn require_str(&mut self, key: &str) -> NormalizeResult<String> {
        self.take_str(key).ok_or_else(|| NormalizeError::MissingField {
            kind: self.kind,
            field: key.to_string(),
        })
    }

    /// Consume a size field given as a number or a numeric string.
    ///
    /// Values that are not a non-negative integer stay in the record.
    pub fn take_u64(&mut self, key: &str) -> Option<u64> {
        let size = match self.fields.get(key)? {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.trim().parse::<u64>().ok(),
            _ => None,
        }?;
        self.fields.remove(key);
        Some(size)
    }

    /// Consume a timestamp field if it parses; otherwise leave it in place.
    pub fn take_timestamp(&mut self, key: &str) -> Option<DateTime<Utc>> {
        let parsed = parse_timestamp(self.fields.get(key)?)?;
        self.fields.remove(key);
        Some(parsed)
    }

    /// Drop a field whose information is already carried elsewhere.
    pub fn discard(&mut self, key: &str) {
        self.fields.remove(key);
    }

    pub fn into_extra(self) -> BTreeMap<String, Value> {
        self.fields.into_iter().collect()
    }
}

/// Parse RFC 3339, RFC 2822 or epoch-millisecond timestamps.
pub fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::Number(n) => n.as_i64().and_then(from_epoch_millis),
        Value::String(s) => {
            let s = s.trim();
            if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
                return Some(dt.with_timezone(&Utc));
            }
            if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
                return Some(dt.with_timezone(&Utc));
            }
            s.parse::<i64>().ok().and_then(from_epoch_millis)
        }
        _ => None,
    }
}

/// Zero and negative values mean "unknown" in the providers' listings.
fn from_epoch_millis(ms: i64) -> Option<DateTime<Utc>> {
    if ms <= 0 {
        return None;
    }
    DateTime::from_timestamp_millis(ms)
}

/// Case- and whitespace-insensitive lookup of an `owner` entry in a tag map.
pub fn owner_from_tags(tags: &Value) -> Option<String> {
    tags.as_object()?
        .iter()
        .find(|(key, _)| key.trim().eq_ignore_ascii_case("owner"))
        .and_then(|(_, value)| value.as_str())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
}

/// Find the owner of a resource.
///
/// Checked in order: the `tags` map the adapters attach from configuration,
/// then Graph's `createdBy.user.displayName`.
pub fn find_owner(extra: &BTreeMap<String, Value>) -> Option<String> {
    if let Some(owner) = extra.get("tags").and_then(owner_from_tags) {
        return Some(owner);
    }
    extra
        .get("createdBy")
        .and_then(|c| c.get("user"))
        .and_then(|u| u.get("displayName"))
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

/// Last non-empty component of a `/`-separated path.
pub fn last_segment(path: &str) -> &str {
    path.trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|s| !s.is_empty())
        .unwrap_or(path)
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_parse_timestamp_formats() {
        let expected = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(parse_timestamp(&json!("2024-01-01T00:00:00Z")), Some(expected));
        assert_eq!(
            parse_timestamp(&json!("2024-01-01T01:00:00+01:00")),
            Some(expected)
        );
        assert_eq!(
            parse_timestamp(&json!("Mon, 1 Jan 2024 00:00:00 +0000")),
            Some(expected)
        );
        assert_eq!(parse_timestamp(&json!(1704067200000_i64)), Some(expected));
        assert_eq!(parse_timestamp(&json!("1704067200000")), Some(expected));
    }

    #[test]
    fn test_parse_timestamp_rejects_garbage() {
        assert_eq!(parse_timestamp(&json!("yesterday")), None);
        assert_eq!(parse_timestamp(&json!(0)), None);
        assert_eq!(parse_timestamp(&json!(null)), None);
        assert_eq!(parse_timestamp(&json!(true)), None);
    }

    #[test]
    fn test_take_consumes_only_valid_fields() {
        let record = json!({
            "Size": "42",
            "Weird": -3,
            "LastModified": "not a date",
            "Key": "",
        });
        let mut fields = RecordFields::new(ProviderKind::ObjectStorage, &record).unwrap();
        assert_eq!(fields.take_u64("Size"), Some(42));
        assert_eq!(fields.take_u64("Weird"), None);
        assert_eq!(fields.take_timestamp("LastModified"), None);
        assert_eq!(fields.take_str("Key"), None);

        let extra = fields.into_extra();
        assert!(!extra.contains_key("Size"));
        assert_eq!(extra["Weird"], json!(-3));
        assert_eq!(extra["LastModified"], json!("not a date"));
        assert_eq!(extra["Key"], json!(""));
    }

    #[test]
    fn test_require_str_missing() {
        let mut fields = RecordFields::new(ProviderKind::BlobStorage, &json!({})).unwrap();
        let err = fields.require_str("Name").unwrap_err();
        assert_eq!(
            err,
            NormalizeError::MissingField {
                kind: ProviderKind::BlobStorage,
                field: "Name".to_string()
            }
        );
    }

    #[test]
    fn test_non_object_record_is_malformed() {
        let err = RecordFields::new(ProviderKind::DocumentSite, &json!(["a"]))
            .err()
            .unwrap();
        assert!(err.to_string().contains("an array"));
    }

    #[test]
    fn test_peek_path() {
        let record = json!({"parentReference": {"driveId": "b!1"}});
        let fields = RecordFields::new(ProviderKind::DocumentSite, &record).unwrap();
        assert_eq!(fields.peek_path(&["parentReference", "driveId"]), Some("b!1"));
        assert_eq!(fields.peek_path(&["parentReference", "id"]), None);
    }

    #[test]
    fn test_owner_from_tags_is_case_and_space_insensitive() {
        assert_eq!(
            owner_from_tags(&json!({" Owner ": "Data Team", "env": "prod"})),
            Some("Data Team".to_string())
        );
        assert_eq!(
            owner_from_tags(&json!({"OWNER": "ops"})),
            Some("ops".to_string())
        );
        assert_eq!(owner_from_tags(&json!({"owner": "  "})), None);
        assert_eq!(owner_from_tags(&json!({"env": "prod"})), None);
        assert_eq!(owner_from_tags(&json!("owner")), None);
    }

    #[test]
    fn test_find_owner_precedence() {
        let extra: BTreeMap<String, Value> = [
            ("tags".to_string(), json!({"owner": "from-tags"})),
            (
                "createdBy".to_string(),
                json!({"user": {"displayName": "Megan Bowen"}}),
            ),
        ]
        .into_iter()
        .collect();
        assert_eq!(find_owner(&extra), Some("from-tags".to_string()));

        let extra: BTreeMap<String, Value> = [(
            "createdBy".to_string(),
            json!({"user": {"displayName": "Megan Bowen"}}),
        )]
        .into_iter()
        .collect();
        assert_eq!(find_owner(&extra), Some("Megan Bowen".to_string()));

        let extra: BTreeMap<String, Value> = [
            ("tags".to_string(), json!({"env": "prod"})),
            ("metadata".to_string(), json!({"owner": "ignored"})),
        ]
        .into_iter()
        .collect();
        assert_eq!(find_owner(&extra), None);

        assert_eq!(find_owner(&BTreeMap::new()), None);
    }

    #[test]
    fn test_last_segment() {
        assert_eq!(last_segment("logs/2024/app.log"), "app.log");
        assert_eq!(last_segment("logs/2024/"), "2024");
        assert_eq!(last_segment("top.txt"), "top.txt");
        assert_eq!(last_segment("/"), "/");
    }
}
