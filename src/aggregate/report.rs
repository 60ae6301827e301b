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

use crate::error::{InventoryError, InventoryResult};
use crate::normalize::ResourceMetadata;
use crate::provider::{ErrorKind, ProviderError, ProviderKind};
use chrono::{DateTime, Utc};
use serde::de::{self, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::collections::HashSet;
use std::fmt::{self, Display, Formatter, Result as FmtResult};
use std::io::Write;

const GENERATED_AT: &str = "generated_at";

/// What happened to one provider during a run.
///
/// Encodes as `{"status":"ok","resources":[...]}` or
/// `{"status":"error","error_kind":"AuthError","message":"..."}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status")]
pub enum ProviderOutcome {
    #[serde(rename = "ok")]
    Success { resources: Vec<ResourceMetadata> },

    #[serde(rename = "error")]
    Failure {
        error_kind: ErrorKind,
        message: String,
    },
}

impl ProviderOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ProviderOutcome::Success { .. })
    }

    /// Resources of a successful outcome; empty for a failure.
    pub fn resources(&self) -> &[ResourceMetadata] {
        match self {
            ProviderOutcome::Success { resources } => resources,
            ProviderOutcome::Failure { .. } => &[],
        }
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        match self {
            ProviderOutcome::Success { .. } => None,
            ProviderOutcome::Failure { error_kind, .. } => Some(*error_kind),
        }
    }
}

impl From<ProviderError> for ProviderOutcome {
    fn from(e: ProviderError) -> Self {
        ProviderOutcome::Failure {
            error_kind: e.kind(),
            message: e.message().to_string(),
        }
    }
}

impl From<Result<Vec<ResourceMetadata>, ProviderError>> for ProviderOutcome {
    fn from(result: Result<Vec<ResourceMetadata>, ProviderError>) -> Self {
        match result {
            Ok(resources) => ProviderOutcome::Success { resources },
            Err(e) => e.into(),
        }
    }
}

/// The unified inventory of one run.
///
/// Holds exactly one outcome per queried provider, in configuration order.
/// Serializes to a JSON object whose first key is `generated_at`, followed by
/// one key per provider kind.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub generated_at: DateTime<Utc>,
    outcomes: Vec<(ProviderKind, ProviderOutcome)>,
}

impl Report {
    /// Create a report.
    ///
    /// # Errors
    ///
    /// Returns `InventoryError::DuplicateProvider` if a kind appears twice.
    pub fn new(
        generated_at: DateTime<Utc>,
        outcomes: Vec<(ProviderKind, ProviderOutcome)>,
    ) -> InventoryResult<Self> {
        let mut seen = HashSet::new();
        for (kind, _) in &outcomes {
            if !seen.insert(*kind) {
                return Err(InventoryError::DuplicateProvider(*kind));
            }
        }
        Ok(Self {
            generated_at,
            outcomes,
        })
    }

    pub fn outcomes(&self) -> &[(ProviderKind, ProviderOutcome)] {
        &self.outcomes
    }

    pub fn outcome(&self, kind: ProviderKind) -> Option<&ProviderOutcome> {
        self.outcomes
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, outcome)| outcome)
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// Total resources across successful providers.
    pub fn resource_count(&self) -> usize {
        self.outcomes
            .iter()
            .map(|(_, outcome)| outcome.resources().len())
            .sum()
    }

    pub fn failure_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|(_, outcome)| !outcome.is_success())
            .count()
    }

    /// The report as a JSON value.
    pub fn to_value(&self) -> InventoryResult<Value> {
        Ok(serde_json::to_value(self)?)
    }

    pub fn to_json(&self, pretty: bool) -> InventoryResult<String> {
        let json = if pretty {
            serde_json::to_string_pretty(self)?
        } else {
            serde_json::to_string(self)?
        };
        Ok(json)
    }

    /// Write the JSON document, followed by a newline, to `writer`.
    pub fn write_json<W: Write>(&self, mut writer: W, pretty: bool) -> InventoryResult<()> {
        if pretty {
            serde_json::to_writer_pretty(&mut writer, self)?;
        } else {
            serde_json::to_writer(&mut writer, self)?;
        }
        writeln!(writer)?;
        writer.flush()?;
        Ok(())
    }

    pub fn from_json_str(json: &str) -> InventoryResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

impl Serialize for Report {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.outcomes.len() + 1))?;
        map.serialize_entry(GENERATED_AT, &self.generated_at)?;
        for (kind, outcome) in &self.outcomes {
            map.serialize_entry(kind.as_str(), outcome)?;
        }
        map.end()
    }
}

struct ReportVisitor;

impl<'de> Visitor<'de> for ReportVisitor {
    type Value = Report;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("an inventory report object")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Report, A::Error> {
        let mut generated_at = None;
        let mut outcomes: Vec<(ProviderKind, ProviderOutcome)> = Vec::new();

        while let Some(key) = access.next_key::<String>()? {
            if key == GENERATED_AT {
                if generated_at.is_some() {
                    return Err(de::Error::duplicate_field(GENERATED_AT));
                }
                generated_at = Some(access.next_value::<DateTime<Utc>>()?);
                continue;
            }
            let kind: ProviderKind = key
                .parse()
                .map_err(|_| de::Error::custom(format!("unknown provider kind '{}'", key)))?;
            if outcomes.iter().any(|(k, _)| *k == kind) {
                return Err(de::Error::custom(format!("duplicate provider kind '{}'", kind)));
            }
            outcomes.push((kind, access.next_value()?));
        }

        let generated_at = generated_at.ok_or_else(|| de::Error::missing_field(GENERATED_AT))?;
        Ok(Report {
            generated_at,
            outcomes,
        })
    }
}

impl<'de> Deserialize<'de> for Report {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(ReportVisitor)
    }
}

fn format_bytes(bytes: u64) -> String {
    let gb = bytes as f64 / (1024.0 * 1024.0 * 1024.0);
    if gb >= 1.0 {
        format!("{:.2} GB", gb)
    } else {
        format!("{:.2} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}

impl Display for Report {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        writeln!(f, "\n{}", "━".repeat(80))?;
        writeln!(
            f,
            " {:<56} {:>9} providers ",
            "Cloud Inventory Report",
            self.len()
        )?;
        writeln!(f, "{}", "━".repeat(80))?;
        writeln!(f, " {}", self.generated_at.to_rfc3339())?;
        writeln!(
            f,
            " {} resources, {} failed providers",
            self.resource_count(),
            self.failure_count()
        )?;
        writeln!(f, "{}", "━".repeat(80))?;

        if self.is_empty() {
            writeln!(f, "  No providers configured")?;
            return Ok(());
        }

        writeln!(f, " {:<22} {:<7} {}", "Provider", "Status", "Details")?;
        writeln!(f, "{}", "━".repeat(80))?;
        for (kind, outcome) in &self.outcomes {
            match outcome {
                ProviderOutcome::Success { resources } => {
                    let total_size: u64 = resources.iter().filter_map(|r| r.size_bytes).sum();
                    let top_level = resources
                        .iter()
                        .filter(|r| r.resource_type.is_top_level())
                        .count();
                    writeln!(
                        f,
                        " {:<22} {:<7} {} resources ({} top-level), {}",
                        kind.as_str(),
                        "ok",
                        resources.len(),
                        top_level,
                        format_bytes(total_size)
                    )?;
                }
                ProviderOutcome::Failure {
                    error_kind,
                    message,
                } => {
                    writeln!(
                        f,
                        " {:<22} {:<7} {}: {}",
                        kind.as_str(),
                        "error",
                        error_kind,
                        message
                    )?;
                }
            }
        }
        Ok(())
    }
}
