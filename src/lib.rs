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

//! # Cloud Inventory
//!
//! A Rust library for building a read-only metadata inventory across several
//! cloud providers at once.
//!
//! Each configured provider is queried concurrently through an adapter, its
//! native records are normalized onto one schema, and the results are merged
//! into a single [`Report`]. A failing provider never hides the results of
//! the others: it shows up in the report as a classified error.
//!
//! ## Providers
//!
//! - **object-storage**: AWS S3 buckets and S3-compatible stores
//! - **blob-storage**: Azure Blob Storage containers
//! - **document-site**: SharePoint document libraries through Microsoft Graph
//! - **analytics-workspace**: Databricks workspaces (Unity Catalog volumes or DBFS)
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use cloud_inventory::{Aggregator, ProviderConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//! let s3 = ProviderConfig::object_storage()
//!     .with_option("bucket", "my-bucket")
//!     .with_option("region", "us-east-1")
//!     .with_option("access_key_id", "ACCESS_KEY")
//!     .with_option("secret_access_key", "SECRET_KEY");
//!
//! let databricks = ProviderConfig::analytics_workspace()
//!     .with_option("host", "https://adb-1234567890.1.azuredatabricks.net")
//!     .with_option("token", "dapi...");
//!
//! let report = Aggregator::builder().build().run(&[s3, databricks]).await?;
//!
//! // Human readable summary
//! println!("{}", report);
//!
//! // Machine readable inventory
//! println!("{}", report.to_json(true)?);
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`provider`] - Provider configuration, errors and adapters
//! - [`normalize`] - Mapping of native records onto the common schema
//! - [`aggregate`] - Concurrent querying and the unified report
//! - [`util`] - Retry helper

pub mod aggregate;
pub mod error;
pub mod normalize;
pub mod provider;
pub mod util;

// Re-export commonly used types
pub use aggregate::{Aggregator, ProviderOutcome, Report};
pub use error::{InventoryError, InventoryResult};
pub use normalize::{ResourceMetadata, ResourceType};
pub use provider::{ConfigBundle, ErrorKind, ProviderConfig, ProviderError, ProviderKind};
