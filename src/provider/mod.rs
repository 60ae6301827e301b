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

//! Cloud provider access layer
//!
//! This module provides one read-only adapter per supported provider behind the
//! [`ProviderAdapter`] trait:
//!
//! - object storage (AWS S3) and blob storage (Azure) through the
//!   `object_store` crate,
//! - document sites (SharePoint, via Microsoft Graph) and analytics workspaces
//!   (Databricks) through their REST APIs.
//!
//! Adapters make a single attempt per call and classify every failure into
//! [`ErrorKind`]. Retries and timeouts are applied by the aggregator.

pub mod adapter;
pub mod azure;
pub mod config;
pub mod databricks;
pub mod error;
pub mod factory;
pub mod http;
pub mod object_store;
pub mod s3;
pub mod sharepoint;

// Public exports
pub use adapter::{ProviderAdapter, RawRecord};
pub use config::{ConfigBundle, ProviderConfig, ProviderKind};
pub use error::{ErrorKind, ProviderError, ProviderResult};
pub use factory::AdapterFactory;
