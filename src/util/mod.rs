//! Utility functions and helpers
//!
//! - [`retry`] - Retry logic for transient provider failures

pub mod retry;
