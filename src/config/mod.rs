// ABOUTME: Process configuration module for the sync engine
// ABOUTME: Re-exports the environment-driven configuration types
//
// SPDX-License-Identifier: MIT OR Apache-2.0

/// Environment-variable-driven configuration
pub mod environment;

pub use environment::{StravaCredentials, SyncConfig};
