//! Google Drive REST client.
//!
//! This crate provides:
//! - The [`DriveApi`] trait the workflows depend on, and its REST client
//! - A process-wide [`FolderCache`] keyed by parent folder id
//! - A [`FolderResolver`] that creates missing folders under a per-parent lock
//! - Service account authentication via gcp_auth
//! - Retry logic for idempotent reads

pub mod api;
pub mod client;
pub mod error;
pub mod folder_cache;
pub mod metrics;
pub mod resolver;
pub mod retry;
pub mod token_cache;
pub mod types;

#[cfg(any(test, feature = "test-utils"))]
pub mod testutils;

#[cfg(test)]
mod client_tests;

pub use api::DriveApi;
pub use client::{DriveClient, DriveConfig};
pub use error::{DriveError, DriveResult};
pub use folder_cache::{ChildFolders, FolderCache};
pub use resolver::FolderResolver;
pub use retry::RetryConfig;
pub use token_cache::{AccessTokenSource, StaticToken, TokenCache};
pub use types::{Download, DriveFile, FilePage};
