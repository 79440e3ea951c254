//! Axum HTTP API server.
//!
//! This crate provides:
//! - Screenshot classification and filing into count-based Drive folders
//! - Review tool endpoints with conflict-checked moves
//! - YouTube video metadata for the capture page
//! - Auth0 bearer token verification, rate limiting and security headers
//! - Prometheus metrics

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod security;
pub mod services;
pub mod state;

pub use config::{ApiConfig, FolderSettings};
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use services::{ReviewService, ScreenshotFiler, YouTubeClient, YouTubeConfig};
pub use state::AppState;
