//! Access tokens for the Drive API.
//!
//! Provides a thread-safe, async-aware token cache with:
//! - Refresh margin to avoid token expiry during requests
//! - Single-flight refresh under a write lock
//! - Graceful fallback to the existing token on refresh failure

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::Utc;
use gcp_auth::TokenProvider;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::error::{DriveError, DriveResult};

/// Refresh margin: refresh token 60 seconds before expiry.
const TOKEN_REFRESH_MARGIN: Duration = Duration::from_secs(60);

/// Conservative token TTL when expiry is unknown (50 minutes).
const TOKEN_DEFAULT_TTL: Duration = Duration::from_secs(50 * 60);

/// OAuth scope for full Drive access (folders are created and files moved).
pub const DRIVE_SCOPE: &str = "https://www.googleapis.com/auth/drive";

/// Source of bearer tokens for Drive requests.
#[async_trait]
pub trait AccessTokenSource: Send + Sync {
    /// Get a valid access token.
    async fn access_token(&self) -> DriveResult<String>;

    /// Drop any cached token so the next call fetches a fresh one.
    async fn invalidate(&self);
}

/// Cached token with expiration tracking.
struct CachedToken {
    access_token: String,
    expires_at: Instant,
}

impl CachedToken {
    fn is_valid(&self) -> bool {
        Instant::now() + TOKEN_REFRESH_MARGIN < self.expires_at
    }

    fn is_usable(&self) -> bool {
        Instant::now() < self.expires_at
    }
}

/// Service-account token cache backed by `gcp_auth`.
pub struct TokenCache {
    auth: Arc<dyn TokenProvider>,
    cache: RwLock<Option<CachedToken>>,
}

impl TokenCache {
    pub fn new(auth: Arc<dyn TokenProvider>) -> Self {
        Self {
            auth,
            cache: RwLock::new(None),
        }
    }

    async fn refresh_token(&self, cache: &mut Option<CachedToken>) -> DriveResult<String> {
        match self.auth.token(&[DRIVE_SCOPE]).await {
            Ok(token) => {
                let access_token = token.as_str().to_string();

                let expires_at = {
                    let now = Utc::now();
                    let exp = token.expires_at();
                    if exp > now {
                        (exp - now)
                            .to_std()
                            .map(|ttl| Instant::now() + ttl)
                            .unwrap_or_else(|_| Instant::now() + TOKEN_DEFAULT_TTL)
                    } else {
                        Instant::now()
                    }
                };

                *cache = Some(CachedToken {
                    access_token: access_token.clone(),
                    expires_at,
                });

                debug!("Refreshed Drive access token");
                Ok(access_token)
            }
            Err(e) => {
                if let Some(cached) = cache.as_ref() {
                    if cached.is_usable() {
                        warn!("Token refresh failed, using existing token: {}", e);
                        return Ok(cached.access_token.clone());
                    }
                }
                Err(DriveError::auth_error(format!(
                    "Failed to obtain auth token: {}",
                    e
                )))
            }
        }
    }
}

#[async_trait]
impl AccessTokenSource for TokenCache {
    async fn access_token(&self) -> DriveResult<String> {
        {
            let cache = self.cache.read().await;
            if let Some(cached) = cache.as_ref() {
                if cached.is_valid() {
                    return Ok(cached.access_token.clone());
                }
            }
        }

        let mut cache = self.cache.write().await;

        // Another task may have refreshed while we waited.
        if let Some(cached) = cache.as_ref() {
            if cached.is_valid() {
                return Ok(cached.access_token.clone());
            }
        }

        self.refresh_token(&mut cache).await
    }

    async fn invalidate(&self) {
        *self.cache.write().await = None;
    }
}

/// Fixed token, e.g. from `DRIVE_ACCESS_TOKEN` during local development.
pub struct StaticToken(String);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

#[async_trait]
impl AccessTokenSource for StaticToken {
    async fn access_token(&self) -> DriveResult<String> {
        Ok(self.0.clone())
    }

    async fn invalidate(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_refresh_margin() {
        assert_eq!(TOKEN_REFRESH_MARGIN, Duration::from_secs(60));
        assert!(TOKEN_DEFAULT_TTL > TOKEN_REFRESH_MARGIN);
    }

    #[test]
    fn test_drive_scope() {
        assert!(DRIVE_SCOPE.ends_with("/auth/drive"));
    }

    #[tokio::test]
    async fn test_static_token() {
        let source = StaticToken::new("abc");
        source.invalidate().await;
        assert_eq!(source.access_token().await.unwrap(), "abc");
    }
}
