//! Auth0 access token authentication.
//!
//! Bearer tokens are RS256 JWTs issued by the configured Auth0 tenant. Signing
//! keys come from the tenant's JWKS document, fetched on first use and
//! refreshed hourly or when a token names an unknown key.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, warn};
use url::Url;

use crate::config::env_non_empty;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// JWKS cache TTL.
const JWKS_CACHE_TTL: Duration = Duration::from_secs(3600); // 1 hour

/// Minimum gap between refreshes triggered by unknown key ids.
const MIN_REFRESH_INTERVAL: Duration = Duration::from_secs(60);

/// Auth0 tenant settings.
#[derive(Debug, Clone, Default)]
pub struct AuthConfig {
    /// Tenant domain, e.g. `example.jp.auth0.com`
    pub domain: Option<String>,
    /// API audience the tokens must be issued for
    pub audience: Option<String>,
}

impl AuthConfig {
    pub fn from_env() -> Self {
        Self {
            domain: env_non_empty("AUTH0_DOMAIN"),
            audience: env_non_empty("AUTH0_AUDIENCE"),
        }
    }

    /// Issuer URL (`https://<domain>/`) for the configured tenant.
    pub fn issuer(&self) -> ApiResult<String> {
        let domain = self
            .domain
            .as_deref()
            .ok_or_else(|| ApiError::config("AUTH0_DOMAIN is not set"))?;
        let host = domain
            .trim_start_matches("https://")
            .trim_start_matches("http://")
            .trim_end_matches('/');

        let issuer = Url::parse(&format!("https://{}/", host))
            .map_err(|e| ApiError::config(format!("Invalid AUTH0_DOMAIN '{}': {}", domain, e)))?;
        Ok(issuer.to_string())
    }
}

/// Decoded access token claims.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Auth0Claims {
    /// User ID
    pub sub: String,
    pub email: Option<String>,
    pub name: Option<String>,
    /// Expiration
    pub exp: i64,
}

/// Authenticated user extracted from request.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub sub: String,
    pub email: Option<String>,
    pub name: Option<String>,
}

impl From<Auth0Claims> for AuthUser {
    fn from(claims: Auth0Claims) -> Self {
        Self {
            sub: claims.sub,
            email: claims.email,
            name: claims.name,
        }
    }
}

/// JWKS document.
#[derive(Debug, Deserialize)]
struct JwksResponse {
    keys: Vec<JwkKey>,
}

#[derive(Debug, Clone, Deserialize)]
struct JwkKey {
    kid: String,
    #[serde(default)]
    kty: Option<String>,
    #[serde(default)]
    n: Option<String>,
    #[serde(default)]
    e: Option<String>,
}

/// Cached JWKS keys plus the validation settings for one tenant.
pub struct JwksCache {
    http: Client,
    jwks_url: Option<String>,
    issuer: Option<String>,
    audience: Option<String>,
    keys: RwLock<HashMap<String, DecodingKey>>,
    last_refresh: RwLock<Option<Instant>>,
}

impl JwksCache {
    /// Create a cache for the configured tenant. No keys are fetched yet.
    ///
    /// Missing settings are not an error here; token verification then fails
    /// with a configuration error.
    pub fn new(config: &AuthConfig) -> ApiResult<Self> {
        let issuer = config.issuer().ok();
        let jwks_url = issuer
            .as_ref()
            .map(|issuer| format!("{}.well-known/jwks.json", issuer));

        if issuer.is_none() || config.audience.is_none() {
            warn!("AUTH0_DOMAIN or AUTH0_AUDIENCE not set; authenticated routes will fail");
        }

        Self::build(jwks_url, issuer, config.audience.clone())
    }

    /// Cache that fetches keys from an explicit JWKS URL.
    pub fn with_jwks_url(
        issuer: impl Into<String>,
        audience: impl Into<String>,
        jwks_url: impl Into<String>,
    ) -> ApiResult<Self> {
        Self::build(
            Some(jwks_url.into()),
            Some(issuer.into()),
            Some(audience.into()),
        )
    }

    /// Cache with a fixed key set that is never refreshed.
    pub fn with_keys(
        issuer: impl Into<String>,
        audience: impl Into<String>,
        keys: HashMap<String, DecodingKey>,
    ) -> ApiResult<Self> {
        let cache = Self::build(None, Some(issuer.into()), Some(audience.into()))?;
        Ok(Self {
            keys: RwLock::new(keys),
            last_refresh: RwLock::new(Some(Instant::now())),
            ..cache
        })
    }

    fn build(
        jwks_url: Option<String>,
        issuer: Option<String>,
        audience: Option<String>,
    ) -> ApiResult<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| ApiError::internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            jwks_url,
            issuer,
            audience,
            keys: RwLock::new(HashMap::new()),
            last_refresh: RwLock::new(None),
        })
    }

    /// Refresh JWKS keys from the tenant.
    async fn refresh_keys(&self, jwks_url: &str) -> ApiResult<()> {
        debug!("Refreshing JWKS keys");

        let response = self
            .http
            .get(jwks_url)
            .send()
            .await
            .map_err(|e| ApiError::transport(format!("JWKS fetch failed: {}", e)))?;
        if !response.status().is_success() {
            return Err(ApiError::transport(format!(
                "JWKS fetch returned {}",
                response.status()
            )));
        }
        let jwks: JwksResponse = response
            .json()
            .await
            .map_err(|e| ApiError::transport(format!("Invalid JWKS document: {}", e)))?;

        let mut keys = HashMap::new();
        for jwk in jwks.keys {
            if jwk.kty.as_deref().is_some_and(|kty| kty != "RSA") {
                continue;
            }
            let (Some(n), Some(e)) = (jwk.n.as_deref(), jwk.e.as_deref()) else {
                continue;
            };
            match DecodingKey::from_rsa_components(n, e) {
                Ok(key) => {
                    keys.insert(jwk.kid, key);
                }
                Err(err) => warn!(kid = %jwk.kid, "Skipping unusable JWKS key: {}", err),
            }
        }

        let key_count = keys.len();
        *self.keys.write().await = keys;
        *self.last_refresh.write().await = Some(Instant::now());

        debug!("Refreshed {} JWKS keys", key_count);
        Ok(())
    }

    /// Get decoding key for a key ID.
    async fn get_key(&self, kid: &str) -> Option<DecodingKey> {
        if let Some(jwks_url) = &self.jwks_url {
            let known = self.keys.read().await.contains_key(kid);
            let needs_refresh = match *self.last_refresh.read().await {
                None => true,
                Some(last) if last.elapsed() > JWKS_CACHE_TTL => true,
                Some(last) => !known && last.elapsed() > MIN_REFRESH_INTERVAL,
            };

            if needs_refresh {
                if let Err(e) = self.refresh_keys(jwks_url).await {
                    warn!("Failed to refresh JWKS keys: {}", e);
                }
            }
        }

        self.keys.read().await.get(kid).cloned()
    }

    /// Verify an access token and return its claims.
    pub async fn verify_token(&self, token: &str) -> ApiResult<Auth0Claims> {
        let (Some(issuer), Some(audience)) = (&self.issuer, &self.audience) else {
            return Err(ApiError::config(
                "AUTH0_DOMAIN and AUTH0_AUDIENCE must be set",
            ));
        };

        // Decode header to get key ID
        let header = decode_header(token)
            .map_err(|e| ApiError::unauthorized(format!("Invalid token header: {}", e)))?;

        let kid = header
            .kid
            .ok_or_else(|| ApiError::unauthorized("Token missing key ID"))?;

        let key = self
            .get_key(&kid)
            .await
            .ok_or_else(|| ApiError::unauthorized("Unknown key ID"))?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_issuer(&[issuer]);
        validation.set_audience(&[audience]);

        let token_data = decode::<Auth0Claims>(token, &key, &validation)
            .map_err(|e| ApiError::unauthorized(format!("Token validation failed: {}", e)))?;

        Ok(token_data.claims)
    }
}

/// Axum extractor for authenticated user.
#[axum::async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("Authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ApiError::unauthorized("Missing Authorization header"))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| ApiError::unauthorized("Invalid Authorization header format"))?;

        let claims = state.jwks.verify_token(token).await?;

        Ok(AuthUser::from(claims))
    }
}
