//! Google Drive v3 REST client.
//!
//! Production-grade client with:
//! - Token caching with refresh margin and one retry on 401
//! - HTTP client tuning (pooling, timeouts)
//! - Exponential backoff with jitter for idempotent reads
//! - Observability (tracing spans, metrics)
//! - Shared-drive scoping on every call

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use gcp_auth::CustomServiceAccount;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use tracing::{debug, info_span, Instrument};

use crate::api::DriveApi;
use crate::error::{DriveError, DriveResult};
use crate::metrics::record_request;
use crate::retry::{with_retry, RetryConfig};
use crate::token_cache::{AccessTokenSource, StaticToken, TokenCache};
use crate::types::{
    child_folders_query, images_in_query, CreatedFile, Download, DriveFile, FilePage,
    NewFileMetadata, FOLDER_MIME_TYPE,
};

pub const DEFAULT_API_BASE_URL: &str = "https://www.googleapis.com/drive/v3";
pub const DEFAULT_UPLOAD_BASE_URL: &str = "https://www.googleapis.com/upload/drive/v3";

/// Largest page size Drive accepts for `files.list`.
pub const MAX_PAGE_SIZE: u32 = 1000;

const FOLDER_LIST_FIELDS: &str = "nextPageToken,files(id,name)";
const IMAGE_LIST_FIELDS: &str =
    "nextPageToken,files(id,name,description,thumbnailLink,parents,mimeType)";
const DEFAULT_DOWNLOAD_CONTENT_TYPE: &str = "image/jpeg";

// =============================================================================
// Configuration
// =============================================================================

/// Drive client configuration.
#[derive(Debug, Clone)]
pub struct DriveConfig {
    /// Shared drive to scope listings to
    pub shared_drive_id: Option<String>,
    pub api_base_url: String,
    pub upload_base_url: String,
    /// Request timeout
    pub timeout: Duration,
    /// Connect timeout
    pub connect_timeout: Duration,
    /// Page size for listings
    pub page_size: u32,
    /// Retry configuration for reads
    pub retry: RetryConfig,
}

impl Default for DriveConfig {
    fn default() -> Self {
        Self {
            shared_drive_id: None,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            upload_base_url: DEFAULT_UPLOAD_BASE_URL.to_string(),
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(5),
            page_size: MAX_PAGE_SIZE,
            retry: RetryConfig::default(),
        }
    }
}

impl DriveConfig {
    /// Create config from environment variables.
    pub fn from_env() -> DriveResult<Self> {
        let defaults = Self::default();

        let page_size: u32 = env_parse("DRIVE_PAGE_SIZE").unwrap_or(defaults.page_size);
        if page_size == 0 || page_size > MAX_PAGE_SIZE {
            return Err(DriveError::config_error(format!(
                "DRIVE_PAGE_SIZE must be between 1 and {}, got {}",
                MAX_PAGE_SIZE, page_size
            )));
        }

        Ok(Self {
            shared_drive_id: env_non_empty("SHARED_DRIVE_ID"),
            api_base_url: env_non_empty("DRIVE_API_BASE_URL")
                .unwrap_or(defaults.api_base_url),
            upload_base_url: env_non_empty("DRIVE_UPLOAD_BASE_URL")
                .unwrap_or(defaults.upload_base_url),
            timeout: Duration::from_secs(env_parse("DRIVE_TIMEOUT_SECS").unwrap_or(30)),
            connect_timeout: Duration::from_secs(
                env_parse("DRIVE_CONNECT_TIMEOUT_SECS").unwrap_or(5),
            ),
            page_size,
            retry: RetryConfig::from_env(),
        })
    }
}

fn env_non_empty(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.trim().parse().ok())
}

// =============================================================================
// Client
// =============================================================================

/// Google Drive v3 REST client.
#[derive(Clone)]
pub struct DriveClient {
    http: Client,
    config: DriveConfig,
    tokens: Arc<dyn AccessTokenSource>,
}

impl DriveClient {
    /// Create a client with an explicit token source.
    pub fn new(config: DriveConfig, tokens: Arc<dyn AccessTokenSource>) -> DriveResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(10)
            .user_agent(concat!("huriwake-drive/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(DriveError::Network)?;

        Ok(Self {
            http,
            config,
            tokens,
        })
    }

    /// Create from environment variables.
    pub fn from_env() -> DriveResult<Self> {
        let config = DriveConfig::from_env()?;
        let tokens = Self::token_source_from_env()?;
        Self::new(config, tokens)
    }

    /// `DRIVE_ACCESS_TOKEN` wins over the service account, for local runs.
    fn token_source_from_env() -> DriveResult<Arc<dyn AccessTokenSource>> {
        if let Some(token) = env_non_empty("DRIVE_ACCESS_TOKEN") {
            debug!("Using static Drive access token from DRIVE_ACCESS_TOKEN");
            return Ok(Arc::new(StaticToken::new(token)));
        }

        let service_account = CustomServiceAccount::from_env().map_err(|e| {
            DriveError::config_error(format!("Failed to load service account: {}", e))
        })?;

        match service_account {
            Some(sa) => Ok(Arc::new(TokenCache::new(Arc::new(sa)))),
            None => Err(DriveError::config_error(
                "GOOGLE_APPLICATION_CREDENTIALS not set. \
                 Set it to the path of your service account JSON file.",
            )),
        }
    }

    pub fn config(&self) -> &DriveConfig {
        &self.config
    }

    fn files_url(&self) -> String {
        format!("{}/files", self.config.api_base_url)
    }

    fn file_url(&self, file_id: &str) -> String {
        format!(
            "{}/files/{}",
            self.config.api_base_url,
            urlencoding::encode(file_id)
        )
    }

    /// Query parameters shared by every `files.list` call.
    fn list_params(
        &self,
        query: String,
        fields: &str,
        order_by: Option<&str>,
        page_token: Option<&str>,
    ) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("q", query),
            ("fields", fields.to_string()),
            ("pageSize", self.config.page_size.to_string()),
            ("supportsAllDrives", "true".to_string()),
            ("includeItemsFromAllDrives", "true".to_string()),
        ];

        if let Some(drive_id) = &self.config.shared_drive_id {
            params.push(("corpora", "drive".to_string()));
            params.push(("driveId", drive_id.clone()));
        }
        if let Some(order_by) = order_by {
            params.push(("orderBy", order_by.to_string()));
        }
        if let Some(token) = page_token {
            params.push(("pageToken", token.to_string()));
        }

        params
    }

    /// Send an authenticated request, refreshing the token once on 401.
    async fn send_authed<F>(&self, build: F) -> DriveResult<Response>
    where
        F: Fn(&str) -> RequestBuilder,
    {
        let token = self.tokens.access_token().await?;
        let response = build(&token).send().await?;

        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        debug!("Drive returned 401, refreshing access token");
        self.tokens.invalidate().await;
        let token = self.tokens.access_token().await?;
        Ok(build(&token).send().await?)
    }

    async fn check_status(url: &str, response: Response) -> DriveResult<Response> {
        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            Err(Self::handle_error_response(status, url, response).await)
        }
    }

    async fn list_page(
        &self,
        operation: &str,
        target: &str,
        params: Vec<(&'static str, String)>,
    ) -> DriveResult<FilePage> {
        let url = self.files_url();

        self.execute_request(
            operation,
            Some(target),
            with_retry(&self.config.retry, operation, || async {
                let response = self
                    .send_authed(|token| self.http.get(&url).bearer_auth(token).query(&params))
                    .await?;
                let response = Self::check_status(&url, response).await?;
                Ok(response.json::<FilePage>().await?)
            }),
        )
        .await
    }

    /// Execute a request with tracing span and metrics.
    async fn execute_request<T, F>(
        &self,
        operation: &str,
        target: Option<&str>,
        fut: F,
    ) -> DriveResult<T>
    where
        F: std::future::Future<Output = DriveResult<T>>,
    {
        let span = if let Some(id) = target {
            info_span!("drive_request", operation = %operation, target = %id)
        } else {
            info_span!("drive_request", operation = %operation)
        };

        let start = Instant::now();
        let result = fut.instrument(span).await;
        let latency_ms = start.elapsed().as_millis() as f64;

        let status = match &result {
            Ok(_) => 200,
            Err(e) => e.http_status().unwrap_or(500),
        };
        record_request(operation, status, latency_ms);

        result
    }

    async fn handle_error_response(status: StatusCode, url: &str, response: Response) -> DriveError {
        let body = response.text().await.unwrap_or_default();
        DriveError::from_http_status(status.as_u16(), format!("{} failed: {}", url, body))
    }
}

/// Build a `multipart/related` body: JSON metadata part, then the media part.
fn multipart_related_body(
    boundary: &str,
    metadata: &NewFileMetadata<'_>,
    mime_type: &str,
    bytes: &[u8],
) -> DriveResult<Vec<u8>> {
    let metadata_json = serde_json::to_vec(metadata)?;

    let mut body = Vec::with_capacity(bytes.len() + metadata_json.len() + 256);
    body.extend_from_slice(
        format!("--{boundary}\r\nContent-Type: application/json; charset=UTF-8\r\n\r\n").as_bytes(),
    );
    body.extend_from_slice(&metadata_json);
    body.extend_from_slice(format!("\r\n--{boundary}\r\nContent-Type: {mime_type}\r\n\r\n").as_bytes());
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

    Ok(body)
}

#[async_trait]
impl DriveApi for DriveClient {
    async fn list_child_folders(
        &self,
        parent_id: &str,
        page_token: Option<&str>,
    ) -> DriveResult<FilePage> {
        let params = self.list_params(
            child_folders_query(parent_id),
            FOLDER_LIST_FIELDS,
            None,
            page_token,
        );
        self.list_page("list_folders", parent_id, params).await
    }

    async fn create_folder(&self, parent_id: &str, name: &str) -> DriveResult<String> {
        let url = self.files_url();
        let metadata = NewFileMetadata {
            name,
            mime_type: Some(FOLDER_MIME_TYPE),
            parents: [parent_id],
        };

        self.execute_request("create_folder", Some(parent_id), async {
            let response = self
                .send_authed(|token| {
                    self.http
                        .post(&url)
                        .bearer_auth(token)
                        .query(&[("fields", "id"), ("supportsAllDrives", "true")])
                        .json(&metadata)
                })
                .await?;
            let response = Self::check_status(&url, response).await?;
            let created: CreatedFile = response.json().await?;
            debug!(folder_id = %created.id, name = %name, "Created Drive folder");
            Ok(created.id)
        })
        .await
    }

    async fn upload_file(
        &self,
        parent_id: &str,
        name: &str,
        mime_type: &str,
        bytes: Vec<u8>,
    ) -> DriveResult<String> {
        let url = format!("{}/files", self.config.upload_base_url);
        let boundary = format!("huriwake-{}", uuid::Uuid::new_v4().simple());
        let metadata = NewFileMetadata {
            name,
            mime_type: Some(mime_type),
            parents: [parent_id],
        };
        let body = multipart_related_body(&boundary, &metadata, mime_type, &bytes)?;
        let content_type = format!("multipart/related; boundary={boundary}");

        self.execute_request("upload_file", Some(parent_id), async {
            let response = self
                .send_authed(|token| {
                    self.http
                        .post(&url)
                        .bearer_auth(token)
                        .query(&[
                            ("uploadType", "multipart"),
                            ("fields", "id"),
                            ("supportsAllDrives", "true"),
                        ])
                        .header(CONTENT_TYPE, content_type.as_str())
                        .body(body.clone())
                })
                .await?;
            let response = Self::check_status(&url, response).await?;
            let created: CreatedFile = response.json().await?;
            Ok(created.id)
        })
        .await
    }

    async fn get_parents(&self, file_id: &str) -> DriveResult<Vec<String>> {
        let url = self.file_url(file_id);

        self.execute_request(
            "get_parents",
            Some(file_id),
            with_retry(&self.config.retry, "get_parents", || async {
                let response = self
                    .send_authed(|token| {
                        self.http
                            .get(&url)
                            .bearer_auth(token)
                            .query(&[("fields", "id,parents"), ("supportsAllDrives", "true")])
                    })
                    .await?;
                let response = Self::check_status(&url, response).await?;
                let file: DriveFile = response.json().await?;
                Ok(file.parents)
            }),
        )
        .await
    }

    async fn reparent(
        &self,
        file_id: &str,
        add_parent: &str,
        remove_parents: &[String],
    ) -> DriveResult<DriveFile> {
        let url = self.file_url(file_id);
        let remove = remove_parents.join(",");

        self.execute_request("reparent", Some(file_id), async {
            let response = self
                .send_authed(|token| {
                    self.http
                        .patch(&url)
                        .bearer_auth(token)
                        .query(&[
                            ("addParents", add_parent),
                            ("removeParents", remove.as_str()),
                            ("fields", "id,parents"),
                            ("supportsAllDrives", "true"),
                        ])
                        .json(&serde_json::json!({}))
                })
                .await?;
            let response = Self::check_status(&url, response).await?;
            Ok(response.json::<DriveFile>().await?)
        })
        .await
    }

    async fn list_images(
        &self,
        parent_ids: &[String],
        page_token: Option<&str>,
    ) -> DriveResult<FilePage> {
        if parent_ids.is_empty() {
            return Ok(FilePage::default());
        }

        let params = self.list_params(
            images_in_query(parent_ids),
            IMAGE_LIST_FIELDS,
            Some("createdTime"),
            page_token,
        );
        self.list_page("list_images", &parent_ids.join(","), params).await
    }

    async fn download(&self, file_id: &str) -> DriveResult<Download> {
        let url = self.file_url(file_id);

        self.execute_request(
            "download",
            Some(file_id),
            with_retry(&self.config.retry, "download", || async {
                let response = self
                    .send_authed(|token| {
                        self.http
                            .get(&url)
                            .bearer_auth(token)
                            .query(&[("alt", "media"), ("supportsAllDrives", "true")])
                    })
                    .await?;
                let response = Self::check_status(&url, response).await?;

                let content_type = response
                    .headers()
                    .get(CONTENT_TYPE)
                    .and_then(|v| v.to_str().ok())
                    .filter(|v| !v.is_empty())
                    .unwrap_or(DEFAULT_DOWNLOAD_CONTENT_TYPE)
                    .to_string();
                let bytes = response.bytes().await?.to_vec();

                Ok(Download {
                    bytes,
                    content_type,
                })
            }),
        )
        .await
    }

    async fn check_connectivity(&self, root_folder_id: Option<&str>) -> DriveResult<()> {
        let (url, params) = match root_folder_id {
            Some(root) => (
                self.file_url(root),
                vec![("fields", "id"), ("supportsAllDrives", "true")],
            ),
            None => (
                format!("{}/about", self.config.api_base_url),
                vec![("fields", "user")],
            ),
        };

        self.execute_request("check_connectivity", None, async {
            let response = self
                .send_authed(|token| self.http.get(&url).bearer_auth(token).query(&params))
                .await?;
            Self::check_status(&url, response).await?;
            Ok(())
        })
        .await
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_env() {
        for key in [
            "SHARED_DRIVE_ID",
            "DRIVE_PAGE_SIZE",
            "DRIVE_TIMEOUT_SECS",
            "DRIVE_CONNECT_TIMEOUT_SECS",
            "DRIVE_API_BASE_URL",
        ] {
            std::env::remove_var(key);
        }
    }

    #[test]
    #[serial]
    fn test_config_default_values() {
        clear_env();
        let config = DriveConfig::from_env().unwrap();
        assert_eq!(config.page_size, 1000);
        assert_eq!(config.connect_timeout, Duration::from_secs(5));
        assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
        assert!(config.shared_drive_id.is_none());
    }

    #[test]
    #[serial]
    fn test_config_reads_shared_drive() {
        clear_env();
        std::env::set_var("SHARED_DRIVE_ID", "  ");
        assert!(DriveConfig::from_env().unwrap().shared_drive_id.is_none());
        std::env::set_var("SHARED_DRIVE_ID", "drive-1");
        let config = DriveConfig::from_env().unwrap();
        assert_eq!(config.shared_drive_id.as_deref(), Some("drive-1"));
        clear_env();
    }

    #[test]
    #[serial]
    fn test_config_rejects_page_size_out_of_range() {
        clear_env();
        std::env::set_var("DRIVE_PAGE_SIZE", "5000");
        assert!(matches!(
            DriveConfig::from_env(),
            Err(DriveError::ConfigError(_))
        ));
        std::env::set_var("DRIVE_PAGE_SIZE", "0");
        assert!(DriveConfig::from_env().is_err());
        clear_env();
    }

    #[test]
    fn test_multipart_body_layout() {
        let metadata = NewFileMetadata {
            name: "shot.jpg",
            mime_type: Some("image/jpeg"),
            parents: ["p1"],
        };
        let body = multipart_related_body("b1", &metadata, "image/jpeg", b"JPEG").unwrap();
        let text = String::from_utf8(body).unwrap();

        assert!(text.starts_with("--b1\r\nContent-Type: application/json"));
        assert!(text.contains("\"parents\":[\"p1\"]"));
        assert!(text.contains("Content-Type: image/jpeg\r\n\r\nJPEG\r\n"));
        assert!(text.ends_with("--b1--\r\n"));
    }
}
