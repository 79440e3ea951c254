//! Roboflow hosted-inference HTTP client.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use base64::Engine;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use tracing::{debug, info, info_span, Instrument};

use crate::error::{DetectError, DetectResult};
use crate::types::DetectionResponse;

pub const DEFAULT_BASE_URL: &str = "https://detect.roboflow.com";

/// Counts subjects in an image.
#[async_trait]
pub trait Detector: Send + Sync {
    async fn detect(&self, image: &[u8]) -> DetectResult<u32>;
}

/// Configuration for the detection client.
///
/// Credentials are optional here so the server can start without them; a
/// detection attempt with missing settings fails before any request is sent.
#[derive(Debug, Clone)]
pub struct DetectorConfig {
    pub api_key: Option<String>,
    pub model_id: Option<String>,
    pub version: Option<String>,
    /// Base URL of the hosted inference API
    pub base_url: String,
    /// Request timeout
    pub timeout: Duration,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model_id: None,
            version: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

impl DetectorConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            api_key: env_non_empty("ROBOFLOW_API_KEY"),
            model_id: env_non_empty("ROBOFLOW_MODEL_ID"),
            version: env_non_empty("ROBOFLOW_VERSION_NUMBER"),
            base_url: env_non_empty("ROBOFLOW_BASE_URL")
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            timeout: Duration::from_secs(
                std::env::var("ROBOFLOW_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30),
            ),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some() && self.model_id.is_some() && self.version.is_some()
    }

    /// Endpoint and API key, or the names of the missing settings.
    fn endpoint(&self) -> DetectResult<(String, &str)> {
        match (&self.api_key, &self.model_id, &self.version) {
            (Some(key), Some(model), Some(version)) => Ok((
                format!(
                    "{}/{}/{}",
                    self.base_url.trim_end_matches('/'),
                    model,
                    version
                ),
                key.as_str(),
            )),
            _ => {
                let missing: Vec<&str> = [
                    ("ROBOFLOW_API_KEY", self.api_key.is_none()),
                    ("ROBOFLOW_MODEL_ID", self.model_id.is_none()),
                    ("ROBOFLOW_VERSION_NUMBER", self.version.is_none()),
                ]
                .into_iter()
                .filter_map(|(name, missing)| missing.then_some(name))
                .collect();
                Err(DetectError::Config(format!("missing {}", missing.join(", "))))
            }
        }
    }
}

fn env_non_empty(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Client for a Roboflow hosted detection model.
pub struct RoboflowClient {
    http: Client,
    config: DetectorConfig,
}

impl RoboflowClient {
    /// Create a new detection client.
    pub fn new(config: DetectorConfig) -> DetectResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(DetectError::Network)?;

        Ok(Self { http, config })
    }

    /// Create from environment variables.
    pub fn from_env() -> DetectResult<Self> {
        Self::new(DetectorConfig::from_env())
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }
}

#[async_trait]
impl Detector for RoboflowClient {
    async fn detect(&self, image: &[u8]) -> DetectResult<u32> {
        let (url, api_key) = self.config.endpoint()?;
        let encoded = base64::engine::general_purpose::STANDARD.encode(image);

        let span = info_span!("detect_request", bytes = image.len());
        async {
            let start = Instant::now();
            debug!("Sending image to detection service");

            let response = self
                .http
                .post(&url)
                .query(&[("api_key", api_key)])
                .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(encoded)
                .send()
                .await?;

            if !response.status().is_success() {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                return Err(DetectError::RequestFailed(format!(
                    "Detection service returned {}: {}",
                    status, body
                )));
            }

            let body = response.text().await?;
            let detection: DetectionResponse = serde_json::from_str(&body).map_err(|e| {
                DetectError::InvalidResponse(format!("unexpected detection payload: {}", e))
            })?;
            let count = detection.count();

            info!(
                count,
                duration_ms = start.elapsed().as_millis() as u64,
                "Detection complete"
            );
            Ok(count)
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use wiremock::matchers::{body_string, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn configured(base_url: &str) -> DetectorConfig {
        DetectorConfig {
            api_key: Some("key-1".to_string()),
            model_id: Some("people".to_string()),
            version: Some("3".to_string()),
            base_url: base_url.to_string(),
            timeout: Duration::from_secs(5),
        }
    }

    #[tokio::test]
    async fn test_detect_posts_base64_and_counts_predictions() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/people/3"))
            .and(query_param("api_key", "key-1"))
            .and(header("content-type", "application/x-www-form-urlencoded"))
            .and(body_string("aW1n"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "predictions": [{"class": "person"}, {"class": "person"}, {"class": "person"}, {"class": "person"}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = RoboflowClient::new(configured(&server.uri())).unwrap();
        assert_eq!(client.detect(b"img").await.unwrap(), 4);
    }

    #[tokio::test]
    async fn test_empty_predictions_count_zero() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"predictions": []})),
            )
            .mount(&server)
            .await;

        let client = RoboflowClient::new(configured(&server.uri())).unwrap();
        assert_eq!(client.detect(b"img").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_http_failure_is_request_failed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403).set_body_string("bad key"))
            .expect(1)
            .mount(&server)
            .await;

        let client = RoboflowClient::new(configured(&server.uri())).unwrap();
        let err = client.detect(b"img").await.unwrap_err();
        assert!(matches!(err, DetectError::RequestFailed(_)));
    }

    #[tokio::test]
    async fn test_missing_config_fails_before_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let mut config = configured(&server.uri());
        config.version = None;
        config.api_key = None;
        let client = RoboflowClient::new(config).unwrap();

        let err = client.detect(b"img").await.unwrap_err();
        assert!(err.is_config());
        assert!(err.to_string().contains("ROBOFLOW_API_KEY"));
        assert!(err.to_string().contains("ROBOFLOW_VERSION_NUMBER"));
    }

    #[test]
    #[serial]
    fn test_config_from_env() {
        std::env::set_var("ROBOFLOW_API_KEY", "k");
        std::env::set_var("ROBOFLOW_MODEL_ID", "m");
        std::env::remove_var("ROBOFLOW_VERSION_NUMBER");
        std::env::remove_var("ROBOFLOW_BASE_URL");

        let config = DetectorConfig::from_env();
        assert!(!config.is_configured());
        assert_eq!(config.base_url, DEFAULT_BASE_URL);

        std::env::set_var("ROBOFLOW_VERSION_NUMBER", "2");
        assert!(DetectorConfig::from_env().is_configured());

        for key in ["ROBOFLOW_API_KEY", "ROBOFLOW_MODEL_ID", "ROBOFLOW_VERSION_NUMBER"] {
            std::env::remove_var(key);
        }
    }
}
