//! YouTube Data API v3 client for video metadata.

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use tracing::{info_span, warn, Instrument};

use huriwake_models::{PopularVideo, VideoInfo};

use crate::config::{env_non_empty, env_parse};
use crate::error::{ApiError, ApiResult};

pub const DEFAULT_BASE_URL: &str = "https://www.googleapis.com/youtube/v3";

#[derive(Debug, Clone)]
pub struct YouTubeConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    /// Region for the most-popular chart
    pub region_code: String,
    pub max_results: u32,
    pub timeout: Duration,
}

impl Default for YouTubeConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            region_code: "JP".to_string(),
            max_results: 3,
            timeout: Duration::from_secs(15),
        }
    }
}

impl YouTubeConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            api_key: env_non_empty("YOUTUBE_API_KEY"),
            base_url: env_non_empty("YOUTUBE_API_BASE_URL").unwrap_or(defaults.base_url),
            region_code: env_non_empty("YOUTUBE_REGION_CODE").unwrap_or(defaults.region_code),
            max_results: env_parse("YOUTUBE_MAX_RESULTS")
                .filter(|n: &u32| (1..=50).contains(n))
                .unwrap_or(defaults.max_results),
            timeout: defaults.timeout,
        }
    }
}

#[derive(Debug, Deserialize)]
struct VideoListResponse {
    #[serde(default)]
    items: Vec<VideoItem>,
}

#[derive(Debug, Deserialize)]
struct VideoItem {
    id: String,
    snippet: Option<Snippet>,
    status: Option<Status>,
}

#[derive(Debug, Deserialize)]
struct Snippet {
    title: String,
}

#[derive(Debug, Deserialize)]
struct Status {
    #[serde(default)]
    embeddable: bool,
}

impl VideoItem {
    fn title(&self) -> String {
        self.snippet
            .as_ref()
            .map(|s| s.title.clone())
            .unwrap_or_default()
    }
}

pub struct YouTubeClient {
    http: Client,
    config: YouTubeConfig,
}

impl YouTubeClient {
    pub fn new(config: YouTubeConfig) -> ApiResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ApiError::internal(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { http, config })
    }

    pub fn from_env() -> ApiResult<Self> {
        Self::new(YouTubeConfig::from_env())
    }

    pub fn config(&self) -> &YouTubeConfig {
        &self.config
    }

    fn api_key(&self) -> ApiResult<&str> {
        self.config
            .api_key
            .as_deref()
            .ok_or_else(|| ApiError::config("YOUTUBE_API_KEY is not set"))
    }

    /// Title of an embeddable video.
    pub async fn video_info(&self, video_id: &str) -> ApiResult<VideoInfo> {
        let key = self.api_key()?;
        let response = self
            .list_videos(&[("part", "snippet,status"), ("id", video_id), ("key", key)])
            .instrument(info_span!("youtube_video_info", video_id = %video_id))
            .await?;

        let item = response
            .items
            .into_iter()
            .next()
            .ok_or_else(|| ApiError::not_found(format!("Video {} not found", video_id)))?;

        if !item.status.as_ref().is_some_and(|s| s.embeddable) {
            return Err(ApiError::policy(format!(
                "Video {} does not allow embedding",
                video_id
            )));
        }

        Ok(VideoInfo {
            id: video_id.to_string(),
            title: item.title(),
        })
    }

    /// Current most-popular chart for the configured region.
    pub async fn popular_videos(&self) -> ApiResult<Vec<PopularVideo>> {
        let key = self.api_key()?;
        let max_results = self.config.max_results.to_string();
        let response = self
            .list_videos(&[
                ("part", "snippet"),
                ("chart", "mostPopular"),
                ("regionCode", self.config.region_code.as_str()),
                ("maxResults", max_results.as_str()),
                ("key", key),
            ])
            .instrument(info_span!("youtube_popular", region = %self.config.region_code))
            .await?;

        Ok(response
            .items
            .into_iter()
            .map(|item| {
                let title = item.title();
                PopularVideo::new(item.id, title)
            })
            .collect())
    }

    async fn list_videos(&self, query: &[(&str, &str)]) -> ApiResult<VideoListResponse> {
        let url = format!("{}/videos", self.config.base_url.trim_end_matches('/'));
        let response = self
            .http
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|e| ApiError::transport(format!("YouTube request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "YouTube API error: {}", body);
            return Err(ApiError::transport(format!("YouTube API returned {}", status)));
        }

        response
            .json()
            .await
            .map_err(|e| ApiError::transport(format!("Invalid YouTube response: {}", e)))
    }
}
