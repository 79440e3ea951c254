//! Application state.

use std::sync::Arc;

use tracing::warn;

use huriwake_detect::{Detector, RoboflowClient};
use huriwake_drive::{DriveApi, DriveClient, FolderCache, FolderResolver};

use crate::auth::{AuthConfig, JwksCache};
use crate::config::ApiConfig;
use crate::error::ApiResult;
use crate::services::{ReviewService, ScreenshotFiler, YouTubeClient};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub drive: Arc<dyn DriveApi>,
    pub resolver: Arc<FolderResolver>,
    pub filer: Arc<ScreenshotFiler>,
    pub review: Arc<ReviewService>,
    pub youtube: Arc<YouTubeClient>,
    pub jwks: Arc<JwksCache>,
}

impl AppState {
    /// Create new application state from the environment.
    ///
    /// Drive credentials are required. Detector, YouTube and folder settings
    /// may be missing; the operations that need them fail with a
    /// configuration error instead.
    pub fn new(config: ApiConfig) -> ApiResult<Self> {
        let drive: Arc<dyn DriveApi> = Arc::new(DriveClient::from_env()?);

        let detector = RoboflowClient::from_env()?;
        if !detector.config().is_configured() {
            warn!("Roboflow settings incomplete; screenshot uploads will fail");
        }
        if config.folders.root_folder_id.is_none() {
            warn!("DRIVE_FOLDER_ID not set; folder operations will fail");
        }

        let youtube = YouTubeClient::from_env()?;
        let jwks = JwksCache::new(&AuthConfig::from_env())?;

        Ok(Self::with_services(
            config,
            drive,
            Arc::new(detector),
            Arc::new(youtube),
            Arc::new(jwks),
        ))
    }

    /// Wire the workflows around explicit collaborators.
    pub fn with_services(
        config: ApiConfig,
        drive: Arc<dyn DriveApi>,
        detector: Arc<dyn Detector>,
        youtube: Arc<YouTubeClient>,
        jwks: Arc<JwksCache>,
    ) -> Self {
        let cache = Arc::new(FolderCache::new(Arc::clone(&drive)));
        let resolver = Arc::new(FolderResolver::new(cache));

        let filer = ScreenshotFiler::new(
            detector,
            Arc::clone(&resolver),
            Arc::clone(&drive),
            config.folders.clone(),
        );
        let review = ReviewService::new(
            Arc::clone(&drive),
            Arc::clone(&resolver),
            config.folders.clone(),
        );

        Self {
            config,
            drive,
            resolver,
            filer: Arc::new(filer),
            review: Arc::new(review),
            youtube,
            jwks,
        }
    }
}
