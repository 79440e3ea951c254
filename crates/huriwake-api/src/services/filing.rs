//! Classify-and-file workflow for uploaded screenshots.

use std::sync::Arc;

use tracing::{error, info};

use huriwake_detect::Detector;
use huriwake_drive::{DriveApi, FolderResolver};
use huriwake_models::{classify, FiledScreenshot, ROOT_FOLDER_LABEL};

use crate::config::FolderSettings;
use crate::error::ApiResult;
use crate::metrics::record_screenshot_filed;
use crate::security::sniff_image_mime;

/// Counts people in a screenshot and stores it in the matching bucket folder.
pub struct ScreenshotFiler {
    detector: Arc<dyn Detector>,
    resolver: Arc<FolderResolver>,
    drive: Arc<dyn DriveApi>,
    folders: FolderSettings,
}

impl ScreenshotFiler {
    pub fn new(
        detector: Arc<dyn Detector>,
        resolver: Arc<FolderResolver>,
        drive: Arc<dyn DriveApi>,
        folders: FolderSettings,
    ) -> Self {
        Self {
            detector,
            resolver,
            drive,
            folders,
        }
    }

    /// Detect, classify, resolve the bucket folder and upload.
    ///
    /// On success exactly one file was created; on any error none was.
    pub async fn file_screenshot(
        &self,
        image: Vec<u8>,
        file_name: &str,
    ) -> ApiResult<FiledScreenshot> {
        let root = self.folders.root()?;

        let count = self.detector.detect(&image).await?;
        let bucket = classify(count);
        let bucket_name = self.folders.layout.bucket_name(bucket).to_string();

        let target = if self.folders.auto_create {
            Some(self.resolver.get_or_create(root, &bucket_name).await)
        } else {
            self.resolver.find(root, &bucket_name).await.transpose()
        };

        let (parent_id, folder_name) = match target {
            Some(Ok(id)) => (id, bucket_name),
            None => (root.to_string(), ROOT_FOLDER_LABEL.to_string()),
            Some(Err(e)) => {
                error!(count, bucket = %bucket, "Failed to resolve bucket folder: {}", e);
                return Err(e.into());
            }
        };

        let mime_type = sniff_image_mime(&image);
        let file_id = self
            .drive
            .upload_file(&parent_id, file_name, mime_type, image)
            .await
            .map_err(|e| {
                error!(count, bucket = %bucket, folder = %folder_name, "Upload failed: {}", e);
                e
            })?;

        record_screenshot_filed(bucket.label(), count);
        info!(
            file_id = %file_id,
            count,
            bucket = %bucket,
            folder = %folder_name,
            "Filed screenshot"
        );

        Ok(FiledScreenshot {
            file_id,
            bucket,
            folder_name,
            count,
        })
    }
}
