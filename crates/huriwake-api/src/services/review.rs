//! Review tool: folder overview, image browsing and checked moves.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{info, warn};

use huriwake_drive::{Download, DriveApi, FolderResolver};
use huriwake_models::{FolderSummary, ImageEntry, MoveOutcome, MoveRequest, ReviewAction};

use crate::config::FolderSettings;
use crate::error::{ApiError, ApiResult};
use crate::metrics::record_move;

pub struct ReviewService {
    drive: Arc<dyn DriveApi>,
    resolver: Arc<FolderResolver>,
    folders: FolderSettings,
}

impl ReviewService {
    pub fn new(
        drive: Arc<dyn DriveApi>,
        resolver: Arc<FolderResolver>,
        folders: FolderSettings,
    ) -> Self {
        Self {
            drive,
            resolver,
            folders,
        }
    }

    /// Bucket folders that exist under the root, in bucket order, with image counts.
    ///
    /// Counts come from one combined listing over all bucket folders; a file
    /// with several bucket parents counts once, under the first one listed.
    pub async fn folder_summaries(&self) -> ApiResult<Vec<FolderSummary>> {
        let root = self.folders.root()?;
        let children = self.resolver.cache().resolve_children(root).await?;

        let buckets: Vec<(String, String)> = self
            .folders
            .layout
            .buckets()
            .filter_map(|(_, name)| children.get(name).map(|id| (name.to_string(), id.clone())))
            .collect();

        if buckets.is_empty() {
            return Ok(Vec::new());
        }

        let folder_ids: Vec<String> = buckets.iter().map(|(_, id)| id.clone()).collect();
        let mut counts: HashMap<&str, u64> =
            folder_ids.iter().map(|id| (id.as_str(), 0)).collect();

        for file in self.drive.list_all_images(&folder_ids).await? {
            let Some(parent) = file
                .parents
                .iter()
                .find(|parent| counts.contains_key(parent.as_str()))
            else {
                continue;
            };
            if let Some(count) = counts.get_mut(parent.as_str()) {
                *count += 1;
            }
        }

        Ok(buckets
            .iter()
            .map(|(name, id)| FolderSummary {
                name: name.clone(),
                id: id.clone(),
                count: counts.get(id.as_str()).copied().unwrap_or(0),
            })
            .collect())
    }

    /// Images directly in a folder, oldest first.
    pub async fn list_images(&self, folder_id: &str) -> ApiResult<Vec<ImageEntry>> {
        let files = self
            .drive
            .list_all_images(&[folder_id.to_string()])
            .await?;
        Ok(files.into_iter().map(ImageEntry::from).collect())
    }

    /// Full-resolution image content.
    pub async fn fetch_image(&self, file_id: &str) -> ApiResult<Download> {
        Ok(self.drive.download(file_id).await?)
    }

    /// Move a file after checking it is still where the reviewer saw it.
    ///
    /// A stale source yields [`MoveOutcome::Conflict`] without any change.
    /// Otherwise the target is resolved and the file's parents are replaced
    /// with it in a single update.
    pub async fn move_file(&self, request: &MoveRequest) -> ApiResult<MoveOutcome> {
        let result = self.try_move(request).await;
        record_move(match &result {
            Ok(MoveOutcome::Moved { .. }) => "moved",
            Ok(MoveOutcome::Conflict { .. }) => "conflict",
            Err(_) => "error",
        });
        result
    }

    async fn try_move(&self, request: &MoveRequest) -> ApiResult<MoveOutcome> {
        let current_parents = self.drive.get_parents(&request.file_id).await?;

        if !current_parents.contains(&request.source_folder_id) {
            warn!(
                file_id = %request.file_id,
                claimed = %request.source_folder_id,
                current = ?current_parents,
                "Move conflict: file is no longer in the claimed folder"
            );
            return Ok(MoveOutcome::Conflict {
                file_id: request.file_id.clone(),
                current_parents,
            });
        }

        let target = self
            .resolve_target(&request.source_folder_id, request.action)
            .await?;

        let remove: Vec<String> = current_parents
            .into_iter()
            .filter(|parent| *parent != target)
            .collect();
        self.drive
            .reparent(&request.file_id, &target, &remove)
            .await?;

        info!(
            file_id = %request.file_id,
            action = %request.action,
            new_parent = %target,
            "Moved file"
        );

        Ok(MoveOutcome::Moved {
            file_id: request.file_id.clone(),
            new_parent: target,
        })
    }

    /// Approve/reject go to a subfolder of the source folder, created on
    /// demand. Reclassify only looks up an existing bucket folder under the
    /// root; it never creates one.
    async fn resolve_target(&self, source_folder_id: &str, action: ReviewAction) -> ApiResult<String> {
        if let Some(verdict) = action.verdict() {
            let name = self.folders.layout.verdict_name(verdict);
            return Ok(self.resolver.get_or_create(source_folder_id, name).await?);
        }

        let bucket = action.target_bucket().ok_or_else(|| {
            ApiError::bad_request(format!("Unknown category in action '{}'", action))
        })?;
        let root = self.folders.root()?;
        let name = self.folders.layout.bucket_name(bucket);

        self.resolver
            .find(root, name)
            .await?
            .ok_or_else(|| ApiError::not_found(format!("Target folder '{}' not found", name)))
    }
}

#[cfg(test)]
mod tests {
    use huriwake_drive::testutils::FakeDrive;
    use huriwake_drive::FolderCache;
    use huriwake_models::FolderLayout;

    use super::*;

    fn service(drive: &Arc<FakeDrive>, auto_create: bool) -> ReviewService {
        let resolver = Arc::new(FolderResolver::new(Arc::new(FolderCache::new(drive.clone()))));
        ReviewService::new(
            drive.clone(),
            resolver,
            FolderSettings {
                root_folder_id: Some("root".to_string()),
                layout: FolderLayout::english(),
                auto_create,
            },
        )
    }

    fn request(file_id: &str, source: &str, action: &str) -> MoveRequest {
        MoveRequest {
            file_id: file_id.to_string(),
            source_folder_id: source.to_string(),
            action: action.parse().unwrap(),
        }
    }

    #[tokio::test]
    async fn test_approve_creates_subfolder_of_source() {
        let drive = Arc::new(FakeDrive::new());
        let source = drive.add_folder("root", "3~5");
        let file = drive.add_file(&source, "a.jpg", "image/jpeg");
        let review = service(&drive, true);

        let outcome = review.move_file(&request(&file, &source, "approve")).await.unwrap();

        let approved = drive.folders_named(&source, "approved");
        assert_eq!(approved.len(), 1);
        assert_eq!(drive.parents_of(&file), approved);
        assert_eq!(
            outcome,
            MoveOutcome::Moved {
                file_id: file.clone(),
                new_parent: approved[0].clone(),
            }
        );
        assert_eq!(drive.calls().reparent, 1);
    }

    #[tokio::test]
    async fn test_stale_source_is_conflict_without_mutation() {
        let drive = Arc::new(FakeDrive::new());
        let s1 = drive.add_folder("root", "3~5");
        let s2 = drive.add_folder("root", "6~10");
        let file = drive.add_file(&s2, "a.jpg", "image/jpeg");
        let review = service(&drive, true);

        let outcome = review.move_file(&request(&file, &s1, "reject")).await.unwrap();

        assert!(outcome.is_conflict());
        assert_eq!(drive.calls().mutations(), 0);
        assert_eq!(drive.parents_of(&file), vec![s2]);
    }

    #[tokio::test]
    async fn test_reclassify_removes_every_previous_parent() {
        let drive = Arc::new(FakeDrive::new());
        let s1 = drive.add_folder("root", "3~5");
        let extra = drive.add_folder("root", "misc");
        let target = drive.add_folder("root", "11+");
        let file = drive.add_file(&s1, "a.jpg", "image/jpeg");
        drive.add_parent(&file, &extra);
        let review = service(&drive, true);

        review.move_file(&request(&file, &s1, "cat3")).await.unwrap();

        assert_eq!(drive.parents_of(&file), vec![target]);
        assert_eq!(drive.calls().reparent, 1);
        assert_eq!(drive.calls().create_folder, 0);
    }

    #[tokio::test]
    async fn test_legacy_codes_are_accepted() {
        let drive = Arc::new(FakeDrive::new());
        let source = drive.add_folder("root", "other");
        let file = drive.add_file(&source, "a.jpg", "image/jpeg");
        let review = service(&drive, true);

        review.move_file(&request(&file, &source, "fuka")).await.unwrap();

        assert_eq!(drive.parents_of(&file), drive.folders_named(&source, "rejected"));
    }

    #[tokio::test]
    async fn test_out_of_range_category_fails_without_mutation() {
        let drive = Arc::new(FakeDrive::new());
        let source = drive.add_folder("root", "3~5");
        let file = drive.add_file(&source, "a.jpg", "image/jpeg");
        let review = service(&drive, true);

        let err = review.move_file(&request(&file, &source, "cat9")).await.unwrap_err();

        assert!(matches!(err, ApiError::BadRequest(_)));
        assert_eq!(drive.calls().mutations(), 0);
        assert_eq!(drive.parents_of(&file), vec![source]);
    }

    #[tokio::test]
    async fn test_reclassify_to_missing_bucket_is_not_found() {
        for auto_create in [true, false] {
            let drive = Arc::new(FakeDrive::new());
            let source = drive.add_folder("root", "3~5");
            let file = drive.add_file(&source, "a.jpg", "image/jpeg");
            let review = service(&drive, auto_create);

            let err = review.move_file(&request(&file, &source, "cat2")).await.unwrap_err();

            assert!(matches!(err, ApiError::NotFound(_)), "auto_create={auto_create}");
            assert_eq!(drive.calls().create_folder, 0);
            assert_eq!(drive.calls().mutations(), 0);
            assert!(drive.folders_named("root", "6~10").is_empty());
            assert_eq!(drive.parents_of(&file), vec![source]);
        }
    }

    #[tokio::test]
    async fn test_unknown_file_is_not_found() {
        let drive = Arc::new(FakeDrive::new());
        let review = service(&drive, true);

        let err = review.move_file(&request("nope", "root", "approve")).await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_folder_summaries_count_each_file_once() {
        let drive = Arc::new(FakeDrive::new().with_page_size(2));
        let small = drive.add_folder("root", "3~5");
        let other = drive.add_folder("root", "other");
        drive.add_folder("root", "unrelated");
        for i in 0..3 {
            drive.add_file(&small, &format!("s{i}.jpg"), "image/jpeg");
        }
        let shared = drive.add_file(&other, "o.jpg", "image/png");
        drive.add_parent(&shared, &small);
        drive.add_file(&other, "notes.txt", "text/plain");
        let review = service(&drive, true);

        let summaries = review.folder_summaries().await.unwrap();

        let names: Vec<_> = summaries.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["3~5", "other"]);
        assert_eq!(summaries[0].count, 3);
        assert_eq!(summaries[1].count, 1);
        assert_eq!(summaries[0].id, small);
    }

    #[tokio::test]
    async fn test_folder_summaries_empty_without_buckets() {
        let drive = Arc::new(FakeDrive::new());
        let review = service(&drive, true);

        assert!(review.folder_summaries().await.unwrap().is_empty());
        assert_eq!(drive.calls().list_images, 0);
    }

    #[tokio::test]
    async fn test_list_images_returns_entries_in_order() {
        let drive = Arc::new(FakeDrive::new());
        let folder = drive.add_folder("root", "6~10");
        let first = drive.add_file(&folder, "1.jpg", "image/jpeg");
        let second = drive.add_file(&folder, "2.jpg", "image/jpeg");
        let review = service(&drive, true);

        let images = review.list_images(&folder).await.unwrap();

        let ids: Vec<_> = images.iter().map(|i| i.id.clone()).collect();
        assert_eq!(ids, vec![first, second]);
        assert!(images[0].thumbnail_link.is_some());
    }
}
