//! The storage operations the workflows depend on.

use async_trait::async_trait;

use crate::error::DriveResult;
use crate::types::{DriveFile, FilePage, Download};

/// Narrow view of Google Drive used by the folder cache and workflows.
///
/// [`crate::DriveClient`] talks to the real API; tests use the in-memory
/// fake from the `test-utils` feature.
#[async_trait]
pub trait DriveApi: Send + Sync {
    /// One page of non-trashed folders directly under `parent_id`.
    async fn list_child_folders(
        &self,
        parent_id: &str,
        page_token: Option<&str>,
    ) -> DriveResult<FilePage>;

    /// Create a folder with `parent_id` as its only parent. Returns the new id.
    async fn create_folder(&self, parent_id: &str, name: &str) -> DriveResult<String>;

    /// Upload bytes as a new file under `parent_id`. Returns the new id.
    async fn upload_file(
        &self,
        parent_id: &str,
        name: &str,
        mime_type: &str,
        bytes: Vec<u8>,
    ) -> DriveResult<String>;

    /// Current parent set of a file.
    async fn get_parents(&self, file_id: &str) -> DriveResult<Vec<String>>;

    /// Add `add_parent` and remove `remove_parents` in a single update.
    async fn reparent(
        &self,
        file_id: &str,
        add_parent: &str,
        remove_parents: &[String],
    ) -> DriveResult<DriveFile>;

    /// One page of non-trashed images under any of `parent_ids`, oldest first.
    async fn list_images(
        &self,
        parent_ids: &[String],
        page_token: Option<&str>,
    ) -> DriveResult<FilePage>;

    /// Raw file content.
    async fn download(&self, file_id: &str) -> DriveResult<Download>;

    /// Cheap authenticated call used by readiness checks. Reads the root
    /// folder when one is given, otherwise the account's `about` record.
    async fn check_connectivity(&self, root_folder_id: Option<&str>) -> DriveResult<()>;

    /// All images under any of `parent_ids`, following every page.
    async fn list_all_images(&self, parent_ids: &[String]) -> DriveResult<Vec<DriveFile>> {
        let mut files = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let page = self.list_images(parent_ids, page_token.as_deref()).await?;
            files.extend(page.files);

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        Ok(files)
    }
}
