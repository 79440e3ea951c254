//! Process-wide cache of child folders, keyed by parent folder id.
//!
//! An entry is created by listing every page of a parent's child folders and
//! is then served from memory until it is invalidated. Entries never expire
//! on their own: folders created by other processes become visible after
//! [`FolderCache::invalidate`] or [`FolderCache::clear`].

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::api::DriveApi;
use crate::error::DriveResult;
use crate::metrics::{record_cache_hit, record_cache_miss};

/// Child folder name → folder id.
pub type ChildFolders = HashMap<String, String>;

pub struct FolderCache {
    drive: Arc<dyn DriveApi>,
    entries: RwLock<HashMap<String, ChildFolders>>,
}

impl FolderCache {
    pub fn new(drive: Arc<dyn DriveApi>) -> Self {
        Self {
            drive,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn drive(&self) -> &Arc<dyn DriveApi> {
        &self.drive
    }

    /// Child folders of `parent_id`, listing them on first use.
    ///
    /// A failed listing stores nothing, so the next call lists again. When
    /// two callers populate the same parent concurrently the first stored
    /// mapping is kept.
    pub async fn resolve_children(&self, parent_id: &str) -> DriveResult<ChildFolders> {
        {
            let entries = self.entries.read().await;
            if let Some(children) = entries.get(parent_id) {
                record_cache_hit();
                return Ok(children.clone());
            }
        }

        record_cache_miss();
        let fetched = self.fetch_children(parent_id).await?;

        let mut entries = self.entries.write().await;
        let stored = entries.entry(parent_id.to_string()).or_insert(fetched);
        Ok(stored.clone())
    }

    /// Id of the child folder `name` under `parent_id`, if it exists.
    pub async fn lookup(&self, parent_id: &str, name: &str) -> DriveResult<Option<String>> {
        Ok(self.resolve_children(parent_id).await?.remove(name))
    }

    /// Record a folder this process just created.
    ///
    /// Only updates an existing entry; an uncached parent stays uncached so
    /// its first listing still sees every folder.
    pub async fn invalidate_insert(&self, parent_id: &str, name: &str, folder_id: &str) {
        let mut entries = self.entries.write().await;
        if let Some(children) = entries.get_mut(parent_id) {
            children.insert(name.to_string(), folder_id.to_string());
        }
    }

    /// Drop one parent's entry. Returns whether it was cached.
    pub async fn invalidate(&self, parent_id: &str) -> bool {
        self.entries.write().await.remove(parent_id).is_some()
    }

    /// Drop every entry. Returns how many were cached.
    pub async fn clear(&self) -> usize {
        let mut entries = self.entries.write().await;
        let count = entries.len();
        entries.clear();
        info!(entries = count, "Cleared folder cache");
        count
    }

    pub async fn is_cached(&self, parent_id: &str) -> bool {
        self.entries.read().await.contains_key(parent_id)
    }

    async fn fetch_children(&self, parent_id: &str) -> DriveResult<ChildFolders> {
        let mut children = ChildFolders::new();
        let mut page_token: Option<String> = None;
        let mut pages = 0u32;

        loop {
            let page = self
                .drive
                .list_child_folders(parent_id, page_token.as_deref())
                .await?;
            pages += 1;

            // Duplicate names keep the last id listed.
            for folder in page.files {
                children.insert(folder.name, folder.id);
            }

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        debug!(
            parent_id = %parent_id,
            folders = children.len(),
            pages,
            "Listed child folders"
        );
        Ok(children)
    }
}
