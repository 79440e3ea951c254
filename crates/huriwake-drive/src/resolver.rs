//! Get-or-create resolution of named child folders.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tracing::info;

use crate::error::DriveResult;
use crate::folder_cache::FolderCache;
use crate::metrics::record_folder_created;

/// Resolves folder names to ids under a parent, creating missing folders.
///
/// "Check cache, create if absent, register" runs under a per-parent lock, so
/// concurrent requests in this process never create two folders with the same
/// name. Other processes sharing the drive can still race; Drive allows
/// duplicate names and the cache then keeps whichever id it lists last.
/// Lock entries live only while a creation under that parent is in flight.
pub struct FolderResolver {
    cache: Arc<FolderCache>,
    creation_locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl FolderResolver {
    pub fn new(cache: Arc<FolderCache>) -> Self {
        Self {
            cache,
            creation_locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn cache(&self) -> &Arc<FolderCache> {
        &self.cache
    }

    /// Existing child folder id, without creating anything.
    pub async fn find(&self, parent_id: &str, name: &str) -> DriveResult<Option<String>> {
        self.cache.lookup(parent_id, name).await
    }

    /// Id of the child folder `name` under `parent_id`, created if absent.
    pub async fn get_or_create(&self, parent_id: &str, name: &str) -> DriveResult<String> {
        if let Some(id) = self.cache.lookup(parent_id, name).await? {
            return Ok(id);
        }

        let lock = self.creation_lock(parent_id);
        let result = {
            let _guard = lock.lock().await;
            self.create_if_absent(parent_id, name).await
        };
        self.release_creation_lock(parent_id, lock);
        result
    }

    async fn create_if_absent(&self, parent_id: &str, name: &str) -> DriveResult<String> {
        // Another request may have created it while we waited.
        if let Some(id) = self.cache.lookup(parent_id, name).await? {
            return Ok(id);
        }

        let id = self.cache.drive().create_folder(parent_id, name).await?;
        self.cache.invalidate_insert(parent_id, name, &id).await;
        record_folder_created();

        info!(parent_id = %parent_id, name = %name, folder_id = %id, "Created folder");
        Ok(id)
    }

    fn creation_lock(&self, parent_id: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self
            .creation_locks
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        locks.entry(parent_id.to_string()).or_default().clone()
    }

    /// Drops the parent's lock entry once no other request holds or awaits it.
    fn release_creation_lock(&self, parent_id: &str, lock: Arc<tokio::sync::Mutex<()>>) {
        let mut locks = self
            .creation_locks
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        // One reference in the map, one here.
        if Arc::strong_count(&lock) == 2 {
            locks.remove(parent_id);
        }
    }

    #[cfg(test)]
    fn pending_locks(&self) -> usize {
        self.creation_locks
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }
}
