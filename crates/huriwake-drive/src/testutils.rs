//! In-memory Drive for tests.
//!
//! Stores folders and files in a map, pages listings, counts every call and
//! can be told to fail listings or uploads.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::api::DriveApi;
use crate::error::{DriveError, DriveResult};
use crate::types::{Download, DriveFile, FilePage, FOLDER_MIME_TYPE};

#[derive(Debug, Clone)]
struct FakeFile {
    file: DriveFile,
    bytes: Vec<u8>,
}

#[derive(Default)]
struct FakeState {
    files: HashMap<String, FakeFile>,
    /// Ids in creation order, so listings are stable
    order: Vec<String>,
    next_id: u64,
}

impl FakeState {
    fn insert(&mut self, parent: &str, name: &str, mime_type: &str, bytes: Vec<u8>) -> String {
        self.next_id += 1;
        let id = format!("fake-{}", self.next_id);
        let file = DriveFile {
            id: id.clone(),
            name: name.to_string(),
            mime_type: Some(mime_type.to_string()),
            parents: vec![parent.to_string()],
            description: None,
            thumbnail_link: Some(format!("https://thumbs.example/{id}")),
        };
        self.files.insert(id.clone(), FakeFile { file, bytes });
        self.order.push(id.clone());
        id
    }

    fn ordered(&self) -> impl Iterator<Item = &FakeFile> {
        self.order.iter().filter_map(|id| self.files.get(id))
    }
}

/// Snapshot of how often each operation was called.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub list_folders: usize,
    pub list_images: usize,
    pub create_folder: usize,
    pub upload: usize,
    pub get_parents: usize,
    pub reparent: usize,
    pub download: usize,
}

impl CallCounts {
    /// Calls that change storage state.
    pub fn mutations(&self) -> usize {
        self.create_folder + self.upload + self.reparent
    }
}

#[derive(Default)]
struct Counters {
    list_folders: AtomicUsize,
    list_images: AtomicUsize,
    create_folder: AtomicUsize,
    upload: AtomicUsize,
    get_parents: AtomicUsize,
    reparent: AtomicUsize,
    download: AtomicUsize,
}

/// In-memory [`DriveApi`] implementation.
pub struct FakeDrive {
    state: Mutex<FakeState>,
    counters: Counters,
    page_size: usize,
    create_delay: Option<Duration>,
    fail_listing: AtomicBool,
    fail_uploads: AtomicBool,
}

impl Default for FakeDrive {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeDrive {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(FakeState::default()),
            counters: Counters::default(),
            page_size: 100,
            create_delay: None,
            fail_listing: AtomicBool::new(false),
            fail_uploads: AtomicBool::new(false),
        }
    }

    /// Page listings at `page_size` entries.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Sleep inside `create_folder`, widening race windows in tests.
    pub fn with_create_delay(mut self, delay: Duration) -> Self {
        self.create_delay = Some(delay);
        self
    }

    pub fn set_fail_listing(&self, fail: bool) {
        self.fail_listing.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_uploads(&self, fail: bool) {
        self.fail_uploads.store(fail, Ordering::SeqCst);
    }

    /// Seed a folder without counting it as a call.
    pub fn add_folder(&self, parent_id: &str, name: &str) -> String {
        self.lock().insert(parent_id, name, FOLDER_MIME_TYPE, Vec::new())
    }

    /// Seed a file without counting it as a call.
    pub fn add_file(&self, parent_id: &str, name: &str, mime_type: &str) -> String {
        self.lock()
            .insert(parent_id, name, mime_type, name.as_bytes().to_vec())
    }

    /// Give an existing file an extra parent.
    pub fn add_parent(&self, file_id: &str, parent_id: &str) {
        if let Some(entry) = self.lock().files.get_mut(file_id) {
            entry.file.parents.push(parent_id.to_string());
        }
    }

    pub fn parents_of(&self, file_id: &str) -> Vec<String> {
        self.lock()
            .files
            .get(file_id)
            .map(|f| f.file.parents.clone())
            .unwrap_or_default()
    }

    pub fn file(&self, file_id: &str) -> Option<DriveFile> {
        self.lock().files.get(file_id).map(|f| f.file.clone())
    }

    /// Ids of folders named `name` directly under `parent_id`.
    pub fn folders_named(&self, parent_id: &str, name: &str) -> Vec<String> {
        self.lock()
            .ordered()
            .filter(|f| f.file.is_folder() && f.file.name == name && f.file.has_parent(parent_id))
            .map(|f| f.file.id.clone())
            .collect()
    }

    /// Non-folder files directly under `parent_id`.
    pub fn files_in(&self, parent_id: &str) -> Vec<DriveFile> {
        self.lock()
            .ordered()
            .filter(|f| !f.file.is_folder() && f.file.has_parent(parent_id))
            .map(|f| f.file.clone())
            .collect()
    }

    /// Total non-folder files.
    pub fn file_count(&self) -> usize {
        self.lock().files.values().filter(|f| !f.file.is_folder()).count()
    }

    pub fn calls(&self) -> CallCounts {
        let c = &self.counters;
        CallCounts {
            list_folders: c.list_folders.load(Ordering::SeqCst),
            list_images: c.list_images.load(Ordering::SeqCst),
            create_folder: c.create_folder.load(Ordering::SeqCst),
            upload: c.upload.load(Ordering::SeqCst),
            get_parents: c.get_parents.load(Ordering::SeqCst),
            reparent: c.reparent.load(Ordering::SeqCst),
            download: c.download.load(Ordering::SeqCst),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, FakeState> {
        // A panicking test thread must not hide the state from the others.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn page(&self, matching: Vec<DriveFile>, page_token: Option<&str>) -> DriveResult<FilePage> {
        let offset = match page_token {
            Some(token) => token
                .parse::<usize>()
                .map_err(|_| DriveError::request_failed(format!("bad page token {token}")))?,
            None => 0,
        };
        let end = (offset + self.page_size).min(matching.len());
        let files = matching.get(offset..end).map(<[_]>::to_vec).unwrap_or_default();
        let next_page_token = (end < matching.len()).then(|| end.to_string());

        Ok(FilePage {
            files,
            next_page_token,
        })
    }
}

#[async_trait]
impl DriveApi for FakeDrive {
    async fn list_child_folders(
        &self,
        parent_id: &str,
        page_token: Option<&str>,
    ) -> DriveResult<FilePage> {
        self.counters.list_folders.fetch_add(1, Ordering::SeqCst);
        if self.fail_listing.load(Ordering::SeqCst) {
            return Err(DriveError::from_http_status(503, "listing unavailable"));
        }

        let matching = self
            .lock()
            .ordered()
            .filter(|f| f.file.is_folder() && f.file.has_parent(parent_id))
            .map(|f| f.file.clone())
            .collect();
        self.page(matching, page_token)
    }

    async fn create_folder(&self, parent_id: &str, name: &str) -> DriveResult<String> {
        self.counters.create_folder.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.create_delay {
            tokio::time::sleep(delay).await;
        }
        Ok(self.lock().insert(parent_id, name, FOLDER_MIME_TYPE, Vec::new()))
    }

    async fn upload_file(
        &self,
        parent_id: &str,
        name: &str,
        mime_type: &str,
        bytes: Vec<u8>,
    ) -> DriveResult<String> {
        self.counters.upload.fetch_add(1, Ordering::SeqCst);
        if self.fail_uploads.load(Ordering::SeqCst) {
            return Err(DriveError::from_http_status(500, "upload failed"));
        }
        Ok(self.lock().insert(parent_id, name, mime_type, bytes))
    }

    async fn get_parents(&self, file_id: &str) -> DriveResult<Vec<String>> {
        self.counters.get_parents.fetch_add(1, Ordering::SeqCst);
        self.lock()
            .files
            .get(file_id)
            .map(|f| f.file.parents.clone())
            .ok_or_else(|| DriveError::not_found(format!("file {file_id}")))
    }

    async fn reparent(
        &self,
        file_id: &str,
        add_parent: &str,
        remove_parents: &[String],
    ) -> DriveResult<DriveFile> {
        self.counters.reparent.fetch_add(1, Ordering::SeqCst);
        let mut state = self.lock();
        let entry = state
            .files
            .get_mut(file_id)
            .ok_or_else(|| DriveError::not_found(format!("file {file_id}")))?;

        entry.file.parents.retain(|p| !remove_parents.contains(p));
        if !entry.file.has_parent(add_parent) {
            entry.file.parents.push(add_parent.to_string());
        }
        Ok(entry.file.clone())
    }

    async fn list_images(
        &self,
        parent_ids: &[String],
        page_token: Option<&str>,
    ) -> DriveResult<FilePage> {
        self.counters.list_images.fetch_add(1, Ordering::SeqCst);
        if self.fail_listing.load(Ordering::SeqCst) {
            return Err(DriveError::from_http_status(503, "listing unavailable"));
        }

        let matching = self
            .lock()
            .ordered()
            .filter(|f| {
                f.file
                    .mime_type
                    .as_deref()
                    .is_some_and(|m| m.starts_with("image/"))
                    && f.file.parents.iter().any(|p| parent_ids.contains(p))
            })
            .map(|f| f.file.clone())
            .collect();
        self.page(matching, page_token)
    }

    async fn download(&self, file_id: &str) -> DriveResult<Download> {
        self.counters.download.fetch_add(1, Ordering::SeqCst);
        self.lock()
            .files
            .get(file_id)
            .map(|f| Download {
                bytes: f.bytes.clone(),
                content_type: f
                    .file
                    .mime_type
                    .clone()
                    .unwrap_or_else(|| "application/octet-stream".to_string()),
            })
            .ok_or_else(|| DriveError::not_found(format!("file {file_id}")))
    }

    async fn check_connectivity(&self, _root_folder_id: Option<&str>) -> DriveResult<()> {
        if self.fail_listing.load(Ordering::SeqCst) {
            return Err(DriveError::from_http_status(503, "unavailable"));
        }
        Ok(())
    }
}
