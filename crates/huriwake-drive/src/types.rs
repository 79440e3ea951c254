//! Drive v3 wire types and query builders.

use serde::{Deserialize, Serialize};

use huriwake_models::ImageEntry;

/// MIME type Drive uses for folders.
pub const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";

/// File resource, restricted to the fields this service requests.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveFile {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub parents: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_link: Option<String>,
}

impl DriveFile {
    pub fn is_folder(&self) -> bool {
        self.mime_type.as_deref() == Some(FOLDER_MIME_TYPE)
    }

    pub fn has_parent(&self, parent_id: &str) -> bool {
        self.parents.iter().any(|p| p == parent_id)
    }
}

impl From<DriveFile> for ImageEntry {
    fn from(file: DriveFile) -> Self {
        ImageEntry {
            id: file.id,
            name: file.name,
            description: file.description,
            thumbnail_link: file.thumbnail_link,
        }
    }
}

/// One page of a `files.list` response.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilePage {
    #[serde(default)]
    pub files: Vec<DriveFile>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

/// Response of a create call; only the id is requested.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct CreatedFile {
    pub id: String,
}

/// Metadata body for folder creation.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct NewFileMetadata<'a> {
    pub name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<&'a str>,
    pub parents: [&'a str; 1],
}

/// Raw media bytes fetched with `alt=media`.
#[derive(Debug, Clone)]
pub struct Download {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

/// Escape a value for use inside a single-quoted Drive query literal.
pub fn escape_query_value(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

/// Non-trashed folders directly under `parent_id`.
pub fn child_folders_query(parent_id: &str) -> String {
    format!(
        "'{}' in parents and mimeType = '{}' and trashed = false",
        escape_query_value(parent_id),
        FOLDER_MIME_TYPE
    )
}

/// Non-trashed images whose parents include any of `parent_ids`.
pub fn images_in_query(parent_ids: &[String]) -> String {
    let parents = parent_ids
        .iter()
        .map(|id| format!("'{}' in parents", escape_query_value(id)))
        .collect::<Vec<_>>()
        .join(" or ");
    format!("({}) and mimeType contains 'image/' and trashed = false", parents)
}
