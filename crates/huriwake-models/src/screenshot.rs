//! Screenshot filing results.

use serde::{Deserialize, Serialize};

use crate::bucket::Bucket;

/// Folder label reported when a screenshot lands directly in the root folder.
pub const ROOT_FOLDER_LABEL: &str = "(root folder)";

/// A screenshot that was classified and stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FiledScreenshot {
    /// Storage id of the new file
    pub file_id: String,
    /// Bucket the detected count classified into
    pub bucket: Bucket,
    /// Folder actually used (bucket folder name or [`ROOT_FOLDER_LABEL`])
    pub folder_name: String,
    /// Number of people detected
    pub count: u32,
}

impl FiledScreenshot {
    /// True when the bucket folder was unavailable and the root was used.
    pub fn filed_in_root(&self) -> bool {
        self.folder_name == ROOT_FOLDER_LABEL
    }
}
