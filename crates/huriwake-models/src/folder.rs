//! Folder naming and review-tool folder models.

use serde::{Deserialize, Serialize};

use crate::bucket::Bucket;

/// Reviewer verdict that files an image into a subfolder of its current folder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Approved,
    Rejected,
}

/// Folder names used for buckets and review verdicts.
///
/// Names are fixed per deployment; they are what the storage service sees.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderLayout {
    /// One name per bucket, in [`Bucket::ALL`] order
    pub bucket_names: [String; 4],
    /// Subfolder for approved images
    pub approved: String,
    /// Subfolder for rejected images
    pub rejected: String,
}

impl Default for FolderLayout {
    fn default() -> Self {
        Self::english()
    }
}

impl FolderLayout {
    /// Canonical bucket labels with English verdict folders.
    pub fn english() -> Self {
        Self {
            bucket_names: Bucket::ALL.map(|b| b.label().to_string()),
            approved: "approved".to_string(),
            rejected: "rejected".to_string(),
        }
    }

    /// Japanese folder names used by the original review team.
    pub fn japanese() -> Self {
        Self {
            bucket_names: [
                "3～5人".to_string(),
                "6～10人".to_string(),
                "11人～".to_string(),
                "その他".to_string(),
            ],
            approved: "納品可能".to_string(),
            rejected: "不可".to_string(),
        }
    }

    /// Select a layout by locale tag. Unknown tags fall back to English.
    pub fn for_locale(locale: &str) -> Self {
        match locale.trim().to_ascii_lowercase().as_str() {
            "ja" | "ja-jp" | "jp" => Self::japanese(),
            _ => Self::english(),
        }
    }

    /// Folder name for a bucket.
    pub fn bucket_name(&self, bucket: Bucket) -> &str {
        &self.bucket_names[bucket.index()]
    }

    /// Folder name for a verdict.
    pub fn verdict_name(&self, verdict: Verdict) -> &str {
        match verdict {
            Verdict::Approved => &self.approved,
            Verdict::Rejected => &self.rejected,
        }
    }

    /// Bucket folder names paired with their bucket, in review order.
    pub fn buckets(&self) -> impl Iterator<Item = (Bucket, &str)> {
        Bucket::ALL
            .into_iter()
            .map(move |b| (b, self.bucket_name(b)))
    }
}

/// Classification folder with its image count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderSummary {
    pub name: String,
    pub id: String,
    pub count: u64,
}

/// Image listed inside a folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageEntry {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Drive thumbnail URL (short-lived)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_link: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_english_layout_uses_labels() {
        let layout = FolderLayout::english();
        assert_eq!(layout.bucket_name(Bucket::ThreeToFive), "3~5");
        assert_eq!(layout.bucket_name(Bucket::Other), "other");
        assert_eq!(layout.verdict_name(Verdict::Approved), "approved");
    }

    #[test]
    fn test_locale_selection() {
        assert_eq!(FolderLayout::for_locale("ja"), FolderLayout::japanese());
        assert_eq!(FolderLayout::for_locale(" JA "), FolderLayout::japanese());
        assert_eq!(FolderLayout::for_locale("fr"), FolderLayout::english());
        assert_eq!(
            FolderLayout::japanese().verdict_name(Verdict::Rejected),
            "不可"
        );
    }

    #[test]
    fn test_buckets_in_order() {
        let layout = FolderLayout::japanese();
        let names: Vec<_> = layout.buckets().map(|(_, name)| name).collect();
        assert_eq!(names, vec!["3～5人", "6～10人", "11人～", "その他"]);
    }

    #[test]
    fn test_image_entry_wire_names() {
        let entry = ImageEntry {
            id: "f1".to_string(),
            name: "shot.jpg".to_string(),
            description: None,
            thumbnail_link: Some("https://thumb".to_string()),
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["thumbnailLink"], "https://thumb");
        assert!(json.get("description").is_none());
    }
}
