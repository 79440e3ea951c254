//! Video metadata models.

use serde::{Deserialize, Serialize};

/// Embeddable video shown on the capture page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoInfo {
    /// 11-character YouTube video ID
    pub id: String,
    pub title: String,
}

/// Entry from the most-popular chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PopularVideo {
    pub id: String,
    pub title: String,
    /// Canonical watch URL
    pub url: String,
}

impl PopularVideo {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            url: format!("https://www.youtube.com/watch?v={id}"),
            id,
            title: title.into(),
        }
    }
}
