//! Shared data models for the huriwake backend.
//!
//! This crate provides Serde-serializable types for:
//! - Person-count buckets and the classification rule
//! - Folder naming for buckets and review verdicts
//! - Review actions, move requests and move outcomes
//! - Screenshot filing results and video metadata

pub mod bucket;
pub mod folder;
pub mod review;
pub mod screenshot;
pub mod utils;
pub mod video;

// Re-export common types
pub use bucket::{classify, Bucket};
pub use folder::{FolderLayout, FolderSummary, ImageEntry, Verdict};
pub use review::{ActionParseError, MoveOutcome, MoveRequest, ReviewAction};
pub use screenshot::{FiledScreenshot, ROOT_FOLDER_LABEL};
pub use utils::{is_valid_youtube_id, parse_video_ref, VideoRefError};
pub use video::{PopularVideo, VideoInfo};
