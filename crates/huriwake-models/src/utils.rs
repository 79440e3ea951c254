//! YouTube video reference parsing.
//!
//! The capture page may send either a bare video ID or whatever URL the user
//! pasted. Both resolve to the 11-character ID used by the Data API.

use thiserror::Error;

/// Errors that can occur while resolving a video reference.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VideoRefError {
    #[error("URL is not a YouTube URL")]
    NotYoutube,
    #[error("Video ID has invalid format")]
    InvalidVideoId,
    #[error("Video ID not found in URL")]
    VideoIdNotFound,
}

/// Check an 11-character YouTube video ID.
pub fn is_valid_youtube_id(id: &str) -> bool {
    id.len() == 11
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Resolve a bare ID or a YouTube URL to a video ID.
pub fn parse_video_ref(input: &str) -> Result<String, VideoRefError> {
    let input = input.trim();
    if is_valid_youtube_id(input) {
        return Ok(input.to_string());
    }

    let lower = input.to_ascii_lowercase();
    if !(lower.contains("youtube.com") || lower.contains("youtu.be")) {
        return Err(VideoRefError::NotYoutube);
    }

    // Query-string form first, then path forms.
    let candidate = ["?v=", "&v="]
        .iter()
        .find_map(|marker| input.find(marker).map(|pos| &input[pos + marker.len()..]))
        .or_else(|| {
            ["youtu.be/", "/embed/", "/shorts/", "/live/", "/v/"]
                .iter()
                .find_map(|marker| input.find(marker).map(|pos| &input[pos + marker.len()..]))
        })
        .ok_or(VideoRefError::VideoIdNotFound)?;

    let end = candidate
        .find(|c: char| matches!(c, '&' | '#' | '?' | '/'))
        .unwrap_or(candidate.len());
    let id = candidate[..end].trim();

    if id.is_empty() {
        return Err(VideoRefError::VideoIdNotFound);
    }
    if !is_valid_youtube_id(id) {
        return Err(VideoRefError::InvalidVideoId);
    }
    Ok(id.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_id() {
        assert_eq!(parse_video_ref("dQw4w9WgXcQ").unwrap(), "dQw4w9WgXcQ");
        assert_eq!(parse_video_ref("  dQw4w9WgXcQ ").unwrap(), "dQw4w9WgXcQ");
    }

    #[test]
    fn test_url_forms() {
        for url in [
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
            "https://youtube.com/watch?feature=share&v=dQw4w9WgXcQ",
            "https://youtu.be/dQw4w9WgXcQ?t=42",
            "https://www.youtube.com/embed/dQw4w9WgXcQ",
            "https://youtube.com/shorts/dQw4w9WgXcQ",
            "https://www.youtube.com/live/dQw4w9WgXcQ?si=abc",
        ] {
            assert_eq!(parse_video_ref(url).unwrap(), "dQw4w9WgXcQ", "{url}");
        }
    }

    #[test]
    fn test_rejects_other_hosts() {
        assert_eq!(
            parse_video_ref("https://vimeo.com/123456"),
            Err(VideoRefError::NotYoutube)
        );
    }

    #[test]
    fn test_rejects_bad_ids() {
        assert_eq!(
            parse_video_ref("https://youtube.com/watch?v=short"),
            Err(VideoRefError::InvalidVideoId)
        );
        assert_eq!(
            parse_video_ref("https://youtube.com/channel/UCxyz"),
            Err(VideoRefError::VideoIdNotFound)
        );
    }
}
