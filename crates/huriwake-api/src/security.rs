//! Input validation and sanitization.
//!
//! This module provides:
//! - Drive id validation for path parameters
//! - Upload file name sanitization
//! - Decoding of base64 screenshot payloads (raw or data URL)

use base64::Engine;

/// Maximum accepted Drive id length.
const MAX_DRIVE_ID_LENGTH: usize = 128;

/// Maximum stored file name length, in characters.
pub const MAX_FILE_NAME_LENGTH: usize = 255;

/// Validate a Drive file or folder id.
///
/// Drive ids are URL-safe base64-like strings: alphanumerics, `-` and `_`.
pub fn is_valid_drive_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= MAX_DRIVE_ID_LENGTH
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Sanitize an uploaded file name.
///
/// Control characters are dropped, path separators become `_`, and the
/// result is trimmed and capped. Returns `None` if nothing usable is left.
pub fn sanitize_file_name(input: &str) -> Option<String> {
    let cleaned: String = input
        .chars()
        .filter(|c| !c.is_control())
        .map(|c| if c == '/' || c == '\\' { '_' } else { c })
        .take(MAX_FILE_NAME_LENGTH)
        .collect();

    let cleaned = cleaned.trim();
    if cleaned.is_empty() || cleaned.chars().all(|c| c == '.' || c == '_') {
        None
    } else {
        Some(cleaned.to_string())
    }
}

/// Decode a screenshot payload.
///
/// Accepts either raw base64 or a data URL (`data:image/png;base64,....`).
/// Whitespace inside the base64 text is ignored.
pub fn decode_image_payload(payload: &str) -> Result<Vec<u8>, String> {
    let payload = payload.trim();
    let encoded = match payload.strip_prefix("data:") {
        Some(rest) => {
            let (header, data) = rest
                .split_once(',')
                .ok_or_else(|| "Malformed data URL".to_string())?;
            if !header.ends_with(";base64") {
                return Err("Data URL must be base64-encoded".to_string());
            }
            data
        }
        None => payload,
    };

    let compact: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
    if compact.is_empty() {
        return Err("Image data is empty".to_string());
    }

    base64::engine::general_purpose::STANDARD
        .decode(compact.as_bytes())
        .map_err(|e| format!("Invalid base64 image data: {}", e))
}

/// MIME type of an image from its magic bytes, defaulting to JPEG.
pub fn sniff_image_mime(bytes: &[u8]) -> &'static str {
    if bytes.starts_with(b"\x89PNG\r\n\x1a\n") {
        "image/png"
    } else if bytes.starts_with(b"GIF8") {
        "image/gif"
    } else if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        "image/webp"
    } else {
        "image/jpeg"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drive_id_validation() {
        assert!(is_valid_drive_id("1AbC-def_GHI"));
        assert!(!is_valid_drive_id(""));
        assert!(!is_valid_drive_id("../etc"));
        assert!(!is_valid_drive_id("a b"));
        assert!(!is_valid_drive_id("id'or'1"));
        assert!(!is_valid_drive_id(&"a".repeat(200)));
    }

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("shot.jpg").as_deref(), Some("shot.jpg"));
        assert_eq!(
            sanitize_file_name("../../etc/passwd").as_deref(),
            Some(".._.._etc_passwd")
        );
        assert_eq!(sanitize_file_name("a\u{0}b\n.png").as_deref(), Some("ab.png"));
        assert_eq!(sanitize_file_name("   "), None);
        assert_eq!(sanitize_file_name("/"), None);
        assert_eq!(
            sanitize_file_name(&"x".repeat(400)).map(|s| s.chars().count()),
            Some(MAX_FILE_NAME_LENGTH)
        );
    }

    #[test]
    fn test_decode_data_url_and_raw() {
        assert_eq!(
            decode_image_payload("data:image/jpeg;base64,aW1n").unwrap(),
            b"img".to_vec()
        );
        assert_eq!(decode_image_payload("aW1n").unwrap(), b"img".to_vec());
        assert_eq!(decode_image_payload("aW\n1n").unwrap(), b"img".to_vec());
    }

    #[test]
    fn test_decode_rejects_bad_payloads() {
        assert!(decode_image_payload("data:image/png,raw").is_err());
        assert!(decode_image_payload("data:image/png;base64").is_err());
        assert!(decode_image_payload("").is_err());
        assert!(decode_image_payload("!!!").is_err());
    }

    #[test]
    fn test_sniff_image_mime() {
        assert_eq!(sniff_image_mime(b"\x89PNG\r\n\x1a\nrest"), "image/png");
        assert_eq!(sniff_image_mime(b"GIF89a"), "image/gif");
        assert_eq!(sniff_image_mime(b"RIFF\0\0\0\0WEBPVP8"), "image/webp");
        assert_eq!(sniff_image_mime(b"\xff\xd8\xff"), "image/jpeg");
    }
}
