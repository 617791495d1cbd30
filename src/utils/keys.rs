//! Storage key helpers.
//!
//! A key is `{id}_{timestamp_ms}_{name}`: a short random id, the upload time
//! in milliseconds and the sanitized original filename. Uniqueness rests on
//! the id and the timestamp; nothing checks the bucket for collisions.

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use rand::{Rng, distributions::Alphanumeric};
use std::path::Path;

/// Length of the generated short id.
pub const SHORT_ID_LEN: usize = 9;

// Keeps `{id}_{ts}_{name}` under the 255 byte file name limit of the staging fs
const MAX_FILENAME_BYTES: usize = 200;

const FALLBACK_FILENAME: &str = "file";

/// Characters left as-is in a URL path segment (RFC 3986 unreserved).
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

pub fn generate_short_id() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(SHORT_ID_LEN)
        .map(char::from)
        .collect()
}

pub fn storage_key(id: &str, timestamp_ms: i64, filename: &str) -> String {
    format!("{}_{}_{}", id, timestamp_ms, filename)
}

/// Reduce a client supplied filename to something safe to use both as a
/// local file name and as part of a bucket key.
pub fn sanitize_filename(filename: &str) -> String {
    // Get only the filename component (remove any path)
    let name = Path::new(filename)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("");

    if filename.contains("..") || filename.contains('/') || filename.contains('\\') {
        tracing::warn!("Path traversal attempt detected: {}", filename);
    }

    let sanitized: String = name
        .chars()
        .map(|c| {
            if c.is_control()
                || matches!(c, '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | ';')
            {
                '_'
            } else {
                c
            }
        })
        .collect();

    let sanitized = sanitized.trim();
    if sanitized.is_empty() || sanitized == "." || sanitized == ".." {
        return FALLBACK_FILENAME.to_string();
    }

    // Limit length safely for UTF-8
    if sanitized.len() > MAX_FILENAME_BYTES {
        let mut end = MAX_FILENAME_BYTES;
        while !sanitized.is_char_boundary(end) {
            end -= 1;
        }
        sanitized[..end].to_string()
    } else {
        sanitized.to_string()
    }
}

pub fn encode_path_segment(segment: &str) -> String {
    utf8_percent_encode(segment, PATH_SEGMENT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_id_shape() {
        let id = generate_short_id();
        assert_eq!(id.len(), SHORT_ID_LEN);
        assert!(id.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(id, generate_short_id());
    }

    #[test]
    fn test_storage_key_format() {
        assert_eq!(
            storage_key("x1Y2z3", 1700000000123, "photo.png"),
            "x1Y2z3_1700000000123_photo.png"
        );
    }

    #[test]
    fn test_sanitize_strips_paths() {
        assert_eq!(sanitize_filename("../../../etc/passwd"), "passwd");
        assert_eq!(sanitize_filename("/tmp/report.pdf"), "report.pdf");
        assert_eq!(sanitize_filename("a\\b.txt"), "a_b.txt");
    }

    #[test]
    fn test_sanitize_replaces_reserved_chars() {
        assert_eq!(sanitize_filename("what?.txt"), "what_.txt");
        assert_eq!(sanitize_filename("tab\there.txt"), "tab_here.txt");
        assert_eq!(sanitize_filename("résumé.pdf"), "résumé.pdf");
    }

    #[test]
    fn test_sanitize_fallback() {
        assert_eq!(sanitize_filename(""), "file");
        assert_eq!(sanitize_filename(".."), "file");
        assert_eq!(sanitize_filename("dir/"), "dir");
    }

    #[test]
    fn test_sanitize_truncates_on_char_boundary() {
        let long = "é".repeat(200);
        let sanitized = sanitize_filename(&long);
        assert!(sanitized.len() <= MAX_FILENAME_BYTES);
        assert!(sanitized.chars().all(|c| c == 'é'));
    }

    #[test]
    fn test_encode_path_segment() {
        assert_eq!(encode_path_segment("a_1_b-c.d~e"), "a_1_b-c.d~e");
        assert_eq!(encode_path_segment("a b#c"), "a%20b%23c");
    }
}
