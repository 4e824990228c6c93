//! Input validation utilities.
//!
//! Store keys end up as directory and file names in the file-backed tag store, so they are
//! validated before any store operation touches the filesystem.

use crate::constants::MAX_KEY_SEGMENT_LEN;
use crate::{MatchingError, MatchingResult};

/// Validates that a store key segment (namespace or key) is safe to use as a file name.
///
/// - Rejects empty or whitespace-only strings
/// - Bounds the length to avoid pathological inputs
/// - Restricts characters to a conservative ASCII set
/// - Rejects leading dots, which rules out `.` and `..` as well as hidden files
///
/// # Errors
///
/// Returns a `MatchingError::InvalidInput` if the segment is invalid.
pub fn validate_key_segment(label: &str, segment: &str) -> MatchingResult<()> {
    if segment.trim().is_empty() {
        return Err(MatchingError::InvalidInput(format!(
            "{label} cannot be empty"
        )));
    }

    if segment.len() > MAX_KEY_SEGMENT_LEN {
        return Err(MatchingError::InvalidInput(format!(
            "{label} exceeds maximum length of {} characters",
            MAX_KEY_SEGMENT_LEN
        )));
    }

    if !segment.is_ascii() {
        return Err(MatchingError::InvalidInput(format!(
            "{label} must contain only ASCII characters"
        )));
    }

    let ok = segment
        .bytes()
        .all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'z' | b'A'..=b'Z' | b'.' | b'-' | b'_'));

    if !ok {
        return Err(MatchingError::InvalidInput(format!(
            "{label} contains invalid characters (only alphanumeric, '.', '-', '_' allowed)"
        )));
    }

    if segment.starts_with('.') {
        return Err(MatchingError::InvalidInput(format!(
            "{label} must not start with '.'"
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_valid_segments() {
        assert!(validate_key_segment("key", "applied_tags").is_ok());
        assert!(validate_key_segment("key", "patient-42.v1").is_ok());
        assert!(validate_key_segment("key", "a").is_ok());
    }

    #[test]
    fn rejects_empty_segment() {
        let err = validate_key_segment("namespace", "").expect_err("should reject empty");
        assert!(
            matches!(err, MatchingError::InvalidInput(msg) if msg == "namespace cannot be empty")
        );
    }

    #[test]
    fn rejects_too_long_segment() {
        let long = "a".repeat(MAX_KEY_SEGMENT_LEN + 1);
        let err = validate_key_segment("key", &long).expect_err("should reject too long");
        assert!(
            matches!(err, MatchingError::InvalidInput(msg) if msg.contains("exceeds maximum length"))
        );
    }

    #[test]
    fn rejects_non_ascii() {
        let err = validate_key_segment("key", "anamnése").expect_err("should reject non-ASCII");
        assert!(
            matches!(err, MatchingError::InvalidInput(msg) if msg.contains("must contain only ASCII"))
        );
    }

    #[test]
    fn rejects_path_separators_and_spaces() {
        for bad in ["a/b", "a\\b", "a b", "a:b"] {
            let err = validate_key_segment("key", bad).expect_err("should reject");
            assert!(
                matches!(err, MatchingError::InvalidInput(msg) if msg.contains("invalid characters"))
            );
        }
    }

    #[test]
    fn rejects_dot_prefixed_segments() {
        for bad in [".", "..", ".hidden"] {
            let err = validate_key_segment("key", bad).expect_err("should reject");
            assert!(
                matches!(err, MatchingError::InvalidInput(msg) if msg.contains("must not start with '.'"))
            );
        }
    }
}
