//! Checksum calculation for calendar change detection.

use sha2::{Digest, Sha256};

/// Calculate the SHA-256 checksum of a calendar document.
///
/// # Returns
/// Hexadecimal string representation of the SHA-256 hash.
pub fn calculate_checksum(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let result = hasher.finalize();
    hex::encode(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checksum_consistency() {
        let content = "BEGIN:VCALENDAR\r\nEND:VCALENDAR\r\n";
        assert_eq!(calculate_checksum(content), calculate_checksum(content));
    }

    #[test]
    fn test_different_content_different_checksum() {
        let checksum1 = calculate_checksum("LOCATION:А-301 (В-78)");
        let checksum2 = calculate_checksum("LOCATION:А-302 (В-78)");
        assert_ne!(checksum1, checksum2);
    }

    #[test]
    fn test_known_digest() {
        assert_eq!(
            calculate_checksum(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
