use sha2::{Digest, Sha256};

/// SHA-256 of a policy's content, hex encoded
pub fn hash_content(content: &str) -> String {
    hex::encode(Sha256::digest(content.as_bytes()))
}

/// Short form used in log lines (first 8 hex chars)
pub fn short_hash(hash: &str) -> &str {
    hash.get(..8).unwrap_or(hash)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_content() {
        let hash = hash_content("Hello, World!");

        assert_eq!(hash.len(), 64);
        assert_eq!(
            hash,
            "dffd6021bb2bd5b0af676290809ec3a53191dd81c7f70a4b28688a362182986f"
        );
    }

    #[test]
    fn test_short_hash() {
        assert_eq!(short_hash("abc123def456789"), "abc123de");
        assert_eq!(short_hash("abc"), "abc");
    }
}
