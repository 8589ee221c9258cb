//! SHA-256 helpers for content-addressing (`contentHash`, §3) and bearer
//! token hashing-at-rest (§4.11). Both use the same digest, different
//! prefixes.

use sha2::{Digest, Sha256};

/// `sha256:` + lowercase hex, stable across encoders (§4.3).
pub fn content_hash(content: &[u8]) -> String {
    let digest = Sha256::digest(content);
    format!("sha256:{digest:x}")
}

/// Hash of a bearer token, stored in place of the token itself.
pub fn token_hash(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    format!("{digest:x}")
}

/// A random, URL-safe bearer token plus the short prefix shown back to
/// the user so they can recognize which token is which (`sk_abcd1234...`).
/// Built from four concatenated UUIDv4s rather than pulling in a
/// dedicated CSPRNG crate -- 128 bits of entropy per UUID is ample for a
/// bearer secret.
pub fn generate_token(prefix_label: &str) -> (String, String) {
    use base64::Engine;

    let mut bytes = Vec::with_capacity(32);
    bytes.extend_from_slice(uuid::Uuid::new_v4().as_bytes());
    bytes.extend_from_slice(uuid::Uuid::new_v4().as_bytes());
    let secret = base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(&bytes);
    let token = format!("{prefix_label}_{secret}");
    let prefix = token.chars().take(12).collect();
    (token, prefix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_hash_known_value() {
        assert_eq!(
            content_hash(b""),
            "sha256:e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn content_hash_is_deterministic() {
        assert_eq!(content_hash(b"skill content"), content_hash(b"skill content"));
    }

    #[test]
    fn token_hash_differs_from_raw_token() {
        let token = "sk_abc123";
        assert_ne!(token_hash(token), token);
        assert_eq!(token_hash(token).len(), 64);
    }

    #[test]
    fn generate_token_has_recognizable_prefix() {
        let (token, prefix) = generate_token("sk");
        assert!(token.starts_with("sk_"));
        assert_eq!(prefix, &token[..12]);
    }
}
