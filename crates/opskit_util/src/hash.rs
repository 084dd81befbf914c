//! One-way string hashing for tokenized identifiers.

use sha2::{Digest, Sha256};

/// SHA-256 hex digest of `text`.
pub fn sha256_hex(text: &str) -> String {
    let digest = Sha256::digest(text.as_bytes());
    format!("{digest:x}")
}
