//! Content hashing for chunk change detection

use sha2::{Digest, Sha256};

/// Length of a [`content_hash`] digest in hex characters
pub const HASH_HEX_LEN: usize = 64;

/// SHA-256 of the UTF-8 bytes of `text`, as lowercase hex
pub fn content_hash(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    hex::encode(hasher.finalize())
}
