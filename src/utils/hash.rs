use sha2::{Digest, Sha256};

/// Content fingerprint of an exam file: lowercase hex SHA-256 of the raw bytes.
pub fn fingerprint(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}
