use sha2::{Digest, Sha256};

/// Content-derived message id: lowercase hex SHA-256 of the payload, so
/// republishing the same payload yields the same id.
pub fn message_id(payload: &[u8]) -> String {
    format!("{:x}", Sha256::digest(payload))
}
