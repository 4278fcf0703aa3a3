//! Request cache-key generation.

use sha2::{Digest, Sha256};

/// Compute a cache key over the full request identity.
///
/// `vary` is the joined value of headers that participate in identity;
/// empty today, kept in the key so adding one later does not silently
/// alias old entries.
pub fn request_key(method: &str, url: &str, vary: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(method.to_ascii_uppercase().as_bytes());
    hasher.update(b"\n");
    hasher.update(url.as_bytes());
    hasher.update(b"\n");
    hasher.update(vary.as_bytes());
    hex::encode(hasher.finalize())
}
