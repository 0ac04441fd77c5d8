//! Digests over manifests and cached bodies.

use sha2::{Digest, Sha256};

use super::key::RequestKey;

/// Compute a digest of an ordered asset manifest.
///
/// Two manifests with the same keys in the same order produce the same digest.
pub fn manifest_digest(manifest: &[RequestKey]) -> String {
    let mut hasher = Sha256::new();
    for key in manifest {
        hasher.update(key.as_str().as_bytes());
        hasher.update(b"\n");
    }
    hex::encode(hasher.finalize())
}

/// Compute the SHA-256 of a response body.
pub fn body_digest(body: &[u8]) -> String {
    hex::encode(Sha256::digest(body))
}
