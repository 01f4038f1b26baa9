//! Content fingerprinting for configuration values
//!
//! The fingerprint is used only for equality checks: detecting no-op saves,
//! idempotent publishes, and letting polling clients verify they hold the
//! latest value without transferring the body. It is not a security
//! mechanism.
//!
//! Uses SHA-256, rendered as lowercase hex.

use sha2::{Digest, Sha256};

/// Computes the content fingerprint of a configuration value.
///
/// This function is deterministic: the same input always produces the same
/// output, across processes and machines.
pub fn fingerprint(value: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(value.as_bytes());
    let digest = hasher.finalize();
    let mut out = String::with_capacity(digest.len() * 2);
    for byte in digest {
        out.push_str(&format!("{:02x}", byte));
    }
    out
}

/// Verifies that a value matches an expected fingerprint.
pub fn verify_fingerprint(value: &str, expected: &str) -> bool {
    fingerprint(value) == expected
}
