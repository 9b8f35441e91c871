//! Utility functions and helpers.

pub mod markdown;
pub mod naming;

use md5::{Digest, Md5};

/// Lowercase hex MD5 digest of arbitrary bytes.
///
/// Image files, slide assets and cache entries are all addressed by
/// this digest, so names stay stable across runs.
pub fn md5_hex(data: impl AsRef<[u8]>) -> String {
    let mut hasher = Md5::new();
    hasher.update(data.as_ref());
    hex::encode(hasher.finalize())
}
