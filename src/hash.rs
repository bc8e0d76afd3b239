// SPDX-License-Identifier: MIT
//! Source fingerprint used to detect stale caches
//!
//! xxh64 is a fast non-cryptographic hash. It detects edits to the source
//! model file; it offers no resistance to deliberately constructed
//! collisions and must not be used as a content address.

use std::fmt;

use serde::Serialize;
use xxhash_rust::xxh64::xxh64;

/// Seed for the source hash; changing it invalidates every existing cache
pub const SOURCE_HASH_SEED: u64 = 0;

/// 64-bit fingerprint of the original source bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct SourceHash(u64);

impl SourceHash {
    /// Hash the complete source byte sequence
    pub fn of(source: &[u8]) -> Self {
        Self(xxh64(source, SOURCE_HASH_SEED))
    }

    pub fn from_u64(value: u64) -> Self {
        Self(value)
    }

    #[inline]
    pub fn value(self) -> u64 {
        self.0
    }

    /// Big-endian hex form (16 characters)
    pub fn to_hex(self) -> String {
        hex::encode(self.0.to_be_bytes())
    }
}

impl fmt::Display for SourceHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}
