// SPDX-License-Identifier: MIT
//! Error taxonomy shared by the cache writer and reader

use crate::format::SectionType;

/// Errors surfaced by cache writing, reading and validation
///
/// Every variant is a distinct, caller-visible outcome so the calling layer
/// can decide whether to discard the blob and re-derive the data store.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// Source bytes changed since the cache was written
    #[error("Stale cache: source hash does not match")]
    StaleCache,

    #[error("Unsupported cache version: expected {supported}, got {found}")]
    VersionMismatch { found: u32, supported: u32 },

    #[error("Corrupt cache format: {0}")]
    CorruptFormat(String),

    #[error("Failed to allocate {requested} bytes for cache buffer")]
    AllocationFailure { requested: usize },

    /// Writer input that has no valid encoding
    #[error("Cannot encode cache: {0}")]
    Unencodable(String),

    /// Encoder produced a different number of bytes than it reserved
    #[error("Section layout mismatch: expected {expected} bytes, got {actual}")]
    Layout { expected: usize, actual: usize },

    #[error("Section {0} is compressed but compression support is not enabled")]
    UnsupportedCompression(SectionType),

    #[error("Compression error: {0}")]
    Compression(String),

    #[error("Decompression error: {0}")]
    Decompression(String),
}

impl CacheError {
    pub(crate) fn corrupt(detail: impl Into<String>) -> Self {
        CacheError::CorruptFormat(detail.into())
    }

    /// Whether the caller should discard the blob and re-derive from source
    pub fn requires_rebuild(&self) -> bool {
        matches!(
            self,
            CacheError::StaleCache
                | CacheError::VersionMismatch { .. }
                | CacheError::CorruptFormat(_)
                | CacheError::UnsupportedCompression(_)
                | CacheError::Decompression(_)
        )
    }
}

pub type Result<T, E = CacheError> = std::result::Result<T, E>;
