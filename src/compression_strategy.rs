// SPDX-License-Identifier: MIT
//! Per-section compression policy and the zlib codec behind it
//!
//! Compression is optional. A section is only stored compressed when the
//! policy asks for it *and* deflate actually makes it smaller; otherwise the
//! raw bytes are kept and the directory entry carries no compressed flag.

use serde::{Deserialize, Serialize};

use crate::error::{CacheError, Result};
use crate::format::SectionType;

/// Smallest section worth compressing under [`CompressionStrategy::smart`]
pub const SMART_MIN_BYTES: usize = 4 * 1024;

const ENTROPY_SAMPLE_BYTES: usize = 4096;

/// Cap on the up-front reservation when inflating a section
#[cfg(feature = "compression")]
const MAX_DECOMPRESS_PREALLOC: usize = 64 * 1024 * 1024;

/// Upper bound on deflate's inflated/stored ratio
pub const MAX_INFLATE_RATIO: u64 = 1032;

/// Bits per byte above which a sample is treated as incompressible
const MAX_COMPRESSIBLE_ENTROPY: f64 = 7.0;

/// When the writer deflates a section
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompressionStrategy {
    /// Store every section verbatim
    #[default]
    Never,
    /// Deflate every non-empty section
    Always,
    /// Deflate sections of at least `min_bytes` whose sampled entropy looks
    /// compressible
    Smart { min_bytes: usize },
}

impl CompressionStrategy {
    pub fn smart() -> Self {
        CompressionStrategy::Smart {
            min_bytes: SMART_MIN_BYTES,
        }
    }

    /// Parse `never`, `always` or `smart` (any case)
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "never" | "none" | "off" => Some(CompressionStrategy::Never),
            "always" | "on" => Some(CompressionStrategy::Always),
            "smart" | "auto" => Some(Self::smart()),
            _ => None,
        }
    }

    pub fn is_enabled(&self) -> bool {
        !matches!(self, CompressionStrategy::Never)
    }

    /// Whether `data` should be attempted with deflate
    pub fn should_compress(&self, data: &[u8]) -> bool {
        match *self {
            CompressionStrategy::Never => false,
            CompressionStrategy::Always => !data.is_empty(),
            CompressionStrategy::Smart { min_bytes } => {
                data.len() >= min_bytes.max(1) && looks_compressible(data)
            }
        }
    }
}

fn looks_compressible(data: &[u8]) -> bool {
    let sample = &data[..data.len().min(ENTROPY_SAMPLE_BYTES)];
    calculate_entropy(sample) < MAX_COMPRESSIBLE_ENTROPY
}

/// Shannon entropy of `data` in bits per byte
fn calculate_entropy(data: &[u8]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }

    let mut counts = [0u32; 256];
    for &byte in data {
        counts[byte as usize] += 1;
    }

    let len = data.len() as f64;
    counts
        .iter()
        .filter(|&&count| count > 0)
        .map(|&count| {
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Deflate a section payload with the fast zlib level
#[cfg(feature = "compression")]
pub(crate) fn compress(data: &[u8]) -> Result<Vec<u8>> {
    use flate2::write::ZlibEncoder;
    use flate2::Compression;
    use std::io::Write;

    let estimated = (data.len().saturating_mul(6) / 10).max(256);
    let mut encoder = ZlibEncoder::new(Vec::with_capacity(estimated), Compression::fast());
    encoder
        .write_all(data)
        .map_err(|e| CacheError::Compression(format!("write failed: {e}")))?;
    encoder
        .finish()
        .map_err(|e| CacheError::Compression(format!("finish failed: {e}")))
}

#[cfg(not(feature = "compression"))]
pub(crate) fn compress(_data: &[u8]) -> Result<Vec<u8>> {
    Err(CacheError::Compression(
        "built without the `compression` feature".to_string(),
    ))
}

/// Inflate a stored section that must decode to exactly `expected_len` bytes
#[cfg(feature = "compression")]
pub(crate) fn decompress(
    data: &[u8],
    expected_len: usize,
    section: SectionType,
) -> Result<Vec<u8>> {
    use flate2::read::ZlibDecoder;
    use std::io::Read;

    let prealloc = expected_len.min(MAX_DECOMPRESS_PREALLOC);
    let mut out = Vec::new();
    out.try_reserve_exact(prealloc)
        .map_err(|_| CacheError::AllocationFailure {
            requested: prealloc,
        })?;

    // One byte past the expected size is enough to detect an oversized stream
    let limit = (expected_len as u64).saturating_add(1);
    ZlibDecoder::new(data)
        .take(limit)
        .read_to_end(&mut out)
        .map_err(|e| CacheError::Decompression(format!("{section}: {e}")))?;

    if out.len() != expected_len {
        return Err(CacheError::Decompression(format!(
            "{section}: expected {expected_len} bytes, inflated {}",
            out.len()
        )));
    }
    Ok(out)
}

#[cfg(not(feature = "compression"))]
pub(crate) fn decompress(
    _data: &[u8],
    _expected_len: usize,
    section: SectionType,
) -> Result<Vec<u8>> {
    Err(CacheError::UnsupportedCompression(section))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        assert_eq!(CompressionStrategy::parse("never"), Some(CompressionStrategy::Never));
        assert_eq!(CompressionStrategy::parse("ALWAYS"), Some(CompressionStrategy::Always));
        assert_eq!(
            CompressionStrategy::parse(" smart "),
            Some(CompressionStrategy::Smart {
                min_bytes: SMART_MIN_BYTES
            })
        );
        assert_eq!(CompressionStrategy::parse("zstd"), None);
    }

    #[test]
    fn test_never_and_always() {
        let data = vec![b'a'; 64];
        assert!(!CompressionStrategy::Never.should_compress(&data));
        assert!(CompressionStrategy::Always.should_compress(&data));
        assert!(!CompressionStrategy::Always.should_compress(&[]));
    }

    #[test]
    fn test_smart_respects_threshold() {
        let strategy = CompressionStrategy::Smart { min_bytes: 1024 };
        assert!(!strategy.should_compress(&vec![0u8; 1023]));
        assert!(strategy.should_compress(&vec![0u8; 1024]));
    }

    #[test]
    fn test_smart_skips_high_entropy() {
        // Every byte value equally often: 8 bits of entropy
        let data: Vec<u8> = (0..8192u32).map(|i| (i % 256) as u8).collect();
        assert!(calculate_entropy(&data) > 7.9);
        assert!(!CompressionStrategy::Smart { min_bytes: 16 }.should_compress(&data));
    }

    #[test]
    fn test_entropy_bounds() {
        assert_eq!(calculate_entropy(&[]), 0.0);
        assert_eq!(calculate_entropy(&[7; 100]), 0.0);
        assert!((calculate_entropy(&[0, 1, 0, 1]) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_serde_representation() {
        let json = serde_json::to_string(&CompressionStrategy::smart()).unwrap();
        assert_eq!(json, r#"{"smart":{"min_bytes":4096}}"#);
        let parsed: CompressionStrategy = serde_json::from_str(r#""always""#).unwrap();
        assert_eq!(parsed, CompressionStrategy::Always);
    }

    #[cfg(feature = "compression")]
    #[test]
    fn test_deflate_round_trip() {
        let data = b"IfcWallStandardCase ".repeat(200);
        let packed = compress(&data).unwrap();
        assert!(packed.len() < data.len());
        assert_eq!(
            decompress(&packed, data.len(), SectionType::Strings).unwrap(),
            data
        );
    }

    #[cfg(feature = "compression")]
    #[test]
    fn test_decompress_length_mismatch() {
        let data = vec![1u8; 500];
        let packed = compress(&data).unwrap();
        let short = decompress(&packed, 499, SectionType::Entities);
        let long = decompress(&packed, 501, SectionType::Entities);
        assert!(matches!(short, Err(CacheError::Decompression(_))));
        assert!(matches!(long, Err(CacheError::Decompression(_))));
    }

    #[cfg(feature = "compression")]
    #[test]
    fn test_decompress_unbounded_expected_len() {
        let packed = compress(&[7u8; 64]).unwrap();
        let result = decompress(&packed, usize::MAX, SectionType::Strings);
        assert!(matches!(result, Err(CacheError::Decompression(_))));
    }

    #[cfg(feature = "compression")]
    #[test]
    fn test_decompress_garbage() {
        let result = decompress(&[0xde, 0xad, 0xbe, 0xef], 16, SectionType::Geometry);
        assert!(matches!(result, Err(CacheError::Decompression(_))));
    }

    #[cfg(not(feature = "compression"))]
    #[test]
    fn test_decompress_unsupported() {
        let result = decompress(&[0x78, 0x01], 1, SectionType::Properties);
        assert!(matches!(
            result,
            Err(CacheError::UnsupportedCompression(SectionType::Properties))
        ));
    }
}
