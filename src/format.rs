// SPDX-License-Identifier: MIT
//! IFC binary cache format definition
//!
//! Defines the fixed-size header, the section directory entries and the
//! flag constants shared by the writer and the reader.

use std::fmt;

use serde::Serialize;

use crate::buffer::{ByteReader, ByteWriter};
use crate::error::{CacheError, Result};

/// Cache format magic ("IFCB" read as a little-endian u32)
pub const CACHE_MAGIC: u32 = u32::from_le_bytes(*b"IFCB");

/// Cache format version understood by this reader
pub const CACHE_VERSION: u32 = 1;

/// Header size in bytes
pub const HEADER_SIZE: usize = 40;

/// Size of one section directory entry in bytes
pub const SECTION_ENTRY_SIZE: usize = 32;

/// Header flags
pub mod flags {
    /// No optional content
    pub const NONE: u32 = 0x0000_0000;

    /// A geometry section is present
    pub const HAS_GEOMETRY: u32 = 0x0000_0001;

    /// Relationship edges are sufficient to rebuild the spatial hierarchy
    pub const HAS_SPATIAL: u32 = 0x0000_0002;
}

/// Per-section flags stored in the directory
pub mod section_flags {
    /// Payload stored verbatim
    pub const NONE: u32 = 0x0000_0000;

    /// Payload is zlib-compressed; `compressed_size` bytes are stored
    pub const COMPRESSED: u32 = 0x0000_0001;
}

/// Dialect of the source model the stored data obeys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum SchemaVersion {
    Ifc2x3,
    #[default]
    Ifc4,
    Ifc4x3,
    Ifc5,
}

impl SchemaVersion {
    pub fn code(self) -> u32 {
        match self {
            SchemaVersion::Ifc2x3 => 0,
            SchemaVersion::Ifc4 => 1,
            SchemaVersion::Ifc4x3 => 2,
            SchemaVersion::Ifc5 => 3,
        }
    }

    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            0 => Some(SchemaVersion::Ifc2x3),
            1 => Some(SchemaVersion::Ifc4),
            2 => Some(SchemaVersion::Ifc4x3),
            3 => Some(SchemaVersion::Ifc5),
            _ => None,
        }
    }

    /// Schema identifier as written in a STEP file header
    pub fn name(self) -> &'static str {
        match self {
            SchemaVersion::Ifc2x3 => "IFC2X3",
            SchemaVersion::Ifc4 => "IFC4",
            SchemaVersion::Ifc4x3 => "IFC4X3",
            SchemaVersion::Ifc5 => "IFC5",
        }
    }
}

/// Section types in the cache
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SectionType {
    /// Interned string pool
    Strings,

    /// Columnar entity table
    Entities,

    /// Property set rows
    Properties,

    /// Quantity set rows
    Quantities,

    /// Typed relationship edges
    Relationships,

    /// Tessellated meshes and coordinate normalization
    Geometry,

    /// A section written by a newer writer; skipped by this reader
    Unknown(u32),
}

impl SectionType {
    /// Known section types in write order
    pub fn all() -> &'static [SectionType] {
        &[
            SectionType::Strings,
            SectionType::Entities,
            SectionType::Properties,
            SectionType::Quantities,
            SectionType::Relationships,
            SectionType::Geometry,
        ]
    }

    pub fn code(self) -> u32 {
        match self {
            SectionType::Strings => 0,
            SectionType::Entities => 1,
            SectionType::Properties => 2,
            SectionType::Quantities => 3,
            SectionType::Relationships => 4,
            SectionType::Geometry => 5,
            SectionType::Unknown(code) => code,
        }
    }

    pub fn from_code(code: u32) -> Self {
        match code {
            0 => SectionType::Strings,
            1 => SectionType::Entities,
            2 => SectionType::Properties,
            3 => SectionType::Quantities,
            4 => SectionType::Relationships,
            5 => SectionType::Geometry,
            other => SectionType::Unknown(other),
        }
    }

    /// Get the name of the section
    pub fn name(&self) -> &'static str {
        match self {
            SectionType::Strings => "strings",
            SectionType::Entities => "entities",
            SectionType::Properties => "properties",
            SectionType::Quantities => "quantities",
            SectionType::Relationships => "relationships",
            SectionType::Geometry => "geometry",
            SectionType::Unknown(_) => "unknown",
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, SectionType::Unknown(_))
    }
}

impl fmt::Display for SectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SectionType::Unknown(code) => write!(f, "unknown({code})"),
            known => f.write_str(known.name()),
        }
    }
}

/// Cache header (40 bytes, little-endian)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheHeader {
    /// Magic: "IFCB"
    pub magic: u32,

    /// Format version (currently 1)
    pub version: u32,

    /// Header flags, see [`flags`]
    pub flags: u32,

    /// xxh64 of the original source bytes
    pub source_hash: u64,

    /// Raw schema code, see [`SchemaVersion`]
    pub schema: u32,

    pub entity_count: u32,
    pub total_vertices: u32,
    pub total_triangles: u32,
    pub section_count: u32,
}

impl CacheHeader {
    /// Create a header for the current format version with no content
    pub fn new() -> Self {
        Self {
            magic: CACHE_MAGIC,
            version: CACHE_VERSION,
            flags: flags::NONE,
            source_hash: 0,
            schema: SchemaVersion::default().code(),
            entity_count: 0,
            total_vertices: 0,
            total_triangles: 0,
            section_count: 0,
        }
    }

    /// Parse the header from the start of `bytes`
    ///
    /// Only checks that enough bytes are present; call [`validate`](Self::validate)
    /// to check magic and version.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_SIZE {
            return Err(CacheError::corrupt(format!(
                "header must be {} bytes, got {}",
                HEADER_SIZE,
                bytes.len()
            )));
        }

        let mut r = ByteReader::new(&bytes[..HEADER_SIZE]);
        Ok(Self {
            magic: r.read_u32()?,
            version: r.read_u32()?,
            flags: r.read_u32()?,
            source_hash: r.read_u64()?,
            schema: r.read_u32()?,
            entity_count: r.read_u32()?,
            total_vertices: r.read_u32()?,
            total_triangles: r.read_u32()?,
            section_count: r.read_u32()?,
        })
    }

    /// Check magic and version (fast path)
    pub fn validate(&self) -> Result<()> {
        self.check_magic()?;

        if self.version != CACHE_VERSION {
            return Err(CacheError::VersionMismatch {
                found: self.version,
                supported: CACHE_VERSION,
            });
        }

        Ok(())
    }

    pub(crate) fn check_magic(&self) -> Result<()> {
        if self.magic != CACHE_MAGIC {
            return Err(CacheError::corrupt(format!(
                "invalid magic: expected {:#010x}, got {:#010x}",
                CACHE_MAGIC, self.magic
            )));
        }
        Ok(())
    }

    #[inline]
    pub fn has_flag(&self, flag: u32) -> bool {
        (self.flags & flag) != 0
    }

    #[inline]
    pub fn has_geometry(&self) -> bool {
        self.has_flag(flags::HAS_GEOMETRY)
    }

    #[inline]
    pub fn has_spatial(&self) -> bool {
        self.has_flag(flags::HAS_SPATIAL)
    }

    pub fn schema_version(&self) -> Option<SchemaVersion> {
        SchemaVersion::from_code(self.schema)
    }

    /// Byte length of the header plus the section directory
    pub fn directory_end(&self) -> u64 {
        HEADER_SIZE as u64 + self.section_count as u64 * SECTION_ENTRY_SIZE as u64
    }

    pub(crate) fn write_to(&self, w: &mut ByteWriter) -> Result<()> {
        w.put_u32(self.magic)?;
        w.put_u32(self.version)?;
        w.put_u32(self.flags)?;
        w.put_u64(self.source_hash)?;
        w.put_u32(self.schema)?;
        w.put_u32(self.entity_count)?;
        w.put_u32(self.total_vertices)?;
        w.put_u32(self.total_triangles)?;
        w.put_u32(self.section_count)
    }
}

impl Default for CacheHeader {
    fn default() -> Self {
        Self::new()
    }
}

/// One entry of the section directory (32 bytes, little-endian)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SectionEntry {
    pub section_type: SectionType,

    /// Section flags, see [`section_flags`]
    pub flags: u32,

    /// Absolute offset from the start of the blob
    pub offset: u64,

    /// Decoded payload size
    pub size: u64,

    /// Stored size when compressed, 0 otherwise
    pub compressed_size: u64,
}

impl SectionEntry {
    pub fn new(section_type: SectionType, offset: u64, size: u64) -> Self {
        Self {
            section_type,
            flags: section_flags::NONE,
            offset,
            size,
            compressed_size: 0,
        }
    }

    #[inline]
    pub fn is_compressed(&self) -> bool {
        (self.flags & section_flags::COMPRESSED) != 0
    }

    /// Number of bytes the section occupies in the blob
    #[inline]
    pub fn stored_len(&self) -> u64 {
        if self.is_compressed() {
            self.compressed_size
        } else {
            self.size
        }
    }

    /// End offset of the stored bytes, `None` on overflow
    #[inline]
    pub fn end(&self) -> Option<u64> {
        self.offset.checked_add(self.stored_len())
    }

    pub(crate) fn read_from(r: &mut ByteReader<'_>) -> Result<Self> {
        Ok(Self {
            section_type: SectionType::from_code(r.read_u32()?),
            flags: r.read_u32()?,
            offset: r.read_u64()?,
            size: r.read_u64()?,
            compressed_size: r.read_u64()?,
        })
    }

    pub(crate) fn write_to(&self, w: &mut ByteWriter) -> Result<()> {
        w.put_u32(self.section_type.code())?;
        w.put_u32(self.flags)?;
        w.put_u64(self.offset)?;
        w.put_u64(self.size)?;
        w.put_u64(self.compressed_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header_bytes(header: &CacheHeader) -> Vec<u8> {
        let mut w = ByteWriter::with_exact_capacity(HEADER_SIZE).unwrap();
        header.write_to(&mut w).unwrap();
        w.finish().unwrap()
    }

    #[test]
    fn test_header_new() {
        let header = CacheHeader::new();
        assert!(header.validate().is_ok());
        assert!(!header.has_geometry());
        assert!(!header.has_spatial());
        assert_eq!(header.schema_version(), Some(SchemaVersion::Ifc4));
    }

    #[test]
    fn test_header_layout() {
        let mut header = CacheHeader::new();
        header.flags = flags::HAS_GEOMETRY;
        header.source_hash = 0x0102_0304_0506_0708;
        header.entity_count = 5;
        header.section_count = 6;

        let bytes = header_bytes(&header);
        assert_eq!(bytes.len(), HEADER_SIZE);
        assert_eq!(&bytes[0..4], b"IFCB");
        assert_eq!(&bytes[4..8], &CACHE_VERSION.to_le_bytes());
        assert_eq!(&bytes[12..20], &0x0102_0304_0506_0708u64.to_le_bytes());
        assert_eq!(&bytes[36..40], &6u32.to_le_bytes());

        let parsed = CacheHeader::from_bytes(&bytes).unwrap();
        assert_eq!(parsed, header);
    }

    #[test]
    fn test_header_validate_invalid_magic() {
        let mut header = CacheHeader::new();
        header.magic = 0;
        assert!(matches!(
            header.validate(),
            Err(CacheError::CorruptFormat(_))
        ));
    }

    #[test]
    fn test_header_validate_invalid_version() {
        let mut header = CacheHeader::new();
        header.version = 999;
        assert!(matches!(
            header.validate(),
            Err(CacheError::VersionMismatch {
                found: 999,
                supported: CACHE_VERSION
            })
        ));
    }

    #[test]
    fn test_header_too_short() {
        assert!(CacheHeader::from_bytes(&[0u8; 16]).is_err());
    }

    #[test]
    fn test_directory_end() {
        let mut header = CacheHeader::new();
        header.section_count = 5;
        assert_eq!(
            header.directory_end(),
            (HEADER_SIZE + 5 * SECTION_ENTRY_SIZE) as u64
        );
    }

    #[test]
    fn test_section_entry_stored_len() {
        let mut entry = SectionEntry::new(SectionType::Geometry, 100, 400);
        assert_eq!(entry.stored_len(), 400);
        assert_eq!(entry.end(), Some(500));

        entry.flags = section_flags::COMPRESSED;
        entry.compressed_size = 120;
        assert!(entry.is_compressed());
        assert_eq!(entry.stored_len(), 120);
        assert_eq!(entry.end(), Some(220));
    }

    #[test]
    fn test_section_type_codes() {
        for &ty in SectionType::all() {
            assert_eq!(SectionType::from_code(ty.code()), ty);
            assert!(ty.is_known());
        }
        assert_eq!(SectionType::from_code(42), SectionType::Unknown(42));
        assert_eq!(SectionType::Unknown(42).to_string(), "unknown(42)");
        assert_eq!(SectionType::Geometry.to_string(), "geometry");
    }

    #[test]
    fn test_schema_codes() {
        for schema in [
            SchemaVersion::Ifc2x3,
            SchemaVersion::Ifc4,
            SchemaVersion::Ifc4x3,
            SchemaVersion::Ifc5,
        ] {
            assert_eq!(SchemaVersion::from_code(schema.code()), Some(schema));
        }
        assert_eq!(SchemaVersion::from_code(17), None);
        assert_eq!(SchemaVersion::Ifc4x3.name(), "IFC4X3");
    }
}
