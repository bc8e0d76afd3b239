// SPDX-License-Identifier: MIT
//! Binary cache writer
//!
//! Two passes: every section is encoded into its own exactly-sized buffer
//! (and optionally deflated), then offsets are laid out back to back after
//! the header and directory and everything is copied into one output
//! buffer allocated once at its final size.

use tracing::{debug, info};

use crate::buffer::ByteWriter;
use crate::compression_strategy;
use crate::config::WriteOptions;
use crate::error::{CacheError, Result};
use crate::format::{
    flags, section_flags, CacheHeader, SectionEntry, SectionType, HEADER_SIZE, SECTION_ENTRY_SIZE,
};
use crate::geometry::GeometryBundle;
use crate::hash::SourceHash;
use crate::sections;
use crate::store::DataStore;

/// One encoded section awaiting layout
struct EncodedSection {
    section_type: SectionType,
    /// Bytes as stored in the blob
    bytes: Vec<u8>,
    /// Decoded length
    size: u64,
    compressed: bool,
}

/// Serializes a [`DataStore`] and optional geometry into a cache blob
#[derive(Debug, Clone, Default)]
pub struct BinaryCacheWriter {
    options: WriteOptions,
}

impl BinaryCacheWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: WriteOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &WriteOptions {
        &self.options
    }

    /// Write `store` (and `geometry` when supplied and enabled) into a new blob
    ///
    /// `source` is only hashed. Output is deterministic for identical inputs.
    pub fn write(
        &self,
        store: &DataStore,
        geometry: Option<&GeometryBundle>,
        source: &[u8],
    ) -> Result<Vec<u8>> {
        let source_hash = SourceHash::of(source);
        let geometry = geometry.filter(|_| self.options.include_geometry);

        let strings = store.strings();
        let mut encoded = vec![
            self.encode_section(
                SectionType::Strings,
                sections::strings::encoded_len(strings),
                |w| sections::strings::encode(strings, w),
            )?,
            self.encode_section(
                SectionType::Entities,
                sections::entities::encoded_len(store.entity_table()),
                |w| sections::entities::encode(store.entity_table(), w),
            )?,
            self.encode_section(
                SectionType::Properties,
                sections::properties::encoded_len(store.property_table()),
                |w| sections::properties::encode(store.property_table(), w),
            )?,
            self.encode_section(
                SectionType::Quantities,
                sections::quantities::encoded_len(store.quantity_table()),
                |w| sections::quantities::encode(store.quantity_table(), w),
            )?,
            self.encode_section(
                SectionType::Relationships,
                sections::relationships::encoded_len(store.relationships()),
                |w| sections::relationships::encode(store.relationships(), w),
            )?,
        ];
        if let Some(bundle) = geometry {
            encoded.push(self.encode_section(
                SectionType::Geometry,
                sections::geometry::encoded_len(bundle),
                |w| sections::geometry::encode(bundle, w),
            )?);
        }

        let mut header = CacheHeader::new();
        header.source_hash = source_hash.value();
        header.schema = store.schema().code();
        header.entity_count = u32::try_from(store.entity_count()).map_err(|_| {
            CacheError::Unencodable(format!(
                "{} entities exceed the u32 header field",
                store.entity_count()
            ))
        })?;
        header.section_count = encoded.len() as u32;
        if let Some(bundle) = geometry {
            header.flags |= flags::HAS_GEOMETRY;
            header.total_vertices = bundle.total_vertices;
            header.total_triangles = bundle.total_triangles;
        }
        if self.options.include_spatial_hierarchy {
            header.flags |= flags::HAS_SPATIAL;
        }

        let directory = layout(&encoded);
        let total = directory
            .last()
            .and_then(SectionEntry::end)
            .unwrap_or(header.directory_end());
        let total = usize::try_from(total).map_err(|_| CacheError::AllocationFailure {
            requested: usize::MAX,
        })?;

        let mut w = ByteWriter::with_exact_capacity(total)?;
        header.write_to(&mut w)?;
        for entry in &directory {
            entry.write_to(&mut w)?;
        }
        for section in &encoded {
            w.put_bytes(&section.bytes)?;
        }
        let blob = w.finish()?;

        info!(
            entities = header.entity_count,
            sections = header.section_count,
            geometry = geometry.is_some(),
            bytes = blob.len(),
            source_hash = %source_hash,
            "Wrote binary cache"
        );
        Ok(blob)
    }

    fn encode_section<F>(
        &self,
        section_type: SectionType,
        len: usize,
        encode: F,
    ) -> Result<EncodedSection>
    where
        F: FnOnce(&mut ByteWriter) -> Result<()>,
    {
        let mut w = ByteWriter::with_exact_capacity(len)?;
        encode(&mut w)?;
        let raw = w.finish()?;
        let size = raw.len() as u64;

        if self.options.compression.should_compress(&raw) {
            let packed = compression_strategy::compress(&raw)?;
            if packed.len() < raw.len() {
                debug!(
                    section = %section_type,
                    size,
                    stored = packed.len(),
                    "Encoded section (compressed)"
                );
                return Ok(EncodedSection {
                    section_type,
                    bytes: packed,
                    size,
                    compressed: true,
                });
            }
        }

        debug!(section = %section_type, size, "Encoded section");
        Ok(EncodedSection {
            section_type,
            bytes: raw,
            size,
            compressed: false,
        })
    }
}

/// Directory entries for sections placed back to back after the directory
fn layout(encoded: &[EncodedSection]) -> Vec<SectionEntry> {
    let mut offset = (HEADER_SIZE + encoded.len() * SECTION_ENTRY_SIZE) as u64;
    encoded
        .iter()
        .map(|section| {
            let mut entry = SectionEntry::new(section.section_type, offset, section.size);
            if section.compressed {
                entry.flags |= section_flags::COMPRESSED;
                entry.compressed_size = section.bytes.len() as u64;
            }
            offset += section.bytes.len() as u64;
            entry
        })
        .collect()
}
