// SPDX-License-Identifier: MIT
//! Binary cache reader
//!
//! `read_header` and `validate` only parse the fixed header and the section
//! directory. `read` seeks to each section through its directory entry and
//! decodes exactly its stored bytes; decoded data never borrows from the
//! blob.

use std::borrow::Cow;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::ReadOptions;
use crate::container::{CacheStats, CacheView};
use crate::error::{CacheError, Result};
use crate::format::{CacheHeader, SchemaVersion, SectionEntry, SectionType};
use crate::geometry::GeometryBundle;
use crate::hash::SourceHash;
use crate::sections;
use crate::store::DataStore;

/// Header plus directory, as returned by [`BinaryCacheReader::read_header`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheHeaderInfo {
    pub header: CacheHeader,
    pub sections: Vec<SectionEntry>,
}

impl CacheHeaderInfo {
    pub fn section(&self, section_type: SectionType) -> Option<&SectionEntry> {
        self.sections
            .iter()
            .find(|e| e.section_type == section_type)
    }

    pub fn source_hash(&self) -> SourceHash {
        SourceHash::from_u64(self.header.source_hash)
    }

    pub fn schema_version(&self) -> Option<SchemaVersion> {
        self.header.schema_version()
    }

    /// Entries whose type this build does not recognize
    pub fn unknown_sections(&self) -> impl Iterator<Item = &SectionEntry> {
        self.sections.iter().filter(|e| !e.section_type.is_known())
    }
}

/// Result of [`BinaryCacheReader::read`]
#[derive(Debug, Clone)]
pub struct CacheReadResult {
    pub data_store: DataStore,
    /// `None` when the blob has no geometry or it was skipped
    pub geometry: Option<GeometryBundle>,
    pub header: CacheHeader,
    /// Unrecognized sections that were stepped over
    pub skipped_sections: Vec<SectionEntry>,
}

/// Decodes cache blobs produced by [`BinaryCacheWriter`](crate::BinaryCacheWriter)
#[derive(Debug, Clone, Default)]
pub struct BinaryCacheReader {
    options: ReadOptions,
}

impl BinaryCacheReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: ReadOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ReadOptions {
        &self.options
    }

    /// Parse header and directory only
    ///
    /// Succeeds on blobs of any version and with corrupt payloads, as long
    /// as the magic, header and directory are intact.
    pub fn read_header(blob: &[u8]) -> Result<CacheHeaderInfo> {
        let view = CacheView::parse(blob)?;
        Ok(CacheHeaderInfo {
            header: *view.header(),
            sections: view.sections().to_vec(),
        })
    }

    /// Whether `blob` was written from exactly `source`
    ///
    /// Returns `Ok(false)` for a stale cache; errors only when the blob
    /// itself is unusable.
    pub fn validate(blob: &[u8], source: &[u8]) -> Result<bool> {
        let header = CacheHeader::from_bytes(blob)?;
        header.validate()?;

        let expected = SourceHash::from_u64(header.source_hash);
        let actual = SourceHash::of(source);
        if expected != actual {
            warn!(
                stored = %expected,
                computed = %actual,
                "Binary cache is stale"
            );
            return Ok(false);
        }
        Ok(true)
    }

    /// Decode the full data store and, unless skipped, the geometry
    pub fn read(&self, blob: &[u8]) -> Result<CacheReadResult> {
        let view = CacheView::parse(blob)?;
        let header = *view.header();
        header.validate()?;
        view.check_bounds()?;
        view.check_unique()?;

        let schema = header.schema_version().ok_or_else(|| {
            CacheError::corrupt(format!("unknown schema code {}", header.schema))
        })?;

        let skipped_sections: Vec<SectionEntry> = view
            .sections()
            .iter()
            .filter(|e| !e.section_type.is_known())
            .copied()
            .collect();
        for entry in &skipped_sections {
            warn!(
                section = %entry.section_type,
                offset = entry.offset,
                size = entry.stored_len(),
                "Skipping unknown cache section"
            );
        }

        let strings = sections::strings::decode(&required(&view, SectionType::Strings)?)?;
        let entities =
            sections::entities::decode(&required(&view, SectionType::Entities)?, &strings)?;
        if entities.len() != header.entity_count as usize {
            return Err(CacheError::corrupt(format!(
                "header declares {} entities, section holds {}",
                header.entity_count,
                entities.len()
            )));
        }
        let properties =
            sections::properties::decode(&required(&view, SectionType::Properties)?, &strings)?;
        let quantities =
            sections::quantities::decode(&required(&view, SectionType::Quantities)?, &strings)?;
        let relationships =
            sections::relationships::decode(&required(&view, SectionType::Relationships)?)?;

        let geometry = if header.has_geometry() && !self.options.skip_geometry {
            Some(sections::geometry::decode(&required(
                &view,
                SectionType::Geometry,
            )?)?)
        } else {
            None
        };

        let data_store = DataStore::from_parts(
            schema,
            strings,
            entities,
            properties,
            quantities,
            relationships,
        );

        info!(
            entities = data_store.entity_count(),
            geometry = geometry.is_some(),
            skipped = skipped_sections.len(),
            bytes = blob.len(),
            "Read binary cache"
        );
        Ok(CacheReadResult {
            data_store,
            geometry,
            header,
            skipped_sections,
        })
    }

    /// [`read`](Self::read) after checking freshness against `source`
    pub fn read_if_fresh(&self, blob: &[u8], source: &[u8]) -> Result<CacheReadResult> {
        if !Self::validate(blob, source)? {
            return Err(CacheError::StaleCache);
        }
        self.read(blob)
    }

    /// Byte accounting from the directory
    pub fn stats(blob: &[u8]) -> Result<CacheStats> {
        Ok(CacheView::parse(blob)?.stats())
    }
}

fn required<'a>(view: &CacheView<'a>, section_type: SectionType) -> Result<Cow<'a, [u8]>> {
    let entry = view
        .entry(section_type)
        .ok_or_else(|| CacheError::corrupt(format!("missing {section_type} section")))?;
    let payload = view.payload(entry)?;
    debug!(
        section = %section_type,
        offset = entry.offset,
        size = payload.len(),
        compressed = entry.is_compressed(),
        "Decoding section"
    );
    Ok(payload)
}
