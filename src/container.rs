// SPDX-License-Identifier: MIT
//! Borrowed view over a cache blob
//!
//! Parses the header and section directory once and hands out section
//! byte ranges by offset arithmetic alone; payload bytes are only touched
//! when a caller asks for a specific section.

use std::borrow::Cow;
use std::collections::HashSet;

use serde::Serialize;

use crate::buffer::ByteReader;
use crate::compression_strategy;
use crate::error::{CacheError, Result};
use crate::format::{CacheHeader, SectionEntry, SectionType, HEADER_SIZE};

#[derive(Debug, Clone)]
pub struct CacheView<'a> {
    header: CacheHeader,
    sections: Vec<SectionEntry>,
    data: &'a [u8],
}

impl<'a> CacheView<'a> {
    /// Parse header and directory
    ///
    /// Checks the magic but not the version, so that header inspection
    /// works on blobs from other format versions.
    pub fn parse(data: &'a [u8]) -> Result<Self> {
        let header = CacheHeader::from_bytes(data)?;
        header.check_magic()?;

        let directory_end = header.directory_end();
        if directory_end > data.len() as u64 {
            return Err(CacheError::corrupt(format!(
                "directory of {} sections ends at byte {}, blob is {} bytes",
                header.section_count,
                directory_end,
                data.len()
            )));
        }

        let mut r = ByteReader::new(&data[HEADER_SIZE..directory_end as usize]);
        let sections = (0..header.section_count)
            .map(|_| SectionEntry::read_from(&mut r))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            header,
            sections,
            data,
        })
    }

    pub fn header(&self) -> &CacheHeader {
        &self.header
    }

    /// Directory entries in write order
    pub fn sections(&self) -> &[SectionEntry] {
        &self.sections
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// First directory entry of `section_type`
    pub fn entry(&self, section_type: SectionType) -> Option<&SectionEntry> {
        self.sections
            .iter()
            .find(|e| e.section_type == section_type)
    }

    /// Check that every section lies after the directory, inside the blob,
    /// and does not overlap its predecessor
    pub fn check_bounds(&self) -> Result<()> {
        let mut previous_end = self.header.directory_end();
        for entry in &self.sections {
            let end = self.stored_range(entry)?.1;
            if entry.offset < previous_end {
                return Err(CacheError::corrupt(format!(
                    "section {} at offset {} overlaps preceding data ending at {}",
                    entry.section_type, entry.offset, previous_end
                )));
            }
            previous_end = end;
        }
        Ok(())
    }

    /// Fail when a known section type appears more than once
    pub fn check_unique(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for entry in self.sections.iter().filter(|e| e.section_type.is_known()) {
            if !seen.insert(entry.section_type) {
                return Err(CacheError::corrupt(format!(
                    "duplicate {} section at offset {}",
                    entry.section_type, entry.offset
                )));
            }
        }
        Ok(())
    }

    fn stored_range(&self, entry: &SectionEntry) -> Result<(u64, u64)> {
        let end = entry.end().ok_or_else(|| {
            CacheError::corrupt(format!(
                "section {} offset {} + length {} overflows",
                entry.section_type,
                entry.offset,
                entry.stored_len()
            ))
        })?;
        if end > self.data.len() as u64 {
            return Err(CacheError::corrupt(format!(
                "section {} spans bytes {}..{}, blob is {} bytes",
                entry.section_type,
                entry.offset,
                end,
                self.data.len()
            )));
        }
        Ok((entry.offset, end))
    }

    /// Stored bytes of a section, still compressed if flagged so
    pub fn raw_section(&self, entry: &SectionEntry) -> Result<&'a [u8]> {
        let (start, end) = self.stored_range(entry)?;
        Ok(&self.data[start as usize..end as usize])
    }

    /// Decoded payload of a section; borrowed unless it had to be inflated
    pub fn payload(&self, entry: &SectionEntry) -> Result<Cow<'a, [u8]>> {
        let raw = self.raw_section(entry)?;
        if !entry.is_compressed() {
            return Ok(Cow::Borrowed(raw));
        }
        let max_size = entry
            .stored_len()
            .saturating_mul(compression_strategy::MAX_INFLATE_RATIO);
        if entry.size > max_size {
            return Err(CacheError::corrupt(format!(
                "section {} claims {} bytes from {} compressed bytes",
                entry.section_type,
                entry.size,
                entry.stored_len()
            )));
        }
        let expected = usize::try_from(entry.size).map_err(|_| {
            CacheError::corrupt(format!(
                "section {} size {} exceeds addressable memory",
                entry.section_type, entry.size
            ))
        })?;
        compression_strategy::decompress(raw, expected, entry.section_type).map(Cow::Owned)
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            total_size: self.data.len(),
            header_size: HEADER_SIZE,
            directory_size: self.header.directory_end() as usize - HEADER_SIZE,
            sections: self
                .sections
                .iter()
                .map(|e| SectionStats {
                    section_type: e.section_type,
                    stored_size: e.stored_len(),
                    size: e.size,
                    compressed: e.is_compressed(),
                })
                .collect(),
        }
    }
}

/// Byte accounting for one blob
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheStats {
    pub total_size: usize,
    pub header_size: usize,
    pub directory_size: usize,
    pub sections: Vec<SectionStats>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SectionStats {
    pub section_type: SectionType,
    pub stored_size: u64,
    pub size: u64,
    pub compressed: bool,
}

impl CacheStats {
    /// Sum of stored section bytes
    pub fn stored_payload(&self) -> u64 {
        self.sections
            .iter()
            .fold(0u64, |total, s| total.saturating_add(s.stored_size))
    }

    /// Stored payload over decoded payload (1.0 when nothing is compressed)
    pub fn compression_ratio(&self) -> f64 {
        let decoded = self
            .sections
            .iter()
            .fold(0u64, |total, s| total.saturating_add(s.size));
        if decoded == 0 {
            return 1.0;
        }
        self.stored_payload() as f64 / decoded as f64
    }
}
