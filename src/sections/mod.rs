// SPDX-License-Identifier: MIT
//! Section codecs
//!
//! Each section has an `encoded_len`/`encode`/`decode` triple operating on
//! its own byte range only. The writer sizes each buffer from `encoded_len`
//! before encoding; decoders must consume exactly the bytes they are given.
//! Sections other than strings validate every string index they carry
//! against the already-decoded string table.

pub(crate) mod entities;
pub(crate) mod geometry;
pub(crate) mod properties;
pub(crate) mod quantities;
pub(crate) mod relationships;
pub(crate) mod strings;

use crate::buffer::{ByteReader, ByteWriter};
use crate::error::{CacheError, Result};
use crate::store::{StringId, StringTable};

pub(crate) fn put_string_ids(w: &mut ByteWriter, ids: &[StringId]) -> Result<()> {
    for id in ids {
        w.put_u32(id.0)?;
    }
    Ok(())
}

pub(crate) fn read_string_ids(
    r: &mut ByteReader<'_>,
    count: usize,
    strings: &StringTable,
    column: &str,
) -> Result<Vec<StringId>> {
    r.read_u32_vec(count)?
        .into_iter()
        .map(|raw| check_string_id(StringId(raw), strings, column))
        .collect()
}

pub(crate) fn check_string_id(id: StringId, strings: &StringTable, column: &str) -> Result<StringId> {
    if !strings.contains_id(id) {
        return Err(CacheError::corrupt(format!(
            "{column}: string index {} out of range ({} strings)",
            id.0,
            strings.len()
        )));
    }
    Ok(id)
}

#[cfg(test)]
pub(crate) fn encode_with<F>(len: usize, f: F) -> Vec<u8>
where
    F: FnOnce(&mut ByteWriter) -> Result<()>,
{
    let mut w = ByteWriter::with_exact_capacity(len).unwrap();
    f(&mut w).unwrap();
    w.finish().unwrap()
}
