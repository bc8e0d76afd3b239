// SPDX-License-Identifier: MIT
//! Strings section: u32 count, then (u32 byte length, UTF-8 bytes) per entry

use crate::buffer::{ByteReader, ByteWriter};
use crate::error::{CacheError, Result};
use crate::store::StringTable;

pub(crate) fn encoded_len(table: &StringTable) -> usize {
    4 + table.iter().map(|s| 4 + s.len()).sum::<usize>()
}

pub(crate) fn encode(table: &StringTable, w: &mut ByteWriter) -> Result<()> {
    w.put_len(table.len())?;
    for s in table.iter() {
        w.put_len(s.len())?;
        w.put_bytes(s.as_bytes())?;
    }
    Ok(())
}

pub(crate) fn decode(bytes: &[u8]) -> Result<StringTable> {
    let mut r = ByteReader::new(bytes);
    let count = r.read_count(4)?;
    let mut strings = Vec::with_capacity(count);
    for i in 0..count {
        let len = r.read_u32()? as usize;
        let raw = r.read_bytes(len)?;
        let s = std::str::from_utf8(raw).map_err(|e| {
            CacheError::corrupt(format!("string {i} is not valid UTF-8: {e}"))
        })?;
        strings.push(s.to_owned());
    }
    r.expect_exhausted("strings section")?;
    StringTable::from_strings(strings)
}
