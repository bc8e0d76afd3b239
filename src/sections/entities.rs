// SPDX-License-Identifier: MIT
//! Entities section: u32 count, then columns
//! ids | type names | global ids | names | descriptions | object types (u32
//! each) | flags (u8)

use super::{put_string_ids, read_string_ids};
use crate::buffer::{ByteReader, ByteWriter};
use crate::error::{CacheError, Result};
use crate::store::{EntityTable, StringTable};

const ROW_SIZE: usize = 6 * 4 + 1;

pub(crate) fn encoded_len(table: &EntityTable) -> usize {
    4 + table.len() * ROW_SIZE
}

pub(crate) fn encode(table: &EntityTable, w: &mut ByteWriter) -> Result<()> {
    w.put_len(table.len())?;
    w.put_u32_slice(&table.ids)?;
    put_string_ids(w, &table.type_names)?;
    put_string_ids(w, &table.global_ids)?;
    put_string_ids(w, &table.names)?;
    put_string_ids(w, &table.descriptions)?;
    put_string_ids(w, &table.object_types)?;
    w.put_bytes(&table.flags)
}

pub(crate) fn decode(bytes: &[u8], strings: &StringTable) -> Result<EntityTable> {
    let mut r = ByteReader::new(bytes);
    let count = r.read_count(ROW_SIZE)?;

    let mut table = EntityTable::new();
    table.ids = r.read_u32_vec(count)?;
    table.type_names = read_string_ids(&mut r, count, strings, "entity type")?;
    table.global_ids = read_string_ids(&mut r, count, strings, "entity global id")?;
    table.names = read_string_ids(&mut r, count, strings, "entity name")?;
    table.descriptions = read_string_ids(&mut r, count, strings, "entity description")?;
    table.object_types = read_string_ids(&mut r, count, strings, "entity object type")?;
    table.flags = r.read_u8_vec(count)?;
    r.expect_exhausted("entities section")?;

    table
        .rebuild_index()
        .map_err(|id| CacheError::corrupt(format!("duplicate entity id {id}")))?;
    Ok(table)
}
