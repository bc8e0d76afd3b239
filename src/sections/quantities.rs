// SPDX-License-Identifier: MIT
//! Quantities section: u32 count, then columns
//! entity ids | qset ids | qset names | quantity names (u32 each) |
//! kinds (u8) | values (f64)

use super::{put_string_ids, read_string_ids};
use crate::buffer::{ByteReader, ByteWriter};
use crate::error::Result;
use crate::store::{QuantityKind, QuantityTable, StringTable};

const ROW_SIZE: usize = 4 * 4 + 1 + 8;

pub(crate) fn encoded_len(table: &QuantityTable) -> usize {
    4 + table.len() * ROW_SIZE
}

pub(crate) fn encode(table: &QuantityTable, w: &mut ByteWriter) -> Result<()> {
    w.put_len(table.len())?;
    w.put_u32_slice(&table.entity_ids)?;
    w.put_u32_slice(&table.qset_ids)?;
    put_string_ids(w, &table.qset_names)?;
    put_string_ids(w, &table.names)?;
    for kind in &table.kinds {
        w.put_u8(kind.code())?;
    }
    w.put_f64_slice(&table.values)
}

pub(crate) fn decode(bytes: &[u8], strings: &StringTable) -> Result<QuantityTable> {
    let mut r = ByteReader::new(bytes);
    let count = r.read_count(ROW_SIZE)?;

    let mut table = QuantityTable::new();
    table.entity_ids = r.read_u32_vec(count)?;
    table.qset_ids = r.read_u32_vec(count)?;
    table.qset_names = read_string_ids(&mut r, count, strings, "quantity set name")?;
    table.names = read_string_ids(&mut r, count, strings, "quantity name")?;
    table.kinds = r
        .read_u8_vec(count)?
        .into_iter()
        .map(QuantityKind::from_code)
        .collect::<Result<_>>()?;
    table.values = r.read_f64_vec(count)?;
    r.expect_exhausted("quantities section")?;

    table.rebuild_index();
    Ok(table)
}
