// SPDX-License-Identifier: MIT
//! Properties section: u32 count, then columns
//! entity ids | pset ids | pset names | property names (u32 each) |
//! value tags (u8) | value payloads (u64)

use super::{check_string_id, put_string_ids, read_string_ids};
use crate::buffer::{ByteReader, ByteWriter};
use crate::error::Result;
use crate::store::{PropertyTable, PropertyValue, StringTable};

const ROW_SIZE: usize = 4 * 4 + 1 + 8;

pub(crate) fn encoded_len(table: &PropertyTable) -> usize {
    4 + table.len() * ROW_SIZE
}

pub(crate) fn encode(table: &PropertyTable, w: &mut ByteWriter) -> Result<()> {
    w.put_len(table.len())?;
    w.put_u32_slice(&table.entity_ids)?;
    w.put_u32_slice(&table.pset_ids)?;
    put_string_ids(w, &table.pset_names)?;
    put_string_ids(w, &table.names)?;
    for value in &table.values {
        w.put_u8(value.tag())?;
    }
    for value in &table.values {
        w.put_u64(value.payload())?;
    }
    Ok(())
}

pub(crate) fn decode(bytes: &[u8], strings: &StringTable) -> Result<PropertyTable> {
    let mut r = ByteReader::new(bytes);
    let count = r.read_count(ROW_SIZE)?;

    let mut table = PropertyTable::new();
    table.entity_ids = r.read_u32_vec(count)?;
    table.pset_ids = r.read_u32_vec(count)?;
    table.pset_names = read_string_ids(&mut r, count, strings, "property set name")?;
    table.names = read_string_ids(&mut r, count, strings, "property name")?;
    let tags = r.read_u8_vec(count)?;
    let payloads = r.read_u64_vec(count)?;
    r.expect_exhausted("properties section")?;

    table.values = tags
        .into_iter()
        .zip(payloads)
        .map(|(tag, payload)| {
            let value = PropertyValue::from_parts(tag, payload)?;
            if let Some(id) = value.string_id() {
                check_string_id(id, strings, "property value")?;
            }
            Ok(value)
        })
        .collect::<Result<_>>()?;

    table.rebuild_index();
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CacheError;
    use crate::sections::encode_with;
    use crate::store::{DataStore, Logical, Value};
    use crate::SchemaVersion;

    fn sample() -> DataStore {
        let mut store = DataStore::new(SchemaVersion::Ifc4);
        let pset = "Pset_WallCommon";
        store.add_property(4, 100, pset, "IsExternal", Value::Boolean(true));
        store.add_property(4, 100, pset, "FireRating", Value::Text("REI60"));
        store.add_property(4, 100, pset, "ThermalTransmittance", Value::Real(0.24));
        store.add_property(4, 100, pset, "LoadBearing", Value::Logical(Logical::Unknown));
        store.add_property(5, 101, pset, "Status", Value::Enumerated("NEW"));
        store.add_property(5, 101, pset, "Layers", Value::Integer(-3));
        store.add_property(5, 101, pset, "Reference", Value::Null);
        store
    }

    #[test]
    fn test_round_trip_all_value_kinds() {
        let store = sample();
        let table = store.property_table();
        let bytes = encode_with(encoded_len(table), |w| encode(table, w));
        let decoded = decode(&bytes, store.strings()).unwrap();

        assert_eq!(&decoded, table);
        assert_eq!(decoded.rows_for(5), &[4, 5, 6]);
    }

    #[test]
    fn test_dangling_text_value_rejected() {
        let store = sample();
        let table = store.property_table();
        let mut bytes = encode_with(encoded_len(table), |w| encode(table, w));

        // Second row is Text; its payload lives after 4 u32 columns and the tags
        let n = table.len();
        let payload_at = 4 + n * 16 + n + 8;
        bytes[payload_at..payload_at + 8].copy_from_slice(&500u64.to_le_bytes());

        let err = decode(&bytes, store.strings()).unwrap_err();
        assert!(matches!(err, CacheError::CorruptFormat(msg) if msg.contains("property value")));
    }

    #[test]
    fn test_unknown_tag_rejected() {
        let store = sample();
        let table = store.property_table();
        let mut bytes = encode_with(encoded_len(table), |w| encode(table, w));
        let tags_at = 4 + table.len() * 16;
        bytes[tags_at] = 200;
        assert!(decode(&bytes, store.strings()).is_err());
    }
}
