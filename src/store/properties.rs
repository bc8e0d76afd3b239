// SPDX-License-Identifier: MIT
//! Property set rows and their tagged values

use std::collections::HashMap;

use super::strings::{StringId, StringTable};
use crate::error::{CacheError, Result};

/// Three-valued IFC logical
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Logical {
    False,
    True,
    Unknown,
}

impl Logical {
    pub fn as_bool(self) -> Option<bool> {
        match self {
            Logical::True => Some(true),
            Logical::False => Some(false),
            Logical::Unknown => None,
        }
    }
}

/// Stored property value; text payloads are string table indices
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PropertyValue {
    Null,
    Real(f64),
    Integer(i64),
    Boolean(bool),
    Logical(Logical),
    Text(StringId),
    Enumerated(StringId),
}

pub(crate) mod value_tag {
    pub const NULL: u8 = 0;
    pub const REAL: u8 = 1;
    pub const INTEGER: u8 = 2;
    pub const BOOLEAN: u8 = 3;
    pub const LOGICAL: u8 = 4;
    pub const TEXT: u8 = 5;
    pub const ENUMERATED: u8 = 6;
}

impl PropertyValue {
    /// Stored value-type code
    pub fn tag(&self) -> u8 {
        match self {
            PropertyValue::Null => value_tag::NULL,
            PropertyValue::Real(_) => value_tag::REAL,
            PropertyValue::Integer(_) => value_tag::INTEGER,
            PropertyValue::Boolean(_) => value_tag::BOOLEAN,
            PropertyValue::Logical(_) => value_tag::LOGICAL,
            PropertyValue::Text(_) => value_tag::TEXT,
            PropertyValue::Enumerated(_) => value_tag::ENUMERATED,
        }
    }

    /// Fixed 8-byte payload for the value column
    pub(crate) fn payload(&self) -> u64 {
        match *self {
            PropertyValue::Null => 0,
            PropertyValue::Real(v) => v.to_bits(),
            PropertyValue::Integer(v) => v as u64,
            PropertyValue::Boolean(v) => v as u64,
            PropertyValue::Logical(Logical::False) => 0,
            PropertyValue::Logical(Logical::True) => 1,
            PropertyValue::Logical(Logical::Unknown) => 2,
            PropertyValue::Text(id) | PropertyValue::Enumerated(id) => id.0 as u64,
        }
    }

    pub(crate) fn from_parts(tag: u8, payload: u64) -> Result<Self> {
        let text_id = || {
            u32::try_from(payload)
                .map(StringId)
                .map_err(|_| CacheError::corrupt(format!("string index {payload} out of range")))
        };
        Ok(match tag {
            value_tag::NULL => PropertyValue::Null,
            value_tag::REAL => PropertyValue::Real(f64::from_bits(payload)),
            value_tag::INTEGER => PropertyValue::Integer(payload as i64),
            value_tag::BOOLEAN => match payload {
                0 => PropertyValue::Boolean(false),
                1 => PropertyValue::Boolean(true),
                other => {
                    return Err(CacheError::corrupt(format!(
                        "invalid boolean payload {other}"
                    )))
                }
            },
            value_tag::LOGICAL => PropertyValue::Logical(match payload {
                0 => Logical::False,
                1 => Logical::True,
                2 => Logical::Unknown,
                other => {
                    return Err(CacheError::corrupt(format!(
                        "invalid logical payload {other}"
                    )))
                }
            }),
            value_tag::TEXT => PropertyValue::Text(text_id()?),
            value_tag::ENUMERATED => PropertyValue::Enumerated(text_id()?),
            other => {
                return Err(CacheError::corrupt(format!(
                    "unknown property value type {other}"
                )))
            }
        })
    }

    /// String index carried by text-like values
    pub(crate) fn string_id(&self) -> Option<StringId> {
        match *self {
            PropertyValue::Text(id) | PropertyValue::Enumerated(id) => Some(id),
            _ => None,
        }
    }

    pub(crate) fn resolve<'a>(&self, strings: &'a StringTable) -> Value<'a> {
        match *self {
            PropertyValue::Null => Value::Null,
            PropertyValue::Real(v) => Value::Real(v),
            PropertyValue::Integer(v) => Value::Integer(v),
            PropertyValue::Boolean(v) => Value::Boolean(v),
            PropertyValue::Logical(v) => Value::Logical(v),
            PropertyValue::Text(id) => Value::Text(strings.get(id).unwrap_or_default()),
            PropertyValue::Enumerated(id) => {
                Value::Enumerated(strings.get(id).unwrap_or_default())
            }
        }
    }
}

/// Property value with text resolved against the string table
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value<'a> {
    Null,
    Real(f64),
    Integer(i64),
    Boolean(bool),
    Logical(Logical),
    Text(&'a str),
    Enumerated(&'a str),
}

impl<'a> Value<'a> {
    pub fn as_str(&self) -> Option<&'a str> {
        match *self {
            Value::Text(s) | Value::Enumerated(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Value::Real(v) => Some(v),
            Value::Integer(v) => Some(v as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match *self {
            Value::Boolean(v) => Some(v),
            Value::Logical(v) => v.as_bool(),
            _ => None,
        }
    }

    pub(crate) fn intern(&self, strings: &mut StringTable) -> PropertyValue {
        match *self {
            Value::Null => PropertyValue::Null,
            Value::Real(v) => PropertyValue::Real(v),
            Value::Integer(v) => PropertyValue::Integer(v),
            Value::Boolean(v) => PropertyValue::Boolean(v),
            Value::Logical(v) => PropertyValue::Logical(v),
            Value::Text(s) => PropertyValue::Text(strings.intern(s)),
            Value::Enumerated(s) => PropertyValue::Enumerated(strings.intern(s)),
        }
    }
}

/// One property row with strings still interned
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PropertyRow {
    pub entity_id: u32,
    pub pset_id: u32,
    pub pset_name: StringId,
    pub name: StringId,
    pub value: PropertyValue,
}

/// Properties attached to entities; several rows may share one set
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyTable {
    pub(crate) entity_ids: Vec<u32>,
    pub(crate) pset_ids: Vec<u32>,
    pub(crate) pset_names: Vec<StringId>,
    pub(crate) names: Vec<StringId>,
    pub(crate) values: Vec<PropertyValue>,
    by_entity: HashMap<u32, Vec<usize>>,
}

impl PropertyTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, row: PropertyRow) {
        let index = self.entity_ids.len();
        self.by_entity.entry(row.entity_id).or_default().push(index);
        self.entity_ids.push(row.entity_id);
        self.pset_ids.push(row.pset_id);
        self.pset_names.push(row.pset_name);
        self.names.push(row.name);
        self.values.push(row.value);
    }

    pub fn len(&self) -> usize {
        self.entity_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entity_ids.is_empty()
    }

    pub fn row(&self, index: usize) -> Option<PropertyRow> {
        Some(PropertyRow {
            entity_id: *self.entity_ids.get(index)?,
            pset_id: self.pset_ids[index],
            pset_name: self.pset_names[index],
            name: self.names[index],
            value: self.values[index],
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = PropertyRow> + '_ {
        (0..self.len()).filter_map(move |i| self.row(i))
    }

    /// Row indices attached to `entity_id`, in insertion order
    pub fn rows_for(&self, entity_id: u32) -> &[usize] {
        self.by_entity
            .get(&entity_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub(crate) fn rebuild_index(&mut self) {
        self.by_entity.clear();
        for (i, &entity_id) in self.entity_ids.iter().enumerate() {
            self.by_entity.entry(entity_id).or_default().push(i);
        }
    }
}

/// A named property within a set, resolved
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PropertyEntry<'a> {
    pub name: &'a str,
    pub value: Value<'a>,
}

/// All properties an entity carries in one set
#[derive(Debug, Clone, PartialEq)]
pub struct PropertySet<'a> {
    pub id: u32,
    pub name: &'a str,
    pub properties: Vec<PropertyEntry<'a>>,
}

/// Property lookups with strings resolved
#[derive(Debug, Clone, Copy)]
pub struct Properties<'a> {
    pub(crate) table: &'a PropertyTable,
    pub(crate) strings: &'a StringTable,
}

impl<'a> Properties<'a> {
    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Value of `name` in set `pset` on `entity_id`
    pub fn value(&self, entity_id: u32, pset: &str, name: &str) -> Option<Value<'a>> {
        let pset = self.strings.lookup(pset)?;
        let name = self.strings.lookup(name)?;
        self.table
            .rows_for(entity_id)
            .iter()
            .find(|&&i| self.table.pset_names[i] == pset && self.table.names[i] == name)
            .map(|&i| self.table.values[i].resolve(self.strings))
    }

    /// Property sets on `entity_id`, in first-seen order
    pub fn property_sets(&self, entity_id: u32) -> Vec<PropertySet<'a>> {
        let mut sets: Vec<PropertySet<'a>> = Vec::new();
        for &i in self.table.rows_for(entity_id) {
            let pset_id = self.table.pset_ids[i];
            let pset_name = self.table.pset_names[i];
            let entry = PropertyEntry {
                name: self.strings.get(self.table.names[i]).unwrap_or_default(),
                value: self.table.values[i].resolve(self.strings),
            };
            let set_name = self.strings.get(pset_name).unwrap_or_default();
            match sets
                .iter_mut()
                .find(|s| s.id == pset_id && s.name == set_name)
            {
                Some(set) => set.properties.push(entry),
                None => sets.push(PropertySet {
                    id: pset_id,
                    name: set_name,
                    properties: vec![entry],
                }),
            }
        }
        sets
    }
}
