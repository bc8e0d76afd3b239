// SPDX-License-Identifier: MIT
//! Columnar entity table

use std::collections::HashMap;

use super::strings::{StringId, StringTable};

/// Entity flag bits
pub mod entity_flags {
    /// Entity has tessellated geometry
    pub const HAS_GEOMETRY: u8 = 0x01;

    /// Entity is a type object (IfcWallType, ...)
    pub const IS_TYPE: u8 = 0x02;
}

/// Optional attributes supplied when adding an entity
#[derive(Debug, Clone, Copy, Default)]
pub struct EntityAttributes<'a> {
    pub global_id: Option<&'a str>,
    pub name: Option<&'a str>,
    pub description: Option<&'a str>,
    pub object_type: Option<&'a str>,
    pub has_geometry: bool,
    pub is_type: bool,
}

impl<'a> EntityAttributes<'a> {
    pub fn named(name: &'a str) -> Self {
        Self {
            name: Some(name),
            ..Self::default()
        }
    }

    pub fn with_global_id(mut self, global_id: &'a str) -> Self {
        self.global_id = Some(global_id);
        self
    }

    pub fn with_geometry(mut self) -> Self {
        self.has_geometry = true;
        self
    }

    pub(crate) fn flags(&self) -> u8 {
        let mut flags = 0;
        if self.has_geometry {
            flags |= entity_flags::HAS_GEOMETRY;
        }
        if self.is_type {
            flags |= entity_flags::IS_TYPE;
        }
        flags
    }
}

/// One row of the entity table, with strings still interned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntityRow {
    pub id: u32,
    pub type_name: StringId,
    pub global_id: StringId,
    pub name: StringId,
    pub description: StringId,
    pub object_type: StringId,
    pub flags: u8,
}

/// Append-only, columnar entity storage keyed by express id
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntityTable {
    pub(crate) ids: Vec<u32>,
    pub(crate) type_names: Vec<StringId>,
    pub(crate) global_ids: Vec<StringId>,
    pub(crate) names: Vec<StringId>,
    pub(crate) descriptions: Vec<StringId>,
    pub(crate) object_types: Vec<StringId>,
    pub(crate) flags: Vec<u8>,
    index: HashMap<u32, usize>,
}

impl EntityTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a row; returns false and leaves the table unchanged when the
    /// id is already present
    pub fn push(&mut self, row: EntityRow) -> bool {
        if self.index.contains_key(&row.id) {
            return false;
        }
        self.index.insert(row.id, self.ids.len());
        self.ids.push(row.id);
        self.type_names.push(row.type_name);
        self.global_ids.push(row.global_id);
        self.names.push(row.name);
        self.descriptions.push(row.description);
        self.object_types.push(row.object_type);
        self.flags.push(row.flags);
        true
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn ids(&self) -> &[u32] {
        &self.ids
    }

    pub fn contains(&self, id: u32) -> bool {
        self.index.contains_key(&id)
    }

    pub fn row_index(&self, id: u32) -> Option<usize> {
        self.index.get(&id).copied()
    }

    pub fn row(&self, index: usize) -> Option<EntityRow> {
        Some(EntityRow {
            id: *self.ids.get(index)?,
            type_name: self.type_names[index],
            global_id: self.global_ids[index],
            name: self.names[index],
            description: self.descriptions[index],
            object_type: self.object_types[index],
            flags: self.flags[index],
        })
    }

    pub fn get(&self, id: u32) -> Option<EntityRow> {
        self.row_index(id).and_then(|i| self.row(i))
    }

    pub fn iter(&self) -> impl Iterator<Item = EntityRow> + '_ {
        (0..self.len()).filter_map(move |i| self.row(i))
    }

    /// Rebuild the id index after columns were filled by a decoder
    pub(crate) fn rebuild_index(&mut self) -> Result<(), u32> {
        self.index.clear();
        self.index.reserve(self.ids.len());
        for (i, &id) in self.ids.iter().enumerate() {
            if self.index.insert(id, i).is_some() {
                return Err(id);
            }
        }
        Ok(())
    }
}

/// Entity lookups with strings resolved
#[derive(Debug, Clone, Copy)]
pub struct Entities<'a> {
    pub(crate) table: &'a EntityTable,
    pub(crate) strings: &'a StringTable,
}

impl<'a> Entities<'a> {
    fn text(&self, id: u32, column: &[StringId]) -> Option<&'a str> {
        let row = self.table.row_index(id)?;
        let sid = *column.get(row)?;
        if sid.is_empty() {
            return None;
        }
        self.strings.get(sid)
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn contains(&self, id: u32) -> bool {
        self.table.contains(id)
    }

    pub fn ids(&self) -> &'a [u32] {
        self.table.ids()
    }

    pub fn type_name(&self, id: u32) -> Option<&'a str> {
        self.text(id, &self.table.type_names)
    }

    pub fn global_id(&self, id: u32) -> Option<&'a str> {
        self.text(id, &self.table.global_ids)
    }

    pub fn name(&self, id: u32) -> Option<&'a str> {
        self.text(id, &self.table.names)
    }

    pub fn description(&self, id: u32) -> Option<&'a str> {
        self.text(id, &self.table.descriptions)
    }

    pub fn object_type(&self, id: u32) -> Option<&'a str> {
        self.text(id, &self.table.object_types)
    }

    fn flag(&self, id: u32, flag: u8) -> bool {
        self.table
            .row_index(id)
            .map(|i| self.table.flags[i] & flag != 0)
            .unwrap_or(false)
    }

    pub fn has_geometry(&self, id: u32) -> bool {
        self.flag(id, entity_flags::HAS_GEOMETRY)
    }

    pub fn is_type(&self, id: u32) -> bool {
        self.flag(id, entity_flags::IS_TYPE)
    }

    /// Ids of all entities whose type name matches, ignoring ASCII case
    pub fn of_type(&self, type_name: &str) -> Vec<u32> {
        self.table
            .iter()
            .filter(|row| {
                self.strings
                    .get(row.type_name)
                    .is_some_and(|t| t.eq_ignore_ascii_case(type_name))
            })
            .map(|row| row.id)
            .collect()
    }
}
