// SPDX-License-Identifier: MIT
//! Quantity set rows

use std::collections::HashMap;

use super::strings::{StringId, StringTable};
use crate::error::{CacheError, Result};

/// Physical kind of a quantity value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QuantityKind {
    Length,
    Area,
    Volume,
    Count,
    Weight,
    Time,
}

impl QuantityKind {
    pub fn code(self) -> u8 {
        match self {
            QuantityKind::Length => 0,
            QuantityKind::Area => 1,
            QuantityKind::Volume => 2,
            QuantityKind::Count => 3,
            QuantityKind::Weight => 4,
            QuantityKind::Time => 5,
        }
    }

    pub fn from_code(code: u8) -> Result<Self> {
        Ok(match code {
            0 => QuantityKind::Length,
            1 => QuantityKind::Area,
            2 => QuantityKind::Volume,
            3 => QuantityKind::Count,
            4 => QuantityKind::Weight,
            5 => QuantityKind::Time,
            other => {
                return Err(CacheError::corrupt(format!(
                    "unknown quantity kind {other}"
                )))
            }
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuantityRow {
    pub entity_id: u32,
    pub qset_id: u32,
    pub qset_name: StringId,
    pub name: StringId,
    pub kind: QuantityKind,
    pub value: f64,
}

/// Quantities attached to entities; several rows may share one set
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuantityTable {
    pub(crate) entity_ids: Vec<u32>,
    pub(crate) qset_ids: Vec<u32>,
    pub(crate) qset_names: Vec<StringId>,
    pub(crate) names: Vec<StringId>,
    pub(crate) kinds: Vec<QuantityKind>,
    pub(crate) values: Vec<f64>,
    by_entity: HashMap<u32, Vec<usize>>,
}

impl QuantityTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, row: QuantityRow) {
        let index = self.entity_ids.len();
        self.by_entity.entry(row.entity_id).or_default().push(index);
        self.entity_ids.push(row.entity_id);
        self.qset_ids.push(row.qset_id);
        self.qset_names.push(row.qset_name);
        self.names.push(row.name);
        self.kinds.push(row.kind);
        self.values.push(row.value);
    }

    pub fn len(&self) -> usize {
        self.entity_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entity_ids.is_empty()
    }

    pub fn row(&self, index: usize) -> Option<QuantityRow> {
        Some(QuantityRow {
            entity_id: *self.entity_ids.get(index)?,
            qset_id: self.qset_ids[index],
            qset_name: self.qset_names[index],
            name: self.names[index],
            kind: self.kinds[index],
            value: self.values[index],
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = QuantityRow> + '_ {
        (0..self.len()).filter_map(move |i| self.row(i))
    }

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

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuantityEntry<'a> {
    pub name: &'a str,
    pub kind: QuantityKind,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct QuantitySet<'a> {
    pub id: u32,
    pub name: &'a str,
    pub quantities: Vec<QuantityEntry<'a>>,
}

/// Quantity lookups with strings resolved
#[derive(Debug, Clone, Copy)]
pub struct Quantities<'a> {
    pub(crate) table: &'a QuantityTable,
    pub(crate) strings: &'a StringTable,
}

impl<'a> Quantities<'a> {
    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    fn find(&self, entity_id: u32, qset: &str, name: &str) -> Option<usize> {
        let qset = self.strings.lookup(qset)?;
        let name = self.strings.lookup(name)?;
        self.table
            .rows_for(entity_id)
            .iter()
            .copied()
            .find(|&i| self.table.qset_names[i] == qset && self.table.names[i] == name)
    }

    /// Value of quantity `name` in set `qset` on `entity_id`
    pub fn value(&self, entity_id: u32, qset: &str, name: &str) -> Option<f64> {
        self.find(entity_id, qset, name)
            .map(|i| self.table.values[i])
    }

    pub fn kind(&self, entity_id: u32, qset: &str, name: &str) -> Option<QuantityKind> {
        self.find(entity_id, qset, name).map(|i| self.table.kinds[i])
    }

    /// Quantity sets on `entity_id`, in first-seen order
    pub fn quantity_sets(&self, entity_id: u32) -> Vec<QuantitySet<'a>> {
        let mut sets: Vec<QuantitySet<'a>> = Vec::new();
        for &i in self.table.rows_for(entity_id) {
            let qset_id = self.table.qset_ids[i];
            let set_name = self.strings.get(self.table.qset_names[i]).unwrap_or_default();
            let entry = QuantityEntry {
                name: self.strings.get(self.table.names[i]).unwrap_or_default(),
                kind: self.table.kinds[i],
                value: self.table.values[i],
            };
            match sets
                .iter_mut()
                .find(|s| s.id == qset_id && s.name == set_name)
            {
                Some(set) => set.quantities.push(entry),
                None => sets.push(QuantitySet {
                    id: qset_id,
                    name: set_name,
                    quantities: vec![entry],
                }),
            }
        }
        sets
    }
}
