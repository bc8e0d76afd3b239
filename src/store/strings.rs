// SPDX-License-Identifier: MIT
//! Deduplicating string pool shared by every table

use std::collections::HashMap;

use crate::error::{CacheError, Result};

/// Index into a [`StringTable`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct StringId(pub u32);

impl StringId {
    /// The empty string, always present at index 0
    pub const EMPTY: StringId = StringId(0);

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self == StringId::EMPTY
    }
}

/// Interned text values; every string appears once
#[derive(Debug, Clone)]
pub struct StringTable {
    strings: Vec<String>,
    lookup: HashMap<String, StringId>,
}

impl StringTable {
    pub fn new() -> Self {
        let mut table = Self {
            strings: Vec::new(),
            lookup: HashMap::new(),
        };
        table.intern("");
        table
    }

    /// Insert `value` if absent and return its index
    pub fn intern(&mut self, value: &str) -> StringId {
        if let Some(&id) = self.lookup.get(value) {
            return id;
        }
        let id = StringId(self.strings.len() as u32);
        self.strings.push(value.to_owned());
        self.lookup.insert(value.to_owned(), id);
        id
    }

    /// Intern an optional value, mapping `None` to [`StringId::EMPTY`]
    pub fn intern_opt(&mut self, value: Option<&str>) -> StringId {
        value.map_or(StringId::EMPTY, |v| self.intern(v))
    }

    pub fn get(&self, id: StringId) -> Option<&str> {
        self.strings.get(id.index()).map(String::as_str)
    }

    /// Index of an already interned value
    pub fn lookup(&self, value: &str) -> Option<StringId> {
        self.lookup.get(value).copied()
    }

    #[inline]
    pub fn contains_id(&self, id: StringId) -> bool {
        id.index() < self.strings.len()
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }

    /// True when only the reserved empty string is present
    pub fn is_empty(&self) -> bool {
        self.strings.len() <= 1
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.strings.iter().map(String::as_str)
    }

    /// Rebuild a table from decoded strings in index order
    pub(crate) fn from_strings(strings: Vec<String>) -> Result<Self> {
        match strings.first() {
            Some(first) if first.is_empty() => {}
            _ => {
                return Err(CacheError::corrupt(
                    "string table must start with the empty string",
                ))
            }
        }

        let mut lookup = HashMap::with_capacity(strings.len());
        for (i, s) in strings.iter().enumerate() {
            if lookup.insert(s.clone(), StringId(i as u32)).is_some() {
                return Err(CacheError::corrupt(format!(
                    "duplicate string {s:?} at index {i}"
                )));
            }
        }

        Ok(Self { strings, lookup })
    }
}

impl Default for StringTable {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for StringTable {
    fn eq(&self, other: &Self) -> bool {
        self.strings == other.strings
    }
}
