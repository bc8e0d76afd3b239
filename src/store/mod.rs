// SPDX-License-Identifier: MIT
//! In-memory data store serialized by the cache
//!
//! One [`StringTable`] is owned by the store and every table references it by
//! index, so no text value is stored twice anywhere in a blob.

mod entities;
mod properties;
mod quantities;
mod relationships;
mod spatial;
mod strings;

pub use entities::{entity_flags, Entities, EntityAttributes, EntityRow, EntityTable};
pub use properties::{
    Logical, Properties, PropertyEntry, PropertyRow, PropertySet, PropertyTable, PropertyValue,
    Value,
};
pub use quantities::{
    Quantities, QuantityEntry, QuantityKind, QuantityRow, QuantitySet, QuantityTable,
};
pub use relationships::{Direction, Relationship, RelationshipGraph, RelationshipType};
pub use spatial::{SpatialHierarchy, SpatialKind, SpatialNode};
pub use strings::{StringId, StringTable};

use crate::format::SchemaVersion;

/// Fully-populated model tables plus the shared string pool
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataStore {
    schema: SchemaVersion,
    strings: StringTable,
    entities: EntityTable,
    properties: PropertyTable,
    quantities: QuantityTable,
    relationships: RelationshipGraph,
}

impl DataStore {
    pub fn new(schema: SchemaVersion) -> Self {
        Self {
            schema,
            ..Self::default()
        }
    }

    pub(crate) fn from_parts(
        schema: SchemaVersion,
        strings: StringTable,
        entities: EntityTable,
        properties: PropertyTable,
        quantities: QuantityTable,
        relationships: RelationshipGraph,
    ) -> Self {
        Self {
            schema,
            strings,
            entities,
            properties,
            quantities,
            relationships,
        }
    }

    pub fn schema(&self) -> SchemaVersion {
        self.schema
    }

    /// Add an entity; returns false when `id` already exists
    pub fn add_entity(&mut self, id: u32, type_name: &str, attrs: EntityAttributes<'_>) -> bool {
        if self.entities.contains(id) {
            tracing::debug!(id, "Ignoring duplicate entity id");
            return false;
        }
        let row = EntityRow {
            id,
            type_name: self.strings.intern(type_name),
            global_id: self.strings.intern_opt(attrs.global_id),
            name: self.strings.intern_opt(attrs.name),
            description: self.strings.intern_opt(attrs.description),
            object_type: self.strings.intern_opt(attrs.object_type),
            flags: attrs.flags(),
        };
        self.entities.push(row)
    }

    pub fn add_property(
        &mut self,
        entity_id: u32,
        pset_id: u32,
        pset_name: &str,
        name: &str,
        value: Value<'_>,
    ) {
        let row = PropertyRow {
            entity_id,
            pset_id,
            pset_name: self.strings.intern(pset_name),
            name: self.strings.intern(name),
            value: value.intern(&mut self.strings),
        };
        self.properties.push(row);
    }

    pub fn add_quantity(
        &mut self,
        entity_id: u32,
        qset_id: u32,
        qset_name: &str,
        name: &str,
        kind: QuantityKind,
        value: f64,
    ) {
        let row = QuantityRow {
            entity_id,
            qset_id,
            qset_name: self.strings.intern(qset_name),
            name: self.strings.intern(name),
            kind,
            value,
        };
        self.quantities.push(row);
    }

    pub fn add_relationship(
        &mut self,
        rel_type: RelationshipType,
        rel_id: u32,
        source: u32,
        target: u32,
    ) {
        self.relationships.add_edge(Relationship {
            rel_type,
            rel_id,
            source,
            target,
        });
    }

    pub fn strings(&self) -> &StringTable {
        &self.strings
    }

    pub fn entity_table(&self) -> &EntityTable {
        &self.entities
    }

    pub fn property_table(&self) -> &PropertyTable {
        &self.properties
    }

    pub fn quantity_table(&self) -> &QuantityTable {
        &self.quantities
    }

    pub fn relationships(&self) -> &RelationshipGraph {
        &self.relationships
    }

    pub fn entities(&self) -> Entities<'_> {
        Entities {
            table: &self.entities,
            strings: &self.strings,
        }
    }

    pub fn properties(&self) -> Properties<'_> {
        Properties {
            table: &self.properties,
            strings: &self.strings,
        }
    }

    pub fn quantities(&self) -> Quantities<'_> {
        Quantities {
            table: &self.quantities,
            strings: &self.strings,
        }
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Rebuild the spatial tree from Aggregates and ContainsElements edges
    pub fn spatial_hierarchy(&self) -> SpatialHierarchy {
        SpatialHierarchy::build(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strings_shared_across_tables() {
        let mut store = DataStore::new(SchemaVersion::Ifc4);
        store.add_entity(1, "IfcWall", EntityAttributes::named("Pset_WallCommon"));
        store.add_property(1, 10, "Pset_WallCommon", "Reference", Value::Text("IfcWall"));

        // "", "IfcWall", "Pset_WallCommon", "Reference"
        assert_eq!(store.strings().len(), 4);
        assert_eq!(
            store.properties().value(1, "Pset_WallCommon", "Reference"),
            Some(Value::Text("IfcWall"))
        );
    }

    #[test]
    fn test_duplicate_entity_ignored() {
        let mut store = DataStore::new(SchemaVersion::Ifc4);
        assert!(store.add_entity(1, "IfcWall", EntityAttributes::named("A")));
        assert!(!store.add_entity(1, "IfcDoor", EntityAttributes::named("B")));
        assert_eq!(store.entity_count(), 1);
        assert_eq!(store.entities().type_name(1), Some("IfcWall"));
        // "", "IfcWall", "A"
        assert_eq!(store.strings().len(), 3);
        assert_eq!(store.strings().lookup("IfcDoor"), None);
    }

    #[test]
    fn test_entity_attributes() {
        let mut store = DataStore::new(SchemaVersion::Ifc4);
        let attrs = EntityAttributes {
            description: Some("External wall"),
            object_type: Some("Basic Wall:200mm"),
            is_type: true,
            ..EntityAttributes::named("W1").with_global_id("2O2Fr$t4X7Zf8NOew3FLOH")
        };
        store.add_entity(9, "IfcWallType", attrs);

        let entities = store.entities();
        assert_eq!(entities.global_id(9), Some("2O2Fr$t4X7Zf8NOew3FLOH"));
        assert_eq!(entities.description(9), Some("External wall"));
        assert_eq!(entities.object_type(9), Some("Basic Wall:200mm"));
        assert!(entities.is_type(9));
        assert!(!entities.has_geometry(9));
    }
}
