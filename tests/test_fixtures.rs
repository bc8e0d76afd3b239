// SPDX-License-Identifier: MIT
//! Shared models and blob surgery helpers for integration tests
#![allow(dead_code)]

use ifc_binary_cache::{
    Aabb, BinaryCacheReader, CoordinateInfo, DataStore, EntityAttributes, GeometryBundle,
    MeshData, QuantityKind, RelationshipType, SchemaVersion, SectionEntry, Value, HEADER_SIZE,
    SECTION_ENTRY_SIZE,
};

pub const SOURCE: &[u8] = b"ISO-10303-21;\nHEADER;\nFILE_SCHEMA(('IFC4'));\nENDSEC;\nDATA;\n#1=IFCPROJECT('0YvctVUKr0kugbFTf53O9L',$,'Test Project',$,$,$,$,$,$);\nENDSEC;\nEND-ISO-10303-21;\n";

pub const PROJECT: u32 = 1;
pub const SITE: u32 = 2;
pub const BUILDING: u32 = 3;
pub const WALL_A: u32 = 4;
pub const WALL_B: u32 = 5;

/// Project, site, building and two walls contained in the building
pub fn scenario_store() -> DataStore {
    let mut store = DataStore::new(SchemaVersion::Ifc4);
    store.add_entity(
        PROJECT,
        "IfcProject",
        EntityAttributes::named("Test Project").with_global_id("0YvctVUKr0kugbFTf53O9L"),
    );
    store.add_entity(SITE, "IfcSite", EntityAttributes::named("Site"));
    store.add_entity(BUILDING, "IfcBuilding", EntityAttributes::named("Building"));
    store.add_entity(WALL_A, "IfcWall", EntityAttributes::named("Wall A").with_geometry());
    store.add_entity(WALL_B, "IfcWall", EntityAttributes::named("Wall B").with_geometry());

    store.add_property(WALL_A, 10, "Pset_WallCommon", "IsExternal", Value::Boolean(true));
    store.add_property(WALL_A, 10, "Pset_WallCommon", "FireRating", Value::Text("REI60"));
    store.add_quantity(
        WALL_A,
        11,
        "Qto_WallBaseQuantities",
        "Length",
        QuantityKind::Length,
        5.5,
    );
    store.add_quantity(
        WALL_A,
        11,
        "Qto_WallBaseQuantities",
        "GrossVolume",
        QuantityKind::Volume,
        2.75,
    );

    store.add_relationship(RelationshipType::ContainsElements, 20, BUILDING, WALL_A);
    store.add_relationship(RelationshipType::ContainsElements, 20, BUILDING, WALL_B);
    store
}

/// Scenario store plus the aggregation edges that complete the spatial tree
pub fn spatial_store() -> DataStore {
    let mut store = scenario_store();
    store.add_relationship(RelationshipType::Aggregates, 30, PROJECT, SITE);
    store.add_relationship(RelationshipType::Aggregates, 31, SITE, BUILDING);
    store
}

fn wall_mesh(express_id: u32, x: f32) -> MeshData {
    MeshData::new(
        express_id,
        vec![x, 0.0, 0.0, x + 5.5, 0.0, 0.0, x + 5.5, 0.0, 3.0, x, 0.0, 3.0],
        vec![0.0, -1.0, 0.0, 0.0, -1.0, 0.0, 0.0, -1.0, 0.0, 0.0, -1.0, 0.0],
        vec![0, 1, 2, 0, 2, 3],
        [0.75, 0.75, 0.7, 1.0],
    )
}

/// Two wall meshes, re-centered from a georeferenced frame
pub fn scenario_geometry() -> GeometryBundle {
    let original = Aabb::new(
        [2_683_000.0, 1_247_000.0, 430.0],
        [2_683_011.0, 1_247_000.0, 433.0],
    );
    let shift = [2_683_000.0, 1_247_000.0, 430.0];
    GeometryBundle::from_meshes(
        vec![wall_mesh(WALL_A, 0.0), wall_mesh(WALL_B, 5.5)],
        CoordinateInfo::new(shift, original, true),
    )
}

/// Byte offset of directory entry `index`
pub fn entry_offset(index: usize) -> usize {
    HEADER_SIZE + index * SECTION_ENTRY_SIZE
}

fn put_entry(out: &mut Vec<u8>, entry: &SectionEntry) {
    out.extend_from_slice(&entry.section_type.code().to_le_bytes());
    out.extend_from_slice(&entry.flags.to_le_bytes());
    out.extend_from_slice(&entry.offset.to_le_bytes());
    out.extend_from_slice(&entry.size.to_le_bytes());
    out.extend_from_slice(&entry.compressed_size.to_le_bytes());
}

/// Rebuild `blob` with one extra section of type `code` appended after the
/// existing ones
pub fn append_section(blob: &[u8], code: u32, payload: &[u8]) -> Vec<u8> {
    let info = BinaryCacheReader::read_header(blob).expect("fixture blob must parse");
    let old_directory_end = entry_offset(info.sections.len());

    let mut out = Vec::with_capacity(blob.len() + SECTION_ENTRY_SIZE + payload.len());
    out.extend_from_slice(&blob[..HEADER_SIZE]);
    let count = info.header.section_count + 1;
    out[36..40].copy_from_slice(&count.to_le_bytes());

    let shift = SECTION_ENTRY_SIZE as u64;
    for entry in &info.sections {
        let mut moved = *entry;
        moved.offset += shift;
        put_entry(&mut out, &moved);
    }
    let extra = SectionEntry {
        section_type: ifc_binary_cache::SectionType::from_code(code),
        flags: 0,
        offset: (blob.len() + SECTION_ENTRY_SIZE) as u64,
        size: payload.len() as u64,
        compressed_size: 0,
    };
    put_entry(&mut out, &extra);

    out.extend_from_slice(&blob[old_directory_end..]);
    out.extend_from_slice(payload);
    out
}
