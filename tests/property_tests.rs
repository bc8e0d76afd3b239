// SPDX-License-Identifier: MIT
//! Property-based tests using proptest
//!
//! Random data stores and geometry must survive a write/read cycle, the
//! source hash must react to any single-byte edit, and no mutation of a
//! valid blob may make the reader panic.

use proptest::prelude::*;

use ifc_binary_cache::{
    Aabb, BinaryCacheReader, BinaryCacheWriter, CompressionStrategy, CoordinateInfo, DataStore,
    Direction, EntityAttributes, GeometryBundle, Logical, MeshData, QuantityKind,
    RelationshipType, SchemaVersion, SourceHash, Value, WriteOptions,
};

#[derive(Debug, Clone)]
enum ValueSpec {
    Null,
    Real(f64),
    Integer(i64),
    Boolean(bool),
    Logical(u8),
    Text(String),
    Enumerated(String),
}

impl ValueSpec {
    fn as_value(&self) -> Value<'_> {
        match self {
            ValueSpec::Null => Value::Null,
            ValueSpec::Real(v) => Value::Real(*v),
            ValueSpec::Integer(v) => Value::Integer(*v),
            ValueSpec::Boolean(v) => Value::Boolean(*v),
            ValueSpec::Logical(v) => Value::Logical(match v % 3 {
                0 => Logical::False,
                1 => Logical::True,
                _ => Logical::Unknown,
            }),
            ValueSpec::Text(s) => Value::Text(s),
            ValueSpec::Enumerated(s) => Value::Enumerated(s),
        }
    }
}

#[derive(Debug, Clone)]
struct ModelSpec {
    schema: SchemaVersion,
    entities: Vec<(u32, String, Option<String>, bool)>,
    properties: Vec<(usize, u32, String, String, ValueSpec)>,
    quantities: Vec<(usize, String, String, u8, f64)>,
    relationships: Vec<(u32, usize, usize)>,
}

/// Short IFC-like identifiers, including non-ASCII and empty text
fn text_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        "[A-Za-z_][A-Za-z0-9_]{0,12}",
        Just(String::new()),
        Just("Wärmedämmung".to_string()),
    ]
}

fn value_strategy() -> impl Strategy<Value = ValueSpec> {
    prop_oneof![
        Just(ValueSpec::Null),
        any::<f64>()
            .prop_filter("NaN never equals itself", |v| !v.is_nan())
            .prop_map(ValueSpec::Real),
        any::<i64>().prop_map(ValueSpec::Integer),
        any::<bool>().prop_map(ValueSpec::Boolean),
        any::<u8>().prop_map(ValueSpec::Logical),
        text_strategy().prop_map(ValueSpec::Text),
        text_strategy().prop_map(ValueSpec::Enumerated),
    ]
}

fn schema_strategy() -> impl Strategy<Value = SchemaVersion> {
    prop_oneof![
        Just(SchemaVersion::Ifc2x3),
        Just(SchemaVersion::Ifc4),
        Just(SchemaVersion::Ifc4x3),
        Just(SchemaVersion::Ifc5),
    ]
}

fn model_strategy() -> impl Strategy<Value = ModelSpec> {
    (
        schema_strategy(),
        prop::collection::vec(
            (
                1u32..100_000,
                text_strategy(),
                prop::option::of(text_strategy()),
                any::<bool>(),
            ),
            1..24,
        ),
        prop::collection::vec(
            (any::<usize>(), any::<u32>(), text_strategy(), text_strategy(), value_strategy()),
            0..32,
        ),
        prop::collection::vec(
            (
                any::<usize>(),
                text_strategy(),
                text_strategy(),
                0u8..6,
                -1.0e9f64..1.0e9,
            ),
            0..32,
        ),
        prop::collection::vec((1u32..=12, any::<usize>(), any::<usize>()), 0..32),
    )
        .prop_map(
            |(schema, entities, properties, quantities, relationships)| ModelSpec {
                schema,
                entities,
                properties,
                quantities,
                relationships,
            },
        )
}

fn quantity_kind(code: u8) -> QuantityKind {
    match code {
        0 => QuantityKind::Length,
        1 => QuantityKind::Area,
        2 => QuantityKind::Volume,
        3 => QuantityKind::Count,
        4 => QuantityKind::Weight,
        _ => QuantityKind::Time,
    }
}

fn build_store(model: &ModelSpec) -> DataStore {
    let mut store = DataStore::new(model.schema);
    for (id, type_name, name, has_geometry) in &model.entities {
        let mut attrs = EntityAttributes::default();
        attrs.name = name.as_deref();
        attrs.has_geometry = *has_geometry;
        store.add_entity(*id, &format!("Ifc{type_name}"), attrs);
    }

    let ids = store.entity_table().ids().to_vec();
    let pick = |i: usize| ids[i % ids.len()];
    for (entity, pset_id, pset, name, value) in &model.properties {
        store.add_property(pick(*entity), *pset_id, pset, name, value.as_value());
    }
    for (entity, qset, name, kind, value) in &model.quantities {
        store.add_quantity(pick(*entity), 7, qset, name, quantity_kind(*kind), *value);
    }
    for (code, source, target) in &model.relationships {
        store.add_relationship(
            RelationshipType::from_code(*code),
            *code * 1000,
            pick(*source),
            pick(*target),
        );
    }
    store
}

fn mesh_strategy() -> impl Strategy<Value = MeshData> {
    (1usize..8, any::<bool>(), 0usize..6).prop_flat_map(|(vertices, with_normals, triangles)| {
        (
            any::<u32>(),
            prop::collection::vec(-1.0e4f32..1.0e4, vertices * 3),
            prop::collection::vec(-1.0f32..1.0, if with_normals { vertices * 3 } else { 0 }),
            prop::collection::vec(0..vertices as u32, triangles * 3),
            prop::array::uniform4(0.0f32..=1.0),
        )
            .prop_map(|(id, positions, normals, indices, color)| {
                MeshData::new(id, positions, normals, indices, color)
            })
    })
}

fn geometry_strategy() -> impl Strategy<Value = GeometryBundle> {
    (
        prop::collection::vec(mesh_strategy(), 0..6),
        prop::array::uniform3(-1.0e7f64..1.0e7),
        any::<bool>(),
    )
        .prop_map(|(meshes, shift, geo)| {
            let bounds = Aabb::new(shift, [shift[0] + 10.0, shift[1] + 10.0, shift[2] + 10.0]);
            GeometryBundle::from_meshes(meshes, CoordinateInfo::new(shift, bounds, geo))
        })
}

proptest! {
    /// Every table survives a write/read cycle unchanged
    #[test]
    fn data_store_round_trip(model in model_strategy(), source in prop::collection::vec(any::<u8>(), 0..256)) {
        let store = build_store(&model);
        let blob = BinaryCacheWriter::new().write(&store, None, &source).unwrap();
        let result = BinaryCacheReader::new().read(&blob).unwrap();

        prop_assert_eq!(result.data_store.entity_count(), store.entity_count());
        for &id in store.entity_table().ids() {
            prop_assert_eq!(result.data_store.entities().name(id), store.entities().name(id));
            prop_assert_eq!(result.data_store.entities().type_name(id), store.entities().type_name(id));
        }
        for edge in store.relationships().edges() {
            let forward = result.data_store.relationships().related(edge.source, edge.rel_type, Direction::Forward);
            let inverse = result.data_store.relationships().related(edge.target, edge.rel_type, Direction::Inverse);
            prop_assert!(forward.contains(&edge.target));
            prop_assert!(inverse.contains(&edge.source));
        }
        prop_assert_eq!(&result.data_store, &store);
        prop_assert!(BinaryCacheReader::validate(&blob, &source).unwrap());
    }

    /// Geometry is stored bit-exact, including the coordinate record
    #[test]
    fn geometry_round_trip(geometry in geometry_strategy()) {
        let store = DataStore::new(SchemaVersion::Ifc4);
        let blob = BinaryCacheWriter::new().write(&store, Some(&geometry), b"src").unwrap();
        let result = BinaryCacheReader::new().read(&blob).unwrap();

        prop_assert_eq!(result.header.total_vertices, geometry.total_vertices);
        prop_assert_eq!(result.header.total_triangles, geometry.total_triangles);
        prop_assert_eq!(result.geometry, Some(geometry));
    }

    /// Compression never changes what the reader returns
    #[test]
    fn compression_is_transparent(model in model_strategy()) {
        let store = build_store(&model);
        let plain = BinaryCacheWriter::new().write(&store, None, b"src").unwrap();
        let packed = BinaryCacheWriter::with_options(
            WriteOptions::default().with_compression(CompressionStrategy::Always),
        );
        let packed = match packed.write(&store, None, b"src") {
            Ok(blob) => blob,
            // Builds without the compression feature refuse to compress
            Err(_) => return Ok(()),
        };

        let a = BinaryCacheReader::new().read(&plain).unwrap().data_store;
        let b = BinaryCacheReader::new().read(&packed).unwrap().data_store;
        prop_assert_eq!(a, b);
    }

    /// Any single-byte change to the source is detected
    #[test]
    fn hash_detects_single_byte_edit(
        source in prop::collection::vec(any::<u8>(), 1..512),
        index in any::<prop::sample::Index>(),
        flip in 1u8..=255,
    ) {
        let blob = BinaryCacheWriter::new().write(&DataStore::default(), None, &source).unwrap();
        let mut edited = source.clone();
        let i = index.index(edited.len());
        edited[i] ^= flip;

        prop_assert_ne!(SourceHash::of(&source), SourceHash::of(&edited));
        prop_assert!(!BinaryCacheReader::validate(&blob, &edited).unwrap());
    }

    /// Arbitrary byte corruption yields an error or a value, never a panic
    #[test]
    fn corrupted_blob_never_panics(
        model in model_strategy(),
        edits in prop::collection::vec((any::<prop::sample::Index>(), any::<u8>()), 1..8),
    ) {
        let store = build_store(&model);
        let mut blob = BinaryCacheWriter::new().write(&store, None, b"src").unwrap();
        for (index, byte) in edits {
            let i = index.index(blob.len());
            blob[i] = byte;
        }
        let _ = BinaryCacheReader::read_header(&blob);
        let _ = BinaryCacheReader::validate(&blob, b"src");
        let _ = BinaryCacheReader::new().read(&blob);
    }
}
