// SPDX-License-Identifier: MIT
//! # IFC Binary Cache
//!
//! Versioned binary cache for a fully parsed IFC building model. A
//! [`DataStore`] (entities, properties, quantities, relationships) and an
//! optional [`GeometryBundle`] are written to one contiguous blob that can
//! be reloaded without re-parsing the source model.
//!
//! ## Format Overview
//!
//! A fixed header is followed by a section directory and the section
//! payloads. Every section is located by offset arithmetic alone, so the
//! reader can inspect the header, check freshness or skip geometry without
//! touching the other sections.
//!
//! ```text
//! IFC Binary Cache v1 (all fields little-endian)
//! ==============================================
//!
//! Header (40 bytes):
//! - Magic: "IFCB" (4 bytes)
//! - Version: 1 (u32)
//! - Flags: bit0 HasGeometry, bit1 HasSpatial (u32)
//! - Source hash: xxh64 of the source file (u64)
//! - Schema: IFC2X3=0, IFC4=1, IFC4X3=2, IFC5=3 (u32)
//! - Entity count, total vertices, total triangles (3 × u32)
//! - Section count (u32)
//!
//! Section directory (32 bytes per entry):
//! - Type (u32), flags (u32; bit0 = zlib-compressed)
//! - Offset from blob start (u64)
//! - Decoded size (u64), stored size when compressed else 0 (u64)
//!
//! Sections, back to back in directory order:
//! - Strings, Entities, Properties, Quantities, Relationships
//! - Geometry (only when HasGeometry is set)
//! ```
//!
//! Text is never stored inline: every section refers to the single string
//! table by index. Section types a reader does not know are skipped.
//!
//! ## Usage
//!
//! ```rust
//! use ifc_binary_cache::{
//!     BinaryCacheReader, BinaryCacheWriter, DataStore, EntityAttributes, SchemaVersion, Value,
//! };
//!
//! let source = b"ISO-10303-21; ...";
//!
//! let mut store = DataStore::new(SchemaVersion::Ifc4);
//! store.add_entity(1, "IfcProject", EntityAttributes::named("Test Project"));
//! store.add_entity(4, "IfcWall", EntityAttributes::named("Wall A"));
//! store.add_property(4, 10, "Pset_WallCommon", "FireRating", Value::Text("REI60"));
//!
//! let blob = BinaryCacheWriter::new().write(&store, None, source)?;
//!
//! assert!(BinaryCacheReader::validate(&blob, source)?);
//! let cached = BinaryCacheReader::new().read(&blob)?;
//! assert_eq!(cached.data_store.entities().name(1), Some("Test Project"));
//! assert_eq!(
//!     cached.data_store.properties().value(4, "Pset_WallCommon", "FireRating"),
//!     Some(Value::Text("REI60"))
//! );
//! # Ok::<(), ifc_binary_cache::CacheError>(())
//! ```

mod buffer;
mod sections;

pub mod compression_strategy;
pub mod config;
pub mod container;
pub mod error;
pub mod format;
pub mod geometry;
pub mod hash;
pub mod reader;
pub mod store;
pub mod writer;

pub use compression_strategy::CompressionStrategy;
pub use config::{ReadOptions, WriteOptions};
pub use container::{CacheStats, CacheView, SectionStats};
pub use error::{CacheError, Result};
pub use format::{
    CacheHeader, SchemaVersion, SectionEntry, SectionType, CACHE_MAGIC, CACHE_VERSION,
    HEADER_SIZE, SECTION_ENTRY_SIZE,
};
pub use geometry::{Aabb, CoordinateInfo, GeometryBundle, MeshData};
pub use hash::SourceHash;
pub use reader::{BinaryCacheReader, CacheHeaderInfo, CacheReadResult};
pub use store::{
    DataStore, Direction, EntityAttributes, Logical, PropertyValue, QuantityKind, Relationship,
    RelationshipGraph, RelationshipType, SpatialHierarchy, SpatialKind, SpatialNode, StringId,
    StringTable, Value,
};
pub use writer::BinaryCacheWriter;
