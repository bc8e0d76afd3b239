// SPDX-License-Identifier: MIT
//! Tessellated geometry and coordinate normalization records
//!
//! Large real-world coordinates lose precision in `f32`, so upstream code
//! re-centers meshes near the origin before they reach the cache. The shift
//! and both bounding boxes are persisted verbatim; nothing here recomputes
//! them. Decoded geometry is always owned, never a view into the blob.

use serde::Serialize;

/// Axis-aligned bounding box in model units
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Aabb {
    pub min: [f64; 3],
    pub max: [f64; 3],
}

impl Aabb {
    pub fn new(min: [f64; 3], max: [f64; 3]) -> Self {
        Self { min, max }
    }

    /// This box translated by `-shift`
    pub fn shifted(&self, shift: [f64; 3]) -> Self {
        Self {
            min: [
                self.min[0] - shift[0],
                self.min[1] - shift[1],
                self.min[2] - shift[2],
            ],
            max: [
                self.max[0] - shift[0],
                self.max[1] - shift[1],
                self.max[2] - shift[2],
            ],
        }
    }

    pub fn center(&self) -> [f64; 3] {
        [
            (self.min[0] + self.max[0]) * 0.5,
            (self.min[1] + self.max[1]) * 0.5,
            (self.min[2] + self.max[2]) * 0.5,
        ]
    }
}

/// Origin shift applied to stored geometry
///
/// Invariant: `shifted_bounds == original_bounds - origin_shift`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct CoordinateInfo {
    pub origin_shift: [f64; 3],
    pub original_bounds: Aabb,
    pub shifted_bounds: Aabb,
    /// Source model carried real-world georeferencing
    pub is_geo_referenced: bool,
}

impl CoordinateInfo {
    /// Build from a shift and the pre-shift bounds
    pub fn new(origin_shift: [f64; 3], original_bounds: Aabb, is_geo_referenced: bool) -> Self {
        Self {
            origin_shift,
            original_bounds,
            shifted_bounds: original_bounds.shifted(origin_shift),
            is_geo_referenced,
        }
    }

    pub fn has_shift(&self) -> bool {
        self.origin_shift != [0.0; 3]
    }
}

/// One mesh fragment owned by an entity
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MeshData {
    pub express_id: u32,
    /// x, y, z triples
    pub positions: Vec<f32>,
    /// x, y, z triples; empty when the mesh carries no normals
    pub normals: Vec<f32>,
    pub indices: Vec<u32>,
    /// RGBA in 0..=1
    pub color: [f32; 4],
}

impl MeshData {
    pub fn new(
        express_id: u32,
        positions: Vec<f32>,
        normals: Vec<f32>,
        indices: Vec<u32>,
        color: [f32; 4],
    ) -> Self {
        Self {
            express_id,
            positions,
            normals,
            indices,
            color,
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty() || self.indices.is_empty()
    }
}

/// Geometry handed to the writer and returned by the reader
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GeometryBundle {
    pub meshes: Vec<MeshData>,
    pub total_vertices: u32,
    pub total_triangles: u32,
    pub coordinate_info: CoordinateInfo,
}

impl GeometryBundle {
    /// Bundle meshes, deriving the aggregate counts
    pub fn from_meshes(meshes: Vec<MeshData>, coordinate_info: CoordinateInfo) -> Self {
        let total_vertices = meshes.iter().map(MeshData::vertex_count).sum::<usize>();
        let total_triangles = meshes.iter().map(MeshData::triangle_count).sum::<usize>();
        Self {
            meshes,
            total_vertices: u32::try_from(total_vertices).unwrap_or(u32::MAX),
            total_triangles: u32::try_from(total_triangles).unwrap_or(u32::MAX),
            coordinate_info,
        }
    }

    pub fn mesh_count(&self) -> usize {
        self.meshes.len()
    }

    pub fn meshes_for(&self, express_id: u32) -> impl Iterator<Item = &MeshData> {
        self.meshes.iter().filter(move |m| m.express_id == express_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle(express_id: u32) -> MeshData {
        MeshData::new(
            express_id,
            vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0],
            vec![0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0],
            vec![0, 1, 2],
            [0.8, 0.8, 0.8, 1.0],
        )
    }

    #[test]
    fn test_mesh_counts() {
        let mesh = triangle(1);
        assert_eq!(mesh.vertex_count(), 3);
        assert_eq!(mesh.triangle_count(), 1);
        assert!(!mesh.is_empty());
        assert!(MeshData::default().is_empty());
    }

    #[test]
    fn test_bundle_totals() {
        let bundle =
            GeometryBundle::from_meshes(vec![triangle(1), triangle(2)], CoordinateInfo::default());
        assert_eq!(bundle.mesh_count(), 2);
        assert_eq!(bundle.total_vertices, 6);
        assert_eq!(bundle.total_triangles, 2);
        assert_eq!(bundle.meshes_for(2).count(), 1);
    }

    #[test]
    fn test_shifted_bounds() {
        let original = Aabb::new(
            [2_600_000.0, 1_200_000.0, 400.0],
            [2_600_050.0, 1_200_030.0, 420.0],
        );
        let shift = original.center();
        let info = CoordinateInfo::new(shift, original, true);

        assert!(info.has_shift());
        for axis in 0..3 {
            assert_eq!(
                info.shifted_bounds.min[axis],
                original.min[axis] - shift[axis]
            );
            assert_eq!(
                info.shifted_bounds.max[axis],
                original.max[axis] - shift[axis]
            );
        }
        assert_eq!(info.shifted_bounds.min[0], -25.0);
    }
}
