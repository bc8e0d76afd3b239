// SPDX-License-Identifier: MIT
//! Geometry section
//!
//! ```text
//! mesh count, total vertices, total triangles      3 × u32
//! origin shift                                     3 × f64
//! original bounds (min, max)                       6 × f64
//! shifted bounds (min, max)                        6 × f64
//! geo-referenced                                   u8
//! per mesh:
//!   express id, positions len, normals len,
//!   indices len                                    4 × u32
//!   color                                          4 × f32
//!   positions | normals                            f32 arrays
//!   indices                                        u32 array
//! ```
//!
//! Array lengths are element counts, not byte counts.

use crate::buffer::{ByteReader, ByteWriter};
use crate::error::{CacheError, Result};
use crate::geometry::{Aabb, CoordinateInfo, GeometryBundle, MeshData};

const HEAD_SIZE: usize = 3 * 4 + 15 * 8 + 1;
const MESH_HEAD_SIZE: usize = 4 * 4 + 4 * 4;

pub(crate) fn encoded_len(bundle: &GeometryBundle) -> usize {
    HEAD_SIZE
        + bundle
            .meshes
            .iter()
            .map(|m| MESH_HEAD_SIZE + 4 * (m.positions.len() + m.normals.len() + m.indices.len()))
            .sum::<usize>()
}

fn put_aabb(w: &mut ByteWriter, aabb: &Aabb) -> Result<()> {
    w.put_f64_slice(&aabb.min)?;
    w.put_f64_slice(&aabb.max)
}

fn read_vec3(r: &mut ByteReader<'_>) -> Result<[f64; 3]> {
    Ok([r.read_f64()?, r.read_f64()?, r.read_f64()?])
}

fn read_aabb(r: &mut ByteReader<'_>) -> Result<Aabb> {
    Ok(Aabb::new(read_vec3(r)?, read_vec3(r)?))
}

pub(crate) fn encode(bundle: &GeometryBundle, w: &mut ByteWriter) -> Result<()> {
    let info = &bundle.coordinate_info;
    w.put_len(bundle.meshes.len())?;
    w.put_u32(bundle.total_vertices)?;
    w.put_u32(bundle.total_triangles)?;
    w.put_f64_slice(&info.origin_shift)?;
    put_aabb(w, &info.original_bounds)?;
    put_aabb(w, &info.shifted_bounds)?;
    w.put_u8(u8::from(info.is_geo_referenced))?;

    for (i, mesh) in bundle.meshes.iter().enumerate() {
        if mesh.positions.len() % 3 != 0 || mesh.normals.len() % 3 != 0 {
            return Err(CacheError::Unencodable(format!(
                "mesh {i} (#{}): vertex arrays must hold xyz triples",
                mesh.express_id
            )));
        }
        w.put_u32(mesh.express_id)?;
        w.put_len(mesh.positions.len())?;
        w.put_len(mesh.normals.len())?;
        w.put_len(mesh.indices.len())?;
        w.put_f32_slice(&mesh.color)?;
        w.put_f32_slice(&mesh.positions)?;
        w.put_f32_slice(&mesh.normals)?;
        w.put_u32_slice(&mesh.indices)?;
    }
    Ok(())
}

pub(crate) fn decode(bytes: &[u8]) -> Result<GeometryBundle> {
    let mut r = ByteReader::new(bytes);
    let mesh_count = r.read_count(MESH_HEAD_SIZE)?;
    let total_vertices = r.read_u32()?;
    let total_triangles = r.read_u32()?;
    let origin_shift = read_vec3(&mut r)?;
    let original_bounds = read_aabb(&mut r)?;
    let shifted_bounds = read_aabb(&mut r)?;
    let is_geo_referenced = match r.read_u8()? {
        0 => false,
        1 => true,
        other => {
            return Err(CacheError::corrupt(format!(
                "geo-referenced flag must be 0 or 1, got {other}"
            )))
        }
    };

    let mut meshes = Vec::with_capacity(mesh_count);
    for i in 0..mesh_count {
        let express_id = r.read_u32()?;
        let positions_len = r.read_u32()? as usize;
        let normals_len = r.read_u32()? as usize;
        let indices_len = r.read_u32()? as usize;
        if positions_len % 3 != 0 || normals_len % 3 != 0 {
            return Err(CacheError::corrupt(format!(
                "mesh {i} (#{express_id}): vertex arrays must hold xyz triples"
            )));
        }
        let color = [r.read_f32()?, r.read_f32()?, r.read_f32()?, r.read_f32()?];
        let positions = r.read_f32_vec(positions_len)?;
        let normals = r.read_f32_vec(normals_len)?;
        let indices = r.read_u32_vec(indices_len)?;
        meshes.push(MeshData::new(express_id, positions, normals, indices, color));
    }
    r.expect_exhausted("geometry section")?;

    Ok(GeometryBundle {
        meshes,
        total_vertices,
        total_triangles,
        coordinate_info: CoordinateInfo {
            origin_shift,
            original_bounds,
            shifted_bounds,
            is_geo_referenced,
        },
    })
}
