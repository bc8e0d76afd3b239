// SPDX-License-Identifier: MIT
//! Relationships section: u32 count, then columns
//! sources | targets | type codes | relationship ids (u32 each)

use crate::buffer::{ByteReader, ByteWriter};
use crate::error::Result;
use crate::store::{RelationshipGraph, RelationshipType};

const ROW_SIZE: usize = 4 * 4;

pub(crate) fn encoded_len(graph: &RelationshipGraph) -> usize {
    4 + graph.len() * ROW_SIZE
}

pub(crate) fn encode(graph: &RelationshipGraph, w: &mut ByteWriter) -> Result<()> {
    w.put_len(graph.len())?;
    w.put_u32_slice(&graph.sources)?;
    w.put_u32_slice(&graph.targets)?;
    for ty in &graph.types {
        w.put_u32(ty.code())?;
    }
    w.put_u32_slice(&graph.rel_ids)
}

pub(crate) fn decode(bytes: &[u8]) -> Result<RelationshipGraph> {
    let mut r = ByteReader::new(bytes);
    let count = r.read_count(ROW_SIZE)?;

    let mut graph = RelationshipGraph::new();
    graph.sources = r.read_u32_vec(count)?;
    graph.targets = r.read_u32_vec(count)?;
    graph.types = r
        .read_u32_vec(count)?
        .into_iter()
        .map(RelationshipType::from_code)
        .collect();
    graph.rel_ids = r.read_u32_vec(count)?;
    r.expect_exhausted("relationships section")?;

    graph.rebuild_index();
    Ok(graph)
}
