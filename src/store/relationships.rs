// SPDX-License-Identifier: MIT
//! Typed, directed relationship graph with forward and inverse adjacency

use std::collections::HashMap;

/// Relationship kinds, stored as stable integer codes
///
/// Codes not known to this build decode to [`RelationshipType::Other`] and
/// survive a rewrite unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelationshipType {
    /// IfcRelContainedInSpatialStructure: structure → element
    ContainsElements,
    /// IfcRelAggregates: whole → part
    Aggregates,
    DefinesByProperties,
    DefinesByType,
    AssociatesMaterial,
    VoidsElement,
    FillsElement,
    ConnectsPathElements,
    SpaceBoundary,
    AssignsToGroup,
    Other(u32),
}

impl RelationshipType {
    pub fn code(self) -> u32 {
        match self {
            RelationshipType::ContainsElements => 1,
            RelationshipType::Aggregates => 2,
            RelationshipType::DefinesByProperties => 3,
            RelationshipType::DefinesByType => 4,
            RelationshipType::AssociatesMaterial => 5,
            RelationshipType::VoidsElement => 6,
            RelationshipType::FillsElement => 7,
            RelationshipType::ConnectsPathElements => 8,
            RelationshipType::SpaceBoundary => 9,
            RelationshipType::AssignsToGroup => 10,
            RelationshipType::Other(code) => code,
        }
    }

    pub fn from_code(code: u32) -> Self {
        match code {
            1 => RelationshipType::ContainsElements,
            2 => RelationshipType::Aggregates,
            3 => RelationshipType::DefinesByProperties,
            4 => RelationshipType::DefinesByType,
            5 => RelationshipType::AssociatesMaterial,
            6 => RelationshipType::VoidsElement,
            7 => RelationshipType::FillsElement,
            8 => RelationshipType::ConnectsPathElements,
            9 => RelationshipType::SpaceBoundary,
            10 => RelationshipType::AssignsToGroup,
            other => RelationshipType::Other(other),
        }
    }

    /// Map an IFC relationship entity name (any case) to its kind
    pub fn from_ifc_name(name: &str) -> Option<Self> {
        let upper = name.to_ascii_uppercase();
        Some(match upper.as_str() {
            "IFCRELCONTAINEDINSPATIALSTRUCTURE" => RelationshipType::ContainsElements,
            "IFCRELAGGREGATES" => RelationshipType::Aggregates,
            "IFCRELDEFINESBYPROPERTIES" => RelationshipType::DefinesByProperties,
            "IFCRELDEFINESBYTYPE" => RelationshipType::DefinesByType,
            "IFCRELASSOCIATESMATERIAL" => RelationshipType::AssociatesMaterial,
            "IFCRELVOIDSELEMENT" => RelationshipType::VoidsElement,
            "IFCRELFILLSELEMENT" => RelationshipType::FillsElement,
            "IFCRELCONNECTSPATHELEMENTS" => RelationshipType::ConnectsPathElements,
            "IFCRELSPACEBOUNDARY" => RelationshipType::SpaceBoundary,
            "IFCRELASSIGNSTOGROUP" => RelationshipType::AssignsToGroup,
            _ => return None,
        })
    }
}

/// Traversal direction for [`RelationshipGraph::related`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// source → targets
    Forward,
    /// target → sources
    Inverse,
}

/// One directed edge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Relationship {
    pub rel_type: RelationshipType,
    /// Express id of the relationship entity the edge came from
    pub rel_id: u32,
    pub source: u32,
    pub target: u32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RelationshipGraph {
    pub(crate) sources: Vec<u32>,
    pub(crate) targets: Vec<u32>,
    pub(crate) types: Vec<RelationshipType>,
    pub(crate) rel_ids: Vec<u32>,
    forward: HashMap<u32, Vec<usize>>,
    inverse: HashMap<u32, Vec<usize>>,
}

impl RelationshipGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_edge(&mut self, edge: Relationship) {
        let index = self.sources.len();
        self.forward.entry(edge.source).or_default().push(index);
        self.inverse.entry(edge.target).or_default().push(index);
        self.sources.push(edge.source);
        self.targets.push(edge.target);
        self.types.push(edge.rel_type);
        self.rel_ids.push(edge.rel_id);
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    pub fn edge(&self, index: usize) -> Option<Relationship> {
        Some(Relationship {
            rel_type: *self.types.get(index)?,
            rel_id: self.rel_ids[index],
            source: self.sources[index],
            target: self.targets[index],
        })
    }

    pub fn edges(&self) -> impl Iterator<Item = Relationship> + '_ {
        (0..self.len()).filter_map(move |i| self.edge(i))
    }

    /// Entities reachable from `id` over edges of `rel_type`
    ///
    /// Forward yields targets of edges whose source is `id`; inverse yields
    /// sources of edges whose target is `id`. Order follows insertion.
    pub fn related(&self, id: u32, rel_type: RelationshipType, direction: Direction) -> Vec<u32> {
        let (index, other) = match direction {
            Direction::Forward => (&self.forward, &self.targets),
            Direction::Inverse => (&self.inverse, &self.sources),
        };
        index
            .get(&id)
            .map(|edges| {
                edges
                    .iter()
                    .filter(|&&i| self.types[i] == rel_type)
                    .map(|&i| other[i])
                    .collect()
            })
            .unwrap_or_default()
    }

    pub(crate) fn rebuild_index(&mut self) {
        self.forward.clear();
        self.inverse.clear();
        for i in 0..self.sources.len() {
            self.forward.entry(self.sources[i]).or_default().push(i);
            self.inverse.entry(self.targets[i]).or_default().push(i);
        }
    }
}
