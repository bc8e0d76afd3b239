// SPDX-License-Identifier: MIT
//! Spatial hierarchy rebuilt from relationship edges
//!
//! Never serialized: the tree is derived on demand from Aggregates edges
//! (project → site → building → storey → space) and ContainsElements edges
//! (spatial structure → element).

use std::collections::{HashMap, HashSet, VecDeque};

use super::relationships::{Direction, RelationshipType};
use super::DataStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpatialKind {
    Project,
    Site,
    Building,
    Storey,
    Space,
}

impl SpatialKind {
    pub fn from_type_name(type_name: &str) -> Option<Self> {
        let upper = type_name.to_ascii_uppercase();
        Some(match upper.as_str() {
            "IFCPROJECT" => SpatialKind::Project,
            "IFCSITE" => SpatialKind::Site,
            "IFCBUILDING" => SpatialKind::Building,
            "IFCBUILDINGSTOREY" => SpatialKind::Storey,
            "IFCSPACE" => SpatialKind::Space,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpatialNode {
    pub entity_id: u32,
    pub parent_id: Option<u32>,
    pub kind: SpatialKind,
    /// Depth below the project (project = 0)
    pub level: u16,
    /// Slash-joined names from the project down, e.g. `Project/Site/Main`
    pub path: String,
    pub name: Option<String>,
    /// Directly aggregated spatial children
    pub children: Vec<u32>,
    /// Non-spatial elements contained in this node
    pub elements: Vec<u32>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpatialHierarchy {
    project_id: Option<u32>,
    nodes: Vec<SpatialNode>,
    index: HashMap<u32, usize>,
    containers: HashMap<u32, u32>,
}

impl SpatialHierarchy {
    /// Walk the store's relationships breadth-first from the project
    pub fn build(store: &DataStore) -> Self {
        let entities = store.entities();
        let graph = store.relationships();
        let kind_of = |id: u32| entities.type_name(id).and_then(SpatialKind::from_type_name);

        let Some(project_id) = entities
            .ids()
            .iter()
            .copied()
            .find(|&id| kind_of(id) == Some(SpatialKind::Project))
        else {
            return Self::default();
        };

        let mut hierarchy = Self {
            project_id: Some(project_id),
            ..Self::default()
        };
        let mut visited = HashSet::from([project_id]);
        let mut queue = VecDeque::from([(project_id, None, 0u16, String::new())]);

        while let Some((id, parent_id, level, parent_path)) = queue.pop_front() {
            let Some(kind) = kind_of(id) else { continue };
            let name = entities.name(id);
            let segment = match name {
                Some(name) => name.to_owned(),
                None => format!("{}#{id}", entities.type_name(id).unwrap_or_default()),
            };
            let path = if parent_path.is_empty() {
                segment
            } else {
                format!("{parent_path}/{segment}")
            };

            let children: Vec<u32> = graph
                .related(id, RelationshipType::Aggregates, Direction::Forward)
                .into_iter()
                .filter(|&child| kind_of(child).is_some() && visited.insert(child))
                .collect();
            let elements = graph.related(id, RelationshipType::ContainsElements, Direction::Forward);

            for &element in &elements {
                hierarchy.containers.entry(element).or_insert(id);
            }
            for &child in &children {
                queue.push_back((child, Some(id), level.saturating_add(1), path.clone()));
            }

            hierarchy.index.insert(id, hierarchy.nodes.len());
            hierarchy.nodes.push(SpatialNode {
                entity_id: id,
                parent_id,
                kind,
                level,
                path,
                name: name.map(str::to_owned),
                children,
                elements,
            });
        }

        tracing::debug!(
            project_id,
            nodes = hierarchy.nodes.len(),
            contained = hierarchy.containers.len(),
            "Built spatial hierarchy"
        );
        hierarchy
    }

    pub fn project_id(&self) -> Option<u32> {
        self.project_id
    }

    /// Nodes in breadth-first order from the project
    pub fn nodes(&self) -> &[SpatialNode] {
        &self.nodes
    }

    pub fn node(&self, entity_id: u32) -> Option<&SpatialNode> {
        self.index.get(&entity_id).map(|&i| &self.nodes[i])
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Spatial node directly containing `element_id`
    pub fn container_of(&self, element_id: u32) -> Option<u32> {
        self.containers.get(&element_id).copied()
    }

    /// Nearest node of `kind` at or above `entity_id`
    pub fn ancestor(&self, entity_id: u32, kind: SpatialKind) -> Option<u32> {
        let mut current = self.node(entity_id);
        while let Some(node) = current {
            if node.kind == kind {
                return Some(node.entity_id);
            }
            current = node.parent_id.and_then(|p| self.node(p));
        }
        None
    }

    pub fn storey_of(&self, element_id: u32) -> Option<u32> {
        self.ancestor(self.container_of(element_id)?, SpatialKind::Storey)
    }

    pub fn building_of(&self, element_id: u32) -> Option<u32> {
        self.ancestor(self.container_of(element_id)?, SpatialKind::Building)
    }

    pub fn site_of(&self, element_id: u32) -> Option<u32> {
        self.ancestor(self.container_of(element_id)?, SpatialKind::Site)
    }

    /// Space containing `element_id`; `None` for elements placed directly
    /// in a storey or above
    pub fn space_of(&self, element_id: u32) -> Option<u32> {
        self.ancestor(self.container_of(element_id)?, SpatialKind::Space)
    }
}
