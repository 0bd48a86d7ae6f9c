//! Relationship graph: data model, in-memory store and the two query algorithms.
//!
//! The store is an immutable snapshot of the uploaded table. Queries never
//! mutate it; they derive a [`GraphView`] of render nodes and edges for either
//! incremental expansion ([`interactive_query`]) or a depth-bounded
//! neighborhood ([`radial_query`]).

mod expansion;
mod palette;
mod store;
mod traversal;

pub use expansion::{interactive_query, ExpansionState};
pub use palette::{normalize_type, ColorPalette, LegendEntry};
pub use store::{GraphStats, RelationshipStore};
pub use traversal::{radial_query, reachable_within};

use serde::{Deserialize, Serialize};

/// Size of the session's starting entity
pub const ROOT_NODE_SIZE: f64 = 35.0;
/// Size of an entity whose neighbors are revealed
pub const EXPANDED_NODE_SIZE: f64 = 28.0;
/// Size of every other entity
pub const DEFAULT_NODE_SIZE: f64 = 25.0;

/// Whether an entity is a person or a company
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Person,
    Company,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Person => "person",
            EntityKind::Company => "company",
        }
    }

    /// Parse an explicit kind label; anything unrecognised is a company.
    pub fn from_label(label: &str) -> Self {
        if label.trim().eq_ignore_ascii_case("person") {
            EntityKind::Person
        } else {
            EntityKind::Company
        }
    }
}

/// A named node of the relationship graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub name: String,
    pub kind: EntityKind,
}

/// A directed, typed edge `source --relationship_type--> target`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Relationship {
    pub source: String,
    pub target: String,
    pub relationship_type: String,
    pub relationship_sub_type: String,
}

/// Display-ready node of one query result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderNode {
    pub id: String,
    pub label: String,
    #[serde(rename = "type")]
    pub kind: EntityKind,
    pub size: f64,
    pub expandable: bool,
    pub expanded: bool,
    pub root: bool,
}

/// Display-ready edge of one query result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderEdge {
    pub source: String,
    pub target: String,
    pub color: String,
    pub relationship_type: String,
    pub relationship_sub_type: String,
}

/// Node/edge set computed for one user action
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphView {
    pub nodes: Vec<RenderNode>,
    pub links: Vec<RenderEdge>,
    /// Ids of nodes the user may click to expand (always empty for radial views)
    #[serde(default)]
    pub expandable_nodes: Vec<String>,
}

impl GraphView {
    pub fn node(&self, id: &str) -> Option<&RenderNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn node_ids(&self) -> Vec<&str> {
        self.nodes.iter().map(|n| n.id.as_str()).collect()
    }
}

fn render_edge(rel: &Relationship, palette: &ColorPalette) -> RenderEdge {
    RenderEdge {
        source: rel.source.clone(),
        target: rel.target.clone(),
        color: palette.color_for(&rel.relationship_type),
        relationship_type: rel.relationship_type.clone(),
        relationship_sub_type: rel.relationship_sub_type.clone(),
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn rel(source: &str, relationship_type: &str, target: &str) -> Relationship {
        Relationship {
            source: source.to_string(),
            target: target.to_string(),
            relationship_type: relationship_type.to_string(),
            relationship_sub_type: String::new(),
        }
    }

    /// Alice -> Acme, Acme -> Bob, Bob -> Acme (all `employee`)
    pub fn alice_acme_bob() -> RelationshipStore {
        RelationshipStore::from_relationships(
            vec![
                Entity { name: "Alice".to_string(), kind: EntityKind::Person },
                Entity { name: "Bob".to_string(), kind: EntityKind::Person },
            ],
            vec![
                rel("Alice", "employee", "Acme"),
                rel("Acme", "employee", "Bob"),
                rel("Bob", "employee", "Acme"),
            ],
        )
    }

    /// Chain a - b - c - d - e plus a cycle e -> c and an isolated pair x -> y
    pub fn chain_with_cycle() -> RelationshipStore {
        RelationshipStore::from_relationships(
            vec![],
            vec![
                rel("a", "owns", "b"),
                rel("c", "owns", "b"),
                rel("c", "director", "d"),
                rel("d", "owns", "e"),
                rel("e", "control", "c"),
                rel("x", "owns", "y"),
            ],
        )
    }
}
