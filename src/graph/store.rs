//! Immutable in-memory snapshot of the entity/relationship table.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use serde::{Deserialize, Serialize};

use super::{Entity, EntityKind, Relationship};

/// Whole-graph statistics shown next to the explorer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphStats {
    pub node_count: usize,
    pub edge_count: usize,
    pub density: f64,
}

/// Entities and relationships keyed by flat indices.
///
/// Adjacency lists hold indices into `relationships`, so a neighbor lookup
/// never clones strings.
#[derive(Debug, Clone, Default)]
pub struct RelationshipStore {
    entities: Vec<Entity>,
    index: HashMap<String, usize>,
    relationships: Vec<Relationship>,
    outgoing: Vec<Vec<usize>>,
    incoming: Vec<Vec<usize>>,
}

impl RelationshipStore {
    /// Build a store from explicit entities plus relationships.
    ///
    /// Identical relationship tuples collapse to one. Endpoints not listed in
    /// `entities` are added as companies. Later duplicates of an entity name
    /// overwrite the kind of earlier ones.
    pub fn from_relationships(entities: Vec<Entity>, relationships: Vec<Relationship>) -> Self {
        let mut kinds: BTreeMap<String, EntityKind> = BTreeMap::new();
        for entity in entities {
            kinds.insert(entity.name, entity.kind);
        }
        for rel in &relationships {
            kinds.entry(rel.source.clone()).or_insert(EntityKind::Company);
            kinds.entry(rel.target.clone()).or_insert(EntityKind::Company);
        }

        let entities: Vec<Entity> = kinds
            .into_iter()
            .map(|(name, kind)| Entity { name, kind })
            .collect();
        let index: HashMap<String, usize> = entities
            .iter()
            .enumerate()
            .map(|(i, e)| (e.name.clone(), i))
            .collect();

        let mut relationships: Vec<Relationship> = relationships
            .into_iter()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        relationships.shrink_to_fit();

        let mut outgoing = vec![Vec::new(); entities.len()];
        let mut incoming = vec![Vec::new(); entities.len()];
        for (i, rel) in relationships.iter().enumerate() {
            outgoing[index[&rel.source]].push(i);
            incoming[index[&rel.target]].push(i);
        }

        Self {
            entities,
            index,
            relationships,
            outgoing,
            incoming,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn entity(&self, name: &str) -> Option<&Entity> {
        self.index.get(name).map(|&i| &self.entities[i])
    }

    /// Kind of a known entity; unknown names default to company
    pub fn kind_of(&self, name: &str) -> EntityKind {
        self.entity(name).map(|e| e.kind).unwrap_or(EntityKind::Company)
    }

    /// All entities sorted by name
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn entity_names(&self) -> Vec<String> {
        self.entities.iter().map(|e| e.name.clone()).collect()
    }

    /// All distinct relationships, sorted
    pub fn relationships(&self) -> &[Relationship] {
        &self.relationships
    }

    /// Targets of relationships leaving `name`
    pub fn successors<'a>(&'a self, name: &str) -> impl Iterator<Item = &'a str> + 'a {
        let rels = self.index.get(name).map(|&i| self.outgoing[i].as_slice()).unwrap_or(&[]);
        rels.iter().map(move |&r| self.relationships[r].target.as_str())
    }

    /// Sources of relationships entering `name`
    pub fn predecessors<'a>(&'a self, name: &str) -> impl Iterator<Item = &'a str> + 'a {
        let rels = self.index.get(name).map(|&i| self.incoming[i].as_slice()).unwrap_or(&[]);
        rels.iter().map(move |&r| self.relationships[r].source.as_str())
    }

    /// Direct neighbors in either direction, without duplicates
    pub fn neighbors<'a>(&'a self, name: &str) -> BTreeSet<&'a str> {
        self.successors(name).chain(self.predecessors(name)).collect()
    }

    /// Every relationship whose endpoints are both in `nodes`
    pub fn relationships_among(&self, nodes: &HashSet<&str>) -> Vec<&Relationship> {
        let mut out = Vec::new();
        for name in nodes {
            let Some(&i) = self.index.get(*name) else {
                continue;
            };
            for &r in &self.outgoing[i] {
                let rel = &self.relationships[r];
                if nodes.contains(rel.target.as_str()) {
                    out.push(rel);
                }
            }
        }
        out.sort();
        out
    }

    /// Distinct relationship types present in the table
    pub fn relationship_types(&self) -> BTreeSet<&str> {
        self.relationships
            .iter()
            .map(|r| r.relationship_type.as_str())
            .collect()
    }

    /// Relationship count per type
    pub fn type_counts(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for rel in &self.relationships {
            *counts.entry(rel.relationship_type.clone()).or_insert(0) += 1;
        }
        counts
    }

    /// Directed density counts distinct ordered pairs, so parallel
    /// relationships of different types do not push it past 1.0.
    pub fn stats(&self) -> GraphStats {
        let n = self.entities.len();
        let pairs: HashSet<(&str, &str)> = self
            .relationships
            .iter()
            .map(|r| (r.source.as_str(), r.target.as_str()))
            .collect();
        let density = if n < 2 {
            0.0
        } else {
            pairs.len() as f64 / (n as f64 * (n as f64 - 1.0))
        };

        GraphStats {
            node_count: n,
            edge_count: self.relationships.len(),
            density,
        }
    }
}
