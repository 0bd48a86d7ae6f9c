//! Incremental expansion: the root plus the neighbors of every expanded entity.

use std::collections::HashSet;

use crate::error::{RelgraphError, Result};

use super::{
    render_edge, ColorPalette, GraphView, RelationshipStore, RenderNode, DEFAULT_NODE_SIZE,
    EXPANDED_NODE_SIZE, ROOT_NODE_SIZE,
};

/// Ordered set of expanded entity ids for one exploration session.
///
/// The root is always the first member. The set only grows until [`reset`](Self::reset).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpansionState {
    expanded: Vec<String>,
}

impl ExpansionState {
    pub fn new(root: impl Into<String>) -> Self {
        Self {
            expanded: vec![root.into()],
        }
    }

    /// Rebuild a state from a client request; the root is inserted if missing
    /// and repeated ids are dropped.
    pub fn from_request(root: &str, expanded_nodes: &[String]) -> Self {
        let mut state = Self::new(root);
        for id in expanded_nodes {
            state.expand(id.clone());
        }
        state
    }

    pub fn root(&self) -> &str {
        &self.expanded[0]
    }

    /// Append `id`; returns false if it was already expanded.
    pub fn expand(&mut self, id: impl Into<String>) -> bool {
        let id = id.into();
        if self.contains(&id) {
            return false;
        }
        self.expanded.push(id);
        true
    }

    pub fn contains(&self, id: &str) -> bool {
        self.expanded.iter().any(|e| e == id)
    }

    /// Back to `{root}`
    pub fn reset(&mut self) {
        self.expanded.truncate(1);
    }

    pub fn as_slice(&self) -> &[String] {
        &self.expanded
    }

    pub fn len(&self) -> usize {
        self.expanded.len()
    }

    pub fn is_empty(&self) -> bool {
        self.expanded.is_empty()
    }
}

/// Compute the incremental-expansion view for `state`.
///
/// Nodes are the root and the direct neighbors (both directions) of every
/// expanded entity; edges are all relationships between shown nodes. A node is
/// expandable while it is shown but not yet expanded. Expanded ids that are not
/// in the store are ignored.
pub fn interactive_query(
    store: &RelationshipStore,
    palette: &ColorPalette,
    state: &ExpansionState,
) -> Result<GraphView> {
    let root = state.root();
    if !store.contains(root) {
        return Err(RelgraphError::UnknownEntity(root.to_string()));
    }

    let mut shown: HashSet<&str> = HashSet::new();
    for id in state.as_slice() {
        let Some(entity) = store.entity(id) else {
            log::debug!("Ignoring unknown expanded entity {:?}", id);
            continue;
        };
        shown.insert(entity.name.as_str());
        shown.extend(store.neighbors(id));
    }

    let mut nodes: Vec<RenderNode> = shown
        .iter()
        .map(|&id| {
            let is_root = id == root;
            let expanded = state.contains(id);
            RenderNode {
                id: id.to_string(),
                label: id.to_string(),
                kind: store.kind_of(id),
                size: if is_root {
                    ROOT_NODE_SIZE
                } else if expanded {
                    EXPANDED_NODE_SIZE
                } else {
                    DEFAULT_NODE_SIZE
                },
                expandable: !expanded,
                expanded,
                root: is_root,
            }
        })
        .collect();
    nodes.sort_by(|a, b| a.id.cmp(&b.id));

    let links = store
        .relationships_among(&shown)
        .into_iter()
        .map(|rel| render_edge(rel, palette))
        .collect();

    let expandable_nodes = nodes
        .iter()
        .filter(|n| n.expandable)
        .map(|n| n.id.clone())
        .collect();

    log::debug!(
        "Interactive query root={} expanded={} -> {} nodes",
        root,
        state.len(),
        nodes.len()
    );

    Ok(GraphView {
        nodes,
        links,
        expandable_nodes,
    })
}
