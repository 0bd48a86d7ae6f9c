//! Depth-bounded BFS around a root entity.
//!
//! Reachability ignores direction: a relationship links its endpoints both
//! ways for the purpose of the radius, while the returned edges keep their
//! stored direction.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::error::{RelgraphError, Result};

use super::{render_edge, ColorPalette, GraphView, RelationshipStore, RenderNode, DEFAULT_NODE_SIZE, ROOT_NODE_SIZE};

/// Hop distance from `root` of every entity within `max_depth` undirected hops.
///
/// The visited map doubles as the cycle guard. An unknown root yields an empty map.
pub fn reachable_within<'a>(
    store: &'a RelationshipStore,
    root: &str,
    max_depth: usize,
) -> HashMap<&'a str, usize> {
    let mut visited: HashMap<&'a str, usize> = HashMap::new();
    let Some(root) = store.entity(root).map(|e| e.name.as_str()) else {
        return visited;
    };

    let mut queue = VecDeque::new();
    visited.insert(root, 0);
    queue.push_back((root, 0));

    while let Some((entity, depth)) = queue.pop_front() {
        if depth >= max_depth {
            continue;
        }
        for neighbor in store.neighbors(entity) {
            if !visited.contains_key(neighbor) {
                visited.insert(neighbor, depth + 1);
                queue.push_back((neighbor, depth + 1));
            }
        }
    }

    visited
}

/// Compute the radial view: every entity within `depth` undirected hops of
/// `root` and every relationship between two of them.
///
/// `depth` must lie in `1..=max_depth`; out-of-range values are rejected
/// rather than clamped.
pub fn radial_query(
    store: &RelationshipStore,
    palette: &ColorPalette,
    root: &str,
    depth: i64,
    max_depth: usize,
) -> Result<GraphView> {
    if depth < 1 || depth > max_depth as i64 {
        return Err(RelgraphError::InvalidDepth { depth, max: max_depth });
    }
    if !store.contains(root) {
        return Err(RelgraphError::UnknownEntity(root.to_string()));
    }

    let reached = reachable_within(store, root, depth as usize);
    let shown: HashSet<&str> = reached.keys().copied().collect();

    let mut nodes: Vec<RenderNode> = shown
        .iter()
        .map(|&id| {
            let is_root = id == root;
            RenderNode {
                id: id.to_string(),
                label: id.to_string(),
                kind: store.kind_of(id),
                size: if is_root { ROOT_NODE_SIZE } else { DEFAULT_NODE_SIZE },
                expandable: false,
                expanded: true,
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

    log::debug!("Radial query root={} depth={} -> {} nodes", root, depth, nodes.len());

    Ok(GraphView {
        nodes,
        links,
        expandable_nodes: Vec::new(),
    })
}
