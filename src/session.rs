//! One exploration session: a root entity, the active mode and the layout of
//! the current view.
//!
//! Every user intent (click, reset, depth change, mode switch, new root)
//! recomputes the view through the query engine and hands it to the session's
//! [`Simulation`], which carries over positions of nodes that stay on screen.
//! Drag messages go straight to the simulation.

use serde::{Deserialize, Serialize};

use crate::config::{LayoutConfig, QueryConfig};
use crate::error::{RelgraphError, Result};
use crate::graph::{interactive_query, radial_query, ColorPalette, ExpansionState, GraphView, RelationshipStore};
use crate::layout::{LayoutFrame, Simulation};

/// Exploration mode requested by the client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExplorationMode {
    Incremental,
    Radial,
}

/// Per-mode query state
#[derive(Debug, Clone, PartialEq)]
pub enum SessionMode {
    Incremental { expansion: ExpansionState },
    Radial { depth: usize },
}

impl SessionMode {
    pub fn kind(&self) -> ExplorationMode {
        match self {
            SessionMode::Incremental { .. } => ExplorationMode::Incremental,
            SessionMode::Radial { .. } => ExplorationMode::Radial,
        }
    }
}

/// Serializable view of a session for clients
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub root: String,
    pub mode: ExplorationMode,
    /// Radial depth; also remembered while in incremental mode
    pub depth: usize,
    /// Expansion order, root first; empty in radial mode
    pub expanded: Vec<String>,
    pub graph: GraphView,
    pub frame: LayoutFrame,
}

#[derive(Debug, Clone)]
pub struct ExplorationSession {
    root: String,
    mode: SessionMode,
    /// Last radial depth, reused when switching back to radial mode
    depth: usize,
    max_depth: usize,
    view: GraphView,
    simulation: Simulation,
}

fn validate_depth(depth: i64, max_depth: usize) -> Result<usize> {
    if depth < 1 || depth > max_depth as i64 {
        return Err(RelgraphError::InvalidDepth { depth, max: max_depth });
    }
    Ok(depth as usize)
}

impl ExplorationSession {
    /// Run the first query for `root` and seed the layout.
    ///
    /// `depth` only matters in radial mode and defaults to `query.default_depth`.
    pub fn start(
        store: &RelationshipStore,
        palette: &ColorPalette,
        root: &str,
        mode: ExplorationMode,
        depth: Option<i64>,
        query: &QueryConfig,
        layout: LayoutConfig,
    ) -> Result<Self> {
        let depth = match depth {
            Some(d) => validate_depth(d, query.max_depth)?,
            None => query.default_depth,
        };
        let mode = match mode {
            ExplorationMode::Incremental => SessionMode::Incremental {
                expansion: ExpansionState::new(root),
            },
            ExplorationMode::Radial => SessionMode::Radial { depth },
        };

        let mut session = Self {
            root: root.to_string(),
            mode: mode.clone(),
            depth,
            max_depth: query.max_depth,
            view: GraphView::default(),
            simulation: Simulation::new(layout),
        };
        session.apply(store, palette, root.to_string(), mode)?;
        log::info!(
            "Session started at '{}' in {:?} mode ({} nodes)",
            root,
            session.mode.kind(),
            session.view.nodes.len()
        );
        Ok(session)
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    pub fn mode(&self) -> &SessionMode {
        &self.mode
    }

    pub fn view(&self) -> &GraphView {
        &self.view
    }

    pub fn simulation(&self) -> &Simulation {
        &self.simulation
    }

    /// Query `root` under `mode` and push the result into the layout.
    ///
    /// `root`, `mode` and the view are committed together once both the query
    /// and the layout accepted the new graph, so a failing intent leaves the
    /// session as it was.
    fn apply(&mut self, store: &RelationshipStore, palette: &ColorPalette, root: String, mode: SessionMode) -> Result<()> {
        let view = match &mode {
            SessionMode::Incremental { expansion } => interactive_query(store, palette, expansion)?,
            SessionMode::Radial { depth } => radial_query(store, palette, &root, *depth as i64, self.max_depth)?,
        };
        self.simulation.set_graph(&view.nodes, &view.links)?;
        self.root = root;
        self.mode = mode;
        self.view = view;
        Ok(())
    }

    /// Click-to-expand. Returns whether the view changed.
    ///
    /// No-op in radial mode and for nodes that are absent or not expandable.
    pub fn click(&mut self, store: &RelationshipStore, palette: &ColorPalette, id: &str) -> Result<bool> {
        let SessionMode::Incremental { expansion } = &self.mode else {
            return Ok(false);
        };
        if !self.view.node(id).is_some_and(|n| n.expandable) {
            return Ok(false);
        }
        let mut expansion = expansion.clone();
        if !expansion.expand(id) {
            return Ok(false);
        }
        self.apply(store, palette, self.root.clone(), SessionMode::Incremental { expansion })?;
        log::debug!("Expanded '{}' ({} nodes shown)", id, self.view.nodes.len());
        Ok(true)
    }

    /// Collapse back to `{root}`. No-op in radial mode.
    pub fn reset(&mut self, store: &RelationshipStore, palette: &ColorPalette) -> Result<bool> {
        let SessionMode::Incremental { expansion } = &self.mode else {
            return Ok(false);
        };
        if expansion.len() == 1 {
            return Ok(false);
        }
        let mut expansion = expansion.clone();
        expansion.reset();
        self.apply(store, palette, self.root.clone(), SessionMode::Incremental { expansion })?;
        Ok(true)
    }

    /// Change the radial depth. In incremental mode the new depth is only
    /// remembered for the next switch to radial mode.
    pub fn set_depth(&mut self, store: &RelationshipStore, palette: &ColorPalette, depth: i64) -> Result<()> {
        let depth = validate_depth(depth, self.max_depth)?;
        if let SessionMode::Radial { depth: current } = self.mode {
            if current != depth {
                self.apply(store, palette, self.root.clone(), SessionMode::Radial { depth })?;
            }
        }
        self.depth = depth;
        Ok(())
    }

    /// Switch between incremental and radial mode.
    ///
    /// Entering incremental mode starts from `{root}`; entering radial mode
    /// uses the remembered depth.
    pub fn switch_mode(&mut self, store: &RelationshipStore, palette: &ColorPalette, mode: ExplorationMode) -> Result<bool> {
        if self.mode.kind() == mode {
            return Ok(false);
        }
        let next = match mode {
            ExplorationMode::Incremental => SessionMode::Incremental {
                expansion: ExpansionState::new(self.root.clone()),
            },
            ExplorationMode::Radial => SessionMode::Radial { depth: self.depth },
        };
        self.apply(store, palette, self.root.clone(), next)?;
        Ok(true)
    }

    /// Start over from a different root entity in the current mode
    pub fn set_root(&mut self, store: &RelationshipStore, palette: &ColorPalette, root: &str) -> Result<()> {
        if !store.contains(root) {
            return Err(RelgraphError::UnknownEntity(root.to_string()));
        }
        let next = match &self.mode {
            SessionMode::Incremental { .. } => SessionMode::Incremental {
                expansion: ExpansionState::new(root),
            },
            SessionMode::Radial { depth } => SessionMode::Radial { depth: *depth },
        };
        self.apply(store, palette, root.to_string(), next)
    }

    pub fn drag_start(&mut self, id: &str) -> bool {
        self.simulation.drag_start(id)
    }

    pub fn drag_move(&mut self, id: &str, x: f64, y: f64) -> bool {
        self.simulation.drag_move(id, x, y)
    }

    pub fn drag_end(&mut self, id: &str) -> bool {
        self.simulation.drag_end(id)
    }

    /// Advance the layout by one step; false once idle
    pub fn tick(&mut self) -> bool {
        self.simulation.step()
    }

    pub fn frame(&self) -> LayoutFrame {
        self.simulation.frame()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            root: self.root.clone(),
            mode: self.mode.kind(),
            depth: self.depth,
            expanded: match &self.mode {
                SessionMode::Incremental { expansion } => expansion.as_slice().to_vec(),
                SessionMode::Radial { .. } => Vec::new(),
            },
            graph: self.view.clone(),
            frame: self.frame(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::fixtures::{alice_acme_bob, chain_with_cycle};
    use std::collections::HashMap;

    fn palette() -> ColorPalette {
        ColorPalette::new(&HashMap::new())
    }

    fn start(store: &RelationshipStore, root: &str, mode: ExplorationMode, depth: Option<i64>) -> Result<ExplorationSession> {
        ExplorationSession::start(store, &palette(), root, mode, depth, &QueryConfig::default(), LayoutConfig::default())
    }

    #[test]
    fn test_click_to_expand_worked_example() {
        let store = alice_acme_bob();
        let mut session = start(&store, "Alice", ExplorationMode::Incremental, None).unwrap();
        assert_eq!(session.view().node_ids(), vec!["Acme", "Alice"]);
        assert_eq!(session.simulation().node_count(), 2);

        assert!(session.click(&store, &palette(), "Acme").unwrap());
        assert_eq!(session.view().node_ids(), vec!["Acme", "Alice", "Bob"]);
        assert_eq!(session.view().links.len(), 3);
        assert_eq!(session.simulation().node_count(), 3);
        assert_eq!(session.snapshot().expanded, vec!["Alice", "Acme"]);
    }

    #[test]
    fn test_click_on_non_expandable_is_noop() {
        let store = alice_acme_bob();
        let mut session = start(&store, "Alice", ExplorationMode::Incremental, None).unwrap();
        // Root is expanded, Bob is not shown yet.
        assert!(!session.click(&store, &palette(), "Alice").unwrap());
        assert!(!session.click(&store, &palette(), "Bob").unwrap());
        assert!(!session.click(&store, &palette(), "Nobody").unwrap());
        assert_eq!(session.snapshot().expanded, vec!["Alice"]);
    }

    #[test]
    fn test_click_in_radial_mode_is_noop() {
        let store = chain_with_cycle();
        let mut session = start(&store, "a", ExplorationMode::Radial, Some(1)).unwrap();
        let before = session.view().clone();
        assert!(!session.click(&store, &palette(), "b").unwrap());
        assert_eq!(session.view(), &before);
    }

    #[test]
    fn test_reset_restores_initial_view() {
        let store = chain_with_cycle();
        let mut session = start(&store, "a", ExplorationMode::Incremental, None).unwrap();
        let initial = session.view().clone();

        assert!(session.click(&store, &palette(), "b").unwrap());
        assert!(session.click(&store, &palette(), "c").unwrap());
        assert!(session.view().nodes.len() > initial.nodes.len());

        assert!(session.reset(&store, &palette()).unwrap());
        assert_eq!(session.view(), &initial);
        assert!(!session.reset(&store, &palette()).unwrap());
    }

    #[test]
    fn test_depth_change_and_validation() {
        let store = chain_with_cycle();
        let mut session = start(&store, "a", ExplorationMode::Radial, Some(1)).unwrap();
        assert_eq!(session.view().nodes.len(), 2);

        session.set_depth(&store, &palette(), 3).unwrap();
        assert_eq!(session.view().node_ids(), vec!["a", "b", "c", "d", "e"]);

        let err = session.set_depth(&store, &palette(), 0).unwrap_err();
        assert!(matches!(err, RelgraphError::InvalidDepth { .. }));
        assert_eq!(session.snapshot().depth, 3);
    }

    #[test]
    fn test_switch_mode_keeps_positions_of_shared_nodes() {
        let store = alice_acme_bob();
        let mut session = start(&store, "Alice", ExplorationMode::Incremental, None).unwrap();
        session.simulation.run(50);
        let alice = session.simulation().position("Alice").unwrap();

        assert!(session.switch_mode(&store, &palette(), ExplorationMode::Radial).unwrap());
        assert_eq!(session.mode().kind(), ExplorationMode::Radial);
        assert_eq!(session.view().nodes.len(), 3);
        assert_eq!(session.simulation().position("Alice").unwrap(), alice);
        assert!(!session.simulation().is_idle());

        assert!(!session.switch_mode(&store, &palette(), ExplorationMode::Radial).unwrap());
        assert!(session.switch_mode(&store, &palette(), ExplorationMode::Incremental).unwrap());
        assert_eq!(session.snapshot().expanded, vec!["Alice"]);
    }

    #[test]
    fn test_unknown_root_and_bad_depth_fail_start() {
        let store = alice_acme_bob();
        assert!(matches!(
            start(&store, "Zed", ExplorationMode::Incremental, None).unwrap_err(),
            RelgraphError::UnknownEntity(_)
        ));
        assert!(matches!(
            start(&store, "Alice", ExplorationMode::Radial, Some(9)).unwrap_err(),
            RelgraphError::InvalidDepth { .. }
        ));
    }

    #[test]
    fn test_set_root_rejects_unknown_and_keeps_state() {
        let store = chain_with_cycle();
        let mut session = start(&store, "a", ExplorationMode::Incremental, None).unwrap();
        let before = session.view().clone();

        assert!(session.set_root(&store, &palette(), "nope").is_err());
        assert_eq!(session.view(), &before);

        session.set_root(&store, &palette(), "x").unwrap();
        assert_eq!(session.root(), "x");
        assert_eq!(session.view().node_ids(), vec!["x", "y"]);
    }

    #[test]
    fn test_failed_intent_keeps_expansion_and_depth() {
        // A store without the session's root makes every query fail.
        let store = alice_acme_bob();
        let other = chain_with_cycle();

        let mut session = start(&store, "Alice", ExplorationMode::Incremental, None).unwrap();
        assert!(session.click(&store, &palette(), "Acme").unwrap());
        let before = session.snapshot();

        assert!(session.click(&other, &palette(), "Bob").is_err());
        assert!(session.reset(&other, &palette()).is_err());
        assert!(session.switch_mode(&other, &palette(), ExplorationMode::Radial).is_err());
        let after = session.snapshot();
        assert_eq!(after.expanded, vec!["Alice", "Acme"]);
        assert_eq!(after.mode, ExplorationMode::Incremental);
        assert_eq!(after.graph, before.graph);

        let mut radial = start(&store, "Alice", ExplorationMode::Radial, Some(1)).unwrap();
        assert!(radial.set_depth(&other, &palette(), 2).is_err());
        assert_eq!(radial.mode(), &SessionMode::Radial { depth: 1 });
        assert_eq!(radial.snapshot().depth, 1);
        assert_eq!(radial.view().nodes.len(), 2);
    }

    #[test]
    fn test_tick_until_idle() {
        let store = alice_acme_bob();
        let mut session = start(&store, "Alice", ExplorationMode::Radial, None).unwrap();
        let mut ticks = 0;
        while session.tick() {
            ticks += 1;
            assert!(ticks < 1000);
        }
        assert!(session.frame().idle);
    }

    #[test]
    fn test_drag_through_session() {
        let store = alice_acme_bob();
        let mut session = start(&store, "Alice", ExplorationMode::Radial, None).unwrap();
        assert!(session.drag_start("Bob"));
        assert!(session.drag_move("Bob", 5.0, 6.0));
        session.tick();
        assert_eq!(session.simulation().position("Bob"), Some((5.0, 6.0)));
        assert!(session.drag_end("Bob"));
        assert!(!session.drag_start("Zed"));
    }
}
