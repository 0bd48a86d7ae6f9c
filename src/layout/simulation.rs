use std::collections::{HashMap, HashSet};
use std::f64::consts::PI;

use crate::config::LayoutConfig;
use crate::error::{RelgraphError, Result};
use crate::graph::{RenderEdge, RenderNode};

use super::forces::{apply_centering, apply_collision, apply_links, apply_many_body};
use super::{DragPhase, LayoutFrame, LayoutLink, LayoutNode, NodePosition};

/// Radius of the first ring when seeding nodes with no placed neighbor
const INITIAL_RADIUS: f64 = 10.0;

/// Discrete-time force simulation over the current node/edge set.
///
/// Alpha ("temperature") scales the soft forces and decays toward
/// `alpha_target` each step; once both are below `alpha_min` the simulation is
/// idle and [`step`](Self::step) does nothing until re-heated.
#[derive(Debug, Clone)]
pub struct Simulation {
    params: LayoutConfig,
    nodes: Vec<LayoutNode>,
    index: HashMap<String, usize>,
    links: Vec<LayoutLink>,
    alpha: f64,
    alpha_target: f64,
    steps: u64,
}

impl Simulation {
    /// Empty, idle simulation
    pub fn new(params: LayoutConfig) -> Self {
        Self {
            params,
            nodes: Vec::new(),
            index: HashMap::new(),
            links: Vec::new(),
            alpha: 0.0,
            alpha_target: 0.0,
            steps: 0,
        }
    }

    /// Replace the node/edge set after a query.
    ///
    /// Nodes whose id persists keep position, velocity and pin; new nodes are
    /// seeded next to an already placed neighbor when one exists, otherwise on
    /// a spiral around the canvas center. Edges with an endpoint outside
    /// `nodes` are dropped. Re-heats the simulation.
    ///
    /// Duplicate node ids are rejected before any state changes.
    pub fn set_graph(&mut self, nodes: &[RenderNode], edges: &[RenderEdge]) -> Result<()> {
        let mut index: HashMap<String, usize> = HashMap::with_capacity(nodes.len());
        for (i, node) in nodes.iter().enumerate() {
            if index.insert(node.id.clone(), i).is_some() {
                return Err(RelgraphError::DuplicateNode(node.id.clone()));
            }
        }

        let mut next: Vec<Option<LayoutNode>> = nodes
            .iter()
            .map(|node| {
                self.index.get(&node.id).map(|&old| LayoutNode {
                    size: node.size,
                    ..self.nodes[old].clone()
                })
            })
            .collect();

        let mut pairs = Vec::with_capacity(edges.len());
        for edge in edges {
            match (index.get(&edge.source), index.get(&edge.target)) {
                (Some(&s), Some(&t)) => pairs.push((s, t)),
                _ => log::warn!(
                    "Dropping layout edge {} -> {}: endpoint not in node set",
                    edge.source,
                    edge.target
                ),
            }
        }

        let (cx, cy) = self.center();
        let mut seeded = 0usize;
        for i in 0..nodes.len() {
            if next[i].is_some() {
                continue;
            }
            let anchor = pairs.iter().find_map(|&(s, t)| {
                let other = if s == i { t } else if t == i { s } else { return None };
                next[other].as_ref().map(|n| (n.x, n.y))
            });
            let angle = seeded as f64 * PI * (3.0 - 5f64.sqrt());
            let (x, y) = match anchor {
                Some((ax, ay)) => {
                    let r = self.params.link_distance / 2.0;
                    (ax + r * angle.cos(), ay + r * angle.sin())
                }
                None => {
                    let r = INITIAL_RADIUS * (0.5 + (self.nodes.len() + seeded) as f64).sqrt();
                    (cx + r * angle.cos(), cy + r * angle.sin())
                }
            };
            seeded += 1;
            next[i] = Some(LayoutNode {
                id: nodes[i].id.clone(),
                size: nodes[i].size,
                x,
                y,
                vx: 0.0,
                vy: 0.0,
                fx: None,
                fy: None,
                drag: DragPhase::Idle,
            });
        }

        self.nodes = next.into_iter().flatten().collect();
        self.index = index;
        self.links = build_links(self.nodes.len(), &pairs);
        self.alpha_target = if self.any_dragging() { self.params.drag_alpha_target } else { 0.0 };
        self.reheat(self.params.reheat_alpha);

        log::debug!(
            "Layout set: {} nodes ({} new), {} links",
            self.nodes.len(),
            seeded,
            self.links.len()
        );
        Ok(())
    }

    /// Raise alpha to at least `alpha`
    pub fn reheat(&mut self, alpha: f64) {
        if self.nodes.is_empty() {
            self.alpha = 0.0;
            return;
        }
        self.alpha = self.alpha.max(alpha.min(1.0));
    }

    /// Advance one relaxation step. Returns false when idle (nothing moved).
    pub fn step(&mut self) -> bool {
        if self.is_idle() {
            return false;
        }

        self.alpha += (self.alpha_target - self.alpha) * self.params.alpha_decay;
        let alpha = self.alpha;
        let (cx, cy) = self.center();

        apply_links(&mut self.nodes, &self.links, self.params.link_distance, alpha);
        apply_many_body(&mut self.nodes, self.params.charge_strength, alpha);
        apply_centering(&mut self.nodes, cx, cy, self.params.center_strength, alpha);
        apply_collision(&mut self.nodes, self.params.collision_strength);

        let keep = 1.0 - self.params.velocity_decay;
        for node in &mut self.nodes {
            match node.fx {
                Some(fx) => {
                    node.x = fx;
                    node.vx = 0.0;
                }
                None => {
                    node.vx *= keep;
                    node.x += node.vx;
                }
            }
            match node.fy {
                Some(fy) => {
                    node.y = fy;
                    node.vy = 0.0;
                }
                None => {
                    node.vy *= keep;
                    node.y += node.vy;
                }
            }
        }

        self.steps += 1;
        true
    }

    /// Step until idle or `max_steps` is reached; returns steps taken
    pub fn run(&mut self, max_steps: usize) -> usize {
        let mut taken = 0;
        while taken < max_steps && self.step() {
            taken += 1;
        }
        taken
    }

    /// True when there is nothing to simulate or alpha has cooled below
    /// `alpha_min` with no drag holding it up
    pub fn is_idle(&self) -> bool {
        self.nodes.is_empty()
            || (self.alpha < self.params.alpha_min && self.alpha_target < self.params.alpha_min)
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn alpha_target(&self) -> f64 {
        self.alpha_target
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn position(&self, id: &str) -> Option<(f64, f64)> {
        self.index.get(id).map(|&i| (self.nodes[i].x, self.nodes[i].y))
    }

    pub fn is_pinned(&self, id: &str) -> bool {
        self.index.get(id).is_some_and(|&i| self.nodes[i].is_pinned())
    }

    pub fn drag_phase(&self, id: &str) -> Option<DragPhase> {
        self.index.get(id).map(|&i| self.nodes[i].drag)
    }

    /// Largest speed among unpinned nodes
    pub fn max_velocity(&self) -> f64 {
        self.nodes
            .iter()
            .filter(|n| !n.is_pinned())
            .map(|n| (n.vx * n.vx + n.vy * n.vy).sqrt())
            .fold(0.0, f64::max)
    }

    /// Whether every unpinned node moves slower than `idle_velocity`
    pub fn is_settled(&self) -> bool {
        self.max_velocity() < self.params.idle_velocity
    }

    /// Fix `id` at `(x, y)`. Unknown ids are ignored.
    pub fn pin(&mut self, id: &str, x: f64, y: f64) -> bool {
        let Some(&i) = self.index.get(id) else {
            return false;
        };
        let node = &mut self.nodes[i];
        node.fx = Some(x);
        node.fy = Some(y);
        node.x = x;
        node.y = y;
        node.vx = 0.0;
        node.vy = 0.0;
        true
    }

    /// Release a pin so forces move the node again
    pub fn unpin(&mut self, id: &str) -> bool {
        let Some(&i) = self.index.get(id) else {
            return false;
        };
        self.nodes[i].fx = None;
        self.nodes[i].fy = None;
        true
    }

    /// `idle -> dragging`: pin at the current position and hold alpha up so
    /// neighbors follow. Stale ids are a no-op.
    pub fn drag_start(&mut self, id: &str) -> bool {
        let Some(&i) = self.index.get(id) else {
            log::debug!("Ignoring drag start on stale node {}", id);
            return false;
        };
        let (x, y) = (self.nodes[i].x, self.nodes[i].y);
        self.pin(id, x, y);
        self.nodes[i].drag = DragPhase::Dragging;
        self.alpha_target = self.params.drag_alpha_target;
        self.reheat(self.params.alpha_min * 2.0);
        true
    }

    /// Move the pin of a node being dragged
    pub fn drag_move(&mut self, id: &str, x: f64, y: f64) -> bool {
        match self.index.get(id) {
            Some(&i) if self.nodes[i].drag == DragPhase::Dragging => self.pin(id, x, y),
            _ => false,
        }
    }

    /// `dragging -> idle`: unpin and, when no other node is dragged, let alpha
    /// cool back to zero
    pub fn drag_end(&mut self, id: &str) -> bool {
        match self.index.get(id) {
            Some(&i) if self.nodes[i].drag == DragPhase::Dragging => {
                self.nodes[i].drag = DragPhase::Idle;
                self.unpin(id);
                if !self.any_dragging() {
                    self.alpha_target = 0.0;
                }
                true
            }
            _ => false,
        }
    }

    /// Snapshot of all positions, ordered like the last `set_graph` input
    pub fn positions(&self) -> Vec<NodePosition> {
        self.nodes
            .iter()
            .map(|n| NodePosition {
                id: n.id.clone(),
                x: n.x,
                y: n.y,
                pinned: n.is_pinned(),
            })
            .collect()
    }

    pub fn frame(&self) -> LayoutFrame {
        LayoutFrame {
            alpha: self.alpha,
            idle: self.is_idle(),
            nodes: self.positions(),
        }
    }

    fn any_dragging(&self) -> bool {
        self.nodes.iter().any(|n| n.drag == DragPhase::Dragging)
    }

    fn center(&self) -> (f64, f64) {
        (self.params.width / 2.0, self.params.height / 2.0)
    }
}

/// Degree-normalised link strengths and biases
fn build_links(node_count: usize, pairs: &[(usize, usize)]) -> Vec<LayoutLink> {
    let mut degree = vec![0usize; node_count];
    for &(s, t) in pairs {
        degree[s] += 1;
        degree[t] += 1;
    }

    // Reciprocal relationships (a->b, b->a) share one spring.
    let mut seen: HashSet<(usize, usize)> = HashSet::new();
    pairs
        .iter()
        .filter(|&&(s, t)| seen.insert((s.min(t), s.max(t))))
        .map(|&(s, t)| {
            let (ds, dt) = (degree[s] as f64, degree[t] as f64);
            LayoutLink {
                source: s,
                target: t,
                strength: 1.0 / ds.min(dt),
                bias: ds / (ds + dt),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{EntityKind, DEFAULT_NODE_SIZE};

    fn node(id: &str) -> RenderNode {
        RenderNode {
            id: id.to_string(),
            label: id.to_string(),
            kind: EntityKind::Company,
            size: DEFAULT_NODE_SIZE,
            expandable: false,
            expanded: false,
            root: false,
        }
    }

    fn edge(source: &str, target: &str) -> RenderEdge {
        RenderEdge {
            source: source.to_string(),
            target: target.to_string(),
            color: "#000000".to_string(),
            relationship_type: "owns".to_string(),
            relationship_sub_type: String::new(),
        }
    }

    fn star() -> (Vec<RenderNode>, Vec<RenderEdge>) {
        let nodes = ["hub", "a", "b", "c", "d", "lonely"].map(node).to_vec();
        let edges = vec![edge("hub", "a"), edge("hub", "b"), edge("c", "hub"), edge("d", "hub"), edge("a", "b")];
        (nodes, edges)
    }

    fn distance(sim: &Simulation, a: &str, b: &str) -> f64 {
        let (ax, ay) = sim.position(a).unwrap();
        let (bx, by) = sim.position(b).unwrap();
        ((ax - bx).powi(2) + (ay - by).powi(2)).sqrt()
    }

    #[test]
    fn test_empty_simulation_is_noop() {
        let mut sim = Simulation::new(LayoutConfig::default());
        sim.set_graph(&[], &[]).unwrap();
        assert!(sim.is_idle());
        assert!(!sim.step());
        assert_eq!(sim.run(10), 0);
        assert!(sim.frame().nodes.is_empty());
    }

    #[test]
    fn test_duplicate_node_fails_fast() {
        let mut sim = Simulation::new(LayoutConfig::default());
        let (nodes, edges) = star();
        sim.set_graph(&nodes, &edges).unwrap();
        let before = sim.positions();

        let err = sim.set_graph(&[node("x"), node("x")], &[]).unwrap_err();
        assert!(matches!(err, RelgraphError::DuplicateNode(ref id) if id == "x"));
        assert_eq!(sim.positions(), before);
    }

    #[test]
    fn test_converges_to_idle() {
        let params = LayoutConfig::default();
        let mut sim = Simulation::new(params.clone());
        let (nodes, edges) = star();
        sim.set_graph(&nodes, &edges).unwrap();
        assert!(!sim.is_idle());

        let taken = sim.run(1_000);
        assert!(taken <= 310, "took {} steps", taken);
        assert!(sim.is_idle());
        assert!(sim.is_settled(), "max velocity {}", sim.max_velocity());
        for p in sim.positions() {
            assert!(p.x.is_finite() && p.y.is_finite());
        }
    }

    #[test]
    fn test_layout_separates_and_links() {
        let mut sim = Simulation::new(LayoutConfig::default());
        let (nodes, edges) = star();
        sim.set_graph(&nodes, &edges).unwrap();
        sim.run(1_000);

        // Collision keeps every pair at least roughly their summed sizes apart.
        let ids = ["hub", "a", "b", "c", "d", "lonely"];
        for (i, a) in ids.iter().enumerate() {
            for b in &ids[i + 1..] {
                assert!(distance(&sim, a, b) > DEFAULT_NODE_SIZE, "{} and {} overlap", a, b);
            }
        }
        // Linked leaves sit far closer to the hub than the canvas size.
        assert!(distance(&sim, "hub", "c") < 400.0);
    }

    #[test]
    fn test_pinned_node_never_moves() {
        let mut sim = Simulation::new(LayoutConfig::default());
        let (nodes, edges) = star();
        sim.set_graph(&nodes, &edges).unwrap();
        assert!(sim.pin("hub", 12.5, -40.0));

        for _ in 0..50 {
            sim.step();
            assert_eq!(sim.position("hub"), Some((12.5, -40.0)));
        }
        assert!(sim.is_pinned("hub"));
        assert!(sim.unpin("hub"));
        assert!(!sim.is_pinned("hub"));
    }

    #[test]
    fn test_drag_protocol() {
        let mut sim = Simulation::new(LayoutConfig::default());
        let (nodes, edges) = star();
        sim.set_graph(&nodes, &edges).unwrap();
        sim.run(1_000);
        assert!(sim.is_idle());

        let start = sim.position("a").unwrap();
        assert!(sim.drag_start("a"));
        assert_eq!(sim.drag_phase("a"), Some(DragPhase::Dragging));
        assert_eq!(sim.position("a"), Some(start));
        assert!(!sim.is_idle());

        assert!(sim.drag_move("a", 700.0, 500.0));
        for _ in 0..20 {
            assert!(sim.step());
            assert_eq!(sim.position("a"), Some((700.0, 500.0)));
        }
        // The held alpha keeps the simulation running while dragging.
        assert!(sim.alpha() > LayoutConfig::default().alpha_min);

        assert!(sim.drag_end("a"));
        assert_eq!(sim.drag_phase("a"), Some(DragPhase::Idle));
        assert!(!sim.is_pinned("a"));
        assert_eq!(sim.alpha_target(), 0.0);
        sim.run(2_000);
        assert!(sim.is_idle());
    }

    #[test]
    fn test_independent_drags() {
        let mut sim = Simulation::new(LayoutConfig::default());
        let (nodes, edges) = star();
        sim.set_graph(&nodes, &edges).unwrap();

        assert!(sim.drag_start("a"));
        assert!(sim.drag_start("b"));
        assert!(sim.drag_end("a"));
        // b still holds the simulation warm.
        assert!(sim.alpha_target() > 0.0);
        assert!(sim.is_pinned("b"));
        assert!(sim.drag_end("b"));
        assert_eq!(sim.alpha_target(), 0.0);
    }

    #[test]
    fn test_stale_drag_is_noop() {
        let mut sim = Simulation::new(LayoutConfig::default());
        let (nodes, edges) = star();
        sim.set_graph(&nodes, &edges).unwrap();

        assert!(!sim.drag_start("ghost"));
        assert!(!sim.drag_move("ghost", 1.0, 1.0));
        assert!(!sim.drag_end("ghost"));
        // Moving without a drag start does nothing either.
        assert!(!sim.drag_move("a", 1.0, 1.0));
        assert!(!sim.is_pinned("a"));
    }

    #[test]
    fn test_positions_carry_over_and_reheat() {
        let mut sim = Simulation::new(LayoutConfig::default());
        sim.set_graph(&[node("hub"), node("a")], &[edge("hub", "a")]).unwrap();
        sim.run(1_000);
        assert!(sim.is_idle());
        let hub = sim.position("hub").unwrap();

        let (nodes, edges) = star();
        sim.set_graph(&nodes, &edges).unwrap();
        assert_eq!(sim.position("hub"), Some(hub));
        assert!(!sim.is_idle());
        assert_eq!(sim.alpha(), LayoutConfig::default().reheat_alpha);

        // New leaf b is linked to hub and a, so it is seeded near them.
        assert!(distance(&sim, "b", "hub") < LayoutConfig::default().link_distance * 2.0);

        // Dropping a node discards its state.
        sim.set_graph(&[node("hub")], &[]).unwrap();
        assert!(!sim.contains("a"));
        assert_eq!(sim.node_count(), 1);
    }

    #[test]
    fn test_pins_survive_requery() {
        let mut sim = Simulation::new(LayoutConfig::default());
        let (nodes, edges) = star();
        sim.set_graph(&nodes, &edges).unwrap();
        sim.drag_start("c");
        sim.drag_move("c", 10.0, 10.0);

        // hub, a, b, c: c keeps its pin and its drag holds alpha up.
        sim.set_graph(&nodes[..4], &edges).unwrap();
        assert_eq!(sim.position("c"), Some((10.0, 10.0)));
        assert_eq!(sim.drag_phase("c"), Some(DragPhase::Dragging));
        assert_eq!(sim.alpha_target(), LayoutConfig::default().drag_alpha_target);
        assert_eq!(sim.link_count(), 4);

        // c drops out of the result set: its drag state goes with it.
        sim.set_graph(&nodes[..3], &edges).unwrap();
        assert!(!sim.contains("c"));
        assert!(!sim.drag_end("c"));
        assert_eq!(sim.alpha_target(), 0.0);
        assert_eq!(sim.link_count(), 3);
    }

    #[test]
    fn test_reciprocal_edges_share_a_spring() {
        let links = build_links(2, &[(0, 1), (1, 0)]);
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].strength, 0.5);
        assert_eq!(links[0].bias, 0.5);
    }
}
