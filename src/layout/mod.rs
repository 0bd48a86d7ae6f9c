//! Force-directed layout: iterative relaxation of render nodes into 2D positions.
//!
//! All node state (position, velocity, pin, drag phase) is owned by
//! [`Simulation`]; callers only send messages (`set_graph`, `step`, `pin`,
//! `drag_*`) and read snapshots through [`Simulation::frame`].

mod forces;
mod simulation;

pub use simulation::Simulation;

use serde::{Deserialize, Serialize};

/// Per-node drag state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DragPhase {
    #[default]
    Idle,
    Dragging,
}

/// Simulated body for one render node
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct LayoutNode {
    pub id: String,
    /// Radius and collision footprint
    pub size: f64,
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
    pub fx: Option<f64>,
    pub fy: Option<f64>,
    pub drag: DragPhase,
}

impl LayoutNode {
    pub fn is_pinned(&self) -> bool {
        self.fx.is_some() || self.fy.is_some()
    }
}

/// Link between two node slots
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct LayoutLink {
    pub source: usize,
    pub target: usize,
    /// 1 / min(degree(source), degree(target))
    pub strength: f64,
    /// Share of the correction applied to the target
    pub bias: f64,
}

/// Position of one node in a frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodePosition {
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub pinned: bool,
}

/// Snapshot handed to the renderer after each step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutFrame {
    pub alpha: f64,
    pub idle: bool,
    pub nodes: Vec<NodePosition>,
}
