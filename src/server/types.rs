use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::graph::{GraphStats, LegendEntry};
use crate::ingest::IngestSummary;
use crate::layout::LayoutFrame;
use crate::session::{ExplorationMode, SessionSnapshot};

/// `POST /api/graph/interactive`
#[derive(Debug, Deserialize)]
pub struct InteractiveRequest {
    pub entity: String,
    #[serde(default)]
    pub expanded_nodes: Vec<String>,
}

/// `POST /api/graph/radial`; `depth` falls back to `query.default_depth`
#[derive(Debug, Deserialize)]
pub struct RadialRequest {
    pub entity: String,
    #[serde(default)]
    pub depth: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub success: bool,
    #[serde(flatten)]
    pub summary: IngestSummary,
}

#[derive(Debug, Serialize)]
pub struct EntitiesResponse {
    pub entities: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    #[serde(flatten)]
    pub stats: GraphStats,
    /// Relationship count per type
    pub relationship_types: BTreeMap<String, usize>,
}

#[derive(Debug, Serialize)]
pub struct LegendResponse {
    pub legend: Vec<LegendEntry>,
}

/// `POST /api/sessions`
#[derive(Debug, Deserialize)]
pub struct StartSessionRequest {
    pub entity: String,
    #[serde(default = "default_mode")]
    pub mode: ExplorationMode,
    #[serde(default)]
    pub depth: Option<i64>,
}

fn default_mode() -> ExplorationMode {
    ExplorationMode::Incremental
}

#[derive(Debug, Deserialize)]
pub struct ClickRequest {
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub struct DepthRequest {
    pub depth: i64,
}

#[derive(Debug, Deserialize)]
pub struct ModeRequest {
    pub mode: ExplorationMode,
}

#[derive(Debug, Deserialize)]
pub struct RootRequest {
    pub entity: String,
}

/// Pointer phase of a drag message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DragAction {
    Start,
    Move,
    End,
}

/// `POST /api/sessions/:id/drag`; `x`/`y` are required for `move`
#[derive(Debug, Deserialize)]
pub struct DragRequest {
    pub id: String,
    pub action: DragAction,
    #[serde(default)]
    pub x: Option<f64>,
    #[serde(default)]
    pub y: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub id: Uuid,
    /// Set for intents: whether the view was recomputed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub changed: Option<bool>,
    #[serde(flatten)]
    pub session: SessionSnapshot,
}

#[derive(Debug, Serialize)]
pub struct DragResponse {
    /// False for stale node ids and out-of-order phases
    pub accepted: bool,
    pub frame: LayoutFrame,
}
