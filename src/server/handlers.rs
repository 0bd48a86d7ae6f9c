//! Upload, lookup and one-shot query endpoints.

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::error::{RelgraphError, Result};
use crate::graph::{interactive_query, radial_query, ExpansionState, GraphView};
use crate::ingest::ingest_csv;

use super::state::AppState;
use super::types::*;

/// `POST /api/upload`: multipart form with a `file` field holding the CSV.
///
/// The current graph is replaced only after the new table was parsed and
/// committed; any failure leaves it, the cache and all sessions untouched.
pub async fn upload(State(state): State<AppState>, mut multipart: Multipart) -> Result<Json<UploadResponse>> {
    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| RelgraphError::InvalidInput(format!("Malformed multipart body: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let name = field.file_name().unwrap_or("upload.csv").to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| RelgraphError::InvalidInput(format!("Failed to read upload: {}", e)))?;
        upload = Some((name, bytes));
        break;
    }
    let (name, bytes) =
        upload.ok_or_else(|| RelgraphError::InvalidInput("Missing multipart field 'file'".to_string()))?;

    let _guard = state.lock_uploads().await;
    let (summary, store) = ingest_csv(&state.db, &name, &bytes).await?;
    state.replace_graph(store).await;

    Ok(Json(UploadResponse { success: true, summary }))
}

/// `GET /api/entities`
pub async fn entities(State(state): State<AppState>) -> Result<Json<EntitiesResponse>> {
    let graph = state.graph().await?;
    Ok(Json(EntitiesResponse {
        entities: graph.store.entity_names(),
    }))
}

/// `GET /api/stats`
pub async fn stats(State(state): State<AppState>) -> Result<Json<StatsResponse>> {
    let graph = state.graph().await?;
    Ok(Json(StatsResponse {
        stats: graph.store.stats(),
        relationship_types: graph.store.type_counts(),
    }))
}

/// `GET /api/legend`
pub async fn legend(State(state): State<AppState>) -> Result<Json<LegendResponse>> {
    let graph = state.graph().await?;
    Ok(Json(LegendResponse {
        legend: graph.palette.legend(),
    }))
}

/// `POST /api/graph/interactive`
pub async fn interactive(
    State(state): State<AppState>,
    Json(request): Json<InteractiveRequest>,
) -> Result<Json<GraphView>> {
    let graph = state.graph().await?;
    let expansion = ExpansionState::from_request(&request.entity, &request.expanded_nodes);
    let view = interactive_query(&graph.store, &graph.palette, &expansion)?;
    Ok(Json(view))
}

/// `POST /api/graph/radial`, served from the radial cache when possible
pub async fn radial(State(state): State<AppState>, Json(request): Json<RadialRequest>) -> Result<Json<GraphView>> {
    let graph = state.graph().await?;
    let max_depth = state.config.query.max_depth;
    let depth = request.depth.unwrap_or(state.config.query.default_depth as i64);

    let in_range = depth >= 1 && depth <= max_depth as i64;
    if in_range {
        if let Some(view) = graph.radial_cache.get(&request.entity, depth as usize) {
            log::debug!("Radial cache hit for {} at depth {}", request.entity, depth);
            return Ok(Json(view.as_ref().clone()));
        }
    }

    let view = radial_query(&graph.store, &graph.palette, &request.entity, depth, max_depth)?;
    graph
        .radial_cache
        .put(&request.entity, depth as usize, std::sync::Arc::new(view.clone()));
    Ok(Json(view))
}

/// `GET /health`
pub async fn health(State(state): State<AppState>) -> Response {
    let graph_loaded = state.graph().await.is_ok();
    (
        StatusCode::OK,
        Json(serde_json::json!({
            "status": "ok",
            "service": "relgraph",
            "version": env!("CARGO_PKG_VERSION"),
            "graph_loaded": graph_loaded,
            "sessions": state.session_count().await,
        })),
    )
        .into_response()
}
