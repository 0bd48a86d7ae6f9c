//! Exploration sessions and their live position stream.

use std::convert::Infallible;
use std::time::Duration;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use futures_util::{future, Stream, StreamExt};
use tokio::time::{interval, MissedTickBehavior};
use tokio_stream::wrappers::IntervalStream;
use uuid::Uuid;

use crate::error::{RelgraphError, Result};
use crate::layout::LayoutFrame;
use crate::session::ExplorationSession;

use super::state::{AppState, LoadedGraph};
use super::types::*;

/// `POST /api/sessions`
pub async fn start(
    State(state): State<AppState>,
    Json(request): Json<StartSessionRequest>,
) -> Result<(StatusCode, Json<SessionResponse>)> {
    let graph = state.graph().await?;
    let session = ExplorationSession::start(
        &graph.store,
        &graph.palette,
        &request.entity,
        request.mode,
        request.depth,
        &state.config.query,
        state.config.layout.clone(),
    )?;
    let snapshot = session.snapshot();
    let (id, _) = state.insert_session(session).await;

    Ok((
        StatusCode::CREATED,
        Json(SessionResponse {
            id,
            changed: None,
            session: snapshot,
        }),
    ))
}

/// `GET /api/sessions/:id`
pub async fn show(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<SessionResponse>> {
    let session = state.session(id).await?;
    let session = session.lock().await;
    Ok(Json(SessionResponse {
        id,
        changed: None,
        session: session.snapshot(),
    }))
}

/// `DELETE /api/sessions/:id`
pub async fn remove(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<StatusCode> {
    if state.remove_session(id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(RelgraphError::UnknownSession(id.to_string()))
    }
}

/// Apply one query-changing intent to a session and report the new view
async fn apply_intent<F>(state: &AppState, id: Uuid, intent: F) -> Result<Json<SessionResponse>>
where
    F: FnOnce(&mut ExplorationSession, &LoadedGraph) -> Result<bool>,
{
    let graph = state.graph().await?;
    let session = state.session(id).await?;
    let mut session = session.lock().await;
    let changed = intent(&mut *session, &*graph)?;
    Ok(Json(SessionResponse {
        id,
        changed: Some(changed),
        session: session.snapshot(),
    }))
}

/// `POST /api/sessions/:id/click`
pub async fn click(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<ClickRequest>,
) -> Result<Json<SessionResponse>> {
    apply_intent(&state, id, |session, graph| {
        session.click(&graph.store, &graph.palette, &request.id)
    })
    .await
}

/// `POST /api/sessions/:id/reset`
pub async fn reset(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<SessionResponse>> {
    apply_intent(&state, id, |session, graph| session.reset(&graph.store, &graph.palette)).await
}

/// `POST /api/sessions/:id/depth`
pub async fn depth(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<DepthRequest>,
) -> Result<Json<SessionResponse>> {
    apply_intent(&state, id, |session, graph| {
        session.set_depth(&graph.store, &graph.palette, request.depth)?;
        Ok(true)
    })
    .await
}

/// `POST /api/sessions/:id/mode`
pub async fn mode(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<ModeRequest>,
) -> Result<Json<SessionResponse>> {
    apply_intent(&state, id, |session, graph| {
        session.switch_mode(&graph.store, &graph.palette, request.mode)
    })
    .await
}

/// `POST /api/sessions/:id/root`
pub async fn root(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<RootRequest>,
) -> Result<Json<SessionResponse>> {
    apply_intent(&state, id, |session, graph| {
        session.set_root(&graph.store, &graph.palette, &request.entity)?;
        Ok(true)
    })
    .await
}

/// `POST /api/sessions/:id/drag`
pub async fn drag(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<DragRequest>,
) -> Result<Json<DragResponse>> {
    let session = state.session(id).await?;
    let mut session = session.lock().await;

    let accepted = match request.action {
        DragAction::Start => session.drag_start(&request.id),
        DragAction::Move => {
            let (Some(x), Some(y)) = (request.x, request.y) else {
                return Err(RelgraphError::InvalidInput("drag move requires x and y".to_string()));
            };
            session.drag_move(&request.id, x, y)
        }
        DragAction::End => session.drag_end(&request.id),
    };

    Ok(Json(DragResponse {
        accepted,
        frame: session.frame(),
    }))
}

fn frame_event(name: &'static str, frame: &LayoutFrame) -> Event {
    Event::default().event(name).json_data(frame).unwrap_or_else(|e| {
        log::error!("Failed to encode layout frame: {}", e);
        Event::default().event("error").data(e.to_string())
    })
}

/// `GET /api/sessions/:id/stream`
///
/// Steps the session's simulation once per tick and sends a `frame` event
/// after every step. When the simulation is idle a final `idle` event carries
/// the resting positions and the stream ends; the client reconnects after its
/// next intent.
pub async fn stream(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Sse<impl Stream<Item = std::result::Result<Event, Infallible>>>> {
    let session = state.session(id).await?;

    let mut ticker = interval(Duration::from_millis(state.config.http_server.tick_interval_ms));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let frames = IntervalStream::new(ticker)
        .then(move |_| {
            let session = session.clone();
            async move {
                let mut session = session.lock().await;
                let moved = session.tick();
                (moved, session.frame())
            }
        })
        .scan(false, |finished, (moved, frame)| {
            if *finished {
                return future::ready(None);
            }
            *finished = !moved;
            let name = if moved { "frame" } else { "idle" };
            future::ready(Some(Ok::<Event, Infallible>(frame_event(name, &frame))))
        });

    Ok(Sse::new(frames).keep_alive(KeepAlive::new().interval(Duration::from_secs(15)).text("ping")))
}
