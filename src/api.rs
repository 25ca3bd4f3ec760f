//! HTTP API endpoints.
//!
//! The JSON endpoints drive the room lifecycle; `/api/game-events` streams
//! push notifications over SSE.

use axum::{
    extract::{Query, State},
    response::sse::{Event, Sse},
    Json,
};
use futures::stream::Stream;
use futures::StreamExt;
use std::convert::Infallible;
use std::sync::Arc;
use ulid::Ulid;

use crate::error::RoomError;
use crate::protocol::*;
use crate::state::AppState;

/// Create a room.
///
/// POST /api/create-room
pub async fn create_room(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateRoomRequest>,
) -> Result<Json<CreateRoomResponse>, RoomError> {
    if request.user_id.trim().is_empty() {
        return Err(RoomError::MissingUserId);
    }

    let (code, creator) = state
        .create_room(&request.user_id, request.player_name)
        .await;

    Ok(Json(CreateRoomResponse {
        code,
        user_id: creator.id.clone(),
        player: PlayerInfo::from(&creator),
    }))
}

/// Join an existing room.
///
/// POST /api/join-room
pub async fn join_room(
    State(state): State<Arc<AppState>>,
    Json(request): Json<JoinRoomRequest>,
) -> Result<Json<JoinRoomResponse>, RoomError> {
    validate(&request.code, &request.user_id)?;

    let game = state
        .join_room(&request.code, &request.user_id, request.player_name)
        .await?;

    Ok(Json(JoinRoomResponse {
        success: true,
        game,
    }))
}

/// Leave a room. Always succeeds, even for unknown rooms or players.
///
/// POST /api/exit-room
pub async fn exit_room(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ExitRoomRequest>,
) -> Result<Json<AckResponse>, RoomError> {
    validate(&request.code, &request.user_id)?;

    state.exit_room(&request.code, &request.user_id).await;
    Ok(Json(AckResponse { success: true }))
}

/// Toggle readiness, or reset the room for a new round.
///
/// POST /api/set-ready
pub async fn set_ready(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SetReadyRequest>,
) -> Result<Json<SetReadyResponse>, RoomError> {
    validate(&request.code, &request.user_id)?;

    let (is_ready, game_state) = state
        .set_ready(&request.code, &request.user_id, request.new_round)
        .await?;

    Ok(Json(SetReadyResponse {
        success: true,
        is_ready,
        game_state,
    }))
}

/// The caller's view of the room.
///
/// GET /api/game-state?code=...&userId=...
pub async fn game_state(
    State(state): State<Arc<AppState>>,
    Query(query): Query<RoomQuery>,
) -> Result<Json<RoomView>, RoomError> {
    validate(&query.code, &query.user_id)?;
    Ok(Json(state.query_state(&query.code, &query.user_id).await?))
}

/// The caller's word assignment for the running round.
///
/// GET /api/get-word?code=...&userId=...
pub async fn get_word(
    State(state): State<Arc<AppState>>,
    Query(query): Query<RoomQuery>,
) -> Result<Json<WordResponse>, RoomError> {
    validate(&query.code, &query.user_id)?;
    Ok(Json(state.query_word(&query.code, &query.user_id).await?))
}

/// Subscribe to room events.
///
/// GET /api/game-events?code=...&userId=...
///
/// The first event is an `initial_state` snapshot; the subscription is torn
/// down when the client disconnects.
pub async fn game_events(
    State(state): State<Arc<AppState>>,
    Query(query): Query<RoomQuery>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, RoomError> {
    validate(&query.code, &query.user_id)?;

    let (initial, rx, id) = state.subscribe(&query.code, &query.user_id).await?;
    let guard = SubscriptionGuard {
        state,
        code: query.code,
        id,
    };

    let events = futures::stream::once(async move { initial }).chain(futures::stream::unfold(
        rx,
        |mut rx| async move { rx.recv().await.map(|event| (event, rx)) },
    ));

    let stream = events.map(move |event| {
        let _ = &guard;
        Ok(Event::default()
            .json_data(&event)
            .unwrap_or_else(|_| Event::default()))
    });

    Ok(Sse::new(stream))
}

fn validate(code: &str, user_id: &str) -> Result<(), RoomError> {
    if code.trim().is_empty() || user_id.trim().is_empty() {
        return Err(RoomError::MissingInput);
    }
    Ok(())
}

/// Removes the subscription when the SSE stream is dropped.
struct SubscriptionGuard {
    state: Arc<AppState>,
    code: String,
    id: Ulid,
}

impl Drop for SubscriptionGuard {
    fn drop(&mut self) {
        let state = Arc::clone(&self.state);
        let code = std::mem::take(&mut self.code);
        let id = self.id;
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            handle.spawn(async move {
                state.unsubscribe(&code, id).await;
            });
        }
    }
}
