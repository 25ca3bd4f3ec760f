//! Session-coordinator operations. Every mutation of one room happens under
//! that room's lock; events are published after the lock is released.

use super::AppState;
use crate::error::RoomError;
use crate::protocol::{EventKind, GameEvent, RoomView, WordResponse};
use crate::types::*;
use std::sync::Arc;

impl AppState {
    /// Join a room while it is in `waiting`. Re-joining is a no-op success.
    pub async fn join_room(
        self: &Arc<Self>,
        code: &str,
        user_id: &str,
        player_name: Option<String>,
    ) -> Result<RoomView, RoomError> {
        let room_arc = self.room(code).await?;
        let mut room = room_arc.lock().await;

        if room.contains(user_id) {
            return Ok(room.view());
        }

        match room.phase {
            RoomPhase::Waiting => {}
            RoomPhase::Starting => return Err(RoomError::GameStarting),
            RoomPhase::Playing { .. } | RoomPhase::Finished => {
                return Err(RoomError::AlreadyStarted)
            }
        }

        room.add_player(Player::new(user_id, player_name))?;
        room.touch();

        let view = room.view();
        // a join can complete the ready threshold (everyone else was ready)
        let starting_view = room.try_begin_start().then(|| room.view());
        drop(room);

        self.publish(code, GameEvent::new(EventKind::PlayerJoined, code, Some(view.clone())))
            .await;
        if let Some(sv) = starting_view {
            self.begin_round(code, sv).await;
        }

        Ok(view)
    }

    /// Leave a room. Idempotent: an absent room or player is still success.
    /// The last player leaving deletes the room.
    pub async fn exit_room(self: &Arc<Self>, code: &str, user_id: &str) {
        let Ok(room_arc) = self.room(code).await else {
            return;
        };
        let mut room = room_arc.lock().await;

        if !room.remove_player(user_id) {
            return;
        }
        room.touch();

        if room.players.is_empty() {
            drop(room);
            self.delete_room(code).await;
            return;
        }

        let view = room.view();
        let starting_view = room.try_begin_start().then(|| room.view());
        drop(room);

        self.publish(code, GameEvent::new(EventKind::PlayerLeft, code, Some(view)))
            .await;
        if let Some(sv) = starting_view {
            self.begin_round(code, sv).await;
        }
    }

    /// Toggle the caller's ready flag, or reset the room for a new round when
    /// `new_round` is set while the room is `playing`. Returns the caller's
    /// resulting ready flag and the public view.
    pub async fn set_ready(
        self: &Arc<Self>,
        code: &str,
        user_id: &str,
        new_round: bool,
    ) -> Result<(bool, RoomView), RoomError> {
        let room_arc = self.room(code).await?;
        let mut room = room_arc.lock().await;

        if !room.contains(user_id) {
            return Err(RoomError::NotAMember);
        }

        if new_round && matches!(room.phase, RoomPhase::Playing { .. }) {
            room.reset_round(user_id);
            let view = room.view();
            drop(room);

            self.publish(code, GameEvent::new(EventKind::PlayerJoined, code, Some(view.clone())))
                .await;
            return Ok((true, view));
        }

        match room.phase {
            RoomPhase::Waiting => {}
            RoomPhase::Starting => return Err(RoomError::GameStarting),
            RoomPhase::Playing { .. } | RoomPhase::Finished => {
                return Err(RoomError::AlreadyStarted)
            }
        }

        let player = room.player_mut(user_id).ok_or(RoomError::NotAMember)?;
        player.is_ready = !player.is_ready;
        let is_ready = player.is_ready;
        room.touch();

        let view = room.view();
        let starting_view = room.try_begin_start().then(|| room.view());
        drop(room);

        self.publish(code, GameEvent::new(EventKind::PlayerJoined, code, Some(view.clone())))
            .await;
        if let Some(sv) = starting_view {
            self.begin_round(code, sv).await;
        }

        Ok((is_ready, view))
    }

    /// The public view plus the requester-redacted word when a round is
    /// running.
    pub async fn query_state(&self, code: &str, user_id: &str) -> Result<RoomView, RoomError> {
        let room_arc = self.room(code).await?;
        let room = room_arc.lock().await;
        if !room.contains(user_id) {
            return Err(RoomError::NotAMember);
        }
        Ok(room.view_for(user_id))
    }

    /// Just the requester's word assignment; outside `playing` only the
    /// phase is reported.
    pub async fn query_word(&self, code: &str, user_id: &str) -> Result<WordResponse, RoomError> {
        let room_arc = self.room(code).await?;
        let room = room_arc.lock().await;
        if !room.contains(user_id) {
            return Err(RoomError::NotAMember);
        }

        if let RoomPhase::Playing { word, impostor } = &room.phase {
            let is_impostor = user_id == impostor;
            Ok(WordResponse {
                word: Some(if is_impostor {
                    REDACTED_WORD.to_string()
                } else {
                    word.clone()
                }),
                is_impostor: Some(is_impostor),
                game_state: None,
            })
        } else {
            Ok(WordResponse {
                word: None,
                is_impostor: None,
                game_state: Some(room.phase.name()),
            })
        }
    }

    /// Announce the `starting` phase and schedule the deferred word
    /// assignment.
    async fn begin_round(self: &Arc<Self>, code: &str, starting_view: RoomView) {
        self.publish(
            code,
            GameEvent::new(EventKind::GameStarted, code, Some(starting_view)),
        )
        .await;
        self.schedule_word_assignment(code).await;
    }
}
