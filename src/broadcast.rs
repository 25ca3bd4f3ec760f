//! Event fanout to room subscribers. Each SSE connection holds the receiving
//! half of an unbounded channel; senders that fail are pruned on the next
//! publish.

use crate::error::RoomError;
use crate::protocol::{EventKind, GameEvent, RoomView};
use crate::state::AppState;
use crate::types::*;
use std::sync::Arc;
use tokio::sync::mpsc;
use ulid::Ulid;

pub struct Subscriber {
    pub id: Ulid,
    pub player_id: PlayerId,
    pub tx: mpsc::UnboundedSender<GameEvent>,
}

/// The public view specialized for one recipient of a reveal: the impostor
/// sees the sentinel, everyone else sees the word.
pub fn reveal_view(view: &RoomView, word: &str, impostor: &str, recipient: &str) -> RoomView {
    let mut view = view.clone();
    if recipient == impostor {
        view.word = Some(REDACTED_WORD.to_string());
        view.is_impostor = Some(true);
    } else {
        view.word = Some(word.to_string());
        view.is_impostor = Some(false);
    }
    view
}

impl AppState {
    /// Register a listener on a room. Returns the initial snapshot event, the
    /// event receiver and the subscription id used to unsubscribe.
    pub async fn subscribe(
        &self,
        code: &str,
        player_id: &str,
    ) -> Result<(GameEvent, mpsc::UnboundedReceiver<GameEvent>, Ulid), RoomError> {
        let room_arc = self.room(code).await?;
        let room = room_arc.lock().await;
        if !room.contains(player_id) {
            return Err(RoomError::NotAMember);
        }

        // registration happens under the room lock; any event published for
        // a later mutation lands in the channel instead of being missed
        // between the snapshot and the registration
        let (tx, rx) = mpsc::unbounded_channel();
        let id = Ulid::new();
        self.subscribers
            .write()
            .await
            .entry(code.to_string())
            .or_default()
            .push(Subscriber {
                id,
                player_id: player_id.to_string(),
                tx,
            });

        let initial = GameEvent::new(EventKind::InitialState, code, Some(room.view_for(player_id)));
        tracing::debug!("Player {} subscribed to room {}", player_id, code);

        Ok((initial, rx, id))
    }

    pub async fn unsubscribe(&self, code: &str, id: Ulid) {
        let mut subscribers = self.subscribers.write().await;
        if let Some(subs) = subscribers.get_mut(code) {
            subs.retain(|s| s.id != id);
            if subs.is_empty() {
                subscribers.remove(code);
            }
        }
    }

    pub async fn subscriber_count(&self, code: &str) -> usize {
        self.subscribers
            .read()
            .await
            .get(code)
            .map_or(0, Vec::len)
    }

    /// Send one event to every live subscriber of a room, dropping the dead
    /// ones.
    pub async fn publish(&self, code: &str, event: GameEvent) {
        let mut subscribers = self.subscribers.write().await;
        if let Some(subs) = subscribers.get_mut(code) {
            subs.retain(|s| s.tx.send(event.clone()).is_ok());
            if subs.is_empty() {
                subscribers.remove(code);
            }
        }
    }

    /// The `word_revealed` fanout. Unlike [`publish`](Self::publish) the
    /// payload differs per recipient, so it is projected per subscriber.
    pub async fn publish_reveal(&self, code: &str, view: RoomView, word: &str, impostor: &str) {
        let mut subscribers = self.subscribers.write().await;
        if let Some(subs) = subscribers.get_mut(code) {
            subs.retain(|s| {
                let personalized = reveal_view(&view, word, impostor, &s.player_id);
                let event = GameEvent::new(EventKind::WordRevealed, code, Some(personalized));
                s.tx.send(event).is_ok()
            });
            if subs.is_empty() {
                subscribers.remove(code);
            }
        }
    }
}

/// Spawn the periodic heartbeat that keeps idle SSE connections open through
/// proxies and lets the publisher notice dropped ones.
pub fn spawn_heartbeat(state: Arc<AppState>) {
    tokio::spawn(async move {
        let mut tick = tokio::time::interval(state.config.heartbeat_interval);
        tick.tick().await;

        loop {
            tick.tick().await;
            let codes: Vec<RoomCode> = state.subscribers.read().await.keys().cloned().collect();
            for code in codes {
                state
                    .publish(&code, GameEvent::new(EventKind::Heartbeat, &code, None))
                    .await;
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::EventKind;

    async fn room_with_members(state: &AppState, ids: &[&str]) -> RoomCode {
        let (code, _) = state.create_room(ids[0], None).await;
        let room = state.room(&code).await.unwrap();
        let mut room = room.lock().await;
        for id in &ids[1..] {
            room.add_player(Player::new(*id, None)).unwrap();
        }
        code
    }

    #[tokio::test]
    async fn test_subscribe_requires_membership() {
        let state = AppState::default();
        let code = room_with_members(&state, &["a"]).await;
        assert!(state.subscribe(&code, "stranger").await.is_err());
    }

    #[tokio::test]
    async fn test_subscribe_publish_unsubscribe() {
        let state = AppState::default();
        let code = room_with_members(&state, &["a", "b"]).await;

        let (initial, mut rx, id) = state.subscribe(&code, "a").await.unwrap();
        assert_eq!(initial.kind, EventKind::InitialState);
        assert_eq!(state.subscriber_count(&code).await, 1);

        state
            .publish(&code, GameEvent::new(EventKind::PlayerJoined, &code, None))
            .await;
        let received = rx.recv().await.unwrap();
        assert_eq!(received.kind, EventKind::PlayerJoined);

        state.unsubscribe(&code, id).await;
        assert_eq!(state.subscriber_count(&code).await, 0);
    }

    #[tokio::test]
    async fn test_dropped_receiver_is_pruned() {
        let state = AppState::default();
        let code = room_with_members(&state, &["a", "b"]).await;

        let (_, rx, _) = state.subscribe(&code, "a").await.unwrap();
        let (_, _rx_live, _) = state.subscribe(&code, "b").await.unwrap();
        assert_eq!(state.subscriber_count(&code).await, 2);

        drop(rx);
        state
            .publish(&code, GameEvent::new(EventKind::Heartbeat, &code, None))
            .await;
        assert_eq!(state.subscriber_count(&code).await, 1);
    }

    #[tokio::test]
    async fn test_reveal_is_personalized() {
        let state = AppState::default();
        let code = room_with_members(&state, &["a", "b", "c"]).await;

        let (_, mut rx_a, _) = state.subscribe(&code, "a").await.unwrap();
        let (_, mut rx_b, _) = state.subscribe(&code, "b").await.unwrap();

        let view = {
            let room = state.room(&code).await.unwrap();
            let view = room.lock().await.view();
            view
        };
        state.publish_reveal(&code, view, "mesa", "b").await;

        let to_a = rx_a.recv().await.unwrap();
        assert_eq!(to_a.kind, EventKind::WordRevealed);
        let data = to_a.data.unwrap();
        assert_eq!(data.word.as_deref(), Some("mesa"));
        assert_eq!(data.is_impostor, Some(false));

        let to_b = rx_b.recv().await.unwrap();
        let data = to_b.data.unwrap();
        assert_eq!(data.word.as_deref(), Some(REDACTED_WORD));
        assert_eq!(data.is_impostor, Some(true));
    }
}
