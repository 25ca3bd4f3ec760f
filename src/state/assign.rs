//! Deferred word assignment: the pause between `starting` and `playing`
//! during which the secret word is fetched and the impostor drawn.

use super::AppState;
use crate::types::*;
use rand::Rng;
use std::sync::Arc;

/// Uniform draw of the impostor from the roster.
fn pick_impostor(players: &[Player]) -> PlayerId {
    let mut ids: Vec<PlayerId> = players.iter().map(|p| p.id.clone()).collect();
    let mut rng = rand::rng();
    for i in (1..ids.len()).rev() {
        let j = rng.random_range(0..=i);
        ids.swap(i, j);
    }
    ids.swap_remove(0)
}

impl AppState {
    /// Schedule the word assignment for a room that just entered `starting`.
    /// A previously pending timer for the same room is cancelled.
    pub(crate) async fn schedule_word_assignment(self: &Arc<Self>, code: &str) {
        let state = Arc::clone(self);
        let code_owned = code.to_string();
        let delay = self.config.start_delay;

        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            state.resolve_word_assignment(&code_owned).await;
        });

        if let Some(previous) = self
            .pending_starts
            .lock()
            .await
            .insert(code.to_string(), task.abort_handle())
        {
            previous.abort();
        }
    }

    /// Fetch the secret word, draw the impostor and move the room to
    /// `playing`. The external call runs without any lock held; the phase is
    /// re-checked afterwards so a room that was reset or emptied in the
    /// meantime is left alone.
    pub(crate) async fn resolve_word_assignment(self: &Arc<Self>, code: &str) {
        self.pending_starts.lock().await.remove(code);

        let Ok(room_arc) = self.room(code).await else {
            return;
        };

        {
            let room = room_arc.lock().await;
            if room.phase != RoomPhase::Starting {
                return;
            }
        }

        let picked = self.words.pick_word().await;

        let word = match picked {
            Ok(word) => word,
            Err(e) => {
                tracing::error!("Word assignment for room {} failed: {}", code, e);
                let mut room = room_arc.lock().await;
                if room.phase == RoomPhase::Starting {
                    room.phase = RoomPhase::Waiting;
                    room.touch();
                }
                return;
            }
        };

        let reveal = {
            let mut room = room_arc.lock().await;
            if room.phase != RoomPhase::Starting || room.players.is_empty() {
                return;
            }
            let impostor = pick_impostor(&room.players);
            tracing::info!(
                "Room {} is playing: word {:?}, impostor {}",
                code,
                word,
                impostor
            );
            room.phase = RoomPhase::Playing {
                word: word.clone(),
                impostor: impostor.clone(),
            };
            room.touch();
            (room.view(), word, impostor)
        };

        let (view, word, impostor) = reveal;
        self.publish_reveal(code, view, &word, &impostor).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::words::{WordError, WordGenerator, WordResult, WordService};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::time::Duration;

    #[test]
    fn test_impostor_draw_is_roughly_uniform() {
        let players: Vec<Player> = ["a", "b", "c", "d"]
            .iter()
            .map(|id| Player::new(*id, None))
            .collect();

        let mut counts: HashMap<PlayerId, u32> = HashMap::new();
        for _ in 0..10_000 {
            *counts.entry(pick_impostor(&players)).or_default() += 1;
        }

        assert_eq!(counts.len(), 4);
        for (id, count) in counts {
            assert!(
                (2200..2800).contains(&count),
                "player {} drawn {} times out of 10000",
                id,
                count
            );
        }
    }

    #[test]
    fn test_single_player_draw() {
        let players = vec![Player::new("only", None)];
        assert_eq!(pick_impostor(&players), "only");
    }

    #[tokio::test]
    async fn test_resolve_on_missing_room_is_noop() {
        let state = Arc::new(AppState::default());
        state.resolve_word_assignment("ZZZZZZ").await;
    }

    #[tokio::test]
    async fn test_resolve_skips_room_not_starting() {
        let state = Arc::new(AppState::default());
        let (code, _) = state.create_room("a", None).await;

        state.resolve_word_assignment(&code).await;

        let room = state.room(&code).await.unwrap();
        assert_eq!(room.lock().await.phase, RoomPhase::Waiting);
    }

    #[tokio::test]
    async fn test_resolve_assigns_word_and_impostor() {
        let state = Arc::new(AppState::default());
        let (code, _) = state.create_room("a", None).await;
        {
            let room = state.room(&code).await.unwrap();
            let mut room = room.lock().await;
            room.add_player(Player::new("b", None)).unwrap();
            room.add_player(Player::new("c", None)).unwrap();
            room.phase = RoomPhase::Starting;
        }

        state.resolve_word_assignment(&code).await;

        let room = state.room(&code).await.unwrap();
        let room = room.lock().await;
        match &room.phase {
            RoomPhase::Playing { word, impostor } => {
                assert_eq!(word, "mesa");
                assert!(room.contains(impostor));
            }
            other => panic!("expected playing, got {:?}", other),
        }
    }

    struct BrokenGenerator;

    #[async_trait]
    impl WordGenerator for BrokenGenerator {
        async fn refine_word(&self, _candidate: &str, _correlation_id: &str) -> WordResult<String> {
            Err(WordError::Timeout(Duration::from_secs(5)))
        }

        fn name(&self) -> &str {
            "broken"
        }
    }

    #[tokio::test]
    async fn test_failed_assignment_reverts_to_waiting() {
        let words = WordService::new(None, Some(Box::new(BrokenGenerator)), "mesa".to_string());
        let state = Arc::new(AppState::new(GameConfig::default(), words));
        let (code, _) = state.create_room("a", None).await;
        {
            let room = state.room(&code).await.unwrap();
            room.lock().await.phase = RoomPhase::Starting;
        }

        state.resolve_word_assignment(&code).await;

        let room = state.room(&code).await.unwrap();
        assert_eq!(room.lock().await.phase, RoomPhase::Waiting);
    }
}
