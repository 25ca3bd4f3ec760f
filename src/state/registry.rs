use super::AppState;
use crate::error::RoomError;
use crate::types::*;
use chrono::Utc;
use rand::Rng;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Room codes are 6 uppercase letters, no checksum
const CODE_CHARS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const CODE_LENGTH: usize = 6;

fn generate_room_code() -> String {
    let mut rng = rand::rng();
    (0..CODE_LENGTH)
        .map(|_| CODE_CHARS[rng.random_range(0..CODE_CHARS.len())] as char)
        .collect()
}

impl AppState {
    /// Create a room in `waiting` state with the creator as its sole,
    /// not-ready player.
    pub async fn create_room(&self, user_id: &str, player_name: Option<String>) -> (RoomCode, Player) {
        let creator = Player::new(user_id, player_name);

        let mut rooms = self.rooms.write().await;
        // Collision is near-impossible at 26^6 codes, but cheap to rule out
        let code = loop {
            let code = generate_room_code();
            if !rooms.contains_key(&code) {
                break code;
            }
        };

        let room = Room::new(code.clone(), creator.clone());
        rooms.insert(code.clone(), Arc::new(Mutex::new(room)));
        tracing::info!("Created room {} for player {}", code, creator.id);

        (code, creator)
    }

    pub async fn room(&self, code: &str) -> Result<Arc<Mutex<Room>>, RoomError> {
        self.rooms
            .read()
            .await
            .get(code)
            .cloned()
            .ok_or(RoomError::RoomNotFound)
    }

    pub async fn room_count(&self) -> usize {
        self.rooms.read().await.len()
    }

    /// Remove a room along with its subscription set and any pending
    /// word-assignment timer.
    pub(crate) async fn delete_room(&self, code: &str) {
        self.rooms.write().await.remove(code);
        self.subscribers.write().await.remove(code);
        if let Some(handle) = self.pending_starts.lock().await.remove(code) {
            handle.abort();
        }
        tracing::info!("Deleted room {}", code);
    }

    /// Remove every room whose `last_activity` is older than the configured
    /// TTL. Staleness is re-checked against the live value and the entry is
    /// removed within the same registry write section, so no operation can
    /// touch the room between the check and the removal.
    pub async fn sweep_expired(&self) -> usize {
        let ttl = chrono::Duration::from_std(self.config.room_ttl)
            .unwrap_or_else(|_| chrono::Duration::hours(1));
        let cutoff = Utc::now() - ttl;

        let candidates: Vec<RoomCode> = {
            let rooms = self.rooms.read().await;
            let mut stale = Vec::new();
            for (code, room) in rooms.iter() {
                if room.lock().await.last_activity < cutoff {
                    stale.push(code.clone());
                }
            }
            stale
        };

        let mut removed = 0;
        for code in candidates {
            let confirmed = {
                let mut rooms = self.rooms.write().await;
                match rooms.get(&code).cloned() {
                    Some(room) => {
                        // the room lock is held through the removal, so the
                        // checked value is current at actual deletion time
                        let room = room.lock().await;
                        if room.last_activity < cutoff {
                            rooms.remove(&code);
                            true
                        } else {
                            false
                        }
                    }
                    None => false,
                }
            };
            if confirmed {
                self.subscribers.write().await.remove(&code);
                if let Some(handle) = self.pending_starts.lock().await.remove(&code) {
                    handle.abort();
                }
                tracing::info!("Swept idle room {}", code);
                removed += 1;
            }
        }
        removed
    }
}

/// Spawn the background sweep that removes idle rooms on a fixed interval.
pub fn spawn_expiry_sweeper(state: Arc<AppState>) {
    tokio::spawn(async move {
        let mut sweep = tokio::time::interval(state.config.sweep_interval);
        // the immediate first tick would sweep an empty registry
        sweep.tick().await;

        loop {
            sweep.tick().await;
            let removed = state.sweep_expired().await;
            if removed > 0 {
                tracing::info!("Expiry sweep removed {} idle rooms", removed);
            }
        }
    });
}
