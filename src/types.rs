use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Opaque ID types for type safety
pub type PlayerId = String;
pub type RoomCode = String;

/// Minimum players required before a round can start
pub const MIN_PLAYERS: usize = 3;
/// Maximum players per room
pub const MAX_PLAYERS: usize = 8;
/// Placeholder delivered to the impostor instead of the secret word
pub const REDACTED_WORD: &str = "???";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub is_ready: bool,
    pub joined_at: DateTime<Utc>,
}

impl Player {
    /// Create a player; an empty display name falls back to a placeholder
    /// derived from the client id.
    pub fn new(id: impl Into<PlayerId>, name: Option<String>) -> Self {
        let id = id.into();
        let name = name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| format!("Player {}", id.chars().take(8).collect::<String>()));

        Self {
            id,
            name,
            is_ready: false,
            joined_at: Utc::now(),
        }
    }
}

/// Wire-level lifecycle name, as reported to clients.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum GamePhase {
    Waiting,
    Starting,
    Playing,
    Finished,
}

/// Room lifecycle. The secret word and the impostor only exist while a round
/// is running, so the `Playing` variant carries both.
#[derive(Debug, Clone, PartialEq)]
pub enum RoomPhase {
    Waiting,
    Starting,
    Playing { word: String, impostor: PlayerId },
    /// Reserved; no transition currently produces it.
    Finished,
}

impl RoomPhase {
    pub fn name(&self) -> GamePhase {
        match self {
            RoomPhase::Waiting => GamePhase::Waiting,
            RoomPhase::Starting => GamePhase::Starting,
            RoomPhase::Playing { .. } => GamePhase::Playing,
            RoomPhase::Finished => GamePhase::Finished,
        }
    }
}

/// One game instance. Player order is insertion order; the first entry is
/// displayed as the room owner.
#[derive(Debug, Clone)]
pub struct Room {
    pub code: RoomCode,
    pub players: Vec<Player>,
    pub phase: RoomPhase,
    pub created_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
}

/// Timer tunables. Tests shrink these to milliseconds.
#[derive(Debug, Clone)]
pub struct GameConfig {
    /// Delay between entering `starting` and resolving the word assignment
    pub start_delay: Duration,
    /// Idle time after which a room is swept
    pub room_ttl: Duration,
    /// How often the expiry sweep runs
    pub sweep_interval: Duration,
    /// How often subscribers receive a liveness ping
    pub heartbeat_interval: Duration,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            start_delay: Duration::from_secs(3),
            room_ttl: Duration::from_secs(60 * 60),
            sweep_interval: Duration::from_secs(10 * 60),
            heartbeat_interval: Duration::from_secs(30),
        }
    }
}

impl GameConfig {
    /// Load timer configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let secs = |var: &str, default: Duration| {
            std::env::var(var)
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(default)
        };

        Self {
            start_delay: secs("ROOM_START_DELAY_SECS", defaults.start_delay),
            room_ttl: secs("ROOM_TTL_SECS", defaults.room_ttl),
            sweep_interval: secs("ROOM_SWEEP_INTERVAL_SECS", defaults.sweep_interval),
            heartbeat_interval: secs("HEARTBEAT_INTERVAL_SECS", defaults.heartbeat_interval),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_name_defaults_from_id() {
        let player = Player::new("abcdef1234567890", None);
        assert_eq!(player.name, "Player abcdef12");
        assert!(!player.is_ready);

        let blank = Player::new("xyz", Some("   ".to_string()));
        assert_eq!(blank.name, "Player xyz");

        let named = Player::new("xyz", Some("Ana".to_string()));
        assert_eq!(named.name, "Ana");
    }

    #[test]
    fn test_phase_names() {
        assert_eq!(RoomPhase::Waiting.name(), GamePhase::Waiting);
        let playing = RoomPhase::Playing {
            word: "mesa".to_string(),
            impostor: "p1".to_string(),
        };
        assert_eq!(playing.name(), GamePhase::Playing);
    }
}
