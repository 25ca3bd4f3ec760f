//! Wire DTOs shared by the HTTP endpoints and the SSE event stream.
//!
//! Field names are camelCase on the wire; the event envelope is
//! `{type, roomCode, data, timestamp}`.

use crate::types::*;
use serde::{Deserialize, Serialize};

/// Public roster entry; never carries role information.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlayerInfo {
    pub id: PlayerId,
    pub name: String,
    pub is_ready: bool,
}

impl From<&Player> for PlayerInfo {
    fn from(p: &Player) -> Self {
        Self {
            id: p.id.clone(),
            name: if p.name.is_empty() {
                "Anonymous".to_string()
            } else {
                p.name.clone()
            },
            is_ready: p.is_ready,
        }
    }
}

/// The non-secret projection of room state, safe to show every participant
/// identically. `word`/`is_impostor` are only populated for recipient-specific
/// payloads (initial snapshot, state query, word reveal).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RoomView {
    pub code: RoomCode,
    pub players: Vec<PlayerInfo>,
    pub game_state: GamePhase,
    pub ready_count: usize,
    pub total_players: usize,
    pub can_start: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub word: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_impostor: Option<bool>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    InitialState,
    PlayerJoined,
    PlayerLeft,
    GameStarted,
    WordRevealed,
    Heartbeat,
}

/// Push-notification envelope delivered over the event stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameEvent {
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub room_code: RoomCode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<RoomView>,
    pub timestamp: String,
}

impl GameEvent {
    pub fn new(kind: EventKind, room_code: &str, data: Option<RoomView>) -> Self {
        Self {
            kind,
            room_code: room_code.to_string(),
            data,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

// ========== Request/response bodies ==========

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRoomRequest {
    pub user_id: String,
    #[serde(default)]
    pub player_name: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRoomResponse {
    pub code: RoomCode,
    pub user_id: PlayerId,
    pub player: PlayerInfo,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinRoomRequest {
    pub code: String,
    pub user_id: String,
    #[serde(default)]
    pub player_name: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinRoomResponse {
    pub success: bool,
    pub game: RoomView,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExitRoomRequest {
    pub code: String,
    pub user_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AckResponse {
    pub success: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetReadyRequest {
    pub code: String,
    pub user_id: String,
    /// While `playing`, `true` resets the room for a new round instead of
    /// toggling readiness.
    #[serde(default)]
    pub new_round: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SetReadyResponse {
    pub success: bool,
    pub is_ready: bool,
    pub game_state: RoomView,
}

/// Query parameters shared by the GET endpoints.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomQuery {
    pub code: String,
    pub user_id: String,
}

/// Response for the word lookup endpoint. Outside of `playing` only the
/// phase is reported.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WordResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub word: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_impostor: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub game_state: Option<GamePhase>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_envelope_shape() {
        let event = GameEvent::new(EventKind::Heartbeat, "ABCDEF", None);
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "heartbeat");
        assert_eq!(json["roomCode"], "ABCDEF");
        assert!(json.get("data").is_none());
        assert!(json["timestamp"].is_string());
    }

    #[test]
    fn test_view_serializes_camel_case() {
        let view = RoomView {
            code: "ABCDEF".to_string(),
            players: vec![PlayerInfo {
                id: "p1".to_string(),
                name: "Ana".to_string(),
                is_ready: true,
            }],
            game_state: GamePhase::Waiting,
            ready_count: 1,
            total_players: 1,
            can_start: false,
            word: None,
            is_impostor: None,
        };
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["gameState"], "waiting");
        assert_eq!(json["readyCount"], 1);
        assert_eq!(json["totalPlayers"], 1);
        assert_eq!(json["canStart"], false);
        assert_eq!(json["players"][0]["isReady"], true);
        assert!(json.get("word").is_none());
    }

    #[test]
    fn test_anonymous_name_substitution() {
        let mut player = Player::new("p1", Some("Ana".to_string()));
        player.name = String::new();
        let info = PlayerInfo::from(&player);
        assert_eq!(info.name, "Anonymous");
    }
}
