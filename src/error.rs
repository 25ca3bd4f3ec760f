use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

/// Rejection reasons for session-coordinator operations. Messages are
/// user-facing; the transport maps each variant to a status code.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RoomError {
    #[error("User ID is required")]
    MissingUserId,

    #[error("Game code and user ID are required")]
    MissingInput,

    #[error("Game not found")]
    RoomNotFound,

    #[error("Player not in game")]
    NotAMember,

    #[error("Game is full")]
    RoomFull,

    #[error("Game is starting, please wait")]
    GameStarting,

    #[error("Game has already started")]
    AlreadyStarted,
}

impl RoomError {
    fn status(&self) -> StatusCode {
        match self {
            RoomError::MissingUserId | RoomError::MissingInput => StatusCode::BAD_REQUEST,
            RoomError::RoomNotFound => StatusCode::NOT_FOUND,
            RoomError::NotAMember => StatusCode::FORBIDDEN,
            RoomError::RoomFull | RoomError::GameStarting | RoomError::AlreadyStarted => {
                StatusCode::BAD_REQUEST
            }
        }
    }
}

impl IntoResponse for RoomError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "error": self.to_string() }))).into_response()
    }
}
