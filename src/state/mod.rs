mod actions;
mod assign;
mod registry;
mod room;

pub use registry::spawn_expiry_sweeper;

use crate::broadcast::Subscriber;
use crate::types::*;
use crate::words::WordService;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tokio::task::AbortHandle;

/// Shared application state. The registry map carries its own lock; each
/// room carries a `Mutex` so mutations on different rooms never contend.
pub struct AppState {
    pub config: GameConfig,
    pub words: WordService,
    pub(crate) rooms: RwLock<HashMap<RoomCode, Arc<Mutex<Room>>>>,
    pub(crate) subscribers: RwLock<HashMap<RoomCode, Vec<Subscriber>>>,
    /// Pending word-assignment timers, keyed by room code. Aborted when the
    /// room is deleted so a stale timer never fires against a dead room.
    pub(crate) pending_starts: Mutex<HashMap<RoomCode, AbortHandle>>,
}

impl AppState {
    pub fn new(config: GameConfig, words: WordService) -> Self {
        Self {
            config,
            words,
            rooms: RwLock::new(HashMap::new()),
            subscribers: RwLock::new(HashMap::new()),
            pending_starts: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(GameConfig::default(), WordService::offline())
    }
}
