use crate::error::RoomError;
use crate::protocol::{PlayerInfo, RoomView};
use crate::types::*;
use chrono::Utc;

impl Room {
    pub fn new(code: RoomCode, creator: Player) -> Self {
        let now = Utc::now();
        Self {
            code,
            players: vec![creator],
            phase: RoomPhase::Waiting,
            created_at: now,
            last_activity: now,
        }
    }

    pub fn contains(&self, player_id: &str) -> bool {
        self.players.iter().any(|p| p.id == player_id)
    }

    pub fn player_mut(&mut self, player_id: &str) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.id == player_id)
    }

    /// Add a player to the roster. Re-joining is a no-op; a full roster is
    /// rejected. Phase checks are the coordinator's concern.
    pub fn add_player(&mut self, player: Player) -> Result<bool, RoomError> {
        if self.contains(&player.id) {
            return Ok(false);
        }
        if self.players.len() >= MAX_PLAYERS {
            return Err(RoomError::RoomFull);
        }
        self.players.push(player);
        Ok(true)
    }

    /// Remove a player; returns whether they were present. The phase is left
    /// untouched, so a departing impostor leaves a dangling reference while
    /// the round keeps running.
    pub fn remove_player(&mut self, player_id: &str) -> bool {
        let before = self.players.len();
        self.players.retain(|p| p.id != player_id);
        self.players.len() != before
    }

    pub fn ready_count(&self) -> usize {
        self.players.iter().filter(|p| p.is_ready).count()
    }

    pub fn can_start(&self) -> bool {
        self.players.len() >= MIN_PLAYERS && self.players.iter().all(|p| p.is_ready)
    }

    pub fn touch(&mut self) {
        self.last_activity = Utc::now();
    }

    /// Fire the `waiting -> starting` transition when the ready threshold is
    /// met. Returns whether the transition happened.
    pub fn try_begin_start(&mut self) -> bool {
        if self.phase == RoomPhase::Waiting && self.can_start() {
            self.phase = RoomPhase::Starting;
            self.touch();
            true
        } else {
            false
        }
    }

    /// Reset to `waiting` for a fresh round: word and impostor are cleared
    /// and only the requesting player stays ready.
    pub fn reset_round(&mut self, requester: &str) {
        self.phase = RoomPhase::Waiting;
        for p in &mut self.players {
            p.is_ready = p.id == requester;
        }
        self.touch();
    }

    /// The public view projection; identical for every participant.
    pub fn view(&self) -> RoomView {
        let players: Vec<PlayerInfo> = self.players.iter().map(PlayerInfo::from).collect();
        let ready_count = players.iter().filter(|p| p.is_ready).count();
        RoomView {
            code: self.code.clone(),
            game_state: self.phase.name(),
            ready_count,
            total_players: players.len(),
            can_start: self.can_start(),
            players,
            word: None,
            is_impostor: None,
        }
    }

    /// The view as seen by one participant: while a round is running it
    /// carries the secret word, redacted for the impostor.
    pub fn view_for(&self, recipient: &str) -> RoomView {
        let mut view = self.view();
        if let RoomPhase::Playing { word, impostor } = &self.phase {
            if recipient == impostor {
                view.word = Some(REDACTED_WORD.to_string());
                view.is_impostor = Some(true);
            } else {
                view.word = Some(word.clone());
                view.is_impostor = Some(false);
            }
        }
        view
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn room_with(ids: &[&str]) -> Room {
        let mut players = ids.iter().map(|id| Player::new(*id, None));
        let mut room = Room::new("ABCDEF".to_string(), players.next().unwrap());
        for p in players {
            room.add_player(p).unwrap();
        }
        room
    }

    #[test]
    fn test_roster_counts_distinct_ids() {
        let mut room = room_with(&["a", "b"]);
        assert_eq!(room.view().total_players, 2);

        // re-joining is a no-op
        assert!(!room.add_player(Player::new("a", None)).unwrap());
        assert_eq!(room.view().total_players, 2);

        assert!(room.remove_player("b"));
        assert!(!room.remove_player("b"));
        assert_eq!(room.view().total_players, 1);
    }

    #[test]
    fn test_capacity_enforced() {
        let ids: Vec<String> = (0..MAX_PLAYERS).map(|i| format!("p{}", i)).collect();
        let mut room = room_with(&ids.iter().map(String::as_str).collect::<Vec<_>>());
        assert_eq!(
            room.add_player(Player::new("extra", None)),
            Err(RoomError::RoomFull)
        );
    }

    #[test]
    fn test_can_start_requires_three_ready() {
        let mut room = room_with(&["a", "b"]);
        for p in &mut room.players {
            p.is_ready = true;
        }
        assert!(!room.can_start(), "two ready players are not enough");
        assert!(!room.try_begin_start());

        room.add_player(Player::new("c", None)).unwrap();
        assert!(!room.can_start(), "third player is not ready yet");

        room.player_mut("c").unwrap().is_ready = true;
        assert!(room.can_start());
        assert!(room.try_begin_start());
        assert_eq!(room.phase, RoomPhase::Starting);

        // the transition fires exactly once
        assert!(!room.try_begin_start());
    }

    #[test]
    fn test_leave_can_complete_readiness() {
        let mut room = room_with(&["a", "b", "c", "d"]);
        for id in ["a", "b", "c"] {
            room.player_mut(id).unwrap().is_ready = true;
        }
        assert!(!room.can_start(), "d is not ready");
        room.remove_player("d");
        assert!(room.can_start());
    }

    #[test]
    fn test_reset_round_clears_word_and_readiness() {
        let mut room = room_with(&["a", "b", "c"]);
        room.phase = RoomPhase::Playing {
            word: "mesa".to_string(),
            impostor: "b".to_string(),
        };
        for p in &mut room.players {
            p.is_ready = true;
        }

        room.reset_round("c");

        assert_eq!(room.phase, RoomPhase::Waiting);
        assert_eq!(room.ready_count(), 1);
        assert!(room.player_mut("c").unwrap().is_ready);
        let view = room.view();
        assert_eq!(view.game_state, GamePhase::Waiting);
        assert!(view.word.is_none());
    }

    #[test]
    fn test_view_for_redacts_impostor() {
        let mut room = room_with(&["a", "b", "c"]);
        room.phase = RoomPhase::Playing {
            word: "mesa".to_string(),
            impostor: "b".to_string(),
        };

        let impostor_view = room.view_for("b");
        assert_eq!(impostor_view.word.as_deref(), Some(REDACTED_WORD));
        assert_eq!(impostor_view.is_impostor, Some(true));

        let a_view = room.view_for("a");
        let c_view = room.view_for("c");
        assert_eq!(a_view.word.as_deref(), Some("mesa"));
        assert_eq!(a_view.word, c_view.word);
        assert_eq!(a_view.is_impostor, Some(false));
    }

    #[test]
    fn test_view_has_no_word_outside_playing() {
        let room = room_with(&["a", "b", "c"]);
        let view = room.view_for("a");
        assert!(view.word.is_none());
        assert!(view.is_impostor.is_none());
    }

    #[test]
    fn test_insertion_order_preserved() {
        let room = room_with(&["first", "second", "third"]);
        let view = room.view();
        assert_eq!(view.players[0].id, "first");
        assert_eq!(view.players[2].id, "third");
    }
}
